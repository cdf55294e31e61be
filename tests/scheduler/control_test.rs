/*!
 * Run Control Tests
 * Background runs, pause/resume/stop, contention and async waiting
 */

use pretty_assertions::assert_eq;
use resource_sim::monitoring::Event;
use resource_sim::{
    silent_observer, CpuScheduler, RunMode, RunOutcome, SchedulerConfig, SchedulerError,
    UnitState, VirtualClock, WallClock,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Round-robin engine where 1 simulated second lasts 10ms
fn wall_engine() -> CpuScheduler {
    CpuScheduler::with_clock(
        SchedulerConfig::round_robin(Duration::from_millis(500)),
        Arc::new(WallClock::scaled(0.01)),
    )
    .unwrap()
    .with_observer(silent_observer())
}

fn wait_until_running(engine: &CpuScheduler) {
    for _ in 0..200 {
        if engine.current().is_some() {
            return;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!("engine never dispatched");
}

#[test]
fn test_empty_run_is_noop() {
    let engine = wall_engine();
    match engine.run(RunMode::Background).unwrap() {
        RunOutcome::Completed(metrics) => {
            assert_eq!(metrics.total_units, 0);
            assert_eq!(metrics.dispatches, 0);
        }
        RunOutcome::Spawned(_) => panic!("nothing to run"),
    }
    assert!(!engine.is_running());
}

#[test]
fn test_control_on_idle_engine() {
    let engine = wall_engine();

    assert!(!engine.stop());
    assert!(!engine.stop());
    assert_eq!(
        engine.pause(),
        Err(SchedulerError::NotRunning("pause".to_string()))
    );
    assert!(matches!(
        engine.resume(),
        Err(SchedulerError::NotRunning(_))
    ));

    let ignored = engine
        .events()
        .iter()
        .filter(|r| matches!(r.event, Event::ControlIgnored { .. }))
        .count();
    assert_eq!(ignored, 4);
}

#[test]
fn test_stop_leaves_work_ready() {
    let engine = wall_engine();
    for name in ["a", "b", "c"] {
        engine.submit(name, Duration::from_secs(100), 0).unwrap();
    }

    let outcome = engine.run(RunMode::Background).unwrap();
    wait_until_running(&engine);

    assert!(engine.stop());
    assert!(!engine.stop());

    let metrics = outcome.wait().unwrap();
    assert_eq!(metrics.completed_units, 0);
    assert!(!engine.is_running());
    assert_eq!(engine.current(), None);
    assert_eq!(engine.ready_len(), 3);

    for unit in engine.units() {
        assert_eq!(unit.state(), UnitState::Ready);
        assert!(unit.remaining() > Duration::ZERO);
    }

    let events = engine.events();
    assert!(events
        .iter()
        .any(|r| matches!(r.event, Event::UnitSuspended { .. })));
    assert!(events
        .iter()
        .any(|r| matches!(r.event, Event::SchedulerFinished { stopped: true, .. })));

    // A stopped engine is idle again: control requests are rejected
    assert!(!engine.stop());
}

#[test]
fn test_second_run_rejected() {
    let engine = wall_engine();
    engine.submit("long", Duration::from_secs(100), 0).unwrap();

    let outcome = engine.run(RunMode::Background).unwrap();
    assert!(engine.is_running());
    assert!(matches!(
        engine.run(RunMode::Blocking),
        Err(SchedulerError::AlreadyRunning)
    ));

    engine.stop();
    outcome.wait().unwrap();
    assert!(!engine.is_running());
}

#[test]
fn test_pause_and_resume() {
    let engine = wall_engine();
    let id = engine.submit("work", Duration::from_secs(100), 0).unwrap();

    let outcome = engine.run(RunMode::Background).unwrap();
    wait_until_running(&engine);

    engine.pause().unwrap();
    assert!(engine.status().paused);

    // Let the in-flight tick finish, then nothing may progress
    thread::sleep(Duration::from_millis(30));
    let frozen = engine.unit(id).unwrap().remaining();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(engine.unit(id).unwrap().remaining(), frozen);

    engine.resume().unwrap();
    assert!(!engine.status().paused);
    thread::sleep(Duration::from_millis(30));
    assert!(engine.unit(id).unwrap().remaining() < frozen);

    assert!(engine.stop());
    outcome.wait().unwrap();
}

#[test]
fn test_stop_while_paused() {
    let engine = wall_engine();
    engine.submit("work", Duration::from_secs(100), 0).unwrap();

    let outcome = engine.run(RunMode::Background).unwrap();
    wait_until_running(&engine);
    engine.pause().unwrap();

    assert!(engine.stop());
    let metrics = outcome.wait().unwrap();
    assert_eq!(metrics.completed_units, 0);
    assert!(!engine.status().paused);
}

#[test]
fn test_admission_during_run() {
    let engine = wall_engine();
    engine.submit("first", Duration::from_secs(5), 0).unwrap();

    let outcome = engine.run(RunMode::Background).unwrap();
    wait_until_running(&engine);
    let late = engine.submit("late", Duration::from_millis(500), 0).unwrap();

    let metrics = outcome.wait().unwrap();
    assert_eq!(metrics.completed_units, 2);
    assert!(metrics.completion_order.contains(&late));
}

#[test]
fn test_background_join_on_virtual_clock() {
    let engine = CpuScheduler::with_clock(
        SchedulerConfig::round_robin(Duration::from_millis(500)),
        Arc::new(VirtualClock::new()),
    )
    .unwrap()
    .with_observer(silent_observer());
    engine.submit("a", Duration::from_secs(1), 0).unwrap();
    engine.submit("b", Duration::from_secs(1), 0).unwrap();

    let RunOutcome::Spawned(handle) = engine.run(RunMode::Background).unwrap() else {
        panic!("expected a worker");
    };
    let metrics = handle.join().unwrap();
    assert_eq!(metrics.completed_units, 2);
    assert_eq!(metrics.dispatches, 4);
}

#[test]
fn test_run_started_from_finish_event_keeps_running() {
    let engine = wall_engine();
    engine.submit("quick", Duration::from_millis(500), 0).unwrap();

    // The first SchedulerFinished starts the next run from inside the old loop
    let next: Arc<Mutex<Option<RunOutcome>>> = Arc::new(Mutex::new(None));
    let started = Arc::new(AtomicBool::new(false));
    {
        let engine_ref = engine.clone();
        let next = Arc::clone(&next);
        let started = Arc::clone(&started);
        engine.set_observer(Arc::new(move |event: &Event| {
            if matches!(event, Event::SchedulerFinished { .. })
                && !started.swap(true, Ordering::SeqCst)
            {
                engine_ref
                    .submit("long", Duration::from_secs(100), 0)
                    .unwrap();
                let outcome = engine_ref.run(RunMode::Background).unwrap();
                *next.lock().unwrap() = Some(outcome);
            }
        }));
    }

    let first = engine.run(RunMode::Blocking).unwrap().wait().unwrap();
    assert_eq!(first.completed_units, 1);

    // The finished loop must not reset the phase owned by the new one
    assert!(engine.is_running());
    assert!(matches!(
        engine.run(RunMode::Background),
        Err(SchedulerError::AlreadyRunning)
    ));

    assert!(engine.stop());
    let outcome = next.lock().unwrap().take().expect("second run started");
    let second = outcome.wait().unwrap();
    assert_eq!(second.completed_units, 1);
    assert!(!engine.is_running());
}

#[test]
fn test_worker_panic_requeues_dispatched_unit() {
    let engine = CpuScheduler::with_clock(
        SchedulerConfig::round_robin(Duration::from_millis(500)),
        Arc::new(VirtualClock::new()),
    )
    .unwrap();
    let id = engine.submit("fragile", Duration::from_secs(1), 0).unwrap();

    let tripped = Arc::new(AtomicBool::new(false));
    {
        let tripped = Arc::clone(&tripped);
        engine.set_observer(Arc::new(move |event: &Event| {
            if matches!(event, Event::UnitRunning { .. }) && !tripped.swap(true, Ordering::SeqCst)
            {
                panic!("observer boom");
            }
        }));
    }

    let RunOutcome::Spawned(handle) = engine.run(RunMode::Background).unwrap() else {
        panic!("expected a worker");
    };
    assert_eq!(
        handle.join().unwrap_err(),
        SchedulerError::WorkerPanicked("observer boom".to_string())
    );

    assert!(!engine.is_running());
    assert_eq!(engine.current(), None);
    assert_eq!(engine.ready_len(), 1);
    let unit = engine.unit(id).unwrap();
    assert_eq!(unit.state(), UnitState::Ready);
    assert_eq!(unit.remaining(), Duration::from_secs(1));

    let metrics = engine.run(RunMode::Blocking).unwrap().wait().unwrap();
    assert_eq!(metrics.completed_units, 1);
    assert!(metrics.all_completed());
}

#[tokio::test]
async fn test_async_finished() {
    let engine = wall_engine();
    engine.submit("quick", Duration::from_millis(500), 0).unwrap();

    let RunOutcome::Spawned(mut handle) = engine.run(RunMode::Background).unwrap() else {
        panic!("expected a worker");
    };
    tokio::time::timeout(Duration::from_secs(5), handle.finished())
        .await
        .expect("worker finished in time");
    assert!(handle.is_finished());

    let metrics = handle.join().unwrap();
    assert_eq!(metrics.completed_units, 1);
}

#[tokio::test]
async fn test_wait_async() {
    let engine = wall_engine();
    engine.submit("a", Duration::from_millis(700), 0).unwrap();
    engine.submit("b", Duration::from_millis(300), 0).unwrap();

    let metrics = engine
        .run(RunMode::Background)
        .unwrap()
        .wait_async()
        .await
        .unwrap();
    assert_eq!(metrics.completed_units, 2);
    assert!(metrics.all_completed());
}
