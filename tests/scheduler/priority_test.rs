/*!
 * Priority Scheduling Tests
 * Heap ordering, admission-triggered preemption and non-preemptive mode
 */

use pretty_assertions::assert_eq;
use resource_sim::core::types::UnitId;
use resource_sim::monitoring::Event;
use resource_sim::{
    silent_observer, CpuScheduler, Observer, RunMode, SchedulerConfig, VirtualClock, WallClock,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn virtual_engine(preemptive: bool) -> CpuScheduler {
    CpuScheduler::with_clock(
        SchedulerConfig::priority(preemptive),
        Arc::new(VirtualClock::new()),
    )
    .unwrap()
    .with_observer(silent_observer())
}

/// Observer that submits an urgent unit the first time `trigger` starts running
fn arrive_on_first_run(engine: &CpuScheduler, trigger: UnitId) -> Observer {
    let handle = engine.clone();
    let fired = AtomicBool::new(false);
    Arc::new(move |event: &Event| {
        if let Event::UnitRunning { id, .. } = event {
            if *id == trigger && !fired.swap(true, Ordering::SeqCst) {
                handle
                    .submit("high", Duration::from_millis(300), 1)
                    .unwrap();
            }
        }
    })
}

#[test]
fn test_heap_order_with_ties() {
    let engine = virtual_engine(true);
    let first = engine.submit("p3-first", Duration::from_millis(100), 3).unwrap();
    let urgent = engine.submit("p1", Duration::from_millis(100), 1).unwrap();
    let second = engine.submit("p3-second", Duration::from_millis(100), 3).unwrap();
    let lazy = engine.submit("p7", Duration::from_millis(100), 7).unwrap();

    assert_eq!(engine.status().ready, vec![urgent, first, second, lazy]);

    let metrics = engine.run(RunMode::Blocking).unwrap().wait().unwrap();
    assert_eq!(metrics.completion_order, vec![urgent, first, second, lazy]);
    assert_eq!(metrics.preemptions, 0);
}

#[test]
fn test_preemptive_arrival() {
    let engine = virtual_engine(true);
    let low = engine.submit("low", Duration::from_secs(1), 5).unwrap();
    engine.set_observer(arrive_on_first_run(&engine, low));

    let metrics = engine.run(RunMode::Blocking).unwrap().wait().unwrap();
    engine.set_observer(silent_observer());

    let high = metrics.completion_order[0];
    assert_eq!(metrics.completion_order, vec![high, low]);
    assert_eq!(metrics.preemptions, 1);
    assert_eq!(metrics.dispatches, 3);

    let high_unit = engine.unit(high).unwrap();
    let low_unit = engine.unit(low).unwrap();
    assert_eq!(
        high_unit.metrics().completion_time,
        Some(Duration::from_millis(300))
    );
    assert_eq!(
        low_unit.metrics().completion_time,
        Some(Duration::from_millis(1300))
    );
    assert_eq!(
        low_unit.metrics().waiting_time,
        Some(Duration::from_millis(300))
    );

    let events = engine.events();
    let triggered = events
        .iter()
        .position(|r| matches!(r.event, Event::PreemptionTriggered { running, .. } if running == low))
        .expect("preemption event");
    let preempted = events
        .iter()
        .position(|r| matches!(r.event, Event::UnitPreempted { id, .. } if id == low))
        .expect("preempted event");
    assert!(triggered < preempted);
}

#[test]
fn test_non_preemptive_arrival_waits() {
    let engine = virtual_engine(false);
    let low = engine.submit("low", Duration::from_secs(1), 5).unwrap();
    engine.set_observer(arrive_on_first_run(&engine, low));

    let metrics = engine.run(RunMode::Blocking).unwrap().wait().unwrap();
    engine.set_observer(silent_observer());

    let high = metrics.completion_order[1];
    assert_eq!(metrics.completion_order, vec![low, high]);
    assert_eq!(metrics.preemptions, 0);
    assert_eq!(metrics.dispatches, 2);
    assert_eq!(
        engine.unit(high).unwrap().metrics().waiting_time,
        Some(Duration::from_secs(1))
    );
    assert!(!engine
        .events()
        .iter()
        .any(|r| matches!(r.event, Event::PreemptionTriggered { .. })));
}

#[test]
fn test_equal_priority_does_not_preempt() {
    let engine = virtual_engine(true);
    let first = engine.submit("first", Duration::from_millis(500), 2).unwrap();
    let handle = engine.clone();
    let fired = AtomicBool::new(false);
    engine.set_observer(Arc::new(move |event: &Event| {
        if matches!(event, Event::UnitRunning { .. }) && !fired.swap(true, Ordering::SeqCst) {
            handle.submit("peer", Duration::from_millis(100), 2).unwrap();
        }
    }));

    let metrics = engine.run(RunMode::Blocking).unwrap().wait().unwrap();
    engine.set_observer(silent_observer());

    assert_eq!(metrics.completion_order[0], first);
    assert_eq!(metrics.preemptions, 0);
}

#[test]
fn test_preemption_on_wall_clock() {
    // 1 simulated second = 10ms wall
    let engine = CpuScheduler::with_clock(
        SchedulerConfig::priority(true),
        Arc::new(WallClock::scaled(0.01)),
    )
    .unwrap()
    .with_observer(silent_observer());

    let low = engine.submit("low", Duration::from_secs(20), 5).unwrap();
    let outcome = engine.run(RunMode::Background).unwrap();

    thread::sleep(Duration::from_millis(30));
    let high = engine.submit("high", Duration::from_millis(500), 0).unwrap();

    let metrics = outcome.wait().unwrap();
    assert_eq!(metrics.completion_order, vec![high, low]);
    assert!(metrics.preemptions >= 1);

    let low_unit = engine.unit(low).unwrap();
    assert!(low_unit.metrics().waiting_time.unwrap() >= Duration::from_millis(500));
}
