/*!
 * Round-Robin Tests
 * Deterministic runs on the virtual clock
 */

use pretty_assertions::assert_eq;
use resource_sim::monitoring::Event;
use resource_sim::{
    silent_observer, CpuScheduler, RunMode, SchedulerConfig, UnitState, VirtualClock,
};
use std::sync::Arc;
use std::time::Duration;

fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}

fn engine(quantum: Duration) -> CpuScheduler {
    CpuScheduler::with_clock(
        SchedulerConfig::round_robin(quantum),
        Arc::new(VirtualClock::new()),
    )
    .unwrap()
    .with_observer(silent_observer())
}

#[test]
fn test_round_robin_fixture() {
    let engine = engine(Duration::from_millis(500));
    let a = engine.submit("A", secs(2.0), 0).unwrap();
    let b = engine.submit("B", secs(1.5), 0).unwrap();
    let c = engine.submit("C", secs(1.0), 0).unwrap();
    let d = engine.submit("D", secs(2.5), 0).unwrap();

    let metrics = engine.run(RunMode::Blocking).unwrap().wait().unwrap();

    assert_eq!(metrics.completion_order, vec![c, b, a, d]);
    assert_eq!(metrics.dispatches, 14);
    assert_eq!(metrics.context_switches, 12);
    assert_eq!(metrics.quantum_expirations, 10);
    assert_eq!(metrics.preemptions, 0);
    assert_eq!(metrics.avg_waiting_time, Duration::from_millis(3625));
    assert_eq!(metrics.avg_turnaround_time, Duration::from_millis(5375));
    assert_eq!(metrics.avg_response_time, Duration::from_millis(750));
    assert_eq!(metrics.total_execution_time, secs(7.0));

    let completions: Vec<(String, Duration)> = metrics
        .units
        .iter()
        .map(|r| (r.name.clone(), r.completion))
        .collect();
    assert_eq!(
        completions,
        vec![
            ("C".to_string(), secs(3.5)),
            ("B".to_string(), secs(5.0)),
            ("A".to_string(), secs(6.0)),
            ("D".to_string(), secs(7.0)),
        ]
    );
}

#[test]
fn test_completed_unit_invariants() {
    let engine = engine(Duration::from_millis(300));
    for (name, burst) in [("x", 0.7), ("y", 0.2), ("z", 1.1)] {
        engine.submit(name, secs(burst), 0).unwrap();
    }
    engine.run(RunMode::Blocking).unwrap();

    for unit in engine.units() {
        let m = unit.metrics();
        assert_eq!(unit.state(), UnitState::Completed);
        assert_eq!(unit.remaining(), Duration::ZERO);
        assert_eq!(
            m.turnaround_time.unwrap(),
            m.completion_time.unwrap() - unit.arrival
        );
        assert_eq!(
            m.waiting_time.unwrap(),
            m.turnaround_time.unwrap() - unit.burst
        );
        assert!(m.response_time.unwrap() <= m.waiting_time.unwrap());
    }
}

#[test]
fn test_priority_ignored() {
    let engine = engine(Duration::from_secs(1));
    let low = engine.submit("low", secs(0.5), 9).unwrap();
    let high = engine.submit("high", secs(0.5), 0).unwrap();

    let metrics = engine.run(RunMode::Blocking).unwrap().wait().unwrap();
    assert_eq!(metrics.completion_order, vec![low, high]);
}

#[test]
fn test_slices_never_exceed_quantum() {
    let engine = engine(Duration::from_millis(400));
    engine.submit("long", Duration::from_secs(1), 0).unwrap();
    engine.submit("short", Duration::from_millis(100), 0).unwrap();
    engine.run(RunMode::Blocking).unwrap();

    let events = engine.events();
    let running: Vec<Duration> = events
        .iter()
        .filter(|r| matches!(r.event, Event::UnitRunning { .. }))
        .map(|r| r.at)
        .collect();

    // long: 0.0, short: 0.4, long: 0.5, long: 0.9
    let ms = Duration::from_millis;
    assert_eq!(running, vec![ms(0), ms(400), ms(500), ms(900)]);
    assert_eq!(engine.metrics().context_switches, 2);
}

#[test]
fn test_quantum_change_applies_next_dispatch() {
    let engine = engine(Duration::from_millis(500));
    engine.submit("a", secs(1.0), 0).unwrap();
    engine.set_quantum(Duration::from_millis(250)).unwrap();

    let metrics = engine.run(RunMode::Blocking).unwrap().wait().unwrap();
    assert_eq!(metrics.dispatches, 4);
}

#[test]
fn test_completed_unit_admission_is_noop() {
    let engine = engine(Duration::from_millis(500));
    let id = engine.submit("once", secs(0.5), 0).unwrap();
    engine.run(RunMode::Blocking).unwrap();

    let done = engine.unit(id).unwrap();
    assert_eq!(engine.admit(done), Ok(false));
    assert_eq!(engine.ready_len(), 0);
    assert!(engine
        .events()
        .iter()
        .any(|r| matches!(r.event, Event::AdmissionIgnored { id: ignored, .. } if ignored == id)));

    // Nothing to do on a second run
    let metrics = engine.run(RunMode::Blocking).unwrap().wait().unwrap();
    assert_eq!(metrics.completed_units, 1);
    assert_eq!(metrics.dispatches, 1);
}
