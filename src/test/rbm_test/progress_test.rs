use super::*;
use std::time::Duration;

#[test]
fn test_step_monitor_describe() {
    assert_eq!(
        StepMonitor::describe(50, 100, Duration::from_secs(10)),
        "50% complete, 10s remaining, #50"
    );
    assert_eq!(
        StepMonitor::describe(5, 100, Duration::from_secs(1)),
        "05% complete, 19s remaining, #5"
    );
    assert_eq!(
        StepMonitor::describe(0, 100, Duration::from_secs(3)),
        "00% complete, 0s remaining, #0"
    );
}

#[test]
fn test_step_monitor_throttles() {
    let mut monitor = StepMonitor::new();
    // Must not panic or block, whatever the cadence
    for step in 0..100 {
        monitor.tick(step, 100);
    }
    monitor.finish();
}

#[test]
fn test_closure_monitor() {
    let mut total_seen = 0;
    let mut monitor = |_step: usize, total: usize| total_seen = total;
    ProgressMonitor::tick(&mut monitor, 3, 12);
    ProgressMonitor::finish(&mut monitor);
    assert_eq!(total_seen, 12);
}

#[test]
fn test_progress_bar_monitor() {
    let mut monitor = ProgressBarMonitor::default();
    monitor.tick(0, 10);
    monitor.tick(5, 10);
    monitor.finish();
    // Finishing twice is harmless
    monitor.finish();
}
