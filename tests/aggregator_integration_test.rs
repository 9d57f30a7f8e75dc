// ==========================================
// TrackerAggregator 集成测试
// ==========================================
// 测试目标: 快照汇总、幂等、年度刷新、余额不变量
// ==========================================


use leave_tracker::domain::{LeaveState, TrackerKey};
use leave_tracker::engine::TrackerChange;
use leave_tracker::logging;
use test_helpers::TestEnv;

#[test]
fn test_refresh_creates_tracker_from_snapshots() {
    logging::init_test();
    let env = TestEnv::new().unwrap();
    let ids = env.ids;

    env.allocate(ids.john, ids.annual, 15.0, LeaveState::Validate);
    env.allocate(ids.john, ids.annual, 5.0, LeaveState::Validate);
    env.allocate(ids.john, ids.annual, 9.0, LeaveState::Draft);
    env.request(ids.john, ids.annual, 3.0, LeaveState::Validate, "2025-03-03", "2025-03-05");
    env.request(ids.john, ids.annual, 2.0, LeaveState::Confirm, "2025-07-01", "2025-07-02");
    env.request(ids.john, ids.annual, 4.0, LeaveState::Refuse, "2025-08-01", "2025-08-04");
    // 跨年假单不计入
    env.request(ids.john, ids.annual, 2.0, LeaveState::Validate, "2025-12-31", "2026-01-01");

    let outcome = env
        .aggregator()
        .refresh(&TrackerKey::new(ids.john, ids.annual, "2025"))
        .unwrap();

    assert_eq!(outcome.change, TrackerChange::Created);
    let tracker = outcome.tracker;
    assert_eq!(tracker.total_allocation, 20.0);
    assert_eq!(tracker.taken_leaves, 3.0);
    assert_eq!(tracker.pending_requests, 2.0);
    assert_eq!(tracker.current_balance, 17.0);
    assert_eq!(tracker.name, "John Doe - Annual Leave (2025)");
    assert_eq!(tracker.employee_number, "EMP001");
}

#[test]
fn test_refresh_is_idempotent() {
    logging::init_test();
    let env = TestEnv::new().unwrap();
    let ids = env.ids;
    let key = TrackerKey::new(ids.jane, ids.sick, "2025");

    env.allocate(ids.jane, ids.sick, 10.0, LeaveState::Validate);
    env.request(ids.jane, ids.sick, 1.5, LeaveState::Validate, "2025-02-10", "2025-02-11");

    let aggregator = env.aggregator();
    let first = aggregator.refresh(&key).unwrap();
    let second = aggregator.refresh(&key).unwrap();

    assert_eq!(second.change, TrackerChange::Unchanged);
    let stored = env.trackers.find_by_key(&key).unwrap().unwrap();
    assert_eq!(stored.total_allocation, first.tracker.total_allocation);
    assert_eq!(stored.taken_leaves, first.tracker.taken_leaves);
    assert_eq!(stored.pending_requests, first.tracker.pending_requests);
    assert_eq!(stored.current_balance, 8.5);
}

#[test]
fn test_refresh_keeps_carry_fields() {
    logging::init_test();
    let env = TestEnv::new().unwrap();
    let ids = env.ids;
    let key = TrackerKey::new(ids.john, ids.annual, "2025");

    env.allocate(ids.john, ids.annual, 12.0, LeaveState::Validate);
    let aggregator = env.aggregator();
    let created = aggregator.refresh(&key).unwrap().tracker;

    let mut tracker = created.clone();
    tracker.annual_carry = 4.0;
    env.trackers.update(&tracker).unwrap();

    env.request(ids.john, ids.annual, 2.0, LeaveState::Validate, "2025-05-05", "2025-05-06");
    let outcome = aggregator.refresh(&key).unwrap();

    assert_eq!(outcome.change, TrackerChange::Updated);
    assert_eq!(outcome.tracker.annual_carry, 4.0);
    assert_eq!(outcome.tracker.current_balance, 10.0);
}

#[test]
fn test_refresh_year_covers_snapshots_and_existing_trackers() {
    logging::init_test();
    let env = TestEnv::new().unwrap();
    let ids = env.ids;

    env.allocate(ids.john, ids.annual, 20.0, LeaveState::Validate);
    env.request(ids.jane, ids.casual, 1.0, LeaveState::Confirm, "2025-04-01", "2025-04-01");

    let aggregator = env.aggregator();
    let summary = aggregator.refresh_year(2025).unwrap();
    assert_eq!(summary.created, 2);
    assert_eq!(summary.updated, 0);

    let again = aggregator.refresh_year(2025).unwrap();
    assert_eq!(again.created, 0);
    assert_eq!(again.unchanged, 2);

    for tracker in env.trackers.list_by_year("2025").unwrap() {
        assert_eq!(
            tracker.current_balance,
            tracker.total_allocation - tracker.taken_leaves
        );
    }
}

#[test]
fn test_refresh_unknown_employee_is_error() {
    logging::init_test();
    let env = TestEnv::new().unwrap();
    let result = env
        .aggregator()
        .refresh(&TrackerKey::new(9999, env.ids.annual, "2025"));
    assert!(result.is_err());
}
