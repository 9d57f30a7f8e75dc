// ==========================================
// 总览投影 / 写回 集成测试
// ==========================================
// 测试目标: 投影与写回往返、部分失败、平局规则、歧义标注
// ==========================================


use std::collections::BTreeMap;
use std::sync::Arc;

use leave_tracker::domain::{LeaveCategory, LeaveType, Tracker, TrackerPatch};
use leave_tracker::engine::{FieldOutcome, OverviewReconciler, ReconcileWarning};
use leave_tracker::logging;
use leave_tracker::repository::{
    EmployeeDirectory, LeaveTypeCatalog, RepositoryError, RepositoryResult,
};
use leave_tracker::TrackerField;
use test_helpers::TestEnv;

fn edits(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn insert_tracker(env: &TestEnv, employee_id: i64, leave_type_id: i64, total: f64) -> i64 {
    let employee = env.directory.find_employee(employee_id).unwrap().unwrap();
    let leave_type = LeaveType {
        id: leave_type_id,
        name: leave_type_name(env, leave_type_id),
    };
    let mut tracker = Tracker::new(&employee, &leave_type, "2025");
    tracker.apply_patch(&TrackerPatch::new().with(TrackerField::TotalAllocation, total));
    env.trackers.insert(&tracker).unwrap()
}

fn leave_type_name(env: &TestEnv, leave_type_id: i64) -> String {
    use leave_tracker::repository::LeaveTypeCatalog;
    env.directory
        .find_leave_type(leave_type_id)
        .unwrap()
        .map(|t| t.name)
        .unwrap_or_default()
}

#[test]
fn test_annual_total_round_trip() {
    logging::init_test();
    let env = TestEnv::new().unwrap();
    let john = env.ids.john;

    let report = env
        .reconciler()
        .apply(john, &edits(&[("annual_total", 30.0)]), "2025")
        .unwrap();
    assert_eq!(report.created_tracker_ids.len(), 1);
    assert!(!report.has_warnings());

    let row = env.projector().project_employee(john, "2025").unwrap().unwrap();
    assert_eq!(row.value("annual_total"), Some(30.0));
    assert_eq!(row.value("annual_balance"), Some(30.0));
    assert_eq!(row.department_name.as_deref(), Some("HR"));

    // 再次写回落到同一条记录
    let report = env
        .reconciler()
        .apply(john, &edits(&[("annual_taken", 4.0), ("annual_carry", 2.0)]), "2025")
        .unwrap();
    assert!(report.created_tracker_ids.is_empty());
    assert_eq!(report.updated_tracker_ids.len(), 1);

    let row = env.projector().project_employee(john, "2025").unwrap().unwrap();
    assert_eq!(row.value("annual_total"), Some(30.0));
    assert_eq!(row.value("annual_balance"), Some(26.0));
    assert_eq!(row.annual_carry, 2.0);
}

#[test]
fn test_partial_failure_still_succeeds() {
    logging::init_test();
    let env = TestEnv::new().unwrap();
    let john = env.ids.john;

    // 没有任何假期类型能归入 unpaid
    let report = env
        .reconciler()
        .apply(
            john,
            &edits(&[("medical_total", 8.0), ("unpaid_total", 5.0), ("casual_balance", 1.0)]),
            "2025",
        )
        .unwrap();

    assert!(matches!(
        report.fields.get("medical_total"),
        Some(FieldOutcome::Applied { created: true, .. })
    ));
    assert_eq!(report.fields.get("unpaid_total"), Some(&FieldOutcome::Skipped));
    assert_eq!(report.fields.get("casual_balance"), Some(&FieldOutcome::Skipped));
    assert_eq!(report.applied_count(), 1);
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        ReconcileWarning::NoMatchingLeaveType {
            category: LeaveCategory::Unpaid,
            ..
        }
    )));
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, ReconcileWarning::InvalidField { field, .. } if field == "casual_balance")));

    let row = env.projector().project_employee(john, "2025").unwrap().unwrap();
    assert_eq!(row.value("medical_total"), Some(8.0));
    assert_eq!(row.value("unpaid_total"), Some(0.0));
}

#[test]
fn test_reconciler_rejects_unknown_employee_and_bad_year() {
    logging::init_test();
    let env = TestEnv::new().unwrap();
    let reconciler = env.reconciler();

    assert!(reconciler.apply(4242, &edits(&[("annual_total", 1.0)]), "2025").is_err());
    assert!(reconciler
        .apply(env.ids.john, &edits(&[("annual_total", 1.0)]), "twenty")
        .is_err());
    assert_eq!(env.trackers.count().unwrap(), 0);
}

#[test]
fn test_projection_lists_active_employees_with_zeroes() {
    logging::init_test();
    let env = TestEnv::new().unwrap();
    insert_tracker(&env, env.ids.jane, env.ids.casual, 6.0);

    let rows = env.projector().project("2025").unwrap();
    assert_eq!(rows.len(), 2);

    let jane = rows.iter().find(|r| r.employee_id == env.ids.jane).unwrap();
    assert_eq!(jane.value("casual_total"), Some(6.0));
    assert_eq!(jane.value("medical_total"), Some(0.0));
    assert_eq!(jane.department_name, None);

    let john = rows.iter().find(|r| r.employee_id == env.ids.john).unwrap();
    assert!(john.to_columns().values().all(|v| *v == 0.0));

    env.directory.set_employee_active(env.ids.jane, false).unwrap();
    let rows = env.projector().project("2025").unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_tie_break_prefers_most_recent_update() {
    logging::init_test();
    let env = TestEnv::new().unwrap();
    let medical = env.directory.insert_leave_type("Medical Leave").unwrap();

    let older = insert_tracker(&env, env.ids.john, env.ids.sick, 10.0);
    let newer = insert_tracker(&env, env.ids.john, medical, 12.0);

    let row = env.projector().project_employee(env.ids.john, "2025").unwrap().unwrap();
    assert_eq!(row.figures(LeaveCategory::Medical).tracker_id, Some(newer));

    // 更新较早的记录后它成为最新
    let mut tracker = env.trackers.find_by_id(older).unwrap().unwrap();
    tracker.taken_leaves = 1.0;
    tracker.recompute_balance();
    env.trackers.update(&tracker).unwrap();

    let row = env.projector().project_employee(env.ids.john, "2025").unwrap().unwrap();
    let figures = row.figures(LeaveCategory::Medical);
    assert_eq!(figures.tracker_id, Some(older));
    assert_eq!(figures.balance, 9.0);

    let ambiguity = row
        .ambiguities
        .iter()
        .find(|a| a.category == LeaveCategory::Medical)
        .unwrap();
    assert_eq!(ambiguity.chosen_tracker_id, older);
    assert_eq!(ambiguity.candidate_tracker_ids, vec![older, newer]);

    // 写回落到总览显示的那条记录
    let report = env
        .reconciler()
        .apply(env.ids.john, &edits(&[("medical_pending", 2.0)]), "2025")
        .unwrap();
    assert_eq!(report.updated_tracker_ids, vec![older]);
}

#[test]
fn test_overlapping_name_is_flagged() {
    logging::init_test();
    let env = TestEnv::new().unwrap();
    let overlap = env.directory.insert_leave_type("Annual Sick Leave").unwrap();
    let id = insert_tracker(&env, env.ids.john, overlap, 7.0);

    let row = env.projector().project_employee(env.ids.john, "2025").unwrap().unwrap();
    assert_eq!(row.figures(LeaveCategory::Annual).tracker_id, Some(id));
    assert_eq!(row.figures(LeaveCategory::Medical).tracker_id, Some(id));

    let annual = row
        .ambiguities
        .iter()
        .find(|a| a.category == LeaveCategory::Annual)
        .unwrap();
    assert_eq!(annual.shared_with, vec![LeaveCategory::Medical]);
}

#[test]
fn test_deleting_employee_cascades_to_trackers() {
    logging::init_test();
    let env = TestEnv::new().unwrap();
    insert_tracker(&env, env.ids.jane, env.ids.annual, 10.0);
    insert_tracker(&env, env.ids.john, env.ids.annual, 10.0);

    env.directory.delete_employee(env.ids.jane).unwrap();
    let remaining = env.trackers.list_by_year("2025").unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].employee_id, env.ids.john);

    env.directory.delete_leave_type(env.ids.annual).unwrap();
    assert_eq!(env.trackers.count().unwrap(), 0);
}

#[test]
fn test_out_of_range_values_are_rejected() {
    logging::init_test();
    let env = TestEnv::new().unwrap();
    let john = env.ids.john;

    let report = env
        .reconciler()
        .apply(
            john,
            &edits(&[
                ("annual_total", -5.0),
                ("casual_taken", f64::NAN),
                ("medical_pending", f64::INFINITY),
                ("annual_carry", -1.0),
            ]),
            "2025",
        )
        .unwrap();

    for field in ["annual_total", "casual_taken", "medical_pending"] {
        assert_eq!(report.fields.get(field), Some(&FieldOutcome::Skipped));
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, ReconcileWarning::InvalidField { field: f, .. } if f == field)));
    }
    // 结转字段允许为负
    assert!(matches!(
        report.fields.get("annual_carry"),
        Some(FieldOutcome::Applied { created: true, .. })
    ));
    let row = env.projector().project_employee(john, "2025").unwrap().unwrap();
    assert_eq!(row.value("annual_total"), Some(0.0));
    assert_eq!(row.annual_carry, -1.0);
}

/// 列表查询失败的假期类型目录
struct UnavailableCatalog;

impl LeaveTypeCatalog for UnavailableCatalog {
    fn find_leave_type(&self, _leave_type_id: i64) -> RepositoryResult<Option<LeaveType>> {
        Ok(None)
    }

    fn find_leave_type_by_name(&self, _name: &str) -> RepositoryResult<Option<LeaveType>> {
        Ok(None)
    }

    fn list_leave_types(&self) -> RepositoryResult<Vec<LeaveType>> {
        Err(RepositoryError::LockError("catalog offline".to_string()))
    }
}

#[test]
fn test_catalog_failure_keeps_committed_categories() {
    logging::init_test();
    let env = TestEnv::new().unwrap();
    let john = env.ids.john;
    let annual_id = insert_tracker(&env, john, env.ids.annual, 10.0);

    let reconciler = OverviewReconciler::new(
        env.directory.clone(),
        Arc::new(UnavailableCatalog),
        env.trackers.clone(),
    );
    let report = reconciler
        .apply(john, &edits(&[("annual_taken", 2.0), ("medical_total", 5.0)]), "2025")
        .unwrap();

    assert_eq!(report.updated_tracker_ids, vec![annual_id]);
    assert_eq!(report.fields.get("medical_total"), Some(&FieldOutcome::Skipped));
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        ReconcileWarning::StoreFailed {
            category: LeaveCategory::Medical,
            ..
        }
    )));

    let row = env.projector().project_employee(john, "2025").unwrap().unwrap();
    assert_eq!(row.value("annual_balance"), Some(8.0));
}
