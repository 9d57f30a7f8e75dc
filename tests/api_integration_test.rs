// ==========================================
// API 层集成测试（经 AppState 组装）
// ==========================================
// 测试目标: 导入→总览→写回→重算 全链路, 余额不变量, 错误转换
// ==========================================


use std::collections::BTreeMap;

use leave_tracker::api::{ApiError, CategoryDetail, ImportRequest};
use leave_tracker::app::AppState;
use leave_tracker::domain::{AllocationSnapshot, LeaveState};
use leave_tracker::i18n;
use leave_tracker::logging;
use leave_tracker::LeaveCategory;
use test_helpers::{create_test_db, csv_with_rows, seed_directory};

fn request_2025() -> ImportRequest {
    ImportRequest {
        update_existing: None,
        year: Some(2025),
    }
}

#[tokio::test]
async fn test_full_flow_keeps_balance_invariant() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    let ids = seed_directory(&state.directory_repo).unwrap();

    // 导入
    let bytes = csv_with_rows(&[
        "EMP001,John Doe,HR,Annual Leave,2025,20,5,2,15,3,0",
        "EMP002,Jane Roe,,Sick Leave,2025,10,1,0,9,0,0",
    ]);
    let response = state
        .import_api
        .import_upload("leave.csv", &bytes, request_2025())
        .await
        .unwrap();
    assert_eq!(response.result.created, 2);
    assert!(response.summary.contains("2025"));

    // 写回
    let mut updates = BTreeMap::new();
    updates.insert("annual_taken".to_string(), 7.0);
    updates.insert("casual_total".to_string(), 3.0);
    let report = state.overview_api.apply_edit(ids.john, &updates, "2025").unwrap();
    assert_eq!(report.applied_count(), 2);

    let john = state.overview_api.get_overview_row(ids.john, "2025").unwrap();
    assert_eq!(john.value("annual_balance"), Some(13.0));
    assert_eq!(john.value("casual_total"), Some(3.0));

    // 按快照重算
    state
        .snapshot_repo
        .insert_allocation(&AllocationSnapshot {
            employee_id: ids.jane,
            leave_type_id: ids.sick,
            number_of_days: 12.0,
            state: LeaveState::Validate,
        })
        .unwrap();
    let summary = state.tracker_api.refresh_year("2025").unwrap();
    assert!(summary.updated >= 1);

    for tracker in state.tracker_api.list_trackers("2025").unwrap() {
        assert_eq!(
            tracker.current_balance,
            tracker.total_allocation - tracker.taken_leaves,
            "tracker {} violates balance",
            tracker.name
        );
    }

    // 重算以快照为准: John 无快照, 数量归零; 结转字段保留
    let john = state.overview_api.get_overview_row(ids.john, "2025").unwrap();
    assert_eq!(john.value("annual_total"), Some(0.0));
    assert_eq!(john.annual_carry, 3.0);
    let jane = state.overview_api.get_overview_row(ids.jane, "2025").unwrap();
    assert_eq!(jane.value("medical_balance"), Some(12.0));
}

#[tokio::test]
async fn test_category_detail_and_no_data_notice() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    let ids = seed_directory(&state.directory_repo).unwrap();

    let bytes = csv_with_rows(&["EMP002,Jane Roe,,Sick Leave,2025,10,1,0,9,0,0"]);
    state
        .import_api
        .import_upload("leave.csv", &bytes, request_2025())
        .await
        .unwrap();

    match state
        .overview_api
        .category_detail(ids.jane, LeaveCategory::Medical, "2025")
        .unwrap()
    {
        CategoryDetail::Tracker { tracker } => assert_eq!(tracker.leave_type_name, "Sick Leave"),
        other => panic!("unexpected detail: {:?}", other),
    }

    i18n::set_locale("en");
    match state
        .overview_api
        .category_detail(ids.jane, LeaveCategory::Marriage, "2025")
        .unwrap()
    {
        CategoryDetail::NoData { message } => {
            assert_eq!(message, "No Marriage leave data found for Jane Roe")
        }
        other => panic!("unexpected detail: {:?}", other),
    }
}

#[tokio::test]
async fn test_import_validation_error_surfaces_verbatim() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();

    let err = state
        .import_api
        .import_upload("leave.csv", &[0xFF, 0xFE, 0x81, 0x8D], request_2025())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ImportError(_)));
    assert_eq!(err.to_string(), "Unable to decode CSV. Use UTF-8.");
}

#[test]
fn test_template_download() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();

    let template = state.import_api.download_template().unwrap();
    assert_eq!(template.file_name, "hr_leave_template.csv");
    let text = String::from_utf8(template.content).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(test_helpers::TEMPLATE_HEADER));
    assert_eq!(lines.next(), Some("EMP001,John Doe,HR,Annual Leave,2025,20,5,2,15,3,0"));
}

#[test]
fn test_api_argument_errors() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();

    assert!(matches!(
        state.overview_api.list_overview("2k25"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        state.overview_api.apply_edit(1, &BTreeMap::new(), "2025"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(state.tracker_api.get_tracker(77), Err(ApiError::NotFound(_))));
}
