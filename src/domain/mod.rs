// ==========================================
// 员工假期追踪系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务不变量
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod directory;
pub mod import;
pub mod overview;
pub mod tracker;
pub mod types;

// 重导出核心类型
pub use directory::{AllocationSnapshot, Department, Employee, LeaveRequestSnapshot, LeaveType};
pub use import::{
    is_blank_row, ImportBatchResult, ImportColumn, ImportOptions, ImportRow, NormalizedImportRow, RowError,
    RowErrorKind,
};
pub use overview::{AmbiguousMatch, CategoryFigures, OverviewField, OverviewFieldError, OverviewRow};
pub use tracker::{
    display_label, ImportedTrackerValues, Tracker, TrackerAmounts, TrackerKey, TrackerPatch,
};
pub use types::{LeaveCategory, LeaveState, TrackerField};
