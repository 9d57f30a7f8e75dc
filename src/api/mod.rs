// ==========================================
// 员工假期追踪系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供命令行/上层应用调用
// ==========================================

pub mod error;
pub mod import_api;
pub mod overview_api;
pub mod tracker_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportApiResponse, ImportRequest, TemplateFile};
pub use overview_api::{CategoryDetail, OverviewApi};
pub use tracker_api::TrackerApi;
