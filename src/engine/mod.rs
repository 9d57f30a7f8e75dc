// ==========================================
// 员工假期追踪系统 - 引擎层
// ==========================================
// 职责: 类型匹配 / 汇总 / 总览投影 / 总览写回
// 红线: Engine 不拼 SQL, 数据访问经由仓储与协作方接口
// ==========================================

pub mod aggregator;
pub mod error;
pub mod projector;
pub mod reconciler;
pub mod type_matcher;

// 重导出核心引擎
pub use aggregator::{aggregate, RefreshOutcome, TrackerAggregator, TrackerChange, YearRefreshSummary};
pub use error::{EngineError, EngineResult};
pub use projector::{select_for_category, CategoryMatch, OverviewProjector};
pub use reconciler::{FieldOutcome, OverviewReconciler, ReconcileReport, ReconcileWarning};
pub use type_matcher::{classify, matches_category};
