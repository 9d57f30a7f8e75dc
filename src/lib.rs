// ==========================================
// 员工假期追踪系统 - 核心库
// ==========================================
// 职责: 假期余额汇总、员工总览透视与写回、批量导入
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{LeaveCategory, LeaveState, TrackerField};

// 领域实体
pub use domain::{
    ImportBatchResult, OverviewRow, RowError, RowErrorKind, Tracker, TrackerKey, TrackerPatch,
};

// 引擎
pub use engine::{classify, OverviewProjector, OverviewReconciler, ReconcileReport, TrackerAggregator};

// 导入
pub use importer::{LeaveImporterImpl, TrackerImporter};

// API
pub use api::{ImportApi, OverviewApi, TrackerApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Leave Tracker";
