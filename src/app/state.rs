// ==========================================
// 员工假期追踪系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 所有仓储共享同一数据库连接
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ImportApi, OverviewApi, TrackerApi};
use crate::config::ConfigManager;
use crate::db::{initialize_schema, open_sqlite_connection};
use crate::engine::{OverviewProjector, OverviewReconciler, TrackerAggregator};
use crate::importer::LeaveImporterImpl;
use crate::repository::{
    DirectoryRepository, EmployeeDirectory, LeaveTypeCatalog, SnapshotRepository, SnapshotSource,
    TrackerRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 追踪记录API
    pub tracker_api: Arc<TrackerApi>,

    /// 假期总览API
    pub overview_api: Arc<OverviewApi>,

    /// 数据导入API
    pub import_api: Arc<ImportApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 员工/假期类型主数据（镜像表）
    pub directory_repo: Arc<DirectoryRepository>,

    /// 假期分配/假单快照（镜像表）
    pub snapshot_repo: Arc<SnapshotRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表
    /// 2. 初始化所有Repository与Engine
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        initialize_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let directory_repo = Arc::new(DirectoryRepository::from_connection(conn.clone()));
        let snapshot_repo = Arc::new(SnapshotRepository::from_connection(conn.clone()));
        let tracker_repo = Arc::new(TrackerRepository::from_connection(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let directory: Arc<dyn EmployeeDirectory> = directory_repo.clone();
        let catalog: Arc<dyn LeaveTypeCatalog> = directory_repo.clone();
        let snapshots: Arc<dyn SnapshotSource> = snapshot_repo.clone();

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let aggregator = Arc::new(TrackerAggregator::new(
            directory.clone(),
            catalog.clone(),
            snapshots,
            tracker_repo.clone(),
        ));
        let projector = Arc::new(OverviewProjector::new(directory.clone(), tracker_repo.clone()));
        let reconciler = Arc::new(OverviewReconciler::new(
            directory.clone(),
            catalog.clone(),
            tracker_repo.clone(),
        ));
        let importer = Arc::new(LeaveImporterImpl::new(
            directory.clone(),
            catalog,
            tracker_repo.clone(),
            config_manager.clone(),
        ));

        // ==========================================
        // 创建API实例
        // ==========================================
        let tracker_api = Arc::new(TrackerApi::new(tracker_repo.clone(), aggregator));
        let overview_api = Arc::new(OverviewApi::new(directory, tracker_repo, projector, reconciler));
        let import_api = Arc::new(ImportApi::new(importer));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            tracker_api,
            overview_api,
            import_api,
            config_manager,
            directory_repo,
            snapshot_repo,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

/// 默认数据库路径
///
/// 优先级: LEAVE_TRACKER_DB_PATH 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("LEAVE_TRACKER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./leave_tracker.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("leave-tracker");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("leave_tracker.db");
        }
    }

    path.to_string_lossy().to_string()
}
