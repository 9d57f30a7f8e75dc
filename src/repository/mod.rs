// ==========================================
// 员工假期追踪系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod collaborators;
pub mod directory_repo;
pub mod error;
pub mod snapshot_repo;
pub mod tracker_repo;

// 重导出核心仓储
pub use collaborators::{EmployeeDirectory, LeaveTypeCatalog, SnapshotSource};
pub use directory_repo::DirectoryRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use snapshot_repo::SnapshotRepository;
pub use tracker_repo::TrackerRepository;
