// ==========================================
// 员工假期追踪系统 - 配置读取 Trait
// ==========================================
// 职责: 定义导入/展示所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::RepositoryResult;
use async_trait::async_trait;

// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait TrackerConfigReader: Send + Sync {
    /// 导入时已存在记录是否更新（默认 true）
    async fn get_update_existing(&self) -> RepositoryResult<bool>;

    /// 导入汇总中展示的错误条数上限（默认 10）
    async fn get_error_summary_limit(&self) -> RepositoryResult<usize>;

    /// 界面语言（默认 en）
    async fn get_locale(&self) -> RepositoryResult<String>;
}
