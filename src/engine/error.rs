// ==========================================
// 员工假期追踪系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行级错误与对账警告不走此类型, 以数据形式返回
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("年份无效: {0}")]
    InvalidYear(String),

    #[error("员工不存在: id={0}")]
    EmployeeNotFound(i64),

    #[error("假期类型不存在: id={0}")]
    LeaveTypeNotFound(i64),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// 解析年份字符串（四位数字, 允许首尾空白）
pub fn parse_year(year: &str) -> EngineResult<i32> {
    let trimmed = year.trim();
    if trimmed.len() != 4 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(EngineError::InvalidYear(year.to_string()));
    }
    trimmed
        .parse::<i32>()
        .map_err(|_| EngineError::InvalidYear(year.to_string()))
}
