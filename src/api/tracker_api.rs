// ==========================================
// 员工假期追踪系统 - 追踪记录 API
// ==========================================
// 职责: 追踪记录查询与按快照重新汇总
// ==========================================

use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::{Tracker, TrackerKey};
use crate::engine::error::parse_year;
use crate::engine::{TrackerAggregator, TrackerChange, YearRefreshSummary};
use crate::repository::TrackerRepository;

/// 追踪记录API
pub struct TrackerApi {
    tracker_repo: Arc<TrackerRepository>,
    aggregator: Arc<TrackerAggregator>,
}

impl TrackerApi {
    pub fn new(tracker_repo: Arc<TrackerRepository>, aggregator: Arc<TrackerAggregator>) -> Self {
        Self {
            tracker_repo,
            aggregator,
        }
    }

    /// 按 id 查询
    pub fn get_tracker(&self, tracker_id: i64) -> ApiResult<Tracker> {
        self.tracker_repo
            .find_by_id(tracker_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Tracker(id={})不存在", tracker_id)))
    }

    /// 查询某年度全部追踪记录
    pub fn list_trackers(&self, year: &str) -> ApiResult<Vec<Tracker>> {
        parse_year(year)?;
        Ok(self.tracker_repo.list_by_year(year)?)
    }

    /// 按快照重算单条追踪记录（不存在时创建）
    pub fn refresh_tracker(&self, employee_id: i64, leave_type_id: i64, year: &str) -> ApiResult<Tracker> {
        parse_year(year)?;
        let outcome = self
            .aggregator
            .refresh(&TrackerKey::new(employee_id, leave_type_id, year.trim()))?;
        if outcome.change != TrackerChange::Unchanged {
            info!(tracker_id = outcome.tracker.id, change = ?outcome.change, "追踪记录已按快照重算");
        }
        Ok(outcome.tracker)
    }

    /// 按快照重算某年度全部追踪记录
    pub fn refresh_year(&self, year: &str) -> ApiResult<YearRefreshSummary> {
        let year = parse_year(year)?;
        Ok(self.aggregator.refresh_year(year)?)
    }
}
