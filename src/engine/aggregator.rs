// ==========================================
// 员工假期追踪系统 - 追踪记录汇总引擎
// ==========================================
// 输入: (员工, 假期类型, 年份) + 分配/假单快照
// 输出: total_allocation / taken_leaves / pending_requests / current_balance
// 红线: 汇总为纯函数, 重复执行结果一致; 不触碰结转字段
// ==========================================

use crate::domain::{
    AllocationSnapshot, LeaveRequestSnapshot, LeaveState, Tracker, TrackerAmounts, TrackerKey,
};
use crate::engine::error::{parse_year, EngineError, EngineResult};
use crate::repository::{EmployeeDirectory, LeaveTypeCatalog, SnapshotSource, TrackerRepository};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// 由快照计算三项数量
///
/// - total: 已批准分配之和（分配不按年份过滤）
/// - taken: 已批准且区间完整落在该年内的假单之和
/// - pending: 待审批且区间完整落在该年内的假单之和
pub fn aggregate(
    year: i32,
    allocations: &[AllocationSnapshot],
    requests: &[LeaveRequestSnapshot],
) -> TrackerAmounts {
    let total_allocation = allocations
        .iter()
        .filter(|a| a.state == LeaveState::Validate)
        .map(|a| a.number_of_days)
        .sum();

    let sum_requests = |state: LeaveState| -> f64 {
        requests
            .iter()
            .filter(|r| r.state == state && r.within_year(year))
            .map(|r| r.number_of_days)
            .sum()
    };

    TrackerAmounts {
        total_allocation,
        taken_leaves: sum_requests(LeaveState::Validate),
        pending_requests: sum_requests(LeaveState::Confirm),
    }
}

/// 年度起止日（闭区间）
pub fn year_bounds(year: i32) -> EngineResult<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| EngineError::InvalidYear(year.to_string()))?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31)
        .ok_or_else(|| EngineError::InvalidYear(year.to_string()))?;
    Ok((start, end))
}

// ==========================================
// RefreshOutcome - 单条刷新结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerChange {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub tracker: Tracker,
    pub change: TrackerChange,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YearRefreshSummary {
    pub year: i32,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

// ==========================================
// TrackerAggregator - 汇总并落库
// ==========================================
pub struct TrackerAggregator {
    directory: Arc<dyn EmployeeDirectory>,
    catalog: Arc<dyn LeaveTypeCatalog>,
    snapshots: Arc<dyn SnapshotSource>,
    trackers: Arc<TrackerRepository>,
}

impl TrackerAggregator {
    pub fn new(
        directory: Arc<dyn EmployeeDirectory>,
        catalog: Arc<dyn LeaveTypeCatalog>,
        snapshots: Arc<dyn SnapshotSource>,
        trackers: Arc<TrackerRepository>,
    ) -> Self {
        Self {
            directory,
            catalog,
            snapshots,
            trackers,
        }
    }

    /// 仅计算数量, 不落库
    pub fn compute(&self, key: &TrackerKey) -> EngineResult<TrackerAmounts> {
        let year = parse_year(&key.year)?;
        let (start, end) = year_bounds(year)?;

        let allocations =
            self.snapshots
                .allocations(key.employee_id, key.leave_type_id, LeaveState::Validate)?;

        let mut requests = self.snapshots.requests(
            key.employee_id,
            key.leave_type_id,
            LeaveState::Validate,
            start,
            end,
        )?;
        requests.extend(self.snapshots.requests(
            key.employee_id,
            key.leave_type_id,
            LeaveState::Confirm,
            start,
            end,
        )?);

        Ok(aggregate(year, &allocations, &requests))
    }

    /// 刷新单条追踪记录（不存在则创建）
    ///
    /// 数量与展示字段均无变化时不写库, 保证重复执行无副作用
    #[instrument(skip(self), fields(
        employee_id = key.employee_id,
        leave_type_id = key.leave_type_id,
        year = %key.year
    ))]
    pub fn refresh(&self, key: &TrackerKey) -> EngineResult<RefreshOutcome> {
        let employee = self
            .directory
            .find_employee(key.employee_id)?
            .ok_or(EngineError::EmployeeNotFound(key.employee_id))?;
        let leave_type = self
            .catalog
            .find_leave_type(key.leave_type_id)?
            .ok_or(EngineError::LeaveTypeNotFound(key.leave_type_id))?;

        let amounts = self.compute(key)?;

        match self.trackers.find_by_key(key)? {
            Some(existing) => {
                let mut tracker = existing.clone();
                tracker.refresh_display_fields(Some(&employee), Some(&leave_type));
                tracker.apply_amounts(amounts);

                if tracker == existing {
                    debug!(tracker_id = tracker.id, "汇总结果无变化");
                    return Ok(RefreshOutcome {
                        tracker,
                        change: TrackerChange::Unchanged,
                    });
                }

                self.trackers.update(&tracker)?;
                debug!(
                    tracker_id = tracker.id,
                    total = amounts.total_allocation,
                    taken = amounts.taken_leaves,
                    pending = amounts.pending_requests,
                    "追踪记录已更新"
                );
                Ok(RefreshOutcome {
                    tracker,
                    change: TrackerChange::Updated,
                })
            }
            None => {
                let mut tracker = Tracker::new(&employee, &leave_type, &key.year);
                tracker.apply_amounts(amounts);
                tracker.id = self.trackers.insert(&tracker)?;
                debug!(tracker_id = tracker.id, "追踪记录已创建");
                Ok(RefreshOutcome {
                    tracker,
                    change: TrackerChange::Created,
                })
            }
        }
    }

    /// 刷新某年度全部相关组合
    ///
    /// 范围: 有快照的 (员工, 假期类型) + 该年已有追踪记录
    #[instrument(skip(self))]
    pub fn refresh_year(&self, year: i32) -> EngineResult<YearRefreshSummary> {
        let year_str = year.to_string();
        let mut pairs: BTreeSet<(i64, i64)> = self.snapshots.active_pairs(year)?.into_iter().collect();
        pairs.extend(
            self.trackers
                .list_by_year(&year_str)?
                .into_iter()
                .map(|t| (t.employee_id, t.leave_type_id)),
        );

        let mut summary = YearRefreshSummary {
            year,
            ..Default::default()
        };
        for (employee_id, leave_type_id) in pairs {
            let outcome = self.refresh(&TrackerKey::new(employee_id, leave_type_id, year_str.clone()))?;
            match outcome.change {
                TrackerChange::Created => summary.created += 1,
                TrackerChange::Updated => summary.updated += 1,
                TrackerChange::Unchanged => summary.unchanged += 1,
            }
        }

        info!(
            year,
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            "年度汇总刷新完成"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(state: LeaveState, days: f64, from: (i32, u32, u32), to: (i32, u32, u32)) -> LeaveRequestSnapshot {
        LeaveRequestSnapshot {
            employee_id: 1,
            leave_type_id: 1,
            number_of_days: days,
            state,
            request_date_from: NaiveDate::from_ymd_opt(from.0, from.1, from.2).unwrap(),
            request_date_to: NaiveDate::from_ymd_opt(to.0, to.1, to.2).unwrap(),
        }
    }

    fn allocation(state: LeaveState, days: f64) -> AllocationSnapshot {
        AllocationSnapshot {
            employee_id: 1,
            leave_type_id: 1,
            number_of_days: days,
            state,
        }
    }

    #[test]
    fn test_aggregate_filters_by_state_and_year() {
        let allocations = vec![
            allocation(LeaveState::Validate, 15.0),
            allocation(LeaveState::Validate, 5.0),
            allocation(LeaveState::Confirm, 100.0),
        ];
        let requests = vec![
            request(LeaveState::Validate, 2.0, (2025, 2, 3), (2025, 2, 4)),
            request(LeaveState::Validate, 1.5, (2025, 12, 31), (2025, 12, 31)),
            request(LeaveState::Validate, 9.0, (2024, 12, 30), (2025, 1, 3)),
            request(LeaveState::Confirm, 3.0, (2025, 6, 1), (2025, 6, 3)),
            request(LeaveState::Refuse, 4.0, (2025, 7, 1), (2025, 7, 4)),
        ];

        let amounts = aggregate(2025, &allocations, &requests);
        assert_eq!(amounts.total_allocation, 20.0);
        assert_eq!(amounts.taken_leaves, 3.5);
        assert_eq!(amounts.pending_requests, 3.0);
    }

    #[test]
    fn test_aggregate_defaults_to_zero() {
        assert_eq!(aggregate(2025, &[], &[]), TrackerAmounts::default());
    }
}
