// ==========================================
// 员工假期追踪系统 - 总览投影引擎
// ==========================================
// 输入: 在职员工 + 指定年度全部追踪记录（两次批量查询）
// 输出: 每名在职员工一行宽表, 按类别取匹配的追踪记录
// 平局规则: updated_at 最新者优先, 其次 id 最大者
// ==========================================

use crate::domain::{AmbiguousMatch, CategoryFigures, Employee, LeaveCategory, OverviewRow, Tracker};
use crate::engine::error::EngineResult;
use crate::engine::type_matcher::{classify, matches_category};
use crate::repository::{EmployeeDirectory, TrackerRepository};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

// ==========================================
// CategoryMatch - 单类别匹配结果
// ==========================================
#[derive(Debug, Clone)]
pub struct CategoryMatch<'a> {
    pub chosen: &'a Tracker,
    pub candidate_ids: Vec<i64>, // 全部命中记录 id（升序, 含 chosen）
}

impl CategoryMatch<'_> {
    pub fn is_ambiguous(&self) -> bool {
        self.candidate_ids.len() > 1
    }
}

/// 在一名员工的追踪记录中选出某类别的记录
pub fn select_for_category(trackers: &[Tracker], category: LeaveCategory) -> Option<CategoryMatch<'_>> {
    let matched: Vec<&Tracker> = trackers
        .iter()
        .filter(|t| matches_category(&t.leave_type_name, category))
        .collect();

    let chosen = matched
        .iter()
        .copied()
        .max_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)))?;

    let mut candidate_ids: Vec<i64> = matched.iter().map(|t| t.id).collect();
    candidate_ids.sort_unstable();

    Some(CategoryMatch {
        chosen,
        candidate_ids,
    })
}

/// 按类别填充一行（trackers 须属于同一员工同一年度）
pub fn fill_row(row: &mut OverviewRow, trackers: &[Tracker]) {
    for category in LeaveCategory::ALL {
        let Some(found) = select_for_category(trackers, category) else {
            continue;
        };
        let tracker = found.chosen;
        row.categories.insert(
            category,
            CategoryFigures {
                tracker_id: Some(tracker.id),
                total: tracker.total_allocation,
                taken: tracker.taken_leaves,
                pending: tracker.pending_requests,
                balance: tracker.current_balance,
            },
        );
        if category.carries_forward() {
            row.annual_carry = tracker.annual_carry;
            row.expired_carry = tracker.expired_carry;
        }
        let shared_with: Vec<LeaveCategory> = classify(&tracker.leave_type_name)
            .into_iter()
            .filter(|other| *other != category)
            .collect();
        if found.is_ambiguous() || !shared_with.is_empty() {
            row.ambiguities.push(AmbiguousMatch {
                category,
                chosen_tracker_id: tracker.id,
                candidate_tracker_ids: found.candidate_ids.clone(),
                shared_with,
            });
        }
    }
}

fn empty_row(employee: &Employee, department_name: Option<String>, year: &str) -> OverviewRow {
    OverviewRow::empty(
        employee.id,
        employee.display_number(),
        employee.name.clone(),
        employee.department_id,
        department_name,
        year,
    )
}

// ==========================================
// OverviewProjector
// ==========================================
pub struct OverviewProjector {
    directory: Arc<dyn EmployeeDirectory>,
    trackers: Arc<TrackerRepository>,
}

impl OverviewProjector {
    pub fn new(directory: Arc<dyn EmployeeDirectory>, trackers: Arc<TrackerRepository>) -> Self {
        Self {
            directory,
            trackers,
        }
    }

    /// 投影全部在职员工（按姓名排序）
    #[instrument(skip(self))]
    pub fn project(&self, year: &str) -> EngineResult<Vec<OverviewRow>> {
        let employees = self.directory.list_active_employees()?;

        let mut by_employee: HashMap<i64, Vec<Tracker>> = HashMap::new();
        for tracker in self.trackers.list_by_year(year)? {
            by_employee.entry(tracker.employee_id).or_default().push(tracker);
        }

        let rows: Vec<OverviewRow> = employees
            .into_iter()
            .map(|(employee, department_name)| {
                let mut row = empty_row(&employee, department_name, year);
                if let Some(trackers) = by_employee.get(&employee.id) {
                    fill_row(&mut row, trackers);
                }
                row
            })
            .collect();

        let ambiguous = rows.iter().filter(|r| !r.ambiguities.is_empty()).count();
        if ambiguous > 0 {
            warn!(year = %year, rows = ambiguous, "部分员工存在类别匹配歧义, 已按平局规则取值");
        }
        debug!(year = %year, rows = rows.len(), "总览投影完成");
        Ok(rows)
    }

    /// 投影单名员工（员工不存在时返回 None, 不要求在职）
    pub fn project_employee(&self, employee_id: i64, year: &str) -> EngineResult<Option<OverviewRow>> {
        let Some(employee) = self.directory.find_employee(employee_id)? else {
            return Ok(None);
        };
        let department_name = match employee.department_id {
            Some(id) => self.directory.find_department(id)?.map(|d| d.name),
            None => None,
        };

        let trackers = self.trackers.list_by_employee_year(employee_id, year)?;
        let mut row = empty_row(&employee, department_name, year);
        fill_row(&mut row, &trackers);
        Ok(Some(row))
    }
}
