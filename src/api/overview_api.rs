// ==========================================
// 员工假期追踪系统 - 假期总览 API
// ==========================================
// 职责: 总览投影读取、编辑写回、类别明细
// 说明: 总览无独立存储, 写入全部经由对账引擎落到追踪记录
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::{LeaveCategory, OverviewRow, Tracker};
use crate::engine::error::parse_year;
use crate::engine::{select_for_category, OverviewProjector, OverviewReconciler, ReconcileReport};
use crate::i18n::t_with_args;
use crate::repository::{EmployeeDirectory, TrackerRepository};

// ==========================================
// CategoryDetail - 总览单元格明细
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryDetail {
    /// 单元格背后的追踪记录
    Tracker { tracker: Tracker },
    /// 该类别无数据（附带提示文本）
    NoData { message: String },
}

/// 假期总览API
pub struct OverviewApi {
    directory: Arc<dyn EmployeeDirectory>,
    tracker_repo: Arc<TrackerRepository>,
    projector: Arc<OverviewProjector>,
    reconciler: Arc<OverviewReconciler>,
}

impl OverviewApi {
    pub fn new(
        directory: Arc<dyn EmployeeDirectory>,
        tracker_repo: Arc<TrackerRepository>,
        projector: Arc<OverviewProjector>,
        reconciler: Arc<OverviewReconciler>,
    ) -> Self {
        Self {
            directory,
            tracker_repo,
            projector,
            reconciler,
        }
    }

    /// 全员总览
    pub fn list_overview(&self, year: &str) -> ApiResult<Vec<OverviewRow>> {
        parse_year(year)?;
        Ok(self.projector.project(year.trim())?)
    }

    /// 单员工总览
    pub fn get_overview_row(&self, employee_id: i64, year: &str) -> ApiResult<OverviewRow> {
        parse_year(year)?;
        self.projector
            .project_employee(employee_id, year.trim())?
            .ok_or_else(|| ApiError::NotFound(format!("Employee(id={})不存在", employee_id)))
    }

    /// 总览编辑写回
    ///
    /// 部分类别失败不影响整体成功, 失败原因见报告中的 warnings
    pub fn apply_edit(
        &self,
        employee_id: i64,
        updates: &BTreeMap<String, f64>,
        year: &str,
    ) -> ApiResult<ReconcileReport> {
        if updates.is_empty() {
            return Err(ApiError::InvalidInput("没有需要写回的字段".to_string()));
        }
        let report = self.reconciler.apply(employee_id, updates, year.trim())?;
        for warning in &report.warnings {
            warn!(employee_id, warning = %warning, "总览写回警告");
        }
        if report.has_warnings() {
            warn!(employee_id, skipped = ?report.skipped_fields(), "部分字段未写回");
        }
        Ok(report)
    }

    /// 类别明细（总览中"查看明细"）
    pub fn category_detail(
        &self,
        employee_id: i64,
        category: LeaveCategory,
        year: &str,
    ) -> ApiResult<CategoryDetail> {
        parse_year(year)?;
        let employee = self
            .directory
            .find_employee(employee_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Employee(id={})不存在", employee_id)))?;

        let trackers = self.tracker_repo.list_by_employee_year(employee_id, year.trim())?;
        match select_for_category(&trackers, category) {
            Some(found) => {
                debug!(employee_id, category = %category, tracker_id = found.chosen.id, "类别明细命中");
                Ok(CategoryDetail::Tracker {
                    tracker: found.chosen.clone(),
                })
            }
            None => Ok(CategoryDetail::NoData {
                message: t_with_args(
                    "overview.no_data",
                    &[("category", category.title()), ("employee", employee.name.as_str())],
                ),
            }),
        }
    }
}
