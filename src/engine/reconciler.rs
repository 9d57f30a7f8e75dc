// ==========================================
// 员工假期追踪系统 - 总览写回对账引擎
// ==========================================
// 流程:
//   1. 字段名 → (类别, 追踪字段); 非法/派生字段记警告
//   2. 按类别分组, 每类别一次更新
//   3. 有匹配记录则更新; 否则按类别别名找假期类型新建
//   4. 找不到假期类型记警告并跳过该类别, 其余类别照常提交
// 红线: 不删除记录, 不回滚已成功的类别
// ==========================================

use crate::domain::{
    Employee, LeaveCategory, LeaveType, OverviewField, Tracker, TrackerField, TrackerKey, TrackerPatch,
};
use crate::engine::error::{parse_year, EngineError, EngineResult};
use crate::engine::projector::select_for_category;
use crate::engine::type_matcher::matches_category;
use crate::repository::{
    EmployeeDirectory, LeaveTypeCatalog, RepositoryError, RepositoryResult, TrackerRepository,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

// ==========================================
// ReconcileWarning - 非致命警告
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReconcileWarning {
    #[error("Field '{field}' rejected: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("No leave type matches category '{category}', skipped {fields:?}")]
    NoMatchingLeaveType {
        category: LeaveCategory,
        fields: Vec<String>,
    },

    #[error("Failed to store '{category}' update: {message}")]
    StoreFailed {
        category: LeaveCategory,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldOutcome {
    Applied { tracker_id: i64, created: bool },
    Skipped,
}

// ==========================================
// ReconcileReport - 单次写回结果
// ==========================================
// 整体调用视为成功; 逐字段结果与警告供调用方展示
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub employee_id: i64,
    pub year: String,
    pub fields: BTreeMap<String, FieldOutcome>,
    pub created_tracker_ids: Vec<i64>,
    pub updated_tracker_ids: Vec<i64>,
    pub warnings: Vec<ReconcileWarning>,
}

impl ReconcileReport {
    pub fn applied_count(&self) -> usize {
        self.fields
            .values()
            .filter(|o| matches!(o, FieldOutcome::Applied { .. }))
            .count()
    }

    pub fn skipped_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, o)| matches!(o, FieldOutcome::Skipped))
            .map(|(f, _)| f.as_str())
            .collect()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

struct CategoryEdit {
    patch: TrackerPatch,
    fields: Vec<String>,
}

/// 数值校验: 必须有限; 分配/已休/待批不得为负
fn check_value(field: TrackerField, value: f64) -> Result<(), String> {
    if !value.is_finite() {
        return Err(format!("value {} is not a finite number", value));
    }
    let non_negative = matches!(
        field,
        TrackerField::TotalAllocation | TrackerField::TakenLeaves | TrackerField::PendingRequests
    );
    if non_negative && value < 0.0 {
        return Err(format!("value {} must not be negative", value));
    }
    Ok(())
}

/// 假期类型目录按需加载一次; 失败时不缓存
fn cached_catalog<'a>(
    catalog: &dyn LeaveTypeCatalog,
    cache: &'a mut Option<Vec<LeaveType>>,
) -> RepositoryResult<&'a [LeaveType]> {
    if cache.is_none() {
        *cache = Some(catalog.list_leave_types()?);
    }
    Ok(cache.as_deref().unwrap_or_default())
}

// ==========================================
// OverviewReconciler
// ==========================================
pub struct OverviewReconciler {
    directory: Arc<dyn EmployeeDirectory>,
    catalog: Arc<dyn LeaveTypeCatalog>,
    trackers: Arc<TrackerRepository>,
}

impl OverviewReconciler {
    pub fn new(
        directory: Arc<dyn EmployeeDirectory>,
        catalog: Arc<dyn LeaveTypeCatalog>,
        trackers: Arc<TrackerRepository>,
    ) -> Self {
        Self {
            directory,
            catalog,
            trackers,
        }
    }

    /// 将总览行编辑写回追踪记录
    ///
    /// 员工不存在或年份非法时整体报错; 其余问题均降级为警告
    #[instrument(skip(self, updates), fields(field_count = updates.len()))]
    pub fn apply(
        &self,
        employee_id: i64,
        updates: &BTreeMap<String, f64>,
        year: &str,
    ) -> EngineResult<ReconcileReport> {
        parse_year(year)?;
        let employee = self
            .directory
            .find_employee(employee_id)?
            .ok_or(EngineError::EmployeeNotFound(employee_id))?;

        let mut report = ReconcileReport {
            employee_id,
            year: year.to_string(),
            ..Default::default()
        };

        // 1-2. 解析并分组
        let mut grouped: BTreeMap<LeaveCategory, CategoryEdit> = BTreeMap::new();
        for (name, value) in updates {
            let parsed = name.parse::<OverviewField>().map_err(|e| e.to_string()).and_then(|field| {
                check_value(field.tracker_field, *value).map(|_| field)
            });
            match parsed {
                Ok(field) => {
                    let edit = grouped.entry(field.category).or_insert_with(|| CategoryEdit {
                        patch: TrackerPatch::new(),
                        fields: Vec::new(),
                    });
                    edit.patch.set(field.tracker_field, *value);
                    edit.fields.push(name.clone());
                }
                Err(reason) => {
                    warn!(employee_id, field = %name, "总览字段不可写: {}", reason);
                    report.fields.insert(name.clone(), FieldOutcome::Skipped);
                    report.warnings.push(ReconcileWarning::InvalidField {
                        field: name.clone(),
                        reason,
                    });
                }
            }
        }

        if grouped.is_empty() {
            return Ok(report);
        }

        let existing = self.trackers.list_by_employee_year(employee_id, year)?;
        let mut catalog: Option<Vec<LeaveType>> = None;

        // 3-4. 逐类别提交
        for (category, edit) in grouped {
            let result = match select_for_category(&existing, category) {
                Some(found) => self
                    .trackers
                    .apply_patch(found.chosen.id, &edit.patch)
                    .map(|t| Some((t.id, false))),
                None => match cached_catalog(self.catalog.as_ref(), &mut catalog) {
                    Ok(types) => match types.iter().find(|lt| matches_category(&lt.name, category)) {
                        Some(lt) => self.create_tracker(&employee, lt, year, &edit.patch).map(Some),
                        None => Ok(None),
                    },
                    Err(e) => Err(e),
                },
            };

            match result {
                Ok(Some((tracker_id, created))) => {
                    if created {
                        report.created_tracker_ids.push(tracker_id);
                    } else {
                        report.updated_tracker_ids.push(tracker_id);
                    }
                    for field in edit.fields {
                        report
                            .fields
                            .insert(field, FieldOutcome::Applied { tracker_id, created });
                    }
                }
                Ok(None) => {
                    warn!(employee_id, category = %category, "无匹配假期类型, 跳过该类别");
                    for field in &edit.fields {
                        report.fields.insert(field.clone(), FieldOutcome::Skipped);
                    }
                    report.warnings.push(ReconcileWarning::NoMatchingLeaveType {
                        category,
                        fields: edit.fields,
                    });
                }
                Err(e) => {
                    warn!(employee_id, category = %category, "类别写回失败: {}", e);
                    for field in edit.fields {
                        report.fields.insert(field, FieldOutcome::Skipped);
                    }
                    report.warnings.push(ReconcileWarning::StoreFailed {
                        category,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            employee_id,
            year = %year,
            created = report.created_tracker_ids.len(),
            updated = report.updated_tracker_ids.len(),
            warnings = report.warnings.len(),
            "总览写回完成"
        );
        Ok(report)
    }

    /// 新建追踪记录并带上本类别更新; 已被并发创建时转为更新
    fn create_tracker(
        &self,
        employee: &Employee,
        leave_type: &LeaveType,
        year: &str,
        patch: &TrackerPatch,
    ) -> Result<(i64, bool), RepositoryError> {
        let mut tracker = Tracker::new(employee, leave_type, year);
        tracker.apply_patch(patch);
        match self.trackers.insert(&tracker) {
            Ok(id) => Ok((id, true)),
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                let key = TrackerKey::new(employee.id, leave_type.id, year);
                let existing = self.trackers.find_by_key(&key)?.ok_or_else(|| RepositoryError::NotFound {
                    entity: "Tracker".to_string(),
                    id: format!("{}/{}/{}", key.employee_id, key.leave_type_id, key.year),
                })?;
                let updated = self.trackers.apply_patch(existing.id, patch)?;
                Ok((updated.id, false))
            }
            Err(e) => Err(e),
        }
    }
}
