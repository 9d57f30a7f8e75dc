// ==========================================
// 员工假期追踪系统 - 假期追踪记录领域模型
// ==========================================
// 唯一键: (employee_id, leave_type_id, year)
// 不变量: current_balance = total_allocation - taken_leaves
// 例外: 导入路径可直接写入 current_balance（以表格为准）
// ==========================================

use crate::domain::directory::{Employee, LeaveType};
use crate::domain::types::TrackerField;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// TrackerKey - 追踪记录身份
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackerKey {
    pub employee_id: i64,
    pub leave_type_id: i64,
    pub year: String,
}

impl TrackerKey {
    pub fn new(employee_id: i64, leave_type_id: i64, year: impl Into<String>) -> Self {
        Self {
            employee_id,
            leave_type_id,
            year: year.into(),
        }
    }
}

// ==========================================
// TrackerAmounts - 汇总引擎输出
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerAmounts {
    pub total_allocation: f64,
    pub taken_leaves: f64,
    pub pending_requests: f64,
}

// ==========================================
// Tracker - 假期追踪记录
// ==========================================
// 对齐: leave_tracker 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracker {
    pub id: i64,

    // ===== 身份 =====
    pub employee_id: i64,
    pub leave_type_id: i64,
    pub year: String,

    // ===== 派生展示字段（身份变化时重算）=====
    pub employee_name: String,
    pub employee_number: String,
    pub leave_type_name: String,
    pub department_id: Option<i64>,
    pub name: String,

    // ===== 数量（单位: 天）=====
    pub total_allocation: f64,
    pub taken_leaves: f64,
    pub pending_requests: f64,
    pub current_balance: f64,
    pub annual_carry: f64,
    pub expired_carry: f64,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tracker {
    /// 为新身份构造追踪记录（id 由仓储落库时回填）
    pub fn new(employee: &Employee, leave_type: &LeaveType, year: &str) -> Self {
        let now = Utc::now();
        let mut tracker = Self {
            id: 0,
            employee_id: employee.id,
            leave_type_id: leave_type.id,
            year: year.to_string(),
            employee_name: String::new(),
            employee_number: String::new(),
            leave_type_name: String::new(),
            department_id: None,
            name: String::new(),
            total_allocation: 0.0,
            taken_leaves: 0.0,
            pending_requests: 0.0,
            current_balance: 0.0,
            annual_carry: 0.0,
            expired_carry: 0.0,
            created_at: now,
            updated_at: now,
        };
        tracker.refresh_display_fields(Some(employee), Some(leave_type));
        tracker
    }

    pub fn key(&self) -> TrackerKey {
        TrackerKey::new(self.employee_id, self.leave_type_id, self.year.clone())
    }

    /// 重算派生展示字段
    ///
    /// 任一身份对象缺失时按原规则降级, 不报错
    pub fn refresh_display_fields(
        &mut self,
        employee: Option<&Employee>,
        leave_type: Option<&LeaveType>,
    ) {
        match employee {
            Some(e) => {
                self.employee_name = e.name.clone();
                self.employee_number = e.display_number();
                self.department_id = e.department_id;
            }
            None => {
                self.employee_name = String::new();
                self.employee_number = String::new();
                self.department_id = None;
            }
        }
        self.leave_type_name = leave_type.map(|t| t.name.clone()).unwrap_or_default();
        self.name = display_label(
            employee.map(|e| e.name.as_str()),
            leave_type.map(|t| t.name.as_str()),
            Some(self.year.as_str()),
        );
    }

    /// 重算余额
    pub fn recompute_balance(&mut self) {
        self.current_balance = self.total_allocation - self.taken_leaves;
    }

    /// 写入汇总结果（不触碰结转字段）
    pub fn apply_amounts(&mut self, amounts: TrackerAmounts) {
        self.total_allocation = amounts.total_allocation;
        self.taken_leaves = amounts.taken_leaves;
        self.pending_requests = amounts.pending_requests;
        self.recompute_balance();
    }

    /// 应用一组字段更新, 之后重算余额
    pub fn apply_patch(&mut self, patch: &TrackerPatch) {
        for (field, value) in patch.iter() {
            match field {
                TrackerField::TotalAllocation => self.total_allocation = value,
                TrackerField::TakenLeaves => self.taken_leaves = value,
                TrackerField::PendingRequests => self.pending_requests = value,
                TrackerField::AnnualCarry => self.annual_carry = value,
                TrackerField::ExpiredCarry => self.expired_carry = value,
            }
        }
        self.recompute_balance();
    }

    pub fn amounts(&self) -> TrackerAmounts {
        TrackerAmounts {
            total_allocation: self.total_allocation,
            taken_leaves: self.taken_leaves,
            pending_requests: self.pending_requests,
        }
    }
}

/// 追踪记录展示标签
///
/// - 员工 + 假期类型 + 年份: "Jane - Annual Leave (2025)"
/// - 员工 + 年份: "Jane (2025)"
/// - 仅员工: "Jane"
/// - 其他: "New Tracker"
pub fn display_label(employee: Option<&str>, leave_type: Option<&str>, year: Option<&str>) -> String {
    fn present(v: Option<&str>) -> Option<&str> {
        v.map(str::trim).filter(|s| !s.is_empty())
    }
    match (present(employee), present(leave_type), present(year)) {
        (Some(e), Some(t), Some(y)) => format!("{} - {} ({})", e, t, y),
        (Some(e), _, Some(y)) => format!("{} ({})", e, y),
        (Some(e), _, None) => e.to_string(),
        _ => "New Tracker".to_string(),
    }
}

// ==========================================
// TrackerPatch - 一组字段更新
// ==========================================
// 同一类别的多个字段合并为一次更新
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerPatch {
    updates: Vec<(TrackerField, f64)>,
}

impl TrackerPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置字段值（同字段重复设置时后者覆盖前者）
    pub fn set(&mut self, field: TrackerField, value: f64) {
        match self.updates.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.updates.push((field, value)),
        }
    }

    pub fn with(mut self, field: TrackerField, value: f64) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: TrackerField) -> Option<f64> {
        self.updates
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrackerField, f64)> + '_ {
        self.updates.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }
}

// ==========================================
// ImportedTrackerValues - 导入路径写入值
// ==========================================
// 导入值以表格为准, current_balance 直接写入不重算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedTrackerValues {
    pub total_allocation: f64,
    pub taken_leaves: f64,
    pub pending_requests: f64,
    pub current_balance: f64,
    pub annual_carry: f64,
    pub expired_carry: f64,
    /// 导入解析出的部门（None 表示清空）
    pub department_id: Option<i64>,
}

impl Tracker {
    /// 写入导入值
    pub fn apply_imported(&mut self, values: &ImportedTrackerValues) {
        self.total_allocation = values.total_allocation;
        self.taken_leaves = values.taken_leaves;
        self.pending_requests = values.pending_requests;
        self.current_balance = values.current_balance;
        self.annual_carry = values.annual_carry;
        self.expired_carry = values.expired_carry;
        self.department_id = values.department_id;
    }
}
