// ==========================================
// 员工假期追踪系统 - 外部主数据与快照
// ==========================================
// 职责: 员工/部门/假期类型主数据, 假期分配与假单快照
// 红线: 本系统只读这些数据, 不负责其生命周期
// ==========================================

use crate::domain::types::LeaveState;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// ==========================================
// Employee - 员工
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub employee_number: Option<String>, // 外部工号
    pub department_id: Option<i64>,
    pub active: bool,
}

impl Employee {
    /// 展示用工号（无工号时回退为内部 id）
    pub fn display_number(&self) -> String {
        match self.employee_number.as_deref().map(str::trim) {
            Some(number) if !number.is_empty() => number.to_string(),
            _ => self.id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveType {
    pub id: i64,
    pub name: String,
}

// ==========================================
// AllocationSnapshot - 假期分配快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSnapshot {
    pub employee_id: i64,
    pub leave_type_id: i64,
    pub number_of_days: f64,
    pub state: LeaveState,
}

// ==========================================
// LeaveRequestSnapshot - 请假单快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequestSnapshot {
    pub employee_id: i64,
    pub leave_type_id: i64,
    pub number_of_days: f64,
    pub state: LeaveState,
    pub request_date_from: NaiveDate,
    pub request_date_to: NaiveDate,
}

impl LeaveRequestSnapshot {
    /// 请假区间是否完整落在某自然年内（跨年假单不计入任何一年）
    pub fn within_year(&self, year: i32) -> bool {
        self.request_date_from.year() == year
            && self.request_date_to.year() == year
            && self.request_date_from <= self.request_date_to
    }
}
