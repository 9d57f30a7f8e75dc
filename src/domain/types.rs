// ==========================================
// 员工假期追踪系统 - 领域类型定义
// ==========================================
// 职责: 假期类别、假单状态、追踪记录字段等基础枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 假期类别 (Leave Category)
// ==========================================
// 固定 8 类, 声明顺序即优先级顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveCategory {
    Casual,    // 事假
    Annual,    // 年假
    Medical,   // 病假
    Unpaid,    // 无薪假
    Funeral,   // 丧假
    Marriage,  // 婚假
    Maternity, // 产假
    Paternity, // 陪产假
}

impl LeaveCategory {
    /// 全部类别（按优先级顺序）
    pub const ALL: [LeaveCategory; 8] = [
        LeaveCategory::Casual,
        LeaveCategory::Annual,
        LeaveCategory::Medical,
        LeaveCategory::Unpaid,
        LeaveCategory::Funeral,
        LeaveCategory::Marriage,
        LeaveCategory::Maternity,
        LeaveCategory::Paternity,
    ];

    /// 类别键（overview 字段前缀）
    pub fn key(&self) -> &'static str {
        match self {
            LeaveCategory::Casual => "casual",
            LeaveCategory::Annual => "annual",
            LeaveCategory::Medical => "medical",
            LeaveCategory::Unpaid => "unpaid",
            LeaveCategory::Funeral => "funeral",
            LeaveCategory::Marriage => "marriage",
            LeaveCategory::Maternity => "maternity",
            LeaveCategory::Paternity => "paternity",
        }
    }

    /// 别名表（首个为主别名, 全部小写）
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            LeaveCategory::Casual => &["casual"],
            LeaveCategory::Annual => &["annual"],
            LeaveCategory::Medical => &["medical", "sick"],
            LeaveCategory::Unpaid => &["unpaid"],
            LeaveCategory::Funeral => &["funeral", "bereavement"],
            LeaveCategory::Marriage => &["marriage", "wedding"],
            LeaveCategory::Maternity => &["maternity"],
            LeaveCategory::Paternity => &["paternity"],
        }
    }

    /// 是否携带结转字段（仅年假）
    pub fn carries_forward(&self) -> bool {
        matches!(self, LeaveCategory::Annual)
    }

    /// 展示标题（首字母大写）
    pub fn title(&self) -> &'static str {
        match self {
            LeaveCategory::Casual => "Casual",
            LeaveCategory::Annual => "Annual",
            LeaveCategory::Medical => "Medical",
            LeaveCategory::Unpaid => "Unpaid",
            LeaveCategory::Funeral => "Funeral",
            LeaveCategory::Marriage => "Marriage",
            LeaveCategory::Maternity => "Maternity",
            LeaveCategory::Paternity => "Paternity",
        }
    }
}

impl fmt::Display for LeaveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for LeaveCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        LeaveCategory::ALL
            .iter()
            .copied()
            .find(|c| c.key() == normalized)
            .ok_or_else(|| format!("未知假期类别: {}", s))
    }
}

// ==========================================
// 假单/分配状态 (Leave State)
// ==========================================
// 对齐外部假期系统的状态取值 (draft/confirm/validate/refuse/cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveState {
    Draft,    // 草稿
    Confirm,  // 已提交, 待审批
    Validate, // 已批准
    Refuse,   // 已拒绝
    Cancel,   // 已取消
}

impl LeaveState {
    /// 数据库存储值
    pub fn to_db_str(&self) -> &'static str {
        match self {
            LeaveState::Draft => "draft",
            LeaveState::Confirm => "confirm",
            LeaveState::Validate => "validate",
            LeaveState::Refuse => "refuse",
            LeaveState::Cancel => "cancel",
        }
    }

    /// 从数据库值解析（未知值按草稿处理, 不参与任何汇总）
    pub fn from_db_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "confirm" | "submitted" | "confirmed" => LeaveState::Confirm,
            "validate" | "validated" | "approved" => LeaveState::Validate,
            "refuse" | "refused" => LeaveState::Refuse,
            "cancel" | "cancelled" => LeaveState::Cancel,
            _ => LeaveState::Draft,
        }
    }
}

impl fmt::Display for LeaveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 追踪记录可写字段 (Tracker Field)
// ==========================================
// current_balance 不在此列: 只能由 total/taken 派生
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerField {
    TotalAllocation,
    TakenLeaves,
    PendingRequests,
    AnnualCarry,
    ExpiredCarry,
}

impl TrackerField {
    pub fn column(&self) -> &'static str {
        match self {
            TrackerField::TotalAllocation => "total_allocation",
            TrackerField::TakenLeaves => "taken_leaves",
            TrackerField::PendingRequests => "pending_requests",
            TrackerField::AnnualCarry => "annual_carry",
            TrackerField::ExpiredCarry => "expired_carry",
        }
    }
}

impl fmt::Display for TrackerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}
