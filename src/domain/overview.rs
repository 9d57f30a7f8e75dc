// ==========================================
// 员工假期追踪系统 - 员工假期总览（宽表投影）
// ==========================================
// 说明: 总览行不落库, 每次读取时由追踪记录投影生成
// 写入: 通过字段映射表重定向到底层追踪记录
// ==========================================

use crate::domain::types::{LeaveCategory, TrackerField};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ==========================================
// CategoryFigures - 单类别四项数值
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryFigures {
    pub tracker_id: Option<i64>, // 来源追踪记录（无匹配时为 None, 数值全 0）
    pub total: f64,
    pub taken: f64,
    pub pending: f64,
    pub balance: f64,
}

// ==========================================
// AmbiguousMatch - 类别匹配存在歧义
// ==========================================
// 两种情形: 同一类别命中多条追踪记录; 或选中记录的名称同时命中其他类别
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbiguousMatch {
    pub category: LeaveCategory,
    pub chosen_tracker_id: i64,
    pub candidate_tracker_ids: Vec<i64>,
    pub shared_with: Vec<LeaveCategory>,
}

// ==========================================
// OverviewRow - 员工总览行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewRow {
    pub employee_id: i64,
    pub employee_number: String,
    pub employee_name: String,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
    pub year: String,

    pub categories: BTreeMap<LeaveCategory, CategoryFigures>,

    // ===== 仅年假 =====
    pub annual_carry: f64,
    pub expired_carry: f64,

    pub ambiguities: Vec<AmbiguousMatch>,
}

impl OverviewRow {
    /// 构造全 0 行
    pub fn empty(
        employee_id: i64,
        employee_number: String,
        employee_name: String,
        department_id: Option<i64>,
        department_name: Option<String>,
        year: &str,
    ) -> Self {
        let categories = LeaveCategory::ALL
            .iter()
            .map(|c| (*c, CategoryFigures::default()))
            .collect();
        Self {
            employee_id,
            employee_number,
            employee_name,
            department_id,
            department_name,
            year: year.to_string(),
            categories,
            annual_carry: 0.0,
            expired_carry: 0.0,
            ambiguities: Vec::new(),
        }
    }

    pub fn figures(&self, category: LeaveCategory) -> CategoryFigures {
        self.categories.get(&category).copied().unwrap_or_default()
    }

    /// 按宽表列名取值（如 "casual_total" / "annual_carry"）
    pub fn value(&self, column: &str) -> Option<f64> {
        match column {
            "annual_carry" => return Some(self.annual_carry),
            "expired_carry" => return Some(self.expired_carry),
            _ => {}
        }
        let (prefix, suffix) = column.rsplit_once('_')?;
        let category: LeaveCategory = prefix.parse().ok()?;
        let figures = self.figures(category);
        match suffix {
            "total" => Some(figures.total),
            "taken" => Some(figures.taken),
            "pending" => Some(figures.pending),
            "balance" => Some(figures.balance),
            _ => None,
        }
    }

    /// 展开为宽表列
    pub fn to_columns(&self) -> BTreeMap<String, f64> {
        let mut columns = BTreeMap::new();
        for (category, figures) in &self.categories {
            columns.insert(format!("{}_total", category.key()), figures.total);
            columns.insert(format!("{}_taken", category.key()), figures.taken);
            columns.insert(format!("{}_pending", category.key()), figures.pending);
            columns.insert(format!("{}_balance", category.key()), figures.balance);
        }
        columns.insert("annual_carry".to_string(), self.annual_carry);
        columns.insert("expired_carry".to_string(), self.expired_carry);
        columns
    }
}

// ==========================================
// OverviewField - 可写总览列
// ==========================================
// 映射表: <cat>_total/_taken/_pending → (cat, 对应追踪字段)
//         annual_carry/expired_carry → (annual, 结转字段)
// <cat>_balance 为派生列, 不可写
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverviewField {
    pub category: LeaveCategory,
    pub tracker_field: TrackerField,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverviewFieldError {
    Unknown(String),
    ReadOnly(String),
}

impl fmt::Display for OverviewFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverviewFieldError::Unknown(name) => write!(f, "unknown overview field '{}'", name),
            OverviewFieldError::ReadOnly(name) => {
                write!(f, "overview field '{}' is derived and cannot be written", name)
            }
        }
    }
}

impl FromStr for OverviewField {
    type Err = OverviewFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        match name {
            "annual_carry" => {
                return Ok(OverviewField {
                    category: LeaveCategory::Annual,
                    tracker_field: TrackerField::AnnualCarry,
                })
            }
            "expired_carry" => {
                return Ok(OverviewField {
                    category: LeaveCategory::Annual,
                    tracker_field: TrackerField::ExpiredCarry,
                })
            }
            _ => {}
        }

        let unknown = || OverviewFieldError::Unknown(name.to_string());
        let (prefix, suffix) = name.rsplit_once('_').ok_or_else(unknown)?;
        let category: LeaveCategory = prefix.parse().map_err(|_| unknown())?;
        let tracker_field = match suffix {
            "total" => TrackerField::TotalAllocation,
            "taken" => TrackerField::TakenLeaves,
            "pending" => TrackerField::PendingRequests,
            "balance" => return Err(OverviewFieldError::ReadOnly(name.to_string())),
            _ => return Err(unknown()),
        };
        Ok(OverviewField {
            category,
            tracker_field,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_map() {
        let field: OverviewField = "casual_total".parse().unwrap();
        assert_eq!(field.category, LeaveCategory::Casual);
        assert_eq!(field.tracker_field, TrackerField::TotalAllocation);

        let field: OverviewField = "expired_carry".parse().unwrap();
        assert_eq!(field.category, LeaveCategory::Annual);
        assert_eq!(field.tracker_field, TrackerField::ExpiredCarry);

        assert_eq!(
            "medical_balance".parse::<OverviewField>(),
            Err(OverviewFieldError::ReadOnly("medical_balance".to_string()))
        );
        assert!(matches!(
            "sick_total".parse::<OverviewField>(),
            Err(OverviewFieldError::Unknown(_))
        ));
    }

    #[test]
    fn test_empty_row_has_all_categories_zeroed() {
        let row = OverviewRow::empty(1, "1".into(), "Jane".into(), None, None, "2025");
        assert_eq!(row.categories.len(), 8);
        assert_eq!(row.value("paternity_balance"), Some(0.0));
        assert_eq!(row.to_columns().len(), 8 * 4 + 2);
        assert_eq!(row.value("nonsense"), None);
    }
}
