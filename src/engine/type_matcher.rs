// ==========================================
// 员工假期追踪系统 - 假期类型模糊匹配
// ==========================================
// 规则: 名称（不区分大小写）包含类别任一别名即命中
// 说明: 子串匹配而非整词匹配, "casually" 命中 casual
//       一个名称可命中 0 个或多个类别
// ==========================================

use crate::domain::LeaveCategory;
use std::collections::BTreeSet;

/// 将假期类型名称归类为语义类别集合（按优先级有序）
pub fn classify(leave_type_name: &str) -> BTreeSet<LeaveCategory> {
    let lowered = leave_type_name.to_lowercase();
    LeaveCategory::ALL
        .iter()
        .copied()
        .filter(|category| {
            category
                .aliases()
                .iter()
                .any(|alias| lowered.contains(alias))
        })
        .collect()
}

/// 名称是否命中指定类别
pub fn matches_category(leave_type_name: &str, category: LeaveCategory) -> bool {
    let lowered = leave_type_name.to_lowercase();
    category.aliases().iter().any(|alias| lowered.contains(alias))
}
