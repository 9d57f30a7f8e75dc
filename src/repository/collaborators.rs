// ==========================================
// 员工假期追踪系统 - 外部协作方接口
// ==========================================
// 职责: 定义只读协作方（员工目录/假期类型目录/分配与假单快照）
// 实现者: DirectoryRepository, SnapshotRepository（SQLite 镜像）
// 红线: 接口只读, 本系统不改写外部主数据
// ==========================================

use crate::domain::{
    AllocationSnapshot, Department, Employee, LeaveRequestSnapshot, LeaveState, LeaveType,
};
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;

// ==========================================
// EmployeeDirectory - 员工目录
// ==========================================
pub trait EmployeeDirectory: Send + Sync {
    fn find_employee(&self, employee_id: i64) -> RepositoryResult<Option<Employee>>;

    /// 按外部工号精确查询
    fn find_employee_by_number(&self, employee_number: &str) -> RepositoryResult<Option<Employee>>;

    /// 按姓名精确查询（重名时取 id 最小者）
    fn find_employee_by_name(&self, name: &str) -> RepositoryResult<Option<Employee>>;

    /// 在职员工及其部门名称（按姓名排序）
    fn list_active_employees(&self) -> RepositoryResult<Vec<(Employee, Option<String>)>>;

    fn find_department(&self, department_id: i64) -> RepositoryResult<Option<Department>>;

    /// 按部门名称精确查询
    fn find_department_by_name(&self, name: &str) -> RepositoryResult<Option<Department>>;
}

// ==========================================
// LeaveTypeCatalog - 假期类型目录
// ==========================================
pub trait LeaveTypeCatalog: Send + Sync {
    fn find_leave_type(&self, leave_type_id: i64) -> RepositoryResult<Option<LeaveType>>;

    /// 按名称精确查询
    fn find_leave_type_by_name(&self, name: &str) -> RepositoryResult<Option<LeaveType>>;

    /// 全部假期类型（按 id 升序）
    fn list_leave_types(&self) -> RepositoryResult<Vec<LeaveType>>;
}

// ==========================================
// SnapshotSource - 分配与假单快照
// ==========================================
pub trait SnapshotSource: Send + Sync {
    fn allocations(
        &self,
        employee_id: i64,
        leave_type_id: i64,
        state: LeaveState,
    ) -> RepositoryResult<Vec<AllocationSnapshot>>;

    /// 假单区间需完整落在 [from, to] 内
    fn requests(
        &self,
        employee_id: i64,
        leave_type_id: i64,
        state: LeaveState,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<LeaveRequestSnapshot>>;

    /// 与某年相关的 (employee_id, leave_type_id) 组合
    fn active_pairs(&self, year: i32) -> RepositoryResult<Vec<(i64, i64)>>;
}
