// ==========================================
// 员工假期追踪系统 - 员工/部门/假期类型目录仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: hr_* 表为外部主数据的本地镜像; 写方法仅供同步/初始化使用
// ==========================================

use crate::db::{initialize_schema, open_sqlite_connection};
use crate::domain::{Department, Employee, LeaveType};
use crate::repository::collaborators::{EmployeeDirectory, LeaveTypeCatalog};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const EMPLOYEE_COLUMNS: &str = "id, name, employee_number, department_id, active";

fn map_employee(row: &Row) -> SqliteResult<Employee> {
    Ok(Employee {
        id: row.get(0)?,
        name: row.get(1)?,
        employee_number: row.get(2)?,
        department_id: row.get(3)?,
        active: row.get::<_, i64>(4)? != 0,
    })
}

// ==========================================
// DirectoryRepository
// ==========================================
pub struct DirectoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DirectoryRepository {
    /// 创建新的 DirectoryRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 镜像写入 =====

    pub fn insert_department(&self, name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute("INSERT INTO hr_department (name) VALUES (?1)", params![name])?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_employee(
        &self,
        name: &str,
        employee_number: Option<&str>,
        department_id: Option<i64>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO hr_employee (name, employee_number, department_id, active) VALUES (?1, ?2, ?3, 1)",
            params![name, employee_number, department_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_leave_type(&self, name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute("INSERT INTO hr_leave_type (name) VALUES (?1)", params![name])?;
        Ok(conn.last_insert_rowid())
    }

    pub fn set_employee_active(&self, employee_id: i64, active: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE hr_employee SET active = ?2 WHERE id = ?1",
            params![employee_id, active as i64],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Employee".to_string(),
                id: employee_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除员工（追踪记录随外键级联删除）
    pub fn delete_employee(&self, employee_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Ok(conn.execute("DELETE FROM hr_employee WHERE id = ?1", params![employee_id])?)
    }

    /// 删除假期类型（追踪记录随外键级联删除）
    pub fn delete_leave_type(&self, leave_type_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Ok(conn.execute("DELETE FROM hr_leave_type WHERE id = ?1", params![leave_type_id])?)
    }
}

impl EmployeeDirectory for DirectoryRepository {
    fn find_employee(&self, employee_id: i64) -> RepositoryResult<Option<Employee>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM hr_employee WHERE id = ?1", EMPLOYEE_COLUMNS);
        Ok(conn
            .query_row(&sql, params![employee_id], map_employee)
            .optional()?)
    }

    fn find_employee_by_number(&self, employee_number: &str) -> RepositoryResult<Option<Employee>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM hr_employee WHERE employee_number = ?1 ORDER BY id LIMIT 1",
            EMPLOYEE_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![employee_number], map_employee)
            .optional()?)
    }

    fn find_employee_by_name(&self, name: &str) -> RepositoryResult<Option<Employee>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM hr_employee WHERE name = ?1 ORDER BY id LIMIT 1",
            EMPLOYEE_COLUMNS
        );
        Ok(conn.query_row(&sql, params![name], map_employee).optional()?)
    }

    fn list_active_employees(&self) -> RepositoryResult<Vec<(Employee, Option<String>)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT e.id, e.name, e.employee_number, e.department_id, e.active, d.name
            FROM hr_employee e
            LEFT JOIN hr_department d ON e.department_id = d.id
            WHERE e.active = 1
            ORDER BY e.name ASC, e.id ASC
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| Ok((map_employee(row)?, row.get::<_, Option<String>>(5)?)))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn find_department(&self, department_id: i64) -> RepositoryResult<Option<Department>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT id, name FROM hr_department WHERE id = ?1",
                params![department_id],
                |row| {
                    Ok(Department {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    fn find_department_by_name(&self, name: &str) -> RepositoryResult<Option<Department>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT id, name FROM hr_department WHERE name = ?1 ORDER BY id LIMIT 1",
                params![name],
                |row| {
                    Ok(Department {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }
}

impl LeaveTypeCatalog for DirectoryRepository {
    fn find_leave_type(&self, leave_type_id: i64) -> RepositoryResult<Option<LeaveType>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT id, name FROM hr_leave_type WHERE id = ?1",
                params![leave_type_id],
                |row| {
                    Ok(LeaveType {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    fn find_leave_type_by_name(&self, name: &str) -> RepositoryResult<Option<LeaveType>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT id, name FROM hr_leave_type WHERE name = ?1 ORDER BY id LIMIT 1",
                params![name],
                |row| {
                    Ok(LeaveType {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    fn list_leave_types(&self) -> RepositoryResult<Vec<LeaveType>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM hr_leave_type ORDER BY id ASC")?;
        let types = stmt
            .query_map([], |row| {
                Ok(LeaveType {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn repo() -> DirectoryRepository {
        DirectoryRepository::from_connection(Arc::new(Mutex::new(open_in_memory().unwrap())))
    }

    #[test]
    fn test_employee_lookup_by_number_and_name() {
        let repo = repo();
        let dept = repo.insert_department("HR").unwrap();
        let id = repo.insert_employee("John Doe", Some("EMP001"), Some(dept)).unwrap();

        let by_number = repo.find_employee_by_number("EMP001").unwrap().unwrap();
        assert_eq!(by_number.id, id);
        assert_eq!(by_number.department_id, Some(dept));

        let by_name = repo.find_employee_by_name("John Doe").unwrap().unwrap();
        assert_eq!(by_name.id, id);

        assert!(repo.find_employee_by_name("john doe").unwrap().is_none());
    }

    #[test]
    fn test_list_active_employees_skips_inactive() {
        let repo = repo();
        let dept = repo.insert_department("Finance").unwrap();
        let a = repo.insert_employee("Alice", None, Some(dept)).unwrap();
        let b = repo.insert_employee("Bob", None, None).unwrap();
        repo.set_employee_active(b, false).unwrap();

        let active = repo.list_active_employees().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].0.id, a);
        assert_eq!(active[0].1.as_deref(), Some("Finance"));
    }

    #[test]
    fn test_leave_type_exact_match() {
        let repo = repo();
        repo.insert_leave_type("Annual Leave").unwrap();
        assert!(repo.find_leave_type_by_name("Annual Leave").unwrap().is_some());
        assert!(repo.find_leave_type_by_name("Annual").unwrap().is_none());
        assert_eq!(repo.list_leave_types().unwrap().len(), 1);
    }
}
