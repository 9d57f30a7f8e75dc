// ==========================================
// 员工假期追踪系统 - 假期追踪记录仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: (employee_id, leave_type_id, year) 唯一, 由表级 UNIQUE 兜底
// ==========================================

use crate::db::{initialize_schema, open_sqlite_connection};
use crate::domain::{Tracker, TrackerKey, TrackerPatch};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const TRACKER_COLUMNS: &str = r#"
    id, employee_id, leave_type_id, year,
    employee_name, employee_number, leave_type_name, department_id, name,
    total_allocation, taken_leaves, pending_requests, current_balance,
    annual_carry, expired_carry,
    created_at, updated_at
"#;

fn map_tracker(row: &Row) -> SqliteResult<Tracker> {
    Ok(Tracker {
        id: row.get(0)?,
        employee_id: row.get(1)?,
        leave_type_id: row.get(2)?,
        year: row.get(3)?,
        employee_name: row.get(4)?,
        employee_number: row.get(5)?,
        leave_type_name: row.get(6)?,
        department_id: row.get(7)?,
        name: row.get(8)?,
        total_allocation: row.get(9)?,
        taken_leaves: row.get(10)?,
        pending_requests: row.get(11)?,
        current_balance: row.get(12)?,
        annual_carry: row.get(13)?,
        expired_carry: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

fn not_found(id: i64) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "Tracker".to_string(),
        id: id.to_string(),
    }
}

fn write_tracker(conn: &Connection, tracker: &Tracker) -> RepositoryResult<usize> {
    Ok(conn.execute(
        r#"
        UPDATE leave_tracker SET
            employee_id = ?2, leave_type_id = ?3, year = ?4,
            employee_name = ?5, employee_number = ?6, leave_type_name = ?7,
            department_id = ?8, name = ?9,
            total_allocation = ?10, taken_leaves = ?11, pending_requests = ?12,
            current_balance = ?13, annual_carry = ?14, expired_carry = ?15,
            updated_at = ?16
        WHERE id = ?1
        "#,
        params![
            tracker.id,
            tracker.employee_id,
            tracker.leave_type_id,
            tracker.year,
            tracker.employee_name,
            tracker.employee_number,
            tracker.leave_type_name,
            tracker.department_id,
            tracker.name,
            tracker.total_allocation,
            tracker.taken_leaves,
            tracker.pending_requests,
            tracker.current_balance,
            tracker.annual_carry,
            tracker.expired_carry,
            tracker.updated_at,
        ],
    )?)
}

// ==========================================
// TrackerRepository - 追踪记录仓储
// ==========================================
pub struct TrackerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TrackerRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Tracker>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM leave_tracker WHERE id = ?1", TRACKER_COLUMNS);
        Ok(conn.query_row(&sql, params![id], map_tracker).optional()?)
    }

    pub fn find_by_key(&self, key: &TrackerKey) -> RepositoryResult<Option<Tracker>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM leave_tracker WHERE employee_id = ?1 AND leave_type_id = ?2 AND year = ?3",
            TRACKER_COLUMNS
        );
        Ok(conn
            .query_row(
                &sql,
                params![key.employee_id, key.leave_type_id, key.year],
                map_tracker,
            )
            .optional()?)
    }

    /// 新建追踪记录, 返回新 id
    ///
    /// 身份重复时返回 UniqueConstraintViolation
    pub fn insert(&self, tracker: &Tracker) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO leave_tracker (
                employee_id, leave_type_id, year,
                employee_name, employee_number, leave_type_name, department_id, name,
                total_allocation, taken_leaves, pending_requests, current_balance,
                annual_carry, expired_carry,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                tracker.employee_id,
                tracker.leave_type_id,
                tracker.year,
                tracker.employee_name,
                tracker.employee_number,
                tracker.leave_type_name,
                tracker.department_id,
                tracker.name,
                tracker.total_allocation,
                tracker.taken_leaves,
                tracker.pending_requests,
                tracker.current_balance,
                tracker.annual_carry,
                tracker.expired_carry,
                tracker.created_at,
                tracker.updated_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 整行覆盖写入（updated_at 取当前时间）
    pub fn update(&self, tracker: &Tracker) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let mut stamped = tracker.clone();
        stamped.updated_at = Utc::now();
        if write_tracker(&conn, &stamped)? == 0 {
            return Err(not_found(tracker.id));
        }
        Ok(())
    }

    /// 在单个事务内读取、应用字段更新、重算余额并写回
    pub fn apply_patch(&self, id: i64, patch: &TrackerPatch) -> RepositoryResult<Tracker> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let sql = format!("SELECT {} FROM leave_tracker WHERE id = ?1", TRACKER_COLUMNS);
        let mut tracker = tx
            .query_row(&sql, params![id], map_tracker)
            .optional()?
            .ok_or_else(|| not_found(id))?;

        tracker.apply_patch(patch);
        tracker.updated_at = Utc::now();
        write_tracker(&tx, &tracker)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(tracker)
    }

    /// 某年度全部追踪记录（按员工、假期类型排序）
    pub fn list_by_year(&self, year: &str) -> RepositoryResult<Vec<Tracker>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM leave_tracker WHERE year = ?1 ORDER BY employee_id, leave_type_id, id",
            TRACKER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let trackers = stmt
            .query_map(params![year], map_tracker)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(trackers)
    }

    pub fn list_by_employee_year(
        &self,
        employee_id: i64,
        year: &str,
    ) -> RepositoryResult<Vec<Tracker>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM leave_tracker WHERE employee_id = ?1 AND year = ?2 ORDER BY leave_type_id, id",
            TRACKER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let trackers = stmt
            .query_map(params![employee_id, year], map_tracker)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(trackers)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM leave_tracker", [], |row| row.get(0))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::domain::{Employee, LeaveType, TrackerField};
    use crate::repository::directory_repo::DirectoryRepository;

    fn setup() -> (TrackerRepository, Employee, LeaveType) {
        let conn = Arc::new(Mutex::new(open_in_memory().unwrap()));
        let directory = DirectoryRepository::from_connection(conn.clone());
        let employee_id = directory.insert_employee("Jane", Some("E1"), None).unwrap();
        let leave_type_id = directory.insert_leave_type("Annual Leave").unwrap();
        let employee = Employee {
            id: employee_id,
            name: "Jane".to_string(),
            employee_number: Some("E1".to_string()),
            department_id: None,
            active: true,
        };
        let leave_type = LeaveType {
            id: leave_type_id,
            name: "Annual Leave".to_string(),
        };
        (TrackerRepository::from_connection(conn), employee, leave_type)
    }

    #[test]
    fn test_insert_and_find_by_key() {
        let (repo, employee, leave_type) = setup();
        let tracker = Tracker::new(&employee, &leave_type, "2025");
        let id = repo.insert(&tracker).unwrap();

        let found = repo.find_by_key(&tracker.key()).unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.name, "Jane - Annual Leave (2025)");
        assert_eq!(found.created_at, tracker.created_at);
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let (repo, employee, leave_type) = setup();
        let tracker = Tracker::new(&employee, &leave_type, "2025");
        repo.insert(&tracker).unwrap();

        let err = repo.insert(&tracker).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_apply_patch_recomputes_balance() {
        let (repo, employee, leave_type) = setup();
        let id = repo.insert(&Tracker::new(&employee, &leave_type, "2025")).unwrap();

        let patched = repo
            .apply_patch(
                id,
                &TrackerPatch::new()
                    .with(TrackerField::TotalAllocation, 30.0)
                    .with(TrackerField::TakenLeaves, 12.5),
            )
            .unwrap();
        assert_eq!(patched.current_balance, 17.5);

        let stored = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(stored.current_balance, 17.5);
        assert!(stored.updated_at >= stored.created_at);
    }

    #[test]
    fn test_apply_patch_missing_tracker() {
        let (repo, _, _) = setup();
        let err = repo.apply_patch(999, &TrackerPatch::new()).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
