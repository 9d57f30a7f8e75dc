// ==========================================
// 员工假期追踪系统 - 假期分配/请假单快照仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 日期以 YYYY-MM-DD 文本存储, 字典序即时间序
// ==========================================

use crate::db::{initialize_schema, open_sqlite_connection};
use crate::domain::{AllocationSnapshot, LeaveRequestSnapshot, LeaveState};
use crate::repository::collaborators::SnapshotSource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SnapshotRepository {
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

    // ===== 镜像写入 =====

    pub fn insert_allocation(&self, allocation: &AllocationSnapshot) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO hr_leave_allocation (employee_id, leave_type_id, number_of_days, state)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                allocation.employee_id,
                allocation.leave_type_id,
                allocation.number_of_days,
                allocation.state.to_db_str(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_request(&self, request: &LeaveRequestSnapshot) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO hr_leave_request (
                employee_id, leave_type_id, number_of_days, state,
                request_date_from, request_date_to
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                request.employee_id,
                request.leave_type_id,
                request.number_of_days,
                request.state.to_db_str(),
                request.request_date_from.format(DATE_FORMAT).to_string(),
                request.request_date_to.format(DATE_FORMAT).to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

fn parse_date(field: &str, raw: &str) -> RepositoryResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("{} ({})", e, raw),
    })
}

impl SnapshotSource for SnapshotRepository {
    fn allocations(
        &self,
        employee_id: i64,
        leave_type_id: i64,
        state: LeaveState,
    ) -> RepositoryResult<Vec<AllocationSnapshot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT employee_id, leave_type_id, number_of_days, state
            FROM hr_leave_allocation
            WHERE employee_id = ?1 AND leave_type_id = ?2 AND state = ?3
            ORDER BY id
            "#,
        )?;
        let rows = stmt
            .query_map(params![employee_id, leave_type_id, state.to_db_str()], |row| {
                Ok(AllocationSnapshot {
                    employee_id: row.get(0)?,
                    leave_type_id: row.get(1)?,
                    number_of_days: row.get(2)?,
                    state: LeaveState::from_db_str(&row.get::<_, String>(3)?),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn requests(
        &self,
        employee_id: i64,
        leave_type_id: i64,
        state: LeaveState,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<LeaveRequestSnapshot>> {
        let raw_rows = {
            let conn = self.get_conn()?;
            let mut stmt = conn.prepare(
                r#"
                SELECT employee_id, leave_type_id, number_of_days, state,
                       request_date_from, request_date_to
                FROM hr_leave_request
                WHERE employee_id = ?1 AND leave_type_id = ?2 AND state = ?3
                  AND request_date_from >= ?4 AND request_date_to <= ?5
                ORDER BY id
                "#,
            )?;
            let rows = stmt
                .query_map(
                    params![
                        employee_id,
                        leave_type_id,
                        state.to_db_str(),
                        from.format(DATE_FORMAT).to_string(),
                        to.format(DATE_FORMAT).to_string(),
                    ],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, f64>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                            row.get::<_, String>(5)?,
                        ))
                    },
                )?
                .collect::<SqliteResult<Vec<_>>>()?;
            rows
        };

        raw_rows
            .into_iter()
            .map(|(employee_id, leave_type_id, days, state, date_from, date_to)| {
                Ok(LeaveRequestSnapshot {
                    employee_id,
                    leave_type_id,
                    number_of_days: days,
                    state: LeaveState::from_db_str(&state),
                    request_date_from: parse_date("request_date_from", &date_from)?,
                    request_date_to: parse_date("request_date_to", &date_to)?,
                })
            })
            .collect()
    }

    fn active_pairs(&self, year: i32) -> RepositoryResult<Vec<(i64, i64)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT employee_id, leave_type_id FROM hr_leave_allocation
            WHERE state = ?1
            UNION
            SELECT employee_id, leave_type_id FROM hr_leave_request
            WHERE state IN (?1, ?2)
              AND request_date_from >= ?3 AND request_date_to <= ?4
            ORDER BY 1, 2
            "#,
        )?;
        let pairs = stmt
            .query_map(
                params![
                    LeaveState::Validate.to_db_str(),
                    LeaveState::Confirm.to_db_str(),
                    format!("{:04}-01-01", year),
                    format!("{:04}-12-31", year),
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(pairs)
    }
}
