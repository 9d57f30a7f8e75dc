// ==========================================
// 员工假期追踪系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键级联删除依赖 foreign_keys）
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 幂等建表
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开内存库（测试/临时计算用）并建表
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    initialize_schema(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
///
/// 员工/部门/假期类型/分配/假单为外部系统的只读镜像,
/// leave_tracker 为本系统唯一自有的持久化状态。
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS hr_department (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS hr_employee (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            employee_number TEXT,
            department_id INTEGER REFERENCES hr_department(id) ON DELETE SET NULL,
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS hr_leave_type (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS hr_leave_allocation (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL REFERENCES hr_employee(id) ON DELETE CASCADE,
            leave_type_id INTEGER NOT NULL REFERENCES hr_leave_type(id) ON DELETE CASCADE,
            number_of_days REAL NOT NULL DEFAULT 0,
            state TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS hr_leave_request (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL REFERENCES hr_employee(id) ON DELETE CASCADE,
            leave_type_id INTEGER NOT NULL REFERENCES hr_leave_type(id) ON DELETE CASCADE,
            number_of_days REAL NOT NULL DEFAULT 0,
            state TEXT NOT NULL,
            request_date_from TEXT NOT NULL,
            request_date_to TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS leave_tracker (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL REFERENCES hr_employee(id) ON DELETE CASCADE,
            leave_type_id INTEGER NOT NULL REFERENCES hr_leave_type(id) ON DELETE CASCADE,
            year TEXT NOT NULL,
            employee_name TEXT NOT NULL DEFAULT '',
            employee_number TEXT NOT NULL DEFAULT '',
            leave_type_name TEXT NOT NULL DEFAULT '',
            department_id INTEGER,
            name TEXT NOT NULL DEFAULT '',
            total_allocation REAL NOT NULL DEFAULT 0,
            taken_leaves REAL NOT NULL DEFAULT 0,
            pending_requests REAL NOT NULL DEFAULT 0,
            current_balance REAL NOT NULL DEFAULT 0,
            annual_carry REAL NOT NULL DEFAULT 0,
            expired_carry REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (employee_id, leave_type_id, year)
        );

        CREATE INDEX IF NOT EXISTS idx_leave_tracker_year
            ON leave_tracker(year, employee_id);
        CREATE INDEX IF NOT EXISTS idx_leave_allocation_key
            ON hr_leave_allocation(employee_id, leave_type_id, state);
        CREATE INDEX IF NOT EXISTS idx_leave_request_key
            ON hr_leave_request(employee_id, leave_type_id, state);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_schema_is_idempotent() {
        let conn = open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_schema_version_absent_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = open_in_memory().unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
