use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const KEY_USERS: &str = "users";
pub const KEY_COURSES: &str = "courses";
pub const KEY_RECORDS: &str = "records";
pub const KEY_SESSIONS: &str = "sessions";
pub const KEY_SESSION_COUNTER: &str = "session_id_counter";
pub const KEY_RECORD_COUNTER: &str = "record_id_counter";
pub const KEY_TOKEN_SECRET: &str = "token_secret";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("attendtrack.sqlite3");
    let conn = Connection::open(db_path)?;
    init(&conn)?;
    Ok(conn)
}

/// Snapshot storage: one row per top-level key, each value a full JSON
/// serialization of the corresponding in-memory structure.
pub fn init(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

pub fn snapshot_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO snapshots(key, value) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (key, value.to_string()),
    )?;
    Ok(())
}

pub fn snapshot_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM snapshots WHERE key = ?", [key], |r| {
            r.get(0)
        })
        .optional()?;
    match raw {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}
