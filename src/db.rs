use crate::model::{GradeEntry, RecentGrade, StudentProfile};
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use std::path::Path;
use uuid::Uuid;

pub const DB_FILE_NAME: &str = "armsd.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create workspace {}", workspace.to_string_lossy()))?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            student_number TEXT NOT NULL,
            username TEXT NOT NULL,
            full_name TEXT NOT NULL,
            password TEXT NOT NULL,
            profile_pic BLOB,
            updated_at TEXT,
            UNIQUE(student_number, username)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS grades(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            course_code TEXT NOT NULL,
            course_name TEXT NOT NULL,
            prelim REAL,
            midterm REAL,
            finals REAL,
            remarks TEXT,
            created_at TEXT,
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    // Workspaces created before recency tracking lack created_at.
    ensure_grades_created_at(conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grades_student ON grades(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grades_student_created ON grades(student_id, created_at)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

fn ensure_grades_created_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "grades", "created_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE grades ADD COLUMN created_at TEXT", [])?;
    // Legacy rows get an empty stamp, so they sort last among recent grades
    // and fall back to rowid order among themselves.
    conn.execute(
        "UPDATE grades SET created_at = '' WHERE created_at IS NULL",
        [],
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

fn picture_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn grade_from_row(row: &Row<'_>) -> rusqlite::Result<GradeEntry> {
    Ok(GradeEntry {
        id: row.get(0)?,
        student_id: row.get(1)?,
        course_code: row.get(2)?,
        course_name: row.get(3)?,
        prelim: row.get(4)?,
        midterm: row.get(5)?,
        finals: row.get(6)?,
        remarks: row.get(7)?,
    })
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<StudentProfile> {
    let pic: Option<Vec<u8>> = row.get(4)?;
    Ok(StudentProfile {
        id: row.get(0)?,
        student_number: row.get(1)?,
        username: row.get(2)?,
        full_name: row.get(3)?,
        profile_picture_sha256: pic.as_deref().map(picture_sha256),
    })
}

/// All grades for one student in insertion order.
pub fn fetch_grade_entries(conn: &Connection, student_id: &str) -> anyhow::Result<Vec<GradeEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, student_id, course_code, course_name, prelim, midterm, finals, remarks
         FROM grades
         WHERE student_id = ?
         ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([student_id], grade_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Most recently recorded grades first, already limited.
pub fn fetch_recent_grade_entries(
    conn: &Connection,
    student_id: &str,
    limit: usize,
) -> anyhow::Result<Vec<RecentGrade>> {
    let mut stmt = conn.prepare(
        "SELECT course_code, COALESCE(finals, midterm, prelim) AS grade, remarks
         FROM grades
         WHERE student_id = ?
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?",
    )?;
    let rows = stmt
        .query_map((student_id, limit as i64), |row| {
            Ok(RecentGrade {
                course_code: row.get(0)?,
                score: row.get(1)?,
                remarks: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Stored password and profile for a (student number, username) pair.
pub fn find_login(
    conn: &Connection,
    student_number: &str,
    username: &str,
) -> anyhow::Result<Option<(String, StudentProfile)>> {
    let found = conn
        .query_row(
            "SELECT id, student_number, username, full_name, profile_pic, password
             FROM students
             WHERE student_number = ? AND username = ?",
            (student_number, username),
            |row| {
                let password: String = row.get(5)?;
                Ok((password, profile_from_row(row)?))
            },
        )
        .optional()?;
    Ok(found)
}

pub fn student_profile(conn: &Connection, student_id: &str) -> anyhow::Result<Option<StudentProfile>> {
    let found = conn
        .query_row(
            "SELECT id, student_number, username, full_name, profile_pic
             FROM students
             WHERE id = ?",
            [student_id],
            profile_from_row,
        )
        .optional()?;
    Ok(found)
}

pub fn list_students(conn: &Connection) -> anyhow::Result<Vec<StudentProfile>> {
    let mut stmt = conn.prepare(
        "SELECT id, student_number, username, full_name, profile_pic
         FROM students
         ORDER BY full_name, student_number",
    )?;
    let rows = stmt
        .query_map([], profile_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn insert_student(
    conn: &Connection,
    student_number: &str,
    username: &str,
    full_name: &str,
    password: &str,
) -> anyhow::Result<String> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO students(id, student_number, username, full_name, password, updated_at)
         VALUES(?, ?, ?, ?, ?, ?)",
        (&id, student_number, username, full_name, password, now_timestamp()),
    )
    .context("failed to insert student")?;
    Ok(id)
}

pub fn student_exists(conn: &Connection, student_id: &str) -> anyhow::Result<bool> {
    let hit: Option<i64> = conn
        .query_row("SELECT 1 FROM students WHERE id = ?", [student_id], |r| r.get(0))
        .optional()?;
    Ok(hit.is_some())
}

#[derive(Debug, Clone)]
pub struct GradeInput {
    pub course_code: String,
    pub course_name: String,
    pub prelim: Option<f64>,
    pub midterm: Option<f64>,
    pub finals: Option<f64>,
    pub remarks: Option<String>,
}

/// Inserts a new grade row, or updates the row with `grade_id` when given.
/// Updating also refreshes `created_at`, so edited grades count as recent.
/// Returns the row id, or `None` if `grade_id` matched nothing for this student.
pub fn upsert_grade(
    conn: &Connection,
    student_id: &str,
    grade_id: Option<&str>,
    input: &GradeInput,
) -> anyhow::Result<Option<String>> {
    let ts = now_timestamp();
    match grade_id {
        Some(id) => {
            let changed = conn
                .execute(
                    "UPDATE grades
                     SET course_code = ?, course_name = ?, prelim = ?, midterm = ?, finals = ?, remarks = ?, created_at = ?
                     WHERE id = ? AND student_id = ?",
                    rusqlite::params![
                        input.course_code,
                        input.course_name,
                        input.prelim,
                        input.midterm,
                        input.finals,
                        input.remarks,
                        ts,
                        id,
                        student_id
                    ],
                )
                .context("failed to update grade")?;
            Ok((changed > 0).then(|| id.to_string()))
        }
        None => {
            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO grades(id, student_id, course_code, course_name, prelim, midterm, finals, remarks, created_at)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    id,
                    student_id,
                    input.course_code,
                    input.course_name,
                    input.prelim,
                    input.midterm,
                    input.finals,
                    input.remarks,
                    ts
                ],
            )
            .context("failed to insert grade")?;
            Ok(Some(id))
        }
    }
}

pub fn delete_grade(conn: &Connection, student_id: &str, grade_id: &str) -> anyhow::Result<bool> {
    let n = conn.execute(
        "DELETE FROM grades WHERE id = ? AND student_id = ?",
        (grade_id, student_id),
    )?;
    Ok(n > 0)
}

pub fn update_profile_picture(
    conn: &Connection,
    student_id: &str,
    image: Option<&[u8]>,
) -> anyhow::Result<bool> {
    let n = conn.execute(
        "UPDATE students SET profile_pic = ?, updated_at = ? WHERE id = ?",
        (image, now_timestamp(), student_id),
    )?;
    Ok(n > 0)
}

/// Replaces the password when `current` matches. Returns false on mismatch.
pub fn change_password(
    conn: &Connection,
    student_id: &str,
    current: &str,
    new_password: &str,
) -> anyhow::Result<bool> {
    let n = conn.execute(
        "UPDATE students SET password = ?, updated_at = ? WHERE id = ? AND password = ?",
        (new_password, now_timestamp(), student_id, current),
    )?;
    Ok(n > 0)
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row("SELECT value_json FROM settings WHERE key = ?", [key], |r| r.get(0))
        .optional()?;
    match raw {
        Some(s) => Ok(Some(
            serde_json::from_str(&s).with_context(|| format!("bad settings json for {key}"))?,
        )),
        None => Ok(None),
    }
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, serde_json::to_string(value)?),
    )?;
    Ok(())
}
