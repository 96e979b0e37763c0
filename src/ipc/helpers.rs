use crate::db;
use crate::ipc::error::HandlerErr;
use crate::model::{GradeEntry, RecentGrade};
use rusqlite::Connection;
use serde_json::Value;

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

pub fn conn_or_err(db: &Option<Connection>) -> Result<&Connection, HandlerErr> {
    db.as_ref().ok_or_else(HandlerErr::no_workspace)
}

/// Required string param, trimmed. Empty counts as missing.
pub fn required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    match params.get(key).and_then(|v| v.as_str()).map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        Some(_) => Err(HandlerErr::bad_params(format!("{key} must not be empty"))),
        None => Err(HandlerErr::bad_params(format!("missing {key}"))),
    }
}

pub fn optional_str(params: &Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
        Some(_) => Err(HandlerErr::bad_params(format!("{key} must be a string"))),
    }
}

/// Optional score: absent or null means "no score yet".
pub fn optional_score(params: &Value, key: &str) -> Result<Option<f64>, HandlerErr> {
    let v = match params.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };
    let Some(n) = v.as_f64() else {
        return Err(HandlerErr::bad_params(format!("{key} must be a number or null")));
    };
    if !n.is_finite() || !(SCORE_MIN..=SCORE_MAX).contains(&n) {
        return Err(HandlerErr::bad_params(format!(
            "{key} must be in {SCORE_MIN}..={SCORE_MAX}"
        ))
        .with_details(serde_json::json!({ "value": n })));
    }
    Ok(Some(n))
}

/// Full and most-recent grade sets for one student.
pub fn fetch_student_grades(
    conn: &Connection,
    student_id: &str,
    recent_limit: usize,
) -> Result<(Vec<GradeEntry>, Vec<RecentGrade>), HandlerErr> {
    let entries = db::fetch_grade_entries(conn, student_id)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let recent = db::fetch_recent_grade_entries(conn, student_id, recent_limit)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    Ok((entries, recent))
}
