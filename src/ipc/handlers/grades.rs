use crate::aggregate::GradeAggregate;
use crate::db::{self, GradeInput};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::dashboard::dashboard_model;
use crate::ipc::handlers::setup::{prefs_or_default, session_prefs};
use crate::ipc::helpers::{
    conn_or_err, fetch_student_grades, optional_score, optional_str, required_str,
};
use crate::ipc::types::{AppState, Request};
use crate::session::Session;
use crate::sort::SortKey;
use serde_json::{json, Value};

pub fn grades_model(session: &Session) -> Value {
    json!({
        "active": session.is_active(),
        "sortKey": session.sort_key().map(SortKey::as_str),
        "grades": session.records(),
    })
}

fn grades_list(state: &mut AppState) -> Result<Value, HandlerErr> {
    Ok(grades_model(&state.session))
}

fn grades_sort(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let raw = params
        .get("key")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing key"))?;
    let key = SortKey::parse(raw).ok_or_else(|| {
        HandlerErr::bad_params("key must be one of: courseCode, finalGrade")
            .with_details(json!({ "key": raw }))
    })?;

    // Without a session this leaves everything as it was.
    state.session.sort(key);
    tracing::debug!(key = key.as_str(), rows = state.session.records().len(), "grades sorted");
    Ok(grades_model(&state.session))
}

fn grades_refresh(state: &mut AppState) -> Result<Value, HandlerErr> {
    let prefs = prefs_or_default(state.db.as_ref())?;
    let Some(owner_id) = state.session.owner().map(|o| o.id.clone()) else {
        return Ok(json!({
            "grades": grades_model(&state.session),
            "dashboard": dashboard_model(&state.session, prefs.gwa_decimals),
        }));
    };
    let conn = conn_or_err(&state.db)?;
    let (entries, recent) = fetch_student_grades(conn, &owner_id, prefs.recent_limit)?;
    tracing::debug!(student_id = %owner_id, entries = entries.len(), "grades reloaded");
    state.session.reload(entries, &recent, prefs.default_sort);

    Ok(json!({
        "grades": grades_model(&state.session),
        "dashboard": dashboard_model(&state.session, prefs.gwa_decimals),
    }))
}

fn require_student(conn: &rusqlite::Connection, params: &Value) -> Result<String, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    let exists =
        db::student_exists(conn, &student_id).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    if !exists {
        return Err(HandlerErr::new("not_found", "student not found")
            .with_details(json!({ "studentId": student_id })));
    }
    Ok(student_id)
}

/// Registrar view of one student's grades. Does not touch the active session.
fn grades_for_student(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = conn_or_err(&state.db)?;
    let student_id = require_student(conn, params)?;
    let prefs = session_prefs(conn)?;
    let entries =
        db::fetch_grade_entries(conn, &student_id).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let agg = GradeAggregate::from_entries(entries);
    Ok(json!({
        "studentId": student_id,
        "grades": agg.records(),
        "enrolledCourseCodes": agg.enrolled_courses(),
        "stats": agg.stats(prefs.gwa_decimals),
    }))
}

fn grades_upsert(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = conn_or_err(&state.db)?;
    let student_id = require_student(conn, params)?;
    let grade_id = optional_str(params, "gradeId")?;
    let course_code = required_str(params, "courseCode")?;
    let input = GradeInput {
        course_name: optional_str(params, "courseName")?.unwrap_or_else(|| course_code.clone()),
        course_code,
        prelim: optional_score(params, "prelim")?,
        midterm: optional_score(params, "midterm")?,
        finals: optional_score(params, "finals")?,
        remarks: optional_str(params, "remarks")?,
    };

    let saved = db::upsert_grade(conn, &student_id, grade_id.as_deref(), &input).map_err(|e| {
        let code = if grade_id.is_some() {
            "db_update_failed"
        } else {
            "db_insert_failed"
        };
        HandlerErr::db(code, e)
    })?;
    let Some(id) = saved else {
        return Err(HandlerErr::new("not_found", "grade not found")
            .with_details(json!({ "gradeId": grade_id })));
    };
    tracing::info!(student_id = %student_id, grade_id = %id, course = %input.course_code, "grade saved");
    Ok(json!({ "gradeId": id, "created": grade_id.is_none() }))
}

fn grades_delete(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = conn_or_err(&state.db)?;
    let student_id = require_student(conn, params)?;
    let grade_id = required_str(params, "gradeId")?;
    let deleted = db::delete_grade(conn, &student_id, &grade_id)
        .map_err(|e| HandlerErr::db("db_delete_failed", e))?;
    if !deleted {
        return Err(HandlerErr::new("not_found", "grade not found")
            .with_details(json!({ "gradeId": grade_id })));
    }
    tracing::info!(student_id = %student_id, grade_id = %grade_id, "grade deleted");
    Ok(json!({ "deleted": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.list" => Some(respond(&req.id, grades_list(state))),
        "grades.sort" => Some(respond(&req.id, grades_sort(state, &req.params))),
        "grades.refresh" => Some(respond(&req.id, grades_refresh(state))),
        "grades.forStudent" => Some(respond(&req.id, grades_for_student(state, &req.params))),
        "grades.upsert" => Some(respond(&req.id, grades_upsert(state, &req.params))),
        "grades.delete" => Some(respond(&req.id, grades_delete(state, &req.params))),
        _ => None,
    }
}
