use crate::db;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{conn_or_err, required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};

fn students_list(state: &mut AppState) -> Result<Value, HandlerErr> {
    let conn = conn_or_err(&state.db)?;
    let students = db::list_students(conn).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let rows: Vec<Value> = students
        .iter()
        .map(|s| {
            json!({
                "id": s.id,
                "studentNumber": s.student_number,
                "username": s.username,
                "fullName": s.full_name,
            })
        })
        .collect();
    Ok(json!({ "students": rows }))
}

fn students_create(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = conn_or_err(&state.db)?;
    let student_number = required_str(params, "studentNumber")?;
    let username = required_str(params, "username")?;
    let full_name = required_str(params, "fullName")?;
    let password = params
        .get("password")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params("missing password"))?;

    let taken = db::find_login(conn, &student_number, &username)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?
        .is_some();
    if taken {
        return Err(HandlerErr::new("conflict", "student number and username already in use")
            .with_details(json!({ "studentNumber": student_number, "username": username })));
    }

    let id = db::insert_student(conn, &student_number, &username, &full_name, password)
        .map_err(|e| HandlerErr::db("db_insert_failed", e))?;
    tracing::info!(student_id = %id, "student created");
    Ok(json!({ "studentId": id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(respond(&req.id, students_list(state))),
        "students.create" => Some(respond(&req.id, students_create(state, &req.params))),
        _ => None,
    }
}
