use crate::db;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::conn_or_err;
use crate::ipc::types::{AppState, Request};
use crate::model::StudentProfile;
use serde_json::{json, Value};
use std::path::Path;

pub fn profile_json(p: &StudentProfile) -> Value {
    json!({
        "id": p.id,
        "studentNumber": p.student_number,
        "username": p.username,
        "fullName": p.full_name,
        "hasProfilePicture": p.has_profile_picture(),
        "profilePictureSha256": p.profile_picture_sha256,
    })
}

fn profile_get(state: &mut AppState) -> Result<Value, HandlerErr> {
    Ok(json!({ "profile": state.session.owner().map(profile_json) }))
}

fn profile_set_picture(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = conn_or_err(&state.db)?;
    let Some(owner_id) = state.session.owner().map(|o| o.id.clone()) else {
        return Err(HandlerErr::no_session());
    };

    let bytes = match params.get("path") {
        None => return Err(HandlerErr::bad_params("missing path")),
        Some(Value::Null) => None,
        Some(Value::String(p)) => {
            let path = Path::new(p);
            let bytes = std::fs::read(path).map_err(|e| {
                HandlerErr::new("io_failed", e.to_string())
                    .with_details(json!({ "path": path.to_string_lossy() }))
            })?;
            Some(bytes)
        }
        Some(_) => return Err(HandlerErr::bad_params("path must be a string or null")),
    };

    let updated = db::update_profile_picture(conn, &owner_id, bytes.as_deref())
        .map_err(|e| HandlerErr::db("db_update_failed", e))?;
    if !updated {
        return Err(HandlerErr::new("not_found", "student not found"));
    }
    let profile = db::student_profile(conn, &owner_id)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?
        .ok_or_else(|| HandlerErr::new("not_found", "student not found"))?;

    // Cached logins hold the old profile.
    state.credentials.forget_student(&owner_id);
    state.session.set_owner_profile(profile);
    tracing::info!(student_id = %owner_id, cleared = bytes.is_none(), "profile picture updated");
    profile_get(state)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "profile.get" => Some(respond(&req.id, profile_get(state))),
        "profile.setPicture" => Some(respond(&req.id, profile_set_picture(state, &req.params))),
        _ => None,
    }
}
