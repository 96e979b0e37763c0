use crate::db;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::dashboard::dashboard_model;
use crate::ipc::handlers::grades::grades_model;
use crate::ipc::handlers::profile::profile_json;
use crate::ipc::handlers::setup::session_prefs;
use crate::ipc::helpers::{conn_or_err, fetch_student_grades, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::StudentProfile;
use crate::session::CredentialCache;
use rusqlite::Connection;
use serde_json::{json, Value};

/// Checks credentials, consulting the cache before the database.
/// A successful database check is remembered; a failed one evicts the key.
pub fn authenticate(
    conn: &Connection,
    cache: &mut CredentialCache,
    student_number: &str,
    username: &str,
    password: &str,
) -> anyhow::Result<Option<StudentProfile>> {
    if let Some(profile) = cache.check(student_number, username, password) {
        tracing::debug!(student_id = %profile.id, "login served from credential cache");
        return Ok(Some(profile.clone()));
    }

    match db::find_login(conn, student_number, username)? {
        Some((stored, profile)) if stored == password => {
            cache.remember(student_number, username, password, &profile);
            Ok(Some(profile))
        }
        _ => {
            cache.forget(student_number, username);
            Ok(None)
        }
    }
}

fn login(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = conn_or_err(&state.db)?;

    let student_number = params
        .get("studentNumber")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .unwrap_or("");
    let username = params
        .get("username")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .unwrap_or("");
    let password = params.get("password").and_then(|v| v.as_str()).unwrap_or("");
    if student_number.is_empty() || username.is_empty() || password.is_empty() {
        return Err(HandlerErr::bad_params(
            "Please fill Student Number, Username, and Password.",
        ));
    }

    let profile = authenticate(conn, &mut state.credentials, student_number, username, password)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let Some(profile) = profile else {
        tracing::warn!(username, "login failed");
        return Err(HandlerErr::new(
            "login_failed",
            "no matching student or wrong password",
        ));
    };

    let prefs = session_prefs(conn)?;
    let (entries, recent) = fetch_student_grades(conn, &profile.id, prefs.recent_limit)?;
    tracing::info!(student_id = %profile.id, entries = entries.len(), "login");
    state
        .session
        .activate(profile, entries, &recent, prefs.default_sort);

    Ok(json!({
        "profile": state.session.owner().map(profile_json),
        "grades": grades_model(&state.session),
        "dashboard": dashboard_model(&state.session, prefs.gwa_decimals),
    }))
}

fn logout(state: &mut AppState) -> Result<Value, HandlerErr> {
    let was_active = state.session.is_active();
    if let Some(owner) = state.session.owner() {
        tracing::info!(student_id = %owner.id, "logout");
    }
    state.session.clear();
    Ok(json!({ "loggedOut": was_active }))
}

fn change_password(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = conn_or_err(&state.db)?;
    let Some(owner) = state.session.owner() else {
        return Err(HandlerErr::no_session());
    };
    let current = params
        .get("currentPassword")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing currentPassword"))?;
    let new_password = required_str(params, "newPassword")?;

    let changed = db::change_password(conn, &owner.id, current, &new_password)
        .map_err(|e| HandlerErr::db("db_update_failed", e))?;
    if !changed {
        return Err(HandlerErr::new(
            "bad_credentials",
            "current password does not match",
        ));
    }
    state.credentials.forget_student(&owner.id);
    tracing::info!(student_id = %owner.id, "password changed");
    Ok(json!({ "changed": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(respond(&req.id, login(state, &req.params))),
        "auth.logout" => Some(respond(&req.id, logout(state))),
        "auth.changePassword" => Some(respond(&req.id, change_password(state, &req.params))),
        _ => None,
    }
}
