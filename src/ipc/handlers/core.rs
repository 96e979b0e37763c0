use crate::db;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn health(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
        "sessionActive": state.session.is_active(),
        "cachedLogins": state.credentials.len()
    }))
}

fn workspace_select(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let Some(path) = params.get("path").and_then(|v| v.as_str()).map(PathBuf::from) else {
        return Err(HandlerErr::bad_params("missing params.path"));
    };

    let conn = db::open_db(&path).map_err(|e| HandlerErr::db("db_open_failed", e))?;

    // A different database means different students: nothing cached may carry over.
    state.session.clear();
    state.credentials.clear();
    state.db = Some(conn);
    state.workspace = Some(path.clone());
    tracing::info!(workspace = %path.to_string_lossy(), "workspace opened");

    Ok(json!({ "workspacePath": path.to_string_lossy() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(respond(&req.id, health(state))),
        "workspace.select" => Some(respond(&req.id, workspace_select(state, &req.params))),
        _ => None,
    }
}
