use crate::aggregate::{format_gwa, term_gwa};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::setup::prefs_or_default;
use crate::ipc::types::{AppState, Request};
use crate::session::Session;
use serde_json::{json, Value};

pub fn dashboard_model(session: &Session, gwa_decimals: usize) -> Value {
    json!({
        "active": session.is_active(),
        "stats": session.stats(gwa_decimals),
        "enrolledCourseCodes": session.enrolled_courses(),
        "recent": session.recent(),
        "recentRows": session.recent_rows(),
    })
}

fn dashboard_get(state: &mut AppState) -> Result<Value, HandlerErr> {
    let prefs = prefs_or_default(state.db.as_ref())?;
    Ok(dashboard_model(&state.session, prefs.gwa_decimals))
}

/// Accepts a JSON number or a numeric string, as typed into the calculator.
fn calculator_input(params: &Value, key: &str) -> Option<f64> {
    let n = match params.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn gwa_compute(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let prelim = calculator_input(params, "prelim");
    let midterm = calculator_input(params, "midterm");
    let finals = calculator_input(params, "finals");
    let (Some(p), Some(m), Some(f)) = (prelim, midterm, finals) else {
        return Err(HandlerErr::bad_params("Please enter valid numbers."));
    };

    let prefs = prefs_or_default(state.db.as_ref())?;
    let gwa = term_gwa(p, m, f);
    Ok(json!({
        "gwa": gwa,
        "gwaDisplay": format_gwa(Some(gwa), prefs.gwa_decimals),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.get" => Some(respond(&req.id, dashboard_get(state))),
        "gwa.compute" => Some(respond(&req.id, gwa_compute(state, &req.params))),
        _ => None,
    }
}
