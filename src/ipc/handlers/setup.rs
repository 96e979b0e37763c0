use crate::db;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::conn_or_err;
use crate::ipc::types::{AppState, Request};
use crate::recent::RECENT_CAPACITY;
use crate::sort::SortKey;
use rusqlite::Connection;
use serde_json::{json, Map, Value};

#[derive(Clone, Copy)]
enum SetupSection {
    Dashboard,
    Grades,
    Appearance,
}

impl SetupSection {
    const ALL: [SetupSection; 3] = [Self::Dashboard, Self::Grades, Self::Appearance];

    fn parse(s: &str) -> Option<Self> {
        match s {
            "dashboard" => Some(Self::Dashboard),
            "grades" => Some(Self::Grades),
            "appearance" => Some(Self::Appearance),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Grades => "grades",
            Self::Appearance => "appearance",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Dashboard => "setup.dashboard",
            Self::Grades => "setup.grades",
            Self::Appearance => "setup.appearance",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Dashboard => json!({
            "recentLimit": RECENT_CAPACITY,
            "gwaDecimals": 2
        }),
        SetupSection::Grades => json!({
            "defaultSortKey": "none"
        }),
        SetupSection::Appearance => json!({
            "darkMode": false
        }),
    }
}

fn parse_bool(v: &Value, key: &str) -> Result<bool, String> {
    v.as_bool().ok_or_else(|| format!("{} must be boolean", key))
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = current
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())?;
    for (k, v) in patch {
        match section {
            SetupSection::Dashboard => match k.as_str() {
                "recentLimit" => {
                    let max = RECENT_CAPACITY as i64;
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 1, max)?));
                }
                "gwaDecimals" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 0, 4)?));
                }
                _ => return Err(format!("unknown dashboard field: {}", k)),
            },
            SetupSection::Grades => match k.as_str() {
                "defaultSortKey" => {
                    let s = v
                        .as_str()
                        .ok_or_else(|| format!("{} must be string", k))?
                        .trim();
                    if s != "none" && SortKey::parse(s).is_none() {
                        return Err(
                            "defaultSortKey must be one of: none, courseCode, finalGrade".into(),
                        );
                    }
                    obj.insert(k.clone(), Value::String(s.to_string()));
                }
                _ => return Err(format!("unknown grades field: {}", k)),
            },
            SetupSection::Appearance => match k.as_str() {
                "darkMode" => {
                    obj.insert(k.clone(), Value::Bool(parse_bool(v, k)?));
                }
                _ => return Err(format!("unknown appearance field: {}", k)),
            },
        }
    }
    Ok(())
}

fn load_section(conn: &Connection, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    if let Some(saved) = db::settings_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // Malformed stored values fall back to defaults field by field.
            for (k, v) in saved_obj {
                let mut one = Map::new();
                one.insert(k.clone(), v.clone());
                let _ = merge_section_patch(section, &mut current, &one);
            }
        }
    }
    Ok(current)
}

/// Preferences the session loaders need, resolved with defaults.
#[derive(Debug, Clone, Copy)]
pub struct SessionPrefs {
    pub recent_limit: usize,
    pub gwa_decimals: usize,
    pub default_sort: Option<SortKey>,
}

impl Default for SessionPrefs {
    fn default() -> Self {
        Self {
            recent_limit: RECENT_CAPACITY,
            gwa_decimals: 2,
            default_sort: None,
        }
    }
}

pub fn session_prefs(conn: &Connection) -> Result<SessionPrefs, HandlerErr> {
    let dashboard = load_section(conn, SetupSection::Dashboard)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let grades = load_section(conn, SetupSection::Grades)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let defaults = SessionPrefs::default();
    Ok(SessionPrefs {
        recent_limit: dashboard
            .get("recentLimit")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(defaults.recent_limit),
        gwa_decimals: dashboard
            .get("gwaDecimals")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(defaults.gwa_decimals),
        default_sort: grades
            .get("defaultSortKey")
            .and_then(|v| v.as_str())
            .and_then(SortKey::parse),
    })
}

/// Prefs when a workspace is open, defaults otherwise.
pub fn prefs_or_default(conn: Option<&Connection>) -> Result<SessionPrefs, HandlerErr> {
    match conn {
        Some(c) => session_prefs(c),
        None => Ok(SessionPrefs::default()),
    }
}

fn setup_get(state: &mut AppState) -> Result<Value, HandlerErr> {
    let conn = conn_or_err(&state.db)?;
    let mut out = Map::new();
    for section in SetupSection::ALL {
        let v = load_section(conn, section).map_err(|e| HandlerErr::db("db_query_failed", e))?;
        out.insert(section.name().to_string(), v);
    }
    Ok(Value::Object(out))
}

fn setup_update(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = conn_or_err(&state.db)?;
    let Some(section_raw) = params.get("section").and_then(|v| v.as_str()) else {
        return Err(HandlerErr::bad_params("missing section"));
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return Err(HandlerErr::bad_params("unknown section"));
    };
    let Some(patch_obj) = params.get("patch").and_then(|v| v.as_object()) else {
        return Err(HandlerErr::bad_params("patch must be an object"));
    };

    let mut current =
        load_section(conn, section).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    merge_section_patch(section, &mut current, patch_obj).map_err(HandlerErr::bad_params)?;
    db::settings_set_json(conn, section.key(), &current)
        .map_err(|e| HandlerErr::db("db_update_failed", e))?;
    tracing::info!(section = section.name(), "setup updated");
    Ok(json!({ section.name(): current }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(respond(&req.id, setup_get(state))),
        "setup.update" => Some(respond(&req.id, setup_update(state, &req.params))),
        _ => None,
    }
}
