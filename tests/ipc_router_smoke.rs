mod common;

use common::{temp_dir, Sidecar};
use serde_json::json;

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("armsd-router-smoke");
    let picture = workspace.join("avatar.png");
    std::fs::write(&picture, b"not really a png").expect("write picture");

    let mut sc = Sidecar::spawn();
    let calls: Vec<(&str, serde_json::Value)> = vec![
        ("health", json!({})),
        ("workspace.select", json!({ "path": workspace.to_string_lossy() })),
        ("students.list", json!({})),
        (
            "students.create",
            json!({ "studentNumber": "1", "username": "u", "fullName": "U", "password": "p" }),
        ),
        ("auth.login", json!({ "studentNumber": "1", "username": "u", "password": "p" })),
        ("grades.list", json!({})),
        ("grades.sort", json!({ "key": "courseCode" })),
        ("grades.refresh", json!({})),
        ("grades.forStudent", json!({ "studentId": "missing" })),
        ("grades.upsert", json!({ "studentId": "missing", "courseCode": "X" })),
        ("grades.delete", json!({ "studentId": "missing", "gradeId": "missing" })),
        ("dashboard.get", json!({})),
        ("gwa.compute", json!({ "prelim": 1, "midterm": 2, "finals": 3 })),
        ("profile.get", json!({})),
        ("profile.setPicture", json!({ "path": picture.to_string_lossy() })),
        ("auth.changePassword", json!({ "currentPassword": "p", "newPassword": "q" })),
        ("setup.get", json!({})),
        ("setup.update", json!({ "section": "appearance", "patch": { "darkMode": true } })),
        ("auth.logout", json!({})),
    ];

    for (method, params) in calls {
        let resp = sc.request(method, params);
        if resp.get("ok").and_then(|v| v.as_bool()) == Some(false) {
            let code = resp
                .get("error")
                .and_then(|e| e.get("code"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            assert_ne!(code, "not_implemented", "unexpected unknown method for {}", method);
        }
    }

    assert_eq!(sc.request_err("reports.classList", json!({})), "not_implemented");

    drop(sc);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn unparseable_line_gets_bad_json_and_loop_continues() {
    let mut sc = Sidecar::spawn();
    let resp = sc.send_raw("{not json");
    assert_eq!(resp["ok"], json!(false));
    assert_eq!(resp["error"]["code"], json!("bad_json"));

    let health = sc.request_ok("health", json!({}));
    assert_eq!(health["sessionActive"], json!(false));
    assert_eq!(health["workspacePath"], serde_json::Value::Null);
}

#[test]
fn workspace_required_before_data_calls() {
    let mut sc = Sidecar::spawn();
    assert_eq!(
        sc.request_err("auth.login", json!({ "studentNumber": "1", "username": "u", "password": "p" })),
        "no_workspace"
    );
    assert_eq!(sc.request_err("students.list", json!({})), "no_workspace");
    assert_eq!(sc.request_err("setup.get", json!({})), "no_workspace");
}
