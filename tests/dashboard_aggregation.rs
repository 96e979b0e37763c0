mod common;

use common::{temp_dir, Sidecar};
use serde_json::json;

#[test]
fn login_dashboard_averages_effective_scores_and_dedups_courses() {
    let workspace = temp_dir("armsd-dashboard");
    let mut sc = Sidecar::spawn();
    sc.request_ok("workspace.select", json!({ "path": workspace.to_string_lossy() }));

    let sid = sc.create_student("2024-001", "ana", "Ana Cruz", "pw");
    sc.add_grade(&sid, json!({ "courseCode": "CS101", "courseName": "Programming", "finals": 1.5 }));
    sc.add_grade(&sid, json!({ "courseCode": "MATH201", "courseName": "Calculus", "prelim": 1.0, "midterm": 2.0 }));
    sc.add_grade(&sid, json!({ "courseCode": "CS101", "courseName": "Programming Lab" }));

    let res = sc.login("2024-001", "ana", "pw");
    assert_eq!(res["profile"]["fullName"], json!("Ana Cruz"));

    let grades = &res["grades"];
    assert_eq!(grades["active"], json!(true));
    assert_eq!(grades["grades"].as_array().map(|a| a.len()), Some(3));

    let dash = &res["dashboard"];
    // (1.5 + 2.0) / 2; the unscored CS101 row is left out.
    assert_eq!(dash["stats"]["gwa"], json!(1.75));
    assert_eq!(dash["stats"]["gwaDisplay"], json!("1.75"));
    assert_eq!(dash["stats"]["enrolledCourses"], json!(2));
    assert_eq!(dash["enrolledCourseCodes"], json!(["CS101", "MATH201"]));
    assert_eq!(dash["recent"], json!(["CS101: —", "MATH201: 2.0", "CS101: 1.5"]));

    drop(sc);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn no_scores_shows_placeholder_not_zero() {
    let workspace = temp_dir("armsd-dashboard-empty");
    let mut sc = Sidecar::spawn();
    sc.request_ok("workspace.select", json!({ "path": workspace.to_string_lossy() }));

    let sid = sc.create_student("2024-002", "ben", "Ben Reyes", "pw");
    sc.add_grade(&sid, json!({ "courseCode": "ENG1" }));
    sc.login("2024-002", "ben", "pw");

    let dash = sc.request_ok("dashboard.get", json!({}));
    assert_eq!(dash["stats"]["gwa"], serde_json::Value::Null);
    assert_eq!(dash["stats"]["gwaDisplay"], json!("—"));
    assert_eq!(dash["stats"]["enrolledCourses"], json!(1));

    drop(sc);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn recent_list_is_capped_at_five_newest() {
    let workspace = temp_dir("armsd-dashboard-recent");
    let mut sc = Sidecar::spawn();
    sc.request_ok("workspace.select", json!({ "path": workspace.to_string_lossy() }));

    let sid = sc.create_student("2024-003", "cy", "Cy Lim", "pw");
    for (i, code) in ["A", "B", "C", "D", "E", "F"].iter().enumerate() {
        sc.add_grade(&sid, json!({ "courseCode": code, "finals": (i + 1) as f64 }));
    }
    sc.login("2024-003", "cy", "pw");

    let dash = sc.request_ok("dashboard.get", json!({}));
    assert_eq!(
        dash["recent"],
        json!(["F: 6.0", "E: 5.0", "D: 4.0", "C: 3.0", "B: 2.0"])
    );
    assert_eq!(dash["recentRows"].as_array().map(|a| a.len()), Some(5));
    assert_eq!(dash["stats"]["enrolledCourses"], json!(6));
    assert_eq!(dash["stats"]["gwaDisplay"], json!("3.50"));

    drop(sc);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn registrar_edits_show_up_after_refresh() {
    let workspace = temp_dir("armsd-dashboard-refresh");
    let mut sc = Sidecar::spawn();
    sc.request_ok("workspace.select", json!({ "path": workspace.to_string_lossy() }));

    let sid = sc.create_student("2024-004", "dee", "Dee Tan", "pw");
    let gid = sc.add_grade(&sid, json!({ "courseCode": "CS101", "prelim": 3.0 }));
    sc.login("2024-004", "dee", "pw");

    sc.request_ok(
        "grades.upsert",
        json!({ "studentId": sid, "gradeId": gid, "courseCode": "CS101", "prelim": 3.0, "finals": 1.25 }),
    );
    // Not patched in place.
    let before = sc.request_ok("dashboard.get", json!({}));
    assert_eq!(before["stats"]["gwa"], json!(3.0));

    let after = sc.request_ok("grades.refresh", json!({}));
    assert_eq!(after["dashboard"]["stats"]["gwa"], json!(1.25));

    sc.request_ok("grades.delete", json!({ "studentId": sid, "gradeId": gid }));
    let after = sc.request_ok("grades.refresh", json!({}));
    assert_eq!(after["grades"]["grades"], json!([]));
    assert_eq!(after["dashboard"]["stats"]["gwaDisplay"], json!("—"));

    drop(sc);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn registrar_view_aggregates_without_a_session() {
    let workspace = temp_dir("armsd-dashboard-registrar");
    let mut sc = Sidecar::spawn();
    sc.request_ok("workspace.select", json!({ "path": workspace.to_string_lossy() }));

    let sid = sc.create_student("2024-005", "eve", "Eve Ong", "pw");
    sc.add_grade(&sid, json!({ "courseCode": "CS101", "finals": 1.0 }));
    sc.add_grade(&sid, json!({ "courseCode": "CS102", "midterm": 2.0 }));

    let res = sc.request_ok("grades.forStudent", json!({ "studentId": sid }));
    assert_eq!(res["stats"]["gwa"], json!(1.5));
    assert_eq!(res["enrolledCourseCodes"], json!(["CS101", "CS102"]));

    let health = sc.request_ok("health", json!({}));
    assert_eq!(health["sessionActive"], json!(false));

    drop(sc);
    let _ = std::fs::remove_dir_all(workspace);
}
