
use serde_json::json;
use test_support::{
    login, request, request_ok, select_workspace, spawn_sidecar, temp_dir, ADMIN_EMAIL,
    LECTURER_EMAIL, STUDENT_EMAIL,
};

#[test]
fn router_dispatch_smoke_covers_every_method() {
    let workspace = temp_dir("attendtrack-router-smoke");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health["version"].is_string());

    select_workspace(&mut stdin, &mut reader, &workspace);

    let student = login(&mut stdin, &mut reader, STUDENT_EMAIL);
    let lecturer = login(&mut stdin, &mut reader, LECTURER_EMAIL);
    let admin = login(&mut stdin, &mut reader, ADMIN_EMAIL);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "dashboard.student",
        json!({ "token": student }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "dashboard.lecturer",
        json!({ "token": lecturer }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "dashboard.admin",
        json!({ "token": admin }),
    );

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "session.create",
        json!({ "token": lecturer, "courseId": 1 }),
    );
    let code = created["session"]["code"].as_str().expect("code");
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "attendance.mark",
        json!({ "token": student, "code": code }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "attendance.history",
        json!({ "token": student }),
    );

    // The admin view now counts the session created above.
    let dash = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "dashboard.admin",
        json!({ "token": admin }),
    );
    assert_eq!(dash["stats"]["totalSessions"], 1);

    let unknown = request(&mut stdin, &mut reader, "9", "nope.nothing", json!({}));
    assert_eq!(
        unknown["error"]["code"].as_str(),
        Some("not_implemented"),
        "unknown methods must be reported, not dropped"
    );
}
