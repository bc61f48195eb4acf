
use serde_json::json;
use test_support::{
    login, request_err, request_ok, select_workspace, spawn_sidecar, temp_dir, ADMIN_EMAIL,
    LECTURER_EMAIL, STUDENT_EMAIL,
};

#[test]
fn lecturer_and_admin_views_reject_other_roles() {
    let workspace = temp_dir("attendtrack-role-gates");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let student = login(&mut stdin, &mut reader, STUDENT_EMAIL);
    let lecturer = login(&mut stdin, &mut reader, LECTURER_EMAIL);
    let admin = login(&mut stdin, &mut reader, ADMIN_EMAIL);

    for (i, token) in [&student, &admin].iter().enumerate() {
        let code = request_err(
            &mut stdin,
            &mut reader,
            &format!("l{}", i),
            "dashboard.lecturer",
            json!({ "token": token }),
        );
        assert_eq!(code, "access_denied");
    }
    for (i, token) in [&student, &lecturer].iter().enumerate() {
        let code = request_err(
            &mut stdin,
            &mut reader,
            &format!("a{}", i),
            "dashboard.admin",
            json!({ "token": token }),
        );
        assert_eq!(code, "access_denied");
    }

    // The matching roles still get through.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "ok1",
        "dashboard.lecturer",
        json!({ "token": lecturer }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "ok2",
        "dashboard.admin",
        json!({ "token": admin }),
    );
}

#[test]
fn session_creation_is_lecturer_only() {
    let workspace = temp_dir("attendtrack-create-gate");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let student = login(&mut stdin, &mut reader, STUDENT_EMAIL);
    let code = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "session.create",
        json!({ "token": student, "courseId": 1 }),
    );
    assert_eq!(code, "access_denied");
}
