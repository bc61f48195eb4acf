
use serde_json::json;
use test_support::{
    login, request_err, request_ok, select_workspace, spawn_sidecar, temp_dir, STUDENT_EMAIL,
};

#[test]
fn login_issues_token_and_profile() {
    let workspace = temp_dir("attendtrack-login");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "email": STUDENT_EMAIL, "password": "password" }),
    );
    let token = result["token"].as_str().expect("token");
    assert!(token.contains('.'), "token must carry a signature tag");
    assert_eq!(result["user"]["role"], "student");
    assert_eq!(result["user"]["email"], STUDENT_EMAIL);
    assert!(result["user"]["studentNo"].is_string());
}

#[test]
fn wrong_password_is_invalid_credential() {
    let workspace = temp_dir("attendtrack-login-bad");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let code = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "email": STUDENT_EMAIL, "password": "nope" }),
    );
    assert_eq!(code, "invalid_credential");
}

#[test]
fn tampered_token_is_rejected_by_gated_methods() {
    let workspace = temp_dir("attendtrack-login-forged");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let token = login(&mut stdin, &mut reader, STUDENT_EMAIL);
    let (payload, tag) = token.split_once('.').expect("two-part token");
    let mut bytes = hex::decode(payload).expect("hex payload");
    bytes[0] ^= 0x01;
    let forged = format!("{}.{}", hex::encode(bytes), tag);

    let code = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "dashboard.student",
        json!({ "token": forged }),
    );
    assert_eq!(code, "invalid_credential");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.history",
        json!({ "token": "garbage" }),
    );
    assert_eq!(code, "invalid_credential");
}

#[test]
fn login_requires_a_selected_workspace() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let code = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "email": STUDENT_EMAIL, "password": "password" }),
    );
    assert_eq!(code, "no_workspace");
}
