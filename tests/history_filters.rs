
use serde_json::json;
use test_support::{
    login, request_err, request_ok, select_workspace, spawn_sidecar, temp_dir, STUDENT_EMAIL,
};

#[test]
fn history_is_sorted_and_narrowed_by_filters() {
    let workspace = temp_dir("attendtrack-history");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);
    let token = login(&mut stdin, &mut reader, STUDENT_EMAIL);

    let all = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.history",
        json!({ "token": token }),
    );
    let rows = all["history"].as_array().expect("rows");
    assert!(!rows.is_empty(), "seed backfills ~30 days of history");
    let stamps: Vec<&str> = rows
        .iter()
        .map(|r| r["timestamp"].as_str().expect("timestamp"))
        .collect();
    for pair in stamps.windows(2) {
        assert!(pair[0] >= pair[1], "history must be newest first");
    }

    let by_course = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.history",
        json!({ "token": token, "filters": { "courseId": 1 } }),
    );
    let course_rows = by_course["history"].as_array().expect("rows");
    assert!(!course_rows.is_empty());
    assert!(course_rows.len() < rows.len());
    for r in course_rows {
        assert_eq!(r["courseCode"], "CS 301");
    }

    let present_only = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.history",
        json!({ "token": token, "filters": { "status": "present" } }),
    );
    for r in present_only["history"].as_array().expect("rows") {
        assert_eq!(r["status"], "present");
    }

    // Seed spans at most two calendar months, so two bare-month filters
    // must cover every row between them.
    let mut by_month = 0;
    for (i, month) in (1..=12).enumerate() {
        let filtered = request_ok(
            &mut stdin,
            &mut reader,
            &format!("m{}", i),
            "attendance.history",
            json!({ "token": token, "filters": { "month": month.to_string() } }),
        );
        by_month += filtered["history"].as_array().expect("rows").len();
    }
    assert_eq!(by_month, rows.len());
}

#[test]
fn invalid_filters_are_bad_params() {
    let workspace = temp_dir("attendtrack-history-bad");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);
    let token = login(&mut stdin, &mut reader, STUDENT_EMAIL);

    for (i, filters) in [
        json!({ "month": "13" }),
        json!({ "month": "not-a-month" }),
        json!({ "status": "late" }),
        json!({ "courseId": "one" }),
    ]
    .iter()
    .enumerate()
    {
        let code = request_err(
            &mut stdin,
            &mut reader,
            &format!("b{}", i),
            "attendance.history",
            json!({ "token": token, "filters": filters }),
        );
        assert_eq!(code, "bad_params");
    }
}
