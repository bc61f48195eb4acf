use chrono::Datelike;
use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{claims_from_params, parse_month_key, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::{AttendanceRecord, AttendanceStatus, Store};
use crate::token::Claims;

struct HistoryFilters {
    course_id: Option<i64>,
    status: Option<AttendanceStatus>,
    month: Option<(Option<i32>, u32)>,
}

fn parse_filters(params: &serde_json::Value) -> Result<HistoryFilters, HandlerErr> {
    let filters = params.get("filters").cloned().unwrap_or(json!({}));

    let course_id = match filters.get("courseId") {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => Some(
            v.as_i64()
                .ok_or_else(|| HandlerErr::new("bad_params", "courseId must be an integer"))?,
        ),
    };
    let status = match filters.get("status") {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => match v.as_str() {
            Some("present") => Some(AttendanceStatus::Present),
            Some("absent") => Some(AttendanceStatus::Absent),
            _ => {
                return Err(HandlerErr::new(
                    "bad_params",
                    "status must be present or absent",
                ))
            }
        },
    };
    let month = match filters.get("month") {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => {
            let raw = v
                .as_str()
                .ok_or_else(|| HandlerErr::new("bad_params", "month must be a string"))?;
            Some(parse_month_key(raw)?)
        }
    };

    Ok(HistoryFilters {
        course_id,
        status,
        month,
    })
}

fn matches(r: &AttendanceRecord, f: &HistoryFilters) -> bool {
    if let Some(course_id) = f.course_id {
        if r.course_id != course_id {
            return false;
        }
    }
    if let Some(status) = f.status {
        if r.status != status {
            return false;
        }
    }
    if let Some((year, month)) = f.month {
        let d = r.timestamp.date_naive();
        if d.month() != month {
            return false;
        }
        if let Some(year) = year {
            if d.year() != year {
                return false;
            }
        }
    }
    true
}

fn attendance_history(
    store: &Store,
    claims: &Claims,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let filters = parse_filters(params)?;
    let student_id = claims.user_id;

    let mut rows: Vec<&AttendanceRecord> = store
        .records
        .iter()
        .filter(|r| r.student == student_id && matches(r, &filters))
        .collect();
    rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let history: Vec<serde_json::Value> = rows
        .iter()
        .map(|r| {
            let course = store.course_by_id(r.course_id);
            let lecturer = course
                .and_then(|c| store.user_by_id(c.lecturer))
                .map(|u| u.name.as_str())
                .unwrap_or("Unknown");
            json!({
                "id": r.id,
                "timestamp": r.timestamp.to_rfc3339(),
                "courseCode": course.map(|c| c.course_code.as_str()).unwrap_or("Unknown"),
                "courseName": course.map(|c| c.course_name.as_str()).unwrap_or("Unknown"),
                "lecturer": lecturer,
                "status": r.status.as_str(),
            })
        })
        .collect();

    Ok(json!({ "history": history }))
}

fn handle_history(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(store), Some(signer)) = (state.store.as_ref(), state.signer.as_ref()) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let claims = match claims_from_params(signer, &req.params) {
        Ok(c) => c,
        Err(error) => return error.response(&req.id),
    };
    match attendance_history(store, &claims, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.history" => Some(handle_history(state, req)),
        _ => None,
    }
}
