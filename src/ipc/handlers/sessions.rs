use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use rusqlite::Connection;
use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{claims_from_params, get_required_i64, get_required_str, internal, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::{AttendanceRecord, AttendanceSession, AttendanceStatus, Role, Store};
use crate::token::Claims;

const DEFAULT_DURATION_MINUTES: i64 = 15;
const CODE_SUFFIX_LEN: usize = 9;

fn session_code(now: DateTime<Utc>) -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("ATTEND-{}-{}", now.timestamp_millis(), suffix)
}

fn session_json(session: &AttendanceSession) -> serde_json::Value {
    json!({
        "id": session.id,
        "courseId": session.course_id,
        "lecturer": session.lecturer,
        "createdAt": session.created_at.to_rfc3339(),
        "code": session.code,
        "isActive": session.is_active,
        "durationMinutes": session.duration_minutes,
    })
}

fn create_session(
    conn: &Connection,
    store: &mut Store,
    claims: &Claims,
    params: &serde_json::Value,
    now: DateTime<Utc>,
) -> Result<serde_json::Value, HandlerErr> {
    if claims.role != Role::Lecturer {
        return Err(HandlerErr::new(
            "access_denied",
            "only lecturers can create sessions",
        ));
    }
    let course_id = get_required_i64(params, "courseId")?;
    let duration = match params.get("durationMinutes") {
        None => DEFAULT_DURATION_MINUTES,
        Some(v) => match v.as_i64() {
            Some(d) if d > 0 => d,
            _ => {
                return Err(HandlerErr::new(
                    "bad_params",
                    "durationMinutes must be a positive integer",
                ))
            }
        },
    };
    let Some(course) = store.course_by_id(course_id) else {
        return Err(HandlerErr::new("not_found", "course not found"));
    };
    let course_code = course.course_code.clone();

    let code = session_code(now);
    // The time-plus-random code space makes a repeat effectively impossible;
    // if one ever happens it is a bug worth failing loudly on.
    if store.sessions.iter().any(|s| s.code == code) {
        return Err(HandlerErr::new("internal", "session code collision"));
    }

    let id = store.next_session_id();
    let session = AttendanceSession {
        id,
        course_id,
        lecturer: claims.user_id,
        created_at: now,
        code: code.clone(),
        is_active: true,
        duration_minutes: duration,
    };
    store.sessions.push(session.clone());
    store.persist(conn).map_err(internal)?;

    Ok(json!({
        "session": session_json(&session),
        "courseCode": course_code,
        // Payload for the external QR renderer.
        "qrData": {
            "sessionId": id,
            "code": code,
            "courseId": course_id,
            "issuedAt": now.to_rfc3339(),
        },
    }))
}

fn mark_attendance(
    conn: &Connection,
    store: &mut Store,
    claims: &Claims,
    params: &serde_json::Value,
    now: DateTime<Utc>,
) -> Result<serde_json::Value, HandlerErr> {
    let code = get_required_str(params, "code")?;

    let Some(idx) = store
        .sessions
        .iter()
        .position(|s| s.code == code && s.is_active)
    else {
        return Err(HandlerErr::new("not_found", "invalid or expired code"));
    };
    let session = store.sessions[idx].clone();

    // Lazy expiry: the deactivation sticks even though this call fails.
    let elapsed = now - session.created_at;
    if elapsed > Duration::minutes(session.duration_minutes) {
        store.sessions[idx].is_active = false;
        store.persist(conn).map_err(internal)?;
        return Err(HandlerErr::new("expired", "attendance code has expired"));
    }

    let student_id = claims.user_id;
    if store
        .records
        .iter()
        .any(|r| r.session == session.id && r.student == student_id)
    {
        return Err(HandlerErr::new(
            "duplicate_submission",
            "attendance already marked for this session",
        ));
    }

    let id = store.next_record_id();
    let record = AttendanceRecord {
        id,
        session: session.id,
        student: student_id,
        course_id: session.course_id,
        timestamp: now,
        status: AttendanceStatus::Present,
    };
    store.records.push(record.clone());
    store.persist(conn).map_err(internal)?;

    let course = store.course_by_id(session.course_id);
    let lecturer = store.user_by_id(session.lecturer);
    Ok(json!({
        "record": {
            "id": record.id,
            "session": record.session,
            "student": record.student,
            "courseId": record.course_id,
            "timestamp": record.timestamp.to_rfc3339(),
            "status": record.status.as_str(),
        },
        "course": course.map(|c| json!({
            "id": c.id,
            "courseCode": c.course_code,
            "courseName": c.course_name,
        })),
        "lecturer": lecturer.map(|u| json!({
            "id": u.id,
            "name": u.name,
        })),
        "session": session_json(&store.sessions[idx]),
    }))
}

fn handle_mutation(
    state: &mut AppState,
    req: &Request,
    op: fn(
        &Connection,
        &mut Store,
        &Claims,
        &serde_json::Value,
        DateTime<Utc>,
    ) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    let (Some(conn), Some(store), Some(signer)) = (
        state.db.as_ref(),
        state.store.as_mut(),
        state.signer.as_ref(),
    ) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let claims = match claims_from_params(signer, &req.params) {
        Ok(c) => c,
        Err(error) => return error.response(&req.id),
    };
    match op(conn, store, &claims, &req.params, Utc::now()) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.create" => Some(handle_mutation(state, req, create_session)),
        "attendance.mark" => Some(handle_mutation(state, req, mark_attendance)),
        _ => None,
    }
}
