use std::collections::HashSet;

use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{band_json, claims_from_params, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::stats::{attendance_percent, mean, round_percent};
use crate::store::{AttendanceRecord, AttendanceStatus, Course, Role, Store};
use crate::token::Claims;

fn present_count(records: &[&AttendanceRecord]) -> usize {
    records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .count()
}

fn course_json_base(course: &Course) -> serde_json::Value {
    json!({
        "courseId": course.id,
        "courseCode": course.course_code,
        "courseName": course.course_name,
        "schedule": course.schedule,
        "credits": course.credits,
    })
}

fn student_dashboard(store: &Store, claims: &Claims) -> Result<serde_json::Value, HandlerErr> {
    let student_id = claims.user_id;
    let courses: Vec<&Course> = store
        .courses
        .iter()
        .filter(|c| c.students.contains(&student_id))
        .collect();
    let records: Vec<&AttendanceRecord> = store
        .records
        .iter()
        .filter(|r| r.student == student_id)
        .collect();

    let total = records.len();
    let present = present_count(&records);
    let overall = attendance_percent(present, total);

    let course_stats: Vec<serde_json::Value> = courses
        .iter()
        .map(|course| {
            let course_records: Vec<&AttendanceRecord> = records
                .iter()
                .copied()
                .filter(|r| r.course_id == course.id)
                .collect();
            let course_total = course_records.len();
            let course_present = present_count(&course_records);
            let pct = attendance_percent(course_present, course_total);
            let lecturer = store
                .user_by_id(course.lecturer)
                .map(|u| u.name.as_str())
                .unwrap_or("Unknown");

            let mut entry = course_json_base(course);
            entry["lecturer"] = json!(lecturer);
            entry["attendance"] = json!(round_percent(pct));
            entry["attended"] = json!(course_present);
            entry["total"] = json!(course_total);
            entry["status"] = band_json(pct);
            entry
        })
        .collect();

    let mut recent: Vec<&AttendanceRecord> = records.clone();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    let recent_attendance: Vec<serde_json::Value> = recent
        .iter()
        .take(5)
        .map(|r| {
            let course = store
                .course_by_id(r.course_id)
                .map(|c| c.course_code.as_str())
                .unwrap_or("Unknown");
            json!({
                "timestamp": r.timestamp.to_rfc3339(),
                "course": course,
                "status": r.status.as_str(),
            })
        })
        .collect();

    let department = store
        .user_by_id(student_id)
        .map(|u| u.department.clone())
        .unwrap_or_default();

    Ok(json!({
        "student": {
            "name": claims.name,
            "studentNo": claims.student_no,
            "department": department,
        },
        "statistics": {
            "overallAttendance": round_percent(overall),
            "classesAttended": present,
            "classesMissed": total - present,
            "totalClasses": total,
            "attendanceStatus": band_json(overall),
        },
        "courses": course_stats,
        "recentAttendance": recent_attendance,
    }))
}

fn lecturer_dashboard(store: &Store, claims: &Claims) -> Result<serde_json::Value, HandlerErr> {
    if claims.role != Role::Lecturer {
        return Err(HandlerErr::new("access_denied", "lecturer role required"));
    }

    let owned: Vec<&Course> = store
        .courses
        .iter()
        .filter(|c| c.lecturer == claims.user_id)
        .collect();

    let course_stats: Vec<serde_json::Value> = owned
        .iter()
        .map(|course| {
            let course_records: Vec<&AttendanceRecord> = store
                .records
                .iter()
                .filter(|r| r.course_id == course.id)
                .collect();
            // Classes held = distinct sessions this course has records for.
            let total_classes = course_records
                .iter()
                .map(|r| r.session)
                .collect::<HashSet<_>>()
                .len();

            let mut roster: Vec<(f64, serde_json::Value)> = course
                .students
                .iter()
                .map(|&sid| {
                    let present = course_records
                        .iter()
                        .filter(|r| r.student == sid && r.status == AttendanceStatus::Present)
                        .count();
                    let pct = attendance_percent(present, total_classes);
                    let (name, student_no) = store
                        .user_by_id(sid)
                        .map(|u| (u.name.clone(), u.student_no.clone()))
                        .unwrap_or(("Unknown".to_string(), None));
                    let entry = json!({
                        "studentNo": student_no,
                        "name": name,
                        "attendance": round_percent(pct),
                        "present": present,
                        "total": total_classes,
                        "status": band_json(pct),
                    });
                    (pct, entry)
                })
                .collect();
            // Lowest attendance first so at-risk students surface on top.
            roster.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let percents: Vec<f64> = roster.iter().map(|(p, _)| *p).collect();
            let course_avg = mean(&percents);

            let mut entry = course_json_base(course);
            entry["totalStudents"] = json!(course.students.len());
            entry["totalClasses"] = json!(total_classes);
            entry["overallAttendance"] = json!(round_percent(course_avg));
            entry["students"] = json!(roster.into_iter().map(|(_, e)| e).collect::<Vec<_>>());
            entry
        })
        .collect();

    let distinct_students: HashSet<i64> = owned
        .iter()
        .flat_map(|c| c.students.iter().copied())
        .collect();
    let department = store
        .user_by_id(claims.user_id)
        .map(|u| u.department.clone())
        .unwrap_or_default();

    Ok(json!({
        "lecturer": {
            "name": claims.name,
            "department": department,
        },
        "courses": course_stats,
        "totalCourses": owned.len(),
        "totalStudents": distinct_students.len(),
    }))
}

fn admin_dashboard(store: &Store, claims: &Claims) -> Result<serde_json::Value, HandlerErr> {
    if claims.role != Role::Admin {
        return Err(HandlerErr::new("access_denied", "admin role required"));
    }

    let total_students = store
        .users
        .iter()
        .filter(|u| u.role == Role::Student)
        .count();
    let total_lecturers = store
        .users
        .iter()
        .filter(|u| u.role == Role::Lecturer)
        .count();

    let total_records = store.records.len();
    let present_records = store
        .records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .count();
    let overall = attendance_percent(present_records, total_records);

    let mut recent: Vec<&AttendanceRecord> = store.records.iter().collect();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    let recent_activity: Vec<serde_json::Value> = recent
        .iter()
        .take(10)
        .map(|r| {
            let student = store
                .user_by_id(r.student)
                .map(|u| u.name.as_str())
                .unwrap_or("Unknown");
            let course = store
                .course_by_id(r.course_id)
                .map(|c| c.course_code.as_str())
                .unwrap_or("Unknown");
            json!({
                "student": student,
                "course": course,
                "status": r.status.as_str(),
                "timestamp": r.timestamp.to_rfc3339(),
            })
        })
        .collect();

    Ok(json!({
        "stats": {
            "totalStudents": total_students,
            "totalLecturers": total_lecturers,
            "totalCourses": store.courses.len(),
            "totalSessions": store.sessions.len(),
            "overallAttendance": round_percent(overall),
        },
        "recentActivity": recent_activity,
    }))
}

fn handle_dashboard(
    state: &mut AppState,
    req: &Request,
    view: fn(&Store, &Claims) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    let (Some(store), Some(signer)) = (state.store.as_ref(), state.signer.as_ref()) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let claims = match claims_from_params(signer, &req.params) {
        Ok(c) => c,
        Err(error) => return error.response(&req.id),
    };
    match view(store, &claims) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.student" => Some(handle_dashboard(state, req, student_dashboard)),
        "dashboard.lecturer" => Some(handle_dashboard(state, req, lecturer_dashboard)),
        "dashboard.admin" => Some(handle_dashboard(state, req, admin_dashboard)),
        _ => None,
    }
}
