use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db;

/// Both id counters start here; seed history uses ids below this threshold.
const COUNTER_START: i64 = 100;

/// Fixed seed so a fresh workspace always generates the same demo history
/// (modulo the anchor date).
const SEED_RNG_SEED: u64 = 0x41545444; // "ATTD"

const SEED_BACKFILL_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Lecturer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Lecturer => "lecturer",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    // Plaintext by design in this demo; see DESIGN.md.
    pub password: String,
    pub role: Role,
    pub student_no: Option<String>,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub course_code: String,
    pub course_name: String,
    pub lecturer: i64,
    pub students: Vec<i64>,
    pub schedule: String,
    pub credits: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSession {
    pub id: i64,
    pub course_id: i64,
    pub lecturer: i64,
    pub created_at: DateTime<Utc>,
    pub code: String,
    pub is_active: bool,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub session: i64,
    pub student: i64,
    pub course_id: i64,
    pub timestamp: DateTime<Utc>,
    pub status: AttendanceStatus,
}

/// Sole owner of the four collections and both id counters. Every view the
/// handlers return is computed on demand from this state; mutations go
/// through the push/next methods and must be followed by `persist`.
#[derive(Debug, Clone, PartialEq)]
pub struct Store {
    pub users: Vec<User>,
    pub courses: Vec<Course>,
    pub records: Vec<AttendanceRecord>,
    pub sessions: Vec<AttendanceSession>,
    pub session_id_counter: i64,
    pub record_id_counter: i64,
}

impl Store {
    /// Reads each snapshot key, falling back to the seed generator for any
    /// missing one, then writes the result back so a fresh workspace
    /// round-trips on reload.
    pub fn load(conn: &Connection) -> anyhow::Result<Store> {
        let users = match db::snapshot_get_json(conn, db::KEY_USERS)? {
            Some(v) => serde_json::from_value(v)?,
            None => seed_users(),
        };
        let courses = match db::snapshot_get_json(conn, db::KEY_COURSES)? {
            Some(v) => serde_json::from_value(v)?,
            None => seed_courses(),
        };
        let records = match db::snapshot_get_json(conn, db::KEY_RECORDS)? {
            Some(v) => serde_json::from_value(v)?,
            None => seed_records(Utc::now()),
        };
        let sessions = match db::snapshot_get_json(conn, db::KEY_SESSIONS)? {
            Some(v) => serde_json::from_value(v)?,
            None => Vec::new(),
        };
        let session_id_counter = match db::snapshot_get_json(conn, db::KEY_SESSION_COUNTER)? {
            Some(v) => serde_json::from_value(v)?,
            None => COUNTER_START,
        };
        let record_id_counter = match db::snapshot_get_json(conn, db::KEY_RECORD_COUNTER)? {
            Some(v) => serde_json::from_value(v)?,
            None => COUNTER_START,
        };

        let store = Store {
            users,
            courses,
            records,
            sessions,
            session_id_counter,
            record_id_counter,
        };
        store.persist(conn)?;
        Ok(store)
    }

    /// Full-snapshot overwrite of all six keys. Callers invoke this
    /// synchronously after every mutation; there is no partial-write
    /// guarantee beyond that.
    pub fn persist(&self, conn: &Connection) -> anyhow::Result<()> {
        db::snapshot_set_json(conn, db::KEY_USERS, &serde_json::to_value(&self.users)?)?;
        db::snapshot_set_json(conn, db::KEY_COURSES, &serde_json::to_value(&self.courses)?)?;
        db::snapshot_set_json(conn, db::KEY_RECORDS, &serde_json::to_value(&self.records)?)?;
        db::snapshot_set_json(conn, db::KEY_SESSIONS, &serde_json::to_value(&self.sessions)?)?;
        db::snapshot_set_json(
            conn,
            db::KEY_SESSION_COUNTER,
            &serde_json::to_value(self.session_id_counter)?,
        )?;
        db::snapshot_set_json(
            conn,
            db::KEY_RECORD_COUNTER,
            &serde_json::to_value(self.record_id_counter)?,
        )?;
        Ok(())
    }

    pub fn next_session_id(&mut self) -> i64 {
        let id = self.session_id_counter;
        self.session_id_counter += 1;
        id
    }

    pub fn next_record_id(&mut self) -> i64 {
        let id = self.record_id_counter;
        self.record_id_counter += 1;
        id
    }

    pub fn user_by_id(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn course_by_id(&self, id: i64) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }
}

fn seed_users() -> Vec<User> {
    vec![
        User {
            id: 1,
            name: "Ama Owusu".to_string(),
            email: "student@university.edu".to_string(),
            password: "password".to_string(),
            role: Role::Student,
            student_no: Some("CS2024001".to_string()),
            department: "Computer Science".to_string(),
        },
        User {
            id: 2,
            name: "Dr. Kofi Asante".to_string(),
            email: "lecturer@university.edu".to_string(),
            password: "password".to_string(),
            role: Role::Lecturer,
            student_no: None,
            department: "Computer Science".to_string(),
        },
        User {
            id: 3,
            name: "Registry Admin".to_string(),
            email: "admin@university.edu".to_string(),
            password: "password".to_string(),
            role: Role::Admin,
            student_no: None,
            department: "Computer Science".to_string(),
        },
    ]
}

fn seed_courses() -> Vec<Course> {
    vec![
        Course {
            id: 1,
            course_code: "CS 301".to_string(),
            course_name: "Operating Systems".to_string(),
            lecturer: 2,
            students: vec![1],
            schedule: "Mon, Wed 8:00 AM".to_string(),
            credits: 3,
        },
        Course {
            id: 2,
            course_code: "CS 303".to_string(),
            course_name: "Database Systems".to_string(),
            lecturer: 2,
            students: vec![1],
            schedule: "Tue, Thu 10:00 AM".to_string(),
            credits: 3,
        },
        Course {
            id: 3,
            course_code: "CS 305".to_string(),
            course_name: "Software Engineering".to_string(),
            lecturer: 2,
            students: vec![1],
            schedule: "Fri 2:00 PM".to_string(),
            credits: 2,
        },
    ]
}

/// Backfills the demo student's attendance for the preceding 30 calendar
/// days, gated on each course's meeting weekdays, with a presence bias per
/// course. Seed record ids double as a synthetic session-id space below
/// `COUNTER_START`, distinct from any live session.
fn seed_records(today: DateTime<Utc>) -> Vec<AttendanceRecord> {
    // (course id, meeting days, start hour, probability of presence)
    let meetings: [(i64, &[Weekday], u32, f64); 3] = [
        (1, &[Weekday::Mon, Weekday::Wed], 8, 0.80),
        (2, &[Weekday::Tue, Weekday::Thu], 10, 0.85),
        (3, &[Weekday::Fri], 14, 0.90),
    ];

    let mut rng = StdRng::seed_from_u64(SEED_RNG_SEED);
    let mut records = Vec::new();
    for back in 0..SEED_BACKFILL_DAYS {
        let day = (today - Duration::days(back)).date_naive();
        for (course_id, days, hour, present_p) in meetings {
            if !days.contains(&day.weekday()) {
                continue;
            }
            let Some(naive) = day.and_hms_opt(hour, 0, 0) else {
                continue;
            };
            let id = records.len() as i64 + 1;
            let status = if rng.gen::<f64>() < present_p {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            };
            records.push(AttendanceRecord {
                id,
                session: id,
                student: 1,
                course_id,
                timestamp: Utc.from_utc_datetime(&naive),
                status,
            });
        }
    }
    records
}
