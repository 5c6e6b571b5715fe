//! Maps the backend's inconsistent activity payloads onto the canonical
//! records in [`crate::models`]. Nothing past this module looks at raw JSON.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::models::{ActivityId, ActivityRecord, ClassGroup, RosterRow, Status};

const ID_KEYS: &[&str] = &["activityId", "id", "classGroupSubjectActivityId"];
const TITLE_KEYS: &[&str] = &["title", "activity.title", "activityName"];
const SUBJECT_KEYS: &[&str] = &[
    "subject",
    "subjectName",
    "subject.subjectName",
    "classGroupSubject.subject.subjectName",
];
const DESCRIPTION_KEYS: &[&str] = &["description", "activity.description"];
const DUE_KEYS: &[&str] = &["dueDate", "activity.dueDate", "deadline"];
const CLASS_KEYS: &[&str] = &[
    "class",
    "className",
    "classGroupName",
    "classGroup.className",
    "classGroupSubject.classGroup.className",
];
const STUDENT_KEYS: &[&str] = &[
    "studentName",
    "userName",
    "student.userName",
    "studentUserFirstName",
];

/// Look up the first of `keys` that is present and non-null. Dotted keys
/// walk nested objects (`"activity.title"`).
pub fn resolve_field(record: &Value, keys: &[&str], default: Value) -> Value {
    keys.iter()
        .filter_map(|key| lookup(record, key))
        .find(|v| !v.is_null())
        .cloned()
        .unwrap_or(default)
}

fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(record, |node, segment| node.as_object()?.get(segment))
}

/// String view of a resolved field. Numbers are rendered so integer ids and
/// GUID ids compare the same way.
pub fn resolve_text(record: &Value, keys: &[&str]) -> Option<String> {
    match resolve_field(record, keys, Value::Null) {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn resolve_number(record: &Value, keys: &[&str]) -> Option<f64> {
    match resolve_field(record, keys, Value::Null) {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn resolve_date(record: &Value, keys: &[&str]) -> Option<NaiveDate> {
    resolve_text(record, keys).and_then(|s| parse_date(&s))
}

/// Accepts plain dates, RFC 3339 timestamps and offset-less timestamps.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

fn resolve_status(record: &Value) -> Status {
    resolve_text(record, &["status"])
        .and_then(|s| Status::parse(&s))
        .unwrap_or(Status::Pending)
}

/// Pending work past its due date is shown as overdue. The backend's own
/// `Overdue` is kept as sent.
pub fn effective_status(status: Status, due: Option<NaiveDate>, today: NaiveDate) -> Status {
    match (status, due) {
        (Status::Pending, Some(due)) if due < today => Status::Overdue,
        _ => status,
    }
}

/// Normalize one activity payload. Returns `None` when no id can be found.
pub fn normalize_activity(raw: &Value, today: NaiveDate) -> Option<ActivityRecord> {
    let Some(id) = resolve_text(raw, ID_KEYS) else {
        tracing::warn!("dropping activity without an id");
        return None;
    };

    let due_date = resolve_date(raw, DUE_KEYS);
    let status = effective_status(resolve_status(raw), due_date, today);

    let record = ActivityRecord {
        id: ActivityId(id),
        title: resolve_text(raw, TITLE_KEYS).unwrap_or_else(|| "Untitled".into()),
        subject: resolve_text(raw, SUBJECT_KEYS).unwrap_or_else(|| "Unknown".into()),
        description: resolve_text(raw, DESCRIPTION_KEYS).unwrap_or_default(),
        due_date,
        status,
        points: resolve_number(raw, &["points", "weightagePercent"]),
        grade: resolve_number(raw, &["grade"]),
        feedback: resolve_text(raw, &["feedback"]),
        submission_date: resolve_date(raw, &["submissionDate", "submittedAt"]),
        instructions: resolve_text(raw, &["instructions"]),
        submission_type: resolve_text(raw, &["submissionType"]),
        class_name: resolve_text(raw, CLASS_KEYS),
        pdf_url: resolve_text(raw, &["pdfUrl", "studentPdfUrl"]),
        max_grade: resolve_number(raw, &["maxGrade"]),
    };

    if record.status == Status::Graded && record.grade.is_none() {
        tracing::warn!(id = %record.id, "graded activity arrived without a grade");
    }
    if record.status == Status::Submitted && record.submission_date.is_none() {
        tracing::warn!(id = %record.id, "submitted activity arrived without a submission date");
    }

    Some(record)
}

/// Normalize a list body. Non-array bodies are a malformed response.
pub fn normalize_activities(body: &Value, today: NaiveDate) -> Option<Vec<ActivityRecord>> {
    let items = body.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|raw| normalize_activity(raw, today))
            .collect(),
    )
}

pub fn normalize_roster_row(raw: &Value, today: NaiveDate) -> Option<RosterRow> {
    let activity_id = resolve_text(raw, ID_KEYS)?;
    let due_date = resolve_date(raw, DUE_KEYS);
    Some(RosterRow {
        row_id: resolve_text(raw, &["id", "classGroupSubjectStudentActivityId"]),
        activity_id: ActivityId(activity_id),
        title: resolve_text(raw, TITLE_KEYS).unwrap_or_else(|| "Untitled".into()),
        class_name: resolve_text(raw, CLASS_KEYS).unwrap_or_else(|| "Unknown".into()),
        subject: resolve_text(raw, SUBJECT_KEYS).unwrap_or_else(|| "Unknown".into()),
        description: resolve_text(raw, DESCRIPTION_KEYS).unwrap_or_default(),
        due_date,
        student_name: resolve_text(raw, STUDENT_KEYS).unwrap_or_else(|| "Unknown".into()),
        status: effective_status(resolve_status(raw), due_date, today),
    })
}

pub fn normalize_roster(body: &Value, today: NaiveDate) -> Option<Vec<RosterRow>> {
    let items = body.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|raw| normalize_roster_row(raw, today))
            .collect(),
    )
}

pub fn normalize_class_groups(body: &Value) -> Option<Vec<ClassGroup>> {
    let items = body.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|raw| {
                Some(ClassGroup {
                    id: resolve_text(raw, &["classGroupId", "classGroupSubjectId", "id"])?,
                    name: resolve_text(raw, CLASS_KEYS)
                        .unwrap_or_else(|| "Unnamed class".into()),
                    subject: resolve_text(raw, SUBJECT_KEYS),
                })
            })
            .collect(),
    )
}
