use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Activities ─────────────────────────────────────────────────────────────

/// Backend ids arrive as integers on some endpoints and GUID strings on
/// others; both are carried as text so equality is stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub String);

impl ActivityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActivityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for ActivityId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Pending,
    Submitted,
    Graded,
    Overdue,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::Submitted,
        Status::Graded,
        Status::Overdue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Submitted => "Submitted",
            Self::Graded => "Graded",
            Self::Overdue => "Overdue",
        }
    }

    /// Case-insensitive parse of the backend's status text.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one canonical activity shape every screen works with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: ActivityId,
    pub title: String,
    pub subject: String,
    pub description: String,
    /// Kept as received; `None` when the backend sent nothing parseable.
    pub due_date: Option<NaiveDate>,
    pub status: Status,
    pub points: Option<f64>,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
    pub submission_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    pub submission_type: Option<String>,
    pub class_name: Option<String>,
    pub pdf_url: Option<String>,
    pub max_grade: Option<f64>,
}

impl ActivityRecord {
    /// Grading closes the submission form for good.
    pub fn has_feedback(&self) -> bool {
        self.grade.is_some()
            || self
                .feedback
                .as_deref()
                .map_or(false, |f| !f.trim().is_empty())
    }
}

// ─── Class group roster ─────────────────────────────────────────────────────

/// One student's row in a class-group activity listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterRow {
    pub row_id: Option<String>,
    pub activity_id: ActivityId,
    pub title: String,
    pub class_name: String,
    pub subject: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub student_name: String,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub row_id: Option<String>,
    pub student_name: String,
    pub status: Status,
}

/// Rows sharing an activity id folded into one card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityGroup {
    pub activity_id: ActivityId,
    pub title: String,
    pub class_name: String,
    pub subject: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub students: Vec<RosterEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassGroup {
    pub id: String,
    pub name: String,
    pub subject: Option<String>,
}

// ─── Auth ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    /// Anything the backend sends that is not a teacher role is treated as a
    /// student.
    pub fn from_role_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some(n) if n.eq_ignore_ascii_case("teacher") => Self::Teacher,
            _ => Self::Student,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Teacher => "Teacher",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    pub message: Option<String>,
    #[serde(alias = "roleName", alias = "role")]
    pub rolename: Option<String>,
}

// ─── Requests ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityRequest {
    pub title: String,
    pub description: String,
    pub activity_name: String,
    pub due_date: String,
    pub class_level: String,
    pub teacher_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_group_id: Option<String>,
    pub weightage_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_file_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSubmission {
    pub activity_id: ActivityId,
    pub student_id: String,
    pub file_base64: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSubmission {
    pub activity_id: ActivityId,
    pub feedback: String,
    pub grade: Option<f64>,
}

/// A file read from disk and encoded for a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFile {
    pub file_name: String,
    pub base64: String,
    pub size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_ignores_case_and_whitespace() {
        assert_eq!(Status::parse(" graded "), Some(Status::Graded));
        assert_eq!(Status::parse("OVERDUE"), Some(Status::Overdue));
        assert_eq!(Status::parse("Draft"), None);
    }

    #[test]
    fn role_defaults_to_student() {
        assert_eq!(Role::from_role_name(Some("Teacher")), Role::Teacher);
        assert_eq!(Role::from_role_name(Some(" teacher ")), Role::Teacher);
        assert_eq!(Role::from_role_name(Some("Admin")), Role::Student);
        assert_eq!(Role::from_role_name(None), Role::Student);
    }

    #[test]
    fn submission_bodies_use_camel_case_keys() {
        let body = StudentSubmission {
            activity_id: ActivityId::from("act-1"),
            student_id: "stu-9".into(),
            file_base64: "JVBERi0=".into(),
            file_name: "essay.pdf".into(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["activityId"], "act-1");
        assert_eq!(json["studentId"], "stu-9");
        assert_eq!(json["fileBase64"], "JVBERi0=");
        assert_eq!(json["fileName"], "essay.pdf");
    }

    #[test]
    fn create_request_omits_missing_attachment() {
        let body = CreateActivityRequest {
            title: "Fractions".into(),
            description: "Practice with fractions".into(),
            activity_name: "Worksheet".into(),
            due_date: "2025-04-10".into(),
            class_level: "Five".into(),
            teacher_id: "t-1".into(),
            subject_id: None,
            class_group_id: None,
            weightage_percent: 10.0,
            pdf_file_base64: None,
            file_name: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("pdfFileBase64").is_none());
        assert_eq!(json["weightagePercent"], 10.0);
        assert_eq!(json["classLevel"], "Five");
    }

    #[test]
    fn has_feedback_ignores_blank_feedback() {
        let mut record = crate::demo::activities().remove(0);
        record.feedback = Some("   ".into());
        record.grade = None;
        assert!(!record.has_feedback());
        record.grade = Some(80.0);
        assert!(record.has_feedback());
    }
}
