//! Form state and validation. Nothing here touches the network; a form that
//! fails validation never produces a request body.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;

use crate::models::*;

pub const CLASS_LEVELS: [&str; 12] = [
    "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Eleven",
    "Twelve",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn check_len(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    label: &str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.trim().chars().count();
    if len < min {
        errors.push(FieldError::new(
            field,
            format!("{label} must be at least {min} characters long"),
        ));
    } else if len > max {
        errors.push(FieldError::new(
            field,
            format!("{label} must be less than {max} characters"),
        ));
    }
}

// ─── Attachments ────────────────────────────────────────────────────────────

/// Read a PDF and base64-encode it for a JSON body.
pub fn encode_pdf(path: &Path, field: &'static str) -> Result<EncodedFile, FieldError> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(FieldError::new(field, "Only PDF files can be attached"));
    }

    let data = std::fs::read(path).map_err(|e| {
        FieldError::new(field, format!("Cannot read '{}': {e}", path.display()))
    })?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.pdf")
        .to_string();

    Ok(EncodedFile {
        file_name,
        base64: STANDARD.encode(&data),
        size: data.len(),
    })
}

// ─── Login ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub user_name: String,
    pub password: String,
    pub show_password: bool,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.user_name.trim().is_empty() {
            errors.push(FieldError::new("username", "Username is required"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(LoginRequest {
            user_name: self.user_name.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

// ─── Create activity ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateField {
    Title,
    ActivityName,
    Description,
    DueDate,
    ClassLevel,
    Weightage,
    TeacherId,
    SubjectId,
    ClassGroupId,
    Attachment,
}

impl CreateField {
    pub const ALL: [CreateField; 10] = [
        CreateField::Title,
        CreateField::ActivityName,
        CreateField::Description,
        CreateField::DueDate,
        CreateField::ClassLevel,
        CreateField::Weightage,
        CreateField::TeacherId,
        CreateField::SubjectId,
        CreateField::ClassGroupId,
        CreateField::Attachment,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::ActivityName => "activityName",
            Self::Description => "description",
            Self::DueDate => "dueDate",
            Self::ClassLevel => "classLevel",
            Self::Weightage => "weightagePercent",
            Self::TeacherId => "teacherId",
            Self::SubjectId => "subjectId",
            Self::ClassGroupId => "classGroupId",
            Self::Attachment => "pdfFile",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::ActivityName => "Activity name",
            Self::Description => "Description",
            Self::DueDate => "Due date (YYYY-MM-DD)",
            Self::ClassLevel => "Class level",
            Self::Weightage => "Weightage %",
            Self::TeacherId => "Teacher ID",
            Self::SubjectId => "Subject ID (optional)",
            Self::ClassGroupId => "Class group ID (optional)",
            Self::Attachment => "PDF attachment (optional)",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateActivityForm {
    pub title: String,
    pub activity_name: String,
    pub description: String,
    pub due_date: String,
    /// Index into [`CLASS_LEVELS`]; `None` until one is picked.
    pub class_level: Option<usize>,
    pub weightage: String,
    pub teacher_id: String,
    pub subject_id: String,
    pub class_group_id: String,
    pub attachment: String,
}

impl CreateActivityForm {
    pub fn new(teacher_id: Option<&str>) -> Self {
        Self {
            teacher_id: teacher_id.unwrap_or_default().to_string(),
            weightage: "0".into(),
            ..Self::default()
        }
    }

    /// Text buffer behind an editable field. The class level is picked, not
    /// typed, so it has none.
    pub fn text_mut(&mut self, field: CreateField) -> Option<&mut String> {
        Some(match field {
            CreateField::Title => &mut self.title,
            CreateField::ActivityName => &mut self.activity_name,
            CreateField::Description => &mut self.description,
            CreateField::DueDate => &mut self.due_date,
            CreateField::ClassLevel => return None,
            CreateField::Weightage => &mut self.weightage,
            CreateField::TeacherId => &mut self.teacher_id,
            CreateField::SubjectId => &mut self.subject_id,
            CreateField::ClassGroupId => &mut self.class_group_id,
            CreateField::Attachment => &mut self.attachment,
        })
    }

    pub fn display(&self, field: CreateField) -> String {
        match field {
            CreateField::Title => self.title.clone(),
            CreateField::ActivityName => self.activity_name.clone(),
            CreateField::Description => self.description.clone(),
            CreateField::DueDate => self.due_date.clone(),
            CreateField::ClassLevel => self
                .class_level
                .and_then(|i| CLASS_LEVELS.get(i))
                .map(|s| s.to_string())
                .unwrap_or_else(|| "Select a class level".into()),
            CreateField::Weightage => self.weightage.clone(),
            CreateField::TeacherId => self.teacher_id.clone(),
            CreateField::SubjectId => self.subject_id.clone(),
            CreateField::ClassGroupId => self.class_group_id.clone(),
            CreateField::Attachment => self.attachment.clone(),
        }
    }

    pub fn cycle_class_level(&mut self, forward: bool) {
        let n = CLASS_LEVELS.len();
        self.class_level = Some(match (self.class_level, forward) {
            (None, true) => 0,
            (None, false) => n - 1,
            (Some(i), true) => (i + 1) % n,
            (Some(i), false) => (i + n - 1) % n,
        });
    }

    /// Validate every field and build the request body. The optional PDF is
    /// read and encoded here.
    pub fn validate(&self) -> Result<CreateActivityRequest, Vec<FieldError>> {
        let mut errors = Vec::new();

        check_len(&mut errors, CreateField::Title.key(), "Title", &self.title, 2, 100);
        check_len(
            &mut errors,
            CreateField::Description.key(),
            "Description",
            &self.description,
            10,
            1000,
        );
        check_len(
            &mut errors,
            CreateField::ActivityName.key(),
            "Activity name",
            &self.activity_name,
            2,
            50,
        );

        let due = self.due_date.trim();
        let due_date = if due.is_empty() {
            errors.push(FieldError::new(CreateField::DueDate.key(), "Due date is required"));
            None
        } else {
            match NaiveDate::parse_from_str(due, "%Y-%m-%d") {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.push(FieldError::new(
                        CreateField::DueDate.key(),
                        "Due date must look like 2025-04-30",
                    ));
                    None
                }
            }
        };

        let class_level = self.class_level.and_then(|i| CLASS_LEVELS.get(i));
        if class_level.is_none() {
            errors.push(FieldError::new(
                CreateField::ClassLevel.key(),
                "Please select a class level",
            ));
        }

        let weightage = match self.weightage.trim().parse::<f64>() {
            Ok(w) if (0.0..=100.0).contains(&w) => w,
            _ => {
                errors.push(FieldError::new(
                    CreateField::Weightage.key(),
                    "Weightage must be a number between 0 and 100",
                ));
                0.0
            }
        };

        if self.teacher_id.trim().is_empty() {
            errors.push(FieldError::new(
                CreateField::TeacherId.key(),
                "Teacher ID is required",
            ));
        }

        let attachment = match self.attachment.trim() {
            "" => None,
            path => match encode_pdf(Path::new(path), CreateField::Attachment.key()) {
                Ok(file) => Some(file),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let optional = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };

        Ok(CreateActivityRequest {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            activity_name: self.activity_name.trim().to_string(),
            due_date: due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            class_level: class_level.map(|s| s.to_string()).unwrap_or_default(),
            teacher_id: self.teacher_id.trim().to_string(),
            subject_id: optional(&self.subject_id),
            class_group_id: optional(&self.class_group_id),
            weightage_percent: weightage,
            pdf_file_base64: attachment.as_ref().map(|f| f.base64.clone()),
            file_name: attachment.map(|f| f.file_name),
        })
    }
}

// ─── Student submission ─────────────────────────────────────────────────────

/// The file picked for a submission. Submitting is possible only once a
/// file is chosen and only while the activity has no feedback.
#[derive(Debug, Clone, Default)]
pub struct SubmissionDraft {
    pub path_input: String,
    pub file: Option<EncodedFile>,
}

impl SubmissionDraft {
    pub fn choose(&mut self) -> Result<(), FieldError> {
        let path = self.path_input.trim();
        if path.is_empty() {
            return Err(FieldError::new("file", "Choose a PDF to upload"));
        }
        self.file = Some(encode_pdf(Path::new(path), "file")?);
        Ok(())
    }

    pub fn can_submit(&self, activity: &ActivityRecord) -> bool {
        self.file.is_some() && !activity.has_feedback()
    }

    pub fn build(&self, activity: &ActivityRecord, student_id: &str) -> Option<StudentSubmission> {
        if !self.can_submit(activity) {
            return None;
        }
        let file = self.file.as_ref()?;
        Some(StudentSubmission {
            activity_id: activity.id.clone(),
            student_id: student_id.to_string(),
            file_base64: file.base64.clone(),
            file_name: file.file_name.clone(),
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// ─── Teacher grading ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GradeForm {
    pub feedback: String,
    pub grade: String,
    pub max_grade: f64,
}

impl GradeForm {
    pub fn for_activity(activity: &ActivityRecord) -> Self {
        Self {
            feedback: activity.feedback.clone().unwrap_or_default(),
            grade: activity.grade.map(|g| g.to_string()).unwrap_or_default(),
            max_grade: activity.max_grade.unwrap_or(100.0),
        }
    }

    /// Only digits and a single decimal point are accepted while typing.
    pub fn push_grade_char(&mut self, c: char) {
        let accepted = c.is_ascii_digit() || (c == '.' && !self.grade.contains('.'));
        if accepted {
            self.grade.push(c);
        }
    }

    pub fn validate(&self, activity_id: &ActivityId) -> Result<TeacherSubmission, FieldError> {
        let feedback = self.feedback.trim();
        let grade_text = self.grade.trim();

        if feedback.is_empty() && grade_text.is_empty() {
            return Err(FieldError::new(
                "feedback",
                "Please provide feedback or grade before submitting",
            ));
        }

        let grade = if grade_text.is_empty() {
            None
        } else {
            let g: f64 = grade_text
                .parse()
                .map_err(|_| FieldError::new("grade", "Grade must be a number"))?;
            if !(0.0..=self.max_grade).contains(&g) {
                return Err(FieldError::new(
                    "grade",
                    format!("Grade must be between 0 and {}", self.max_grade),
                ));
            }
            Some(g)
        };

        Ok(TeacherSubmission {
            activity_id: activity_id.clone(),
            feedback: feedback.to_string(),
            grade,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn valid_form() -> CreateActivityForm {
        CreateActivityForm {
            title: "Fractions".into(),
            activity_name: "Worksheet".into(),
            description: "Practice adding fractions.".into(),
            due_date: "2025-04-30".into(),
            class_level: Some(4),
            weightage: "15".into(),
            teacher_id: "3B0E6135".into(),
            subject_id: " ".into(),
            class_group_id: "cg-1".into(),
            attachment: String::new(),
        }
    }

    fn fields(errors: &[FieldError]) -> Vec<&'static str> {
        errors.iter().map(|e| e.field).collect()
    }

    #[test]
    fn valid_form_builds_request() {
        let req = valid_form().validate().unwrap();
        assert_eq!(req.class_level, "Five");
        assert_eq!(req.due_date, "2025-04-30");
        assert_eq!(req.weightage_percent, 15.0);
        assert_eq!(req.subject_id, None);
        assert_eq!(req.class_group_id.as_deref(), Some("cg-1"));
        assert_eq!(req.pdf_file_base64, None);
    }

    #[test]
    fn length_bounds_are_enforced() {
        let mut form = valid_form();
        form.title = "A".into();
        form.description = "too short".into();
        form.activity_name = "x".repeat(51);
        let errors = form.validate().unwrap_err();
        assert_eq!(fields(&errors), vec!["title", "description", "activityName"]);
        assert_eq!(errors[0].message, "Title must be at least 2 characters long");
        assert_eq!(errors[2].message, "Activity name must be less than 50 characters");
    }

    #[test]
    fn required_fields() {
        let form = CreateActivityForm::new(None);
        let errors = form.validate().unwrap_err();
        let f = fields(&errors);
        assert!(f.contains(&"dueDate"));
        assert!(f.contains(&"classLevel"));
        assert!(f.contains(&"teacherId"));
        assert!(!f.contains(&"weightagePercent"));
    }

    #[test]
    fn bad_date_and_weightage() {
        let mut form = valid_form();
        form.due_date = "30/04/2025".into();
        form.weightage = "120".into();
        let errors = form.validate().unwrap_err();
        assert_eq!(fields(&errors), vec!["dueDate", "weightagePercent"]);
    }

    #[test]
    fn attachment_is_base64_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brief.PDF");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.4")
            .unwrap();

        let mut form = valid_form();
        form.attachment = path.display().to_string();
        let req = form.validate().unwrap();
        assert_eq!(req.pdf_file_base64.as_deref(), Some("JVBERi0xLjQ="));
        assert_eq!(req.file_name.as_deref(), Some("brief.PDF"));
    }

    #[test]
    fn non_pdf_attachment_is_rejected() {
        let mut form = valid_form();
        form.attachment = "/tmp/notes.docx".into();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors[0].message, "Only PDF files can be attached");
    }

    #[test]
    fn class_level_cycles_both_ways() {
        let mut form = CreateActivityForm::new(Some("t"));
        form.cycle_class_level(false);
        assert_eq!(form.display(CreateField::ClassLevel), "Twelve");
        form.cycle_class_level(true);
        assert_eq!(form.display(CreateField::ClassLevel), "One");
    }

    #[test]
    fn submission_requires_file_and_no_feedback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.pdf");
        std::fs::write(&path, b"%PDF").unwrap();

        let activities = demo::activities();
        let pending = &activities[0];
        let graded = &activities[6];

        let mut draft = SubmissionDraft::default();
        assert!(!draft.can_submit(pending));
        assert!(draft.choose().is_err());

        draft.path_input = path.display().to_string();
        draft.choose().unwrap();
        assert!(draft.can_submit(pending));
        assert!(!draft.can_submit(graded));

        let body = draft.build(pending, "stu-1").unwrap();
        assert_eq!(body.file_name, "answers.pdf");
        assert_eq!(body.file_base64, "JVBERg==");
        assert!(draft.build(graded, "stu-1").is_none());

        draft.clear();
        assert!(draft.file.is_none());
    }

    #[test]
    fn grade_form_rules() {
        let id = ActivityId::from("a1");
        let mut form = GradeForm {
            feedback: "  ".into(),
            grade: String::new(),
            max_grade: 20.0,
        };
        assert!(form.validate(&id).is_err());

        for c in "1x2.5.3".chars() {
            form.push_grade_char(c);
        }
        assert_eq!(form.grade, "12.53");

        let body = form.validate(&id).unwrap();
        assert_eq!(body.grade, Some(12.53));
        assert_eq!(body.feedback, "");

        form.grade = "25".into();
        assert_eq!(
            form.validate(&id).unwrap_err().message,
            "Grade must be between 0 and 20"
        );

        form.grade.clear();
        form.feedback = "Nice work".into();
        assert_eq!(form.validate(&id).unwrap().grade, None);
    }

    #[test]
    fn login_requires_both_fields() {
        let form = LoginForm::default();
        assert_eq!(form.validate().unwrap_err().len(), 2);

        let form = LoginForm {
            user_name: " emily ".into(),
            password: "pw".into(),
            show_password: false,
        };
        assert_eq!(form.validate().unwrap().user_name, "emily");
    }
}
