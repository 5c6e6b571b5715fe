//! Demonstration data shown when the backend cannot be reached.

use chrono::NaiveDate;

use crate::api::normalize::effective_status;
use crate::models::{ActivityId, ActivityRecord, RosterRow, Status};

fn date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

struct Seed {
    id: u64,
    title: &'static str,
    subject: &'static str,
    description: &'static str,
    due: &'static str,
    status: Status,
    points: f64,
    instructions: &'static str,
    submission_type: &'static str,
}

impl Seed {
    fn into_record(self) -> ActivityRecord {
        ActivityRecord {
            id: ActivityId::from(self.id),
            title: self.title.into(),
            subject: self.subject.into(),
            description: self.description.into(),
            due_date: date(self.due),
            status: self.status,
            points: Some(self.points),
            grade: None,
            feedback: None,
            submission_date: None,
            instructions: Some(self.instructions.into()),
            submission_type: Some(self.submission_type.into()),
            class_name: None,
            pdf_url: None,
            max_grade: None,
        }
    }
}

pub fn activities() -> Vec<ActivityRecord> {
    let mut records: Vec<ActivityRecord> = [
        Seed {
            id: 1,
            title: "Math Worksheet: Fractions",
            subject: "Mathematics",
            description: "Practice adding, subtracting, multiplying, and dividing fractions.",
            due: "2023-10-15",
            status: Status::Pending,
            points: 20.0,
            instructions: "Complete all problems on the worksheet. Show your work for each problem.",
            submission_type: "File Upload",
        },
        Seed {
            id: 2,
            title: "Reading Comprehension: The Solar System",
            subject: "Science",
            description: "Read the article about the solar system and answer the questions.",
            due: "2023-10-18",
            status: Status::Submitted,
            points: 15.0,
            instructions: "Read the article carefully and answer all questions in complete sentences.",
            submission_type: "Text Entry",
        },
        Seed {
            id: 3,
            title: "Grammar Exercise: Verbs and Adverbs",
            subject: "English",
            description: "Practice identifying and using verbs and adverbs correctly.",
            due: "2023-10-20",
            status: Status::Pending,
            points: 15.0,
            instructions: "Complete all exercises in the worksheet.",
            submission_type: "Online Form",
        },
        Seed {
            id: 4,
            title: "History Report: Ancient Egypt",
            subject: "History",
            description: "Write a report about one aspect of Ancient Egyptian civilization.",
            due: "2023-10-25",
            status: Status::Pending,
            points: 30.0,
            instructions: "Choose one aspect of Ancient Egyptian civilization and write a 500-word report.",
            submission_type: "Essay",
        },
        Seed {
            id: 5,
            title: "Art Project: Self-Portrait",
            subject: "Art",
            description: "Create a self-portrait using the techniques learned in class.",
            due: "2023-10-12",
            status: Status::Overdue,
            points: 25.0,
            instructions: "Submit a photo of your finished artwork.",
            submission_type: "Image Upload",
        },
        Seed {
            id: 6,
            title: "Science Experiment: Plant Growth",
            subject: "Science",
            description: "Conduct an experiment on plant growth under different conditions.",
            due: "2023-11-05",
            status: Status::Pending,
            points: 40.0,
            instructions: "Record your observations daily and submit a final report.",
            submission_type: "Lab Report",
        },
        Seed {
            id: 7,
            title: "Poetry Analysis: Robert Frost",
            subject: "English",
            description: "Analyze a poem by Robert Frost and discuss its themes and literary devices.",
            due: "2023-10-08",
            status: Status::Graded,
            points: 20.0,
            instructions: "Write a 300-word analysis discussing themes and literary devices.",
            submission_type: "Essay",
        },
        Seed {
            id: 8,
            title: "Geometry Quiz: Triangles",
            subject: "Mathematics",
            description: "Test your knowledge of triangles and their properties.",
            due: "2023-10-05",
            status: Status::Graded,
            points: 15.0,
            instructions: "Complete the online quiz on triangles within 30 minutes.",
            submission_type: "Online Quiz",
        },
    ]
    .into_iter()
    .map(Seed::into_record)
    .collect();

    records[1].submission_date = date("2023-10-15");
    records[6].submission_date = date("2023-10-07");
    records[6].grade = Some(92.0);
    records[6].feedback = Some(
        "Excellent analysis of the poem's themes. Good use of textual evidence.".into(),
    );
    records[7].submission_date = date("2023-10-05");
    records[7].grade = Some(85.0);
    records[7].feedback =
        Some("Good understanding of triangle properties, but work on the proofs section.".into());

    records
}

pub fn roster_rows() -> Vec<RosterRow> {
    [
        ("1", "act-101", "Emily Johnson", Status::Submitted, "Mathematics", "Grade 10-A", "Quadratic Equations", "Complete problems 1-20 on quadratic equations and their applications.", "2025-04-10"),
        ("2", "act-102", "Michael Smith", Status::Pending, "Science", "Grade 10-A", "Chemical Reactions", "Write a lab report on the chemical reactions observed during the experiment.", "2025-04-15"),
        ("3", "act-103", "Sophia Martinez", Status::Graded, "English", "Grade 10-B", "Literary Analysis", "Write a 3-page analysis of the themes in 'To Kill a Mockingbird'.", "2025-04-08"),
        ("4", "act-104", "Daniel Taylor", Status::Overdue, "History", "Grade 11-A", "World War II Impact", "Research and present the social and economic impacts of World War II.", "2025-04-01"),
        ("5", "act-105", "Olivia Wilson", Status::Submitted, "Computer Science", "Grade 11-B", "Web Development Basics", "Create a simple website using HTML, CSS, and JavaScript.", "2025-04-12"),
        ("6", "act-106", "William Brown", Status::Pending, "Physics", "Grade 12-A", "Newtonian Mechanics", "Solve the given problems related to forces, motion, and energy conservation.", "2025-04-18"),
        ("7", "act-107", "Ava Miller", Status::Graded, "Art", "Grade 10-B", "Mixed Media Project", "Create a mixed media artwork that reflects a personal narrative.", "2025-04-05"),
        ("8", "act-108", "James Davis", Status::Submitted, "Mathematics", "Grade 12-B", "Statistical Analysis", "Perform statistical analysis on a real-world phenomenon of your choice.", "2025-04-20"),
    ]
    .into_iter()
    .map(
        |(row_id, activity_id, student, status, subject, class, title, description, due)| RosterRow {
            row_id: Some(row_id.into()),
            activity_id: ActivityId::from(activity_id),
            title: title.into(),
            class_name: class.into(),
            subject: subject.into(),
            description: description.into(),
            due_date: date(due),
            student_name: student.into(),
            status,
        },
    )
    .collect()
}

/// The demo activities as the client would show them on `today`, with
/// past-due pending work marked overdue.
pub fn activities_as_of(today: NaiveDate) -> Vec<ActivityRecord> {
    activities()
        .into_iter()
        .map(|mut r| {
            r.status = effective_status(r.status, r.due_date, today);
            r
        })
        .collect()
}

pub fn roster_rows_as_of(today: NaiveDate) -> Vec<RosterRow> {
    roster_rows()
        .into_iter()
        .map(|mut r| {
            r.status = effective_status(r.status, r.due_date, today);
            r
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn demo_activities_have_unique_ids() {
        let records = activities();
        let ids: HashSet<_> = records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), records.len());
    }

    #[test]
    fn demo_activities_respect_grade_invariants() {
        for r in activities() {
            if r.status == Status::Graded {
                assert!(r.grade.is_some(), "{} graded without grade", r.title);
            }
            if r.status == Status::Submitted || r.status == Status::Graded {
                assert!(r.submission_date.is_some(), "{} missing submission date", r.title);
            }
        }
    }

    #[test]
    fn past_due_pending_demo_work_is_overdue() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let records = activities_as_of(today);
        assert!(records.iter().all(|r| r.status != Status::Pending));
        let first = records.iter().find(|r| r.id == ActivityId::from(1)).unwrap();
        assert_eq!(first.status, Status::Overdue);

        let rows = roster_rows_as_of(today);
        assert!(rows.iter().all(|r| r.status != Status::Pending));
        assert_eq!(
            rows.iter().filter(|r| r.status == Status::Overdue).count(),
            3
        );
    }

    #[test]
    fn demo_work_due_later_stays_pending() {
        let before_everything = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let pending = |records: Vec<ActivityRecord>| {
            records.iter().filter(|r| r.status == Status::Pending).count()
        };
        assert_eq!(
            pending(activities_as_of(before_everything)),
            pending(activities())
        );
    }

    #[test]
    fn demo_roster_dates_parse() {
        assert!(roster_rows().iter().all(|r| r.due_date.is_some()));
    }
}
