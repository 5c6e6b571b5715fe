use chrono::NaiveDate;
use ratatui::style::Color;

use crate::models::Status;

pub struct Badge {
    pub icon: &'static str,
    pub label: &'static str,
    pub color: Color,
}

pub fn badge(status: Status) -> Badge {
    match status {
        Status::Pending => Badge {
            icon: "◷",
            label: "Pending",
            color: Color::Yellow,
        },
        Status::Submitted => Badge {
            icon: "✓",
            label: "Submitted",
            color: Color::Blue,
        },
        Status::Graded => Badge {
            icon: "★",
            label: "Graded",
            color: Color::Green,
        },
        Status::Overdue => Badge {
            icon: "!",
            label: "Overdue",
            color: Color::Red,
        },
    }
}

/// "Oct 15, 2023", or "Invalid Date" when nothing parseable was sent.
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| "Invalid Date".into())
}

pub fn format_long_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| "No due date".into())
}

/// "due in 3 days", "due today", "2 days overdue".
pub fn due_hint(due: Option<NaiveDate>, today: NaiveDate) -> Option<String> {
    let days = (due? - today).num_days();
    Some(match days {
        0 => "due today".into(),
        1 => "due tomorrow".into(),
        d if d > 1 => format!("due in {d} days"),
        -1 => "1 day overdue".into(),
        d => format!("{} days overdue", -d),
    })
}

pub fn format_points(points: Option<f64>) -> String {
    points.map(|p| format!("{p} pts")).unwrap_or_default()
}

pub fn format_grade(grade: Option<f64>, out_of: Option<f64>) -> String {
    match (grade, out_of) {
        (Some(g), Some(max)) => format!("{g}/{max}"),
        (Some(g), None) => format!("{g}"),
        (None, _) => "-".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn badges_cover_every_status() {
        for status in Status::ALL {
            assert_eq!(badge(status).label, status.as_str());
        }
        assert_eq!(badge(Status::Overdue).color, Color::Red);
    }

    #[test]
    fn short_date_format() {
        assert_eq!(format_date(Some(d(2023, 10, 5))), "Oct 5, 2023");
        assert_eq!(format_date(None), "Invalid Date");
        assert_eq!(format_long_date(Some(d(2025, 3, 30))), "March 30, 2025");
    }

    #[test]
    fn due_hints() {
        let today = d(2025, 4, 9);
        assert_eq!(due_hint(Some(d(2025, 4, 9)), today).as_deref(), Some("due today"));
        assert_eq!(due_hint(Some(d(2025, 4, 10)), today).as_deref(), Some("due tomorrow"));
        assert_eq!(due_hint(Some(d(2025, 4, 12)), today).as_deref(), Some("due in 3 days"));
        assert_eq!(due_hint(Some(d(2025, 4, 8)), today).as_deref(), Some("1 day overdue"));
        assert_eq!(due_hint(Some(d(2025, 4, 1)), today).as_deref(), Some("8 days overdue"));
        assert_eq!(due_hint(None, today), None);
    }

    #[test]
    fn grades_and_points() {
        assert_eq!(format_grade(Some(92.0), Some(100.0)), "92/100");
        assert_eq!(format_grade(Some(8.5), None), "8.5");
        assert_eq!(format_grade(None, Some(20.0)), "-");
        assert_eq!(format_points(Some(20.0)), "20 pts");
        assert_eq!(format_points(None), "");
    }
}
