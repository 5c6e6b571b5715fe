use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::{App, Editing, LoginField, Phase, Screen};
use crate::forms::CreateField;
use crate::listing::ListView;
use crate::models::{ActivityRecord, Role, Status};
use crate::source::NoticeLevel;
use crate::status::{badge, due_hint, format_date, format_grade, format_long_date, format_points};

const ACCENT: Color = Color::Cyan;
const HEADER_BG: Color = Color::DarkGray;
const SELECTED_BG: Color = Color::Rgb(40, 40, 60);
const DIM: Color = Color::DarkGray;
const GOOD: Color = Color::Green;
const WARN: Color = Color::Yellow;
const BAD: Color = Color::Red;

const SPINNER: [&str; 4] = ["⠋", "⠙", "⠹", "⠸"];
const SKELETON_ROWS: usize = 3;

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Cut `text` to `width` terminal columns, marking the cut with an ellipsis.
fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn titled(title: impl Into<String>) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(title.into())
        .title_style(Style::default().fg(ACCENT))
}

fn badge_span(status: Status) -> Span<'static> {
    let b = badge(status);
    Span::styled(format!("{} {}", b.icon, b.label), Style::default().fg(b.color))
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

fn input_line(label: &str, value: &str, focused: bool, width: usize) -> Line<'static> {
    let cursor = if focused { "▏" } else { "" };
    let style = if focused {
        Style::default().fg(Color::White).bg(SELECTED_BG)
    } else {
        Style::default().fg(Color::White)
    };
    Line::from(vec![
        Span::styled(
            format!("  {label:<26}"),
            Style::default().fg(if focused { ACCENT } else { DIM }),
        ),
        Span::styled(format!("{}{cursor}", fit(value, width)), style),
    ])
}

fn error_line(message: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {:<26}{message}", ""),
        Style::default().fg(BAD),
    ))
}

// ─── Main render ────────────────────────────────────────────────────────────

pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    if app.screen == Screen::Login {
        render_banner(f, chunks[0]);
        render_login(f, app, chunks[1]);
        render_status_bar(f, app, chunks[2]);
        return;
    }

    render_tabs(f, app, chunks[0]);
    render_user(f, app, chunks[0]);

    match app.screen {
        Screen::Dashboard if app.is_teacher() => render_teacher_dashboard(f, app, chunks[1]),
        Screen::Dashboard => render_student_dashboard(f, app, chunks[1]),
        Screen::Activities => render_activities(f, app, chunks[1]),
        Screen::Groups => render_groups(f, app, chunks[1]),
        Screen::Create => render_create(f, app, chunks[1]),
        Screen::Detail => render_detail(f, app, chunks[1]),
        Screen::NotFound => render_not_found(f, chunks[1]),
        Screen::Login => {}
    }

    render_status_bar(f, app, chunks[2]);

    if let Some((_, title)) = &app.confirm_delete {
        let full = f.area();
        render_confirm_delete(f, title, full);
    }
}

// ─── Tab Bar ────────────────────────────────────────────────────────────────

fn render_banner(f: &mut Frame, area: Rect) {
    let banner = Paragraph::new("").block(
        Block::default()
            .borders(Borders::BOTTOM)
            .title(" Kind Hearts ")
            .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
    );
    f.render_widget(banner, area);
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tabs = Screen::tabs(app.role());
    let titles: Vec<Line> = tabs
        .iter()
        .map(|tab| Line::from(Span::styled(format!(" {} ", tab.title()), Style::default().fg(Color::White))))
        .collect();

    // Detail pages keep the tab they were opened from highlighted.
    let current = match app.screen {
        Screen::Detail | Screen::NotFound => app.detail_return,
        s => s,
    };
    let selected = tabs.iter().position(|t| *t == current).unwrap_or(0);

    let widget = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .title(" Kind Hearts ")
                .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        )
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(ACCENT)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        );

    f.render_widget(widget, area);
}

fn render_user(f: &mut Frame, app: &App, tab_area: Rect) {
    let Some(session) = &app.session else {
        return;
    };
    let text = format!(" {} · {} ", session.user_name, session.role.label());
    let width = (text.width() as u16).min(tab_area.width);
    let area = Rect {
        x: tab_area.right().saturating_sub(width),
        y: tab_area.y,
        width,
        height: 1,
    };
    f.render_widget(Paragraph::new(text).style(Style::default().fg(ACCENT)), area);
}

// ─── Status Bar ─────────────────────────────────────────────────────────────

fn hints(app: &App) -> &'static str {
    if app.editing.is_some() {
        return "  type to edit  Enter:done  Esc:done";
    }
    match (app.screen, app.role()) {
        (Screen::Login, _) => "  Tab:switch field  F2:show password  Enter:login  Esc:quit",
        (Screen::Dashboard, _) => "  q:quit  Tab:switch  Enter:activities  r:refresh  L:logout",
        (Screen::Activities, Role::Teacher) => {
            "  j/k:nav  h/l:page  /:search  s:subject  f:status  x:clear  Enter:open  o:jump  n:new  d:delete  r:refresh"
        }
        (Screen::Activities, Role::Student) => {
            "  j/k:nav  h/l:page  /:search  s:subject  f:status  x:clear  Enter:open  o:jump  r:refresh"
        }
        (Screen::Groups, _) => {
            "  j/k:nav  h/l:page  /:search  c:class  s:subject  f:status  x:clear  v:students  d:delete  Enter:grade"
        }
        (Screen::Create, _) => "  Tab/↑↓:field  ←/→:pick  Ctrl+S:create  Esc:cancel",
        (Screen::Detail, Role::Student) => "  a:choose PDF  s:submit  r:reload  Esc:back",
        (Screen::Detail, Role::Teacher) => "  e:feedback  g:grade  s:submit  r:reload  Esc:back",
        (Screen::NotFound, _) => "  Esc:back",
    }
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];

    if app.is_busy() {
        let frame = SPINNER[(app.frame_count as usize) % SPINNER.len()];
        spans.push(Span::styled(format!("{frame} "), Style::default().fg(WARN)));
    }

    match &app.notice {
        Some(notice) => {
            let color = match notice.level {
                NoticeLevel::Success => GOOD,
                NoticeLevel::Info => ACCENT,
                NoticeLevel::Error => BAD,
            };
            spans.push(Span::styled(
                notice.title.clone(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
            if let Some(detail) = &notice.detail {
                spans.push(Span::styled(format!(" · {detail}"), Style::default().fg(Color::White)));
            }
        }
        None => spans.push(Span::styled(hints(app), Style::default().fg(Color::White))),
    }

    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(HEADER_BG));
    f.render_widget(status, area);
}

// ─── Login ──────────────────────────────────────────────────────────────────

fn render_login(f: &mut Frame, app: &App, area: Rect) {
    let area = centered(area, 64, 12);
    let form = &app.login_form;
    let masked = if form.show_password {
        form.password.clone()
    } else {
        "•".repeat(form.password.chars().count())
    };

    let mut lines = vec![
        Line::from(Span::styled(
            "  Welcome back. Sign in to continue.",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        input_line("Username", &form.user_name, app.login_field == LoginField::UserName, 28),
    ];
    if let Some(e) = app.field_error("username") {
        lines.push(error_line(&e.message));
    }
    lines.push(input_line("Password", &masked, app.login_field == LoginField::Password, 28));
    if let Some(e) = app.field_error("password") {
        lines.push(error_line(&e.message));
    }
    lines.push(Line::from(""));
    if app.is_busy() {
        lines.push(Line::from(Span::styled("  Signing in…", Style::default().fg(WARN))));
    }

    f.render_widget(Paragraph::new(lines).block(titled(" Login ")), area);
}

// ─── Dashboard ──────────────────────────────────────────────────────────────

fn status_counts(app: &App) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    for (i, status) in Status::ALL.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  |  ", Style::default().fg(DIM)));
        }
        let count = app.activities.count_by_status(status);
        spans.push(badge_span(status));
        spans.push(Span::styled(format!(" {count}"), Style::default().fg(Color::White)));
    }
    Line::from(spans)
}

fn render_student_dashboard(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let name = app.session.as_ref().map_or("Student", |s| s.user_name.as_str());
    let summary = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("  Welcome, {name}!"),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        status_counts(app),
    ])
    .block(titled(" Overview "));
    f.render_widget(summary, chunks[0]);

    let progress = app.student_progress();
    let gauge = Gauge::default()
        .block(titled(" Progress "))
        .gauge_style(Style::default().fg(GOOD).bg(HEADER_BG))
        .percent(progress)
        .label(format!("{progress}% handed in"));
    f.render_widget(gauge, chunks[1]);

    let today = App::today();
    let upcoming = app.upcoming(5);
    let items: Vec<ListItem> = if upcoming.is_empty() {
        vec![ListItem::new("  Nothing pending. Nice work!")]
    } else {
        upcoming
            .iter()
            .map(|a| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("  {:<40}", fit(&a.title, 38)), Style::default().fg(Color::White)),
                    Span::styled(format!(" {:<14}", a.subject), Style::default().fg(DIM)),
                    Span::styled(
                        due_hint(a.due_date, today).unwrap_or_default(),
                        Style::default().fg(WARN),
                    ),
                ]))
            })
            .collect()
    };
    f.render_widget(List::new(items).block(titled(" Upcoming ")), chunks[2]);
}

fn render_teacher_dashboard(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let name = app.session.as_ref().map_or("Teacher", |s| s.user_name.as_str());
    let (roster, handed_in) = app.roster_totals();
    let summary = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("  Welcome, {name}!"),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!("  {} activities", app.activities.items().len()),
                Style::default().fg(ACCENT),
            ),
            Span::styled("  |  ", Style::default().fg(DIM)),
            Span::styled(
                format!("{} class group activities", app.groups.items().len()),
                Style::default().fg(ACCENT),
            ),
            Span::styled("  |  ", Style::default().fg(DIM)),
            Span::styled(format!("{roster} student entries"), Style::default().fg(WARN)),
        ]),
        status_counts(app),
    ])
    .block(titled(" Overview "));
    f.render_widget(summary, chunks[0]);

    let rate = if roster == 0 { 0 } else { (handed_in * 100 / roster) as u16 };
    let gauge = Gauge::default()
        .block(titled(" Completion "))
        .gauge_style(Style::default().fg(GOOD).bg(HEADER_BG))
        .percent(rate)
        .label(format!("{handed_in}/{roster} handed in"));
    f.render_widget(gauge, chunks[1]);

    let items: Vec<ListItem> = if app.groups.items().is_empty() {
        vec![ListItem::new("  No class group activities yet.")]
    } else {
        app.groups
            .items()
            .iter()
            .take(8)
            .map(|g| {
                let pending = g.students.iter().filter(|s| s.status == Status::Submitted).count();
                ListItem::new(Line::from(vec![
                    Span::styled(format!("  {:<36}", fit(&g.title, 34)), Style::default().fg(Color::White)),
                    Span::styled(format!(" {:<14}", fit(&g.class_name, 12)), Style::default().fg(DIM)),
                    Span::styled(
                        format!("{pending} to grade"),
                        Style::default().fg(if pending > 0 { WARN } else { GOOD }),
                    ),
                ]))
            })
            .collect()
    };
    f.render_widget(List::new(items).block(titled(" Class Groups ")), chunks[2]);
}

// ─── Activities ─────────────────────────────────────────────────────────────

fn page_bar<T, F: crate::listing::Filter<T>>(list: &ListView<T, F>) -> Line<'static> {
    let count = list.filtered_len();
    // Nothing matched: no page numbers at all.
    let total = if count == 0 { 0 } else { list.total_pages() };
    let current = list.current_page();
    let arrow = |on: bool| Style::default().fg(if on { ACCENT } else { DIM });

    let mut spans = vec![Span::styled("  « Prev ", arrow(list.has_prev()))];
    for page in 1..=total {
        let style = if page == current {
            Style::default().fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!(" {page} "), style));
    }
    spans.push(Span::styled(" Next » ", arrow(list.has_next())));

    if count > 0 {
        let start = (current - 1) * list.page_size() + 1;
        let end = (start + list.page_size() - 1).min(count);
        spans.push(Span::styled(
            format!("   showing {start}-{end} of {count}"),
            Style::default().fg(DIM),
        ));
    }
    Line::from(spans)
}

fn filter_line(summary: String, search: Option<&str>) -> Line<'static> {
    match search {
        Some(text) => Line::from(vec![
            Span::styled("  search: ", Style::default().fg(ACCENT)),
            Span::styled(format!("{text}▏"), Style::default().fg(Color::White).bg(SELECTED_BG)),
        ]),
        None => Line::from(Span::styled(format!("  {summary}"), Style::default().fg(DIM))),
    }
}

fn skeleton_rows(columns: usize) -> Vec<Row<'static>> {
    (0..SKELETON_ROWS)
        .map(|_| Row::new(vec!["░░░░░░░░░░░░"; columns]).style(Style::default().fg(DIM)))
        .collect()
}

fn activity_row(a: &ActivityRecord, selected: bool, title_width: usize) -> Row<'static> {
    let marker = if selected { "> " } else { "  " };
    Row::new(vec![
        Line::from(vec![
            Span::styled(marker, Style::default().fg(ACCENT)),
            Span::styled(fit(&a.title, title_width), Style::default().fg(Color::White)),
        ]),
        Line::from(a.subject.clone()),
        Line::from(format_date(a.due_date)),
        Line::from(badge_span(a.status)),
        Line::from(format_points(a.points)),
    ])
}

fn render_activities(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let search = match app.editing {
        Some(Editing::Search) => Some(app.activities.filter().search.as_str()),
        _ => None,
    };
    let header = if app.editing == Some(Editing::JumpTo) {
        Line::from(vec![
            Span::styled("  open activity id: ", Style::default().fg(ACCENT)),
            Span::styled(format!("{}▏", app.jump_input), Style::default().fg(Color::White).bg(SELECTED_BG)),
        ])
    } else {
        filter_line(app.filter_summary(), search)
    };
    f.render_widget(Paragraph::new(header).block(titled(" Filters ")), chunks[0]);

    let title_width = (chunks[1].width as usize).saturating_sub(60).max(12);
    let widths = [
        Constraint::Min(16),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(13),
        Constraint::Length(9),
    ];
    let head = Row::new(vec!["  Title", "Subject", "Due", "Status", "Points"])
        .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .bottom_margin(1);
    let block = titled(format!(" Activities ({}) ", app.activities.filtered_len()));

    let page = app.activities.page_items();
    if app.activities_phase == Phase::Loading && app.activities.items().is_empty() {
        let table = Table::new(skeleton_rows(5), widths).header(head).block(block);
        f.render_widget(table, chunks[1]);
    } else if page.is_empty() {
        let hint = if app.has_filters() {
            "  Try adjusting your search or filters (x clears them)."
        } else {
            "  There are no activities yet."
        };
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  No activities found",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(hint, Style::default().fg(DIM))),
        ])
        .block(block);
        f.render_widget(empty, chunks[1]);
    } else {
        let rows: Vec<Row> = page
            .iter()
            .enumerate()
            .map(|(i, a)| activity_row(a, i == app.activity_cursor, title_width))
            .collect();
        let table = Table::new(rows, widths)
            .header(head)
            .row_highlight_style(Style::default().bg(SELECTED_BG))
            .block(block);
        let mut state = TableState::default().with_selected(Some(app.activity_cursor));
        f.render_stateful_widget(table, chunks[1], &mut state);
    }

    f.render_widget(Paragraph::new(page_bar(&app.activities)), chunks[2]);
}

fn render_confirm_delete(f: &mut Frame, title: &str, area: Rect) {
    let area = centered(area, 56, 7);
    let body = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  Delete \"{}\"?", fit(title, 40)),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled("  This cannot be undone.", Style::default().fg(DIM))),
        Line::from(vec![
            Span::styled("  y", Style::default().fg(BAD).add_modifier(Modifier::BOLD)),
            Span::raw(":delete   "),
            Span::styled("n", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
            Span::raw(":keep"),
        ]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Confirm ")
            .title_style(Style::default().fg(BAD)),
    );
    f.render_widget(Clear, area);
    f.render_widget(body, area);
}

// ─── Detail ─────────────────────────────────────────────────────────────────

fn labelled(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label:<16}"), Style::default().fg(DIM)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

fn render_detail(f: &mut Frame, app: &App, area: Rect) {
    let Some(a) = &app.detail else {
        let frame = SPINNER[(app.frame_count as usize) % SPINNER.len()];
        let loading = Paragraph::new(format!("  {frame} Loading activity…")).block(titled(" Activity "));
        f.render_widget(loading, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(area);

    let today = App::today();
    let due = match due_hint(a.due_date, today) {
        Some(hint) => format!("{} ({hint})", format_long_date(a.due_date)),
        None => format_long_date(a.due_date),
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!("  {}", a.title),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        labelled("Subject", a.subject.clone()),
        labelled("Due", due),
        Line::from(vec![
            Span::styled(format!("  {:<16}", "Status"), Style::default().fg(DIM)),
            badge_span(a.status),
        ]),
    ];
    if let Some(class) = &a.class_name {
        lines.push(labelled("Class", class.clone()));
    }
    if a.points.is_some() {
        lines.push(labelled("Points", format_points(a.points)));
    }
    if let Some(kind) = &a.submission_type {
        lines.push(labelled("Submission", kind.clone()));
    }
    if let Some(url) = &a.pdf_url {
        lines.push(labelled("Attachment", url.clone()));
    }
    if a.submission_date.is_some() {
        lines.push(labelled("Submitted", format_date(a.submission_date)));
    }
    if a.grade.is_some() {
        lines.push(labelled("Grade", format_grade(a.grade, a.max_grade)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  Description", Style::default().fg(ACCENT))));
    lines.push(Line::from(format!("  {}", a.description)));
    if let Some(instructions) = &a.instructions {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("  Instructions", Style::default().fg(ACCENT))));
        lines.push(Line::from(format!("  {instructions}")));
    }
    if let Some(feedback) = a.feedback.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("  Feedback", Style::default().fg(GOOD))));
        lines.push(Line::from(format!("  {feedback}")));
    }

    let info = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(titled(" Activity "));
    f.render_widget(info, chunks[0]);

    if app.is_teacher() {
        render_grade_panel(f, app, chunks[1]);
    } else {
        render_submit_panel(f, app, a, chunks[1]);
    }
}

fn render_submit_panel(f: &mut Frame, app: &App, a: &ActivityRecord, area: Rect) {
    let width = (area.width as usize).saturating_sub(32).max(8);
    let mut lines = Vec::new();

    if a.has_feedback() {
        lines.push(Line::from(Span::styled(
            "  This activity has been graded. Submissions are closed.",
            Style::default().fg(WARN),
        )));
    } else {
        lines.push(input_line(
            "PDF path",
            &app.draft.path_input,
            app.editing == Some(Editing::FilePath),
            width,
        ));
        let chosen = match &app.draft.file {
            Some(file) => Span::styled(
                format!("  ✓ {} ({} bytes)", fit(&file.file_name, width), file.size),
                Style::default().fg(GOOD),
            ),
            None => Span::styled("  No file chosen", Style::default().fg(DIM)),
        };
        lines.push(Line::from(chosen));
        lines.push(Line::from(""));

        let action = if app.submitting {
            Span::styled("  Submitting…", Style::default().fg(WARN))
        } else if app.can_submit_work() {
            Span::styled("  Press s to submit", Style::default().fg(ACCENT))
        } else {
            Span::styled("  Choose a PDF to enable submit", Style::default().fg(DIM))
        };
        lines.push(Line::from(action));
    }

    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(titled(" Your Submission ")),
        area,
    );
}

fn render_grade_panel(f: &mut Frame, app: &App, area: Rect) {
    let Some(form) = &app.grade_form else {
        return;
    };
    let width = (area.width as usize).saturating_sub(32).max(8);
    let mut lines = vec![
        input_line("Feedback", &form.feedback, app.editing == Some(Editing::Feedback), width),
        input_line(
            &format!("Grade (0-{})", form.max_grade),
            &form.grade,
            app.editing == Some(Editing::Grade),
            width,
        ),
        Line::from(""),
    ];
    lines.push(Line::from(if app.submitting {
        Span::styled("  Submitting…", Style::default().fg(WARN))
    } else {
        Span::styled("  Press s to submit feedback", Style::default().fg(ACCENT))
    }));

    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(titled(" Grade ")),
        area,
    );
}

fn render_not_found(f: &mut Frame, area: Rect) {
    let area = centered(area, 44, 7);
    let body = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "  404",
            Style::default().fg(BAD).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "  That activity could not be found.",
            Style::default().fg(Color::White),
        )),
        Line::from(Span::styled("  Press Esc to go back.", Style::default().fg(DIM))),
    ])
    .block(titled(" Not Found "));
    f.render_widget(body, area);
}

// ─── Class Groups ───────────────────────────────────────────────────────────

fn render_groups(f: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(rows[1]);

    let search = match app.editing {
        Some(Editing::GroupSearch) => Some(app.groups.filter().search.as_str()),
        _ => None,
    };
    f.render_widget(
        Paragraph::new(filter_line(app.group_filter_summary(), search)).block(titled(" Filters ")),
        rows[0],
    );

    let widths = [
        Constraint::Min(16),
        Constraint::Length(12),
        Constraint::Length(13),
        Constraint::Length(13),
        Constraint::Length(9),
    ];
    let head = Row::new(vec!["  Activity", "Class", "Subject", "Due", "Students"])
        .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .bottom_margin(1);
    let block = titled(format!(" Class Groups ({}) ", app.groups.filtered_len()));
    let title_width = (cols[0].width as usize).saturating_sub(54).max(12);

    let page = app.groups.page_items();
    if app.groups_phase == Phase::Loading && app.groups.items().is_empty() {
        f.render_widget(Table::new(skeleton_rows(5), widths).header(head).block(block), cols[0]);
    } else if page.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  No class group activities found",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "  Try adjusting your search or filters.",
                Style::default().fg(DIM),
            )),
        ])
        .block(block);
        f.render_widget(empty, cols[0]);
    } else {
        let table_rows: Vec<Row> = page
            .iter()
            .enumerate()
            .map(|(i, g)| {
                let marker = if i == app.group_cursor { "> " } else { "  " };
                Row::new(vec![
                    Line::from(vec![
                        Span::styled(marker, Style::default().fg(ACCENT)),
                        Span::styled(fit(&g.title, title_width), Style::default().fg(Color::White)),
                    ]),
                    Line::from(fit(&g.class_name, 11)),
                    Line::from(fit(&g.subject, 12)),
                    Line::from(format_date(g.due_date)),
                    Line::from(g.students.len().to_string()),
                ])
            })
            .collect();
        let table = Table::new(table_rows, widths)
            .header(head)
            .row_highlight_style(Style::default().bg(SELECTED_BG))
            .block(block);
        let mut state = TableState::default().with_selected(Some(app.group_cursor));
        f.render_stateful_widget(table, cols[0], &mut state);
    }

    render_roster(f, app, cols[1]);
    f.render_widget(Paragraph::new(page_bar(&app.groups)), rows[2]);
}

fn render_roster(f: &mut Frame, app: &App, area: Rect) {
    let Some(group) = app.selected_group() else {
        f.render_widget(Paragraph::new("  Select an activity.").block(titled(" Students ")), area);
        return;
    };

    // A fetched roster for this group wins over the grouped rows.
    let fetched = app
        .roster
        .as_ref()
        .filter(|(id, _)| *id == group.activity_id)
        .map(|(_, rows)| rows);
    let name_width = (area.width as usize).saturating_sub(18).max(8);

    let items: Vec<ListItem> = match fetched {
        Some(rows) if rows.is_empty() => vec![ListItem::new("  No students assigned.")],
        Some(rows) => rows
            .iter()
            .map(|r| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("  {:<w$}", fit(&r.student_name, name_width), w = name_width), Style::default().fg(Color::White)),
                    Span::raw(" "),
                    badge_span(r.status),
                ]))
            })
            .collect(),
        None => group
            .students
            .iter()
            .map(|s| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("  {:<w$}", fit(&s.student_name, name_width), w = name_width), Style::default().fg(Color::White)),
                    Span::raw(" "),
                    badge_span(s.status),
                ]))
            })
            .collect(),
    };

    let title = format!(" Students · {} ", fit(&group.title, 24));
    f.render_widget(List::new(items).block(titled(title)), area);
}

// ─── Create Activity ────────────────────────────────────────────────────────

fn render_create(f: &mut Frame, app: &App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(area);

    let width = (cols[0].width as usize).saturating_sub(34).max(8);
    let focused = app.focused_create_field();
    let mut lines = vec![Line::from("")];
    for field in CreateField::ALL {
        let value = app.create_form.display(field);
        lines.push(input_line(field.label(), &value, field == focused, width));
        if let Some(e) = app.field_error(field.key()) {
            lines.push(error_line(&e.message));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(if app.creating {
        Span::styled("  Creating…", Style::default().fg(WARN))
    } else {
        Span::styled("  Ctrl+S to create the activity", Style::default().fg(ACCENT))
    }));

    f.render_widget(Paragraph::new(lines).block(titled(" New Activity ")), cols[0]);

    let items: Vec<ListItem> = if app.class_groups.is_empty() {
        vec![ListItem::new(Span::styled("  No class groups loaded", Style::default().fg(DIM)))]
    } else {
        app.class_groups
            .iter()
            .map(|g| {
                let chosen = g.id == app.create_form.class_group_id.trim();
                let style = if chosen {
                    Style::default().fg(Color::White).bg(SELECTED_BG)
                } else {
                    Style::default().fg(Color::White)
                };
                let subject = g.subject.clone().unwrap_or_default();
                ListItem::new(Line::from(vec![
                    Span::styled(if chosen { "> " } else { "  " }, Style::default().fg(ACCENT)),
                    Span::styled(fit(&g.name, 20), style),
                    Span::styled(format!("  {subject}"), Style::default().fg(DIM)),
                ]))
            })
            .collect()
    };
    f.render_widget(List::new(items).block(titled(" Class Groups (←/→) ")), cols[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_leaves_short_text_alone() {
        assert_eq!(fit("Science", 10), "Science");
        assert_eq!(fit("Science", 7), "Science");
    }

    #[test]
    fn fit_truncates_with_ellipsis() {
        assert_eq!(fit("Mathematics", 6), "Mathe…");
        assert_eq!(fit("Mathematics", 0), "");
    }

    #[test]
    fn fit_counts_wide_characters() {
        // Each ideograph takes two columns.
        assert_eq!(fit("漢字テスト", 5), "漢字…");
    }

    fn page_labels(line: &Line) -> Vec<String> {
        line.spans
            .iter()
            .map(|s| s.content.trim().to_string())
            .filter(|s| s.parse::<usize>().is_ok())
            .collect()
    }

    #[test]
    fn page_bar_lists_every_page() {
        let mut list = crate::listing::ActivityList::new(5);
        list.set_items(crate::demo::activities());
        assert_eq!(page_labels(&page_bar(&list)), vec!["1", "2"]);
    }

    #[test]
    fn page_bar_has_no_pages_when_nothing_matches() {
        let mut list = crate::listing::ActivityList::new(5);
        list.set_items(crate::demo::activities());
        list.update_filter(|f| f.search = "no such activity".into());
        assert!(page_labels(&page_bar(&list)).is_empty());
    }

    #[test]
    fn centered_stays_inside_area() {
        let area = Rect::new(0, 0, 20, 10);
        let inner = centered(area, 40, 4);
        assert_eq!(inner, Rect::new(0, 3, 20, 4));
    }
}
