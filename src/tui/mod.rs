pub mod event;
pub mod ui;

use crate::api::ActivityApi;
use crate::config::default_session_hours;
use crate::forms::{
    CreateActivityForm, CreateField, FieldError, GradeForm, LoginForm, SubmissionDraft,
};
use crate::listing::{group_rows, ActivityList, FilterState, GroupFilter, GroupList, PAGE_SIZE};
use crate::models::*;
use crate::session::{Session, SessionStore};
use crate::source::{ActivitySource, Cancel, Fallback, Notice, NoticeLevel, NoticeReceiver};
use chrono::{Duration, Local, NaiveDate, Utc};
use std::future::Future;
use tokio::sync::oneshot;

/// How long a notice stays in the status bar.
const NOTICE_SECS: i64 = 5;

// ─── Background tasks ────────────────────────────────────────────────────────

pub enum Polled<T> {
    Waiting,
    Ready(T),
    /// The task went away without answering.
    Lost,
}

/// A spawned source call. Dropping it cancels the call, so replacing or
/// clearing a slot is how a screen abandons work it no longer wants.
pub struct Pending<T> {
    rx: oneshot::Receiver<T>,
    cancel: Cancel,
}

impl<T: Send + 'static> Pending<T> {
    pub fn spawn<F, Fut>(task: F) -> Self
    where
        F: FnOnce(Cancel) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let cancel = Cancel::new();
        let (tx, rx) = oneshot::channel();
        let fut = task(cancel.clone());
        tokio::spawn(async move {
            let _ = tx.send(fut.await);
        });
        Self { rx, cancel }
    }
}

impl<T> Pending<T> {
    pub fn poll(&mut self) -> Polled<T> {
        match self.rx.try_recv() {
            Ok(v) => Polled::Ready(v),
            Err(oneshot::error::TryRecvError::Empty) => Polled::Waiting,
            Err(oneshot::error::TryRecvError::Closed) => Polled::Lost,
        }
    }
}

impl<T> Drop for Pending<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// `None` while waiting (or idle); `Some(None)` when the task was lost.
fn poll_slot<T>(slot: &mut Option<Pending<T>>) -> Option<Option<T>> {
    let polled = slot.as_mut()?.poll();
    match polled {
        Polled::Waiting => None,
        Polled::Ready(v) => {
            *slot = None;
            Some(Some(v))
        }
        Polled::Lost => {
            *slot = None;
            Some(None)
        }
    }
}

// ─── Navigation ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
    Activities,
    Groups,
    Create,
    Detail,
    NotFound,
}

impl Screen {
    pub fn tabs(role: Role) -> &'static [Screen] {
        match role {
            Role::Student => &[Screen::Dashboard, Screen::Activities],
            Role::Teacher => &[
                Screen::Dashboard,
                Screen::Activities,
                Screen::Groups,
                Screen::Create,
            ],
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Login => "Login",
            Screen::Dashboard => "Dashboard",
            Screen::Activities => "Activities",
            Screen::Groups => "Class Groups",
            Screen::Create => "New Activity",
            Screen::Detail => "Activity",
            Screen::NotFound => "Not Found",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
}

/// A text input that currently owns the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Editing {
    Search,
    GroupSearch,
    JumpTo,
    FilePath,
    Feedback,
    Grade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    UserName,
    Password,
}

pub struct Settings {
    pub student_id: Option<String>,
    pub teacher_id: Option<String>,
    pub fallback: Fallback,
    pub session_hours: i64,
}

/// Longest session the client will hand out: one year.
const MAX_SESSION_HOURS: i64 = 24 * 366;

impl Settings {
    /// Session lifetime from config. Values that are not positive or exceed
    /// a year use the default instead.
    pub fn session_length(&self) -> Duration {
        if (1..=MAX_SESSION_HOURS).contains(&self.session_hours) {
            return Duration::hours(self.session_hours);
        }
        tracing::warn!(
            session_hours = self.session_hours,
            "session_hours out of range, using the default"
        );
        Duration::hours(default_session_hours())
    }
}

// ─── App State ──────────────────────────────────────────────────────────────

pub struct App {
    pub source: ActivitySource<dyn ActivityApi>,
    pub notices: NoticeReceiver,
    pub store: SessionStore,
    pub settings: Settings,
    pub running: bool,
    pub screen: Screen,
    pub session: Option<Session>,

    // Notices
    pub notice: Option<Notice>,
    pub field_errors: Vec<FieldError>,

    // Login
    pub login_form: LoginForm,
    pub login_field: LoginField,
    login_task: Option<Pending<Option<LoginResponse>>>,

    // Activities
    pub activities: ActivityList,
    pub activities_phase: Phase,
    pub activity_cursor: usize,
    pub editing: Option<Editing>,
    pub jump_input: String,
    pub confirm_delete: Option<(ActivityId, String)>,
    list_task: Option<Pending<Vec<ActivityRecord>>>,
    delete_tasks: Vec<Pending<bool>>,

    // Detail
    pub detail: Option<ActivityRecord>,
    pub detail_phase: Phase,
    pub detail_return: Screen,
    pub draft: SubmissionDraft,
    pub grade_form: Option<GradeForm>,
    pub submitting: bool,
    detail_task: Option<Pending<Option<ActivityRecord>>>,
    submit_task: Option<Pending<Option<StudentSubmission>>>,
    grade_task: Option<Pending<Option<TeacherSubmission>>>,

    // Class groups
    pub groups: GroupList,
    pub groups_phase: Phase,
    pub group_cursor: usize,
    pub roster: Option<(ActivityId, Vec<RosterRow>)>,
    groups_task: Option<Pending<Vec<RosterRow>>>,
    roster_task: Option<Pending<(ActivityId, Vec<RosterRow>)>>,

    // Create
    pub create_form: CreateActivityForm,
    pub create_field: usize,
    pub class_groups: Vec<ClassGroup>,
    pub creating: bool,
    create_task: Option<Pending<bool>>,
    class_groups_task: Option<Pending<Vec<ClassGroup>>>,

    // Incremented each frame; used to drive the loading spinner.
    pub frame_count: u64,
}

impl App {
    pub fn new(
        source: ActivitySource<dyn ActivityApi>,
        notices: NoticeReceiver,
        store: SessionStore,
        settings: Settings,
    ) -> Self {
        let session = store.load();
        let screen = if session.is_some() {
            Screen::Dashboard
        } else {
            Screen::Login
        };
        let teacher_id = settings.teacher_id.clone();

        Self {
            source,
            notices,
            store,
            settings,
            running: true,
            screen,
            session,
            notice: None,
            field_errors: Vec::new(),
            login_form: LoginForm::default(),
            login_field: LoginField::UserName,
            login_task: None,
            activities: ActivityList::new(PAGE_SIZE),
            activities_phase: Phase::Idle,
            activity_cursor: 0,
            editing: None,
            jump_input: String::new(),
            confirm_delete: None,
            list_task: None,
            delete_tasks: Vec::new(),
            detail: None,
            detail_phase: Phase::Idle,
            detail_return: Screen::Activities,
            draft: SubmissionDraft::default(),
            grade_form: None,
            submitting: false,
            detail_task: None,
            submit_task: None,
            grade_task: None,
            groups: GroupList::new(PAGE_SIZE),
            groups_phase: Phase::Idle,
            group_cursor: 0,
            roster: None,
            groups_task: None,
            roster_task: None,
            create_form: CreateActivityForm::new(teacher_id.as_deref()),
            create_field: 0,
            class_groups: Vec::new(),
            creating: false,
            create_task: None,
            class_groups_task: None,
            frame_count: 0,
        }
    }

    pub fn role(&self) -> Role {
        self.session.as_ref().map_or(Role::Student, |s| s.role)
    }

    pub fn is_teacher(&self) -> bool {
        self.role() == Role::Teacher
    }

    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    fn notify(&mut self, level: NoticeLevel, title: impl Into<String>) {
        self.notice = Some(Notice::new(level, title));
    }

    /// Kick off whatever the current session needs on screen.
    pub fn start(&mut self) {
        if self.session.is_some() {
            self.start_list_fetch();
            if self.is_teacher() {
                self.start_groups_fetch();
            }
        }
    }

    /// Called once per frame: drain notices and apply finished tasks.
    pub fn tick(&mut self) {
        self.frame_count = self.frame_count.wrapping_add(1);
        while let Ok(notice) = self.notices.try_recv() {
            self.notice = Some(notice);
        }
        if let Some(n) = &self.notice {
            if Utc::now() - n.at > Duration::seconds(NOTICE_SECS) {
                self.notice = None;
            }
        }

        if let Some(result) = poll_slot(&mut self.login_task) {
            self.apply_login(result.flatten());
        }
        if let Some(result) = poll_slot(&mut self.list_task) {
            let records = result
                .unwrap_or_else(|| self.settings.fallback.activities(Self::today()));
            self.apply_list(records);
        }
        if let Some(result) = poll_slot(&mut self.detail_task) {
            self.apply_detail(result.flatten());
        }
        if let Some(result) = poll_slot(&mut self.submit_task) {
            self.apply_submit(result.flatten());
        }
        if let Some(result) = poll_slot(&mut self.grade_task) {
            self.apply_grade(result.flatten());
        }
        self.delete_tasks
            .retain_mut(|task| matches!(task.poll(), Polled::Waiting));
        if let Some(result) = poll_slot(&mut self.groups_task) {
            self.apply_groups(result.unwrap_or_default());
        }
        if let Some(Some(roster)) = poll_slot(&mut self.roster_task) {
            self.roster = Some(roster);
        }
        if let Some(result) = poll_slot(&mut self.create_task) {
            self.apply_create(result.unwrap_or(false));
        }
        if let Some(result) = poll_slot(&mut self.class_groups_task) {
            self.class_groups = result.unwrap_or_default();
        }
    }

    pub fn is_busy(&self) -> bool {
        self.login_task.is_some()
            || self.list_task.is_some()
            || self.detail_task.is_some()
            || self.submit_task.is_some()
            || self.grade_task.is_some()
            || !self.delete_tasks.is_empty()
            || self.groups_task.is_some()
            || self.create_task.is_some()
            || self.roster_task.is_some()
            || self.class_groups_task.is_some()
    }

    // ── Navigation ──────────────────────────────────────────────────────

    pub fn go_to(&mut self, screen: Screen) {
        if self.session.is_none() {
            self.screen = Screen::Login;
            return;
        }
        if matches!(screen, Screen::Groups | Screen::Create) && !self.is_teacher() {
            self.notify(NoticeLevel::Error, "Only teachers can open that page");
            return;
        }
        if self.screen == Screen::Detail && screen != Screen::Detail {
            self.leave_detail();
        }
        if screen == Screen::Create && self.screen != Screen::Create {
            self.open_create();
        }
        self.editing = None;
        self.screen = screen;
    }

    pub fn next_tab(&mut self) {
        let tabs = Screen::tabs(self.role());
        let next = match tabs.iter().position(|t| *t == self.screen) {
            Some(i) => tabs[(i + 1) % tabs.len()],
            None => tabs[0],
        };
        self.go_to(next);
    }

    pub fn prev_tab(&mut self) {
        let tabs = Screen::tabs(self.role());
        let prev = match tabs.iter().position(|t| *t == self.screen) {
            Some(0) | None => tabs[tabs.len() - 1],
            Some(i) => tabs[i - 1],
        };
        self.go_to(prev);
    }

    // ── Login ───────────────────────────────────────────────────────────

    pub fn submit_login(&mut self) {
        if self.login_task.is_some() {
            return;
        }
        let request = match self.login_form.validate() {
            Ok(r) => r,
            Err(errors) => {
                self.field_errors = errors;
                return;
            }
        };
        self.field_errors.clear();
        let source = self.source.clone();
        self.login_task = Some(Pending::spawn(move |cancel| async move {
            source.login(&request, &cancel).await
        }));
    }

    fn apply_login(&mut self, response: Option<LoginResponse>) {
        let Some(response) = response else {
            return;
        };
        let role = Role::from_role_name(response.rolename.as_deref());
        let session = Session::new(
            self.login_form.user_name.trim(),
            role,
            response.message,
            self.settings.session_length(),
        );
        if let Err(e) = self.store.save(&session) {
            tracing::warn!(error = %e, "could not persist session");
        }
        self.session = Some(session);
        self.login_form.password.clear();
        self.screen = Screen::Dashboard;
        self.start();
    }

    pub fn logout(&mut self) {
        if let Some(s) = &self.session {
            tracing::info!(user = %s.user_name, "logged out");
        }
        self.store.clear();
        self.session = None;

        // Dropping the slots cancels anything still in flight.
        self.list_task = None;
        self.detail_task = None;
        self.submit_task = None;
        self.grade_task = None;
        self.delete_tasks.clear();
        self.groups_task = None;
        self.roster_task = None;
        self.create_task = None;
        self.class_groups_task = None;

        self.activities = ActivityList::new(PAGE_SIZE);
        self.activities_phase = Phase::Idle;
        self.groups = GroupList::new(PAGE_SIZE);
        self.groups_phase = Phase::Idle;
        self.detail = None;
        self.editing = None;
        self.confirm_delete = None;
        self.screen = Screen::Login;
        self.notify(NoticeLevel::Info, "Logged out");
    }

    // ── Activity list ───────────────────────────────────────────────────

    pub fn start_list_fetch(&mut self) {
        let source = self.source.clone();
        let fallback = self.settings.fallback;
        self.activities_phase = Phase::Loading;
        self.list_task = Some(Pending::spawn(move |cancel| async move {
            source.list(fallback, &cancel).await
        }));
    }

    fn apply_list(&mut self, records: Vec<ActivityRecord>) {
        self.activities.set_items(records);
        self.activity_cursor = 0;
        self.activities_phase = Phase::Loaded;
    }

    pub fn selected_activity(&self) -> Option<&ActivityRecord> {
        self.activities
            .page_items()
            .get(self.activity_cursor)
            .copied()
    }

    pub fn activity_cursor_down(&mut self) {
        let len = self.activities.page_items().len();
        if self.activity_cursor + 1 < len {
            self.activity_cursor += 1;
        }
    }

    pub fn activity_cursor_up(&mut self) {
        self.activity_cursor = self.activity_cursor.saturating_sub(1);
    }

    pub fn activities_prev_page(&mut self) {
        self.activities.prev_page();
        self.activity_cursor = 0;
    }

    pub fn activities_next_page(&mut self) {
        self.activities.next_page();
        self.activity_cursor = 0;
    }

    pub fn activities_go_to_page(&mut self, page: usize) {
        if page >= 1 && page <= self.activities.total_pages() {
            self.activities.go_to_page(page);
            self.activity_cursor = 0;
        }
    }

    pub fn update_activity_filter(&mut self, change: impl FnOnce(&mut FilterState)) {
        self.activities.update_filter(change);
        self.activity_cursor = 0;
    }

    pub fn cycle_subject_filter(&mut self) {
        let subjects = self.activities.subjects();
        let next = self.activities.filter().subject.cycle(&subjects);
        self.update_activity_filter(|f| f.subject = next);
    }

    pub fn cycle_status_filter(&mut self) {
        let next = self.activities.filter().status.cycle(&Status::ALL);
        self.update_activity_filter(|f| f.status = next);
    }

    pub fn clear_activity_filters(&mut self) {
        self.update_activity_filter(|f| *f = Default::default());
    }

    pub fn request_delete(&mut self) {
        let picked = self
            .selected_activity()
            .map(|r| (r.id.clone(), r.title.clone()));
        self.ask_delete(picked);
    }

    /// Delete from the class-group cards goes through the same dialog.
    pub fn request_group_delete(&mut self) {
        let picked = self
            .selected_group()
            .map(|g| (g.activity_id.clone(), g.title.clone()));
        self.ask_delete(picked);
    }

    fn ask_delete(&mut self, picked: Option<(ActivityId, String)>) {
        if !self.is_teacher() {
            self.notify(NoticeLevel::Error, "Only teachers can delete activities");
            return;
        }
        if picked.is_some() {
            self.confirm_delete = picked;
        }
    }

    /// A confirmed delete drops the row right away and then tells the
    /// backend. A failed call only surfaces as a notice.
    pub fn answer_delete(&mut self, yes: bool) {
        let Some((id, _)) = self.confirm_delete.take() else {
            return;
        };
        if !yes {
            return;
        }
        self.activities.remove_by_id(&id);
        self.activity_cursor = 0;
        self.groups.remove_first(|g| g.activity_id == id);
        self.group_cursor = 0;
        if self.roster.as_ref().is_some_and(|(shown, _)| *shown == id) {
            self.roster = None;
        }

        let source = self.source.clone();
        self.delete_tasks.push(Pending::spawn(move |cancel| async move {
            source.delete(&id, &cancel).await
        }));
    }

    pub fn submit_jump(&mut self) {
        let id = self.jump_input.trim().to_string();
        self.jump_input.clear();
        self.editing = None;
        if !id.is_empty() {
            self.open_detail(ActivityId(id), Screen::Activities);
        }
    }

    // ── Detail / submission ─────────────────────────────────────────────

    pub fn open_detail(&mut self, id: ActivityId, return_to: Screen) {
        self.draft.clear();
        self.grade_form = None;
        self.detail = None;
        self.detail_phase = Phase::Loading;
        self.detail_return = return_to;
        self.editing = None;
        self.screen = Screen::Detail;

        let source = self.source.clone();
        self.detail_task = Some(Pending::spawn(move |cancel| async move {
            source.get(&id, &cancel).await
        }));
    }

    fn apply_detail(&mut self, record: Option<ActivityRecord>) {
        if self.screen != Screen::Detail {
            return;
        }
        match record {
            Some(r) => {
                if self.is_teacher() {
                    self.grade_form = Some(GradeForm::for_activity(&r));
                }
                self.detail = Some(r);
                self.detail_phase = Phase::Loaded;
            }
            None => {
                self.detail_phase = Phase::Idle;
                self.screen = Screen::NotFound;
            }
        }
    }

    fn leave_detail(&mut self) {
        self.detail_task = None;
        self.submit_task = None;
        self.grade_task = None;
        self.submitting = false;
        self.draft.clear();
    }

    pub fn back_from_detail(&mut self) {
        let to = self.detail_return;
        self.go_to(to);
    }

    pub fn choose_file(&mut self) {
        self.editing = None;
        match self.draft.choose() {
            Ok(()) => {
                if let Some(f) = &self.draft.file {
                    let msg = format!("Selected {} ({} bytes)", f.file_name, f.size);
                    self.notify(NoticeLevel::Info, msg);
                }
            }
            Err(e) => {
                self.draft.file = None;
                self.notify(NoticeLevel::Error, e.message);
            }
        }
    }

    pub fn can_submit_work(&self) -> bool {
        !self.submitting
            && self
                .detail
                .as_ref()
                .map_or(false, |d| self.draft.can_submit(d))
    }

    pub fn submit_work(&mut self) {
        let Some(detail) = &self.detail else {
            return;
        };
        if self.submitting {
            return;
        }
        if detail.has_feedback() {
            self.notify(NoticeLevel::Error, "This activity has already been graded");
            return;
        }
        let Some(student_id) = self.settings.student_id.clone() else {
            self.notify(NoticeLevel::Error, "No student id configured");
            return;
        };
        let Some(body) = self.draft.build(detail, &student_id) else {
            self.notify(NoticeLevel::Error, "Choose a PDF to upload first");
            return;
        };

        self.submitting = true;
        let source = self.source.clone();
        self.submit_task = Some(Pending::spawn(move |cancel| async move {
            source.submit(&body, &cancel).await.then_some(body)
        }));
    }

    fn apply_submit(&mut self, submitted: Option<StudentSubmission>) {
        self.submitting = false;
        let Some(body) = submitted else {
            // Form stays as it was so the user can retry.
            return;
        };
        if let Some(mut record) = self.activities.find(&body.activity_id).cloned() {
            record.status = Status::Submitted;
            record.submission_date = Some(Self::today());
            let id = record.id.clone();
            self.activities.replace_first(|r| r.id == id, record);
        }
        self.draft.clear();
        self.go_to(Screen::Activities);
        self.start_list_fetch();
    }

    pub fn submit_grade(&mut self) {
        let (Some(detail), Some(form)) = (&self.detail, &self.grade_form) else {
            return;
        };
        if self.submitting {
            return;
        }
        let body = match form.validate(&detail.id) {
            Ok(b) => b,
            Err(e) => {
                self.notify(NoticeLevel::Error, e.message);
                return;
            }
        };

        self.submitting = true;
        self.editing = None;
        let source = self.source.clone();
        self.grade_task = Some(Pending::spawn(move |cancel| async move {
            source.grade(&body, &cancel).await.then_some(body)
        }));
    }

    fn apply_grade(&mut self, graded: Option<TeacherSubmission>) {
        self.submitting = false;
        let Some(body) = graded else {
            return;
        };
        if let Some(mut record) = self.activities.find(&body.activity_id).cloned() {
            record.feedback = Some(body.feedback.clone());
            record.grade = body.grade;
            if body.grade.is_some() {
                record.status = Status::Graded;
            }
            let id = record.id.clone();
            self.activities.replace_first(|r| r.id == id, record);
        }
        let back = self.detail_return;
        self.go_to(back);
        if back == Screen::Groups {
            self.start_groups_fetch();
        }
    }

    // ── Class groups ────────────────────────────────────────────────────

    pub fn start_groups_fetch(&mut self) {
        let source = self.source.clone();
        self.groups_phase = Phase::Loading;
        self.groups_task = Some(Pending::spawn(move |cancel| async move {
            source.roster_rows(&cancel).await
        }));
    }

    fn apply_groups(&mut self, rows: Vec<RosterRow>) {
        self.groups.set_items(group_rows(&rows));
        self.group_cursor = 0;
        self.roster = None;
        self.groups_phase = Phase::Loaded;
    }

    pub fn selected_group(&self) -> Option<&ActivityGroup> {
        self.groups.page_items().get(self.group_cursor).copied()
    }

    pub fn group_cursor_down(&mut self) {
        let len = self.groups.page_items().len();
        if self.group_cursor + 1 < len {
            self.group_cursor += 1;
        }
    }

    pub fn group_cursor_up(&mut self) {
        self.group_cursor = self.group_cursor.saturating_sub(1);
    }

    pub fn groups_prev_page(&mut self) {
        self.groups.prev_page();
        self.group_cursor = 0;
    }

    pub fn groups_next_page(&mut self) {
        self.groups.next_page();
        self.group_cursor = 0;
    }

    pub fn groups_go_to_page(&mut self, page: usize) {
        if page >= 1 && page <= self.groups.total_pages() {
            self.groups.go_to_page(page);
            self.group_cursor = 0;
        }
    }

    pub fn update_group_filter(&mut self, change: impl FnOnce(&mut GroupFilter)) {
        self.groups.update_filter(change);
        self.group_cursor = 0;
    }

    pub fn cycle_group_class(&mut self) {
        let classes = self.groups.classes();
        let next = self.groups.filter().class_name.cycle(&classes);
        self.update_group_filter(|f| f.class_name = next);
    }

    pub fn cycle_group_subject(&mut self) {
        let subjects = self.groups.subjects();
        let next = self.groups.filter().subject.cycle(&subjects);
        self.update_group_filter(|f| f.subject = next);
    }

    pub fn cycle_group_status(&mut self) {
        let next = self.groups.filter().status.cycle(&Status::ALL);
        self.update_group_filter(|f| f.status = next);
    }

    pub fn clear_group_filters(&mut self) {
        self.update_group_filter(|f| *f = Default::default());
    }

    /// Fetch the per-student roster for the selected group.
    pub fn load_roster(&mut self) {
        let Some(id) = self.selected_group().map(|g| g.activity_id.clone()) else {
            return;
        };
        let source = self.source.clone();
        self.roster_task = Some(Pending::spawn(move |cancel| async move {
            let rows = source.student_rows(&id, &cancel).await;
            (id, rows)
        }));
    }

    // ── Create activity ─────────────────────────────────────────────────

    fn open_create(&mut self) {
        self.create_form = CreateActivityForm::new(self.settings.teacher_id.as_deref());
        self.create_field = 0;
        self.field_errors.clear();
        let source = self.source.clone();
        self.class_groups_task = Some(Pending::spawn(move |cancel| async move {
            source.class_groups(&cancel).await
        }));
    }

    pub fn focused_create_field(&self) -> CreateField {
        CreateField::ALL[self.create_field.min(CreateField::ALL.len() - 1)]
    }

    pub fn create_field_next(&mut self) {
        self.create_field = (self.create_field + 1) % CreateField::ALL.len();
    }

    pub fn create_field_prev(&mut self) {
        let n = CreateField::ALL.len();
        self.create_field = (self.create_field + n - 1) % n;
    }

    /// Left/right on a pick-list field.
    pub fn cycle_create_choice(&mut self, forward: bool) {
        match self.focused_create_field() {
            CreateField::ClassLevel => self.create_form.cycle_class_level(forward),
            CreateField::ClassGroupId if !self.class_groups.is_empty() => {
                let n = self.class_groups.len();
                let current = self
                    .class_groups
                    .iter()
                    .position(|g| g.id == self.create_form.class_group_id.trim());
                let next = match (current, forward) {
                    (None, true) => 0,
                    (None, false) => n - 1,
                    (Some(i), true) => (i + 1) % n,
                    (Some(i), false) => (i + n - 1) % n,
                };
                self.create_form.class_group_id = self.class_groups[next].id.clone();
            }
            _ => {}
        }
    }

    pub fn submit_create(&mut self) {
        if self.creating {
            return;
        }
        let request = match self.create_form.validate() {
            Ok(r) => r,
            Err(errors) => {
                self.field_errors = errors;
                self.notify(NoticeLevel::Error, "Please fix the highlighted fields");
                return;
            }
        };
        self.field_errors.clear();
        self.creating = true;
        let source = self.source.clone();
        self.create_task = Some(Pending::spawn(move |cancel| async move {
            source.create(&request, &cancel).await
        }));
    }

    fn apply_create(&mut self, ok: bool) {
        self.creating = false;
        if ok {
            self.screen = Screen::Activities;
            self.start_list_fetch();
        }
    }

    pub fn field_error(&self, key: &str) -> Option<&FieldError> {
        self.field_errors.iter().find(|e| e.field == key)
    }

    // ── Dashboard ───────────────────────────────────────────────────────

    /// Share of activities already handed in, as a percentage.
    pub fn student_progress(&self) -> u16 {
        let total = self.activities.items().len();
        if total == 0 {
            return 0;
        }
        let done = self.activities.count_by_status(Status::Submitted)
            + self.activities.count_by_status(Status::Graded);
        ((done * 100) / total) as u16
    }

    /// The next few pending activities, soonest first.
    pub fn upcoming(&self, limit: usize) -> Vec<&ActivityRecord> {
        let today = Self::today();
        let mut upcoming: Vec<&ActivityRecord> = self
            .activities
            .items()
            .iter()
            .filter(|a| a.status == Status::Pending)
            .filter(|a| a.due_date.map_or(true, |d| d >= today))
            .collect();
        upcoming.sort_by(|a, b| match (a.due_date, b.due_date) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, _) => std::cmp::Ordering::Greater,
            (_, None) => std::cmp::Ordering::Less,
            (Some(x), Some(y)) => x.cmp(&y),
        });
        upcoming.truncate(limit);
        upcoming
    }

    /// (roster size, handed in) across every class group.
    pub fn roster_totals(&self) -> (usize, usize) {
        self.groups
            .items()
            .iter()
            .flat_map(|g| g.students.iter())
            .fold((0, 0), |(total, done), s| {
                let handed_in = matches!(s.status, Status::Submitted | Status::Graded);
                (total + 1, done + usize::from(handed_in))
            })
    }

    pub fn filter_summary(&self) -> String {
        let f = self.activities.filter();
        let search = if f.search.is_empty() {
            String::new()
        } else {
            format!("  search: \"{}\"", f.search)
        };
        format!(
            "subject: {}  status: {}{}",
            f.subject.label(),
            f.status.label(),
            search
        )
    }

    pub fn group_filter_summary(&self) -> String {
        let f = self.groups.filter();
        let search = if f.search.is_empty() {
            String::new()
        } else {
            format!("  search: \"{}\"", f.search)
        };
        format!(
            "class: {}  subject: {}  status: {}{}",
            f.class_name.label(),
            f.subject.label(),
            f.status.label(),
            search
        )
    }

    pub fn has_filters(&self) -> bool {
        *self.activities.filter() != Default::default()
    }
}
