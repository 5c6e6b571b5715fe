//! The activity source: every backend call the UI makes goes through here.
//!
//! Failures never reach the caller. Each failed call is logged, reported
//! once as a [`Notice`], and replaced by a fallback value (an empty list, the
//! demo dataset, `None` or `false`). There is no retry and no caching.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use tokio::sync::{mpsc, watch};

use crate::api::{ActivityApi, ApiError};
use crate::demo;
use crate::models::*;

// ─── Notices ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            detail: None,
            at: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

pub type NoticeSender = mpsc::UnboundedSender<Notice>;
pub type NoticeReceiver = mpsc::UnboundedReceiver<Notice>;

pub fn notice_channel() -> (NoticeSender, NoticeReceiver) {
    mpsc::unbounded_channel()
}

// ─── Cancellation ───────────────────────────────────────────────────────────

/// Shared cancellation flag handed to every source call. Cloning shares the
/// flag; cancelling any clone cancels them all.
#[derive(Debug, Clone)]
pub struct Cancel {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for Cancel {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancel {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once `cancel` has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|flag| *flag).await.is_err() {
            // The sender lives as long as any clone; unreachable in practice.
            std::future::pending::<()>().await;
        }
    }
}

// ─── Fallback policy ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fallback {
    Empty,
    #[default]
    Demo,
}

impl Fallback {
    pub fn activities(self, today: NaiveDate) -> Vec<ActivityRecord> {
        match self {
            Self::Empty => Vec::new(),
            Self::Demo => demo::activities_as_of(today),
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ─── Source ─────────────────────────────────────────────────────────────────

pub struct ActivitySource<A: ?Sized> {
    api: Arc<A>,
    notices: NoticeSender,
}

impl<A: ?Sized> Clone for ActivitySource<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            notices: self.notices.clone(),
        }
    }
}

impl<A: ActivityApi + ?Sized> ActivitySource<A> {
    pub fn new(api: Arc<A>, notices: NoticeSender) -> Self {
        Self { api, notices }
    }

    fn notify(&self, notice: Notice) {
        // The receiver only goes away on shutdown.
        let _ = self.notices.send(notice);
    }

    /// Run `fut` unless `cancel` fires first. On failure log, notify once
    /// with `failure`, and return `None`; a cancelled call stays silent.
    async fn guarded<T>(
        &self,
        cancel: &Cancel,
        what: &str,
        failure: &str,
        fut: impl Future<Output = Result<T, ApiError>>,
    ) -> Option<T> {
        if cancel.is_cancelled() {
            return None;
        }
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            r = fut => r,
        };

        match result {
            Ok(value) => Some(value),
            Err(ApiError::Cancelled) => {
                tracing::debug!("{what} cancelled");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "{what} failed");
                self.notify(Notice::new(NoticeLevel::Error, failure).with_detail(e.to_string()));
                None
            }
        }
    }

    pub async fn list(&self, fallback: Fallback, cancel: &Cancel) -> Vec<ActivityRecord> {
        match self
            .guarded(
                cancel,
                "listing activities",
                "Failed to load activities",
                self.api.list_activities(),
            )
            .await
        {
            Some(records) => {
                tracing::info!(count = records.len(), "activities loaded");
                records
            }
            None => fallback.activities(today()),
        }
    }

    pub async fn get(&self, id: &ActivityId, cancel: &Cancel) -> Option<ActivityRecord> {
        self.guarded(
            cancel,
            "fetching activity",
            "Failed to load activity details",
            self.api.get_activity(id),
        )
        .await
    }

    pub async fn submit(&self, body: &StudentSubmission, cancel: &Cancel) -> bool {
        let ok = self
            .guarded(
                cancel,
                "submitting work",
                "Failed to submit activity",
                self.api.submit_work(body),
            )
            .await
            .is_some();
        if ok {
            tracing::info!(activity = body.activity_id.as_str(), file = %body.file_name, "work submitted");
            self.notify(Notice::new(NoticeLevel::Success, "Assignment submitted successfully"));
        }
        ok
    }

    pub async fn grade(&self, body: &TeacherSubmission, cancel: &Cancel) -> bool {
        let ok = self
            .guarded(
                cancel,
                "submitting feedback",
                "Failed to submit feedback",
                self.api.submit_feedback(body),
            )
            .await
            .is_some();
        if ok {
            tracing::info!(activity = %body.activity_id, grade = ?body.grade, "feedback submitted");
            self.notify(Notice::new(NoticeLevel::Success, "Feedback submitted successfully"));
        }
        ok
    }

    pub async fn create(&self, body: &CreateActivityRequest, cancel: &Cancel) -> bool {
        let ok = self
            .guarded(
                cancel,
                "creating activity",
                "Failed to create activity",
                self.api.create_activity(body),
            )
            .await
            .is_some();
        if ok {
            tracing::info!(title = %body.title, "activity created");
            self.notify(
                Notice::new(NoticeLevel::Success, "Activity created successfully!")
                    .with_detail("Your new activity has been saved."),
            );
        }
        ok
    }

    pub async fn delete(&self, id: &ActivityId, cancel: &Cancel) -> bool {
        let ok = self
            .guarded(
                cancel,
                "deleting activity",
                "Failed to delete activity",
                self.api.delete_activity(id),
            )
            .await
            .is_some();
        if ok {
            tracing::info!(activity = %id, "activity deleted");
            self.notify(Notice::new(NoticeLevel::Success, "Activity deleted successfully"));
        }
        ok
    }

    /// Class-group rows for the grouped view. Always falls back to the demo
    /// roster.
    pub async fn roster_rows(&self, cancel: &Cancel) -> Vec<RosterRow> {
        self.guarded(
            cancel,
            "listing class group activities",
            "Failed to load activities",
            self.api.list_roster_rows(),
        )
        .await
        .unwrap_or_else(|| demo::roster_rows_as_of(today()))
    }

    pub async fn student_rows(&self, id: &ActivityId, cancel: &Cancel) -> Vec<RosterRow> {
        self.guarded(
            cancel,
            "listing student activities",
            "Failed to load students",
            self.api.list_student_rows(id),
        )
        .await
        .unwrap_or_else(|| {
            demo::roster_rows_as_of(today())
                .into_iter()
                .filter(|r| &r.activity_id == id)
                .collect()
        })
    }

    pub async fn class_groups(&self, cancel: &Cancel) -> Vec<ClassGroup> {
        self.guarded(
            cancel,
            "listing class groups",
            "Failed to load class groups",
            self.api.list_class_groups(),
        )
        .await
        .unwrap_or_default()
    }

    /// Returns the login response on success. Rejected credentials and
    /// transport failures are reported with different notices.
    pub async fn login(&self, body: &LoginRequest, cancel: &Cancel) -> Option<LoginResponse> {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            r = self.api.login(body) => r,
        };

        match result {
            Ok(resp) => {
                tracing::info!(user = %body.user_name, role = ?resp.rolename, "logged in");
                self.notify(
                    Notice::new(NoticeLevel::Success, "Login successful!").with_detail(
                        resp.message
                            .clone()
                            .unwrap_or_else(|| "Welcome back to Kind Hearts".into()),
                    ),
                );
                Some(resp)
            }
            Err(ApiError::Cancelled) => None,
            Err(ApiError::Rejected(message)) => {
                tracing::warn!(user = %body.user_name, "login rejected");
                self.notify(Notice::new(NoticeLevel::Error, "Login failed").with_detail(message));
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "login request failed");
                self.notify(
                    Notice::new(NoticeLevel::Error, "Login error")
                        .with_detail("Something went wrong. Please try again later."),
                );
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Mode {
        Ok,
        Fail,
        Hang,
    }

    pub struct FakeApi {
        pub mode: Mode,
        pub records: Vec<ActivityRecord>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        pub fn new(mode: Mode, records: Vec<ActivityRecord>) -> Self {
            Self {
                mode,
                records,
                calls: Mutex::new(Vec::new()),
            }
        }

        async fn respond<T>(&self, call: String, value: T) -> Result<T, ApiError> {
            self.calls.lock().unwrap().push(call);
            match self.mode {
                Mode::Ok => Ok(value),
                Mode::Fail => Err(ApiError::Api {
                    status: 500,
                    message: "boom".into(),
                }),
                Mode::Hang => std::future::pending().await,
            }
        }
    }

    #[async_trait]
    impl ActivityApi for FakeApi {
        async fn list_activities(&self) -> Result<Vec<ActivityRecord>, ApiError> {
            self.respond("list".into(), self.records.clone()).await
        }

        async fn get_activity(&self, id: &ActivityId) -> Result<ActivityRecord, ApiError> {
            let found = self.records.iter().find(|r| &r.id == id).cloned();
            match self.respond(format!("get {id}"), found).await? {
                Some(r) => Ok(r),
                None => Err(ApiError::Api {
                    status: 404,
                    message: "Not found".into(),
                }),
            }
        }

        async fn create_activity(&self, body: &CreateActivityRequest) -> Result<(), ApiError> {
            self.respond(format!("create {}", body.title), ()).await
        }

        async fn submit_work(&self, body: &StudentSubmission) -> Result<(), ApiError> {
            self.respond(format!("submit {}", body.activity_id), ()).await
        }

        async fn submit_feedback(&self, body: &TeacherSubmission) -> Result<(), ApiError> {
            self.respond(format!("grade {}", body.activity_id), ()).await
        }

        async fn delete_activity(&self, id: &ActivityId) -> Result<(), ApiError> {
            self.respond(format!("delete {id}"), ()).await
        }

        async fn list_roster_rows(&self) -> Result<Vec<RosterRow>, ApiError> {
            self.respond("roster".into(), Vec::new()).await
        }

        async fn list_student_rows(&self, id: &ActivityId) -> Result<Vec<RosterRow>, ApiError> {
            self.respond(format!("students {id}"), Vec::new()).await
        }

        async fn list_class_groups(&self) -> Result<Vec<ClassGroup>, ApiError> {
            self.respond("groups".into(), Vec::new()).await
        }

        async fn login(&self, body: &LoginRequest) -> Result<LoginResponse, ApiError> {
            self.calls.lock().unwrap().push(format!("login {}", body.user_name));
            match (self.mode, body.password.as_str()) {
                (Mode::Hang, _) => std::future::pending().await,
                (Mode::Fail, _) => Err(ApiError::Malformed("connection reset".into())),
                (Mode::Ok, "secret") => Ok(LoginResponse {
                    message: Some("Welcome".into()),
                    rolename: Some("Teacher".into()),
                }),
                (Mode::Ok, _) => Err(ApiError::Rejected("Invalid credentials".into())),
            }
        }
    }

    pub fn fake_source(mode: Mode) -> (ActivitySource<FakeApi>, NoticeReceiver) {
        let (tx, rx) = notice_channel();
        let api = Arc::new(FakeApi::new(mode, demo::activities()));
        (ActivitySource::new(api, tx), rx)
    }

    fn drain(rx: &mut NoticeReceiver) -> Vec<Notice> {
        let mut out = Vec::new();
        while let Ok(n) = rx.try_recv() {
            out.push(n);
        }
        out
    }

    #[tokio::test]
    async fn list_returns_backend_records() {
        let (source, mut rx) = fake_source(Mode::Ok);
        let records = source.list(Fallback::Empty, &Cancel::new()).await;
        assert_eq!(records, demo::activities());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn failed_list_degrades_to_fallback_and_notifies_once() {
        let (source, mut rx) = fake_source(Mode::Fail);

        let records = source.list(Fallback::Demo, &Cancel::new()).await;
        assert_eq!(records, demo::activities_as_of(today()));

        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].title, "Failed to load activities");
    }

    #[tokio::test]
    async fn demo_fallback_marks_past_due_work_overdue() {
        let (source, _rx) = fake_source(Mode::Fail);
        let today = today();
        let records = source.list(Fallback::Demo, &Cancel::new()).await;

        assert!(!records
            .iter()
            .any(|r| r.status == Status::Pending && r.due_date.is_some_and(|d| d < today)));
        let first = records.iter().find(|r| r.id == ActivityId::from(1)).unwrap();
        assert_eq!(first.status, Status::Overdue);
    }

    #[tokio::test]
    async fn failed_list_with_empty_fallback() {
        let (source, _rx) = fake_source(Mode::Fail);
        assert!(source.list(Fallback::Empty, &Cancel::new()).await.is_empty());
    }

    #[tokio::test]
    async fn sentinels_on_failure() {
        let (source, mut rx) = fake_source(Mode::Fail);
        let cancel = Cancel::new();
        let id = ActivityId::from(1);

        assert!(source.get(&id, &cancel).await.is_none());
        assert!(!source.delete(&id, &cancel).await);
        assert!(
            !source
                .grade(
                    &TeacherSubmission {
                        activity_id: id.clone(),
                        feedback: "ok".into(),
                        grade: Some(5.0),
                    },
                    &cancel,
                )
                .await
        );

        let titles: Vec<String> = drain(&mut rx).into_iter().map(|n| n.title).collect();
        assert_eq!(
            titles,
            vec![
                "Failed to load activity details".to_string(),
                "Failed to delete activity".to_string(),
                "Failed to submit feedback".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn successful_delete_notifies_success() {
        let (source, mut rx) = fake_source(Mode::Ok);
        assert!(source.delete(&ActivityId::from(3), &Cancel::new()).await);
        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Success);
    }

    #[tokio::test]
    async fn roster_falls_back_to_demo_rows() {
        let (source, _rx) = fake_source(Mode::Fail);
        let rows = source.roster_rows(&Cancel::new()).await;
        assert_eq!(rows, demo::roster_rows_as_of(today()));

        let rows = source
            .student_rows(&ActivityId::from("act-103"), &Cancel::new())
            .await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].student_name, "Sophia Martinez");
    }

    #[tokio::test]
    async fn cancelled_call_is_silent_and_uses_fallback() {
        let (source, mut rx) = fake_source(Mode::Hang);
        let cancel = Cancel::new();

        let pending = {
            let source = source.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { source.list(Fallback::Empty, &cancel).await })
        };
        cancel.cancel();

        let records = pending.await.unwrap();
        assert!(records.is_empty());
        assert!(cancel.is_cancelled());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn login_distinguishes_rejection_from_transport_errors() {
        let (source, mut rx) = fake_source(Mode::Ok);
        let cancel = Cancel::new();

        let ok = source
            .login(
                &LoginRequest {
                    user_name: "ms.frizzle".into(),
                    password: "secret".into(),
                },
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(ok.rolename.as_deref(), Some("Teacher"));

        let rejected = source
            .login(
                &LoginRequest {
                    user_name: "ms.frizzle".into(),
                    password: "wrong".into(),
                },
                &cancel,
            )
            .await;
        assert!(rejected.is_none());

        let (broken, mut broken_rx) = fake_source(Mode::Fail);
        assert!(broken
            .login(
                &LoginRequest {
                    user_name: "x".into(),
                    password: "y".into(),
                },
                &cancel,
            )
            .await
            .is_none());

        let titles: Vec<String> = drain(&mut rx).into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["Login successful!".to_string(), "Login failed".to_string()]);
        assert_eq!(drain(&mut broken_rx)[0].title, "Login error");
    }
}
