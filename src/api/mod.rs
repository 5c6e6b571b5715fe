pub mod normalize;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::models::*;

// ─── Error types ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Unauthorized – please log in again")]
    Unauthorized,
    #[error("{0}")]
    Rejected(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Unexpected response shape: {0}")]
    Malformed(String),
    #[error("Request cancelled")]
    Cancelled,
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

// ─── Transport seam ─────────────────────────────────────────────────────────

/// Everything the app asks of the backend. Bodies come back already mapped
/// onto the canonical models.
#[async_trait]
pub trait ActivityApi: Send + Sync {
    async fn list_activities(&self) -> Result<Vec<ActivityRecord>, ApiError>;
    async fn get_activity(&self, id: &ActivityId) -> Result<ActivityRecord, ApiError>;
    async fn create_activity(&self, body: &CreateActivityRequest) -> Result<(), ApiError>;
    async fn submit_work(&self, body: &StudentSubmission) -> Result<(), ApiError>;
    async fn submit_feedback(&self, body: &TeacherSubmission) -> Result<(), ApiError>;
    async fn delete_activity(&self, id: &ActivityId) -> Result<(), ApiError>;
    async fn list_roster_rows(&self) -> Result<Vec<RosterRow>, ApiError>;
    async fn list_student_rows(&self, id: &ActivityId) -> Result<Vec<RosterRow>, ApiError>;
    async fn list_class_groups(&self) -> Result<Vec<ClassGroup>, ApiError>;
    async fn login(&self, body: &LoginRequest) -> Result<LoginResponse, ApiError>;
}

// ─── Client ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct KindHeartsClient {
    client: Client,
    base_url: Url,
}

impl KindHeartsClient {
    pub fn new(base_url: &str, accept_invalid_certs: bool) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API URL: {base_url}"))?;
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(concat!("kind-hearts/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        Ok(Self { client, base_url })
    }

    fn api_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("Bad API path: {path}"))
    }

    async fn check_status(resp: Response) -> Result<Response, ApiError> {
        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ApiError::Api {
                status: 404,
                message: "Not found".into(),
            }),
            s if s.is_client_error() || s.is_server_error() => {
                let status = s.as_u16();
                let message = resp.text().await.unwrap_or_default();
                Err(ApiError::Api { status, message })
            }
            _ => Ok(resp),
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.api_url(path)?;
        tracing::debug!(%url, "GET");
        let resp = self.client.get(url).send().await?;
        let resp = Self::check_status(resp).await?;
        let text = resp.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn send_json<B: serde::Serialize + Sync>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        let url = self.api_url(path)?;
        tracing::debug!(%method, %url, "sending JSON body");
        let resp = self.client.request(method, url).json(body).send().await?;
        Self::check_status(resp).await
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }
}

#[async_trait]
impl ActivityApi for KindHeartsClient {
    async fn list_activities(&self) -> Result<Vec<ActivityRecord>, ApiError> {
        let body = self.get_json("activities/activitieslist").await?;
        normalize::normalize_activities(&body, Self::today())
            .ok_or_else(|| ApiError::Malformed("activity list is not an array".into()))
    }

    async fn get_activity(&self, id: &ActivityId) -> Result<ActivityRecord, ApiError> {
        let body = self
            .get_json(&format!("activities/activitychanges/{id}"))
            .await?;
        // Some deployments wrap the single record in a one-element array.
        let raw = match &body {
            Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
            _ => body,
        };
        normalize::normalize_activity(&raw, Self::today())
            .ok_or_else(|| ApiError::Malformed(format!("activity {id} has no id")))
    }

    async fn create_activity(&self, body: &CreateActivityRequest) -> Result<(), ApiError> {
        self.send_json(reqwest::Method::POST, "activities", body)
            .await
            .map(|_| ())
    }

    async fn submit_work(&self, body: &StudentSubmission) -> Result<(), ApiError> {
        self.send_json(
            reqwest::Method::PUT,
            &format!("activities/{}", body.activity_id),
            body,
        )
        .await
        .map(|_| ())
    }

    async fn submit_feedback(&self, body: &TeacherSubmission) -> Result<(), ApiError> {
        self.send_json(reqwest::Method::PUT, "activities/teachersubmission", body)
            .await
            .map(|_| ())
    }

    async fn delete_activity(&self, id: &ActivityId) -> Result<(), ApiError> {
        let url = self.api_url(&format!("activities/{id}"))?;
        tracing::debug!(%url, "DELETE");
        let resp = self.client.delete(url).send().await?;
        Self::check_status(resp).await.map(|_| ())
    }

    async fn list_roster_rows(&self) -> Result<Vec<RosterRow>, ApiError> {
        let body = self.get_json("ClassGroupSubjectActivity").await?;
        normalize::normalize_roster(&body, Self::today())
            .ok_or_else(|| ApiError::Malformed("class group activities is not an array".into()))
    }

    async fn list_student_rows(&self, id: &ActivityId) -> Result<Vec<RosterRow>, ApiError> {
        let body = self
            .get_json(&format!("classgroupsubjectstudentactivities/{id}"))
            .await?;
        normalize::normalize_roster(&body, Self::today())
            .ok_or_else(|| ApiError::Malformed("student activities is not an array".into()))
    }

    async fn list_class_groups(&self) -> Result<Vec<ClassGroup>, ApiError> {
        let body = self.get_json("ClassGroupSubject/classgroupslist").await?;
        normalize::normalize_class_groups(&body)
            .ok_or_else(|| ApiError::Malformed("class group list is not an array".into()))
    }

    async fn login(&self, body: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let url = self.api_url("auth/login")?;
        let resp = self.client.post(url).json(body).send().await?;
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let parsed: LoginResponse = serde_json::from_str(&text).unwrap_or_default();

        if status.is_success() {
            Ok(parsed)
        } else {
            Err(ApiError::Rejected(
                parsed
                    .message
                    .unwrap_or_else(|| "Invalid credentials".into()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_keeps_base_path() {
        let client = KindHeartsClient::new("https://localhost:44361/api", false).unwrap();
        assert_eq!(
            client.api_url("activities/activitieslist").unwrap().as_str(),
            "https://localhost:44361/api/activities/activitieslist"
        );
        assert_eq!(
            client.api_url("/auth/login").unwrap().as_str(),
            "https://localhost:44361/api/auth/login"
        );
    }

    #[test]
    fn api_url_accepts_trailing_slash() {
        let client = KindHeartsClient::new("http://example.test/api/", false).unwrap();
        assert_eq!(
            client.api_url("activities/42").unwrap().as_str(),
            "http://example.test/api/activities/42"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(KindHeartsClient::new("not a url", false).is_err());
    }
}
