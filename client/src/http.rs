// HTTP transport for the client controllers

use std::time::Duration;

use async_trait::async_trait;
use kanri_server::cookies::parse_set_cookie;
use parking_lot::Mutex;
use reqwest::{
    Client, RequestBuilder, Response,
    header::{COOKIE, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use serde_json::json;

use crate::api::{
    ApiError, CreateTaskBody, InvitationApi, InvitationView, TaskApi, TaskPatch, TaskView,
};

const USER_AGENT: &str = "kanri-client";
const GENERIC_FAILURE: &str = "Request failed";

pub struct HttpApi {
    http: Client,
    base_url: String,
    cookies: Mutex<CookieStore>,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            http,
            base_url,
            cookies: Mutex::new(CookieStore::default()),
        })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let request = self
            .http
            .post(self.url("/api/auth/sign-in"))
            .json(&json!({ "email": email, "password": password }));
        let response = self.send(request).await?;
        self.expect_success(response).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, mut request: RequestBuilder) -> Result<Response, ApiError> {
        if let Some(header) = self.cookie_header() {
            request = request.header(COOKIE, header);
        }
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        self.capture_cookies(response.headers());
        Ok(response)
    }

    fn cookie_header(&self) -> Option<HeaderValue> {
        let store = self.cookies.lock();
        let value = store.serialize()?;
        match HeaderValue::from_str(&value) {
            Ok(header) => Some(header),
            Err(err) => {
                tracing::warn!(%err, "failed to encode cookie header");
                None
            }
        }
    }

    fn capture_cookies(&self, headers: &HeaderMap) {
        let mut store = self.cookies.lock();
        store.ingest(headers);
    }

    async fn expect_success(&self, response: Response) -> Result<String, ApiError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(ApiError::Http {
                status: status.as_u16(),
                message: failure_message(&body),
            })
        }
    }

    async fn expect_json<T: serde::de::DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, ApiError> {
        let body = self.expect_success(response).await?;
        serde_json::from_str(&body).map_err(|err| ApiError::Transport(err.to_string()))
    }
}

/// Three-tier failure text: the server's `{"error": ...}` envelope, then
/// the raw response body, then a generic fallback.
fn failure_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if !envelope.error.trim().is_empty() {
            return envelope.error;
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_owned();
    }
    GENERIC_FAILURE.to_owned()
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

#[derive(Deserialize)]
struct TaskEnvelope {
    task: TaskView,
}

#[derive(Deserialize)]
struct TaskListEnvelope {
    tasks: Vec<TaskView>,
}

#[derive(Deserialize)]
struct InvitationListEnvelope {
    invitations: Vec<InvitationView>,
}

#[async_trait]
impl TaskApi for HttpApi {
    async fn create_task(&self, body: &CreateTaskBody) -> Result<TaskView, ApiError> {
        let request = self.http.post(self.url("/api/tasks")).json(body);
        let response = self.send(request).await?;
        let envelope: TaskEnvelope = self.expect_json(response).await?;
        Ok(envelope.task)
    }

    async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<TaskView, ApiError> {
        let request = self
            .http
            .patch(self.url(&format!("/api/tasks/{task_id}")))
            .json(patch);
        let response = self.send(request).await?;
        let envelope: TaskEnvelope = self.expect_json(response).await?;
        Ok(envelope.task)
    }

    async fn delete_task(&self, task_id: &str) -> Result<(), ApiError> {
        let request = self.http.delete(self.url(&format!("/api/tasks/{task_id}")));
        let response = self.send(request).await?;
        self.expect_success(response).await?;
        Ok(())
    }

    async fn list_tasks(&self, project_id: &str) -> Result<Vec<TaskView>, ApiError> {
        let request = self
            .http
            .get(self.url(&format!("/api/projects/{project_id}/tasks")));
        let response = self.send(request).await?;
        let envelope: TaskListEnvelope = self.expect_json(response).await?;
        Ok(envelope.tasks)
    }
}

#[async_trait]
impl InvitationApi for HttpApi {
    async fn list_invitations(&self) -> Result<Vec<InvitationView>, ApiError> {
        let request = self.http.get(self.url("/api/workspace/invitations"));
        let response = self.send(request).await?;
        let envelope: InvitationListEnvelope = self.expect_json(response).await?;
        Ok(envelope.invitations)
    }

    async fn accept_invitation(&self, invitation_id: &str) -> Result<(), ApiError> {
        let request = self
            .http
            .post(self.url(&format!("/api/workspace/invitations/{invitation_id}")));
        let response = self.send(request).await?;
        self.expect_success(response).await?;
        Ok(())
    }

    async fn decline_invitation(&self, invitation_id: &str) -> Result<(), ApiError> {
        let request = self
            .http
            .delete(self.url(&format!("/api/workspace/invitations/{invitation_id}")));
        let response = self.send(request).await?;
        self.expect_success(response).await?;
        Ok(())
    }
}

#[derive(Default)]
struct CookieStore {
    entries: Vec<(String, String)>,
}

impl CookieStore {
    fn serialize(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        Some(
            self.entries
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    fn ingest(&mut self, headers: &HeaderMap) {
        for value in headers.get_all("set-cookie").iter() {
            if let Ok(text) = value.to_str() {
                if let Some((name, cookie_value)) = parse_set_cookie(text) {
                    if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
                        entry.1 = cookie_value;
                    } else {
                        self.entries.push((name, cookie_value));
                    }
                }
            }
        }
    }
}
