/// Typed HTTP client for the Taskdeck API
///
/// Wraps `reqwest` with bearer-token handling and maps error responses to
/// [`ClientError::Api`]. Signup and login store the returned token; logout
/// clears it.
///
/// # Example
///
/// ```no_run
/// use taskdeck_client::{ApiClient, TaskQuery};
///
/// # async fn example() -> Result<(), taskdeck_client::ClientError> {
/// let mut client = ApiClient::new("http://localhost:8080")?;
/// client.login("ada@example.com", "correct horse").await?;
///
/// let page = client.list_tasks(&TaskQuery::new().with_search("report")).await?;
/// for task in page.data {
///     println!("{} {}", task.order, task.title);
/// }
/// # Ok(())
/// # }
/// ```

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use taskdeck_shared::{
    models::{
        folder::Folder,
        folder_task::FolderTaskEntry,
        task::{Task, TaskStatus},
        user::User,
    },
    ordering::OrderUpdate,
    pagination::Page,
};
use tracing::debug;

use crate::{error::ClientError, query::TaskQuery};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Signup and login response
#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}

/// `{ "message": ... }` response
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message: String,
}

/// Premium activation response
#[derive(Debug, Clone, Deserialize)]
pub struct PremiumStatus {
    pub message: String,
    pub is_premium: bool,
}

/// New task payload
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<bool>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Partial task update
///
/// `None` leaves a field alone; `Some(None)` on a nullable field clears it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<bool>,
}

/// HTTP client for one API server
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Creates a client for `base_url` (e.g. `http://localhost:8080`)
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Uses an existing bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(method = method.as_str(), path, "API request");
        self.http.request(method, self.url(path))
    }

    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotAuthenticated)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        Err(ClientError::from_body(status.as_u16(), &raw))
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
        let response = Self::check(builder.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_empty(builder: RequestBuilder) -> Result<(), ClientError> {
        Self::check(builder.send().await?).await?;
        Ok(())
    }

    // Authentication

    /// Creates an account and stores its token
    pub async fn signup(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, ClientError> {
        let builder = self
            .request(Method::POST, "/signup")
            .json(&json!({ "name": name, "email": email, "password": password }));

        let payload: AuthPayload = Self::send(builder).await?;
        self.token = Some(payload.token.clone());
        Ok(payload)
    }

    /// Logs in and stores the token
    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthPayload, ClientError> {
        let builder = self
            .request(Method::POST, "/login")
            .json(&json!({ "email": email, "password": password }));

        let payload: AuthPayload = Self::send(builder).await?;
        self.token = Some(payload.token.clone());
        Ok(payload)
    }

    /// Revokes the current token and forgets it
    pub async fn logout(&mut self) -> Result<Message, ClientError> {
        let message = Self::send(self.authed(Method::POST, "/logout")?).await?;
        self.token = None;
        Ok(message)
    }

    pub async fn current_user(&self) -> Result<User, ClientError> {
        Self::send(self.authed(Method::GET, "/user")?).await
    }

    pub async fn activate_premium(&self) -> Result<PremiumStatus, ClientError> {
        Self::send(self.authed(Method::POST, "/activate-premium")?).await
    }

    // Tasks

    pub async fn list_tasks(&self, query: &TaskQuery) -> Result<Page<Task>, ClientError> {
        let builder = self
            .authed(Method::GET, "/tasks")?
            .query(&query.to_query_pairs());
        Self::send(builder).await
    }

    pub async fn priority_tasks(&self, query: &TaskQuery) -> Result<Page<Task>, ClientError> {
        let builder = self
            .authed(Method::GET, "/tasks/priority")?
            .query(&query.to_query_pairs());
        Self::send(builder).await
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Task, ClientError> {
        Self::send(self.authed(Method::POST, "/tasks")?.json(task)).await
    }

    pub async fn update_task(&self, id: i64, patch: &TaskPatch) -> Result<Task, ClientError> {
        let path = format!("/tasks/{}", id);
        Self::send(self.authed(Method::PUT, &path)?.json(patch)).await
    }

    pub async fn delete_task(&self, id: i64) -> Result<(), ClientError> {
        let path = format!("/tasks/{}", id);
        Self::send_empty(self.authed(Method::DELETE, &path)?).await
    }

    /// Sends a bulk reorder for the caller's task list
    pub async fn reorder_tasks(&self, updates: &[OrderUpdate]) -> Result<Message, ClientError> {
        let builder = self
            .authed(Method::PUT, "/tasks/reorder")?
            .json(&json!({ "tasks": updates }));
        Self::send(builder).await
    }

    // Folders

    pub async fn list_folders(&self, page: i64) -> Result<Page<Folder>, ClientError> {
        let builder = self
            .authed(Method::GET, "/folders")?
            .query(&[("page", page.max(1).to_string())]);
        Self::send(builder).await
    }

    pub async fn create_folder(&self, name: &str) -> Result<Folder, ClientError> {
        let builder = self
            .authed(Method::POST, "/folders")?
            .json(&json!({ "name": name }));
        Self::send(builder).await
    }

    pub async fn folder(&self, id: i64) -> Result<Folder, ClientError> {
        let path = format!("/folders/{}", id);
        Self::send(self.authed(Method::GET, &path)?).await
    }

    pub async fn delete_folder(&self, id: i64) -> Result<Message, ClientError> {
        let path = format!("/folders/{}", id);
        Self::send(self.authed(Method::DELETE, &path)?).await
    }

    /// Lists a folder's tasks; the priority flag of `query` is not used here
    pub async fn folder_tasks(
        &self,
        folder_id: i64,
        query: &TaskQuery,
    ) -> Result<Page<FolderTaskEntry>, ClientError> {
        let path = format!("/folders/{}/tasks", folder_id);
        let pairs: Vec<_> = query
            .to_query_pairs()
            .into_iter()
            .filter(|(key, _)| *key != "priority")
            .collect();
        Self::send(self.authed(Method::GET, &path)?.query(&pairs)).await
    }

    pub async fn add_task_to_folder(&self, folder_id: i64, task_id: i64) -> Result<Message, ClientError> {
        let path = format!("/folders/{}/add-task", folder_id);
        let builder = self
            .authed(Method::POST, &path)?
            .json(&json!({ "task_id": task_id }));
        Self::send(builder).await
    }

    pub async fn remove_task_from_folder(
        &self,
        folder_id: i64,
        task_id: i64,
    ) -> Result<Message, ClientError> {
        let path = format!("/folders/{}/remove-task/{}", folder_id, task_id);
        Self::send(self.authed(Method::DELETE, &path)?).await
    }

    /// Sends a bulk reorder for one folder's memberships
    pub async fn reorder_folder_tasks(
        &self,
        folder_id: i64,
        updates: &[OrderUpdate],
    ) -> Result<Message, ClientError> {
        let path = format!("/folders/{}/reorder-tasks", folder_id);
        let builder = self
            .authed(Method::PUT, &path)?
            .json(&json!({ "orders": updates }));
        Self::send(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.url("/tasks"), "http://localhost:8080/tasks");
    }

    #[tokio::test]
    async fn test_requires_token() {
        let client = ApiClient::new("http://localhost:8080").unwrap();
        let err = client.list_tasks(&TaskQuery::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));

        let client = client.with_token("abc");
        assert_eq!(client.token(), Some("abc"));
    }

    #[test]
    fn test_patch_serialization() {
        let patch = TaskPatch {
            title: Some("Renamed".to_string()),
            description: Some(None),
            ..Default::default()
        };

        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, json!({ "title": "Renamed", "description": null }));
    }

    #[test]
    fn test_new_task_serialization() {
        let task = NewTask {
            priority: Some(true),
            ..NewTask::titled("Write report")
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json, json!({ "title": "Write report", "priority": true }));
    }
}
