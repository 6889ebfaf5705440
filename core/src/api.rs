//! Typed operations of the civic reporting backend.
//!
//! Thin wrappers: each one picks a verb and a path and lets
//! `ResilientClient` do the rest, so every operation gets fallback,
//! promotion and bearer auth for free.

use serde::Serialize;
use serde_json::{json, Value};
use url::form_urlencoded;

use crate::client::ResilientClient;
use crate::envelope::ApiResponse;
use crate::error::RequestError;
use crate::types::{
    AssignTask, ChangePassword, Comment, CreateIssue, CreateTask, Health, Issue, IssueCategory,
    IssueStatus, LoginRequest, NewComment, RegisterRequest, Role, Task, TaskPriority, TaskStatus,
    TokenResponse, UpdateIssue, UpdateTask, UpdateUser, User, Vote,
};

pub type ApiResult<T> = Result<ApiResponse<T>, RequestError>;

/// Filters for `GET /issues`. Unset fields are left out of the query string.
#[derive(Debug, Clone, Default)]
pub struct IssueQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<IssueCategory>,
    pub status: Option<IssueStatus>,
    pub urgency: Option<u8>,
    pub assigned_to_me: Option<bool>,
    pub reported_by_me: Option<bool>,
}

impl IssueQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = paging(self.skip, self.limit);
        push(&mut pairs, "category", self.category.map(|c| c.as_str().to_string()));
        push(&mut pairs, "status", self.status.map(|s| s.as_str().to_string()));
        push(&mut pairs, "urgency", self.urgency.map(|u| u.to_string()));
        push(&mut pairs, "assigned_to_me", self.assigned_to_me.map(|b| b.to_string()));
        push(&mut pairs, "reported_by_me", self.reported_by_me.map(|b| b.to_string()));
        pairs
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to_me: Option<bool>,
}

impl TaskQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = paging(self.skip, self.limit);
        push(&mut pairs, "status", self.status.map(|s| s.as_str().to_string()));
        push(&mut pairs, "priority", self.priority.map(|p| p.as_str().to_string()));
        push(&mut pairs, "assigned_to_me", self.assigned_to_me.map(|b| b.to_string()));
        pairs
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub role: Option<Role>,
}

impl UserQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = paging(self.skip, self.limit);
        push(&mut pairs, "role", self.role.map(|r| r.as_str().to_string()));
        pairs
    }
}

fn paging(skip: Option<u32>, limit: Option<u32>) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    push(&mut pairs, "skip", skip.map(|s| s.to_string()));
    push(&mut pairs, "limit", limit.map(|l| l.to_string()));
    pairs
}

fn push(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<String>) {
    if let Some(value) = value {
        pairs.push((key, value));
    }
}

fn with_query(path: &str, pairs: &[(&'static str, String)]) -> String {
    if pairs.is_empty() {
        return path.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    format!("{path}?{query}")
}

#[derive(Serialize)]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Clone)]
pub struct CivicApi {
    client: ResilientClient,
}

impl CivicApi {
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ResilientClient {
        &self.client
    }

    // --- auth ---

    pub async fn login(&self, credentials: &LoginRequest) -> ApiResult<TokenResponse> {
        self.client.post("/auth/login", credentials).await
    }

    pub async fn register(&self, user: &RegisterRequest) -> ApiResult<User> {
        self.client.post("/auth/register", user).await
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> ApiResult<TokenResponse> {
        self.client.post("/auth/refresh", &RefreshBody { refresh_token }).await
    }

    /// Revoke the stored refresh token server-side. Without one there is
    /// nothing to revoke and no request is made.
    pub async fn logout(&self) -> ApiResult<Value> {
        match self.client.tokens().refresh_token().await {
            Some(refresh_token) => {
                self.client
                    .post("/auth/logout", &RefreshBody { refresh_token: &refresh_token })
                    .await
            }
            None => Ok(ApiResponse::Data(json!({ "message": "Logged out locally" }))),
        }
    }

    pub async fn change_password(&self, change: &ChangePassword) -> ApiResult<Value> {
        self.client.post("/auth/change-password", change).await
    }

    // --- issues ---

    pub async fn list_issues(&self, query: &IssueQuery) -> ApiResult<Vec<Issue>> {
        self.client.get(&with_query("/issues", &query.pairs())).await
    }

    pub async fn get_issue(&self, issue_id: &str) -> ApiResult<Issue> {
        self.client.get(&format!("/issues/{issue_id}")).await
    }

    pub async fn create_issue(&self, issue: &CreateIssue) -> ApiResult<Issue> {
        self.client.post("/issues", issue).await
    }

    pub async fn update_issue(&self, issue_id: &str, update: &UpdateIssue) -> ApiResult<Issue> {
        self.client.put(&format!("/issues/{issue_id}"), update).await
    }

    pub async fn issue_comments(&self, issue_id: &str) -> ApiResult<Vec<Comment>> {
        self.client.get(&format!("/issues/{issue_id}/comments")).await
    }

    pub async fn add_comment(&self, issue_id: &str, comment: &NewComment) -> ApiResult<Comment> {
        self.client.post(&format!("/issues/{issue_id}/comments"), comment).await
    }

    pub async fn vote_issue(&self, issue_id: &str, vote: Vote) -> ApiResult<Value> {
        self.client.post(&format!("/issues/{issue_id}/vote"), &vote).await
    }

    pub async fn issue_stats(&self) -> ApiResult<Value> {
        self.client.get("/issues/stats/overview").await
    }

    // --- tasks ---

    pub async fn list_tasks(&self, query: &TaskQuery) -> ApiResult<Vec<Task>> {
        self.client.get(&with_query("/tasks", &query.pairs())).await
    }

    pub async fn get_task(&self, task_id: &str) -> ApiResult<Task> {
        self.client.get(&format!("/tasks/{task_id}")).await
    }

    pub async fn create_task(&self, task: &CreateTask) -> ApiResult<Task> {
        self.client.post("/tasks", task).await
    }

    pub async fn update_task(&self, task_id: &str, update: &UpdateTask) -> ApiResult<Task> {
        self.client.put(&format!("/tasks/{task_id}"), update).await
    }

    pub async fn assign_task(&self, task_id: &str, assignment: &AssignTask) -> ApiResult<Task> {
        self.client.post(&format!("/tasks/{task_id}/assign"), assignment).await
    }

    pub async fn task_stats(&self) -> ApiResult<Value> {
        self.client.get("/tasks/stats/overview").await
    }

    // --- users ---

    pub async fn list_users(&self, query: &UserQuery) -> ApiResult<Vec<User>> {
        self.client.get(&with_query("/users", &query.pairs())).await
    }

    pub async fn get_user(&self, user_id: &str) -> ApiResult<User> {
        self.client.get(&format!("/users/{user_id}")).await
    }

    pub async fn update_user(&self, user_id: &str, update: &UpdateUser) -> ApiResult<User> {
        self.client.put(&format!("/users/{user_id}"), update).await
    }

    // --- health ---

    /// `/health` lives at the server root, not under the API prefix.
    pub async fn check_health(&self) -> ApiResult<Health> {
        self.client.get_root("/health").await
    }
}
