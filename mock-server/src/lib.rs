//! In-memory implementation of the civic reporting REST API.
//!
//! Serves the backend's API routes under `/api/v1` and its health check at
//! the root `/health` only, with FastAPI-shaped errors: a non-2xx status and a
//! `{"detail": "..."}` body. Protected routes need `Authorization: Bearer`
//! with a token from `/auth/login` or `/auth/refresh`.
//!
//! `unavailable()` is the opposite fixture: every request gets a 503 with a
//! plain-text body, standing in for a misconfigured or overloaded endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Every record carries this timestamp; the fixture has no clock.
pub const TIMESTAMP: &str = "2024-01-01T00:00:00Z";

const ISSUE_CATEGORIES: [&str; 5] = ["pothole", "streetlight", "garbage", "waterlogging", "other"];
const ISSUE_STATUSES: [&str; 5] = ["pending", "assigned", "in_progress", "resolved", "rejected"];
const TASK_STATUSES: [&str; 5] = ["new", "accepted", "in_progress", "completed", "rejected"];
const TASK_PRIORITIES: [&str; 4] = ["low", "medium", "high", "critical"];
const ROLES: [&str; 4] = ["citizen", "fieldworker", "staff", "admin"];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: String,
    pub points: i64,
    pub badge_count: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub urgency: u8,
    pub status: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_note: Option<String>,
    pub tracking_id: String,
    pub reporter_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    pub reported_at: String,
    pub updated_at: String,
    pub upvotes: u32,
    pub downvotes: u32,
    pub comments_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub author_id: String,
    pub author_name: String,
    pub issue_id: String,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub category: String,
    pub images: Vec<String>,
    pub assigned_at: String,
    pub due_date: String,
    pub issue_id: String,
    pub assignee_id: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: User,
}

#[derive(Deserialize)]
pub struct CreateIssue {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default = "default_urgency")]
    pub urgency: u8,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub audio_note: Option<String>,
}

fn default_urgency() -> u8 {
    1
}

#[derive(Deserialize)]
pub struct UpdateIssue {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub urgency: Option<u8>,
    pub status: Option<String>,
    pub address: Option<String>,
    pub assignee_id: Option<String>,
}

#[derive(Deserialize)]
pub struct NewComment {
    pub text: String,
}

#[derive(Deserialize)]
pub struct VoteRequest {
    #[serde(default = "default_upvote")]
    pub is_upvote: bool,
}

fn default_upvote() -> bool {
    true
}

#[derive(Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub due_date: String,
    pub issue_id: String,
    pub assignee_id: String,
}

#[derive(Deserialize)]
pub struct UpdateTask {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub images: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct AssignTask {
    pub assignee_id: String,
    pub due_date: String,
    pub priority: String,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Default)]
pub struct IssueFilter {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub urgency: Option<u8>,
    pub assigned_to_me: Option<bool>,
    pub reported_by_me: Option<bool>,
}

#[derive(Deserialize, Default)]
pub struct TaskFilter {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to_me: Option<bool>,
}

#[derive(Deserialize, Default)]
pub struct UserFilter {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub role: Option<String>,
}

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
pub struct Store {
    accounts: HashMap<String, Account>,
    access_tokens: HashMap<String, String>,
    refresh_tokens: HashMap<String, String>,
    issues: HashMap<String, Issue>,
    comments: Vec<Comment>,
    votes: HashMap<(String, String), bool>,
    tasks: HashMap<String, Task>,
    next_tracking: u32,
}

pub type Db = Arc<RwLock<Store>>;

/// FastAPI-style error: status plus `{"detail": message}`.
#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self(status, detail.into())
    }

    fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }

    fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, detail)
    }

    fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "detail": self.1 }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// The account behind the request's bearer token.
pub struct CurrentUser(pub User);

impl CurrentUser {
    fn is_staff(&self) -> bool {
        matches!(self.0.role.as_str(), "staff" | "admin")
    }
}

impl FromRequestParts<Db> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, db: &Db) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Not authenticated"))?;
        let store = db.read().await;
        store
            .access_tokens
            .get(token)
            .and_then(|id| store.accounts.get(id))
            .filter(|account| account.user.is_active)
            .map(|account| CurrentUser(account.user.clone()))
            .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Could not validate credentials"))
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    let api = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/change-password", post(change_password))
        .route("/issues", get(list_issues).post(create_issue))
        .route("/issues/stats/overview", get(issue_stats))
        .route("/issues/{id}", get(get_issue).put(update_issue))
        .route("/issues/{id}/comments", get(list_comments).post(add_comment))
        .route("/issues/{id}/vote", post(vote_issue))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/stats/overview", get(task_stats))
        .route("/tasks/{id}", get(get_task).put(update_task))
        .route("/tasks/{id}/assign", post(assign_task))
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user).put(update_user));
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .with_state(db)
}

/// Router that answers 503 with a non-JSON body to everything.
pub fn unavailable() -> Router {
    Router::new().fallback(|| async { (StatusCode::SERVICE_UNAVAILABLE, "upstream unavailable") })
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "version": "1.0.0" }))
}

// --- auth ---

async fn register(State(db): State<Db>, Json(input): Json<RegisterRequest>) -> ApiResult<User> {
    let role = input.role.unwrap_or_else(|| "citizen".to_string());
    if !ROLES.contains(&role.as_str()) {
        return Err(ApiError::bad_request(format!("Invalid role: {role}")));
    }
    let mut store = db.write().await;
    if store.accounts.values().any(|a| a.user.email == input.email) {
        return Err(ApiError::bad_request("User with this email already exists"));
    }
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        email: input.email,
        phone: input.phone,
        role,
        points: 0,
        badge_count: 0,
        is_active: true,
        created_at: TIMESTAMP.to_string(),
        updated_at: TIMESTAMP.to_string(),
    };
    tracing::info!(user_id = %user.id, email = %user.email, "registered user");
    store.accounts.insert(
        user.id.clone(),
        Account {
            user: user.clone(),
            password: input.password,
        },
    );
    Ok(Json(user))
}

fn issue_tokens(store: &mut Store, user: &User) -> TokenResponse {
    let access_token = Uuid::new_v4().to_string();
    let refresh_token = Uuid::new_v4().to_string();
    store.access_tokens.insert(access_token.clone(), user.id.clone());
    store.refresh_tokens.insert(refresh_token.clone(), user.id.clone());
    TokenResponse {
        access_token,
        refresh_token,
        token_type: "bearer".to_string(),
        expires_in: 1800,
        user: user.clone(),
    }
}

async fn login(State(db): State<Db>, Json(input): Json<LoginRequest>) -> ApiResult<TokenResponse> {
    let mut store = db.write().await;
    let user = store
        .accounts
        .values()
        .find(|a| a.user.email == input.email && a.password == input.password)
        .map(|a| a.user.clone())
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Incorrect email or password"))?;
    if !user.is_active {
        return Err(ApiError::bad_request("Inactive user"));
    }
    Ok(Json(issue_tokens(&mut store, &user)))
}

async fn refresh(State(db): State<Db>, Json(input): Json<RefreshRequest>) -> ApiResult<TokenResponse> {
    let mut store = db.write().await;
    let user_id = store
        .refresh_tokens
        .remove(&input.refresh_token)
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Invalid refresh token"))?;
    let user = store
        .accounts
        .get(&user_id)
        .filter(|a| a.user.is_active)
        .map(|a| a.user.clone())
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "User not found or inactive"))?;
    Ok(Json(issue_tokens(&mut store, &user)))
}

async fn logout(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<RefreshRequest>,
) -> ApiResult<Value> {
    let mut store = db.write().await;
    if store.refresh_tokens.get(&input.refresh_token) == Some(&user.id) {
        store.refresh_tokens.remove(&input.refresh_token);
    }
    Ok(Json(json!({ "message": "Successfully logged out" })))
}

async fn change_password(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<ChangePasswordRequest>,
) -> ApiResult<Value> {
    let mut store = db.write().await;
    let account = store
        .accounts
        .get_mut(&user.id)
        .ok_or_else(|| ApiError::not_found("User"))?;
    if account.password != input.current_password {
        return Err(ApiError::bad_request("Current password is incorrect"));
    }
    account.password = input.new_password;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}

// --- issues ---

fn page<T>(items: Vec<T>, skip: Option<usize>, limit: Option<usize>) -> Vec<T> {
    items
        .into_iter()
        .skip(skip.unwrap_or(0))
        .take(limit.unwrap_or(100))
        .collect()
}

async fn list_issues(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<IssueFilter>,
) -> ApiResult<Vec<Issue>> {
    let store = db.read().await;
    let mut issues: Vec<Issue> = store
        .issues
        .values()
        .filter(|i| filter.category.as_ref().map_or(true, |c| &i.category == c))
        .filter(|i| filter.status.as_ref().map_or(true, |s| &i.status == s))
        .filter(|i| filter.urgency.map_or(true, |u| i.urgency == u))
        .filter(|i| !filter.assigned_to_me.unwrap_or(false) || i.assignee_id.as_ref() == Some(&user.id))
        .filter(|i| !filter.reported_by_me.unwrap_or(false) || i.reporter_id == user.id)
        .cloned()
        .collect();
    issues.sort_by(|a, b| a.tracking_id.cmp(&b.tracking_id));
    Ok(Json(page(issues, filter.skip, filter.limit)))
}

async fn create_issue(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateIssue>,
) -> ApiResult<Issue> {
    if !ISSUE_CATEGORIES.contains(&input.category.as_str()) {
        return Err(ApiError::bad_request(format!("Invalid category: {}", input.category)));
    }
    if !(1..=5).contains(&input.urgency) {
        return Err(ApiError::bad_request("Urgency must be between 1 and 5"));
    }
    let mut store = db.write().await;
    store.next_tracking += 1;
    let issue = Issue {
        id: Uuid::new_v4().to_string(),
        title: input.title,
        description: input.description,
        category: input.category,
        urgency: input.urgency,
        status: "pending".to_string(),
        latitude: input.latitude,
        longitude: input.longitude,
        address: input.address,
        images: input.images,
        audio_note: input.audio_note,
        tracking_id: format!("CIV-{:06}", store.next_tracking),
        reporter_id: user.id,
        assignee_id: None,
        reported_at: TIMESTAMP.to_string(),
        updated_at: TIMESTAMP.to_string(),
        upvotes: 0,
        downvotes: 0,
        comments_count: 0,
    };
    store.issues.insert(issue.id.clone(), issue.clone());
    Ok(Json(issue))
}

async fn get_issue(
    State(db): State<Db>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let store = db.read().await;
    let issue = store.issues.get(&id).ok_or_else(|| ApiError::not_found("Issue"))?;
    let comments: Vec<&Comment> = store.comments.iter().filter(|c| c.issue_id == id).collect();
    let mut detail = serde_json::to_value(issue).map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    detail["comments"] = json!(comments);
    Ok(Json(detail))
}

async fn update_issue(
    State(db): State<Db>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<UpdateIssue>,
) -> ApiResult<Issue> {
    let staff = current.is_staff();
    let mut store = db.write().await;
    let issue = store.issues.get_mut(&id).ok_or_else(|| ApiError::not_found("Issue"))?;
    if !staff && issue.reporter_id != current.0.id {
        return Err(ApiError::forbidden("Not authorized to update this issue"));
    }
    if input.assignee_id.is_some() && !staff {
        return Err(ApiError::forbidden("Not authorized to assign issues"));
    }
    if let Some(status) = &input.status {
        if !ISSUE_STATUSES.contains(&status.as_str()) {
            return Err(ApiError::bad_request(format!("Invalid status: {status}")));
        }
    }
    if let Some(title) = input.title {
        issue.title = title;
    }
    if let Some(description) = input.description {
        issue.description = description;
    }
    if let Some(category) = input.category {
        issue.category = category;
    }
    if let Some(urgency) = input.urgency {
        issue.urgency = urgency;
    }
    if let Some(status) = input.status {
        issue.status = status;
    }
    if let Some(address) = input.address {
        issue.address = address;
    }
    if let Some(assignee_id) = input.assignee_id {
        issue.assignee_id = Some(assignee_id);
    }
    Ok(Json(issue.clone()))
}

async fn list_comments(
    State(db): State<Db>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Vec<Comment>> {
    let store = db.read().await;
    if !store.issues.contains_key(&id) {
        return Err(ApiError::not_found("Issue"));
    }
    Ok(Json(store.comments.iter().filter(|c| c.issue_id == id).cloned().collect()))
}

async fn add_comment(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<NewComment>,
) -> ApiResult<Comment> {
    if input.text.trim().is_empty() {
        return Err(ApiError::bad_request("Comment text must not be empty"));
    }
    let mut store = db.write().await;
    let issue = store.issues.get_mut(&id).ok_or_else(|| ApiError::not_found("Issue"))?;
    issue.comments_count += 1;
    let comment = Comment {
        id: Uuid::new_v4().to_string(),
        text: input.text,
        author_id: user.id,
        author_name: user.name,
        issue_id: id,
        created_at: TIMESTAMP.to_string(),
    };
    store.comments.push(comment.clone());
    Ok(Json(comment))
}

async fn vote_issue(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<VoteRequest>,
) -> ApiResult<Value> {
    let mut store = db.write().await;
    if !store.issues.contains_key(&id) {
        return Err(ApiError::not_found("Issue"));
    }
    store.votes.insert((id.clone(), user.id), input.is_upvote);
    let (up, down) = store
        .votes
        .iter()
        .filter(|((issue_id, _), _)| *issue_id == id)
        .fold((0, 0), |(up, down), (_, &is_up)| if is_up { (up + 1, down) } else { (up, down + 1) });
    if let Some(issue) = store.issues.get_mut(&id) {
        issue.upvotes = up;
        issue.downvotes = down;
    }
    Ok(Json(json!({ "message": "Vote recorded", "upvotes": up, "downvotes": down })))
}

fn count_by<'a>(values: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for value in values {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts
}

async fn issue_stats(State(db): State<Db>, _user: CurrentUser) -> ApiResult<Value> {
    let store = db.read().await;
    Ok(Json(json!({
        "total_issues": store.issues.len(),
        "by_status": count_by(store.issues.values().map(|i| i.status.as_str())),
        "by_category": count_by(store.issues.values().map(|i| i.category.as_str())),
    })))
}

// --- tasks ---

fn fieldworker(store: &Store, user_id: &str) -> Result<(), ApiError> {
    match store.accounts.get(user_id) {
        Some(account) if account.user.role == "fieldworker" => Ok(()),
        _ => Err(ApiError::bad_request("Invalid assignee - must be a fieldworker")),
    }
}

async fn list_tasks(
    State(db): State<Db>,
    current: CurrentUser,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<Vec<Task>> {
    let store = db.read().await;
    // Field workers only ever see their own tasks.
    let only_mine = filter.assigned_to_me.unwrap_or(false) || current.0.role == "fieldworker";
    let mut tasks: Vec<Task> = store
        .tasks
        .values()
        .filter(|t| filter.status.as_ref().map_or(true, |s| &t.status == s))
        .filter(|t| filter.priority.as_ref().map_or(true, |p| &t.priority == p))
        .filter(|t| !only_mine || t.assignee_id == current.0.id)
        .cloned()
        .collect();
    tasks.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
    Ok(Json(page(tasks, filter.skip, filter.limit)))
}

async fn create_task(
    State(db): State<Db>,
    current: CurrentUser,
    Json(input): Json<CreateTask>,
) -> ApiResult<Task> {
    if !current.is_staff() {
        return Err(ApiError::forbidden("Not authorized to create tasks"));
    }
    if !TASK_PRIORITIES.contains(&input.priority.as_str()) {
        return Err(ApiError::bad_request(format!("Invalid priority: {}", input.priority)));
    }
    let mut store = db.write().await;
    if !store.issues.contains_key(&input.issue_id) {
        return Err(ApiError::not_found("Issue"));
    }
    if store.tasks.values().any(|t| t.issue_id == input.issue_id) {
        return Err(ApiError::bad_request("Task already exists for this issue"));
    }
    fieldworker(&store, &input.assignee_id)?;

    let task = Task {
        id: Uuid::new_v4().to_string(),
        title: input.title,
        description: input.description,
        priority: input.priority,
        status: "new".to_string(),
        latitude: input.latitude,
        longitude: input.longitude,
        address: input.address,
        category: input.category,
        images: input.images,
        assigned_at: TIMESTAMP.to_string(),
        due_date: input.due_date,
        issue_id: input.issue_id,
        assignee_id: input.assignee_id,
    };
    if let Some(issue) = store.issues.get_mut(&task.issue_id) {
        issue.status = "assigned".to_string();
        issue.assignee_id = Some(task.assignee_id.clone());
    }
    store.tasks.insert(task.id.clone(), task.clone());
    Ok(Json(task))
}

async fn get_task(
    State(db): State<Db>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Task> {
    let store = db.read().await;
    let task = store.tasks.get(&id).ok_or_else(|| ApiError::not_found("Task"))?;
    if !current.is_staff() && task.assignee_id != current.0.id {
        return Err(ApiError::forbidden("Not authorized to view this task"));
    }
    Ok(Json(task.clone()))
}

async fn update_task(
    State(db): State<Db>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<UpdateTask>,
) -> ApiResult<Task> {
    let staff = current.is_staff();
    let mut store = db.write().await;
    let task = store.tasks.get_mut(&id).ok_or_else(|| ApiError::not_found("Task"))?;
    if !staff && task.assignee_id != current.0.id {
        return Err(ApiError::forbidden("Not authorized to update this task"));
    }
    if !staff {
        for (field, set) in [("priority", input.priority.is_some()), ("due_date", input.due_date.is_some())] {
            if set {
                return Err(ApiError::forbidden(format!(
                    "Field '{field}' cannot be updated by fieldworkers"
                )));
            }
        }
    }
    if let Some(status) = &input.status {
        if !TASK_STATUSES.contains(&status.as_str()) {
            return Err(ApiError::bad_request(format!("Invalid status: {status}")));
        }
    }
    if let Some(priority) = &input.priority {
        if !TASK_PRIORITIES.contains(&priority.as_str()) {
            return Err(ApiError::bad_request(format!("Invalid priority: {priority}")));
        }
    }
    if let Some(status) = input.status {
        task.status = status;
    }
    if let Some(priority) = input.priority {
        task.priority = priority;
    }
    if let Some(due_date) = input.due_date {
        task.due_date = due_date;
    }
    if let Some(images) = input.images {
        task.images = images;
    }
    let task = task.clone();

    // Task progress drives the issue the citizen sees.
    let issue_status = match task.status.as_str() {
        "in_progress" => Some("in_progress"),
        "completed" => Some("resolved"),
        _ => None,
    };
    if let (Some(status), Some(issue)) = (issue_status, store.issues.get_mut(&task.issue_id)) {
        issue.status = status.to_string();
    }
    Ok(Json(task))
}

async fn assign_task(
    State(db): State<Db>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<AssignTask>,
) -> ApiResult<Task> {
    if !current.is_staff() {
        return Err(ApiError::forbidden("Not authorized to assign tasks"));
    }
    if !TASK_PRIORITIES.contains(&input.priority.as_str()) {
        return Err(ApiError::bad_request(format!("Invalid priority: {}", input.priority)));
    }
    let mut store = db.write().await;
    if !store.tasks.contains_key(&id) {
        return Err(ApiError::not_found("Task"));
    }
    fieldworker(&store, &input.assignee_id)?;
    let task = store.tasks.get_mut(&id).ok_or_else(|| ApiError::not_found("Task"))?;
    task.assignee_id = input.assignee_id;
    task.due_date = input.due_date;
    task.priority = input.priority;
    task.status = "new".to_string();
    let task = task.clone();
    if let Some(issue) = store.issues.get_mut(&task.issue_id) {
        issue.assignee_id = Some(task.assignee_id.clone());
    }
    Ok(Json(task))
}

async fn task_stats(State(db): State<Db>, _user: CurrentUser) -> ApiResult<Value> {
    let store = db.read().await;
    Ok(Json(json!({
        "total_tasks": store.tasks.len(),
        "by_status": count_by(store.tasks.values().map(|t| t.status.as_str())),
        "by_priority": count_by(store.tasks.values().map(|t| t.priority.as_str())),
    })))
}

// --- users ---

async fn list_users(
    State(db): State<Db>,
    _user: CurrentUser,
    Query(filter): Query<UserFilter>,
) -> ApiResult<Vec<User>> {
    let store = db.read().await;
    let mut users: Vec<User> = store
        .accounts
        .values()
        .map(|a| a.user.clone())
        .filter(|u| filter.role.as_ref().map_or(true, |r| &u.role == r))
        .collect();
    users.sort_by(|a, b| a.email.cmp(&b.email));
    Ok(Json(page(users, filter.skip, filter.limit)))
}

async fn get_user(
    State(db): State<Db>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<User> {
    let store = db.read().await;
    store
        .accounts
        .get(&id)
        .map(|a| Json(a.user.clone()))
        .ok_or_else(|| ApiError::not_found("User"))
}

async fn update_user(
    State(db): State<Db>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<UpdateUser>,
) -> ApiResult<User> {
    let admin = current.0.role == "admin";
    if !admin && current.0.id != id {
        return Err(ApiError::forbidden("Not authorized to update this user"));
    }
    if !admin && (input.role.is_some() || input.is_active.is_some()) {
        return Err(ApiError::forbidden("Only admins can change role or status"));
    }
    if let Some(role) = &input.role {
        if !ROLES.contains(&role.as_str()) {
            return Err(ApiError::bad_request(format!("Invalid role: {role}")));
        }
    }
    let mut store = db.write().await;
    let account = store.accounts.get_mut(&id).ok_or_else(|| ApiError::not_found("User"))?;
    let user = &mut account.user;
    if let Some(name) = input.name {
        user.name = name;
    }
    if let Some(phone) = input.phone {
        user.phone = Some(phone);
    }
    if let Some(role) = input.role {
        user.role = role;
    }
    if let Some(is_active) = input.is_active {
        user.is_active = is_active;
    }
    Ok(Json(user.clone()))
}
