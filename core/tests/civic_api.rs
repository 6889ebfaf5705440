//! Typed operations end to end against the mock civic API.

use std::sync::Arc;

use civic_client::{
    ApiResponse, ChangePassword, CivicApi, ClientConfig, CreateIssue, CreateTask, FileTokenStore,
    IssueCategory, IssueQuery, IssueStatus, LoginRequest, MemoryTokenStore, NewComment, NoTokens,
    RegisterRequest, ResilientClient, Role, TaskPriority, TaskQuery, TaskStatus, TokenResponse,
    TokenStore, UpdateTask, UpdateUser, Vote,
};

mod common;

fn api(base: &str, tokens: Arc<dyn TokenStore>) -> CivicApi {
    let config = ClientConfig::new(base).with_timeout_ms(2_000);
    CivicApi::new(ResilientClient::from_config(&config, tokens))
}

async fn sign_up(base: &str, name: &str, role: Role) -> TokenResponse {
    let anonymous = api(base, Arc::new(NoTokens));
    let email = format!("{name}@example.com");
    let user = anonymous
        .register(&RegisterRequest {
            name: name.to_string(),
            email: email.clone(),
            password: "secret1".to_string(),
            phone: None,
            role: Some(role),
        })
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(user.role, role);

    anonymous
        .login(&LoginRequest { email, password: "secret1".to_string() })
        .await
        .unwrap()
        .into_result()
        .unwrap()
}

async fn session_api(base: &str, session: &TokenResponse) -> (CivicApi, Arc<MemoryTokenStore>) {
    let tokens = Arc::new(MemoryTokenStore::new());
    tokens.save_session(session).await;
    (api(base, tokens.clone()), tokens)
}

fn pothole() -> CreateIssue {
    CreateIssue {
        title: "Pothole near school".to_string(),
        description: "Large pothole at the school gate".to_string(),
        category: IssueCategory::Pothole,
        urgency: 4,
        latitude: 12.97,
        longitude: 77.59,
        address: "School Road".to_string(),
        images: Vec::new(),
        audio_note: None,
    }
}

#[tokio::test]
async fn health_through_the_facade() {
    let base = common::start_mock().await;
    let health = api(&base, Arc::new(NoTokens))
        .check_health()
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(health.status, "healthy");
}

#[tokio::test]
async fn bad_credentials_surface_the_server_detail() {
    let base = common::start_mock().await;
    let resp = api(&base, Arc::new(NoTokens))
        .login(&LoginRequest {
            email: "nobody@example.com".to_string(),
            password: "nope".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(resp, ApiResponse::Error("Incorrect email or password".to_string()));
}

#[tokio::test]
async fn citizen_reports_comments_and_votes() {
    let base = common::start_mock().await;
    let session = sign_up(&base, "asha", Role::Citizen).await;
    let (citizen, _) = session_api(&base, &session).await;

    let issue = citizen.create_issue(&pothole()).await.unwrap().into_result().unwrap();
    assert_eq!(issue.status, IssueStatus::Pending);
    assert_eq!(issue.reporter_id, session.user.id);

    let comment = citizen
        .add_comment(&issue.id, &NewComment { text: "Still there".to_string() })
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(comment.author_name.as_deref(), Some("asha"));

    let vote = citizen
        .vote_issue(&issue.id, Vote { is_upvote: true })
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(vote["upvotes"], 1);

    let comments = citizen.issue_comments(&issue.id).await.unwrap().into_result().unwrap();
    assert_eq!(comments.len(), 1);

    let mine = citizen
        .list_issues(&IssueQuery {
            reported_by_me: Some(true),
            category: Some(IssueCategory::Pothole),
            ..IssueQuery::default()
        })
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].upvotes, 1);

    let resolved = citizen
        .list_issues(&IssueQuery { status: Some(IssueStatus::Resolved), ..IssueQuery::default() })
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert!(resolved.is_empty());

    let missing = citizen.get_issue("missing").await.unwrap();
    assert_eq!(missing, ApiResponse::Error("Issue not found".to_string()));
}

#[tokio::test]
async fn completed_task_resolves_the_issue() {
    let base = common::start_mock().await;
    let citizen_session = sign_up(&base, "asha", Role::Citizen).await;
    let staff_session = sign_up(&base, "sunil", Role::Staff).await;
    let worker_session = sign_up(&base, "ravi", Role::Fieldworker).await;
    let (citizen, _) = session_api(&base, &citizen_session).await;
    let (staff, _) = session_api(&base, &staff_session).await;
    let (worker, _) = session_api(&base, &worker_session).await;

    let issue = citizen.create_issue(&pothole()).await.unwrap().into_result().unwrap();
    let task = staff
        .create_task(&CreateTask {
            title: "Fill pothole".to_string(),
            description: "Cold patch the school gate pothole".to_string(),
            priority: TaskPriority::High,
            latitude: issue.latitude,
            longitude: issue.longitude,
            address: issue.address.clone(),
            category: issue.category.as_str().to_string(),
            images: Vec::new(),
            due_date: "2024-01-05T00:00:00Z".to_string(),
            issue_id: issue.id.clone(),
            assignee_id: worker_session.user.id.clone(),
        })
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(task.status, TaskStatus::New);

    let assigned = worker.list_tasks(&TaskQuery::default()).await.unwrap().into_result().unwrap();
    assert_eq!(assigned.len(), 1);

    let denied = worker
        .update_task(
            &task.id,
            &UpdateTask { priority: Some(TaskPriority::Low), ..UpdateTask::default() },
        )
        .await
        .unwrap();
    assert_eq!(
        denied,
        ApiResponse::Error("Field 'priority' cannot be updated by fieldworkers".to_string())
    );

    let done = worker
        .update_task(
            &task.id,
            &UpdateTask { status: Some(TaskStatus::Completed), ..UpdateTask::default() },
        )
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(done.status, TaskStatus::Completed);

    let issue = citizen.get_issue(&issue.id).await.unwrap().into_result().unwrap();
    assert_eq!(issue.status, IssueStatus::Resolved);

    let stats = staff.task_stats().await.unwrap().into_result().unwrap();
    assert!(stats.is_object());
}

#[tokio::test]
async fn profile_and_password_updates() {
    let base = common::start_mock().await;
    let session = sign_up(&base, "meera", Role::Citizen).await;
    let (me, _) = session_api(&base, &session).await;

    let updated = me
        .update_user(
            &session.user.id,
            &UpdateUser { name: Some("Meera K".to_string()), ..UpdateUser::default() },
        )
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(updated.name, "Meera K");

    let changed = me
        .change_password(&ChangePassword {
            current_password: "secret1".to_string(),
            new_password: "secret2".to_string(),
        })
        .await
        .unwrap();
    assert!(changed.is_data(), "{changed:?}");

    let relogin = api(&base, Arc::new(NoTokens))
        .login(&LoginRequest {
            email: "meera@example.com".to_string(),
            password: "secret2".to_string(),
        })
        .await
        .unwrap();
    assert!(relogin.is_data());
}

#[tokio::test]
async fn logout_revokes_the_refresh_token() {
    let base = common::start_mock().await;
    let session = sign_up(&base, "kiran", Role::Citizen).await;
    let (me, tokens) = session_api(&base, &session).await;

    let resp = me.logout().await.unwrap();
    assert!(resp.is_data(), "{resp:?}");
    tokens.clear().await;

    let reuse = me.refresh_token(&session.refresh_token).await.unwrap();
    assert!(reuse.is_error());
}

#[tokio::test]
async fn logout_without_a_session_makes_no_request() {
    // Nothing listens here; a request would come back as an error envelope.
    let me = api(&common::closed_port(), Arc::new(NoTokens));
    let resp = me.logout().await.unwrap();
    assert!(resp.is_data());
}

#[tokio::test]
async fn file_backed_session_authenticates_requests() {
    let base = common::start_mock().await;
    let session = sign_up(&base, "devi", Role::Citizen).await;

    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(dir.path().join("session.json"));
    store.save_session(&session).await.unwrap();

    let me = api(&base, Arc::new(FileTokenStore::new(store.path())));
    let user = me.get_user(&session.user.id).await.unwrap().into_result().unwrap();
    assert_eq!(user.email, "devi@example.com");
}
