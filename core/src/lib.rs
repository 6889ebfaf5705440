//! Resilient JSON-over-HTTP client for the civic reporting backend.
//!
//! # Overview
//! Every call is tried against the current primary base URL and then, on
//! any failure, against each fallback in turn. The first success wins and,
//! when it came from a fallback, that URL becomes the primary for later
//! calls. Results come back as an `ApiResponse` envelope: either the decoded
//! data or a human-readable error, never a panic or an `Err` for network or
//! HTTP trouble.
//!
//! # Design
//! - `EndpointSet` holds the candidates and an atomic current-primary index.
//! - `Transport` performs one round-trip; `ReqwestTransport` in production,
//!   scripted fakes in tests.
//! - `TokenStore` is injected and only read; the session owner writes it.
//! - `CivicApi` layers typed operations (auth, issues, tasks, users, health)
//!   on top of `ResilientClient`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod http;
pub mod token;
pub mod transport;
pub mod types;

pub use api::{ApiResult, CivicApi, IssueQuery, TaskQuery, UserQuery};
pub use client::{ResilientClient, API_PREFIX, DEFAULT_TIMEOUT};
pub use config::{BuildMode, ClientConfig, Platform};
pub use endpoints::EndpointSet;
pub use envelope::ApiResponse;
pub use error::{AttemptError, ConfigError, RequestError, TokenStoreError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use token::{FileTokenStore, MemoryTokenStore, NoTokens, TokenStore};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    AssignTask, ChangePassword, Comment, CreateIssue, CreateTask, Health, Issue, IssueCategory,
    IssueStatus, LoginRequest, NewComment, RegisterRequest, Role, Task, TaskPriority, TaskStatus,
    TokenResponse, UpdateIssue, UpdateTask, UpdateUser, User, Vote,
};
