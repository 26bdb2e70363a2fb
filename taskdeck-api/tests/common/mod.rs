/// Common test utilities for integration tests
///
/// - Test database setup (skipped when `DATABASE_URL` is unset)
/// - Test user creation with a live session and token
/// - Request helpers that call the router through `tower::Service`

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use sqlx::PgPool;
use taskdeck_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, DatabaseConfig, JwtConfig, NotifyConfig},
};
use taskdeck_shared::{
    auth::jwt::{create_token, Claims},
    db::migrations::run_migrations,
    models::{
        session::Session,
        user::{CreateUser, User},
    },
    notify::{Notification, QueuedNotifier},
};
use tokio::sync::mpsc;
use tower::Service as _;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub notifications: mpsc::Receiver<Notification>,
    users: Vec<i64>,
}

/// A user with a bearer token for a live session
pub struct TestUser {
    pub user: User,
    pub token: String,
}

pub fn test_config(database_url: &str) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: database_url.to_string(),
            max_connections: 5,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            ttl_hours: 1,
        },
        notify: NotifyConfig::default(),
        run_migrations: true,
    }
}

impl TestContext {
    /// Connects to `DATABASE_URL` and builds the app
    ///
    /// Returns `None` (and prints a notice) when no database is configured.
    pub async fn new() -> anyhow::Result<Option<Self>> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping database-backed test");
            return Ok(None);
        };

        let config = test_config(&database_url);
        let db = PgPool::connect(&config.database.url).await?;
        run_migrations(&db).await?;

        let (notifier, notifications) = QueuedNotifier::new(64);
        let state = AppState::new(db.clone(), config.clone(), Arc::new(notifier));
        let app = build_router(state);

        Ok(Some(TestContext {
            db,
            app,
            config,
            notifications,
            users: Vec::new(),
        }))
    }

    /// Creates a user with a session; deleted again by `cleanup`
    pub async fn create_user(&mut self, premium: bool) -> anyhow::Result<TestUser> {
        let mut user = User::create(
            &self.db,
            CreateUser {
                name: "Test User".to_string(),
                email: format!("test-{}@example.com", Uuid::new_v4()),
                password_hash: "test_hash".to_string(),
            },
        )
        .await?;

        if premium {
            user = User::set_premium(&self.db, user.id, true)
                .await?
                .ok_or_else(|| anyhow::anyhow!("user vanished"))?;
        }

        let session = Session::create(&self.db, user.id).await?;
        let claims = Claims::new(user.id, session.id, chrono::Duration::hours(1));
        let token = create_token(&claims, &self.config.jwt.secret)?;

        self.users.push(user.id);
        Ok(TestUser { user, token })
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// An empty body is returned as `Value::Null`.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, json)
    }

    /// Creates a task through the API and returns its id
    pub async fn create_task(&self, token: &str, title: &str) -> i64 {
        let (status, body) = self
            .send("POST", "/tasks", Some(token), Some(serde_json::json!({ "title": title })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {}", body);
        body["id"].as_i64().unwrap()
    }

    /// Titles of a list response, in response order
    pub fn titles(body: &Value) -> Vec<String> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap().to_string())
            .collect()
    }

    /// Deletes every user created by this context (cascades to their data)
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        for id in &self.users {
            User::delete(&self.db, *id).await?;
        }
        Ok(())
    }
}
