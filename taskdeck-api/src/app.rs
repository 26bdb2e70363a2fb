/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskdeck_api::{app::AppState, config::Config};
/// use taskdeck_shared::notify::QueuedNotifier;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let (notifier, _rx) = QueuedNotifier::new(config.notify.queue_capacity);
/// let state = AppState::new(pool, config, Arc::new(notifier));
/// let app = taskdeck_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::{Config, NotifyConfig},
    error::ApiError,
    middleware::security::SecurityHeadersLayer,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use taskdeck_shared::{
    auth::middleware::{token_identity, AuthContext, AuthError},
    models::session::Session,
    notify::{
        transport::{LogTransport, NotificationTransport, NotifyError, WebhookTransport},
        EventKind, EventSink, Notification,
    },
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Webhook request timeout
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Lifecycle notification sink
    pub notifier: Arc<dyn EventSink>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, notifier: Arc<dyn EventSink>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            notifier,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Access token lifetime
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.config.jwt.ttl_hours)
    }

    /// Emits a notification; never blocks or fails the request
    pub fn notify(&self, kind: EventKind, user_id: i64, payload: serde_json::Value) {
        self.notifier.emit(Notification::new(kind, user_id, payload));
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET    /health                              # public
/// ├── POST   /signup                              # public
/// ├── POST   /login                               # public
/// └── (bearer token)
///     ├── POST   /logout
///     ├── GET    /user
///     ├── POST   /activate-premium
///     ├── GET    /tasks            POST /tasks
///     ├── PUT    /tasks/reorder
///     ├── GET    /tasks/priority
///     ├── PUT    /tasks/:id        DELETE /tasks/:id
///     ├── GET    /folders          POST /folders
///     ├── GET    /folders/:id      DELETE /folders/:id
///     ├── GET    /folders/:id/tasks
///     ├── POST   /folders/:id/add-task
///     ├── DELETE /folders/:id/remove-task/:task_id
///     └── PUT    /folders/:id/reorder-tasks
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Session authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route("/user", get(routes::user::current_user))
        .route("/activate-premium", post(routes::user::activate_premium))
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/tasks/reorder", put(routes::tasks::reorder_tasks))
        .route("/tasks/priority", get(routes::tasks::priority_tasks))
        .route(
            "/tasks/:id",
            put(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .route(
            "/folders",
            get(routes::folders::list_folders).post(routes::folders::create_folder),
        )
        .route(
            "/folders/:id",
            get(routes::folders::show_folder).delete(routes::folders::delete_folder),
        )
        .route("/folders/:id/tasks", get(routes::folders::folder_tasks))
        .route("/folders/:id/add-task", post(routes::folders::add_task))
        .route(
            "/folders/:id/remove-task/:task_id",
            delete(routes::folders::remove_task),
        )
        .route(
            "/folders/:id/reorder-tasks",
            put(routes::folders::reorder_folder_tasks),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// Session authentication middleware layer
///
/// Validates the bearer token, resolves its session (rejecting revoked ones)
/// and injects the [`AuthContext`] into request extensions.
async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (user_id, session_id) = token_identity(req.headers(), state.jwt_secret())?;

    let principal = Session::authenticate(&state.db, session_id, user_id)
        .await?
        .ok_or(AuthError::SessionRevoked)?;

    req.extensions_mut()
        .insert(AuthContext::from_session(session_id, principal));

    Ok(next.run(req).await)
}

/// Picks the notification transport for the configuration
///
/// A webhook URL selects [`WebhookTransport`]; otherwise notifications are
/// written to the log.
pub fn notification_transport(
    config: &NotifyConfig,
) -> Result<Arc<dyn NotificationTransport>, NotifyError> {
    match config.webhook_url.as_deref() {
        Some(url) => Ok(Arc::new(WebhookTransport::new(
            url,
            config.webhook_secret.as_deref(),
            WEBHOOK_TIMEOUT,
        )?)),
        None => Ok(Arc::new(LogTransport)),
    }
}
