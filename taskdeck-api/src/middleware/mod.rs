/// Middleware modules for the API server
///
/// - `security`: response security headers
///
/// Authentication lives in `app::session_auth_layer` because it needs the
/// application state.

pub mod security;
