/// Authentication and authorization
///
/// - [`password`]: Argon2id password hashing and signup rules
/// - [`jwt`]: HS256 access tokens bound to a session
/// - [`middleware`]: request `AuthContext` and bearer token parsing
/// - [`authorization`]: ownership checks and premium feature gates

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
