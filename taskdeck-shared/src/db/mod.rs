/// Database layer
///
/// - `pool`: connection pool with health checks
/// - `migrations`: embedded schema migrations
///
/// Models are in the `models` module at crate root level.

pub mod migrations;
pub mod pool;
