/// Database infrastructure
///
/// - `pool`: PostgreSQL connection pool management
/// - `migrations`: embedded forward migrations

pub mod migrations;
pub mod pool;
