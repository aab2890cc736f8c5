//! Database schema definitions using SurrealQL.

use crate::{DbError, get_db};

/// Initialize the database schema.
///
/// This creates all necessary tables, fields, and indexes.
pub async fn init_schema() -> Result<(), DbError> {
    let db = get_db()?;

    tracing::info!("Initializing database schema...");

    db.query(GROUP_FLAG_SCHEMA).await?;
    db.query(JOB_FLAG_SCHEMA).await?;

    tracing::info!("Database schema initialized");

    Ok(())
}

/// Group flag table schema.
///
/// Every field is optional: rows written before message, actor and
/// timestamp existed must still load.
const GROUP_FLAG_SCHEMA: &str = r#"
-- One row per blocked group, keyed by group id
DEFINE TABLE IF NOT EXISTS group_flag SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS message ON group_flag TYPE option<string>;
DEFINE FIELD IF NOT EXISTS actor ON group_flag TYPE option<string>;
DEFINE FIELD IF NOT EXISTS timestamp_ns ON group_flag TYPE option<int>;

DEFINE INDEX IF NOT EXISTS group_flag_actor ON group_flag FIELDS actor;
"#;

/// Job flag table schema.
const JOB_FLAG_SCHEMA: &str = r#"
-- One row per blocked job, keyed by job id
DEFINE TABLE IF NOT EXISTS job_flag SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS message ON job_flag TYPE option<string>;
DEFINE FIELD IF NOT EXISTS actor ON job_flag TYPE option<string>;
DEFINE FIELD IF NOT EXISTS timestamp_ns ON job_flag TYPE option<int>;
"#;
