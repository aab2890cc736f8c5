//! Flag repository for persisting group and job blocks.

use block_core::{BlockFlag, FlagSnapshot, GroupId, JobId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::{DbError, get_db};

const GROUP_TABLE: &str = "group_flag";
const JOB_TABLE: &str = "job_flag";

/// Repository for flag persistence operations.
pub struct FlagRepository;

/// Internal record type for SurrealDB reads.
///
/// Every field is optional so that rows written by older versions, which
/// lacked message, actor and timestamp, still load.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FlagRecord {
    id: Option<Thing>,
    message: Option<String>,
    actor: Option<String>,
    timestamp_ns: Option<i64>,
}

impl FlagRecord {
    fn key(&self) -> Option<String> {
        self.id.as_ref().map(|t| t.id.to_raw())
    }

    fn into_flag(self) -> BlockFlag {
        let timestamp = self
            .timestamp_ns
            .map(DateTime::<Utc>::from_timestamp_nanos)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        BlockFlag::restore(
            self.message.unwrap_or_default(),
            self.actor.unwrap_or_default(),
            timestamp,
        )
    }
}

/// Struct for writing flags - always writes the complete, current format.
///
/// The timestamp is kept as integer nanoseconds so a reloaded flag is equal
/// to the one that was saved.
#[derive(Debug, Clone, Serialize)]
struct FlagWrite {
    message: String,
    actor: String,
    timestamp_ns: i64,
}

impl TryFrom<&BlockFlag> for FlagWrite {
    type Error = DbError;

    fn try_from(flag: &BlockFlag) -> Result<Self, Self::Error> {
        let timestamp_ns = flag.timestamp().timestamp_nanos_opt().ok_or_else(|| {
            DbError::Serialization(format!(
                "Flag timestamp {} is outside the storable range",
                flag.timestamp()
            ))
        })?;

        Ok(Self {
            message: flag.message().to_string(),
            actor: flag.actor().to_string(),
            timestamp_ns,
        })
    }
}

async fn upsert(table: &'static str, key: String, flag: &BlockFlag) -> Result<BlockFlag, DbError> {
    let db = get_db()?;
    let data = FlagWrite::try_from(flag)?;

    let mut result = db
        .query("UPSERT type::thing($table, $id) CONTENT $data RETURN AFTER")
        .bind(("table", table))
        .bind(("id", key.clone()))
        .bind(("data", data))
        .await?;

    let records: Vec<FlagRecord> = result.take(0)?;

    records
        .into_iter()
        .next()
        .map(FlagRecord::into_flag)
        .ok_or_else(|| DbError::Query(format!("Failed to save {} {}", table, key)))
}

async fn select(table: &'static str, key: String) -> Result<Option<BlockFlag>, DbError> {
    let db = get_db()?;

    let record: Option<FlagRecord> = db.select((table, key)).await?;

    Ok(record.map(FlagRecord::into_flag))
}

async fn delete(table: &'static str, key: String) -> Result<bool, DbError> {
    let db = get_db()?;

    let record: Option<FlagRecord> = db.delete((table, key)).await?;

    Ok(record.is_some())
}

async fn select_all<K>(
    table: &'static str,
    parse: impl Fn(&str) -> Result<K, ulid::DecodeError>,
) -> Result<Vec<(K, BlockFlag)>, DbError> {
    let db = get_db()?;

    let records: Vec<FlagRecord> = db.select(table).await?;

    let mut flags = Vec::with_capacity(records.len());
    for record in records {
        let key = record.key().unwrap_or_default();
        match parse(&key) {
            Ok(id) => flags.push((id, record.into_flag())),
            Err(e) => tracing::warn!("Skipping {} row with bad id '{}': {}", table, key, e),
        }
    }
    Ok(flags)
}

impl FlagRepository {
    /// Create or replace a group's flag.
    pub async fn save_group_flag(group: GroupId, flag: &BlockFlag) -> Result<BlockFlag, DbError> {
        upsert(GROUP_TABLE, group.to_string(), flag).await
    }

    /// Get a group's flag.
    pub async fn get_group_flag(group: GroupId) -> Result<Option<BlockFlag>, DbError> {
        select(GROUP_TABLE, group.to_string()).await
    }

    /// Delete a group's flag. Returns whether a row existed.
    pub async fn delete_group_flag(group: GroupId) -> Result<bool, DbError> {
        delete(GROUP_TABLE, group.to_string()).await
    }

    /// Create or replace a job's flag.
    pub async fn save_job_flag(job: JobId, flag: &BlockFlag) -> Result<BlockFlag, DbError> {
        upsert(JOB_TABLE, job.to_string(), flag).await
    }

    /// Get a job's flag.
    pub async fn get_job_flag(job: JobId) -> Result<Option<BlockFlag>, DbError> {
        select(JOB_TABLE, job.to_string()).await
    }

    /// Delete a job's flag. Returns whether a row existed.
    pub async fn delete_job_flag(job: JobId) -> Result<bool, DbError> {
        delete(JOB_TABLE, job.to_string()).await
    }

    /// Load every persisted flag, migrating legacy rows on the way.
    pub async fn load_all() -> Result<FlagSnapshot, DbError> {
        let mut groups = select_all(GROUP_TABLE, GroupId::parse).await?;
        let mut jobs = select_all(JOB_TABLE, JobId::parse).await?;
        groups.sort_by_key(|(id, _)| *id);
        jobs.sort_by_key(|(id, _)| *id);

        tracing::debug!(
            "Loaded {} group flags and {} job flags",
            groups.len(),
            jobs.len()
        );

        Ok(FlagSnapshot { groups, jobs })
    }
}
