#![allow(clippy::disallowed_methods)]

mod common;

use block_core::{BlockFlag, FlagStore, GroupId, JobId, MemoryFlagStore};
use chrono::{DateTime, Utc};
use std::error::Error;

use block_db::{DbError, repositories::FlagRepository};

async fn reset_db() -> Result<(), DbError> {
    let db_conn = block_db::get_db()?;
    db_conn.query("DELETE group_flag; DELETE job_flag;").await?;
    Ok(())
}

// The connection is bound to the runtime that opened it, so every case runs
// inside this one test.
#[tokio::test]
async fn test_flag_repository() -> Result<(), Box<dyn Error>> {
    let _guard = common::setup_db().await?;

    group_flag_roundtrip().await?;
    reset_db().await?;
    job_flag_roundtrip().await?;
    reset_db().await?;
    timestamps_survive_exactly().await?;
    reset_db().await?;
    legacy_rows_load_with_defaults().await?;
    reset_db().await?;
    snapshot_hydrates_memory_store().await?;

    Ok(())
}

async fn group_flag_roundtrip() -> Result<(), Box<dyn Error>> {
    let group = GroupId::new();
    assert!(FlagRepository::get_group_flag(group).await?.is_none());

    let flag = BlockFlag::new("maintenance", "bob");
    let saved = FlagRepository::save_group_flag(group, &flag).await?;
    assert_eq!(saved, flag);

    // Saving again replaces rather than accumulating
    let replacement = BlockFlag::new("release freeze", "alice");
    FlagRepository::save_group_flag(group, &replacement).await?;
    let loaded = FlagRepository::get_group_flag(group).await?;
    assert_eq!(loaded, Some(replacement));
    assert_eq!(FlagRepository::load_all().await?.groups.len(), 1);

    assert!(FlagRepository::delete_group_flag(group).await?);
    assert!(!FlagRepository::delete_group_flag(group).await?);
    assert!(FlagRepository::get_group_flag(group).await?.is_none());

    Ok(())
}

async fn job_flag_roundtrip() -> Result<(), Box<dyn Error>> {
    let job = JobId::new();
    let flag = BlockFlag::anonymous();
    FlagRepository::save_job_flag(job, &flag).await?;

    let loaded = FlagRepository::get_job_flag(job).await?;
    assert_eq!(loaded.as_ref().map(|f| f.message()), Some(""));
    assert_eq!(loaded.as_ref().map(|f| f.actor()), Some(""));
    assert_eq!(loaded, Some(flag));

    assert!(FlagRepository::delete_job_flag(job).await?);
    assert!(FlagRepository::get_job_flag(job).await?.is_none());

    Ok(())
}

async fn timestamps_survive_exactly() -> Result<(), Box<dyn Error>> {
    let group = GroupId::new();
    let stamp = DateTime::<Utc>::from_timestamp(1_700_000_000, 123_456_789)
        .ok_or("timestamp out of range")?;
    let flag = BlockFlag::restore("nightly", "ci", stamp);

    FlagRepository::save_group_flag(group, &flag).await?;
    let loaded = FlagRepository::get_group_flag(group).await?;
    assert_eq!(loaded.map(|f| f.timestamp()), Some(stamp));

    let out_of_range = BlockFlag::restore("far", "future", DateTime::<Utc>::MAX_UTC);
    let err = FlagRepository::save_job_flag(JobId::new(), &out_of_range).await;
    assert!(matches!(err, Err(DbError::Serialization(_))));

    Ok(())
}

async fn legacy_rows_load_with_defaults() -> Result<(), Box<dyn Error>> {
    let group = GroupId::new();
    let job = JobId::new();
    let db_conn = block_db::get_db()?;
    db_conn
        .query("CREATE type::thing('group_flag', $group); CREATE type::thing('job_flag', $job);")
        .bind(("group", group.to_string()))
        .bind(("job", job.to_string()))
        .await?
        .check()?;

    let snapshot = FlagRepository::load_all().await?;
    assert_eq!(snapshot.groups.len(), 1);
    assert_eq!(snapshot.jobs.len(), 1);

    let (loaded_group, flag) = &snapshot.groups[0];
    assert_eq!(*loaded_group, group);
    assert_eq!(flag.message(), "");
    assert_eq!(flag.actor(), "");
    assert_eq!(flag.timestamp(), DateTime::<Utc>::UNIX_EPOCH);
    assert_eq!(snapshot.jobs[0].0, job);

    Ok(())
}

async fn snapshot_hydrates_memory_store() -> Result<(), Box<dyn Error>> {
    let store = MemoryFlagStore::new();
    let group = GroupId::new();
    let jobs = [JobId::new(), JobId::new()];
    let group_flag = store.set_group_flag(group, "hold", "ops");
    FlagRepository::save_group_flag(group, &group_flag).await?;
    for job in jobs {
        store.set_job_flag(job);
        if let Some(flag) = store.get_job_flag(job) {
            FlagRepository::save_job_flag(job, &flag).await?;
        }
    }

    let fresh = MemoryFlagStore::new();
    FlagRepository::load_all().await?.restore_into(&fresh);

    assert!(fresh.is_group_blocked(group));
    assert_eq!(fresh.get_group_flag(group), Some(group_flag));
    for job in jobs {
        assert_eq!(fresh.get_job_flag(job), store.get_job_flag(job));
    }

    Ok(())
}
