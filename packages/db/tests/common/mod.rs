use std::sync::LazyLock;

use tokio::sync::{Mutex, MutexGuard};

use block_db::{DbConfig, DbError};

static TEST_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn setup_db() -> Result<MutexGuard<'static, ()>, DbError> {
    let guard = TEST_LOCK.lock().await;
    block_db::init(DbConfig::memory()).await?;
    let db_conn = block_db::get_db()?;
    db_conn.query("DELETE group_flag; DELETE job_flag;").await?;
    Ok(guard)
}
