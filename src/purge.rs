use log::{error, info};
use sqlx::sqlite::SqlitePool;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::clock;
use crate::content::{self, ContentItem};
use crate::db::DynError;
use crate::media::MediaStore;
use crate::playlist;

/// Counters from one purge pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeOutcome {
    pub scanned: usize,
    pub purged: usize,
    pub failed: usize,
}

/// Purge a single expired item through its full state machine:
/// flag expired, detach from active playlists, delete the backing file,
/// flag file removed, delete the record.
///
/// Playlist detach must precede file deletion: a reader that fetches the
/// active playlist between file-delete and record-delete would otherwise get
/// a 404 on the asset. The blob delete is idempotent, so an item left
/// half-purged by a previous failure completes here instead of wedging.
async fn purge_item(
    pool: &SqlitePool,
    media: &MediaStore,
    item: &ContentItem,
    now_ms: i64,
) -> Result<(), DynError> {
    if !item.is_expired {
        content::mark_expired(pool, &item.id, now_ms).await?;
    }

    let detached = playlist::detach_content_from_active(pool, &item.id).await?;
    if detached > 0 {
        info!(
            "Detached {} active playlist entr{} for expired content {}",
            detached,
            if detached == 1 { "y" } else { "ies" },
            item.id
        );
    }

    media.delete(&item.stored_name).await?;
    content::mark_file_removed(pool, &item.id).await?;

    content::delete(pool, &item.id).await?;
    info!("Purged expired content: {}", item.original_name);

    Ok(())
}

/// Run one purge pass at an explicit reference time (for testing and the
/// one-shot CLI subcommand).
///
/// Items are processed independently: a failure is logged and the item is
/// left for the next pass - its row still matches the expiry scan - while
/// the rest of the batch proceeds.
pub async fn purge_expired_once_at(
    pool: &SqlitePool,
    media: &MediaStore,
    now_ms: i64,
) -> Result<PurgeOutcome, DynError> {
    let expired = content::find_expired(pool, now_ms).await?;
    let mut outcome = PurgeOutcome {
        scanned: expired.len(),
        ..Default::default()
    };

    for item in &expired {
        match purge_item(pool, media, item, now_ms).await {
            Ok(()) => outcome.purged += 1,
            Err(e) => {
                outcome.failed += 1;
                error!("Error purging expired content {}: {}", item.id, e);
            }
        }
    }

    Ok(outcome)
}

/// Run one purge pass at the current server time
pub async fn purge_expired_once(
    pool: &SqlitePool,
    media: &MediaStore,
) -> Result<PurgeOutcome, DynError> {
    purge_expired_once_at(pool, media, clock::now_ms()).await
}

/// Run a single purge pass from the CLI, with its own runtime.
/// Lets operators (and tests) trigger a deterministic pass instead of
/// waiting out the wall-clock interval.
pub fn run_once_blocking(config: &crate::config::ServerConfig) -> Result<PurgeOutcome, DynError> {
    std::fs::create_dir_all(&config.data_dir)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let pool = crate::db::open_database_pool(&config.data_dir, &config.db_name).await?;
        crate::db::init_database_schema(&pool).await?;
        crate::db::check_database_version(&pool).await?;
        let media = MediaStore::open(config.media_dir())?;

        let outcome = purge_expired_once(&pool, &media).await?;
        println!(
            "Purge pass complete: {} expired, {} purged, {} failed",
            outcome.scanned, outcome.purged, outcome.failed
        );
        Ok(outcome)
    })
}

/// Spawn the recurring purge task.
///
/// One pass per interval tick, passes strictly serialized - a tick that
/// comes due while a pass is running waits behind it rather than overlapping
/// (two concurrent passes purging the same item would race). The shutdown
/// flag is only consulted between passes, so signaling shutdown lets an
/// in-flight pass finish; awaiting the returned handle completes the drain.
pub fn spawn_purge_scheduler(
    pool: SqlitePool,
    media: MediaStore,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // interval() fires immediately; consume that so the first pass lands
        // one full interval after startup, matching the fixed schedule
        ticker.tick().await;

        info!("Expiry scheduler started (every {}s)", interval.as_secs());

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    match purge_expired_once(&pool, &media).await {
                        Ok(outcome) if outcome.scanned > 0 => {
                            info!(
                                "Purge pass: {} expired, {} purged, {} failed",
                                outcome.scanned, outcome.purged, outcome.failed
                            );
                        }
                        Ok(_) => {}
                        Err(e) => error!("Scheduler error: {}", e),
                    }
                }
            }
        }

        info!("Expiry scheduler stopped");
    })
}
