use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};
use tracing::{info, warn};

use muse_db::Database;
use muse_types::models::ContentKind;

/// Rotate any kind that has no today item. Run once at startup so a fresh
/// deployment has content before the first scheduled rotation.
pub async fn rotate_missing(db: Arc<Database>) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || {
        for kind in ContentKind::ALL {
            if !db.has_today(kind)? {
                log_rotation(kind, db.rotate_today(kind)?);
            }
        }
        Ok::<_, anyhow::Error>(())
    })
    .await?
}

/// Background task that rotates every kind daily at `at` local time.
///
/// Readers never wait on this: each rotation is one short write transaction.
pub async fn run_rotation_loop(db: Arc<Database>, at: NaiveTime) {
    loop {
        let wait = until_next(Local::now(), at);
        info!("Next rotation in {}s", wait.as_secs());
        tokio::time::sleep(wait).await;

        let db = db.clone();
        let result = tokio::task::spawn_blocking(move || {
            for kind in ContentKind::ALL {
                log_rotation(kind, db.rotate_today(kind)?);
            }
            Ok::<_, anyhow::Error>(())
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Rotation error: {:#}", e),
            Err(e) => warn!("Rotation task panicked: {}", e),
        }
    }
}

fn log_rotation(kind: ContentKind, promoted: Option<i64>) {
    match promoted {
        Some(id) => info!("Rotation: today {} is now {}", kind, id),
        None => info!("Rotation: no {} to promote", kind),
    }
}

/// Time from `now` until the next occurrence of `at` (strictly in the future).
fn until_next<Tz: TimeZone>(now: DateTime<Tz>, at: NaiveTime) -> Duration {
    let tz = now.timezone();
    let today = now.date_naive();

    let next = [today, today + Days::new(1), today + Days::new(2)]
        .into_iter()
        // DST gaps can make a wall-clock time not exist on a given day
        .filter_map(|day| tz.from_local_datetime(&day.and_time(at)).earliest())
        .find(|candidate| *candidate > now);

    next.and_then(|t| (t - now).to_std().ok())
        .unwrap_or(Duration::from_secs(24 * 60 * 60))
}
