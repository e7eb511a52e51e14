use burrow_core::{Repository, StorageError};
use jiff::Timestamp;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Periodically removes expired records from a repository.
///
/// Resolution never depends on the sweeper; it only keeps expired rows from
/// piling up in the store.
pub struct Sweeper<R: ?Sized> {
    repository: Arc<R>,
    interval: Duration,
}

impl<R: Repository + ?Sized> Sweeper<R> {
    pub fn new(repository: Arc<R>, interval: Duration) -> Self {
        Self {
            repository,
            interval,
        }
    }

    /// Runs one purge pass and returns how many records were removed.
    pub async fn sweep_once(&self) -> Result<u64, StorageError> {
        self.repository.purge_expired(Timestamp::now()).await
    }

    /// Sweeps on every tick until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately.
        ticker.tick().await;
        tokio::pin!(shutdown);

        info!(interval = ?self.interval, "Expiration sweeper started");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Expiration sweeper shutting down");
                    break;
                }
                _ = ticker.tick() => match self.sweep_once().await {
                    Ok(0) => debug!("Sweep found nothing to purge"),
                    Ok(removed) => info!(removed, "Purged expired records"),
                    Err(e) => warn!(error = %e, "Sweep failed"),
                },
            }
        }
    }

    pub fn spawn<F>(self, shutdown: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(self.run(shutdown))
    }
}
