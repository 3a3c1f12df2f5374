use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::application::services::Ingestor;

/// Periodically deletes staged uploads whose TTL has passed.
pub struct UploadReaper {
    ingestor: Arc<Ingestor>,
    interval: Duration,
}

impl UploadReaper {
    pub fn new(ingestor: Arc<Ingestor>, interval: Duration) -> Self {
        Self { ingestor, interval }
    }

    /// Sweeps once per interval until `shutdown` flips to `true` or its
    /// sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Upload reaper started (every {} s)",
            self.interval.as_secs()
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Upload reaper stopped");
    }

    pub async fn sweep(&self) -> usize {
        match self.ingestor.reap_expired_uploads(chrono::Utc::now()).await {
            Ok(0) => 0,
            Ok(reaped) => {
                tracing::info!("Reaped {} expired uploads", reaped);
                reaped
            }
            Err(e) => {
                tracing::error!("Upload reaper sweep failed: {}", e);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{BagOfWordsEmbedder, ScriptedLlm};
    use crate::infrastructure::container::tests::{TEST_DIM, test_app_with};

    #[tokio::test]
    async fn test_sweep_removes_only_expired_uploads() {
        let app = test_app_with(
            BagOfWordsEmbedder::new(TEST_DIM),
            ScriptedLlm::failing(),
            &[("UPLOAD_TTL_SECS", "1")],
        )
        .await;
        let ingestor = app.container.ingestor.clone();

        let staged = ingestor
            .begin_upload(b"rota notes".to_vec(), "text/plain".into(), "rota.txt".into())
            .await
            .unwrap();
        let reaper = UploadReaper::new(ingestor.clone(), Duration::from_secs(60));

        assert_eq!(reaper.sweep().await, 0);
        assert!(ingestor.upload_status(staged.upload_id()).await.is_ok());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(reaper.sweep().await, 1);
        assert!(ingestor.upload_status(staged.upload_id()).await.is_err());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let app = test_app_with(BagOfWordsEmbedder::new(TEST_DIM), ScriptedLlm::failing(), &[]).await;
        let reaper = Arc::new(UploadReaper::new(
            app.container.ingestor.clone(),
            Duration::from_millis(10),
        ));
        let (tx, rx) = watch::channel(false);

        let task = tokio::spawn({
            let reaper = reaper.clone();
            async move { reaper.run(rx).await }
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}
