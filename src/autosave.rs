//! Background autosave – writes registry snapshots off the combat path.
//!
//! The registry lock is held only long enough to encode a
//! [`RegistrySnapshot`]; the file write runs on Tokio's blocking pool.

use crate::registry::OverrideRegistry;
use anyhow::{Context, Result};
use log::{info, warn};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub struct Autosaver {
    registry: Arc<Mutex<OverrideRegistry>>,
    period: Duration,
}

impl Autosaver {
    pub fn new(registry: Arc<Mutex<OverrideRegistry>>, period: Duration) -> Self {
        Self { registry, period }
    }

    /// Use the registry's configured autosave interval.
    pub fn from_config(registry: Arc<Mutex<OverrideRegistry>>) -> Self {
        let secs = registry.lock().config().autosave_interval_secs.max(1);
        Self::new(registry, Duration::from_secs(secs))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Snapshot under the lock, write without it.
    pub async fn save_now(&self) -> Result<()> {
        let snapshot = self.registry.lock().snapshot()?;
        tokio::task::spawn_blocking(move || snapshot.write())
            .await
            .context("Autosave writer task failed")??;
        Ok(())
    }

    /// Save every `period` until Ctrl-C, then save once more.
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl-C: {}", e);
            }
            info!("Autosaver shutting down (SIGINT)");
        })
        .await
    }

    /// Save every `period` until `shutdown` completes, then save once more.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("Autosaving knockback overrides every {:?}", self.period);

        let mut timer = tokio::time::interval(self.period);
        // First tick completes immediately; nothing has changed yet.
        timer.tick().await;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    if let Err(e) = self.save_now().await {
                        warn!("Autosave failed: {:#}", e);
                    }
                }
                _ = &mut shutdown => break,
            }
        }

        self.save_now().await.context("Final save on shutdown failed")
    }
}
