//! Background polling of the health endpoint.
//!
//! A poll is only started once the previous one has resolved; ticks that
//! elapse while a poll is in flight are skipped rather than queued.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::HealthStatus;

/// Outcome of one health poll.
#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub result: Result<HealthStatus, String>,
    /// Set when the poll hit a 401 outside demo mode; polling stops after it.
    pub session_expired: bool,
}

pub struct HealthPoller {
    client: ApiClient,
    every: Duration,
}

impl HealthPoller {
    pub fn new(client: ApiClient, every: Duration) -> Self {
        Self { client, every }
    }

    /// Run one poll.
    pub async fn poll_once(&self) -> HealthSnapshot {
        let result = self.client.health().await;
        let session_expired = matches!(result, Err(ApiError::SessionExpired));
        HealthSnapshot {
            fetched_at: Utc::now(),
            result: result.map_err(|e| e.to_string()),
            session_expired,
        }
    }

    /// Start polling in the background.
    ///
    /// Snapshots are published on the returned channel. The task ends when
    /// every receiver is dropped or the session expires.
    pub fn spawn(self) -> (watch::Receiver<Option<HealthSnapshot>>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(None);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(self.every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(every_secs = self.every.as_secs_f64(), "Health polling started");

            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    debug!("No health subscribers left");
                    break;
                }

                let snapshot = self.poll_once().await;
                let expired = snapshot.session_expired;
                if let Err(ref e) = snapshot.result {
                    warn!(error = %e, "Health poll failed");
                }
                if tx.send(Some(snapshot)).is_err() {
                    break;
                }
                if expired {
                    warn!("Session expired, stopping health polling");
                    break;
                }
            }
        });
        (rx, handle)
    }
}
