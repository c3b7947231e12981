//! Sync engine
//!
//! The SyncEngine is responsible for:
//! - Resolving the hosted zone that serves a URL base
//! - Submitting a change batch to that zone
//! - Polling the change until it is INSYNC or the ceiling elapses
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ ChangeBatch │───▶│ resolve_zone │───▶│    submit    │───▶│wait_for_sync │
//! └─────────────┘    └──────────────┘    └──────────────┘    └──────────────┘
//!                           │                   │                   │
//!                           ▼                   ▼                   ▼
//!                    ┌─────────────────────────────────────────────────────┐
//!                    │                    DnsProvider                      │
//!                    └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Poll Flow
//!
//! 1. Query the change status
//! 2. INSYNC: stop immediately, no further sleep
//! 3. PENDING: emit a tick, sleep one interval, repeat
//! 4. Ceiling reached: report [`SyncOutcome::TimedOut`], which is not an error
//!
//! Status queries are read-only, so the engine may repeat them. A failed
//! query consumes a tick; more than `max_consecutive_poll_errors` failures
//! in a row abort polling with [`Error::ChangeStatus`].

use crate::batch::ChangeBatch;
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::traits::{ChangeInfo, ChangeStatus, DnsProvider};
use crate::urlbase::UrlBase;
use crate::zone;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, trace, warn};

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Hosted zone resolved
    ZoneResolved {
        zone_name: String,
        zone_id: String,
    },

    /// Change batch accepted by the provider
    Submitted {
        change_id: String,
        status: ChangeStatus,
        changes: usize,
    },

    /// Status query returned a non-terminal status
    PollTick {
        tick: u64,
        status: ChangeStatus,
    },

    /// Status query failed but polling continues
    PollFailed {
        tick: u64,
        error: String,
        consecutive_failures: usize,
    },

    /// Change reached INSYNC
    Synced {
        change_id: String,
        polls: u64,
    },

    /// Ceiling reached without INSYNC
    TimedOut {
        change_id: String,
        polls: u64,
    },

    /// Sync polling disabled by configuration
    SyncSkipped {
        change_id: String,
    },
}

/// Terminal state of sync polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Provider reported INSYNC after `polls` status queries
    InSync { polls: u64 },

    /// Ceiling reached; the change was submitted but not confirmed
    TimedOut { polls: u64, waited: Duration },

    /// Polling was skipped by configuration
    Skipped,
}

impl SyncOutcome {
    /// Whether propagation was confirmed
    pub fn is_in_sync(&self) -> bool {
        matches!(self, SyncOutcome::InSync { .. })
    }
}

/// Result of a full resolve → submit → wait run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Bare hosted zone identifier
    pub zone_id: String,
    /// Change as returned by the submission
    pub change: ChangeInfo,
    /// How sync polling ended
    pub outcome: SyncOutcome,
}

/// Core sync engine
///
/// Owns the provider and the sync policy. All stages run sequentially on
/// the caller's task; the engine never spawns.
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`], keeping the event receiver
/// 2. Call [`SyncEngine::run()`], or the individual stages
/// 3. Drop the engine to close the event channel
pub struct SyncEngine {
    /// DNS provider for zone lookup, submission and status queries
    provider: Box<dyn DnsProvider>,

    /// Polling policy
    config: SyncConfig,

    /// Event sender for progress reporting
    event_tx: mpsc::Sender<EngineEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Parameters
    ///
    /// - `provider`: DNS provider implementation
    /// - `config`: Sync polling configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        provider: Box<dyn DnsProvider>,
        config: SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            provider,
            config,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Sync polling configuration in use
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Resolve, submit and wait for sync
    ///
    /// # Returns
    ///
    /// - `Ok(SyncReport)`: Batch submitted; `outcome` says whether it synced
    /// - `Err(Error)`: Zone not found, submission rejected, or polling aborted
    pub async fn run(&self, batch: &ChangeBatch, url_base: &UrlBase) -> Result<SyncReport> {
        let zone_id = self.resolve_zone(url_base).await?;
        let change = self.submit(&zone_id, batch).await?;
        let outcome = self.wait_for_sync(&change).await?;

        Ok(SyncReport {
            zone_id,
            change,
            outcome,
        })
    }

    /// Resolve the bare hosted zone identifier for a URL base
    pub async fn resolve_zone(&self, url_base: &UrlBase) -> Result<String> {
        let zone_id = zone::resolve_zone_id(self.provider.as_ref(), url_base).await?;

        self.emit_event(EngineEvent::ZoneResolved {
            zone_name: url_base.zone_name(),
            zone_id: zone_id.clone(),
        });
        Ok(zone_id)
    }

    /// Submit a change batch to a hosted zone
    ///
    /// The batch is submitted exactly once. Any provider error is reported
    /// as [`Error::SubmissionFailed`] with the provider's message.
    pub async fn submit(&self, zone_id: &str, batch: &ChangeBatch) -> Result<ChangeInfo> {
        if batch.is_empty() {
            return Err(Error::submission(
                "Change batch is empty: no device row has both url and ipaddress",
            ));
        }

        info!(
            "Submitting {} change(s) to zone {} via {}",
            batch.len(),
            zone_id,
            self.provider.provider_name()
        );

        let change = self
            .provider
            .submit_changes(zone_id, batch)
            .await
            .map_err(|e| match e {
                Error::SubmissionFailed(_) => e,
                other => Error::submission(other.to_string()),
            })?;

        info!("Change {} submitted, status {}", change.id, change.status);
        self.emit_event(EngineEvent::Submitted {
            change_id: change.id.clone(),
            status: change.status,
            changes: batch.len(),
        });
        Ok(change)
    }

    /// Poll a submitted change until INSYNC or the ceiling elapses
    ///
    /// # Returns
    ///
    /// - `Ok(SyncOutcome::InSync)`: Propagation confirmed
    /// - `Ok(SyncOutcome::TimedOut)`: Not confirmed in time (not an error)
    /// - `Ok(SyncOutcome::Skipped)`: `skip_sync_check` is set
    /// - `Err(Error::ChangeStatus)`: Too many consecutive query failures
    pub async fn wait_for_sync(&self, change: &ChangeInfo) -> Result<SyncOutcome> {
        if self.config.skip_sync_check {
            info!("Skipping sync check for change {}", change.id);
            self.emit_event(EngineEvent::SyncSkipped {
                change_id: change.id.clone(),
            });
            return Ok(SyncOutcome::Skipped);
        }

        if change.status.is_in_sync() {
            self.emit_event(EngineEvent::Synced {
                change_id: change.id.clone(),
                polls: 0,
            });
            return Ok(SyncOutcome::InSync { polls: 0 });
        }

        let max_polls = self.config.max_polls();
        let interval = self.config.poll_interval();
        let started = tokio::time::Instant::now();
        let mut consecutive_failures = 0usize;

        for tick in 1..=max_polls {
            match self.provider.get_change(&change.id).await {
                Ok(info) if info.status.is_in_sync() => {
                    info!("Change {} is INSYNC after {} poll(s)", change.id, tick);
                    self.emit_event(EngineEvent::Synced {
                        change_id: change.id.clone(),
                        polls: tick,
                    });
                    return Ok(SyncOutcome::InSync { polls: tick });
                }
                Ok(info) => {
                    consecutive_failures = 0;
                    debug!("Change {} still {} (poll {}/{})", change.id, info.status, tick, max_polls);
                    self.emit_event(EngineEvent::PollTick {
                        tick,
                        status: info.status,
                    });
                }
                Err(e) => {
                    consecutive_failures += 1;
                    let message = status_error_message(e);

                    if consecutive_failures > self.config.max_consecutive_poll_errors {
                        return Err(Error::change_status(format!(
                            "{} ({} consecutive failure(s))",
                            message, consecutive_failures
                        )));
                    }

                    warn!(
                        "Status query {} for change {} failed: {}",
                        tick, change.id, message
                    );
                    self.emit_event(EngineEvent::PollFailed {
                        tick,
                        error: message,
                        consecutive_failures,
                    });
                }
            }

            tokio::time::sleep(interval).await;
        }

        let waited = started.elapsed();
        warn!(
            "Change {} not INSYNC within {}s ({} poll(s))",
            change.id, self.config.poll_timeout_secs, max_polls
        );
        self.emit_event(EngineEvent::TimedOut {
            change_id: change.id.clone(),
            polls: max_polls,
        });

        Ok(SyncOutcome::TimedOut {
            polls: max_polls,
            waited,
        })
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(TrySendError::Closed(event)) => {
                trace!("No event listener, dropping {:?}", event);
            }
        }
    }
}

/// Message of a failed status query, without re-wrapping
fn status_error_message(err: Error) -> String {
    match err {
        Error::ChangeStatus(message) => message,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_classification() {
        assert!(SyncOutcome::InSync { polls: 3 }.is_in_sync());
        assert!(!SyncOutcome::Skipped.is_in_sync());
        assert!(
            !SyncOutcome::TimedOut {
                polls: 60,
                waited: Duration::from_secs(60)
            }
            .is_in_sync()
        );
    }

    #[test]
    fn test_status_error_is_not_rewrapped() {
        let message = status_error_message(Error::change_status("Throttling: Rate exceeded"));
        assert_eq!(message, "Throttling: Rate exceeded");

        let message = status_error_message(Error::provider("route53", "timeout"));
        assert_eq!(message, "Provider error (route53): timeout");
    }
}
