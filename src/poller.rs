//! The availability poll loop.
//!
//! Runs as the process's single logical task: fetch the slot listing, keep
//! the active entries, ring the notifier and stop on the first non-empty
//! batch, otherwise wait out the interval and try again. Fetch failures
//! never end the loop; only success or cancellation do.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::client::{Slot, SlotSource};
use crate::config::CheckWindow;
use crate::notify::Notifier;

/// How a poll run ended. There is no failure outcome: every fetch problem is
/// swallowed and retried, so a run only stops on success or cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// At least one active slot turned up; carries the batch that ended the
    /// run, in the order the scheduler listed it.
    Found(Vec<Slot>),
    /// The cancellation token fired before anything opened up.
    Cancelled,
}

/// Polls a slot source at a fixed cadence until an active slot appears.
pub struct AvailabilityPoller<S, N> {
    source: S,
    notifier: N,
    interval: Duration,
}

impl<S: SlotSource, N: Notifier> AvailabilityPoller<S, N> {
    pub fn new(source: S, notifier: N, interval: Duration) -> Self {
        Self {
            source,
            notifier,
            interval,
        }
    }

    /// Run the loop until an active slot is found or `cancel` fires.
    ///
    /// Each iteration fetches the listing for `window`, filters it down to
    /// active slots, and either reports them and returns or sleeps for the
    /// configured interval. Network errors, bad statuses and undecodable
    /// bodies are all logged and retried on the same cadence, indefinitely.
    /// The sleep is raced against the cancellation token so an interrupt
    /// never has to wait out the interval.
    pub async fn run(&self, window: &CheckWindow, cancel: &CancellationToken) -> PollOutcome {
        tracing::info!("Availability poller started (interval: {:?})", self.interval);

        loop {
            if cancel.is_cancelled() {
                return PollOutcome::Cancelled;
            }

            match self.source.fetch_slots(window).await {
                Ok(slots) => {
                    let available: Vec<Slot> =
                        slots.into_iter().filter(|slot| slot.active).collect();

                    tracing::info!(
                        "{} - {}: {} slots available",
                        window.start(),
                        window.end(),
                        available.len()
                    );

                    if !available.is_empty() {
                        if let Err(e) = self.notifier.alert() {
                            tracing::warn!("Failed to sound the alert: {}", e);
                        }

                        let timestamps: Vec<String> = available
                            .iter()
                            .map(|slot| slot.timestamp.to_string())
                            .collect();
                        tracing::info!("Available slots: {}", timestamps.join(", "));

                        return PollOutcome::Found(available);
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch availability: {}", e);
                }
            }

            tracing::info!("Sleeping for {} sec", self.interval.as_secs());
            tokio::select! {
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
