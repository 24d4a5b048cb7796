//! Dispatch loop implementation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::{FeedInvalidPolicy, ScannerConfig};
use crate::Result;
use crate::domain::AlertRecord;
use crate::feed::AlertSource;
use crate::notification::{DeliveryReport, NotificationService};
use crate::store::SeenIdStore;

/// One alert that was new in a cycle, with its delivery outcomes.
#[derive(Debug, Clone)]
pub struct DispatchedAlert {
    pub alert_id: String,
    pub delivery: DeliveryReport,
}

/// Summary of one cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Alerts returned by the feed.
    pub fetched: usize,
    /// Alerts skipped because they were already seen.
    pub skipped: usize,
    /// New alerts, in feed order.
    pub dispatched: Vec<DispatchedAlert>,
}

/// Polls an [`AlertSource`], announces unseen alerts, and remembers them.
pub struct AlertScanner {
    source: Arc<dyn AlertSource>,
    notifier: NotificationService,
    store: SeenIdStore,
    config: ScannerConfig,
    cancellation_token: CancellationToken,
}

impl AlertScanner {
    pub fn new(
        source: Arc<dyn AlertSource>,
        notifier: NotificationService,
        store: SeenIdStore,
        config: ScannerConfig,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            source,
            notifier,
            store,
            config,
            cancellation_token,
        }
    }

    pub fn store(&self) -> &SeenIdStore {
        &self.store
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Run until cancelled.
    ///
    /// The first cycle starts immediately. Returns `Ok(())` on cancellation.
    /// A rejected query is retried on the next tick unless the policy is
    /// [`FeedInvalidPolicy::Terminate`], in which case `Err(FeedInvalid)` is
    /// returned.
    pub async fn run(mut self) -> Result<()> {
        info!(
            zone = %self.source.zone(),
            interval = ?self.config.poll_interval,
            channels = ?self.notifier.channel_types(),
            "Alert scanner starting"
        );

        let ticker_token = self.cancellation_token.child_token();
        let _ticker_guard = ticker_token.clone().drop_guard();
        let mut ticks = spawn_ticker(self.config.poll_interval, ticker_token);

        loop {
            tokio::select! {
                biased;

                _ = self.cancellation_token.cancelled() => {
                    info!("Alert scanner cancelled");
                    return Ok(());
                }

                tick = ticks.recv() => {
                    let Some(tick) = tick else {
                        debug!("Ticker stopped");
                        return Ok(());
                    };
                    trace!(lag = ?tick.elapsed(), "Cycle starting");

                    match self.run_cycle().await {
                        Ok(report) => {
                            debug!(
                                fetched = report.fetched,
                                skipped = report.skipped,
                                new = report.dispatched.len(),
                                "Cycle complete"
                            );
                        }
                        Err(e) if e.is_feed_invalid() => match self.config.on_invalid_feed {
                            FeedInvalidPolicy::Terminate => {
                                error!(error = %e, "Feed rejected the query; stopping scanner. Please check the zone configuration");
                                return Err(e);
                            }
                            FeedInvalidPolicy::Retry => {
                                warn!(error = %e, "Feed rejected the query; retrying next cycle");
                            }
                        },
                        Err(e) => {
                            warn!(error = %e, "Cycle aborted; retrying next cycle");
                        }
                    }
                }
            }
        }
    }

    /// Execute one fetch, fan-out and record pass.
    ///
    /// A fetch failure returns before anything is published or recorded.
    /// Channel failures never abort the cycle and never stop an alert from
    /// being recorded as seen.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let alerts = self.source.fetch_active_alerts().await?;

        let mut report = CycleReport {
            fetched: alerts.len(),
            ..Default::default()
        };

        for alert in alerts {
            if self.store.contains(&alert.id) {
                report.skipped += 1;
                continue;
            }

            let delivery = self.notifier.publish_all(&alert).await;
            self.store.record(&alert.id);
            log_alert(&alert, &delivery);

            report.dispatched.push(DispatchedAlert {
                alert_id: alert.id,
                delivery,
            });
        }

        Ok(report)
    }
}

/// Spawn the ticker feeding a one-slot mailbox.
///
/// The first tick is immediate. A tick that finds the slot full is dropped,
/// which coalesces ticks while a cycle overruns the period.
fn spawn_ticker(period: Duration, token: CancellationToken) -> mpsc::Receiver<Instant> {
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                tick = interval.tick() => match tx.try_send(tick) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        debug!("Previous cycle still running; coalescing tick");
                    }
                    Err(TrySendError::Closed(_)) => break,
                },
            }
        }
    });

    rx
}

fn log_alert(alert: &AlertRecord, delivery: &DeliveryReport) {
    info!(
        alert_id = %alert.id,
        delivered = ?delivery.delivered().collect::<Vec<_>>(),
        "{}\n\nAffected region(s): {}\n\n{}\n\n---",
        alert.headline,
        alert.area_description,
        alert.description
    );
}
