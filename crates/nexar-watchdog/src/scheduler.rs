//! Watchdog timers
//!
//! ```text
//! start() ──► boot: sleep [1s,3s) ─► verify ─► degrade if already failed ─┐
//!                                                                          │ armed
//!            primary:   wait armed ─► every P1 ∈ [60s,180s): spawn verify ◄┤
//!            secondary: wait armed ─► every P2 ∈ [30s,90s):  spawn verify ◄┘
//! ```
//!
//! Periods are drawn once when the scheduler starts. Ticks never wait for the
//! previous check, so slow checks may overlap.

use crate::config::Cadence;
use crate::degrade::DegradationController;
use crate::entropy::{Clock, RandomSource};
use crate::verifier::IntegrityVerifier;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Background tasks started by [`WatchdogScheduler::start`]
#[derive(Debug)]
pub struct WatchdogHandles {
    /// One-shot boot check
    pub boot: JoinHandle<()>,
    /// Primary recurring check
    pub primary: JoinHandle<()>,
    /// Secondary recurring check, when configured
    pub secondary: Option<JoinHandle<()>>,
}

impl WatchdogHandles {
    /// Abort every task
    pub fn abort(&self) {
        self.boot.abort();
        self.primary.abort();
        if let Some(secondary) = &self.secondary {
            secondary.abort();
        }
    }
}

/// Arms the recurring checks when the boot task ends, however it ends
struct ArmOnDrop(watch::Sender<bool>);

impl Drop for ArmOnDrop {
    fn drop(&mut self) {
        // Receivers may already be gone when the host aborted them
        let _ = self.0.send(true);
    }
}

/// Drives the boot check and both recurring checks
#[derive(Debug, Clone)]
pub struct WatchdogScheduler {
    verifier: IntegrityVerifier,
    controller: DegradationController,
    random: Arc<dyn RandomSource>,
    clock: Arc<dyn Clock>,
    cadence: Cadence,
}

impl WatchdogScheduler {
    /// Create a scheduler
    #[must_use]
    pub fn new(
        verifier: IntegrityVerifier,
        random: Arc<dyn RandomSource>,
        clock: Arc<dyn Clock>,
        cadence: Cadence,
    ) -> Self {
        let controller = verifier.reporter().controller().clone();
        Self {
            verifier,
            controller,
            random,
            clock,
            cadence,
        }
    }

    /// Start all timers; call once, at page load
    pub fn start(&self) -> WatchdogHandles {
        let runtime = self.verifier.reporter().runtime().clone();
        let (armed_tx, armed_rx) = watch::channel(false);

        let boot_delay = self.cadence.boot.sample(self.random.as_ref());
        let primary_period = self.cadence.primary.sample(self.random.as_ref());
        let secondary_period = self
            .cadence
            .secondary
            .map(|range| range.sample(self.random.as_ref()));

        info!(
            boot_ms = boot_delay.as_millis(),
            primary_ms = primary_period.as_millis(),
            secondary = ?secondary_period,
            "watchdog started"
        );

        let boot = runtime.spawn(self.clone().boot(boot_delay, armed_tx));
        let primary = runtime.spawn(self.clone().recurring("primary", primary_period, armed_rx.clone()));
        let secondary = secondary_period
            .map(|period| runtime.spawn(self.clone().recurring("secondary", period, armed_rx)));

        WatchdogHandles {
            boot,
            primary,
            secondary,
        }
    }

    async fn boot(self, delay: Duration, armed: watch::Sender<bool>) {
        let _arm = ArmOnDrop(armed);
        self.clock.sleep(delay).await;
        let intact = self.verifier.verify().await;
        debug!(intact, "boot check finished");

        match self.controller.store().integrity_failed() {
            Ok(true) => {
                self.controller.degrade();
            }
            Ok(false) => {}
            Err(err) => warn!(error = %err, "integrity flag unreadable at boot"),
        }
    }

    async fn recurring(self, name: &'static str, period: Duration, mut armed: watch::Receiver<bool>) {
        let booted = armed.wait_for(|ready| *ready).await.is_ok();
        if !booted {
            debug!(name, "boot check ended before arming");
            return;
        }
        info!(name, period_ms = period.as_millis(), "recurring check armed");

        let runtime = self.verifier.reporter().runtime().clone();
        loop {
            self.clock.sleep(period).await;
            let verifier = self.verifier.clone();
            runtime.spawn(async move {
                verifier.verify().await;
            });
        }
    }
}
