//! Failure reporter
//!
//! `report` returns immediately. The remote log write and the delayed
//! degradation run as background tasks on the runtime captured when the
//! reporter was built; neither can fail the caller.

use crate::degrade::DegradationController;
use crate::entropy::{Clock, DelayRange, RandomSource};
use crate::error::WatchdogResult;
use nexar_backend::LogSink;
use nexar_core::{DiagnosticCode, ErrorLogRecord, FailureKind};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Reports failures to the log sink and schedules their degradation
pub struct Reporter {
    sink: Arc<dyn LogSink>,
    controller: DegradationController,
    random: Arc<dyn RandomSource>,
    clock: Arc<dyn Clock>,
    degradation_delay: DelayRange,
    user: RwLock<Option<Uuid>>,
    runtime: Handle,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("degradation_delay", &self.degradation_delay)
            .field("user", &*self.user.read())
            .field("pending", &self.pending.lock().len())
            .finish_non_exhaustive()
    }
}

impl Reporter {
    /// Create a reporter bound to the current tokio runtime
    ///
    /// # Errors
    /// [`WatchdogError::Runtime`](crate::WatchdogError::Runtime) when called
    /// outside a runtime.
    pub fn new(
        sink: Arc<dyn LogSink>,
        controller: DegradationController,
        random: Arc<dyn RandomSource>,
        clock: Arc<dyn Clock>,
        degradation_delay: DelayRange,
    ) -> WatchdogResult<Self> {
        Ok(Self {
            sink,
            controller,
            random,
            clock,
            degradation_delay,
            user: RwLock::new(None),
            runtime: Handle::try_current()?,
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Record the signed-in user; `None` after sign-out
    pub fn set_user(&self, user: Option<Uuid>) {
        *self.user.write() = user;
    }

    /// Signed-in user, if known
    #[must_use]
    pub fn user(&self) -> Option<Uuid> {
        *self.user.read()
    }

    /// Degradation controller used by background tasks
    #[inline]
    #[must_use]
    pub fn controller(&self) -> &DegradationController {
        &self.controller
    }

    /// Runtime background work is spawned on
    #[inline]
    pub(crate) fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Report a failure
    ///
    /// Safe to call from any thread. Returns the diagnostic code attached to
    /// the log event and the remote record.
    pub fn report(&self, kind: FailureKind) -> DiagnosticCode {
        let code = DiagnosticCode::new(self.random.below(DiagnosticCode::SPACE));
        error!(code = %code, kind = %kind, "critical application error");

        let record = ErrorLogRecord::new(self.user(), &kind, code, self.clock.now());
        let sink = Arc::clone(&self.sink);
        let log_write = self.runtime.spawn(async move {
            match sink.append(&record).await {
                Ok(()) => debug!(code = %code, "error record written"),
                Err(err) => warn!(code = %code, error = %err, "error record write failed"),
            }
        });

        let delay = self.degradation_delay.sample(self.random.as_ref());
        let controller = self.controller.clone();
        let clock = Arc::clone(&self.clock);
        let degradation = self.runtime.spawn(async move {
            clock.sleep(delay).await;
            controller.apply(&kind, code);
        });

        let mut pending = self.pending.lock();
        pending.retain(|task| !task.is_finished());
        pending.push(log_write);
        pending.push(degradation);
        code
    }

    /// Number of background tasks not yet finished
    #[must_use]
    pub fn pending(&self) -> usize {
        let mut pending = self.pending.lock();
        pending.retain(|task| !task.is_finished());
        pending.len()
    }

    /// Wait for every background task spawned so far
    pub async fn settle(&self) {
        loop {
            let batch = std::mem::take(&mut *self.pending.lock());
            if batch.is_empty() {
                return;
            }
            for task in batch {
                if let Err(err) = task.await {
                    warn!(error = %err, "reporter task did not complete");
                }
            }
        }
    }
}
