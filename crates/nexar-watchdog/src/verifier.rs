//! Attribution verifier

use crate::inspect::PageInspector;
use crate::reporter::Reporter;
use nexar_backend::AttributionSettings;
use nexar_core::FailureKind;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Checks the live footer against the remote attribution config
#[derive(Clone)]
pub struct IntegrityVerifier {
    settings: Arc<AttributionSettings>,
    inspector: Arc<dyn PageInspector>,
    reporter: Arc<Reporter>,
}

impl fmt::Debug for IntegrityVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrityVerifier")
            .field("settings", &self.settings)
            .field("reporter", &self.reporter)
            .finish_non_exhaustive()
    }
}

impl IntegrityVerifier {
    /// Create a verifier
    #[must_use]
    pub fn new(
        settings: Arc<AttributionSettings>,
        inspector: Arc<dyn PageInspector>,
        reporter: Arc<Reporter>,
    ) -> Self {
        Self {
            settings,
            inspector,
            reporter,
        }
    }

    /// Reporter failures are handed to
    #[inline]
    #[must_use]
    pub fn reporter(&self) -> &Arc<Reporter> {
        &self.reporter
    }

    /// Run the check without reporting
    ///
    /// # Errors
    /// The first failed step, in check order.
    pub async fn check(&self) -> Result<(), FailureKind> {
        let config = match self.settings.load().await {
            Ok(config) => config,
            Err(err) => {
                debug!(error = %err, "attribution config unavailable");
                return Err(FailureKind::SettingsMissing);
            }
        };

        let footer = match self.inspector.footer() {
            Ok(Some(footer)) => footer,
            Ok(None) => return Err(FailureKind::FooterMissing),
            Err(err) => {
                warn!(error = %err, "page inspection failed");
                return Err(FailureKind::CheckError);
            }
        };

        if !config.text_matches(&footer.text) {
            return Err(FailureKind::FooterModified);
        }
        if footer.find_image(&config.logo_url_fragment).is_none() {
            return Err(FailureKind::LogoMissing);
        }
        Ok(())
    }

    /// Run the check and report any failure
    ///
    /// The check runs as its own task; a panic inside it is reported as
    /// [`FailureKind::CheckError`].
    pub async fn verify(&self) -> bool {
        let verifier = self.clone();
        let outcome = match self
            .reporter
            .runtime()
            .spawn(async move { verifier.check().await })
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, panicked = err.is_panic(), "attribution check aborted");
                Err(FailureKind::CheckError)
            }
        };

        match outcome {
            Ok(()) => {
                debug!("attribution intact");
                true
            }
            Err(kind) => {
                self.reporter.report(kind);
                false
            }
        }
    }
}
