use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crewmatch::config::AuthConfig;
use crewmatch::directory::{IdentifierResolver, InMemoryDirectory};
use crewmatch::error::AppError;
use crewmatch::identity::CredentialVerifier;
use crewmatch::matching::{CandidateMatcher, MatchPolicy};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Everything the library routers need, built once from configuration.
pub(crate) struct Services {
    pub(crate) verifier: Arc<CredentialVerifier>,
    pub(crate) resolver: Arc<IdentifierResolver<InMemoryDirectory>>,
    pub(crate) matcher: Arc<CandidateMatcher<InMemoryDirectory>>,
}

impl Services {
    pub(crate) fn build(
        auth: &AuthConfig,
        policy: MatchPolicy,
        directory: Arc<InMemoryDirectory>,
    ) -> Self {
        Self {
            verifier: Arc::new(CredentialVerifier::from_config(auth)),
            resolver: Arc::new(IdentifierResolver::new(Arc::clone(&directory))),
            matcher: Arc::new(CandidateMatcher::new(directory, policy)),
        }
    }
}

/// Loads the directory snapshot, or starts empty when no seed is configured.
pub(crate) fn load_directory(seed: Option<&Path>) -> Result<InMemoryDirectory, AppError> {
    match seed {
        Some(path) => {
            let directory = InMemoryDirectory::from_path(path)?;
            info!(
                seed = %path.display(),
                accounts = directory.account_count(),
                openings = directory.opening_count(),
                "directory snapshot loaded"
            );
            Ok(directory)
        }
        None => {
            warn!("no directory seed configured; serving an empty directory");
            Ok(InMemoryDirectory::default())
        }
    }
}
