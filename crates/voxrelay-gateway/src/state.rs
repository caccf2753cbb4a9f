//! Gateway shared state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use voxrelay_agent::Pipeline;
use voxrelay_core::config::Config;
use voxrelay_core::credentials::Credentials;
use voxrelay_core::session::SessionContext;

/// State shared by all handlers.
///
/// The session mutex is held for a whole run, which serializes runs.
pub struct GatewayState {
    pub config: Arc<Config>,
    pub pipeline: Pipeline,
    pub session: Mutex<SessionContext>,
    runs: AtomicU64,
}

impl GatewayState {
    pub fn new(config: Arc<Config>, pipeline: Pipeline, credentials: Credentials) -> Self {
        let session = SessionContext::new(
            credentials,
            config.default_languages(),
            config.default_mode(),
        );
        Self {
            config,
            pipeline,
            session: Mutex::new(session),
            runs: AtomicU64::new(0),
        }
    }

    /// Build state from config alone: HTTP clients and environment credentials.
    pub fn from_config(config: Arc<Config>) -> Self {
        let pipeline = Pipeline::from_config(&config);
        let credentials = Credentials::resolve(&config);
        Self::new(config, pipeline, credentials)
    }

    pub fn next_run_id(&self) -> u64 {
        self.runs.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn runs_started(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }
}
