//! # tacit-backends
//!
//! HTTP clients for the two search backends:
//!
//! - [`TypesenseBackend`]: the Primary full-text engine
//! - [`TacitbaseBackend`]: the Secondary remote API, used for fallback and
//!   staging searches
//!
//! Both implement [`tacit_core::SearchBackend`] and are built once from a
//! [`BackendConfig`].

pub mod config;
pub mod tacitbase;
pub mod typesense;

use std::sync::Arc;
use std::time::Duration;

use tacit_core::{Result, SearchBackend};

pub use config::{BackendConfig, ConfigError, RemoteConfig, TypesenseConfig};
pub use tacitbase::{ResponseShape, TacitbaseBackend};
pub use typesense::TypesenseBackend;

/// Process-wide backend handles.
#[derive(Clone)]
pub struct Backends {
    pub primary: Arc<dyn SearchBackend>,
    pub secondary: Arc<dyn SearchBackend>,
}

impl Backends {
    /// Validate `config` and construct both clients.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        config.validate()?;
        let timeout = Duration::from_secs(config.timeout_secs);

        Ok(Self {
            primary: Arc::new(TypesenseBackend::new(config.typesense.clone(), timeout)?),
            secondary: Arc::new(TacitbaseBackend::new(config.remote.clone(), timeout)?),
        })
    }
}
