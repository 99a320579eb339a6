// Backend query capability: every backend kind answers with the same BackendState shape

pub mod http;
pub mod livestatus;
pub mod nagios_api;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{ApiKind, BackendInstance, ColumnMapping, StateMapping, TransportStats};

pub use livestatus::LivestatusBackend;
pub use nagios_api::NagiosApiBackend;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    HttpStatus(u16),
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("API reported failure: {0}")]
    Api(String),
    #[error("livestatus returned status {code}: {message}")]
    Livestatus { code: u16, message: String },
    #[error("connection failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("unsupported backend kind: {0}")]
    UnsupportedKind(ApiKind),
}

/// Outcome of querying one instance. Always carries all three parts; `rows` says whether it worked.
#[derive(Debug)]
pub struct BackendState {
    pub rows: Result<StateMapping, BackendError>,
    pub columns: ColumnMapping,
    pub transport: TransportStats,
}

impl BackendState {
    pub fn failed(error: BackendError, columns: ColumnMapping, transport: TransportStats) -> Self {
        Self {
            rows: Err(error),
            columns,
            transport,
        }
    }
}

/// A status source that can be asked for the full host/service state of one instance.
#[async_trait]
pub trait StatusBackend: Send + Sync {
    fn kind(&self) -> ApiKind;

    /// Logical column -> native field names used in this backend's rows.
    fn column_mapping(&self) -> ColumnMapping;

    async fn fetch_state(&self, instance: &BackendInstance) -> BackendState;
}

/// Client settings shared by the built-in backends.
#[derive(Debug, Clone)]
pub struct BackendClientConfig {
    pub request_timeout: Duration,
}

impl Default for BackendClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Dispatch table from API kind to backend implementation.
#[derive(Clone, Default)]
pub struct Backends {
    by_kind: HashMap<ApiKind, Arc<dyn StatusBackend>>,
}

impl Backends {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both built-in backends (nagios-api over HTTP, Livestatus over TCP).
    pub fn standard(config: &BackendClientConfig) -> Result<Self, BackendError> {
        Ok(Self::new()
            .register(Arc::new(NagiosApiBackend::new(config)?))
            .register(Arc::new(LivestatusBackend::new(config))))
    }

    /// Registers `backend` under its own kind, replacing any previous one.
    pub fn register(mut self, backend: Arc<dyn StatusBackend>) -> Self {
        self.by_kind.insert(backend.kind(), backend);
        self
    }

    pub fn supports(&self, kind: ApiKind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    /// Queries `instance` with the backend registered for `kind`.
    /// A kind with no backend is reported as an error for that instance.
    pub async fn fetch_state(&self, instance: &BackendInstance, kind: ApiKind) -> BackendState {
        match self.by_kind.get(&kind) {
            Some(backend) => backend.fetch_state(instance).await,
            None => BackendState::failed(
                BackendError::UnsupportedKind(kind),
                ColumnMapping::default(),
                TransportStats::new(),
            ),
        }
    }
}
