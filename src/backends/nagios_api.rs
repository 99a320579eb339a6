// nagios-api backend: GET /state returns {"success": .., "content": {host: {.., "services": {..}}}}

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use super::http::fetch_json;
use super::{BackendClientConfig, BackendError, BackendState, StatusBackend};
use crate::models::{
    ApiKind, BackendInstance, ColumnMapping, StateMapping, StatusRecord, TransportStats, columns,
};

const STATE_PATH: &str = "/state";

pub struct NagiosApiBackend {
    client: Client,
}

impl NagiosApiBackend {
    pub fn new(config: &BackendClientConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

pub fn column_mapping() -> ColumnMapping {
    ColumnMapping::from_pairs([
        (columns::STATE, "current_state"),
        (columns::OUTPUT, "plugin_output"),
        (columns::ACKNOWLEDGED, "problem_has_been_acknowledged"),
        (columns::DOWNTIME, "scheduled_downtime_depth"),
        (columns::NOTIFICATIONS_ENABLED, "notifications_enabled"),
        (columns::FLAPPING, "is_flapping"),
        (columns::CURRENT_ATTEMPT, "current_attempt"),
        (columns::MAX_ATTEMPTS, "max_attempts"),
        (columns::LAST_STATE_CHANGE, "last_state_change"),
    ])
}

/// Extracts the host map from a `/state` response body and normalizes timestamps.
pub fn parse_state(body: Value) -> Result<StateMapping, BackendError> {
    let Value::Object(mut envelope) = body else {
        return Err(BackendError::Decode("expected a JSON object".into()));
    };
    let success = envelope
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    let content = envelope.remove("content").unwrap_or(Value::Null);
    if !success {
        let message = match content {
            Value::String(s) => s,
            other => other.to_string(),
        };
        return Err(BackendError::Api(message));
    }
    let Value::Object(hosts) = content else {
        return Err(BackendError::Decode("missing \"content\" object".into()));
    };

    let mut state = StateMapping::new();
    for (host, fields) in hosts {
        let Value::Object(fields) = fields else {
            warn!(host = %host, "skipping non-object host entry");
            continue;
        };
        let mut record = StatusRecord::from_map(fields);
        record.normalize_last_state_change();
        state.insert(host, record);
    }
    Ok(state)
}

#[async_trait]
impl StatusBackend for NagiosApiBackend {
    fn kind(&self) -> ApiKind {
        ApiKind::NagiosApi
    }

    fn column_mapping(&self) -> ColumnMapping {
        column_mapping()
    }

    async fn fetch_state(&self, instance: &BackendInstance) -> BackendState {
        let columns = self.column_mapping();
        let (body, stat) = match fetch_json(&self.client, instance, STATE_PATH).await {
            Ok(r) => r,
            Err(e) => {
                warn!(host = %instance.hostname, port = instance.port, error = %e, "nagios-api fetch failed");
                return BackendState::failed(e, columns, TransportStats::new());
            }
        };
        let transport = TransportStats::from([(instance.address(), stat)]);
        BackendState {
            rows: parse_state(body),
            columns,
            transport,
        }
    }
}
