// Shared test helpers: scripted backend and record builders
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use statusboard::backends::{BackendError, BackendState, StatusBackend};
use statusboard::models::*;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub enum StubReply {
    Rows(StateMapping),
    Fail(String),
}

/// Backend that answers from a script keyed by hostname and records which hosts it was asked.
pub struct StubBackend {
    kind: ApiKind,
    columns: ColumnMapping,
    columns_by_host: HashMap<String, ColumnMapping>,
    replies: HashMap<String, StubReply>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl StubBackend {
    pub fn new(kind: ApiKind) -> Self {
        Self {
            kind,
            columns: ColumnMapping::from_pairs([(columns::STATE, "current_state")]),
            columns_by_host: HashMap::new(),
            replies: HashMap::new(),
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn rows(mut self, hostname: &str, rows: StateMapping) -> Self {
        self.replies
            .insert(hostname.to_string(), StubReply::Rows(rows));
        self
    }

    pub fn fail(mut self, hostname: &str, message: &str) -> Self {
        self.replies
            .insert(hostname.to_string(), StubReply::Fail(message.to_string()));
        self
    }

    pub fn columns_for(mut self, hostname: &str, columns: ColumnMapping) -> Self {
        self.columns_by_host.insert(hostname.to_string(), columns);
        self
    }

    pub fn delay(mut self, hostname: &str, delay: Duration) -> Self {
        self.delays.insert(hostname.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusBackend for StubBackend {
    fn kind(&self) -> ApiKind {
        self.kind
    }

    fn column_mapping(&self) -> ColumnMapping {
        self.columns.clone()
    }

    async fn fetch_state(&self, instance: &BackendInstance) -> BackendState {
        self.calls.lock().unwrap().push(instance.hostname.clone());
        if let Some(delay) = self.delays.get(&instance.hostname) {
            tokio::time::sleep(*delay).await;
        }
        let columns = self
            .columns_by_host
            .get(&instance.hostname)
            .cloned()
            .unwrap_or_else(|| self.column_mapping());
        match self.replies.get(&instance.hostname) {
            Some(StubReply::Rows(rows)) => BackendState {
                rows: Ok(rows.clone()),
                columns,
                transport: TransportStats::from([(
                    instance.address(),
                    TransportStat {
                        url: format!("http://{}/state", instance.address()),
                        status_code: 200,
                        total_time_ms: 1.0,
                        size_download: 128,
                        content_type: Some("application/json".into()),
                    },
                )]),
            },
            Some(StubReply::Fail(message)) => BackendState::failed(
                BackendError::Api(message.clone()),
                columns,
                TransportStats::new(),
            ),
            None => BackendState::failed(
                BackendError::Decode("no scripted reply".into()),
                columns,
                TransportStats::new(),
            ),
        }
    }
}

pub fn instance(hostname: &str, port: u16, tag: &str) -> BackendInstance {
    BackendInstance {
        hostname: hostname.to_string(),
        port,
        protocol: Protocol::Http,
        tag: tag.to_string(),
    }
}

/// Builds a record from a JSON object literal.
pub fn record(fields: Value) -> StatusRecord {
    match fields {
        Value::Object(map) => StatusRecord::from_map(map),
        other => panic!("record() needs a JSON object, got {other}"),
    }
}

/// Builds a state mapping from (entity name, JSON object) pairs.
pub fn state(entries: Vec<(&str, Value)>) -> StateMapping {
    entries
        .into_iter()
        .map(|(name, fields)| (name.to_string(), record(fields)))
        .collect()
}
