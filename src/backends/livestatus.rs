// Livestatus backend: LQL queries over TCP with a fixed16 response header.
//
// Request:  GET <table>\nColumns: ..\nOutputFormat: json\nResponseHeader: fixed16\n\n
// Response: "<status:3> <length:11>\n" then <length> bytes of body (JSON rows, or an error text).

use async_trait::async_trait;
use bytes::BytesMut;
use serde_json::{Map, Value};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use super::{BackendClientConfig, BackendError, BackendState, StatusBackend};
use crate::models::{
    ApiKind, BackendInstance, ColumnMapping, StateMapping, StatusRecord, TransportStat,
    TransportStats, columns,
};

pub const HEADER_LEN: usize = 16;
/// Refuse bodies larger than this; a corrupt header must not trigger a huge allocation.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

pub const HOST_COLUMNS: &[&str] = &[
    "name",
    "state",
    "plugin_output",
    "last_state_change",
    "acknowledged",
    "scheduled_downtime_depth",
    "notifications_enabled",
    "is_flapping",
    "current_attempt",
    "max_check_attempts",
];

pub const SERVICE_COLUMNS: &[&str] = &[
    "host_name",
    "description",
    "state",
    "plugin_output",
    "last_state_change",
    "acknowledged",
    "scheduled_downtime_depth",
    "notifications_enabled",
    "is_flapping",
    "current_attempt",
    "max_check_attempts",
];

pub struct LivestatusBackend {
    timeout: Duration,
}

impl LivestatusBackend {
    pub fn new(config: &BackendClientConfig) -> Self {
        Self {
            timeout: config.request_timeout,
        }
    }
}

pub fn column_mapping() -> ColumnMapping {
    ColumnMapping::from_pairs([
        (columns::STATE, "state"),
        (columns::OUTPUT, "plugin_output"),
        (columns::ACKNOWLEDGED, "acknowledged"),
        (columns::DOWNTIME, "scheduled_downtime_depth"),
        (columns::NOTIFICATIONS_ENABLED, "notifications_enabled"),
        (columns::FLAPPING, "is_flapping"),
        (columns::CURRENT_ATTEMPT, "current_attempt"),
        (columns::MAX_ATTEMPTS, "max_check_attempts"),
        (columns::LAST_STATE_CHANGE, "last_state_change"),
    ])
}

pub fn build_query(table: &str, columns: &[&str]) -> String {
    format!(
        "GET {}\nColumns: {}\nOutputFormat: json\nResponseHeader: fixed16\n\n",
        table,
        columns.join(" ")
    )
}

/// Parses a fixed16 header into (status code, body length).
pub fn parse_header(header: &[u8]) -> Result<(u16, usize), BackendError> {
    let text = std::str::from_utf8(header)
        .map_err(|_| BackendError::Decode("response header is not ASCII".into()))?;
    let bad = || BackendError::Decode(format!("malformed response header {:?}", text));
    if header.len() != HEADER_LEN || !text.ends_with('\n') {
        return Err(bad());
    }
    let code = text
        .get(0..3)
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(bad)?;
    let len = text
        .get(4..15)
        .map(str::trim)
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(bad)?;
    Ok((code, len))
}

struct QueryReply {
    rows: Vec<Vec<Value>>,
    status: u16,
    bytes: u64,
}

impl LivestatusBackend {
    async fn query(
        &self,
        instance: &BackendInstance,
        table: &str,
        columns: &[&str],
    ) -> Result<QueryReply, BackendError> {
        let exchange = async {
            let mut stream =
                TcpStream::connect((instance.hostname.as_str(), instance.port)).await?;
            stream
                .write_all(build_query(table, columns).as_bytes())
                .await?;
            stream.shutdown().await?;

            let mut header = [0u8; HEADER_LEN];
            stream.read_exact(&mut header).await?;
            let (status, len) = parse_header(&header)?;
            if len > MAX_BODY_BYTES {
                return Err(BackendError::Decode(format!(
                    "response body of {} bytes exceeds limit",
                    len
                )));
            }
            let mut body = BytesMut::zeroed(len);
            stream.read_exact(&mut body).await?;

            if status != 200 {
                return Err(BackendError::Livestatus {
                    code: status,
                    message: String::from_utf8_lossy(&body).trim().to_string(),
                });
            }
            let rows: Vec<Vec<Value>> = serde_json::from_slice(&body)
                .map_err(|e| BackendError::Decode(format!("{} rows: {}", table, e)))?;
            Ok::<_, BackendError>(QueryReply {
                rows,
                status,
                bytes: (HEADER_LEN + len) as u64,
            })
        };
        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| BackendError::Timeout(self.timeout))?
    }
}

fn zip_row(
    table: &str,
    columns: &[&str],
    row: Vec<Value>,
) -> Result<Map<String, Value>, BackendError> {
    if row.len() != columns.len() {
        return Err(BackendError::Decode(format!(
            "{} row has {} values, expected {}",
            table,
            row.len(),
            columns.len()
        )));
    }
    Ok(columns.iter().map(|c| c.to_string()).zip(row).collect())
}

/// Builds the host map from `GET hosts` and `GET services` rows.
/// Services are nested under their host; services of hosts not in `hosts` are dropped.
pub fn assemble_state(
    hosts: Vec<Vec<Value>>,
    services: Vec<Vec<Value>>,
) -> Result<StateMapping, BackendError> {
    let mut state = StateMapping::new();
    for row in hosts {
        let fields = zip_row("hosts", HOST_COLUMNS, row)?;
        let Some(name) = fields
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
        else {
            continue;
        };
        let mut record = StatusRecord::from_map(fields);
        record.insert(crate::models::SERVICES, Value::Object(Map::new()));
        state.insert(name, record);
    }

    for row in services {
        let mut fields = zip_row("services", SERVICE_COLUMNS, row)?;
        let host = fields.remove("host_name");
        let description = fields.remove("description");
        let (Some(Value::String(host)), Some(Value::String(description))) = (host, description)
        else {
            continue;
        };
        match state.get_mut(&host) {
            Some(record) => record.insert_service(description, StatusRecord::from_map(fields)),
            None => {
                debug!(host = %host, service = %description, "service for unknown host dropped")
            }
        }
    }

    for record in state.values_mut() {
        record.normalize_last_state_change();
    }
    Ok(state)
}

#[async_trait]
impl StatusBackend for LivestatusBackend {
    fn kind(&self) -> ApiKind {
        ApiKind::Livestatus
    }

    fn column_mapping(&self) -> ColumnMapping {
        column_mapping()
    }

    async fn fetch_state(&self, instance: &BackendInstance) -> BackendState {
        let columns = self.column_mapping();
        let started = Instant::now();
        let replies = tokio::try_join!(
            self.query(instance, "hosts", HOST_COLUMNS),
            self.query(instance, "services", SERVICE_COLUMNS),
        );
        let (hosts, services) = match replies {
            Ok(r) => r,
            Err(e) => {
                warn!(host = %instance.hostname, port = instance.port, error = %e, "livestatus query failed");
                return BackendState::failed(e, columns, TransportStats::new());
            }
        };

        let stat = TransportStat {
            url: format!("livestatus://{}", instance.address()),
            status_code: hosts.status.max(services.status),
            total_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            size_download: hosts.bytes + services.bytes,
            content_type: None,
        };
        let transport = TransportStats::from([(instance.address(), stat)]);
        BackendState {
            rows: assemble_state(hosts.rows, services.rows),
            columns,
            transport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_parses_status_and_length() {
        assert_eq!(parse_header(b"200          42\n").unwrap(), (200, 42));
        assert_eq!(parse_header(b"404 17         \n").unwrap(), (404, 17));
    }

    #[test]
    fn header_rejects_garbage() {
        assert!(parse_header(b"HTTP/1.1 200 OK\n").is_err());
        assert!(parse_header(b"200 12").is_err());
    }

    #[test]
    fn query_lists_columns_and_requests_fixed16() {
        let q = build_query("hosts", &["name", "state"]);
        assert!(q.starts_with("GET hosts\n"));
        assert!(q.contains("Columns: name state\n"));
        assert!(q.contains("ResponseHeader: fixed16\n"));
        assert!(q.ends_with("\n\n"));
    }

    #[test]
    fn services_nest_under_their_host() {
        let hosts = vec![vec![
            json!("db01"),
            json!(0),
            json!("PING OK"),
            json!(1700000000),
            json!(0),
            json!(0),
            json!(1),
            json!(0),
            json!(1),
            json!(3),
        ]];
        let services = vec![
            vec![
                json!("db01"),
                json!("disk"),
                json!(2),
                json!("DISK CRITICAL"),
                json!(1700000500),
                json!(0),
                json!(0),
                json!(1),
                json!(0),
                json!(3),
                json!(3),
            ],
            vec![
                json!("ghost"),
                json!("load"),
                json!(1),
                json!("LOAD WARNING"),
                json!(1700000600),
                json!(0),
                json!(0),
                json!(1),
                json!(0),
                json!(1),
                json!(3),
            ],
        ];
        let state = assemble_state(hosts, services).unwrap();
        assert_eq!(state.len(), 1);
        let host = &state["db01"];
        let services: Vec<_> = host.services().collect();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].0, "disk");
        assert_eq!(services[0].1.get_i64("state"), Some(2));
        assert_eq!(services[0].1.last_state_change(), 1700000500);
    }

    #[test]
    fn short_row_is_a_decode_error() {
        let err = assemble_state(vec![vec![json!("db01")]], vec![]).unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }
}
