// Fetch JSON over HTTP(S) and record transport stats for the exchange

use bytes::Bytes;
use reqwest::{Client, StatusCode, header};
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

use super::BackendError;
use crate::models::{BackendInstance, TransportStat};

pub fn endpoint_url(instance: &BackendInstance, path: &str) -> String {
    format!(
        "{}://{}:{}{}",
        instance.protocol.scheme(),
        instance.hostname,
        instance.port,
        path
    )
}

/// GET `path` on the instance and decode the body as JSON.
/// Anything but 200 is an error; gzip bodies are accepted and decoded by the client.
pub async fn fetch_json(
    client: &Client,
    instance: &BackendInstance,
    path: &str,
) -> Result<(Value, TransportStat), BackendError> {
    let url = endpoint_url(instance, path);
    let started = Instant::now();

    let response = client.get(&url).send().await?;
    let status = response.status();
    if status != StatusCode::OK {
        return Err(BackendError::HttpStatus(status.as_u16()));
    }
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: Bytes = response.bytes().await?;

    let stat = TransportStat {
        url,
        status_code: status.as_u16(),
        total_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        size_download: body.len() as u64,
        content_type,
    };
    debug!(
        url = %stat.url,
        bytes = stat.size_download,
        elapsed_ms = stat.total_time_ms,
        "fetched JSON"
    );

    let json = serde_json::from_slice(&body).map_err(|e| BackendError::Decode(e.to_string()))?;
    Ok((json, stat))
}
