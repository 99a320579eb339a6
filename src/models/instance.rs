// Backend instance configuration models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transport scheme for HTTP-speaking backends; serializes lowercase ("http", "https").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub fn scheme(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Which query interface the backends speak. Closed set; unknown names are rejected on parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiKind {
    /// Livestatus query language (LQL) over TCP.
    Livestatus,
    /// nagios-api REST endpoint (`GET /state`).
    NagiosApi,
}

impl ApiKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiKind::Livestatus => "livestatus",
            ApiKind::NagiosApi => "nagios-api",
        }
    }
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported backend kind: {0:?}")]
pub struct UnsupportedApiKind(pub String);

impl FromStr for ApiKind {
    type Err = UnsupportedApiKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "livestatus" => Ok(ApiKind::Livestatus),
            "nagios-api" | "nagios_api" | "nagiosapi" => Ok(ApiKind::NagiosApi),
            _ => Err(UnsupportedApiKind(s.to_string())),
        }
    }
}

/// One configured monitoring source. Immutable for the duration of an aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendInstance {
    pub hostname: String,
    pub port: u16,
    #[serde(default)]
    pub protocol: Protocol,
    /// Display label and exclusion key.
    pub tag: String,
}

impl BackendInstance {
    /// Key used for this instance in transport stats ("hostname:port").
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}
