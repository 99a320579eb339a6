// Multi-backend aggregation: query every wanted instance, tag its rows, fold into one view.
// Results are folded in instance order, so output is deterministic even when fetches overlap.

use futures_util::stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::backends::{BackendState, Backends};
use crate::models::{ApiKind, BackendInstance, ColumnMapping, StateMapping, TransportStats};

/// What to do with the column mapping when instances report different ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnPolicy {
    /// Keep the mapping of the last successfully queried instance.
    #[default]
    LastWins,
    /// The first successful mapping is authoritative; mismatching instances are reported and skipped.
    Uniform,
}

#[derive(Debug, Clone)]
pub struct AggregateOptions {
    pub column_policy: ColumnPolicy,
    /// Upper bound on in-flight backend queries (1 = one at a time).
    pub max_concurrent_fetches: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            column_policy: ColumnPolicy::LastWins,
            max_concurrent_fetches: 1,
        }
    }
}

/// Merged state of all queried instances.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateResult {
    pub state: StateMapping,
    pub columns: ColumnMapping,
    pub errors: Vec<String>,
    pub transport_stats: TransportStats,
}

impl AggregateResult {
    /// Folds one instance's backend answer into the running result.
    pub fn absorb(
        mut self,
        instance: &BackendInstance,
        fetched: BackendState,
        policy: ColumnPolicy,
    ) -> Self {
        let rows = match fetched.rows {
            Ok(rows) => rows,
            Err(e) => {
                self.errors.push(format!(
                    "Could not connect to API on host {}, port {}: {}",
                    instance.hostname, instance.port, e
                ));
                return self;
            }
        };

        match policy {
            ColumnPolicy::LastWins => self.columns = fetched.columns,
            ColumnPolicy::Uniform if self.columns.is_empty() => self.columns = fetched.columns,
            ColumnPolicy::Uniform if self.columns != fetched.columns => {
                self.errors.push(format!(
                    "Column mapping mismatch on host {}, port {}: its rows were not merged",
                    instance.hostname, instance.port
                ));
                return self;
            }
            ColumnPolicy::Uniform => {}
        }

        for (name, mut record) in rows {
            record.set_tag(&instance.tag);
            self.state.insert(name, record);
        }
        self.transport_stats.extend(fetched.transport);
        self
    }
}

/// Queries every instance whose tag is not excluded and merges the answers.
///
/// Instances are handled in the given order: it decides error order, merge precedence on
/// colliding entity names (last wins) and which column mapping survives. A failing instance
/// adds one entry to `errors` and never stops the run.
pub async fn aggregate(
    backends: &Backends,
    instances: &[BackendInstance],
    excluded_tags: &HashSet<String>,
    api_kind: ApiKind,
    options: &AggregateOptions,
) -> AggregateResult {
    let wanted = instances
        .iter()
        .filter(|instance| !excluded_tags.contains(&instance.tag));
    let fetches: Vec<_> = wanted
        .map(|instance| async move { (instance, backends.fetch_state(instance, api_kind).await) })
        .collect();

    let fetched: Vec<(&BackendInstance, BackendState)> = stream::iter(fetches)
        .buffered(options.max_concurrent_fetches.max(1))
        .collect()
        .await;

    fetched
        .into_iter()
        .fold(AggregateResult::default(), |acc, (instance, state)| {
            acc.absorb(instance, state, options.column_policy)
        })
}
