// Dashboard view model: the explicit parameter set handed to the template renderer

use serde::Serialize;
use std::collections::BTreeSet;

use crate::aggregator::AggregateResult;
use crate::models::{ColumnMapping, StatusRecord, columns};
use crate::ordering::compare_by_recency;

/// Tag badge markup, or `None` when only one instance is configured (a single tag says nothing).
pub fn render_tag(tag_name: &str, instance_count: usize) -> Option<String> {
    if instance_count <= 1 {
        return None;
    }
    let tag = tera::escape_html(tag_name);
    Some(format!("<span class='tag tag_{}'>{}</span>", tag, tag))
}

/// Page-level inputs that do not come from the backends.
#[derive(Debug, Clone, Default)]
pub struct ViewContext {
    pub title: String,
    pub refresh_secs: u64,
    pub instance_count: usize,
    pub known_tags: BTreeSet<String>,
    pub excluded_tags: BTreeSet<String>,
}

/// One host or service that is not OK.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemRow {
    pub host: String,
    pub service: Option<String>,
    pub tag: Option<String>,
    pub tag_html: Option<String>,
    pub state: i64,
    pub state_label: &'static str,
    pub output: String,
    pub acknowledged: bool,
    pub downtime: bool,
    pub notifications_enabled: bool,
    pub flapping: bool,
    pub attempt: String,
    pub last_state_change: i64,
    pub duration: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub title: String,
    pub refresh_secs: u64,
    pub instance_count: usize,
    pub errors: Vec<String>,
    pub hosts_down: Vec<ProblemRow>,
    pub services_broken: Vec<ProblemRow>,
    pub known_tags: Vec<String>,
    pub excluded_tags: Vec<String>,
}

impl DashboardView {
    /// Picks out non-OK hosts and services, newest state change first.
    /// `now` (epoch seconds) is used for the "since" durations.
    pub fn build(result: &AggregateResult, ctx: ViewContext, now: i64) -> Self {
        let cols = &result.columns;
        let mut hosts: Vec<(String, Option<String>, StatusRecord)> = Vec::new();
        let mut services: Vec<(String, Option<String>, StatusRecord)> = Vec::new();

        for (host, record) in &result.state {
            let tag = record.tag().map(str::to_string);
            if state_of(record, cols) != 0 {
                hosts.push((host.clone(), None, record.clone()));
            }
            for (description, mut svc) in record.services() {
                if state_of(&svc, cols) == 0 {
                    continue;
                }
                if let Some(tag) = &tag {
                    svc.set_tag(tag);
                }
                services.push((host.clone(), Some(description.to_string()), svc));
            }
        }

        hosts.sort_by(|a, b| compare_by_recency(&a.2, &b.2));
        services.sort_by(|a, b| compare_by_recency(&a.2, &b.2));

        let to_row = |(host, service, record): (String, Option<String>, StatusRecord)| {
            problem_row(host, service, &record, cols, ctx.instance_count, now)
        };
        DashboardView {
            hosts_down: hosts.into_iter().map(to_row).collect(),
            services_broken: services.into_iter().map(to_row).collect(),
            errors: result.errors.clone(),
            title: ctx.title,
            refresh_secs: ctx.refresh_secs,
            instance_count: ctx.instance_count,
            known_tags: ctx.known_tags.into_iter().collect(),
            excluded_tags: ctx.excluded_tags.into_iter().collect(),
        }
    }
}

fn state_of(record: &StatusRecord, cols: &ColumnMapping) -> i64 {
    record.get_i64(cols.field(columns::STATE)).unwrap_or(0)
}

fn flag(record: &StatusRecord, cols: &ColumnMapping, column: &str) -> bool {
    record.get_i64(cols.field(column)).unwrap_or(0) != 0
}

fn problem_row(
    host: String,
    service: Option<String>,
    record: &StatusRecord,
    cols: &ColumnMapping,
    instance_count: usize,
    now: i64,
) -> ProblemRow {
    let state = state_of(record, cols);
    let tag = record.tag().map(str::to_string);
    let attempt = match (
        record.get_text(cols.field(columns::CURRENT_ATTEMPT)),
        record.get_text(cols.field(columns::MAX_ATTEMPTS)),
    ) {
        (Some(cur), Some(max)) => format!("{}/{}", cur, max),
        (Some(cur), None) => cur,
        _ => String::new(),
    };
    let last_state_change = record.last_state_change();
    ProblemRow {
        state_label: state_label(state, service.is_some()),
        tag_html: tag.as_deref().and_then(|t| render_tag(t, instance_count)),
        tag,
        host,
        service,
        state,
        output: record
            .get_text(cols.field(columns::OUTPUT))
            .unwrap_or_default(),
        acknowledged: flag(record, cols, columns::ACKNOWLEDGED),
        downtime: flag(record, cols, columns::DOWNTIME),
        notifications_enabled: flag(record, cols, columns::NOTIFICATIONS_ENABLED),
        flapping: flag(record, cols, columns::FLAPPING),
        attempt,
        last_state_change,
        duration: format_duration(now - last_state_change),
    }
}

pub fn state_label(state: i64, is_service: bool) -> &'static str {
    match (is_service, state) {
        (false, 0) => "UP",
        (false, 1) => "DOWN",
        (false, 2) => "UNREACHABLE",
        (true, 0) => "OK",
        (true, 1) => "WARNING",
        (true, 2) => "CRITICAL",
        _ => "UNKNOWN",
    }
}

/// Compact "how long ago": two most significant units, e.g. "3d 4h", "12m 5s".
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    let (d, h, m, s) = (
        secs / 86_400,
        secs % 86_400 / 3600,
        secs % 3600 / 60,
        secs % 60,
    );
    if d > 0 {
        format!("{}d {}h", d, h)
    } else if h > 0 {
        format!("{}h {}m", h, m)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}
