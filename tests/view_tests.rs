// Dashboard view tests: tag suppression, problem extraction, rendering

mod common;

use common::state;
use serde_json::json;
use statusboard::aggregator::AggregateResult;
use statusboard::backends::{livestatus, nagios_api};
use statusboard::render::Renderer;
use statusboard::view::{DashboardView, ViewContext, format_duration, render_tag};

#[test]
fn tag_is_suppressed_with_a_single_instance() {
    assert_eq!(render_tag("critical", 1), None);
    assert_eq!(render_tag("critical", 0), None);
}

#[test]
fn tag_is_rendered_with_several_instances() {
    let html = render_tag("critical", 3).unwrap();
    assert_eq!(html, "<span class='tag tag_critical'>critical</span>");
}

#[test]
fn tag_markup_is_escaped() {
    let html = render_tag("<b>", 2).unwrap();
    assert!(!html.contains("<b>"));
    assert!(html.contains("&lt;b&gt;"));
}

#[test]
fn durations_use_two_largest_units() {
    assert_eq!(format_duration(42), "42s");
    assert_eq!(format_duration(125), "2m 5s");
    assert_eq!(format_duration(3 * 3600 + 60), "3h 1m");
    assert_eq!(format_duration(2 * 86_400 + 5 * 3600), "2d 5h");
    assert_eq!(format_duration(-10), "0s");
}

fn ctx(instance_count: usize) -> ViewContext {
    ViewContext {
        title: "Ops".into(),
        refresh_secs: 30,
        instance_count,
        ..ViewContext::default()
    }
}

fn nagios_api_result() -> AggregateResult {
    AggregateResult {
        state: state(vec![
            (
                "web01",
                json!({
                    "current_state": "1",
                    "plugin_output": "PING CRITICAL",
                    "last_state_change": 900,
                    "current_attempt": "3",
                    "max_attempts": "3",
                    "tag": "east",
                    "services": {}
                }),
            ),
            (
                "web02",
                json!({
                    "current_state": "0",
                    "last_state_change": 100,
                    "tag": "west",
                    "services": {
                        "HTTP": {"current_state": "2", "plugin_output": "timeout", "last_state_change": 500},
                        "SSH": {"current_state": "0", "last_state_change": 50},
                        "Disk": {"current_state": "1", "plugin_output": "85%", "last_state_change": 700,
                                 "problem_has_been_acknowledged": "1"}
                    }
                }),
            ),
        ]),
        columns: nagios_api::column_mapping(),
        errors: vec!["Could not connect to API on host x, port 1: down".into()],
        transport_stats: Default::default(),
    }
}

#[test]
fn view_lists_problems_newest_first() {
    let view = DashboardView::build(&nagios_api_result(), ctx(2), 1000);

    assert_eq!(view.hosts_down.len(), 1);
    let host = &view.hosts_down[0];
    assert_eq!(host.host, "web01");
    assert_eq!(host.state_label, "DOWN");
    assert_eq!(host.attempt, "3/3");
    assert_eq!(host.duration, "1m 40s");
    assert_eq!(
        host.tag_html.as_deref(),
        Some("<span class='tag tag_east'>east</span>")
    );

    let services: Vec<_> = view
        .services_broken
        .iter()
        .map(|r| r.service.as_deref().unwrap())
        .collect();
    assert_eq!(services, vec!["Disk", "HTTP"]);
    assert_eq!(view.services_broken[0].state_label, "WARNING");
    assert!(view.services_broken[0].acknowledged);
    assert_eq!(view.services_broken[0].tag.as_deref(), Some("west"));
    assert_eq!(view.services_broken[1].state_label, "CRITICAL");
    assert_eq!(view.errors.len(), 1);
}

#[test]
fn view_reads_fields_through_the_column_mapping() {
    let result = AggregateResult {
        state: state(vec![(
            "db01",
            json!({
                "name": "db01",
                "state": 2,
                "plugin_output": "unreachable",
                "last_state_change": 10,
                "current_attempt": 1,
                "max_check_attempts": 5,
                "tag": "lab",
                "services": {}
            }),
        )]),
        columns: livestatus::column_mapping(),
        ..AggregateResult::default()
    };
    let view = DashboardView::build(&result, ctx(1), 20);
    assert_eq!(view.hosts_down.len(), 1);
    assert_eq!(view.hosts_down[0].state_label, "UNREACHABLE");
    assert_eq!(view.hosts_down[0].attempt, "1/5");
    assert_eq!(view.hosts_down[0].output, "unreachable");
    assert_eq!(view.hosts_down[0].tag_html, None);
}

#[test]
fn dashboard_template_renders_problems_and_errors() {
    let renderer = Renderer::new().unwrap();
    let view = DashboardView::build(&nagios_api_result(), ctx(2), 1000);
    let page = renderer.render_dashboard(&view).unwrap();
    assert!(page.contains("<title>Ops</title>"));
    assert!(page.contains("web01"));
    assert!(page.contains("PING CRITICAL"));
    assert!(page.contains("<span class='tag tag_east'>east</span>"));
    assert!(page.contains("Could not connect to API on host x, port 1: down"));
    assert!(page.contains("http-equiv=\"refresh\" content=\"30\""));
}
