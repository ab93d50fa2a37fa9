///! Live views
///!
///! Redraws whenever the sync layer publishes a new state for the watched
///! collections, until Ctrl+C.

use crate::views::{self, EndpointRow, PodRow, WorkloadRow};
use crate::WatchCommands;
use super::NamespaceScope;
use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use kubedeploy_client::{ConsoleContext, LiveView, QueryState, ResourceKind};
use kubedeploy_common::health::DashboardSummary;
use kubedeploy_common::{EndpointSummary, Pod, WorkloadSummary};
use std::fmt::Write as _;
use std::io::Write;
use std::time::Duration;
use tabled::{Table, Tabled};

pub async fn handle_watch_command(
    command: WatchCommands,
    ctx: &ConsoleContext,
    scope: &NamespaceScope,
) -> Result<()> {
    let config = ctx.sync().config().clone();

    match command {
        WatchCommands::Dashboard => {
            let pods = ctx.watch_pods(scope.filter()).await;
            let workloads = ctx.watch_workloads(scope.filter()).await;
            let endpoints = ctx.watch_endpoints(scope.filter()).await;
            watch_dashboard(pods, workloads, endpoints).await?;
        }

        WatchCommands::Workloads => {
            let view = ctx.watch_workloads(scope.filter()).await;
            let interval = config.interval_for(ResourceKind::Workloads);
            watch_collection(view, "Deployments", interval, WorkloadRow::new).await?;
        }

        WatchCommands::Endpoints => {
            let view = ctx.watch_endpoints(scope.filter()).await;
            let interval = config.interval_for(ResourceKind::Endpoints);
            watch_collection(view, "Services", interval, EndpointRow::new).await?;
        }

        WatchCommands::Pods => {
            let view = ctx.watch_pods(scope.filter()).await;
            let interval = config.interval_for(ResourceKind::Pods);
            watch_collection(view, "Pods", interval, PodRow::new).await?;
        }
    }

    Ok(())
}

fn redraw(frame: &str) -> Result<()> {
    // Clear screen (ANSI escape code)
    print!("\x1B[2J\x1B[1;1H");
    print!("{}", frame);
    std::io::stdout().flush()?;
    Ok(())
}

async fn watch_collection<T, R>(
    mut view: LiveView<T>,
    title: &str,
    interval: Duration,
    row: impl Fn(&T, DateTime<Utc>) -> R,
) -> Result<()>
where
    T: Clone,
    R: Tabled,
{
    let mut state = view.snapshot();
    loop {
        redraw(&collection_frame(title, interval, &state, &row, Utc::now()))?;

        tokio::select! {
            update = view.changed() => state = update?,
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

fn collection_frame<T, R>(
    title: &str,
    interval: Duration,
    state: &QueryState<T>,
    row: impl Fn(&T, DateTime<Utc>) -> R,
    now: DateTime<Utc>,
) -> String
where
    R: Tabled,
{
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} (refreshing every {}s, press Ctrl+C to stop)",
        title.bold(),
        interval.as_secs()
    );
    if let Some(line) = views::status_line(&title.to_lowercase(), state) {
        let _ = writeln!(out, "{}", line);
    }

    if let Some(items) = &state.data {
        if items.is_empty() {
            let _ = writeln!(out, "{}", "No results found".yellow());
        } else {
            let rows: Vec<R> = items.iter().map(|item| row(item, now)).collect();
            let _ = writeln!(out, "{}", Table::new(rows));
        }
    }
    if let Some(updated) = state.updated_at {
        let _ = writeln!(out, "Last updated: {}", updated.format("%H:%M:%S"));
    }
    out
}

async fn watch_dashboard(
    mut pods: LiveView<Pod>,
    mut workloads: LiveView<WorkloadSummary>,
    mut endpoints: LiveView<EndpointSummary>,
) -> Result<()> {
    loop {
        let frame = dashboard_frame(&pods.snapshot(), &workloads.snapshot(), &endpoints.snapshot());
        redraw(&frame)?;

        tokio::select! {
            update = pods.changed() => { update?; }
            update = workloads.changed() => { update?; }
            update = endpoints.changed() => { update?; }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

/// Counts are recomputed from whatever each collection holds now
fn dashboard_frame(
    pods: &QueryState<Pod>,
    workloads: &QueryState<WorkloadSummary>,
    endpoints: &QueryState<EndpointSummary>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Dashboard (press Ctrl+C to stop)".bold());

    let status = [
        views::status_line("pods", pods),
        views::status_line("deployments", workloads),
        views::status_line("services", endpoints),
    ];
    for line in status.into_iter().flatten() {
        let _ = writeln!(out, "{}", line);
    }

    let summary = DashboardSummary::compute(pods.items(), workloads.items(), endpoints.items());
    out.push_str(&views::dashboard_detail(&summary));

    let degraded: Vec<&WorkloadSummary> = workloads.items().iter().filter(|w| !w.is_healthy()).collect();
    if !degraded.is_empty() {
        let _ = writeln!(out, "\nDegraded deployments:");
        for w in degraded {
            let _ = writeln!(out, "  {}/{} {}", w.namespace, w.name, views::readiness_badge(w));
        }
    }
    out
}
