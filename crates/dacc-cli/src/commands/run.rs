use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use dacc_cluster::{ClusteringAggregator, FileSystemStore, JsonConstraintSource};
use dacc_core::HourPosition;
use dacc_jobs::{CcConfig, DailyRequest, Orchestrator, ReplayEngine, ScriptedOutcome};
use serde::de::DeserializeOwned;
use tabwriter::TabWriter;
use tracing::info;

pub struct RunArgs<'a> {
    pub request: &'a Path,
    pub constraints: &'a Path,
    pub outcomes: &'a Path,
    pub out: Option<&'a Path>,
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let file =
        File::open(path).with_context(|| format!("opening {what} '{}'", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("parsing {what} '{}'", path.display()))
}

pub fn handle(config: &CcConfig, args: RunArgs<'_>) -> Result<()> {
    let request: DailyRequest = read_json(args.request, "daily request")?;
    let outcomes: BTreeMap<HourPosition, ScriptedOutcome> =
        read_json(args.outcomes, "engine outcomes")?;
    let out = args
        .out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.export.output_root.clone());

    info!(
        "Running {} with {} requested hours, artifacts to {}",
        request.business_day,
        request.hours.len(),
        out.display()
    );

    let aggregator = ClusteringAggregator::new(
        Arc::new(JsonConstraintSource::new(args.constraints)),
        Arc::new(FileSystemStore::new(&out)),
        config,
    )?;
    let orchestrator = Orchestrator::new(
        Arc::new(ReplayEngine::new(outcomes)),
        Arc::new(aggregator),
        config,
    )?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    let (report, results) = runtime.block_on(async {
        let handle = orchestrator.dispatch_day(request)?;
        let tracker = Arc::clone(handle.tracker());
        let report = handle.wait().await?;
        anyhow::Ok((report, tracker.results()))
    })?;

    let mut tw = TabWriter::new(io::stdout());
    writeln!(tw, "POS\tINTERVAL\tSTATUS\tDETAIL")?;
    for (position, result) in &results {
        let detail = match (result.error(), result.artifacts()) {
            (Some((kind, message)), _) => format!("{kind}: {message}"),
            (None, Some(artifacts)) => artifacts.rao_result.clone(),
            (None, None) => String::new(),
        };
        writeln!(
            tw,
            "{position}\t{}\t{}\t{detail}",
            result.interval,
            result.status.as_str()
        )?;
    }
    tw.flush()?;

    println!(
        "Document {}: {} success, {} failure",
        report.document_id, report.success, report.failure
    );
    for artifact in &report.artifacts {
        println!("  wrote {artifact}");
    }
    Ok(())
}
