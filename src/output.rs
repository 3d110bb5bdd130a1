//! This module is in charge of outputting the final analysis results to
//! various files

use crate::{
    config::{AnalysisMode, Flavor, RunConfiguration},
    evcut::{CutStage, SelectionCuts},
    histogram::Histogram,
    resfin::FinalResults,
    Result,
};

use eyre::WrapErr;
use log::info;
use serde::Serialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::Duration,
};

/// Locations of the output files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    /// Histogram snapshot
    pub histograms: PathBuf,

    /// Selected event table
    pub selected: PathBuf,

    /// Run summary
    pub summary: PathBuf,
}

/// What was analyzed, for the run summary
#[derive(Debug, Clone, Copy)]
pub struct RunInfo<'a> {
    /// Analysis configuration
    pub cfg: &'a RunConfiguration,

    /// Selection cuts
    pub cuts: &'a SelectionCuts,

    /// Flavor groups which were processed
    pub flavors: &'a [Flavor],
}

/// Output the analysis results to disk
pub fn dump_results(
    files: &OutputFiles,
    run: RunInfo<'_>,
    res: &FinalResults,
    elapsed_time: Duration,
) -> Result<()> {
    // Compute a timestamp of when the run ended
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .wrap_err("Failed to format the run timestamp")?;

    write_to(&files.histograms, |w| write_histograms(w, &timestamp, res))?;
    write_to(&files.selected, |w| write_selected(w, res))?;
    let summary = RunSummary::new(timestamp, run, res, elapsed_time);
    write_to(&files.summary, |w| {
        serde_json::to_writer_pretty(&mut *w, &summary)?;
        writeln!(w)?;
        Ok(())
    })?;

    info!(
        "Wrote {} histograms and {} selected events",
        res.histograms().count(),
        res.selected.len()
    );
    Ok(())
}

/// Create a file and fill it using some writer function
fn write_to(path: &Path, write: impl FnOnce(&mut BufWriter<File>) -> Result<()>) -> Result<()> {
    let file =
        File::create(path).wrap_err_with(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    writer
        .flush()
        .wrap_err_with(|| format!("Failed to write {}", path.display()))
}

/// Histogram snapshot, as written to disk
#[derive(Serialize)]
struct HistogramFile<'res> {
    /// When the snapshot was taken
    created: &'res str,

    /// Every histogram, in registration order
    histograms: Vec<HistogramEntry<'res>>,
}

/// One histogram of the snapshot
#[derive(Serialize)]
struct HistogramEntry<'res> {
    name: String,
    title: &'static str,
    #[serde(flatten)]
    histogram: &'res Histogram,
}

/// Write the histogram snapshot as a JSON document
pub fn write_histograms(writer: impl Write, timestamp: &str, res: &FinalResults) -> Result<()> {
    let file = HistogramFile {
        created: timestamp,
        histograms: res
            .histograms()
            .map(|named| HistogramEntry {
                name: named.name,
                title: named.title,
                histogram: named.histogram,
            })
            .collect(),
    };
    serde_json::to_writer(writer, &file)?;
    Ok(())
}

/// Write the selected event table, one JSON record per line
pub fn write_selected(mut writer: impl Write, res: &FinalResults) -> Result<()> {
    for event in &res.selected {
        serde_json::to_writer(&mut writer, event)?;
        writeln!(writer)?;
    }
    Ok(())
}

/// Events remaining after one stage of the selection
#[derive(Debug, Serialize)]
struct CutFlowEntry {
    stage: CutStage,
    rejected: usize,
    surviving: usize,
}

/// Summary of an analysis run
#[derive(Debug, Serialize)]
struct RunSummary {
    finished: String,
    elapsed_seconds: f64,
    seconds_per_event: f64,
    mode: AnalysisMode,
    cut_run: String,
    runs: Vec<String>,
    flavors: Vec<Flavor>,
    processed_events: usize,
    failed_events: usize,
    selected_events: usize,
    cut_flow: Vec<CutFlowEntry>,
}
//
impl RunSummary {
    fn new(finished: String, run: RunInfo<'_>, res: &FinalResults, elapsed: Duration) -> Self {
        let elapsed_seconds = elapsed.as_secs_f64();
        let processed_events = res.processed_events();
        #[allow(clippy::cast_precision_loss)]
        let seconds_per_event = elapsed_seconds / processed_events.max(1) as f64;
        Self {
            finished,
            elapsed_seconds,
            seconds_per_event,
            mode: run.cfg.mode,
            cut_run: run.cuts.run.to_string(),
            runs: run.cfg.runs().map(|(period, _)| period.to_string()).collect(),
            flavors: run.flavors.to_vec(),
            processed_events,
            failed_events: res.failed_events,
            selected_events: res.cut_flow.accepted(),
            cut_flow: res
                .cut_flow
                .surviving()
                .map(|(stage, surviving)| CutFlowEntry {
                    stage,
                    rejected: res.cut_flow.rejected(stage),
                    surviving,
                })
                .collect(),
        }
    }
}
