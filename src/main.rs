//! Command line driver of the NCQE selection

use clap::Parser;
use eyre::{bail, WrapErr};
use log::info;

use ncqe_select::{
    config::{AnalysisMode, AnalysisTables, RunConfiguration, RunPeriod},
    evcut::SelectionCuts,
    output::{self, OutputFiles, RunInfo},
    pipeline::EventPipeline,
    resacc::{AccumulatorOptions, ResultsAccumulator},
    source, Result,
};

use std::{path::PathBuf, time::Instant};

/// Select NCQE candidates in simulated events and histogram them
#[derive(Parser, Debug)]
#[command(name = "ncqe_select", version, about)]
struct Cli {
    /// Simulated event files (JSON lines), named like lentp_<flavor>.<...>
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file for the histograms
    #[arg(short = 'o', long, default_value = "ncqe_histogram_mc.json")]
    hist_output: PathBuf,

    /// Output file for the selected events
    #[arg(short = 't', long, default_value = "ncqe_selected_mc.jsonl")]
    tree_output: PathBuf,

    /// Output file for the run summary
    #[arg(long, default_value = "ncqe_summary.json")]
    summary_output: PathBuf,

    /// Analysis tables to use instead of the built-in ones
    #[arg(long)]
    tables: Option<PathBuf>,

    /// Directory containing the flux reweighting tables
    #[arg(short = 'f', long)]
    flux_dir: Option<PathBuf>,

    /// Analysis mode
    #[arg(long, default_value = "6")]
    mode: u8,

    /// Run period whose fit quality cut thresholds are applied
    #[arg(long, default_value = "11")]
    cut_run: String,

    /// Also histogram the inputs of the neutron tagging network
    #[arg(long)]
    with_nn_histograms: bool,

    /// Fill each tagging network input twice, like older analysis versions
    #[arg(long, requires = "with_nn_histograms")]
    legacy_nn_double_fill: bool,

    /// Log filter, overriding RUST_LOG (e.g. "debug")
    #[arg(long)]
    log_level: Option<String>,
}

/// This will act as our main function, with suitable error handling
fn main() -> Result<()> {
    let cli = Cli::parse();

    // ### LOGGING ###
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(filters) = &cli.log_level {
        logger.parse_filters(filters);
    }
    logger.init();

    // ### CONFIGURATION READOUT ###
    let tables = match &cli.tables {
        Some(path) => AnalysisTables::load(path)?,
        None => AnalysisTables::builtin()?,
    };
    let mode = AnalysisMode(cli.mode);
    let cfg = RunConfiguration::new(&tables, mode, cli.flux_dir.as_deref())
        .wrap_err("Failed to configure the analysis")?;
    cfg.log_summary();
    let cut_run = RunPeriod::from(cli.cut_run.as_str());
    let cuts = SelectionCuts::new(&tables, &cut_run, mode)
        .wrap_err("Failed to configure the selection cuts")?;
    info!("Cut run period         : {}", cuts.run);
    info!(
        "Cherenkov angle cut    : {} * E + {}",
        cuts.cherenkov.slope, cuts.cherenkov.intercept
    );
    let options = AccumulatorOptions {
        nn_histograms: cli.with_nn_histograms,
        legacy_nn_double_fill: cli.legacy_nn_double_fill,
    };

    // Group the input files by flavor, and check that every flavor can be
    // weighted before anything gets processed
    let groups = source::group_by_flavor(cli.inputs.iter().cloned())
        .wrap_err("Failed to identify the input files")?;
    if groups.is_empty() {
        bail!("Input MC files needed");
    }
    let pipelines = groups
        .iter()
        .map(|(&flavor, paths)| {
            EventPipeline::new(&cfg, &cuts, flavor, options).map(|pipeline| (pipeline, paths))
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .wrap_err("Failed to configure the event weighting")?;

    // ### ANALYSIS EXECUTION ###

    // Start the clock after configuration I/O
    let saved_time = Instant::now();

    let mut accumulator = ResultsAccumulator::new(options);
    for (pipeline, paths) in &pipelines {
        let flavor = pipeline.flavor();
        info!("Begin processing of {} {flavor} files", paths.len());
        let flavor_results = pipeline
            .run_files(paths)
            .wrap_err_with(|| format!("Failed to analyze the {flavor} files"))?;
        info!(
            "Selected {} of {} {flavor} events",
            flavor_results.cut_flow().accepted(),
            flavor_results.cut_flow().total() + flavor_results.failed_events()
        );
        accumulator.merge(flavor_results);
    }
    let results = accumulator.finalize();

    // ### RESULTS DISPLAY AND STORAGE ###

    // Measure how much time has elapsed
    let elapsed_time = saved_time.elapsed();
    results.log_summary();

    let files = OutputFiles {
        histograms: cli.hist_output,
        selected: cli.tree_output,
        summary: cli.summary_output,
    };
    let flavors = groups.keys().copied().collect::<Vec<_>>();
    let run = RunInfo {
        cfg: &cfg,
        cuts: &cuts,
        flavors: &flavors,
    };
    output::dump_results(&files, run, &results, elapsed_time)
        .wrap_err("Failed to output the results")?;

    // ...and we're done
    Ok(())
}
