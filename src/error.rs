//! Error taxonomy of the analysis
//!
//! Configuration problems are always fatal and surface while the analysis is
//! being set up. Data problems only ever concern a single event, which is then
//! skipped and accounted for. Events which fail the selection are not errors.

use crate::config::{AnalysisMode, Flavor, RunPeriod};

use std::path::PathBuf;

use thiserror::Error;

/// Fatal problem with the analysis tables or with the requested analysis
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The analysis mode has no entry in the tables
    #[error("unknown analysis mode {0}")]
    UnknownAnalysisMode(AnalysisMode),

    /// A run period has no exposure
    #[error("unknown run period \"{0}\" (no exposure recorded)")]
    UnknownRunPeriod(RunPeriod),

    /// A run period has no linear cut thresholds
    #[error("no cut thresholds for run period \"{0}\"")]
    MissingCutThreshold(RunPeriod),

    /// The analysis mode does not define the Cherenkov angle cut
    #[error("no Cherenkov angle cut defined for analysis mode {0}")]
    MissingCherenkovCut(AnalysisMode),

    /// A flavor has no cross-section normalization in this analysis mode
    #[error("no cross-section scale for flavor {flavor} in analysis mode {mode}")]
    MissingCrossSectionScale {
        /// Flavor which was looked up
        flavor: Flavor,
        /// Analysis mode whose scales were searched
        mode: AnalysisMode,
    },

    /// A file name does not carry a recognized neutrino flavor
    #[error("unknown neutrino flavor tag \"{0}\"")]
    UnknownFlavor(String),

    /// A table is inconsistent
    #[error("invalid analysis table: {0}")]
    InvalidTable(String),

    /// A reweighting table could not be loaded
    #[error("failed to load reweighting table {path:?}: {reason}")]
    FluxTune {
        /// Location of the table
        path: PathBuf,
        /// What went wrong
        reason: String,
    },
}

/// Problem with one event's data, which only aborts that event
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// A candidate sits exactly on the prompt vertex, so it has no direction
    #[error("candidate {index} coincides with the reconstructed vertex")]
    DegenerateDirection {
        /// Position of the candidate in the event's candidate list
        index: usize,
    },

    /// A detector record is not usable
    #[error("malformed detector record: {0}")]
    MalformedRecord(String),
}
