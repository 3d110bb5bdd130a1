//! NCQE selection: event selection and histogramming for a neutrino
//! neutral-current quasi-elastic analysis
//!
//!
//! # Introduction (for the physicist)
//!
//! Neutral-current quasi-elastic (NCQE) interactions of beam neutrinos on
//! oxygen leave an excited nucleus behind, whose de-excitation gamma-rays are
//! seen in the detector as a low-energy prompt event. The knocked-out nucleon
//! often produces neutrons, which thermalize and are captured on hydrogen or
//! gadolinium some hundreds of microseconds later.
//!
//! This program takes simulated events, applies the NCQE selection to the
//! prompt event, classifies the true interaction channel, and histograms the
//! prompt observables and the neutron capture candidates, weighted by the
//! exposure of each run period that the analysis covers.
//!
//!
//! # Introduction (for the computer guy)
//!
//! The analysis is a straight pipeline:
//!
//! * read in the analysis tables and resolve them for one analysis mode
//! * group the input files by neutrino flavor
//! * for each event of each flavor group,
//!     * apply the selection cuts,
//!     * classify the interaction channel,
//!     * derive the neutron candidate observables,
//!     * compute the weight of the event in each run period,
//!     * fill the histograms of its channel and the inclusive ones
//! * then store the histograms, the selected events and a run summary.
//!
//! Events are processed in fixed-size batches, whose results are merged in
//! order, so that multi-threaded runs reproduce sequential ones bit by bit.

#![warn(missing_docs)]

pub mod candidate;
pub mod channel;
pub mod config;
pub mod error;
pub mod evcut;
pub mod event;
pub mod fluxtune;
pub mod histogram;
pub mod linalg;
pub mod observables;
pub mod oscillation;
pub mod output;
pub mod pipeline;
pub mod resacc;
pub mod rescont;
pub mod resfin;
pub mod scheduling;
pub mod source;
pub mod store;
pub mod weight;

/// We'll use eyre's type-erased result type throughout the application
pub type Result<T> = eyre::Result<T>;
