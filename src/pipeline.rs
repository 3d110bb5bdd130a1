//! Processing of individual events, from selection to histogram filling

use crate::{
    candidate::CandidateProcessor,
    channel::Channel,
    config::{Flavor, RunConfiguration},
    error::{ConfigError, DataError},
    evcut::{CutStage, SelectionCuts},
    event::{Event, SelectedEvent},
    resacc::{AccumulatorOptions, ResultsAccumulator},
    rescont::EventContribution,
    scheduling,
    source::{EventRecord, RecordReader},
    weight::{FlavorWeights, WeightCalculator},
};

use log::{info, trace, warn};

use std::{path::PathBuf, time::Instant};

/// What became of an event which could be processed
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// The event failed some stage of the selection
    Rejected(CutStage),

    /// The event was selected, and contributes to the histograms
    Accepted(EventContribution),
}

/// Event processing for one flavor group of simulated files
pub struct EventPipeline<'cfg> {
    /// Analysis configuration
    cfg: &'cfg RunConfiguration,

    /// Selection cuts
    cuts: &'cfg SelectionCuts,

    /// Per-run weights of the flavor being processed
    weights: FlavorWeights<'cfg>,

    /// Candidate observables
    candidates: CandidateProcessor,

    /// Optional histogramming features
    options: AccumulatorOptions,
}
//
impl<'cfg> EventPipeline<'cfg> {
    /// Prepare to process events of some flavor
    pub fn new(
        cfg: &'cfg RunConfiguration,
        cuts: &'cfg SelectionCuts,
        flavor: Flavor,
        options: AccumulatorOptions,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            cfg,
            cuts,
            weights: WeightCalculator::new(cfg).for_flavor(flavor)?,
            candidates: CandidateProcessor::new(cfg.beam_direction),
            options,
        })
    }

    /// Flavor of the events being processed
    pub fn flavor(&self) -> Flavor {
        self.weights.flavor()
    }

    /// Select, classify and weight one event
    ///
    /// Everything that can fail is done here, so that the resulting
    /// contribution can always be integrated in full.
    ///
    pub fn process_event(&self, event: &Event) -> Result<EventOutcome, DataError> {
        if let Err(stage) = self.cuts.evaluate(event) {
            return Ok(EventOutcome::Rejected(stage));
        }
        let channel = Channel::classify(event.interaction_mode);
        let candidates = self.candidates.process(event)?;
        let posc = self.cfg.oscillation.probability(event.true_energy);
        let selected = SelectedEvent::new(
            event,
            &self.cfg.beam_direction,
            channel,
            self.flavor(),
            posc,
        );
        let weights = self.weights.weights(event.true_energy);
        trace!(
            "Selected {channel} event at E = {:.2} MeV, P(osc) = {posc:.4}",
            event.reco_energy
        );
        Ok(EventOutcome::Accepted(EventContribution::new(
            selected, weights, candidates,
        )))
    }

    /// Process a batch of consecutive records, starting at some index
    pub fn process_batch(&self, first_index: usize, records: &[EventRecord]) -> ResultsAccumulator {
        let mut accumulator = ResultsAccumulator::new(self.options);
        for (index, record) in (first_index..).zip(records) {
            let outcome = record
                .as_ref()
                .map_err(Clone::clone)
                .and_then(|event| self.process_event(event));
            match outcome {
                Ok(EventOutcome::Rejected(stage)) => accumulator.reject(stage),
                Ok(EventOutcome::Accepted(contrib)) => accumulator.integrate(contrib),
                Err(e) => {
                    warn!("Skipping {} event #{index}: {e}", self.flavor());
                    accumulator.record_failure();
                }
            }
        }
        accumulator
    }

    /// Process consecutive records of the flavor group, starting at some
    /// index, and merge the results into an accumulator
    pub fn process_chunk(
        &self,
        accumulator: &mut ResultsAccumulator,
        first_index: usize,
        records: &[EventRecord],
    ) {
        scheduling::run_analysis(accumulator, first_index, records, |first, batch| {
            self.process_batch(first, batch)
        })
    }

    /// Process every record of the flavor group, as configured at build time
    pub fn run(&self, records: &[EventRecord]) -> ResultsAccumulator {
        let mut accumulator = ResultsAccumulator::new(self.options);
        self.process_chunk(&mut accumulator, 0, records);
        accumulator
    }

    /// Stream the records of the flavor group's files through the analysis,
    /// one chunk at a time
    pub fn run_files(&self, paths: &[PathBuf]) -> crate::Result<ResultsAccumulator> {
        let mut reader = RecordReader::new(paths)?;
        let mut accumulator = ResultsAccumulator::new(self.options);
        let mut chunk = Vec::with_capacity(scheduling::CHUNK_SIZE);
        let mut first_index = 0;
        let start_time = Instant::now();
        loop {
            reader.read_chunk(&mut chunk, scheduling::CHUNK_SIZE)?;
            if chunk.is_empty() {
                break;
            }
            self.process_chunk(&mut accumulator, first_index, &chunk);
            first_index += chunk.len();

            let progress = reader.progress();
            let elapsed = start_time.elapsed().as_secs_f64();
            let remaining = if progress > 0. {
                elapsed * (1. - progress) / progress
            } else {
                0.
            };
            info!(
                "{}: {first_index} records analyzed ({:.1}%, ETA {remaining:.0}s)",
                self.flavor(),
                100. * progress
            );
        }
        Ok(accumulator)
    }
}
