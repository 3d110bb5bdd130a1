//! This module allows integrating analysis results across simulated events

use crate::{
    channel::Channel,
    evcut::{CutFlow, CutStage},
    event::SelectedEvent,
    observables::{
        Category, NeutronFeature, NeutronKey, NnFeature, NnKey, PromptKey, PromptObservable,
        Selection, HISTOGRAMMED_STAGES,
    },
    rescont::EventContribution,
    resfin::FinalResults,
    store::HistogramStore,
};

/// Optional parts of the histogramming
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulatorOptions {
    /// Histogram the tagging network inputs of candidates
    pub nn_histograms: bool,

    /// Fill every tagging network input twice, as older versions of the
    /// analysis did, so that their outputs can be reproduced
    pub legacy_nn_double_fill: bool,
}

/// This struct accumulates the histograms, selected events and cut flow of a
/// set of events, and ultimately produces the final results
#[derive(Debug, Clone)]
pub struct ResultsAccumulator {
    // ### HISTOGRAMS ###
    /// Primary event observables
    prompt: HistogramStore<PromptKey>,

    /// Candidate kinematics
    neutron: HistogramStore<NeutronKey>,

    /// Candidate tagging network inputs, if requested
    network: Option<HistogramStore<NnKey>>,

    // ### BOOKKEEPING ###
    /// Flat records of the selected events, in input order
    selected: Vec<SelectedEvent>,

    /// Outcome of the selection
    cut_flow: CutFlow,

    /// Number of events which could not be processed
    failed_events: usize,

    /// Optional histogramming features
    options: AccumulatorOptions,
}
//
impl ResultsAccumulator {
    /// Prepare for results integration
    pub fn new(options: AccumulatorOptions) -> Self {
        Self {
            prompt: HistogramStore::new(PromptKey::all()),
            neutron: HistogramStore::new(NeutronKey::all()),
            network: options
                .nn_histograms
                .then(|| HistogramStore::new(NnKey::all())),
            selected: Vec::new(),
            cut_flow: CutFlow::default(),
            failed_events: 0,
            options,
        }
    }

    /// Account for an event which failed the selection
    pub fn reject(&mut self, stage: CutStage) {
        self.cut_flow.reject(stage);
    }

    /// Account for an event which could not be processed
    pub fn record_failure(&mut self) {
        self.failed_events += 1;
    }

    /// Integrate one selected event into the analysis results
    ///
    /// The event is filled once per analyzed run period, with the weight of
    /// that run, into its own channel and into the inclusive one.
    ///
    pub fn integrate(&mut self, contrib: EventContribution) {
        self.cut_flow.accept();
        let channels = [contrib.channel(), Channel::All];
        let selected = contrib.selected();
        let candidates = contrib.candidates();
        let nn_fills = if self.options.legacy_nn_double_fill {
            2
        } else {
            1
        };

        for &weight in contrib.weights() {
            for stage in HISTOGRAMMED_STAGES {
                // Primary event
                for observable in PromptObservable::ALL {
                    let value = observable.value(selected);
                    for selection in Selection::ALL {
                        for channel in channels {
                            let key = PromptKey {
                                observable,
                                selection,
                                stage,
                                channel,
                            };
                            self.prompt.fill(key, value, weight);
                        }
                    }
                }

                // Neutron candidates
                for category in Category::ALL {
                    for feature in NeutronFeature::ALL {
                        for &value in candidates.kinematics(category, feature) {
                            for channel in channels {
                                let key = NeutronKey {
                                    feature,
                                    category,
                                    stage,
                                    channel,
                                };
                                self.neutron.fill(key, value, weight);
                            }
                        }
                    }
                    if let Some(network) = &mut self.network {
                        for feature in NnFeature::ALL {
                            let key = NnKey {
                                feature,
                                category,
                                stage,
                            };
                            for &value in candidates.network(category, feature) {
                                for _ in 0..nn_fills {
                                    network.fill(key, value, weight);
                                }
                            }
                        }
                    }
                }
            }
        }

        self.selected.push(contrib.into_selected());
    }

    /// Integrate analysis results from another ResultsAccumulator
    ///
    /// Selected events of `other` are assumed to come after ours.
    ///
    #[allow(clippy::needless_pass_by_value)]
    pub fn merge(&mut self, other: Self) {
        assert_eq!(
            self.options, other.options,
            "Can only merge results with identical options"
        );
        self.prompt.merge(other.prompt);
        self.neutron.merge(other.neutron);
        if let (Some(dst), Some(src)) = (&mut self.network, other.network) {
            dst.merge(src);
        }
        self.selected.extend(other.selected);
        self.cut_flow.merge(&other.cut_flow);
        self.failed_events += other.failed_events;
    }

    /// Outcome of the selection so far
    pub fn cut_flow(&self) -> &CutFlow {
        &self.cut_flow
    }

    /// Number of events which could not be processed so far
    pub fn failed_events(&self) -> usize {
        self.failed_events
    }

    /// Turn integrated analysis data into finalized results
    pub fn finalize(self) -> FinalResults {
        FinalResults {
            prompt: self.prompt,
            neutron: self.neutron,
            network: self.network,
            selected: self.selected,
            cut_flow: self.cut_flow,
            failed_events: self.failed_events,
        }
    }
}
