//! This module contains the final results of the analysis: filled histogram
//! stores, selected event records and selection bookkeeping

use crate::{
    channel::Channel,
    evcut::{CutFlow, CutStage},
    event::SelectedEvent,
    histogram::Histogram,
    observables::{NeutronKey, NnKey, PromptKey, PromptObservable, Selection},
    store::{HistogramStore, StoreKey},
};

use log::info;

/// Final results of the analysis
#[derive(Debug, Clone)]
pub struct FinalResults {
    /// Primary event observables
    pub prompt: HistogramStore<PromptKey>,

    /// Candidate kinematics
    pub neutron: HistogramStore<NeutronKey>,

    /// Candidate tagging network inputs, if they were histogrammed
    pub network: Option<HistogramStore<NnKey>>,

    /// Flat records of the selected events, in input order
    pub selected: Vec<SelectedEvent>,

    /// Outcome of the selection
    pub cut_flow: CutFlow,

    /// Number of events which could not be processed
    pub failed_events: usize,
}
//
impl FinalResults {
    /// Number of events which were read, including those which failed
    pub fn processed_events(&self) -> usize {
        self.cut_flow.total() + self.failed_events
    }

    /// Every histogram with its name and axis title, in registration order
    pub fn histograms(&self) -> impl Iterator<Item = NamedHistogram<'_>> + '_ {
        let network = self.network.iter().flat_map(named);
        named(&self.prompt).chain(named(&self.neutron)).chain(network)
    }

    /// Log the selection outcome
    pub fn log_summary(&self) {
        info!("Processed events       : {}", self.processed_events());
        info!("Failed events          : {}", self.failed_events);
        for (stage, surviving) in self.cut_flow.surviving() {
            info!("After {:<16} : {surviving}", stage.name());
        }
        info!("Selected events        : {}", self.cut_flow.accepted());
        let inclusive = PromptKey {
            observable: PromptObservable::TrueEnergy,
            selection: Selection::NcGamma,
            stage: CutStage::Angle,
            channel: Channel::All,
        };
        let total_weight = self.prompt.get(&inclusive).map_or(0., Histogram::total_weight);
        info!("Expected events        : {total_weight:.4}");
    }
}

/// Histogram with its full name and axis title
#[derive(Debug, Clone)]
pub struct NamedHistogram<'res> {
    /// Full name, e.g. henu_ncgamma_angle_all
    pub name: String,

    /// Axis title
    pub title: &'static str,

    /// Histogram contents
    pub histogram: &'res Histogram,
}

/// Name every histogram of a store
fn named<K: StoreKey>(store: &HistogramStore<K>) -> impl Iterator<Item = NamedHistogram<'_>> + '_ {
    store.export().map(|(key, histogram)| NamedHistogram {
        name: key.to_string(),
        title: key.title(),
        histogram,
    })
}
