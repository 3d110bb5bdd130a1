//! This module takes care of scheduling the analysis work, encapsulating use
//! of multiple threads and anything else that will come in the future

#[cfg(feature = "multi-threading")]
mod multi_threading;
#[cfg(not(feature = "multi-threading"))]
mod sequential;

use crate::{resacc::ResultsAccumulator, source::EventRecord};

/// Size of the event batches
///
/// Events are grouped in batches of a certain size in order to reduce
/// accumulation error and achieve perfect reproducibility between sequential
/// and parallel runs of the analysis.
///
pub const EVENT_BATCH_SIZE: usize = 10_000;

/// Number of records which are read in and analyzed at once
///
/// This bounds the memory footprint of the analysis. It is a multiple of the
/// batch size, so that batches keep the same boundaries however the input is
/// split into chunks.
///
pub const CHUNK_SIZE: usize = 64 * EVENT_BATCH_SIZE;

/// Run the analysis of a sequence of records in the manner that was
/// configured at build time.
///
/// Takes as parameters the accumulator that results should be merged into,
/// the index of the first record within its flavor group, the records to be
/// analyzed, and a kernel that analyzes a batch of consecutive records given
/// the index of the first one.
///
/// Batch results are merged into the accumulator in batch order, so feeding
/// a group of records in several consecutive calls gives the same results as
/// feeding it all at once.
///
pub fn run_analysis(
    accumulator: &mut ResultsAccumulator,
    first_index: usize,
    records: &[EventRecord],
    process_batch: impl Send + Sync + Fn(usize, &[EventRecord]) -> ResultsAccumulator,
) {
    // Without any record, there is nothing to do
    if records.is_empty() {
        return;
    }

    // ...in sequential mode
    #[cfg(not(feature = "multi-threading"))]
    {
        sequential::run_analysis_impl(accumulator, first_index, records, process_batch)
    }

    // ...in multi-threaded mode
    #[cfg(feature = "multi-threading")]
    {
        multi_threading::run_analysis_impl(accumulator, first_index, records, process_batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::DataError,
        evcut::CutStage,
        event::{Event, NeutronMultiplicity},
        linalg::{Direction, Position},
        resacc::AccumulatorOptions,
    };

    fn event() -> Event {
        Event {
            true_energy: 6.,
            reco_energy: 10.,
            dwall: 600.,
            effwall: 2500.,
            ovaq: 0.2,
            angle: 40.,
            vertex: Position::zeros(),
            true_vertex: Position::zeros(),
            direction: Direction::new(0., 0., 1.),
            interaction_mode: 51,
            multiplicity: NeutronMultiplicity::default(),
            candidates: Vec::new(),
        }
    }

    /// Kernel which rejects valid records at a stage that depends on their
    /// position, so that batch boundaries show up in the results
    fn kernel(first: usize, batch: &[EventRecord]) -> ResultsAccumulator {
        let mut acc = ResultsAccumulator::new(AccumulatorOptions::default());
        for (index, record) in (first..).zip(batch) {
            match record {
                Ok(_) => acc.reject(CutStage::ALL[index % CutStage::ALL.len()]),
                Err(_) => acc.record_failure(),
            }
        }
        acc
    }

    #[test]
    fn every_record_is_processed_once() {
        let num_records = 2 * EVENT_BATCH_SIZE + 17;
        let records = (0..num_records)
            .map(|i| {
                if i % 1000 == 999 {
                    Err(DataError::MalformedRecord(String::new()))
                } else {
                    Ok(event())
                }
            })
            .collect::<Vec<_>>();
        let mut acc = ResultsAccumulator::new(AccumulatorOptions::default());
        run_analysis(&mut acc, 0, &records, kernel);
        assert_eq!(acc.failed_events(), num_records / 1000);
        assert_eq!(acc.cut_flow().total(), num_records - num_records / 1000);
    }

    #[test]
    fn empty_input_gives_empty_results() {
        let mut acc = ResultsAccumulator::new(AccumulatorOptions::default());
        run_analysis(&mut acc, 0, &[], kernel);
        assert_eq!(acc.cut_flow().total(), 0);
        assert_eq!(acc.failed_events(), 0);
    }

    #[test]
    fn chunked_input_matches_whole_input() {
        let num_records = 3 * EVENT_BATCH_SIZE + 5;
        let records = (0..num_records).map(|_| Ok(event())).collect::<Vec<_>>();
        let mut whole = ResultsAccumulator::new(AccumulatorOptions::default());
        run_analysis(&mut whole, 0, &records, kernel);

        let mut chunked = ResultsAccumulator::new(AccumulatorOptions::default());
        let split = 2 * EVENT_BATCH_SIZE;
        run_analysis(&mut chunked, 0, &records[..split], kernel);
        run_analysis(&mut chunked, split, &records[split..], kernel);
        assert_eq!(chunked.cut_flow(), whole.cut_flow());
        for stage in CutStage::ALL {
            assert!(chunked.cut_flow().rejected(stage) > 0);
        }
    }
}
