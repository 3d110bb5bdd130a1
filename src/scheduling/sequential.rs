//! Sequential back-end of the analysis

use crate::{resacc::ResultsAccumulator, scheduling::EVENT_BATCH_SIZE, source::EventRecord};

use log::debug;

/// Analyze records in sequential mode
///
/// We use batched logic even in sequential mode, in order to achieve
/// reproducibility with respect to multi-threaded runs.
///
/// Note that this is anyways generally a good thing to do when accumulating
/// lots of results, as otherwise the accumulator will eventually grow much
/// larger than the accumulated values and numerical accumulation errors
/// will start to blow up.
///
pub fn run_analysis_impl(
    accumulator: &mut ResultsAccumulator,
    first_index: usize,
    records: &[EventRecord],
    process_batch: impl Send + Sync + Fn(usize, &[EventRecord]) -> ResultsAccumulator,
) {
    // Analyze and integrate the batches, in order
    for (batch_id, batch) in records.chunks(EVENT_BATCH_SIZE).enumerate() {
        let batch_start = first_index + batch_id * EVENT_BATCH_SIZE;
        accumulator.merge(process_batch(batch_start, batch));
        debug!("Analyzed records {batch_start}..{}", batch_start + batch.len());
    }
}
