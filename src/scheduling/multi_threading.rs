//! Multi-threaded back-end of the analysis

#[cfg(feature = "faster-threading")]
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{resacc::ResultsAccumulator, scheduling::EVENT_BATCH_SIZE, source::EventRecord};

use log::debug;

use std::sync::Mutex;

/// Analyze records in multi-threaded mode
///
/// Batch results are merged into the caller's accumulator without being
/// finalized, so that consecutive chunks of records can be analyzed in turn.
///
pub fn run_analysis_impl(
    accumulator: &mut ResultsAccumulator,
    first_index: usize,
    records: &[EventRecord],
    process_batch: impl Send + Sync + Fn(usize, &[EventRecord]) -> ResultsAccumulator,
) {
    // Some double-checking cannot hurt...
    assert!(!records.is_empty(), "Must analyze at least one record");

    // We know in advance how many batches of records we will process
    let num_batches = records.len().div_ceil(EVENT_BATCH_SIZE);
    debug!("Analyzing {} records in {num_batches} batches", records.len());

    // The results of parallel tasks will be aggregated...
    let task_results = {
        // ...in a way that is optimized for numerical reproduciblity
        #[cfg(not(feature = "faster-threading"))]
        {
            ReproducibleAccumulator::new(num_batches)
        }

        // ...in a way that is optimized for computational performance
        #[cfg(feature = "faster-threading")]
        {
            FastAccumulator::new(num_batches)
        }
    };

    // This function is a synchronization scope: it will only return
    // once all inner tasks have been executed
    rayon::scope(|scope| {
        // For each batch of records, spawn a task which is responsible for
        // analyzing them
        for (batch_id, batch) in records.chunks(EVENT_BATCH_SIZE).enumerate() {
            let task_results_ref = &task_results;
            let process_batch_ref = &process_batch;
            scope.spawn(move |_| {
                let batch_start = first_index + batch_id * EVENT_BATCH_SIZE;
                let result = process_batch_ref(batch_start, batch);
                debug!("Analyzed records {batch_start}..{}", batch_start + batch.len());
                task_results_ref.set_task_result(batch_id, result);
            });
        }
    });

    // Merge the task results into the caller's accumulator
    task_results.merge_into(accumulator);
}

/// Reproducibility-optimized results accumulation mechanism
#[cfg(not(feature = "faster-threading"))]
struct ReproducibleAccumulator {
    /// Storage for the intermediary analysis results of parallel tasks
    results: Box<[Mutex<Option<ResultsAccumulator>>]>,
}
//
#[cfg(not(feature = "faster-threading"))]
impl ReproducibleAccumulator {
    /// Set up results storage for N parallel tasks
    fn new(num_tasks: usize) -> Self {
        assert!(num_tasks > 0, "There should be at least one task");
        Self {
            results: (0..num_tasks)
                .map(|_| Mutex::new(None))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        }
    }

    /// Integrate the results of the n-th analysis task
    fn set_task_result(&self, task_id: usize, result: ResultsAccumulator) {
        let mut lock = self.results[task_id]
            .lock()
            .expect("Mutex data should be valid");
        assert!(lock.is_none(), "Tasks should not report results twice");
        *lock = Some(result);
    }

    /// Aggregate the results in a reproducible fashion, in batch order
    fn merge_into(self, accumulator: &mut ResultsAccumulator) {
        for entry in self.results.into_vec() {
            let result = entry
                .into_inner()
                .expect("Mutex data should be valid")
                .expect("Result should be ready");
            accumulator.merge(result);
        }
    }
}

/// Speed-optimized results accumulation mechanism
///
/// Batches are merged in completion order, so selected event records come out
/// shuffled and sums of weights may differ in their last bits between runs.
///
#[cfg(feature = "faster-threading")]
struct FastAccumulator {
    /// Storage location in which results will be merged out of order
    merged_result: Mutex<Option<ResultsAccumulator>>,

    /// Truth that each task has reported its results
    task_finished: Box<[AtomicBool]>,
}
//
#[cfg(feature = "faster-threading")]
impl FastAccumulator {
    /// Set up results storage for N parallel tasks
    fn new(num_tasks: usize) -> Self {
        assert!(num_tasks > 0, "There should be at least one task");
        Self {
            merged_result: Mutex::new(None),
            task_finished: (0..num_tasks)
                .map(|_| AtomicBool::new(false))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        }
    }

    /// Integrate the results of the n-th analysis task
    #[allow(unknown_lints, clippy::significant_drop_in_scrutinee)]
    fn set_task_result(&self, task_id: usize, result: ResultsAccumulator) {
        // Initialize the accumulator or merge the task result into it
        match *self
            .merged_result
            .lock()
            .expect("Mutex data should be valid")
        {
            // If we are the first, initialize the accumulator
            ref mut storage @ None => *storage = Some(result),

            // Otherwise, merge our results with those that are already here
            Some(ref mut accumulator) => accumulator.merge(result),
        }

        // Remember that this task has completed its work
        let was_finished = self.task_finished[task_id].swap(true, Ordering::Relaxed);
        assert!(!was_finished, "Tasks should not set their result twice");
    }

    /// Merge the collected results into some accumulator
    fn merge_into(self, accumulator: &mut ResultsAccumulator) {
        // Check that all tasks have completed their work
        for ready in self.task_finished.into_vec() {
            assert!(
                ready.load(Ordering::Relaxed),
                "All tasks should have completed their work"
            );
        }

        // Merge the collected result
        let result = self
            .merged_result
            .into_inner()
            .expect("Mutex data should be valid")
            .expect("Result should be ready");
        accumulator.merge(result);
    }
}
