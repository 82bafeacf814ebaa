mod error;
mod listener;

pub use error::AnalysisError;
pub use listener::{AnalysisOutcome, ProgressListener};

pub use crate::config::Side;

use std::collections::BTreeMap;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use indexmap::IndexMap;
use log::{debug, info};
use parking_lot::Mutex;

use listener::{spawn_notifier, Listeners, ProgressEvent};

use crate::cancellation::CancellationToken;
use crate::config::AnalysisConfig;
use crate::jobs::generator::{self, JobBatch};
use crate::jobs::JobError;
use crate::results::{LikelihoodRatio, LocusProbabilities};

/// Lifecycle of one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Runs Locus Probability Jobs on a fixed-size worker pool and aggregates
/// their partial results into the final likelihood ratio.
///
/// One dedicated aggregator task waits on every job's result in submission
/// order, summing into the per-(hypothesis, locus) accumulators; the
/// overall ratio is only built once every submitted job has completed. Any
/// job failure or an [`interrupt`](Scheduler::interrupt) aborts the whole
/// analysis: no partial ratio is ever surfaced.
pub struct Scheduler {
    state    : Arc<Mutex<AnalysisState>>,
    listeners: Listeners,
    token    : CancellationToken,
    handle   : Option<thread::JoinHandle<Result<LikelihoodRatio, AnalysisError>>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            state    : Arc::new(Mutex::new(AnalysisState::Idle)),
            listeners: Arc::new(Mutex::new(Vec::new())),
            token    : CancellationToken::new(),
            handle   : None,
        }
    }

    pub fn state(&self) -> AnalysisState {
        *self.state.lock()
    }

    pub fn add_progress_listener(&self, listener: Box<dyn ProgressListener>) {
        self.listeners.lock().push(listener);
    }

    /// Best-effort cooperative cancellation of the running analysis. Jobs
    /// observe the signal within one permutation-enumeration step.
    pub fn interrupt(&self) {
        self.token.cancel();
    }

    /// Validate the configuration, generate all jobs, and launch the worker
    /// pool plus the aggregator. Configuration errors are raised here,
    /// synchronously; nothing is scheduled for them.
    pub fn start_analysis(&mut self, config: AnalysisConfig) -> Result<(), AnalysisError> {
        {
            let state = self.state.lock();
            if *state == AnalysisState::Running {
                return Err(AnalysisError::AlreadyRunning);
            }
        }
        if config.thread_count() == 0 {
            return Err(crate::jobs::ConfigError::InvalidThreadCount.into());
        }

        self.token = CancellationToken::new();
        let token = self.token.clone();
        let batch = generator::generate(&config, &token)?;
        info!(
            "starting analysis: {} jobs across {} (hypothesis, locus) pairs on {} threads",
            batch.jobs.len(), batch.pairs.len(), config.thread_count(),
        );

        *self.state.lock() = AnalysisState::Running;
        let state = Arc::clone(&self.state);
        let listeners = Arc::clone(&self.listeners);
        let handle = thread::Builder::new()
            .name(String::from("aggregator"))
            .spawn(move || {
                let result = aggregate(batch, &config, &token, &listeners);
                *state.lock() = match &result {
                    Ok(_) => AnalysisState::Completed,
                    Err(AnalysisError::Cancelled) => AnalysisState::Cancelled,
                    Err(_) => AnalysisState::Failed,
                };
                result
            })
            .map_err(|err| AnalysisError::Failed(format!("could not spawn the aggregator: {err}")))?;
        self.handle = Some(handle);
        Ok(())
    }

    /// Block until the running analysis ends.
    pub fn wait(&mut self) -> Result<LikelihoodRatio, AnalysisError> {
        match self.handle.take() {
            None => Err(AnalysisError::NotStarted),
            Some(handle) => handle
                .join()
                .map_err(|_| AnalysisError::Failed(String::from("the aggregator panicked")))?,
        }
    }

    /// Blocking variant: start and wait.
    pub fn do_analysis(&mut self, config: AnalysisConfig) -> Result<LikelihoodRatio, AnalysisError> {
        self.start_analysis(config)?;
        self.wait()
    }
}

/// The aggregator task: submit every job to the worker pool, consume the
/// results in submission order, and fold them into per-side locus
/// probabilities.
fn aggregate(
    batch    : JobBatch,
    config   : &AnalysisConfig,
    token    : &CancellationToken,
    listeners: &Listeners,
) -> Result<LikelihoodRatio, AnalysisError> {
    let (events, notifier) = spawn_notifier(Arc::clone(listeners))
        .map_err(|err| AnalysisError::Failed(format!("could not spawn the notifier: {err}")))?;
    let result = aggregate_inner(batch, config, token, &events);

    let outcome = match &result {
        Ok(ratio) => AnalysisOutcome::Completed(ratio.clone()),
        Err(AnalysisError::Cancelled) => AnalysisOutcome::Cancelled,
        Err(err) => AnalysisOutcome::Failed(err.to_string()),
    };
    let _ = events.send(ProgressEvent::Finished(outcome));

    // Close the queue and let every callback run before reporting back.
    drop(events);
    let _ = notifier.join();
    result
}

fn aggregate_inner(
    batch : JobBatch,
    config: &AnalysisConfig,
    token : &CancellationToken,
    events: &mpsc::Sender<ProgressEvent>,
) -> Result<LikelihoodRatio, AnalysisError> {
    let _ = events.send(ProgressEvent::Started);
    for pair in &batch.pairs {
        let _ = events.send(ProgressEvent::LocusStarted {
            side          : pair.side,
            locus         : pair.locus.clone(),
            estimated_size: pair.estimated_size,
        });
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.thread_count())
        .thread_name(|index| format!("locus-worker-{index}"))
        .build()
        .map_err(|err| AnalysisError::Failed(format!("could not build the worker pool: {err}")))?;

    // Submit everything, then stop accepting new jobs.
    let job_count = batch.jobs.len();
    let (results_tx, results_rx) = mpsc::channel();
    for (index, mut job) in batch.jobs.into_iter().enumerate() {
        let results_tx = results_tx.clone();
        pool.spawn(move || {
            let result = job.run();
            let _ = results_tx.send((index, result));
        });
    }
    drop(results_tx);

    let mut remaining: IndexMap<(Side, String), usize> = batch
        .pairs
        .iter()
        .map(|pair| ((pair.side, pair.locus.clone()), pair.job_count))
        .collect();

    let side_id = |side: Side| -> String {
        config.hypothesis(side).map_or_else(|| side.to_string(), |hypothesis| hypothesis.id().to_owned())
    };
    let mut prosecution = LocusProbabilities::new(&side_id(Side::Prosecution));
    let mut defense     = LocusProbabilities::new(&side_id(Side::Defense));

    // Consume in submission order: arrivals are buffered until their turn,
    // making the per-pair summation order, and therefore the result,
    // independent of worker scheduling.
    let mut buffered: BTreeMap<usize, Result<crate::jobs::JobOutput, JobError>> = BTreeMap::new();
    let mut next = 0;
    let mut failure: Option<AnalysisError> = None;

    while next < job_count {
        let Ok((index, result)) = results_rx.recv() else {
            failure.get_or_insert(AnalysisError::Failed(String::from("worker pool disconnected")));
            break;
        };
        buffered.insert(index, result);

        while let Some(result) = buffered.remove(&next) {
            next += 1;
            match result {
                Ok(output) => {
                    if failure.is_some() {
                        continue; // aborting: partial sums are discarded
                    }
                    let probabilities = match output.side {
                        Side::Prosecution => &mut prosecution,
                        Side::Defense     => &mut defense,
                    };
                    probabilities.add(&output.locus, output.probability);

                    let key = (output.side, output.locus.clone());
                    if let Some(count) = remaining.get_mut(&key) {
                        *count -= 1;
                        if *count == 0 {
                            let probability = probabilities.get(&output.locus).unwrap_or(f64::NAN);
                            debug!("{}/{}: locus probability {probability:e}", output.side, output.locus);
                            let _ = events.send(ProgressEvent::LocusFinished {
                                side: output.side,
                                locus: output.locus,
                                probability,
                            });
                        }
                    }
                }
                Err(JobError::Cancelled(_)) => {
                    failure.get_or_insert(AnalysisError::Cancelled);
                }
                Err(err) => {
                    if failure.is_none() {
                        failure = Some(AnalysisError::Failed(err.to_string()));
                        // Bring the remaining workers down quickly.
                        token.cancel();
                    }
                }
            }
        }
    }

    if let Some(failure) = failure {
        return Err(failure);
    }

    let mut loci: Vec<String> = Vec::new();
    for pair in &batch.pairs {
        if !loci.contains(&pair.locus) {
            loci.push(pair.locus.clone());
        }
    }
    Ok(LikelihoodRatio::new(&loci, &prosecution, &defense))
}
