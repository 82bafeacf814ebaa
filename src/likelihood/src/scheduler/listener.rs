use std::sync::mpsc;
use std::thread;

use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::Side;
use crate::results::LikelihoodRatio;

/// How an analysis ended. Failures and cancellations are distinct outcomes
/// all the way to the listeners; neither carries a partial ratio.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Completed(LikelihoodRatio),
    Failed(String),
    Cancelled,
}

/// Observer of a running analysis.
///
/// Callbacks are delivered from a single dedicated notifier thread, in a
/// stable order, never reentrantly: hosting applications marshal them
/// onwards however they see fit.
pub trait ProgressListener: Send {
    fn analysis_started(&self) {}

    fn locus_started(&self, _side: Side, _locus: &str, _estimated_size: usize) {}

    fn locus_finished(&self, _side: Side, _locus: &str, _probability: f64) {}

    fn analysis_finished(&self, _outcome: &AnalysisOutcome) {}
}

pub(crate) type Listeners = Arc<Mutex<Vec<Box<dyn ProgressListener>>>>;

#[derive(Debug)]
pub(crate) enum ProgressEvent {
    Started,
    LocusStarted { side: Side, locus: String, estimated_size: usize },
    LocusFinished { side: Side, locus: String, probability: f64 },
    Finished(AnalysisOutcome),
}

/// Single-consumer notification queue: events are applied to every
/// registered listener, in registration order, from one thread.
pub(crate) fn spawn_notifier(listeners: Listeners) -> std::io::Result<(mpsc::Sender<ProgressEvent>, thread::JoinHandle<()>)> {
    let (sender, receiver) = mpsc::channel::<ProgressEvent>();
    let handle = thread::Builder::new().name(String::from("notifier")).spawn(move || {
        for event in receiver {
            let listeners = listeners.lock();
            for listener in listeners.iter() {
                match &event {
                    ProgressEvent::Started => listener.analysis_started(),
                    ProgressEvent::LocusStarted { side, locus, estimated_size } => {
                        listener.locus_started(*side, locus, *estimated_size);
                    }
                    ProgressEvent::LocusFinished { side, locus, probability } => {
                        listener.locus_finished(*side, locus, *probability);
                    }
                    ProgressEvent::Finished(outcome) => listener.analysis_finished(outcome),
                }
            }
        }
    })?;
    Ok((sender, handle))
}
