//! One-shot background generation
//!
//! Every job runs on its own freshly spawned thread and reports over an
//! unbounded channel: any number of `Progress` messages in emission order,
//! then exactly one terminal `Complete` or `Failed`. The thread exits after
//! the terminal message. There is no cancellation; dropping the handle only
//! discards the remaining messages.

mod animation;

pub use animation::AnimationQueue;

use std::panic::{self, AssertUnwindSafe};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};
use tracing::{debug, error};

use crate::config::MapConfig;
use crate::error::{MapGenError, Result};
use crate::map::{CityMap, ConnectivityMap, SkeletonData, TerrainMap};
use crate::pipeline::{
    generate_connectivity, generate_muscles, generate_skeleton, generate_terrain,
    ConnectivityRequest, MusclesRequest, Progress, ProgressSink, SkeletonRequest, TerrainRequest,
};

/// A pipeline invocation with everything it needs, owned
#[derive(Debug, Clone)]
pub enum GenerationJob {
    Skeleton {
        config: MapConfig,
        request: SkeletonRequest,
    },
    Muscles {
        config: MapConfig,
        request: MusclesRequest,
    },
    Connectivity {
        config: MapConfig,
        request: ConnectivityRequest,
    },
    Terrain {
        config: MapConfig,
        request: TerrainRequest,
    },
}

impl GenerationJob {
    /// Short name, used for the worker thread
    pub fn name(&self) -> &'static str {
        match self {
            GenerationJob::Skeleton { .. } => "skeleton",
            GenerationJob::Muscles { .. } => "muscles",
            GenerationJob::Connectivity { .. } => "connectivity",
            GenerationJob::Terrain { .. } => "terrain",
        }
    }

    /// Check the request without doing any work
    pub fn validate(&self) -> Result<()> {
        match self {
            GenerationJob::Skeleton { request, .. } => request.validate(),
            GenerationJob::Muscles { request, .. } => request.validate(),
            GenerationJob::Connectivity { request, .. } => request.validate(),
            GenerationJob::Terrain { request, .. } => request.validate(),
        }
    }

    /// Run the job on the current thread
    pub fn run(&self, progress: ProgressSink<'_>) -> Result<GenerationOutput> {
        Ok(match self {
            GenerationJob::Skeleton { config, request } => {
                GenerationOutput::Skeleton(generate_skeleton(config, request, progress)?)
            }
            GenerationJob::Muscles { config, request } => {
                GenerationOutput::City(generate_muscles(config, request, progress)?)
            }
            GenerationJob::Connectivity { config, request } => {
                GenerationOutput::Connectivity(generate_connectivity(config, request, progress)?)
            }
            GenerationJob::Terrain { config, request } => {
                GenerationOutput::Terrain(generate_terrain(config, request, progress)?)
            }
        })
    }
}

/// Final result of a job
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutput {
    Skeleton(SkeletonData),
    City(CityMap),
    Connectivity(ConnectivityMap),
    Terrain(TerrainMap),
}

impl GenerationOutput {
    pub fn into_city(self) -> Option<CityMap> {
        match self {
            GenerationOutput::City(city) => Some(city),
            _ => None,
        }
    }

    pub fn into_skeleton(self) -> Option<SkeletonData> {
        match self {
            GenerationOutput::Skeleton(data) => Some(data),
            _ => None,
        }
    }
}

/// Worker → caller message
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    Progress(Progress),
    /// Terminal: the job finished after `elapsed`
    Complete {
        output: Box<GenerationOutput>,
        elapsed: Duration,
    },
    /// Terminal: the job failed, or panicked (`WorkerFailed`)
    Failed(MapGenError),
}

impl WorkerMessage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerMessage::Progress(_))
    }
}

/// Caller side of a running job
#[derive(Debug)]
pub struct GenerationHandle {
    receiver: Receiver<WorkerMessage>,
    thread: Option<JoinHandle<()>>,
}

/// Validate `job` and start it on a new thread
///
/// # Errors
///
/// Returns the job's validation error without spawning, or `WorkerFailed`
/// if the thread could not be created.
///
/// # Example
///
/// ```
/// use voronoi_city::{spawn, GenerationJob, MapConfigBuilder, SkeletonRequest};
///
/// let config = MapConfigBuilder::new().seed(1).build().unwrap();
/// let handle = spawn(GenerationJob::Skeleton {
///     config,
///     request: SkeletonRequest { num_points: 200, density_weighted: false },
/// })
/// .unwrap();
///
/// let output = handle.wait(|_| {}).unwrap();
/// assert_eq!(output.into_skeleton().unwrap().points.len(), 200);
/// ```
pub fn spawn(job: GenerationJob) -> Result<GenerationHandle> {
    job.validate()?;

    let (tx, receiver) = crossbeam_channel::unbounded();
    let thread = std::thread::Builder::new()
        .name(format!("mapgen-{}", job.name()))
        .spawn(move || {
            let start = Instant::now();
            let progress_tx = tx.clone();
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                job.run(&mut |progress| {
                    // A gone receiver only means nobody is listening
                    let _ = progress_tx.send(WorkerMessage::Progress(progress));
                })
            }));

            let message = match result {
                Ok(Ok(output)) => WorkerMessage::Complete {
                    output: Box::new(output),
                    elapsed: start.elapsed(),
                },
                Ok(Err(e)) => WorkerMessage::Failed(e),
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    error!(job = job.name(), %reason, "generation worker panicked");
                    WorkerMessage::Failed(MapGenError::WorkerFailed(reason))
                }
            };
            if tx.send(message).is_err() {
                debug!(job = job.name(), "result dropped, handle is gone");
            }
        })
        .map_err(|e| MapGenError::WorkerFailed(e.to_string()))?;

    Ok(GenerationHandle {
        receiver,
        thread: Some(thread),
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

impl GenerationHandle {
    /// Block until the job ends, handing every progress message to
    /// `on_progress` first
    ///
    /// # Errors
    ///
    /// Returns the job's error, or `WorkerFailed` if the worker vanished
    /// without a terminal message.
    pub fn wait(mut self, mut on_progress: impl FnMut(Progress)) -> Result<GenerationOutput> {
        let outcome = loop {
            match self.receiver.recv() {
                Ok(WorkerMessage::Progress(progress)) => on_progress(progress),
                Ok(WorkerMessage::Complete { output, elapsed }) => {
                    debug!(?elapsed, "generation complete");
                    break Ok(*output);
                }
                Ok(WorkerMessage::Failed(e)) => break Err(e),
                Err(_) => {
                    break Err(MapGenError::WorkerFailed(
                        "worker exited without a result".to_string(),
                    ))
                }
            }
        };
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        outcome
    }

    /// Blocking iterator over the remaining messages; ends once the worker
    /// has exited
    pub fn messages(&self) -> impl Iterator<Item = WorkerMessage> + '_ {
        self.receiver.iter()
    }

    /// Next message if one is ready
    ///
    /// # Errors
    ///
    /// Returns `WorkerFailed` once the worker has exited and every message
    /// was consumed.
    pub fn try_next(&self) -> Result<Option<WorkerMessage>> {
        match self.receiver.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(MapGenError::WorkerFailed(
                "worker channel closed".to_string(),
            )),
        }
    }

    /// Whether the worker thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfigBuilder;
    use crate::pipeline::{ClusterScope, STATUS_CARVING, STATUS_FINALIZING};
    use crate::skeleton::WardLayout;

    fn config() -> MapConfig {
        MapConfigBuilder::new().seed(42).build().unwrap()
    }

    #[test]
    fn test_worker_streams_progress_then_result() {
        let handle = spawn(GenerationJob::Muscles {
            config: config(),
            request: MusclesRequest::new(WardLayout::uniform(2, 2), 800),
        })
        .unwrap();

        let mut messages: Vec<WorkerMessage> = handle.messages().collect();
        let last = messages.pop().unwrap();
        assert!(matches!(last, WorkerMessage::Complete { .. }));
        assert!(messages.iter().all(|m| !m.is_terminal()));

        let first = &messages[0];
        assert!(matches!(first, WorkerMessage::Progress(Progress::Status(s)) if s == STATUS_CARVING));
        assert!(messages.iter().any(|m| matches!(
            m,
            WorkerMessage::Progress(Progress::Iteration(s)) if s.scope == ClusterScope::Wards
        )));
        assert!(matches!(
            messages.last().unwrap(),
            WorkerMessage::Progress(Progress::Status(s)) if s == STATUS_FINALIZING
        ));
    }

    #[test]
    fn test_worker_matches_direct_run() {
        let request = MusclesRequest::new(WardLayout::uniform(3, 2), 1_000);
        let direct = generate_muscles(&config(), &request, &mut |_| {}).unwrap();

        let handle = spawn(GenerationJob::Muscles {
            config: config(),
            request,
        })
        .unwrap();
        let mut progress = 0;
        let output = handle.wait(|_| progress += 1).unwrap();

        assert!(progress > 0);
        assert_eq!(output.into_city().unwrap(), direct);
    }

    #[test]
    fn test_invalid_job_is_rejected_before_spawning() {
        let result = spawn(GenerationJob::Terrain {
            config: config(),
            request: TerrainRequest { num_points: 1 },
        });
        assert!(matches!(result, Err(MapGenError::InvalidInput(_))));
    }

    #[test]
    fn test_generation_error_is_forwarded() {
        let handle = spawn(GenerationJob::Muscles {
            config: config(),
            request: MusclesRequest::new(
                WardLayout::Counts {
                    num_wards: 1,
                    num_districts: 10_000,
                },
                200,
            ),
        })
        .unwrap();
        assert!(matches!(
            handle.wait(|_| {}),
            Err(MapGenError::InsufficientLand { .. })
        ));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn std::any::Any + Send> = Box::new(7);
        assert_eq!(panic_message(payload.as_ref()), "worker panicked");
    }

    #[test]
    fn test_try_next_reports_closed_channel() {
        let handle = spawn(GenerationJob::Skeleton {
            config: config(),
            request: SkeletonRequest {
                num_points: 50,
                density_weighted: false,
            },
        })
        .unwrap();

        let mut terminal = false;
        loop {
            match handle.try_next() {
                Ok(Some(message)) => terminal |= message.is_terminal(),
                Ok(None) => std::thread::yield_now(),
                Err(e) => {
                    assert!(matches!(e, MapGenError::WorkerFailed(_)));
                    break;
                }
            }
        }
        assert!(terminal);
    }
}
