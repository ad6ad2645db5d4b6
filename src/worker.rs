use crate::bridge::{self, Bridge, Operation};
use crate::commands::CommandId;
use crate::event::CoreEvent;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Command {
        command: CommandId,
        operations: Vec<Operation>,
    },
    ListPlaylists,
    ListTracks {
        playlist: String,
    },
    PlayTrack {
        playlist: String,
        index: usize,
    },
}

/// Executes bridge jobs strictly in submission order on one thread, so a
/// later command never overtakes an earlier one.
pub struct CommandWorker {
    jobs: Sender<Job>,
}

impl CommandWorker {
    pub fn start(bridge: Arc<dyn Bridge>, events: Sender<CoreEvent>) -> Self {
        let (jobs, job_rx) = mpsc::channel();
        thread::spawn(move || worker_loop(bridge, job_rx, events));
        Self { jobs }
    }

    /// Queues `job`. Returns false if the worker is gone and the job was
    /// dropped.
    pub fn submit(&self, job: Job) -> bool {
        if self.jobs.send(job).is_err() {
            log::error!("command worker has stopped; job dropped");
            return false;
        }
        true
    }
}

fn worker_loop(bridge: Arc<dyn Bridge>, jobs: Receiver<Job>, events: Sender<CoreEvent>) {
    while let Ok(job) = jobs.recv() {
        let fallback = job.clone();
        let event = panic::catch_unwind(AssertUnwindSafe(|| run_job(bridge.as_ref(), job)))
            .unwrap_or_else(|_| {
                log::error!("{fallback:?} panicked");
                panicked(fallback)
            });
        if events.send(event).is_err() {
            break;
        }
    }
}

fn run_job(bridge: &dyn Bridge, job: Job) -> CoreEvent {
    match job {
        Job::Command {
            command,
            operations,
        } => {
            // Best effort: a failed step does not stop the ones after it.
            let failures = operations
                .iter()
                .filter_map(|operation| match bridge.run(operation) {
                    Ok(_) => None,
                    Err(err) => {
                        log::warn!("{command:?}: {operation:?} failed: {err}");
                        Some(err.to_string())
                    }
                })
                .collect();
            CoreEvent::CommandFinished { command, failures }
        }
        Job::ListPlaylists => CoreEvent::PlaylistsLoaded(
            bridge
                .run(&Operation::Playlists)
                .map(|raw| bridge::parse_lines(&raw))
                .map_err(|err| err.to_string()),
        ),
        Job::ListTracks { playlist } => {
            let result = bridge
                .run(&Operation::PlaylistTracks(playlist.clone()))
                .map(|raw| bridge::parse_track_records(&raw))
                .map_err(|err| err.to_string());
            CoreEvent::TracksLoaded { playlist, result }
        }
        Job::PlayTrack { playlist, index } => {
            let result = bridge
                .run(&Operation::PlayTrackAt {
                    playlist: playlist.clone(),
                    index,
                })
                .map(|_| ())
                .map_err(|err| err.to_string());
            CoreEvent::TrackStarted {
                playlist,
                index,
                result,
            }
        }
    }
}

/// The failure event for a job whose bridge call panicked, so the core still
/// hears back about it.
fn panicked(job: Job) -> CoreEvent {
    let reason = String::from("bridge panicked");
    match job {
        Job::Command { command, .. } => CoreEvent::CommandFinished {
            command,
            failures: vec![reason],
        },
        Job::ListPlaylists => CoreEvent::PlaylistsLoaded(Err(reason)),
        Job::ListTracks { playlist } => CoreEvent::TracksLoaded {
            playlist,
            result: Err(reason),
        },
        Job::PlayTrack { playlist, index } => CoreEvent::TrackStarted {
            playlist,
            index,
            result: Err(reason),
        },
    }
}
