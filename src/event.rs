use crate::commands::CommandId;
use crate::model::{PlaybackSnapshot, TrackIdentity, TrackRecord};
use crate::trivia::TriviaEntry;

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Snapshot(PlaybackSnapshot),
    /// The player could not be reached or the poll broke unexpectedly.
    Unavailable(String),
}

/// Results delivered from background work to the UI thread.
#[derive(Debug)]
pub enum CoreEvent {
    PollFinished(PollOutcome),
    CommandFinished {
        command: CommandId,
        failures: Vec<String>,
    },
    PlaylistsLoaded(Result<Vec<String>, String>),
    TracksLoaded {
        playlist: String,
        result: Result<Vec<TrackRecord>, String>,
    },
    TrackStarted {
        playlist: String,
        index: usize,
        result: Result<(), String>,
    },
    TriviaFetched {
        identity: TrackIdentity,
        entry: TriviaEntry,
    },
}
