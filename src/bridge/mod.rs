use crate::model::{RepeatMode, TrackRecord};

mod applescript;

pub use applescript::AppleScriptBridge;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("automation bridge unavailable: {0}")]
    Unavailable(String),
    #[error("failed to start automation host: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("script failed: {0}")]
    Script(String),
}

/// A single request against the controlled player.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    IsRunning,
    Launch,
    PlayerState,
    Play,
    Pause,
    PlayPause,
    NextTrack,
    PreviousTrack,
    Volume,
    SetVolume(u8),
    AdjustVolume(i16),
    Position,
    SetPosition(f64),
    SeekBy(f64),
    Shuffle,
    SetShuffle(bool),
    ToggleShuffle,
    Repeat,
    SetRepeat(RepeatMode),
    CycleRepeat,
    TrackName,
    TrackArtist,
    TrackAlbum,
    TrackDuration,
    NextTrackInfo,
    Playlists,
    PlaylistTracks(String),
    PlayTrackAt { playlist: String, index: usize },
}

/// Executes operations against the player and returns their raw text
/// result. Implementations are shared across worker threads.
pub trait Bridge: Send + Sync {
    fn run(&self, operation: &Operation) -> Result<String, BridgeError>;
}

/// Stand-in used when no automation host exists on this platform; every
/// operation fails, which the poll loop surfaces as the error state.
pub struct NullBridge {
    reason: String,
}

impl NullBridge {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Bridge for NullBridge {
    fn run(&self, _operation: &Operation) -> Result<String, BridgeError> {
        Err(BridgeError::Unavailable(self.reason.clone()))
    }
}

pub fn parse_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let text = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replace(',', ".")
    } else {
        trimmed.replace(',', "")
    };
    text.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

pub fn parse_bool(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

pub fn parse_volume(raw: &str) -> u8 {
    parse_number(raw).round().clamp(0.0, 100.0) as u8
}

pub fn parse_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits `name\nartist` as produced by [`Operation::NextTrackInfo`].
pub fn parse_next_track(raw: &str) -> (String, String) {
    let mut parts = raw.lines().map(str::trim);
    let name = parts.next().unwrap_or_default().to_string();
    let artist = parts.next().unwrap_or_default().to_string();
    (name, artist)
}

/// Parses tab-separated `index, name, artist, album` rows. Rows with an
/// unreadable index fall back to their position in the listing.
pub fn parse_track_records(raw: &str) -> Vec<TrackRecord> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(position, line)| {
            let mut fields = line.split('\t');
            let index = fields
                .next()
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(position + 1);
            let mut next_field = || fields.next().unwrap_or_default().trim().to_string();
            let name = next_field();
            let artist = next_field();
            let album = next_field();
            TrackRecord {
                index,
                name,
                artist,
                album,
            }
        })
        .collect()
}
