use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    Playing,
    Paused,
    #[default]
    Stopped,
}

impl PlayState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "playing" | "fast forwarding" | "rewinding" => Self::Playing,
            "paused" => Self::Paused,
            _ => Self::Stopped,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Stopped => "Stopped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    None,
    One,
    All,
}

impl RepeatMode {
    pub const ORDER: [RepeatMode; 3] = [Self::None, Self::One, Self::All];

    pub fn next(self) -> Self {
        let index = Self::ORDER
            .iter()
            .position(|mode| *mode == self)
            .unwrap_or(0);
        Self::ORDER[(index + 1) % Self::ORDER.len()]
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "one" => Self::One,
            "all" => Self::All,
            _ => Self::None,
        }
    }

    /// Keyword understood by the player's scripting dictionary.
    pub fn script_keyword(self) -> &'static str {
        match self {
            Self::None => "off",
            Self::One => "one",
            Self::All => "all",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "Off",
            Self::One => "One",
            Self::All => "All",
        }
    }
}

/// One complete view of the player at an instant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackSnapshot {
    pub track_name: String,
    pub artist: String,
    pub album: String,
    pub duration_seconds: f64,
    pub position_seconds: f64,
    pub play_state: PlayState,
    pub shuffle_enabled: bool,
    pub repeat_mode: RepeatMode,
    pub volume_percent: u8,
    pub next_track_name: String,
    pub next_artist: String,
}

impl PlaybackSnapshot {
    /// Enforces the model invariants: volume within 0..=100, non-negative
    /// times, and a stopped player carrying no track.
    pub fn normalized(mut self) -> Self {
        self.volume_percent = self.volume_percent.min(100);
        self.duration_seconds = non_negative(self.duration_seconds);
        self.position_seconds = non_negative(self.position_seconds);
        if self.play_state == PlayState::Stopped {
            self.track_name.clear();
            self.artist.clear();
            self.album.clear();
            self.duration_seconds = 0.0;
            self.position_seconds = 0.0;
        }
        self
    }

    pub fn identity(&self) -> Option<TrackIdentity> {
        TrackIdentity::new(&self.track_name, &self.artist)
    }

    pub fn progress_ratio(&self) -> Option<f64> {
        (self.duration_seconds > 0.0)
            .then(|| (self.position_seconds / self.duration_seconds).clamp(0.0, 1.0))
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// "Same song" key: two snapshots with equal identities are the same track
/// even when position or volume differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackIdentity {
    pub title: String,
    pub artist: String,
}

impl TrackIdentity {
    pub fn new(title: &str, artist: &str) -> Option<Self> {
        let title = normalize_key(title);
        if title.is_empty() {
            return None;
        }
        Some(Self {
            title,
            artist: normalize_key(artist),
        })
    }
}

fn normalize_key(value: &str) -> String {
    value.trim().nfc().collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    /// 1-based position inside its playlist.
    pub index: usize,
    pub name: String,
    pub artist: String,
    pub album: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Theme {
    #[default]
    Dark,
    PitchBlack,
    Ocean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriviaSettings {
    #[serde(default = "default_trivia_enabled")]
    pub enabled: bool,
    #[serde(default = "default_trivia_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_trivia_model")]
    pub model: String,
    #[serde(default = "default_trivia_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_trivia_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_trivia_enabled() -> bool {
    true
}

fn default_trivia_endpoint() -> String {
    String::from("https://api.openai.com/v1/chat/completions")
}

fn default_trivia_model() -> String {
    String::from("gpt-4o-mini")
}

fn default_trivia_api_key_env() -> String {
    String::from("OPENAI_API_KEY")
}

fn default_trivia_timeout_secs() -> u64 {
    30
}

impl Default for TriviaSettings {
    fn default() -> Self {
        Self {
            enabled: default_trivia_enabled(),
            endpoint: default_trivia_endpoint(),
            model: default_trivia_model(),
            api_key_env: default_trivia_api_key_env(),
            timeout_secs: default_trivia_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_player_app")]
    pub player_app: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_launch_settle_ms")]
    pub launch_settle_ms: u64,
    #[serde(default = "default_volume_step")]
    pub volume_step: u8,
    #[serde(default = "default_seek_step_seconds")]
    pub seek_step_seconds: f64,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub trivia: TriviaSettings,
}

fn default_player_app() -> String {
    String::from("Music")
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_launch_settle_ms() -> u64 {
    1500
}

fn default_volume_step() -> u8 {
    5
}

fn default_seek_step_seconds() -> f64 {
    10.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player_app: default_player_app(),
            poll_interval_ms: default_poll_interval_ms(),
            launch_settle_ms: default_launch_settle_ms(),
            volume_step: default_volume_step(),
            seek_step_seconds: default_seek_step_seconds(),
            theme: Theme::default(),
            trivia: TriviaSettings::default(),
        }
    }
}
