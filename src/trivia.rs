use crate::model::TrackIdentity;
use std::collections::{HashMap, HashSet};

pub const UNAVAILABLE_TEXT: &str = "Trivia unavailable: no fetch backend configured.";
pub const FETCHING_TEXT: &str = "Fetching trivia...";

/// Supplies free-form text about a track. Runs on a background thread.
pub trait TriviaFetcher: Send + Sync {
    fn fetch(&self, title: &str, artist: &str) -> anyhow::Result<String>;
}

/// A terminal cache value. Errors are cached like any other result and are
/// never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriviaEntry {
    Text(String),
    Unavailable,
    FetchError(String),
}

impl TriviaEntry {
    pub fn from_result(result: anyhow::Result<String>) -> Self {
        match result {
            Ok(text) => Self::Text(text),
            Err(err) => Self::FetchError(format!("{err:#}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Hit(TriviaEntry),
    /// The caller must launch the one fetch for this identity.
    Fetch,
    /// A fetch for this identity is already running.
    Pending,
}

/// Session-scoped cache: no TTL, no eviction.
#[derive(Debug, Default)]
pub struct TriviaCache {
    entries: HashMap<TrackIdentity, TriviaEntry>,
    pending: HashSet<TrackIdentity>,
}

impl TriviaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&mut self, identity: &TrackIdentity, backend_available: bool) -> Lookup {
        if let Some(entry) = self.entries.get(identity) {
            return Lookup::Hit(entry.clone());
        }
        if !backend_available {
            self.entries.insert(identity.clone(), TriviaEntry::Unavailable);
            return Lookup::Hit(TriviaEntry::Unavailable);
        }
        if self.pending.insert(identity.clone()) {
            Lookup::Fetch
        } else {
            Lookup::Pending
        }
    }

    /// Records a finished fetch. An identity already holding an entry keeps
    /// it.
    pub fn complete(&mut self, identity: &TrackIdentity, entry: TriviaEntry) {
        self.pending.remove(identity);
        self.entries.entry(identity.clone()).or_insert(entry);
    }

    pub fn get(&self, identity: &TrackIdentity) -> Option<&TriviaEntry> {
        self.entries.get(identity)
    }

    pub fn is_pending(&self, identity: &TrackIdentity) -> bool {
        self.pending.contains(identity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TriviaDisplay {
    #[default]
    Empty,
    Fetching,
    Ready(TriviaEntry),
}

/// What the trivia panel currently shows, and for which track.
#[derive(Debug, Default)]
pub struct TriviaPanel {
    identity: Option<TrackIdentity>,
    display: TriviaDisplay,
}

impl TriviaPanel {
    pub fn identity(&self) -> Option<&TrackIdentity> {
        self.identity.as_ref()
    }

    pub fn display(&self) -> &TriviaDisplay {
        &self.display
    }

    pub fn show(&mut self, identity: Option<TrackIdentity>, display: TriviaDisplay) {
        self.identity = identity;
        self.display = display;
    }

    /// Applies a finished fetch only while its track is still the one on
    /// screen. Returns whether the panel changed.
    pub fn apply_if_current(&mut self, identity: &TrackIdentity, entry: &TriviaEntry) -> bool {
        if self.identity.as_ref() != Some(identity) {
            return false;
        }
        self.display = TriviaDisplay::Ready(entry.clone());
        true
    }
}
