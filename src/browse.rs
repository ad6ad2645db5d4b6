use crate::model::TrackRecord;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BrowseModal {
    #[default]
    Closed,
    PlaylistList {
        playlists: Vec<String>,
        selected: usize,
    },
    TrackList {
        playlist: String,
        tracks: Vec<TrackRecord>,
        selected: usize,
    },
}

/// The collaborator request the browser is waiting on. Results that do not
/// match it are stale and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingBrowse {
    Playlists,
    Tracks(String),
    Play { playlist: String, index: usize },
}

/// What the caller must do after a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseAction {
    LoadTracks(String),
    PlayTrack { playlist: String, index: usize },
}

#[derive(Debug, Default)]
pub struct BrowseContext {
    modal: BrowseModal,
    pending: Option<PendingBrowse>,
}

impl BrowseContext {
    pub fn modal(&self) -> &BrowseModal {
        &self.modal
    }

    pub fn pending(&self) -> Option<&PendingBrowse> {
        self.pending.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.modal != BrowseModal::Closed
    }

    pub fn begin(&mut self) {
        self.pending = Some(PendingBrowse::Playlists);
    }

    pub fn playlists_loaded(&mut self, playlists: Vec<String>) -> bool {
        if self.pending != Some(PendingBrowse::Playlists) {
            return false;
        }
        self.pending = None;
        self.modal = BrowseModal::PlaylistList {
            playlists,
            selected: 0,
        };
        true
    }

    pub fn tracks_loaded(&mut self, playlist: &str, tracks: Vec<TrackRecord>) -> bool {
        if !matches!(&self.pending, Some(PendingBrowse::Tracks(name)) if name == playlist) {
            return false;
        }
        self.pending = None;
        self.modal = BrowseModal::TrackList {
            playlist: playlist.to_string(),
            tracks,
            selected: 0,
        };
        true
    }

    /// Closes the browser once the chosen track has started.
    pub fn track_started(&mut self, playlist: &str, index: usize) -> bool {
        let expected = PendingBrowse::Play {
            playlist: playlist.to_string(),
            index,
        };
        if self.pending.as_ref() != Some(&expected) {
            return false;
        }
        self.close();
        true
    }

    /// Clears the wait for a request that failed, leaving the modal as it
    /// is.
    pub fn request_failed(&mut self) {
        self.pending = None;
    }

    pub fn select(&mut self) -> Option<BrowseAction> {
        if self.pending.is_some() {
            return None;
        }
        let action = match &self.modal {
            BrowseModal::Closed => return None,
            BrowseModal::PlaylistList {
                playlists,
                selected,
            } => {
                let name = playlists.get(*selected)?.clone();
                self.pending = Some(PendingBrowse::Tracks(name.clone()));
                BrowseAction::LoadTracks(name)
            }
            BrowseModal::TrackList {
                playlist,
                tracks,
                selected,
            } => {
                let index = tracks.get(*selected)?.index;
                self.pending = Some(PendingBrowse::Play {
                    playlist: playlist.clone(),
                    index,
                });
                BrowseAction::PlayTrack {
                    playlist: playlist.clone(),
                    index,
                }
            }
        };
        Some(action)
    }

    pub fn move_selection(&mut self, delta: isize) {
        let (selected, len) = match &mut self.modal {
            BrowseModal::Closed => return,
            BrowseModal::PlaylistList {
                playlists,
                selected,
            } => (selected, playlists.len()),
            BrowseModal::TrackList {
                tracks, selected, ..
            } => (selected, tracks.len()),
        };
        if len == 0 {
            *selected = 0;
            return;
        }
        *selected = selected.saturating_add_signed(delta).min(len - 1);
    }

    /// Cancel from either list, or while a request is pending.
    pub fn close(&mut self) {
        self.modal = BrowseModal::Closed;
        self.pending = None;
    }
}
