use crate::bridge::{self, Bridge, Operation};
use crate::model::{PlayState, PlaybackSnapshot, RepeatMode};
use std::thread;

/// Assembles one consistent snapshot. Never fails: each query that errors
/// falls back to its default (empty text, zero, stopped, repeat off, shuffle
/// off).
///
/// The play-state query gates the five track-detail queries, which are only
/// issued when something is loaded. Shuffle, repeat, volume and the up-next
/// lookup run alongside regardless of play state.
pub fn build_snapshot(bridge: &dyn Bridge) -> PlaybackSnapshot {
    let query = |operation: Operation| -> Option<String> {
        match bridge.run(&operation) {
            Ok(raw) => Some(raw),
            Err(err) => {
                log::debug!("{operation:?} fell back to default: {err}");
                None
            }
        }
    };

    thread::scope(|scope| {
        let shuffle = scope.spawn(|| query(Operation::Shuffle));
        let repeat = scope.spawn(|| query(Operation::Repeat));
        let volume = scope.spawn(|| query(Operation::Volume));
        let next = scope.spawn(|| query(Operation::NextTrackInfo));

        let play_state = query(Operation::PlayerState)
            .map(|raw| PlayState::parse(&raw))
            .unwrap_or_default();

        let mut snapshot = PlaybackSnapshot {
            play_state,
            ..PlaybackSnapshot::default()
        };

        if play_state.is_active() {
            let name = scope.spawn(|| query(Operation::TrackName));
            let artist = scope.spawn(|| query(Operation::TrackArtist));
            let album = scope.spawn(|| query(Operation::TrackAlbum));
            let duration = scope.spawn(|| query(Operation::TrackDuration));
            let position = scope.spawn(|| query(Operation::Position));

            snapshot.track_name = joined(name).unwrap_or_default();
            snapshot.artist = joined(artist).unwrap_or_default();
            snapshot.album = joined(album).unwrap_or_default();
            snapshot.duration_seconds = joined(duration)
                .map(|raw| bridge::parse_number(&raw))
                .unwrap_or_default();
            snapshot.position_seconds = joined(position)
                .map(|raw| bridge::parse_number(&raw))
                .unwrap_or_default();
        }

        snapshot.shuffle_enabled = joined(shuffle)
            .map(|raw| bridge::parse_bool(&raw))
            .unwrap_or(false);
        snapshot.repeat_mode = joined(repeat)
            .map(|raw| RepeatMode::parse(&raw))
            .unwrap_or_default();
        snapshot.volume_percent = joined(volume)
            .map(|raw| bridge::parse_volume(&raw))
            .unwrap_or(0);
        if let Some(raw) = joined(next) {
            let (name, artist) = bridge::parse_next_track(&raw);
            snapshot.next_track_name = name;
            snapshot.next_artist = artist;
        }

        snapshot.normalized()
    })
}

fn joined(handle: thread::ScopedJoinHandle<'_, Option<String>>) -> Option<String> {
    handle.join().ok().flatten()
}
