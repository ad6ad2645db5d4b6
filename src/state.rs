use crate::model::PlaybackSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum Presentation {
    /// Nothing has been polled yet.
    Connecting,
    Live(PlaybackSnapshot),
    /// The player could not be reached; replaces the normal display until
    /// the next successful poll.
    Error(String),
}

/// Owner of the single value the dashboard shows. Every write replaces it
/// wholesale.
#[derive(Debug)]
pub struct Reconciler {
    current: Presentation,
    revision: u64,
    needs_render: bool,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            current: Presentation::Connecting,
            revision: 0,
            needs_render: true,
        }
    }

    pub fn publish(&mut self, presentation: Presentation) {
        self.current = match presentation {
            Presentation::Live(snapshot) => Presentation::Live(snapshot.normalized()),
            other => other,
        };
        self.revision += 1;
        self.needs_render = true;
    }

    pub fn current(&self) -> &Presentation {
        &self.current
    }

    pub fn live(&self) -> Option<&PlaybackSnapshot> {
        match &self.current {
            Presentation::Live(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// Number of publishes so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns and clears the pending-render flag.
    pub fn take_render(&mut self) -> bool {
        std::mem::take(&mut self.needs_render)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlayState;

    #[test]
    fn publish_replaces_wholesale() {
        let mut reconciler = Reconciler::new();
        reconciler.publish(Presentation::Live(PlaybackSnapshot {
            track_name: String::from("Song"),
            play_state: PlayState::Playing,
            volume_percent: 40,
            ..PlaybackSnapshot::default()
        }));
        reconciler.publish(Presentation::Live(PlaybackSnapshot {
            volume_percent: 70,
            ..PlaybackSnapshot::default()
        }));

        let live = reconciler.live().expect("live");
        assert!(live.track_name.is_empty());
        assert_eq!(live.volume_percent, 70);
        assert_eq!(reconciler.revision(), 2);
    }

    #[test]
    fn error_hides_live_snapshot() {
        let mut reconciler = Reconciler::new();
        reconciler.publish(Presentation::Live(PlaybackSnapshot::default()));
        reconciler.publish(Presentation::Error(String::from("Music unreachable")));

        assert!(reconciler.live().is_none());
        assert!(reconciler.take_render());
        assert!(!reconciler.take_render());
    }
}
