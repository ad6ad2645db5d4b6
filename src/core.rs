use crate::bridge::Bridge;
use crate::browse::{BrowseAction, BrowseContext};
use crate::commands::{self, COMMANDS, CommandId, CommandSteps};
use crate::event::{CoreEvent, PollOutcome};
use crate::model::{PlaybackSnapshot, Settings, TrackIdentity};
use crate::poll::{PollLoop, PollSchedule};
use crate::state::{Presentation, Reconciler};
use crate::trivia::{
    Lookup, TriviaCache, TriviaDisplay, TriviaEntry, TriviaFetcher, TriviaPanel,
};
use crate::worker::{CommandWorker, Job};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Menu,
    Browse,
}

/// What the core knew about its own commands when a poll started.
#[derive(Debug, Clone, Copy, Default)]
struct PollStamp {
    epoch: u64,
    commands_pending: usize,
}

/// Owns everything the dashboard shows. Lives on the UI thread; background
/// work reports back through [`CoreEvent`]s drained by [`RemoteCore::pump_events`].
pub struct RemoteCore {
    pub reconciler: Reconciler,
    pub browse: BrowseContext,
    pub trivia_cache: TriviaCache,
    pub trivia_panel: TriviaPanel,
    pub menu_selected: usize,
    pub status: String,
    pub dirty: bool,
    pub should_quit: bool,
    steps: CommandSteps,
    epoch: u64,
    commands_pending: usize,
    poll_stamp: PollStamp,
    repoll: bool,
    poller: PollLoop,
    schedule: PollSchedule,
    worker: CommandWorker,
    fetcher: Option<Arc<dyn TriviaFetcher>>,
    events_tx: Sender<CoreEvent>,
    events_rx: Receiver<CoreEvent>,
}

impl RemoteCore {
    pub fn new(
        bridge: Arc<dyn Bridge>,
        fetcher: Option<Arc<dyn TriviaFetcher>>,
        settings: &Settings,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let poller = PollLoop::new(
            Arc::clone(&bridge),
            events_tx.clone(),
            Duration::from_millis(settings.launch_settle_ms),
        );
        let worker = CommandWorker::start(bridge, events_tx.clone());

        Self {
            reconciler: Reconciler::new(),
            browse: BrowseContext::default(),
            trivia_cache: TriviaCache::new(),
            trivia_panel: TriviaPanel::default(),
            menu_selected: 0,
            status: String::from("Connecting..."),
            dirty: true,
            should_quit: false,
            steps: CommandSteps::from(settings),
            epoch: 0,
            commands_pending: 0,
            poll_stamp: PollStamp::default(),
            repoll: false,
            poller,
            schedule: PollSchedule::new(Duration::from_millis(settings.poll_interval_ms)),
            worker,
            fetcher,
            events_tx,
            events_rx,
        }
    }

    pub fn trivia_available(&self) -> bool {
        self.fetcher.is_some()
    }

    pub fn presentation(&self) -> &Presentation {
        self.reconciler.current()
    }

    pub fn snapshot(&self) -> Option<&PlaybackSnapshot> {
        self.reconciler.live()
    }

    pub fn focus(&self) -> Focus {
        if self.browse.is_open() {
            Focus::Browse
        } else {
            Focus::Menu
        }
    }

    pub fn poll_in_flight(&self) -> bool {
        self.poller.is_busy()
    }

    /// Player commands submitted to the worker that have not reported back.
    pub fn commands_pending(&self) -> usize {
        self.commands_pending
    }

    /// Issues a poll through the single-flight guard. Returns false when the
    /// request was dropped because a poll is already running.
    pub fn request_poll(&mut self) -> bool {
        if !self.poller.tick() {
            return false;
        }
        self.poll_stamp = PollStamp {
            epoch: self.epoch,
            commands_pending: self.commands_pending,
        };
        true
    }

    /// A poll that must observe a finished command. When one is already
    /// running it cannot see that command, so exactly one more poll follows it.
    fn force_poll(&mut self) {
        if !self.request_poll() {
            self.repoll = true;
        }
    }

    /// A poll reflects the user's latest action only if it started after
    /// every command had reached the player.
    fn poll_is_current(&self) -> bool {
        self.poll_stamp.epoch == self.epoch && self.poll_stamp.commands_pending == 0
    }

    fn command_submitted(&mut self, job: Job) {
        self.epoch += 1;
        if self.worker.submit(job) {
            self.commands_pending += 1;
        }
    }

    fn command_returned(&mut self) {
        self.commands_pending = self.commands_pending.saturating_sub(1);
        self.force_poll();
    }

    /// Drives the fixed-period schedule; call on every loop iteration.
    pub fn on_timer(&mut self, now: Instant) {
        if self.schedule.due(now) {
            self.request_poll();
        }
    }

    pub fn until_next_poll(&self, now: Instant) -> Option<Duration> {
        self.schedule.until_due(now)
    }

    /// Applies the optimistic effect of `command` at once, then hands the
    /// bridge work to the command worker. The forced poll follows when the
    /// worker reports back.
    pub fn dispatch(&mut self, command: CommandId) {
        log::info!("dispatch {command:?}");
        match command {
            CommandId::Quit => {
                self.should_quit = true;
                return;
            }
            CommandId::BrowsePlaylists => {
                self.open_browser();
                return;
            }
            CommandId::Refresh => {
                if self.request_poll() {
                    self.set_status("Refreshing");
                } else {
                    self.set_status("Refresh already in progress");
                }
                return;
            }
            _ => {}
        }

        let after = self
            .reconciler
            .live()
            .and_then(|current| commands::optimistic(current, command, self.steps));
        if let Some(snapshot) = &after {
            self.publish(Presentation::Live(snapshot.clone()));
        }

        let operations = commands::plan(command, after.as_ref(), self.steps);
        self.set_status(commands::descriptor(command).label);
        self.command_submitted(Job::Command {
            command,
            operations,
        });
    }

    /// Plays the 1-based `index` of `playlist`.
    pub fn play_track(&mut self, playlist: &str, index: usize) {
        log::info!("play track {index} of {playlist:?}");
        self.set_status(&format!("Starting track {index} of {playlist}"));
        self.command_submitted(Job::PlayTrack {
            playlist: playlist.to_string(),
            index,
        });
    }

    pub fn open_browser(&mut self) {
        self.browse.begin();
        self.worker.submit(Job::ListPlaylists);
        self.set_status("Loading playlists...");
    }

    pub fn browse_select(&mut self) {
        match self.browse.select() {
            Some(BrowseAction::LoadTracks(playlist)) => {
                self.set_status(&format!("Loading {playlist}..."));
                self.worker.submit(Job::ListTracks { playlist });
            }
            Some(BrowseAction::PlayTrack { playlist, index }) => self.play_track(&playlist, index),
            None => {}
        }
        self.dirty = true;
    }

    pub fn browse_move(&mut self, delta: isize) {
        self.browse.move_selection(delta);
        self.dirty = true;
    }

    pub fn browse_cancel(&mut self) {
        self.browse.close();
        self.set_status("Browse closed");
    }

    pub fn menu_move(&mut self, delta: isize) {
        self.menu_selected = self
            .menu_selected
            .saturating_add_signed(delta)
            .min(COMMANDS.len() - 1);
        self.dirty = true;
    }

    pub fn activate_menu(&mut self) {
        if let Some(command) = COMMANDS.get(self.menu_selected) {
            self.dispatch(command.id);
        }
    }

    /// Handles every result that has arrived so far. Returns how many were
    /// handled.
    pub fn pump_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => {
                    self.handle_event(event);
                    handled += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        handled
    }

    /// Returns and clears the redraw flag.
    pub fn take_redraw(&mut self) -> bool {
        let published = self.reconciler.take_render();
        std::mem::take(&mut self.dirty) || published
    }

    fn handle_event(&mut self, event: CoreEvent) {
        match event {
            CoreEvent::PollFinished(outcome) => {
                self.poller.finish();
                self.schedule.arm(Instant::now());
                if self.poll_is_current() {
                    self.apply_poll(outcome);
                } else {
                    log::debug!("poll started before the latest command; discarded");
                }
                if std::mem::take(&mut self.repoll) {
                    self.force_poll();
                }
            }
            CoreEvent::CommandFinished { command, failures } => {
                if let Some(first) = failures.first() {
                    let label = commands::descriptor(command).label;
                    self.set_status(&format!("{label} failed: {first}"));
                }
                self.command_returned();
            }
            CoreEvent::PlaylistsLoaded(result) => match result {
                Ok(playlists) => {
                    let count = playlists.len();
                    if self.browse.playlists_loaded(playlists) {
                        self.set_status(&format!("{count} playlists"));
                    }
                }
                Err(err) => {
                    self.browse.request_failed();
                    self.set_status(&format!("Could not list playlists: {err}"));
                }
            },
            CoreEvent::TracksLoaded { playlist, result } => match result {
                Ok(tracks) => {
                    let count = tracks.len();
                    if self.browse.tracks_loaded(&playlist, tracks) {
                        self.set_status(&format!("{playlist}: {count} tracks"));
                    }
                }
                Err(err) => {
                    self.browse.request_failed();
                    self.set_status(&format!("Could not list {playlist}: {err}"));
                }
            },
            CoreEvent::TrackStarted {
                playlist,
                index,
                result,
            } => {
                match result {
                    Ok(()) => {
                        self.browse.track_started(&playlist, index);
                        self.set_status(&format!("Playing track {index} of {playlist}"));
                    }
                    Err(err) => {
                        self.browse.request_failed();
                        self.set_status(&format!("Could not play track {index}: {err}"));
                    }
                }
                self.command_returned();
            }
            CoreEvent::TriviaFetched { identity, entry } => {
                self.trivia_cache.complete(&identity, entry.clone());
                if self.trivia_panel.apply_if_current(&identity, &entry) {
                    self.dirty = true;
                }
            }
        }
    }

    fn apply_poll(&mut self, outcome: PollOutcome) {
        match outcome {
            PollOutcome::Snapshot(snapshot) => {
                log::debug!("poll: {:?} {:?}", snapshot.play_state, snapshot.track_name);
                if !matches!(self.reconciler.current(), Presentation::Live(_)) {
                    self.set_status("Connected");
                }
                self.publish(Presentation::Live(snapshot));
            }
            PollOutcome::Unavailable(message) => {
                log::warn!("poll failed: {message}");
                self.set_status(&message);
                self.publish(Presentation::Error(message));
            }
        }
    }

    fn publish(&mut self, presentation: Presentation) {
        self.reconciler.publish(presentation);
        self.dirty = true;
        self.sync_trivia();
    }

    /// Follows the live track with the trivia panel. Only a change of track
    /// identity triggers a lookup.
    fn sync_trivia(&mut self) {
        let identity = self.reconciler.live().and_then(PlaybackSnapshot::identity);
        if identity.as_ref() == self.trivia_panel.identity() {
            return;
        }
        let Some(identity) = identity else {
            self.trivia_panel.show(None, TriviaDisplay::Empty);
            return;
        };

        let display = match self.trivia_cache.lookup(&identity, self.fetcher.is_some()) {
            Lookup::Hit(entry) => TriviaDisplay::Ready(entry),
            Lookup::Pending => TriviaDisplay::Fetching,
            Lookup::Fetch => {
                self.spawn_trivia_fetch(identity.clone());
                TriviaDisplay::Fetching
            }
        };
        self.trivia_panel.show(Some(identity), display);
    }

    fn spawn_trivia_fetch(&self, identity: TrackIdentity) {
        let Some(fetcher) = self.fetcher.clone() else {
            return;
        };
        let events = self.events_tx.clone();
        log::info!("fetching trivia for {:?} by {:?}", identity.title, identity.artist);
        thread::spawn(move || {
            let result = fetcher.fetch(&identity.title, &identity.artist);
            let entry = TriviaEntry::from_result(result);
            let _ = events.send(CoreEvent::TriviaFetched { identity, entry });
        });
    }

    pub fn set_status(&mut self, message: &str) {
        self.status = format!("{}  {message}", clock());
        self.dirty = true;
    }
}

fn clock() -> String {
    let now =
        time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    format!("{:02}:{:02}:{:02}", now.hour(), now.minute(), now.second())
}
