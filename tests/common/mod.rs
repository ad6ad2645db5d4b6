#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use tune_remote::bridge::{Bridge, BridgeError, Operation};
use tune_remote::core::RemoteCore;
use tune_remote::model::{PlayState, RepeatMode, Settings};
use tune_remote::trivia::TriviaFetcher;

/// In-memory player answering bridge operations the way the real one would.
#[derive(Debug, Clone)]
pub struct PlayerModel {
    pub running: bool,
    pub state: PlayState,
    pub queue: Vec<(String, String)>,
    pub current: usize,
    pub position: f64,
    pub duration: f64,
    pub volume: u8,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub playlists: Vec<(String, Vec<(String, String)>)>,
}

impl Default for PlayerModel {
    fn default() -> Self {
        Self {
            running: true,
            state: PlayState::Paused,
            queue: vec![
                (String::from("First Song"), String::from("Band")),
                (String::from("Second Song"), String::from("Band")),
                (String::from("Third Song"), String::from("Other Band")),
            ],
            current: 0,
            position: 30.0,
            duration: 200.0,
            volume: 50,
            shuffle: false,
            repeat: RepeatMode::None,
            playlists: vec![
                (
                    String::from("Road Trip"),
                    vec![
                        (String::from("Highway"), String::from("Drivers")),
                        (String::from("Exit 9"), String::from("Drivers")),
                    ],
                ),
                (String::from("Empty"), Vec::new()),
            ],
        }
    }
}

#[derive(Default)]
struct Gate {
    held: Mutex<bool>,
    released: Condvar,
}

pub struct FakePlayer {
    model: Mutex<PlayerModel>,
    calls: Mutex<Vec<Operation>>,
    failing: Mutex<Vec<Operation>>,
    panic_once: Mutex<Option<Operation>>,
    poll_gate: Gate,
    stall_after: Mutex<Option<Operation>>,
    stall_gate: Gate,
}

impl FakePlayer {
    pub fn new(model: PlayerModel) -> Arc<Self> {
        Arc::new(Self {
            model: Mutex::new(model),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(Vec::new()),
            panic_once: Mutex::new(None),
            poll_gate: Gate::default(),
            stall_after: Mutex::new(None),
            stall_gate: Gate::default(),
        })
    }

    pub fn model(&self) -> PlayerModel {
        self.model.lock().expect("model lock").clone()
    }

    pub fn update(&self, change: impl FnOnce(&mut PlayerModel)) {
        change(&mut self.model.lock().expect("model lock"));
    }

    pub fn calls(&self) -> Vec<Operation> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn count(&self, operation: &Operation) -> usize {
        self.calls().iter().filter(|call| *call == operation).count()
    }

    pub fn fail(&self, operation: Operation) {
        self.failing.lock().expect("failing lock").push(operation);
    }

    pub fn heal(&self) {
        self.failing.lock().expect("failing lock").clear();
    }

    /// Blocks every `IsRunning` query, and so every poll, until released.
    pub fn hold_polls(&self) {
        *self.poll_gate.held.lock().expect("gate lock") = true;
    }

    pub fn release_polls(&self) {
        *self.poll_gate.held.lock().expect("gate lock") = false;
        self.poll_gate.released.notify_all();
    }

    /// The next call of `operation` panics instead of answering.
    pub fn panic_once(&self, operation: Operation) {
        *self.panic_once.lock().expect("panic lock") = Some(operation);
    }

    /// Answers `operation` and then blocks the calling poll until
    /// [`FakePlayer::release_stall`].
    pub fn stall_after(&self, operation: Operation) {
        *self.stall_after.lock().expect("stall lock") = Some(operation);
        *self.stall_gate.held.lock().expect("gate lock") = true;
    }

    pub fn release_stall(&self) {
        *self.stall_after.lock().expect("stall lock") = None;
        *self.stall_gate.held.lock().expect("gate lock") = false;
        self.stall_gate.released.notify_all();
    }

    fn wait_for_gate(&self) {
        wait_on(&self.poll_gate);
    }

    fn answer(&self, operation: &Operation) -> String {
        let mut model = self.model.lock().expect("model lock");
        let track = model.queue.get(model.current).cloned().unwrap_or_default();
        match operation {
            Operation::IsRunning => model.running.to_string(),
            Operation::Launch => {
                model.running = true;
                String::new()
            }
            Operation::PlayerState => model.state.label().to_ascii_lowercase(),
            Operation::Play => {
                model.state = PlayState::Playing;
                String::new()
            }
            Operation::Pause => {
                model.state = PlayState::Paused;
                String::new()
            }
            Operation::PlayPause => {
                model.state = if model.state == PlayState::Playing {
                    PlayState::Paused
                } else {
                    PlayState::Playing
                };
                String::new()
            }
            Operation::NextTrack => {
                model.current = (model.current + 1) % model.queue.len().max(1);
                model.position = 0.0;
                String::new()
            }
            Operation::PreviousTrack => {
                model.current = model.current.saturating_sub(1);
                model.position = 0.0;
                String::new()
            }
            Operation::Volume => model.volume.to_string(),
            Operation::SetVolume(volume) => {
                model.volume = (*volume).min(100);
                String::new()
            }
            Operation::AdjustVolume(delta) => {
                model.volume = (i16::from(model.volume) + delta).clamp(0, 100) as u8;
                String::new()
            }
            Operation::Position => model.position.to_string(),
            Operation::SetPosition(position) => {
                model.position = position.max(0.0);
                String::new()
            }
            Operation::SeekBy(delta) => {
                model.position = (model.position + delta).clamp(0.0, model.duration);
                String::new()
            }
            Operation::Shuffle => model.shuffle.to_string(),
            Operation::SetShuffle(enabled) => {
                model.shuffle = *enabled;
                String::new()
            }
            Operation::ToggleShuffle => {
                model.shuffle = !model.shuffle;
                String::new()
            }
            Operation::Repeat => model.repeat.script_keyword().to_string(),
            Operation::SetRepeat(mode) => {
                model.repeat = *mode;
                String::new()
            }
            Operation::CycleRepeat => {
                model.repeat = model.repeat.next();
                String::new()
            }
            Operation::TrackName => track.0,
            Operation::TrackArtist => track.1,
            Operation::TrackAlbum => String::from("Album"),
            Operation::TrackDuration => model.duration.to_string(),
            Operation::NextTrackInfo => model
                .queue
                .get(model.current + 1)
                .map(|(name, artist)| format!("{name}\n{artist}"))
                .unwrap_or_default(),
            Operation::Playlists => model
                .playlists
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            Operation::PlaylistTracks(playlist) => model
                .playlists
                .iter()
                .find(|(name, _)| name == playlist)
                .map(|(_, tracks)| {
                    tracks
                        .iter()
                        .enumerate()
                        .map(|(index, (name, artist))| {
                            format!("{}\t{name}\t{artist}\tAlbum", index + 1)
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .unwrap_or_default(),
            Operation::PlayTrackAt { playlist, index } => {
                let tracks = model
                    .playlists
                    .iter()
                    .find(|(name, _)| name == playlist)
                    .map(|(_, tracks)| tracks.clone())
                    .unwrap_or_default();
                model.queue = tracks;
                model.current = index.saturating_sub(1);
                model.position = 0.0;
                model.state = PlayState::Playing;
                String::new()
            }
        }
    }
}

fn wait_on(gate: &Gate) {
    let mut held = gate.held.lock().expect("gate lock");
    while *held {
        held = gate.released.wait(held).expect("gate wait");
    }
}

impl Bridge for FakePlayer {
    fn run(&self, operation: &Operation) -> Result<String, BridgeError> {
        if *operation == Operation::IsRunning {
            self.wait_for_gate();
        }
        self.calls
            .lock()
            .expect("calls lock")
            .push(operation.clone());

        let trips = {
            let mut armed = self.panic_once.lock().expect("panic lock");
            if armed.as_ref() == Some(operation) {
                armed.take();
                true
            } else {
                false
            }
        };
        if trips {
            panic!("{operation:?} crashed the automation host");
        }

        if self
            .failing
            .lock()
            .expect("failing lock")
            .contains(operation)
        {
            return Err(BridgeError::Script(format!("{operation:?} rejected")));
        }
        let answer = self.answer(operation);

        let stalls = self.stall_after.lock().expect("stall lock").as_ref() == Some(operation);
        if stalls {
            wait_on(&self.stall_gate);
        }
        Ok(answer)
    }
}

/// Counts fetches per title; can hold every fetch until released.
#[derive(Default)]
pub struct CountingFetcher {
    fetches: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
    gate: Gate,
    fail: bool,
}

impl CountingFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn hold(&self) {
        *self.gate.held.lock().expect("gate lock") = true;
    }

    pub fn release(&self) {
        *self.gate.held.lock().expect("gate lock") = false;
        self.gate.released.notify_all();
    }

    pub fn fetches_for(&self, title: &str) -> usize {
        self.fetches
            .lock()
            .expect("fetch lock")
            .get(title)
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

impl TriviaFetcher for CountingFetcher {
    fn fetch(&self, title: &str, artist: &str) -> anyhow::Result<String> {
        *self
            .fetches
            .lock()
            .expect("fetch lock")
            .entry(title.to_string())
            .or_default() += 1;
        self.total.fetch_add(1, Ordering::SeqCst);

        wait_on(&self.gate);

        if self.fail {
            anyhow::bail!("service timed out");
        }
        Ok(format!("## {title}\n- recorded by {artist}"))
    }
}

pub fn fast_settings() -> Settings {
    Settings {
        poll_interval_ms: 60_000,
        launch_settle_ms: 10,
        ..Settings::default()
    }
}

pub fn core_with(player: &Arc<FakePlayer>, fetcher: Option<Arc<CountingFetcher>>) -> RemoteCore {
    let fetcher = fetcher.map(|fetcher| fetcher as Arc<dyn TriviaFetcher>);
    RemoteCore::new(player.clone(), fetcher, &fast_settings())
}

/// Pumps core events until `done` holds or two seconds pass.
pub fn pump_until(core: &mut RemoteCore, mut done: impl FnMut(&RemoteCore) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        core.pump_events();
        if done(&*core) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// Runs one poll to completion.
pub fn poll_to_completion(core: &mut RemoteCore) {
    assert!(core.request_poll(), "a poll was already running");
    assert!(
        pump_until(core, |core| !core.poll_in_flight()),
        "poll did not finish"
    );
}

/// Waits for the command worker's forced poll to land after a dispatch.
pub fn settle(core: &mut RemoteCore, player: &FakePlayer, expected_polls: usize) {
    assert!(
        pump_until(core, |core| {
            !core.poll_in_flight() && player.count(&Operation::IsRunning) >= expected_polls
        }),
        "forced poll did not arrive"
    );
}
