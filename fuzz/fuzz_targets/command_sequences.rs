#![no_main]

use libfuzzer_sys::fuzz_target;
use tune_remote::bridge::{self, Operation};
use tune_remote::commands::{self, CommandId, CommandSteps};
use tune_remote::model::{PlayState, PlaybackSnapshot, RepeatMode};

const PLAYER_COMMANDS: [CommandId; 9] = [
    CommandId::PlayPause,
    CommandId::NextTrack,
    CommandId::PreviousTrack,
    CommandId::VolumeUp,
    CommandId::VolumeDown,
    CommandId::SeekForward,
    CommandId::SeekBackward,
    CommandId::ToggleShuffle,
    CommandId::CycleRepeat,
];

fuzz_target!(|data: &[u8]| {
    let Some((&seed, ops)) = data.split_first() else {
        return;
    };

    let mut snapshot = PlaybackSnapshot {
        track_name: String::from("Track"),
        artist: String::from("Artist"),
        duration_seconds: 240.0,
        position_seconds: f64::from(seed),
        play_state: PlayState::parse(["playing", "paused", "stopped"][usize::from(seed % 3)]),
        repeat_mode: RepeatMode::ORDER[usize::from(seed % 3)],
        volume_percent: seed,
        ..PlaybackSnapshot::default()
    }
    .normalized();
    let steps = CommandSteps::default();

    for byte in ops {
        let command = PLAYER_COMMANDS[usize::from(*byte) % PLAYER_COMMANDS.len()];
        let Some(next) = commands::optimistic(&snapshot, command, steps) else {
            panic!("{command:?} has no optimistic effect");
        };
        assert!(next.volume_percent <= 100);
        assert!(next.position_seconds >= 0.0);
        if next.play_state == PlayState::Stopped {
            assert!(next.track_name.is_empty());
        }

        for operation in commands::plan(command, Some(&next), steps) {
            match operation {
                Operation::SetVolume(volume) => assert_eq!(volume, next.volume_percent),
                Operation::SetRepeat(mode) => assert_eq!(mode, next.repeat_mode),
                Operation::SetShuffle(enabled) => assert_eq!(enabled, next.shuffle_enabled),
                _ => {}
            }
        }
        snapshot = next;
    }

    let text = String::from_utf8_lossy(ops);
    let _ = bridge::parse_track_records(&text);
    assert!(bridge::parse_number(&text).is_finite());
});
