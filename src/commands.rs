use crate::bridge::Operation;
use crate::model::{PlayState, PlaybackSnapshot, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    PlayPause,
    NextTrack,
    PreviousTrack,
    VolumeUp,
    VolumeDown,
    SeekForward,
    SeekBackward,
    ToggleShuffle,
    CycleRepeat,
    BrowsePlaylists,
    Refresh,
    Quit,
}

#[derive(Debug, Clone, Copy)]
pub struct CommandDescriptor {
    pub id: CommandId,
    pub label: &'static str,
    pub keys: &'static [char],
    pub key_hint: &'static str,
}

/// Menu order is display order.
pub const COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor {
        id: CommandId::PlayPause,
        label: "Play / Pause",
        keys: &[' '],
        key_hint: "space",
    },
    CommandDescriptor {
        id: CommandId::NextTrack,
        label: "Next Track",
        keys: &['n'],
        key_hint: "n",
    },
    CommandDescriptor {
        id: CommandId::PreviousTrack,
        label: "Previous Track",
        keys: &['p'],
        key_hint: "p",
    },
    CommandDescriptor {
        id: CommandId::VolumeUp,
        label: "Volume +",
        keys: &['+', '='],
        key_hint: "+",
    },
    CommandDescriptor {
        id: CommandId::VolumeDown,
        label: "Volume -",
        keys: &['-', '_'],
        key_hint: "-",
    },
    CommandDescriptor {
        id: CommandId::SeekForward,
        label: "Seek +10s",
        keys: &[']', '.'],
        key_hint: "]",
    },
    CommandDescriptor {
        id: CommandId::SeekBackward,
        label: "Seek -10s",
        keys: &['[', ','],
        key_hint: "[",
    },
    CommandDescriptor {
        id: CommandId::ToggleShuffle,
        label: "Toggle Shuffle",
        keys: &['s'],
        key_hint: "s",
    },
    CommandDescriptor {
        id: CommandId::CycleRepeat,
        label: "Cycle Repeat",
        keys: &['r'],
        key_hint: "r",
    },
    CommandDescriptor {
        id: CommandId::BrowsePlaylists,
        label: "Browse Playlists",
        keys: &['l'],
        key_hint: "l",
    },
    CommandDescriptor {
        id: CommandId::Refresh,
        label: "Refresh",
        keys: &['u'],
        key_hint: "u",
    },
    CommandDescriptor {
        id: CommandId::Quit,
        label: "Quit",
        keys: &['q'],
        key_hint: "q",
    },
];

pub fn descriptor(id: CommandId) -> &'static CommandDescriptor {
    COMMANDS
        .iter()
        .find(|command| command.id == id)
        .unwrap_or(&COMMANDS[0])
}

pub fn command_for_key(key: char) -> Option<CommandId> {
    COMMANDS
        .iter()
        .find(|command| command.keys.contains(&key))
        .map(|command| command.id)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandSteps {
    pub volume: u8,
    pub seek_seconds: f64,
}

impl Default for CommandSteps {
    fn default() -> Self {
        Self {
            volume: 5,
            seek_seconds: 10.0,
        }
    }
}

impl From<&Settings> for CommandSteps {
    fn from(settings: &Settings) -> Self {
        Self {
            volume: settings.volume_step.min(100),
            seek_seconds: settings.seek_step_seconds.abs(),
        }
    }
}

/// The locally guessed effect of a command, applied before the player
/// confirms it. `None` for commands with no visible immediate effect.
pub fn optimistic(
    current: &PlaybackSnapshot,
    command: CommandId,
    steps: CommandSteps,
) -> Option<PlaybackSnapshot> {
    let mut next = current.clone();
    match command {
        CommandId::PlayPause => {
            next.play_state = match current.play_state {
                PlayState::Playing => PlayState::Paused,
                PlayState::Paused | PlayState::Stopped => PlayState::Playing,
            };
        }
        CommandId::NextTrack | CommandId::PreviousTrack => {
            next.play_state = PlayState::Playing;
            next.position_seconds = 0.0;
        }
        CommandId::VolumeUp => {
            next.volume_percent = current.volume_percent.saturating_add(steps.volume).min(100);
        }
        CommandId::VolumeDown => {
            next.volume_percent = current.volume_percent.min(100).saturating_sub(steps.volume);
        }
        CommandId::SeekForward => {
            next.position_seconds = current.position_seconds + steps.seek_seconds;
        }
        CommandId::SeekBackward => {
            next.position_seconds = (current.position_seconds - steps.seek_seconds).max(0.0);
        }
        CommandId::ToggleShuffle => next.shuffle_enabled = !current.shuffle_enabled,
        CommandId::CycleRepeat => next.repeat_mode = current.repeat_mode.next(),
        CommandId::BrowsePlaylists | CommandId::Refresh | CommandId::Quit => return None,
    }
    Some(next.normalized())
}

/// Bridge operations realising `command`. With a known post-command
/// snapshot the targets are absolute so the player lands where the display
/// already shows; without one the relative forms are used.
pub fn plan(
    command: CommandId,
    after: Option<&PlaybackSnapshot>,
    steps: CommandSteps,
) -> Vec<Operation> {
    let volume_delta = i16::from(steps.volume);
    match command {
        CommandId::PlayPause => vec![Operation::PlayPause],
        CommandId::NextTrack => vec![Operation::NextTrack, Operation::Play],
        CommandId::PreviousTrack => vec![Operation::PreviousTrack, Operation::Play],
        CommandId::VolumeUp | CommandId::VolumeDown => match after {
            Some(snapshot) => vec![Operation::SetVolume(snapshot.volume_percent)],
            None if command == CommandId::VolumeUp => vec![Operation::AdjustVolume(volume_delta)],
            None => vec![Operation::AdjustVolume(-volume_delta)],
        },
        CommandId::SeekForward => vec![Operation::SeekBy(steps.seek_seconds)],
        CommandId::SeekBackward => vec![Operation::SeekBy(-steps.seek_seconds)],
        CommandId::ToggleShuffle => match after {
            Some(snapshot) => vec![Operation::SetShuffle(snapshot.shuffle_enabled)],
            None => vec![Operation::ToggleShuffle],
        },
        CommandId::CycleRepeat => match after {
            Some(snapshot) => vec![Operation::SetRepeat(snapshot.repeat_mode)],
            None => vec![Operation::CycleRepeat],
        },
        CommandId::BrowsePlaylists | CommandId::Refresh | CommandId::Quit => Vec::new(),
    }
}
