use super::{Bridge, BridgeError, Operation};
use std::path::PathBuf;
use std::process::Command;

const OSASCRIPT: &str = "/usr/bin/osascript";

/// Drives a scriptable macOS player through `osascript`.
pub struct AppleScriptBridge {
    app: String,
    program: PathBuf,
}

impl AppleScriptBridge {
    pub fn new(app: &str) -> Self {
        Self {
            app: app.to_string(),
            program: PathBuf::from(OSASCRIPT),
        }
    }

    /// Whether an automation host exists on this machine.
    pub fn is_supported() -> bool {
        cfg!(target_os = "macos") && PathBuf::from(OSASCRIPT).exists()
    }

    pub fn script_for(&self, operation: &Operation) -> String {
        let app = escape(&self.app);
        let tell = |body: &str| format!("tell application \"{app}\" to {body}");

        match operation {
            Operation::IsRunning => format!("application \"{app}\" is running"),
            Operation::Launch => tell("launch"),
            Operation::PlayerState => tell("player state as string"),
            Operation::Play => tell("play"),
            Operation::Pause => tell("pause"),
            Operation::PlayPause => tell("playpause"),
            Operation::NextTrack => tell("next track"),
            Operation::PreviousTrack => tell("previous track"),
            Operation::Volume => tell("sound volume"),
            Operation::SetVolume(volume) => {
                tell(&format!("set sound volume to {}", (*volume).min(100)))
            }
            Operation::AdjustVolume(delta) => {
                tell(&format!("set sound volume to (sound volume + ({delta}))"))
            }
            Operation::Position => tell("player position"),
            Operation::SetPosition(seconds) => {
                tell(&format!("set player position to {:.2}", seconds.max(0.0)))
            }
            Operation::SeekBy(delta) => format!(
                r#"tell application "{app}"
    set p to (player position + ({delta:.2}))
    if p < 0 then set p to 0
    set player position to p
end tell"#
            ),
            Operation::Shuffle => tell("shuffle enabled as string"),
            Operation::SetShuffle(enabled) => tell(&format!("set shuffle enabled to {enabled}")),
            Operation::ToggleShuffle => tell("set shuffle enabled to not shuffle enabled"),
            Operation::Repeat => tell("song repeat as string"),
            Operation::SetRepeat(mode) => {
                tell(&format!("set song repeat to {}", mode.script_keyword()))
            }
            Operation::CycleRepeat => format!(
                r#"tell application "{app}"
    set r to song repeat as string
    if r is "off" then
        set song repeat to one
    else if r is "one" then
        set song repeat to all
    else
        set song repeat to off
    end if
end tell"#
            ),
            Operation::TrackName => tell("name of current track"),
            Operation::TrackArtist => tell("artist of current track"),
            Operation::TrackAlbum => tell("album of current track"),
            Operation::TrackDuration => tell("duration of current track"),
            Operation::NextTrackInfo => format!(
                r#"tell application "{app}"
    if player state is stopped then return ""
    try
        set cp to current playlist
        set pid to persistent ID of current track
        set tl to tracks of cp
        repeat with i from 1 to (count of tl) - 1
            if persistent ID of item i of tl is pid then
                set nt to item (i + 1) of tl
                return name of nt & linefeed & artist of nt
            end if
        end repeat
    end try
end tell
return """#
            ),
            Operation::Playlists => format!(
                r#"set AppleScript's text item delimiters to linefeed
tell application "{app}" to return name of playlists as text"#
            ),
            Operation::PlaylistTracks(playlist) => format!(
                r#"set out to ""
tell application "{app}"
    set tl to tracks of playlist "{}"
    repeat with i from 1 to count of tl
        set t to item i of tl
        set out to out & i & tab & name of t & tab & artist of t & tab & album of t & linefeed
    end repeat
end tell
return out"#,
                escape(playlist)
            ),
            Operation::PlayTrackAt { playlist, index } => tell(&format!(
                "play track {} of playlist \"{}\"",
                (*index).max(1),
                escape(playlist)
            )),
        }
    }
}

impl Bridge for AppleScriptBridge {
    fn run(&self, operation: &Operation) -> Result<String, BridgeError> {
        let script = self.script_for(operation);
        let output = Command::new(&self.program).arg("-e").arg(&script).output()?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            log::warn!("{operation:?} failed: {stderr}");
            Err(BridgeError::Script(stderr))
        }
    }
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\n', '\r'], " ")
}
