use hold_scribe_core::Earcons;

/// System sounds: `afplay` on macOS, a console beep on Windows, silent elsewhere.
#[derive(Debug, Default)]
pub struct SystemEarcons;

impl Earcons for SystemEarcons {
    fn recording_started(&self) {
        play(Cue::Start);
    }

    fn recording_stopped(&self) {
        play(Cue::Stop);
    }
}

#[derive(Debug, Clone, Copy)]
enum Cue {
    Start,
    Stop,
}

#[cfg(target_os = "macos")]
fn play(cue: Cue) {
    let sound = match cue {
        Cue::Start => "/System/Library/Sounds/Tink.aiff",
        Cue::Stop => "/System/Library/Sounds/Pop.aiff",
    };

    std::thread::spawn(move || {
        if let Err(e) = std::process::Command::new("afplay").arg(sound).spawn() {
            tracing::debug!(error = %e, "Failed to play earcon");
        }
    });
}

#[cfg(target_os = "windows")]
fn play(cue: Cue) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    let beep = match cue {
        Cue::Start => "[console]::beep(800, 100)",
        Cue::Stop => "[console]::beep(600, 100)",
    };

    std::thread::spawn(move || {
        if let Err(e) = std::process::Command::new("powershell")
            .args(["-c", beep])
            .creation_flags(CREATE_NO_WINDOW)
            .spawn()
        {
            tracing::debug!(error = %e, "Failed to play earcon");
        }
    });
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn play(_cue: Cue) {}
