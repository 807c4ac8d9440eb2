//! Where match notices and the audible alert go. The scan pass talks to
//! the trait so tests can record instead of making noise.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

pub trait AlertSink {
    /// One human-readable notice per matching row.
    fn notify(&mut self, label: &str);

    /// The audible cue. Called at most once per scan pass.
    fn play_alert(&mut self);
}

/// Production sink: prints to the console and plays the configured sound
/// file. Falls back to the terminal bell when no sound is configured or
/// no output device is available.
pub struct ConsoleAlert {
    sound: Option<PathBuf>,
    audible: bool,
    output: Option<(OutputStream, OutputStreamHandle)>,
}

impl ConsoleAlert {
    pub fn new(sound: Option<PathBuf>) -> Self {
        Self {
            sound,
            audible: true,
            output: None,
        }
    }

    /// Notices only: `play_alert` becomes a no-op, no sound and no bell.
    pub fn notices_only() -> Self {
        Self {
            sound: None,
            audible: false,
            output: None,
        }
    }

    fn output_handle(&mut self) -> Option<&OutputStreamHandle> {
        if self.output.is_none() {
            match OutputStream::try_default() {
                Ok(pair) => self.output = Some(pair),
                Err(e) => {
                    eprintln!("⚠ no audio output device: {}", e);
                    return None;
                }
            }
        }
        self.output.as_ref().map(|(_, handle)| handle)
    }

    fn play_sound_file(&mut self, path: PathBuf) -> Result<(), String> {
        let file = File::open(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        let handle = self.output_handle().ok_or("no output device")?;
        let sink = Sink::try_new(handle).map_err(|e| e.to_string())?;
        sink.append(source);
        // Detach so the sound finishes while the loop sleeps.
        sink.detach();
        Ok(())
    }
}

fn ring_bell() {
    print!("\x07");
    std::io::stdout().flush().ok();
}

impl AlertSink for ConsoleAlert {
    fn notify(&mut self, label: &str) {
        println!("Бягом забирай №{}", label);
    }

    fn play_alert(&mut self) {
        if !self.audible {
            return;
        }
        match self.sound.clone() {
            Some(path) => {
                if let Err(e) = self.play_sound_file(path) {
                    eprintln!("⚠ failed to play alert sound: {}", e);
                    ring_bell();
                }
            }
            None => ring_bell(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_only_never_touches_audio() {
        let mut sink = ConsoleAlert::notices_only();
        sink.play_alert();
        // No device is opened and no sound is configured.
        assert!(sink.output.is_none());
        assert!(sink.sound.is_none());
        assert!(!sink.audible);
    }

    #[test]
    fn test_default_sink_is_audible() {
        let sink = ConsoleAlert::new(None);
        assert!(sink.audible);
    }
}
