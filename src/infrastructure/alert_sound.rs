use std::time::Instant;

use log::info;

use crate::domain::errors::AlertError;
use crate::domain::ports::{AlertSound, Playback};

/// Alert sound for a headless service: playback is recorded in the log and the
/// source URI is handed to clients through the session view.
#[derive(Debug, Default, Clone)]
pub struct LoggingAlertSound;

impl AlertSound for LoggingAlertSound {
    fn start_loop(&self, source: &str) -> Result<Box<dyn Playback>, AlertError> {
        if !(source.starts_with("https://") || source.starts_with("http://")) {
            return Err(AlertError::Unsupported(source.to_string()));
        }
        info!("Alert looping from {}", source);
        Ok(Box::new(LoggedPlayback {
            source: source.to_string(),
            started: Instant::now(),
        }))
    }
}

struct LoggedPlayback {
    source: String,
    started: Instant,
}

impl Playback for LoggedPlayback {
    fn stop(&mut self) {
        info!(
            "Alert from {} stopped after {:.1}s",
            self.source,
            self.started.elapsed().as_secs_f32()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_sources_start() {
        let mut playback = LoggingAlertSound
            .start_loop("https://example.com/alert.mp3")
            .expect("should start");
        playback.stop();
    }

    #[test]
    fn non_http_sources_are_unsupported() {
        let err = LoggingAlertSound.start_loop("file:///tmp/alert.mp3").err();
        assert!(matches!(err, Some(AlertError::Unsupported(_))));
    }
}
