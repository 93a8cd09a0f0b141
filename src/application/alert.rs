use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::domain::ports::{AlertSound, Playback};

/// Starts the looping alert for a notification. Start failures are logged and
/// produce a silent handle: a missing sound never blocks a notification.
#[derive(Clone)]
pub struct AlertController {
    sound: Arc<dyn AlertSound>,
    source: String,
}

impl AlertController {
    pub fn new(sound: Arc<dyn AlertSound>, source: impl Into<String>) -> Self {
        Self {
            sound,
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn start(&self) -> AlertHandle {
        match self.sound.start_loop(&self.source) {
            Ok(playback) => {
                debug!("Alert started from {}", self.source);
                AlertHandle {
                    playback: Some(playback),
                }
            }
            Err(e) => {
                warn!("Alert could not start, continuing silently: {}", e);
                AlertHandle::silent()
            }
        }
    }
}

/// Owned playback of one session. Stopping is idempotent and happens on drop.
pub struct AlertHandle {
    playback: Option<Box<dyn Playback>>,
}

impl AlertHandle {
    pub fn silent() -> Self {
        Self { playback: None }
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    pub fn stop(&mut self) {
        if let Some(mut playback) = self.playback.take() {
            playback.stop();
        }
    }
}

impl Drop for AlertHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for AlertHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertHandle")
            .field("playing", &self.is_playing())
            .finish()
    }
}
