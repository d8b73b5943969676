//! Audio channels
//!
//! A channel is one playable asset (background track, stop sound) with the
//! state the sequencer needs to reason about: volume, looping, playing. The
//! actual sound output goes through an [`AudioBackend`].

use serde::{Deserialize, Serialize};

use crate::error::AudioError;

/// Which channel a fade or event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelId {
    /// Looping background track
    Music,
    /// One-shot stop sound effect
    StopSfx,
}

/// Host-side audio output for a single asset
pub trait AudioBackend {
    /// Start or resume playback. May be refused by the host.
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self);
    fn set_volume(&mut self, volume: f32);
    /// Seek back to the start (for one-shot effects)
    fn rewind(&mut self);
    /// Whether the host reports playback as running. Hosts that cannot pause
    /// on their own may keep the default.
    fn is_playing(&self) -> Option<bool> {
        None
    }
}

/// Backend that produces no sound (tests, headless runs)
#[derive(Debug, Clone, Default)]
pub struct SilentBackend {
    /// Refuse every `play()` like a browser before the first gesture
    pub deny_playback: bool,
}

impl AudioBackend for SilentBackend {
    fn play(&mut self) -> Result<(), AudioError> {
        if self.deny_playback {
            Err(AudioError::PlaybackDenied("autoplay blocked".into()))
        } else {
            Ok(())
        }
    }

    fn pause(&mut self) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn rewind(&mut self) {}
}

/// One audio asset and its playback state
pub struct AudioChannel {
    id: ChannelId,
    source: String,
    volume: f32,
    looping: bool,
    playing: bool,
    backend: Box<dyn AudioBackend>,
}

impl std::fmt::Debug for AudioChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioChannel")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("volume", &self.volume)
            .field("looping", &self.looping)
            .field("playing", &self.playing)
            .finish_non_exhaustive()
    }
}

impl AudioChannel {
    pub fn new(
        id: ChannelId,
        source: impl Into<String>,
        volume: f32,
        looping: bool,
        mut backend: Box<dyn AudioBackend>,
    ) -> Self {
        let volume = volume.clamp(0.0, 1.0);
        backend.set_volume(volume);
        Self {
            id,
            source: source.into(),
            volume,
            looping,
            playing: false,
            backend,
        }
    }

    /// Channel with a [`SilentBackend`]
    pub fn silent(id: ChannelId, source: impl Into<String>, volume: f32, looping: bool) -> Self {
        Self::new(id, source, volume, looping, Box::new(SilentBackend::default()))
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Set output level, clamped to [0, 1]
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.backend.set_volume(self.volume);
    }

    /// Start playback. On refusal the channel stays paused.
    pub fn play(&mut self) -> Result<(), AudioError> {
        self.backend.play()?;
        self.playing = true;
        Ok(())
    }

    pub fn pause(&mut self) {
        self.backend.pause();
        self.playing = false;
    }

    /// Restart a one-shot effect from the beginning
    pub fn replay(&mut self) -> Result<(), AudioError> {
        self.backend.rewind();
        self.play()
    }

    pub fn is_playing(&self) -> bool {
        self.backend.is_playing().unwrap_or(self.playing)
    }

    pub fn is_paused(&self) -> bool {
        !self.is_playing()
    }

    /// Raw backend access
    pub fn handle(&self) -> &dyn AudioBackend {
        self.backend.as_ref()
    }

    pub fn handle_mut(&mut self) -> &mut dyn AudioBackend {
        self.backend.as_mut()
    }
}
