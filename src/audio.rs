//! Audio backend using HtmlAudioElement
//!
//! Browsers resolve `play()` asynchronously; an autoplay rejection shows up
//! later as a rejected promise and the element stays paused. The sequencer
//! notices through [`AudioBackend::is_playing`] on its next fade step.

use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlAudioElement;

use crate::error::AudioError;
use crate::sim::AudioBackend;

/// One `<audio>` element
pub struct HtmlAudioBackend {
    element: HtmlAudioElement,
}

impl HtmlAudioBackend {
    pub fn new(src: &str, looping: bool) -> Result<Self, AudioError> {
        let element = HtmlAudioElement::new_with_src(src)
            .map_err(|e| AudioError::Unavailable(format!("{:?}", e)))?;
        element.set_loop(looping);
        element.set_preload("auto");
        Ok(Self { element })
    }
}

impl AudioBackend for HtmlAudioBackend {
    fn play(&mut self) -> Result<(), AudioError> {
        let promise = self
            .element
            .play()
            .map_err(|e| AudioError::PlaybackDenied(format!("{:?}", e)))?;
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                log::warn!("Autoplay prevented: {:?}", e);
            }
        });
        Ok(())
    }

    fn pause(&mut self) {
        let _ = self.element.pause();
    }

    fn set_volume(&mut self, volume: f32) {
        self.element.set_volume(volume as f64);
    }

    fn rewind(&mut self) {
        self.element.set_current_time(0.0);
    }

    fn is_playing(&self) -> Option<bool> {
        Some(!self.element.paused())
    }
}
