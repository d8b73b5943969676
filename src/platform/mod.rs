//! Platform abstraction layer
//!
//! Handles browser/native differences for the call-to-action click-through.
//! Inside an ad container the MRAID bridge opens the destination; in a plain
//! browser tab we fall back to `window.open()`.

/// Opens the advertised destination
pub trait PlatformBridge {
    /// Fire-and-forget; called once per call-to-action click
    fn open_destination(&mut self);
}

/// Native stand-in that only logs
#[derive(Debug, Default)]
pub struct LogBridge {
    pub opened: u32,
}

impl PlatformBridge for LogBridge {
    fn open_destination(&mut self) {
        self.opened += 1;
        log::info!("Open destination (native, #{})", self.opened);
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen(inline_js = "
        export function open_destination() {
            if (window.mraid && typeof window.mraid.open === 'function') {
                window.mraid.open();
            } else {
                window.open();
            }
        }
    ")]
    extern "C" {
        fn open_destination();
    }

    /// MRAID-or-window.open bridge
    #[derive(Debug, Default)]
    pub struct WebBridge;

    impl super::PlatformBridge for WebBridge {
        fn open_destination(&mut self) {
            log::info!("Opening destination");
            open_destination();
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebBridge;
