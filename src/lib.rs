//! Prize Wheel - A spin-to-win promotional creative
//!
//! Core modules:
//! - `sim`: Deterministic sequencer (timers, fades, spin stop, reveal cycle)
//! - `audio`: Browser audio backend (HtmlAudioElement)
//! - `platform`: Browser/native platform bridge (click-through)
//! - `settings`: Tunable volumes and timings
//! - `error`: Error types

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod error;
pub mod platform;
pub mod settings;
pub mod sim;

pub use error::{AudioError, ConfigError};
pub use settings::{Orientation, Settings};

use glam::DVec2;

/// Presentation configuration constants
pub mod consts {
    /// Nominal background music level
    pub const NORMAL_VOLUME: f32 = 0.15;
    /// Fixed stop sound effect level
    pub const STOP_SFX_VOLUME: f32 = 0.8;

    /// Discrete steps per volume ramp
    pub const FADE_STEPS: u32 = 20;
    /// Music duck when the stop is requested
    pub const DUCK_FADE_MS: u64 = 800;
    /// Music restore after the wheel settles
    pub const RESTORE_FADE_MS: u64 = 1500;
    /// Music fade-in on first interaction
    pub const UNLOCK_FADE_MS: u64 = 2000;
    /// Delay between stop request and the stop sound effect
    pub const STOP_SFX_DELAY_MS: u64 = 200;

    /// One idle revolution
    pub const IDLE_PERIOD_MS: u64 = 3000;
    /// Deceleration from the frozen angle to the resting angle
    pub const STOP_DURATION_MS: u64 = 3500;
    /// Guaranteed full turns during deceleration
    pub const STOP_MIN_ROTATIONS: u32 = 3;
    /// Pause after the wheel settles before the end screen
    pub const SETTLE_DELAY_MS: u64 = 1500;

    /// End screen fade-in before the reveal cycle starts
    pub const ENTRANCE_DELAY_MS: u64 = 100;
    /// First text shown before swapping to the second
    pub const TEXT_SWAP_MS: u64 = 1500;
    /// Whole text phase (first + second text)
    pub const TEXT_PHASE_MS: u64 = 2000;
    /// Item held at center
    pub const ITEM_POP_MS: u64 = 1500;
    /// Item back in place before the next one
    pub const ITEM_RESTORE_MS: u64 = 800;
    /// Each text in the text-only (landscape) cycle
    pub const LANDSCAPE_TEXT_MS: u64 = 2500;
    /// Prize items on the podium
    pub const ITEM_COUNT: u8 = 4;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Rotation of a 2-D transform matrix `[a c; b d]`, in degrees (-180, 180]
///
/// `column` is the first column `(a, b)`, i.e. the image of the x axis.
#[inline]
pub fn angle_from_transform(column: DVec2) -> f64 {
    column.y.atan2(column.x).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert!((normalize_degrees(370.0) - 10.0).abs() < 1e-4);
        assert!((normalize_degrees(-90.0) - 270.0).abs() < 1e-4);
        assert_eq!(normalize_degrees(720.0), 0.0);
        assert!(normalize_degrees(-1e-18) < 360.0);
    }

    #[test]
    fn test_angle_from_transform() {
        assert!(angle_from_transform(DVec2::new(1.0, 0.0)).abs() < 1e-4);
        assert!((angle_from_transform(DVec2::new(0.0, 1.0)) - 90.0).abs() < 1e-4);
        assert!((angle_from_transform(DVec2::new(-1.0, 0.0)) - 180.0).abs() < 1e-4);

        let theta = 47.0_f64.to_radians();
        let column = DVec2::new(theta.cos(), theta.sin()) * 0.94;
        assert!((angle_from_transform(column) - 47.0).abs() < 1e-9);
    }
}
