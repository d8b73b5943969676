//! Deterministic sequencer module
//!
//! All presentation timing lives here. This module must be pure and deterministic:
//! - Virtual time only (advanced by the host)
//! - Seeded RNG only
//! - Same-instant timers fire in scheduling order
//! - No rendering or platform dependencies beyond injected traits

pub mod channel;
pub mod fade;
pub mod reveal;
pub mod session;
pub mod spin;
pub mod state;
pub mod tick;
pub mod timer;

pub use channel::{AudioBackend, AudioChannel, ChannelId, SilentBackend};
pub use fade::{AudioFadeController, FadeJob};
pub use reveal::{ItemAnimPhase, Orientation, RevealTimings, SequencePhaseMachine, SequenceState};
pub use session::{Session, SessionConfig, StopTimings};
pub use spin::{SpinConfig, SpinPhase, SpinSnapshot, SpinState, SpinStop, SpinStopAnimator};
pub use state::{GamePhase, SessionEvent, SimContext, TimerEvent};
pub use tick::{TickInput, tick};
pub use timer::{DueTimer, TimerId, TimerQueue};
