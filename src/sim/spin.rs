//! Wheel spin: idle loop and the one-shot randomized stop
//!
//! The stop is a two-step protocol for the renderer: freeze the idle loop at
//! the current angle, then decelerate from there to the resting angle. The
//! resting angle is always at least `min_rotations` full turns ahead, so the
//! wheel never appears to reverse.

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::{SessionEvent, SimContext, TimerEvent};
use super::timer::TimerId;
use crate::consts::{IDLE_PERIOD_MS, STOP_DURATION_MS, STOP_MIN_ROTATIONS};
use crate::normalize_degrees;

/// Spin lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpinPhase {
    Idling,
    Decelerating,
    Stopped,
}

/// Angles are in degrees and never wrapped once committed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinState {
    /// Angle at the moment the stop was requested
    pub current_angle_degrees: f64,
    /// Resting angle
    pub target_angle_degrees: f64,
    pub phase: SpinPhase,
}

/// A committed stop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinStop {
    pub from_degrees: f64,
    pub final_degrees: f64,
    pub duration_ms: u64,
}

/// Spin tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinConfig {
    /// Guaranteed full turns before the random remainder
    pub min_rotations: u32,
    /// Deceleration length
    pub stop_duration_ms: u64,
    /// One idle revolution
    pub idle_period_ms: u64,
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            min_rotations: STOP_MIN_ROTATIONS,
            stop_duration_ms: STOP_DURATION_MS,
            idle_period_ms: IDLE_PERIOD_MS,
        }
    }
}

/// What the renderer needs to draw the wheel right now
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpinSnapshot {
    /// Idle angle, frozen angle while decelerating, or resting angle
    pub angle_degrees: f64,
    pub target_degrees: f64,
    pub phase: SpinPhase,
    /// Linear time progress of the deceleration (0..=1)
    pub progress: f64,
}

#[derive(Debug, Clone)]
pub struct SpinStopAnimator {
    config: SpinConfig,
    state: SpinState,
    rng: Pcg32,
    idle_since_ms: u64,
    committed_at_ms: Option<u64>,
    timer: Option<TimerId>,
}

impl SpinStopAnimator {
    pub fn new(config: SpinConfig, seed: u64, idle_since_ms: u64) -> Self {
        Self {
            config,
            state: SpinState {
                current_angle_degrees: 0.0,
                target_angle_degrees: 0.0,
                phase: SpinPhase::Idling,
            },
            rng: Pcg32::seed_from_u64(seed),
            idle_since_ms,
            committed_at_ms: None,
            timer: None,
        }
    }

    pub fn config(&self) -> &SpinConfig {
        &self.config
    }

    pub fn state(&self) -> &SpinState {
        &self.state
    }

    pub fn phase(&self) -> SpinPhase {
        self.state.phase
    }

    /// Angle of the idle loop at `now_ms`, in [0, 360)
    pub fn idle_angle(&self, now_ms: u64) -> f64 {
        let period = self.config.idle_period_ms.max(1);
        let into_turn = now_ms.saturating_sub(self.idle_since_ms) % period;
        normalize_degrees(into_turn as f64 / period as f64 * 360.0)
    }

    /// Commit the stop from `current_angle`. `None` if a stop was already committed.
    pub fn stop(&mut self, current_angle: f64) -> Option<SpinStop> {
        if self.state.phase != SpinPhase::Idling {
            return None;
        }
        let remainder: f64 = self.rng.random_range(0.0..360.0);
        let final_degrees =
            current_angle + f64::from(self.config.min_rotations) * 360.0 + remainder;

        self.state = SpinState {
            current_angle_degrees: current_angle,
            target_angle_degrees: final_degrees,
            phase: SpinPhase::Decelerating,
        };
        Some(SpinStop {
            from_degrees: current_angle,
            final_degrees,
            duration_ms: self.config.stop_duration_ms,
        })
    }

    /// [`stop`](Self::stop), publish the freeze/commit pair and schedule completion
    pub fn begin_stop(&mut self, current_angle: f64, ctx: &mut SimContext<'_>) -> Option<SpinStop> {
        let stop = self.stop(current_angle)?;
        ctx.emit(SessionEvent::SpinFrozen {
            angle: stop.from_degrees,
        });
        ctx.emit(SessionEvent::SpinCommitted {
            from: stop.from_degrees,
            to: stop.final_degrees,
            duration_ms: stop.duration_ms,
        });
        self.committed_at_ms = Some(ctx.now_ms);
        self.timer = Some(ctx.schedule_in(stop.duration_ms, TimerEvent::SpinSettled));
        log::info!(
            "Spin stop: {:.1} -> {:.1} over {}ms",
            stop.from_degrees,
            stop.final_degrees,
            stop.duration_ms
        );
        Some(stop)
    }

    /// Handle a fired `SpinSettled` timer. Returns true when the wheel came to rest.
    pub fn on_timer(&mut self, id: TimerId, ctx: &mut SimContext<'_>) -> bool {
        if self.timer != Some(id) || self.state.phase != SpinPhase::Decelerating {
            log::debug!("Stale spin timer ignored");
            return false;
        }
        self.timer = None;
        self.state.phase = SpinPhase::Stopped;
        ctx.emit(SessionEvent::SpinStopped {
            angle: self.state.target_angle_degrees,
        });
        true
    }

    /// Drop the pending completion timer
    pub fn cancel(&mut self, ctx: &mut SimContext<'_>) -> bool {
        ctx.cancel(&mut self.timer)
    }

    pub fn snapshot(&self, now_ms: u64) -> SpinSnapshot {
        match self.state.phase {
            SpinPhase::Idling => {
                let angle = self.idle_angle(now_ms);
                SpinSnapshot {
                    angle_degrees: angle,
                    target_degrees: angle,
                    phase: SpinPhase::Idling,
                    progress: 0.0,
                }
            }
            SpinPhase::Decelerating => {
                let elapsed = now_ms.saturating_sub(self.committed_at_ms.unwrap_or(now_ms));
                let duration = self.config.stop_duration_ms.max(1);
                SpinSnapshot {
                    angle_degrees: self.state.current_angle_degrees,
                    target_degrees: self.state.target_angle_degrees,
                    phase: SpinPhase::Decelerating,
                    progress: (elapsed as f64 / duration as f64).min(1.0),
                }
            }
            SpinPhase::Stopped => SpinSnapshot {
                angle_degrees: self.state.target_angle_degrees,
                target_degrees: self.state.target_angle_degrees,
                phase: SpinPhase::Stopped,
                progress: 1.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::timer::TimerQueue;
    use proptest::prelude::*;

    #[test]
    fn test_stop_from_47_degrees() {
        let mut spin = SpinStopAnimator::new(SpinConfig::default(), 7, 0);
        let stop = spin.stop(47.0).unwrap();
        assert!(stop.final_degrees >= 1127.0 && stop.final_degrees < 1487.0);
        assert_eq!(stop.duration_ms, 3500);
        assert_eq!(spin.phase(), SpinPhase::Decelerating);
    }

    #[test]
    fn test_second_stop_is_noop() {
        let mut spin = SpinStopAnimator::new(SpinConfig::default(), 7, 0);
        let first = spin.stop(10.0).unwrap();
        assert!(spin.stop(200.0).is_none());
        assert_eq!(spin.state().target_angle_degrees, first.final_degrees);
        assert_eq!(spin.state().current_angle_degrees, 10.0);
    }

    #[test]
    fn test_same_seed_same_stop() {
        let mut a = SpinStopAnimator::new(SpinConfig::default(), 99, 0);
        let mut b = SpinStopAnimator::new(SpinConfig::default(), 99, 0);
        assert_eq!(a.stop(30.0), b.stop(30.0));
    }

    #[test]
    fn test_idle_angle() {
        let spin = SpinStopAnimator::new(SpinConfig::default(), 1, 1000);
        assert_eq!(spin.idle_angle(1000), 0.0);
        assert!((spin.idle_angle(1750) - 90.0).abs() < 1e-9);
        assert!((spin.idle_angle(4000 + 1500) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_completion_timer() {
        let mut timers = TimerQueue::new();
        let mut events = Vec::new();
        let mut spin = SpinStopAnimator::new(SpinConfig::default(), 3, 0);

        let mut ctx = SimContext::new(500, &mut timers, &mut events);
        let stop = spin.begin_stop(12.0, &mut ctx).unwrap();
        assert!(spin.begin_stop(12.0, &mut ctx).is_none());
        assert_eq!(timers.len(), 1);

        let half = spin.snapshot(500 + 1750);
        assert_eq!(half.phase, SpinPhase::Decelerating);
        assert!((half.progress - 0.5).abs() < 1e-9);

        assert!(timers.pop_due(3999).is_none());
        let due = timers.pop_due(4000).unwrap();
        let mut ctx = SimContext::new(due.due_ms, &mut timers, &mut events);
        assert!(spin.on_timer(due.id, &mut ctx));
        assert!(!spin.on_timer(due.id, &mut ctx));

        let rest = spin.snapshot(9000);
        assert_eq!(rest.phase, SpinPhase::Stopped);
        assert_eq!(rest.angle_degrees, stop.final_degrees);
        assert_eq!(
            events,
            vec![
                SessionEvent::SpinFrozen { angle: 12.0 },
                SessionEvent::SpinCommitted {
                    from: 12.0,
                    to: stop.final_degrees,
                    duration_ms: 3500,
                },
                SessionEvent::SpinStopped {
                    angle: stop.final_degrees,
                },
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_stop_is_bounded_and_forward(
            angle in -720.0f64..720.0,
            seed in any::<u64>(),
            min_rotations in 1u32..6,
        ) {
            let config = SpinConfig { min_rotations, ..SpinConfig::default() };
            let mut spin = SpinStopAnimator::new(config, seed, 0);
            let stop = spin.stop(angle).unwrap();
            let base = angle + f64::from(min_rotations) * 360.0;
            prop_assert!(stop.final_degrees > base - 1.0);
            prop_assert!(stop.final_degrees < base + 360.0);
            prop_assert!(stop.final_degrees > stop.from_degrees);
        }
    }
}
