//! Gameplay objects living on the planet
//!
//! Every object follows the same lifecycle: constructed by the spawn
//! director, placed by `SetSpawnInfo`, advanced by `Update`, and only then
//! visible to the collect/interfere phases (the `updated` guard).

mod base;
mod enemy;
mod generator;
mod item;
mod player;
mod score;

pub use base::{BASE_VOLUME, Base};
pub use enemy::Enemy;
pub use generator::{Generator, spawn_direction};
pub use item::Item;
pub use player::{AttackStats, Player};
pub use score::{ScoreSummary, Scoreboard, kill_score};

/// Easing curve for a [`Tween`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ease {
    #[default]
    Linear,
    /// Fast start, gentle landing
    QuadOut,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Ease::Linear => t,
            Ease::QuadOut => t * (2.0 - t),
        }
    }
}

/// Scalar interpolation over a fixed duration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tween {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
    ease: Ease,
    running: bool,
}

impl Tween {
    pub fn start(from: f32, to: f32, duration: f32, ease: Ease) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
            ease,
            running: true,
        }
    }

    /// A finished tween resting at `value`
    pub fn idle(value: f32) -> Self {
        Self {
            from: value,
            to: value,
            ..Self::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn value(&self) -> f32 {
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        };
        self.from + (self.to - self.from) * self.ease.apply(t)
    }

    pub fn step(&mut self, dt: f32) -> f32 {
        if self.running {
            self.elapsed += dt;
            if self.elapsed >= self.duration {
                self.elapsed = self.duration;
                self.running = false;
            }
        }
        self.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tween_runs_to_end() {
        let mut t = Tween::start(10.0, 0.0, 1.0, Ease::Linear);
        assert!(t.is_running());
        assert!((t.step(0.25) - 7.5).abs() < 1e-6);
        assert_eq!(t.step(1.0), 0.0);
        assert!(!t.is_running());
        assert_eq!(t.step(1.0), 0.0);
    }

    #[test]
    fn test_tween_quad_out_and_zero_duration() {
        let mut t = Tween::start(0.0, 1.0, 2.0, Ease::QuadOut);
        assert!((t.step(1.0) - 0.75).abs() < 1e-6);

        let mut instant = Tween::start(5.0, 1.0, 0.0, Ease::Linear);
        assert_eq!(instant.step(0.0), 1.0);
        assert!(!instant.is_running());

        let rest = Tween::idle(3.0);
        assert!(!rest.is_running());
        assert_eq!(rest.value(), 3.0);
    }
}
