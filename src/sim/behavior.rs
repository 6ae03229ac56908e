//! Enemy steering strategies
//!
//! A behavior turns the enemy's own state plus its current target into an
//! action for this frame. Kinds are named in the tuning data and built by a
//! [`BehaviorFactory`], so new strategies plug in without touching the enemy.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use log::warn;
use rand_pcg::Pcg32;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::transform::SphereTransform;
use crate::consts::{MOVE_AXIS, UP};
use crate::random_between;
use crate::tuning::ConfigError;

/// Where the enemy is headed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    /// Unit surface normal
    pub position: Vec3,
    pub planet_radius: f32,
}

/// The enemy as its behavior sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfState {
    pub transform: SphereTransform,
    pub targeted: bool,
    pub hp_rate: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Action {
    /// Fraction of full speed
    pub accel: f32,
    /// Requested yaw rate; the enemy clamps it
    pub yaw: f32,
    /// Leap to this surface direction
    pub jump: Option<Vec3>,
    /// Drop the current target and pick another
    pub retarget: bool,
}

impl Action {
    pub fn forward(accel: f32) -> Self {
        Self {
            accel,
            yaw: 0.0,
            jump: None,
            retarget: false,
        }
    }
}

pub trait Behavior {
    fn set_target(&mut self, target: Target);

    fn update(&mut self, dt: f32, me: &SelfState, rng: &mut Pcg32) -> Action;

    /// Called on frames where the enemy is busy (avoiding, jumping)
    fn idle(&mut self, _dt: f32) {}
}

/// Never moves
#[derive(Debug, Default)]
pub struct Idle;

impl Behavior for Idle {
    fn set_target(&mut self, _target: Target) {}

    fn update(&mut self, _dt: f32, _me: &SelfState, _rng: &mut Pcg32) -> Action {
        Action::forward(0.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct StraightParams {
    distance: [f32; 2],
    acc: [f32; 2],
}

/// Turns toward the target and slows down as it closes in
#[derive(Debug)]
pub struct Straight {
    params: StraightParams,
    target: Option<Target>,
}

impl Behavior for Straight {
    fn set_target(&mut self, target: Target) {
        self.target = Some(target);
    }

    fn update(&mut self, _dt: f32, me: &SelfState, _rng: &mut Pcg32) -> Action {
        let [acc_near, acc_far] = self.params.acc;
        let (Some(target), true) = (self.target, me.targeted) else {
            return Action::forward(acc_far);
        };

        let [near, far] = self.params.distance;
        let dist = me.transform.distance_to(target.position).clamp(near, far);
        let span = far - near;
        let accel = if span > 0.0 {
            acc_near + (acc_far - acc_near) * (dist - near) / span
        } else {
            acc_far
        };

        Action {
            accel,
            yaw: me.transform.yaw_toward(target.position),
            jump: None,
            retarget: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct JumpParams {
    interval: [f32; 2],
    distance: [f32; 2],
    near_distance: f32,
}

/// Walks straight ahead and periodically leaps, onto the target when close
#[derive(Debug)]
pub struct Jump {
    params: JumpParams,
    target: Option<Target>,
    cooldown: f32,
}

impl Behavior for Jump {
    fn set_target(&mut self, target: Target) {
        self.target = Some(target);
    }

    fn update(&mut self, dt: f32, me: &SelfState, rng: &mut Pcg32) -> Action {
        self.cooldown -= dt;
        let target = match self.target {
            Some(target) if me.targeted && self.cooldown <= 0.0 => target,
            _ => return Action::forward(1.0),
        };

        let [lo, hi] = self.params.interval;
        self.cooldown = random_between(rng, lo, hi);

        let radius = me.transform.planet_radius;
        let landing = if me.transform.distance_to(target.position) < self.params.near_distance {
            target.position
        } else {
            let [lo, hi] = self.params.distance;
            let ahead = Quat::from_axis_angle(MOVE_AXIS, random_between(rng, lo, hi) / radius);
            (me.transform.rotation * ahead) * UP
        };

        Action {
            jump: Some(landing),
            ..Action::forward(1.0)
        }
    }
}

type Maker = Box<dyn Fn(&serde_json::Value, &mut Pcg32) -> Result<Box<dyn Behavior>, ConfigError>>;

/// Name → behavior constructor
pub struct BehaviorFactory {
    makers: BTreeMap<String, Maker>,
}

impl Default for BehaviorFactory {
    /// The built-in kinds: `idle`, `straight` and `jump`
    fn default() -> Self {
        let mut factory = Self::empty();
        factory.register("idle", |_, _| Ok(Box::new(Idle)));
        factory.register("straight", |params, _| {
            Ok(Box::new(Straight {
                params: parse(params, "straight")?,
                target: None,
            }))
        });
        factory.register("jump", |params, rng| {
            let params: JumpParams = parse(params, "jump")?;
            let [lo, hi] = params.interval;
            let cooldown = random_between(rng, lo, hi);
            Ok(Box::new(Jump {
                params,
                target: None,
                cooldown,
            }))
        });
        factory
    }
}

fn parse<T: DeserializeOwned>(params: &serde_json::Value, kind: &str) -> Result<T, ConfigError> {
    T::deserialize(params).map_err(|source| ConfigError::Section {
        path: format!("behavior_params ({kind})"),
        source,
    })
}

impl BehaviorFactory {
    pub fn empty() -> Self {
        Self {
            makers: BTreeMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: &str, make: F)
    where
        F: Fn(&serde_json::Value, &mut Pcg32) -> Result<Box<dyn Behavior>, ConfigError> + 'static,
    {
        self.makers.insert(name.to_owned(), Box::new(make));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.makers.contains_key(name)
    }

    pub fn try_create(
        &self,
        name: &str,
        params: &serde_json::Value,
        rng: &mut Pcg32,
    ) -> Result<Box<dyn Behavior>, ConfigError> {
        let make = self
            .makers
            .get(name)
            .ok_or_else(|| ConfigError::Missing(format!("behavior `{name}`")))?;
        make(params, rng)
    }

    /// Build `name`, falling back to [`Idle`] when it cannot be built
    pub fn create(&self, name: &str, params: &serde_json::Value, rng: &mut Pcg32) -> Box<dyn Behavior> {
        self.try_create(name, params, rng).unwrap_or_else(|e| {
            warn!("behavior `{name}` unavailable ({e}), enemy will idle");
            Box::new(Idle)
        })
    }
}
