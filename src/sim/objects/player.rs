//! The player's cube
//!
//! Walks forward on its own. Attack picks arrive as `StartJumpAttack`; each
//! spends a sight charge and queues a leap. On landing the player broadcasts
//! `TouchdownPlanet` and reads back how many enemies reported a hit.

use std::collections::VecDeque;
use std::f32::consts::PI;
use std::rc::Rc;

use glam::{Affine3A, Quat, Vec3};
use log::{debug, warn};
use serde::Serialize;

use super::{Ease, Tween};
use crate::ResourceHandle;
use crate::consts::PLANET_RADIUS;
use crate::sim::entity::{Context, Entity, EntityId};
use crate::sim::geometry::{Sphere, sphere_box};
use crate::sim::message::{Message, keys};
use crate::sim::params::{Descriptor, DescriptorKind, Params, Pose};
use crate::sim::transform::{JumpArc, SphereTransform};
use crate::tuning::PlayerTuning;
use crate::{angle_between, angle_on_circle, dist_on_circle};

/// Picks closer than this (cross-product length) to the previous one are ignored
const PICK_EPSILON: f32 = 0.01;
/// The model sits this far into the ground
const SINK: f32 = 0.5;
/// Fraction of the radius used for base contact
const BASE_CONTACT_SCALE: f32 = 0.8;

/// Attack statistics for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AttackStats {
    pub attacks: i32,
    pub hits: i32,
    pub combo: i32,
    pub combo_max: i32,
}

#[derive(Debug, Clone, Copy)]
struct Sight {
    id: i32,
    /// World-space point on the planet
    pos: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct Leap {
    arc: JumpArc,
    target: Sight,
    power: f32,
}

pub struct Player {
    id: EntityId,
    tuning: PlayerTuning,
    contact_scale: f32,
    _model: Rc<ResourceHandle>,
    active: bool,
    updated: bool,
    paused: bool,
    transform: SphereTransform,
    radius: f32,
    scale: f32,
    entry: Tween,
    height: f32,
    stiff: f32,
    sight_ready: i32,
    /// Seconds until each spent sight recovers
    sight_recover: VecDeque<f32>,
    sights: VecDeque<Sight>,
    leap: Option<Leap>,
    landing: Option<Leap>,
    max_power_time: f32,
    max_range_time: f32,
    stats: AttackStats,
    /// Frozen when a base falls
    results: Option<AttackStats>,
}

impl Player {
    pub fn new(id: EntityId, tuning: PlayerTuning, contact_scale: f32, model: Rc<ResourceHandle>) -> Self {
        Self {
            id,
            contact_scale,
            _model: model,
            active: true,
            updated: false,
            paused: false,
            transform: SphereTransform::new(PLANET_RADIUS),
            radius: tuning.radius,
            scale: tuning.radius * 2.0,
            entry: Tween::start(tuning.entry_height, 0.0, tuning.entry_time, Ease::QuadOut),
            height: tuning.entry_height,
            stiff: 0.0,
            sight_ready: tuning.sight_ready_num,
            sight_recover: VecDeque::new(),
            sights: VecDeque::new(),
            leap: None,
            landing: None,
            max_power_time: 0.0,
            max_range_time: 0.0,
            stats: AttackStats::default(),
            results: None,
            tuning,
        }
    }

    pub fn transform(&self) -> &SphereTransform {
        &self.transform
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn stats(&self) -> AttackStats {
        self.stats
    }

    pub fn sight_ready(&self) -> i32 {
        self.sight_ready
    }

    pub fn is_leaping(&self) -> bool {
        self.leap.is_some()
    }

    pub fn model_matrix(&self) -> Affine3A {
        let lift = self.transform.planet_radius - SINK + self.height;
        self.transform.model_matrix(lift, self.scale)
    }

    fn set_spawn_info(&mut self, params: &Params) {
        let radius = params.float(keys::PLANET_RADIUS);
        let rotation = params.get_quat(keys::SPAWN_ROTATE).unwrap_or(Quat::IDENTITY);
        self.transform = SphereTransform::from_rotation(rotation, radius);
    }

    fn update(&mut self, params: &Params, ctx: &mut Context<'_>) {
        if self.paused {
            return;
        }
        self.updated = true;
        let dt = params.float(keys::DELTA_TIME);

        self.recover_sights(dt);

        if !self.entry.is_running() && self.stiff <= 0.0 && self.leap.is_none() {
            if let Some(sight) = self.sights.pop_front() {
                self.start_leap(sight);
            }
        }

        if self.entry.is_running() {
            self.height = self.entry.step(dt);
            if !self.entry.is_running() {
                self.stiff = self.tuning.entry_stiff;
            }
        } else if let Some(leap) = self.leap.as_mut() {
            let sample = leap.arc.step(dt);
            self.transform.rotation = sample.rotation;
            self.height = sample.height;
            if sample.finished {
                self.landing = self.leap.take();
            }
        } else if self.stiff > 0.0 {
            self.stiff -= dt;
        } else {
            self.transform.move_forward(self.tuning.speed * dt);
        }

        if let Some(leap) = self.landing.take() {
            self.land(leap, ctx);
        }

        self.max_power_time = (self.max_power_time - dt).max(0.0);
        self.max_range_time = (self.max_range_time - dt).max(0.0);
    }

    fn recover_sights(&mut self, dt: f32) {
        for t in self.sight_recover.iter_mut() {
            *t -= dt;
        }
        while self.sight_recover.front().is_some_and(|t| *t <= 0.0) {
            self.sight_recover.pop_front();
            self.sight_ready += 1;
        }
    }

    /// Where the most recently queued attack will land
    fn last_target(&self) -> Vec3 {
        if let Some(sight) = self.sights.back() {
            return sight.pos;
        }
        match &self.leap {
            Some(leap) => leap.target.pos,
            None => self.transform.position(),
        }
    }

    fn queue_attack(&mut self, params: &mut Params) {
        if !self.updated || self.sight_ready <= 0 {
            return;
        }
        let pos = params.vec3(keys::TARGET_POS);
        if pos.cross(self.last_target()).length() < PICK_EPSILON {
            warn!("attack pick too close to the last target, ignored");
            return;
        }
        if pos.cross(self.transform.position()).length() < PICK_EPSILON {
            warn!("attack pick right under the player, ignored");
            return;
        }

        self.sight_ready -= 1;
        self.sights.push_back(Sight {
            id: params.int(keys::TARGET_ID),
            pos,
        });
        params.insert(keys::SIGHT_READY, self.sight_ready);
    }

    fn start_leap(&mut self, target: Sight) {
        let angle = angle_between(self.transform.position(), target.pos);
        let dist = dist_on_circle(angle, self.transform.planet_radius);
        let power = if self.max_range_time > 0.0 {
            1.0
        } else {
            (dist / self.tuning.attack_distance).min(1.0)
        };
        let peak = self.tuning.attack_height * angle / PI;
        debug!("player leap to sight {} (power {power:.2})", target.id);
        self.leap = Some(Leap {
            arc: JumpArc::start(&self.transform, target.pos, self.tuning.attack_speed, peak),
            target,
            power,
        });
    }

    fn land(&mut self, leap: Leap, ctx: &mut Context<'_>) {
        self.stats.attacks += 1;

        let [near, far] = self.tuning.attack_range;
        let dist = near + (far - near) * leap.power * leap.power + self.contact_scale * self.radius;
        let max_power = self.max_power_time > 0.0;
        let mut touchdown = Params::new()
            .with(keys::POS, self.transform.position())
            .with(keys::DIST, dist)
            .with(keys::ANGLE, angle_on_circle(dist, self.transform.planet_radius))
            .with(keys::POWER, if max_power { self.tuning.max_power } else { 1 })
            .with(keys::TARGET_ID, leap.target.id)
            .with(keys::MAX_POWER, max_power);
        ctx.publish(Message::TouchdownPlanet, &mut touchdown);

        if touchdown.contains(keys::HIT) {
            self.stats.hits += 1;
            self.stats.combo += 1;
        } else {
            self.stats.combo_max = self.stats.combo_max.max(self.stats.combo);
            self.stats.combo = 0;
        }
        touchdown.insert(keys::HIT_COMBO, self.stats.combo);

        if touchdown.contains(keys::DESTROY) {
            ctx.publish(Message::DestroyedEnemy, &mut touchdown);
        } else {
            ctx.publish(Message::AttackHitEnemy, &mut touchdown);
        }

        self.sight_recover.push_back(self.tuning.sight_ready_time);
        self.stiff = self.tuning.attack_stiff;
    }

    fn collect(&self, params: &mut Params, ctx: &Context<'_>) {
        if !self.updated {
            return;
        }
        let Some(me) = ctx.me() else { return };
        params.push_descriptor(
            keys::PLAYER_INFO,
            Descriptor {
                entity: me,
                id: self.id,
                kind: DescriptorKind::Player,
                position: self.transform.position(),
                facing: self.transform.facing(),
                rotation: self.transform.rotation,
                radius: self.radius,
                collision: self.leap.is_none(),
                jumping: self.leap.is_some(),
            },
        );
    }

    fn interfere(&mut self, params: &Params) {
        if !self.updated {
            return;
        }
        for enemy in params.descriptors(keys::ENEMY_INFO).unwrap_or_default() {
            if enemy.collision {
                let min_dist = (self.radius + enemy.radius) * self.contact_scale;
                self.transform.separate_from(enemy.position, min_dist);
            }
        }
    }

    fn check_hit_base(&self, params: &mut Params) {
        let local = params.matrix(keys::REV_MATRIX) * self.model_matrix();
        let sphere = Sphere {
            center: local.transform_point3(Vec3::new(0.0, 0.5, 0.0)),
            radius: self.radius * BASE_CONTACT_SCALE / params.float(keys::SCALE),
        };
        let contact = sphere_box(&sphere, &params.aabb(keys::VOLUME));
        params.insert(keys::CONTACT, contact);
    }

    /// Items call this directly; effects that target the player are applied
    /// here because the player cannot receive its own broadcast
    fn pick_up_item(&mut self, params: &mut Params, ctx: &mut Context<'_>) {
        if self.height > self.radius * 2.0 {
            return;
        }
        let item_type = params.int(keys::ITEM_TYPE);
        let Some(effect) = usize::try_from(item_type).ok().and_then(Message::item_effect) else {
            warn!("unknown item type {item_type}");
            return;
        };
        debug!("player picked up {effect:?}");
        match effect {
            Message::ItemMaxPower => self.max_power_time = params.float(keys::EFFECT_TIME),
            Message::ItemMaxRange => self.max_range_time = params.float(keys::EFFECT_TIME),
            _ => {}
        }
        let mut event = Params::new().with(keys::EFFECT_TIME, params.float(keys::EFFECT_TIME));
        ctx.publish(effect, &mut event);
        params.insert(keys::GET, true);
    }

    fn gather_result(&self, params: &mut Params) {
        let stats = self.results.unwrap_or(self.stats);
        params.insert(keys::ATTACK_NUM, stats.attacks);
        params.insert(keys::ATTACK_HIT_NUM, stats.hits);
        params.insert(keys::ATTACK_COMBO, stats.combo);
        params.insert(keys::ATTACK_COMBO_MAX, stats.combo_max.max(stats.combo));
    }

    fn draw(&self, params: &mut Params) {
        if !self.updated {
            return;
        }
        params.push_pose(
            keys::POSES,
            Pose {
                id: self.id,
                kind: self.kind(),
                rotation: self.transform.rotation,
                height: self.height,
                model: self.model_matrix(),
            },
        );
    }
}

impl Entity for Player {
    fn is_active(&self) -> bool {
        self.active
    }

    fn kind(&self) -> &'static str {
        "player"
    }

    fn handle_message(&mut self, msg: Message, params: &mut Params, ctx: &mut Context<'_>) {
        if !self.active {
            return;
        }
        match msg {
            Message::Update => self.update(params, ctx),
            Message::Draw => self.draw(params),
            Message::SetSpawnInfo => self.set_spawn_info(params),
            Message::StartJumpAttack => self.queue_attack(params),
            Message::CollectObjectInfo => self.collect(params, ctx),
            Message::MutualInterference => self.interfere(params),
            Message::CheckHitBase => self.check_hit_base(params),
            Message::PickUpItem => self.pick_up_item(params, ctx),
            Message::ItemMaxPower => self.max_power_time = params.float(keys::EFFECT_TIME),
            Message::ItemMaxRange => self.max_range_time = params.float(keys::EFFECT_TIME),
            Message::StartGameMain => {
                self.stats = AttackStats::default();
                self.results = None;
            }
            Message::DestroyedBase => self.results = Some(self.stats),
            Message::GatherGameResult => self.gather_result(params),
            Message::PlayerRecordInfo => {
                params.insert(keys::ROTATE, self.transform.rotation);
            }
            Message::PlayerPlaybackInfo => {
                self.transform.rotation = params.quat(keys::ROTATE).normalize();
            }
            Message::PauseGame => self.paused = true,
            Message::ResumeGame => self.paused = false,
            Message::EndGame => self.active = false,
            _ => {}
        }
    }
}
