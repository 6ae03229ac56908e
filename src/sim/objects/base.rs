//! The cube the player defends
//!
//! A base descends onto the planet, then checks every enemy for contact once
//! per interfere phase by sending it `CheckHitBase` directly. Enemies that
//! ram it bump a shared `hit_num` counter; the base turns the total into
//! damage and reports it on the bus.

use std::rc::Rc;

use glam::{Affine3A, Vec3};
use log::{debug, info};

use super::{Ease, Tween};
use crate::ResourceHandle;
use crate::sim::entity::{Context, Entity, EntityId};
use crate::sim::geometry::Aabb;
use crate::sim::message::{Message, keys};
use crate::sim::params::{Descriptor, DescriptorKind, Params, Pose};
use crate::sim::transform::SphereTransform;
use crate::tuning::BaseTuning;

/// Contact volume in the cube model's local frame (unit cube resting on y = 0)
pub const BASE_VOLUME: Aabb = Aabb {
    center: Vec3::new(0.0, 0.5, 0.0),
    half_extents: Vec3::new(0.5, 0.5, 0.5),
};

/// The model sits this far into the ground
const SINK: f32 = 1.0;

pub struct Base {
    id: EntityId,
    tuning: BaseTuning,
    _model: Rc<ResourceHandle>,
    active: bool,
    updated: bool,
    paused: bool,
    transform: SphereTransform,
    radius: f32,
    scale: f32,
    /// Height above the resting level
    height: Tween,
    hp: i32,
    hp_max: i32,
    immortal_time: f32,
    leaving: bool,
    other_destroyed: bool,
    player_contact: bool,
}

impl Base {
    pub fn new(id: EntityId, tuning: BaseTuning, model: Rc<ResourceHandle>) -> Self {
        let radius = tuning.radius;
        let hp_max = tuning.hp.max(1);
        Self {
            id,
            _model: model,
            active: true,
            updated: false,
            paused: false,
            transform: SphereTransform::new(crate::consts::PLANET_RADIUS),
            radius,
            scale: radius * 2.0,
            height: Tween::start(tuning.entry_height, 0.0, tuning.entry_time, Ease::QuadOut),
            hp: hp_max,
            hp_max,
            immortal_time: 0.0,
            leaving: false,
            other_destroyed: false,
            player_contact: false,
            tuning,
        }
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn hp_rate(&self) -> f32 {
        self.hp as f32 / self.hp_max as f32
    }

    pub fn transform(&self) -> &SphereTransform {
        &self.transform
    }

    pub fn is_immortal(&self) -> bool {
        self.immortal_time > 0.0
    }

    pub fn model_matrix(&self) -> Affine3A {
        let lift = self.transform.planet_radius - SINK + self.height.value();
        self.transform.model_matrix(lift, self.scale)
    }

    fn set_spawn_info(&mut self, params: &Params) {
        self.transform.planet_radius = params.float(keys::PLANET_RADIUS);
        if let Ok(pos) = params.get_vec3(keys::SPAWN_POS) {
            self.transform = SphereTransform::from_surface_point(pos, self.transform.planet_radius);
        }
    }

    fn update(&mut self, params: &Params) {
        if self.paused {
            return;
        }
        self.updated = true;
        let dt = params.float(keys::DELTA_TIME);

        if self.height.is_running() {
            self.height.step(dt);
            if !self.height.is_running() && self.leaving {
                self.active = false;
                return;
            }
        }
        if self.immortal_time > 0.0 {
            self.immortal_time -= dt;
        }
    }

    fn collect(&self, params: &mut Params, ctx: &Context<'_>) {
        if !self.updated || self.hp == 0 {
            return;
        }
        let Some(me) = ctx.me() else { return };
        params.push_descriptor(
            keys::BASE_INFO,
            Descriptor {
                entity: me,
                id: self.id,
                kind: DescriptorKind::Base {
                    hp: self.hp,
                    hp_max: self.hp_max,
                    scale: self.scale,
                },
                position: self.transform.position(),
                facing: self.transform.facing(),
                rotation: self.transform.rotation,
                radius: self.radius,
                collision: !self.height.is_running(),
                jumping: false,
            },
        );
    }

    fn interfere(&mut self, params: &Params, ctx: &mut Context<'_>) {
        if !self.updated {
            return;
        }
        let mut check = Params::new()
            .with(keys::VOLUME, BASE_VOLUME)
            .with(keys::REV_MATRIX, self.model_matrix().inverse())
            .with(keys::SCALE, self.scale)
            .with(keys::POS, self.transform.position())
            .with(keys::RADIUS, self.radius);

        if let Some(player) = params.descriptors(keys::PLAYER_INFO).and_then(|p| p.first()) {
            if player.entity.send(Message::CheckHitBase, &mut check, ctx) {
                let contact = check.get_bool(keys::CONTACT).unwrap_or(false);
                if contact != self.player_contact {
                    debug!("base {}: player contact {contact}", self.id);
                }
                self.player_contact = contact;
            }
        }

        for enemy in params.descriptors(keys::ENEMY_INFO).unwrap_or_default() {
            enemy.entity.send(Message::CheckHitBase, &mut check, ctx);
        }

        if let Ok(hit_num) = check.get_int(keys::HIT_NUM) {
            debug!("base {}: enemy hit x{hit_num}", self.id);
            self.take_damage(hit_num, ctx);
        }
    }

    fn take_damage(&mut self, hit_num: i32, ctx: &mut Context<'_>) {
        if self.hp <= 0 {
            return;
        }
        if !self.is_immortal() {
            self.hp -= hit_num;
        }

        if self.hp <= 0 {
            self.hp = 0;
            self.leaving = true;
            self.height = Tween::start(
                self.height.value(),
                self.tuning.leave_height,
                self.tuning.leave_time,
                Ease::Linear,
            );
            if !self.other_destroyed {
                info!("base {} destroyed", self.id);
                let mut event = Params::new()
                    .with(keys::BASE_HP, self.hp)
                    .with(keys::BASE_ID, self.id);
                ctx.publish(Message::DestroyedBase, &mut event);
            }
        } else {
            let mut event = Params::new()
                .with(keys::BASE_HP, self.hp)
                .with(keys::BASE_ID, self.id)
                .with(keys::BASE_HP_RATE, self.hp_rate());
            ctx.publish(Message::DamagedBase, &mut event);
        }
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
                height: self.height.value(),
                model: self.model_matrix(),
            },
        );
    }
}

impl Entity for Base {
    fn is_active(&self) -> bool {
        self.active
    }

    fn kind(&self) -> &'static str {
        "base"
    }

    fn handle_message(&mut self, msg: Message, params: &mut Params, ctx: &mut Context<'_>) {
        if !self.active {
            return;
        }
        match msg {
            Message::Update => self.update(params),
            Message::Draw => self.draw(params),
            Message::SetSpawnInfo => self.set_spawn_info(params),
            Message::CollectObjectInfo => self.collect(params, ctx),
            Message::MutualInterference => self.interfere(params, ctx),
            Message::ItemBaseImmortal => self.immortal_time = params.float(keys::EFFECT_TIME),
            Message::DestroyedBase => self.other_destroyed = true,
            Message::PauseGame => self.paused = true,
            Message::ResumeGame => self.paused = false,
            Message::EndGame => self.active = false,
            _ => {}
        }
    }
}
