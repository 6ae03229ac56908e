//! Power-up cubes dropped by destroyed enemies
//!
//! An item scales in, waits to be touched by the player, and is pulled
//! toward the player while close. Touching it asks the player (directly, via
//! `PickUpItem`) whether it was taken; the player answers with `get`.

use std::rc::Rc;

use glam::{Affine3A, Vec3};
use log::debug;
use rand_pcg::Pcg32;

use super::{Ease, Tween};
use crate::ResourceHandle;
use crate::consts::PLANET_RADIUS;
use crate::sim::entity::{Context, Entity, EntityId};
use crate::sim::message::{Message, keys};
use crate::sim::params::{Descriptor, DescriptorKind, Params, Pose};
use crate::sim::transform::SphereTransform;
use crate::tuning::ItemTuning;
use crate::{angle_between, random_index};

/// Items hover this far above the surface
const HOVER: f32 = 1.0;

pub struct Item {
    id: EntityId,
    tuning: ItemTuning,
    contact_scale: f32,
    _model: Rc<ResourceHandle>,
    active: bool,
    updated: bool,
    paused: bool,
    item_type: i32,
    transform: SphereTransform,
    radius: f32,
    scale: f32,
    age: f32,
    /// Entry and disappear scaling
    scaling: Tween,
    /// Rise after being picked up
    rise: Tween,
    disappearing: bool,
}

impl Item {
    pub fn new(
        id: EntityId,
        tuning: ItemTuning,
        contact_scale: f32,
        model: Rc<ResourceHandle>,
        rng: &mut Pcg32,
    ) -> Self {
        let item_type = random_index(rng, tuning.kinds)
            .and_then(|i| i32::try_from(i).ok())
            .unwrap_or(0);
        Self {
            id,
            contact_scale,
            _model: model,
            active: true,
            updated: false,
            paused: false,
            item_type,
            transform: SphereTransform::new(PLANET_RADIUS),
            radius: tuning.radius,
            scale: tuning.radius * 2.0,
            age: 0.0,
            scaling: Tween::start(0.0, 1.0, tuning.entry_time, Ease::QuadOut),
            rise: Tween::idle(0.0),
            disappearing: false,
            tuning,
        }
    }

    pub fn item_type(&self) -> i32 {
        self.item_type
    }

    pub fn transform(&self) -> &SphereTransform {
        &self.transform
    }

    /// Collectable: fully scaled in and not on its way out
    pub fn can_get(&self) -> bool {
        !self.scaling.is_running() && !self.disappearing
    }

    pub fn model_matrix(&self) -> Affine3A {
        let lift = self.transform.planet_radius + HOVER + self.rise.value();
        self.transform.model_matrix(lift, self.scale * self.scaling.value())
    }

    fn set_spawn_info(&mut self, params: &Params) {
        let radius = params.float(keys::PLANET_RADIUS);
        self.transform = SphereTransform::from_surface_point(params.vec3(keys::SPAWN_POS), radius);
    }

    fn update(&mut self, params: &Params) {
        if self.paused {
            return;
        }
        self.updated = true;
        let dt = params.float(keys::DELTA_TIME);

        if self.scaling.is_running() {
            self.scaling.step(dt);
            if !self.scaling.is_running() && self.disappearing {
                self.active = false;
            }
        } else if self.rise.is_running() {
            self.rise.step(dt);
            if !self.rise.is_running() && self.disappearing {
                self.active = false;
            }
        } else {
            self.age += dt;
            if self.age >= self.tuning.exist_time {
                debug!("item {} expired", self.id);
                self.disappear();
            }
        }
    }

    fn disappear(&mut self) {
        if self.disappearing {
            return;
        }
        self.disappearing = true;
        self.scaling = Tween::start(self.scaling.value(), 0.0, self.tuning.disappear_time, Ease::Linear);
    }

    fn obtain(&mut self) {
        self.disappearing = true;
        self.rise = Tween::start(0.0, self.tuning.obtain_height, self.tuning.obtain_time, Ease::QuadOut);
    }

    fn collect(&self, params: &mut Params, ctx: &Context<'_>) {
        if !self.updated || !self.can_get() {
            return;
        }
        let Some(me) = ctx.me() else { return };
        params.push_descriptor(
            keys::ITEM_INFO,
            Descriptor {
                entity: me,
                id: self.id,
                kind: DescriptorKind::Item,
                position: self.transform.position(),
                facing: self.transform.facing(),
                rotation: self.transform.rotation,
                radius: self.radius,
                collision: false,
                jumping: false,
            },
        );
    }

    fn interfere(&mut self, params: &Params, ctx: &mut Context<'_>) {
        if !self.updated || !self.can_get() {
            return;
        }
        let Some(player) = params.descriptors(keys::PLAYER_INFO).and_then(|p| p.first()) else {
            return;
        };

        let dist = self.transform.distance_to(player.position);
        if dist <= (self.radius + player.radius) * self.contact_scale {
            let mut pickup = Params::new()
                .with(keys::ITEM_TYPE, self.item_type)
                .with(keys::EFFECT_TIME, self.tuning.effect_time);
            player.entity.send(Message::PickUpItem, &mut pickup, ctx);
            if pickup.get_bool(keys::GET).unwrap_or(false) {
                debug!("item {} (type {}) obtained", self.id, self.item_type);
                self.obtain();
                return;
            }
        }
        self.absorb(player.position);
    }

    /// Drift toward the player, harder the closer it is
    fn absorb(&mut self, player: Vec3) {
        let angle = angle_between(self.transform.position(), player);
        let span = self.tuning.absorb_angle;
        if angle > span || span <= 0.0 {
            return;
        }
        let t = angle / span;
        let fraction = self.tuning.absorb_start + (self.tuning.absorb_end - self.tuning.absorb_start) * t;
        self.transform.slerp_toward(player, fraction);
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
                height: HOVER + self.rise.value(),
                model: self.model_matrix(),
            },
        );
    }
}

impl Entity for Item {
    fn is_active(&self) -> bool {
        self.active
    }

    fn kind(&self) -> &'static str {
        "item"
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
            Message::DestroyedBase => self.disappear(),
            Message::PauseGame => self.paused = true,
            Message::ResumeGame => self.paused = false,
            Message::EndGame => self.active = false,
            _ => {}
        }
    }
}
