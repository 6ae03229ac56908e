//! Hostile cubes
//!
//! An enemy floats down onto the planet, then lets its [`Behavior`] steer it
//! toward a base. One update runs exactly one of: stiffness countdown,
//! entry/leave float, disappear, knockback, avoidance, jump, or a behavior
//! step, in that priority.

use std::f32::consts::{FRAC_PI_4, PI};
use std::rc::Rc;

use glam::{Affine3A, Quat, Vec3};
use log::debug;
use rand_pcg::Pcg32;

use super::{Ease, Tween};
use crate::ResourceHandle;
use crate::consts::{GROUND_TOLERANCE, PLANET_RADIUS};
use crate::sim::behavior::{Behavior, SelfState, Target};
use crate::sim::entity::{Context, Entity, EntityHandle, EntityId};
use crate::sim::geometry::{Sphere, sphere_box};
use crate::sim::message::{Message, keys};
use crate::sim::params::{Descriptor, DescriptorKind, Params, Pose};
use crate::sim::transform::{JumpArc, Slerp, SphereTransform};
use crate::tuning::EnemyTuning;
use crate::{angle_between, angle_on_circle, random_between, random_index};

/// The model sits this far into the ground
const SINK: f32 = 0.5;
/// Speed fraction while steering around another object
const AVOID_SPEED: f32 = 0.25;
/// Objects farther than this many radii are ignored by avoidance
const AVOID_RANGE: f32 = 5.0;
/// Knockback distance in radii
const KNOCKBACK: f32 = 4.0;

pub struct Enemy {
    id: EntityId,
    name: String,
    tuning: EnemyTuning,
    behavior: Box<dyn Behavior>,
    contact_scale: f32,
    _model: Rc<ResourceHandle>,
    active: bool,
    updated: bool,
    paused: bool,
    transform: SphereTransform,
    radius: f32,
    scale: f32,
    speed: f32,
    /// Radians per second
    yaw_max: f32,
    jump_speed: f32,
    hp: i32,
    hp_max: i32,
    /// Height above the resting level, rebuilt every update
    height: f32,
    targeted: bool,
    leaving: bool,
    float: Tween,
    stiff: f32,
    avoid: Option<f32>,
    knock: Slerp,
    appear: Tween,
    disappear: Tween,
    spawn_item: bool,
    jump: Option<JumpArc>,
    force_stiff: f32,
}

impl Enemy {
    /// Rolls the per-spawn ranges in `tuning`
    pub fn new(
        id: EntityId,
        name: &str,
        tuning: EnemyTuning,
        behavior: Box<dyn Behavior>,
        contact_scale: f32,
        model: Rc<ResourceHandle>,
        rng: &mut Pcg32,
    ) -> Self {
        let roll = |rng: &mut Pcg32, [lo, hi]: [f32; 2]| random_between(rng, lo, hi);
        let radius = roll(rng, tuning.radius);
        let speed = roll(rng, tuning.speed);
        let yaw_max = roll(rng, tuning.yaw_max).to_radians();
        let jump_speed = roll(rng, tuning.jump_speed);
        let hp_max = tuning.hp.max(1);

        Self {
            id,
            name: name.to_owned(),
            behavior,
            contact_scale,
            _model: model,
            active: true,
            updated: false,
            paused: false,
            transform: SphereTransform::new(PLANET_RADIUS),
            radius,
            scale: radius * 2.0,
            speed,
            yaw_max,
            jump_speed,
            hp: hp_max,
            hp_max,
            height: tuning.entry_height,
            targeted: false,
            leaving: false,
            float: Tween::start(tuning.entry_height, 0.0, tuning.entry_time, Ease::QuadOut),
            stiff: 0.0,
            avoid: None,
            knock: Slerp::default(),
            appear: Tween::start(0.0, 1.0, tuning.entry_time, Ease::Linear),
            disappear: Tween::idle(1.0),
            spawn_item: false,
            jump: None,
            force_stiff: 0.0,
            tuning,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn transform(&self) -> &SphereTransform {
        &self.transform
    }

    pub fn is_jumping(&self) -> bool {
        self.jump.is_some()
    }

    pub fn is_stiff(&self) -> bool {
        self.stiff > 0.0 || self.force_stiff > 0.0
    }

    fn on_ground(&self) -> bool {
        (self.height - SINK).abs() < GROUND_TOLERANCE
    }

    /// Scale including the appear/disappear effects
    fn display_scale(&self) -> f32 {
        let effect = if self.appear.is_running() {
            self.appear.value()
        } else if self.disappear.is_running() {
            self.disappear.value()
        } else {
            1.0
        };
        self.scale * effect
    }

    pub fn model_matrix(&self) -> Affine3A {
        let lift = self.transform.planet_radius - SINK + self.height;
        self.transform.model_matrix(lift, self.display_scale())
    }

    fn set_spawn_info(&mut self, params: &Params, rng: &mut Pcg32) {
        let radius = params.float(keys::PLANET_RADIUS);
        self.transform = SphereTransform::from_surface_point(params.vec3(keys::SPAWN_POS), radius);
        self.transform.yaw(random_between(rng, -PI, PI));

        self.speed *= params.get_float(keys::SPEED).unwrap_or(1.0);
        self.yaw_max *= params.get_float(keys::YAW).unwrap_or(1.0);
        self.jump_speed *= params.get_float(keys::JUMP_SPEED).unwrap_or(1.0);
        if params.get_bool(keys::FORCE_STIFF).unwrap_or(false) {
            self.force_stiff = params.get_float(keys::FORCE_STIFF_TIME).unwrap_or(0.0);
        }
    }

    fn update(&mut self, params: &Params, ctx: &mut Context<'_>) {
        if self.paused {
            return;
        }
        self.updated = true;
        let dt = params.float(keys::DELTA_TIME);
        self.height = 0.0;

        if self.stiff > 0.0 {
            self.stiff -= dt;
        } else if self.float.is_running() {
            self.height = self.float.step(dt);
            if !self.float.is_running() {
                if self.leaving {
                    debug!("enemy {} left the planet", self.id);
                    self.active = false;
                    return;
                }
                self.stiff = self.tuning.landing_stiff;
            }
        } else if self.disappear.is_running() {
            self.disappear.step(dt);
            if !self.disappear.is_running() {
                self.vanish(ctx);
            }
        } else if self.knock.is_running() {
            self.transform.rotation = self.knock.step(dt);
            if !self.knock.is_running() && self.hp <= 0 {
                self.disappear = Tween::start(1.0, 0.0, self.tuning.disappear_time, Ease::Linear);
            }
        } else if let Some(turn) = self.avoid {
            if self.force_stiff <= 0.0 {
                self.transform.yaw(turn * dt);
                self.transform.move_forward(self.speed * AVOID_SPEED * dt);
            }
            self.behavior.idle(dt);
        } else if let Some(arc) = self.jump.as_mut() {
            let sample = arc.step(dt);
            self.transform.rotation = sample.rotation;
            self.height = sample.height;
            if sample.finished {
                self.jump = None;
                self.stiff = self.tuning.jump_stiff;
            }
            self.behavior.idle(dt);
        } else {
            self.act(dt, ctx.rng);
        }

        if self.force_stiff > 0.0 {
            self.force_stiff -= dt;
        }
        self.appear.step(dt);
    }

    fn vanish(&mut self, ctx: &mut Context<'_>) {
        self.active = false;
        if self.spawn_item {
            let mut spawn = Params::new().with(keys::SPAWN_POS, self.transform.position());
            ctx.publish(Message::SpawnItem, &mut spawn);
        }
    }

    fn act(&mut self, dt: f32, rng: &mut Pcg32) {
        if self.force_stiff > 0.0 {
            return;
        }
        let me = SelfState {
            transform: self.transform,
            targeted: self.targeted,
            hp_rate: self.hp as f32 / self.hp_max as f32,
        };
        let action = self.behavior.update(dt, &me, rng);

        self.transform.turn(action.yaw, self.yaw_max, dt);
        self.transform.move_forward(self.speed * action.accel * dt);
        if let Some(landing) = action.jump {
            self.start_jump(landing);
        }
        self.targeted = !action.retarget;
    }

    fn start_jump(&mut self, landing: Vec3) {
        let angle = angle_between(self.transform.position(), landing);
        let peak = self.tuning.jump_height * angle / PI;
        self.jump = Some(JumpArc::start(&self.transform, landing, self.jump_speed, peak));
    }

    fn check_hit_base(&mut self, params: &mut Params) {
        let base_pos = params.vec3(keys::POS);
        let gate = (self.radius + params.float(keys::RADIUS)) * 2.0;
        if self.transform.distance_to(base_pos) > gate {
            return;
        }

        let local = params.matrix(keys::REV_MATRIX) * self.model_matrix();
        let sphere = Sphere {
            center: local.transform_point3(Vec3::new(0.0, 0.5, 0.0)),
            radius: self.radius / params.float(keys::SCALE),
        };
        if sphere_box(&sphere, &params.aabb(keys::VOLUME)) {
            debug!("enemy {} rammed a base", self.id);
            params.add_int(keys::HIT_NUM, 1);
            self.active = false;
        }
    }

    fn touchdown(&mut self, params: &mut Params, ctx: &Context<'_>) {
        if !self.on_ground() || self.leaving || self.knock.is_running() || self.disappear.is_running() {
            return;
        }
        let attacker = params.vec3(keys::POS);
        let position = self.transform.position();
        let angle = angle_between(attacker, position)
            - angle_on_circle(self.contact_scale * self.radius, self.transform.planet_radius);
        if angle >= params.float(keys::ANGLE) {
            return;
        }

        params.add_int(keys::HIT, 1);
        self.hp -= params.int(keys::POWER);
        if self.hp <= 0 {
            self.hp = 0;
            params.add_int(keys::DESTROY, 1);
            if let Some(me) = ctx.me() {
                params.push_descriptor(keys::DESTROY_ENEMY, self.descriptor(me, false));
            }
        }
        self.knock_back(attacker);
    }

    /// Thrown away from the landing point
    fn knock_back(&mut self, attacker: Vec3) {
        let axis = self.transform.position().cross(attacker);
        let end = if axis.length() > f32::EPSILON {
            let angle = angle_on_circle(self.radius * KNOCKBACK, self.transform.planet_radius);
            (Quat::from_axis_angle(axis.normalize(), -angle) * self.transform.rotation).normalize()
        } else {
            self.transform.rotation
        };
        self.knock = Slerp::start(self.transform.rotation, end, self.tuning.destroy_duration);
        self.float.stop();
        self.stiff = 0.0;
        self.jump = None;
    }

    fn leave(&mut self) {
        self.targeted = false;
        self.leaving = true;
        self.float = Tween::start(
            self.height,
            self.tuning.leave_height,
            self.tuning.leave_time,
            Ease::Linear,
        );
    }

    fn descriptor(&self, entity: EntityHandle, collision: bool) -> Descriptor {
        Descriptor {
            entity,
            id: self.id,
            kind: DescriptorKind::Enemy,
            position: self.transform.position(),
            facing: self.transform.facing(),
            rotation: self.transform.rotation,
            radius: self.radius,
            collision,
            jumping: self.jump.is_some(),
        }
    }

    fn collect(&self, params: &mut Params, ctx: &Context<'_>) {
        if !self.updated {
            return;
        }
        if let Some(me) = ctx.me() {
            params.push_descriptor(keys::ENEMY_INFO, self.descriptor(me, !self.float.is_running()));
        }
    }

    fn interfere(&mut self, params: &Params, rng: &mut Pcg32) {
        if !self.updated {
            return;
        }
        if !self.targeted && !self.leaving {
            self.targeted = self.search_base(params, rng);
        }
        self.avoid_others(params);
    }

    /// Hand a random live base to the behavior
    fn search_base(&mut self, params: &Params, rng: &mut Pcg32) -> bool {
        let bases = params.descriptors(keys::BASE_INFO).unwrap_or_default();
        let Some(base) = random_index(rng, bases.len()).map(|i| &bases[i]) else {
            return false;
        };
        self.behavior.set_target(Target {
            position: base.position,
            planet_radius: self.transform.planet_radius,
        });
        true
    }

    /// Steer around nearby bodies and push out of overlaps
    ///
    /// Each side only ever moves itself by half the overlap. A mid-air enemy
    /// skips this pass entirely, and the range gate uses this enemy's own
    /// radius, so when one side is jumping or the two radii put them on
    /// opposite sides of the gate only one half-push happens and the pair
    /// ends the frame still overlapping. The next grounded frame closes it.
    fn avoid_others(&mut self, params: &Params) {
        self.avoid = None;
        if self.jump.is_some() || self.float.is_running() {
            return;
        }

        let others = params
            .descriptors(keys::PLAYER_INFO)
            .unwrap_or_default()
            .iter()
            .chain(params.descriptors(keys::ENEMY_INFO).unwrap_or_default())
            .filter(|d| d.id != self.id);

        let mut nearest = f32::MAX;
        for other in others {
            let dist = self.transform.distance_to(other.position);
            if dist > self.radius * AVOID_RANGE {
                continue;
            }
            if other.collision {
                let min_dist = (self.radius + other.radius) * self.contact_scale;
                self.transform.separate_from(other.position, min_dist);
            }

            // Only objects roughly ahead are steered around, nearest first
            let to_other = self.transform.position().cross(other.position);
            if angle_between(self.transform.move_axis(), to_other) > FRAC_PI_4 || dist > nearest {
                continue;
            }
            nearest = dist;
            let turn = if self.transform.move_axis().dot(other.position) < 0.0 {
                self.yaw_max
            } else {
                -self.yaw_max
            };
            self.avoid = Some(turn);
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
                height: self.height,
                model: self.model_matrix(),
            },
        );
    }
}

impl Entity for Enemy {
    fn is_active(&self) -> bool {
        self.active
    }

    fn kind(&self) -> &'static str {
        "enemy"
    }

    fn handle_message(&mut self, msg: Message, params: &mut Params, ctx: &mut Context<'_>) {
        if !self.active {
            return;
        }
        match msg {
            Message::Update => self.update(params, ctx),
            Message::Draw => self.draw(params),
            Message::SetSpawnInfo => self.set_spawn_info(params, ctx.rng),
            Message::CollectObjectInfo => self.collect(params, ctx),
            Message::MutualInterference => self.interfere(params, ctx.rng),
            Message::TouchdownPlanet => self.touchdown(params, ctx),
            Message::CheckHitBase => self.check_hit_base(params),
            Message::EnemySpawnItem => self.spawn_item = true,
            Message::DestroyedBase => self.leave(),
            Message::ItemEnemyStiff => self.force_stiff = params.float(keys::EFFECT_TIME),
            Message::PauseGame => self.paused = true,
            Message::ResumeGame => self.paused = false,
            Message::EndGame => self.active = false,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceCache;
    use crate::consts::SIM_DT;
    use crate::consts::UP;
    use crate::sim::behavior::BehaviorFactory;
    use crate::sim::bus::MessageBus;
    use crate::sim::geometry::Aabb;
    use crate::tuning::Tuning;
    use rand::SeedableRng;
    use std::cell::RefCell;

    #[derive(Default)]
    struct ItemSpawns(Vec<Vec3>);

    impl Entity for ItemSpawns {
        fn is_active(&self) -> bool {
            true
        }

        fn handle_message(&mut self, msg: Message, params: &mut Params, _ctx: &mut Context<'_>) {
            if msg == Message::SpawnItem {
                self.0.push(params.vec3(keys::SPAWN_POS));
            }
        }
    }

    struct Rig {
        bus: MessageBus,
        rng: Pcg32,
        enemy: Rc<RefCell<Enemy>>,
        spawns: Rc<RefCell<ItemSpawns>>,
    }

    impl Rig {
        fn new(behavior: &str) -> Self {
            let mut tuning = Tuning::default().enemy("cube_walker").expect("enemy tuning");
            tuning.entry_time = 0.0;
            tuning.landing_stiff = 0.0;
            tuning.hp = 2;
            tuning.radius = [1.0, 1.0];
            tuning.speed = [5.0, 5.0];
            let mut rng = Pcg32::seed_from_u64(11);
            let behavior = BehaviorFactory::default().create(behavior, &tuning.behavior_params, &mut rng);
            let model = ResourceCache::new(["cube"]).acquire("cube").expect("known");
            let enemy = Enemy::new(EntityId(5), "cube_walker", tuning, behavior, 1.4, model, &mut rng);

            let bus = MessageBus::new();
            let enemy = Rc::new(RefCell::new(enemy));
            bus.subscribe(&EntityHandle::from(enemy.clone()));
            let spawns = Rc::new(RefCell::new(ItemSpawns::default()));
            bus.subscribe(&EntityHandle::from(spawns.clone()));

            let mut rig = Self {
                bus,
                rng,
                enemy,
                spawns,
            };
            rig.publish(
                Message::SetSpawnInfo,
                Params::new()
                    .with(keys::PLANET_RADIUS, 100.0f32)
                    .with(keys::SPAWN_POS, Vec3::Y * 100.0)
                    .with(keys::SPEED, 1.0f32)
                    .with(keys::YAW, 1.0f32)
                    .with(keys::JUMP_SPEED, 1.0f32)
                    .with(keys::FORCE_STIFF, false)
                    .with(keys::FORCE_STIFF_TIME, 0.0f32),
            );
            rig
        }

        fn publish(&mut self, msg: Message, mut params: Params) -> Params {
            let mut ctx = Context::new(&self.bus, &mut self.rng, 0);
            self.bus.publish(msg, &mut params, &mut ctx);
            params
        }

        fn tick(&mut self) {
            self.publish(Message::Update, Params::new().with(keys::DELTA_TIME, SIM_DT));
            let bag = self.publish(Message::CollectObjectInfo, Params::new());
            self.publish(Message::MutualInterference, bag);
        }

        fn touchdown(&mut self, pos: Vec3, power: i32) -> Params {
            self.publish(
                Message::TouchdownPlanet,
                Params::new()
                    .with(keys::POS, pos)
                    .with(keys::ANGLE, 0.05f32)
                    .with(keys::POWER, power),
            )
        }
    }

    #[test]
    fn test_lands_then_walks() {
        let mut rig = Rig::new("idle");
        rig.tick();
        let start = rig.enemy.borrow().transform().position();
        assert!(rig.enemy.borrow().on_ground());

        // Idle behavior never accelerates
        for _ in 0..30 {
            rig.tick();
        }
        assert!(angle_between(start, rig.enemy.borrow().transform().position()) < 1e-6);

        let mut rig = Rig::new("straight");
        rig.tick();
        let start = rig.enemy.borrow().transform().position();
        for _ in 0..60 {
            rig.tick();
        }
        let moved = angle_between(start, rig.enemy.borrow().transform().position()) * 100.0;
        // No base in sight: full acceleration
        assert!((moved - 5.0).abs() < 0.05);
    }

    #[test]
    fn test_touchdown_hit_then_destroy() {
        let mut rig = Rig::new("idle");
        rig.tick();
        let pos = rig.enemy.borrow().transform().position();

        let reply = rig.touchdown(pos, 1);
        assert_eq!(reply.int(keys::HIT), 1);
        assert!(!reply.contains(keys::DESTROY));
        assert_eq!(rig.enemy.borrow().hp(), 1);

        // Immune while being knocked back
        let reply = rig.touchdown(pos, 1);
        assert!(!reply.contains(keys::HIT));

        for _ in 0..60 {
            rig.tick();
        }
        let pos = rig.enemy.borrow().transform().position();
        let reply = rig.touchdown(pos, 1);
        assert_eq!(reply.int(keys::DESTROY), 1);
        let destroyed = reply.descriptors(keys::DESTROY_ENEMY).unwrap_or_default();
        assert_eq!(destroyed.len(), 1);
        assert_eq!(destroyed[0].id, EntityId(5));

        // Flag the item drop, then watch it disappear
        destroyed[0]
            .entity
            .send(Message::EnemySpawnItem, &mut Params::new(), &mut Context::new(&rig.bus, &mut rig.rng, 0));
        for _ in 0..120 {
            rig.tick();
        }
        assert!(!rig.enemy.borrow().is_active());
        assert_eq!(rig.spawns.borrow().0.len(), 1);
    }

    #[test]
    fn test_touchdown_out_of_range_misses() {
        let mut rig = Rig::new("idle");
        rig.tick();
        let reply = rig.touchdown(Vec3::NEG_Y, 10);
        assert!(!reply.contains(keys::HIT));
        assert_eq!(rig.enemy.borrow().hp(), 2);
    }

    #[test]
    fn test_rams_base_volume() {
        let mut rig = Rig::new("idle");
        rig.tick();

        // A base of scale 4 right under the enemy
        let base = SphereTransform::new(100.0);
        let base_matrix = base.model_matrix(99.0, 4.0);
        let check = |pos: Vec3| {
            Params::new()
                .with(keys::VOLUME, Aabb::new(Vec3::new(0.0, 0.5, 0.0), Vec3::splat(0.5)))
                .with(keys::REV_MATRIX, base_matrix.inverse())
                .with(keys::SCALE, 4.0f32)
                .with(keys::POS, pos)
                .with(keys::RADIUS, 2.0f32)
        };

        // Far away base: rejected by the distance gate
        let reply = rig.publish(Message::CheckHitBase, check(Vec3::NEG_Y));
        assert!(!reply.contains(keys::HIT_NUM));

        let reply = rig.publish(Message::CheckHitBase, check(base.position()));
        assert_eq!(reply.int(keys::HIT_NUM), 1);
        assert!(!rig.enemy.borrow().is_active());
    }

    #[test]
    fn test_item_stiff_freezes_behavior() {
        let mut rig = Rig::new("straight");
        rig.tick();
        rig.publish(Message::ItemEnemyStiff, Params::new().with(keys::EFFECT_TIME, 1.0f32));
        let start = rig.enemy.borrow().transform().position();
        for _ in 0..30 {
            rig.tick();
        }
        assert!(rig.enemy.borrow().is_stiff());
        assert!(angle_between(start, rig.enemy.borrow().transform().position()) < 1e-6);
    }

    #[test]
    fn test_leaves_when_base_destroyed() {
        let mut rig = Rig::new("straight");
        rig.tick();
        rig.publish(Message::DestroyedBase, Params::new());
        for _ in 0..120 {
            rig.tick();
        }
        assert!(!rig.enemy.borrow().is_active());
    }

    fn neighbor(rig: &Rig, angle: f32, jumping: bool) -> Descriptor {
        let me = rig.enemy.borrow().transform().rotation;
        Descriptor {
            entity: EntityHandle::from(rig.spawns.clone()),
            id: EntityId(1),
            kind: DescriptorKind::Enemy,
            position: (Quat::from_axis_angle(Vec3::Z, angle) * me) * UP,
            facing: Vec3::Z,
            rotation: Quat::IDENTITY,
            radius: 1.0,
            collision: true,
            jumping,
        }
    }

    #[test]
    fn test_separation_is_one_sided() {
        // A jumping neighbor does not move, so only this half of the push happens
        let mut rig = Rig::new("idle");
        rig.tick();
        let other = neighbor(&rig, 0.01, true);
        let pos = other.position;
        let mut bag = Params::new();
        bag.push_descriptor(keys::ENEMY_INFO, other);
        rig.publish(Message::MutualInterference, bag);
        let after = rig.enemy.borrow().transform().distance_to(pos);
        assert!((after - 1.9).abs() < 5e-3);
        assert!(after < 2.8);

        // Beyond this enemy's own avoidance range nothing happens on this side
        let mut rig = Rig::new("idle");
        rig.tick();
        let start = rig.enemy.borrow().transform().position();
        let mut bag = Params::new();
        bag.push_descriptor(keys::ENEMY_INFO, neighbor(&rig, 0.06, false));
        rig.publish(Message::MutualInterference, bag);
        assert!(angle_between(start, rig.enemy.borrow().transform().position()) < 1e-6);
    }

    #[test]
    fn test_separates_from_neighbor() {
        let mut rig = Rig::new("idle");
        rig.tick();
        let me = rig.enemy.borrow().transform().rotation;
        let neighbor = (Quat::from_axis_angle(Vec3::Z, 0.01) * me) * UP;

        let mut bag = Params::new();
        bag.push_descriptor(
            keys::PLAYER_INFO,
            Descriptor {
                entity: EntityHandle::from(rig.spawns.clone()),
                id: EntityId(1),
                kind: DescriptorKind::Player,
                position: neighbor,
                facing: Vec3::Z,
                rotation: Quat::IDENTITY,
                radius: 1.0,
                collision: true,
                jumping: false,
            },
        );
        let before = rig.enemy.borrow().transform().distance_to(neighbor);
        rig.publish(Message::MutualInterference, bag);
        let after = rig.enemy.borrow().transform().distance_to(neighbor);
        assert!((before - 1.0).abs() < 5e-3);
        assert!((after - (1.0 + (2.8 - 1.0) / 2.0)).abs() < 5e-3);
    }
}
