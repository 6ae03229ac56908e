//! Scripted spawning of bases and enemy waves
//!
//! Spawn patterns run in order and loop. A `wait` pattern holds until the
//! collect phase reports no enemies, then announces `GameLevelUp`. Each full
//! pass over the patterns raises the level, which scales enemy speed, yaw
//! and jump speed. Bases enter as the pattern count passes their
//! `entry_level`.

use std::f32::consts::PI;

use glam::{Quat, Vec3};
use log::{debug, info, warn};
use rand::Rng;
use rand_pcg::Pcg32;

use crate::random_between;
use crate::sim::entity::{Context, Entity};
use crate::sim::message::{Message, keys};
use crate::sim::params::Params;
use crate::tuning::{GeneratorTuning, SpawnPattern};

/// Random surface direction between `angle` (radians) from the south pole
pub fn spawn_direction(rng: &mut Pcg32, [lo, hi]: [f32; 2]) -> Vec3 {
    let tilt = Quat::from_axis_angle(Vec3::Z, random_between(rng, lo, hi));
    let spin = Quat::from_axis_angle(Vec3::Y, random_between(rng, -PI, PI));
    (spin * tilt) * Vec3::NEG_Y
}

fn radians([lo, hi]: [f32; 2]) -> [f32; 2] {
    [lo.to_radians(), hi.to_radians()]
}

fn lerp([lo, hi]: [f32; 2], t: f32) -> f32 {
    lo + (hi - lo) * t
}

/// Pattern currently being played
#[derive(Debug, Clone, Default)]
struct Wave {
    wait_clean: bool,
    delay: f32,
    remaining: i32,
    once_spawn: [i32; 2],
    interval: [f32; 2],
    countdown: f32,
    angle: [f32; 2],
    types: Vec<String>,
}

impl From<&SpawnPattern> for Wave {
    fn from(p: &SpawnPattern) -> Self {
        Self {
            wait_clean: p.wait,
            delay: p.delay,
            remaining: p.spawn_num,
            once_spawn: p.once_spawn,
            interval: p.interval,
            countdown: 0.0,
            angle: radians(p.angle),
            types: p.types.clone(),
        }
    }
}

pub struct Generator {
    tuning: GeneratorTuning,
    active: bool,
    paused: bool,
    updated: bool,
    spawning: bool,
    setup: bool,
    pattern_index: usize,
    entry_level: i32,
    level: i32,
    wave: Wave,
    stiff_spawn_time: f32,
    base_setup: bool,
    base_index: usize,
    /// Next base waiting for its entry level
    next_base: Option<(i32, [f32; 2])>,
}

impl Generator {
    pub fn new(tuning: GeneratorTuning) -> Self {
        if tuning.patterns.is_empty() {
            warn!("generator has no spawn patterns, no enemies will appear");
        }
        Self {
            tuning,
            active: true,
            paused: false,
            updated: false,
            spawning: false,
            setup: true,
            pattern_index: 0,
            entry_level: 0,
            level: 0,
            wave: Wave::default(),
            stiff_spawn_time: 0.0,
            base_setup: true,
            base_index: 0,
            next_base: None,
        }
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    /// Patterns started so far
    pub fn entry_level(&self) -> i32 {
        self.entry_level
    }

    pub fn is_waiting(&self) -> bool {
        self.wave.wait_clean
    }

    fn update(&mut self, params: &Params, ctx: &mut Context<'_>) {
        if self.paused {
            return;
        }
        self.updated = true;
        let dt = params.float(keys::DELTA_TIME);

        if self.base_setup {
            self.setup_base();
        }
        if self.setup {
            self.setup_wave();
        }
        self.spawn_base(ctx);
        self.spawn_enemies(dt, ctx);

        if self.stiff_spawn_time > 0.0 {
            self.stiff_spawn_time -= dt;
        }
    }

    fn setup_base(&mut self) {
        self.base_setup = false;
        self.next_base = self
            .tuning
            .base_entry
            .get(self.base_index)
            .map(|entry| (entry.entry_level, radians(entry.angle)));
        self.base_index += 1;
    }

    fn spawn_base(&mut self, ctx: &mut Context<'_>) {
        let Some((entry_level, angle)) = self.next_base else {
            return;
        };
        if entry_level >= self.entry_level || self.wave.wait_clean {
            return;
        }
        let mut spawn = Params::new().with(keys::SPAWN_POS, spawn_direction(ctx.rng, angle));
        ctx.publish(Message::SpawnBase, &mut spawn);
        self.base_setup = true;
    }

    fn setup_wave(&mut self) {
        let Some(pattern) = self.tuning.patterns.get(self.pattern_index) else {
            self.wave = Wave::default();
            return;
        };
        self.setup = false;
        self.wave = Wave::from(pattern);
        debug!("spawn pattern {} begins", self.pattern_index);

        self.pattern_index = (self.pattern_index + 1) % self.tuning.patterns.len();
        self.entry_level += 1;
        if self.pattern_index == 0 && self.level < self.tuning.level_max {
            self.level += 1;
            info!("generator level {}", self.level);
        }
    }

    fn spawn_enemies(&mut self, dt: f32, ctx: &mut Context<'_>) {
        if !self.spawning || self.wave.wait_clean || self.setup {
            return;
        }
        if self.wave.delay > 0.0 {
            self.wave.delay -= dt;
            if self.wave.delay > 0.0 {
                return;
            }
        }
        if self.wave.countdown > 0.0 {
            self.wave.countdown -= dt;
            if self.wave.countdown > 0.0 {
                return;
            }
        }

        let [lo, hi] = self.wave.once_spawn;
        let count = ctx.rng.random_range(lo.min(hi)..=lo.max(hi)).min(self.wave.remaining);

        let rate = if self.tuning.level_max > 0 {
            self.level as f32 / self.tuning.level_max as f32
        } else {
            0.0
        };
        let speed = lerp(self.tuning.speed, rate);
        let yaw = lerp(self.tuning.yaw, rate);
        let jump_speed = lerp(self.tuning.jump_speed, rate);

        for _ in 0..count {
            let Some(name) = crate::random_index(ctx.rng, self.wave.types.len())
                .map(|i| self.wave.types[i].clone())
            else {
                warn!("spawn pattern lists no enemy types");
                break;
            };
            let mut spawn = Params::new()
                .with(keys::SPAWN_POS, spawn_direction(ctx.rng, self.wave.angle))
                .with(keys::NAME, name)
                .with(keys::SPEED, speed)
                .with(keys::YAW, yaw)
                .with(keys::JUMP_SPEED, jump_speed)
                .with(keys::FORCE_STIFF, self.stiff_spawn_time > 0.0)
                .with(keys::FORCE_STIFF_TIME, self.stiff_spawn_time.max(0.0));
            ctx.publish(Message::SpawnEnemy, &mut spawn);
        }

        self.wave.remaining -= count;
        if self.wave.remaining <= 0 {
            self.setup = true;
        }
        let [lo, hi] = self.wave.interval;
        self.wave.countdown = random_between(ctx.rng, lo, hi);
    }

    /// A waiting pattern finishes once no enemy reported in
    fn interfere(&mut self, params: &Params, ctx: &mut Context<'_>) {
        if !self.updated || !self.wave.wait_clean {
            return;
        }
        if params.descriptors(keys::ENEMY_INFO).is_some_and(|e| !e.is_empty()) {
            return;
        }
        self.wave.wait_clean = false;
        info!("field clear, level {} begins", self.entry_level);
        let mut event = Params::new().with(keys::LEVEL, self.entry_level);
        ctx.publish(Message::GameLevelUp, &mut event);
    }
}

impl Entity for Generator {
    fn is_active(&self) -> bool {
        self.active
    }

    fn kind(&self) -> &'static str {
        "generator"
    }

    fn handle_message(&mut self, msg: Message, params: &mut Params, ctx: &mut Context<'_>) {
        if !self.active {
            return;
        }
        match msg {
            Message::Update => self.update(params, ctx),
            Message::MutualInterference => self.interfere(params, ctx),
            Message::StartGameMain => self.spawning = true,
            Message::DestroyedBase | Message::EndGame => self.active = false,
            Message::ItemEnemyStiff => self.stiff_spawn_time = params.float(keys::EFFECT_TIME),
            Message::PauseGame => self.paused = true,
            Message::ResumeGame => self.paused = false,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::bus::MessageBus;
    use crate::sim::entity::EntityHandle;
    use crate::tuning::BaseEntry;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        bases: Vec<Vec3>,
        enemies: Vec<(String, f32, bool)>,
        level_ups: Vec<i32>,
    }

    impl Entity for Recorder {
        fn is_active(&self) -> bool {
            true
        }

        fn handle_message(&mut self, msg: Message, params: &mut Params, _ctx: &mut Context<'_>) {
            match msg {
                Message::SpawnBase => self.bases.push(params.vec3(keys::SPAWN_POS)),
                Message::SpawnEnemy => self.enemies.push((
                    params.text(keys::NAME).to_owned(),
                    params.float(keys::SPEED),
                    params.flag(keys::FORCE_STIFF),
                )),
                Message::GameLevelUp => self.level_ups.push(params.int(keys::LEVEL)),
                _ => {}
            }
        }
    }

    fn pattern(wait: bool, spawn_num: i32) -> SpawnPattern {
        SpawnPattern {
            wait,
            delay: 0.0,
            spawn_num,
            once_spawn: [1, 1],
            interval: [0.1, 0.1],
            angle: [90.0, 90.0],
            types: vec!["cube_walker".to_owned()],
        }
    }

    fn tuning() -> GeneratorTuning {
        GeneratorTuning {
            level_max: 2,
            speed: [1.0, 2.0],
            yaw: [1.0, 1.0],
            jump_speed: [1.0, 1.0],
            base_entry: vec![
                BaseEntry { entry_level: 0, angle: [0.0, 0.0] },
                BaseEntry { entry_level: 2, angle: [0.0, 0.0] },
            ],
            patterns: vec![pattern(false, 2), pattern(true, 0)],
        }
    }

    struct Rig {
        bus: MessageBus,
        rng: Pcg32,
        generator: Rc<RefCell<Generator>>,
        recorder: Rc<RefCell<Recorder>>,
    }

    impl Rig {
        fn new() -> Self {
            let bus = MessageBus::new();
            let generator = Rc::new(RefCell::new(Generator::new(tuning())));
            bus.subscribe(&EntityHandle::from(generator.clone()));
            let recorder = Rc::new(RefCell::new(Recorder::default()));
            bus.subscribe(&EntityHandle::from(recorder.clone()));
            Self {
                bus,
                rng: Pcg32::seed_from_u64(21),
                generator,
                recorder,
            }
        }

        fn publish(&mut self, msg: Message, mut params: Params) -> Params {
            let mut ctx = Context::new(&self.bus, &mut self.rng, 0);
            self.bus.publish(msg, &mut params, &mut ctx);
            params
        }

        /// One tick with an empty field
        fn tick(&mut self) {
            self.publish(Message::Update, Params::new().with(keys::DELTA_TIME, SIM_DT));
            self.publish(Message::MutualInterference, Params::new());
        }
    }

    #[test]
    fn test_spawn_direction_angle() {
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..50 {
            let dir = spawn_direction(&mut rng, radians([30.0, 60.0]));
            let from_south = crate::angle_between(dir, Vec3::NEG_Y).to_degrees();
            assert!((29.99..=60.01).contains(&from_south));
            assert!((dir.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_first_base_before_game_start() {
        let mut rig = Rig::new();
        rig.tick();
        let rec = rig.recorder.borrow();
        assert_eq!(rec.bases.len(), 1);
        assert!((rec.bases[0] - Vec3::NEG_Y).length() < 1e-5);
        assert!(rec.enemies.is_empty());
    }

    #[test]
    fn test_waves_levels_and_bases() {
        let mut rig = Rig::new();
        rig.publish(Message::StartGameMain, Params::new());
        for _ in 0..60 {
            rig.tick();
        }

        let rec = rig.recorder.borrow();
        // Two patterns per pass: each pass spawns two enemies and clears one wait
        assert!(rec.enemies.len() >= 4);
        assert!(rec.level_ups.len() >= 2);
        assert_eq!(rec.level_ups[0], 2);
        assert_eq!(rec.level_ups[1], 4);
        // Second base entered once the pattern count passed 2
        assert_eq!(rec.bases.len(), 2);

        // Speed rises with the level, capped at level_max
        assert_eq!(rec.enemies[0].1, 1.0);
        assert!(rec.enemies.iter().any(|e| e.1 > 1.0));
        assert!(rec.enemies.iter().all(|e| e.1 <= 2.0 && e.0 == "cube_walker"));
        assert_eq!(rig.generator.borrow().level(), 2);
    }

    #[test]
    fn test_wait_holds_while_enemies_remain() {
        let mut rig = Rig::new();
        rig.publish(Message::StartGameMain, Params::new());
        for _ in 0..20 {
            rig.publish(Message::Update, Params::new().with(keys::DELTA_TIME, SIM_DT));
        }
        assert!(rig.generator.borrow().is_waiting());
        // No interfere phase ran, so the wait never cleared
        assert!(rig.recorder.borrow().level_ups.is_empty());
        assert_eq!(rig.recorder.borrow().enemies.len(), 2);
    }

    #[test]
    fn test_enemy_stiff_item_marks_new_spawns() {
        let mut rig = Rig::new();
        rig.publish(Message::StartGameMain, Params::new());
        rig.publish(Message::ItemEnemyStiff, Params::new().with(keys::EFFECT_TIME, 5.0f32));
        rig.tick();
        assert!(rig.recorder.borrow().enemies[0].2);
    }

    #[test]
    fn test_stops_when_base_destroyed() {
        let mut rig = Rig::new();
        rig.publish(Message::StartGameMain, Params::new());
        rig.publish(Message::DestroyedBase, Params::new());
        for _ in 0..30 {
            rig.tick();
        }
        assert!(!rig.generator.borrow().is_active());
        assert!(rig.recorder.borrow().enemies.is_empty());
    }
}
