//! Session bookkeeping: score, kill counts, combo and item drops

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::sim::entity::{Context, Entity};
use crate::sim::message::{Message, keys};
use crate::sim::params::Params;
use crate::tuning::ScoreTuning;

/// Points for destroying `destroyed` enemies with one landing at `combo`
///
/// More simultaneous kills and longer hit streaks score higher.
pub fn kill_score(destroyed: i32, combo: i32, multiplier: Option<i32>) -> i32 {
    let base = 10.0 * ((destroyed * destroyed) as f32 + (combo - 1) as f32 * 0.25);
    base as i32 * multiplier.unwrap_or(1)
}

/// Totals reported by `GatherGameResult`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub score: i32,
    pub destroyed_enemies: i32,
    /// Most enemies destroyed by a single landing
    pub once_destroy_num: i32,
    pub hit_combo: i32,
    pub items_taken: i32,
    pub level: i32,
    pub play_time: f32,
    pub game_over: bool,
}

pub struct Scoreboard {
    tuning: ScoreTuning,
    in_game: bool,
    paused: bool,
    multiply_time: f32,
    /// Item drops already granted
    items_dropped: i32,
    summary: ScoreSummary,
}

impl Scoreboard {
    pub fn new(tuning: ScoreTuning) -> Self {
        Self {
            tuning,
            in_game: false,
            paused: false,
            multiply_time: 0.0,
            items_dropped: 0,
            summary: ScoreSummary::default(),
        }
    }

    pub fn summary(&self) -> ScoreSummary {
        self.summary
    }

    pub fn is_multiplying(&self) -> bool {
        self.multiply_time > 0.0
    }

    fn update(&mut self, params: &Params) {
        if self.paused || !self.in_game {
            return;
        }
        let dt = params.float(keys::DELTA_TIME);
        self.summary.play_time += dt;
        if self.multiply_time > 0.0 {
            self.multiply_time -= dt;
        }
    }

    fn record_combo(&mut self, params: &Params) -> i32 {
        let combo = params.get_int(keys::HIT_COMBO).unwrap_or(0);
        self.summary.hit_combo = self.summary.hit_combo.max(combo);
        combo
    }

    fn destroyed_enemy(&mut self, params: &Params, ctx: &mut Context<'_>) {
        let destroyed = params.get_int(keys::DESTROY).unwrap_or(0);
        self.summary.destroyed_enemies += destroyed;
        self.summary.once_destroy_num = self.summary.once_destroy_num.max(destroyed);

        self.drop_items(params, ctx);

        let combo = self.record_combo(params);
        let multiplier = self.is_multiplying().then_some(self.tuning.multiplier);
        let gained = kill_score(destroyed, combo, multiplier);
        self.summary.score += gained;
        debug!("destroyed x{destroyed} combo {combo}: +{gained} ({})", self.summary.score);
    }

    /// One item for every `item_every` kills, left behind by this landing's victims
    fn drop_items(&mut self, params: &Params, ctx: &mut Context<'_>) {
        if self.tuning.item_every <= 0 {
            return;
        }
        let due = self.summary.destroyed_enemies / self.tuning.item_every;
        if due <= self.items_dropped {
            return;
        }
        let victims = params.descriptors(keys::DESTROY_ENEMY).unwrap_or_default();
        let count = usize::try_from(due - self.items_dropped).unwrap_or(0);
        for victim in victims.iter().take(count) {
            victim.entity.send(Message::EnemySpawnItem, &mut Params::new(), ctx);
        }
        self.items_dropped = due;
    }

    fn gather(&self, params: &mut Params) {
        let s = &self.summary;
        params.insert(keys::SCORE, s.score);
        params.insert(keys::DESTROYED_ENEMIES, s.destroyed_enemies);
        params.insert(keys::ONCE_DESTROY_NUM, s.once_destroy_num);
        params.insert(keys::HIT_COMBO_NUM, s.hit_combo);
        params.insert(keys::ITEMS_TAKEN, s.items_taken);
        params.insert(keys::LEVEL, s.level);
        params.insert(keys::PLAY_TIME, s.play_time);
        params.insert(keys::GAME_OVER, s.game_over);
    }
}

impl Entity for Scoreboard {
    fn is_active(&self) -> bool {
        true
    }

    fn kind(&self) -> &'static str {
        "scoreboard"
    }

    fn handle_message(&mut self, msg: Message, params: &mut Params, ctx: &mut Context<'_>) {
        match msg {
            Message::Update => self.update(params),
            Message::StartGameMain => self.in_game = true,
            Message::DestroyedBase => {
                if self.in_game {
                    info!("game over, score {}", self.summary.score);
                }
                self.in_game = false;
                self.summary.game_over = true;
            }
            Message::AttackHitEnemy if self.in_game => {
                self.record_combo(params);
            }
            Message::DestroyedEnemy if self.in_game => self.destroyed_enemy(params, ctx),
            Message::ItemScoreMultiply => {
                self.multiply_time = params.float(keys::EFFECT_TIME);
                self.summary.items_taken += 1;
            }
            Message::ItemMaxPower
            | Message::ItemEnemyStiff
            | Message::ItemBaseImmortal
            | Message::ItemMaxRange => self.summary.items_taken += 1,
            Message::GameLevelUp => self.summary.level = params.int(keys::LEVEL),
            Message::GatherGameResult => self.gather(params),
            Message::PauseGame => self.paused = true,
            Message::ResumeGame => self.paused = false,
            Message::EndGame => self.in_game = false,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::bus::MessageBus;
    use crate::sim::entity::{EntityHandle, EntityId};
    use crate::sim::params::{Descriptor, DescriptorKind};
    use glam::{Quat, Vec3};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Victim {
        drops: usize,
    }

    impl Entity for Victim {
        fn is_active(&self) -> bool {
            true
        }

        fn handle_message(&mut self, msg: Message, _params: &mut Params, _ctx: &mut Context<'_>) {
            if msg == Message::EnemySpawnItem {
                self.drops += 1;
            }
        }
    }

    struct Rig {
        bus: MessageBus,
        rng: Pcg32,
        board: Rc<RefCell<Scoreboard>>,
    }

    impl Rig {
        fn new(item_every: i32) -> Self {
            let bus = MessageBus::new();
            let board = Rc::new(RefCell::new(Scoreboard::new(ScoreTuning {
                item_every,
                multiplier: 4,
            })));
            bus.subscribe(&EntityHandle::from(board.clone()));
            let mut rig = Self {
                bus,
                rng: Pcg32::seed_from_u64(0),
                board,
            };
            rig.publish(Message::StartGameMain, Params::new());
            rig
        }

        fn publish(&mut self, msg: Message, mut params: Params) -> Params {
            let mut ctx = Context::new(&self.bus, &mut self.rng, 0);
            self.bus.publish(msg, &mut params, &mut ctx);
            params
        }

        fn kill(&mut self, victims: &[Rc<RefCell<Victim>>], combo: i32) {
            let mut params = Params::new()
                .with(keys::DESTROY, victims.len() as i32)
                .with(keys::HIT_COMBO, combo);
            for (i, v) in victims.iter().enumerate() {
                params.push_descriptor(
                    keys::DESTROY_ENEMY,
                    Descriptor {
                        entity: EntityHandle::from(v.clone()),
                        id: EntityId(i as u32),
                        kind: DescriptorKind::Enemy,
                        position: Vec3::Y,
                        facing: Vec3::Z,
                        rotation: Quat::IDENTITY,
                        radius: 1.0,
                        collision: false,
                        jumping: false,
                    },
                );
            }
            self.publish(Message::DestroyedEnemy, params);
        }
    }

    fn victims(n: usize) -> Vec<Rc<RefCell<Victim>>> {
        (0..n).map(|_| Rc::new(RefCell::new(Victim::default()))).collect()
    }

    #[test]
    fn test_kill_score_formula() {
        assert_eq!(kill_score(1, 1, None), 10);
        assert_eq!(kill_score(2, 1, None), 40);
        assert_eq!(kill_score(1, 5, None), 20);
        assert_eq!(kill_score(3, 2, Some(4)), 4 * 92);
    }

    #[test]
    fn test_scores_and_combo() {
        let mut rig = Rig::new(100);
        rig.kill(&victims(1), 1);
        rig.kill(&victims(2), 2);
        rig.publish(Message::AttackHitEnemy, Params::new().with(keys::HIT_COMBO, 7));

        let s = rig.board.borrow().summary();
        assert_eq!(s.score, 10 + 42);
        assert_eq!(s.destroyed_enemies, 3);
        assert_eq!(s.once_destroy_num, 2);
        assert_eq!(s.hit_combo, 7);
    }

    #[test]
    fn test_multiplier_expires() {
        let mut rig = Rig::new(100);
        rig.publish(Message::ItemScoreMultiply, Params::new().with(keys::EFFECT_TIME, 0.5f32));
        rig.kill(&victims(1), 1);
        assert_eq!(rig.board.borrow().summary().score, 40);

        for _ in 0..40 {
            rig.publish(Message::Update, Params::new().with(keys::DELTA_TIME, SIM_DT));
        }
        rig.kill(&victims(1), 1);
        let s = rig.board.borrow().summary();
        assert_eq!(s.score, 50);
        assert_eq!(s.items_taken, 1);
    }

    #[test]
    fn test_item_every_n_kills() {
        let mut rig = Rig::new(3);
        let first = victims(2);
        rig.kill(&first, 1);
        assert!(first.iter().all(|v| v.borrow().drops == 0));

        // Kill total goes 2 -> 7: two items due, left by the first two victims
        let second = victims(5);
        rig.kill(&second, 2);
        let drops: Vec<usize> = second.iter().map(|v| v.borrow().drops).collect();
        assert_eq!(drops, [1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_game_over_stops_scoring() {
        let mut rig = Rig::new(100);
        rig.publish(Message::GameLevelUp, Params::new().with(keys::LEVEL, 3));
        rig.publish(Message::DestroyedBase, Params::new());
        rig.kill(&victims(1), 1);

        let result = rig.publish(Message::GatherGameResult, Params::new());
        assert_eq!(result.int(keys::SCORE), 0);
        assert_eq!(result.int(keys::LEVEL), 3);
        assert!(result.flag(keys::GAME_OVER));
    }
}
