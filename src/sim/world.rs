//! Fixed timestep world
//!
//! Owns the bus, the entity registry and the only RNG, and drives the
//! per-tick pipeline: Update, Collect, Interfere, then one compaction.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::{Quat, Vec3};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::behavior::BehaviorFactory;
use super::bus::{MessageBus, Subscription};
use super::entity::{Context, Entity, EntityHandle, EntityId};
use super::message::{Message, keys};
use super::objects::{AttackStats, Generator, ScoreSummary, Scoreboard};
use super::params::{Params, Pose};
use super::spawn::SpawnDirector;
use crate::resources::{ResourceCache, ResourceError};
use crate::tuning::{ConfigError, GeneratorTuning, ScoreTuning, Tuning};

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("resource: {0}")]
    Resource(#[from] ResourceError),
}

struct Slot {
    id: EntityId,
    sub: Subscription,
    handle: EntityHandle,
}

/// Ordered entity list plus the id allocator
///
/// Entities are only ever removed by [`Registry::compact`], never in the
/// middle of a broadcast.
#[derive(Default)]
pub struct Registry {
    entities: RefCell<Vec<Slot>>,
    next_id: Cell<u32>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_id(&self) -> EntityId {
        let id = EntityId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        id
    }

    /// Construct with a fresh id, append and subscribe
    ///
    /// The caller still owes the entity its `SetSpawnInfo`.
    pub fn spawn_with<T, F>(&self, bus: &MessageBus, make: F) -> (EntityId, Rc<RefCell<T>>)
    where
        T: Entity + 'static,
        F: FnOnce(EntityId) -> T,
    {
        let id = self.allocate_id();
        let entity = Rc::new(RefCell::new(make(id)));
        let handle = EntityHandle::from(entity.clone());
        let sub = bus.subscribe(&handle);
        self.entities.borrow_mut().push(Slot { id, sub, handle });
        (id, entity)
    }

    /// Drop every inactive entity, keeping survivors in order
    ///
    /// Returns how many were removed.
    pub fn compact(&self, bus: &MessageBus) -> usize {
        let mut entities = self.entities.borrow_mut();
        let before = entities.len();
        entities.retain(|slot| {
            let keep = slot.handle.is_active();
            if !keep {
                bus.unsubscribe(slot.sub);
            }
            keep
        });
        before - entities.len()
    }

    pub fn len(&self) -> usize {
        self.entities.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.borrow().is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<EntityHandle> {
        self.entities
            .borrow()
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| slot.handle.clone())
    }

    /// Ids in registry order
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.borrow().iter().map(|slot| slot.id).collect()
    }
}

/// An attack pick on the planet surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackPick {
    pub target: Vec3,
    pub target_id: i32,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub attack: Option<AttackPick>,
    /// Pause toggle
    pub pause: bool,
}

/// Session statistics collected by `GatherGameResult`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GameResult {
    pub score: ScoreSummary,
    pub attacks: AttackStats,
}

pub struct World {
    bus: MessageBus,
    registry: Rc<Registry>,
    _director: Rc<RefCell<SpawnDirector>>,
    rng: Pcg32,
    frame: u64,
    paused: bool,
    generator: GeneratorTuning,
    score: ScoreTuning,
}

impl World {
    /// Fails if any section, resource name or enemy behavior is unusable
    pub fn new(seed: u64, tuning: &Tuning, behaviors: BehaviorFactory) -> Result<Self, WorldError> {
        let planet = tuning.world()?;
        let resources = ResourceCache::from_tuning(tuning)?;
        let registry = Rc::new(Registry::new());
        let director = SpawnDirector::new(registry.clone(), resources, Rc::new(behaviors), tuning)?;

        let bus = MessageBus::new();
        let director = Rc::new(RefCell::new(director));
        // First subscriber: spawns requested during a broadcast are built
        // before anyone else reacts to the request
        bus.subscribe(&EntityHandle::from(director.clone()));

        info!(
            "world created (seed {seed}, planet radius {}, contact scale {})",
            planet.planet_radius, planet.contact_scale
        );
        Ok(Self {
            bus,
            registry,
            _director: director,
            rng: Pcg32::seed_from_u64(seed),
            frame: 0,
            paused: false,
            generator: tuning.generator()?,
            score: tuning.score()?,
        })
    }

    /// Embedded tuning and the built-in behaviors
    pub fn with_defaults(seed: u64) -> Result<Self, WorldError> {
        Self::new(seed, &Tuning::default(), BehaviorFactory::default())
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn entity_count(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    fn broadcast(&mut self, msg: Message, params: &mut Params) {
        let mut ctx = Context::new(&self.bus, &mut self.rng, self.frame);
        self.bus.publish(msg, params, &mut ctx);
    }

    /// Broadcast an external event; returns the bag with everyone's writes
    pub fn publish(&mut self, msg: Message, mut params: Params) -> Params {
        self.broadcast(msg, &mut params);
        params
    }

    /// Advance the world by one fixed timestep
    pub fn tick(&mut self, input: &TickInput, dt: f32) {
        if input.pause {
            self.set_paused(!self.paused);
        }
        if self.paused {
            return;
        }

        if let Some(pick) = input.attack {
            let mut attack = Params::new()
                .with(keys::TARGET_POS, pick.target)
                .with(keys::TARGET_ID, pick.target_id);
            self.broadcast(Message::StartJumpAttack, &mut attack);
        }

        let mut update = Params::new().with(keys::DELTA_TIME, dt);
        self.broadcast(Message::Update, &mut update);

        // One bag for both phases; descriptors die with it
        let mut bag = Params::new();
        self.broadcast(Message::CollectObjectInfo, &mut bag);
        self.broadcast(Message::MutualInterference, &mut bag);
        drop(bag);

        let removed = self.registry.compact(&self.bus);
        if removed > 0 {
            debug!("frame {}: compacted {removed} entities", self.frame);
        }
        self.frame += 1;
    }

    pub fn set_paused(&mut self, paused: bool) {
        if paused == self.paused {
            return;
        }
        self.paused = paused;
        let msg = if paused { Message::PauseGame } else { Message::ResumeGame };
        self.publish(msg, Params::new());
    }

    /// Current poses of every drawable entity, in registry order
    pub fn draw(&mut self) -> Vec<Pose> {
        let mut params = self.publish(Message::Draw, Params::new());
        params.take_poses(keys::POSES)
    }

    /// Spawn the player and the session bookkeeping, then start the waves
    ///
    /// Returns the player id.
    pub fn start_game(&mut self) -> Option<EntityId> {
        let player = self.spawn_player(Quat::IDENTITY);
        if player.is_none() {
            warn!("game started without a player");
        }

        let generator = self.generator.clone();
        let score = self.score.clone();
        self.registry.spawn_with(&self.bus, |_| Generator::new(generator));
        self.registry.spawn_with(&self.bus, |_| Scoreboard::new(score));

        self.publish(Message::StartGameMain, Params::new());
        info!("game started at frame {}", self.frame);
        player
    }

    pub fn end_game(&mut self) {
        self.publish(Message::EndGame, Params::new());
    }

    fn spawn(&mut self, msg: Message, params: Params) -> Option<EntityId> {
        self.publish(msg, params).get_id(keys::SPAWNED).ok()
    }

    pub fn spawn_player(&mut self, rotation: Quat) -> Option<EntityId> {
        self.spawn(Message::SpawnPlayer, Params::new().with(keys::SPAWN_ROTATE, rotation))
    }

    pub fn spawn_base(&mut self, pos: Vec3) -> Option<EntityId> {
        self.spawn(Message::SpawnBase, Params::new().with(keys::SPAWN_POS, pos))
    }

    pub fn spawn_enemy(&mut self, name: &str, pos: Vec3) -> Option<EntityId> {
        self.spawn(
            Message::SpawnEnemy,
            Params::new().with(keys::NAME, name).with(keys::SPAWN_POS, pos),
        )
    }

    pub fn spawn_item(&mut self, pos: Vec3) -> Option<EntityId> {
        self.spawn(Message::SpawnItem, Params::new().with(keys::SPAWN_POS, pos))
    }

    /// Ask the player and the scoreboard for their totals
    pub fn result(&mut self) -> GameResult {
        let params = self.publish(Message::GatherGameResult, Params::new());
        let int = |key| params.get_int(key).unwrap_or(0);
        GameResult {
            score: ScoreSummary {
                score: int(keys::SCORE),
                destroyed_enemies: int(keys::DESTROYED_ENEMIES),
                once_destroy_num: int(keys::ONCE_DESTROY_NUM),
                hit_combo: int(keys::HIT_COMBO_NUM),
                items_taken: int(keys::ITEMS_TAKEN),
                level: int(keys::LEVEL),
                play_time: params.get_float(keys::PLAY_TIME).unwrap_or(0.0),
                game_over: params.get_bool(keys::GAME_OVER).unwrap_or(false),
            },
            attacks: AttackStats {
                attacks: int(keys::ATTACK_NUM),
                hits: int(keys::ATTACK_HIT_NUM),
                combo: int(keys::ATTACK_COMBO),
                combo_max: int(keys::ATTACK_COMBO_MAX),
            },
        }
    }
}
