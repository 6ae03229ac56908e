//! Entity construction for the SPAWN_* requests
//!
//! The director is the bus's first subscriber. It builds the requested
//! object from its tuning section, registers it, and immediately sends it
//! `SetSpawnInfo` with the request's fields plus `planet_radius`. The new
//! id is written back into the request bag under `spawned`.

use std::collections::BTreeMap;
use std::rc::Rc;

use log::{debug, error};

use super::behavior::BehaviorFactory;
use super::entity::{Context, Entity, EntityHandle, EntityId};
use super::message::{Message, keys};
use super::objects::{Base, Enemy, Item, Player};
use super::params::Params;
use super::world::{Registry, WorldError};
use crate::resources::{ResourceCache, ResourceError};
use crate::tuning::{BaseTuning, ConfigError, EnemyTuning, ItemTuning, PlayerTuning, Tuning, WorldTuning};

pub struct SpawnDirector {
    registry: Rc<Registry>,
    resources: ResourceCache,
    behaviors: Rc<BehaviorFactory>,
    world: WorldTuning,
    base: BaseTuning,
    player: PlayerTuning,
    item: ItemTuning,
    enemies: BTreeMap<String, EnemyTuning>,
}

impl SpawnDirector {
    /// Parses every spawnable section up front so a bad document fails here
    /// rather than on the first spawn
    pub fn new(
        registry: Rc<Registry>,
        resources: ResourceCache,
        behaviors: Rc<BehaviorFactory>,
        tuning: &Tuning,
    ) -> Result<Self, WorldError> {
        let enemies = tuning
            .enemy_names()
            .into_iter()
            .map(|name| tuning.enemy(&name).map(|enemy| (name, enemy)))
            .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;

        let director = Self {
            registry,
            resources,
            behaviors,
            world: tuning.world()?,
            base: tuning.base()?,
            player: tuning.player()?,
            item: tuning.item()?,
            enemies,
        };
        director.validate()?;
        Ok(director)
    }

    fn validate(&self) -> Result<(), WorldError> {
        positive("world.planet_radius", self.world.planet_radius)?;
        positive("world.contact_scale", self.world.contact_scale)?;
        positive("base.radius", self.base.radius)?;
        positive("player.radius", self.player.radius)?;
        positive("item.radius", self.item.radius)?;
        for (name, enemy) in &self.enemies {
            let [lo, hi] = enemy.radius;
            positive(&format!("enemies.{name}.radius"), lo)?;
            if hi < lo {
                return Err(not_a(&format!("enemies.{name}.radius"), "an ascending [lo, hi] range").into());
            }
        }

        let fixed = [&self.base.resource, &self.player.resource, &self.item.resource];
        let enemies = self.enemies.values().map(|enemy| &enemy.resource);
        if let Some(unknown) = fixed.into_iter().chain(enemies).find(|name| !self.resources.contains(name)) {
            return Err(ResourceError::Unknown(unknown.clone()).into());
        }

        for (name, enemy) in &self.enemies {
            if !self.behaviors.contains(&enemy.behavior) {
                return Err(ConfigError::Missing(format!("behavior `{}` for enemy `{name}`", enemy.behavior)).into());
            }
        }
        Ok(())
    }

    fn spawn(&self, msg: Message, params: &mut Params, ctx: &mut Context<'_>) {
        let spawned = match msg {
            Message::SpawnBase => self.spawn_base(ctx),
            Message::SpawnPlayer => self.spawn_player(ctx),
            Message::SpawnEnemy => self.spawn_enemy(params, ctx),
            Message::SpawnItem => self.spawn_item(ctx),
            _ => return,
        };
        let (id, handle) = match spawned {
            Ok(spawned) => spawned,
            Err(e) => {
                error!("{msg:?} failed: {e}");
                return;
            }
        };

        let mut info = params.clone();
        info.insert(keys::PLANET_RADIUS, self.world.planet_radius);
        handle.send(Message::SetSpawnInfo, &mut info, ctx);
        params.insert(keys::SPAWNED, id);
        debug!("{msg:?}: {handle:?} {id} at frame {}", ctx.frame);
    }

    fn spawn_base(&self, ctx: &mut Context<'_>) -> Result<(EntityId, EntityHandle), WorldError> {
        let model = self.resources.acquire(&self.base.resource)?;
        let tuning = self.base.clone();
        let (id, base) = self.registry.spawn_with(ctx.bus, |id| Base::new(id, tuning, model));
        Ok((id, base.into()))
    }

    fn spawn_player(&self, ctx: &mut Context<'_>) -> Result<(EntityId, EntityHandle), WorldError> {
        let model = self.resources.acquire(&self.player.resource)?;
        let tuning = self.player.clone();
        let contact = self.world.contact_scale;
        let (id, player) = self
            .registry
            .spawn_with(ctx.bus, |id| Player::new(id, tuning, contact, model));
        Ok((id, player.into()))
    }

    fn spawn_enemy(&self, params: &Params, ctx: &mut Context<'_>) -> Result<(EntityId, EntityHandle), WorldError> {
        let name = params.text(keys::NAME);
        let tuning = self
            .enemies
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::Missing(format!("enemies.{name}")))?;
        let model = self.resources.acquire(&tuning.resource)?;
        let behavior = self.behaviors.create(&tuning.behavior, &tuning.behavior_params, ctx.rng);
        let contact = self.world.contact_scale;

        let bus = ctx.bus;
        let rng = &mut *ctx.rng;
        let (id, enemy) = self
            .registry
            .spawn_with(bus, |id| Enemy::new(id, name, tuning, behavior, contact, model, rng));
        Ok((id, enemy.into()))
    }

    fn spawn_item(&self, ctx: &mut Context<'_>) -> Result<(EntityId, EntityHandle), WorldError> {
        let model = self.resources.acquire(&self.item.resource)?;
        let tuning = self.item.clone();
        let contact = self.world.contact_scale;

        let bus = ctx.bus;
        let rng = &mut *ctx.rng;
        let (id, item) = self
            .registry
            .spawn_with(bus, |id| Item::new(id, tuning, contact, model, rng));
        Ok((id, item.into()))
    }
}

/// Sizes feed scale matrices that get inverted, so zero is as bad as negative
fn positive(path: &str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(not_a(path, "a positive number"))
    }
}

fn not_a(path: &str, expected: &'static str) -> ConfigError {
    ConfigError::WrongType {
        path: path.to_owned(),
        expected,
    }
}

impl Entity for SpawnDirector {
    fn is_active(&self) -> bool {
        true
    }

    fn kind(&self) -> &'static str {
        "spawn_director"
    }

    fn handle_message(&mut self, msg: Message, params: &mut Params, ctx: &mut Context<'_>) {
        if matches!(
            msg,
            Message::SpawnBase | Message::SpawnPlayer | Message::SpawnEnemy | Message::SpawnItem
        ) {
            self.spawn(msg, params, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::bus::MessageBus;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::cell::RefCell;

    struct Rig {
        bus: MessageBus,
        rng: Pcg32,
        registry: Rc<Registry>,
        resources: ResourceCache,
        _director: Rc<RefCell<SpawnDirector>>,
    }

    impl Rig {
        fn new() -> Self {
            let tuning = Tuning::default();
            let registry = Rc::new(Registry::new());
            let resources = ResourceCache::from_tuning(&tuning).expect("resources");
            let director = SpawnDirector::new(
                registry.clone(),
                resources.clone(),
                Rc::new(BehaviorFactory::default()),
                &tuning,
            )
            .expect("default tuning");
            let bus = MessageBus::new();
            let director = Rc::new(RefCell::new(director));
            bus.subscribe(&EntityHandle::from(director.clone()));
            Self {
                bus,
                rng: Pcg32::seed_from_u64(5),
                registry,
                resources,
                _director: director,
            }
        }

        fn publish(&mut self, msg: Message, mut params: Params) -> Params {
            let mut ctx = Context::new(&self.bus, &mut self.rng, 0);
            self.bus.publish(msg, &mut params, &mut ctx);
            params
        }
    }

    #[test]
    fn test_spawn_registers_and_subscribes() {
        let mut rig = Rig::new();
        let out = rig.publish(Message::SpawnBase, Params::new().with(keys::SPAWN_POS, Vec3::X));
        let id = out.id(keys::SPAWNED);
        assert_eq!(rig.registry.ids(), [id]);
        assert_eq!(rig.bus.len(), 2);
        assert!(rig.resources.is_loaded("cube_base"));

        let out = rig.publish(
            Message::SpawnEnemy,
            Params::new()
                .with(keys::NAME, "cube_hopper")
                .with(keys::SPAWN_POS, Vec3::Z),
        );
        assert_ne!(out.id(keys::SPAWNED), id);
        assert_eq!(rig.registry.len(), 2);
    }

    #[test]
    fn test_models_are_shared_and_released() {
        let mut rig = Rig::new();
        for _ in 0..3 {
            rig.publish(Message::SpawnItem, Params::new().with(keys::SPAWN_POS, Vec3::Y));
        }
        assert_eq!(rig.registry.len(), 3);
        assert_eq!(rig.resources.load_count(), 1);

        rig.publish(Message::EndGame, Params::new());
        assert_eq!(rig.registry.compact(&rig.bus), 3);
        assert!(!rig.resources.is_loaded("cube_item"));
    }

    #[test]
    fn test_unknown_enemy_is_reported_not_spawned() {
        let mut rig = Rig::new();
        let out = rig.publish(
            Message::SpawnEnemy,
            Params::new()
                .with(keys::NAME, "cube_giant")
                .with(keys::SPAWN_POS, Vec3::Z),
        );
        assert!(!out.contains(keys::SPAWNED));
        assert!(rig.registry.is_empty());
    }
}
