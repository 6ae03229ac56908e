//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (owned by the world, threaded through `Context`)
//! - Stable iteration order (subscription order, compaction keeps order)
//! - No rendering or platform dependencies

pub mod behavior;
pub mod bus;
pub mod entity;
pub mod geometry;
pub mod message;
pub mod objects;
pub mod params;
pub mod record;
pub mod spawn;
pub mod transform;
pub mod world;

pub use behavior::{Action, Behavior, BehaviorFactory};
pub use bus::{MessageBus, Subscription};
pub use entity::{Context, Entity, EntityHandle, EntityId};
pub use geometry::{Aabb, Box2D, Plane, RayHit, Sphere};
pub use message::{Message, keys};
pub use params::{Descriptor, DescriptorKind, ParamError, Params, Pose, Value};
pub use record::{CameraSample, InputRecord, PickSample, Playback, RecordError, Recorder, SimulationResult, simulate};
pub use spawn::SpawnDirector;
pub use transform::{JumpArc, JumpSample, Slerp, SphereTransform};
pub use world::{AttackPick, GameResult, Registry, TickInput, World, WorldError};
