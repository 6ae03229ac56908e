//! Param bag passed by reference through one broadcast
//!
//! Values are a closed union of the payload shapes messages actually carry.
//! Discipline is convention based: a recipient writes only its own keys and
//! appends to the shared descriptor/pose lists.
//!
//! A missing or mistyped key is a programmer error. The `get_*` lookups
//! report it as a [`ParamError`]; the plain accessors (`float`, `vec3`, ...)
//! panic with that error at the point of lookup.

use std::collections::BTreeMap;

use glam::{Affine3A, Quat, Vec3};
use serde::Serialize;
use thiserror::Error;

use super::entity::{EntityHandle, EntityId};
use super::geometry::Aabb;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("missing param `{key}`")]
    Missing { key: &'static str },
    #[error("param `{key}` holds {found}, expected {expected}")]
    Mismatch {
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

/// Per-kind descriptor data
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DescriptorKind {
    Base { hp: i32, hp_max: i32, scale: f32 },
    Player,
    Enemy,
    Item,
}

/// Snapshot of one entity, produced during the collect phase
///
/// Lives only as long as the bag it was pushed into.
#[derive(Debug, Clone)]
pub struct Descriptor {
    /// For direct messages (hit checks, pickups)
    pub entity: EntityHandle,
    pub id: EntityId,
    pub kind: DescriptorKind,
    /// Unit surface normal
    pub position: Vec3,
    pub facing: Vec3,
    pub rotation: Quat,
    pub radius: f32,
    /// Takes part in separation
    pub collision: bool,
    pub jumping: bool,
}

/// What an entity reports for drawing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pose {
    pub id: EntityId,
    pub kind: &'static str,
    pub rotation: Quat,
    /// Offset above the surface along local up
    pub height: f32,
    pub model: Affine3A,
}

/// Dynamically shaped value stored in a [`Params`] bag
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    Id(EntityId),
    Text(String),
    Vec3(Vec3),
    Quat(Quat),
    Matrix(Affine3A),
    Aabb(Aabb),
    Entity(EntityHandle),
    Descriptors(Vec<Descriptor>),
    Poses(Vec<Pose>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Id(_) => "id",
            Value::Text(_) => "text",
            Value::Vec3(_) => "vec3",
            Value::Quat(_) => "quat",
            Value::Matrix(_) => "matrix",
            Value::Aabb(_) => "aabb",
            Value::Entity(_) => "entity",
            Value::Descriptors(_) => "descriptors",
            Value::Poses(_) => "poses",
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        })*
    };
}

value_from! {
    bool => Bool,
    i32 => Int,
    f32 => Float,
    EntityId => Id,
    String => Text,
    Vec3 => Vec3,
    Quat => Quat,
    Affine3A => Matrix,
    Aabb => Aabb,
    EntityHandle => Entity,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

/// Mutable heterogeneous key-value bag
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: BTreeMap<&'static str, Value>,
}

/// Generates a fallible `get_*` lookup and its fail-fast twin
macro_rules! typed_getters {
    ($($get:ident, $fast:ident, $variant:ident, $name:literal => $ty:ty;)*) => {
        $(
            pub fn $get(&self, key: &'static str) -> Result<$ty, ParamError> {
                match self.values.get(key) {
                    Some(Value::$variant(v)) => Ok(*v),
                    Some(other) => Err(ParamError::Mismatch {
                        key,
                        expected: $name,
                        found: other.type_name(),
                    }),
                    None => Err(ParamError::Missing { key }),
                }
            }

            #[track_caller]
            pub fn $fast(&self, key: &'static str) -> $ty {
                self.$get(key).unwrap_or_else(|e| panic!("{e}"))
            }
        )*
    };
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    pub fn insert(&mut self, key: &'static str, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key, value.into())
    }

    pub fn remove(&mut self, key: &'static str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &'static str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &'static str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Insert `delta`, or add it to the integer already stored under `key`
    ///
    /// Shared counters (hit counts) are built with this.
    pub fn add_int(&mut self, key: &'static str, delta: i32) {
        match self.values.get_mut(key) {
            Some(Value::Int(v)) => *v += delta,
            _ => {
                self.values.insert(key, Value::Int(delta));
            }
        }
    }

    /// Append to the descriptor list under `key`, creating it if needed
    pub fn push_descriptor(&mut self, key: &'static str, descriptor: Descriptor) {
        match self.values.get_mut(key) {
            Some(Value::Descriptors(list)) => list.push(descriptor),
            _ => {
                self.values.insert(key, Value::Descriptors(vec![descriptor]));
            }
        }
    }

    /// Descriptor list under `key`, `None` if nobody appended this frame
    ///
    /// # Panics
    /// If `key` holds something other than a descriptor list.
    #[track_caller]
    pub fn descriptors(&self, key: &'static str) -> Option<&[Descriptor]> {
        match self.values.get(key) {
            Some(Value::Descriptors(list)) => Some(list.as_slice()),
            Some(other) => panic!(
                "{}",
                ParamError::Mismatch {
                    key,
                    expected: "descriptors",
                    found: other.type_name(),
                }
            ),
            None => None,
        }
    }

    pub fn push_pose(&mut self, key: &'static str, pose: Pose) {
        match self.values.get_mut(key) {
            Some(Value::Poses(list)) => list.push(pose),
            _ => {
                self.values.insert(key, Value::Poses(vec![pose]));
            }
        }
    }

    /// Take the pose list out of the bag
    pub fn take_poses(&mut self, key: &'static str) -> Vec<Pose> {
        match self.values.remove(key) {
            Some(Value::Poses(list)) => list,
            _ => Vec::new(),
        }
    }

    typed_getters! {
        get_bool, flag, Bool, "bool" => bool;
        get_int, int, Int, "int" => i32;
        get_float, float, Float, "float" => f32;
        get_id, id, Id, "id" => EntityId;
        get_vec3, vec3, Vec3, "vec3" => Vec3;
        get_quat, quat, Quat, "quat" => Quat;
        get_matrix, matrix, Matrix, "matrix" => Affine3A;
        get_aabb, aabb, Aabb, "aabb" => Aabb;
    }

    pub fn get_text(&self, key: &'static str) -> Result<&str, ParamError> {
        match self.values.get(key) {
            Some(Value::Text(v)) => Ok(v),
            Some(other) => Err(ParamError::Mismatch {
                key,
                expected: "text",
                found: other.type_name(),
            }),
            None => Err(ParamError::Missing { key }),
        }
    }

    #[track_caller]
    pub fn text(&self, key: &'static str) -> &str {
        self.get_text(key).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn get_entity(&self, key: &'static str) -> Result<&EntityHandle, ParamError> {
        match self.values.get(key) {
            Some(Value::Entity(v)) => Ok(v),
            Some(other) => Err(ParamError::Mismatch {
                key,
                expected: "entity",
                found: other.type_name(),
            }),
            None => Err(ParamError::Missing { key }),
        }
    }
}
