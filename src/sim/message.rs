//! Message ids and the param-bag keys each message carries

/// Every message the bus carries
///
/// Payload shapes live in the param bag; see [`keys`] for the names used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Message {
    /// Advance one frame (`delta_time`)
    Update,
    /// Report current poses (`poses`)
    Draw,
    /// One-time placement after construction (`planet_radius` plus spawn fields)
    SetSpawnInfo,
    SpawnBase,
    SpawnPlayer,
    SpawnEnemy,
    SpawnItem,
    /// Collect phase: append descriptors to the shared bag
    CollectObjectInfo,
    /// Interfere phase: resolve pairwise interactions from the descriptors
    MutualInterference,
    /// Sent directly by a base to each candidate: "did you ram me?"
    CheckHitBase,
    /// Player attack landed (`pos`, `angle`, `power`, `target_id`)
    TouchdownPlanet,
    /// External attack pick on the planet (`target_pos`, `target_id`)
    StartJumpAttack,
    DamagedBase,
    DestroyedBase,
    DestroyedEnemy,
    AttackHitEnemy,
    /// Sent directly to a destroyed enemy that should leave an item behind
    EnemySpawnItem,
    /// Sent directly by an item to the player
    PickUpItem,
    ItemMaxPower,
    ItemEnemyStiff,
    ItemBaseImmortal,
    ItemScoreMultiply,
    ItemMaxRange,
    GameLevelUp,
    StartGameMain,
    PauseGame,
    ResumeGame,
    EndGame,
    /// Ask the player for its rotation (`rotate`)
    PlayerRecordInfo,
    /// Force the player's rotation (`rotate`)
    PlayerPlaybackInfo,
    /// Ask for the session statistics
    GatherGameResult,
}

impl Message {
    /// Item effect messages, indexed by item type
    pub const ITEM_EFFECTS: [Message; 5] = [
        Message::ItemMaxPower,
        Message::ItemEnemyStiff,
        Message::ItemBaseImmortal,
        Message::ItemScoreMultiply,
        Message::ItemMaxRange,
    ];

    pub fn item_effect(item_type: usize) -> Option<Message> {
        Self::ITEM_EFFECTS.get(item_type).copied()
    }
}

/// Param bag keys
pub mod keys {
    pub const DELTA_TIME: &str = "delta_time";
    pub const PLANET_RADIUS: &str = "planet_radius";
    pub const POSES: &str = "poses";

    // Spawning
    pub const SPAWN_POS: &str = "spawn_pos";
    pub const SPAWN_ROTATE: &str = "spawn_rotate";
    pub const NAME: &str = "name";
    pub const SPEED: &str = "speed";
    pub const YAW: &str = "yaw";
    pub const JUMP_SPEED: &str = "jump_speed";
    pub const FORCE_STIFF: &str = "force_stiff";
    pub const FORCE_STIFF_TIME: &str = "force_stiff_time";
    /// Written back by the spawn director: id of the new entity
    pub const SPAWNED: &str = "spawned";

    // Collect phase lists
    pub const BASE_INFO: &str = "base_info";
    pub const PLAYER_INFO: &str = "player_info";
    pub const ENEMY_INFO: &str = "enemy_info";
    pub const ITEM_INFO: &str = "item_info";

    // Base contact check
    pub const VOLUME: &str = "volume";
    pub const REV_MATRIX: &str = "rev_matrix";
    pub const SCALE: &str = "scale";
    pub const POS: &str = "pos";
    pub const RADIUS: &str = "radius";
    pub const HIT_NUM: &str = "hit_num";
    pub const CONTACT: &str = "contact";

    // Base events
    pub const BASE_HP: &str = "base_hp";
    pub const BASE_ID: &str = "base_id";
    pub const BASE_HP_RATE: &str = "base_hp_rate";

    // Attacks
    pub const TARGET_POS: &str = "target_pos";
    pub const TARGET_ID: &str = "target_id";
    pub const DIST: &str = "dist";
    pub const ANGLE: &str = "angle";
    pub const POWER: &str = "power";
    pub const MAX_POWER: &str = "max_power";
    pub const HIT: &str = "hit";
    pub const DESTROY: &str = "destroy";
    pub const DESTROY_ENEMY: &str = "destroy_enemy";
    pub const HIT_COMBO: &str = "hit_combo";
    pub const SIGHT_READY: &str = "sight_ready";

    // Items
    pub const ITEM_TYPE: &str = "item_type";
    pub const EFFECT_TIME: &str = "effect_time";
    pub const GET: &str = "get";

    // Session
    pub const LEVEL: &str = "level";
    pub const ROTATE: &str = "rotate";
    pub const ATTACK_NUM: &str = "attack_num";
    pub const ATTACK_HIT_NUM: &str = "attack_hit_num";
    pub const ATTACK_COMBO: &str = "attack_combo";
    pub const ATTACK_COMBO_MAX: &str = "attack_combo_max";
    pub const PLAY_TIME: &str = "play_time";
    pub const SCORE: &str = "score";
    pub const DESTROYED_ENEMIES: &str = "destroyed_enemies";
    pub const ONCE_DESTROY_NUM: &str = "once_destroy_num";
    pub const HIT_COMBO_NUM: &str = "hit_combo_num";
    pub const ITEMS_TAKEN: &str = "items_taken";
    pub const GAME_OVER: &str = "game_over";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_effect_lookup() {
        assert_eq!(Message::item_effect(0), Some(Message::ItemMaxPower));
        assert_eq!(Message::item_effect(4), Some(Message::ItemMaxRange));
        assert_eq!(Message::item_effect(5), None);
    }
}
