//! Archetype configuration.
//!
//! Every tunable lives here with the shipped defaults. Archetype files only
//! need to name the values they change.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tactics_common::{TacticsError, TacticsResult};

use crate::boss::BossTuning;
use crate::melee_combat::HitDetection;
use crate::ranged_combat::ProjectilePrototype;

fn positive(field: &str, value: f32) -> TacticsResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TacticsError::invalid_config(field, format!("must be positive, got {value}")))
    }
}

fn non_negative(field: &str, value: f32) -> TacticsResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TacticsError::invalid_config(field, format!("must not be negative, got {value}")))
    }
}

fn check_hit_detection(field: &str, hit_detection: HitDetection) -> TacticsResult<()> {
    match hit_detection {
        HitDetection::Sweep { probe_radius } => non_negative(field, probe_radius),
        HitDetection::RangeCheck => Ok(()),
    }
}

// ============================================================================
// Player
// ============================================================================

/// Player-controlled combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Display name
    pub name: String,
    /// Maximum health
    pub max_health: f32,
    /// Damage before mitigation
    pub base_damage: f32,
    /// Armor value
    pub armor: f32,
    /// Melee reach
    pub attack_range: f32,
    /// Seconds between attacks
    pub attack_cooldown: f32,
    /// Walk speed
    pub move_speed: f32,
    /// Collision radius
    pub radius: f32,
    /// Melee hit detection
    pub hit_detection: HitDetection,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            name: "Player".to_string(),
            max_health: 100.0,
            base_damage: 20.0,
            armor: 0.0,
            attack_range: 200.0,
            attack_cooldown: 0.5,
            move_speed: 600.0,
            radius: 42.0,
            hit_detection: HitDetection::Sweep { probe_radius: 50.0 },
        }
    }
}

impl PlayerConfig {
    /// Checks the values make sense.
    pub fn validate(&self) -> TacticsResult<()> {
        positive("player.max_health", self.max_health)?;
        non_negative("player.base_damage", self.base_damage)?;
        non_negative("player.armor", self.armor)?;
        non_negative("player.attack_range", self.attack_range)?;
        non_negative("player.attack_cooldown", self.attack_cooldown)?;
        non_negative("player.move_speed", self.move_speed)?;
        non_negative("player.radius", self.radius)?;
        check_hit_detection("player.hit_detection", self.hit_detection)
    }
}

// ============================================================================
// Enemies
// ============================================================================

/// AI-controlled combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Display name
    pub name: String,
    /// Maximum health
    pub max_health: f32,
    /// Damage before mitigation
    pub base_damage: f32,
    /// Armor value
    pub armor: f32,
    /// Reach used for AI decisions and attacks
    pub attack_range: f32,
    /// Seconds between attacks
    pub attack_interval: f32,
    /// Distance at which the target is noticed
    pub detection_range: f32,
    /// Speed while chasing
    pub chase_speed: f32,
    /// Speed while patrolling
    pub patrol_speed: f32,
    /// Score granted on death
    pub score_value: u32,
    /// Experience granted on death
    pub exp_value: u32,
    /// Collision radius
    pub radius: f32,
    /// Melee hit detection
    pub hit_detection: HitDetection,
    /// Seconds a corpse stays before removal; `None` keeps it
    pub corpse_lifespan: Option<f32>,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            name: "Enemy".to_string(),
            max_health: 100.0,
            base_damage: 10.0,
            armor: 0.0,
            attack_range: 150.0,
            attack_interval: 1.5,
            detection_range: 1000.0,
            chase_speed: 400.0,
            patrol_speed: 200.0,
            score_value: 100,
            exp_value: 25,
            radius: 42.0,
            hit_detection: HitDetection::RangeCheck,
            corpse_lifespan: Some(5.0),
        }
    }
}

impl EnemyConfig {
    /// Base values for the ranged archetype.
    #[must_use]
    pub fn ranged_defaults() -> Self {
        Self {
            name: "Ranged Enemy".to_string(),
            max_health: 60.0,
            base_damage: 15.0,
            attack_range: 600.0,
            attack_interval: 2.0,
            detection_range: 1200.0,
            score_value: 150,
            exp_value: 40,
            ..Self::default()
        }
    }

    /// Base values for the boss archetype.
    #[must_use]
    pub fn boss_defaults() -> Self {
        Self {
            name: "Boss".to_string(),
            max_health: 500.0,
            base_damage: 25.0,
            attack_range: 200.0,
            attack_interval: 1.0,
            detection_range: 1500.0,
            chase_speed: 300.0,
            patrol_speed: 150.0,
            score_value: 1000,
            exp_value: 250,
            ..Self::default()
        }
    }

    /// Checks the values make sense. `section` prefixes field names in errors.
    pub fn validate_as(&self, section: &str) -> TacticsResult<()> {
        positive(&format!("{section}.max_health"), self.max_health)?;
        non_negative(&format!("{section}.base_damage"), self.base_damage)?;
        non_negative(&format!("{section}.armor"), self.armor)?;
        non_negative(&format!("{section}.attack_range"), self.attack_range)?;
        non_negative(&format!("{section}.attack_interval"), self.attack_interval)?;
        non_negative(&format!("{section}.detection_range"), self.detection_range)?;
        non_negative(&format!("{section}.chase_speed"), self.chase_speed)?;
        non_negative(&format!("{section}.patrol_speed"), self.patrol_speed)?;
        non_negative(&format!("{section}.radius"), self.radius)?;
        check_hit_detection(&format!("{section}.hit_detection"), self.hit_detection)?;
        if let Some(lifespan) = self.corpse_lifespan {
            non_negative(&format!("{section}.corpse_lifespan"), lifespan)?;
        }
        Ok(())
    }

    /// Checks the values make sense.
    pub fn validate(&self) -> TacticsResult<()> {
        self.validate_as("enemy")
    }
}

/// Enemy that shoots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangedConfig {
    /// Shared enemy values
    pub base: EnemyConfig,
    /// Projectile to fire; absent means instant damage
    pub projectile: Option<ProjectilePrototype>,
    /// Launch speed
    pub projectile_speed: f32,
    /// Spawn offset in the shooter's frame
    pub spawn_offset: Vec2,
}

impl Default for RangedConfig {
    fn default() -> Self {
        Self {
            base: EnemyConfig::ranged_defaults(),
            projectile: None,
            projectile_speed: 1000.0,
            spawn_offset: Vec2::new(50.0, 0.0),
        }
    }
}

impl RangedConfig {
    /// Checks the values make sense.
    pub fn validate(&self) -> TacticsResult<()> {
        self.base.validate_as("ranged.base")?;
        positive("ranged.projectile_speed", self.projectile_speed)?;
        if let Some(projectile) = &self.projectile {
            non_negative("ranged.projectile.radius", projectile.radius)?;
            positive("ranged.projectile.lifetime", projectile.lifetime)?;
        }
        Ok(())
    }
}

/// Enemy with phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    /// Shared enemy values
    pub base: EnemyConfig,
    /// Phase and enrage tunables
    pub tuning: BossTuning,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            base: EnemyConfig::boss_defaults(),
            tuning: BossTuning::default(),
        }
    }
}

impl BossConfig {
    /// Checks the values make sense.
    pub fn validate(&self) -> TacticsResult<()> {
        self.base.validate_as("boss.base")?;
        let t = &self.tuning;
        let (p2, p3) = (t.thresholds.phase2, t.thresholds.phase3);
        if !(0.0..=1.0).contains(&p2) || !(0.0..=1.0).contains(&p3) || p3 > p2 {
            return Err(TacticsError::invalid_config(
                "boss.tuning.thresholds",
                format!("need 0 <= phase3 <= phase2 <= 1, got phase2={p2} phase3={p3}"),
            ));
        }
        positive("boss.tuning.enrage_speed_multiplier", t.enrage_speed_multiplier)?;
        positive("boss.tuning.enrage_damage_multiplier", t.enrage_damage_multiplier)?;
        non_negative("boss.tuning.special_attack_cooldown", t.special_attack_cooldown)?;
        non_negative("boss.tuning.special_damage_multiplier", t.special_damage_multiplier)?;
        non_negative("boss.tuning.special_range_multiplier", t.special_range_multiplier)
    }
}

// ============================================================================
// Arena
// ============================================================================

/// World-wide timing and presentation tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Delay between an enemy spawning and its target lookup
    pub target_resolve_delay: f32,
    /// Delay before orient-to-movement returns after an attack snap
    pub orient_restore_delay: f32,
    /// Lifetime of the post-attack trail effect
    pub attack_trail_duration: f32,
    /// Smoothed turn interpolation speed
    pub turn_rate: f32,
    /// Presentation event buffer size
    pub event_capacity: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            target_resolve_delay: 0.5,
            orient_restore_delay: 0.2,
            attack_trail_duration: 2.0,
            turn_rate: 10.0,
            event_capacity: 1024,
        }
    }
}

impl ArenaConfig {
    /// Checks the values make sense.
    pub fn validate(&self) -> TacticsResult<()> {
        non_negative("arena.target_resolve_delay", self.target_resolve_delay)?;
        non_negative("arena.orient_restore_delay", self.orient_restore_delay)?;
        non_negative("arena.attack_trail_duration", self.attack_trail_duration)?;
        non_negative("arena.turn_rate", self.turn_rate)?;
        if self.event_capacity == 0 {
            return Err(TacticsError::invalid_config("arena.event_capacity", "must be at least 1"));
        }
        Ok(())
    }
}

/// Every archetype in one place.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Archetypes {
    /// Player archetype
    pub player: PlayerConfig,
    /// Melee enemy archetype
    pub enemy: EnemyConfig,
    /// Ranged enemy archetype
    pub ranged: RangedConfig,
    /// Boss archetype
    pub boss: BossConfig,
    /// Arena tunables
    pub arena: ArenaConfig,
}

impl Archetypes {
    /// Validates every section.
    pub fn validate(&self) -> TacticsResult<()> {
        self.player.validate()?;
        self.enemy.validate()?;
        self.ranged.validate()?;
        self.boss.validate()?;
        self.arena.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Archetypes::default().validate().is_ok());
    }

    #[test]
    fn test_archetype_defaults() {
        let archetypes = Archetypes::default();
        assert_eq!(archetypes.ranged.base.max_health, 60.0);
        assert_eq!(archetypes.ranged.base.attack_range, 600.0);
        assert_eq!(archetypes.boss.base.max_health, 500.0);
        assert_eq!(archetypes.boss.tuning.thresholds.phase2, 0.6);
        assert_eq!(archetypes.enemy.hit_detection, HitDetection::RangeCheck);
        assert_eq!(
            archetypes.player.hit_detection,
            HitDetection::Sweep { probe_radius: 50.0 }
        );
    }

    #[test]
    fn test_negative_health_rejected() {
        let mut config = EnemyConfig::default();
        config.max_health = -1.0;
        let err = config.validate().expect_err("should fail");
        assert!(err.to_string().contains("enemy.max_health"));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = BossConfig::default();
        config.tuning.thresholds.phase3 = 0.8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_projectile_lifetime_must_be_positive() {
        let mut config = RangedConfig::default();
        config.projectile = Some(ProjectilePrototype {
            lifetime: 0.0,
            ..ProjectilePrototype::default()
        });
        assert!(config.validate().is_err());
    }
}
