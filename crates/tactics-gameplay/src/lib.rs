//! # Tactics Gameplay
//!
//! Real-time combat and enemy AI for Project Tactics.
//!
//! This crate provides the CPU-side combat simulation:
//! - Combat entities (hit points, damage formula, cooldowns)
//! - Melee attack resolution with swept-volume hit detection
//! - Enemy perception/pursuit/attack AI
//! - Ranged attacks with projectile or instant fallback
//! - Boss phases, enrage and special attack
//! - Arena entity table, deferred tasks and presentation events

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod arena;
pub mod body;
pub mod boss;
pub mod collision;
pub mod combat;
pub mod config;
pub mod events;
pub mod melee_combat;
pub mod perception;
pub mod ranged_combat;
pub mod scheduler;
pub mod world;


/// Prelude for convenient imports
pub mod prelude {
    pub use crate::arena::*;
    pub use crate::body::*;
    pub use crate::boss::*;
    pub use crate::collision::*;
    pub use crate::combat::*;
    pub use crate::config::*;
    pub use crate::events::*;
    pub use crate::melee_combat::*;
    pub use crate::perception::*;
    pub use crate::ranged_combat::*;
    pub use crate::scheduler::*;
    pub use crate::world::*;
}

pub use prelude::*;
