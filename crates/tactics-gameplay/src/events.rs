//! Presentation events.
//!
//! Combat publishes fire-and-forget notifications for UI, VFX and audio
//! collaborators. Nothing in the simulation reads them back.

use crossbeam_channel::{bounded, Receiver, Sender};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use tactics_common::EntityId;

use crate::boss::BossPhase;
use crate::combat::Reward;

/// How an attack was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    /// Close-range strike
    Melee,
    /// Projectile or instant ranged shot
    Ranged,
    /// Boss area attack
    Special,
}

/// Event types that can be sent through the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// An attack was committed (animation/trail cue)
    AttackPerformed {
        /// Attacking entity
        attacker: EntityId,
        /// Delivery kind
        kind: AttackKind,
        /// Attacker position
        location: Vec2,
        /// Committed facing
        direction: Vec2,
        /// Animation variant, 1..=3
        variant: u8,
    },
    /// Damage landed on a target
    HitLanded {
        /// Damage source, if any
        attacker: Option<EntityId>,
        /// Damaged entity
        target: EntityId,
        /// HP removed
        damage: f32,
        /// Target position
        location: Vec2,
    },
    /// A projectile entered the world
    ProjectileSpawned {
        /// Shooter
        owner: EntityId,
        /// Projectile entity
        projectile: EntityId,
        /// Spawn position
        location: Vec2,
        /// Initial velocity
        velocity: Vec2,
    },
    /// Boss performed its special attack
    SpecialAttack {
        /// Boss entity
        boss: EntityId,
        /// Phase at the time of the attack
        phase: BossPhase,
        /// Boss position
        location: Vec2,
    },
    /// Boss moved to a new phase
    PhaseChanged {
        /// Boss entity
        boss: EntityId,
        /// Previous phase
        from: BossPhase,
        /// New phase
        to: BossPhase,
    },
    /// Boss became enraged
    Enraged {
        /// Boss entity
        boss: EntityId,
    },
    /// Entity died
    Died {
        /// Dead entity
        entity: EntityId,
        /// Source of the killing blow, if known
        killer: Option<EntityId>,
        /// Where it died
        location: Vec2,
        /// Score and experience granted
        reward: Reward,
    },
    /// Post-attack trail effect ended
    TrailEnded {
        /// Entity whose trail ended
        entity: EntityId,
    },
    /// Entity was healed
    Healed {
        /// Healed entity
        entity: EntityId,
        /// HP restored
        amount: f32,
    },
    /// An enemy acquired its tracked target
    TargetAcquired {
        /// Enemy entity
        seeker: EntityId,
        /// Tracked target
        target: EntityId,
    },
    /// Entity or projectile left the world
    Despawned {
        /// Removed entity
        entity: EntityId,
    },
}

/// Event bus for broadcasting events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<CombatEvent>,
    /// Receiver for collecting events
    receiver: Receiver<CombatEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            capacity: capacity.max(1),
        }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: CombatEvent) {
        // Non-blocking send - if full, event is dropped
        if self.sender.try_send(event).is_err() {
            tracing::trace!("event bus full, dropping event");
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<CombatEvent> {
        self.sender.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_drain_in_order() {
        let bus = EventBus::new(8);
        bus.publish(CombatEvent::Enraged {
            boss: EntityId::from_raw(1),
        });
        bus.publish(CombatEvent::TrailEnded {
            entity: EntityId::from_raw(2),
        });
        assert_eq!(bus.pending_count(), 2);

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], CombatEvent::Enraged { .. }));
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_event_bus_drops_when_full() {
        let bus = EventBus::new(1);
        let sender = bus.sender();
        sender
            .try_send(CombatEvent::Despawned {
                entity: EntityId::from_raw(1),
            })
            .expect("first send fits");
        bus.publish(CombatEvent::Despawned {
            entity: EntityId::from_raw(2),
        });
        assert_eq!(bus.drain().len(), 1);
    }

    #[test]
    fn test_event_serializes_to_json() {
        let event = CombatEvent::Died {
            entity: EntityId::from_raw(5),
            killer: None,
            location: Vec2::new(1.0, 2.0),
            reward: Reward::new(100, 25),
        };
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("Died"));
        let back: CombatEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, event);
    }
}
