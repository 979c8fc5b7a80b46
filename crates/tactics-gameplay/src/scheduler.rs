//! Deferred one-shot tasks.
//!
//! Tasks are keyed by the entity that owns them and run against the
//! simulation clock. The scheduler never touches entities itself: it hands
//! due tasks back to the caller, which must re-check that the owner still
//! exists before acting.

use serde::{Deserialize, Serialize};
use tactics_common::{EntityId, TaskId};

/// Work that runs after a delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeferredTask {
    /// Put orient-to-movement back after an attack snap
    RestoreOrientation {
        /// Value saved when the snap suspended it
        orient: bool,
    },
    /// Switch off the post-attack trail effect
    EndAttackTrail,
    /// Remove a dead entity from the world
    RemoveCorpse,
    /// Look up the tracked opponent for a freshly spawned enemy
    ResolveTarget,
}

/// A task whose delay has elapsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DueTask {
    /// Handle the task was scheduled under
    pub id: TaskId,
    /// Owning entity
    pub owner: EntityId,
    /// The task
    pub task: DeferredTask,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    id: TaskId,
    owner: EntityId,
    due_at: f64,
    task: DeferredTask,
}

/// One-shot task scheduler driven by the tick clock.
#[derive(Debug, Default)]
pub struct Scheduler {
    clock: f64,
    next_id: u64,
    pending: Vec<Pending>,
}

impl Scheduler {
    /// Creates an empty scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulation time in seconds.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.clock
    }

    /// Number of tasks waiting to fire.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of tasks waiting for `owner`.
    #[must_use]
    pub fn pending_for(&self, owner: EntityId) -> usize {
        self.pending.iter().filter(|p| p.owner == owner).count()
    }

    /// Schedules `task` to fire `delay` seconds from now.
    pub fn schedule(&mut self, owner: EntityId, delay: f32, task: DeferredTask) -> TaskId {
        self.next_id += 1;
        let id = TaskId::new(self.next_id);
        self.pending.push(Pending {
            id,
            owner,
            due_at: self.clock + f64::from(delay.max(0.0)),
            task,
        });
        id
    }

    /// Cancels a single task. Returns false if it already fired or never existed.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Cancels every task owned by `owner`. Returns how many were dropped.
    pub fn cancel_owner(&mut self, owner: EntityId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| p.owner != owner);
        before - self.pending.len()
    }

    /// Advances the clock and returns tasks that came due, earliest first.
    ///
    /// Tasks due at the same instant fire in scheduling order.
    pub fn advance(&mut self, dt: f32) -> Vec<DueTask> {
        self.clock += f64::from(dt.max(0.0));
        let clock = self.clock;
        let (mut due, waiting): (Vec<Pending>, Vec<Pending>) =
            self.pending.drain(..).partition(|p| p.due_at <= clock);
        self.pending = waiting;
        due.sort_by(|a, b| a.due_at.total_cmp(&b.due_at).then(a.id.cmp(&b.id)));
        due.into_iter()
            .map(|p| DueTask {
                id: p.id,
                owner: p.owner,
                task: p.task,
            })
            .collect()
    }
}
