//! Cloneable façade for issuing commands to one region.
//!
//! [`RegionHandle`] hides channel plumbing and offers async helpers for the
//! skill lifecycle, spawning, and streaming events from specific topics.
use tokio::sync::{broadcast, mpsc, oneshot};

use skill_core::skill::PrepareOutcome;
use skill_core::{Combatant, EntityId, Region, RegionId, SkillId, UseReport};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with a region
#[derive(Clone)]
pub struct RegionHandle {
    region: RegionId,
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RegionHandle {
    pub(crate) fn new(
        region: RegionId,
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            region,
            command_tx,
            event_bus,
        }
    }

    pub fn region(&self) -> RegionId {
        self.region
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Place a combatant in the region
    pub async fn spawn(&self, combatant: Combatant) -> Result<EntityId> {
        self.request(|reply| Command::Spawn {
            combatant: Box::new(combatant),
            reply,
        })
        .await?
    }

    /// Remove a combatant; any cast it had in flight is dropped
    pub async fn despawn(&self, entity: EntityId) -> Result<Combatant> {
        self.request(|reply| Command::Despawn { entity, reply })
            .await?
    }

    /// Ready a skill (Idle → Ready)
    pub async fn prepare(&self, caster: EntityId, skill: SkillId) -> Result<PrepareOutcome> {
        self.request(|reply| Command::Prepare {
            caster,
            skill,
            reply,
        })
        .await?
    }

    /// Use a readied skill
    pub async fn use_skill(&self, caster: EntityId, skill: SkillId) -> Result<UseReport> {
        self.request(|reply| Command::Use {
            caster,
            skill,
            reply,
        })
        .await?
    }

    /// Finish a skill left Active after use
    pub async fn complete(&self, caster: EntityId, skill: SkillId) -> Result<()> {
        self.request(|reply| Command::Complete {
            caster,
            skill,
            reply,
        })
        .await?
    }

    /// Abort a cast in any non-terminal state
    pub async fn cancel(&self, caster: EntityId, skill: SkillId) -> Result<()> {
        self.request(|reply| Command::Cancel {
            caster,
            skill,
            reply,
        })
        .await?
    }

    /// Query one combatant (read-only snapshot)
    pub async fn combatant(&self, entity: EntityId) -> Result<Option<Combatant>> {
        self.request(|reply| Command::QueryCombatant { entity, reply })
            .await
    }

    /// Query the whole region (read-only snapshot)
    pub async fn snapshot(&self) -> Result<Region> {
        self.request(|reply| Command::QueryRegion { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Combat` - Published combat action packs
    /// - `Topic::Notification` - Effects, skill notices and cast failures
    /// - `Topic::Progression` - Combat outcomes and training grants
    ///
    /// Events of every region share the bus; filter on the `region` field.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
