//! Region worker that owns the authoritative [`skill_core::Region`].
//!
//! Receives commands from [`RegionHandle`](crate::RegionHandle), runs them
//! through the [`SkillEngine`] and publishes everything to the EventBus. The
//! region's training subscribers read combat outcomes back off the bus after
//! every request. Every cast in a region is serialized through this one task.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use skill_core::error::ErrorContext;
use skill_core::skill::PrepareOutcome;
use skill_core::{
    CastError, CastRequest, CastSinks, Combatant, EntityId, GameError, Millis, Region,
    RegionError, SkillEngine, SkillId, TrainingObserver, UseReport,
};

use super::training::TrainingSubscriber;
use crate::api::Result;
use crate::events::{BusSink, Event, EventBus, NotificationEvent, ProgressionNotice};
use crate::oracle::{GridSpatialIndex, OracleManager};
use crate::runtime::RuntimeConfig;

/// Commands that can be sent to a region worker
pub enum Command {
    Spawn {
        combatant: Box<Combatant>,
        reply: oneshot::Sender<Result<EntityId>>,
    },
    /// Removes a combatant, dropping any cast it had in flight.
    Despawn {
        entity: EntityId,
        reply: oneshot::Sender<Result<Combatant>>,
    },
    Prepare {
        caster: EntityId,
        skill: SkillId,
        reply: oneshot::Sender<Result<PrepareOutcome>>,
    },
    Use {
        caster: EntityId,
        skill: SkillId,
        reply: oneshot::Sender<Result<UseReport>>,
    },
    Complete {
        caster: EntityId,
        skill: SkillId,
        reply: oneshot::Sender<Result<()>>,
    },
    Cancel {
        caster: EntityId,
        skill: SkillId,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Query one combatant (read-only snapshot).
    QueryCombatant {
        entity: EntityId,
        reply: oneshot::Sender<Option<Combatant>>,
    },
    /// Query the whole region (read-only snapshot).
    QueryRegion { reply: oneshot::Sender<Region> },
}

/// Background task that processes the commands of one region.
pub struct RegionWorker {
    region: Region,
    engine: SkillEngine,
    oracles: OracleManager,
    spatial: GridSpatialIndex,
    trainers: Vec<TrainingSubscriber>,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    tick_interval: Duration,
    started: Instant,
}

impl RegionWorker {
    pub fn new(
        region: Region,
        oracles: OracleManager,
        config: &RuntimeConfig,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
    ) -> Self {
        let registry = oracles.registry().clone();
        let trainers = registry
            .descriptors()
            .filter(|descriptor| !descriptor.training.tiers().is_empty())
            .map(|descriptor| {
                let observer = TrainingObserver::new(descriptor.id, descriptor.training.clone());
                TrainingSubscriber::new(observer, region.id, &event_bus)
            })
            .collect::<Vec<_>>();

        info!(
            region = ?region.id,
            combatants = region.len(),
            skills = registry.len(),
            trainers = trainers.len(),
            "RegionWorker initialized"
        );

        Self {
            engine: SkillEngine::new(registry, config.combat.clone()),
            region,
            oracles,
            spatial: GridSpatialIndex::new(config.spatial_cell_size),
            trainers,
            command_rx,
            event_bus,
            tick_interval: config.tick_interval,
            started: Instant::now(),
        }
    }

    /// Main worker loop. Ends when every handle to the region is dropped.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                _ = ticker.tick() => self.tick(),
            }
        }

        debug!(region = ?self.region.id, "RegionWorker stopped");
    }

    fn now(&self) -> Millis {
        Millis(u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX))
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Spawn { combatant, reply } => {
                let result = self.region.spawn(*combatant).map_err(Into::into);
                if reply.send(result).is_err() {
                    debug!("Spawn reply channel closed (caller dropped)");
                }
            }
            Command::Despawn { entity, reply } => {
                let result = self.despawn(entity);
                if reply.send(result).is_err() {
                    debug!("Despawn reply channel closed (caller dropped)");
                }
            }
            Command::Prepare {
                caster,
                skill,
                reply,
            } => {
                let result = self.prepare(caster, skill);
                if reply.send(result).is_err() {
                    debug!("Prepare reply channel closed (caller dropped)");
                }
            }
            Command::Use {
                caster,
                skill,
                reply,
            } => {
                let result = self.use_skill(caster, skill);
                if reply.send(result).is_err() {
                    debug!("Use reply channel closed (caller dropped)");
                }
            }
            Command::Complete {
                caster,
                skill,
                reply,
            } => {
                let result = self.complete(caster, skill);
                if reply.send(result).is_err() {
                    debug!("Complete reply channel closed (caller dropped)");
                }
            }
            Command::Cancel {
                caster,
                skill,
                reply,
            } => {
                let result = self.cancel(caster, skill);
                if reply.send(result).is_err() {
                    debug!("Cancel reply channel closed (caller dropped)");
                }
            }
            Command::QueryCombatant { entity, reply } => {
                if reply.send(self.region.get(entity).cloned()).is_err() {
                    debug!("QueryCombatant reply channel closed (caller dropped)");
                }
            }
            Command::QueryRegion { reply } => {
                if reply.send(self.region.clone()).is_err() {
                    debug!("QueryRegion reply channel closed (caller dropped)");
                }
            }
        }
    }

    // ========================================================================
    // Cast requests
    // ========================================================================

    fn prepare(&mut self, caster: EntityId, skill: SkillId) -> Result<PrepareOutcome> {
        let now = self.now();
        let mut broadcast = BusSink::new(self.event_bus.clone(), self.region.id);
        let mut progression = broadcast.clone();

        let env = self.oracles.skill_env(&self.spatial);
        let mut sinks = CastSinks::new(&mut broadcast, &mut progression);
        let result = self
            .engine
            .prepare(&mut self.region, &env, &mut sinks, caster, skill, now);

        self.finish_request(caster, skill, CastRequest::Prepare, now, result)
    }

    fn use_skill(&mut self, caster: EntityId, skill: SkillId) -> Result<UseReport> {
        let now = self.now();
        self.spatial.rebuild(&self.region);
        let mut broadcast = BusSink::new(self.event_bus.clone(), self.region.id);
        let mut progression = broadcast.clone();

        let env = self.oracles.skill_env(&self.spatial);
        let mut sinks = CastSinks::new(&mut broadcast, &mut progression);
        let result = self
            .engine
            .use_skill(&mut self.region, &env, &mut sinks, caster, skill, now);

        if let Ok(report) = &result {
            info!(
                caster = %caster,
                skill = %skill,
                targets = report.targets.len(),
                defeated = report.defeated,
                full_charge = report.full_charge,
                "skill used"
            );
        }
        self.finish_request(caster, skill, CastRequest::Use, now, result)
    }

    fn complete(&mut self, caster: EntityId, skill: SkillId) -> Result<()> {
        let now = self.now();
        let mut broadcast = BusSink::new(self.event_bus.clone(), self.region.id);
        let mut progression = broadcast.clone();

        let mut sinks = CastSinks::new(&mut broadcast, &mut progression);
        let result = self
            .engine
            .complete(&mut self.region, &mut sinks, caster, skill);

        self.finish_request(caster, skill, CastRequest::Complete, now, result)
    }

    fn cancel(&mut self, caster: EntityId, skill: SkillId) -> Result<()> {
        let now = self.now();
        let mut broadcast = BusSink::new(self.event_bus.clone(), self.region.id);
        let mut progression = broadcast.clone();

        let mut sinks = CastSinks::new(&mut broadcast, &mut progression);
        let result = self
            .engine
            .cancel(&mut self.region, &mut sinks, caster, skill);

        self.finish_request(caster, skill, CastRequest::Cancel, now, result)
    }

    /// Runs training for whatever the request published, then reports a
    /// failure if there was one. Training runs even for failed requests:
    /// a pack that committed before a later error still counts.
    fn finish_request<T>(
        &mut self,
        caster: EntityId,
        skill: SkillId,
        request: CastRequest,
        now: Millis,
        result: std::result::Result<T, CastError>,
    ) -> Result<T> {
        self.train();
        result.map_err(|err| {
            self.report_failure(caster, skill, request, now, &err);
            err.into()
        })
    }

    fn report_failure(
        &self,
        caster: EntityId,
        skill: SkillId,
        request: CastRequest,
        now: Millis,
        err: &CastError,
    ) {
        let context = ErrorContext::new(now)
            .with_caster(caster)
            .with_skill(skill)
            .with_message(request.into());
        let severity = err.severity();

        error!(
            caster = %caster,
            skill = %skill,
            request = %request,
            code = err.error_code(),
            severity = severity.as_str(),
            at = context.at.0,
            "cast request failed: {err}"
        );

        self.event_bus
            .publish(Event::Notification(NotificationEvent::CastFailed {
                region: self.region.id,
                caster,
                skill,
                request,
                code: err.error_code().to_owned(),
                severity: severity.as_str().to_owned(),
                message: err.to_string(),
                at: context.at,
            }));
    }

    // ========================================================================
    // Training
    // ========================================================================

    fn train(&mut self) {
        let region = self.region.id;
        for trainer in &mut self.trainers {
            for (caster, grant) in trainer.train(&mut self.region) {
                debug!(
                    caster = %caster,
                    skill = %grant.skill,
                    condition = %grant.condition,
                    count = grant.count,
                    "training granted"
                );
                self.event_bus
                    .publish(Event::Progression(ProgressionNotice::Trained {
                        region,
                        caster,
                        grant,
                    }));
            }
        }
    }

    // ========================================================================
    // Region upkeep
    // ========================================================================

    fn despawn(&mut self, entity: EntityId) -> Result<Combatant> {
        let dropped = self.engine.forget(&mut self.region, entity);
        if dropped > 0 {
            debug!(
                entity = %entity,
                casts = dropped,
                "dropped in-flight casts of despawned entity"
            );
        }
        self.region
            .despawn(entity)
            .ok_or_else(|| RegionError::EntityNotFound(entity).into())
    }

    fn tick(&mut self) {
        let now = self.now();
        let ran = self.engine.run_timers(&mut self.region, now);
        if ran > 0 {
            debug!(region = ?self.region.id, tasks = ran, at = now.0, "timers fired");
        }
        // Keeps subscriber backlogs short while other regions publish.
        self.train();
    }
}
