//! Skill lifecycle engine.
//!
//! One engine serves a whole region. It drives every (caster, skill) pair
//! through
//!
//! ```text
//! Idle -prepare-> Prepared -> Ready -use-> Active -> Completed
//!   \______________\___________\__________\--cancel--> Canceled
//! ```
//!
//! and is the only code that moves a `SkillInstance` between states. A failed
//! use is canceled before the error is returned, so every failure path ends in
//! a terminal state with the cast's locks released.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::combat::{
    AttackerAction, AttackerActionKind, CombatActionPack, DamagePipeline, HitRolls, HitSpec,
    KnockbackDecision, LocationId, TargetAction, TargetActionKind, TargetOptions,
};
use crate::config::CombatConfig;
use crate::env::{
    CastSinks, EffectNotice, EffectStage, OracleError, RankParams, RollSlot, SkillEnv,
    compute_seed,
};
use crate::geometry::{Point, build_attack_region, shove};
use crate::schedule::{ScheduledTask, TimerQueue};
use crate::state::{
    Combatant, EntityId, LockManager, Locks, Millis, Region, SkillId, SkillInstance, SkillState,
    TrainingCondition,
};

use super::context::CastContext;
use super::error::{CastError, CastRequest, PreconditionFailure};
use super::registry::{SkillEntry, SkillRegistry};
use super::strategy::CastSite;

/// Result of a prepare request that passed state validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PrepareOutcome {
    Ready,
    /// Preconditions failed; the caster was told quietly and nothing changed.
    SilentCancel(PreconditionFailure),
}

/// Summary of one use.
#[derive(Clone, Debug, PartialEq)]
pub struct UseReport {
    pub caster: EntityId,
    pub skill: SkillId,
    /// Hit targets in discovery order.
    pub targets: Vec<EntityId>,
    pub defeated: usize,
    pub full_charge: bool,
    pub target_area: LocationId,
    /// `Completed` for auto-completing skills, `Active` otherwise.
    pub state: SkillState,
}

type CastKey = (EntityId, SkillId);

pub struct SkillEngine {
    registry: Arc<SkillRegistry>,
    config: CombatConfig,
    casts: BTreeMap<CastKey, CastContext>,
    timers: TimerQueue<ScheduledTask>,
    nonce: u64,
}

impl SkillEngine {
    pub fn new(registry: Arc<SkillRegistry>, config: CombatConfig) -> Self {
        Self {
            registry,
            config,
            casts: BTreeMap::new(),
            timers: TimerQueue::new(),
            nonce: 0,
        }
    }

    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Scratch context of an in-flight cast.
    pub fn cast(&self, caster: EntityId, skill: SkillId) -> Option<&CastContext> {
        self.casts.get(&(caster, skill))
    }

    pub fn active_casts(&self) -> usize {
        self.casts.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    // ------------------------------------------------------------------
    // Prepare
    // ------------------------------------------------------------------

    /// Idle → Prepared → Ready.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when a cast of this skill is already in flight;
    /// the existing cast is untouched. Failed equipment or mana checks are
    /// not errors: they return `PrepareOutcome::SilentCancel`.
    pub fn prepare(
        &mut self,
        region: &mut Region,
        env: &SkillEnv<'_>,
        sinks: &mut CastSinks<'_>,
        caster: EntityId,
        skill: SkillId,
        now: Millis,
    ) -> Result<PrepareOutcome, CastError> {
        let registry = Arc::clone(&self.registry);
        let entry = registry.get(skill).ok_or(CastError::UnknownSkill(skill))?;
        let descriptor = &entry.descriptor;

        let combatant = region.get(caster).ok_or(CastError::CasterNotFound(caster))?;
        let instance = learned(combatant, skill)?;
        if !instance.state().accepts_prepare() || self.casts.contains_key(&(caster, skill)) {
            return Err(CastError::InvalidTransition {
                skill,
                from: instance.state(),
                request: CastRequest::Prepare,
            });
        }
        let params = rank_params(env, instance)?;

        let failure = if descriptor.requires_right_hand && combatant.equipment.right_hand.is_none()
        {
            Some(PreconditionFailure::MissingRightHand)
        } else if combatant.mana.current < params.mana_cost {
            Some(PreconditionFailure::InsufficientMana {
                required: params.mana_cost,
                available: combatant.mana.current,
            })
        } else {
            None
        };
        if let Some(failure) = failure {
            sinks.broadcast.notify_skill_cancel(caster, skill, true);
            return Ok(PrepareOutcome::SilentCancel(failure));
        }

        if let Some(combatant) = region.get_mut(caster) {
            combatant.stop_move();
        }
        let acquired = region.acquire(caster, descriptor.cast_locks)?;
        set_state(region, caster, skill, SkillState::Prepared)?;

        sinks.broadcast.notify_effect(
            caster,
            EffectNotice {
                effect_id: descriptor.effect_id,
                stage: EffectStage::Charging,
                anchor: None,
            },
        );
        sinks.broadcast.notify_skill_ready(caster, skill);

        let cast = CastContext::new(caster, skill, now, acquired);
        self.casts.insert((caster, skill), cast);
        set_state(region, caster, skill, SkillState::Ready)?;
        Ok(PrepareOutcome::Ready)
    }

    // ------------------------------------------------------------------
    // Use
    // ------------------------------------------------------------------

    /// Ready → Active, then Completed for auto-completing skills.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when the skill is not Ready (nothing changes).
    /// Any later failure cancels the cast before returning; no pack is
    /// published in that case.
    pub fn use_skill(
        &mut self,
        region: &mut Region,
        env: &SkillEnv<'_>,
        sinks: &mut CastSinks<'_>,
        caster: EntityId,
        skill: SkillId,
        now: Millis,
    ) -> Result<UseReport, CastError> {
        let registry = Arc::clone(&self.registry);
        let entry = registry.get(skill).ok_or(CastError::UnknownSkill(skill))?;

        let combatant = region.get(caster).ok_or(CastError::CasterNotFound(caster))?;
        let state = learned(combatant, skill)?.state();
        if state != SkillState::Ready || !self.casts.contains_key(&(caster, skill)) {
            return Err(CastError::InvalidTransition {
                skill,
                from: state,
                request: CastRequest::Use,
            });
        }

        match self.execute_use(region, env, sinks, entry, caster, now) {
            Ok(report) => Ok(report),
            Err(err) => {
                if self.casts.contains_key(&(caster, skill)) {
                    // The original failure is what the caller needs; a lock
                    // mismatch found while unwinding is secondary.
                    let _ = self.abort(region, sinks, caster, skill, false);
                }
                Err(err)
            }
        }
    }

    fn execute_use(
        &mut self,
        region: &mut Region,
        env: &SkillEnv<'_>,
        sinks: &mut CastSinks<'_>,
        entry: &SkillEntry,
        caster: EntityId,
        now: Millis,
    ) -> Result<UseReport, CastError> {
        let descriptor = &entry.descriptor;
        let skill = descriptor.id;
        let key = (caster, skill);

        let attacker = region
            .get(caster)
            .cloned()
            .ok_or(CastError::CasterNotFound(caster))?;
        let params = rank_params(env, learned(&attacker, skill)?)?;

        let full_charge = {
            let cast = self.cast_mut(key)?;
            cast.full_charge = now.since(cast.prepared_at) >= u64::from(params.max_charge_ms);
            cast.full_charge
        };
        set_state(region, caster, skill, SkillState::Active)?;
        let missing = descriptor.cast_locks - self.cast_mut(key)?.held_locks();
        if !missing.is_empty() {
            let acquired = region.acquire(caster, missing)?;
            self.cast_mut(key)?.hold(acquired);
        }

        if attacker.mana.current < params.mana_cost {
            return Err(CastError::InsufficientMana {
                required: params.mana_cost,
                available: attacker.mana.current,
            });
        }

        let origin = Point::from(attacker.position);
        let shape = descriptor.shape;
        let area = build_attack_region(
            origin,
            attacker.facing,
            shape.forward_offset,
            shape.length,
            shape.width,
        )?;
        let pivot = area.pivot().to_position();
        let target_area = LocationId::new(region.id, pivot);

        let site = CastSite {
            caster,
            skill,
            pivot,
            facing: attacker.facing,
            now,
        };
        let mut marker = None;
        for hook in entry.hooks() {
            let output = hook.on_use(region, &site);
            if let Some(prop) = output.prop {
                let cleanup = output
                    .cleanup
                    .map(|(due, task)| self.timers.schedule(due, task));
                self.cast_mut(key)?.track(prop, cleanup);
                marker = marker.or(Some(prop));
            }
        }

        // Snapshot: exactly these entities are resolved, in this order.
        let candidates = env.spatial()?.entities_in_polygon(region, &area);
        let rng = env.rng()?;
        self.nonce += 1;
        let nonce = self.nonce;

        let hit = HitSpec {
            params,
            full_charge,
            base_stun_ms: descriptor.base_stun_ms,
            knockback_distance: descriptor.knockback_distance,
        };
        let pipeline = DamagePipeline::new(&self.config);

        let mut pack = CombatActionPack::new(caster, skill);
        pack.add(AttackerAction {
            kind: AttackerActionKind::SpecialHit,
            entity: caster,
            skill,
            target_area,
            prop: marker,
            options: descriptor.attacker_options,
            full_charge,
        })?;

        let mut staged = Vec::with_capacity(candidates.len());
        for id in candidates {
            let Some(candidate) = region.get(id) else {
                continue;
            };
            if !entry.filter().is_targetable(&attacker, candidate) {
                continue;
            }
            let mut target = candidate.clone();
            let rolls = HitRolls {
                base: DamagePipeline::roll_base(
                    &params,
                    rng,
                    compute_seed(self.config.game_seed, nonce, id, RollSlot::BaseDamage),
                ),
                critical: rng.roll_d100(compute_seed(
                    self.config.game_seed,
                    nonce,
                    id,
                    RollSlot::Critical,
                )),
            };
            let outcome = pipeline.resolve(&attacker, &mut target, &hit, rolls)?;

            let mut options = TargetOptions::empty();
            options.set(TargetOptions::CRITICAL, outcome.is_critical);
            options.set(TargetOptions::SHIELDED, outcome.shield_absorbed > 0.0);
            match outcome.knockback {
                KnockbackDecision::FinishingKnockDown { .. } => {
                    options.insert(TargetOptions::FINISHING_KNOCKDOWN)
                }
                KnockbackDecision::KnockDown { .. } => options.insert(TargetOptions::KNOCKDOWN),
                KnockbackDecision::None => {}
            }
            let landing = Point::from(target.position);
            let shove_to = outcome.knockback.distance().map(|distance| {
                shove(origin, landing, distance, attacker.facing).to_position()
            });

            pack.add(TargetAction {
                kind: TargetActionKind::TakeHit,
                entity: id,
                attacker: caster,
                skill: descriptor.reaction_skill,
                damage: outcome.amount,
                stun_ms: outcome.stun_ms,
                options,
                knockback: outcome.knockback,
                shove_to,
                died: outcome.target_died,
            })?;
            staged.push(target);
        }

        // Commit point: nothing below can fail before the pack is published.
        if let Some(caster) = region.get_mut(caster) {
            caster.mana.drain(params.mana_cost);
        }
        for target in staged {
            if let Some(live) = region.get_mut(target.id) {
                live.health = target.health;
                live.defense.shield = target.defense.shield;
            }
        }
        pack.handle(region, &mut *sinks.broadcast, &mut *sinks.progression)?;

        sinks.broadcast.notify_effect(
            caster,
            EffectNotice {
                effect_id: descriptor.effect_id,
                stage: EffectStage::Discharge,
                anchor: Some(pivot),
            },
        );
        let hit_count = u16::try_from(pack.targets().len()).unwrap_or(u16::MAX);
        sinks
            .broadcast
            .notify_skill_use(caster, skill, target_area, hit_count);
        if let Some(instance) = region
            .get_mut(caster)
            .and_then(|c| c.skills.get_mut(skill))
        {
            instance.train(TrainingCondition::USE);
        }

        let state = if descriptor.auto_complete {
            self.finish(region, sinks, caster, skill)?;
            SkillState::Completed
        } else {
            SkillState::Active
        };

        Ok(UseReport {
            caster,
            skill,
            targets: pack.targets().iter().map(|t| t.entity).collect(),
            defeated: pack.defeated(),
            full_charge,
            target_area,
            state,
        })
    }

    // ------------------------------------------------------------------
    // Complete / Cancel
    // ------------------------------------------------------------------

    /// Active → Completed. Only reachable after a use.
    pub fn complete(
        &mut self,
        region: &mut Region,
        sinks: &mut CastSinks<'_>,
        caster: EntityId,
        skill: SkillId,
    ) -> Result<(), CastError> {
        let combatant = region.get(caster).ok_or(CastError::CasterNotFound(caster))?;
        let state = learned(combatant, skill)?.state();
        if state != SkillState::Active || !self.casts.contains_key(&(caster, skill)) {
            return Err(CastError::InvalidTransition {
                skill,
                from: state,
                request: CastRequest::Complete,
            });
        }
        self.finish(region, sinks, caster, skill)
    }

    /// Prepared, Ready or Active → Canceled. No pack is published.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` from Idle, Completed or Canceled; nothing is
    /// broadcast. `LockRelease` if the cast's locks were not held any more;
    /// the cast is canceled regardless.
    pub fn cancel(
        &mut self,
        region: &mut Region,
        sinks: &mut CastSinks<'_>,
        caster: EntityId,
        skill: SkillId,
    ) -> Result<(), CastError> {
        let Some(combatant) = region.get(caster) else {
            self.forget(region, caster);
            return Err(CastError::CasterNotFound(caster));
        };
        let state = learned(combatant, skill)?.state();
        if state.is_terminal() || state == SkillState::Idle {
            return Err(CastError::InvalidTransition {
                skill,
                from: state,
                request: CastRequest::Cancel,
            });
        }
        self.abort(region, sinks, caster, skill, false)
    }

    /// Drops every cast of a caster that left the region. Props they placed
    /// are removed and their cleanup timers canceled.
    pub fn forget(&mut self, region: &mut Region, caster: EntityId) -> usize {
        let keys: Vec<CastKey> = self
            .casts
            .keys()
            .filter(|(entity, _)| *entity == caster)
            .copied()
            .collect();
        for key in &keys {
            if let Some(mut cast) = self.casts.remove(key) {
                self.clear_artifacts(region, &mut cast);
            }
        }
        keys.len()
    }

    /// Runs deferred tasks due at `now`; returns how many ran.
    pub fn run_timers(&mut self, region: &mut Region, now: Millis) -> usize {
        let due = self.timers.drain_due(now);
        for task in &due {
            match task {
                ScheduledTask::RemoveProp(prop) => {
                    region.remove_prop(*prop);
                }
            }
        }
        due.len()
    }

    fn finish(
        &mut self,
        region: &mut Region,
        sinks: &mut CastSinks<'_>,
        caster: EntityId,
        skill: SkillId,
    ) -> Result<(), CastError> {
        let mut cast = self.take_cast((caster, skill))?;
        let released = release(region, &mut cast);
        set_state(region, caster, skill, SkillState::Completed)?;
        self.clear_effect(sinks, caster, skill);
        sinks.broadcast.notify_skill_complete(caster, skill);
        released
    }

    fn abort(
        &mut self,
        region: &mut Region,
        sinks: &mut CastSinks<'_>,
        caster: EntityId,
        skill: SkillId,
        silent: bool,
    ) -> Result<(), CastError> {
        let released = match self.casts.remove(&(caster, skill)) {
            Some(mut cast) => {
                self.clear_artifacts(region, &mut cast);
                release(region, &mut cast)
            }
            None => Ok(()),
        };
        set_state(region, caster, skill, SkillState::Canceled)?;
        self.clear_effect(sinks, caster, skill);
        sinks.broadcast.notify_skill_cancel(caster, skill, silent);
        released
    }

    fn clear_effect(&self, sinks: &mut CastSinks<'_>, caster: EntityId, skill: SkillId) {
        if let Some(entry) = self.registry.get(skill) {
            sinks.broadcast.notify_effect(
                caster,
                EffectNotice {
                    effect_id: entry.descriptor.effect_id,
                    stage: EffectStage::Clear,
                    anchor: None,
                },
            );
        }
    }

    fn clear_artifacts(&mut self, region: &mut Region, cast: &mut CastContext) {
        for (prop, cleanup) in cast.take_artifacts() {
            if let Some(handle) = cleanup {
                self.timers.cancel(handle);
            }
            region.remove_prop(prop);
        }
    }

    fn cast_mut(&mut self, key: CastKey) -> Result<&mut CastContext, CastError> {
        self.casts.get_mut(&key).ok_or(CastError::InvalidTransition {
            skill: key.1,
            from: SkillState::Idle,
            request: CastRequest::Use,
        })
    }

    fn take_cast(&mut self, key: CastKey) -> Result<CastContext, CastError> {
        self.casts.remove(&key).ok_or(CastError::InvalidTransition {
            skill: key.1,
            from: SkillState::Idle,
            request: CastRequest::Complete,
        })
    }
}

fn learned(combatant: &Combatant, skill: SkillId) -> Result<&SkillInstance, CastError> {
    combatant.skills.get(skill).ok_or(CastError::NotLearned {
        caster: combatant.id,
        skill,
    })
}

fn rank_params(env: &SkillEnv<'_>, instance: &SkillInstance) -> Result<RankParams, CastError> {
    env.tables()?
        .rank_params(instance.id, instance.rank)
        .ok_or_else(|| {
            OracleError::RankParamsNotFound {
                skill: instance.id,
                rank: instance.rank,
            }
            .into()
        })
}

fn set_state(
    region: &mut Region,
    caster: EntityId,
    skill: SkillId,
    state: SkillState,
) -> Result<(), CastError> {
    let combatant = region
        .get_mut(caster)
        .ok_or(CastError::CasterNotFound(caster))?;
    let instance = combatant
        .skills
        .get_mut(skill)
        .ok_or(CastError::NotLearned { caster, skill })?;
    instance.set_state(state);
    Ok(())
}

/// Releases the cast's locks exactly once and checks they were still held.
fn release(region: &mut Region, cast: &mut CastContext) -> Result<(), CastError> {
    let caster = cast.caster;
    let Some(held) = cast.take_locks() else {
        return Err(CastError::LockRelease {
            caster,
            held: Locks::empty(),
            released: Locks::empty(),
        });
    };
    let released = region.release(caster, held)?;
    if released != held {
        return Err(CastError::LockRelease {
            caster,
            held,
            released,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Env, PcgRng, RankTable, RecordingSink, RegionScan, SkillNotice};
    use crate::geometry::Facing;
    use crate::skill::{SkillDescriptor, TargetFilter};
    use crate::state::{
        Faction, ItemId, Position, RegionId, SkillRank, SkillSet, TARGET_MARKER_PROP,
    };

    const CASTER: EntityId = EntityId(1);
    const ROD: SkillId = SkillId::LIGHTNING_ROD;

    struct Harness {
        engine: SkillEngine,
        region: Region,
        tables: RankTable,
        sink: RecordingSink,
        progression: RecordingSink,
    }

    impl Harness {
        fn new(rank: SkillRank) -> Self {
            let mut region = Region::new(RegionId(1));
            region
                .spawn(
                    Combatant::new(CASTER, RegionId(1), Position::ORIGIN, 100.0)
                        .with_faction(Faction::PLAYERS)
                        .with_facing(Facing::from_radians(0.0))
                        .with_mana(50.0)
                        .with_right_hand(ItemId(40_001))
                        .with_skills(SkillSet::new().with_skill(ROD, rank)),
                )
                .unwrap();
            let tables = RankTable::new().with(
                ROD,
                rank,
                RankParams::new(50, 70).with_charge(3_000, 20).with_mana_cost(10.0),
            );
            Self {
                engine: SkillEngine::new(
                    Arc::new(SkillRegistry::with_builtin()),
                    CombatConfig::default(),
                ),
                region,
                tables,
                sink: RecordingSink::default(),
                progression: RecordingSink::default(),
            }
        }

        fn spawn_enemy(&mut self, id: u64, x: i32, health: f32) {
            self.region
                .spawn(
                    Combatant::new(EntityId(id), RegionId(1), Position::new(x, 0), health)
                        .with_faction(Faction::MONSTERS),
                )
                .unwrap();
        }

        fn install(&mut self, registry: SkillRegistry) {
            self.engine = SkillEngine::new(Arc::new(registry), CombatConfig::default());
        }

        fn prepare(&mut self, now: u64) -> Result<PrepareOutcome, CastError> {
            self.prepare_skill(ROD, now)
        }

        fn prepare_skill(&mut self, skill: SkillId, now: u64) -> Result<PrepareOutcome, CastError> {
            let env = Env::with_all(&self.tables, &PcgRng, &RegionScan).into_skill_env();
            let mut sinks = CastSinks::new(&mut self.sink, &mut self.progression);
            let now = Millis(now);
            self.engine
                .prepare(&mut self.region, &env, &mut sinks, CASTER, skill, now)
        }

        fn use_skill(&mut self, now: u64) -> Result<UseReport, CastError> {
            let env = Env::with_all(&self.tables, &PcgRng, &RegionScan).into_skill_env();
            let mut sinks = CastSinks::new(&mut self.sink, &mut self.progression);
            self.engine
                .use_skill(&mut self.region, &env, &mut sinks, CASTER, ROD, Millis(now))
        }

        fn cancel(&mut self) -> Result<(), CastError> {
            self.cancel_skill(ROD)
        }

        fn cancel_skill(&mut self, skill: SkillId) -> Result<(), CastError> {
            let mut sinks = CastSinks::new(&mut self.sink, &mut self.progression);
            self.engine.cancel(&mut self.region, &mut sinks, CASTER, skill)
        }

        fn complete(&mut self) -> Result<(), CastError> {
            let mut sinks = CastSinks::new(&mut self.sink, &mut self.progression);
            self.engine.complete(&mut self.region, &mut sinks, CASTER, ROD)
        }

        fn state(&self) -> SkillState {
            self.state_of(ROD)
        }

        fn state_of(&self, skill: SkillId) -> SkillState {
            self.region.get(CASTER).unwrap().skills.get(skill).unwrap().state()
        }

        fn locks(&self) -> Locks {
            self.region.get(CASTER).unwrap().locks()
        }
    }

    #[test]
    fn prepare_moves_idle_to_ready_and_locks_movement() {
        let mut h = Harness::new(SkillRank::RF);
        assert_eq!(h.prepare(0).unwrap(), PrepareOutcome::Ready);
        assert_eq!(h.state(), SkillState::Ready);
        assert_eq!(h.locks(), Locks::MOVEMENT);
        assert_eq!(h.sink.effect_stages(CASTER), vec![EffectStage::Charging]);
        assert_eq!(h.sink.notices_for(CASTER).next(), Some(&SkillNotice::Ready));
    }

    #[test]
    fn second_prepare_while_ready_is_rejected() {
        let mut h = Harness::new(SkillRank::RF);
        h.prepare(0).unwrap();
        let prepared_at = h.engine.cast(CASTER, ROD).unwrap().prepared_at;

        let err = h.prepare(500).unwrap_err();
        assert_eq!(
            err,
            CastError::InvalidTransition {
                skill: ROD,
                from: SkillState::Ready,
                request: CastRequest::Prepare,
            }
        );
        assert_eq!(h.state(), SkillState::Ready);
        assert_eq!(h.engine.cast(CASTER, ROD).unwrap().prepared_at, prepared_at);
        assert_eq!(h.locks(), Locks::MOVEMENT);
    }

    #[test]
    fn missing_weapon_is_a_silent_cancel() {
        let mut h = Harness::new(SkillRank::RF);
        h.region.get_mut(CASTER).unwrap().equipment.right_hand = None;

        assert_eq!(
            h.prepare(0).unwrap(),
            PrepareOutcome::SilentCancel(PreconditionFailure::MissingRightHand)
        );
        assert_eq!(h.state(), SkillState::Idle);
        assert!(h.locks().is_empty());
        assert_eq!(
            h.sink.notices_for(CASTER).last(),
            Some(&SkillNotice::Cancel { silent: true })
        );
    }

    #[test]
    fn use_and_complete_require_the_right_state() {
        let mut h = Harness::new(SkillRank::RF);
        assert!(matches!(
            h.use_skill(0),
            Err(CastError::InvalidTransition { from: SkillState::Idle, .. })
        ));
        assert!(matches!(
            h.complete(),
            Err(CastError::InvalidTransition { from: SkillState::Idle, .. })
        ));
        h.prepare(0).unwrap();
        assert!(matches!(
            h.complete(),
            Err(CastError::InvalidTransition { from: SkillState::Ready, .. })
        ));
        assert_eq!(h.state(), SkillState::Ready);
    }

    #[test]
    fn use_hits_targets_in_discovery_order_and_completes() {
        let mut h = Harness::new(SkillRank::RF);
        h.spawn_enemy(3, 900, 500.0);
        h.spawn_enemy(2, 400, 500.0);
        h.spawn_enemy(4, 2_000, 500.0);
        h.prepare(0).unwrap();

        let report = h.use_skill(1_000).unwrap();
        assert_eq!(report.targets, vec![EntityId(2), EntityId(3)]);
        assert_eq!(report.state, SkillState::Completed);
        assert!(!report.full_charge);
        assert_eq!(h.state(), SkillState::Completed);
        assert!(h.locks().is_empty());
        assert!(h.engine.cast(CASTER, ROD).is_none());

        assert_eq!(h.sink.packs.len(), 1);
        let pack = &h.sink.packs[0];
        assert!(pack.is_committed());
        assert!(pack.attacker_action().unwrap().prop.is_some());
        for target in pack.targets() {
            assert!((50.0..=70.0).contains(&target.damage));
            assert_eq!(target.skill, SkillId::COMBAT_MASTERY);
        }
        assert_eq!(
            h.sink.effect_stages(CASTER),
            vec![
                EffectStage::Charging,
                EffectStage::Discharge,
                EffectStage::Clear
            ]
        );
        assert_eq!(h.region.get(CASTER).unwrap().mana.current, 40.0);

        let rod = h.region.get(CASTER).unwrap().skills.get(ROD).unwrap();
        assert_eq!(rod.training().count(TrainingCondition::USE), 1);
        assert_eq!(h.progression.progression.len(), 3);
    }

    #[test]
    fn holding_ready_long_enough_sets_full_charge() {
        let mut h = Harness::new(SkillRank::RF);
        h.spawn_enemy(2, 800, 500.0);
        h.prepare(1_000).unwrap();
        let report = h.use_skill(4_000).unwrap();
        assert!(report.full_charge);
        let damage = h.sink.packs[0].targets()[0].damage;
        assert!((60.0..=84.0).contains(&damage), "{damage}");
    }

    #[test]
    fn knockback_moves_target_away_once() {
        let mut h = Harness::new(SkillRank::RF);
        h.spawn_enemy(2, 800, 500.0);
        h.prepare(0).unwrap();
        h.use_skill(100).unwrap();

        let target = h.region.get(EntityId(2)).unwrap();
        assert_eq!(target.position, Position::new(1_520, 0));
        assert_eq!(target.stun_ms, 2_000);
    }

    #[test]
    fn cancel_from_idle_is_rejected_without_notices() {
        let mut h = Harness::new(SkillRank::RF);
        assert_eq!(
            h.cancel(),
            Err(CastError::InvalidTransition {
                skill: ROD,
                from: SkillState::Idle,
                request: CastRequest::Cancel,
            })
        );
        assert_eq!(h.state(), SkillState::Idle);
        assert!(h.sink.effect_stages(CASTER).is_empty());
        assert_eq!(h.sink.notices_for(CASTER).count(), 0);
    }

    #[test]
    fn cancel_from_ready_releases_locks() {
        let mut h = Harness::new(SkillRank::RF);
        h.prepare(0).unwrap();
        h.cancel().unwrap();
        assert_eq!(h.state(), SkillState::Canceled);
        assert!(h.locks().is_empty());
        assert!(h.sink.packs.is_empty());
        assert_eq!(h.engine.active_casts(), 0);
        assert!(h.cancel().is_err());
    }

    fn manual_rod() -> SkillRegistry {
        let mut registry = SkillRegistry::new();
        let mut descriptor = SkillDescriptor::lightning_rod();
        descriptor.auto_complete = false;
        registry.register(descriptor);
        registry
    }

    #[test]
    fn manual_completion_keeps_cast_active_until_completed() {
        let mut h = Harness::new(SkillRank::RF);
        h.install(manual_rod());

        h.prepare(0).unwrap();
        let report = h.use_skill(10).unwrap();
        assert_eq!(report.state, SkillState::Active);
        assert_eq!(h.locks(), Locks::MOVEMENT);
        assert!(h.prepare(20).is_err());

        h.complete().unwrap();
        assert_eq!(h.state(), SkillState::Completed);
        assert!(h.locks().is_empty());
        assert_eq!(h.prepare(30).unwrap(), PrepareOutcome::Ready);
    }

    #[test]
    fn cancel_while_active_clears_marker_and_timer() {
        let mut h = Harness::new(SkillRank::RF);
        h.install(manual_rod());
        h.spawn_enemy(2, 800, 500.0);
        h.prepare(0).unwrap();
        assert_eq!(h.use_skill(10).unwrap().state, SkillState::Active);
        assert_eq!(h.region.props().count(), 1);
        assert_eq!(h.engine.pending_timers(), 1);

        h.cancel().unwrap();
        assert_eq!(h.state(), SkillState::Canceled);
        assert!(h.locks().is_empty());
        assert_eq!(h.region.props().count(), 0);
        assert_eq!(h.engine.pending_timers(), 0);
        assert_eq!(h.engine.active_casts(), 0);
        assert_eq!(h.sink.packs.len(), 1);
        assert_eq!(
            h.sink.notices_for(CASTER).last(),
            Some(&SkillNotice::Cancel { silent: false })
        );
    }

    #[test]
    fn overlapping_casts_keep_locks_until_last_release() {
        const SPARK: SkillId = SkillId(7);

        let mut h = Harness::new(SkillRank::RF);
        let mut registry = SkillRegistry::with_builtin();
        let mut spark = SkillDescriptor::lightning_rod();
        spark.id = SPARK;
        spark.name = "Spark".into();
        spark.marker = None;
        registry.register(spark);
        h.install(registry);
        h.tables = std::mem::take(&mut h.tables).with(
            SPARK,
            SkillRank::RF,
            RankParams::new(10, 20).with_mana_cost(5.0),
        );
        let caster = h.region.get_mut(CASTER).unwrap();
        caster.skills.learn(SPARK, SkillRank::RF);

        h.prepare(0).unwrap();
        h.prepare_skill(SPARK, 10).unwrap();
        let holds = h.region.get(CASTER).unwrap().lock_holds();
        assert_eq!(holds.holders(Locks::MOVEMENT), 2);

        h.cancel().unwrap();
        assert_eq!(h.state(), SkillState::Canceled);
        assert_eq!(h.state_of(SPARK), SkillState::Ready);
        assert_eq!(h.locks(), Locks::MOVEMENT);

        h.cancel_skill(SPARK).unwrap();
        assert!(h.locks().is_empty());
    }

    struct AlliesOnly;

    impl TargetFilter for AlliesOnly {
        fn is_targetable(&self, caster: &Combatant, candidate: &Combatant) -> bool {
            candidate.id != caster.id && candidate.faction == caster.faction
        }
    }

    #[test]
    fn installed_filter_selects_pack_targets() {
        let mut h = Harness::new(SkillRank::RF);
        let mut registry = SkillRegistry::with_builtin();
        assert!(registry.set_filter(ROD, Arc::new(AlliesOnly)));
        assert!(!registry.set_filter(SkillId(7), Arc::new(AlliesOnly)));
        h.install(registry);

        h.spawn_enemy(2, 400, 500.0);
        h.region
            .spawn(
                Combatant::new(EntityId(3), RegionId(1), Position::new(600, 0), 500.0)
                    .with_faction(Faction::PLAYERS),
            )
            .unwrap();
        h.prepare(0).unwrap();

        let report = h.use_skill(100).unwrap();
        assert_eq!(report.targets, vec![EntityId(3)]);
        let hit: Vec<EntityId> = h.sink.packs[0]
            .targets()
            .iter()
            .map(|target| target.entity)
            .collect();
        assert_eq!(hit, vec![EntityId(3)]);
        assert_eq!(h.region.get(EntityId(2)).unwrap().health.current, 500.0);
    }

    #[test]
    fn failed_use_cancels_without_publishing() {
        let mut h = Harness::new(SkillRank::RF);
        h.spawn_enemy(2, 800, 500.0);
        h.prepare(0).unwrap();
        h.region.get_mut(CASTER).unwrap().mana.drain(45.0);

        let err = h.use_skill(10).unwrap_err();
        assert!(matches!(err, CastError::InsufficientMana { .. }));
        assert_eq!(h.state(), SkillState::Canceled);
        assert!(h.locks().is_empty());
        assert!(h.sink.packs.is_empty());
        assert_eq!(h.region.get(EntityId(2)).unwrap().health.current, 500.0);
    }

    #[test]
    fn marker_prop_is_removed_by_timer() {
        let mut h = Harness::new(SkillRank::RF);
        h.prepare(0).unwrap();
        h.use_skill(100).unwrap();
        let marker = h.region.props().next().unwrap();
        assert_eq!(marker.class, TARGET_MARKER_PROP);
        assert_eq!(marker.position, Position::new(800, 0));

        assert_eq!(h.engine.run_timers(&mut h.region, Millis(5_099)), 0);
        assert_eq!(h.engine.run_timers(&mut h.region, Millis(5_100)), 1);
        assert_eq!(h.region.props().count(), 0);
    }

    #[test]
    fn double_release_is_detected() {
        let mut region = Region::new(RegionId(1));
        region
            .spawn(Combatant::new(CASTER, RegionId(1), Position::ORIGIN, 10.0))
            .unwrap();
        let acquired = region.acquire(CASTER, Locks::MOVEMENT).unwrap();
        let mut cast = CastContext::new(CASTER, ROD, Millis::ZERO, acquired);

        assert!(release(&mut region, &mut cast).is_ok());
        assert!(matches!(
            release(&mut region, &mut cast),
            Err(CastError::LockRelease { .. })
        ));
        assert!(region.get(CASTER).unwrap().locks().is_empty());
    }
}
