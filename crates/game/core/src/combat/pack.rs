//! Atomic, broadcastable unit of one skill use.

use crate::env::{BroadcastSink, ProgressionSink};
use crate::error::{ErrorSeverity, GameError};
use crate::state::{EntityId, Region, SkillId};
use crate::training::{CasterAttacked, DefeatRecord, ProgressionEvent, TargetAttacked};

use super::action::{AttackerAction, CombatAction, TargetAction};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PackError {
    #[error("pack of {attacker} was already handled")]
    AlreadyCommitted { attacker: EntityId },

    #[error("pack of {attacker} already has an attacker action")]
    DuplicateAttackerAction { attacker: EntityId },

    #[error("pack of {attacker} has no attacker action")]
    MissingAttackerAction { attacker: EntityId },

    /// The action names a different attacker or skill than the pack.
    #[error("action does not belong to the pack of {attacker} using {skill}")]
    ForeignAction { attacker: EntityId, skill: SkillId },

    #[error("{target} already has an action in the pack of {attacker}")]
    DuplicateTarget {
        attacker: EntityId,
        target: EntityId,
    },
}

impl GameError for PackError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyCommitted { .. } => "PACK_ALREADY_COMMITTED",
            Self::DuplicateAttackerAction { .. } => "PACK_DUPLICATE_ATTACKER_ACTION",
            Self::MissingAttackerAction { .. } => "PACK_MISSING_ATTACKER_ACTION",
            Self::ForeignAction { .. } => "PACK_FOREIGN_ACTION",
            Self::DuplicateTarget { .. } => "PACK_DUPLICATE_TARGET",
        }
    }
}

/// One attacker action plus the reactions of every target it hit.
///
/// Target order is the order actions were added, which the engine keeps equal
/// to spatial discovery order. After [`handle`](Self::handle) the pack is
/// frozen.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatActionPack {
    attacker: EntityId,
    skill: SkillId,
    attacker_action: Option<AttackerAction>,
    targets: Vec<TargetAction>,
    committed: bool,
}

impl CombatActionPack {
    pub fn new(attacker: EntityId, skill: SkillId) -> Self {
        Self {
            attacker,
            skill,
            attacker_action: None,
            targets: Vec::new(),
            committed: false,
        }
    }

    pub fn attacker(&self) -> EntityId {
        self.attacker
    }

    pub fn skill(&self) -> SkillId {
        self.skill
    }

    pub fn attacker_action(&self) -> Option<&AttackerAction> {
        self.attacker_action.as_ref()
    }

    pub fn targets(&self) -> &[TargetAction] {
        &self.targets
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn defeated(&self) -> usize {
        self.targets.iter().filter(|t| t.died).count()
    }

    pub fn add(&mut self, action: impl Into<CombatAction>) -> Result<(), PackError> {
        let attacker = self.attacker;
        if self.committed {
            return Err(PackError::AlreadyCommitted { attacker });
        }
        match action.into() {
            CombatAction::Attacker(action) => {
                if action.entity != attacker || action.skill != self.skill {
                    return Err(PackError::ForeignAction {
                        attacker,
                        skill: self.skill,
                    });
                }
                if self.attacker_action.is_some() {
                    return Err(PackError::DuplicateAttackerAction { attacker });
                }
                self.attacker_action = Some(action);
            }
            CombatAction::Target(action) => {
                if action.attacker != attacker {
                    return Err(PackError::ForeignAction {
                        attacker,
                        skill: self.skill,
                    });
                }
                if self.targets.iter().any(|t| t.entity == action.entity) {
                    return Err(PackError::DuplicateTarget {
                        attacker,
                        target: action.entity,
                    });
                }
                self.targets.push(action);
            }
        }
        Ok(())
    }

    /// Commits the pack.
    ///
    /// Applies the deferred stun and knockback of every target, publishes the
    /// pack, then emits one `TargetAttacked` per target followed by one
    /// `CasterAttacked`. Returns `Ok(false)` without doing anything when the
    /// pack was already handled.
    ///
    /// # Errors
    ///
    /// `PackError::MissingAttackerAction` if no attacker action was added;
    /// nothing is applied or published in that case.
    pub fn handle(
        &mut self,
        region: &mut Region,
        broadcast: &mut (impl BroadcastSink + ?Sized),
        progression: &mut (impl ProgressionSink + ?Sized),
    ) -> Result<bool, PackError> {
        if self.committed {
            return Ok(false);
        }
        let full_charge = self
            .attacker_action
            .as_ref()
            .map(|action| action.full_charge)
            .ok_or(PackError::MissingAttackerAction {
                attacker: self.attacker,
            })?;
        self.committed = true;

        for action in &self.targets {
            // Targets that despawned after the snapshot keep their entry in
            // the broadcast but have nothing left to move.
            if let Some(target) = region.get_mut(action.entity) {
                target.stun_ms = action.stun_ms;
                if let Some(destination) = action.shove_to {
                    target.stop_move();
                    target.position = destination;
                }
            }
        }

        broadcast.publish(self);

        let defeated_in_pack = self.defeated();
        for action in &self.targets {
            progression.emit(ProgressionEvent::TargetAttacked(TargetAttacked {
                caster: self.attacker,
                target: action.entity,
                skill: self.skill,
                target_died: action.died,
                full_charge,
                defeated_in_pack,
            }));
        }
        progression.emit(ProgressionEvent::CasterAttacked(CasterAttacked {
            caster: self.attacker,
            skill: self.skill,
            targets: self
                .targets
                .iter()
                .map(|t| DefeatRecord {
                    target: t.entity,
                    died: t.died,
                })
                .collect(),
            full_charge,
        }));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{
        AttackerActionKind, AttackerOptions, KnockbackDecision, LocationId, TargetActionKind,
        TargetOptions,
    };
    use crate::env::RecordingSink;
    use crate::state::{Combatant, Position, RegionId};

    fn attacker_action(entity: EntityId) -> AttackerAction {
        AttackerAction {
            kind: AttackerActionKind::SpecialHit,
            entity,
            skill: SkillId::LIGHTNING_ROD,
            target_area: LocationId::new(RegionId(1), Position::new(800, 0)),
            prop: None,
            options: AttackerOptions::KNOCKBACK_HIT | AttackerOptions::USE_EFFECT,
            full_charge: true,
        }
    }

    fn target_action(attacker: EntityId, entity: u64, died: bool) -> TargetAction {
        TargetAction {
            kind: TargetActionKind::TakeHit,
            entity: EntityId(entity),
            attacker,
            skill: SkillId::COMBAT_MASTERY,
            damage: 30.0,
            stun_ms: 2_000,
            options: TargetOptions::KNOCKDOWN,
            knockback: KnockbackDecision::KnockDown { distance: 720.0 },
            shove_to: Some(Position::new(1_500, 0)),
            died,
        }
    }

    fn region() -> Region {
        let mut region = Region::new(RegionId(1));
        for id in 1..=3 {
            region
                .spawn(Combatant::new(EntityId(id), RegionId(1), Position::new(700, 0), 100.0))
                .unwrap();
        }
        region
    }

    #[test]
    fn handle_publishes_once_and_freezes() {
        let caster = EntityId(1);
        let mut region = region();
        let mut sink = RecordingSink::default();
        let mut pack = CombatActionPack::new(caster, SkillId::LIGHTNING_ROD);
        pack.add(attacker_action(caster)).unwrap();
        pack.add(target_action(caster, 2, true)).unwrap();
        pack.add(target_action(caster, 3, false)).unwrap();

        let mut progression = RecordingSink::default();
        assert!(pack.handle(&mut region, &mut sink, &mut progression).unwrap());
        assert!(!pack.handle(&mut region, &mut sink, &mut progression).unwrap());
        assert_eq!(sink.packs.len(), 1);
        assert!(pack.is_committed());

        assert_eq!(
            pack.add(target_action(caster, 1, false)),
            Err(PackError::AlreadyCommitted { attacker: caster })
        );
        assert_eq!(pack.targets().len(), 2);
    }

    #[test]
    fn handle_applies_deferred_effects_once() {
        let caster = EntityId(1);
        let mut region = region();
        let mut sink = RecordingSink::default();
        let mut pack = CombatActionPack::new(caster, SkillId::LIGHTNING_ROD);
        pack.add(attacker_action(caster)).unwrap();
        pack.add(target_action(caster, 2, false)).unwrap();
        pack.handle(&mut region, &mut sink, &mut RecordingSink::default())
            .unwrap();

        let target = region.get(EntityId(2)).unwrap();
        assert_eq!(target.position, Position::new(1_500, 0));
        assert_eq!(target.stun_ms, 2_000);
        let untouched = region.get(EntityId(3)).unwrap();
        assert_eq!(untouched.position, Position::new(700, 0));
    }

    #[test]
    fn handle_emits_per_target_then_per_pack() {
        let caster = EntityId(1);
        let mut region = region();
        let mut pack = CombatActionPack::new(caster, SkillId::LIGHTNING_ROD);
        pack.add(attacker_action(caster)).unwrap();
        pack.add(target_action(caster, 3, true)).unwrap();
        pack.add(target_action(caster, 2, false)).unwrap();

        let mut progression = RecordingSink::default();
        pack.handle(&mut region, &mut RecordingSink::default(), &mut progression)
            .unwrap();

        let events = &progression.progression;
        assert_eq!(events.len(), 3);
        for event in &events[..2] {
            match event {
                ProgressionEvent::TargetAttacked(e) => assert_eq!(e.defeated_in_pack, 1),
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert!(matches!(
            &events[0],
            ProgressionEvent::TargetAttacked(e) if e.target == EntityId(3) && e.target_died
        ));
        assert!(matches!(
            &events[1],
            ProgressionEvent::TargetAttacked(e) if e.target == EntityId(2)
        ));
        match &events[2] {
            ProgressionEvent::CasterAttacked(e) => {
                assert_eq!(e.defeated(), 1);
                assert!(e.full_charge);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn handle_requires_attacker_action() {
        let caster = EntityId(1);
        let mut region = region();
        let mut sink = RecordingSink::default();
        let mut pack = CombatActionPack::new(caster, SkillId::LIGHTNING_ROD);
        pack.add(target_action(caster, 2, false)).unwrap();

        let err = pack
            .handle(&mut region, &mut sink, &mut RecordingSink::default())
            .unwrap_err();
        assert_eq!(err, PackError::MissingAttackerAction { attacker: caster });
        assert!(!pack.is_committed());
        assert!(sink.packs.is_empty());
        assert_eq!(region.get(EntityId(2)).unwrap().stun_ms, 0);
    }

    #[test]
    fn add_rejects_second_attacker_and_duplicate_targets() {
        let caster = EntityId(1);
        let mut pack = CombatActionPack::new(caster, SkillId::LIGHTNING_ROD);
        pack.add(attacker_action(caster)).unwrap();
        assert_eq!(
            pack.add(attacker_action(caster)),
            Err(PackError::DuplicateAttackerAction { attacker: caster })
        );
        pack.add(target_action(caster, 2, false)).unwrap();
        assert!(pack.add(target_action(caster, 2, false)).is_err());
        assert!(pack.add(target_action(EntityId(9), 3, false)).is_err());
    }
}
