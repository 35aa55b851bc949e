//! Attacker and target actions carried by a combat action pack.

use bitflags::bitflags;

use crate::state::{EntityId, Position, PropId, RegionId, SkillId};

use super::damage::KnockbackDecision;

bitflags! {
    /// Presentation flags of the attacker side of a pack.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct AttackerOptions: u32 {
        /// Targets are knocked back by this hit.
        const KNOCKBACK_HIT = 1 << 0;
        /// Client plays the skill's effect at the target area.
        const USE_EFFECT    = 1 << 1;
    }
}

bitflags! {
    /// Per-target outcome flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct TargetOptions: u32 {
        const CRITICAL            = 1 << 0;
        const KNOCKDOWN           = 1 << 1;
        const FINISHING_KNOCKDOWN = 1 << 2;
        /// Damage was partly or fully absorbed by a shield.
        const SHIELDED            = 1 << 3;
    }
}

/// Packed `(region, x, y)` identifier of a target area.
///
/// Coordinates are quantized to 20-unit cells, matching the client's
/// location id format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationId(pub u64);

impl LocationId {
    const CELL: i32 = 20;
    const TAG: u64 = 0x3000_0000_0000_0000;

    pub fn new(region: RegionId, position: Position) -> Self {
        let x = (position.x.max(0) / Self::CELL) as u64 & 0xFFFF;
        let y = (position.y.max(0) / Self::CELL) as u64 & 0xFFFF;
        let region = (u64::from(region.0) & 0x0FFF_FFFF) << 32;
        Self(Self::TAG | region | x << 16 | y)
    }

    pub fn region(self) -> RegionId {
        RegionId(((self.0 >> 32) & 0x0FFF_FFFF) as u32)
    }

    /// Cell origin of the packed coordinate.
    pub fn position(self) -> Position {
        let x = ((self.0 >> 16) & 0xFFFF) as i32 * Self::CELL;
        let y = (self.0 & 0xFFFF) as i32 * Self::CELL;
        Position::new(x, y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackerActionKind {
    /// Skill attack that hits an area rather than a single locked target.
    SpecialHit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetActionKind {
    TakeHit,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackerAction {
    pub kind: AttackerActionKind,
    pub entity: EntityId,
    pub skill: SkillId,
    pub target_area: LocationId,
    /// Marker prop placed at the target area, if any.
    pub prop: Option<PropId>,
    pub options: AttackerOptions,
    pub full_charge: bool,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetAction {
    pub kind: TargetActionKind,
    pub entity: EntityId,
    pub attacker: EntityId,
    /// Skill the reaction is attributed to.
    pub skill: SkillId,
    pub damage: f32,
    pub stun_ms: u32,
    pub options: TargetOptions,
    pub knockback: KnockbackDecision,
    /// Where the target ends up once knockback is applied.
    pub shove_to: Option<Position>,
    pub died: bool,
}

impl TargetAction {
    pub fn is_critical(&self) -> bool {
        self.options.contains(TargetOptions::CRITICAL)
    }
}

/// Either side of a pack.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatAction {
    Attacker(AttackerAction),
    Target(TargetAction),
}

impl From<AttackerAction> for CombatAction {
    fn from(action: AttackerAction) -> Self {
        Self::Attacker(action)
    }
}

impl From<TargetAction> for CombatAction {
    fn from(action: TargetAction) -> Self {
        Self::Target(action)
    }
}
