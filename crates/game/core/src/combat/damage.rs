//! Staged damage resolution for one attacker/target pair.
//!
//! The stages run in a fixed order; reordering them changes balance:
//!
//! ```text
//! base roll -> charge bonus -> critical -> defense/protection
//!           -> shield absorption -> deflection -> health
//! ```

use crate::config::CombatConfig;
use crate::env::{RankParams, RngOracle};
use crate::error::{ErrorSeverity, GameError};
use crate::state::{Combatant, DeflectorState, EntityId, ShieldState, Stance};

// ============================================================================
// Inputs & Outputs
// ============================================================================

/// Per-cast constants shared by every target of one use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitSpec {
    pub params: RankParams,
    pub full_charge: bool,
    pub base_stun_ms: u32,
    pub knockback_distance: f64,
}

/// Random inputs of one hit, rolled up front so resolution stays pure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitRolls {
    /// Base damage in `[min_damage, max_damage]`.
    pub base: u32,
    /// d100 compared against the effective critical chance.
    pub critical: u32,
}

/// Forced movement applied to a target.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KnockbackDecision {
    #[default]
    None,
    KnockDown {
        distance: f64,
    },
    /// The hit killed the target.
    FinishingKnockDown {
        distance: f64,
    },
}

impl KnockbackDecision {
    pub fn distance(self) -> Option<f64> {
        match self {
            Self::None => None,
            Self::KnockDown { distance } | Self::FinishingKnockDown { distance } => Some(distance),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageOutcome {
    /// Damage that reached the health pool.
    pub amount: f32,
    pub is_critical: bool,
    pub shield_absorbed: f32,
    pub stun_ms: u32,
    pub knockback: KnockbackDecision,
    pub target_died: bool,
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DamageError {
    #[error("damage {amount} against {target} is negative or not finite")]
    InvalidAmount { target: EntityId, amount: f32 },
}

impl GameError for DamageError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "DAMAGE_INVALID_AMOUNT",
        }
    }
}

// ============================================================================
// Stages
// ============================================================================

/// Stage 2: multiply by `1 + bonus/100` when the cast was fully charged.
pub fn apply_charge_bonus(amount: f32, full_charge: bool, bonus_percent: u32) -> f32 {
    if full_charge {
        amount * (1.0 + bonus_percent as f32 / 100.0)
    } else {
        amount
    }
}

/// Stage 3: upgrade to a critical hit.
///
/// The attacker's chance is lowered by the target's protection and capped by
/// the config; the hit is critical when `roll` (1-100) falls at or below it.
pub fn apply_critical(
    amount: f32,
    critical_chance: f32,
    target_protection: f32,
    roll: u32,
    config: &CombatConfig,
) -> (f32, bool) {
    let effective = (critical_chance - target_protection).clamp(0.0, config.critical_chance_cap);
    if effective > 0.0 && roll as f32 <= effective {
        (amount * config.critical_multiplier, true)
    } else {
        (amount, false)
    }
}

/// Stage 4: flat defense, then percent protection.
///
/// Never negative. A hit that carried damage into this stage keeps at least
/// `min_hit_damage`.
pub fn apply_mitigation(amount: f32, defense: f32, protection: f32, config: &CombatConfig) -> f32 {
    if amount <= 0.0 {
        return 0.0;
    }
    let reduced = (amount - defense.max(0.0)).max(0.0);
    let protected = reduced * (1.0 - protection.clamp(0.0, 100.0) / 100.0);
    protected.max(config.min_hit_damage.min(amount)).max(0.0)
}

/// Stage 5: the shield soaks damage from its pool.
///
/// Returns `(remaining, absorbed)`. An emptied shield deactivates.
pub fn absorb_with_shield(amount: f32, shield: &mut Option<ShieldState>) -> (f32, f32) {
    let Some(state) = shield.as_mut().filter(|s| s.active) else {
        return (amount, 0.0);
    };
    let capacity = state.pool * state.efficiency;
    let absorbed = amount.min(capacity).max(0.0);
    state.pool = (state.pool - absorbed / state.efficiency).max(0.0);
    if state.pool <= 0.0 {
        state.active = false;
    }
    (amount - absorbed, absorbed)
}

/// Stage 6: the deflector shaves damage and reports how much to cut the stun.
///
/// Returns `(remaining, delay_reduction_percent)`.
pub fn deflect(amount: f32, deflector: Option<DeflectorState>) -> (f32, u8) {
    match deflector.filter(|d| d.active) {
        Some(d) => (
            (amount * (1.0 - d.damage_reduction_percent / 100.0)).max(0.0),
            d.delay_reduction_percent,
        ),
        None => (amount, 0),
    }
}

/// Base stun shortened by a percentage, floored at zero.
pub fn reduce_stun(base_stun_ms: u32, delay_reduction_percent: u8) -> u32 {
    let cut = base_stun_ms / 100 * u32::from(delay_reduction_percent.min(100));
    base_stun_ms.saturating_sub(cut)
}

/// Knockback for a target after damage was applied.
pub fn decide_knockback(target: &Combatant, distance: f64) -> KnockbackDecision {
    if target.is_dead() {
        KnockbackDecision::FinishingKnockDown { distance }
    } else if target.stance == Stance::KnockDownable {
        KnockbackDecision::KnockDown { distance }
    } else {
        KnockbackDecision::None
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Runs every stage for one pair and applies the result to the target.
#[derive(Clone, Copy, Debug)]
pub struct DamagePipeline<'a> {
    config: &'a CombatConfig,
}

impl<'a> DamagePipeline<'a> {
    pub fn new(config: &'a CombatConfig) -> Self {
        Self { config }
    }

    /// Stage 1: uniform integer in `[min_damage, max_damage]`.
    pub fn roll_base(params: &RankParams, rng: &(impl RngOracle + ?Sized), seed: u64) -> u32 {
        rng.range(seed, params.min_damage, params.max_damage)
    }

    /// Resolves one hit.
    ///
    /// Mutates the target's health and shield. Stun and knockback are only
    /// decided here; moving the target and writing its stun timer happen when
    /// the pack commits.
    ///
    /// # Errors
    ///
    /// `DamageError::InvalidAmount` if a stage produced a negative or
    /// non-finite amount. The target is left untouched in that case.
    pub fn resolve(
        &self,
        attacker: &Combatant,
        target: &mut Combatant,
        hit: &HitSpec,
        rolls: HitRolls,
    ) -> Result<DamageOutcome, DamageError> {
        let amount = rolls.base as f32;
        let amount = apply_charge_bonus(amount, hit.full_charge, hit.params.charge_bonus_percent);
        let (amount, is_critical) = apply_critical(
            amount,
            attacker.offense.critical_chance,
            target.defense.protection,
            rolls.critical,
            self.config,
        );
        let amount = apply_mitigation(
            amount,
            target.defense.defense,
            target.defense.protection,
            self.config,
        );

        let mut shield = target.defense.shield;
        let (amount, shield_absorbed) = absorb_with_shield(amount, &mut shield);
        let (amount, delay_reduction) = deflect(amount, target.defense.deflector);

        if !amount.is_finite() || amount < 0.0 {
            return Err(DamageError::InvalidAmount {
                target: target.id,
                amount,
            });
        }

        target.defense.shield = shield;
        target.health.drain(amount);

        Ok(DamageOutcome {
            amount,
            is_critical,
            shield_absorbed,
            stun_ms: reduce_stun(hit.base_stun_ms, delay_reduction),
            knockback: decide_knockback(target, hit.knockback_distance),
            target_died: target.is_dead(),
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::env::PcgRng;
    use crate::state::{DefenseProfile, Position, RegionId};

    fn combatant(id: u64, health: f32) -> Combatant {
        Combatant::new(EntityId(id), RegionId(1), Position::ORIGIN, health)
    }

    fn spec(min: u32, max: u32) -> HitSpec {
        HitSpec {
            params: RankParams::new(min, max).with_charge(5_000, 20),
            full_charge: false,
            base_stun_ms: 2_000,
            knockback_distance: 720.0,
        }
    }

    const NO_CRIT: u32 = 100;

    fn rolls(base: u32) -> HitRolls {
        HitRolls {
            base,
            critical: NO_CRIT,
        }
    }

    #[test]
    fn charge_bonus_range() {
        let config = CombatConfig::default();
        let pipeline = DamagePipeline::new(&config);
        let attacker = combatant(1, 100.0);
        let mut hit = spec(50, 70);
        hit.full_charge = true;

        for base in 50..=70 {
            let mut target = combatant(2, 1_000.0);
            let outcome = pipeline
                .resolve(&attacker, &mut target, &hit, rolls(base))
                .unwrap();
            assert!((60.0..=84.0).contains(&outcome.amount), "{}", outcome.amount);
            assert!(!outcome.is_critical);
        }
    }

    #[test]
    fn lethal_hit_finishes_with_single_knockback() {
        let config = CombatConfig::default();
        let pipeline = DamagePipeline::new(&config);
        let attacker = combatant(1, 100.0);
        let mut target = combatant(2, 10.0);

        let outcome = pipeline
            .resolve(&attacker, &mut target, &spec(25, 25), rolls(25))
            .unwrap();

        assert_eq!(outcome.amount, 25.0);
        assert!(target.is_dead());
        assert!(outcome.target_died);
        assert_eq!(
            outcome.knockback,
            KnockbackDecision::FinishingKnockDown { distance: 720.0 }
        );
    }

    #[test]
    fn immovable_targets_are_not_knocked_down() {
        let config = CombatConfig::default();
        let pipeline = DamagePipeline::new(&config);
        let attacker = combatant(1, 100.0);
        let mut target = combatant(2, 500.0).with_stance(Stance::Immovable);

        let outcome = pipeline
            .resolve(&attacker, &mut target, &spec(10, 10), rolls(10))
            .unwrap();
        assert_eq!(outcome.knockback, KnockbackDecision::None);
        assert_eq!(outcome.stun_ms, 2_000);
    }

    #[test]
    fn critical_chance_is_reduced_by_protection() {
        let config = CombatConfig::default();
        let critical =
            |chance, protection, roll| apply_critical(100.0, chance, protection, roll, &config);
        assert_eq!(critical(20.0, 0.0, 20), (150.0, true));
        assert_eq!(critical(20.0, 0.0, 21), (100.0, false));
        assert_eq!(critical(20.0, 15.0, 6), (100.0, false));
        assert_eq!(critical(80.0, 0.0, 31), (100.0, false));
    }

    #[test]
    fn shield_depletes_and_deactivates() {
        let mut shield = Some(ShieldState::new(10.0, 2.0));
        let (rest, absorbed) = absorb_with_shield(15.0, &mut shield);
        assert_eq!((rest, absorbed), (0.0, 15.0));
        assert!(shield.unwrap().active);

        let (rest, absorbed) = absorb_with_shield(15.0, &mut shield);
        assert_eq!((rest, absorbed), (10.0, 5.0));
        assert!(!shield.unwrap().active);

        let (rest, absorbed) = absorb_with_shield(15.0, &mut shield);
        assert_eq!((rest, absorbed), (15.0, 0.0));
    }

    #[test]
    fn deflector_shortens_stun() {
        let config = CombatConfig::default();
        let pipeline = DamagePipeline::new(&config);
        let attacker = combatant(1, 100.0);
        let mut target = combatant(2, 500.0)
            .with_defense(DefenseProfile::default().with_deflector(DeflectorState::new(50.0, 25)));

        let outcome = pipeline
            .resolve(&attacker, &mut target, &spec(40, 40), rolls(40))
            .unwrap();
        assert_eq!(outcome.amount, 20.0);
        assert_eq!(outcome.stun_ms, 1_500);
        assert_eq!(reduce_stun(2_000, 100), 0);
    }

    #[test]
    fn mitigation_never_goes_negative() {
        let config = CombatConfig::default();
        assert_eq!(apply_mitigation(50.0, 80.0, 0.0, &config), 1.0);
        assert_eq!(apply_mitigation(0.0, 80.0, 0.0, &config), 0.0);
        assert_eq!(apply_mitigation(100.0, 20.0, 50.0, &config), 40.0);
    }

    #[test]
    fn roll_base_stays_in_rank_range() {
        let params = RankParams::new(50, 70);
        for seed in 0..500 {
            let roll = DamagePipeline::roll_base(&params, &PcgRng, seed);
            assert!((50..=70).contains(&roll));
        }
    }

    proptest! {
        #[test]
        fn applied_damage_is_never_negative(
            base in 0u32..10_000,
            defense in 0.0f32..5_000.0,
            protection in 0.0f32..100.0,
            pool in 0.0f32..5_000.0,
            efficiency in 0.1f32..10.0,
            reduction in 0.0f32..100.0,
            delay in 0u8..=100,
            critical in 1u32..=100,
            full_charge in any::<bool>(),
        ) {
            let config = CombatConfig::default();
            let pipeline = DamagePipeline::new(&config);
            let attacker = combatant(1, 100.0).with_critical_chance(25.0);
            let mut target = combatant(2, 1_000.0).with_defense(
                DefenseProfile::new(defense, protection)
                    .with_shield(ShieldState::new(pool, efficiency))
                    .with_deflector(DeflectorState::new(reduction, delay)),
            );
            let mut hit = spec(0, 10_000);
            hit.full_charge = full_charge;

            let before = target.health.current;
            let outcome = pipeline
                .resolve(&attacker, &mut target, &hit, HitRolls { base, critical })
                .unwrap();
            prop_assert!(outcome.amount >= 0.0);
            prop_assert!(target.health.current <= before);
            prop_assert!(outcome.stun_ms <= hit.base_stun_ms);
        }
    }
}
