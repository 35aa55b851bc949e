//! Scripted demo cast: one caster charges a Lightning Rod into a line of
//! monsters while every published event is printed as JSON.
use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::{info, warn};

use channel_runtime::{Event, Runtime, Topic};
use skill_core::skill::PrepareOutcome;
use skill_core::state::{ItemId, SkillSet};
use skill_core::{
    Combatant, EntityId, Facing, Faction, Position, Region, RegionId, SkillId, SkillRank,
};

const ARENA: RegionId = RegionId(1);
const CASTER: EntityId = EntityId(1);

/// How long the caster holds the charge before releasing.
const CHARGE_HOLD: Duration = Duration::from_millis(3_000);

pub fn arena() -> Region {
    let mut region = Region::new(ARENA);
    let caster = Combatant::new(CASTER, ARENA, Position::ORIGIN, 120.0)
        .with_faction(Faction::PLAYERS)
        .with_facing(Facing::from_byte(0))
        .with_mana(60.0)
        .with_right_hand(ItemId(40_001))
        .with_skills(SkillSet::new().with_skill(SkillId::LIGHTNING_ROD, SkillRank::RB));

    let monsters = [(2, 700, 60.0), (3, 1_100, 300.0), (4, 1_600, 80.0)]
        .into_iter()
        .map(|(id, x, health)| {
            Combatant::new(EntityId(id), ARENA, Position::new(x, 40), health)
                .with_faction(Faction::MONSTERS)
        });

    for combatant in std::iter::once(caster).chain(monsters) {
        if let Err(err) = region.spawn(combatant) {
            warn!("demo spawn skipped: {err}");
        }
    }
    region
}

pub async fn run(runtime: Runtime) -> Result<()> {
    let printers: Vec<_> = Topic::ALL
        .into_iter()
        .map(|topic| tokio::spawn(print_events(topic, runtime.subscribe(topic))))
        .collect();

    let handle = runtime.region(ARENA)?;
    match handle.prepare(CASTER, SkillId::LIGHTNING_ROD).await? {
        PrepareOutcome::Ready => {
            tokio::time::sleep(CHARGE_HOLD).await;
            let report = handle.use_skill(CASTER, SkillId::LIGHTNING_ROD).await?;
            info!(
                targets = report.targets.len(),
                defeated = report.defeated,
                full_charge = report.full_charge,
                "demo cast finished"
            );
        }
        PrepareOutcome::SilentCancel(reason) => {
            warn!(?reason, "demo cast was canceled before it started");
        }
    }

    drop(handle);
    runtime.shutdown().await?;
    for printer in printers {
        printer.await?;
    }
    Ok(())
}

/// Prints one topic until the bus closes.
async fn print_events(topic: Topic, mut rx: Receiver<Event>) {
    loop {
        match rx.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(err) => warn!(?topic, "failed to encode event: {err}"),
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!(?topic, skipped, "event printer lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
