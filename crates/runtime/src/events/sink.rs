//! Engine sinks backed by the event bus.

use tracing::debug;

use skill_core::{
    BroadcastSink, CombatActionPack, EffectNotice, EntityId, ProgressionEvent, ProgressionSink,
    RegionId, SkillId, SkillNotice,
};

use super::bus::{Event, EventBus};
use super::types::{CombatEvent, NotificationEvent, ProgressionNotice};

/// Broadcasts packs, notices and combat outcomes of one region to every
/// subscriber.
#[derive(Clone)]
pub struct BusSink {
    bus: EventBus,
    region: RegionId,
}

impl BusSink {
    pub fn new(bus: EventBus, region: RegionId) -> Self {
        Self { bus, region }
    }
}

impl BroadcastSink for BusSink {
    fn publish(&mut self, pack: &CombatActionPack) {
        debug!(
            region = ?self.region,
            caster = %pack.attacker(),
            skill = %pack.skill(),
            targets = pack.targets().len(),
            defeated = pack.defeated(),
            "combat action pack published"
        );
        self.bus.publish(Event::Combat(CombatEvent::PackPublished {
            region: self.region,
            pack: Box::new(pack.clone()),
        }));
    }

    fn notify_effect(&mut self, entity: EntityId, effect: EffectNotice) {
        self.bus
            .publish(Event::Notification(NotificationEvent::Effect {
                region: self.region,
                entity,
                effect,
            }));
    }

    fn notify_skill(&mut self, entity: EntityId, skill: SkillId, notice: SkillNotice) {
        if let SkillNotice::Cancel { silent: true } = notice {
            debug!(caster = %entity, skill = %skill, "cast silently canceled");
        }
        self.bus
            .publish(Event::Notification(NotificationEvent::Skill {
                region: self.region,
                entity,
                skill,
                notice,
            }));
    }
}

impl ProgressionSink for BusSink {
    fn emit(&mut self, event: ProgressionEvent) {
        self.bus
            .publish(Event::Progression(ProgressionNotice::Attacked {
                region: self.region,
                event,
            }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Topic;
    use skill_core::training::TargetAttacked;

    #[tokio::test]
    async fn outcomes_are_published_on_the_progression_topic() {
        let bus = EventBus::with_capacity(4);
        let mut rx = bus.subscribe(Topic::Progression);
        let mut sink = BusSink::new(bus, RegionId(3));

        let event = ProgressionEvent::TargetAttacked(TargetAttacked {
            caster: EntityId(1),
            target: EntityId(2),
            skill: SkillId::LIGHTNING_ROD,
            target_died: true,
            full_charge: false,
            defeated_in_pack: 1,
        });
        sink.emit(event.clone());

        match rx.recv().await.unwrap() {
            Event::Progression(ProgressionNotice::Attacked { region, event: seen }) => {
                assert_eq!(region, RegionId(3));
                assert_eq!(seen, event);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }
}
