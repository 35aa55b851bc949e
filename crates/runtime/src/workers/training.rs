//! Training observers fed from the progression topic.

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::warn;

use skill_core::training::TrainingGrant;
use skill_core::{EntityId, ProgressionEvent, Region, RegionId, TrainingObserver};

use crate::events::{Event, EventBus, ProgressionNotice, Topic};

/// A [`TrainingObserver`] holding its own [`Topic::Progression`] subscription.
///
/// Combat outcomes arrive in publish order, so each caster's events are
/// evaluated in the order the engine emitted them. Outcomes of other regions
/// and `Trained` notices are skipped. Dropping the subscriber unsubscribes it.
pub struct TrainingSubscriber {
    observer: TrainingObserver,
    region: RegionId,
    events: broadcast::Receiver<Event>,
}

impl TrainingSubscriber {
    pub fn new(observer: TrainingObserver, region: RegionId, bus: &EventBus) -> Self {
        Self {
            observer,
            region,
            events: bus.subscribe(Topic::Progression),
        }
    }

    pub fn observer(&self) -> &TrainingObserver {
        &self.observer
    }

    /// Outcomes of this region received since the last call, oldest first.
    pub fn pending(&mut self) -> Vec<ProgressionEvent> {
        let mut pending = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(Event::Progression(ProgressionNotice::Attacked { region, event }))
                    if region == self.region =>
                {
                    pending.push(event);
                }
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(
                        region = ?self.region,
                        skill = %self.observer.skill(),
                        skipped,
                        "training subscriber lagged behind the progression topic"
                    );
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        pending
    }

    /// Evaluates every pending outcome against its caster's skills.
    pub fn train(&mut self, region: &mut Region) -> Vec<(EntityId, TrainingGrant)> {
        let mut grants = Vec::new();
        for event in self.pending() {
            let caster = event.caster();
            let Some(combatant) = region.get_mut(caster) else {
                if event.skill() == self.observer.skill() {
                    warn!(caster = %caster, "progression event for a caster that left the region");
                }
                continue;
            };
            grants.extend(
                self.observer
                    .observe(&event, &mut combatant.skills)
                    .into_iter()
                    .map(|grant| (caster, grant)),
            );
        }
        grants
    }
}
