//! High-level runtime orchestrator.
//!
//! The runtime owns one worker per hosted region, wires up command/event
//! channels, and exposes a builder-based API for embedding the skill engine.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::info;

use skill_content::LoadedSkills;
use skill_core::{CombatConfig, Region, RegionId};

use crate::api::{RegionHandle, Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::oracle::{GridSpatialIndex, OracleManager};
use crate::workers::{Command, RegionWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub combat: CombatConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// How often each region runs its due timers.
    pub tick_interval: Duration,
    pub spatial_cell_size: i32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            combat: CombatConfig::default(),
            event_buffer_size: 100,
            command_buffer_size: 32,
            tick_interval: Duration::from_millis(100),
            spatial_cell_size: GridSpatialIndex::DEFAULT_CELL_SIZE,
        }
    }
}

/// Main runtime hosting every region worker
///
/// Design: Runtime owns workers and coordinates shutdown.
/// [`RegionHandle`] provides a cloneable façade per region.
pub struct Runtime {
    event_bus: EventBus,
    regions: BTreeMap<RegionId, RegionHandle>,
    workers: Vec<JoinHandle<()>>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to one region
    pub fn region(&self, id: RegionId) -> Result<RegionHandle> {
        self.regions
            .get(&id)
            .cloned()
            .ok_or(RuntimeError::UnknownRegion(id))
    }

    pub fn regions(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.regions.keys().copied()
    }

    /// Subscribe to events of every region on one topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Shutdown the runtime gracefully
    ///
    /// Workers stop once every outstanding [`RegionHandle`] is dropped.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.regions);

        for worker in self.workers {
            worker.await.map_err(RuntimeError::WorkerJoin)?;
        }

        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    oracles: Option<OracleManager>,
    regions: Vec<Region>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            oracles: None,
            regions: Vec::new(),
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set required oracle manager
    pub fn oracles(mut self, oracles: OracleManager) -> Self {
        self.oracles = Some(oracles);
        self
    }

    /// Set oracles from loaded skill content
    pub fn content(self, content: LoadedSkills) -> Self {
        self.oracles(OracleManager::from_content(content))
    }

    /// Host a region; its combatants come along as they are.
    pub fn region(mut self, region: Region) -> Self {
        self.regions.push(region);
        self
    }

    /// Build the runtime and start one worker per region
    pub async fn build(self) -> Result<Runtime> {
        let oracles = self.oracles.ok_or(RuntimeError::MissingContent)?;
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let mut regions = BTreeMap::new();
        let mut workers = Vec::with_capacity(self.regions.len());
        for region in self.regions {
            let id = region.id;
            if regions.contains_key(&id) {
                return Err(RuntimeError::DuplicateRegion(id));
            }

            let (command_tx, command_rx) =
                mpsc::channel::<Command>(self.config.command_buffer_size.max(1));
            let worker = RegionWorker::new(
                region,
                oracles.clone(),
                &self.config,
                command_rx,
                event_bus.clone(),
            );
            workers.push(tokio::spawn(async move {
                worker.run().await;
            }));
            regions.insert(id, RegionHandle::new(id, command_tx, event_bus.clone()));
        }

        info!(
            regions = regions.len(),
            tick_ms = self.config.tick_interval.as_millis() as u64,
            "runtime started"
        );

        Ok(Runtime {
            event_bus,
            regions,
            workers,
        })
    }
}
