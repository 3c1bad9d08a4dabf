use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, PlannerConfig, ProtectionMode};
use crate::dsa::graph::{Topology, WeightedPath};
use crate::scientific_computing::metrics::NetworkMetrics;
use super::DemandId;
use super::assignment::{AssignmentError, Lightpath};
use super::modulation::{max_capacity, select_modulation, split_traffic, RateGbps};
use super::protection::SharedRegistry;
use super::routing::{find_backup_path, generate_candidates, modulation_aware};
use super::spectrum::SpectrumState;

#[derive(Error,Debug,Clone,PartialEq)]
pub enum PlanError {
    #[error("Node {node} is not in the topology")]
    UnknownNode{node:usize},
    #[error("No path found from {from} to {to}")]
    NoPath{from:usize,to:usize},
    #[error("Demand volume {volume} Gbps is not a positive rate a link of this network can carry")]
    InvalidVolume{volume:RateGbps},
}

type Result<T> = std::result::Result<T,PlanError>;

#[derive(Clone,Copy,Debug,PartialEq,Serialize,Deserialize)]
pub struct Demand {
    pub source:usize,
    pub destination:usize,
    pub volume:RateGbps
}

// largest demands first, equal volumes keep their order
pub fn sort_by_volume_desc(demands:&mut [Demand]) {
    demands.sort_by(|a,b| b.volume.total_cmp(&a.volume));
}

#[derive(Clone,Debug,PartialEq)]
pub struct LightpathOutcome {
    pub volume:RateGbps,
    pub result:std::result::Result<Lightpath,AssignmentError>,
    // backup placed on a block already reserved by another demand
    pub shared:bool
}

#[derive(Clone,Debug,PartialEq)]
pub struct RouteResult {
    pub path:WeightedPath,
    pub modulation:&'static str,
    pub lightpaths:Vec<LightpathOutcome>
}

impl RouteResult {
    pub fn fsu_starts(&self) -> impl Iterator<Item = usize> + '_ {
        self.lightpaths.iter().filter_map(|outcome| outcome.result.as_ref().ok().map(|l| l.start))
    }
    pub fn is_complete(&self) -> bool {
        self.lightpaths.iter().all(|outcome| outcome.result.is_ok())
    }
}

#[derive(Clone,Debug,PartialEq)]
pub struct DemandResult {
    pub id:DemandId,
    pub demand:Demand,
    pub primary:RouteResult,
    // None when unprotected, or when no alternative to the primary exists
    pub backup:Option<RouteResult>
}

impl DemandResult {
    // primary starts first, then backup starts
    pub fn fsu_starts(&self) -> Vec<usize> {
        let mut starts:Vec<usize> = self.primary.fsu_starts().collect();
        if let Some(backup) = &self.backup {
            starts.extend(backup.fsu_starts());
        }
        starts
    }
}

/* greedy and order dependent, each demand sees the spectrum left by the ones before it.
sub-demands that fail are recorded, siblings already placed are kept */
pub struct Planner<'t> {
    topology:&'t Topology,
    config:PlannerConfig,
    spectrum:SpectrumState,
    registry:SharedRegistry,
    next_id:DemandId
}

impl<'t> Planner<'t> {
    pub fn new(topology:&'t Topology,config:PlannerConfig) -> std::result::Result<Self,ConfigError> {
        config.validate()?;
        Ok(Self {
            topology,
            spectrum:SpectrumState::new(topology, config.slot_count),
            config,
            registry:SharedRegistry::new(),
            next_id:0
        })
    }
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }
    pub fn spectrum(&self) -> &SpectrumState {
        &self.spectrum
    }
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }
    pub fn metrics(&self) -> NetworkMetrics {
        NetworkMetrics::collect(&self.spectrum, self.config.entropy_normalization)
    }
    pub fn into_state(self) -> (SpectrumState,SharedRegistry) {
        (self.spectrum,self.registry)
    }

    // one result per demand, in the given order, failures never stop the batch
    pub fn plan_all(&mut self,demands:&[Demand]) -> Vec<Result<DemandResult>> {
        demands.iter().map(|demand| self.plan(demand)).collect()
    }

    pub fn plan(&mut self,demand:&Demand) -> Result<DemandResult> {
        let id = self.next_id;
        self.next_id += 1;
        let Demand {source,destination,volume} = *demand;

        // every part takes at least one slot, so anything past slot_count full channels never fits
        let limit = self.config.slot_count as f64*max_capacity(0.0);
        if !volume.is_finite() || volume <= 0.0 || volume > limit {
            tracing::warn!("demand {id}: volume {volume} Gbps rejected, limit is {limit} Gbps");
            return Err(PlanError::InvalidVolume { volume });
        }

        for node in [source,destination] {
            if !self.topology.contains_node(node) {
                tracing::warn!("demand {id}: node {node} is not in the topology");
                return Err(PlanError::UnknownNode { node });
            }
        }

        let candidates = generate_candidates(self.topology, source, destination, self.config.k_paths);
        let selected = self.config.selector
            .select(&candidates, &self.spectrum, self.config.entropy_normalization)
            .ok_or(PlanError::NoPath { from: source, to: destination })
            .inspect_err(|_| tracing::warn!("demand {id}: no path found from {source} to {destination}"))?;
        let primary = match self.config.modulation_aware {
            true => modulation_aware(&candidates, selected),
            false => selected,
        };
        let primary = primary.clone();

        let backup = match self.config.protection {
            ProtectionMode::Unprotected => None,
            ProtectionMode::Dedicated | ProtectionMode::Shared => {
                let backup = find_backup_path(&candidates, &primary, &self.spectrum).cloned();
                if backup.is_none() {
                    tracing::warn!("demand {id}: no backup path from {source} to {destination}");
                }
                backup
            }
        };
        if self.config.protection == ProtectionMode::Shared {
            self.registry.register_primary(id, &primary);
        }

        let primary = self.route(id, demand, primary, false);
        let backup = backup.map(|path| self.route(id, demand, path, true));
        Ok(DemandResult {id,demand:*demand,primary,backup})
    }

    // splits the demand by what the path can carry and places every part
    fn route(&mut self,id:DemandId,demand:&Demand,path:WeightedPath,is_backup:bool) -> RouteResult {
        let modulation = select_modulation(path.weight).name;
        let role = if is_backup {"backup"} else {"primary"};
        let mut lightpaths = vec![];

        for volume in split_traffic(demand.volume, path.weight) {
            let (result,shared) = if is_backup && self.config.protection == ProtectionMode::Shared {
                match self.registry.shared_assignment(&path, id, volume, &mut self.spectrum) {
                    Ok(outcome) => (Ok(outcome.lightpath),outcome.reused),
                    Err(e) => (Err(e),false),
                }
            } else {
                (self.config.assigner.assign(&path, volume, &mut self.spectrum),false)
            };
            match &result {
                Ok(lightpath) => tracing::info!(
                    "demand {id} {}->{} ({volume} Gbps) {role} {:?}, {modulation}, {} FSU at {}{}",
                    demand.source,demand.destination,path.nodes,lightpath.slot_count,lightpath.start,
                    if shared {" (shared)"} else {""}
                ),
                Err(e) => tracing::warn!(
                    "demand {id} {}->{} ({volume} Gbps) {role} failed: {e}",demand.source,demand.destination
                ),
            }
            lightpaths.push(LightpathOutcome {volume,result,shared});
        }
        RouteResult {path,modulation,lightpaths}
    }
}
