use std::collections::{BTreeMap, BTreeSet};

use crate::dsa::graph::{edge_key, WeightedPath};
use super::assignment::{requirement_for, Lightpath, Result, SpectrumAssigner};
use super::modulation::RateGbps;
use super::spectrum::SpectrumState;
use super::{DemandId, Link};

type HashMap<K,V> = std::collections::hash_map::HashMap<K,V,nohash::BuildNoHashHasher<usize>>;

// a backup block on one directed link and the demands protected by it
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct SharedBlock {
    pub slot_count:usize,
    pub demands:BTreeSet<DemandId>
}

#[derive(Clone,Debug,PartialEq)]
pub struct SharedOutcome {
    pub lightpath:Lightpath,
    // true when an existing block was reused without occupying new slots
    pub reused:bool
}

/* sharing is only safe between demands whose primaries cannot fail together,
so every demand's primary fibres are kept next to the backup blocks */
#[derive(Clone,Debug,Default)]
pub struct SharedRegistry {
    blocks:BTreeMap<Link,BTreeMap<usize,SharedBlock>>,
    primaries:HashMap<DemandId,BTreeSet<(usize,usize)>>
}

impl SharedRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    // records the fibres of a demand's primary path, replacing earlier ones
    pub fn register_primary(&mut self,demand:DemandId,primary:&WeightedPath) {
        let edges = primary.links().map(|(a,b)| edge_key(a, b)).collect();
        self.primaries.insert(demand, edges);
    }
    pub fn primary_links(&self,demand:DemandId) -> Option<&BTreeSet<(usize,usize)>> {
        self.primaries.get(&demand)
    }
    pub fn block(&self,link:Link,start:usize) -> Option<&SharedBlock> {
        self.blocks.get(&link)?.get(&start)
    }
    pub fn blocks_on(&self,link:Link) -> Option<&BTreeMap<usize,SharedBlock>> {
        self.blocks.get(&link)
    }

    fn primaries_overlap(&self,a:DemandId,b:DemandId) -> bool {
        let (Some(a),Some(b)) = (self.primaries.get(&a),self.primaries.get(&b)) else {
            return false;
        };
        !a.is_disjoint(b)
    }

    // true when `start` is a registered block wide enough on every link of the path
    // and no demand already on it has a primary sharing a fibre with `demand`'s
    pub fn can_reuse(&self,path:&WeightedPath,start:usize,slot_count:usize,demand:DemandId) -> bool {
        if !path.is_routable() {return false}
        for link in path.links() {
            let Some(block) = self.block(link, start) else {return false};
            if block.slot_count < slot_count {return false}
            if block.demands.iter().any(|other| self.primaries_overlap(*other, demand)) {
                return false;
            }
        }
        true
    }

    // joins the first reusable block, otherwise takes a fresh best-fit block
    // and opens it for sharing, nothing is recorded on failure
    pub fn shared_assignment(&mut self,path:&WeightedPath,demand:DemandId,volume:RateGbps,
        state:&mut SpectrumState) -> Result<SharedOutcome> {
        let requirement = requirement_for(path, volume)?;
        let slot_count = requirement.slot_count;

        let reusable = path.links().next()
            .and_then(|first| self.blocks.get(&first))
            .and_then(|starts| {
                starts.keys().copied().find(|start| self.can_reuse(path, *start, slot_count, demand))
            });

        if let Some(start) = reusable {
            for link in path.links() {
                if let Some(block) = self.blocks.get_mut(&link).and_then(|starts| starts.get_mut(&start)) {
                    block.demands.insert(demand);
                }
            }
            tracing::debug!("demand {demand} shares backup block {start} on {:?}",path.nodes);
            return Ok(SharedOutcome {
                lightpath:Lightpath {
                    nodes:path.nodes.clone(),
                    start,
                    slot_count,
                    modulation:requirement.modulation_name()
                },
                reused:true
            });
        }

        let lightpath = SpectrumAssigner::BestFit.assign(path, volume, state)?;
        for link in path.links() {
            let block = SharedBlock {
                slot_count:lightpath.slot_count,
                demands:BTreeSet::from([demand])
            };
            self.blocks.entry(link).or_default().insert(lightpath.start, block);
        }
        Ok(SharedOutcome {lightpath,reused:false})
    }
}

#[cfg(test)]
mod tests {
    use crate::dsa::graph::{Topology, WeightedPath};
    use crate::optical_network::assignment::AssignmentError;
    use crate::optical_network::spectrum::SpectrumState;
    use super::SharedRegistry;

    /* two primaries 1-2-3 and 4-5-6 with a common backup corridor 7-8
       1 - 2 - 3     4 - 5 - 6
        \     /       \     /
         7 ------------ 8      */
    fn topology() -> Topology {
        Topology::from_edges([
            (1,2,100.0),(2,3,100.0),(4,5,100.0),(5,6,100.0),
            (7,8,100.0),(2,5,100.0),(3,6,100.0),(1,7,100.0),(4,7,100.0),
        ]).unwrap()
    }
    fn path(nodes:&[usize]) -> WeightedPath {
        WeightedPath {nodes:nodes.to_vec(),weight:200.0}
    }

    #[test]
    fn test_disjoint_primaries_share() {
        let topology = topology();
        let mut state = SpectrumState::new(&topology, 320);
        let mut registry = SharedRegistry::new();
        registry.register_primary(0, &path(&[1,2,3]));
        registry.register_primary(1, &path(&[4,5,6]));
        let backup = path(&[1,7,8]);

        let first = registry.shared_assignment(&backup, 0, 100.0, &mut state).unwrap();
        assert!(!first.reused);
        let used = state.used_slots((7,8));
        assert_eq!(used,first.lightpath.slot_count);

        let second = registry.shared_assignment(&backup, 1, 100.0, &mut state).unwrap();
        assert!(second.reused);
        assert_eq!(second.lightpath.start,first.lightpath.start);
        // no extra slots consumed by the second backup
        assert_eq!(state.used_slots((7,8)),used);
        let block = registry.block((7,8), first.lightpath.start).unwrap();
        assert_eq!(block.demands.iter().copied().collect::<Vec<_>>(),vec![0,1]);
    }
    #[test]
    fn test_overlapping_primaries_never_share() {
        let topology = topology();
        let mut state = SpectrumState::new(&topology, 320);
        let mut registry = SharedRegistry::new();
        registry.register_primary(0, &path(&[1,2,3]));
        // shares fibre 2 - 3, travelled the other way
        registry.register_primary(1, &path(&[6,3,2,5]));
        let backup = path(&[1,7,8]);

        let first = registry.shared_assignment(&backup, 0, 100.0, &mut state).unwrap();
        let second = registry.shared_assignment(&backup, 1, 100.0, &mut state).unwrap();
        assert!(!second.reused);
        assert_ne!(first.lightpath.start,second.lightpath.start);
        assert!(!registry.can_reuse(&backup, first.lightpath.start, 1, 1));
        assert_eq!(state.used_slots((7,8)),first.lightpath.slot_count + second.lightpath.slot_count);
    }
    #[test]
    fn test_reuse_requires_every_link() {
        let topology = topology();
        let mut state = SpectrumState::new(&topology, 320);
        let mut registry = SharedRegistry::new();
        registry.register_primary(0, &path(&[1,2,3]));
        registry.register_primary(1, &path(&[4,5,6]));
        let first = registry.shared_assignment(&path(&[1,7]), 0, 100.0, &mut state).unwrap();
        // block exists on 1 - 7 only, 7 - 8 has nothing registered
        assert!(!registry.can_reuse(&path(&[1,7,8]), first.lightpath.start, 1, 1));
        assert!(registry.can_reuse(&path(&[1,7]), first.lightpath.start, 1, 1));
        assert!(registry.blocks_on((7,8)).is_none());
    }
    #[test]
    fn test_reuse_requires_width() {
        let topology = topology();
        let mut state = SpectrumState::new(&topology, 320);
        let mut registry = SharedRegistry::new();
        registry.register_primary(0, &path(&[1,2,3]));
        registry.register_primary(1, &path(&[4,5,6]));
        let backup = path(&[1,7,8]);
        // 50 Gbps takes 1 slot, 400 Gbps takes 6
        let narrow = registry.shared_assignment(&backup, 0, 50.0, &mut state).unwrap();
        let wide = registry.shared_assignment(&backup, 1, 400.0, &mut state).unwrap();
        assert!(!wide.reused);
        assert_ne!(narrow.lightpath.start,wide.lightpath.start);
    }
    #[test]
    fn test_failed_fallback_records_nothing() {
        let topology = topology();
        let mut state = SpectrumState::new(&topology, 4);
        let mut registry = SharedRegistry::new();
        registry.register_primary(0, &path(&[1,2,3]));
        // 400 Gbps needs 6 slots, only 4 exist
        let err = registry.shared_assignment(&path(&[1,7,8]), 0, 400.0, &mut state).unwrap_err();
        assert_eq!(err,AssignmentError::NoSpectrumBlock { slots_needed: 6 });
        assert!(registry.blocks_on((1,7)).is_none());
        assert_eq!(state.used_slots((1,7)),0);
    }
}
