use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dsa::bitset::BitSet;
use crate::dsa::graph::WeightedPath;
use super::modulation::{required_fsus, FsuRequirement, RateGbps};
use super::spectrum::{SpectrumError, SpectrumState};

#[derive(Error,Debug,Clone,PartialEq)]
pub enum AssignmentError {
    #[error("No block of {slots_needed} contiguous slots is free on every link of the path")]
    NoSpectrumBlock{slots_needed:usize},
    #[error("Demand volume {volume} Gbps is not a positive finite rate")]
    InvalidDemand{volume:RateGbps},
    #[error(transparent)]
    Spectrum(#[from] SpectrumError),
}

pub(crate) type Result<T> = std::result::Result<T,AssignmentError>;

// one end-to-end channel, occupies slots start..start+slot_count on every hop
#[derive(Clone,Debug,PartialEq)]
pub struct Lightpath {
    pub nodes:Vec<usize>,
    pub start:usize,
    pub slot_count:usize,
    pub modulation:&'static str
}

impl Lightpath {
    pub fn slots(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.slot_count
    }
}

#[derive(Clone,Copy,Debug,PartialEq,Eq,Default,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumAssigner {
    FirstFit,
    #[default]
    BestFit,
    MostUsed,
}

pub(crate) fn requirement_for(path:&WeightedPath,demand:RateGbps) -> Result<FsuRequirement> {
    if !demand.is_finite() || demand <= 0.0 {
        return Err(AssignmentError::InvalidDemand { volume: demand });
    }
    Ok(required_fsus(demand, path.weight))
}

impl SpectrumAssigner {
    // picks a block and occupies it on every link of the path,
    // the state is left untouched on any error
    pub fn assign(&self,path:&WeightedPath,demand:RateGbps,state:&mut SpectrumState) -> Result<Lightpath> {
        let requirement = requirement_for(path, demand)?;
        let mask = state.availability_mask(&path.nodes)?;
        let slot_count = requirement.slot_count;

        let start = match self {
            Self::FirstFit => first_fit(&mask, slot_count),
            Self::BestFit => best_fit(&mask, slot_count),
            Self::MostUsed => most_used(&mask, slot_count, &state.slot_usage()),
        }.ok_or(AssignmentError::NoSpectrumBlock { slots_needed: slot_count })?;

        state.occupy(&path.nodes, start..start + slot_count)?;
        tracing::debug!("{:?} placed {slot_count} slots at {start} on {:?}",self,path.nodes);

        Ok(Lightpath {
            nodes:path.nodes.clone(),
            start,
            slot_count,
            modulation:requirement.modulation_name()
        })
    }
}

// lowest index whose window is entirely free
pub fn first_fit(mask:&BitSet,slot_count:usize) -> Option<usize> {
    if slot_count > mask.len() {return None}
    (0..=mask.len() - slot_count).find(|start| mask.all_in(*start..start + slot_count, true))
}

// start of the smallest free run that still holds the window, first one on ties
pub fn best_fit(mask:&BitSet,slot_count:usize) -> Option<usize> {
    let mut best:Option<(usize,usize)> = None;
    for (start,len) in mask.runs(true) {
        if len < slot_count {continue}
        if best.is_none_or(|(_,best_len)| len < best_len) {
            best = Some((start,len));
        }
    }
    best.map(|(start,_)| start)
}

// windows ranked by summed network usage, highest first, lower index on ties
pub fn most_used(mask:&BitSet,slot_count:usize,usage:&[usize]) -> Option<usize> {
    if slot_count > mask.len() || usage.len() != mask.len() {return None}
    let mut windows:Vec<(usize,usize)> = (0..=mask.len() - slot_count)
        .map(|start| (usage[start..start + slot_count].iter().sum(),start))
        .collect();
    // stable, equal scores keep ascending start order
    windows.sort_by(|a,b| b.0.cmp(&a.0));
    windows.into_iter()
        .map(|(_,start)| start)
        .find(|start| mask.all_in(*start..start + slot_count, true))
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use crate::dsa::bitset::BitSet;
    use crate::dsa::graph::{Topology, WeightedPath};
    use crate::optical_network::spectrum::SpectrumState;
    use super::{best_fit, first_fit, most_used, AssignmentError, SpectrumAssigner};

    fn mask(bits:&[u8]) -> BitSet {
        bits.iter().map(|b| *b == 1).collect()
    }
    fn line() -> (Topology,WeightedPath) {
        let topology = Topology::from_edges([(1,2,300.0),(2,3,200.0)]).unwrap();
        let path = WeightedPath {nodes:vec![1,2,3],weight:500.0};
        (topology,path)
    }

    #[test]
    fn test_three_node_best_fit() {
        let (topology,path) = line();
        let mut state = SpectrumState::new(&topology, 320);
        let lightpath = SpectrumAssigner::BestFit.assign(&path, 50.0, &mut state).unwrap();
        assert_eq!(lightpath.start,0);
        assert_eq!(lightpath.slot_count,1);
        assert_eq!(lightpath.modulation,"DP-16QAM");
        assert_eq!(state.used_slots((3,2)),1);
    }
    #[test]
    fn test_first_fit() {
        assert_eq!(first_fit(&mask(&[0,1,1,0,1,1,1,1]), 3),Some(4));
        assert_eq!(first_fit(&mask(&[0,1,1,0,1,1,1,1]), 2),Some(1));
        assert_eq!(first_fit(&mask(&[0,1,1,0]), 3),None);
        assert_eq!(first_fit(&mask(&[1,1]), 3),None);
    }
    #[test]
    fn test_best_fit_tightest() {
        // runs: (0,4) (5,2) (8,3) (12,2)
        let bits = mask(&[1,1,1,1,0,1,1,0,1,1,1,0,1,1]);
        assert_eq!(best_fit(&bits, 2),Some(5));
        assert_eq!(best_fit(&bits, 3),Some(8));
        assert_eq!(best_fit(&bits, 4),Some(0));
        assert_eq!(best_fit(&bits, 5),None);
    }
    #[test]
    fn test_best_fit_never_larger() {
        let mut rng = rand::rng();
        for _ in 0..500 {
            let bits:BitSet = (0..64).map(|_| rng.random_bool(0.7)).collect();
            let need = rng.random_range(1..6);
            let runs:Vec<_> = bits.runs(true).into_iter().filter(|(_,len)| *len >= need).collect();
            match best_fit(&bits, need) {
                None => assert!(runs.is_empty()),
                Some(start) => {
                    let chosen = runs.iter().find(|(s,_)| *s == start).unwrap().1;
                    assert!(runs.iter().all(|(_,len)| chosen <= *len));
                }
            }
        }
    }
    #[test]
    fn test_most_used_packs_congested() {
        let bits = mask(&[1,1,1,1,1,1,1,1]);
        let usage = [0,0,0,0,3,3,0,0];
        assert_eq!(most_used(&bits, 2, &usage),Some(4));
        // best window blocked on this path, next best overlaps the hot slot
        let bits = mask(&[1,1,1,1,1,0,1,1]);
        assert_eq!(most_used(&bits, 2, &usage),Some(3));
        assert_eq!(most_used(&mask(&[0,0,0]), 1, &[1,1,1]),None);
    }
    #[test]
    fn test_most_used_on_state() {
        let topology = Topology::from_edges([(1,2,100.0),(2,3,100.0),(3,4,100.0)]).unwrap();
        let mut state = SpectrumState::new(&topology, 32);
        state.occupy(&[3,4], 10..12).unwrap();
        let path = WeightedPath {nodes:vec![1,2,3],weight:200.0};
        let lightpath = SpectrumAssigner::MostUsed.assign(&path, 100.0, &mut state).unwrap();
        // 100 Gbps on 16QAM is 18.75 GHz, 2 slots, right on top of the busy range
        assert_eq!(lightpath.slots(),10..12);
    }
    #[test]
    fn test_no_block_leaves_state() {
        let (topology,path) = line();
        let mut state = SpectrumState::new(&topology, 8);
        state.occupy(&[2,3], 3..4).unwrap();
        let before = state.clone();
        // 400 Gbps needs 6 slots, the longest common run is 4
        let err = SpectrumAssigner::FirstFit.assign(&path, 400.0, &mut state).unwrap_err();
        assert_eq!(err,AssignmentError::NoSpectrumBlock { slots_needed: 6 });
        for (link,slots) in before.links() {
            assert_eq!(state.link(*link),Some(slots));
        }
        assert!(matches!(SpectrumAssigner::BestFit.assign(&path, 0.0, &mut state),
            Err(AssignmentError::InvalidDemand{..})));
    }
    #[test]
    fn test_repeated_assignments_never_overlap() {
        let (topology,path) = line();
        let mut rng = rand::rng();
        for assigner in [SpectrumAssigner::FirstFit,SpectrumAssigner::BestFit,SpectrumAssigner::MostUsed] {
            let mut state = SpectrumState::new(&topology, 320);
            let mut taken = vec![false;320];
            while let Ok(lightpath) = assigner.assign(&path, rng.random_range(10.0..400.0), &mut state) {
                for slot in lightpath.slots() {
                    assert!(!taken[slot]);
                    taken[slot] = true;
                }
            }
        }
    }
}
