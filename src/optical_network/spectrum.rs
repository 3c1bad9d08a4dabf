use std::collections::BTreeMap;
use std::ops::Range;

use thiserror::Error;

use crate::dsa::bitset::BitSet;
use crate::dsa::graph::Topology;
use super::Link;

#[derive(Error,Debug,Clone,PartialEq)]
pub enum SpectrumError {
    #[error("Link {from} -> {to} is not part of the spectrum state")]
    UnknownLink{from:usize,to:usize},
    #[error("A path needs at least 2 nodes, got {len}")]
    PathTooShort{len:usize},
    #[error("Slots {start}..{end} leave the {slot_count} slots of a link")]
    RangeOutOfBounds{start:usize,end:usize,slot_count:usize},
    #[error("Slots {start}..{end} are not free on link {from} -> {to}")]
    RangeOccupied{start:usize,end:usize,from:usize,to:usize},
}

type Result<T> = std::result::Result<T,SpectrumError>;

// per directed link slot vectors, 1 = free, 0 = occupied
#[derive(Clone,Debug,Default)]
pub struct SpectrumState {
    slot_count:usize,
    links:BTreeMap<Link,BitSet>
}

impl SpectrumState {
    // both directions of every edge, all slots free
    pub fn new(topology:&Topology,slot_count:usize) -> Self {
        let mut links = BTreeMap::new();
        for (a,b,_) in topology.edges() {
            links.insert((a,b), BitSet::filled(slot_count, true));
            links.insert((b,a), BitSet::filled(slot_count, true));
        }
        Self {slot_count,links}
    }
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }
    pub fn links_len(&self) -> usize {
        self.links.len()
    }
    pub fn link(&self,link:Link) -> Option<&BitSet> {
        self.links.get(&link)
    }
    pub fn links(&self) -> impl Iterator<Item = (&Link,&BitSet)> {
        self.links.iter()
    }
    // occupied slots on a link, a link unknown to the state counts as empty
    pub fn used_slots(&self,link:Link) -> usize {
        self.links.get(&link).map_or(0, |slots| slots.count_zeros())
    }
    // mean occupied slots over the links of the path
    pub fn average_load(&self,nodes:&[usize]) -> Option<f64> {
        if nodes.len() < 2 {return None}
        let total:usize = nodes.windows(2).map(|pair| self.used_slots((pair[0],pair[1]))).sum();
        Some(total as f64/(nodes.len() - 1) as f64)
    }
    // slots free on every link of the path
    pub fn availability_mask(&self,nodes:&[usize]) -> Result<BitSet> {
        if nodes.len() < 2 {
            return Err(SpectrumError::PathTooShort { len: nodes.len() });
        }
        let mut mask = BitSet::filled(self.slot_count, true);
        for pair in nodes.windows(2) {
            let slots = self.links.get(&(pair[0],pair[1]))
                .ok_or(SpectrumError::UnknownLink { from: pair[0], to: pair[1] })?;
            mask.and_assign(slots)
                .ok_or(SpectrumError::UnknownLink { from: pair[0], to: pair[1] })?;
        }
        Ok(mask)
    }
    // count of links, both directions, on which each slot is occupied
    pub fn slot_usage(&self) -> Vec<usize> {
        let mut usage = vec![0;self.slot_count];
        for slots in self.links.values() {
            for (index,free) in slots.iter().enumerate() {
                if !free {usage[index] += 1;}
            }
        }
        usage
    }
    // occupies the range on both directions of every hop, or changes nothing
    pub fn occupy(&mut self,nodes:&[usize],range:Range<usize>) -> Result<()> {
        if nodes.len() < 2 {
            return Err(SpectrumError::PathTooShort { len: nodes.len() });
        }
        if range.end > self.slot_count || range.start > range.end {
            return Err(SpectrumError::RangeOutOfBounds {
                start: range.start, end: range.end, slot_count: self.slot_count
            });
        }
        for pair in nodes.windows(2) {
            for (from,to) in [(pair[0],pair[1]),(pair[1],pair[0])] {
                let slots = self.links.get(&(from,to))
                    .ok_or(SpectrumError::UnknownLink { from, to })?;
                if !slots.all_in(range.clone(), true) {
                    return Err(SpectrumError::RangeOccupied { start: range.start, end: range.end, from, to });
                }
            }
        }
        for pair in nodes.windows(2) {
            for link in [(pair[0],pair[1]),(pair[1],pair[0])] {
                if let Some(slots) = self.links.get_mut(&link) {
                    slots.store_range(range.clone(), false);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::dsa::graph::Topology;
    use super::{SpectrumError, SpectrumState};

    fn line() -> Topology {
        Topology::from_edges([(1,2,300.0),(2,3,200.0)]).unwrap()
    }

    #[test]
    fn test_new_state() {
        let state = SpectrumState::new(&line(), 320);
        assert_eq!(state.links_len(),4);
        assert_eq!(state.link((3,2)).unwrap().count_ones(),320);
        assert!(state.link((1,3)).is_none());
    }
    #[test]
    fn test_occupy_both_directions() {
        let mut state = SpectrumState::new(&line(), 320);
        state.occupy(&[1,2,3], 10..14).unwrap();
        for link in [(1,2),(2,1),(2,3),(3,2)] {
            assert!(state.link(link).unwrap().all_in(10..14, false));
            assert_eq!(state.used_slots(link),4);
        }
        assert_eq!(state.average_load(&[1,2,3]),Some(4.0));
        let mask = state.availability_mask(&[3,2,1]).unwrap();
        assert!(mask.all_in(10..14, false));
        assert_eq!(mask.count_ones(),316);
        assert_eq!(state.slot_usage()[11],4);
    }
    #[test]
    fn test_occupy_is_atomic() {
        let mut state = SpectrumState::new(&line(), 320);
        state.occupy(&[2,3], 5..6).unwrap();
        let err = state.occupy(&[1,2,3], 0..8).unwrap_err();
        assert!(matches!(err,SpectrumError::RangeOccupied{..}));
        // first hop was free but must remain untouched
        assert_eq!(state.used_slots((1,2)),0);
        assert_eq!(state.used_slots((2,3)),1);
        assert!(matches!(state.occupy(&[1,3], 0..1),Err(SpectrumError::UnknownLink{..})));
        assert!(matches!(state.occupy(&[1], 0..1),Err(SpectrumError::PathTooShort{..})));
        assert!(matches!(state.occupy(&[1,2], 318..321),Err(SpectrumError::RangeOutOfBounds{..})));
    }
}
