use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dsa::bitset::BitSet;
use crate::optical_network::Link;
use crate::optical_network::spectrum::SpectrumState;

// what a free run length is divided by before entering the entropy sum
#[derive(Clone,Copy,Debug,PartialEq,Eq,Default,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntropyNormalization {
    // run / total slots of the link, weights only sum to 1 on an all-free link
    #[default]
    SlotCapacity,
    // run / total free slots, a proper probability distribution
    FreeSlots,
}

// Shannon entropy in bits over the free runs of a link, 0 with fewer than 2 runs
pub fn fragmentation_entropy(slots:&BitSet,normalization:EntropyNormalization) -> f64 {
    let runs:Vec<usize> = slots.runs(true).into_iter().map(|(_,len)| len).collect();
    if runs.len() < 2 {
        return 0.0;
    }
    let total = match normalization {
        EntropyNormalization::SlotCapacity => slots.len(),
        EntropyNormalization::FreeSlots => runs.iter().sum::<usize>(),
    } as f64;
    runs.iter().map(|len| {
        let p = *len as f64/total;
        -p*p.log2()
    }).sum()
}

// share of adjacent slot pairs whose states differ, Xs/(Ls-1)
pub fn utilization_entropy(slots:&BitSet) -> f64 {
    if slots.len() <= 1 {
        return 0.0;
    }
    slots.transitions() as f64/(slots.len() - 1) as f64
}

// highest occupied index, 0 for an untouched link
pub fn highest_occupied_index(slots:&BitSet) -> usize {
    slots.last_index_of(false).unwrap_or(0)
}

pub fn highest_fsu_per_link(state:&SpectrumState) -> BTreeMap<Link,usize> {
    state.links().map(|(link,slots)| (*link,highest_occupied_index(slots))).collect()
}

pub fn total_used_fsus(state:&SpectrumState) -> usize {
    state.links().map(|(_,slots)| slots.count_zeros()).sum()
}

pub fn max_fragmentation_entropy(state:&SpectrumState,normalization:EntropyNormalization) -> f64 {
    state.links()
        .map(|(_,slots)| fragmentation_entropy(slots, normalization))
        .fold(0.0, f64::max)
}

pub fn utilization_entropy_per_link(state:&SpectrumState) -> BTreeMap<Link,f64> {
    state.links().map(|(link,slots)| (*link,utilization_entropy(slots))).collect()
}

pub fn network_utilization_entropy(state:&SpectrumState) -> f64 {
    if state.links_len() == 0 {
        return 0.0;
    }
    let sum:f64 = state.links().map(|(_,slots)| utilization_entropy(slots)).sum();
    sum/state.links_len() as f64
}

// network wide figures reported after a run
#[derive(Clone,Debug,PartialEq)]
pub struct NetworkMetrics {
    pub highest_fsu_per_link:BTreeMap<Link,usize>,
    pub total_used_fsus:usize,
    pub max_fragmentation_entropy:f64,
    pub mean_utilization_entropy:f64
}

impl NetworkMetrics {
    pub fn collect(state:&SpectrumState,normalization:EntropyNormalization) -> Self {
        Self {
            highest_fsu_per_link:highest_fsu_per_link(state),
            total_used_fsus:total_used_fsus(state),
            max_fragmentation_entropy:max_fragmentation_entropy(state, normalization),
            mean_utilization_entropy:network_utilization_entropy(state)
        }
    }
}
