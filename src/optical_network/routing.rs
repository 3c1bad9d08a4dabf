use serde::{Deserialize, Serialize};

use crate::dsa::graph::{edge_key, Topology, WeightedPath};
use crate::scientific_computing::metrics::{fragmentation_entropy, EntropyNormalization};
use super::modulation::max_capacity;
use super::spectrum::SpectrumState;

// up to k loopless candidates, cheapest first, empty when unreachable
pub fn generate_candidates(topology:&Topology,source:usize,destination:usize,k:usize) -> Vec<WeightedPath> {
    topology.k_shortest_paths(source, destination).take(k).collect()
}

#[derive(Clone,Copy,Debug,PartialEq,Eq,Default,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSelector {
    // first candidate, the plain shortest path
    ShortestPath,
    #[default]
    LeastLoadedAvg,
    HighestLoadedAvg,
    // worst link entropy on the path, lowest wins
    FragmentationEntropyMax,
    // mean link entropy on the path, lowest wins
    FragmentationEntropyAvg,
}

impl PathSelector {
    // candidates with fewer than 2 nodes are skipped, ties go to the earlier candidate
    pub fn select<'p>(&self,candidates:&'p [WeightedPath],state:&SpectrumState,
        normalization:EntropyNormalization) -> Option<&'p WeightedPath> {
        let mut routable = candidates.iter().filter(|path| path.is_routable());
        match self {
            Self::ShortestPath => routable.next(),
            Self::LeastLoadedAvg => first_min_by_score(routable, |path| state.average_load(&path.nodes)),
            Self::HighestLoadedAvg => first_min_by_score(routable, |path| {
                state.average_load(&path.nodes).map(|load| -load)
            }),
            Self::FragmentationEntropyMax => first_min_by_score(routable, |path| {
                link_entropies(path, state, normalization).reduce(f64::max)
            }),
            Self::FragmentationEntropyAvg => first_min_by_score(routable, |path| {
                let sum:f64 = link_entropies(path, state, normalization).sum();
                Some(sum/path.hops() as f64)
            }),
        }
    }
}

fn link_entropies<'a>(path:&'a WeightedPath,state:&'a SpectrumState,
    normalization:EntropyNormalization) -> impl Iterator<Item = f64> + 'a {
    path.links().map(move |link| match state.link(link) {
        Some(slots) => fragmentation_entropy(slots, normalization),
        // a link unknown to the state carries no traffic
        None => 0.0,
    })
}

// strict comparison keeps the first of equal scores
fn first_min_by_score<'p,I,F>(paths:I,score:F) -> Option<&'p WeightedPath>
    where I:Iterator<Item = &'p WeightedPath>, F:Fn(&WeightedPath) -> Option<f64>
{
    let mut best:Option<(&WeightedPath,f64)> = None;
    for path in paths {
        let Some(value) = score(path) else {continue};
        if best.is_none_or(|(_,best_value)| value < best_value) {
            best = Some((path,value));
        }
    }
    best.map(|(path,_)| path)
}

// falls back to the shortest candidate when it carries at least as much per channel
pub fn modulation_aware<'p>(candidates:&'p [WeightedPath],chosen:&'p WeightedPath) -> &'p WeightedPath {
    let Some(shortest) = candidates.first() else {return chosen};
    if max_capacity(shortest.weight) >= max_capacity(chosen.weight) {
        shortest
    } else {
        chosen
    }
}

// fibres two paths have in common, direction ignored
pub fn count_shared_links(a:&WeightedPath,b:&WeightedPath) -> usize {
    let edges:std::collections::HashSet<(usize,usize)> = a.links().map(|(x,y)| edge_key(x, y)).collect();
    let shared:std::collections::HashSet<(usize,usize)> = b.links()
        .map(|(x,y)| edge_key(x, y))
        .filter(|edge| edges.contains(edge))
        .collect();
    shared.len()
}

// fewest fibres shared with the primary first, then lowest average load
pub fn find_backup_path<'p>(candidates:&'p [WeightedPath],primary:&WeightedPath,
    state:&SpectrumState) -> Option<&'p WeightedPath> {
    let mut ranked:Vec<(usize,f64,&WeightedPath)> = candidates.iter()
        .filter(|path| path.is_routable() && path.nodes != primary.nodes)
        .filter_map(|path| {
            let load = state.average_load(&path.nodes)?;
            Some((count_shared_links(primary, path),load,path))
        })
        .collect();
    ranked.sort_by(|a,b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
    ranked.first().map(|(_,_,path)| *path)
}
