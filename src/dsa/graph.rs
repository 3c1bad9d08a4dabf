use std::borrow::Borrow;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use thiserror::Error;

type HashMap<K,V> = std::collections::hash_map::HashMap<K,V,nohash::BuildNoHashHasher<usize>>;
type HashSet<K> = std::collections::hash_set::HashSet<K,nohash::BuildNoHashHasher<usize>>;

#[derive(Error,Debug,Clone,PartialEq)]
pub enum GraphError {
    #[error("Edge {node} -> {node} is a self loop")]
    SelfLoop{node:usize},
    #[error("Edge {from} -> {to} has weight {weight}, weights must be finite and non-negative")]
    InvalidWeight{from:usize,to:usize,weight:f64},
}

type Result<T> = std::result::Result<T,GraphError>;

// undirected edge key, smaller node first
pub(crate) fn edge_key(a:usize,b:usize) -> (usize,usize) {
    if a <= b {(a,b)} else {(b,a)}
}

// a loopless node sequence and its total weight
#[derive(Clone,Debug,PartialEq)]
pub struct WeightedPath {
    pub nodes:Vec<usize>,
    pub weight:f64
}

impl WeightedPath {
    pub fn hops(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
    // directed links in travel order
    pub fn links(&self) -> impl Iterator<Item = (usize,usize)> + '_ {
        self.nodes.windows(2).map(|pair| (pair[0],pair[1]))
    }
    pub fn is_routable(&self) -> bool {
        self.nodes.len() >= 2
    }
}

// undirected graph, weight is the physical length of the fibre in km
#[derive(Clone,Debug,Default)]
pub struct Topology {
    edges_len:usize,
    adjacency_list:HashMap<usize,HashMap<usize,f64>>
}

impl Topology {
    pub fn edges_len(&self) -> usize {
        self.edges_len
    }
    pub fn nodes_len(&self) -> usize {
        self.adjacency_list.len()
    }
    pub fn is_empty(&self) -> bool {
        if self.nodes_len() == 0 {
            debug_assert!(self.edges_len() == 0);
            return true;
        }
        false
    }
    pub fn new() -> Self {
        Self {
            edges_len:0,
            adjacency_list:HashMap::with_hasher(
                nohash::BuildNoHashHasher::default()
            )
        }
    }
    pub fn from_edges<B:Borrow<(usize,usize,f64)>,I:IntoIterator<Item = B>>(edges:I) -> Result<Self> {
        let mut topology = Self::new();
        for edge in edges {
            let (a,b,weight) = edge.borrow();
            topology.push_edge(*a, *b, *weight)?;
        }
        topology.shrink_to_fit();
        Ok(topology)
    }
    pub fn contains_node(&self,node:usize) -> bool {
        self.adjacency_list.contains_key(&node)
    }
    // only push node, not adding edges
    pub fn push_node(&mut self,node:usize) {
        self.adjacency_list.entry(node).or_insert_with(|| {
            HashMap::with_hasher(nohash::BuildNoHashHasher::default())
        });
    }
    // inserts or overwrites the edge a - b
    pub fn push_edge(&mut self,a:usize,b:usize,weight:f64) -> Result<()> {
        if a == b {
            return Err(GraphError::SelfLoop { node: a });
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(GraphError::InvalidWeight { from: a, to: b, weight });
        }
        self.push_node(a);
        self.push_node(b);
        let mut is_edge_present = false;
        if let Some(adj_nodes) = self.adjacency_list.get_mut(&a) {
            is_edge_present |= adj_nodes.insert(b, weight).is_some();
        }
        if let Some(adj_nodes) = self.adjacency_list.get_mut(&b) {
            is_edge_present |= adj_nodes.insert(a, weight).is_some();
        }
        if !is_edge_present {
            self.edges_len += 1;
        }
        Ok(())
    }
    pub fn shrink_to_fit(&mut self) {
        self.adjacency_list.shrink_to_fit();
        for v in self.adjacency_list.values_mut() {
            v.shrink_to_fit();
        }
    }
    // every undirected edge once, as (smaller,larger,weight)
    pub fn edges(&self) -> impl Iterator<Item = (usize,usize,f64)> + '_ {
        self.adjacency_list.iter().flat_map(|(a,adj)| {
            adj.iter().filter(move |(b,_)| a < *b).map(move |(b,w)| (*a,*b,*w))
        })
    }
    pub fn neighbours(&self,node:usize) -> impl Iterator<Item = (usize,f64)> + '_ {
        self.adjacency_list.get(&node).into_iter()
            .flat_map(|adj| adj.iter().map(|(n,w)| (*n,*w)))
    }
    pub fn weight(&self,a:usize,b:usize) -> Option<f64> {
        self.adjacency_list.get(&a)?.get(&b).copied()
    }
    // None if any hop is not an edge
    pub fn path_length(&self,nodes:&[usize]) -> Option<f64> {
        nodes.windows(2).map(|pair| self.weight(pair[0], pair[1])).sum()
    }
    pub fn shortest_path(&self,source:usize,target:usize) -> Option<WeightedPath> {
        let no_edges = std::collections::HashSet::new();
        let no_nodes = HashSet::with_hasher(nohash::BuildNoHashHasher::default());
        self.dijkstra(source, target, &no_edges, &no_nodes)
    }
    // lazily yields loopless paths in non-decreasing weight order
    pub fn k_shortest_paths(&self,source:usize,target:usize) -> KShortestPaths<'_> {
        KShortestPaths::new(self, source, target)
    }

    fn dijkstra(&self,source:usize,target:usize,
        banned_edges:&std::collections::HashSet<(usize,usize)>,
        banned_nodes:&HashSet<usize>) -> Option<WeightedPath> {
        if !self.contains_node(source) || !self.contains_node(target) || source == target {
            return None;
        }
        if banned_nodes.contains(&source) || banned_nodes.contains(&target) {
            return None;
        }
        let mut dist:HashMap<usize,f64> = HashMap::with_capacity_and_hasher(
            self.nodes_len(), nohash::BuildNoHashHasher::default());
        let mut prev:HashMap<usize,usize> = HashMap::with_capacity_and_hasher(
            self.nodes_len(), nohash::BuildNoHashHasher::default());
        let mut heap = BinaryHeap::new();
        dist.insert(source, 0.0);
        heap.push(Reverse((OrderedFloat(0.0),source)));

        while let Some(Reverse((OrderedFloat(d),node))) = heap.pop() {
            if node == target {break}
            if dist.get(&node).is_some_and(|best| d > *best) {continue}
            for (next,w) in self.neighbours(node) {
                if banned_nodes.contains(&next) || banned_edges.contains(&edge_key(node, next)) {
                    continue;
                }
                let candidate = d + w;
                if dist.get(&next).is_none_or(|best| candidate < *best) {
                    dist.insert(next, candidate);
                    prev.insert(next, node);
                    heap.push(Reverse((OrderedFloat(candidate),next)));
                }
            }
        }

        let weight = *dist.get(&target)?;
        let mut nodes = vec![target];
        let mut current = target;
        while current != source {
            current = *prev.get(&current)?;
            nodes.push(current);
        }
        nodes.reverse();
        Some(WeightedPath {nodes,weight})
    }
}

// ordering of pending deviations: weight, then hop count, then node ids
#[derive(PartialEq,Eq,PartialOrd,Ord)]
struct Deviation {
    weight:OrderedFloat<f64>,
    hops:usize,
    nodes:Vec<usize>
}

// Yen's algorithm: every found path is deviated at each of its nodes,
// the cheapest pending deviation becomes the next path
pub struct KShortestPaths<'g> {
    graph:&'g Topology,
    source:usize,
    target:usize,
    found:Vec<WeightedPath>,
    pending:BinaryHeap<Reverse<Deviation>>,
    seen:std::collections::HashSet<Vec<usize>>,
    started:bool
}

impl<'g> KShortestPaths<'g> {
    fn new(graph:&'g Topology,source:usize,target:usize) -> Self {
        Self {
            graph,source,target,
            found:vec![],
            pending:BinaryHeap::new(),
            seen:std::collections::HashSet::new(),
            started:false
        }
    }

    fn push_deviations(&mut self) {
        let Some(last) = self.found.last() else {return};
        let last = last.nodes.clone();
        for i in 0..last.len() - 1 {
            let spur = last[i];
            let root = &last[..=i];

            let mut banned_edges = std::collections::HashSet::new();
            for path in self.found.iter() {
                if path.nodes.len() > i + 1 && path.nodes[..=i] == *root {
                    banned_edges.insert(edge_key(path.nodes[i], path.nodes[i+1]));
                }
            }
            let banned_nodes:HashSet<usize> = root[..i].iter().copied().collect();

            let Some(spur_path) = self.graph.dijkstra(spur, self.target, &banned_edges, &banned_nodes)
                else {continue};

            let mut nodes = root[..i].to_vec();
            nodes.extend_from_slice(&spur_path.nodes);
            if self.seen.contains(&nodes) {continue}
            let Some(weight) = self.graph.path_length(&nodes) else {continue};
            self.seen.insert(nodes.clone());
            self.pending.push(Reverse(Deviation {
                weight:OrderedFloat(weight),
                hops:nodes.len() - 1,
                nodes
            }));
        }
    }
}

impl Iterator for KShortestPaths<'_> {
    type Item = WeightedPath;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            let first = self.graph.shortest_path(self.source, self.target)?;
            self.seen.insert(first.nodes.clone());
            self.found.push(first.clone());
            return Some(first);
        }
        if self.found.is_empty() {return None}
        self.push_deviations();
        let Reverse(next) = self.pending.pop()?;
        let path = WeightedPath {nodes:next.nodes,weight:next.weight.into_inner()};
        self.found.push(path.clone());
        Some(path)
    }
}
