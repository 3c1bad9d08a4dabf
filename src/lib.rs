// routing, modulation and spectrum assignment for elastic optical networks
// a planner takes demands one at a time, picks a path among the k shortest, a modulation
// format by path length, and a contiguous slot block free on every link of the path

pub mod config;
pub mod dsa;
pub mod optical_network;
pub mod scientific_computing;
