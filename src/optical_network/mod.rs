// plans lightpaths in an elastic optical network
// route, modulation format and a contiguous block of frequency slot units per demand

/* every undirected fibre A - B is tracked as two directed links (A,B) and (B,A),
each holding a vector of slots, 1 = free, 0 = occupied
both directions are always occupied together */

/* rules, suppose a task takes 5 slots, and goes through link A->B->C->D
then the same slot indexes on A->B, B->C, C->D must be all free, and all get occupied
this is the continuity constraint,
the 5 slots must also be adjacent, which is the contiguity constraint */

pub mod assignment;
pub mod modulation;
pub mod planner;
pub mod protection;
pub mod routing;
pub mod spectrum;

// width of one frequency slot unit
pub const FSU_WIDTH_GHZ:f64 = 12.5;

// slots on every link unless configured otherwise
pub const DEFAULT_SLOT_COUNT:usize = 320;

// directed link (from,to)
pub type Link = (usize,usize);

pub type DemandId = usize;
