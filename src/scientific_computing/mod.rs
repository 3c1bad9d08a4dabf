// fragmentation and utilization figures over slot vectors
pub mod metrics;
