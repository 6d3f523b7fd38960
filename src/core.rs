pub mod datacenter;
pub mod decision;
pub mod engine;
pub mod grid;
pub mod metrics;
pub mod workload;
