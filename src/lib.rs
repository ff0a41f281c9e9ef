//! Replay sampler - turns decoded 1v1 replays into aligned physics and
//! control training records

pub mod config;
pub mod dataset;
pub mod replay;
pub mod sink;
pub mod util;
