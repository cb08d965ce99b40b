pub mod config;
pub mod logging;

// Core modules
pub mod cache;
pub mod engine;
pub mod heuristics;
pub mod proto;
pub mod remote;
pub mod session;
pub mod similarity;
pub mod verdict;
pub mod whitelist;
