pub mod config;
pub mod error;
pub mod geometry;
pub mod monitor;
pub mod pose;
pub mod protocol;
pub mod reba;
pub mod session;
