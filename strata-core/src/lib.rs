pub mod adapters;
pub mod api;
pub mod cells;
pub mod color;
pub mod commands;
pub mod config;
pub mod geometry;
pub mod id;
pub mod policy;
pub mod queue;
pub mod state;
pub mod store;
pub mod util;

pub use id::StrataID;
