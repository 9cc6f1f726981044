pub mod adapters;
pub mod config;
pub mod error;
pub mod forge;
pub mod state;
