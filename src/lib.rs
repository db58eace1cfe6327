pub mod surface;
pub mod particle;
pub mod field;
pub mod scene_graph;

// Walk cycle
pub mod pose;
pub mod sequencer;
pub mod rig;

pub mod driver;
pub mod config;

// Page effects
pub mod typing;
pub mod follow;
pub mod crossfade;

#[cfg(not(target_arch = "wasm32"))]
pub mod raster;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

#[cfg(target_arch = "wasm32")]
pub mod wasm;
