pub mod grid_world;

pub use grid_world::{GridAction, GridWorld, Layout, Location};
