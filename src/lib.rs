pub mod config;
pub mod evolve;
pub mod node;
pub mod pattern;
pub mod render;
pub mod rules;
pub mod store;
pub mod world;

/// Cell coordinate relative to the center of the world
pub type WorldOffset = i64;
