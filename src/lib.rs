pub mod autopilot;
pub mod constants;
pub mod driver;
pub mod engine;
pub mod protocol;
pub mod rng;
pub mod types;
pub mod world;
