pub mod decision;
pub mod simulation;
pub mod targeting;

pub use simulation::Simulation;
