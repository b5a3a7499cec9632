//! Agent-based simulation of externally-imposed technology diffusing across
//! a population of heterogeneous communities linked by a social-influence
//! network.
//!
//! One deployer picks targets each round; targeted communities decide whether
//! to adopt, later ban, or collapse under the technology's effects, swayed by
//! their own traits and by the fate of their network neighbors. Aggregate
//! outcomes feed back into the deployer's dominance, closing the loop.
//!
//! The whole model is single-threaded and draws from one seeded stream, so a
//! fixed seed replays a run exactly:
//!
//! ```
//! use diffusion_sim::{SimParams, Simulation};
//!
//! let mut sim = Simulation::new(SimParams {
//!     community_count: 30,
//!     seed: Some(42),
//!     ..SimParams::default()
//! })
//! .unwrap();
//! sim.run(100);
//! assert_eq!(sim.rounds(), 100);
//! ```

pub mod config;
pub mod id;
pub mod model;
pub mod network;
pub mod scenario;
pub mod sim;
pub mod stats;

pub use config::{ConfigError, DeploymentPolicy, NetworkKind, SimParams};
pub use id::CommunityId;
pub use model::{AdoptionState, Community, CommunityClass, Deployer};
pub use network::InfluenceNetwork;
pub use scenario::Scenario;
pub use sim::Simulation;
pub use stats::{CommunitySample, RoundSummary, StatsLog};
