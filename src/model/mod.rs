pub mod community;
pub mod deployer;

pub use community::{AdoptionState, BAN_WINDOW, Community, CommunityClass, WellbeingWindow};
pub use deployer::{DOMINANCE_MAX, DOMINANCE_MIN, Deployer};
