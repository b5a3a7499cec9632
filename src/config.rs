use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the deployer chooses its targets each round.
///
/// Closed set; the UI layer hands us arbitrary strings, and anything outside
/// the known set deploys to nobody rather than failing the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentPolicy {
    /// Every non-banned, non-collapsed community.
    All,
    /// 50% of eligible communities, stratified by digital access.
    Random,
    /// Only high-access communities (digital access score >= 0.6).
    Filtered,
    /// Deploy to nobody (fallback for unrecognized policy values).
    Nothing,
}

impl FromStr for DeploymentPolicy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "all" => Self::All,
            "random" => Self::Random,
            "filtered" => Self::Filtered,
            _ => Self::Nothing,
        })
    }
}

impl fmt::Display for DeploymentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::All => "all",
            Self::Random => "random",
            Self::Filtered => "filtered",
            Self::Nothing => "nothing",
        };
        f.write_str(s)
    }
}

/// Influence-network topology family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    /// Watts-Strogatz ring lattice with random rewiring.
    SmallWorld,
}

impl FromStr for NetworkKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small_world" => Ok(Self::SmallWorld),
            other => Err(ConfigError::UnknownNetworkKind(other.to_string())),
        }
    }
}

/// Construction parameters for a simulation run, supplied by the UI/CLI layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    pub community_count: usize,
    pub implementation_cost: f64,
    pub cultural_fit: f64,
    pub policy: DeploymentPolicy,
    pub initial_dominance: f64,
    pub network_kind: NetworkKind,
    /// Fixed seed for reproducible runs; drawn from OS entropy when absent.
    /// The chosen seed is always recorded on the simulation for replay.
    pub seed: Option<u64>,
}

impl SimParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.community_count == 0 {
            return Err(ConfigError::NoCommunities);
        }
        if !self.implementation_cost.is_finite() || self.implementation_cost <= 0.0 {
            return Err(ConfigError::BadImplementationCost(self.implementation_cost));
        }
        Ok(())
    }
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            community_count: 50,
            implementation_cost: 5.0,
            cultural_fit: 0.8,
            policy: DeploymentPolicy::Random,
            initial_dominance: 3.0,
            network_kind: NetworkKind::SmallWorld,
            seed: None,
        }
    }
}

/// Malformed construction input. The only caller-visible failure mode: the
/// round loop itself never errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("community count must be greater than zero")]
    NoCommunities,
    #[error("implementation cost must be a positive finite number, got {0}")]
    BadImplementationCost(f64),
    #[error("unknown network kind '{0}'")]
    UnknownNetworkKind(String),
}
