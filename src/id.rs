use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for a receiving community.
///
/// Assigned once at simulation construction and never reused — collapse is a
/// terminal state flag, not removal, so identifiers (and the network keyed by
/// them) stay valid for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommunityId(pub u64);

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "community-{}", self.0)
    }
}

/// Monotonic generator for community identifiers.
#[derive(Debug)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> CommunityId {
        let id = CommunityId(self.next);
        self.next += 1;
        id
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
