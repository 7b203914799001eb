use serde::{Deserialize, Serialize};

/// Toggles for the auth migration tooling.
///
/// Both default on and can be disabled independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationConfig {
    /// Replay legacy checks and log disagreements with the policy engine.
    #[serde(default = "default_true")]
    pub divergence_logging: bool,

    /// Record legacy identities in the identity map.
    #[serde(default = "default_true")]
    pub identity_map: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            divergence_logging: true,
            identity_map: true,
        }
    }
}

fn default_true() -> bool {
    true
}
