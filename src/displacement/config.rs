// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the settings of a [`CartesianDisplacement`](`crate::CartesianDisplacement`).

use crate::kinematics::Chain;
use crate::pseudo_inverse::SingularityHandling;
use serde::{Deserialize, Serialize};

/// Default bound below which a singular value of the oriented Jacobian is considered degenerate.
pub static DEFAULT_SINGULAR_VALUE_THRESHOLD: f64 = 1e-6;
/// Default number of ticks kept for error reports.
pub static DEFAULT_LOG_SIZE: usize = 50;

/// Settings of a [`CartesianDisplacement`](`crate::CartesianDisplacement`).
///
/// Use struct update syntax to change single values:
/// ```
/// use displacement::{DisplacementConfig, SingularityHandling};
/// let config = DisplacementConfig {
///     singularity_handling: SingularityHandling::Damped { damping: 0.01 },
///     ..Default::default()
/// };
/// # assert_eq!(config.log_size, 50);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DisplacementConfig {
    /// Singular values of the oriented Jacobian below this value are considered degenerate.
    pub singular_value_threshold: f64,
    /// What to do in a degenerate configuration.
    pub singularity_handling: SingularityHandling,
    /// Chains whose last joint is a gripper which is not under velocity control.
    pub gripper_chains: Vec<String>,
    /// Number of ticks attached to a
    /// [`KinematicSingularity`](`crate::exception::DisplacementException::KinematicSingularity`).
    pub log_size: usize,
}

impl Default for DisplacementConfig {
    fn default() -> Self {
        DisplacementConfig {
            singular_value_threshold: DEFAULT_SINGULAR_VALUE_THRESHOLD,
            singularity_handling: SingularityHandling::default(),
            gripper_chains: vec![Chain::LArm.to_string(), Chain::RArm.to_string()],
            log_size: DEFAULT_LOG_SIZE,
        }
    }
}

impl DisplacementConfig {
    /// true if the trailing joint of `chain` is a gripper
    pub fn carries_gripper(&self, chain: &str) -> bool {
        self.gripper_chains.iter().any(|name| name == chain)
    }
}
