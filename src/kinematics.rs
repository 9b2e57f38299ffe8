// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the kinematics provider interface and chain names.
use crate::exception::{DisplacementException, DisplacementResult};
use nalgebra::DMatrix;
use std::fmt;

#[cfg(test)]
use mockall::automock;

pub mod screw_chain;

/// Enumerates the kinematic chains of a humanoid. Any other chain name is kept as
/// [`Chain::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chain {
    Head,
    LArm,
    RArm,
    LLeg,
    RLeg,
    Torso,
    Other(String),
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Chain::Head => {
                write!(f, "Head")
            }
            Chain::LArm => {
                write!(f, "LArm")
            }
            Chain::RArm => {
                write!(f, "RArm")
            }
            Chain::LLeg => {
                write!(f, "LLeg")
            }
            Chain::RLeg => {
                write!(f, "RLeg")
            }
            Chain::Torso => {
                write!(f, "Torso")
            }
            Chain::Other(name) => {
                write!(f, "{}", name)
            }
        }
    }
}

impl From<&str> for Chain {
    fn from(name: &str) -> Self {
        match name {
            "Head" => Chain::Head,
            "LArm" => Chain::LArm,
            "RArm" => Chain::RArm,
            "LLeg" => Chain::LLeg,
            "RLeg" => Chain::RLeg,
            "Torso" => Chain::Torso,
            other => Chain::Other(other.to_string()),
        }
    }
}

/// Provides the joint names and the current Jacobian of named kinematic chains.
///
/// Implement it for a robot SDK binding, or use
/// [`SyntheticRobot`](`crate::kinematics::screw_chain::SyntheticRobot`) for simulation.
#[cfg_attr(test, automock)]
pub trait KinematicsProvider {
    /// Gets the ordered joint names of a chain, including a trailing gripper joint if the
    /// chain has one.
    /// # Errors
    /// * [`KinematicsException`](`crate::exception::DisplacementException::KinematicsException`)
    /// if the chain is unknown.
    fn joint_names(&self, chain: &str) -> DisplacementResult<Vec<String>>;

    /// Gets the 6xn Jacobian of the chain at the current configuration, relative to the
    /// end effector frame. Rows are ordered `[v; ω]`, one column per servoed joint.
    /// # Errors
    /// * [`KinematicsException`](`crate::exception::DisplacementException::KinematicsException`)
    /// if the chain is unknown or the configuration cannot be read.
    fn jacobian(&self, chain: &str) -> DisplacementResult<DMatrix<f64>>;
}

/// Removes the trailing gripper joint from `joint_names` if `carries_gripper` is set.
/// # Errors
/// * [`InvalidChain`](`crate::exception::DisplacementException::InvalidChain`) if no joint
/// remains.
pub fn servoed_joints(
    mut joint_names: Vec<String>,
    chain: &str,
    carries_gripper: bool,
) -> DisplacementResult<Vec<String>> {
    if carries_gripper {
        joint_names.pop();
    }
    if joint_names.is_empty() {
        return Err(DisplacementException::InvalidChain {
            chain: chain.to_string(),
        });
    }
    Ok(joint_names)
}
