// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains a product of exponentials model of serial chains.
//!
//! It is meant for simulation and tests: it provides everything a
//! [`CartesianDisplacement`](`crate::CartesianDisplacement`) needs without a robot.
use std::collections::HashMap;

use nalgebra::{DMatrix, DVector, Isometry3, Vector3};

use crate::exception::{create_dimension_mismatch, DisplacementException, DisplacementResult};
use crate::exponential_map::direct;
use crate::kinematics::KinematicsProvider;
use crate::utils::{velocity_twist_matrix, Twist};

/// Screw axis `[v; ω]` of a revolute joint rotating about `axis` through `point`.
pub fn revolute(axis: &Vector3<f64>, point: &Vector3<f64>) -> Twist {
    let omega = axis.normalize();
    let v = point.cross(&omega);
    Twist::new(v.x, v.y, v.z, omega.x, omega.y, omega.z)
}

/// A serial chain of revolute joints described by body screw axes.
#[derive(Debug, Clone)]
pub struct ScrewChain {
    joint_names: Vec<String>,
    gripper: Option<String>,
    home: Isometry3<f64>,
    body_screws: Vec<Twist>,
    q: DVector<f64>,
}

impl ScrewChain {
    /// Creates a chain from screw axes given in the end effector frame at the home configuration.
    /// # Arguments
    /// * `joint_names` - One name per screw axis.
    /// * `home` - End effector pose in base frame at q = 0.
    /// * `body_screws` - Screw axes `[v; ω]` expressed in the end effector frame.
    /// # Errors
    /// * [`DimensionMismatch`](`crate::exception::DisplacementException::DimensionMismatch`)
    /// if the number of names and screws differ or the chain is empty.
    pub fn from_body_axes(
        joint_names: Vec<String>,
        home: Isometry3<f64>,
        body_screws: Vec<Twist>,
    ) -> DisplacementResult<Self> {
        if joint_names.len() != body_screws.len() || body_screws.is_empty() {
            return Err(create_dimension_mismatch(format!(
                "{} joint names for {} screw axes",
                joint_names.len(),
                body_screws.len()
            )));
        }
        let q = DVector::zeros(body_screws.len());
        Ok(ScrewChain {
            joint_names,
            gripper: None,
            home,
            body_screws,
            q,
        })
    }

    /// Creates a chain from screw axes given in the base frame at the home configuration.
    pub fn from_space_axes(
        joint_names: Vec<String>,
        home: Isometry3<f64>,
        space_screws: Vec<Twist>,
    ) -> DisplacementResult<Self> {
        let to_body = velocity_twist_matrix(&home.inverse());
        let body_screws = space_screws.iter().map(|s| to_body * s).collect();
        ScrewChain::from_body_axes(joint_names, home, body_screws)
    }

    /// A seven joint arm with a spherical shoulder, an elbow and a spherical wrist, pointing
    /// along x at the home configuration. `prefix` is prepended to the joint names and
    /// `shoulder` is the position of the shoulder in base frame.
    pub fn seven_dof_arm(prefix: &str, shoulder: Vector3<f64>) -> DisplacementResult<Self> {
        let elbow = shoulder + Vector3::new(0.3, 0., 0.);
        let wrist = shoulder + Vector3::new(0.6, 0., 0.);
        let home = Isometry3::new(shoulder + Vector3::new(0.7, 0., 0.), Vector3::zeros());
        let joint_names = [
            "ShoulderYaw",
            "ShoulderPitch",
            "ShoulderRoll",
            "ElbowPitch",
            "WristRoll",
            "WristPitch",
            "WristYaw",
        ]
        .iter()
        .map(|name| format!("{}{}", prefix, name))
        .collect();
        let space_screws = vec![
            revolute(&Vector3::z(), &shoulder),
            revolute(&Vector3::y(), &shoulder),
            revolute(&Vector3::x(), &shoulder),
            revolute(&Vector3::y(), &elbow),
            revolute(&Vector3::x(), &wrist),
            revolute(&Vector3::y(), &wrist),
            revolute(&Vector3::z(), &wrist),
        ];
        ScrewChain::from_space_axes(joint_names, home, space_screws)
    }

    /// Appends a gripper joint to the joint names. It has no screw axis and never shows up
    /// in the Jacobian.
    pub fn with_gripper<S: Into<String>>(mut self, name: S) -> Self {
        self.gripper = Some(name.into());
        self
    }

    /// Number of joints with a screw axis.
    pub fn dof(&self) -> usize {
        self.body_screws.len()
    }

    /// All joint names, including the gripper.
    pub fn joint_names(&self) -> Vec<String> {
        let mut names = self.joint_names.clone();
        if let Some(gripper) = &self.gripper {
            names.push(gripper.clone());
        }
        names
    }

    pub fn joint_positions(&self) -> &DVector<f64> {
        &self.q
    }

    /// # Errors
    /// * [`DimensionMismatch`](`crate::exception::DisplacementException::DimensionMismatch`)
    /// if `q` does not have [`dof`](`Self::dof`) entries.
    pub fn set_joint_positions(&mut self, q: DVector<f64>) -> DisplacementResult<()> {
        self.check_len(q.len())?;
        self.q = q;
        Ok(())
    }

    /// Integrates joint velocities for `dt` seconds with an Euler step.
    /// # Errors
    /// * [`DimensionMismatch`](`crate::exception::DisplacementException::DimensionMismatch`)
    /// if `dq` does not have [`dof`](`Self::dof`) entries.
    pub fn integrate(&mut self, dq: &DVector<f64>, dt: f64) -> DisplacementResult<()> {
        self.check_len(dq.len())?;
        self.q += dq * dt;
        Ok(())
    }

    /// End effector pose in base frame at `q`.
    pub fn forward(&self, q: &DVector<f64>) -> Isometry3<f64> {
        self.body_screws
            .iter()
            .zip(q.iter())
            .fold(self.home, |pose, (screw, &angle)| pose * direct(screw, angle))
    }

    /// End effector pose in base frame at the current joint positions.
    pub fn pose(&self) -> Isometry3<f64> {
        self.forward(&self.q)
    }

    /// 6xn Jacobian at `q` relative to the end effector frame, rows ordered `[v; ω]`.
    pub fn body_jacobian(&self, q: &DVector<f64>) -> DMatrix<f64> {
        let mut jacobian = DMatrix::zeros(6, self.dof());
        let mut transform = Isometry3::identity();
        for i in (0..self.dof()).rev() {
            let column = velocity_twist_matrix(&transform) * self.body_screws[i];
            jacobian.column_mut(i).copy_from(&column);
            transform *= direct(&self.body_screws[i], -q[i]);
        }
        jacobian
    }

    fn check_len(&self, len: usize) -> DisplacementResult<()> {
        if len != self.dof() {
            return Err(create_dimension_mismatch(format!(
                "expected {} joint values, got {}",
                self.dof(),
                len
            )));
        }
        Ok(())
    }
}

/// A robot made of named [`ScrewChain`]s.
#[derive(Debug, Clone, Default)]
pub struct SyntheticRobot {
    chains: HashMap<String, ScrewChain>,
}

impl SyntheticRobot {
    pub fn new() -> Self {
        SyntheticRobot::default()
    }

    /// Two seven joint arms `LArm` and `RArm`, each followed by a hand joint.
    pub fn with_arms() -> DisplacementResult<Self> {
        let mut robot = SyntheticRobot::new();
        robot.add_chain(
            "LArm",
            ScrewChain::seven_dof_arm("L", Vector3::new(0., 0.2, 0.))?.with_gripper("LHand"),
        );
        robot.add_chain(
            "RArm",
            ScrewChain::seven_dof_arm("R", Vector3::new(0., -0.2, 0.))?.with_gripper("RHand"),
        );
        Ok(robot)
    }

    pub fn add_chain<S: Into<String>>(&mut self, name: S, chain: ScrewChain) {
        self.chains.insert(name.into(), chain);
    }

    pub fn chain(&self, name: &str) -> DisplacementResult<&ScrewChain> {
        self.chains
            .get(name)
            .ok_or_else(|| unknown_chain(name))
    }

    pub fn chain_mut(&mut self, name: &str) -> DisplacementResult<&mut ScrewChain> {
        self.chains
            .get_mut(name)
            .ok_or_else(|| unknown_chain(name))
    }
}

fn unknown_chain(name: &str) -> DisplacementException {
    DisplacementException::KinematicsException {
        message: format!("unknown chain {}", name),
    }
}

impl KinematicsProvider for SyntheticRobot {
    fn joint_names(&self, chain: &str) -> DisplacementResult<Vec<String>> {
        Ok(self.chain(chain)?.joint_names())
    }

    fn jacobian(&self, chain: &str) -> DisplacementResult<DMatrix<f64>> {
        let chain = self.chain(chain)?;
        Ok(chain.body_jacobian(chain.joint_positions()))
    }
}
