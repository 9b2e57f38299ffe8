// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the request and command types exchanged with a
//! [`CartesianDisplacement`](`crate::CartesianDisplacement`).

use crate::exception::{DisplacementException, DisplacementResult};
use crate::utils::{rxyz_to_rotation, Vector6};
use nalgebra::{DVector, Isometry3, Rotation3, Vector3};
use serde::Deserialize;
use serde::Serialize;

/// Helper trait for control loops.
///
/// Used to determine whether to terminate a loop after the generator has returned.
pub trait Finishable {
    /// Determines whether to finish a currently running motion.
    fn is_finished(&self) -> bool;
    /// Sets the attribute which decide if the currently running motion should be finished
    fn set_motion_finished(&mut self, finished: bool);
    /// Helper method to indicate that a motion should stop after processing the given command.
    fn motion_finished(self) -> Self;
}

/// Stores the joint velocities computed for one control tick.
///
/// A finished command always holds zeros, so a caller ignoring the flag still
/// commands a stationary robot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JointVelocities {
    motion_finished: bool,
    /// Desired joint velocities in \[rad/s\], one entry per servoed joint.
    pub dq: DVector<f64>,
}

impl From<DVector<f64>> for JointVelocities {
    fn from(vector: DVector<f64>) -> Self {
        JointVelocities::new(vector)
    }
}

impl JointVelocities {
    /// Creates a new JointVelocities instance.
    /// # Arguments
    /// * `joint_velocities` - Desired joint velocities in \[rad/s\].
    pub fn new(joint_velocities: DVector<f64>) -> Self {
        JointVelocities {
            dq: joint_velocities,
            motion_finished: false,
        }
    }
    /// Creates a finished command holding `joint_count` zeros.
    pub fn stopped(joint_count: usize) -> Self {
        JointVelocities::new(DVector::zeros(joint_count)).motion_finished()
    }
    /// Number of joints.
    pub fn len(&self) -> usize {
        self.dq.len()
    }
    pub fn is_empty(&self) -> bool {
        self.dq.is_empty()
    }
    /// true as long as the displacement is still being executed
    pub fn success(&self) -> bool {
        !self.motion_finished
    }
}

impl Finishable for JointVelocities {
    fn is_finished(&self) -> bool {
        self.motion_finished
    }
    fn set_motion_finished(&mut self, finished: bool) {
        self.motion_finished = finished;
    }
    fn motion_finished(mut self) -> Self {
        self.set_motion_finished(true);
        self
    }
}

/// A finite Cartesian displacement.
///
/// The rotation uses the `Rxyz` convention: `R = Rx(rxyz[0]) * Ry(rxyz[1]) * Rz(rxyz[2])`.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct DisplacementRequest {
    /// Translation in \[m\].
    pub translation: Vector3<f64>,
    /// Rotation angles in \[rad\].
    pub rxyz: Vector3<f64>,
}

impl DisplacementRequest {
    /// Creates a new request.
    /// # Arguments
    /// * `translation` - Translation in \[m\].
    /// * `rxyz` - `Rxyz` rotation angles in \[rad\].
    /// # Errors
    /// * [`MalformedDisplacement`](`crate::exception::DisplacementException::MalformedDisplacement`)
    /// if any component is NaN or infinite.
    pub fn new(translation: [f64; 3], rxyz: [f64; 3]) -> DisplacementResult<Self> {
        let request = DisplacementRequest {
            translation: translation.into(),
            rxyz: rxyz.into(),
        };
        request.validate()?;
        Ok(request)
    }

    /// Splits a 6-vector `[x, y, z, rx, ry, rz]` into a request.
    /// # Errors
    /// * [`MalformedDisplacement`](`crate::exception::DisplacementException::MalformedDisplacement`)
    /// if any component is NaN or infinite.
    pub fn from_vector(vector: &Vector6) -> DisplacementResult<Self> {
        let request = DisplacementRequest {
            translation: Vector3::new(vector[0], vector[1], vector[2]),
            rxyz: Vector3::new(vector[3], vector[4], vector[5]),
        };
        request.validate()?;
        Ok(request)
    }

    /// `[x, y, z, rx, ry, rz]`
    pub fn as_vector(&self) -> Vector6 {
        Vector6::new(
            self.translation.x,
            self.translation.y,
            self.translation.z,
            self.rxyz.x,
            self.rxyz.y,
            self.rxyz.z,
        )
    }

    pub fn rotation(&self) -> Rotation3<f64> {
        rxyz_to_rotation(&self.rxyz)
    }

    /// The displacement as homogeneous transformation.
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(self.translation.into(), self.rotation().into())
    }

    fn validate(&self) -> DisplacementResult<()> {
        if self.translation.iter().any(|x| !x.is_finite()) {
            return Err(DisplacementException::MalformedDisplacement {
                message: format!("non-finite translation {:?}", self.translation.as_slice()),
            });
        }
        if self.rxyz.iter().any(|x| !x.is_finite()) {
            return Err(DisplacementException::MalformedDisplacement {
                message: format!("non-finite rotation {:?}", self.rxyz.as_slice()),
            });
        }
        Ok(())
    }
}
