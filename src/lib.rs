// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! # cartesian-displacement-rs
//! cartesian-displacement-rs turns a finite Cartesian displacement of an end effector into a
//! stream of joint velocity commands. The displacement is realised within a given duration by
//! following a constant twist, which is mapped to the joints through the pseudo-inverse of the
//! Jacobian at every tick of a control loop.
//!
//! **ALWAYS HAVE THE USER STOP BUTTON AT
//! HAND WHILE MOVING A REAL ROBOT!**
//!
//!
//! ## Design
//! The library does not talk to a robot. Joint names and Jacobians are read through the
//! [`KinematicsProvider`] trait, which is implemented for the simulated [`SyntheticRobot`]
//! and can be implemented for any robot SDK.
//!
//! The library is divided into these modules:
//! * [displacement](`crate::displacement`) - the [`CartesianDisplacement`] generator, its
//! settings and command types.
//! * [exponential_map](`crate::exponential_map`) - conversion between twists and rigid
//! transformations.
//! * [pseudo_inverse](`crate::pseudo_inverse`) - SVD based pseudo-inverse with singularity
//! handling.
//! * [kinematics](`crate::kinematics`) - the kinematics interface and a product of
//! exponentials model for simulation.
//! * [clock](`crate::clock`) - time sources for the generator.
//!
//! # Example:
//!```no_run
//! use displacement::{CartesianDisplacement, DisplacementResult, Finishable, SyntheticRobot, Vector6};
//! use nalgebra::{DMatrix, DVector};
//! use std::thread::sleep;
//! use std::time::Duration;
//! fn main() -> DisplacementResult<()> {
//!     let mut robot = SyntheticRobot::with_arms()?;
//!     robot
//!         .chain_mut("LArm")?
//!         .set_joint_positions(DVector::from_vec(vec![0.1, 0.4, -0.2, -1.2, 0.3, 0.5, -0.1]))?;
//!     let displacement = Vector6::new(0.05, 0., 0.02, 0., 0., 0.3);
//!     let adjoint = DMatrix::identity(6, 6);
//!     let mut generator = CartesianDisplacement::new(None);
//!     loop {
//!         let command =
//!             generator.compute_velocity(&robot, &displacement, 2.0, "LArm", &adjoint)?;
//!         if command.is_finished() {
//!             return Ok(());
//!         }
//!         robot.chain_mut("LArm")?.integrate(&command.dq, 0.01)?;
//!         sleep(Duration::from_millis(10));
//!     }
//! }
//!   ```
//!
//! The main function returns a DisplacementResult<()> which means that it returns either Ok(())
//! or an Error of type DisplacementException.
//!
//!```no_run
//! # use displacement::{CartesianDisplacement, DisplacementResult};
//! let mut generator = CartesianDisplacement::new(None);
//! ```
//! creates the generator. The argument is an optional
//! [`DisplacementConfig`]. We are happy with the defaults so we set it to None. The generator
//! reads the time from a [`MonotonicClock`], tests and simulations can pass a [`ManualClock`]
//! to [`CartesianDisplacement::with_clock`] instead.
//!
//! ```no_run
//! # use displacement::Vector6;
//! let displacement = Vector6::new(0.05, 0., 0.02, 0., 0., 0.3);
//! ```
//! This is the displacement expressed in the end effector frame: 5 cm along x, 2 cm along z and
//! a rotation of 0.3 rad about z. The rotation part is given as `Rxyz` angles.
//!
//! ```ignore
//! let command = generator.compute_velocity(&robot, &displacement, 2.0, "LArm", &adjoint)?;
//! ```
//! The first call activates the displacement: it computes the twist which reaches the
//! displacement in 2 seconds and drops the hand joint of the arm. Every call returns the joint
//! velocities for the current tick. The identity adjoint means the Jacobian is already
//! expressed in the frame of the displacement.
//!
//!```no_run
//! # use displacement::{Finishable, JointVelocities};
//! # fn command() -> Option<JointVelocities> {
//! # let command = JointVelocities::stopped(7);
//! if command.is_finished() {
//!     return None;
//! }
//! # Some(command)
//! # }
//! ```
//! Once the duration has elapsed the generator returns zero velocities marked as finished.
pub mod clock;
pub mod displacement;
pub mod exception;
pub mod exponential_map;
pub mod kinematics;
pub mod pseudo_inverse;
pub mod utils;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use displacement::config::DisplacementConfig;
pub use displacement::control_types::*;
pub use displacement::logger::Record;
pub use displacement::{Activation, CartesianDisplacement, DisplacementState};
pub use exception::{DisplacementException, DisplacementResult};
pub use kinematics::screw_chain::{ScrewChain, SyntheticRobot};
pub use kinematics::{Chain, KinematicsProvider};
pub use pseudo_inverse::SingularityHandling;
pub use utils::*;
