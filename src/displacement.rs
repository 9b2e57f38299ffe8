// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the displacement::CartesianDisplacement type.
//!
//! A [`CartesianDisplacement`] turns one finite Cartesian displacement into a stream of joint
//! velocities. On activation it computes the constant twist which realises the displacement
//! within the given duration. Every tick afterwards maps that twist through the
//! pseudo-inverse of the current Jacobian until the duration has elapsed.
//!
//! ```text
//!                 activate                 now >= start + duration
//! Uninitialized ------------> Active --------------------------------> Expired
//! ```
//! There is no way back: a new displacement needs a new instance.

pub mod config;
pub mod control_types;
pub mod logger;

use std::time::Duration;

use nalgebra::{DMatrix, DVector};
use tracing::{debug, info, trace};

use crate::clock::{Clock, MonotonicClock};
use crate::displacement::config::DisplacementConfig;
use crate::displacement::control_types::{DisplacementRequest, JointVelocities};
use crate::displacement::logger::{Logger, Record};
use crate::exception::{
    create_dimension_mismatch, create_invalid_argument, DisplacementException, DisplacementResult,
};
use crate::exponential_map;
use crate::kinematics::{servoed_joints, KinematicsProvider};
use crate::pseudo_inverse::pseudo_inverse;
use crate::utils::{Twist, Vector6};

/// Everything fixed when a displacement is activated.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    activation_time: f64,
    duration: f64,
    chain: String,
    joint_names: Vec<String>,
    twist: Twist,
    displacement: DisplacementRequest,
}

impl Activation {
    /// Time of the activation in \[s\] since the epoch of the clock.
    pub fn activation_time(&self) -> f64 {
        self.activation_time
    }
    /// Time budget in \[s\].
    pub fn duration(&self) -> f64 {
        self.duration
    }
    pub fn chain(&self) -> &str {
        &self.chain
    }
    /// Names of the joints under velocity control, gripper excluded.
    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }
    /// Constant twist `[v; ω]` which realises the displacement within the duration.
    pub fn twist(&self) -> &Twist {
        &self.twist
    }
    pub fn displacement(&self) -> &DisplacementRequest {
        &self.displacement
    }
    fn deadline(&self) -> f64 {
        self.activation_time + self.duration
    }
    fn check_matches(
        &self,
        displacement: &Vector6,
        duration: f64,
        chain: &str,
    ) -> DisplacementResult<()> {
        let message = if self.displacement.as_vector() != *displacement {
            format!(
                "displacement {:?} differs from activated {:?}",
                displacement.as_slice(),
                self.displacement.as_vector().as_slice()
            )
        } else if self.duration != duration {
            format!(
                "duration {} differs from activated {}",
                duration, self.duration
            )
        } else if self.chain != chain {
            format!("chain {} differs from activated {}", chain, self.chain)
        } else {
            return Ok(());
        };
        Err(DisplacementException::ActivationMismatch { message })
    }
}

/// State of a [`CartesianDisplacement`].
#[derive(Debug, Clone, PartialEq)]
pub enum DisplacementState {
    /// Not activated yet.
    Uninitialized,
    /// The displacement is being executed.
    Active(Activation),
    /// The time budget is exhausted. Only zero velocities are returned from now on.
    Expired(Activation),
}

/// Generates joint velocities which realise a finite Cartesian displacement within a given
/// duration.
///
/// The generator is meant to be called once per tick of a synchronous control loop. All
/// mutating methods take `&mut self`, an instance shared between threads needs an outer
/// `Mutex`.
pub struct CartesianDisplacement<C: Clock = MonotonicClock> {
    config: DisplacementConfig,
    clock: C,
    state: DisplacementState,
    joint_velocities: DVector<f64>,
    logger: Logger,
}

impl CartesianDisplacement<MonotonicClock> {
    /// Creates a new generator which reads the time from a [`MonotonicClock`].
    /// # Arguments
    /// * `config` - Settings, [`DisplacementConfig::default`] if None.
    pub fn new<CF: Into<Option<DisplacementConfig>>>(config: CF) -> Self {
        CartesianDisplacement::with_clock(config, MonotonicClock::new())
    }
}

impl<C: Clock> CartesianDisplacement<C> {
    /// Creates a new generator driven by `clock`.
    /// # Arguments
    /// * `config` - Settings, [`DisplacementConfig::default`] if None.
    /// * `clock` - Time source which is sampled on every activation and tick.
    pub fn with_clock<CF: Into<Option<DisplacementConfig>>>(config: CF, clock: C) -> Self {
        let config = config.into().unwrap_or_default();
        let logger = Logger::new(config.log_size);
        CartesianDisplacement {
            config,
            clock,
            state: DisplacementState::Uninitialized,
            joint_velocities: DVector::zeros(0),
            logger,
        }
    }

    /// Activates the displacement: computes the constant twist and records the joints of
    /// `chain`. Does not compute joint velocities, see [`tick`](`Self::tick`).
    ///
    /// # Arguments
    /// * `kinematics` - Provides the joint names of `chain`.
    /// * `displacement` - `[x, y, z, rx, ry, rz]`, translation in \[m\] followed by `Rxyz`
    /// angles in \[rad\].
    /// * `duration` - Time budget in \[s\].
    /// * `chain` - Name of the kinematic chain to move.
    /// # Errors
    /// * [`AlreadyActivated`](`crate::exception::DisplacementException::AlreadyActivated`) if
    /// this instance was activated before.
    /// * [`InvalidArgument`](`crate::exception::DisplacementException::InvalidArgument`) if
    /// `duration` is not positive and finite.
    /// * [`MalformedDisplacement`](`crate::exception::DisplacementException::MalformedDisplacement`)
    /// if `displacement` contains NaN or infinity.
    /// * [`InvalidChain`](`crate::exception::DisplacementException::InvalidChain`) if the chain
    /// has no servoed joints.
    /// * errors of the [`KinematicsProvider`].
    ///
    /// The instance stays uninitialized if an error is returned.
    pub fn activate<K: KinematicsProvider + ?Sized>(
        &mut self,
        kinematics: &K,
        displacement: &Vector6,
        duration: f64,
        chain: &str,
    ) -> DisplacementResult<()> {
        if self.state != DisplacementState::Uninitialized {
            return Err(DisplacementException::AlreadyActivated);
        }
        if !(duration.is_finite() && duration > 0.) {
            return Err(create_invalid_argument(format!(
                "duration has to be positive and finite, got {}",
                duration
            )));
        }
        let displacement = DisplacementRequest::from_vector(displacement)?;
        let twist = exponential_map::inverse(&displacement.to_isometry(), duration)?;
        let joint_names = servoed_joints(
            kinematics.joint_names(chain)?,
            chain,
            self.config.carries_gripper(chain),
        )?;
        let activation_time = self.clock.now().as_secs_f64();
        debug!(
            chain,
            duration,
            joints = ?joint_names,
            twist = ?twist.as_slice(),
            "activated Cartesian displacement"
        );
        self.joint_velocities = DVector::zeros(joint_names.len());
        self.state = DisplacementState::Active(Activation {
            activation_time,
            duration,
            chain: chain.to_string(),
            joint_names,
            twist,
            displacement,
        });
        Ok(())
    }

    /// Computes the joint velocities for the current tick.
    ///
    /// While the time budget lasts, the result is the pseudo-inverse of
    /// `orientation_adjoint * jacobian` applied to the twist, which is the minimum-norm joint
    /// velocity realising the twist. Once the budget is exhausted the result is a finished
    /// command holding zeros, for this and every later tick.
    ///
    /// # Arguments
    /// * `kinematics` - Provides the Jacobian of the activated chain.
    /// * `orientation_adjoint` - 6x6 matrix re-expressing the end effector Jacobian in the
    /// frame of the displacement, e.g. from
    /// [`rotation_twist_matrix`](`crate::utils::rotation_twist_matrix`).
    /// # Errors
    /// * [`NotActivated`](`crate::exception::DisplacementException::NotActivated`) before
    /// [`activate`](`Self::activate`).
    /// * [`DimensionMismatch`](`crate::exception::DisplacementException::DimensionMismatch`)
    /// if the matrices do not fit the activated joints.
    /// * [`KinematicSingularity`](`crate::exception::DisplacementException::KinematicSingularity`)
    /// in a degenerate configuration, depending on
    /// [`DisplacementConfig::singularity_handling`].
    /// * errors of the [`KinematicsProvider`].
    ///
    /// An error leaves the state untouched.
    pub fn tick<K: KinematicsProvider + ?Sized>(
        &mut self,
        kinematics: &K,
        orientation_adjoint: &DMatrix<f64>,
    ) -> DisplacementResult<JointVelocities> {
        let now = self.clock.now().as_secs_f64();
        let activation = match &self.state {
            DisplacementState::Uninitialized => return Err(DisplacementException::NotActivated),
            DisplacementState::Expired(activation) => {
                return Ok(JointVelocities::stopped(activation.joint_names.len()))
            }
            DisplacementState::Active(activation) => activation,
        };
        if now >= activation.deadline() {
            self.expire(now);
            return Ok(JointVelocities::stopped(self.joint_velocities.len()));
        }

        let jacobian = kinematics.jacobian(&activation.chain)?;
        check_dimensions(orientation_adjoint, &jacobian, activation.joint_names.len())?;
        let oriented_jacobian = orientation_adjoint * &jacobian;
        let inverse = match pseudo_inverse(
            &oriented_jacobian,
            self.config.singular_value_threshold,
            self.config.singularity_handling,
        ) {
            Ok(inverse) => inverse,
            Err(error) => return Err(error.with_log(self.logger.flush())),
        };
        self.joint_velocities = inverse * DVector::from_column_slice(activation.twist.as_slice());
        self.logger.log(now, &self.joint_velocities);
        trace!(
            time = now - activation.activation_time,
            dq = ?self.joint_velocities.as_slice(),
            "displacement tick"
        );
        Ok(JointVelocities::new(self.joint_velocities.clone()))
    }

    /// Activates on the first call and ticks on every call.
    ///
    /// `displacement`, `duration` and `chain` are only used by the first call. Later calls
    /// must pass the same values, otherwise an
    /// [`ActivationMismatch`](`crate::exception::DisplacementException::ActivationMismatch`)
    /// is returned. [`success`](`JointVelocities::success`) of the result is false once the
    /// duration has elapsed.
    ///
    /// ```
    /// use displacement::{CartesianDisplacement, Finishable, ManualClock, SyntheticRobot, Vector6};
    /// use nalgebra::{DMatrix, DVector};
    /// # fn main() -> displacement::DisplacementResult<()> {
    /// let clock = ManualClock::new();
    /// let mut robot = SyntheticRobot::with_arms()?;
    /// robot
    ///     .chain_mut("LArm")?
    ///     .set_joint_positions(DVector::from_vec(vec![0.1, 0.4, -0.2, -1.2, 0.3, 0.5, -0.1]))?;
    /// let mut generator = CartesianDisplacement::with_clock(None, &clock);
    /// let displacement = Vector6::new(0.1, 0., 0., 0., 0., 0.);
    /// let adjoint = DMatrix::identity(6, 6);
    /// loop {
    ///     let command = generator.compute_velocity(&robot, &displacement, 2.0, "LArm", &adjoint)?;
    ///     if command.is_finished() {
    ///         break;
    ///     }
    ///     robot.chain_mut("LArm")?.integrate(&command.dq, 0.01)?;
    ///     clock.advance_secs(0.01);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn compute_velocity<K: KinematicsProvider + ?Sized>(
        &mut self,
        kinematics: &K,
        displacement: &Vector6,
        duration: f64,
        chain: &str,
        orientation_adjoint: &DMatrix<f64>,
    ) -> DisplacementResult<JointVelocities> {
        let recorded = match &self.state {
            DisplacementState::Uninitialized => None,
            DisplacementState::Active(activation) | DisplacementState::Expired(activation) => {
                Some(activation.check_matches(displacement, duration, chain))
            }
        };
        match recorded {
            None => self.activate(kinematics, displacement, duration, chain)?,
            Some(check) => check?,
        }
        self.tick(kinematics, orientation_adjoint)
    }

    pub fn state(&self) -> &DisplacementState {
        &self.state
    }

    /// true between activation and the tick which notices the end of the duration
    pub fn is_active(&self) -> bool {
        matches!(self.state, DisplacementState::Active(_))
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.state, DisplacementState::Expired(_))
    }

    pub fn activation(&self) -> Option<&Activation> {
        match &self.state {
            DisplacementState::Uninitialized => None,
            DisplacementState::Active(activation) | DisplacementState::Expired(activation) => {
                Some(activation)
            }
        }
    }

    /// The constant twist, None before activation.
    pub fn twist(&self) -> Option<&Twist> {
        self.activation().map(Activation::twist)
    }

    /// The servoed joints, None before activation.
    pub fn joint_names(&self) -> Option<&[String]> {
        self.activation().map(Activation::joint_names)
    }

    /// Joint velocities of the last tick.
    pub fn joint_velocities(&self) -> &DVector<f64> {
        &self.joint_velocities
    }

    /// Time left of the budget, None before activation.
    pub fn remaining(&self) -> Option<Duration> {
        match &self.state {
            DisplacementState::Uninitialized => None,
            DisplacementState::Expired(_) => Some(Duration::from_secs(0)),
            DisplacementState::Active(activation) => {
                let left = activation.deadline() - self.clock.now().as_secs_f64();
                Some(Duration::from_secs_f64(left.max(0.)))
            }
        }
    }

    /// The recent ticks, oldest first.
    pub fn records(&self) -> Vec<Record> {
        self.logger.records()
    }

    pub fn config(&self) -> &DisplacementConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn expire(&mut self, now: f64) {
        self.state = match std::mem::replace(&mut self.state, DisplacementState::Uninitialized) {
            DisplacementState::Active(activation) => {
                info!(
                    chain = %activation.chain,
                    elapsed = now - activation.activation_time,
                    "Cartesian displacement finished"
                );
                DisplacementState::Expired(activation)
            }
            other => other,
        };
        self.joint_velocities.fill(0.);
    }
}

fn check_dimensions(
    orientation_adjoint: &DMatrix<f64>,
    jacobian: &DMatrix<f64>,
    joint_count: usize,
) -> DisplacementResult<()> {
    if orientation_adjoint.nrows() != 6 {
        return Err(create_dimension_mismatch(format!(
            "orientation adjoint has {} rows, expected 6",
            orientation_adjoint.nrows()
        )));
    }
    if orientation_adjoint.ncols() != jacobian.nrows() {
        return Err(create_dimension_mismatch(format!(
            "orientation adjoint has {} columns but the Jacobian has {} rows",
            orientation_adjoint.ncols(),
            jacobian.nrows()
        )));
    }
    if jacobian.ncols() != joint_count {
        return Err(create_dimension_mismatch(format!(
            "Jacobian has {} columns for {} servoed joints",
            jacobian.ncols(),
            joint_count
        )));
    }
    Ok(())
}
