// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains exception and Result definitions
use crate::displacement::logger::Record;
use thiserror::Error;

/// Represents all kind of errors which can occur while activating or ticking a
/// [`CartesianDisplacement`](`crate::CartesianDisplacement`).
///
/// Reaching the end of the time budget is not an error. It is reported through
/// [`Finishable::is_finished`](`crate::Finishable::is_finished`) on the returned command.
#[derive(Error, Debug)]
pub enum DisplacementException {
    /// InvalidArgument is returned for a non-positive or non-finite duration and for
    /// non-finite matrices passed to the generator.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// MalformedDisplacement is returned if the requested displacement cannot be turned into a
    /// homogeneous transformation, e.g. because it contains NaN.
    #[error("Malformed displacement: {message}")]
    MalformedDisplacement { message: String },

    /// KinematicSingularity is returned if the Jacobian is numerically degenerate and
    /// [`SingularityHandling::Reject`](`crate::SingularityHandling::Reject`) is configured.
    /// The exception holds the last ticks before the singularity was hit. The number of
    /// recorded ticks can be configured with
    /// [`DisplacementConfig::log_size`](`crate::DisplacementConfig::log_size`).
    #[error("Kinematic singularity: smallest singular value {smallest_singular_value:e}")]
    KinematicSingularity {
        /// Smallest singular value of the oriented Jacobian.
        smallest_singular_value: f64,
        /// Ticks logged just before the exception occurred.
        log: Option<Vec<Record>>,
    },

    /// DimensionMismatch is returned if the Jacobian, the orientation adjoint and the joint
    /// list do not fit together.
    #[error("Dimension mismatch: {message}")]
    DimensionMismatch { message: String },

    /// InvalidChain is returned if a chain has no joints under velocity control.
    #[error("Chain {chain:?} has no servoed joints")]
    InvalidChain { chain: String },

    /// NotActivated is returned when ticking a generator which was never activated.
    #[error("Trying to tick a displacement which was not activated!")]
    NotActivated,

    /// AlreadyActivated is returned when activating a generator a second time.
    #[error("Displacement already activated, create a new instance for a new displacement!")]
    AlreadyActivated,

    /// ActivationMismatch is returned if the inputs of a repeated
    /// [`compute_velocity`](`crate::CartesianDisplacement::compute_velocity`) call differ from
    /// the ones of the activating call.
    #[error("Activation mismatch: {message}")]
    ActivationMismatch { message: String },

    /// KinematicsException wraps errors reported by a
    /// [`KinematicsProvider`](`crate::KinematicsProvider`).
    #[error("{message:?}")]
    KinematicsException { message: String },
}

impl DisplacementException {
    /// attaches the tick log to variants which can carry one
    pub(crate) fn with_log(self, records: Vec<Record>) -> Self {
        match self {
            DisplacementException::KinematicSingularity {
                smallest_singular_value,
                ..
            } => DisplacementException::KinematicSingularity {
                smallest_singular_value,
                log: Some(records),
            },
            other => other,
        }
    }
}

/// creates an InvalidArgument exception from a message
pub(crate) fn create_invalid_argument<S: Into<String>>(message: S) -> DisplacementException {
    DisplacementException::InvalidArgument {
        message: message.into(),
    }
}

/// creates a DimensionMismatch exception from a message
pub(crate) fn create_dimension_mismatch<S: Into<String>>(message: S) -> DisplacementException {
    DisplacementException::DimensionMismatch {
        message: message.into(),
    }
}

/// Result type which can have DisplacementException as Error
pub type DisplacementResult<T> = Result<T, DisplacementException>;
