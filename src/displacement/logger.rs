// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the logging type definitions for [`KinematicSingularity`](`crate::exception::DisplacementException::KinematicSingularity`)
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One row of the log: the joint velocities commanded at a tick.
/// Provided by the [`KinematicSingularity`](`crate::exception::DisplacementException::KinematicSingularity`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Record {
    /// Time of the tick in \[s\] since the epoch of the clock.
    pub time: f64,
    /// Commanded joint velocities in \[rad/s\].
    pub joint_velocities: DVector<f64>,
}

pub(crate) struct Logger {
    records: VecDeque<Record>,
    log_size: usize,
}

impl Logger {
    pub fn new(log_size: usize) -> Self {
        Logger {
            records: VecDeque::with_capacity(log_size),
            log_size,
        }
    }
    pub fn log(&mut self, time: f64, joint_velocities: &DVector<f64>) {
        if self.log_size == 0 {
            return;
        }
        if self.records.len() == self.log_size {
            self.records.pop_front();
        }
        self.records.push_back(Record {
            time,
            joint_velocities: joint_velocities.clone(),
        });
    }
    /// oldest record first
    pub fn records(&self) -> Vec<Record> {
        self.records.iter().cloned().collect()
    }
    pub fn flush(&mut self) -> Vec<Record> {
        self.records.drain(..).collect()
    }
}
