//! Fixation and saccade classification strategies.
//!
//! Two independent strategies run over the same [`GazeSequence`]:
//! - [`DifferentialDetector`]: per-axis thresholds on consecutive binocular samples
//! - [`DensityDetector`]: spatial clustering of averaged positions plus
//!   consecutive-distance saccades
//!
//! Their results are never reconciled; both can be computed and compared.

pub mod density;
pub mod differential;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::assembler::GazeSequence;
use crate::types::Point;

pub use density::{ClusterLabel, DensityConfig, DensityDetector, DensityEvents, LabeledSample};
pub use differential::{DifferentialConfig, DifferentialDetector, DifferentialEvents};

/// Label attached to saccades found by the differential strategy.
pub const DEFAULT_SACCADE_LABEL: i32 = 1;

/// A binocular sample that did not move relative to its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FixationRecord {
    pub index: usize,
    pub left: Point,
    pub right: Point,
}

/// A jump between two consecutive gaze positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SaccadeRecord {
    pub start: Point,
    pub end: Point,
    /// Free-form annotation; not derived from the data.
    pub label: Option<i32>,
}

impl SaccadeRecord {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            label: None,
        }
    }

    pub fn with_label(mut self, label: i32) -> Self {
        self.label = Some(label);
        self
    }

    pub fn amplitude(&self) -> f64 {
        self.start.distance(&self.end)
    }
}

/// A classification strategy over a complete gaze sequence.
pub trait EventDetector {
    type Output;

    fn detect(&self, sequence: &GazeSequence) -> Self::Output;
}

/// Which strategies a run should apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Strategy {
    Differential,
    Density,
    Both,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Differential => "differential",
            Self::Density => "density",
            Self::Both => "both",
        }
    }

    pub fn runs_differential(&self) -> bool {
        matches!(self, Self::Differential | Self::Both)
    }

    pub fn runs_density(&self) -> bool {
        matches!(self, Self::Density | Self::Both)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown strategy `{0}`, expected differential, density or both")]
pub struct ParseStrategyError(String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "differential" => Ok(Self::Differential),
            "density" => Ok(Self::Density),
            "both" => Ok(Self::Both),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}
