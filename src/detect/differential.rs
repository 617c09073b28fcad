use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EventDetector, FixationRecord, SaccadeRecord, DEFAULT_SACCADE_LABEL};
use crate::assembler::GazeSequence;

/// Thresholds for the differential strategy, in pixels.
///
/// No ordering between the two is enforced. With
/// `fixation_threshold < saccade_threshold`, transitions whose largest axis
/// displacement falls strictly between them are left unclassified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifferentialConfig {
    pub fixation_threshold: f64,
    pub saccade_threshold: f64,
}

impl Default for DifferentialConfig {
    fn default() -> Self {
        Self {
            fixation_threshold: 5.0,
            saccade_threshold: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DifferentialEvents {
    pub fixations: Vec<FixationRecord>,
    pub saccades: Vec<SaccadeRecord>,
}

/// Classifies each consecutive binocular pair by per-eye, per-axis displacement.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DifferentialDetector {
    pub config: DifferentialConfig,
}

impl DifferentialDetector {
    pub fn new(config: DifferentialConfig) -> Self {
        Self { config }
    }
}

impl EventDetector for DifferentialDetector {
    type Output = DifferentialEvents;

    fn detect(&self, sequence: &GazeSequence) -> DifferentialEvents {
        let mut events = DifferentialEvents::default();
        let mut skipped = 0usize;

        for pair in sequence.samples().windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            let (Some((prev_l, prev_r)), Some((cur_l, cur_r))) = (prev.binocular(), cur.binocular())
            else {
                skipped += 1;
                continue;
            };

            let max_delta = cur_l
                .max_axis_delta(&prev_l)
                .max(cur_r.max_axis_delta(&prev_r));

            if max_delta > self.config.saccade_threshold {
                events.saccades.push(
                    SaccadeRecord::new(prev_l, cur_l).with_label(DEFAULT_SACCADE_LABEL),
                );
            }
            if max_delta <= self.config.fixation_threshold {
                events.fixations.push(FixationRecord {
                    index: cur.index,
                    left: cur_l,
                    right: cur_r,
                });
            }
        }

        debug!(
            "differential: {} fixations, {} saccades, {} pairs skipped for missing pupils",
            events.fixations.len(),
            events.saccades.len(),
            skipped
        );
        events
    }
}
