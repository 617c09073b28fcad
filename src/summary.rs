use serde::Serialize;

use crate::assembler::{GazeSample, GazeSequence};
use crate::detect::{DensityEvents, DifferentialEvents};

/// Per-strategy counts of one analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub samples: usize,
    /// Samples with both pupils, i.e. with an averaged position.
    pub binocular_samples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub differential: Option<DifferentialSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<DensitySummary>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DifferentialSummary {
    pub fixations: usize,
    pub saccades: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DensitySummary {
    pub clusters: usize,
    pub noise: usize,
    pub saccades: usize,
}

impl Summary {
    pub fn new(
        sequence: &GazeSequence,
        differential: Option<&DifferentialEvents>,
        density: Option<&DensityEvents>,
    ) -> Self {
        Self {
            samples: sequence.len(),
            binocular_samples: sequence.iter().filter_map(GazeSample::avg).count(),
            differential: differential.map(|e| DifferentialSummary {
                fixations: e.fixations.len(),
                saccades: e.saccades.len(),
            }),
            density: density.map(|e| DensitySummary {
                clusters: e.cluster_count,
                noise: e.noise_count(),
                saccades: e.saccades.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{DensityDetector, DifferentialDetector, EventDetector};
    use crate::types::Point;

    #[test]
    fn counts_each_strategy() {
        let mut seq = GazeSequence::new();
        for i in 0..6 {
            let x = if i < 3 { 0.0 } else { 40.0 };
            seq.push(GazeSample::new(
                i,
                Some(Point::new(x, 0.0)),
                Some(Point::new(x + 60.0, 0.0)),
            ))
            .unwrap();
        }
        seq.push(GazeSample::absent(6)).unwrap();

        let diff = DifferentialDetector::default().detect(&seq);
        let dens = DensityDetector::default().detect(&seq);
        let summary = Summary::new(&seq, Some(&diff), Some(&dens));

        assert_eq!(summary.samples, 7);
        assert_eq!(summary.binocular_samples, 6);
        let d = summary.differential.unwrap();
        assert_eq!((d.fixations, d.saccades), (4, 1));
        // min_samples 5 is never reached by groups of 3
        let c = summary.density.unwrap();
        assert_eq!((c.clusters, c.noise, c.saccades), (0, 6, 1));
    }

    #[test]
    fn skipped_strategy_is_omitted_from_json() {
        let summary = Summary::new(&GazeSequence::new(), None, None);
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["samples"], 0);
        assert!(json.get("differential").is_none());
        assert!(json.get("density").is_none());
    }
}
