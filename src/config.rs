use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detect::density::DensityConfig;
use crate::detect::differential::DifferentialConfig;
use crate::error::{Error, Result};
use crate::pupil::{PupilLocalizer, DEFAULT_INTENSITY_CUTOFF};

/// All tunable parameters of a tracking and classification run.
///
/// Distances are in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Per-axis displacement at or below which a transition is a fixation.
    #[serde(default = "default_fixation_threshold")]
    pub fixation_threshold: f64,
    /// Per-axis displacement above which a transition is a saccade.
    #[serde(default = "default_saccade_threshold")]
    pub saccade_threshold: f64,
    /// Clustering neighborhood radius.
    #[serde(default = "default_eps")]
    pub eps: f64,
    /// Minimum neighborhood size (including the point itself) of a core point.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    /// Averaged-position jump above which the density path reports a saccade.
    #[serde(default = "default_saccade_distance")]
    pub saccade_distance: f64,
    /// Binarization cutoff for pupil localization.
    #[serde(default = "default_intensity_cutoff")]
    pub intensity_cutoff: u8,
}

fn default_fixation_threshold() -> f64 {
    5.0
}

fn default_saccade_threshold() -> f64 {
    10.0
}

fn default_eps() -> f64 {
    15.0
}

fn default_min_samples() -> usize {
    5
}

fn default_saccade_distance() -> f64 {
    5.0
}

fn default_intensity_cutoff() -> u8 {
    DEFAULT_INTENSITY_CUTOFF
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fixation_threshold: default_fixation_threshold(),
            saccade_threshold: default_saccade_threshold(),
            eps: default_eps(),
            min_samples: default_min_samples(),
            saccade_distance: default_saccade_distance(),
            intensity_cutoff: default_intensity_cutoff(),
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run can use. Call before any processing starts.
    pub fn validate(&self) -> Result<()> {
        check_distance("fixation_threshold", self.fixation_threshold)?;
        check_distance("saccade_threshold", self.saccade_threshold)?;
        check_distance("eps", self.eps)?;
        check_distance("saccade_distance", self.saccade_distance)?;
        if self.min_samples == 0 {
            return Err(Error::InvalidConfig(
                "min_samples must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn localizer(&self) -> PupilLocalizer {
        PupilLocalizer::new(self.intensity_cutoff)
    }

    pub fn differential(&self) -> DifferentialConfig {
        DifferentialConfig {
            fixation_threshold: self.fixation_threshold,
            saccade_threshold: self.saccade_threshold,
        }
    }

    pub fn density(&self) -> DensityConfig {
        DensityConfig {
            eps: self.eps,
            min_samples: self.min_samples,
            saccade_distance: self.saccade_distance,
        }
    }
}

fn check_distance(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::InvalidConfig(format!(
            "{} must be a finite number, got {}",
            name, value
        )));
    }
    if value < 0.0 {
        return Err(Error::InvalidConfig(format!(
            "{} must be non-negative, got {}",
            name, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_documented_values() {
        let c = AnalysisConfig::default();
        assert_eq!(c.fixation_threshold, 5.0);
        assert_eq!(c.saccade_threshold, 10.0);
        assert_eq!(c.eps, 15.0);
        assert_eq!(c.min_samples, 5);
        assert_eq!(c.saccade_distance, 5.0);
        assert_eq!(c.intensity_cutoff, 70);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let c = AnalysisConfig {
            saccade_threshold: -1.0,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn non_finite_and_zero_min_samples_are_rejected() {
        let c = AnalysisConfig {
            eps: f64::NAN,
            ..Default::default()
        };
        assert!(c.validate().is_err());

        let c = AnalysisConfig {
            min_samples: 0,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn inverted_thresholds_are_accepted() {
        let c = AnalysisConfig {
            fixation_threshold: 20.0,
            saccade_threshold: 10.0,
            ..Default::default()
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn load_partial_json_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "eps": 8.5, "min_samples": 3 }}"#).unwrap();

        let c = AnalysisConfig::load(file.path()).unwrap();
        assert_eq!(c.eps, 8.5);
        assert_eq!(c.min_samples, 3);
        assert_eq!(c.saccade_threshold, 10.0);
    }

    #[test]
    fn load_rejects_non_numeric_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "eps": "wide" }}"#).unwrap();
        assert!(matches!(
            AnalysisConfig::load(file.path()),
            Err(Error::Json(_))
        ));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "fixation_threshold": -2 }}"#).unwrap();
        assert!(matches!(
            AnalysisConfig::load(file.path()),
            Err(Error::InvalidConfig(_))
        ));
    }
}
