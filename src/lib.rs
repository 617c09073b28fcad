//! # gaze-events
//!
//! Pure Rust pupil tracking and fixation/saccade classification.
//!
//! This crate provides:
//! - **Pupil Localization**: dark-blob search inside the six-landmark eye outline
//! - **Gaze Samples**: an ordered timeline of per-frame left/right pupil positions
//! - **Event Detection**: two independent fixation/saccade strategies
//! - **Tables**: CSV ingestion and export of samples, fixations and saccades
//!
//! Facial landmarks come from an external detector through the
//! [`LandmarkProvider`] trait; frames come through [`FrameSource`].
//!
//! ## Pipeline Overview
//!
//! 1. For each frame, obtain the 68-point landmarks of the first face
//! 2. Crop each eye outline (points 36..=41 and 42..=47), threshold it and
//!    take the center of the largest dark contour as the pupil
//! 3. Append one [`GazeSample`] per frame to a [`GazeSequence`]
//! 4. Classify the finished sequence:
//!    - [`DifferentialDetector`]: per-axis displacement thresholds on
//!      consecutive binocular samples
//!    - [`DensityDetector`]: DBSCAN over averaged positions, plus saccades
//!      from large consecutive jumps
//!
//! ## Quick Start
//!
//! ```rust
//! use gaze_events::{
//!     DensityDetector, DifferentialDetector, EventDetector, GazeSample, GazeSequence, Point,
//! };
//!
//! let mut sequence = GazeSequence::new();
//! for (i, x) in [0.0, 3.0, 15.0].into_iter().enumerate() {
//!     sequence
//!         .push(GazeSample::new(
//!             i,
//!             Some(Point::new(x, x)),
//!             Some(Point::new(x + 60.0, x)),
//!         ))
//!         .unwrap();
//! }
//!
//! let differential = DifferentialDetector::default().detect(&sequence);
//! assert_eq!(differential.fixations.len(), 1);
//! assert_eq!(differential.saccades.len(), 1);
//!
//! let density = DensityDetector::default().detect(&sequence);
//! println!("{} clusters", density.cluster_count);
//! ```
//!
//! ## Custom Image Types
//!
//! Implement the [`ImageAccess`] trait for your own image types:
//!
//! ```rust
//! use gaze_events::ImageAccess;
//!
//! struct MyImage { /* ... */ }
//!
//! impl ImageAccess for MyImage {
//!     fn get_pixel(&self, x: i32, y: i32) -> u8 {
//!         // Return grayscale intensity at (x, y)
//!         // Return 0 for out-of-bounds
//!         0
//!     }
//!     fn width(&self) -> u32 { 640 }
//!     fn height(&self) -> u32 { 480 }
//! }
//! ```

mod acquisition;
mod assembler;
mod config;
pub mod detect;
mod error;
mod frame;
mod landmarks;
mod pupil;
mod sources;
mod summary;
pub mod table;
mod types;

pub use acquisition::{CancelToken, FrameSource, StopReason, Tracker, TrackingRun};
pub use assembler::{GazeSample, GazeSequence};
pub use config::AnalysisConfig;
pub use detect::{
    ClusterLabel, DensityConfig, DensityDetector, DensityEvents, DifferentialConfig,
    DifferentialDetector, DifferentialEvents, EventDetector, FixationRecord, LabeledSample,
    ParseStrategyError, SaccadeRecord, Strategy,
};
pub use error::{Error, Result};
pub use frame::{crop_dark_mask, GrayImage, ImageAccess};
pub use landmarks::{EyePair, EyeRegion, LandmarkProvider, LEFT_EYE, RIGHT_EYE};
pub use pupil::{contour_area, PupilLocalizer, DEFAULT_INTENSITY_CUTOFF};
pub use sources::{ImageDirSource, LandmarkFile};
pub use summary::{DensitySummary, DifferentialSummary, Summary};
pub use types::{BoundingBox, Point, PupilCenter, Shape};
