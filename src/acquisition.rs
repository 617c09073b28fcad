//! Frame acquisition loop: frames in, gaze samples out.
//!
//! One frame is processed at a time, in order. The loop ends when the source
//! is exhausted, a frame cannot be read, or the [`CancelToken`] is set. It is
//! polled once per frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assembler::{GazeSample, GazeSequence};
use crate::error::Result;
use crate::frame::GrayImage;
use crate::landmarks::{EyePair, LandmarkProvider};
use crate::pupil::PupilLocalizer;
use crate::types::PupilCenter;

/// Supplies grayscale frames in acquisition order.
pub trait FrameSource {
    /// Next frame, `Ok(None)` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<GrayImage>>;
}

/// Shared stop flag checked once per acquisition cycle.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Why the acquisition loop ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StopReason {
    Exhausted,
    Cancelled,
    /// The source failed to deliver a frame; samples gathered so far are kept.
    SourceFailed(String),
}

#[derive(Debug, Clone)]
pub struct TrackingRun {
    pub sequence: GazeSequence,
    pub stop: StopReason,
}

/// Runs pupil localization over every frame of a source.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tracker {
    pub localizer: PupilLocalizer,
}

impl Tracker {
    pub fn new(localizer: PupilLocalizer) -> Self {
        Self { localizer }
    }

    /// Acquire frames until the source ends or `cancel` is set.
    ///
    /// Frame indices start at 1. Every acquired frame yields exactly one
    /// sample, all-absent if no face or pupil was found.
    pub fn run<S, L>(
        &self,
        source: &mut S,
        provider: &mut L,
        cancel: &CancelToken,
    ) -> Result<TrackingRun>
    where
        S: FrameSource + ?Sized,
        L: LandmarkProvider + ?Sized,
    {
        let mut sequence = GazeSequence::new();
        let mut frame_index = 0usize;

        let stop = loop {
            if cancel.is_cancelled() {
                info!("Stop requested after {} frames", frame_index);
                break StopReason::Cancelled;
            }

            let image = match source.next_frame() {
                Ok(Some(image)) => image,
                Ok(None) => break StopReason::Exhausted,
                Err(e) => {
                    warn!("Frame source failed after {} frames: {}", frame_index, e);
                    break StopReason::SourceFailed(e.to_string());
                }
            };
            frame_index += 1;

            let (left, right) = self.process_frame(frame_index, &image, provider);
            sequence.append(frame_index, left, right)?;
        };

        let binocular = sequence.iter().filter_map(GazeSample::avg).count();
        info!(
            "Acquired {} frames ({} with both pupils)",
            sequence.len(),
            binocular
        );

        Ok(TrackingRun { sequence, stop })
    }

    /// Locate both pupils of the first face in a frame.
    ///
    /// Landmark failures count as "no face": they are logged, not propagated.
    pub fn process_frame<L>(
        &self,
        frame_index: usize,
        image: &GrayImage,
        provider: &mut L,
    ) -> (Option<PupilCenter>, Option<PupilCenter>)
    where
        L: LandmarkProvider + ?Sized,
    {
        let faces = match provider.landmarks(frame_index, image) {
            Ok(faces) => faces,
            Err(e) => {
                warn!("Frame {}: landmark detection failed: {}", frame_index, e);
                return (None, None);
            }
        };

        let Some(face) = faces.first() else {
            debug!("Frame {}: no face", frame_index);
            return (None, None);
        };
        if faces.len() > 1 {
            debug!(
                "Frame {}: {} faces, using the first",
                frame_index,
                faces.len()
            );
        }

        let eyes = match EyePair::from_shape(face) {
            Ok(eyes) => eyes,
            Err(e) => {
                debug!("Frame {}: {}", frame_index, e);
                return (None, None);
            }
        };

        (
            self.localizer.locate(&eyes.left, image),
            self.localizer.locate(&eyes.right, image),
        )
    }
}
