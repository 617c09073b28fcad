//! Ordered gaze-sample sequence built one frame at a time.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::{Point, PupilCenter};

/// One frame's worth of pupil positions.
///
/// `avg` is present exactly when both `left` and `right` are.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GazeSample {
    /// Frame or time ordinal.
    pub index: usize,
    pub left: Option<Point>,
    pub right: Option<Point>,
    avg: Option<Point>,
}

impl GazeSample {
    pub fn new(index: usize, left: Option<Point>, right: Option<Point>) -> Self {
        let left = left.filter(Point::is_finite);
        let right = right.filter(Point::is_finite);
        let avg = match (left, right) {
            (Some(l), Some(r)) => Some(l.midpoint(&r)),
            _ => None,
        };
        Self {
            index,
            left,
            right,
            avg,
        }
    }

    /// A sample with no detected eyes.
    pub fn absent(index: usize) -> Self {
        Self::new(index, None, None)
    }

    pub fn avg(&self) -> Option<Point> {
        self.avg
    }

    /// Both pupils, if both were detected.
    pub fn binocular(&self) -> Option<(Point, Point)> {
        Some((self.left?, self.right?))
    }
}

/// Append-only, strictly index-ordered sequence of gaze samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GazeSequence {
    samples: Vec<GazeSample>,
}

impl GazeSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the pupils found in frame `index`.
    ///
    /// Fails if `index` does not exceed the last appended index.
    pub fn append(
        &mut self,
        index: usize,
        left: Option<PupilCenter>,
        right: Option<PupilCenter>,
    ) -> Result<&GazeSample> {
        self.push(GazeSample::new(index, left.map(Point::from), right.map(Point::from)))
    }

    /// Append an already-built sample, e.g. one read from a table.
    pub fn push(&mut self, sample: GazeSample) -> Result<&GazeSample> {
        if let Some(last) = self.samples.last() {
            if sample.index <= last.index {
                return Err(Error::OutOfOrder {
                    index: sample.index,
                    previous: last.index,
                });
            }
        }
        self.samples.push(sample);
        Ok(&self.samples[self.samples.len() - 1])
    }

    pub fn samples(&self) -> &[GazeSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GazeSample> {
        self.samples.iter()
    }

    /// Samples with both pupils present, keeping their original index.
    pub fn binocular(&self) -> impl Iterator<Item = (usize, Point, Point)> + '_ {
        self.samples
            .iter()
            .filter_map(|s| s.binocular().map(|(l, r)| (s.index, l, r)))
    }

    /// Samples with an averaged position, keeping their original index.
    pub fn averaged(&self) -> impl Iterator<Item = (usize, Point)> + '_ {
        self.samples
            .iter()
            .filter_map(|s| s.avg().map(|a| (s.index, a)))
    }
}

impl<'a> IntoIterator for &'a GazeSequence {
    type Item = &'a GazeSample;
    type IntoIter = std::slice::Iter<'a, GazeSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
