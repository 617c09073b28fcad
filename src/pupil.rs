//! Pupil localization inside an eye region.
//!
//! The eye crop is binarized so that the darkest blob (pupil and iris against
//! the sclera) becomes foreground; the largest foreground contour wins and the
//! center of its bounding rectangle is reported in full-image coordinates.

use imageproc::contours::{find_contours, Contour};
use imageproc::point::Point as ContourPoint;
use serde::{Deserialize, Serialize};

use crate::frame::{crop_dark_mask, ImageAccess};
use crate::landmarks::EyeRegion;
use crate::types::{BoundingBox, PupilCenter};

/// Default binarization cutoff: pixels at or below this intensity are foreground.
pub const DEFAULT_INTENSITY_CUTOFF: u8 = 70;

/// Locates the pupil center inside an eye region of a grayscale frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PupilLocalizer {
    pub intensity_cutoff: u8,
}

impl Default for PupilLocalizer {
    fn default() -> Self {
        Self {
            intensity_cutoff: DEFAULT_INTENSITY_CUTOFF,
        }
    }
}

impl PupilLocalizer {
    pub const fn new(intensity_cutoff: u8) -> Self {
        Self { intensity_cutoff }
    }

    /// Locate the pupil of one eye.
    ///
    /// Returns `None` when the cropped region contains no foreground contour.
    /// When several contours share the largest area the first one found wins;
    /// contour discovery order follows a raster scan of the crop.
    pub fn locate<I: ImageAccess>(&self, region: &EyeRegion, image: &I) -> Option<PupilCenter> {
        let crop = BoundingBox::from_points(&region.points)?.clamp_to(image.width(), image.height());
        if crop.is_empty() {
            return None;
        }

        let mask = crop_dark_mask(image, &crop, self.intensity_cutoff);
        let contours: Vec<Contour<i32>> = find_contours(&mask);

        let mut best: Option<(&Contour<i32>, f64)> = None;
        for contour in &contours {
            let area = contour_area(&contour.points);
            if best.map_or(true, |(_, a)| area > a) {
                best = Some((contour, area));
            }
        }

        let (contour, _) = best?;
        let rect = bounding_rect(&contour.points)?;
        let center = rect.center();
        Some(PupilCenter::new(center.x + crop.x, center.y + crop.y))
    }
}

/// Area enclosed by a contour, using the shoelace formula.
pub fn contour_area(points: &[ContourPoint<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut area: i64 = 0;
    let n = points.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x as i64 * points[j].y as i64;
        area -= points[j].x as i64 * points[i].y as i64;
    }

    (area as f64 / 2.0).abs()
}

/// Up-right bounding rectangle of contour pixels; extents are inclusive, so a
/// single pixel has width and height 1.
fn bounding_rect(points: &[ContourPoint<i32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BoundingBox::new(
        min_x,
        min_y,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}
