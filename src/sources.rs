//! File-backed frame and landmark sources.

use std::collections::{BTreeMap, VecDeque};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::acquisition::FrameSource;
use crate::error::Result;
use crate::frame::GrayImage;
use crate::landmarks::LandmarkProvider;
use crate::types::{Point, Shape};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Frames stored as image files in one directory, read in file-name order.
#[derive(Debug, Clone)]
pub struct ImageDirSource {
    files: VecDeque<PathBuf>,
}

impl ImageDirSource {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if path.is_file() && is_image {
                files.push(path);
            }
        }
        files.sort();

        info!(
            "Found {} frames in {}",
            files.len(),
            dir.as_ref().display()
        );
        Ok(Self {
            files: files.into(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.files.len()
    }
}

impl FrameSource for ImageDirSource {
    fn next_frame(&mut self) -> Result<Option<GrayImage>> {
        let Some(path) = self.files.pop_front() else {
            return Ok(None);
        };
        debug!("Reading frame {}", path.display());
        let img = image::open(&path)?;
        Ok(Some(GrayImage::from(img.to_luma8())))
    }
}

/// Landmarks precomputed by an external detector.
///
/// JSON layout: an object mapping frame index to a list of faces, each face a
/// list of `[x, y]` points:
///
/// ```json
/// { "1": [[[102.0, 88.5], [104.2, 97.0], ...]], "2": [] }
/// ```
///
/// Frames missing from the map have no face.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkFile {
    frames: BTreeMap<usize, Vec<Vec<[f64; 2]>>>,
}

impl LandmarkFile {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let landmarks = Self::from_reader(BufReader::new(file))?;
        info!(
            "Loaded landmarks for {} frames from {}",
            landmarks.frames.len(),
            path.as_ref().display()
        );
        Ok(landmarks)
    }

    pub fn insert(&mut self, frame_index: usize, faces: &[Shape]) {
        let faces = faces
            .iter()
            .map(|s| s.points.iter().map(|p| [p.x, p.y]).collect())
            .collect();
        self.frames.insert(frame_index, faces);
    }

    pub fn faces(&self, frame_index: usize) -> Vec<Shape> {
        self.frames
            .get(&frame_index)
            .map(|faces| {
                faces
                    .iter()
                    .map(|pts| Shape::new(pts.iter().map(|&[x, y]| Point::new(x, y)).collect()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl LandmarkProvider for LandmarkFile {
    fn landmarks(&mut self, frame_index: usize, _image: &GrayImage) -> Result<Vec<Shape>> {
        Ok(self.faces(frame_index))
    }
}
