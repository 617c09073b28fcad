use image::{GrayImage as LumaImage, Luma};

use crate::types::BoundingBox;

/// Trait for accessing pixel intensities from a grayscale frame.
pub trait ImageAccess {
    /// Get the grayscale intensity at (x, y). Returns 0 for out-of-bounds pixels.
    fn get_pixel(&self, x: i32, y: i32) -> u8;

    /// Image dimensions.
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// A simple grayscale image buffer implementing ImageAccess.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl GrayImage {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(data.len(), (width * height) as usize);
        Self {
            data,
            width,
            height,
        }
    }

    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> u8,
    {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { data, width, height }
    }
}

impl From<LumaImage> for GrayImage {
    fn from(img: LumaImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height)
    }
}

impl ImageAccess for GrayImage {
    fn get_pixel(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.data[(y as u32 * self.width + x as u32) as usize]
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

/// Crop `rect` out of `image` and binarize it with an inverted threshold:
/// pixels with intensity `<= cutoff` become foreground (255), the rest 0.
///
/// `rect` must already be clamped to the image bounds.
pub fn crop_dark_mask<I: ImageAccess>(image: &I, rect: &BoundingBox, cutoff: u8) -> LumaImage {
    LumaImage::from_fn(rect.width, rect.height, |cx, cy| {
        let v = image.get_pixel(rect.x + cx as i32, rect.y + cy as i32);
        if v <= cutoff {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}
