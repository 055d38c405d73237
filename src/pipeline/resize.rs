use anyhow::{anyhow, Result};
use fast_image_resize::{images::Image, PixelType, ResizeOptions, Resizer};
use image::{DynamicImage, RgbImage, RgbaImage};

/// Resample an image to exact target dimensions with a high-quality
/// convolution filter (fast_image_resize's default Lanczos3), suitable for
/// both enlargement and reduction.
///
/// Sources with an alpha channel go through the U8x4 path so transparency
/// survives; opaque sources use the cheaper U8x3 path.
pub fn resample(img: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage> {
    if img.width() == width && img.height() == height {
        return Ok(img.clone());
    }

    if img.color().has_alpha() {
        resample_rgba(&img.to_rgba8(), width, height).map(DynamicImage::ImageRgba8)
    } else {
        resample_rgb(&img.to_rgb8(), width, height).map(DynamicImage::ImageRgb8)
    }
}

fn resample_rgb(img: &RgbImage, width: u32, height: u32) -> Result<RgbImage> {
    let (src_width, src_height) = img.dimensions();

    let src = Image::from_vec_u8(src_width, src_height, img.as_raw().clone(), PixelType::U8x3)?;
    let mut dst = Image::new(width, height, PixelType::U8x3);

    let mut resizer = Resizer::new();
    resizer.resize(&src, &mut dst, Some(&ResizeOptions::default()))?;

    RgbImage::from_raw(width, height, dst.buffer().to_vec())
        .ok_or_else(|| anyhow!("Resampled buffer does not match {}x{}", width, height))
}

fn resample_rgba(img: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
    let (src_width, src_height) = img.dimensions();

    let src = Image::from_vec_u8(src_width, src_height, img.as_raw().clone(), PixelType::U8x4)?;
    let mut dst = Image::new(width, height, PixelType::U8x4);

    // Default options multiply/divide by alpha around the convolution, so
    // transparent regions do not bleed color
    let mut resizer = Resizer::new();
    resizer.resize(&src, &mut dst, Some(&ResizeOptions::default()))?;

    RgbaImage::from_raw(width, height, dst.buffer().to_vec())
        .ok_or_else(|| anyhow!("Resampled buffer does not match {}x{}", width, height))
}
