use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::debug;

use crate::error::ReaderError;
use crate::models::NormalizedContour;

/// Warp the display quadrilateral onto an axis-aligned `width x height` image
pub fn rectify_display(
    img: &RgbImage,
    display: &NormalizedContour,
) -> Result<RgbImage, ReaderError> {
    let (width, height) = (display.width, display.height);
    if width == 0 || height == 0 {
        return Err(ReaderError::no_display(format!(
            "display contour has no area ({}x{})",
            width, height
        )));
    }

    let (w, h) = (width as f32, height as f32);
    let src = display.vertices.map(|p| (p.x as f32, p.y as f32));
    let dest = [(w, h), (0.0, h), (0.0, 0.0), (w, 0.0)];

    let projection = Projection::from_control_points(src, dest).ok_or_else(|| {
        ReaderError::no_display("display contour is degenerate, no perspective transform exists")
    })?;

    let mut output = RgbImage::new(width, height);
    warp_into(img, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut output);

    debug!(width, height, "Rectified display");

    Ok(output)
}
