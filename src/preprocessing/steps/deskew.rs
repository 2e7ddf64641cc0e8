use crate::error::{PipelineError, Result};
use crate::raster::RasterImage;
use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

/// Corrections smaller than this are not worth a resampling pass
const MIN_CORRECTION_DEGREES: f32 = 0.1;

/// Deskewed image together with the correction that was applied
#[derive(Debug, Clone)]
pub struct Deskewed {
    pub image: GrayImage,
    /// Clockwise correction in degrees (0.0 when no rotation was needed)
    pub angle: f32,
}

/// Rotated rectangle as produced by rotating calipers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    pub center: (f32, f32),
    pub width: f32,
    pub height: f32,
    /// Orientation in degrees, normalized into `[-90, 0)`
    pub angle: f32,
}

/// Straighten the foreground (non-zero samples) of `image`
pub fn deskew(image: &RasterImage) -> Result<Deskewed> {
    image.ensure_non_empty()?;
    apply(&image.to_gray()?)
}

/// Deskew an already reduced plane
///
/// Fails with `EmptyForeground` when every sample is zero.
pub fn apply(gray: &GrayImage) -> Result<Deskewed> {
    let angle = estimate_skew(gray)?;

    if angle.abs() < MIN_CORRECTION_DEGREES {
        return Ok(Deskewed {
            image: gray.clone(),
            angle: 0.0,
        });
    }

    Ok(Deskewed {
        image: rotate_replicating_edges(gray, angle),
        angle,
    })
}

/// Clockwise correction (degrees) that aligns the foreground with the axes
pub fn estimate_skew(gray: &GrayImage) -> Result<f32> {
    let points: Vec<(f32, f32)> = gray
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] != 0)
        .map(|(x, y, _)| (x as f32, y as f32))
        .collect();

    let rect = min_area_rect(&points).ok_or(PipelineError::EmptyForeground)?;
    Ok(correction_angle(rect.angle))
}

/// Map a `[-90, 0)` rectangle angle to the rotation that undoes it.
///
/// Below -45 the rectangle is read as lying on its long side, which keeps
/// the correction inside (-45, 45] and avoids quarter-turn flips.
pub fn correction_angle(raw: f32) -> f32 {
    if raw < -45.0 {
        -(90.0 + raw)
    } else {
        -raw
    }
}

/// Minimum-area enclosing rectangle of a point set
pub fn min_area_rect(points: &[(f32, f32)]) -> Option<RotatedRect> {
    let hull = convex_hull(points);
    match hull.len() {
        0 => None,
        1 => Some(RotatedRect {
            center: hull[0],
            width: 0.0,
            height: 0.0,
            angle: -90.0,
        }),
        n => {
            let mut best: Option<(f32, RotatedRect)> = None;
            for i in 0..n {
                let (ax, ay) = hull[i];
                let (bx, by) = hull[(i + 1) % n];
                let (ex, ey) = (bx - ax, by - ay);
                let len = (ex * ex + ey * ey).sqrt();
                if len < f32::EPSILON {
                    continue;
                }
                let (ux, uy) = (ex / len, ey / len);

                let (mut min_u, mut max_u) = (f32::MAX, f32::MIN);
                let (mut min_v, mut max_v) = (f32::MAX, f32::MIN);
                for &(px, py) in &hull {
                    let (dx, dy) = (px - ax, py - ay);
                    let u = dx * ux + dy * uy;
                    let v = -dx * uy + dy * ux;
                    min_u = min_u.min(u);
                    max_u = max_u.max(u);
                    min_v = min_v.min(v);
                    max_v = max_v.max(v);
                }

                let (width, height) = (max_u - min_u, max_v - min_v);
                let area = width * height;
                // Strict comparison keeps the first edge on ties
                if best.as_ref().map_or(true, |(a, _)| area < *a - 1e-3) {
                    let (cu, cv) = ((min_u + max_u) / 2.0, (min_v + max_v) / 2.0);
                    let center = (ax + cu * ux - cv * uy, ay + cu * uy + cv * ux);
                    best = Some((
                        area,
                        RotatedRect {
                            center,
                            width,
                            height,
                            angle: normalize_angle(uy.atan2(ux).to_degrees()),
                        },
                    ));
                }
            }
            best.map(|(_, rect)| rect)
        }
    }
}

/// Fold an edge direction into `[-90, 0)`
fn normalize_angle(degrees: f32) -> f32 {
    let folded = degrees.rem_euclid(90.0);
    // Values within rounding of 90 are the axis-aligned case
    if folded < 1e-4 || 90.0 - folded < 1e-4 {
        -90.0
    } else {
        folded - 90.0
    }
}

/// Convex hull by Andrew's monotone chain, counter-clockwise, no collinear points
fn convex_hull(points: &[(f32, f32)]) -> Vec<(f32, f32)> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let cross = |o: (f32, f32), a: (f32, f32), b: (f32, f32)| {
        (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
    };

    let mut lower: Vec<(f32, f32)> = Vec::new();
    for &p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<(f32, f32)> = Vec::new();
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Rotate clockwise by `degrees` about the center with bicubic resampling
///
/// The border is replicated outwards before rotating so no constant fill
/// leaks into the output, then the original frame is cropped back out.
fn rotate_replicating_edges(gray: &GrayImage, degrees: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let diagonal = ((width as f32).powi(2) + (height as f32).powi(2)).sqrt();
    // Half-diagonal reach plus the bicubic support
    let pad = ((diagonal - width.min(height) as f32) / 2.0).ceil() as u32 + 3;

    let padded = GrayImage::from_fn(width + 2 * pad, height + 2 * pad, |x, y| {
        let sx = (x as i64 - pad as i64).clamp(0, width as i64 - 1) as u32;
        let sy = (y as i64 - pad as i64).clamp(0, height as i64 - 1) as u32;
        *gray.get_pixel(sx, sy)
    });

    let rotated = rotate_about_center(
        &padded,
        degrees.to_radians(),
        Interpolation::Bicubic,
        Luma([0u8]),
    );

    GrayImage::from_fn(width, height, |x, y| *rotated.get_pixel(x + pad, y + pad))
}
