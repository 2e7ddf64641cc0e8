use super::SizeBounds;
use crate::raster::Region;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

/// Bounding boxes of the outermost contours whose sides fall within `bounds`
pub fn find_regions(mask: &GrayImage, bounds: &SizeBounds) -> Vec<Region> {
    let contours = find_contours::<u32>(mask);
    let total = contours.len();

    let regions: Vec<Region> = contours
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .filter_map(|c| {
            let first = c.points.first()?;
            let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
            for p in &c.points {
                min_x = min_x.min(p.x);
                min_y = min_y.min(p.y);
                max_x = max_x.max(p.x);
                max_y = max_y.max(p.y);
            }
            Some(Region::from_corners(min_x, min_y, max_x, max_y))
        })
        .filter(|r| bounds.admits(r.width, r.height))
        .collect();

    tracing::debug!("{} of {} contours admitted", regions.len(), total);
    regions
}
