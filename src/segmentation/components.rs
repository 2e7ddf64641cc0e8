use super::AreaBounds;
use crate::raster::Region;
use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

/// Bounding box and pixel count of one labelled component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    pub region: Region,
    pub pixel_count: u64,
}

#[derive(Debug, Clone, Copy)]
struct Extent {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    count: u64,
}

/// 8-connected components whose pixel area falls within `bounds`
///
/// Components are returned in label order, which follows the raster scan.
pub fn find_components(mask: &GrayImage, bounds: &AreaBounds) -> Vec<Component> {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

    // Indexed by label so iteration order never depends on hashing
    let mut extents: Vec<Option<Extent>> = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label.0[0] as usize;
        if label == 0 {
            continue;
        }
        if extents.len() < label {
            extents.resize(label, None);
        }
        let e = extents[label - 1].get_or_insert(Extent {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            count: 0,
        });
        e.min_x = e.min_x.min(x);
        e.min_y = e.min_y.min(y);
        e.max_x = e.max_x.max(x);
        e.max_y = e.max_y.max(y);
        e.count += 1;
    }

    let total = extents.len();
    let components: Vec<Component> = extents
        .into_iter()
        .flatten()
        .map(|e| Component {
            region: Region::from_corners(e.min_x, e.min_y, e.max_x, e.max_y),
            pixel_count: e.count,
        })
        .filter(|c| bounds.admits(c.pixel_count))
        .collect();

    tracing::debug!("{} of {} components admitted", components.len(), total);
    components
}
