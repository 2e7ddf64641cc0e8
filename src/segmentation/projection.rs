use super::ProjectionParams;
use crate::raster::Region;
use image::GrayImage;

/// Column-wise count of foreground samples
pub fn vertical_profile(mask: &GrayImage) -> Vec<u32> {
    let mut profile = vec![0u32; mask.width() as usize];
    for (x, _, p) in mask.enumerate_pixels() {
        if p.0[0] != 0 {
            profile[x as usize] += 1;
        }
    }
    profile
}

/// Split the mask into column bands separated by empty runs
///
/// An empty run shorter than `min_gap` columns does not split a band. Each
/// band is tightened vertically to the rows that hold foreground.
pub fn find_regions(mask: &GrayImage, params: &ProjectionParams) -> Vec<Region> {
    let profile = vertical_profile(mask);
    let min_gap = params.min_gap.max(1) as usize;

    let mut bands: Vec<(usize, usize)> = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    let mut gap = 0usize;

    for (x, &count) in profile.iter().enumerate() {
        if count > 0 {
            current = match current {
                Some((start, _)) if gap < min_gap => Some((start, x)),
                Some(band) => {
                    bands.push(band);
                    Some((x, x))
                }
                None => Some((x, x)),
            };
            gap = 0;
        } else {
            gap += 1;
        }
    }
    bands.extend(current);

    let regions: Vec<Region> = bands
        .into_iter()
        .filter_map(|(start, end)| band_region(mask, start as u32, end as u32))
        .filter(|r| r.width >= params.min_width)
        .collect();

    tracing::debug!("{} projection bands admitted", regions.len());
    regions
}

fn band_region(mask: &GrayImage, start: u32, end: u32) -> Option<Region> {
    let rows: Vec<u32> = (0..mask.height())
        .filter(|&y| (start..=end).any(|x| mask.get_pixel(x, y).0[0] != 0))
        .collect();
    let (&top, &bottom) = (rows.first()?, rows.last()?);
    Some(Region::from_corners(start, top, end, bottom))
}
