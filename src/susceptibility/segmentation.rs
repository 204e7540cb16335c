//! Automatic object segmentation from a magnitude image pair
//!
//! The object (e.g. an applicator) shows up as a signal change between the
//! baseline and reference magnitudes. The difference image is thresholded
//! with a maximum-entropy criterion, the largest face-connected component is
//! kept, and its boundary is smoothed with dilation (radius 1) followed by
//! erosion (radius 2). The larger erosion radius biases the boundary inward.

use crate::error::Result;
use crate::grid::VoxelGrid;
use crate::utils::{dilate, erode, label_components, max_entropy_threshold};

/// Histogram bins for the difference-image threshold
pub const SEGMENTATION_HISTOGRAM_BINS: usize = 5;

/// Components smaller than this many voxels are discarded
pub const MIN_OBJECT_SIZE: usize = 30;

pub const DILATE_RADIUS: usize = 1;
pub const ERODE_RADIUS: usize = 2;

/// Segment the object from a magnitude pair.
///
/// Returns a binary mask with the baseline's geometry. When no component
/// survives the size floor the mask is all zero.
pub fn segment_object(baseline_magnitude: &VoxelGrid, reference_magnitude: &VoxelGrid) -> Result<VoxelGrid> {
    let diff = baseline_magnitude.zip_map(reference_magnitude, |b, r| b - r)?;
    let dims = diff.dims();

    let threshold = max_entropy_threshold(diff.data(), SEGMENTATION_HISTOGRAM_BINS);
    let foreground: Vec<u8> = diff.data().iter().map(|&v| u8::from(v > threshold)).collect();

    let components = label_components(&foreground, dims, MIN_OBJECT_SIZE);
    log::debug!(
        "segmentation: threshold {:.4}, {} component(s) >= {} voxels",
        threshold, components.count(), MIN_OBJECT_SIZE
    );

    if components.count() == 0 {
        return Ok(diff.map(|_| 0.0));
    }

    let object = components.select(1);
    let smoothed = erode(&dilate(&object, dims, DILATE_RADIUS), dims, ERODE_RADIUS);

    VoxelGrid::from_mask(&smoothed, dims, *baseline_magnitude.geometry())
}
