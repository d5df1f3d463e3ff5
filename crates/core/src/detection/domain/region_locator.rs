use ndarray::ArrayView2;

use crate::detection::domain::detection_params::DetectionParams;
use crate::shared::region::Region;

/// Domain interface for locating rectangular regions (faces, eyes, smiles)
/// in a grayscale plane.
///
/// Finding nothing is not an error: implementations return an empty list.
/// Returned regions are in the coordinates of `image`.
pub trait RegionLocator: Send {
    fn locate(&self, image: ArrayView2<'_, u8>, params: &DetectionParams) -> Vec<Region>;
}
