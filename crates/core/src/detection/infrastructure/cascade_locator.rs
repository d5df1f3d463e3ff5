use std::path::Path;

use ndarray::ArrayView2;

use crate::detection::domain::detection_params::DetectionParams;
use crate::detection::domain::region_locator::RegionLocator;
use crate::shared::constants::{
    EYE_CASCADE_NAME, EYE_CASCADE_URL, FACE_CASCADE_NAME, FACE_CASCADE_URL, SMILE_CASCADE_NAME,
    SMILE_CASCADE_URL,
};
use crate::shared::model_resolver::{self, ProgressFn};
use crate::shared::region::Region;

use super::haar_cascade::{CascadeError, HaarCascade};
use super::rectangle_grouping::{group_rectangles, GROUP_EPS};

/// [`RegionLocator`] backed by a Haar cascade: pyramid scan followed by
/// neighbour grouping.
pub struct CascadeLocator {
    name: String,
    cascade: HaarCascade,
}

impl CascadeLocator {
    pub fn new(name: impl Into<String>, cascade: HaarCascade) -> Self {
        Self {
            name: name.into(),
            cascade,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl RegionLocator for CascadeLocator {
    fn locate(&self, image: ArrayView2<'_, u8>, params: &DetectionParams) -> Vec<Region> {
        let raw = self.cascade.scan(image, params);
        let grouped = group_rectangles(&raw, params.min_neighbors, GROUP_EPS);
        log::trace!(
            "{}: {} raw hits, {} after grouping",
            self.name,
            raw.len(),
            grouped.len()
        );
        grouped
    }
}

/// The three locators the emotion detector needs.
pub struct CascadeSet {
    pub face: CascadeLocator,
    pub eye: CascadeLocator,
    pub smile: CascadeLocator,
}

impl CascadeSet {
    /// Resolves (bundled dir → cache → download) and parses all three
    /// cascades. Any failure is fatal for the detector.
    pub fn resolve(
        bundled_dir: Option<&Path>,
        progress: Option<fn(&str, u64, u64)>,
    ) -> Result<Self, CascadeError> {
        let load = |name: &'static str, url: &str| -> Result<CascadeLocator, CascadeError> {
            let cb: Option<ProgressFn> =
                progress.map(|f| Box::new(move |done, total| f(name, done, total)) as ProgressFn);
            let path = model_resolver::resolve(name, url, bundled_dir, cb)?;
            Ok(CascadeLocator::new(name, HaarCascade::load(&path)?))
        };

        Ok(Self {
            face: load(FACE_CASCADE_NAME, FACE_CASCADE_URL)?,
            eye: load(EYE_CASCADE_NAME, EYE_CASCADE_URL)?,
            smile: load(SMILE_CASCADE_NAME, SMILE_CASCADE_URL)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::infrastructure::haar_cascade::tests::{image_with_block, LEFT_BRIGHT_XML};
    use ndarray::Array2;

    fn locator() -> CascadeLocator {
        CascadeLocator::new("test", HaarCascade::from_xml(LEFT_BRIGHT_XML).unwrap())
    }

    #[test]
    fn test_locate_groups_hits() {
        let image = image_with_block(24, 24, 0, 0, 12);
        let raw = locator()
            .cascade
            .scan(image.view(), &DetectionParams::new(1.2, 0, (1, 1)));
        let grouped = locator().locate(image.view(), &DetectionParams::new(1.2, 1, (1, 1)));
        assert!(grouped.len() <= raw.len());
    }

    #[test]
    fn test_locate_nothing_returns_empty_list() {
        let image = Array2::from_elem((30, 30), 128u8);
        let found = locator().locate(image.view(), &DetectionParams::new(1.1, 3, (6, 6)));
        assert!(found.is_empty());
    }

    #[test]
    fn test_located_regions_stay_inside_image() {
        let image = image_with_block(25, 31, 3, 2, 10);
        for r in locator().locate(image.view(), &DetectionParams::new(1.3, 0, (1, 1))) {
            assert!(r.fits_within(31, 25), "{r:?}");
        }
    }

    #[test]
    fn test_resolve_from_bundled_dir() {
        let dir = tempfile::tempdir().unwrap();
        for name in [FACE_CASCADE_NAME, EYE_CASCADE_NAME, SMILE_CASCADE_NAME] {
            std::fs::write(dir.path().join(name), LEFT_BRIGHT_XML).unwrap();
        }
        let set = CascadeSet::resolve(Some(dir.path()), None).unwrap();
        assert_eq!(set.face.name(), FACE_CASCADE_NAME);
        assert_eq!(set.smile.name(), SMILE_CASCADE_NAME);
    }

    #[test]
    fn test_resolve_fails_on_corrupt_cascade() {
        let dir = tempfile::tempdir().unwrap();
        for name in [FACE_CASCADE_NAME, EYE_CASCADE_NAME, SMILE_CASCADE_NAME] {
            std::fs::write(dir.path().join(name), "not xml").unwrap();
        }
        assert!(CascadeSet::resolve(Some(dir.path()), None).is_err());
    }
}
