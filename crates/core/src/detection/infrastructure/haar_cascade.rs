use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::GrayImage;
use ndarray::ArrayView2;
use roxmltree::Node;
use thiserror::Error;

use crate::detection::domain::detection_params::DetectionParams;
use crate::shared::model_resolver::ModelResolveError;
use crate::shared::region::Region;

use super::integral_image::IntegralImages;

#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("failed to read cascade {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid cascade XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("malformed cascade: {0}")]
    Malformed(String),
    #[error("unsupported cascade: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Resolve(#[from] ModelResolveError),
}

/// Subtracted from every stage threshold at load time.
const STAGE_THRESHOLD_EPS: f64 = 1e-5;

#[derive(Clone, Debug)]
struct WeightedRect {
    x: i64,
    y: i64,
    width: i64,
    height: i64,
    weight: f64,
}

#[derive(Clone, Debug)]
struct HaarFeature {
    rects: Vec<WeightedRect>,
    tilted: bool,
}

/// One split of a boosted tree. Child indices `<= 0` address leaves
/// (`-child`), positive ones the next node.
#[derive(Clone, Debug)]
struct TreeNode {
    left: i32,
    right: i32,
    feature: usize,
    threshold: f64,
}

#[derive(Clone, Debug)]
struct WeakClassifier {
    nodes: Vec<TreeNode>,
    leaves: Vec<f64>,
}

#[derive(Clone, Debug)]
struct Stage {
    threshold: f64,
    classifiers: Vec<WeakClassifier>,
}

/// A boosted Haar cascade in the OpenCV `opencv-cascade-classifier` XML
/// layout (`stageType` BOOST, `featureType` HAAR).
///
/// Detection runs over an image pyramid: the cascade window keeps its
/// trained size and the image is shrunk by `scale_factor` per level.
#[derive(Clone, Debug)]
pub struct HaarCascade {
    window_width: usize,
    window_height: usize,
    stages: Vec<Stage>,
    features: Vec<HaarFeature>,
    has_tilted: bool,
}

impl HaarCascade {
    pub fn load(path: &Path) -> Result<Self, CascadeError> {
        let xml = fs::read_to_string(path).map_err(|source| CascadeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cascade = Self::from_xml(&xml)?;
        log::info!(
            "Loaded cascade {} ({} stages, {} features, window {}x{})",
            path.display(),
            cascade.stages.len(),
            cascade.features.len(),
            cascade.window_width,
            cascade.window_height
        );
        Ok(cascade)
    }

    pub fn from_xml(xml: &str) -> Result<Self, CascadeError> {
        let doc = roxmltree::Document::parse(xml)?;
        let root = doc
            .descendants()
            .find(|n| n.has_tag_name("cascade"))
            .ok_or_else(|| malformed("missing <cascade> element"))?;

        let stage_type = child_text(root, "stageType")?;
        if stage_type != "BOOST" {
            return Err(CascadeError::Unsupported(format!("stageType {stage_type}")));
        }
        let feature_type = child_text(root, "featureType")?;
        if feature_type != "HAAR" {
            return Err(CascadeError::Unsupported(format!("featureType {feature_type}")));
        }

        let window_width: usize = parse_one(child_text(root, "width")?)?;
        let window_height: usize = parse_one(child_text(root, "height")?)?;
        if window_width < 3 || window_height < 3 {
            return Err(malformed("window must be at least 3x3"));
        }

        let features = elements(child(root, "features")?)
            .map(parse_feature)
            .collect::<Result<Vec<_>, _>>()?;
        let stages = elements(child(root, "stages")?)
            .map(parse_stage)
            .collect::<Result<Vec<_>, _>>()?;
        if stages.is_empty() {
            return Err(malformed("cascade has no stages"));
        }

        for stage in &stages {
            for classifier in &stage.classifiers {
                validate_classifier(classifier, features.len())?;
            }
        }

        let has_tilted = features.iter().any(|f| f.tilted);
        Ok(Self {
            window_width,
            window_height,
            stages,
            features,
            has_tilted,
        })
    }

    pub fn window_size(&self) -> (usize, usize) {
        (self.window_width, self.window_height)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn uses_tilted_features(&self) -> bool {
        self.has_tilted
    }

    /// Raw, ungrouped window hits over the image pyramid, in `image`
    /// coordinates.
    ///
    /// A pyramid level is scanned only while it is strictly larger than the
    /// window in both dimensions, and window origins stop one short of
    /// `level - window`, as in OpenCV's `detectMultiScale`.
    pub fn scan(&self, image: ArrayView2<'_, u8>, params: &DetectionParams) -> Vec<Region> {
        let (rows, cols) = image.dim();
        let mut hits = Vec::new();
        if rows <= self.window_height || cols <= self.window_width {
            return hits;
        }
        if !(params.scale_factor > 1.0) {
            log::warn!(
                "Ignoring cascade scan with non-increasing scale factor {}",
                params.scale_factor
            );
            return hits;
        }

        let Some(base) = GrayImage::from_raw(cols as u32, rows as u32, image.iter().copied().collect())
        else {
            return hits;
        };

        let mut factor = 1.0f64;
        loop {
            let scaled_w = (cols as f64 / factor).round() as usize;
            let scaled_h = (rows as f64 / factor).round() as usize;
            if scaled_w <= self.window_width || scaled_h <= self.window_height {
                break;
            }
            let window_w = (self.window_width as f64 * factor).round() as i32;
            let window_h = (self.window_height as f64 * factor).round() as i32;

            if window_w >= params.min_size.0 as i32 && window_h >= params.min_size.1 as i32 {
                let level = if scaled_w == cols && scaled_h == rows {
                    base.clone()
                } else {
                    imageops::resize(&base, scaled_w as u32, scaled_h as u32, FilterType::Triangle)
                };
                let integral =
                    IntegralImages::new(level.as_raw(), scaled_w, scaled_h, self.has_tilted);
                let step = if factor > 2.0 { 1 } else { 2 };

                for y in (0..scaled_h - self.window_height).step_by(step) {
                    for x in (0..scaled_w - self.window_width).step_by(step) {
                        if self.accepts(&integral, x, y) {
                            // Rounding may push the window one pixel past the edge.
                            let rx = (x as f64 * factor).round() as i32;
                            let ry = (y as f64 * factor).round() as i32;
                            hits.push(Region::new(
                                rx,
                                ry,
                                window_w.min(cols as i32 - rx),
                                window_h.min(rows as i32 - ry),
                            ));
                        }
                    }
                }
            }

            factor *= params.scale_factor;
        }

        hits
    }

    /// Runs every stage on the window whose top-left corner is `(x, y)`.
    fn accepts(&self, integral: &IntegralImages, x: usize, y: usize) -> bool {
        let norm_w = self.window_width - 2;
        let norm_h = self.window_height - 2;
        let area = (norm_w * norm_h) as f64;
        let sum = integral.rect_sum(x + 1, y + 1, norm_w, norm_h) as f64;
        let sq_sum = integral.rect_sq_sum(x + 1, y + 1, norm_w, norm_h) as f64;
        let variance = area * sq_sum - sum * sum;
        let norm = if variance > 0.0 { variance.sqrt() } else { 1.0 };

        for stage in &self.stages {
            let mut stage_sum = 0.0;
            for classifier in &stage.classifiers {
                stage_sum += self.evaluate_tree(classifier, integral, x, y, norm);
            }
            if stage_sum < stage.threshold {
                return false;
            }
        }
        true
    }

    fn evaluate_tree(
        &self,
        classifier: &WeakClassifier,
        integral: &IntegralImages,
        x: usize,
        y: usize,
        norm: f64,
    ) -> f64 {
        let mut idx = 0usize;
        loop {
            let node = &classifier.nodes[idx];
            let value = self.feature_value(&self.features[node.feature], integral, x, y);
            let next = if value < node.threshold * norm {
                node.left
            } else {
                node.right
            };
            if next <= 0 {
                return classifier.leaves[(-next) as usize];
            }
            idx = next as usize;
        }
    }

    fn feature_value(&self, feature: &HaarFeature, integral: &IntegralImages, x: usize, y: usize) -> f64 {
        let (ox, oy) = (x as i64, y as i64);
        feature
            .rects
            .iter()
            .map(|r| {
                let sum = if feature.tilted {
                    integral.tilted_sum(ox + r.x, oy + r.y, r.width, r.height)
                } else {
                    integral.rect_sum(
                        (ox + r.x) as usize,
                        (oy + r.y) as usize,
                        r.width as usize,
                        r.height as usize,
                    )
                };
                sum as f64 * r.weight
            })
            .sum()
    }
}

fn malformed(msg: impl Into<String>) -> CascadeError {
    CascadeError::Malformed(msg.into())
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Result<Node<'a, 'input>, CascadeError> {
    elements(node)
        .find(|n| n.has_tag_name(name))
        .ok_or_else(|| malformed(format!("missing <{name}>")))
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, CascadeError> {
    Ok(child(node, name)?.text().unwrap_or("").trim())
}

fn parse_one<T: std::str::FromStr>(text: &str) -> Result<T, CascadeError> {
    text.trim()
        .parse()
        .map_err(|_| malformed(format!("invalid number '{text}'")))
}

fn parse_numbers(text: &str) -> Result<Vec<f64>, CascadeError> {
    text.split_whitespace().map(parse_one).collect()
}

fn parse_feature(node: Node<'_, '_>) -> Result<HaarFeature, CascadeError> {
    let rects = elements(child(node, "rects")?)
        .map(|r| {
            let values = parse_numbers(r.text().unwrap_or(""))?;
            let &[x, y, width, height, weight] = values.as_slice() else {
                return Err(malformed("feature rect needs 5 values"));
            };
            Ok(WeightedRect {
                x: x as i64,
                y: y as i64,
                width: width as i64,
                height: height as i64,
                weight,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if rects.is_empty() {
        return Err(malformed("feature without rects"));
    }

    let tilted = match elements(node).find(|n| n.has_tag_name("tilted")) {
        Some(t) => parse_one::<i32>(t.text().unwrap_or("0"))? != 0,
        None => false,
    };
    Ok(HaarFeature { rects, tilted })
}

fn parse_stage(node: Node<'_, '_>) -> Result<Stage, CascadeError> {
    let threshold = parse_one::<f64>(child_text(node, "stageThreshold")?)? - STAGE_THRESHOLD_EPS;
    let classifiers = elements(child(node, "weakClassifiers")?)
        .map(|wc| {
            let raw_nodes = parse_numbers(child_text(wc, "internalNodes")?)?;
            if raw_nodes.is_empty() || raw_nodes.len() % 4 != 0 {
                return Err(CascadeError::Unsupported(
                    "internal nodes must be (left, right, feature, threshold) tuples".into(),
                ));
            }
            let nodes = raw_nodes
                .chunks_exact(4)
                .map(|n| TreeNode {
                    left: n[0] as i32,
                    right: n[1] as i32,
                    feature: n[2] as usize,
                    threshold: n[3],
                })
                .collect();
            let leaves = parse_numbers(child_text(wc, "leafValues")?)?;
            Ok(WeakClassifier { nodes, leaves })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stage {
        threshold,
        classifiers,
    })
}

fn validate_classifier(classifier: &WeakClassifier, feature_count: usize) -> Result<(), CascadeError> {
    for node in &classifier.nodes {
        if node.feature >= feature_count {
            return Err(malformed(format!("feature index {} out of range", node.feature)));
        }
        for child in [node.left, node.right] {
            let in_range = if child <= 0 {
                ((-child) as usize) < classifier.leaves.len()
            } else {
                (child as usize) < classifier.nodes.len()
            };
            if !in_range {
                return Err(malformed(format!("tree child {child} out of range")));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ndarray::Array2;

    /// Single-stump cascade on a 6x6 window that fires when the left half of
    /// the window is much brighter than the right half.
    pub(crate) const LEFT_BRIGHT_XML: &str = r#"<?xml version="1.0"?>
<opencv_storage>
<cascade type_id="opencv-cascade-classifier">
  <stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>6</height>
  <width>6</width>
  <stageNum>1</stageNum>
  <stages>
    <_>
      <maxWeakCount>1</maxWeakCount>
      <stageThreshold>0.5</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>
            0 -1 0 -0.5</internalNodes>
          <leafValues>
            1. 0.</leafValues></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>
        <_>
          0 0 3 6 -1.</_>
        <_>
          3 0 3 6 1.</_></rects></_></features></cascade>
</opencv_storage>
"#;

    /// Paints a bright block at `(x, y)` of size `size`, dark elsewhere.
    pub(crate) fn image_with_block(rows: usize, cols: usize, x: usize, y: usize, size: usize) -> Array2<u8> {
        Array2::from_shape_fn((rows, cols), |(r, c)| {
            if r >= y && r < y + size && c >= x && c < x + size {
                220
            } else {
                20
            }
        })
    }

    #[test]
    fn test_parse_minimal_cascade() {
        let cascade = HaarCascade::from_xml(LEFT_BRIGHT_XML).unwrap();
        assert_eq!(cascade.window_size(), (6, 6));
        assert_eq!(cascade.stage_count(), 1);
        assert!(!cascade.uses_tilted_features());
    }

    #[test]
    fn test_rejects_lbp_cascade() {
        let xml = LEFT_BRIGHT_XML.replace(">HAAR<", ">LBP<");
        assert!(matches!(
            HaarCascade::from_xml(&xml),
            Err(CascadeError::Unsupported(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_feature() {
        let xml = LEFT_BRIGHT_XML.replace("0 -1 0 -0.5", "0 -1 7 -0.5");
        assert!(matches!(
            HaarCascade::from_xml(&xml),
            Err(CascadeError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_xml() {
        assert!(matches!(
            HaarCascade::from_xml("<opencv_storage><cascade>"),
            Err(CascadeError::Xml(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            HaarCascade::load(Path::new("/nonexistent/cascade.xml")),
            Err(CascadeError::Io { .. })
        ));
    }

    #[test]
    fn test_parses_tilted_flag() {
        let xml = LEFT_BRIGHT_XML.replace("3 6 1.</_></rects>", "3 6 1.</_></rects><tilted>1</tilted>");
        let cascade = HaarCascade::from_xml(&xml).unwrap();
        assert!(cascade.uses_tilted_features());
    }

    #[test]
    fn test_scan_fires_on_bright_left_edge() {
        let cascade = HaarCascade::from_xml(LEFT_BRIGHT_XML).unwrap();
        let image = image_with_block(12, 12, 0, 0, 6);
        let hits = cascade.scan(image.view(), &DetectionParams::new(1.5, 0, (1, 1)));
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|r| r.x + r.width <= 12 && r.y + r.height <= 12));
    }

    #[test]
    fn test_scan_uniform_image_finds_nothing() {
        let cascade = HaarCascade::from_xml(LEFT_BRIGHT_XML).unwrap();
        let image = Array2::from_elem((12, 12), 90u8);
        assert!(cascade
            .scan(image.view(), &DetectionParams::new(1.5, 0, (1, 1)))
            .is_empty());
    }

    #[test]
    fn test_scan_image_smaller_than_window() {
        let cascade = HaarCascade::from_xml(LEFT_BRIGHT_XML).unwrap();
        let image = Array2::from_elem((4, 4), 90u8);
        assert!(cascade
            .scan(image.view(), &DetectionParams::new(1.1, 0, (1, 1)))
            .is_empty());
    }

    #[test]
    fn test_scan_respects_min_size() {
        let cascade = HaarCascade::from_xml(LEFT_BRIGHT_XML).unwrap();
        let image = image_with_block(24, 24, 0, 0, 12);
        let hits = cascade.scan(image.view(), &DetectionParams::new(1.25, 0, (10, 10)));
        assert!(hits.iter().all(|r| r.width >= 10 && r.height >= 10));
    }

    #[test]
    fn test_scan_skips_level_equal_to_window() {
        let cascade = HaarCascade::from_xml(LEFT_BRIGHT_XML).unwrap();
        let image = image_with_block(6, 6, 0, 0, 3);
        assert!(cascade
            .scan(image.view(), &DetectionParams::new(1.1, 0, (1, 1)))
            .is_empty());
    }

    #[test]
    fn test_scan_stops_before_last_origin() {
        let cascade = HaarCascade::from_xml(LEFT_BRIGHT_XML).unwrap();
        // Only the window at (6, 6) has a bright left half, and 6 is
        // `level - window`. Origins 0, 2 and 4 are scanned.
        let image = image_with_block(12, 12, 6, 6, 3);
        let hits = cascade.scan(image.view(), &DetectionParams::new(3.0, 0, (1, 1)));
        assert!(hits.is_empty(), "{hits:?}");
    }

    #[test]
    fn test_stage_threshold_has_tolerance() {
        let xml = LEFT_BRIGHT_XML.replace(
            "<stageThreshold>0.5<",
            "<stageThreshold>1.000005<",
        );
        let cascade = HaarCascade::from_xml(&xml).unwrap();
        let image = image_with_block(12, 12, 0, 0, 6);
        assert!(!cascade
            .scan(image.view(), &DetectionParams::new(1.5, 0, (1, 1)))
            .is_empty());
    }

    #[test]
    fn test_scan_rejects_non_increasing_scale() {
        let cascade = HaarCascade::from_xml(LEFT_BRIGHT_XML).unwrap();
        let image = image_with_block(12, 12, 0, 0, 6);
        assert!(cascade
            .scan(image.view(), &DetectionParams::new(1.0, 0, (1, 1)))
            .is_empty());
    }
}
