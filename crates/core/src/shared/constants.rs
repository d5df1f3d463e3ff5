pub const FACE_CASCADE_NAME: &str = "haarcascade_frontalface_default.xml";
pub const FACE_CASCADE_URL: &str =
    "https://raw.githubusercontent.com/opencv/opencv/4.x/data/haarcascades/haarcascade_frontalface_default.xml";

pub const EYE_CASCADE_NAME: &str = "haarcascade_eye.xml";
pub const EYE_CASCADE_URL: &str =
    "https://raw.githubusercontent.com/opencv/opencv/4.x/data/haarcascades/haarcascade_eye.xml";

pub const SMILE_CASCADE_NAME: &str = "haarcascade_smile.xml";
pub const SMILE_CASCADE_URL: &str =
    "https://raw.githubusercontent.com/opencv/opencv/4.x/data/haarcascades/haarcascade_smile.xml";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tiff", "tif", "webp"];

/// Canny hysteresis thresholds used for every edge measurement.
pub const CANNY_LOW_THRESHOLD: f64 = 100.0;
pub const CANNY_HIGH_THRESHOLD: f64 = 200.0;

/// Table of the aggregate label store.
pub const EMOTION_TABLE: &str = "emotion_data";
