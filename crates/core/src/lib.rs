//! Facial emotion detection with Haar cascades and a rule-based classifier.
//!
//! Each area follows the same split: `domain` holds the types, traits and
//! pure logic, `infrastructure` the adapters that touch files, cascades or
//! the database.

pub mod analysis {
    pub mod domain {
        pub mod edges;
        pub mod emotion;
        pub mod emotion_classifier;
        pub mod emotion_counter;
        pub mod face_bands;
        pub mod facial_features;
    }
}

pub mod annotation {
    pub mod domain {
        pub mod frame_annotator;
    }
    pub mod infrastructure;
}

pub mod capture {
    pub mod domain {
        pub mod frame_reader;
        pub mod image_writer;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod detection_params;
        pub mod region_locator;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod annotate_image_use_case;
    pub mod emotion_detector;
    pub mod live_session_use_case;
    pub mod pipeline_logger;
    #[cfg(test)]
    pub(crate) mod test_support;
}

pub mod shared {
    pub mod constants;
    pub mod detector_settings;
    pub mod frame;
    pub mod model_resolver;
    pub mod region;
    pub mod source_metadata;
}

pub mod storage {
    pub mod domain {
        pub mod emotion_store;
        pub mod frequency_report;
    }
    pub mod infrastructure;
}
