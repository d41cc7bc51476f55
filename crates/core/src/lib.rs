//! Locates the first and last frame of a video in which an object class is
//! visible, spending as few detector invocations as the chosen search
//! strategy allows.

pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod model_resolver;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod frame_source;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod frame_oracle;
        pub mod object_detector;
        pub mod target_class;
    }
    pub mod infrastructure;
}

pub mod search {
    pub mod boundary_search_engine;
    pub mod domain {
        pub mod occurrence;
        pub mod prober;
        pub mod search_logger;
        pub mod search_strategy;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod locate_target_use_case;
    pub mod search_report;
}

#[cfg(test)]
pub(crate) mod testing;

/// Error type shared by adapter seams whose failures may cross threads.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
