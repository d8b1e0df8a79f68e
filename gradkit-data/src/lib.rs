//! Feature and label containers.
//!
//! Features are stored one vector per column (`num_features` rows by
//! `num_vectors` columns), the layout the cost functions in `gradkit-optim`
//! expect for their training data.

pub mod dataset;
pub mod features;
pub mod labels;

// Re-export main components
pub use dataset::Dataset;
pub use features::{
    Alphabet, ByteFeatures, FeatureClass, FeatureElement, FeatureType, Features, SimpleFeatures,
};
pub use labels::Labels;
