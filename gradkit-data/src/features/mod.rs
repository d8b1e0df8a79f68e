pub mod alphabet;
pub mod byte_features;
pub mod feature_type;
pub mod simple_features;

pub use alphabet::Alphabet;
pub use byte_features::ByteFeatures;
pub use feature_type::{FeatureClass, FeatureElement, FeatureType};
pub use simple_features::SimpleFeatures;

/// Common interface of every feature container.
pub trait Features {
    /// Element type tag of the stored features.
    fn feature_type(&self) -> FeatureType;

    /// Storage class (dense, string, sparse...).
    fn feature_class(&self) -> FeatureClass;

    /// Number of feature vectors (samples).
    fn num_vectors(&self) -> usize;

    /// Number of features per vector.
    fn num_features(&self) -> usize;
}
