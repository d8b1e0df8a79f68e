use super::{FeatureClass, FeatureElement, FeatureType, Features};
use crate::dataset::Dataset;
use gradkit_core::{GradKitError, Matrix};
use ndarray::Array2;
use num_traits::{ToPrimitive, Zero};

/// Dense feature matrix, one feature vector per column.
///
/// Element `(feature, vector)` lives at `vector * num_features + feature` in
/// the backing buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleFeatures<T: FeatureElement> {
    num_features: usize,
    num_vectors: usize,
    matrix: Vec<T>,
}

impl<T: FeatureElement> Default for SimpleFeatures<T> {
    fn default() -> Self {
        SimpleFeatures {
            num_features: 0,
            num_vectors: 0,
            matrix: Vec::new(),
        }
    }
}

impl<T: FeatureElement> SimpleFeatures<T> {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `data` laid out column by column.
    ///
    /// # Errors
    /// `TensorCreationError` if `data.len() != num_features * num_vectors`.
    pub fn from_matrix(
        data: Vec<T>,
        num_features: usize,
        num_vectors: usize,
    ) -> Result<Self, GradKitError> {
        check_len(data.len(), num_features, num_vectors)?;
        Ok(SimpleFeatures {
            num_features,
            num_vectors,
            matrix: data,
        })
    }

    /// Replaces the matrix with a copy of `src`.
    ///
    /// On error the previous matrix is kept.
    pub fn copy_feature_matrix(
        &mut self,
        src: &[T],
        num_features: usize,
        num_vectors: usize,
    ) -> Result<(), GradKitError> {
        check_len(src.len(), num_features, num_vectors)?;
        self.matrix = src.to_vec();
        self.num_features = num_features;
        self.num_vectors = num_vectors;
        Ok(())
    }

    /// Raw column-major buffer.
    pub fn feature_matrix(&self) -> &[T] {
        &self.matrix
    }

    /// Owned copy of feature vector `index`.
    pub fn feature_vector(&self, index: usize) -> Result<Vec<T>, GradKitError> {
        if index >= self.num_vectors {
            return Err(GradKitError::IndexOutOfBounds {
                index: vec![index],
                shape: vec![self.num_vectors],
            });
        }
        let start = index * self.num_features;
        Ok(self.matrix[start..start + self.num_features].to_vec())
    }

    pub fn feature(&self, feature: usize, vector: usize) -> Result<T, GradKitError> {
        let offset = self.offset(feature, vector)?;
        Ok(self.matrix[offset])
    }

    pub fn set_feature(
        &mut self,
        feature: usize,
        vector: usize,
        value: T,
    ) -> Result<(), GradKitError> {
        let offset = self.offset(feature, vector)?;
        self.matrix[offset] = value;
        Ok(())
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn num_vectors(&self) -> usize {
        self.num_vectors
    }

    fn offset(&self, feature: usize, vector: usize) -> Result<usize, GradKitError> {
        if feature >= self.num_features || vector >= self.num_vectors {
            return Err(GradKitError::IndexOutOfBounds {
                index: vec![feature, vector],
                shape: vec![self.num_features, self.num_vectors],
            });
        }
        Ok(vector * self.num_features + feature)
    }
}

impl<T: FeatureElement + Zero> SimpleFeatures<T> {
    /// `num_features x num_vectors` matrix of zeros.
    pub fn zeros(num_features: usize, num_vectors: usize) -> Self {
        SimpleFeatures {
            num_features,
            num_vectors,
            matrix: vec![T::zero(); num_features * num_vectors],
        }
    }
}

impl<T: FeatureElement + ToPrimitive> SimpleFeatures<T> {
    /// Converts to an `f64` matrix with features as rows and vectors as columns.
    pub fn to_matrix(&self) -> Result<Matrix, GradKitError> {
        let values = self
            .matrix
            .iter()
            .map(|v| {
                v.to_f64().ok_or_else(|| {
                    GradKitError::InvalidArgument(
                        "feature value not representable as f64".to_string(),
                    )
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        // The buffer is row-major for a (num_vectors, num_features) array.
        let by_vector = Array2::from_shape_vec((self.num_vectors, self.num_features), values)
            .map_err(|e| GradKitError::InternalError(e.to_string()))?;
        Ok(by_vector.reversed_axes())
    }
}

impl<T: FeatureElement> Features for SimpleFeatures<T> {
    fn feature_type(&self) -> FeatureType {
        T::FEATURE_TYPE
    }

    fn feature_class(&self) -> FeatureClass {
        FeatureClass::Simple
    }

    fn num_vectors(&self) -> usize {
        self.num_vectors
    }

    fn num_features(&self) -> usize {
        self.num_features
    }
}

impl<T: FeatureElement> Dataset for SimpleFeatures<T> {
    type Item = Vec<T>;

    fn get(&self, index: usize) -> Result<Self::Item, GradKitError> {
        self.feature_vector(index)
    }

    fn len(&self) -> usize {
        self.num_vectors
    }
}

fn check_len(data_len: usize, num_features: usize, num_vectors: usize) -> Result<(), GradKitError> {
    if data_len != num_features * num_vectors {
        return Err(GradKitError::TensorCreationError {
            data_len,
            shape: vec![num_features, num_vectors],
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "simple_features_test.rs"]
mod tests;
