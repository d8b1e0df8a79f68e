use super::{Alphabet, FeatureClass, FeatureType, Features, SimpleFeatures};
use crate::dataset::Dataset;
use gradkit_core::{GradKitError, Matrix};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::ops::Deref;
use std::path::Path;

const MAGIC: &[u8; 4] = b"GKBF";

/// Byte-valued features over an [`Alphabet`].
///
/// Every byte stored is a valid symbol of the alphabet; mutation only goes
/// through methods that check this, so the inner matrix is exposed read-only
/// via `Deref`.
///
/// # File format
/// `GKBF` magic, alphabet name length (`u8`) and name, `num_features` and
/// `num_vectors` as little-endian `u32`, then the column-major bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ByteFeatures {
    alphabet: Alphabet,
    features: SimpleFeatures<u8>,
}

impl ByteFeatures {
    /// Creates an empty container for `alphabet`.
    pub fn new(alphabet: Alphabet) -> Self {
        ByteFeatures {
            alphabet,
            features: SimpleFeatures::new(),
        }
    }

    /// Wraps `data` (column-major, `num_features x num_vectors`).
    ///
    /// # Errors
    /// `TensorCreationError` on a length mismatch, `InvalidArgument` if a byte
    /// is not in `alphabet`.
    pub fn from_matrix(
        alphabet: Alphabet,
        data: Vec<u8>,
        num_features: usize,
        num_vectors: usize,
    ) -> Result<Self, GradKitError> {
        check_symbols(alphabet, &data)?;
        Ok(ByteFeatures {
            alphabet,
            features: SimpleFeatures::from_matrix(data, num_features, num_vectors)?,
        })
    }

    /// Loads features written by [`ByteFeatures::save`].
    pub fn from_file<P: AsRef<Path>>(alphabet: Alphabet, path: P) -> Result<Self, GradKitError> {
        let mut features = ByteFeatures::new(alphabet);
        features.load(path)?;
        Ok(features)
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    /// Replaces the matrix with a copy of `src` after validating it.
    pub fn copy_feature_matrix(
        &mut self,
        src: &[u8],
        num_features: usize,
        num_vectors: usize,
    ) -> Result<(), GradKitError> {
        check_symbols(self.alphabet, src)?;
        self.features.copy_feature_matrix(src, num_features, num_vectors)
    }

    pub fn set_feature(
        &mut self,
        feature: usize,
        vector: usize,
        value: u8,
    ) -> Result<(), GradKitError> {
        check_symbols(self.alphabet, &[value])?;
        self.features.set_feature(feature, vector, value)
    }

    /// Converts the raw bytes to an `f64` matrix (features x vectors).
    pub fn to_matrix(&self) -> Result<Matrix, GradKitError> {
        self.features.to_matrix()
    }

    /// Reads a feature file, replacing the current matrix.
    ///
    /// # Errors
    /// `Io` on read failures, `Parse` on a malformed file, `InvalidArgument`
    /// if the file was written for another alphabet or holds invalid symbols.
    /// The current matrix is kept on error.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), GradKitError> {
        let path = path.as_ref();
        log::debug!("Loading byte features from {}", path.display());
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        read_exact(&mut reader, &mut magic, "magic")?;
        if &magic != MAGIC {
            return Err(GradKitError::Parse(format!(
                "{} is not a byte feature file",
                path.display()
            )));
        }

        let mut name_len = [0u8; 1];
        read_exact(&mut reader, &mut name_len, "alphabet name length")?;
        let mut name = vec![0u8; name_len[0] as usize];
        read_exact(&mut reader, &mut name, "alphabet name")?;
        let name = String::from_utf8(name)
            .map_err(|e| GradKitError::Parse(format!("alphabet name: {}", e)))?;
        let alphabet = Alphabet::from_name(&name)?;
        if alphabet != self.alphabet {
            return Err(GradKitError::InvalidArgument(format!(
                "file alphabet {} does not match {}",
                alphabet, self.alphabet
            )));
        }

        let num_features = read_u32(&mut reader, "num_features")? as usize;
        let num_vectors = read_u32(&mut reader, "num_vectors")? as usize;
        let header_len = (MAGIC.len() + 1 + name_len[0] as usize + 8) as u64;
        let data_len = num_features
            .checked_mul(num_vectors)
            .ok_or_else(|| {
                GradKitError::Parse(format!(
                    "{} x {} feature matrix does not fit in memory",
                    num_features, num_vectors
                ))
            })?;
        let available = file_len.saturating_sub(header_len);
        if data_len as u64 > available {
            return Err(GradKitError::Parse(format!(
                "truncated feature file: header declares {} bytes, {} available",
                data_len, available
            )));
        }
        let mut data = vec![0u8; data_len];
        read_exact(&mut reader, &mut data, "feature matrix")?;

        check_symbols(self.alphabet, &data)?;
        self.features = SimpleFeatures::from_matrix(data, num_features, num_vectors)?;
        log::debug!(
            "Loaded {} vectors of {} byte features",
            num_vectors,
            num_features
        );
        Ok(())
    }

    /// Writes the features to `path`, overwriting it.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GradKitError> {
        let path = path.as_ref();
        log::debug!("Saving byte features to {}", path.display());
        let to_u32 = |n: usize, what: &str| {
            u32::try_from(n).map_err(|_| {
                GradKitError::InvalidArgument(format!(
                    "{} = {} does not fit the file format",
                    what, n
                ))
            })
        };
        let num_features = to_u32(self.features.num_features(), "num_features")?;
        let num_vectors = to_u32(self.features.num_vectors(), "num_vectors")?;
        let name = self.alphabet.name().as_bytes();

        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(MAGIC)?;
        writer.write_all(&[name.len() as u8])?;
        writer.write_all(name)?;
        writer.write_all(&num_features.to_le_bytes())?;
        writer.write_all(&num_vectors.to_le_bytes())?;
        writer.write_all(self.features.feature_matrix())?;
        writer.flush()?;
        Ok(())
    }
}

impl Deref for ByteFeatures {
    type Target = SimpleFeatures<u8>;

    fn deref(&self) -> &Self::Target {
        &self.features
    }
}

impl Features for ByteFeatures {
    fn feature_type(&self) -> FeatureType {
        FeatureType::Byte
    }

    fn feature_class(&self) -> FeatureClass {
        FeatureClass::Simple
    }

    fn num_vectors(&self) -> usize {
        self.features.num_vectors()
    }

    fn num_features(&self) -> usize {
        self.features.num_features()
    }
}

impl Dataset for ByteFeatures {
    type Item = Vec<u8>;

    fn get(&self, index: usize) -> Result<Self::Item, GradKitError> {
        self.features.feature_vector(index)
    }

    fn len(&self) -> usize {
        self.features.num_vectors()
    }
}

fn check_symbols(alphabet: Alphabet, data: &[u8]) -> Result<(), GradKitError> {
    match alphabet.first_invalid(data) {
        None => Ok(()),
        Some(pos) => Err(GradKitError::InvalidArgument(format!(
            "byte {:#04x} at position {} is not a {} symbol",
            data[pos], pos, alphabet
        ))),
    }
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<(), GradKitError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            GradKitError::Parse(format!("truncated feature file while reading {}", what))
        }
        _ => GradKitError::from(e),
    })
}

fn read_u32<R: Read>(reader: &mut R, what: &str) -> Result<u32, GradKitError> {
    let mut bytes = [0u8; 4];
    read_exact(reader, &mut bytes, what)?;
    Ok(u32::from_le_bytes(bytes))
}

#[cfg(test)]
#[path = "byte_features_test.rs"]
mod tests;
