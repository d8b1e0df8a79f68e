use crate::dataset::Dataset;
use gradkit_core::{GradKitError, Matrix};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Real-valued labels, one per feature vector.
///
/// Integer and class views (`int_label`, `num_classes`...) require the stored
/// values to be integral; accessors hand out owned copies.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Labels {
    labels: Vec<f64>,
}

impl Labels {
    /// `num_labels` labels, all zero.
    pub fn new(num_labels: usize) -> Self {
        Labels {
            labels: vec![0.0; num_labels],
        }
    }

    pub fn from_vec(labels: Vec<f64>) -> Self {
        Labels { labels }
    }

    /// Loads labels written by [`Labels::save`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GradKitError> {
        let mut labels = Labels::default();
        labels.load(path)?;
        Ok(labels)
    }

    /// Reads one label per line, replacing the current labels.
    ///
    /// Blank lines are skipped. The current labels are kept on error.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), GradKitError> {
        let path = path.as_ref();
        log::debug!("Loading labels from {}", path.display());
        let reader = BufReader::new(File::open(path)?);

        let mut labels = Vec::new();
        let mut blank = 0usize;
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                blank += 1;
                continue;
            }
            let value = trimmed.parse::<f64>().map_err(|e| {
                GradKitError::Parse(format!(
                    "{}:{}: invalid label {:?}: {}",
                    path.display(),
                    lineno + 1,
                    trimmed,
                    e
                ))
            })?;
            labels.push(value);
        }
        if blank > 0 {
            log::warn!("Skipped {} blank lines in {}", blank, path.display());
        }

        log::debug!("Loaded {} labels", labels.len());
        self.labels = labels;
        Ok(())
    }

    /// Writes one label per line to `path`, overwriting it.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GradKitError> {
        let path = path.as_ref();
        log::debug!("Saving {} labels to {}", self.labels.len(), path.display());
        let mut writer = BufWriter::new(File::create(path)?);
        for label in &self.labels {
            writeln!(writer, "{}", label)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn set_label(&mut self, index: usize, label: f64) -> Result<(), GradKitError> {
        let len = self.labels.len();
        let slot = self
            .labels
            .get_mut(index)
            .ok_or_else(|| out_of_bounds(index, len))?;
        *slot = label;
        Ok(())
    }

    pub fn set_int_label(&mut self, index: usize, label: i32) -> Result<(), GradKitError> {
        self.set_label(index, f64::from(label))
    }

    pub fn label(&self, index: usize) -> Result<f64, GradKitError> {
        self.labels
            .get(index)
            .copied()
            .ok_or_else(|| out_of_bounds(index, self.labels.len()))
    }

    /// Label `index` as an integer.
    ///
    /// # Errors
    /// `IndexOutOfBounds`, or `InvalidArgument` if the label is not integral.
    pub fn int_label(&self, index: usize) -> Result<i32, GradKitError> {
        to_int(self.label(index)?, index)
    }

    /// True if every label is `+1` or `-1`. An empty set is not a labeling.
    pub fn is_two_class_labeling(&self) -> bool {
        if self.labels.is_empty() {
            return false;
        }
        match self.labels.iter().position(|&l| l != 1.0 && l != -1.0) {
            None => true,
            Some(index) => {
                log::debug!(
                    "Not a two class labeling: label[{}] = {}",
                    index,
                    self.labels[index]
                );
                false
            }
        }
    }

    /// Number of classes of a zero-based multiclass labeling (`max + 1`).
    ///
    /// # Errors
    /// `InvalidArgument` if a label is negative or not integral.
    pub fn num_classes(&self) -> Result<usize, GradKitError> {
        let mut max = -1i32;
        for (index, &label) in self.labels.iter().enumerate() {
            let class = to_int(label, index)?;
            if class < 0 {
                return Err(GradKitError::InvalidArgument(format!(
                    "label[{}] = {} is negative, classes must be zero based",
                    index, class
                )));
            }
            max = max.max(class);
        }
        Ok((max + 1) as usize)
    }

    /// Owned copy of all labels.
    pub fn labels(&self) -> Vec<f64> {
        self.labels.clone()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.labels
    }

    /// Owned copy of all labels as integers.
    pub fn int_labels(&self) -> Result<Vec<i32>, GradKitError> {
        self.labels
            .iter()
            .enumerate()
            .map(|(index, &label)| to_int(label, index))
            .collect()
    }

    pub fn set_labels(&mut self, labels: &[f64]) {
        self.labels = labels.to_vec();
    }

    pub fn set_int_labels(&mut self, labels: &[i32]) {
        self.labels = labels.iter().map(|&l| f64::from(l)).collect();
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    /// Labels as a `1 x num_labels` target matrix.
    pub fn to_matrix(&self) -> Matrix {
        Matrix::from_shape_fn((1, self.labels.len()), |(_, j)| self.labels[j])
    }
}

impl Dataset for Labels {
    type Item = f64;

    fn get(&self, index: usize) -> Result<Self::Item, GradKitError> {
        self.label(index)
    }

    fn len(&self) -> usize {
        self.labels.len()
    }
}

fn out_of_bounds(index: usize, len: usize) -> GradKitError {
    GradKitError::IndexOutOfBounds {
        index: vec![index],
        shape: vec![len],
    }
}

fn to_int(label: f64, index: usize) -> Result<i32, GradKitError> {
    if label.fract() != 0.0 || label < i32::MIN as f64 || label > i32::MAX as f64 {
        return Err(GradKitError::InvalidArgument(format!(
            "label[{}] = {} is not an integer",
            index, label
        )));
    }
    Ok(label as i32)
}

#[cfg(test)]
#[path = "labels_test.rs"]
mod tests;
