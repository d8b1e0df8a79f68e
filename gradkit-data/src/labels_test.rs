// gradkit-data/src/labels_test.rs

use super::*;
use approx::assert_relative_eq;
use tempfile::NamedTempFile;

#[test]
fn test_labels_new_is_zeroed() {
    let labels = Labels::new(3);
    assert_eq!(labels.num_labels(), 3);
    assert_eq!(labels.labels(), vec![0.0; 3]);
}

#[test]
fn test_labels_set_and_get() {
    let mut labels = Labels::new(2);
    labels.set_label(0, 0.25).unwrap();
    labels.set_int_label(1, -3).unwrap();
    assert_relative_eq!(labels.label(0).unwrap(), 0.25);
    assert_eq!(labels.int_label(1).unwrap(), -3);
}

#[test]
fn test_labels_out_of_bounds() {
    let mut labels = Labels::new(2);
    assert_eq!(
        labels.set_label(2, 1.0),
        Err(GradKitError::IndexOutOfBounds {
            index: vec![2],
            shape: vec![2],
        })
    );
    assert!(labels.label(5).is_err());
    assert!(labels.int_label(5).is_err());
}

#[test]
fn test_labels_int_label_requires_integral_value() {
    let labels = Labels::from_vec(vec![1.5]);
    assert!(matches!(
        labels.int_label(0),
        Err(GradKitError::InvalidArgument(_))
    ));
    assert!(labels.int_labels().is_err());
}

#[test]
fn test_labels_two_class_labeling() {
    assert!(Labels::from_vec(vec![1.0, -1.0, -1.0]).is_two_class_labeling());
    assert!(!Labels::from_vec(vec![1.0, 0.0]).is_two_class_labeling());
    assert!(!Labels::default().is_two_class_labeling());
}

#[test]
fn test_labels_num_classes() {
    assert_eq!(Labels::from_vec(vec![0.0, 2.0, 1.0, 2.0]).num_classes().unwrap(), 3);
    assert_eq!(Labels::default().num_classes().unwrap(), 0);
    assert!(Labels::from_vec(vec![0.0, -1.0]).num_classes().is_err());
    assert!(Labels::from_vec(vec![0.5]).num_classes().is_err());
}

#[test]
fn test_labels_accessors_return_copies() {
    let mut labels = Labels::from_vec(vec![1.0, 2.0]);
    let snapshot = labels.labels();
    labels.set_label(0, 9.0).unwrap();
    assert_eq!(snapshot, vec![1.0, 2.0]);
    assert_eq!(labels.as_slice(), &[9.0, 2.0]);
}

#[test]
fn test_labels_set_int_labels() {
    let mut labels = Labels::default();
    labels.set_int_labels(&[3, 1, 2]);
    assert_eq!(labels.int_labels().unwrap(), vec![3, 1, 2]);
    labels.set_labels(&[0.5]);
    assert_eq!(labels.num_labels(), 1);
}

#[test]
fn test_labels_to_matrix() {
    let matrix = Labels::from_vec(vec![1.0, 2.0, 3.0]).to_matrix();
    assert_eq!(matrix.dim(), (1, 3));
    assert_relative_eq!(matrix[[0, 2]], 3.0);
}

#[test]
fn test_labels_save_and_load() {
    let file = NamedTempFile::new().unwrap();
    let labels = Labels::from_vec(vec![1.0, -1.0, 0.125, 1e-3]);
    labels.save(file.path()).unwrap();
    let loaded = Labels::from_file(file.path()).unwrap();
    assert_eq!(loaded, labels);
}

#[test]
fn test_labels_load_skips_blank_lines() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "1\n\n  -1 \n2.5\n").unwrap();
    let labels = Labels::from_file(file.path()).unwrap();
    assert_eq!(labels.labels(), vec![1.0, -1.0, 2.5]);
}

#[test]
fn test_labels_load_parse_error_keeps_previous() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "1\nabc\n").unwrap();
    let mut labels = Labels::from_vec(vec![7.0]);
    match labels.load(file.path()) {
        Err(GradKitError::Parse(msg)) => assert!(msg.contains(":2:"), "{}", msg),
        other => panic!("Expected Parse error, got {:?}", other),
    }
    assert_eq!(labels.labels(), vec![7.0]);
}

#[test]
fn test_labels_dataset_access() {
    let labels = Labels::from_vec(vec![4.0, 5.0]);
    assert_eq!(labels.len(), 2);
    assert!(!labels.is_empty());
    assert_relative_eq!(labels.get(1).unwrap(), 5.0);
}
