//! Round trips through the six-decimal label text format.

use std::path::Path;

use proptest::prelude::*;

use yoloprep::dataset::labels::{parse_label_line, read_label_file, write_label_file};
use yoloprep::dataset::YoloBox;

#[test]
fn file_round_trip_preserves_box_count_and_order() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let path = temp.path().join("labels/sample.txt");

    let boxes = vec![
        YoloBox::new(0, 0.5, 0.5, 0.2, 0.4),
        YoloBox::new(3, 0.1, 0.9, 0.05, 0.1),
        YoloBox::new(12, 0.999999, 0.000001, 1.0, 1.0),
    ];

    write_label_file(&path, &boxes).expect("write labels");
    let restored = read_label_file(&path).expect("read labels");

    assert_eq!(restored.len(), boxes.len());
    for (restored, original) in restored.iter().zip(&boxes) {
        assert_eq!(restored.class_id, original.class_id);
        assert!((restored.cx - original.cx).abs() < 5e-7);
        assert!((restored.cy - original.cy).abs() < 5e-7);
        assert!((restored.w - original.w).abs() < 5e-7);
        assert!((restored.h - original.h).abs() < 5e-7);
    }
}

#[test]
fn spec_example_formats_exactly() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let path = temp.path().join("one.txt");

    write_label_file(&path, &[YoloBox::new(0, 0.5, 0.5, 0.2, 0.4)]).expect("write labels");
    let content = std::fs::read_to_string(&path).expect("read back");

    assert_eq!(content, "0 0.500000 0.500000 0.200000 0.400000\n");
}

proptest! {
    /// Any normalized box written at six decimals parses back within the
    /// half-ulp of that precision.
    #[test]
    fn formatted_line_parses_within_tolerance(
        class_id in 0u32..1000,
        cx in 0.0f64..=1.0,
        cy in 0.0f64..=1.0,
        w in 0.0f64..=1.0,
        h in 0.0f64..=1.0,
    ) {
        let line = format!("{} {:.6} {:.6} {:.6} {:.6}", class_id, cx, cy, w, h);
        let parsed = parse_label_line(&line, Path::new("prop.txt"), 1)
            .expect("well-formed line parses")
            .expect("non-empty line yields a box");

        prop_assert_eq!(parsed.class_id, class_id);
        prop_assert!((parsed.cx - cx).abs() <= 5e-7);
        prop_assert!((parsed.cy - cy).abs() <= 5e-7);
        prop_assert!((parsed.w - w).abs() <= 5e-7);
        prop_assert!((parsed.h - h).abs() <= 5e-7);
    }
}
