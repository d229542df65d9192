//! Cleaning report types and terminal formatting.
//!
//! The report is structured so it can be rendered as text (Display) or
//! serialized as JSON. Every finding carries the raw measurement that
//! produced the verdict so results can be spot-checked against the
//! thresholds.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Quality verdict categories.
///
/// `Unreadable` is deliberately distinct from `Ok`: an image the
/// blur/exposure pass could not decode is never counted as clean.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTag {
    Blurry,
    PoorlyLit,
    Duplicate,
    Corrupted,
    Unreadable,
    SizeOutlierSmall,
    SizeOutlierLarge,
    Ok,
}

impl QualityTag {
    /// Stable lowercase name, matching the JSON serialization.
    pub fn name(&self) -> &'static str {
        match self {
            QualityTag::Blurry => "blurry",
            QualityTag::PoorlyLit => "poorly_lit",
            QualityTag::Duplicate => "duplicate",
            QualityTag::Corrupted => "corrupted",
            QualityTag::Unreadable => "unreadable",
            QualityTag::SizeOutlierSmall => "size_outlier_small",
            QualityTag::SizeOutlierLarge => "size_outlier_large",
            QualityTag::Ok => "ok",
        }
    }
}

/// A single flagged image.
#[derive(Clone, Debug, Serialize)]
pub struct ImageFinding {
    /// Path of the flagged file.
    pub path: PathBuf,

    /// The verdict category.
    pub tag: QualityTag,

    /// Raw measurement behind the verdict (Laplacian variance for blur,
    /// mean brightness for exposure; zero where no measurement applies).
    pub measurement: f64,

    /// For duplicates: the earlier-seen file this one collides with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<PathBuf>,
}

/// Image resolution spread across files whose header could be probed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionSummary {
    pub min_w: u32,
    pub max_w: u32,
    pub min_h: u32,
    pub max_h: u32,
}

/// An annotation record flagged as a size outlier.
#[derive(Clone, Debug, Serialize)]
pub struct OutlierFinding {
    pub annotation_id: u64,
    pub tag: QualityTag,

    /// The offending box side in pixels for small outliers, or the largest
    /// box-side-to-image-side ratio for large outliers.
    pub measurement: f64,
}

/// Per-run summary of the cleaning pass.
///
/// Reporting only: the cleaning pass never deletes or moves files.
/// Destructive follow-up is a separate, explicit user action.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CleanReport {
    /// Number of image files scanned.
    pub images_scanned: usize,

    /// Files that failed the decode-and-verify pass.
    pub corrupted: Vec<ImageFinding>,

    /// Files whose perceptual hash collides with an earlier-seen file.
    pub duplicates: Vec<ImageFinding>,

    /// Files under the blur (Laplacian variance) threshold.
    pub blurry: Vec<ImageFinding>,

    /// Files under the brightness threshold.
    pub poorly_lit: Vec<ImageFinding>,

    /// Files the blur/exposure pass could not decode.
    pub unreadable: Vec<ImageFinding>,

    /// Resolution spread, when at least one file header was readable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolutions: Option<ResolutionSummary>,

    /// Number of annotation records checked for size outliers.
    pub annotations_checked: usize,

    /// Annotation records with suspicious box sizes.
    pub outliers: Vec<OutlierFinding>,

    /// Annotation count per category id.
    pub class_distribution: BTreeMap<u64, usize>,
}

impl CleanReport {
    /// Count of size outlier findings with the given tag.
    pub fn outlier_count(&self, tag: QualityTag) -> usize {
        self.outliers.iter().filter(|o| o.tag == tag).count()
    }

    /// Number of scanned images with no finding in any image bucket.
    pub fn ok_count(&self) -> usize {
        use std::collections::HashSet;
        let flagged: HashSet<&PathBuf> = self
            .corrupted
            .iter()
            .chain(&self.duplicates)
            .chain(&self.blurry)
            .chain(&self.poorly_lit)
            .chain(&self.unreadable)
            .map(|f| &f.path)
            .collect();
        self.images_scanned.saturating_sub(flagged.len())
    }

    /// True when no image or annotation finding was produced.
    pub fn is_clean(&self) -> bool {
        self.corrupted.is_empty()
            && self.duplicates.is_empty()
            && self.blurry.is_empty()
            && self.poorly_lit.is_empty()
            && self.unreadable.is_empty()
            && self.outliers.is_empty()
    }
}

impl fmt::Display for CleanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset cleaning report")?;
        writeln!(f, "=======================")?;
        writeln!(f)?;
        writeln!(f, "Images scanned: {}", self.images_scanned)?;
        writeln!(f, "  ok:          {}", self.ok_count())?;
        writeln!(f, "  corrupted:   {}", self.corrupted.len())?;
        writeln!(f, "  duplicates:  {}", self.duplicates.len())?;
        writeln!(f, "  blurry:      {}", self.blurry.len())?;
        writeln!(f, "  poorly_lit:  {}", self.poorly_lit.len())?;
        writeln!(f, "  unreadable:  {}", self.unreadable.len())?;

        if let Some(res) = &self.resolutions {
            writeln!(
                f,
                "Resolutions: {}x{} .. {}x{}",
                res.min_w, res.min_h, res.max_w, res.max_h
            )?;
        }

        fmt_image_section(f, "Corrupted images", &self.corrupted)?;
        fmt_image_section(f, "Duplicate images", &self.duplicates)?;
        fmt_image_section(f, "Blurry images", &self.blurry)?;
        fmt_image_section(f, "Poorly lit images", &self.poorly_lit)?;
        fmt_image_section(f, "Unreadable images", &self.unreadable)?;

        if self.annotations_checked > 0 {
            writeln!(f)?;
            writeln!(
                f,
                "Annotations checked: {} ({} size outliers)",
                self.annotations_checked,
                self.outliers.len()
            )?;
            for outlier in &self.outliers {
                writeln!(
                    f,
                    "  annotation {}: {} ({:.3})",
                    outlier.annotation_id,
                    outlier.tag.name(),
                    outlier.measurement
                )?;
            }
        }

        if !self.class_distribution.is_empty() {
            writeln!(f)?;
            writeln!(f, "Class distribution:")?;
            for (category_id, count) in &self.class_distribution {
                writeln!(f, "  category {}: {}", category_id, count)?;
            }
        }

        Ok(())
    }
}

fn fmt_image_section(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    findings: &[ImageFinding],
) -> fmt::Result {
    if findings.is_empty() {
        return Ok(());
    }

    writeln!(f)?;
    writeln!(f, "{} ({}):", title, findings.len())?;
    for finding in findings {
        match &finding.duplicate_of {
            Some(canonical) => writeln!(
                f,
                "  {} (duplicate of {})",
                finding.path.display(),
                canonical.display()
            )?,
            None => writeln!(
                f,
                "  {} ({:.2})",
                finding.path.display(),
                finding.measurement
            )?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(path: &str, tag: QualityTag, measurement: f64) -> ImageFinding {
        ImageFinding {
            path: PathBuf::from(path),
            tag,
            measurement,
            duplicate_of: None,
        }
    }

    #[test]
    fn ok_count_excludes_flagged_images() {
        let report = CleanReport {
            images_scanned: 5,
            blurry: vec![finding("a.jpg", QualityTag::Blurry, 12.0)],
            poorly_lit: vec![
                // The same file flagged twice still only removes one from "ok".
                finding("a.jpg", QualityTag::PoorlyLit, 3.0),
                finding("b.jpg", QualityTag::PoorlyLit, 8.0),
            ],
            ..Default::default()
        };

        assert_eq!(report.ok_count(), 3);
        assert!(!report.is_clean());
    }

    #[test]
    fn display_includes_every_category_count() {
        let report = CleanReport {
            images_scanned: 1,
            ..Default::default()
        };
        let text = report.to_string();

        for label in [
            "ok:",
            "corrupted:",
            "duplicates:",
            "blurry:",
            "poorly_lit:",
            "unreadable:",
        ] {
            assert!(text.contains(label), "missing '{}' in report", label);
        }
    }

    #[test]
    fn display_shows_measurements_for_spot_checking() {
        let report = CleanReport {
            images_scanned: 1,
            blurry: vec![finding("a.jpg", QualityTag::Blurry, 42.5)],
            ..Default::default()
        };
        assert!(report.to_string().contains("42.50"));
    }

    #[test]
    fn json_serialization_uses_snake_case_tags() {
        let report = CleanReport {
            images_scanned: 1,
            poorly_lit: vec![finding("a.jpg", QualityTag::PoorlyLit, 3.0)],
            ..Default::default()
        };
        let json = serde_json::to_string(&report).expect("serialize report");
        assert!(json.contains("\"poorly_lit\""));
    }
}
