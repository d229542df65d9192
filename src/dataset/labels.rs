//! YOLO label-file reader and writer, plus the `data.yaml` class map.
//!
//! Label files carry one box per line: `class_id cx cy w h`, whitespace
//! separated, with the four geometry fields normalized to [0, 1]. On
//! output every geometry field is written with exactly six decimal places,
//! the canonical label-file precision.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use super::bbox::YoloBox;
use crate::error::YoloprepError;

/// Image extensions recognized when pairing images with labels.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "png", "jpeg", "bmp", "webp"];

/// Extension of label files.
pub const LABEL_EXTENSION: &str = "txt";

/// Reads every box from a label file.
///
/// Empty lines are skipped; any malformed line fails the whole file with
/// path and line context.
pub fn read_label_file(path: &Path) -> Result<Vec<YoloBox>, YoloprepError> {
    let content = fs::read_to_string(path).map_err(YoloprepError::Io)?;
    let mut boxes = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        if let Some(parsed) = parse_label_line(line, path, line_idx + 1)? {
            boxes.push(parsed);
        }
    }

    Ok(boxes)
}

/// Writes boxes to a label file, one line per box, six decimals per field.
pub fn write_label_file(path: &Path, boxes: &[YoloBox]) -> Result<(), YoloprepError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(YoloprepError::Io)?;
    }

    let mut file = fs::File::create(path).map_err(YoloprepError::Io)?;
    for b in boxes {
        writeln!(
            file,
            "{} {:.6} {:.6} {:.6} {:.6}",
            b.class_id, b.cx, b.cy, b.w, b.h
        )
        .map_err(YoloprepError::Io)?;
    }

    Ok(())
}

/// Parses a single label line.
///
/// Returns `Ok(None)` for blank lines so callers can skip them without
/// treating them as data.
pub fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<YoloBox>, YoloprepError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // Take at most 6 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();

    if tokens.len() < 5 {
        return Err(YoloprepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("expected 5 tokens, found {}", tokens.len()),
        });
    }

    if tokens.len() > 5 {
        return Err(YoloprepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: "segmentation/pose rows not supported; only detection boxes are handled"
                .to_string(),
        });
    }

    let class_id = tokens[0]
        .parse::<u32>()
        .map_err(|_| YoloprepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!(
                "invalid class_id '{}'; expected non-negative integer",
                tokens[0]
            ),
        })?;

    let cx = parse_f64_token(tokens[1], "x_center", file_path, line_num)?;
    let cy = parse_f64_token(tokens[2], "y_center", file_path, line_num)?;
    let w = parse_f64_token(tokens[3], "width", file_path, line_num)?;
    let h = parse_f64_token(tokens[4], "height", file_path, line_num)?;

    Ok(Some(YoloBox::new(class_id, cx, cy, w, h)))
}

fn parse_f64_token(
    raw: &str,
    field_name: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<f64, YoloprepError> {
    raw.parse::<f64>()
        .map_err(|_| YoloprepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("invalid {field_name} '{raw}'; expected floating-point number"),
        })
}

/// Class-index to class-name mapping, usually read from `data.yaml`.
#[derive(Clone, Debug, Default)]
pub struct ClassMap {
    names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DataYaml {
    names: DataYamlNames,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataYamlNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

impl ClassMap {
    /// Builds a class map from a plain list of names.
    pub fn from_names(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Reads an Ultralytics-style `data.yaml` (either a `names:` sequence
    /// or an index-to-name mapping).
    pub fn from_data_yaml(path: &Path) -> Result<Self, YoloprepError> {
        let data = fs::read_to_string(path).map_err(YoloprepError::Io)?;
        let parsed: DataYaml =
            serde_yaml::from_str(&data).map_err(|source| YoloprepError::ClassMapParse {
                path: path.to_path_buf(),
                source,
            })?;

        let names = match parsed.names {
            DataYamlNames::Sequence(names) => names,
            DataYamlNames::Mapping(mapping) => {
                let max_index = mapping.keys().max().copied();
                match max_index {
                    None => Vec::new(),
                    Some(max_index) => {
                        let mut names = vec![String::new(); max_index + 1];
                        for (index, name) in mapping {
                            names[index] = name;
                        }
                        for (index, name) in names.iter_mut().enumerate() {
                            if name.trim().is_empty() {
                                *name = format!("class_{}", index);
                            }
                        }
                        names
                    }
                }
            }
        };

        Ok(Self { names })
    }

    /// Reads a plain `classes.txt`, one class name per line.
    pub fn from_classes_txt(path: &Path) -> Result<Self, YoloprepError> {
        let data = fs::read_to_string(path).map_err(YoloprepError::Io)?;
        let names = data
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        Ok(Self { names })
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when no classes are known.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All class names in index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Name for a class index, falling back to `class_{id}` for indexes
    /// outside the map.
    pub fn name_of(&self, class_id: u32) -> String {
        self.names
            .get(class_id as usize)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }
}

/// Collects files under `root` whose extension matches (case-insensitive),
/// sorted by path for deterministic traversal.
pub fn collect_files_with_extensions(
    root: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, YoloprepError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|source| YoloprepError::LayoutInvalid {
            path: root.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}
