//! Sequential output names for multi-file writes.
//!
//! `out/ticket.png` with three symbols becomes `out/ticket-001.png`,
//! `out/ticket-002.png` and `out/ticket-003.png`.

use std::path::{Path, PathBuf};

/// Width of the zero-padded index.
pub const INDEX_DIGITS: usize = 3;

/// Produce `count` distinct file names derived from `output`.
///
/// Names share the directory and extension of `output`, are 1-indexed and
/// follow input order.
pub fn sequential_names(output: &Path, count: usize) -> Vec<PathBuf> {
    let dir = output.parent().unwrap_or_else(|| Path::new(""));
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = output.extension().map(|e| e.to_string_lossy().into_owned());

    (1..=count)
        .map(|index| {
            let name = match &extension {
                Some(ext) => format!("{stem}-{index:0width$}.{ext}", width = INDEX_DIGITS),
                None => format!("{stem}-{index:0width$}", width = INDEX_DIGITS),
            };
            dir.join(name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_sequential_names() {
        let names = sequential_names(Path::new("output/image.jpeg"), 3);
        assert_eq!(
            names,
            vec![
                PathBuf::from("output/image-001.jpeg"),
                PathBuf::from("output/image-002.jpeg"),
                PathBuf::from("output/image-003.jpeg"),
            ]
        );
    }

    #[test]
    fn test_no_directory() {
        let names = sequential_names(Path::new("code.png"), 1);
        assert_eq!(names, vec![PathBuf::from("code-001.png")]);
    }

    #[test]
    fn test_no_extension() {
        let names = sequential_names(Path::new("out/code"), 2);
        assert_eq!(
            names,
            vec![PathBuf::from("out/code-001"), PathBuf::from("out/code-002")]
        );
    }

    #[test]
    fn test_names_are_unique_past_padding() {
        let names = sequential_names(Path::new("a/b.png"), 1200);
        assert_eq!(names.len(), 1200);
        assert_eq!(names[998], PathBuf::from("a/b-999.png"));
        assert_eq!(names[999], PathBuf::from("a/b-1000.png"));
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_zero_count() {
        assert!(sequential_names(Path::new("x.png"), 0).is_empty());
    }
}
