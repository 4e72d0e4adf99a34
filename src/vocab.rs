// Caregiver-defined vocabulary list, advisory input for pad labeling.
// The core only reads it; ownership stays with whoever edits the file.

use std::path::{Path, PathBuf};

pub trait VocabularySource {
    fn list(&self) -> Vec<String>;
}

// one entry per non-empty line
pub struct FileVocab {
    path: PathBuf,
}

impl FileVocab {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl VocabularySource for FileVocab {
    fn list(&self) -> Vec<String> {
        std::fs::read_to_string(&self.path)
            .map(|text| {
                text.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_and_whitespace_are_dropped() {
        let path = std::env::temp_dir().join(format!("phrasepad-vocab-{}", std::process::id()));
        std::fs::write(&path, "water\n\n  more \nhelp\n").unwrap();
        let words = FileVocab::new(&path).list();
        assert_eq!(words, vec!["water", "more", "help"]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_an_empty_list() {
        assert!(FileVocab::new("/nonexistent/vocab.txt").list().is_empty());
    }
}
