//! Shelf display shown after a successful return

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use super::DisplaySink;
use crate::error::AppResult;

static SHELF_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*\]").expect("valid regex"));

/// Genre labels used in the catalog and the shelf class they are shelved under
const SHELF_CLASSES: &[(&str, &str)] = &[
    ("経営", "management"),
    ("仕様", "specification"),
    ("Windows", "windows"),
    ("Web技術", "web"),
    ("技術書", "tech_book"),
    ("アルゴリズム", "algorithm"),
    ("設計", "design"),
    ("コーディング", "coding"),
    ("プロジェクト", "project"),
    ("低レイヤ", "low_layer"),
    ("言語", "language"),
    ("その他言語", "others"),
    ("テスト", "test"),
    ("C/C++", "c_cpp"),
    ("寄贈本", "donation"),
    ("雑誌", "magazine"),
    ("辞典", "dictionary"),
];

/// Map a catalog genre label to its shelf class.
///
/// A bracketed shelf suffix such as `[棚6]` is ignored. Unknown genres fall
/// back to the lower-cased label.
pub fn shelf_class(genre: &str) -> String {
    let genre = SHELF_SUFFIX.replace_all(genre, "");
    SHELF_CLASSES
        .iter()
        .find(|(label, _)| *label == genre)
        .map(|(_, class)| class.to_string())
        .unwrap_or_else(|| genre.to_lowercase())
}

/// Display sink publishing the current shelf class.
///
/// When a state file is configured the class is written there for the
/// kiosk screen to pick up, and removed again on `hide`.
#[derive(Debug, Default)]
pub struct ShelfDisplay {
    state_path: Option<PathBuf>,
    current: Mutex<Option<String>>,
}

impl ShelfDisplay {
    pub fn new(state_path: Option<PathBuf>) -> Self {
        Self {
            state_path,
            current: Mutex::new(None),
        }
    }

    /// Shelf class currently on screen
    pub fn current(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DisplaySink for ShelfDisplay {
    fn show(&self, genre: &str) -> AppResult<()> {
        self.hide();

        let class = shelf_class(genre);
        tracing::info!("Showing shelf {} for genre {}", class, genre);
        if let Some(path) = &self.state_path {
            std::fs::write(path, &class)?;
        }

        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(class);
        Ok(())
    }

    fn hide(&self) {
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_none() {
            return;
        }

        tracing::debug!("Hiding shelf display");
        if let Some(path) = &self.state_path {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to clear shelf state {}: {}", path.display(), e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shelf_suffix_is_ignored() {
        assert_eq!(shelf_class("設計[棚3]"), "design");
        assert_eq!(shelf_class("C/C++"), "c_cpp");
    }

    #[test]
    fn test_unknown_genre_is_lowercased() {
        assert_eq!(shelf_class("InfraA[棚3]"), "infraa");
        assert_eq!(shelf_class("PGその他[棚6]"), "pgその他");
    }

    #[test]
    fn test_show_and_hide_track_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelf");
        let display = ShelfDisplay::new(Some(path.clone()));

        display.show("雑誌[棚1]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "magazine");
        assert_eq!(display.current().as_deref(), Some("magazine"));

        display.hide();
        assert!(!path.exists());
        assert_eq!(display.current(), None);
    }
}
