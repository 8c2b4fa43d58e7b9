use std::fs;
use std::path::{Path, PathBuf};
use std::vec::IntoIter;

use tracing::warn;
use walkdir::WalkDir;

use crate::constants::store::JSON_EXTENSION;
use crate::errors::MenuError;
use crate::store::{RecipeStore, RecordCursor, RecordFilter};
use crate::types::{Document, StoreId};

/// Store backed by a directory of `.json` files, one document per file.
///
/// Files are streamed in sorted path order so positions are stable between
/// `count` and `find`.
pub struct JsonDirStore {
    id: StoreId,
    root: PathBuf,
}

impl JsonDirStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            id: root.display().to_string(),
            root,
        }
    }

    fn document_paths(&self) -> Result<Vec<PathBuf>, MenuError> {
        self.ping()?;
        let mut paths: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(
                        "[weekly_menu:store] skipping unreadable entry under {}: {err}",
                        self.id
                    );
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| is_json_file(path))
            .collect();
        paths.sort();
        Ok(paths)
    }
}

impl RecipeStore for JsonDirStore {
    fn id(&self) -> &str {
        &self.id
    }

    fn ping(&self) -> Result<(), MenuError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(MenuError::StoreUnavailable {
                store: self.id.clone(),
                reason: "directory not found".into(),
            })
        }
    }

    fn count(&self, _filter: &RecordFilter) -> Result<u64, MenuError> {
        Ok(self.document_paths()?.len() as u64)
    }

    fn find<'a>(&'a self, _filter: &RecordFilter) -> Result<Box<dyn RecordCursor + 'a>, MenuError> {
        let paths = self.document_paths()?;
        Ok(Box::new(JsonDirCursor {
            store: self,
            paths: Some(paths.into_iter()),
            position: 0,
        }))
    }
}

struct JsonDirCursor<'a> {
    store: &'a JsonDirStore,
    paths: Option<IntoIter<PathBuf>>,
    position: usize,
}

impl RecordCursor for JsonDirCursor<'_> {
    fn next_document(&mut self) -> Option<Result<Document, MenuError>> {
        let path = self.paths.as_mut()?.next()?;
        let position = self.position;
        self.position += 1;
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) => {
                return Some(Err(MenuError::StoreUnavailable {
                    store: self.store.id.clone(),
                    reason: format!("failed to read {}: {err}", path.display()),
                }));
            }
        };
        Some(
            serde_json::from_slice::<Document>(&raw).map_err(|err| MenuError::Decode {
                position,
                reason: format!("{}: {err}", path.display()),
            }),
        )
    }

    fn close(&mut self) {
        self.paths = None;
    }
}

/// True if the path has a `.json` extension (case-insensitive).
pub fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(JSON_EXTENSION))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn streams_json_files_in_path_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.json"), r#"{"Name": "second"}"#).unwrap();
        fs::write(dir.path().join("a.json"), r#"{"Name": "first"}"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.JSON"), r#"{"Name": "third"}"#).unwrap();

        let store = JsonDirStore::new(dir.path());
        assert_eq!(store.count(&RecordFilter::All).unwrap(), 3);
        let mut cursor = store.find(&RecordFilter::All).unwrap();
        let names: Vec<String> = std::iter::from_fn(|| cursor.next_document())
            .map(|doc| doc.unwrap()["Name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn invalid_utf8_file_is_a_decode_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"Name": "ok"}"#).unwrap();
        fs::write(dir.path().join("b.json"), b"{\"Name\": \"\xFF\xFE\"}").unwrap();

        let store = JsonDirStore::new(dir.path());
        assert_eq!(store.count(&RecordFilter::All).unwrap(), 2);
        let mut cursor = store.find(&RecordFilter::All).unwrap();
        assert!(cursor.next_document().unwrap().is_ok());
        match cursor.next_document().unwrap() {
            Err(MenuError::Decode { position, .. }) => assert_eq!(position, 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_does_not_abort_the_walk() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"Name": "first"}"#).unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("b.json"), r#"{"Name": "hidden"}"#).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let store = JsonDirStore::new(dir.path());
        let count = store.count(&RecordFilter::All);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // Privileged users can still read the locked directory.
        assert!(matches!(count, Ok(1) | Ok(2)));
    }

    #[test]
    fn missing_directory_is_unavailable() {
        let dir = tempdir().unwrap();
        let store = JsonDirStore::new(dir.path().join("absent"));
        assert!(matches!(
            store.count(&RecordFilter::All),
            Err(MenuError::StoreUnavailable { .. })
        ));
    }

    #[test]
    fn recognizes_json_extension() {
        assert!(is_json_file(Path::new("x/recipe.json")));
        assert!(is_json_file(Path::new("x/recipe.Json")));
        assert!(!is_json_file(Path::new("x/recipe.jsonl")));
    }
}
