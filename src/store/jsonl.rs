use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use tracing::debug;

use crate::errors::MenuError;
use crate::store::{RecipeStore, RecordCursor, RecordFilter};
use crate::types::{Document, StoreId};

/// Store backed by a newline-delimited JSON file (one document per line).
///
/// Blank lines are skipped and do not count as records. This is the format
/// `mongoexport` writes by default.
pub struct JsonLinesStore {
    id: StoreId,
    path: PathBuf,
}

impl JsonLinesStore {
    /// Create a store over the file at `path`. Nothing is opened until `ping`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            id: path.display().to_string(),
            path,
        }
    }

    fn open(&self) -> Result<File, MenuError> {
        File::open(&self.path).map_err(|err| MenuError::StoreUnavailable {
            store: self.id.clone(),
            reason: err.to_string(),
        })
    }

    fn read_error(&self, err: std::io::Error) -> MenuError {
        MenuError::StoreUnavailable {
            store: self.id.clone(),
            reason: format!("read failed: {err}"),
        }
    }
}

impl RecipeStore for JsonLinesStore {
    fn id(&self) -> &str {
        &self.id
    }

    fn ping(&self) -> Result<(), MenuError> {
        let file = self.open()?;
        let metadata = file.metadata().map_err(|err| self.read_error(err))?;
        if !metadata.is_file() {
            return Err(MenuError::StoreUnavailable {
                store: self.id.clone(),
                reason: "not a regular file".into(),
            });
        }
        debug!("[weekly_menu:store] {} is reachable", self.id);
        Ok(())
    }

    fn count(&self, _filter: &RecordFilter) -> Result<u64, MenuError> {
        let mut reader = BufReader::new(self.open()?);
        let mut line = Vec::new();
        let mut total = 0u64;
        while read_record_line(&mut reader, &mut line).map_err(|err| self.read_error(err))? {
            total += 1;
        }
        Ok(total)
    }

    fn find<'a>(&'a self, _filter: &RecordFilter) -> Result<Box<dyn RecordCursor + 'a>, MenuError> {
        let reader = BufReader::new(self.open()?);
        Ok(Box::new(JsonLinesCursor {
            store: self,
            reader: Some(reader),
            line: Vec::new(),
            position: 0,
        }))
    }
}

/// Read the next non-blank line into `line` as raw bytes.
///
/// Lines are not required to be UTF-8 here; encoding problems surface when
/// the record is decoded. Returns `false` at end of input.
fn read_record_line<R: BufRead>(reader: &mut R, line: &mut Vec<u8>) -> std::io::Result<bool> {
    loop {
        line.clear();
        if reader.read_until(b'\n', line)? == 0 {
            return Ok(false);
        }
        if !line.iter().all(u8::is_ascii_whitespace) {
            return Ok(true);
        }
    }
}

struct JsonLinesCursor<'a> {
    store: &'a JsonLinesStore,
    reader: Option<BufReader<File>>,
    line: Vec<u8>,
    position: usize,
}

impl RecordCursor for JsonLinesCursor<'_> {
    fn next_document(&mut self) -> Option<Result<Document, MenuError>> {
        let reader = self.reader.as_mut()?;
        match read_record_line(reader, &mut self.line) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(err) => return Some(Err(self.store.read_error(err))),
        }
        let position = self.position;
        self.position += 1;
        Some(
            serde_json::from_slice::<Document>(&self.line).map_err(|err| MenuError::Decode {
                position,
                reason: err.to_string(),
            }),
        )
    }

    fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!(
                "[weekly_menu:store] closed cursor on {} after {} records",
                self.store.id, self.position
            );
        }
    }
}
