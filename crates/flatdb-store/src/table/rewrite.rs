//! Single-line replacement by whole-file rewrite.
//!
//! Every line of the source is streamed into a temporary file created in the
//! same directory, with the target line substituted. The temporary file is
//! synced and then renamed over the original. The original stays untouched
//! until the rename, and the rename itself replaces the directory entry in
//! one step on the platforms `tempfile` supports. What remains unprotected
//! is the durability of that directory entry across power loss when
//! `sync` is off.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{StoreError, StoreResult};

/// Replaces line `index` (0 = first line of the file) with `new_line`.
///
/// Returns `Ok(false)` without touching the original if the file has no
/// such line.
pub(crate) fn replace_line(path: &Path, index: u64, new_line: &str, sync: bool) -> StoreResult<bool> {
    let source = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let permissions = source
        .metadata()
        .map_err(|e| StoreError::io(path, e))?
        .permissions();
    let dir = parent_dir(path);

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    let tmp_path = tmp.path().to_path_buf();
    let io_err = |e| StoreError::io(&tmp_path, e);

    let mut found = false;
    {
        let mut reader = BufReader::new(source);
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let mut buf = Vec::new();
        let mut current = 0u64;

        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| StoreError::io(path, e))?;
            if n == 0 {
                break;
            }
            if current == index {
                writer.write_all(new_line.as_bytes()).map_err(io_err)?;
                writer.write_all(b"\n").map_err(io_err)?;
                found = true;
            } else {
                writer.write_all(&buf).map_err(io_err)?;
            }
            current += 1;
        }
        writer.flush().map_err(io_err)?;
    }

    if !found {
        return Ok(false);
    }

    if sync {
        tmp.as_file().sync_all().map_err(io_err)?;
    }
    fs::set_permissions(&tmp_path, permissions).map_err(io_err)?;
    tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;

    if sync {
        if let Ok(dir) = File::open(dir) {
            let _ = dir.sync_all();
        }
    }

    Ok(true)
}

/// Directory holding `path`, for placing the temporary file.
pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
