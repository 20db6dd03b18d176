//! Reverse scan for the last line of a file.
//!
//! Reads backward from end-of-file in fixed-size chunks until the newline
//! that precedes the final line is found, so the cost is proportional to the
//! length of that line rather than to the size of the file.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

/// Chunk size used when reading backward.
pub(crate) const REVERSE_CHUNK_SIZE: usize = 4096;

/// The final line of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LastLine {
    /// Byte offset where the line starts. Zero means it is the first line.
    pub offset: u64,
    /// Line content without the trailing newline.
    pub bytes: Vec<u8>,
}

/// Returns the last line of `file`, or `None` if the file is empty.
///
/// A single trailing newline terminates the last line and does not start an
/// empty one.
pub(crate) fn read_last_line(file: &mut File, chunk_size: usize) -> io::Result<Option<LastLine>> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(None);
    }

    let mut end = len;
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    if last[0] == b'\n' {
        end -= 1;
    }

    let start = find_line_start(file, end, chunk_size.max(1))?;

    let mut bytes = vec![0u8; (end - start) as usize];
    file.seek(SeekFrom::Start(start))?;
    file.read_exact(&mut bytes)?;

    Ok(Some(LastLine {
        offset: start,
        bytes,
    }))
}

/// Finds the offset just past the last newline before `end`, or 0.
fn find_line_start(file: &mut File, end: u64, chunk_size: usize) -> io::Result<u64> {
    let mut buf = vec![0u8; chunk_size];
    let mut pos = end;

    while pos > 0 {
        let chunk_start = pos.saturating_sub(chunk_size as u64);
        let chunk = &mut buf[..(pos - chunk_start) as usize];
        file.seek(SeekFrom::Start(chunk_start))?;
        file.read_exact(chunk)?;

        if let Some(i) = chunk.iter().rposition(|&b| b == b'\n') {
            return Ok(chunk_start + i as u64 + 1);
        }
        pos = chunk_start;
    }

    Ok(0)
}
