//! Temp-then-rename file writes.
//!
//! Every artifact is written to a temporary file in the destination
//! directory and renamed over the target only after the writer closure
//! returns `Ok` and the data is flushed to disk. On any error the temporary
//! file is dropped (and deleted) and the destination is left untouched.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

/// Write `path` atomically through `write`.
///
/// The error type only needs to absorb [`std::io::Error`], so callers can
/// run encoders with their own error types inside the closure.
///
/// # Errors
///
/// Returns the closure's error, or an I/O error if the temporary file cannot
/// be created, flushed, synced or renamed into place.
///
/// # Example
///
/// ```
/// use std::io::Write;
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("hello.txt");
/// mesh_io::write_atomic(&path, |w| -> std::io::Result<()> { w.write_all(b"hi") }).unwrap();
/// assert_eq!(std::fs::read(&path).unwrap(), b"hi");
/// ```
pub fn write_atomic<P, F, E>(path: P, write: F) -> Result<(), E>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<(), E>,
    E: From<std::io::Error>,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| E::from(e.error))?;

    debug!(path = %path.display(), "artifact persisted");
    Ok(())
}
