//! Content-addressed storage of version files.

use blake2::blake2b::{Blake2b, Blake2bResult};
use std::{
    fmt::Write as _,
    fs,
    io::{self, Read, Write},
    path::Path,
};
use tempfile::NamedTempFile;

use crate::config::Storage;

/// Copy `read` into the storage directory, returning name of the file (which
/// is the hex-encoded hash of its contents).
///
/// Files are deduplicated: when a file with the same contents already exists
/// it is left as-is.
pub fn store<R: Read>(storage: &Storage, mut read: R) -> io::Result<String> {
    let mut tmp = NamedTempFile::new_in(storage.path())?;

    let digest = {
        let mut hash = HashingWriter::new(64, &mut tmp);
        io::copy(&mut read, &mut hash)?;
        hash.finalize()
    };

    let name = bytes_to_hex(digest.as_bytes());
    let path = storage.path().join(&name);

    if path.exists() {
        log::debug!("File {} already stored", name);
    } else {
        tmp.persist(&path).map_err(|e| e.error)?;
    }

    Ok(name)
}

/// Remove a file from storage. Files which don't exist are ignored.
pub fn remove(storage: &Storage, name: &str) -> io::Result<()> {
    match fs::remove_file(storage.path().join(name)) {
        Ok(()) => Ok(()),
        Err(ref err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

/// Guess MIME type of a file based on its name.
pub fn guess_mime<P: AsRef<Path>>(filename: P) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

/// Wrapper around an [`std::io::Write`] which hashes contents written to it.
struct HashingWriter<W> {
    inner: W,
    digest: Blake2b,
}

impl<W> HashingWriter<W> {
    fn new(nn: usize, inner: W) -> Self {
        HashingWriter {
            inner,
            digest: Blake2b::new(nn),
        }
    }

    fn finalize(self) -> Blake2bResult {
        self.digest.finalize()
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.digest.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &tempfile::TempDir) -> Storage {
        Storage { path: dir.path().to_owned() }
    }

    #[test]
    fn identical_contents_are_stored_once() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        let a = store(&storage, &b"hello"[..]).unwrap();
        let b = store(&storage, &b"hello"[..]).unwrap();
        let c = store(&storage, &b"world"[..]).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 128);
        assert_eq!(fs::read(dir.path().join(&a)).unwrap(), b"hello");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn removing_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        remove(&storage(&dir), "does-not-exist").unwrap();
    }

    #[test]
    fn mime_is_guessed_from_name() {
        assert_eq!(guess_mime("report.pdf"), "application/pdf");
        assert_eq!(guess_mime("notes.txt"), "text/plain");
        assert_eq!(guess_mime("blob"), "application/octet-stream");
    }
}
