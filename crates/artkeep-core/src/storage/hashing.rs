//! Content hashing used to verify backup and restore copies.

use crate::error::{ArtkeepError, Result};
use blake3::Hasher as Blake3Hasher;
use std::io::Read;
use std::path::Path;

/// Chunk size for reading files (1MB; artwork files are small).
const CHUNK_SIZE: usize = 1024 * 1024;

/// Compute the BLAKE3 hash of a file as a lowercase hex string.
pub fn compute_blake3(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut file = std::fs::File::open(path).map_err(|e| ArtkeepError::io_with_path(e, path))?;

    let mut hasher = Blake3Hasher::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| ArtkeepError::io_with_path(e, path))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Check that two files have identical contents.
pub fn files_match(a: impl AsRef<Path>, b: impl AsRef<Path>) -> Result<bool> {
    let (a, b) = (a.as_ref(), b.as_ref());
    let len_a = std::fs::metadata(a).map_err(|e| ArtkeepError::io_with_path(e, a))?.len();
    let len_b = std::fs::metadata(b).map_err(|e| ArtkeepError::io_with_path(e, b))?.len();
    if len_a != len_b {
        return Ok(false);
    }
    Ok(compute_blake3(a)? == compute_blake3(b)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_blake3_known_value() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty");
        std::fs::write(&path, b"").unwrap();

        assert_eq!(
            compute_blake3(&path).unwrap(),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn test_files_match() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        let c = tmp.path().join("c");
        std::fs::write(&a, b"poster bytes").unwrap();
        std::fs::write(&b, b"poster bytes").unwrap();
        std::fs::write(&c, b"poster bytez").unwrap();

        assert!(files_match(&a, &b).unwrap());
        assert!(!files_match(&a, &c).unwrap());
    }
}
