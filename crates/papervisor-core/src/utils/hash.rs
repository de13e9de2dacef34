//! SHA-256 of files on disk.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

const CHUNK_SIZE: usize = 1024 * 1024; // 1MB chunks

/// Lowercase hex SHA-256 of the file at `path`.
///
/// A missing file hashes to the empty string so that "no binary yet" never
/// compares equal to a real checksum. Every other I/O error is returned.
pub fn file_sha256_blocking(path: &Path) -> io::Result<String> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(String::new()),
        Err(e) => return Err(e),
    };

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// [`file_sha256_blocking`] on the blocking thread pool.
pub async fn file_sha256(path: impl Into<PathBuf>) -> io::Result<String> {
    let path = path.into();
    tokio::task::spawn_blocking(move || file_sha256_blocking(&path))
        .await
        .map_err(io::Error::other)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TEST_DATA_SHA256: &str =
        "916f0027a575074ce72a331777c3478d6513f786a591bd892da1a577bf2335f9";

    #[test]
    fn test_known_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("server.jar");
        std::fs::write(&path, b"test data").unwrap();

        assert_eq!(file_sha256_blocking(&path).unwrap(), TEST_DATA_SHA256);
    }

    #[test]
    fn test_missing_file_is_empty_hash() {
        let dir = tempdir().unwrap();
        let hash = file_sha256_blocking(&dir.path().join("absent.jar")).unwrap();
        assert!(hash.is_empty());
    }

    #[test]
    fn test_empty_file_hash() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.jar");
        std::fs::write(&path, b"").unwrap();

        assert_eq!(
            file_sha256_blocking(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_multi_chunk_file_is_stable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.jar");
        std::fs::write(&path, vec![7u8; CHUNK_SIZE * 2 + 17]).unwrap();

        let first = file_sha256_blocking(&path).unwrap();
        let second = file_sha256_blocking(&path).unwrap();
        assert_eq!(first.len(), 64);
        assert_eq!(first, second);
    }

    #[test]
    fn test_directory_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(file_sha256_blocking(dir.path()).is_err());
    }

    #[tokio::test]
    async fn test_async_wrapper_matches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("server.jar");
        std::fs::write(&path, b"test data").unwrap();

        assert_eq!(file_sha256(&path).await.unwrap(), TEST_DATA_SHA256);
    }
}
