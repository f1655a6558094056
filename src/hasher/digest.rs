use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Number of hex characters in the display fingerprint.
pub const SHORT_DIGEST_LEN: usize = 16;

/// 256-bit BLAKE3 digest of a file's full contents.
///
/// Equality and hashing use the full digest. [`ContentDigest::short`] is
/// for log lines only.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest(blake3::Hash);

impl ContentDigest {
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(blake3::hash(data))
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }

    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(SHORT_DIGEST_LEN);
        hex
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.short())
    }
}

/// Stream `file` through the hasher without holding it in memory.
pub fn hash_file(file: &Path) -> io::Result<ContentDigest> {
    let mut reader = BufReader::new(File::open(file)?);
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(ContentDigest(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_hex_is_256_bits() {
        let digest = ContentDigest::of_bytes(b"podcast");
        assert_eq!(digest.to_hex().len(), 64);
        assert!(digest.to_hex().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_short_is_prefix_of_full_hex() {
        let digest = ContentDigest::of_bytes(b"episode 42");
        let short = digest.short();
        assert_eq!(short.len(), SHORT_DIGEST_LEN);
        assert!(digest.to_hex().starts_with(&short));
    }

    #[test]
    fn test_streamed_file_hash_matches_in_memory_hash() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("big.mp3");
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        assert_eq!(hash_file(&path).unwrap(), ContentDigest::of_bytes(&data));
    }

    #[test]
    fn test_different_content_different_digest() {
        assert_ne!(ContentDigest::of_bytes(b"a"), ContentDigest::of_bytes(b"b"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let tmp = tempdir().unwrap();
        let err = hash_file(&tmp.path().join("gone.mp3")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
