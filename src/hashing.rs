//! Content hashing
//!
//! The classifier only asks for a digest when size and timestamp cannot decide
//! on their own, so the hasher sits behind a trait and can be swapped out.

use std::fs::File;
use std::io;
use std::path::Path;

use crate::types::ContentHash;

/// Computes the content digest of a file on disk
pub trait ContentHasher: Send + Sync {
	fn hash_file(&self, path: &Path) -> io::Result<ContentHash>;
}

/// Streaming BLAKE3 hasher
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl ContentHasher for Blake3Hasher {
	fn hash_file(&self, path: &Path) -> io::Result<ContentHash> {
		let file = File::open(path)?;
		let mut hasher = blake3::Hasher::new();
		hasher.update_reader(file)?;
		Ok(hasher.finalize().into())
	}
}

/// Hash an in-memory buffer
pub fn hash_bytes(buf: &[u8]) -> ContentHash {
	blake3::hash(buf).into()
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	#[test]
	fn test_file_hash_matches_buffer_hash() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("data.bin");
		let content = vec![0xABu8; 200_000];
		fs::write(&path, &content).unwrap();

		let from_file = Blake3Hasher.hash_file(&path).unwrap();
		assert_eq!(from_file, hash_bytes(&content));
	}

	#[test]
	fn test_different_content_different_hash() {
		assert_ne!(hash_bytes(b"X"), hash_bytes(b"Y"));
	}

	#[test]
	fn test_missing_file_is_error() {
		let dir = TempDir::new().unwrap();
		assert!(Blake3Hasher.hash_file(&dir.path().join("nope")).is_err());
	}
}

// vim: ts=4
