//! Unified-diff parsing into per-file, per-hunk records.

pub mod parser;

pub use parser::{FileDiff, HUNK_HASH_LEN, Hunk, hunk_hash, parse_diff};
