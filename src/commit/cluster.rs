//! Heuristic pre-grouping of hunks for split prompts.
//!
//! Clusters are advisory: they seed the split prompt, and the model is free to
//! ignore them. Staging never consults them.

use serde::Serialize;

use crate::diff::FileDiff;

/// Directories with more hunks than this are split into per-file clusters.
pub const MAX_HUNKS_PER_DIR_CLUSTER: usize = 5;

/// A named group of hunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    /// `dir-<segment>` or `file-<path>`; stable for identical input.
    pub id: String,
    pub files: Vec<String>,
    pub hunk_hashes: Vec<String>,
    pub rationale: String,
}

/// Partition every hunk in `files` into clusters.
///
/// Files are grouped by top-level path segment in first-seen order. A group
/// with at most [`MAX_HUNKS_PER_DIR_CLUSTER`] hunks becomes one cluster;
/// a larger group yields one cluster per file.
pub fn cluster_hunks(files: &[FileDiff]) -> Vec<Cluster> {
    let mut groups: Vec<(&str, Vec<&FileDiff>)> = Vec::new();
    for file in files {
        let segment = file.top_level_segment();
        match groups.iter_mut().find(|(name, _)| *name == segment) {
            Some((_, members)) => members.push(file),
            None => groups.push((segment, vec![file])),
        }
    }

    let mut clusters = Vec::new();
    for (segment, members) in groups {
        let hunk_count: usize = members.iter().map(|f| f.hunks.len()).sum();

        if hunk_count <= MAX_HUNKS_PER_DIR_CLUSTER {
            clusters.push(Cluster {
                id: format!("dir-{segment}"),
                files: members.iter().map(|f| f.path.to_string()).collect(),
                hunk_hashes: members
                    .iter()
                    .flat_map(|f| f.hunks.iter().map(|h| h.hash.clone()))
                    .collect(),
                rationale: format!(
                    "{hunk_count} hunk(s) under {segment} grouped by top-level directory"
                ),
            });
        } else {
            for file in members {
                clusters.push(Cluster {
                    id: format!("file-{}", file.path),
                    files: vec![file.path.to_string()],
                    hunk_hashes: file.hunks.iter().map(|h| h.hash.clone()).collect(),
                    rationale: format!(
                        "{segment} has {hunk_count} hunks; split per file ({} here)",
                        file.hunks.len()
                    ),
                });
            }
        }
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::parse_diff;

    fn diff_for(files: &[(&str, usize)]) -> String {
        let mut text = String::new();
        for (path, hunks) in files {
            text.push_str(&format!("diff --git a/{path} b/{path}\n"));
            for i in 0..*hunks {
                let line = i * 10 + 1;
                text.push_str(&format!("@@ -{line} +{line} @@\n-old {i}\n+new {i}\n"));
            }
        }
        text
    }

    #[test]
    fn test_small_directory_is_one_cluster() {
        let files = parse_diff(&diff_for(&[("src/a.rs", 2), ("src/b.rs", 3), ("README.md", 1)]));
        let clusters = cluster_hunks(&files);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].id, "dir-src");
        assert_eq!(clusters[0].files, vec!["src/a.rs", "src/b.rs"]);
        assert_eq!(clusters[0].hunk_hashes.len(), 5);
        assert_eq!(clusters[1].id, "dir-README.md");
    }

    #[test]
    fn test_large_directory_splits_per_file() {
        let files = parse_diff(&diff_for(&[("src/a.rs", 4), ("src/b.rs", 2)]));
        let clusters = cluster_hunks(&files);
        let ids: Vec<_> = clusters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["file-src/a.rs", "file-src/b.rs"]);
        assert_eq!(clusters[0].hunk_hashes.len(), 4);
    }

    #[test]
    fn test_every_hunk_lands_in_exactly_one_cluster() {
        let files = parse_diff(&diff_for(&[
            ("src/a.rs", 4),
            ("docs/x.md", 1),
            ("src/b.rs", 3),
            ("tests/t.rs", 2),
        ]));
        let clusters = cluster_hunks(&files);
        let mut hashes: Vec<_> = clusters.iter().flat_map(|c| c.hunk_hashes.clone()).collect();
        let total: usize = files.iter().map(|f| f.hunks.len()).sum();
        assert_eq!(hashes.len(), total);
        hashes.sort();
        hashes.dedup();
        assert_eq!(hashes.len(), total);
    }

    #[test]
    fn test_cluster_ids_are_deterministic() {
        let text = diff_for(&[("src/a.rs", 1), ("lib/b.rs", 1)]);
        assert_eq!(cluster_hunks(&parse_diff(&text)), cluster_hunks(&parse_diff(&text)));
    }

    #[test]
    fn test_empty_input_has_no_clusters() {
        assert!(cluster_hunks(&[]).is_empty());
    }
}
