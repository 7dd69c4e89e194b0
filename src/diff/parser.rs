//! Line-oriented unified-diff scanner.
//!
//! The scanner is a two-state machine: *between files* until a `diff --git`
//! line opens a [`FileDiff`], then *inside file*, where `@@` headers open
//! hunks and every other line is appended to the most recent hunk. Only the
//! subset of the unified format needed for file/hunk boundaries and line
//! counts is understood.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;

/// Length of the hex content hash attached to every hunk.
pub const HUNK_HASH_LEN: usize = 8;

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@ ?(.*)$")
        .expect("hunk header regex is valid")
});

/// One contiguous change region within a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// Path of the owning file, shared with [`FileDiff::path`].
    pub file_path: Arc<str>,
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    /// The raw `@@ ... @@` header line.
    pub header: String,
    /// Raw diff lines, prefix-tagged (`+`, `-`, ` `, `\`).
    pub lines: Vec<String>,
    pub added: usize,
    pub removed: usize,
    /// Stable digest over path, header and lines.
    pub hash: String,
    /// Function/context label git printed after the header, if any.
    pub context: Option<String>,
}

/// One changed file and its hunks in diff order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: Arc<str>,
    pub hunks: Vec<Hunk>,
    pub additions: usize,
    pub deletions: usize,
}

impl FileDiff {
    fn new(path: &str) -> Self {
        Self {
            path: Arc::from(path),
            hunks: Vec::new(),
            additions: 0,
            deletions: 0,
        }
    }

    /// First path component, used to group files by top-level directory.
    pub fn top_level_segment(&self) -> &str {
        self.path.split('/').next().unwrap_or(&self.path)
    }
}

/// Parse raw unified-diff text into file records.
///
/// Empty input yields an empty vector. Hunk headers seen before any file
/// marker, and headers that fail the `@@ -a[,b] +c[,d] @@` grammar, are
/// skipped without aborting the scan.
pub fn parse_diff(text: &str) -> Vec<FileDiff> {
    let mut files: Vec<FileDiff> = Vec::new();

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            files.push(FileDiff::new(&path_from_git_header(rest)));
            continue;
        }

        let Some(file) = files.last_mut() else {
            if line.starts_with("@@") {
                debug!("Ignoring hunk header before any file marker: {line}");
            }
            continue;
        };

        if line.starts_with("@@") {
            match parse_hunk_header(line, &file.path) {
                Some(hunk) => file.hunks.push(hunk),
                None => debug!("Skipping malformed hunk header in {}: {line}", file.path),
            }
            continue;
        }

        let Some(hunk) = file.hunks.last_mut() else {
            // File header lines (index, ---, +++, mode changes) precede the first hunk.
            if let Some(target) = line.strip_prefix("+++ ")
                && target != "/dev/null"
            {
                let target = target.strip_prefix("b/").unwrap_or(target);
                file.path = Arc::from(target);
            }
            continue;
        };

        if line.starts_with('+') && !line.starts_with("+++") {
            hunk.added += 1;
            file.additions += 1;
        } else if line.starts_with('-') && !line.starts_with("---") {
            hunk.removed += 1;
            file.deletions += 1;
        }
        hunk.lines.push(line.to_string());
    }

    for file in &mut files {
        for hunk in &mut file.hunks {
            hunk.file_path = Arc::clone(&file.path);
            hunk.hash = hunk_hash(&hunk.file_path, &hunk.header, &hunk.lines);
        }
    }

    files
}

/// Content hash of a hunk: the first eight hex digits of a BLAKE3 digest
/// over path, header and the newline-joined lines.
pub fn hunk_hash(path: &str, header: &str, lines: &[String]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(path.as_bytes());
    hasher.update(b"\n");
    hasher.update(header.as_bytes());
    hasher.update(b"\n");
    hasher.update(lines.join("\n").as_bytes());
    let hex = hasher.finalize().to_hex();
    hex.as_str()[..HUNK_HASH_LEN].to_string()
}

/// Extract the post-image path from the remainder of a `diff --git` line.
fn path_from_git_header(rest: &str) -> String {
    if let Some(idx) = rest.rfind(" b/") {
        return rest[idx + 3..].to_string();
    }
    rest.split_whitespace()
        .last()
        .unwrap_or(rest)
        .trim_start_matches("b/")
        .to_string()
}

fn parse_hunk_header(line: &str, path: &Arc<str>) -> Option<Hunk> {
    let caps = HUNK_HEADER.captures(line)?;
    let number = |idx: usize, default: u32| -> Option<u32> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(default),
        }
    };

    let context = caps
        .get(5)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(Hunk {
        file_path: Arc::clone(path),
        old_start: number(1, 0)?,
        old_lines: number(2, 1)?,
        new_start: number(3, 0)?,
        new_lines: number(4, 1)?,
        header: line.to_string(),
        lines: Vec::new(),
        added: 0,
        removed: 0,
        hash: String::new(),
        context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FILES: &str = "\
diff --git a/src/lib.rs b/src/lib.rs
index 1111111..2222222 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -10,3 +10,4 @@ pub fn run() {
     let a = 1;
-    let b = 2;
+    let b = 3;
+    let c = 4;
@@ -40 +41 @@ impl Config {
-    old
+    new
diff --git a/README.md b/README.md
new file mode 100644
index 0000000..3333333
--- /dev/null
+++ b/README.md
@@ -0,0 +1,2 @@
+# Title
+body
";

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_diff("").is_empty());
    }

    #[test]
    fn test_parse_files_and_hunks_in_order() {
        let files = parse_diff(TWO_FILES);
        assert_eq!(files.len(), 2);
        assert_eq!(&*files[0].path, "src/lib.rs");
        assert_eq!(&*files[1].path, "README.md");
        assert_eq!(files[0].hunks.len(), 2);
        assert_eq!(files[1].hunks.len(), 1);
    }

    #[test]
    fn test_parse_header_numbers_and_defaults() {
        let files = parse_diff(TWO_FILES);
        let first = &files[0].hunks[0];
        assert_eq!(
            (first.old_start, first.old_lines, first.new_start, first.new_lines),
            (10, 3, 10, 4)
        );
        let second = &files[0].hunks[1];
        assert_eq!(
            (second.old_start, second.old_lines, second.new_start, second.new_lines),
            (40, 1, 41, 1)
        );
    }

    #[test]
    fn test_parse_context_label() {
        let files = parse_diff(TWO_FILES);
        assert_eq!(files[0].hunks[0].context.as_deref(), Some("pub fn run() {"));
        assert_eq!(files[0].hunks[1].context.as_deref(), Some("impl Config {"));
        assert_eq!(files[1].hunks[0].context, None);
    }

    #[test]
    fn test_file_counts_equal_sum_of_hunks() {
        for file in parse_diff(TWO_FILES) {
            let added: usize = file.hunks.iter().map(|h| h.added).sum();
            let removed: usize = file.hunks.iter().map(|h| h.removed).sum();
            assert_eq!(file.additions, added);
            assert_eq!(file.deletions, removed);
        }
        let files = parse_diff(TWO_FILES);
        assert_eq!((files[0].additions, files[0].deletions), (3, 2));
        assert_eq!((files[1].additions, files[1].deletions), (2, 0));
    }

    #[test]
    fn test_file_header_lines_are_not_hunk_lines() {
        let files = parse_diff(TWO_FILES);
        let readme = &files[1].hunks[0];
        assert_eq!(readme.lines, vec!["+# Title".to_string(), "+body".to_string()]);
    }

    #[test]
    fn test_hunk_header_before_file_is_ignored() {
        let text = "@@ -1 +1 @@\n+orphan\ndiff --git a/a.txt b/a.txt\n@@ -1 +1 @@\n-x\n+y\n";
        let files = parse_diff(text);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].hunks.len(), 1);
        assert_eq!(files[0].hunks[0].lines, vec!["-x", "+y"]);
    }

    #[test]
    fn test_malformed_hunk_header_is_skipped() {
        let text = "diff --git a/a.txt b/a.txt\n@@ -x +1 @@\n@@ -1,2 +1,2 @@\n-a\n+b\n";
        let files = parse_diff(text);
        assert_eq!(files[0].hunks.len(), 1);
        assert_eq!(files[0].hunks[0].header, "@@ -1,2 +1,2 @@");
    }

    #[test]
    fn test_triple_plus_inside_hunk_not_counted() {
        let text = "diff --git a/a b/a\n@@ -1 +1,2 @@\n+++counter\n+real\n";
        let files = parse_diff(text);
        assert_eq!(files[0].additions, 1);
        assert_eq!(files[0].hunks[0].lines.len(), 2);
    }

    #[test]
    fn test_hash_is_stable_and_eight_hex_chars() {
        let a = parse_diff(TWO_FILES);
        let b = parse_diff(TWO_FILES);
        for (fa, fb) in a.iter().zip(&b) {
            for (ha, hb) in fa.hunks.iter().zip(&fb.hunks) {
                assert_eq!(ha.hash.len(), HUNK_HASH_LEN);
                assert!(ha.hash.chars().all(|c| c.is_ascii_hexdigit()));
                assert_eq!(ha.hash, hb.hash);
            }
        }
        assert_ne!(a[0].hunks[0].hash, a[0].hunks[1].hash);
    }

    #[test]
    fn test_hash_depends_on_path() {
        let lines = vec!["+x".to_string()];
        assert_ne!(
            hunk_hash("a.rs", "@@ -1 +1 @@", &lines),
            hunk_hash("b.rs", "@@ -1 +1 @@", &lines)
        );
    }

    #[test]
    fn test_hunk_back_reference_matches_file_path() {
        let files = parse_diff(TWO_FILES);
        for file in &files {
            for hunk in &file.hunks {
                assert_eq!(hunk.file_path, file.path);
            }
        }
    }

    #[test]
    fn test_path_with_spaces_from_plus_marker() {
        let text = "diff --git a/my file.txt b/my file.txt\n--- a/my file.txt\n+++ b/my file.txt\n@@ -1 +1 @@\n-a\n+b\n";
        let files = parse_diff(text);
        assert_eq!(&*files[0].path, "my file.txt");
    }

    #[test]
    fn test_deleted_file_keeps_git_header_path() {
        let text = "diff --git a/gone.rs b/gone.rs\ndeleted file mode 100644\n--- a/gone.rs\n+++ /dev/null\n@@ -1,2 +0,0 @@\n-a\n-b\n";
        let files = parse_diff(text);
        assert_eq!(&*files[0].path, "gone.rs");
        assert_eq!(files[0].deletions, 2);
    }

    #[test]
    fn test_top_level_segment() {
        let files = parse_diff(TWO_FILES);
        assert_eq!(files[0].top_level_segment(), "src");
        assert_eq!(files[1].top_level_segment(), "README.md");
    }
}
