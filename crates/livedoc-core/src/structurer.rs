//! Change structurer: unified diff text → [`StructuredChanges`].
//!
//! A line-oriented state machine with two states, scanning and in-file.
//! `diff --git` headers and `---`/`+++` header pairs open file sections;
//! `+`/`-` lines inside a section accumulate as added/removed lines.
//! Hunk headers are tracked so that content lines beginning with `--`/`++`
//! are never mistaken for file markers.
//! The parser is total: malformed input degrades to fewer records, never to
//! an error.

use crate::domain::{ChangeRecord, ChangeType, StructuredChanges};

const GIT_HEADER: &str = "diff --git ";
const OLD_FILE_MARKER: &str = "--- ";
const NEW_FILE_MARKER: &str = "+++ ";
const DEV_NULL: &str = "/dev/null";

/// Parse a unified diff into per-file change records.
pub fn structure(diff_text: &str) -> StructuredChanges {
    let mut records = Vec::new();
    let mut state = ParseState::Scanning;
    let mut lines = diff_text.lines().peekable();

    while let Some(raw) = lines.next() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if let Some(header) = line.strip_prefix(GIT_HEADER) {
            state.close_into(&mut records);
            state = ParseState::InFile(Section::from_git_header(header));
            continue;
        }

        // `--- x` only counts as a file marker when `+++ y` follows it and the
        // current section can still take markers; otherwise it is a removed
        // line whose content starts with "--".
        if let Some(old) = line
            .strip_prefix(OLD_FILE_MARKER)
            .filter(|_| state.accepts_file_markers())
        {
            let next_is_new_marker = lines
                .peek()
                .map(|next| next.starts_with(NEW_FILE_MARKER))
                .unwrap_or(false);
            if next_is_new_marker {
                let new = lines
                    .next()
                    .and_then(|next| next.strip_prefix(NEW_FILE_MARKER))
                    .unwrap_or_default();
                let new = new.strip_suffix('\r').unwrap_or(new);
                state.apply_file_markers(old, new, &mut records);
                continue;
            }
        }

        if let ParseState::InFile(section) = &mut state {
            section.consume(line);
        }
    }

    state.close_into(&mut records);
    StructuredChanges::from_records(records)
}

enum ParseState {
    Scanning,
    InFile(Section),
}

impl ParseState {
    fn accepts_file_markers(&self) -> bool {
        match self {
            ParseState::Scanning => true,
            ParseState::InFile(section) => section.accepts_file_markers(),
        }
    }

    fn close_into(&mut self, records: &mut Vec<ChangeRecord>) {
        if let ParseState::InFile(section) = std::mem::replace(self, ParseState::Scanning) {
            records.extend(section.finish());
        }
    }

    fn apply_file_markers(&mut self, old: &str, new: &str, records: &mut Vec<ChangeRecord>) {
        match self {
            ParseState::InFile(section) if !section.saw_file_markers => {
                section.apply_file_markers(old, new);
            }
            _ => {
                // A second marker pair without a git header starts a new file,
                // as in plain `diff -u` output.
                self.close_into(records);
                let mut section = Section::default();
                section.apply_file_markers(old, new);
                *self = ParseState::InFile(section);
            }
        }
    }
}

#[derive(Debug)]
struct Section {
    path: Option<String>,
    change_type: ChangeType,
    /// Opened by a `diff --git` header rather than a bare marker pair.
    git_header: bool,
    saw_file_markers: bool,
    saw_hunk: bool,
    /// Old/new lines still owed by the current hunk header.
    hunk_old_remaining: usize,
    hunk_new_remaining: usize,
    added: Vec<String>,
    removed: Vec<String>,
}

impl Default for Section {
    fn default() -> Self {
        Self {
            path: None,
            change_type: ChangeType::Modified,
            git_header: false,
            saw_file_markers: false,
            saw_hunk: false,
            hunk_old_remaining: 0,
            hunk_new_remaining: 0,
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl Section {
    /// Provisional path from `diff --git a/<old> b/<new>`; the `+++` marker
    /// overrides it when present.
    fn from_git_header(header: &str) -> Self {
        let path = header
            .rsplit_once(" b/")
            .map(|(_, new)| new.trim().to_string())
            .filter(|p| !p.is_empty());
        Self {
            path,
            git_header: true,
            ..Self::default()
        }
    }

    /// A git section takes exactly one marker pair, before its first hunk.
    /// A bare `diff -u` section yields to a new marker pair once its current
    /// hunk is exhausted.
    fn accepts_file_markers(&self) -> bool {
        if self.git_header {
            !self.saw_file_markers && !self.saw_hunk
        } else {
            self.hunk_old_remaining == 0 && self.hunk_new_remaining == 0
        }
    }

    fn apply_file_markers(&mut self, old: &str, new: &str) {
        self.saw_file_markers = true;
        let old = marker_path(old);
        let new = marker_path(new);
        match (old, new) {
            (None, Some(new)) => {
                self.change_type = ChangeType::Added;
                self.path = Some(new);
            }
            (Some(old), None) => {
                self.change_type = ChangeType::Deleted;
                self.path = Some(old);
            }
            (_, Some(new)) => self.path = Some(new),
            (None, None) => {}
        }
    }

    fn consume(&mut self, line: &str) {
        if line.starts_with("@@") {
            self.saw_hunk = true;
            let (old, new) = hunk_lengths(line).unwrap_or_default();
            self.hunk_old_remaining = old;
            self.hunk_new_remaining = new;
        } else if line.starts_with("new file mode") {
            self.change_type = ChangeType::Added;
        } else if line.starts_with("deleted file mode") {
            self.change_type = ChangeType::Deleted;
        } else if let Some(added) = line.strip_prefix('+') {
            self.hunk_new_remaining = self.hunk_new_remaining.saturating_sub(1);
            self.added.push(added.to_string());
        } else if let Some(removed) = line.strip_prefix('-') {
            self.hunk_old_remaining = self.hunk_old_remaining.saturating_sub(1);
            self.removed.push(removed.to_string());
        } else if line.is_empty() || line.starts_with(' ') {
            self.hunk_old_remaining = self.hunk_old_remaining.saturating_sub(1);
            self.hunk_new_remaining = self.hunk_new_remaining.saturating_sub(1);
        }
    }

    fn finish(self) -> Option<ChangeRecord> {
        let path = self.path?;
        Some(ChangeRecord::new(
            path,
            self.change_type,
            self.added,
            self.removed,
        ))
    }
}

/// Line counts from `@@ -a,b +c,d @@`; an omitted count means one line.
fn hunk_lengths(header: &str) -> Option<(usize, usize)> {
    let mut ranges = header.trim_start_matches('@').split_whitespace();
    let old = ranges.next()?.strip_prefix('-')?;
    let new = ranges.next()?.strip_prefix('+')?;
    Some((range_length(old)?, range_length(new)?))
}

fn range_length(range: &str) -> Option<usize> {
    match range.split_once(',') {
        Some((_, len)) => len.parse().ok(),
        None => range.parse::<usize>().ok().map(|_| 1),
    }
}

/// Strip the VCS prefix token (`a/`, `b/`) and any trailing timestamp.
/// `/dev/null` maps to `None`.
fn marker_path(marker: &str) -> Option<String> {
    let path = marker.split('\t').next().unwrap_or_default().trim();
    if path.is_empty() || path == DEV_NULL {
        return None;
    }
    let path = path
        .strip_prefix("b/")
        .or_else(|| path.strip_prefix("a/"))
        .unwrap_or(path);
    Some(path.to_string())
}
