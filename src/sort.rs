//! Natural sort keys for entry names and filesystem paths
//!
//! "img2.png" must order before "img10.png", which plain lexicographic
//! comparison gets wrong. The key splits a name into alternating text and
//! digit runs; digit runs compare by numeric magnitude, text runs compare
//! case-insensitively. The same key is used for container entry names and
//! for directory listings, so a ZIP full of frames and a folder full of
//! frames order identically.

use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

/// One comparable segment of a natural sort key.
///
/// Ordering across variants is `Dot < Num < Text`: the dot segment ranks
/// lowest so extension-bearing names group predictably, and digit runs rank
/// below text so "1.png" precedes "a.png".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A literal `.` (only produced by [`natural_key_dots`])
    Dot,
    /// A run of ASCII digits, leading zeros stripped ("0" when all zeros)
    Num(String),
    /// Any other run, stored lowercased
    Text(String),
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Dot, Segment::Dot) => Ordering::Equal,
            (Segment::Dot, _) => Ordering::Less,
            (_, Segment::Dot) => Ordering::Greater,
            // Zero-stripped digit strings of equal length compare digit by
            // digit, so (length, text) order equals numeric order at any
            // magnitude.
            (Segment::Num(a), Segment::Num(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Segment::Num(_), Segment::Text(_)) => Ordering::Less,
            (Segment::Text(_), Segment::Num(_)) => Ordering::Greater,
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort orders for entry names and filesystem paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Natural order (digit runs compared numerically)
    #[default]
    Natural,
    /// Natural order with `.` ranked as its own lowest segment
    NaturalDots,
    /// Plain lexicographic order
    String,
    /// File size, smallest first (filesystem paths only)
    Size,
    /// Creation time, oldest first (filesystem paths only)
    Ctime,
    /// Modification time, oldest first (filesystem paths only)
    Mtime,
}

impl SortMode {
    /// Whether this mode needs filesystem metadata to compare.
    pub fn is_stat_based(self) -> bool {
        matches!(self, SortMode::Size | SortMode::Ctime | SortMode::Mtime)
    }
}

fn push_segment(key: &mut Vec<Segment>, run: &mut String, digits: bool) {
    if run.is_empty() {
        return;
    }
    if digits {
        let stripped = run.trim_start_matches('0');
        let digits = if stripped.is_empty() { "0" } else { stripped };
        key.push(Segment::Num(digits.to_string()));
    } else {
        key.push(Segment::Text(run.to_lowercase()));
    }
    run.clear();
}

/// Compute the natural sort key for `name`.
pub fn natural_key(name: &str) -> Vec<Segment> {
    let mut key = Vec::new();
    let mut run = String::new();
    let mut in_digits = false;
    for c in name.chars() {
        let digit = c.is_ascii_digit();
        if digit != in_digits {
            push_segment(&mut key, &mut run, in_digits);
            in_digits = digit;
        }
        run.push(c);
    }
    push_segment(&mut key, &mut run, in_digits);
    key
}

/// Natural sort key variant that splits out `.` as its own lowest-ranked
/// segment, keeping "a.png" ahead of "a2.png" regardless of what follows
/// the extension dot.
pub fn natural_key_dots(name: &str) -> Vec<Segment> {
    let mut key = Vec::new();
    let mut run = String::new();
    let mut in_digits = false;
    for c in name.chars() {
        if c == '.' {
            push_segment(&mut key, &mut run, in_digits);
            in_digits = false;
            key.push(Segment::Dot);
            continue;
        }
        let digit = c.is_ascii_digit();
        if digit != in_digits {
            push_segment(&mut key, &mut run, in_digits);
            in_digits = digit;
        }
        run.push(c);
    }
    push_segment(&mut key, &mut run, in_digits);
    key
}

/// Sort container entry names in place.
///
/// Stat-based modes have nothing to stat inside a container and fall back to
/// natural order.
pub fn sort_entry_names(names: &mut [String], mode: SortMode) {
    match mode {
        SortMode::String => names.sort(),
        SortMode::NaturalDots => names.sort_by_cached_key(|n| natural_key_dots(n)),
        _ => names.sort_by_cached_key(|n| natural_key(n)),
    }
}

fn path_size(path: &PathBuf) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn path_mtime(path: &PathBuf) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

fn path_ctime(path: &PathBuf) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.created().or_else(|_| m.modified()))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Sort filesystem paths in place by the given mode.
///
/// Unreadable paths stat as zero size / epoch time rather than failing the
/// whole sort.
pub fn sort_paths(paths: &mut [PathBuf], mode: SortMode) {
    match mode {
        SortMode::Natural => paths.sort_by_cached_key(|p| natural_key(&p.to_string_lossy())),
        SortMode::NaturalDots => {
            paths.sort_by_cached_key(|p| natural_key_dots(&p.to_string_lossy()))
        }
        SortMode::String => paths.sort(),
        SortMode::Size => paths.sort_by_cached_key(path_size),
        SortMode::Ctime => paths.sort_by_cached_key(path_ctime),
        SortMode::Mtime => paths.sort_by_cached_key(path_mtime),
    }
}
