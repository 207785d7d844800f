//! Wildcard filename resolution
//!
//! The decoders never touch directory APIs themselves; this module lists a
//! directory once and filters the entries against a thin wildcard pattern.
//! `*` matches any run of characters, `?` matches exactly one, and anything
//! else is literal.

// standard library
use std::path::Path;

// crate modules
use crate::error::Result;

// external crates
use log::trace;

/// List the file names under `directory` that match `pattern`
///
/// Matches are sorted by name so the result is stable across platforms.
/// Subdirectories are never matched.
pub fn resolve<P: AsRef<Path>>(pattern: &str, directory: P) -> Result<Vec<String>> {
    let mut matches = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if wildcard_match(pattern, &name) {
            trace!("\"{name}\" matches \"{pattern}\"");
            matches.push(name);
        }
    }
    matches.sort();
    Ok(matches)
}

/// Iterative wildcard match with single-star backtracking
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            // widen the last star by one character and retry
            star = Some((star_p, star_t + 1));
            p = star_p + 1;
            t = star_t + 1;
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
