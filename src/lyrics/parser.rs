//! LRC format parser
//!
//! Parses synchronized lyrics in LRC format:
//! [mm:ss.xx] Lyrics line here
//!
//! Example:
//! [00:12.34] Hello world
//! [00:15.00] Another line
//!
//! Lines without a timestamp are dropped from the synced view but survive in
//! [`plain_text`], which strips every tag.

/// A single line of lyrics with timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct LrcLine {
    /// Timestamp in milliseconds from start
    pub time_ms: u64,
    /// The lyrics text
    pub text: String,
}

impl LrcLine {
    pub fn new(time_ms: u64, text: String) -> Self {
        Self { time_ms, text }
    }
}

/// Timestamped lines, sorted by time
#[derive(Debug, Clone, Default)]
pub struct ParsedLyrics {
    pub lines: Vec<LrcLine>,
}

impl ParsedLyrics {
    /// Parse LRC formatted lyrics, keeping only timestamped lines
    pub fn parse(content: &str) -> Self {
        let mut lines = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || is_metadata_line(line) {
                continue;
            }
            if let Some(parsed) = parse_timed_line(line) {
                lines.extend(parsed);
            }
        }

        // Stable, so lines sharing a timestamp keep file order
        lines.sort_by_key(|l| l.time_ms);

        Self { lines }
    }

    pub fn is_synced(&self) -> bool {
        !self.lines.is_empty()
    }

    /// Index of the line being sung at `position_ms`
    pub fn line_index_at(&self, position_ms: u64) -> Option<usize> {
        let after = self.lines.partition_point(|l| l.time_ms <= position_ms);
        after.checked_sub(1)
    }

    pub fn line_at(&self, position_ms: u64) -> Option<&LrcLine> {
        self.line_index_at(position_ms).and_then(|i| self.lines.get(i))
    }
}

/// Whether the text carries at least one `[mm:ss]`-style timestamp
pub fn has_timestamps(content: &str) -> bool {
    content.lines().any(|l| parse_timed_line(l.trim()).is_some())
}

/// Lyrics with every timestamp and metadata tag removed
pub fn plain_text(content: &str) -> String {
    content
        .lines()
        .filter(|l| !is_metadata_line(l.trim()))
        .map(|l| strip_timestamps(l).trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Whole-line tag like [ti:Title], [offset:+200] or [#:comment]
fn is_metadata_line(line: &str) -> bool {
    let Some(inner) = line.strip_prefix('[').and_then(|r| r.strip_suffix(']')) else {
        return false;
    };
    if inner.contains(']') || parse_timestamp(inner).is_some() {
        return false;
    }
    let Some((tag, _)) = inner.split_once(':') else {
        return false;
    };
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '#' || c == '_')
}

fn strip_timestamps(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(start) = rest.find('[') {
        let Some(len) = rest[start..].find(']') else {
            break;
        };
        let inner = &rest[start + 1..start + len];
        out.push_str(&rest[..start]);
        if parse_timestamp(inner).is_none() {
            out.push_str(&rest[start..=start + len]);
        }
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out
}

/// Parse a timed line like [00:12.34]Lyrics or [00:12.34][00:15.00]Lyrics
fn parse_timed_line(line: &str) -> Option<Vec<LrcLine>> {
    let mut timestamps = Vec::new();
    let mut pos = 0;

    // Extract all timestamps at the beginning
    while line[pos..].starts_with('[') {
        let Some(end) = line[pos..].find(']') else {
            break;
        };
        let Some(ms) = parse_timestamp(&line[pos + 1..pos + end]) else {
            break;
        };
        timestamps.push(ms);
        pos += end + 1;
    }

    if timestamps.is_empty() {
        return None;
    }

    let text = line[pos..].trim().to_string();
    Some(
        timestamps
            .into_iter()
            .map(|ts| LrcLine::new(ts, text.clone()))
            .collect(),
    )
}

/// Parse timestamp string like "00:12.34" or "00:12:34" to milliseconds
fn parse_timestamp(s: &str) -> Option<u64> {
    let parts: Vec<&str> = s.split([':', '.']).collect();
    let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if !parts.iter().all(|p| digits(p)) {
        return None;
    }

    let num = |p: &str| p.parse::<u64>().ok();
    let (min, sec, ms) = match parts.as_slice() {
        [min, sec] => (num(min)?, num(sec)?, 0),
        [min, sec, frac] => {
            // "34" is centiseconds, "340" milliseconds
            let ms = match frac.len() {
                1 => num(frac)? * 100,
                2 => num(frac)? * 10,
                3 => num(frac)?,
                _ => return None,
            };
            (num(min)?, num(sec)?, ms)
        }
        _ => return None,
    };
    min.checked_mul(60_000)?
        .checked_add(sec.checked_mul(1000)?)?
        .checked_add(ms)
}
