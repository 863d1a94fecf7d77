//! HTTP Range request parsing (single `bytes` range, RFC 7233)

use std::ops::RangeInclusive;

/// Outcome of evaluating a `Range` header against a file size
#[derive(Debug, PartialEq, Eq)]
pub enum ByteRange {
    /// Serve the inclusive byte span with 206
    Partial(RangeInclusive<usize>),
    /// Answer 416
    NotSatisfiable,
    /// Absent, multi-range or malformed: serve the full body
    Full,
}

/// Accepted forms: `bytes=start-end`, `bytes=start-`, `bytes=-suffix`
pub fn parse_range_header(header: Option<&str>, file_size: usize) -> ByteRange {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return ByteRange::Full;
    };
    if spec.contains(',') {
        return ByteRange::Full;
    }
    let Some((first, last)) = spec.split_once('-') else {
        return ByteRange::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        return match last.parse::<usize>() {
            Ok(0) => ByteRange::NotSatisfiable,
            Ok(_) if file_size == 0 => ByteRange::NotSatisfiable,
            Ok(suffix) => ByteRange::Partial(file_size.saturating_sub(suffix)..=file_size - 1),
            Err(_) => ByteRange::Full,
        };
    }

    let Ok(start) = first.parse::<usize>() else {
        return ByteRange::Full;
    };
    if start >= file_size {
        return ByteRange::NotSatisfiable;
    }

    let end = if last.is_empty() {
        file_size - 1
    } else {
        match last.parse::<usize>() {
            Ok(end) if end < start => return ByteRange::NotSatisfiable,
            Ok(end) => end.min(file_size - 1),
            Err(_) => return ByteRange::Full,
        }
    };

    ByteRange::Partial(start..=end)
}
