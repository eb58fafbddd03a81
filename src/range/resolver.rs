//! Range header parsing, compliant with the single-range subset of RFC 7233.

/// A closed interval `[first, last]` of byte positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub first: u64,
    pub last: u64,
}

impl ByteRange {
    /// Number of bytes covered.
    pub fn len(&self) -> u64 {
        self.last - self.first + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// True when the range covers the entire resource.
    pub fn is_full(&self, total: u64) -> bool {
        self.first == 0 && self.last + 1 == total
    }

    /// `Content-Range` header value, e.g. `bytes 2-5/10`.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.first, self.last, total)
    }

    /// Half-open form used to drive the streaming producer.
    pub fn positions(&self) -> std::ops::Range<u64> {
        self.first..self.last + 1
    }
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeResolution {
    Satisfiable(ByteRange),
    /// No Range header: serve the whole body with 200.
    NoRangeRequested,
    /// Malformed or out of bounds: respond 416 with `bytes */N`.
    Unsatisfiable,
}

impl RangeResolution {
    /// `Content-Range` value for a 416 response.
    pub fn unsatisfied_content_range(total: u64) -> String {
        format!("bytes */{}", total)
    }
}

/// Resolve a Range header against a resource of `total` bytes.
///
/// Supported forms:
/// - `bytes=first-last`
/// - `bytes=first-` (to the end)
/// - `bytes=-suffix` (last `suffix` bytes, whole resource when larger)
///
/// # Examples
/// ```
/// use http_exerciser::range::{resolve, ByteRange, RangeResolution};
///
/// assert_eq!(
///     resolve(Some("bytes=2-5"), 10),
///     RangeResolution::Satisfiable(ByteRange { first: 2, last: 5 })
/// );
/// assert_eq!(resolve(None, 10), RangeResolution::NoRangeRequested);
/// assert_eq!(resolve(Some("bytes=5-2"), 10), RangeResolution::Unsatisfiable);
/// ```
pub fn resolve(range_header: Option<&str>, total: u64) -> RangeResolution {
    let Some(header) = range_header else {
        return RangeResolution::NoRangeRequested;
    };

    match parse_bounds(header.trim(), total) {
        Some((first, last)) if first <= last && last < total => {
            RangeResolution::Satisfiable(ByteRange { first, last })
        }
        _ => RangeResolution::Unsatisfiable,
    }
}

/// Parse the header into raw bounds without validating them.
fn parse_bounds(header: &str, total: u64) -> Option<(u64, u64)> {
    let set = header.strip_prefix("bytes=")?.trim();

    // Only a single range is supported
    if set.contains(',') {
        return None;
    }

    let (start_str, end_str) = set.split_once('-')?;
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    // Suffix range: "-500" means the last 500 bytes
    if start_str.is_empty() {
        let suffix = parse_position(end_str)?;
        let last = total.checked_sub(1)?;
        return Some((total.saturating_sub(suffix).min(total), last)).filter(|_| suffix > 0);
    }

    let first = parse_position(start_str)?;
    let last = if end_str.is_empty() {
        total.checked_sub(1)?
    } else {
        parse_position(end_str)?
    };
    Some((first, last))
}

fn parse_position(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Byte served at absolute position `pos`: `a..z` cycling.
#[inline]
pub fn deterministic_byte(pos: u64) -> u8 {
    b'a' + (pos % 26) as u8
}

/// Cap a requested resource length at `max`.
#[inline]
pub fn clamp_length(requested: u64, max: u64) -> u64 {
    requested.min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn satisfiable(first: u64, last: u64) -> RangeResolution {
        RangeResolution::Satisfiable(ByteRange { first, last })
    }

    #[test]
    fn test_no_range() {
        assert_eq!(resolve(None, 100), RangeResolution::NoRangeRequested);
    }

    #[test]
    fn test_standard_range() {
        assert_eq!(resolve(Some("bytes=0-9"), 100), satisfiable(0, 9));
        assert_eq!(resolve(Some("bytes=2-5"), 10), satisfiable(2, 5));
        assert_eq!(resolve(Some("bytes=9-9"), 10), satisfiable(9, 9));
    }

    #[test]
    fn test_open_range() {
        assert_eq!(resolve(Some("bytes=50-"), 100), satisfiable(50, 99));
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(resolve(Some("bytes=-20"), 100), satisfiable(80, 99));
        // Suffix longer than the resource yields the whole resource
        assert_eq!(resolve(Some("bytes=-500"), 100), satisfiable(0, 99));
        assert_eq!(resolve(Some("bytes=-0"), 100), RangeResolution::Unsatisfiable);
    }

    #[test]
    fn test_unsatisfiable_bounds() {
        for header in ["bytes=200-", "bytes=5-2", "bytes=0-100", "bytes=100-100"] {
            assert_eq!(
                resolve(Some(header), 100),
                RangeResolution::Unsatisfiable,
                "{}",
                header
            );
        }
    }

    #[test]
    fn test_malformed_is_unsatisfiable() {
        for header in ["bytes=a-b", "bytes=0-9,20-29", "items=0-1", "bytes=", "bytes=-", "bytes=+1-2"] {
            assert_eq!(
                resolve(Some(header), 100),
                RangeResolution::Unsatisfiable,
                "{}",
                header
            );
        }
    }

    #[test]
    fn test_zero_length_resource() {
        assert_eq!(resolve(Some("bytes=0-"), 0), RangeResolution::Unsatisfiable);
        assert_eq!(resolve(Some("bytes=-1"), 0), RangeResolution::Unsatisfiable);
    }

    #[test]
    fn test_full_range_detection() {
        let r = ByteRange { first: 0, last: 9 };
        assert!(r.is_full(10));
        assert!(!ByteRange { first: 1, last: 9 }.is_full(10));
        assert_eq!(r.content_range(10), "bytes 0-9/10");
        assert_eq!(r.len(), 10);
    }

    #[test]
    fn test_deterministic_byte_consistent_across_ranges() {
        let total = 1000;
        let windows = [(0u64, 99u64), (50, 149), (26, 51), (998, 999)];
        let mut seen = vec![None; total as usize];
        for (first, last) in windows {
            let RangeResolution::Satisfiable(range) =
                resolve(Some(&format!("bytes={}-{}", first, last)), total)
            else {
                panic!("expected satisfiable");
            };
            for pos in range.positions() {
                let byte = deterministic_byte(pos);
                let slot = &mut seen[pos as usize];
                assert_eq!(*slot.get_or_insert(byte), byte);
            }
        }
        assert_eq!(deterministic_byte(0), b'a');
        assert_eq!(deterministic_byte(27), b'b');
    }

    #[test]
    fn test_clamp_length() {
        assert_eq!(clamp_length(500_000, 102_400), 102_400);
        assert_eq!(clamp_length(10, 102_400), 10);
    }
}
