//! HTTP byte-range parsing and validation for streaming playback.
//!
//! Parsing is strict: malformed syntax and out-of-bounds positions are
//! rejected so the server answers 416 instead of serving a wrong-length
//! body. Only single ranges of the form `bytes=start-end` or `bytes=start-`
//! are supported, which is all seeking playback clients send.

/// An inclusive, validated byte span within an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
    pub total_size: u64,
}

impl ByteRange {
    /// Parses and validates a `Range` header value against the artifact size.
    ///
    /// An omitted end (`bytes=start-`) defaults to the last byte of the
    /// file. Every returned range satisfies
    /// `start <= end < total_size`.
    ///
    /// # Errors
    ///
    /// - `RangeError::Malformed` - Header is not a single `bytes=start-end` span
    /// - `RangeError::Unsatisfiable` - Bounds fall outside the artifact
    pub fn parse(header: &str, total_size: u64) -> Result<Self, RangeError> {
        let spec = header
            .strip_prefix("bytes=")
            .ok_or_else(|| RangeError::Malformed {
                header: header.to_string(),
            })?;

        let (start_str, end_str) = spec.split_once('-').ok_or_else(|| RangeError::Malformed {
            header: header.to_string(),
        })?;

        let start = start_str
            .parse::<u64>()
            .map_err(|_| RangeError::Malformed {
                header: header.to_string(),
            })?;

        let end = if end_str.is_empty() {
            total_size.saturating_sub(1)
        } else {
            end_str.parse::<u64>().map_err(|_| RangeError::Malformed {
                header: header.to_string(),
            })?
        };

        if total_size == 0 || start >= total_size || end >= total_size || start > end {
            return Err(RangeError::Unsatisfiable {
                start,
                end,
                total_size,
            });
        }

        Ok(Self {
            start,
            end,
            total_size,
        })
    }

    /// Full span of an artifact, for non-range requests.
    pub fn full(total_size: u64) -> Self {
        Self {
            start: 0,
            end: total_size.saturating_sub(1),
            total_size,
        }
    }

    /// Number of bytes covered by the span. Zero for an empty artifact,
    /// where `full` yields a degenerate `0-0` span.
    pub fn length(&self) -> u64 {
        if self.total_size == 0 {
            return 0;
        }
        self.end - self.start + 1
    }

    /// `Content-Range` header value for a 206 response.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total_size)
    }
}

/// Errors that occur while resolving a range request.
#[derive(Debug, thiserror::Error)]
pub enum RangeError {
    /// Header syntax is not a single byte span
    #[error("Malformed range header: {header}")]
    Malformed {
        /// The offending header value
        header: String,
    },

    /// Requested span lies outside the artifact
    #[error("Range {start}-{end} not satisfiable for size {total_size}")]
    Unsatisfiable {
        /// Requested start position
        start: u64,
        /// Requested end position
        end: u64,
        /// Artifact size the request was validated against
        total_size: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_closed_range() {
        let range = ByteRange::parse("bytes=100-199", 1000).unwrap();
        assert_eq!(range.start, 100);
        assert_eq!(range.end, 199);
        assert_eq!(range.length(), 100);
        assert_eq!(range.content_range(), "bytes 100-199/1000");
    }

    #[test]
    fn test_parse_open_end_defaults_to_last_byte() {
        let range = ByteRange::parse("bytes=500-", 1000).unwrap();
        assert_eq!(range.start, 500);
        assert_eq!(range.end, 999);
        assert_eq!(range.length(), 500);
    }

    #[test]
    fn test_parse_first_hundred_bytes() {
        let range = ByteRange::parse("bytes=0-99", 1000).unwrap();
        assert_eq!(range.length(), 100);
        assert_eq!(range.content_range(), "bytes 0-99/1000");
    }

    #[test]
    fn test_parse_rejects_malformed_syntax() {
        for header in ["invalid", "bytes=", "bytes=abc-def", "bytes=10", "bytes=-"] {
            assert!(
                matches!(
                    ByteRange::parse(header, 1000),
                    Err(RangeError::Malformed { .. })
                ),
                "accepted malformed header: {header:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_out_of_bounds() {
        // Start past end of file
        assert!(matches!(
            ByteRange::parse("bytes=1000-", 1000),
            Err(RangeError::Unsatisfiable { .. })
        ));
        // End past end of file is rejected, not clamped
        assert!(matches!(
            ByteRange::parse("bytes=0-1000", 1000),
            Err(RangeError::Unsatisfiable { .. })
        ));
        // Inverted bounds
        assert!(matches!(
            ByteRange::parse("bytes=200-100", 1000),
            Err(RangeError::Unsatisfiable { .. })
        ));
    }

    #[test]
    fn test_parse_empty_file_is_unsatisfiable() {
        assert!(matches!(
            ByteRange::parse("bytes=0-", 0),
            Err(RangeError::Unsatisfiable { .. })
        ));
    }

    #[test]
    fn test_full_covers_whole_artifact() {
        let range = ByteRange::full(1000);
        assert_eq!(range.start, 0);
        assert_eq!(range.end, 999);
        assert_eq!(range.length(), 1000);
    }

    #[test]
    fn test_full_of_empty_artifact_is_zero_length() {
        let range = ByteRange::full(0);
        assert_eq!(range.length(), 0);
    }

    #[test]
    fn test_suffix_syntax_is_rejected() {
        // bytes=-500 (suffix length) is not supported by this server
        assert!(ByteRange::parse("bytes=-500", 1000).is_err());
    }
}
