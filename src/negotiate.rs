//! # Content Negotiation
//!
//! Picks a response content type from a request's `Accept` header (RFC 9110 §12.5.1).
//!
//! Clauses are ranked by quality value first and by specificity second: a concrete
//! type beats `type/*`, which beats `*/*`, and among equals the clause with more
//! media-type parameters wins. Clauses with `q=0` mean "not acceptable" and are
//! dropped. For each clause in that order, the first alternative it matches is the
//! answer, so ties between alternatives go to the one listed first.
//!
//! ```rust
//! use brrt_pipeline::negotiate::negotiate;
//!
//! let alternatives = ["text/a", "text/b"];
//! assert_eq!(negotiate("text/b, text/a;q=0.5", &alternatives), Some(1));
//! assert_eq!(negotiate("image/png", &alternatives), None);
//! ```

use std::cmp::Ordering;

/// One clause of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    /// Main type, lowercased; `*` for any
    pub kind: String,
    /// Subtype, lowercased; `*` for any
    pub subtype: String,
    /// Quality value in `[0, 1]`
    pub q: f32,
    /// Media-type parameters other than `q`
    pub params: Vec<(String, String)>,
}

impl MediaRange {
    fn specificity(&self) -> (u8, u8, usize) {
        (
            u8::from(self.kind != "*"),
            u8::from(self.subtype != "*"),
            self.params.len(),
        )
    }

    /// True if `content_type` (parameters ignored) falls within this range.
    #[must_use]
    pub fn matches(&self, content_type: &str) -> bool {
        let Some((kind, subtype)) = split_media_type(content_type) else {
            return false;
        };
        (self.kind == "*" && self.subtype == "*")
            || (self.kind.eq_ignore_ascii_case(kind)
                && (self.subtype == "*" || self.subtype.eq_ignore_ascii_case(subtype)))
    }
}

/// `type/subtype` of a content type, parameters stripped.
fn split_media_type(content_type: &str) -> Option<(&str, &str)> {
    let essence = content_type.split(';').next()?.trim();
    let (kind, subtype) = essence.split_once('/')?;
    let (kind, subtype) = (kind.trim(), subtype.trim());
    if kind.is_empty() || subtype.is_empty() {
        return None;
    }
    Some((kind, subtype))
}

fn parse_quality(raw: &str) -> f32 {
    match raw.trim().parse::<f32>() {
        Ok(q) if q.is_finite() => q.clamp(0.0, 1.0),
        // An unreadable weight is treated as "not acceptable"
        _ => 0.0,
    }
}

/// Parse an `Accept` header into media ranges ordered by precedence.
///
/// Malformed clauses are skipped. A bare `*` is read as `*/*`.
#[must_use]
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    let mut ranges: Vec<MediaRange> = header
        .split(',')
        .filter_map(|clause| {
            let mut parts = clause.split(';');
            let media = parts.next()?.trim();
            if media.is_empty() {
                return None;
            }
            let (kind, subtype) = if media == "*" {
                ("*", "*")
            } else {
                split_media_type(media)?
            };
            if kind == "*" && subtype != "*" {
                return None;
            }

            let mut q = 1.0;
            let mut params = Vec::new();
            for param in parts {
                let Some((name, value)) = param.split_once('=') else {
                    continue;
                };
                let name = name.trim();
                if name.eq_ignore_ascii_case("q") {
                    q = parse_quality(value);
                } else {
                    params.push((name.to_ascii_lowercase(), value.trim().to_string()));
                }
            }

            Some(MediaRange {
                kind: kind.to_ascii_lowercase(),
                subtype: subtype.to_ascii_lowercase(),
                q,
                params,
            })
        })
        .filter(|range| range.q > 0.0)
        .collect();

    // Stable: equal clauses keep header order
    ranges.sort_by(|a, b| {
        b.q.partial_cmp(&a.q)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.specificity().cmp(&a.specificity()))
    });
    ranges
}

/// Index of the alternative that best satisfies `header`, or `None` if nothing is
/// acceptable (including an empty header).
#[must_use]
pub fn negotiate<S: AsRef<str>>(header: &str, alternatives: &[S]) -> Option<usize> {
    parse_accept(header).iter().find_map(|range| {
        alternatives
            .iter()
            .position(|alt| range.matches(alt.as_ref()))
    })
}
