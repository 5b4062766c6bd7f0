//! Deterministic names for synthesized bindings.
//!
//! An alias is the logical name followed by a short digest of its anchor, so the same
//! `(name, anchor)` pair always yields the same identifier. A generated declaration and all of
//! its uses can therefore ask for their name independently, without a shared counter.

use sha2::Digest;
use sha2::Sha256;
use swc_common::BytePos;
use swc_common::Span;

/// Number of hex digits of the anchor digest kept in an alias.
pub const DIGEST_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AliasAnchor<'a> {
  /// Disambiguate by arbitrary text, e.g. a file path or a class and member name.
  Text(&'a str),
  /// Disambiguate by a node's byte range, relative to the start of its file.
  Range { lo: u32, hi: u32 },
}

impl<'a> AliasAnchor<'a> {
  /// Anchors to `span`, made relative to `file_start` so the alias does not depend on where the
  /// file was loaded into the source map.
  pub fn span(span: Span, file_start: BytePos) -> AliasAnchor<'static> {
    AliasAnchor::Range {
      lo: span.lo.0.saturating_sub(file_start.0),
      hi: span.hi.0.saturating_sub(file_start.0),
    }
  }
}

pub fn generate_alias(logical_name: &str, anchor: AliasAnchor) -> String {
  let mut hasher = Sha256::new();
  match anchor {
    AliasAnchor::Text(text) => {
      hasher.update(b"text:");
      hasher.update(text.as_bytes());
    }
    AliasAnchor::Range { lo, hi } => {
      hasher.update(format!("range:{lo}:{hi}").as_bytes());
    }
  };
  let digest = format!("{:x}", hasher.finalize());
  format!("{}_{}", sanitize(logical_name), &digest[..DIGEST_LEN])
}

/// Maps `name` onto identifier characters so keys such as `"data-id"` still produce valid
/// bindings.
fn sanitize(name: &str) -> String {
  let mut out: String = name
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
        c
      } else {
        '_'
      }
    })
    .collect();
  if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
    out.insert(0, '_');
  }
  out
}
