use std::fmt;

/// A hierarchical storage key, e.g. `/blocks/<cid>`.
///
/// Keys are normalized on construction: they always start with `/` and never
/// end with one (except the root key `/` itself). The leading path segment
/// decides which mount owns the key; the remainder is opaque to the routing
/// layer.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);

impl Key {
    pub fn new(path: impl AsRef<str>) -> Self {
        let path = path.as_ref();
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Self("/".to_owned());
        }
        Self(format!("/{trimmed}"))
    }

    /// The root key `/`, which matches every key as a prefix.
    pub fn root() -> Self {
        Self("/".to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Appends a path segment, e.g. `Key::new("/blocks").child("Qm…")`.
    pub fn child(&self, segment: &str) -> Self {
        if self.is_root() {
            Self::new(segment)
        } else {
            Self::new(format!("{}/{}", self.0, segment))
        }
    }

    /// Whether `prefix` is a segment-aligned prefix of this key.
    ///
    /// Matching is per path segment, so `/blocksX` is not under `/blocks`.
    pub fn has_prefix(&self, prefix: &Key) -> bool {
        if prefix.is_root() {
            return true;
        }
        self.0 == prefix.0
            || (self.0.starts_with(&prefix.0) && self.0.as_bytes()[prefix.0.len()] == b'/')
    }

    /// The remainder of the key after `prefix`, without the separating slash.
    ///
    /// Returns `None` if `prefix` does not match (see [`Key::has_prefix`]) or
    /// if the key equals the prefix and nothing remains.
    pub fn strip_prefix(&self, prefix: &Key) -> Option<&str> {
        if !self.has_prefix(prefix) {
            return None;
        }
        let rest = if prefix.is_root() {
            &self.0[1..]
        } else {
            self.0[prefix.0.len()..].trim_start_matches('/')
        };
        if rest.is_empty() { None } else { Some(rest) }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.0)
    }
}

impl From<&str> for Key {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}
