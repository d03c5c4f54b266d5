//! Route template parsing and per-path matching.

use crate::errors::DispatchError;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Param(String),
    /// Named tail capture (`{Path*}`); must be the last segment.
    Wildcard(String),
}

/// A parsed path pattern bound to one operation by name.
#[derive(Debug, Clone)]
pub struct RouteTemplate {
    pub pattern: String,
    pub operation: String,
    segments: Vec<Segment>,
    has_wildcard: bool,
}

impl RouteTemplate {
    /// Parse a pattern such as `/orders/{Id}` or `/files/{Path*}`.
    pub fn parse(pattern: &str, operation: impl Into<String>) -> Result<Self, DispatchError> {
        let raw_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(raw_segments.len());
        let mut has_wildcard = false;

        for (i, raw) in raw_segments.iter().enumerate() {
            if has_wildcard {
                return Err(DispatchError::Lifecycle(format!(
                    "invalid route template {pattern}: wildcard must be the last segment"
                )));
            }
            if let Some(inner) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                if let Some(name) = inner.strip_suffix('*') {
                    if name.is_empty() {
                        return Err(DispatchError::Lifecycle(format!(
                            "invalid route template {pattern}: wildcard needs a name"
                        )));
                    }
                    segments.push(Segment::Wildcard(name.to_string()));
                    has_wildcard = true;
                } else if inner.is_empty() {
                    return Err(DispatchError::Lifecycle(format!(
                        "invalid route template {pattern}: empty parameter at segment {i}"
                    )));
                } else {
                    segments.push(Segment::Param(inner.to_string()));
                }
            } else {
                segments.push(Segment::Literal(raw.to_string()));
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            operation: operation.into(),
            segments,
            has_wildcard,
        })
    }

    pub fn has_wildcard(&self) -> bool {
        self.has_wildcard
    }

    /// Match a path, producing bound parameters on a full match.
    /// Literals compare case-insensitively, wire convention.
    pub fn match_path(&self, path: &str) -> Option<Vec<(String, String)>> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Vec::new();
        let mut pos = 0;

        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => {
                    let part = parts.get(pos)?;
                    if !part.eq_ignore_ascii_case(lit) {
                        return None;
                    }
                    pos += 1;
                }
                Segment::Param(name) => {
                    let part = parts.get(pos)?;
                    params.push((name.clone(), (*part).to_string()));
                    pos += 1;
                }
                Segment::Wildcard(name) => {
                    params.push((name.clone(), parts[pos..].join("/")));
                    pos = parts.len();
                }
            }
        }

        if pos == parts.len() {
            Some(params)
        } else {
            None
        }
    }
}
