//! Path pattern matching.
//!
//! # Responsibilities
//! - Parse express-style paths (`/users/:id`) into segments
//! - Match a request path exactly (routes) or by segment prefix (mounted middlewares)
//! - Join mount paths with child segments
//!
//! # Design Decisions
//! - Matching is case-sensitive and segment based: `/api` is a prefix of `/api/x`, not of `/apix`
//! - Empty segments are ignored, so `//a/` and `/a` are the same path
//! - No regex in the request path; patterns compile once at registration

use std::fmt;

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(path: &str) -> Self {
        let segments = split(path)
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                _ => Segment::Literal(segment.to_string()),
            })
            .collect();
        Self {
            raw: join_paths("/", path),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match the whole path; returns captured parameters.
    pub fn match_exact(&self, path: &str) -> Option<Map<String, Value>> {
        let parts: Vec<&str> = split(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        self.capture(&parts)
    }

    /// Match a leading run of segments; returns captured parameters.
    pub fn match_prefix(&self, path: &str) -> Option<Map<String, Value>> {
        let parts: Vec<&str> = split(path).collect();
        if parts.len() < self.segments.len() {
            return None;
        }
        self.capture(&parts[..self.segments.len()])
    }

    fn capture(&self, parts: &[&str]) -> Option<Map<String, Value>> {
        let mut params = Map::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), Value::String((*part).to_string()));
                }
            }
        }
        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Join a mount path and a child path into a normalized absolute path.
pub fn join_paths(base: &str, path: &str) -> String {
    let segments: Vec<&str> = split(base).chain(split(path)).collect();
    format!("/{}", segments.join("/"))
}
