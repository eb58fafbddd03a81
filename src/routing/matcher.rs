//! Path template compilation and matching.
//!
//! # Responsibilities
//! - Compile `/literal/<int:n>/<name>/<path:rest>` templates into segment descriptors
//! - Match a raw request path against the descriptors, parsing typed placeholders
//! - Render a path from the same descriptors (reverse construction)
//!
//! # Design Decisions
//! - A placeholder occupies a whole segment; mixed segments are rejected at compile time
//! - `<path:..>` may only appear last and swallows the remaining segments
//! - Literal segments compare byte-for-byte against the raw (still encoded) path
//! - String values are percent-decoded on match and percent-encoded on render

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use super::{ParamValue, Params, RoutingError};

/// Characters that cannot appear raw inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Declared type of a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// Non-negative decimal integer.
    Int,
    /// One non-empty segment.
    Str,
    /// Remainder of the path, slashes included.
    Path,
}

impl Placeholder {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "int" => Some(Placeholder::Int),
            "string" => Some(Placeholder::Str),
            "path" => Some(Placeholder::Path),
            _ => None,
        }
    }
}

/// One compiled template segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param { name: String, kind: Placeholder },
}

/// A compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Compile a template string.
    pub fn compile(template: &str) -> Result<Self, RoutingError> {
        let malformed = |reason: &str| {
            RoutingError::ConfigurationError(format!("template '{}': {}", template, reason))
        };

        let Some(rest) = template.strip_prefix('/') else {
            return Err(malformed("must start with '/'"));
        };

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for raw in rest.split('/') {
                if raw.is_empty() {
                    return Err(malformed("empty segment"));
                }
                segments.push(compile_segment(raw).map_err(|reason| malformed(&reason))?);
            }
        }

        let mut seen: Vec<&str> = Vec::new();
        for (i, segment) in segments.iter().enumerate() {
            if let Segment::Param { name, kind } = segment {
                if seen.contains(&name.as_str()) {
                    return Err(malformed(&format!("duplicate placeholder '{}'", name)));
                }
                if *kind == Placeholder::Path && i + 1 != segments.len() {
                    return Err(malformed("<path:..> must be the last segment"));
                }
                seen.push(name);
            }
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// The template as written at registration.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholders in declaration order.
    pub fn placeholders(&self) -> impl Iterator<Item = (&str, Placeholder)> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param { name, kind } => Some((name.as_str(), *kind)),
            Segment::Literal(_) => None,
        })
    }

    /// Match a raw request path. Returns the typed parameters on success.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let rest = path.strip_prefix('/')?;
        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };

        let mut params = Params::new();
        let mut idx = 0;

        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => {
                    if *parts.get(idx)? != lit.as_str() {
                        return None;
                    }
                    idx += 1;
                }
                Segment::Param { name, kind: Placeholder::Int } => {
                    let raw = parts.get(idx)?;
                    params.insert(name.as_str(), parse_int(raw)?);
                    idx += 1;
                }
                Segment::Param { name, kind: Placeholder::Str } => {
                    let raw = parts.get(idx)?;
                    if raw.is_empty() {
                        return None;
                    }
                    params.insert(name.as_str(), decode(raw)?);
                    idx += 1;
                }
                Segment::Param { name, kind: Placeholder::Path } => {
                    if idx >= parts.len() {
                        return None;
                    }
                    let remainder = parts[idx..].join("/");
                    if remainder.is_empty() {
                        return None;
                    }
                    params.insert(name.as_str(), decode(&remainder)?);
                    idx = parts.len();
                }
            }
        }

        (idx == parts.len()).then_some(params)
    }

    /// Render a path with every placeholder substituted.
    ///
    /// Fails with a human-readable reason when a placeholder is missing,
    /// a value has the wrong type, or an unknown parameter is supplied.
    pub fn render(&self, params: &Params) -> Result<String, String> {
        for (name, _) in params.iter() {
            if !self.placeholders().any(|(p, _)| p == name) {
                return Err(format!("unknown parameter '{}'", name));
            }
        }

        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Literal(lit) => out.push_str(lit),
                Segment::Param { name, kind } => {
                    let value = params
                        .get(name)
                        .ok_or_else(|| format!("missing parameter '{}'", name))?;
                    match (kind, value) {
                        (Placeholder::Int, ParamValue::Int(v)) => out.push_str(&v.to_string()),
                        (Placeholder::Str, ParamValue::Str(s)) if !s.is_empty() => {
                            out.extend(utf8_percent_encode(s, SEGMENT));
                        }
                        (Placeholder::Path, ParamValue::Str(s)) if !s.is_empty() => {
                            let encoded: Vec<String> = s
                                .split('/')
                                .map(|piece| utf8_percent_encode(piece, SEGMENT).to_string())
                                .collect();
                            out.push_str(&encoded.join("/"));
                        }
                        (kind, value) => {
                            return Err(format!(
                                "parameter '{}' value {:?} does not fit {:?} placeholder",
                                name, value, kind
                            ));
                        }
                    }
                }
            }
        }

        if out.is_empty() {
            out.push('/');
        }
        Ok(out)
    }
}

fn compile_segment(raw: &str) -> Result<Segment, String> {
    let Some(inner) = raw.strip_prefix('<') else {
        if raw.contains('<') || raw.contains('>') {
            return Err(format!("unbalanced placeholder syntax in '{}'", raw));
        }
        return Ok(Segment::Literal(raw.to_string()));
    };

    let Some(inner) = inner.strip_suffix('>') else {
        return Err(format!("unbalanced placeholder syntax in '{}'", raw));
    };
    if inner.contains('<') || inner.contains('>') {
        return Err(format!("unbalanced placeholder syntax in '{}'", raw));
    }

    let (kind, name) = match inner.split_once(':') {
        Some((tag, name)) => {
            let kind = Placeholder::from_tag(tag)
                .ok_or_else(|| format!("unknown placeholder type '{}'", tag))?;
            (kind, name)
        }
        None => (Placeholder::Str, inner),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("invalid placeholder name '{}'", name));
    }

    Ok(Segment::Param {
        name: name.to_string(),
        kind,
    })
}

fn parse_int(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn decode(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_segments() {
        let t = PathTemplate::compile("/links/<int:n>/<int:offset>").unwrap();
        assert_eq!(
            t.segments(),
            &[
                Segment::Literal("links".into()),
                Segment::Param { name: "n".into(), kind: Placeholder::Int },
                Segment::Param { name: "offset".into(), kind: Placeholder::Int },
            ]
        );

        let root = PathTemplate::compile("/").unwrap();
        assert!(root.segments().is_empty());
    }

    #[test]
    fn test_compile_rejects_malformed() {
        for bad in [
            "links",
            "/links/<int:n",
            "/links/int:n>",
            "/links/<float:n>",
            "/a//b",
            "/file-<int:n>",
            "/<path:p>/tail",
            "/<a>/<a>",
            "/<int:>",
        ] {
            assert!(
                matches!(PathTemplate::compile(bad), Err(RoutingError::ConfigurationError(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_int_placeholder_parses() {
        let t = PathTemplate::compile("/redirect/<int:n>").unwrap();
        assert_eq!(t.matches("/redirect/3"), Some(Params::new().with("n", 3u64)));
        assert_eq!(t.matches("/redirect/-3"), None);
        assert_eq!(t.matches("/redirect/three"), None);
        assert_eq!(t.matches("/redirect/"), None);
        assert_eq!(t.matches("/redirect/99999999999999999999999"), None);
        assert_eq!(t.matches("/redirect/3/4"), None);
    }

    #[test]
    fn test_string_placeholder_decodes() {
        let t = PathTemplate::compile("/cookies/set/<name>/<value>").unwrap();
        let params = t.matches("/cookies/set/k/a%20b").unwrap();
        assert_eq!(params.str("name"), Some("k"));
        assert_eq!(params.str("value"), Some("a b"));
        assert_eq!(t.matches("/cookies/set/k"), None);
    }

    #[test]
    fn test_path_placeholder_takes_remainder() {
        let t = PathTemplate::compile("/files/<path:rest>").unwrap();
        let params = t.matches("/files/a/b/c").unwrap();
        assert_eq!(params.str("rest"), Some("a/b/c"));
        assert_eq!(t.matches("/files"), None);
        assert_eq!(t.matches("/files/"), None);
    }

    #[test]
    fn test_root_and_trailing_slash() {
        let root = PathTemplate::compile("/").unwrap();
        assert!(root.matches("/").is_some());
        assert!(root.matches("/get").is_none());

        let get = PathTemplate::compile("/get").unwrap();
        assert!(get.matches("/get").is_some());
        assert!(get.matches("/get/").is_none());
    }

    #[test]
    fn test_render_canonical() {
        let t = PathTemplate::compile("/links/<int:n>/<int:offset>").unwrap();
        let path = t
            .render(&Params::new().with("n", 10u64).with("offset", 0u64))
            .unwrap();
        assert_eq!(path, "/links/10/0");

        let s = PathTemplate::compile("/cookies/set/<name>/<value>").unwrap();
        let path = s
            .render(&Params::new().with("name", "a/b").with("value", "x y"))
            .unwrap();
        assert_eq!(path, "/cookies/set/a%2Fb/x%20y");
        assert_eq!(
            s.matches(&path),
            Some(Params::new().with("name", "a/b").with("value", "x y"))
        );
    }

    #[test]
    fn test_render_rejects_mismatch() {
        let t = PathTemplate::compile("/redirect/<int:n>").unwrap();
        assert!(t.render(&Params::new()).is_err());
        assert!(t.render(&Params::new().with("n", "two")).is_err());
        assert!(t.render(&Params::new().with("n", 2u64).with("x", 1u64)).is_err());
    }
}
