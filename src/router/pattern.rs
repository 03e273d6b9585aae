//! Route compilation: path templates such as `/users/:id` into matchers.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path template.
///
/// Templates are split on `/`. A segment starting with `:` captures one
/// non-empty path segment under the name that follows the colon; every other
/// segment, including an empty one, must match byte-for-byte. Matching is
/// anchored: the candidate path must have exactly as many segments as the
/// template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    template: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Compile a template. Any string is accepted.
    pub fn compile(template: &str) -> Self {
        let segments = template
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();

        Self {
            template: template.to_string(),
            segments,
        }
    }

    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Parameter names in left-to-right order. Duplicates are kept.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Param(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Whether the template has any parameter segments.
    pub fn is_dynamic(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Param(_)))
    }

    /// Match a concrete path, returning the captured parameters on success.
    ///
    /// If a name appears twice in the template the last capture wins.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let mut parts = path.split('/');
        let mut params = HashMap::new();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), part.to_string());
                }
            }
        }

        // The path has more segments than the template
        if parts.next().is_some() {
            return None;
        }

        Some(params)
    }
}
