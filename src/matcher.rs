//! Fuzzy route matching for path-parameterized templates.
//!
//! Route templates like `/users/{id}/roles` cannot be resolved by exact
//! lookup. The matcher turns a stored template into a per-segment predicate
//! against a concrete request path: every `{name}` placeholder matches
//! exactly one non-empty path segment and never crosses a `/` boundary, so
//! `/users/6/roles` does not match a template `/users/{id}` intended for a
//! shorter route.

use crate::normalize::normalize;

/// Check whether a concrete request path matches a stored route template.
///
/// Both inputs are normalized first. Templates without placeholders only
/// match by string equality. Templates with malformed placeholder syntax
/// (unbalanced braces, empty `{}`) match nothing; the function never panics.
pub fn route_matches(concrete_path: &str, route_template: &str) -> bool {
    let path = normalize(concrete_path);
    let template = normalize(route_template);

    // No placeholder: only exact equality can match.
    if !template.contains('{') {
        return path == template;
    }

    let path_segments: Vec<&str> = path.split('/').skip(1).collect();
    let template_segments: Vec<&str> = template.split('/').skip(1).collect();

    if path_segments.len() != template_segments.len() {
        return false;
    }

    for (path_seg, template_seg) in path_segments.iter().zip(template_segments.iter()) {
        match classify_segment(template_seg) {
            TemplateSegment::Literal(literal) => {
                if *path_seg != literal {
                    return false;
                }
            }
            TemplateSegment::Placeholder => {
                if path_seg.is_empty() {
                    return false;
                }
            }
            TemplateSegment::Malformed => return false,
        }
    }

    true
}

enum TemplateSegment<'a> {
    Literal(&'a str),
    Placeholder,
    Malformed,
}

fn classify_segment(segment: &str) -> TemplateSegment<'_> {
    if !segment.contains('{') && !segment.contains('}') {
        return TemplateSegment::Literal(segment);
    }
    // A well-formed placeholder is a whole segment: `{identifier}`.
    if segment.len() > 2
        && segment.starts_with('{')
        && segment.ends_with('}')
        && !segment[1..segment.len() - 1].contains(['{', '}'])
    {
        TemplateSegment::Placeholder
    } else {
        TemplateSegment::Malformed
    }
}
