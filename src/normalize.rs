//! URL path normalization for consistent cache-key construction.
//!
//! Every path that enters the cache or the matcher goes through
//! [`normalize`] first, so `/users//42/`, `users/42` and `/users/42` all
//! produce the same cache key.

/// Canonicalize a URL path.
///
/// - Empty input becomes `"/"`.
/// - Runs of consecutive `/` collapse into a single `/`.
/// - The result always has a leading `/`.
/// - A single trailing `/` is stripped unless the result is the root.
///
/// The function is pure, total, and idempotent.
pub fn normalize(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    let mut prev_slash = true;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push('/');
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }

    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }

    out
}
