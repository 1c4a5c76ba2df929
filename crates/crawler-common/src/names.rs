//! Filesystem-safe names derived from test identities.

/// Upper bound on a sanitized name, keeping socket paths under the
/// 104/108 byte `sun_path` limit.
pub const MAX_SANITIZED_LEN: usize = 60;

/// Replaces every character outside `[A-Za-z0-9.-]` with `_` and truncates
/// the result to [`MAX_SANITIZED_LEN`] characters.
///
/// ```
/// use crawler_common::sanitize_name;
///
/// assert_eq!(sanitize_name("tests::open/sub case"), "tests__open_sub_case");
/// ```
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_SANITIZED_LEN)
        .collect()
}
