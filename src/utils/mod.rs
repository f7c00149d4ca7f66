/// Replaces characters that are unsafe in file names on common
/// filesystems with underscores, collapsing leading/trailing whitespace.
pub fn sanitize_file_name(name: &str) -> String {
    const UNSAFE: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'];

    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| if UNSAFE.contains(&c) { '_' } else { c })
        .collect();

    if sanitized.is_empty() {
        "video".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("plain title"), "plain title");
        assert_eq!(sanitize_file_name("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_file_name("what? \"really\" <yes>"), "what_ _really_ _yes_");
        assert_eq!(sanitize_file_name("  padded  "), "padded");
        assert_eq!(sanitize_file_name(""), "video");
        assert_eq!(sanitize_file_name("///"), "___");
    }
}
