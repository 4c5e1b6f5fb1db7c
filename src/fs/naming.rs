//! Filename generation and manipulation.

/// Name used when a title sanitizes to nothing.
pub const UNTITLED: &str = "untitled";

/// Longest title shown unabridged in progress bars and listings.
const DISPLAY_TITLE_MAX: usize = 60;

const MAX_EXTENSION_LEN: usize = 5;

/// Sanitize a title into a filename by replacing invalid characters.
///
/// Path separators, reserved characters, NUL and control characters become
/// `_`. A title that is empty or whitespace-only after sanitizing becomes
/// [`UNTITLED`].
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim();
    // A bare "." or ".." would resolve to a directory, not a file
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        return UNTITLED.to_string();
    }

    sanitized
}

/// Normalize a container extension, rejecting anything that is not a short
/// alphanumeric token.
pub fn sanitize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.');
    let valid = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}

/// Shorten a title for display, keeping whole characters.
pub fn display_title(title: &str) -> String {
    if title.chars().count() <= DISPLAY_TITLE_MAX {
        return title.to_string();
    }

    let head: String = title.chars().take(DISPLAY_TITLE_MAX - 3).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_valid() {
        assert_eq!(sanitize_filename("normal clip"), "normal clip");
        assert_eq!(sanitize_filename("file:name"), "file_name");
        assert_eq!(
            sanitize_filename("file*with?special"),
            "file_with_special"
        );
    }

    #[test]
    fn test_sanitize_filename_replaces_every_reserved_char() {
        assert_eq!(sanitize_filename(r#"a/b\c:d*e?f"g<h>i|j"#), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn test_sanitize_filename_path_traversal() {
        assert_eq!(sanitize_filename("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_filename(".."), UNTITLED);
        assert_eq!(sanitize_filename("."), UNTITLED);
    }

    #[test]
    fn test_sanitize_filename_control_chars() {
        assert_eq!(sanitize_filename("file\0name"), "file_name");
        assert_eq!(sanitize_filename("tab\there"), "tab_here");
    }

    #[test]
    fn test_sanitize_filename_empty() {
        assert_eq!(sanitize_filename(""), UNTITLED);
        assert_eq!(sanitize_filename("   "), UNTITLED);
    }

    #[test]
    fn test_sanitize_extension() {
        assert_eq!(sanitize_extension("mp4"), Some("mp4".to_string()));
        assert_eq!(sanitize_extension(" .WebM"), Some("webm".to_string()));
        assert_eq!(sanitize_extension(""), None);
        assert_eq!(sanitize_extension("toolong"), None);
        assert_eq!(sanitize_extension("x/../../../tmp/evil"), None);
        assert_eq!(sanitize_extension("m\\p4"), None);
    }

    #[test]
    fn test_display_title() {
        assert_eq!(display_title("Short"), "Short");

        let exact = "x".repeat(60);
        assert_eq!(display_title(&exact), exact);

        let long = "y".repeat(61);
        let shown = display_title(&long);
        assert_eq!(shown.chars().count(), 60);
        assert!(shown.ends_with("..."));
        assert_eq!(&shown[..57], "y".repeat(57));
    }

    #[test]
    fn test_display_title_multibyte() {
        let long = "é".repeat(70);
        let shown = display_title(&long);
        assert_eq!(shown.chars().count(), 60);
    }
}
