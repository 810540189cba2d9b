//! Helpers for client tool output.

/// Sanitize command output for inclusion in error messages.
///
/// Long lines are cut, only the first `max_lines` lines are kept, and the
/// whole message is capped so a noisy `psql` failure cannot flood the logs.
pub fn sanitize_output(output: &str, max_lines: usize) -> String {
    const MAX_LINE_LENGTH: usize = 200;
    const MAX_TOTAL_LENGTH: usize = 1000;

    let mut result = String::new();

    for line in output.lines().take(max_lines) {
        let truncated = if line.chars().count() > MAX_LINE_LENGTH {
            let cut: String = line.chars().take(MAX_LINE_LENGTH).collect();
            format!("{}...", cut)
        } else {
            line.to_string()
        };

        if result.len() + truncated.len() > MAX_TOTAL_LENGTH {
            result.push_str("...[truncated]");
            break;
        }

        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(&truncated);
    }

    if output.lines().count() > max_lines {
        result.push_str("\n...[additional output truncated]");
    }

    result
}

/// Split unaligned client output into its non-empty, trimmed lines.
pub fn output_lines(output: &str) -> impl Iterator<Item = &str> {
    output.lines().map(str::trim).filter(|line| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_output_short() {
        let output = "Hello\nWorld";
        let sanitized = sanitize_output(output, 10);
        assert_eq!(sanitized, "Hello\nWorld");
    }

    #[test]
    fn test_sanitize_output_truncates_lines() {
        let output = "Line 1\nLine 2\nLine 3\nLine 4\nLine 5";
        let sanitized = sanitize_output(output, 3);
        assert!(sanitized.contains("Line 3"));
        assert!(!sanitized.contains("Line 4"));
        assert!(sanitized.contains("[additional output truncated]"));
    }

    #[test]
    fn test_sanitize_output_truncates_long_lines() {
        let long_line = "x".repeat(300);
        let sanitized = sanitize_output(&long_line, 10);
        assert!(sanitized.len() < 300);
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn test_sanitize_output_multibyte() {
        let long_line = "ü".repeat(250);
        let sanitized = sanitize_output(&long_line, 1);
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn test_output_lines_skips_blanks() {
        let lines: Vec<&str> = output_lines("\n  1700000000 \n\n").collect();
        assert_eq!(lines, vec!["1700000000"]);
    }
}
