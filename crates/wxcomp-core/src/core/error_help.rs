use crate::core::WxcError;

/// Provides helpful suggestions for common errors
pub trait ErrorHelp {
    fn help(&self) -> Option<String>;
}

impl ErrorHelp for WxcError {
    fn help(&self) -> Option<String> {
        match self {
            WxcError::Config(msg) => {
                if msg.contains("wxcomp.yaml not found") || msg.contains("Could not find wxcomp.yaml") {
                    Some(
                        "💡 Suggestion: Create a wxcomp.yaml at the project root, or pass --config <path>"
                            .to_string(),
                    )
                } else if msg.contains("Duplicate prefix") {
                    Some(
                        "💡 Suggestion: Give every pattern its own prefix; generated component names are namespaced by it"
                            .to_string(),
                    )
                } else if msg.contains("Invalid prefix") {
                    Some(
                        "💡 Suggestion: Prefixes are lowercase tag names such as 'van' or 'my-ui'"
                            .to_string(),
                    )
                } else if msg.contains("at least one pattern") {
                    Some(
                        "💡 Suggestion: Add a 'patterns' list with { module, prefix } entries"
                            .to_string(),
                    )
                } else {
                    None
                }
            }
            WxcError::Manifest(msg) => {
                if msg.contains("not an object") {
                    Some(
                        "💡 Suggestion: 'usingComponents' must be a JSON object mapping names to paths"
                            .to_string(),
                    )
                } else {
                    None
                }
            }
            WxcError::Yaml(e) => {
                Some(format!(
                    "💡 Suggestion: Check your YAML syntax. Common issues:\n  - Missing colons after keys\n  - Incorrect indentation\n  - Unclosed quotes\n\nError details: {}",
                    e
                ))
            }
            WxcError::Json(_) => Some(
                "💡 Suggestion: Check the JSON file for unbalanced braces, missing commas or unquoted keys"
                    .to_string(),
            ),
            WxcError::Io(e) => {
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    Some(
                        "💡 Suggestion: Check file permissions on the output directory"
                            .to_string(),
                    )
                } else if e.kind() == std::io::ErrorKind::NotFound {
                    Some(
                        "💡 Suggestion: The file or directory may not exist. Run the build first, or check --output"
                            .to_string(),
                    )
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// Format an error with helpful suggestions
pub fn format_error_with_help(error: &WxcError) -> String {
    let mut output = format!("❌ Error: {}", error);

    if let Some(help) = error.help() {
        output.push_str("\n\n");
        output.push_str(&help);
    }

    output
}
