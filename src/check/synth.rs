//! Dummy-value synthesis for simulated calls.

use crate::program::Value;

/// Placeholder used for path- and file-like parameters.
pub const PLACEHOLDER_FILE: &str = "dummy.txt";
/// Placeholder used when no heuristic matches.
pub const PLACEHOLDER_STR: &str = "x";

/// Produce a stand-in argument from a parameter name alone.
///
/// Substring heuristics, first match wins. Type annotations are not consulted.
pub fn synthesize(param_name: &str) -> Value {
    let name = param_name.to_lowercase();
    if name.contains("path") || name.contains("file") {
        return Value::Str(PLACEHOLDER_FILE.to_string());
    }
    if name.contains("count") || name.contains("num") || name.contains("id") {
        return Value::Int(1);
    }
    if name.contains("flag") || name.starts_with("is_") {
        return Value::Bool(true);
    }
    Value::Str(PLACEHOLDER_STR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristics() {
        assert_eq!(synthesize("config_path"), Value::Str("dummy.txt".into()));
        assert_eq!(synthesize("Filename"), Value::Str("dummy.txt".into()));
        assert_eq!(synthesize("retry_count"), Value::Int(1));
        assert_eq!(synthesize("user_id"), Value::Int(1));
        assert_eq!(synthesize("verbose_flag"), Value::Bool(true));
        assert_eq!(synthesize("is_ready"), Value::Bool(true));
        assert_eq!(synthesize("x"), Value::Str("x".into()));
    }

    #[test]
    fn test_priority_order() {
        // "profile_id" contains "file" before "id" is considered
        assert_eq!(synthesize("profile_id"), Value::Str("dummy.txt".into()));
        // "is_numeric" hits "num" first
        assert_eq!(synthesize("is_numeric"), Value::Int(1));
    }
}
