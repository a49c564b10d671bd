use std::env;

/// True if the env var is present and is one of "1", "true", "yes", or "y" (case-insensitive).
/// False otherwise.
pub fn env_flag(name: &str) -> bool {
    env::var(name).map(|v| is_truthy(&v)).unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "y")
}
