//! Embedded prompts
//!
//! Compiled into the binary from the .pmt files at build time.

/// Grounding rules plus the exemplar
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// Context block plus the query
pub const USER: &str = include_str!("../../prompts/user.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    match name {
        "system" => Some(SYSTEM),
        "user" => Some(USER),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded() {
        assert!(get_embedded("system").unwrap().contains("{{exemplar_json}}"));
        assert!(get_embedded("user").unwrap().contains("{{context}}"));
        assert!(get_embedded("nonexistent").is_none());
    }
}
