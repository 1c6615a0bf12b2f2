/// Identity key for an element name: trimmed and lower-cased.
#[inline]
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Display spelling for a key that never appeared with its own casing (first letter upper-cased).
pub fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Mud "), "mud");
        assert_eq!(normalize("SOLAR System"), "solar system");
    }

    #[test]
    fn capitalize_only_touches_first_char() {
        assert_eq!(capitalize("solar system"), "Solar system");
        assert_eq!(capitalize(""), "");
    }
}
