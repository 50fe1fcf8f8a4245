//! Identifier normalization.

/// Map an arbitrary identifier onto a schema-safe token.
///
/// The string is lowercased, `-`, `.`, `:` and spaces become `_`, and `*`
/// becomes the word `all`. Any other character outside `[a-z0-9_]` also
/// becomes `_`, so the result is always usable as a relation or type name.
///
/// ```
/// use bootstrap_schema::normalize::normalize_name;
///
/// assert_eq!(normalize_name("Billing-Service"), "billing_service");
/// assert_eq!(normalize_name("*"), "all");
/// assert_eq!(normalize_name("hosts:read"), "hosts_read");
/// ```
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.to_lowercase().chars() {
        match ch {
            '*' => out.push_str("all"),
            'a'..='z' | '0'..='9' | '_' => out.push(ch),
            _ => out.push('_'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases() {
        assert_eq!(normalize_name("Invoice"), "invoice");
        assert_eq!(normalize_name("ALL_CAPS"), "all_caps");
    }

    #[test]
    fn test_separators() {
        assert_eq!(normalize_name("cost-management"), "cost_management");
        assert_eq!(normalize_name("a.b:c d"), "a_b_c_d");
    }

    #[test]
    fn test_each_separator_maps_individually() {
        assert_eq!(normalize_name("a--b"), "a__b");
    }

    #[test]
    fn test_star_becomes_all() {
        assert_eq!(normalize_name("*"), "all");
        assert_eq!(normalize_name("read*"), "readall");
    }

    #[test]
    fn test_other_characters() {
        assert_eq!(normalize_name("a/b@c"), "a_b_c");
        assert_eq!(normalize_name("café"), "caf_");
    }

    #[test]
    fn test_idempotent() {
        for input in ["Billing-Service", "x.y", "*", "plain"] {
            let once = normalize_name(input);
            assert_eq!(normalize_name(&once), once);
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(normalize_name(""), "");
    }
}
