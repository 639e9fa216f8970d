use sha1::{Digest, Sha1};

/// Clean a raw question title: drop required-field asterisks, collapse
/// whitespace, and strip a trailing colon.
pub fn normalize_label(raw: &str) -> String {
    let without_marks: String = raw.chars().filter(|c| *c != '*').collect();
    let collapsed = without_marks.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches([':', '：'])
        .trim()
        .to_string()
}

/// Comparison key for labels and profile keys: lowercase, separators
/// (`_`, `-`, `.`, whitespace) removed.
pub fn match_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '_' | '-' | '.' | '*' | ':'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Stable identity of a form view, derived from its question labels.
pub fn form_fingerprint(labels: &[String]) -> String {
    let mut hasher = Sha1::new();
    for label in labels {
        hasher.update(label.to_lowercase().as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_required_marker_and_colon() {
        assert_eq!(normalize_label("  Email   address *"), "Email address");
        assert_eq!(normalize_label("First name:"), "First name");
        assert_eq!(normalize_label("*"), "");
    }

    #[test]
    fn match_key_ignores_case_and_separators() {
        assert_eq!(match_key("First_Name"), match_key("first name"));
        assert_eq!(match_key("E-mail"), "email");
    }

    #[test]
    fn fingerprint_is_order_sensitive_and_case_blind() {
        let a = form_fingerprint(&["Email".into(), "Name".into()]);
        let b = form_fingerprint(&["email".into(), "name".into()]);
        let c = form_fingerprint(&["Name".into(), "Email".into()]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 40);
    }
}
