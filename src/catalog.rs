//! Static two-level taxonomy for support-ticket classification.

use once_cell::sync::Lazy;

/// Top-level categories with their ordered sub-category lists.
///
/// Order matters: `categories()` exposes it verbatim and training datasets
/// are labeled against these names.
static TAXONOMY: Lazy<Vec<(&'static str, Vec<&'static str>)>> = Lazy::new(|| {
    vec![
        (
            "Technical",
            vec!["Software", "Hardware", "Network", "Database", "API"],
        ),
        (
            "Billing",
            vec!["Payment", "Refund", "Invoice", "Subscription", "Pricing"],
        ),
        (
            "General",
            vec!["Information", "Question", "Feedback", "Other"],
        ),
        (
            "Feature Request",
            vec!["New Feature", "Enhancement", "Integration"],
        ),
        (
            "Bug Report",
            vec!["Critical", "Major", "Minor", "Cosmetic"],
        ),
        (
            "Account",
            vec!["Login", "Registration", "Profile", "Permissions"],
        ),
        (
            "Security",
            vec!["Vulnerability", "Access", "Privacy", "Compliance"],
        ),
    ]
});

/// Ordered list of top-level category names
pub fn categories() -> Vec<String> {
    TAXONOMY.iter().map(|(name, _)| name.to_string()).collect()
}

/// Ordered sub-categories for a category, case-insensitive lookup.
///
/// Unrecognized categories map to the single-entry `["General"]` list.
pub fn sub_categories(category: &str) -> Vec<String> {
    let wanted = category.trim().to_lowercase();
    TAXONOMY
        .iter()
        .find(|(name, _)| name.to_lowercase() == wanted)
        .map(|(_, subs)| subs.iter().map(|s| s.to_string()).collect())
        .unwrap_or_else(|| vec!["General".to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_ordered() {
        let cats = categories();
        assert_eq!(cats[0], "Technical");
        assert_eq!(cats[1], "Billing");
        assert_eq!(cats.len(), 7);
    }

    #[test]
    fn test_sub_categories_idempotent() {
        let expected = vec!["Software", "Hardware", "Network", "Database", "API"];
        for _ in 0..3 {
            assert_eq!(sub_categories("Technical"), expected);
        }
    }

    #[test]
    fn test_sub_categories_case_insensitive() {
        let expected = vec!["Payment", "Refund", "Invoice", "Subscription", "Pricing"];
        assert_eq!(sub_categories("billing"), expected);
        assert_eq!(sub_categories("BILLING"), expected);
        assert_eq!(sub_categories("Billing"), expected);
    }

    #[test]
    fn test_unknown_category_defaults_to_general() {
        assert_eq!(sub_categories("unknown-xyz"), vec!["General"]);
    }
}
