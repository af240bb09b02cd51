/// Items this short (in characters) are recognition noise, not list entries.
pub const MIN_ITEM_CHARS: usize = 2;

/// Normalize recognized text into a list-item string.
/// Lowercases, keeps ASCII letters, digits, space and `. , ( ) / \ -`,
/// then collapses whitespace runs and trims.
pub fn normalize_item_text(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '.' | ',' | '(' | ')' | '/' | '\\' | '-' | ' ')
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a normalized string is long enough to keep as a line item.
pub fn is_usable_item(normalized: &str) -> bool {
    normalized.chars().count() >= MIN_ITEM_CHARS
}

/// Normalize and keep only usable items, preserving order.
pub fn normalize_items<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|s| normalize_item_text(s.as_ref()))
        .filter(|s| is_usable_item(s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn in_allow_set(c: char) -> bool {
        c.is_ascii_lowercase()
            || c.is_ascii_digit()
            || matches!(c, '.' | ',' | '(' | ')' | '/' | '\\' | '-' | ' ')
    }

    #[test]
    fn strips_punctuation_and_lowercases() {
        assert_eq!(normalize_item_text("  2 Apples!!  "), "2 apples");
    }

    #[test]
    fn keeps_quantity_punctuation() {
        assert_eq!(normalize_item_text("1.5lb Chicken (Thighs)"), "1.5lb chicken (thighs)");
        assert_eq!(normalize_item_text("Milk 1/2 gal - Organic"), "milk 1/2 gal - organic");
        assert_eq!(normalize_item_text("a\\b"), "a\\b");
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(normalize_item_text("green \t\t  beans\n"), "green beans");
    }

    #[test]
    fn drops_non_ascii_letters() {
        assert_eq!(normalize_item_text("Crème Brûlée"), "crme brle");
        assert_eq!(normalize_item_text("🍎 apple"), "apple");
    }

    #[test]
    fn removal_can_collapse_gaps() {
        // "x * y" → "x  y" after filtering, then collapsed.
        assert_eq!(normalize_item_text("eggs * 12"), "eggs 12");
    }

    #[test]
    fn output_only_contains_allowed_characters() {
        let samples = [
            "Ünïcödé & $ymbols #1!",
            "TAB\tSEPARATED\u{00A0}nbsp",
            "*** total: $12.99 ***",
            "Ça va? «oui» — 100%",
            "\u{0000}\u{0007}control",
        ];
        for sample in samples {
            let out = normalize_item_text(sample);
            assert!(out.chars().all(in_allow_set), "{sample:?} -> {out:?}");
            assert_eq!(out, out.trim());
            assert!(!out.contains("  "), "{out:?}");
        }
    }

    #[test]
    fn short_results_are_not_usable() {
        assert!(!is_usable_item(""));
        assert!(!is_usable_item("a"));
        assert!(is_usable_item("ab"));
    }

    #[test]
    fn normalize_items_filters_noise() {
        let items = normalize_items(["Bread", "!", "x", "  Eggs (12) "]);
        assert_eq!(items, vec!["bread", "eggs (12)"]);
    }

    proptest! {
        #[test]
        fn prop_normalized_text_is_canonical(raw in any::<String>()) {
            let out = normalize_item_text(&raw);
            prop_assert!(out.chars().all(in_allow_set), "{:?} -> {:?}", raw, out);
            prop_assert_eq!(out.trim(), out.as_str());
            prop_assert!(!out.contains("  "));
            prop_assert_eq!(normalize_item_text(&out), out.clone());
        }

        #[test]
        fn prop_normalize_items_keeps_only_usable(raw in prop::collection::vec(".{0,12}", 0..8)) {
            let items = normalize_items(&raw);
            prop_assert!(items.len() <= raw.len());
            prop_assert!(items.iter().all(|i| is_usable_item(i)));
        }
    }
}
