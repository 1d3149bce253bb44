//! Filter predicates.

use crate::collation::fold_case;
use crate::item::Titled;

/// Case-insensitive substring match of `query` within the item's title.
///
/// Both sides are case-folded with Unicode full folding. An empty query
/// matches every item.
pub fn title_contains<T: Titled>(query: &str, item: &T) -> bool {
    if query.is_empty() {
        return true;
    }
    fold_case(item.title()).contains(&fold_case(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;

    #[test]
    fn test_empty_query_matches_all() {
        assert!(title_contains("", &Item::with_title("anything")));
        assert!(title_contains("", &Item::with_title("")));
    }

    #[test]
    fn test_case_insensitive_substring() {
        let apple = Item::with_title("Apple");
        assert!(title_contains("ap", &apple));
        assert!(title_contains("PPL", &apple));
        assert!(!title_contains("apricot", &apple));
        assert!(!title_contains("ap", &Item::with_title("banana")));
    }

    #[test]
    fn test_folding_beyond_ascii() {
        assert!(title_contains("STRASSE", &Item::with_title("Hauptstraße")));
        assert!(title_contains("ÉCOLE", &Item::with_title("petite école")));
    }

    #[test]
    fn test_generated_titles_match_lower_case_hex() {
        let item = Item::new();
        let fragment = item.title()[..8].to_lowercase();
        assert!(title_contains(&fragment, &item));
    }
}
