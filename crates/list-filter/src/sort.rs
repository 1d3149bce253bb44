//! The closed set of sort rules.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::collation::with_system_collator;
use crate::error::FilterError;
use crate::item::Titled;

/// A pure ordering over items, used by the pipeline to sort its view.
///
/// Implementations must be total orders; ties keep their input order because
/// [`sort`](Comparator::sort) is stable.
pub trait Comparator<T>: Send + Sync + 'static {
    fn compare(&self, a: &T, b: &T) -> Ordering;

    /// Stable in-place sort.
    fn sort(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

/// How the list is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortRule {
    /// By title, A to Z in the system locale's collation.
    #[default]
    TitleAscending,
    /// By title, Z to A.
    TitleDescending,
}

impl SortRule {
    /// Every rule, in menu order.
    pub const ALL: [SortRule; 2] = [SortRule::TitleAscending, SortRule::TitleDescending];

    /// Stable machine name, accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Self::TitleAscending => "title-ascending",
            Self::TitleDescending => "title-descending",
        }
    }

    /// The other direction.
    pub fn toggled(self) -> Self {
        match self {
            Self::TitleAscending => Self::TitleDescending,
            Self::TitleDescending => Self::TitleAscending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::TitleAscending => ordering,
            Self::TitleDescending => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TitleAscending => f.write_str("Title, Ascending"),
            Self::TitleDescending => f.write_str("Title, Descending"),
        }
    }
}

impl FromStr for SortRule {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title-ascending" | "title-asc" | "asc" => Ok(Self::TitleAscending),
            "title-descending" | "title-desc" | "desc" => Ok(Self::TitleDescending),
            _ => Err(FilterError::invalid_sort_rule(s)),
        }
    }
}

impl<T: Titled> Comparator<T> for SortRule {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        with_system_collator(|collator| self.apply(collator.compare(a.title(), b.title())))
    }

    fn sort(&self, items: &mut [T]) {
        // One collator lookup for the whole sort.
        with_system_collator(|collator| {
            items.sort_by(|a, b| self.apply(collator.compare(a.title(), b.title())));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;

    fn titles(items: &[Item]) -> Vec<&str> {
        items.iter().map(Item::title).collect()
    }

    #[test]
    fn test_ascending_and_descending() {
        let mut items = vec![
            Item::with_title("Apple"),
            Item::with_title("banana"),
            Item::with_title("Apricot"),
        ];

        SortRule::TitleAscending.sort(&mut items);
        assert_eq!(titles(&items), vec!["Apple", "Apricot", "banana"]);

        SortRule::TitleDescending.sort(&mut items);
        assert_eq!(titles(&items), vec!["banana", "Apricot", "Apple"]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let first = Item::with_title("Same");
        let second = Item::with_title("Same");
        let mut items = vec![first.clone(), Item::with_title("Other"), second.clone()];

        for rule in SortRule::ALL {
            let mut sorted = items.clone();
            rule.sort(&mut sorted);
            let ties: Vec<_> = sorted.iter().filter(|i| i.title() == "Same").cloned().collect();
            assert_eq!(ties, vec![first.clone(), second.clone()], "{rule}");
        }

        items.reverse();
        SortRule::TitleAscending.sort(&mut items);
        assert_eq!(items[1], second);
        assert_eq!(items[2], first);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("asc".parse::<SortRule>(), Ok(SortRule::TitleAscending));
        assert_eq!("Title-Desc".parse::<SortRule>(), Ok(SortRule::TitleDescending));
        for rule in SortRule::ALL {
            assert_eq!(rule.name().parse::<SortRule>(), Ok(rule));
        }
        assert_eq!(
            "size".parse::<SortRule>(),
            Err(FilterError::InvalidSortRule("size".into()))
        );
    }

    #[test]
    fn test_toggle_and_display() {
        assert_eq!(SortRule::default(), SortRule::TitleAscending);
        assert_eq!(SortRule::TitleAscending.toggled(), SortRule::TitleDescending);
        assert_eq!(SortRule::TitleDescending.to_string(), "Title, Descending");
    }
}
