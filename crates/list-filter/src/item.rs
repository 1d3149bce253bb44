//! Items shown in the list.

use std::fmt;
use std::hash::{Hash, Hasher};

use uuid::Uuid;

/// Anything with a display title that sort rules and predicates can read.
pub trait Titled {
    /// The display title.
    fn title(&self) -> &str;
}

/// An immutable list entry with a stable identity.
///
/// Equality and hashing use the identifier only, so two items whose titles
/// happen to match are still distinct.
#[derive(Debug, Clone)]
pub struct Item {
    id: Uuid,
    title: String,
}

impl Item {
    /// Create an item with a fresh identifier, titled by that identifier.
    pub fn new() -> Self {
        let id = Uuid::new_v4();
        let title = id
            .hyphenated()
            .encode_upper(&mut Uuid::encode_buffer())
            .to_owned();
        Self { id, title }
    }

    /// Create an item with a fresh identifier and an explicit title.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
        }
    }

    /// Create an item from a known identifier and title.
    pub fn from_parts(id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl Default for Item {
    fn default() -> Self {
        Self::new()
    }
}

impl Titled for Item {
    fn title(&self) -> &str {
        &self.title
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_title_is_upper_case_id() {
        let item = Item::new();
        assert_eq!(item.title(), item.id().to_string().to_uppercase());
        assert_eq!(item.title().len(), 36);
    }

    #[test]
    fn test_identity_not_title() {
        let a = Item::with_title("Apple");
        let b = Item::with_title("Apple");
        assert_ne!(a, b);

        let same = Item::from_parts(a.id(), "Renamed");
        assert_eq!(a, same);

        let set: HashSet<_> = [a.clone(), b, same].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_display_uses_title() {
        assert_eq!(Item::with_title("Apricot").to_string(), "Apricot");
    }
}
