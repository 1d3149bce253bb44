//! Locale-aware title comparison and case folding.
//!
//! Titles are compared with an ICU4X collator for the system locale, so
//! "apple" sorts next to "Apple" instead of after every upper-case title.
//! Each thread builds its collator lazily on first use.

use std::cell::OnceCell;
use std::cmp::Ordering;
use std::fmt;

use icu::casemap::CaseMapper;
use icu::collator::options::CollatorOptions;
use icu::collator::{Collator, CollatorBorrowed};
use icu::locale::{Locale, locale};
use list_filter_core::logging::targets;

/// Locale used when the system locale is unknown or unsupported.
pub const FALLBACK_LOCALE: &str = "en-US";

/// The current system locale as a BCP 47 identifier.
pub fn system_locale() -> String {
    sys_locale::get_locale().unwrap_or_else(|| FALLBACK_LOCALE.to_string())
}

/// Compares titles according to one locale's collation rules.
pub struct TitleCollator {
    locale: Locale,
    /// `None` when no collation data could be loaded.
    collator: Option<CollatorBorrowed<'static>>,
}

impl TitleCollator {
    /// Create a collator for the system locale.
    pub fn system() -> Self {
        Self::for_locale(&system_locale())
    }

    /// Create a collator for a BCP 47 locale identifier.
    ///
    /// Unparseable identifiers fall back to [`FALLBACK_LOCALE`].
    pub fn for_locale(tag: &str) -> Self {
        let locale: Locale = tag.parse().unwrap_or_else(|_| {
            tracing::debug!(target: targets::COLLATION, tag, "unparseable locale, using fallback");
            locale!("en-US")
        });

        let collator = match Collator::try_new(locale.clone().into(), CollatorOptions::default()) {
            Ok(collator) => Some(collator),
            Err(err) => {
                tracing::warn!(
                    target: targets::COLLATION,
                    locale = %locale,
                    error = %err,
                    "no collation data, comparing lower-cased titles"
                );
                None
            }
        };

        Self { locale, collator }
    }

    /// The locale this collator follows.
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Whether real collation data backs this collator.
    pub fn is_locale_aware(&self) -> bool {
        self.collator.is_some()
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
        }
    }
}

impl fmt::Debug for TitleCollator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TitleCollator")
            .field("locale", &self.locale.to_string())
            .field("locale_aware", &self.is_locale_aware())
            .finish()
    }
}

thread_local! {
    static SYSTEM_COLLATOR: OnceCell<TitleCollator> = const { OnceCell::new() };
}

/// Run `f` with this thread's system-locale collator.
pub fn with_system_collator<R>(f: impl FnOnce(&TitleCollator) -> R) -> R {
    SYSTEM_COLLATOR.with(|cell| f(cell.get_or_init(TitleCollator::system)))
}

/// Compare two titles with the system locale's collation.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    with_system_collator(|collator| collator.compare(a, b))
}

/// Full Unicode case folding, for case-insensitive matching.
pub fn fold_case(text: &str) -> String {
    CaseMapper::new().fold_string(text).to_string()
}
