use std::{borrow::Borrow, fmt};

/// Normalized coin identifier, e.g. `bitcoin`.
///
/// Always trimmed and lower-cased. Ids end up in request paths and are
/// joined with `,` in batched requests, so only ASCII alphanumerics, `-`,
/// `_` and `.` are accepted, with at least one alphanumeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(String);

impl SymbolId {
    /// Normalize raw user or file input.
    /// Returns `None` for empty input or input with other characters.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();

        if !normalized.chars().any(|c| c.is_ascii_alphanumeric())
            || !normalized
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return None;
        }

        Some(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SymbolId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SymbolId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_lowercases() {
        let id = SymbolId::parse("  BitCoin \n").unwrap();
        assert_eq!(id.as_str(), "bitcoin");
    }

    #[test]
    fn parse_rejects_empty_and_separators() {
        assert_eq!(SymbolId::parse(""), None);
        assert_eq!(SymbolId::parse("   "), None);
        assert_eq!(SymbolId::parse("bitcoin,ethereum"), None);
        assert_eq!(SymbolId::parse("shiba inu"), None);
        assert_eq!(SymbolId::parse("../etc"), None);
        assert_eq!(SymbolId::parse("."), None);
        assert_eq!(SymbolId::parse(".."), None);
        assert_eq!(SymbolId::parse("-_."), None);
        assert_eq!(SymbolId::parse("bit!coin"), None);
    }

    #[test]
    fn hyphenated_ids_are_kept() {
        let id = SymbolId::parse("Shiba-Inu").unwrap();
        assert_eq!(id.to_string(), "shiba-inu");
    }
}
