use std::fmt;

/// Property keys checked for a display name, first non-empty wins
pub const NAME_PROPERTIES: [&str; 4] = ["NAME", "ADMIN", "name", "NAME_LONG"];

/// Spellings that refer to the same nation, mapped to one canonical key
const ALIASES: [(&str, &str); 2] = [("cabo verde", "cape verde"), ("cape verde", "cape verde")];

/// Canonical comparison key for a region name (trimmed, lower-cased, aliases folded)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionKey(String);

impl RegionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RegionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize a raw display name into its comparison key.
/// Idempotent: normalizing a key's text returns the same key.
pub fn normalize(raw: &str) -> RegionKey {
    let lowered = raw.trim().to_lowercase();
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(lowered);
    RegionKey(canonical)
}

/// Pick the display name from a feature's properties: the first candidate
/// property holding a non-blank string.
pub fn display_name<'a, F>(lookup: F) -> Option<&'a str>
where
    F: Fn(&str) -> Option<&'a str>,
{
    NAME_PROPERTIES
        .iter()
        .filter_map(|key| lookup(*key))
        .find(|name| !name.trim().is_empty())
}
