//! Logical setting keys
//!
//! A [`SettingKey`] names one logical setting together with the legacy
//! physical keys it has been stored under. Reads try the keys in order;
//! writes go to all of them so older readers stay consistent.

/// A logical setting and its physical store keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SettingKey {
    name: &'static str,
    aliases: &'static [&'static str],
}

impl SettingKey {
    /// A setting stored under a single key
    pub const fn new(name: &'static str) -> Self {
        Self { name, aliases: &[] }
    }

    /// A setting with legacy aliases, in read priority order
    pub const fn with_aliases(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { name, aliases }
    }

    /// Canonical key name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Legacy key names
    pub fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    /// Canonical key followed by each alias
    pub fn physical_keys(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}
