//! Model alias catalog.
//!
//! One group per line, whitespace separated. The first token is the
//! canonical key, the second the prefix of the model name shown in the
//! model select. `#` starts a comment line.

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogGroup {
    pub aliases: Vec<String>,
}

impl CatalogGroup {
    pub fn key(&self) -> &str {
        &self.aliases[0]
    }

    /// Falls back to the key for single-token lines.
    pub fn display_prefix(&self) -> &str {
        self.aliases.get(1).unwrap_or(&self.aliases[0])
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    groups: Vec<CatalogGroup>,
}

impl ModelCatalog {
    pub fn parse(document: &str) -> Self {
        let groups = document
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| CatalogGroup {
                aliases: line.split_whitespace().map(str::to_string).collect(),
            })
            .collect();
        Self { groups }
    }

    pub fn groups(&self) -> &[CatalogGroup] {
        &self.groups
    }

    /// Display prefix of the first group listing `alias`.
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.aliases.iter().any(|a| a == alias))
            .map(CatalogGroup::display_prefix)
    }
}
