//! Registry manifest records and the derived lookup indexes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One library's manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub docs_url: Option<String>,
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub packages: RegistryPackages,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub llms_txt_url: String,
}

impl RegistryEntry {
    /// `^[a-z0-9][a-z0-9_-]*$`, checked without pulling in a regex engine for
    /// a one-shot character class.
    #[must_use]
    pub fn id_is_valid(id: &str) -> bool {
        let mut chars = id.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        if !(first.is_ascii_lowercase() || first.is_ascii_digit()) {
            return false;
        }
        chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    }

    /// Structural validity beyond the id shape: non-empty `llms_txt_url`.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        Self::id_is_valid(&self.id) && !self.llms_txt_url.trim().is_empty()
    }
}

/// A library's known package names per ecosystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryPackages {
    #[serde(default)]
    pub pypi: Vec<String>,
    #[serde(default)]
    pub npm: Vec<String>,
}

impl RegistryPackages {
    /// All package names across every ecosystem, lowercased.
    pub fn all(&self) -> impl Iterator<Item = String> + '_ {
        self.pypi
            .iter()
            .chain(self.npm.iter())
            .map(|s| s.to_lowercase())
    }
}

/// How a [`LibraryMatch`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedVia {
    PackageName,
    LibraryId,
    Alias,
    Fuzzy,
}

/// A single resolver hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryMatch {
    pub library_id: String,
    pub name: String,
    pub languages: Vec<String>,
    pub docs_url: Option<String>,
    pub matched_via: MatchedVia,
    pub relevance: f64,
}

/// The three indexes derived from a manifest in a single pass.
#[derive(Debug, Clone, Default)]
pub struct RegistryIndexes {
    pub by_package: HashMap<String, String>,
    pub by_id: HashMap<String, RegistryEntry>,
    pub fuzzy_corpus: Vec<(String, String)>,
}

impl RegistryIndexes {
    /// Build the indexes from validated entries.
    ///
    /// Returns the indexes plus any warnings worth logging (id rejections,
    /// `by_package` collisions). Entries failing [`RegistryEntry::is_well_formed`]
    /// are skipped entirely; the rest of the manifest still loads.
    #[must_use]
    pub fn build(entries: &[RegistryEntry]) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let mut indexes = Self::default();

        for entry in entries {
            if !entry.is_well_formed() {
                warnings.push(format!(
                    "registry entry '{}' rejected: invalid id or empty llms_txt_url",
                    entry.id
                ));
                continue;
            }

            for package in entry.packages.all() {
                // First occurrence wins; preserve intentionally (see DESIGN.md).
                indexes
                    .by_package
                    .entry(package.clone())
                    .or_insert_with(|| {
                        entry.id.clone()
                    });
                if let Some(existing) = indexes.by_package.get(&package) {
                    if existing != &entry.id {
                        warnings.push(format!(
                            "package name '{package}' claimed by both '{existing}' and '{}', keeping first",
                            entry.id
                        ));
                    }
                }
            }

            let mut terms: Vec<String> = vec![entry.id.to_lowercase()];
            terms.extend(entry.aliases.iter().map(|a| a.trim().to_lowercase()));
            terms.extend(entry.packages.all());
            for term in terms {
                indexes.fuzzy_corpus.push((term, entry.id.clone()));
            }

            indexes.by_id.insert(entry.id.clone(), entry.clone());
        }

        (indexes, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, pypi: &[&str]) -> RegistryEntry {
        RegistryEntry {
            id: id.to_string(),
            name: id.to_string(),
            docs_url: None,
            repo_url: None,
            languages: vec!["python".to_string()],
            packages: RegistryPackages {
                pypi: pypi.iter().map(|s| s.to_string()).collect(),
                npm: vec![],
            },
            aliases: vec![],
            llms_txt_url: format!("https://example.com/{id}/llms.txt"),
        }
    }

    #[test]
    fn id_validation() {
        assert!(RegistryEntry::id_is_valid("langchain"));
        assert!(RegistryEntry::id_is_valid("a"));
        assert!(RegistryEntry::id_is_valid("foo-bar_9"));
        assert!(!RegistryEntry::id_is_valid(""));
        assert!(!RegistryEntry::id_is_valid("Langchain"));
        assert!(!RegistryEntry::id_is_valid("-leading"));
        assert!(!RegistryEntry::id_is_valid("has space"));
    }

    #[test]
    fn by_package_collision_keeps_first() {
        let entries = vec![
            entry("langchain", &["shared-pkg"]),
            entry("other", &["shared-pkg"]),
        ];
        let (indexes, warnings) = RegistryIndexes::build(&entries);
        assert_eq!(indexes.by_package.get("shared-pkg").unwrap(), "langchain");
        assert!(warnings.iter().any(|w| w.contains("shared-pkg")));
    }

    #[test]
    fn invalid_entry_is_skipped_with_warning() {
        let mut bad = entry("Bad Id", &[]);
        bad.llms_txt_url = "https://example.com/x".to_string();
        let (indexes, warnings) = RegistryIndexes::build(&[bad]);
        assert!(indexes.by_id.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn empty_llms_txt_url_rejected() {
        let mut bad = entry("validid", &[]);
        bad.llms_txt_url = String::new();
        let (indexes, _) = RegistryIndexes::build(&[bad]);
        assert!(indexes.by_id.is_empty());
    }
}
