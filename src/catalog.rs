//! Icon catalogs: named libraries of `{ title, hex, source }` records.
//!
//! Catalog documents are static JSON files of the form
//!
//! ```json
//! { "icons": [ { "title": "GitHub", "hex": "181717", "source": "icons/github.svg" } ] }
//! ```

use std::collections::HashSet;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single selectable icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconRecord {
    /// Display name, unique within its library.
    pub title: String,

    /// The catalog's preferred color, 6 hex digits without `#`.
    pub hex: String,

    /// Locator for the vector asset (relative path or URL).
    pub source: String,
}

impl IconRecord {
    /// Returns the preferred color as `#rrggbb`.
    pub fn preferred_color(&self) -> String {
        format!("#{}", self.hex.trim_start_matches('#').to_ascii_lowercase())
    }
}

#[derive(Deserialize)]
struct CatalogDocument {
    icons: Vec<IconRecord>,
}

/// An ordered, named sequence of icons.
#[derive(Debug, Clone, Default)]
pub struct Library {
    pub name: String,
    icons: Vec<IconRecord>,
}

impl Library {
    /// Builds a library from records, dropping later duplicates of a title.
    pub fn new(name: impl Into<String>, records: Vec<IconRecord>) -> Self {
        let name = name.into();
        let mut seen = HashSet::with_capacity(records.len());
        let mut icons = Vec::with_capacity(records.len());
        for record in records {
            if !seen.insert(record.title.clone()) {
                warn!("library {name}: duplicate title {:?} ignored", record.title);
                continue;
            }
            icons.push(record);
        }
        Self { name, icons }
    }

    /// Parses a catalog document.
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        let library = Self::new(name, document.icons);
        info!("loaded {} icons into library {}", library.len(), library.name);
        Ok(library)
    }

    pub fn icons(&self) -> &[IconRecord] {
        &self.icons
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    /// Looks up an icon by exact title.
    pub fn find(&self, title: &str) -> Option<&IconRecord> {
        self.icons.iter().find(|icon| icon.title == title)
    }

    /// Case-insensitive substring search over titles, in catalog order.
    ///
    /// An empty term matches everything.
    pub fn search(&self, term: &str) -> Vec<&IconRecord> {
        let term = term.trim().to_lowercase();
        self.icons
            .iter()
            .filter(|icon| icon.title.to_lowercase().contains(&term))
            .collect()
    }
}

/// All loaded libraries plus the currently active one.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    libraries: Vec<Library>,
    active: usize,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a library, replacing any existing library with the same name.
    ///
    /// The first library added becomes active.
    pub fn add_library(&mut self, library: Library) {
        match self.libraries.iter().position(|l| l.name == library.name) {
            Some(index) => self.libraries[index] = library,
            None => self.libraries.push(library),
        }
    }

    pub fn with_library(mut self, library: Library) -> Self {
        self.add_library(library);
        self
    }

    /// Switches the active library.
    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let index = self
            .libraries
            .iter()
            .position(|l| l.name == name)
            .ok_or_else(|| Error::NotFound {
                title: name.to_string(),
            })?;
        self.active = index;
        Ok(())
    }

    /// Returns the active library, if any library is loaded.
    pub fn active(&self) -> Option<&Library> {
        self.libraries.get(self.active)
    }

    pub fn libraries(&self) -> impl Iterator<Item = &Library> {
        self.libraries.iter()
    }

    /// Finds `title` in the active library.
    pub fn find(&self, title: &str) -> Result<&IconRecord> {
        self.active()
            .and_then(|library| library.find(title))
            .ok_or_else(|| Error::NotFound {
                title: title.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRANDS: &str = r#"{ "icons": [
        { "title": "GitHub", "hex": "181717", "source": "icons/github.svg" },
        { "title": "GitLab", "hex": "FC6D26", "source": "icons/gitlab.svg" },
        { "title": "Rust", "hex": "000000", "source": "icons/rust.svg" },
        { "title": "GitHub", "hex": "ffffff", "source": "icons/other.svg" }
    ] }"#;

    const GENERAL: &str = r#"{ "icons": [
        { "title": "home-line", "hex": "000000", "source": "remix/home-line.svg" }
    ] }"#;

    #[test]
    fn parses_document_and_drops_duplicates() {
        let library = Library::from_json("brands", BRANDS).unwrap();
        assert_eq!(library.len(), 3);
        assert_eq!(library.find("GitHub").unwrap().source, "icons/github.svg");
    }

    #[test]
    fn large_library_keeps_first_of_each_title() {
        let records: Vec<IconRecord> = (0..6000)
            .map(|i| IconRecord {
                title: format!("Icon {}", i % 3000),
                hex: "000000".into(),
                source: format!("icons/{i}.svg"),
            })
            .collect();
        let library = Library::new("big", records);
        assert_eq!(library.len(), 3000);
        assert_eq!(library.find("Icon 7").unwrap().source, "icons/7.svg");
        assert_eq!(library.icons()[2999].title, "Icon 2999");
    }

    #[test]
    fn preferred_color_is_prefixed_and_lowercase() {
        let library = Library::from_json("brands", BRANDS).unwrap();
        assert_eq!(library.find("GitLab").unwrap().preferred_color(), "#fc6d26");
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let library = Library::from_json("brands", BRANDS).unwrap();
        let titles: Vec<_> = library.search("git").iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["GitHub", "GitLab"]);
        assert_eq!(library.search("  ").len(), 3);
        assert!(library.search("python").is_empty());
    }

    #[test]
    fn invalid_document_is_a_catalog_error() {
        assert!(matches!(
            Library::from_json("broken", "{ \"icons\": 3 }"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn find_uses_active_library() {
        let mut catalog = Catalog::new()
            .with_library(Library::from_json("brands", BRANDS).unwrap())
            .with_library(Library::from_json("general", GENERAL).unwrap());

        assert!(catalog.find("Rust").is_ok());
        assert!(matches!(catalog.find("home-line"), Err(Error::NotFound { .. })));

        catalog.set_active("general").unwrap();
        assert!(catalog.find("home-line").is_ok());
        assert!(matches!(catalog.find("Rust"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn unknown_library_leaves_active_unchanged() {
        let mut catalog = Catalog::new().with_library(Library::from_json("brands", BRANDS).unwrap());
        assert!(catalog.set_active("nope").is_err());
        assert_eq!(catalog.active().unwrap().name, "brands");
    }

    #[test]
    fn empty_catalog_finds_nothing() {
        assert!(matches!(Catalog::new().find("x"), Err(Error::NotFound { .. })));
    }
}
