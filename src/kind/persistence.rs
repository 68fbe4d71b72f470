//! Kind-table persistence — YAML load/save for custom chord types.
//!
//! An overlay file registers extra kinds (or redefines built-in ones) and
//! may promote default abbreviations, so a deployment can teach the parser
//! house notation without recompiling.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ChordTypeDef, KindTable, TableError};

/// Serialized form of one chord type. The formula uses the same degree
/// notation as the registration API ("1,3,5,-7").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindEntry {
    pub name: String,
    pub formula: String,
    pub abbreviations: Vec<String>,
}

/// An overlay: kinds to register plus optional alias additions and default
/// abbreviation promotions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KindTableFile {
    #[serde(default)]
    pub kinds: Vec<KindEntry>,
    #[serde(default)]
    pub aliases: Vec<AliasEntry>,
    #[serde(default)]
    pub promote: Vec<PromoteEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub alias: String,
    pub canonical: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoteEntry {
    pub kind: String,
    pub abbreviation: String,
}

/// Load an overlay from a YAML file. A missing file is an empty overlay.
pub fn load_overlay(path: &Path) -> Result<KindTableFile, io::Error> {
    if !path.exists() {
        return Ok(KindTableFile::default());
    }
    let content = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Apply an overlay to a table: register kinds in file order, then aliases,
/// then promotions.
pub fn apply_overlay(table: &KindTable, overlay: &KindTableFile) -> Result<(), TableError> {
    for entry in &overlay.kinds {
        let abbrevs: Vec<&str> = entry.abbreviations.iter().map(String::as_str).collect();
        let def = ChordTypeDef::new(&entry.name, &entry.formula, &abbrevs)?;
        table.register(def);
    }
    for alias in &overlay.aliases {
        table.add_alias(&alias.alias, &alias.canonical)?;
    }
    for promote in &overlay.promote {
        table.promote_abbreviation(&promote.kind, &promote.abbreviation)?;
    }
    Ok(())
}

/// Save the whole table as an overlay file, creating parent directories as
/// needed. Loading it into an empty table reproduces the entries in order.
pub fn save_table(path: &Path, table: &KindTable) -> Result<(), io::Error> {
    let kinds = table
        .snapshot()
        .iter()
        .map(|def| KindEntry {
            name: def.name.clone(),
            formula: render_formula(def),
            abbreviations: def.abbreviations.clone(),
        })
        .collect();
    let file = KindTableFile {
        kinds,
        aliases: Vec::new(),
        promote: Vec::new(),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(&file).map_err(io::Error::other)?;
    std::fs::write(path, yaml)
}

fn render_formula(def: &ChordTypeDef) -> String {
    let mut parts = vec!["1".to_string()];
    for step in &def.formula {
        let mut s = String::new();
        if step.alter < 0 {
            for _ in 0..-step.alter {
                s.push('-');
            }
        } else {
            for _ in 0..step.alter {
                s.push('#');
            }
        }
        s.push_str(&step.degree.to_string());
        parts.push(s);
    }
    parts.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::FormulaStep;
    use tempfile::NamedTempFile;

    #[test]
    fn load_nonexistent_is_empty() {
        let path = Path::new("/tmp/tertian_test_missing_overlay.yaml");
        let _ = std::fs::remove_file(path);
        let overlay = load_overlay(path).unwrap();
        assert!(overlay.kinds.is_empty());
    }

    #[test]
    fn overlay_registers_custom_kind() {
        let overlay = KindTableFile {
            kinds: vec![KindEntry {
                name: "quartal".to_string(),
                formula: "1,4,-7".to_string(),
                abbreviations: vec!["q4".to_string()],
            }],
            aliases: vec![AliasEntry {
                alias: "fourth-stack".to_string(),
                canonical: "quartal".to_string(),
            }],
            promote: Vec::new(),
        };
        let table = KindTable::standard();
        apply_overlay(&table, &overlay).unwrap();
        assert_eq!(
            table.formula("fourth-stack").unwrap(),
            vec![FormulaStep::new(4, 0), FormulaStep::new(7, -1)]
        );
    }

    #[test]
    fn overlay_promotion_changes_default() {
        let overlay = KindTableFile {
            kinds: Vec::new(),
            aliases: Vec::new(),
            promote: vec![PromoteEntry {
                kind: "major".to_string(),
                abbreviation: "maj".to_string(),
            }],
        };
        let table = KindTable::standard();
        apply_overlay(&table, &overlay).unwrap();
        assert_eq!(table.default_abbreviation("major"), Some("maj".to_string()));
    }

    #[test]
    fn save_and_reload_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let table = KindTable::standard();
        save_table(file.path(), &table).unwrap();

        let overlay = load_overlay(file.path()).unwrap();
        let rebuilt = KindTable::empty();
        apply_overlay(&rebuilt, &overlay).unwrap();

        assert_eq!(rebuilt.kind_names(), table.kind_names());
        assert_eq!(
            rebuilt.formula("diminished-seventh"),
            table.formula("diminished-seventh")
        );
        assert_eq!(
            rebuilt.abbreviations("suspended-fourth"),
            table.abbreviations("suspended-fourth")
        );
    }

    #[test]
    fn bad_formula_in_overlay_errors() {
        let overlay = KindTableFile {
            kinds: vec![KindEntry {
                name: "broken".to_string(),
                formula: "1,x".to_string(),
                abbreviations: vec!["brk".to_string()],
            }],
            aliases: Vec::new(),
            promote: Vec::new(),
        };
        let table = KindTable::empty();
        assert!(apply_overlay(&table, &overlay).is_err());
    }
}
