//! Antimicrobial code list operations.

use rusqlite::params;
use serde::{Deserialize, Serialize};

use super::{Database, DbError, DbResult};
use crate::source::{CodeRepository, SourceError, SourceResult};

/// Both code lists, as exchanged in JSON seed files.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CodeLists {
    #[serde(default)]
    pub antibiotics: Vec<String>,
    #[serde(default)]
    pub antifungal_groups: Vec<String>,
}

impl Database {
    /// Replace all antibiotic codes.
    pub fn replace_antibiotic_codes(&mut self, codes: &[String]) -> DbResult<usize> {
        self.replace_codes("antibiotic_atc_codes", "code", codes)
    }

    /// Replace all antifungal group prefixes.
    pub fn replace_antifungal_groups(&mut self, prefixes: &[String]) -> DbResult<usize> {
        self.replace_codes("antifungal_atc_groups", "prefix", prefixes)
    }

    /// List antibiotic codes, sorted.
    pub fn list_antibiotic_codes(&self) -> DbResult<Vec<String>> {
        self.list_codes("SELECT code FROM antibiotic_atc_codes ORDER BY code")
    }

    /// List antifungal group prefixes, sorted.
    pub fn list_antifungal_groups(&self) -> DbResult<Vec<String>> {
        self.list_codes("SELECT prefix FROM antifungal_atc_groups ORDER BY prefix")
    }

    /// Replace both lists from a JSON seed document.
    pub fn import_code_lists_json(&mut self, json: &str) -> DbResult<CodeLists> {
        let lists: CodeLists = serde_json::from_str(json)?;
        self.replace_antibiotic_codes(&lists.antibiotics)?;
        self.replace_antifungal_groups(&lists.antifungal_groups)?;
        Ok(CodeLists {
            antibiotics: self.list_antibiotic_codes()?,
            antifungal_groups: self.list_antifungal_groups()?,
        })
    }

    fn replace_codes(&mut self, table: &str, column: &str, codes: &[String]) -> DbResult<usize> {
        let trimmed: Vec<&str> = codes.iter().map(|c| c.trim()).collect();
        if let Some(pos) = trimmed.iter().position(|c| c.is_empty()) {
            return Err(DbError::Constraint(format!(
                "blank entry at position {} for {}",
                pos, table
            )));
        }

        let tx = self.conn.transaction()?;
        tx.execute(&format!("DELETE FROM {}", table), [])?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR IGNORE INTO {} ({}) VALUES (?1)",
                table, column
            ))?;
            for code in &trimmed {
                inserted += stmt.execute(params![code])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn list_codes(&self, sql: &str) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut codes = Vec::new();
        for row in rows {
            codes.push(row?);
        }
        Ok(codes)
    }
}

impl CodeRepository for Database {
    fn antibiotic_codes(&self) -> SourceResult<Vec<String>> {
        self.list_antibiotic_codes()
            .map_err(|e| SourceError::Query(e.to_string()))
    }

    fn antifungal_group_codes(&self) -> SourceResult<Vec<String>> {
        self.list_antifungal_groups()
            .map_err(|e| SourceError::Query(e.to_string()))
    }
}
