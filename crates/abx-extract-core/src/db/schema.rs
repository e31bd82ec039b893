//! SQLite schema definition.

/// Schema for the antimicrobial code lists.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Antibiotics (exact ATC codes)
-- ============================================================================

CREATE TABLE IF NOT EXISTS antibiotic_atc_codes (
    code TEXT PRIMARY KEY CHECK (length(trim(code)) > 0),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Antifungal groups (ATC code prefixes)
-- ============================================================================

-- An empty prefix would classify every drug as antifungal
CREATE TABLE IF NOT EXISTS antifungal_atc_groups (
    prefix TEXT PRIMARY KEY CHECK (length(trim(prefix)) > 0),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_blank_prefix_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute("INSERT INTO antifungal_atc_groups (prefix) VALUES ('  ')", []);
        assert!(result.is_err());

        let result = conn.execute("INSERT INTO antifungal_atc_groups (prefix) VALUES ('J02')", []);
        assert!(result.is_ok());
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }
}
