//! Registry validation: identifiers are safe and every referenced column exists.

use crate::config::settings::is_plain_identifier;
use crate::config::TableRegistry;
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate(registry: &TableRegistry) -> Result<(), ConfigError> {
    if !is_plain_identifier(registry.schema()) {
        return Err(ConfigError::Registry(format!("invalid schema name '{}'", registry.schema())));
    }
    if registry.tables().is_empty() {
        return Err(ConfigError::Registry("no tables registered".into()));
    }

    for t in registry.tables() {
        if !is_plain_identifier(t.name) {
            return Err(ConfigError::Registry(format!("invalid table name '{}'", t.name)));
        }
        let mut seen = HashSet::new();
        for c in &t.columns {
            if !is_plain_identifier(c.name) {
                return Err(ConfigError::Registry(format!("{}: invalid column name '{}'", t.name, c.name)));
            }
            if matches!(c.name, "id" | "created_at" | "updated_at") {
                return Err(ConfigError::Registry(format!(
                    "{}: column '{}' is managed by the store",
                    t.name, c.name
                )));
            }
            if !seen.insert(c.name) {
                return Err(ConfigError::Registry(format!("{}: duplicate column '{}'", t.name, c.name)));
            }
        }
        if let Some(key) = t.group_key {
            if !seen.contains(key) {
                return Err(ConfigError::Registry(format!("{}: group key '{}' is not a column", t.name, key)));
            }
        }
        for u in &t.unique {
            if !seen.contains(u) {
                return Err(ConfigError::Registry(format!("{}: unique column '{}' is not a column", t.name, u)));
            }
        }
    }
    Ok(())
}
