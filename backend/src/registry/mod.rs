//! Schema registry - store and reuse validation schemas.
//!
//! Saves schema definitions to disk as one JSON file per schema and
//! matches stored schemas to uploaded files based on header names.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};
use crate::schema::{validate_definition, SchemaDefinition};

/// Directory where schemas are stored (relative to current dir)
pub const DEFAULT_REGISTRY_DIR: &str = ".tabcheck/schemas";

/// A stored schema definition with usage metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSchema {
    /// Unique identifier
    pub id: String,
    /// The schema definition itself
    pub definition: SchemaDefinition,
    /// Creation timestamp
    pub created_at: String,
    /// Last time this schema was used for an upload
    pub last_used: Option<String>,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Number of times used
    pub use_count: u32,
}

/// Registry for managing schema definitions.
pub struct SchemaRegistry {
    /// Directory where schemas are stored
    registry_dir: PathBuf,
    /// Loaded schemas (id -> schema)
    schemas: HashMap<String, StoredSchema>,
}

impl SchemaRegistry {
    /// Create a new registry, loading existing schemas from disk.
    pub fn new() -> Self {
        Self::with_dir(DEFAULT_REGISTRY_DIR)
    }

    /// Create a registry with a custom directory.
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        let registry_dir = PathBuf::from(dir.as_ref());
        let mut registry = Self {
            registry_dir,
            schemas: HashMap::new(),
        };
        registry.load_all();
        registry
    }

    /// Load all schemas from the registry directory. Files that do not
    /// parse are skipped rather than poisoning the whole registry.
    fn load_all(&mut self) {
        if !self.registry_dir.exists() {
            return;
        }

        let entries = match fs::read_dir(&self.registry_dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Ok(content) = fs::read_to_string(&path) {
                    if let Ok(schema) = serde_json::from_str::<StoredSchema>(&content) {
                        self.schemas.insert(schema.id.clone(), schema);
                    }
                }
            }
        }
    }

    /// Get all stored schemas.
    pub fn list(&self) -> Vec<&StoredSchema> {
        self.schemas.values().collect()
    }

    /// Get a schema by ID.
    pub fn get(&self, id: &str) -> Option<&StoredSchema> {
        self.schemas.get(id)
    }

    /// Get a schema's definition by ID, or a `NotFound` error.
    pub fn definition(&self, id: &str) -> RegistryResult<SchemaDefinition> {
        self.schemas
            .get(id)
            .map(|s| s.definition.clone())
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Find schemas compatible with the given file headers.
    /// Returns schemas sorted by compatibility score and success rate.
    pub fn find_compatible(&self, headers: &[String]) -> Vec<(&StoredSchema, f64)> {
        let mut compatible: Vec<_> = self
            .schemas
            .values()
            .filter_map(|schema| {
                let score = self.header_overlap(&schema.definition, headers);
                if score > 0.5 {
                    Some((schema, score))
                } else {
                    None
                }
            })
            .collect();

        // Sort by: compatibility score * success rate (descending)
        compatible.sort_by(|a, b| {
            let score_a = a.1 * a.0.success_rate;
            let score_b = b.1 * b.0.success_rate;
            score_b
                .partial_cmp(&score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        compatible
    }

    /// Fraction of the schema's columns present in the headers,
    /// compared case-insensitively.
    fn header_overlap(&self, definition: &SchemaDefinition, headers: &[String]) -> f64 {
        if definition.columns.is_empty() {
            return 0.0;
        }

        let headers_lower: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
        let match_count = definition
            .columns
            .iter()
            .filter(|c| headers_lower.contains(&c.name.to_lowercase()))
            .count();

        match_count as f64 / definition.columns.len() as f64
    }

    /// Save a new schema definition to the registry.
    pub fn save(&mut self, definition: SchemaDefinition) -> RegistryResult<String> {
        // Ensure directory exists
        fs::create_dir_all(&self.registry_dir)?;

        let id = self.generate_id(&definition.name);
        let stored = StoredSchema {
            id: id.clone(),
            definition,
            created_at: chrono::Utc::now().to_rfc3339(),
            last_used: None,
            success_rate: 1.0,
            use_count: 0,
        };

        // Save to disk
        let path = self.registry_dir.join(format!("{}.json", id));
        let content = serde_json::to_string_pretty(&stored)?;
        fs::write(&path, content)?;

        self.schemas.insert(id.clone(), stored);
        Ok(id)
    }

    /// Import a schema definition from a JSON file, checking it against
    /// the definition contract first.
    pub fn import(&mut self, path: &Path, name: Option<&str>) -> RegistryResult<String> {
        let content = fs::read_to_string(path)?;

        let value: serde_json::Value = serde_json::from_str(&content)?;
        validate_definition(&value)
            .map_err(|errors| RegistryError::InvalidDefinition(errors.join("; ")))?;

        let mut definition: SchemaDefinition = serde_json::from_value(value)?;
        if let Some(name) = name {
            definition.name = name.to_string();
        }

        self.save(definition)
    }

    /// Update statistics after using a schema for an upload.
    pub fn update_stats(&mut self, id: &str, success: bool) {
        if let Some(schema) = self.schemas.get_mut(id) {
            // Exponential moving average
            schema.success_rate = if success {
                schema.success_rate * 0.9 + 0.1
            } else {
                schema.success_rate * 0.9
            };
            schema.last_used = Some(chrono::Utc::now().to_rfc3339());
            schema.use_count += 1;

            // Save updated stats
            let path = self.registry_dir.join(format!("{}.json", id));
            if let Ok(content) = serde_json::to_string_pretty(schema) {
                let _ = fs::write(&path, content);
            }
        }
    }

    /// Delete a schema from the registry.
    pub fn delete(&mut self, id: &str) -> RegistryResult<()> {
        if self.schemas.remove(id).is_some() {
            let path = self.registry_dir.join(format!("{}.json", id));
            fs::remove_file(&path)?;
            Ok(())
        } else {
            Err(RegistryError::NotFound(id.to_string()))
        }
    }

    /// Generate a unique ID from a name.
    fn generate_id(&self, name: &str) -> String {
        let slug: String = name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");

        let timestamp = chrono::Utc::now().timestamp_millis();
        format!("{}-{}", slug, timestamp)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::example_definition;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();

        let id = {
            let mut registry = SchemaRegistry::with_dir(dir.path());
            registry.save(example_definition()).unwrap()
        };
        assert!(id.starts_with("customer-import-"));
        assert!(dir.path().join(format!("{}.json", id)).exists());

        // a fresh registry picks the schema up from disk
        let registry = SchemaRegistry::with_dir(dir.path());
        let stored = registry.get(&id).unwrap();
        assert_eq!(stored.definition.name, "Customer import");
        assert_eq!(stored.use_count, 0);
        assert!((stored.success_rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_definition_lookup() {
        let dir = tempdir().unwrap();
        let mut registry = SchemaRegistry::with_dir(dir.path());
        let id = registry.save(example_definition()).unwrap();

        assert_eq!(registry.definition(&id).unwrap().name, "Customer import");
        assert!(matches!(
            registry.definition("nope"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_import_valid_definition() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("def.json");
        fs::write(&file, example_definition().to_json().unwrap()).unwrap();

        let mut registry = SchemaRegistry::with_dir(dir.path().join("registry"));
        let id = registry.import(&file, Some("Renamed")).unwrap();
        assert_eq!(registry.get(&id).unwrap().definition.name, "Renamed");
    }

    #[test]
    fn test_import_rejects_contract_violations() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("bad.json");
        fs::write(&file, r#"{ "name": "x", "config": { "delimiter": "," } }"#).unwrap();

        let mut registry = SchemaRegistry::with_dir(dir.path().join("registry"));
        assert!(matches!(
            registry.import(&file, None),
            Err(RegistryError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let mut registry = SchemaRegistry::with_dir(dir.path());
        let id = registry.save(example_definition()).unwrap();

        registry.delete(&id).unwrap();
        assert!(registry.get(&id).is_none());
        assert!(!dir.path().join(format!("{}.json", id)).exists());

        assert!(matches!(
            registry.delete(&id),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_find_compatible_scores_header_overlap() {
        let dir = tempdir().unwrap();
        let mut registry = SchemaRegistry::with_dir(dir.path());
        registry.save(example_definition()).unwrap();

        // all five columns present, case-insensitively
        let headers: Vec<String> = ["NAME", "Email", "age", "signup_date", "newsletter"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let matches = registry.find_compatible(&headers);
        assert_eq!(matches.len(), 1);
        assert!((matches[0].1 - 1.0).abs() < 0.01);

        // two of five columns is below the 0.5 cutoff
        let headers: Vec<String> = ["name", "email"].iter().map(|s| s.to_string()).collect();
        assert!(registry.find_compatible(&headers).is_empty());
    }

    #[test]
    fn test_update_stats_moving_average() {
        let dir = tempdir().unwrap();
        let mut registry = SchemaRegistry::with_dir(dir.path());
        let id = registry.save(example_definition()).unwrap();

        registry.update_stats(&id, false);
        let schema = registry.get(&id).unwrap();
        assert!((schema.success_rate - 0.9).abs() < 0.001);
        assert_eq!(schema.use_count, 1);
        assert!(schema.last_used.is_some());

        registry.update_stats(&id, true);
        let schema = registry.get(&id).unwrap();
        assert!((schema.success_rate - 0.91).abs() < 0.001);
        assert_eq!(schema.use_count, 2);
    }
}
