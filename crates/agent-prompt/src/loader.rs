//! File-based template loader
//!
//! Templates live one per file, named after the template:
//!
//! ```text
//! prompts/
//! ├── search_agent.j2
//! └── orchestrator_agent.jinja
//! ```

use crate::{JinjaTemplate, PromptError, PromptTemplate, Result};
use std::path::{Path, PathBuf};

const EXTENSIONS: &[&str] = &["j2", "jinja"];

/// Loads templates from a directory
#[derive(Debug, Clone)]
pub struct FileLoader {
    base_path: PathBuf,
}

impl FileLoader {
    /// Create a new file loader with the given base path
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Get the base path
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Load a single template by name
    pub fn load_template(&self, name: &str) -> Result<JinjaTemplate> {
        for ext in EXTENSIONS {
            let path = self.base_path.join(format!("{name}.{ext}"));
            if path.is_file() {
                return read_template(name, &path);
            }
        }
        Err(PromptError::FileLoadError {
            path: self.base_path.join(name).display().to_string(),
            detail: "No template file found".to_string(),
        })
    }

    /// Load every template of the directory, sorted by name
    pub fn load_all(&self) -> Result<Vec<JinjaTemplate>> {
        let entries = std::fs::read_dir(&self.base_path).map_err(|e| PromptError::FileLoadError {
            path: self.base_path.display().to_string(),
            detail: e.to_string(),
        })?;

        let mut templates = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| PromptError::FileLoadError {
                    path: self.base_path.display().to_string(),
                    detail: e.to_string(),
                })?
                .path();

            let is_template = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| EXTENSIONS.contains(&e));
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if is_template && path.is_file() {
                templates.push(read_template(name, &path)?);
            }
        }

        templates.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(templates)
    }
}

fn read_template(name: &str, path: &Path) -> Result<JinjaTemplate> {
    let content = std::fs::read_to_string(path).map_err(|e| PromptError::FileLoadError {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    JinjaTemplate::new(name, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_template() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("search_agent.j2"), "Cherche {{ sujet }}").unwrap();

        let loader = FileLoader::new(dir.path());
        let template = loader.load_template("search_agent").unwrap();
        assert_eq!(template.name(), "search_agent");
        assert_eq!(template.source(), "Cherche {{ sujet }}");

        assert!(loader.load_template("planning_agent").is_err());
    }

    #[test]
    fn test_load_all_skips_other_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.jinja"), "B").unwrap();
        fs::write(dir.path().join("a.j2"), "A").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let names: Vec<String> = FileLoader::new(dir.path())
            .load_all()
            .unwrap()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_invalid_file_fails_to_load() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.j2"), "{% if %}").unwrap();

        let err = FileLoader::new(dir.path()).load_all().unwrap_err();
        assert!(matches!(err, PromptError::TemplateParseFailed { .. }));
    }

    #[test]
    fn test_missing_directory() {
        let err = FileLoader::new("/definitely/not/here").load_all().unwrap_err();
        assert!(matches!(err, PromptError::FileLoadError { .. }));
    }
}
