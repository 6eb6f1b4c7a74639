//! Class label table.

use std::path::Path;

use anyhow::{anyhow, Context, Result};

/// Ordered class index -> label mapping. Loaded once and shared read-only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassLabels {
    labels: Vec<String>,
}

impl ClassLabels {
    pub fn new(labels: Vec<String>) -> Result<Self> {
        if labels.is_empty() {
            return Err(anyhow!("label table is empty"));
        }
        Ok(Self { labels })
    }

    /// Load from a JSON array of strings, or one label per line.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read label table {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid label table {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let labels: Vec<String> = if raw.trim_start().starts_with('[') {
            serde_json::from_str(raw).context("label JSON must be an array of strings")?
        } else {
            raw.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        };
        Self::new(labels)
    }

    /// Generic `class_<n>` labels, for running without a label file.
    pub fn numbered(count: usize) -> Result<Self> {
        Self::new((0..count).map(|i| format!("class_{}", i)).collect())
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_and_plain_text() -> Result<()> {
        let json = ClassLabels::parse(r#"["hello", "thanks", "yes"]"#)?;
        assert_eq!(json.len(), 3);
        assert_eq!(json.get(1), Some("thanks"));

        let text = ClassLabels::parse("hello\n\n  thanks \nyes\n")?;
        assert_eq!(text, json);
        Ok(())
    }

    #[test]
    fn empty_table_is_rejected() {
        assert!(ClassLabels::parse("\n\n").is_err());
        assert!(ClassLabels::parse("[]").is_err());
    }

    #[test]
    fn loads_from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        std::io::Write::write_all(&mut file, b"a\nb\n")?;
        let labels = ClassLabels::load(file.path())?;
        assert_eq!(labels.get(0), Some("a"));
        assert_eq!(labels.get(2), None);
        Ok(())
    }
}
