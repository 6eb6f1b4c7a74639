use std::collections::HashMap;
use std::sync::Arc;

use crate::error::DetectError;

use super::backend::SequenceClassifier;

/// Named classifier backends, shared read-only once built.
pub struct ClassifierRegistry {
    backends: HashMap<String, Arc<dyn SequenceClassifier>>,
    default_name: Option<String>,
}

impl ClassifierRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<C: SequenceClassifier + 'static>(&mut self, classifier: C) {
        self.register_shared(Arc::new(classifier));
    }

    pub fn register_shared(&mut self, classifier: Arc<dyn SequenceClassifier>) {
        let name = classifier.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, classifier);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SequenceClassifier>> {
        self.backends.get(name).cloned()
    }

    pub fn default_backend(&self) -> Option<Arc<dyn SequenceClassifier>> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    /// Sorted backend names.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Look up `name`, or the default when `None`.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn SequenceClassifier>, DetectError> {
        let found = match name {
            Some(name) => self.get(name),
            None => self.default_backend(),
        };
        found.ok_or_else(|| {
            DetectError::DependencyUnavailable(format!(
                "classifier '{}' is not available (registered: {})",
                name.unwrap_or("<default>"),
                self.list().join(", ")
            ))
        })
    }
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}
