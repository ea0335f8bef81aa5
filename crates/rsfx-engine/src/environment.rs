//! Host environment configuration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Host-supplied configuration shared by every load in a session.
///
/// `import_root` and `data_root` are extra search roots for `import`
/// resolution and `filename:` resources; the preprocessor variable table is
/// made visible to `<? ?>` meta-code of every unit.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    import_root: Option<PathBuf>,
    data_root: Option<PathBuf>,
    preprocessor_vars: HashMap<String, f64>,
}

impl Environment {
    /// An environment with no extra roots and no preprocessor variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shared import search root.
    pub fn set_import_root(&mut self, root: impl Into<PathBuf>) {
        self.import_root = Some(root.into());
    }

    /// The shared import search root, if configured.
    pub fn import_root(&self) -> Option<&Path> {
        self.import_root.as_deref()
    }

    /// Set the data root used to resolve `filename:` resources.
    pub fn set_data_root(&mut self, root: impl Into<PathBuf>) {
        self.data_root = Some(root.into());
    }

    /// The data root, if configured.
    pub fn data_root(&self) -> Option<&Path> {
        self.data_root.as_deref()
    }

    /// Define a numeric variable visible to preprocessor meta-code.
    ///
    /// Later definitions of the same name replace earlier ones.
    pub fn set_preprocessor_var(&mut self, name: impl Into<String>, value: f64) {
        self.preprocessor_vars.insert(name.into(), value);
    }

    /// All defined preprocessor variables.
    pub fn preprocessor_vars(&self) -> &HashMap<String, f64> {
        &self.preprocessor_vars
    }
}
