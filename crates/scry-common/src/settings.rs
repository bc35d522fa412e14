use serde::{Deserialize, Serialize};

/// Host-supplied console settings.
///
/// The core reads `safe_mode` and `using_namespaces`; `history_size` is
/// carried for the host's input widget and not used by the pipeline itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Hide non-public types and members from resolution and suggestions.
    pub safe_mode: bool,
    /// Namespaces searched, in order, when resolving an unqualified root
    /// identifier.
    pub using_namespaces: Vec<String>,
    /// Input history length for the hosting widget.
    pub history_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            safe_mode: true,
            using_namespaces: Vec::new(),
            history_size: 50,
        }
    }
}
