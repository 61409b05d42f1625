//! Script node configuration
//!
//! A script node takes its program either inline (`code`) or from a file
//! (`path`). A non-empty path wins.

use crate::context::ScriptError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Node parameters, deserializable from the graph description
///
/// # Example
/// ```
/// use zeno_script_bridge::ScriptNodeInputs;
///
/// let inputs: ScriptNodeInputs =
///     serde_json::from_str(r#"{"code": "rets.x = 1"}"#).unwrap();
/// assert_eq!(inputs.code, "rets.x = 1");
/// assert!(inputs.path.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptNodeInputs {
    /// Inline program text
    #[serde(default)]
    pub code: String,

    /// Program file, takes precedence when set and non-empty
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptSource {
    Code(String),
    File(PathBuf),
}

impl ScriptSource {
    pub fn from_inputs(inputs: &ScriptNodeInputs) -> Self {
        match &inputs.path {
            Some(path) if !path.as_os_str().is_empty() => ScriptSource::File(path.clone()),
            _ => ScriptSource::Code(inputs.code.clone()),
        }
    }

    /// Program text
    ///
    /// # Errors
    /// `ScriptError::SourceUnreadable` if the file cannot be read.
    pub fn load(&self) -> Result<String, ScriptError> {
        match self {
            ScriptSource::Code(code) => Ok(code.clone()),
            ScriptSource::File(path) => {
                fs::read_to_string(path).map_err(|source| ScriptError::SourceUnreadable {
                    path: path.clone(),
                    source,
                })
            }
        }
    }

    /// Name used in tracebacks and logs
    pub fn name(&self) -> String {
        match self {
            ScriptSource::Code(_) => "<string>".to_string(),
            ScriptSource::File(path) => path.display().to_string(),
        }
    }
}
