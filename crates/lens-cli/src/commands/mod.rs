//! Command implementations.

pub mod assess;
pub mod audience;
pub mod describe;
pub mod extract;
pub mod profiles;

pub use self::assess::execute_assess;
pub use self::audience::execute_audience;
pub use self::describe::execute_describe;
pub use self::extract::execute_extract;
pub use self::profiles::execute_profiles;

use crate::error::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Write a value as pretty JSON, creating parent directories
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
