use std::io::Read;
use std::path::Path;

use crate::error::{DecodeError, Result};

/// Read a decoder script from disk, refusing files larger than `max_size` bytes.
pub fn load_script(path: &Path, max_size: usize) -> Result<String> {
    let file = std::fs::File::open(path)
        .map_err(|err| DecodeError::ScriptLoad(format!("{}: {err}", path.display())))?;
    let metadata = file
        .metadata()
        .map_err(|err| DecodeError::ScriptLoad(format!("{}: {err}", path.display())))?;

    if !metadata.is_file() {
        return Err(DecodeError::ScriptLoad(format!(
            "not a regular file: {}",
            path.display()
        )));
    }
    if metadata.len() > max_size as u64 {
        return Err(DecodeError::ScriptLoad(format!(
            "script too large ({} bytes, max {max_size}): {}",
            metadata.len(),
            path.display()
        )));
    }

    let read_limit = u64::try_from(max_size.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    file.take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| {
            DecodeError::ScriptLoad(format!("failed reading {}: {err}", path.display()))
        })?;
    if content.len() > max_size {
        return Err(DecodeError::ScriptLoad(format!(
            "script grew past {max_size} bytes while reading: {}",
            path.display()
        )));
    }

    Ok(content)
}
