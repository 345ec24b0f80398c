//! Small helpers for writing local state files.

use std::fs;
use std::path::Path;

use crate::errors::Result;

/// Write `bytes` to `path` **atomically**.
///
/// Writes to a temp file in the same directory, then renames it over the
/// target so readers never see a half-written file.  Missing parent
/// directories are created.  On Unix the file is owner-only (0o600).
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    if !parent.as_os_str().is_empty() && !parent.exists() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, bytes)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}
