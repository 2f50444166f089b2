/// File-backed catalog store.
pub mod json_file;
mod memory;
mod repository;
mod seed;
/// Admin session persistence.
pub mod session;

pub use json_file::JsonCatalog;
pub use memory::MemoryCatalog;
pub use repository::{export_json, CatalogRepository, Clock, RepositoryError, SystemClock};
pub use seed::seed_gifts;
pub use session::{SessionError, SessionStore};

use std::{
    fs,
    io::{self, Write as _},
    path::Path,
};

use tempfile::NamedTempFile;

/// Replaces `path` with `contents` in one step, creating parent directories.
///
/// The data goes to a temporary file next to `path` first, so readers never
/// see a partial write. The temporary file is only readable by its owner,
/// and that mode carries over to `path`.
pub(crate) fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn write_file_replaces_content_without_leftovers() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("state.json");

        write_file(&path, b"first").unwrap();
        write_file(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn written_files_are_private() {
        use std::os::unix::fs::PermissionsExt as _;

        let tmp = tempdir().unwrap();
        let path = tmp.path().join("state.json");

        write_file(&path, b"{}").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

