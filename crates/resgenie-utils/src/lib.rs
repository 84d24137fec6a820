//! Filesystem and parallelism helpers shared by the resgenie crates.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tempfile::{Builder, NamedTempFile};

const TEMP_PREFIX: &str = ".resgenie";

/// Map `func` over `items` in parallel, keeping input order in the output.
pub fn parallel_map<T, R, F>(items: Vec<T>, func: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Send + Sync,
{
    items.into_par_iter().map(func).collect()
}

/// Directory that will hold `path`, created if missing.
fn parent_dir(path: &Path) -> io::Result<PathBuf> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;
    Ok(parent)
}

/// Create an empty temporary file next to `target` so it can later be
/// persisted over it with a same-filesystem rename.
pub fn staging_file(target: &Path, suffix: &str) -> io::Result<NamedTempFile> {
    let parent = parent_dir(target)?;
    Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(suffix)
        .tempfile_in(&parent)
}

/// Move a staged file over `target`, keeping the permissions of any file it replaces.
pub fn persist(staged: NamedTempFile, target: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(target) {
            let perm = metadata.permissions().mode();
            let _ = fs::set_permissions(staged.path(), fs::Permissions::from_mode(perm));
        }
    }

    staged.persist(target).map(|_| ()).map_err(|err| err.error)
}

/// Atomically write `contents` to `path`: readers see either the old file or
/// the complete new one, never a partial write.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut tmp = staging_file(path, ".tmp")?;
    tmp.as_file_mut().write_all(contents)?;
    tmp.as_file_mut().sync_all()?;
    persist(tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_parents_and_replaces_content() {
        let temp = TempDir::new().expect("tempdir");
        let target = temp.path().join("out/nested/resume.html");

        atomic_write(&target, b"first").expect("first write");
        atomic_write(&target, b"second").expect("second write");

        assert_eq!(fs::read_to_string(&target).expect("read back"), "second");
        let leftovers: Vec<_> = fs::read_dir(target.parent().expect("parent"))
            .expect("list dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn dropped_staging_file_leaves_nothing_behind() {
        let temp = TempDir::new().expect("tempdir");
        let target = temp.path().join("resume.pdf");

        let staged = staging_file(&target, ".pdf").expect("stage");
        let staged_path = staged.path().to_path_buf();
        assert!(staged_path.exists());
        drop(staged);

        assert!(!staged_path.exists());
        assert!(!target.exists());
    }

    #[test]
    fn parallel_map_preserves_order() {
        let doubled = parallel_map((0..64).collect(), |n: u32| n * 2);
        assert_eq!(doubled, (0..64).map(|n| n * 2).collect::<Vec<_>>());
    }
}
