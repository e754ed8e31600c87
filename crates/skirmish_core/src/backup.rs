//! Pristine copy of the mod folder and restoring the working tree from it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::core_api::{CoreError, CoreErrorCode, RestoreOutcome};

const BACKUP_MARKERS: [&str; 2] = [" - copy", " - copie"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorStats {
    pub copied: usize,
    pub removed: usize,
}

fn folder_name(mod_dir: &Path) -> io::Result<String> {
    mod_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no folder name", mod_dir.display()),
            )
        })
}

/// Finds a sibling `<mod> - copy` (or `- copie`) folder, falling back to the
/// default `<mod> - copy` path when none exists yet.
pub fn discover_backup(mod_dir: &Path) -> io::Result<PathBuf> {
    let mod_dir = fs::canonicalize(mod_dir)?;
    let name = folder_name(&mod_dir)?;
    let parent = mod_dir.parent().unwrap_or(Path::new("."));
    let prefix = name.to_ascii_lowercase();

    let mut candidates: Vec<PathBuf> = fs::read_dir(parent)?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_dir()))
        .filter(|entry| entry.path() != mod_dir)
        .filter(|entry| {
            let candidate = entry.file_name().to_string_lossy().to_ascii_lowercase();
            candidate.starts_with(&prefix)
                && BACKUP_MARKERS.iter().any(|marker| candidate.contains(marker))
        })
        .map(|entry| entry.path())
        .collect();
    candidates.sort();

    match candidates.into_iter().next() {
        Some(found) => {
            info!(backup = %found.display(), "found existing backup");
            Ok(found)
        }
        None => Ok(parent.join(format!("{name}{}", BACKUP_MARKERS[0]))),
    }
}

/// Copies the whole `source` tree into `dest`, returning the file count.
pub fn copy_tree(source: &Path, dest: &Path) -> io::Result<usize> {
    let mut copied = 0usize;
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry.path().strip_prefix(source).map_err(io::Error::other)?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn same_contents(a: &Path, b: &Path) -> io::Result<bool> {
    let (meta_a, meta_b) = (fs::metadata(a)?, fs::metadata(b)?);
    if meta_a.len() != meta_b.len() {
        return Ok(false);
    }
    Ok(fs::read(a)? == fs::read(b)?)
}

/// Makes `dest` an exact copy of `source`: missing or differing files are
/// copied over and anything `source` lacks is deleted.
pub fn mirror_tree(source: &Path, dest: &Path) -> io::Result<MirrorStats> {
    let mut stats = MirrorStats::default();

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry.path().strip_prefix(source).map_err(io::Error::other)?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            if target.is_file() {
                fs::remove_file(&target)?;
            }
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if target.is_dir() {
                fs::remove_dir_all(&target)?;
            }
            if !target.exists() || !same_contents(entry.path(), &target)? {
                fs::copy(entry.path(), &target)?;
                stats.copied += 1;
            }
        }
    }

    for entry in WalkDir::new(dest).contents_first(true) {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry.path().strip_prefix(dest).map_err(io::Error::other)?;
        if rel.as_os_str().is_empty() || source.join(rel).exists() {
            continue;
        }
        if entry.file_type().is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
        stats.removed += 1;
    }

    Ok(stats)
}

/// Restores `mod_dir` from its backup, creating the backup instead when
/// there is none yet.
pub fn restore(mod_dir: &Path, backup_dir: Option<&Path>) -> Result<RestoreOutcome, CoreError> {
    fs::metadata(mod_dir).map_err(|err| CoreError::io(mod_dir.display(), err))?;
    let backup = match backup_dir {
        Some(dir) => dir.to_path_buf(),
        None => discover_backup(mod_dir).map_err(|err| {
            CoreError::new(
                CoreErrorCode::MissingBackup,
                format!("cannot locate backup for {}: {err}", mod_dir.display()),
            )
        })?,
    };

    if !backup.exists() {
        info!(backup = %backup.display(), "no backup yet, creating it from the working tree");
        let copied = copy_tree(mod_dir, &backup).map_err(|err| {
            warn!(backup = %backup.display(), error = %err, "backup creation failed");
            CoreError::new(
                CoreErrorCode::MissingBackup,
                format!("failed to create backup {}: {err}", backup.display()),
            )
        })?;
        info!(files = copied, "initial backup created, later runs restore from it");
        return Ok(RestoreOutcome::Created { backup });
    }

    info!(backup = %backup.display(), "mirroring backup onto working tree");
    let stats = mirror_tree(&backup, mod_dir).map_err(|err| {
        CoreError::new(
            CoreErrorCode::Mirror,
            format!("failed to mirror {} onto {}: {err}", backup.display(), mod_dir.display()),
        )
    })?;
    info!(copied = stats.copied, removed = stats.removed, "restore completed");
    Ok(RestoreOutcome::Mirrored {
        backup,
        copied: stats.copied,
        removed: stats.removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_copies_changes_and_prunes_extras() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("src");
        let dest = root.path().join("dst");
        fs::create_dir_all(source.join("Data/Xml")).unwrap();
        fs::write(source.join("Data/Xml/A.xml"), "<A/>").unwrap();
        fs::write(source.join("Data/Xml/B.xml"), "<B/>").unwrap();
        fs::create_dir_all(dest.join("Data/Xml/Extra")).unwrap();
        fs::write(dest.join("Data/Xml/A.xml"), "<A/>").unwrap();
        fs::write(dest.join("Data/Xml/B.xml"), "<Changed/>").unwrap();
        fs::write(dest.join("Data/Xml/Extra/C.xml"), "<C/>").unwrap();

        let stats = mirror_tree(&source, &dest).unwrap();

        assert_eq!(stats.copied, 1);
        assert_eq!(fs::read_to_string(dest.join("Data/Xml/B.xml")).unwrap(), "<B/>");
        assert!(!dest.join("Data/Xml/Extra").exists());
    }

    #[test]
    fn discovers_copie_sibling() {
        let root = tempfile::tempdir().unwrap();
        let mod_dir = root.path().join("2794270450");
        fs::create_dir_all(&mod_dir).unwrap();
        fs::create_dir_all(root.path().join("2794270450 - Copie")).unwrap();

        let found = discover_backup(&mod_dir).unwrap();
        assert_eq!(found.file_name().unwrap(), "2794270450 - Copie");
    }

    #[test]
    fn never_picks_the_mod_folder_itself() {
        let root = tempfile::tempdir().unwrap();
        let mod_dir = root.path().join("Remake - copy");
        fs::create_dir_all(&mod_dir).unwrap();

        let found = discover_backup(&mod_dir).unwrap();
        assert_eq!(found.file_name().unwrap(), "Remake - copy - copy");
        assert!(!found.exists());
    }
}
