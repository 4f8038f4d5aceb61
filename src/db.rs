//! JSON document store: one file per installation, guarded by a sibling
//! `.lock` file and replaced atomically on every write.

use crate::error::ArcError;
use crate::model::{default_db, Db};
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

pub const DB_PATH_ENV: &str = "ARC_DB_PATH";

fn non_empty(s: String) -> Option<String> {
    let s = s.trim().to_string();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// `--db`, then `ARC_DB_PATH`, then the XDG data dir.
pub fn resolve_db_path(cli_db_path: Option<&str>) -> Result<PathBuf, ArcError> {
    if let Some(p) = cli_db_path.map(str::to_string).and_then(non_empty) {
        return Ok(PathBuf::from(p));
    }

    if let Some(p) = std::env::var(DB_PATH_ENV).ok().and_then(non_empty) {
        return Ok(PathBuf::from(p));
    }

    let data_home = match std::env::var("XDG_DATA_HOME").ok().and_then(non_empty) {
        Some(b) => PathBuf::from(b),
        None => {
            let home = std::env::var("HOME")
                .ok()
                .or_else(|| std::env::var("USERPROFILE").ok())
                .and_then(non_empty)
                .ok_or_else(|| ArcError::io("Cannot locate data directory: HOME is not set"))?;
            Path::new(&home).join(".local").join("share")
        }
    };

    Ok(data_home.join("winter-arc").join("db.json"))
}

fn corrupted(path: &Path) -> ArcError {
    ArcError::io(format!("DB corrupted: {}", path.display()))
}

fn io_error(path: &Path, e: std::io::Error) -> ArcError {
    ArcError::io(format!("DB IO error: {}: {}", path.display(), e))
}

fn validate_db_shape(db: &Db, path: &Path) -> Result<(), ArcError> {
    if db.version != 1 {
        warn!(version = db.version, "unsupported DB version");
        return Err(corrupted(path));
    }
    if db.meta.next_unlock_number < 1
        || db.meta.next_snapshot_number < 1
        || db.meta.next_suggestion_number < 1
    {
        return Err(corrupted(path));
    }
    Ok(())
}

/// A missing file reads as an empty store.
pub fn read_db(path: &Path) -> Result<Db, ArcError> {
    match fs::read_to_string(path) {
        Ok(txt) => {
            let db: Db = serde_json::from_str(&txt).map_err(|e| {
                warn!(path = %path.display(), error = %e, "DB failed to parse");
                corrupted(path)
            })?;
            validate_db_shape(&db, path)?;
            Ok(db)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no DB yet, starting empty");
            Ok(default_db())
        }
        Err(e) => Err(io_error(path, e)),
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), ArcError> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => return Ok(()),
    };
    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

    #[cfg(unix)]
    {
        let _ = fs::set_permissions(dir, fs::Permissions::from_mode(0o700));
    }

    Ok(())
}

/// Removes the lock file when the write section ends, including on error.
struct LockGuard {
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to release DB lock");
        }
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

fn acquire_lock(path: &Path) -> Result<LockGuard, ArcError> {
    let lock = lock_path(path);
    match OpenOptions::new().write(true).create_new(true).open(&lock) {
        Ok(_file) => {
            #[cfg(unix)]
            {
                let _ = _file.set_permissions(fs::Permissions::from_mode(0o600));
            }
            debug!(lock = %lock.display(), "DB lock acquired");
            Ok(LockGuard { path: lock })
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(ArcError::io(format!(
            "DB is locked: {} exists",
            lock.display()
        ))),
        Err(e) => Err(io_error(&lock, e)),
    }
}

fn write_db_atomic(path: &Path, db: &Db) -> Result<(), ArcError> {
    validate_db_shape(db, path)?;

    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let tmp_path = dir.join(format!(".db.json.tmp.{}", std::process::id()));

    let mut data = serde_json::to_string_pretty(db)
        .map_err(|e| ArcError::io(format!("DB serialization failed: {}", e)))?;
    data.push('\n');

    {
        let mut f = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|e| io_error(&tmp_path, e))?;

        #[cfg(unix)]
        {
            let _ = f.set_permissions(fs::Permissions::from_mode(0o600));
        }

        f.write_all(data.as_bytes()).map_err(|e| io_error(&tmp_path, e))?;
        f.sync_all().map_err(|e| io_error(&tmp_path, e))?;
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        io_error(path, e)
    })?;

    debug!(path = %path.display(), bytes = data.len(), "DB written");
    Ok(())
}

/// Read-modify-write under the lock. Nothing is written when `mutator` fails,
/// so a rejected update leaves the file untouched.
pub fn update_db<R>(path: &Path, mutator: impl FnOnce(&mut Db) -> Result<R, ArcError>) -> Result<R, ArcError> {
    ensure_parent_dir(path)?;
    let _lock = acquire_lock(path)?;

    let mut db = read_db(path)?;
    let out = mutator(&mut db)?;
    write_db_atomic(path, &db)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = read_db(&dir.path().join("db.json")).unwrap();
        assert!(db.progress.is_empty());
        assert_eq!(db.meta.next_suggestion_number, 1);
    }

    #[test]
    fn failed_mutation_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db.json");

        let res: Result<(), ArcError> = update_db(&path, |db| {
            db.progress.push(crate::model::ProgressAggregate::new("u1", 1));
            Err(ArcError::usage("nope"))
        });
        assert!(res.is_err());
        assert!(!path.exists());
        assert!(!lock_path(&path).exists());
    }

    #[test]
    fn update_persists_and_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");

        update_db(&path, |db| {
            db.progress.push(crate::model::ProgressAggregate::new("u1", 1));
            Ok(())
        })
        .unwrap();

        assert_eq!(read_db(&path).unwrap().progress.len(), 1);
        assert!(!lock_path(&path).exists());
    }

    #[test]
    fn held_lock_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(lock_path(&path), b"").unwrap();

        let err = update_db(&path, |_| Ok(())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
        assert!(err.message.contains("locked"));
    }

    #[test]
    fn garbage_file_is_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(read_db(&path).unwrap_err().kind, ErrorKind::Io);
    }
}
