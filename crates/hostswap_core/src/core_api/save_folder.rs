use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{CoreError, CoreErrorCode};

pub const COMPANION_FILE_NAME: &str = "SaveGameInfo";
pub const BACKUP_SUFFIX: &str = ".backup";

/// Paths of the two documents making up one save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFolder {
    pub main: PathBuf,
    pub companion: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTexts {
    pub main: String,
    pub companion: Option<String>,
}

impl SaveFolder {
    /// Accepts either a save directory or the main save file.
    ///
    /// The game names the main file after its directory
    /// (`Farm_123/Farm_123`) and keeps `SaveGameInfo` next to it. The
    /// companion is optional; the main file is not.
    pub fn locate(path: &Path) -> Result<Self, CoreError> {
        if path.is_dir() {
            let name = path.file_name().ok_or_else(|| {
                CoreError::new(
                    CoreErrorCode::Io,
                    format!("cannot derive a save name from {}", path.display()),
                )
            })?;
            let main = path.join(name);
            if !main.is_file() {
                return Err(CoreError::new(
                    CoreErrorCode::Io,
                    format!(
                        "no save file named {} in {}",
                        name.to_string_lossy(),
                        path.display()
                    ),
                ));
            }
            return Ok(Self {
                companion: sibling_companion(path, &main),
                main,
            });
        }

        if path.is_file() {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            return Ok(Self {
                companion: sibling_companion(dir, path),
                main: path.to_path_buf(),
            });
        }

        Err(CoreError::new(
            CoreErrorCode::Io,
            format!("{} does not exist", path.display()),
        ))
    }

    pub fn read(&self) -> Result<SaveTexts, CoreError> {
        let main = read_text(&self.main)?;
        let companion = self.companion.as_deref().map(read_text).transpose()?;
        Ok(SaveTexts { main, companion })
    }
}

/// `path` with [`BACKUP_SUFFIX`] appended to its file name.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(BACKUP_SUFFIX);
    path.with_file_name(name)
}

fn sibling_companion(dir: &Path, main: &Path) -> Option<PathBuf> {
    let companion = dir.join(COMPANION_FILE_NAME);
    (companion.is_file() && companion != main).then_some(companion)
}

fn read_text(path: &Path) -> Result<String, CoreError> {
    fs::read_to_string(path).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Io,
            format!("failed to read {}: {e}", path.display()),
        )
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{SaveFolder, backup_path};
    use crate::core_api::CoreErrorCode;

    #[test]
    fn locate_directory_finds_main_and_companion() {
        let root = temp_test_dir("locate_dir");
        let dir = root.join("Farm_42");
        fs::create_dir_all(&dir).expect("failed to create save dir");
        fs::write(dir.join("Farm_42"), "<SaveGame/>").expect("failed to write main save");
        fs::write(dir.join("SaveGameInfo"), "<Farmer/>").expect("failed to write companion");

        let folder = SaveFolder::locate(&dir).expect("save folder should resolve");
        assert_eq!(folder.main, dir.join("Farm_42"));
        assert_eq!(folder.companion, Some(dir.join("SaveGameInfo")));

        let from_file = SaveFolder::locate(&folder.main).expect("main file should resolve");
        assert_eq!(from_file, folder);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn locate_directory_without_main_file_is_io_error() {
        let root = temp_test_dir("locate_missing");
        let dir = root.join("Farm_7");
        fs::create_dir_all(&dir).expect("failed to create save dir");

        let err = SaveFolder::locate(&dir).expect_err("missing main save should fail");
        assert_eq!(err.code, CoreErrorCode::Io);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("/saves/Farm_1/SaveGameInfo")),
            PathBuf::from("/saves/Farm_1/SaveGameInfo.backup")
        );
    }

    fn temp_test_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "hostswap_{}_{}_{}",
            prefix,
            std::process::id(),
            nanos
        ))
    }
}
