mod engine;
mod error;
mod save_folder;

pub use engine::{Engine, Session};
pub use error::{CoreError, CoreErrorCode};
pub use save_folder::{BACKUP_SUFFIX, COMPANION_FILE_NAME, SaveFolder, SaveTexts, backup_path};
