pub mod import;
pub mod init;
pub mod migrate;
pub mod rescore;
pub mod score;
pub mod validate;

use std::path::Path;

/// Default bank id derived from an input file name.
pub(crate) fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "bank".to_string())
}
