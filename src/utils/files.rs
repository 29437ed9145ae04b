use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tempfile::TempPath;

/// Mode requested for a staged file whose target does not exist yet; the umask applies
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o666;

/// A temporary file staged next to its target, renamed over the target on commit.
///
/// Dropping a staged file without committing removes it and leaves the target untouched.
#[derive(Debug)]
pub struct StagedFile {
    /// The temporary file being written
    temp: TempPath,

    /// The file replaced on commit
    target: PathBuf,
}

impl StagedFile {
    /// Stage an empty temporary file in the target's directory
    pub fn new(target: impl AsRef<Path>) -> io::Result<Self> {
        let target = target.as_ref().to_path_buf();

        let dir = target
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let prefix = format!(
            ".{}.",
            target
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        );

        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(".tmp");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            builder.permissions(fs::Permissions::from_mode(NEW_FILE_MODE));
        }

        let temp = builder.tempfile_in(dir)?.into_temp_path();

        // A replacement keeps the permissions of the file it replaces
        if let Ok(metadata) = fs::metadata(&target) {
            fs::set_permissions(&temp, metadata.permissions())?;
        }

        Ok(Self { temp, target })
    }

    /// Stage a copy of the target, or an empty file if the target does not exist yet
    pub fn copy_of(target: impl AsRef<Path>) -> io::Result<Self> {
        let staged = Self::new(target)?;

        if staged.target.is_file() {
            fs::copy(&staged.target, &staged.temp)?;
        }

        Ok(staged)
    }

    /// The path of the temporary file
    pub fn path(&self) -> &Path {
        &self.temp
    }

    /// Atomically rename the temporary file over the target
    pub fn commit(self) -> io::Result<()> {
        self.temp.persist(&self.target).map_err(|err| err.error)
    }
}

/// Replace `target` with `contents` in a single rename
pub fn write_atomically(target: impl AsRef<Path>, contents: &[u8]) -> io::Result<()> {
    let staged = StagedFile::new(target)?;

    fs::write(staged.path(), contents)?;

    staged.commit()
}
