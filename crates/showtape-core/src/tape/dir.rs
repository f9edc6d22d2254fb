use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::macros::format_description;

use super::error::TapeError;
use super::layout;

const MAX_NAME_ATTEMPTS: u32 = 100;

/// Directory that receives one new tape file per recording session.
#[derive(Debug, Clone)]
pub struct TapeDir {
    dir: PathBuf,
}

impl TapeDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Create a brand-new tape named after the current local time.
    pub fn create_tape(&self) -> Result<(PathBuf, File), TapeError> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        self.create_tape_at(now)
    }

    /// Create a brand-new tape named after `now`.
    ///
    /// Existing files are never opened: a `-N` suffix is added until an unused
    /// name is found.
    pub fn create_tape_at(&self, now: OffsetDateTime) -> Result<(PathBuf, File), TapeError> {
        fs::create_dir_all(&self.dir).map_err(|source| TapeError::Create {
            dir: self.dir.clone(),
            source,
        })?;

        let stem = tape_stem(now);
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{stem}.{}", layout::TAPE_EXTENSION)
            } else {
                format!("{stem}-{attempt}.{}", layout::TAPE_EXTENSION)
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(source) => {
                    return Err(TapeError::Create {
                        dir: self.dir.clone(),
                        source,
                    });
                }
            }
        }
        Err(TapeError::Create {
            dir: self.dir.clone(),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("no free tape name for {stem}"),
            ),
        })
    }

    /// Tape files in this directory, oldest name first.
    ///
    /// Collision suffixes sort numerically after the unsuffixed name, so
    /// `-2` comes before `-10`.
    pub fn list(&self) -> Result<Vec<PathBuf>, TapeError> {
        let mut tapes = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_tape = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(layout::TAPE_EXTENSION));
            if is_tape && path.is_file() {
                tapes.push(path);
            }
        }
        tapes.sort_by_cached_key(|path| name_order(path));
        Ok(tapes)
    }
}

fn name_order(path: &Path) -> (String, u32) {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    // A timestamp stem has six dashes; a seventh introduces the suffix.
    let suffixed = stem
        .rsplit_once('-')
        .filter(|(base, _)| {
            base.starts_with(layout::TAPE_PREFIX) && base.matches('-').count() == 6
        })
        .and_then(|(base, suffix)| Some((base.to_string(), suffix.parse::<u32>().ok()?)));
    suffixed.unwrap_or((stem, 0))
}

fn tape_stem(now: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]-[hour]-[minute]-[second]");
    let stamp = now
        .format(&format)
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("{}{}", layout::TAPE_PREFIX, stamp)
}

#[cfg(test)]
mod tests {
    use super::{TapeDir, tape_stem};
    use std::fs;
    use time::macros::datetime;

    #[test]
    fn stem_encodes_creation_time() {
        let now = datetime!(2024-03-09 07:05:01 UTC);
        assert_eq!(tape_stem(now), "DMX-2024-03-09-07-05-01");
    }

    #[test]
    fn creates_directory_and_unique_names() {
        let temp = tempfile::tempdir().unwrap();
        let tapes = TapeDir::new(temp.path().join("bins"));
        let now = datetime!(2024-03-09 07:05:01 UTC);

        let (first, _) = tapes.create_tape_at(now).unwrap();
        let (second, _) = tapes.create_tape_at(now).unwrap();

        assert_eq!(
            first.file_name().unwrap().to_str().unwrap(),
            "DMX-2024-03-09-07-05-01.bin"
        );
        assert_eq!(
            second.file_name().unwrap().to_str().unwrap(),
            "DMX-2024-03-09-07-05-01-1.bin"
        );
        assert_eq!(tapes.list().unwrap(), vec![first, second]);
    }

    #[test]
    fn existing_tape_is_not_reused() {
        let temp = tempfile::tempdir().unwrap();
        let tapes = TapeDir::new(temp.path());
        let now = datetime!(2024-03-09 07:05:01 UTC);
        let taken = temp.path().join("DMX-2024-03-09-07-05-01.bin");
        fs::write(&taken, b"keep").unwrap();

        let (path, _) = tapes.create_tape_at(now).unwrap();
        assert_ne!(path, taken);
        assert_eq!(fs::read(&taken).unwrap(), b"keep");
    }

    #[test]
    fn list_skips_other_files() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("song.mp3"), b"").unwrap();
        fs::write(temp.path().join("b.bin"), b"").unwrap();
        fs::write(temp.path().join("a.bin"), b"").unwrap();
        let listed = TapeDir::new(temp.path()).list().unwrap();
        let names: Vec<_> = listed
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.bin", "b.bin"]);
    }

    #[test]
    fn list_orders_collision_suffixes_numerically() {
        let temp = tempfile::tempdir().unwrap();
        for name in [
            "DMX-2024-03-09-07-05-01-10.bin",
            "DMX-2024-03-09-07-05-02.bin",
            "DMX-2024-03-09-07-05-01-2.bin",
            "DMX-2024-03-09-07-05-01.bin",
        ] {
            fs::write(temp.path().join(name), b"").unwrap();
        }
        let listed = TapeDir::new(temp.path()).list().unwrap();
        let names: Vec<_> = listed
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "DMX-2024-03-09-07-05-01.bin",
                "DMX-2024-03-09-07-05-01-2.bin",
                "DMX-2024-03-09-07-05-01-10.bin",
                "DMX-2024-03-09-07-05-02.bin",
            ]
        );
    }
}
