// crates/engine_core/src/resource/file.rs
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::SystemTime;

use super::types::{OpenResource, ResourceType};
use super::DEFAULT_STORAGE;

pub const FILE_TAG: &str = "file";

/// Plain files on disk. A storage is a directory; the default storage means
/// the name is already a path.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileResourceType;

impl FileResourceType {
    fn compose(storage: &str, name: &str) -> String {
        if storage == DEFAULT_STORAGE {
            name.to_string()
        } else {
            format!("{storage}/{name}")
        }
    }
}

impl ResourceType for FileResourceType {
    fn tag(&self) -> &str {
        FILE_TAG
    }

    fn locate(&self, storage: &str, name: &str, require_existence: bool) -> Option<String> {
        let path = Self::compose(storage, name);
        if !require_existence || Path::new(&path).is_file() {
            Some(path)
        } else {
            None
        }
    }

    fn time(&self, path: &str) -> Option<SystemTime> {
        fs::metadata(path).and_then(|meta| meta.modified()).ok()
    }

    fn open(&self, path: &str, erase: bool) -> io::Result<Box<dyn OpenResource>> {
        let file = if erase {
            OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?
        } else {
            // Read-only media or permissions: fall back to reading.
            match OpenOptions::new().read(true).write(true).open(path) {
                Ok(file) => file,
                Err(_) => File::open(path)?,
            }
        };

        Ok(Box::new(FileResource { file }))
    }
}

struct FileResource {
    file: File,
}

impl OpenResource for FileResource {
    fn size(&mut self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }

    fn tell(&mut self) -> io::Result<u64> {
        self.file.stream_position()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn locate_joins_storage_and_name() {
        let dir = TempDir::new().unwrap();
        let storage = dir.path().to_str().unwrap();
        fs::write(dir.path().join("a.txt"), b"abc").unwrap();

        let ty = FileResourceType;
        assert_eq!(
            ty.locate(storage, "a.txt", true),
            Some(format!("{storage}/a.txt"))
        );
        assert_eq!(ty.locate(storage, "b.txt", true), None);
        assert_eq!(
            ty.locate(storage, "b.txt", false),
            Some(format!("{storage}/b.txt"))
        );
        assert_eq!(
            ty.locate(DEFAULT_STORAGE, "b.txt", false),
            Some("b.txt".to_string())
        );
    }

    #[test]
    fn erase_mode_truncates_and_creates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("save.dat");
        let path = path.to_str().unwrap();

        let ty = FileResourceType;
        assert!(ty.open(path, false).is_err());

        let mut res = ty.open(path, true).unwrap();
        assert_eq!(res.write(b"hello").unwrap(), 5);
        drop(res);

        let mut res = ty.open(path, false).unwrap();
        assert_eq!(res.size().unwrap(), 5);
        res.seek(SeekFrom::End(-2)).unwrap();
        assert_eq!(res.tell().unwrap(), 3);
        drop(res);

        let mut res = ty.open(path, true).unwrap();
        assert_eq!(res.size().unwrap(), 0);
    }
}
