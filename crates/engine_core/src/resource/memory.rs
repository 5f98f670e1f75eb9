// crates/engine_core/src/resource/memory.rs
use std::collections::HashMap;
use std::io::{self, SeekFrom};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime};

use tracing::warn;

use super::types::{OpenResource, ResourceType};
use super::DEFAULT_STORAGE;

pub const MEMORY_TAG: &str = "mem";

struct MemoryBuffer {
    data: Vec<u8>,
    time: SystemTime,
}

impl MemoryBuffer {
    fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            time: SystemTime::now(),
        }
    }

    // Strictly increasing so that watchers always see a change.
    fn touch(&mut self) {
        let now = SystemTime::now();
        self.time = if now > self.time {
            now
        } else {
            self.time + Duration::from_nanos(1)
        };
    }
}

type SharedBuffer = Arc<Mutex<MemoryBuffer>>;

/// Named byte buffers living in memory. Clones share the same store, so a
/// game can keep one around to feed content after registering it.
#[derive(Clone, Default)]
pub struct MemoryResourceType {
    entries: Arc<RwLock<HashMap<String, SharedBuffer>>>,
}

impl MemoryResourceType {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the buffer stored at `path`.
    pub fn insert(&self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        let path = path.into();
        let data = data.into();
        let Ok(mut entries) = self.entries.write() else {
            warn!("Can't store memory resource <{path}>: store lock is poisoned.");
            return;
        };

        match entries.get(&path) {
            Some(buffer) => match buffer.lock() {
                Ok(mut buffer) => {
                    buffer.data = data;
                    buffer.touch();
                }
                Err(_) => warn!("Can't update memory resource <{path}>: buffer lock is poisoned."),
            },
            None => {
                entries.insert(path, Arc::new(Mutex::new(MemoryBuffer::new(data))));
            }
        }
    }

    pub fn remove(&self, path: &str) -> bool {
        self.entries
            .write()
            .map(|mut entries| entries.remove(path).is_some())
            .unwrap_or(false)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(path))
            .unwrap_or(false)
    }

    fn buffer(&self, path: &str) -> Option<SharedBuffer> {
        self.entries.read().ok()?.get(path).cloned()
    }
}

impl ResourceType for MemoryResourceType {
    fn tag(&self) -> &str {
        MEMORY_TAG
    }

    fn locate(&self, storage: &str, name: &str, require_existence: bool) -> Option<String> {
        let path = if storage == DEFAULT_STORAGE {
            name.to_string()
        } else {
            format!("{storage}/{name}")
        };

        if !require_existence || self.contains(&path) {
            Some(path)
        } else {
            None
        }
    }

    fn time(&self, path: &str) -> Option<SystemTime> {
        let buffer = self.buffer(path)?;
        let buffer = buffer.lock().ok()?;
        Some(buffer.time)
    }

    fn open(&self, path: &str, erase: bool) -> io::Result<Box<dyn OpenResource>> {
        let buffer = match self.buffer(path) {
            Some(buffer) => {
                if erase {
                    let mut locked = buffer
                        .lock()
                        .map_err(|_| io::Error::new(io::ErrorKind::Other, "poisoned buffer"))?;
                    locked.data.clear();
                    locked.touch();
                }
                buffer
            }
            None if erase => {
                let buffer = Arc::new(Mutex::new(MemoryBuffer::new(Vec::new())));
                self.entries
                    .write()
                    .map_err(|_| io::Error::new(io::ErrorKind::Other, "poisoned store"))?
                    .insert(path.to_string(), buffer.clone());
                buffer
            }
            None => return Err(io::Error::from(io::ErrorKind::NotFound)),
        };

        Ok(Box::new(MemoryResource { buffer, cursor: 0 }))
    }
}

struct MemoryResource {
    buffer: SharedBuffer,
    cursor: u64,
}

impl MemoryResource {
    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, MemoryBuffer>> {
        self.buffer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "poisoned buffer"))
    }
}

impl OpenResource for MemoryResource {
    fn size(&mut self) -> io::Result<u64> {
        Ok(self.lock()?.data.len() as u64)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.lock()?.data.len() as u64;
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(offset) => self.cursor.checked_add_signed(offset),
            SeekFrom::End(offset) => len.checked_add_signed(offset),
        };

        let Some(target) = target else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek out of resource bounds",
            ));
        };

        self.cursor = target;
        Ok(self.cursor)
    }

    fn tell(&mut self) -> io::Result<u64> {
        Ok(self.cursor)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let cursor = self.cursor as usize;
        let guard = self.lock()?;
        if cursor >= guard.data.len() {
            return Ok(0);
        }

        let count = buf.len().min(guard.data.len() - cursor);
        buf[..count].copy_from_slice(&guard.data[cursor..cursor + count]);
        drop(guard);

        self.cursor += count as u64;
        Ok(count)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let cursor = self.cursor as usize;
        let end = usize::try_from(self.cursor)
            .ok()
            .and_then(|cursor| cursor.checked_add(buf.len()))
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "write out of range"))?;

        let mut guard = self.lock()?;
        if guard.data.len() < end {
            guard.data.resize(end, 0);
        }
        guard.data[cursor..end].copy_from_slice(buf);
        guard.touch();
        drop(guard);

        self.cursor += buf.len() as u64;
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_land_in_the_shared_store() {
        let store = MemoryResourceType::new();
        let mut res = store.open("save/slot1", true).unwrap();
        res.write(b"level=3").unwrap();
        drop(res);

        let mut res = store.clone().open("save/slot1", false).unwrap();
        let mut buf = [0u8; 16];
        let n = res.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"level=3");
    }

    #[test]
    fn touching_always_moves_time_forward() {
        let store = MemoryResourceType::new();
        store.insert("a", b"1".to_vec());
        let before = store.time("a").unwrap();
        store.insert("a", b"2".to_vec());
        assert!(store.time("a").unwrap() > before);
    }

    #[test]
    fn seek_past_the_end_reads_nothing() {
        let store = MemoryResourceType::new();
        store.insert("blob", vec![1u8, 2, 3]);

        let mut res = store.open("blob", false).unwrap();
        assert_eq!(res.seek(SeekFrom::End(2)).unwrap(), 5);
        let mut buf = [0u8; 4];
        assert_eq!(res.read(&mut buf).unwrap(), 0);
        assert!(res.seek(SeekFrom::Current(-10)).is_err());
        assert_eq!(res.tell().unwrap(), 5);
    }

    #[test]
    fn seek_overflow_is_rejected() {
        let store = MemoryResourceType::new();
        store.insert("blob", vec![1u8, 2, 3]);

        let mut res = store.open("blob", false).unwrap();
        assert_eq!(res.seek(SeekFrom::Start(u64::MAX)).unwrap(), u64::MAX);
        let err = res.seek(SeekFrom::Current(1)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(res.tell().unwrap(), u64::MAX);
    }
}
