// crates/engine_core/src/resource/types.rs
use std::io::{self, SeekFrom};
use std::time::SystemTime;

/// A resource that has been opened by its type. Closing is dropping.
pub trait OpenResource: Send {
    fn size(&mut self) -> io::Result<u64>;

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    fn tell(&mut self) -> io::Result<u64>;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Read-only backends keep this default.
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }
}

/// A resource backend, identified by its tag in locations (`tag:path`).
///
/// A storage is an opaque string that only the type interprets: a directory
/// for files, a key prefix for in-memory buffers, an archive for packs...
pub trait ResourceType: Send + Sync {
    fn tag(&self) -> &str;

    /// Resolves `name` inside `storage` into a type-specific path.
    ///
    /// With `require_existence` the type must only answer for resources it can
    /// actually open; without it, it answers with the path the resource
    /// *would* have, which is how callers find where to create new resources.
    fn locate(&self, storage: &str, name: &str, require_existence: bool) -> Option<String>;

    /// Last modification time, if the backend tracks one.
    fn time(&self, path: &str) -> Option<SystemTime>;

    /// Opens `path`. With `erase` the content is discarded (or created);
    /// without it nothing gets destroyed.
    fn open(&self, path: &str, erase: bool) -> io::Result<Box<dyn OpenResource>>;
}

/// Reads until `buf` is full or the resource is exhausted.
pub(crate) fn read_fully(resource: &mut dyn OpenResource, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match resource.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(total)
}
