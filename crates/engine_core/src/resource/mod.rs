// crates/engine_core/src/resource/mod.rs
//! Resource location and access.
//!
//! Resources are looked up by *group* (e.g. "Texture", "Config") and *name*.
//! Each group owns an ordered list of storages; each registered resource type
//! gets a chance to find the name in each storage, in order. The first hit is
//! returned as a location (`tag:path`) and cached. Locations are then opened
//! through the type that owns their tag.

mod file;
mod group;
mod memory;
mod types;
mod worker;

use std::collections::HashMap;
use std::io::SeekFrom;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use crossbeam_channel::Receiver;
use tracing::{debug, warn};

use engine_shared::resource_types::{make_location, ResourceEvent, LOCATION_SEPARATOR};

use crate::config::ResourceConfig;
use crate::engine::ModuleId;
use crate::error::{ResourceError, ResourceResult};
use crate::events::EventBus;

pub use file::{FileResourceType, FILE_TAG};
pub use memory::{MemoryResourceType, MEMORY_TAG};
pub use types::{OpenResource, ResourceType};

use group::{CachedLocation, ResourceGroup};
use worker::{Completion, Job, OpId, SharedResource, Worker};

/// Storage every group starts with.
pub const DEFAULT_STORAGE: &str = ".";

/// Modules the resource manager relies on.
pub fn setup() -> &'static [ModuleId] {
    &[ModuleId::Config, ModuleId::Event]
}

/// Opaque handle to an open resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(u64);

pub type ReadCallback = Box<dyn FnOnce(ResourceHandle, ResourceResult<Vec<u8>>)>;
pub type WriteCallback = Box<dyn FnOnce(ResourceHandle, ResourceResult<usize>)>;

struct OpenInfo {
    ty: Arc<dyn ResourceType>,
    location: String,
    resource: SharedResource,
    pending_ops: usize,
    close_requested: bool,
}

enum PendingCallback {
    Read(ReadCallback),
    Write(WriteCallback),
}

struct PendingOp {
    handle: ResourceHandle,
    callback: PendingCallback,
}

pub struct ResourceManager {
    config: ResourceConfig,
    config_loaded: bool,
    types: Vec<Arc<dyn ResourceType>>,
    groups: Vec<ResourceGroup>,
    open: HashMap<ResourceHandle, OpenInfo>,
    next_handle: u64,
    pending: HashMap<OpId, PendingOp>,
    next_op: OpId,
    worker: Worker,
    events: EventBus<ResourceEvent>,
    last_watch: Instant,
}

impl ResourceManager {
    /// Creates a manager with the `file` type registered.
    pub fn init(config: ResourceConfig) -> ResourceResult<Self> {
        let worker = Worker::spawn().map_err(|err| {
            warn!("Couldn't init resource module: can't start worker thread: {err}");
            ResourceError::Io(err)
        })?;

        let mut manager = Self {
            config,
            config_loaded: false,
            types: Vec::new(),
            groups: Vec::new(),
            open: HashMap::new(),
            next_handle: 1,
            pending: HashMap::new(),
            next_op: 1,
            worker,
            events: EventBus::new(),
            last_watch: Instant::now(),
        };

        manager.register_type(Arc::new(FileResourceType))?;
        Ok(manager)
    }

    /// Finishes pending operations, closes everything and stops the worker.
    pub fn exit(mut self) {
        self.wait_for_pending_ops(Duration::from_secs(5));
        if !self.open.is_empty() {
            debug!("closing {} resource(s) left open", self.open.len());
        }
        self.open.clear();
        self.worker.stop();
    }

    pub fn subscribe(&mut self) -> Receiver<ResourceEvent> {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// Registers a resource type. The last registered type is tried first.
    pub fn register_type(&mut self, ty: Arc<dyn ResourceType>) -> ResourceResult<()> {
        let tag = ty.tag();
        if tag.is_empty() || tag.contains(LOCATION_SEPARATOR) {
            warn!("Can't register resource type with tag <{tag}>: invalid tag.");
            return Err(ResourceError::InvalidType(tag.to_string()));
        }

        if self.get_type(tag).is_some() {
            warn!("Can't register resource type with tag <{tag}>: tag is already used by a registered type.");
            return Err(ResourceError::DuplicateType(tag.to_string()));
        }

        debug!(tag, "registered resource type");
        self.types.push(ty);
        Ok(())
    }

    pub fn type_counter(&self) -> usize {
        self.types.len()
    }

    /// Tag of the type at `index`, in registration order.
    pub fn type_tag(&self, index: usize) -> Option<&str> {
        self.types.get(index).map(|ty| ty.tag())
    }

    pub fn get_type(&self, tag: &str) -> Option<Arc<dyn ResourceType>> {
        self.types
            .iter()
            .find(|ty| ty.tag().eq_ignore_ascii_case(tag))
            .cloned()
    }

    // ------------------------------------------------------------------
    // Groups & storages
    // ------------------------------------------------------------------

    fn find_group(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == name)
    }

    fn group_or_create(&mut self, name: &str) -> usize {
        match self.find_group(name) {
            Some(index) => index,
            None => {
                self.groups.push(ResourceGroup::new(name));
                self.groups.len() - 1
            }
        }
    }

    /// Adds a storage to a group, before (`add_first`) or after the existing ones.
    pub fn add_storage(&mut self, group: &str, storage: &str, add_first: bool) -> ResourceResult<()> {
        if group.is_empty() {
            return Err(ResourceError::InvalidGroup);
        }

        let index = self.group_or_create(group);
        self.groups[index].add_storage(storage, add_first);

        self.events.emit(ResourceEvent::Add {
            group: group.to_string(),
            storage: storage.to_string(),
        });
        Ok(())
    }

    pub fn remove_storage(&mut self, group: &str, storage: &str) -> ResourceResult<()> {
        if group.is_empty() {
            return Err(ResourceError::InvalidGroup);
        }

        let removed = self
            .find_group(group)
            .map(|index| self.groups[index].remove_storage(storage))
            .unwrap_or(false);

        if !removed {
            return Err(ResourceError::StorageNotFound {
                group: group.to_string(),
                storage: storage.to_string(),
            });
        }

        self.events.emit(ResourceEvent::Remove {
            group: group.to_string(),
            storage: storage.to_string(),
        });
        Ok(())
    }

    /// Appends configured storages that aren't already part of their group.
    pub fn reload_storage(&mut self) -> ResourceResult<()> {
        self.config_loaded = true;

        let mut first_error = None;
        let groups = self.config.groups.clone();
        for (group, storages) in &groups {
            for storage in storages {
                let present = self
                    .find_group(group)
                    .map(|index| self.groups[index].has_storage(storage))
                    .unwrap_or(false);
                if present {
                    continue;
                }

                if let Err(err) = self.add_storage(group, storage, false) {
                    warn!("Can't add storage <{storage}> to resource group <{group}>: {err}");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn ensure_config_loaded(&mut self) {
        if !self.config_loaded {
            // Failures are already logged per storage.
            let _ = self.reload_storage();
        }
    }

    pub fn group_counter(&self) -> usize {
        self.groups.len()
    }

    pub fn group(&self, index: usize) -> Option<&str> {
        self.groups.get(index).map(|g| g.name.as_str())
    }

    pub fn storage_counter(&self, group: &str) -> usize {
        self.find_group(group)
            .map(|index| self.groups[index].storages.len())
            .unwrap_or(0)
    }

    pub fn storage(&self, group: &str, index: usize) -> Option<&str> {
        let group = &self.groups[self.find_group(group)?];
        group.storages.get(index).map(String::as_str)
    }

    // ------------------------------------------------------------------
    // Location
    // ------------------------------------------------------------------

    /// Finds an existing resource in a group and caches its location.
    pub fn locate(&mut self, group: &str, name: &str) -> Option<String> {
        self.ensure_config_loaded();
        if group.is_empty() {
            return None;
        }

        let index = self.group_or_create(group);
        if let Some(cached) = self.groups[index].cache.get(name) {
            return Some(cached.location.clone());
        }

        let storages = self.groups[index].storages.clone();
        let (ty, path) = storages
            .iter()
            .find_map(|storage| self.locate_with_types(storage, name, true))?;

        let location = make_location(ty.tag(), &path);
        let time = ty.time(&path);
        self.groups[index].cache.insert(
            name.to_string(),
            CachedLocation {
                location: location.clone(),
                path,
                ty,
                time,
            },
        );
        Some(location)
    }

    /// Like `locate`, restricted to one storage and without caching.
    pub fn locate_in_storage(&mut self, group: &str, storage: &str, name: &str) -> Option<String> {
        self.ensure_config_loaded();
        if group.is_empty() {
            return None;
        }

        let index = self.group_or_create(group);
        if !self.groups[index].has_storage(storage) {
            return None;
        }

        self.locate_with_types(storage, name, true)
            .map(|(ty, path)| make_location(ty.tag(), &path))
    }

    /// Location a resource has, or would have, in a storage (the group's first
    /// one when `storage` is `None`). Nothing is cached.
    pub fn get_location(&mut self, group: &str, storage: Option<&str>, name: &str) -> Option<String> {
        self.ensure_config_loaded();
        if group.is_empty() {
            return None;
        }

        let index = self.group_or_create(group);
        let storage = match storage {
            Some(storage) => self.groups[index]
                .storages
                .iter()
                .find(|s| s.as_str() == storage)?
                .clone(),
            None => self.groups[index].storages.first()?.clone(),
        };

        self.locate_with_types(&storage, name, false)
            .map(|(ty, path)| make_location(ty.tag(), &path))
    }

    fn locate_with_types(
        &self,
        storage: &str,
        name: &str,
        require_existence: bool,
    ) -> Option<(Arc<dyn ResourceType>, String)> {
        self.types.iter().rev().find_map(|ty| {
            ty.locate(storage, name, require_existence)
                .map(|path| (ty.clone(), path))
        })
    }

    fn split_location<'a>(&self, location: &'a str) -> Option<(Arc<dyn ResourceType>, &'a str)> {
        let (tag, path) = location.split_once(LOCATION_SEPARATOR)?;
        self.get_type(tag).map(|ty| (ty, path))
    }

    /// Type-specific part of a location.
    pub fn get_path<'a>(&self, location: &'a str) -> Option<&'a str> {
        self.split_location(location).map(|(_, path)| path)
    }

    pub fn get_time(&self, location: &str) -> Option<SystemTime> {
        let (ty, path) = self.split_location(location)?;
        ty.time(path)
    }

    pub fn clear_cache(&mut self) {
        for group in &mut self.groups {
            group.cache.clear();
        }
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    pub fn open(&mut self, location: &str, erase: bool) -> ResourceResult<ResourceHandle> {
        let Some((ty, path)) = self.split_location(location) else {
            warn!("Can't open resource <{location}>: unknown resource type.");
            return Err(ResourceError::UnknownType(location.to_string()));
        };

        let resource = ty.open(path, erase).map_err(|source| {
            debug!("Can't open resource <{location}> of type <{}>: {source}", ty.tag());
            ResourceError::Open {
                location: location.to_string(),
                source,
            }
        })?;

        let handle = ResourceHandle(self.next_handle);
        self.next_handle += 1;
        self.open.insert(
            handle,
            OpenInfo {
                ty,
                location: location.to_string(),
                resource: Arc::new(Mutex::new(resource)),
                pending_ops: 0,
                close_requested: false,
            },
        );
        Ok(handle)
    }

    /// Closes a resource; with operations in flight, once they are done.
    pub fn close(&mut self, handle: ResourceHandle) {
        match self.open.get_mut(&handle) {
            Some(info) if info.pending_ops > 0 => info.close_requested = true,
            Some(_) => {
                self.open.remove(&handle);
            }
            None => {}
        }
    }

    fn live(&self, handle: ResourceHandle) -> ResourceResult<&OpenInfo> {
        self.open
            .get(&handle)
            .filter(|info| !info.close_requested)
            .ok_or(ResourceError::InvalidHandle(handle))
    }

    fn with_resource<T>(
        &self,
        handle: ResourceHandle,
        op: impl FnOnce(&mut dyn OpenResource) -> std::io::Result<T>,
    ) -> ResourceResult<T> {
        let info = self.live(handle)?;
        let mut guard = info.resource.lock().map_err(|_| ResourceError::Poisoned)?;
        Ok(op(&mut **guard)?)
    }

    /// Location an open handle was opened from.
    pub fn location(&self, handle: ResourceHandle) -> Option<&str> {
        self.open.get(&handle).map(|info| info.location.as_str())
    }

    pub fn size(&self, handle: ResourceHandle) -> ResourceResult<u64> {
        self.with_resource(handle, |res| res.size())
    }

    pub fn seek(&self, handle: ResourceHandle, pos: SeekFrom) -> ResourceResult<u64> {
        self.with_resource(handle, |res| res.seek(pos))
    }

    pub fn tell(&self, handle: ResourceHandle) -> ResourceResult<u64> {
        self.with_resource(handle, |res| res.tell())
    }

    /// Reads up to `buf.len()` bytes; fewer only at the end of the resource.
    pub fn read(&self, handle: ResourceHandle, buf: &mut [u8]) -> ResourceResult<usize> {
        self.with_resource(handle, |res| types::read_fully(res, buf))
    }

    pub fn write(&self, handle: ResourceHandle, buf: &[u8]) -> ResourceResult<usize> {
        let info = self.live(handle)?;
        let tag = info.ty.tag().to_string();
        self.with_resource(handle, |res| res.write(buf))
            .map_err(|err| write_error(err, &tag))
    }

    /// Opens, reads entirely and closes a location.
    pub fn read_all(&mut self, location: &str) -> ResourceResult<Vec<u8>> {
        let handle = self.open(location, false)?;
        let result = self.size(handle).and_then(|size| {
            let mut buffer = vec![0u8; size as usize];
            let count = self.read(handle, &mut buffer)?;
            buffer.truncate(count);
            Ok(buffer)
        });
        self.close(handle);
        result
    }

    /// Queues a read of `size` bytes from the current position. `callback`
    /// runs during a later `update()`.
    pub fn read_async(
        &mut self,
        handle: ResourceHandle,
        size: usize,
        callback: impl FnOnce(ResourceHandle, ResourceResult<Vec<u8>>) + 'static,
    ) -> ResourceResult<()> {
        let resource = self.live(handle)?.resource.clone();
        self.submit(
            handle,
            Job::Read { resource, size },
            PendingCallback::Read(Box::new(callback)),
        )
    }

    pub fn write_async(
        &mut self,
        handle: ResourceHandle,
        data: Vec<u8>,
        callback: impl FnOnce(ResourceHandle, ResourceResult<usize>) + 'static,
    ) -> ResourceResult<()> {
        let resource = self.live(handle)?.resource.clone();
        self.submit(
            handle,
            Job::Write { resource, data },
            PendingCallback::Write(Box::new(callback)),
        )
    }

    fn submit(&mut self, handle: ResourceHandle, job: Job, callback: PendingCallback) -> ResourceResult<()> {
        let op = self.next_op;
        self.next_op += 1;

        if self.worker.submit(op, job).is_err() {
            return Err(ResourceError::WorkerStopped);
        }

        if let Some(info) = self.open.get_mut(&handle) {
            info.pending_ops += 1;
        }
        self.pending.insert(op, PendingOp { handle, callback });
        Ok(())
    }

    pub fn pending_op_counter(&self, handle: ResourceHandle) -> usize {
        self.open.get(&handle).map(|info| info.pending_ops).unwrap_or(0)
    }

    pub fn total_pending_op_counter(&self) -> usize {
        self.open.values().map(|info| info.pending_ops).sum()
    }

    fn finish_op(&mut self, op: OpId, completion: Completion) {
        let Some(PendingOp { handle, callback }) = self.pending.remove(&op) else {
            return;
        };

        let mut tag = String::new();
        if let Some(info) = self.open.get_mut(&handle) {
            info.pending_ops = info.pending_ops.saturating_sub(1);
            tag = info.ty.tag().to_string();
            if info.close_requested && info.pending_ops == 0 {
                self.open.remove(&handle);
            }
        }

        match (callback, completion) {
            (PendingCallback::Read(callback), Completion::Read(result)) => {
                callback(handle, result.map_err(ResourceError::from))
            }
            (PendingCallback::Write(callback), Completion::Write(result)) => {
                callback(handle, result.map_err(|err| write_error(ResourceError::Io(err), &tag)))
            }
            _ => warn!("mismatched completion for resource operation {op}"),
        }
    }

    /// Blocks until every queued operation completed or `timeout` elapsed.
    /// Returns whether nothing is left pending.
    pub fn wait_for_pending_ops(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.pending.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            match self.worker.wait_completion(deadline - now) {
                Some((op, completion)) => self.finish_op(op, completion),
                None => return self.pending.is_empty(),
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // Frame update
    // ------------------------------------------------------------------

    /// Runs callbacks of completed operations and, every watch interval,
    /// looks for modified resources in watched groups.
    pub fn update(&mut self) {
        while let Some((op, completion)) = self.worker.try_completion() {
            self.finish_op(op, completion);
        }

        let interval = Duration::from_millis(self.config.watch_interval_ms);
        if !self.config.watch_list.is_empty() && self.last_watch.elapsed() >= interval {
            self.poll_watched();
        }
    }

    /// Checks cached resources of watched groups for modification right away.
    pub fn poll_watched(&mut self) {
        self.last_watch = Instant::now();

        let mut updates = Vec::new();
        for group in &mut self.groups {
            if !self.config.watch_list.iter().any(|g| g == &group.name) {
                continue;
            }

            for (name, cached) in &mut group.cache {
                let Some(time) = cached.ty.time(&cached.path) else {
                    continue;
                };
                if cached.time != Some(time) {
                    cached.time = Some(time);
                    updates.push(ResourceEvent::Update {
                        group: group.name.clone(),
                        name: name.clone(),
                        location: cached.location.clone(),
                        time,
                    });
                }
            }
        }

        for event in updates {
            debug!(group = event.group(), "resource updated");
            self.events.emit(event);
        }
    }
}

fn write_error(err: ResourceError, tag: &str) -> ResourceError {
    match err {
        ResourceError::Io(io) if io.kind() == std::io::ErrorKind::Unsupported => {
            ResourceError::WriteUnsupported(tag.to_string())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_shared::resource_types::ResourceEventKind;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn manager() -> ResourceManager {
        ResourceManager::init(ResourceConfig::default()).unwrap()
    }

    fn with_memory(manager: &mut ResourceManager) -> MemoryResourceType {
        let store = MemoryResourceType::new();
        manager.register_type(Arc::new(store.clone())).unwrap();
        store
    }

    #[test]
    fn file_type_is_registered_on_init() {
        let manager = manager();
        assert_eq!(manager.type_counter(), 1);
        assert_eq!(manager.type_tag(0), Some(FILE_TAG));
        assert!(manager.get_type("FILE").is_some());
    }

    #[test]
    fn duplicate_and_invalid_tags_are_rejected() {
        let mut manager = manager();
        assert!(matches!(
            manager.register_type(Arc::new(FileResourceType)),
            Err(ResourceError::DuplicateType(_))
        ));

        struct Broken(&'static str);
        impl ResourceType for Broken {
            fn tag(&self) -> &str {
                self.0
            }
            fn locate(&self, _: &str, _: &str, _: bool) -> Option<String> {
                None
            }
            fn time(&self, _: &str) -> Option<SystemTime> {
                None
            }
            fn open(&self, _: &str, _: bool) -> std::io::Result<Box<dyn OpenResource>> {
                Err(std::io::Error::from(std::io::ErrorKind::NotFound))
            }
        }

        for tag in ["bad:tag", ""] {
            assert!(matches!(
                manager.register_type(Arc::new(Broken(tag))),
                Err(ResourceError::InvalidType(_))
            ));
        }
        assert_eq!(manager.type_counter(), 1);
    }

    #[test]
    fn groups_are_created_with_the_default_storage() {
        let mut manager = manager();
        manager.add_storage("Texture", "gfx", false).unwrap();

        assert_eq!(manager.group_counter(), 1);
        assert_eq!(manager.group(0), Some("Texture"));
        assert_eq!(manager.storage_counter("Texture"), 2);
        assert_eq!(manager.storage("Texture", 0), Some(DEFAULT_STORAGE));
        assert_eq!(manager.storage("Texture", 1), Some("gfx"));
        assert_eq!(manager.storage("Texture", 2), None);
        assert_eq!(manager.storage_counter("Sound"), 0);
        assert!(matches!(
            manager.add_storage("", "gfx", true),
            Err(ResourceError::InvalidGroup)
        ));
    }

    #[test]
    fn storage_events_are_emitted() {
        let mut manager = manager();
        let events = manager.subscribe();

        manager.add_storage("Sound", "sfx", true).unwrap();
        manager.remove_storage("Sound", "sfx").unwrap();
        assert!(manager.remove_storage("Sound", "sfx").is_err());

        assert_eq!(
            events.try_recv().unwrap(),
            ResourceEvent::Add {
                group: "Sound".into(),
                storage: "sfx".into()
            }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            ResourceEvent::Remove {
                group: "Sound".into(),
                storage: "sfx".into()
            }
        );
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn locate_walks_storages_in_order_and_caches() {
        let mut manager = manager();
        let store = with_memory(&mut manager);
        store.insert("low/hero.png", b"low".to_vec());
        store.insert("high/hero.png", b"high".to_vec());

        manager.add_storage("Texture", "low", false).unwrap();
        assert_eq!(
            manager.locate("Texture", "hero.png").as_deref(),
            Some("mem:low/hero.png")
        );

        manager.add_storage("Texture", "high", true).unwrap();
        assert_eq!(
            manager.locate("Texture", "hero.png").as_deref(),
            Some("mem:high/hero.png")
        );

        // Served from cache even after the backing entry disappears.
        store.remove("high/hero.png");
        assert_eq!(
            manager.locate("Texture", "hero.png").as_deref(),
            Some("mem:high/hero.png")
        );
        manager.clear_cache();
        assert_eq!(
            manager.locate("Texture", "hero.png").as_deref(),
            Some("mem:low/hero.png")
        );

        assert_eq!(manager.locate("Texture", "missing.png"), None);
        assert_eq!(manager.locate("", "hero.png"), None);
    }

    #[test]
    fn later_types_take_priority() {
        let dir = TempDir::new().unwrap();
        let storage = dir.path().to_str().unwrap().to_string();
        fs::write(dir.path().join("intro.ogg"), b"disk").unwrap();

        let mut manager = manager();
        manager.add_storage("Sound", &storage, true).unwrap();
        assert_eq!(
            manager.locate("Sound", "intro.ogg"),
            Some(format!("file:{storage}/intro.ogg"))
        );

        let store = with_memory(&mut manager);
        store.insert(format!("{storage}/intro.ogg"), b"mem".to_vec());
        manager.clear_cache();
        assert_eq!(
            manager.locate("Sound", "intro.ogg"),
            Some(format!("mem:{storage}/intro.ogg"))
        );
    }

    #[test]
    fn get_location_does_not_require_existence() {
        let mut manager = manager();
        manager.add_storage("Save", "saves", true).unwrap();

        assert_eq!(
            manager.get_location("Save", None, "slot1.sav").as_deref(),
            Some("file:saves/slot1.sav")
        );
        assert_eq!(
            manager.get_location("Save", Some(DEFAULT_STORAGE), "slot1.sav").as_deref(),
            Some("file:slot1.sav")
        );
        assert_eq!(manager.get_location("Save", Some("elsewhere"), "slot1.sav"), None);
        assert_eq!(manager.locate_in_storage("Save", "saves", "slot1.sav"), None);
    }

    #[test]
    fn config_storages_load_lazily_without_duplicates() {
        let mut config = ResourceConfig::default();
        config
            .groups
            .insert("Data".into(), vec!["a".into(), "b".into(), "a".into()]);

        let mut manager = ResourceManager::init(config).unwrap();
        manager.add_storage("Data", "b", false).unwrap();
        assert_eq!(manager.storage_counter("Data"), 2);

        let _ = manager.locate("Data", "anything");
        assert_eq!(manager.storage_counter("Data"), 3);
        assert_eq!(manager.storage("Data", 1), Some("b"));
        assert_eq!(manager.storage("Data", 2), Some("a"));

        manager.reload_storage().unwrap();
        assert_eq!(manager.storage_counter("Data"), 3);
    }

    #[test]
    fn paths_and_times_come_from_the_location() {
        let mut manager = manager();
        let store = with_memory(&mut manager);
        store.insert("cfg/game.toml", b"".to_vec());

        assert_eq!(manager.get_path("MEM:cfg/game.toml"), Some("cfg/game.toml"));
        assert_eq!(manager.get_path("zip:cfg/game.toml"), None);
        assert_eq!(manager.get_path("no separator"), None);
        assert!(manager.get_time("mem:cfg/game.toml").is_some());
        assert!(manager.get_time("mem:cfg/other.toml").is_none());
    }

    #[test]
    fn sync_access_round_trip() {
        let mut manager = manager();
        with_memory(&mut manager);

        let handle = manager.open("mem:notes", true).unwrap();
        assert_eq!(manager.write(handle, b"hello world").unwrap(), 11);
        assert_eq!(manager.size(handle).unwrap(), 11);
        assert_eq!(manager.seek(handle, SeekFrom::Start(6)).unwrap(), 6);

        let mut buf = [0u8; 32];
        let n = manager.read(handle, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"world");
        assert_eq!(manager.tell(handle).unwrap(), 11);
        manager.close(handle);

        assert!(matches!(
            manager.size(handle),
            Err(ResourceError::InvalidHandle(_))
        ));
        assert_eq!(manager.read_all("mem:notes").unwrap(), b"hello world");
    }

    #[test]
    fn open_reports_unknown_types_and_missing_resources() {
        let mut manager = manager();
        assert!(matches!(
            manager.open("zip:pack/a.png", false),
            Err(ResourceError::UnknownType(_))
        ));

        with_memory(&mut manager);
        assert!(matches!(
            manager.open("mem:nothing", false),
            Err(ResourceError::Open { .. })
        ));
    }

    #[test]
    fn write_on_read_only_type_is_unsupported() {
        struct ReadOnly;
        struct Bytes(std::io::Cursor<Vec<u8>>);

        impl OpenResource for Bytes {
            fn size(&mut self) -> std::io::Result<u64> {
                Ok(self.0.get_ref().len() as u64)
            }
            fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
                std::io::Seek::seek(&mut self.0, pos)
            }
            fn tell(&mut self) -> std::io::Result<u64> {
                Ok(self.0.position())
            }
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                std::io::Read::read(&mut self.0, buf)
            }
        }

        impl ResourceType for ReadOnly {
            fn tag(&self) -> &str {
                "rom"
            }
            fn locate(&self, _: &str, name: &str, _: bool) -> Option<String> {
                Some(name.to_string())
            }
            fn time(&self, _: &str) -> Option<SystemTime> {
                None
            }
            fn open(&self, _: &str, _: bool) -> std::io::Result<Box<dyn OpenResource>> {
                Ok(Box::new(Bytes(std::io::Cursor::new(b"rom".to_vec()))))
            }
        }

        let mut manager = manager();
        manager.register_type(Arc::new(ReadOnly)).unwrap();
        let handle = manager.open("rom:bios", false).unwrap();
        assert!(matches!(
            manager.write(handle, b"x"),
            Err(ResourceError::WriteUnsupported(tag)) if tag == "rom"
        ));
    }

    #[test]
    fn async_ops_count_as_pending_until_dispatched() {
        let mut manager = manager();
        let store = with_memory(&mut manager);
        store.insert("blob", b"0123456789".to_vec());

        let handle = manager.open("mem:blob", false).unwrap();
        let read = Rc::new(RefCell::new(None));
        let sink = read.clone();
        manager
            .read_async(handle, 4, move |_, result| {
                *sink.borrow_mut() = Some(result.unwrap());
            })
            .unwrap();

        assert_eq!(manager.pending_op_counter(handle), 1);
        assert_eq!(manager.total_pending_op_counter(), 1);
        assert!(read.borrow().is_none());

        assert!(manager.wait_for_pending_ops(Duration::from_secs(5)));
        assert_eq!(read.borrow().as_deref(), Some(&b"0123"[..]));
        assert_eq!(manager.total_pending_op_counter(), 0);
    }

    #[test]
    fn close_is_deferred_while_ops_are_pending() {
        let mut manager = manager();
        with_memory(&mut manager);

        let handle = manager.open("mem:out", true).unwrap();
        let written = Rc::new(RefCell::new(0));
        let sink = written.clone();
        manager
            .write_async(handle, b"abc".to_vec(), move |_, result| {
                *sink.borrow_mut() = result.unwrap();
            })
            .unwrap();

        manager.close(handle);
        assert!(manager.size(handle).is_err());
        assert_eq!(manager.pending_op_counter(handle), 1);

        assert!(manager.wait_for_pending_ops(Duration::from_secs(5)));
        assert_eq!(*written.borrow(), 3);
        assert_eq!(manager.pending_op_counter(handle), 0);
        assert!(manager.location(handle).is_none());
        assert_eq!(manager.read_all("mem:out").unwrap(), b"abc");
    }

    #[test]
    fn watched_groups_report_updates() {
        let mut config = ResourceConfig::default();
        config.watch_list.push("Config".into());
        let mut manager = ResourceManager::init(config).unwrap();
        let store = with_memory(&mut manager);
        let events = manager.subscribe();

        store.insert("game.toml", b"v1".to_vec());
        store.insert("other.toml", b"v1".to_vec());
        let location = manager.locate("Config", "game.toml").unwrap();
        manager.locate("Unwatched", "other.toml").unwrap();

        manager.poll_watched();
        assert!(events.try_recv().is_err());

        store.insert("game.toml", b"v2".to_vec());
        store.insert("other.toml", b"v2".to_vec());
        manager.poll_watched();

        match events.try_recv().unwrap() {
            ResourceEvent::Update {
                group,
                name,
                location: loc,
                ..
            } => {
                assert_eq!(group, "Config");
                assert_eq!(name, "game.toml");
                assert_eq!(loc, location);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn update_polls_watched_groups_once_per_interval() {
        let mut config = ResourceConfig::default();
        config.watch_list.push("Config".into());
        config.watch_interval_ms = 60_000;
        let mut manager = ResourceManager::init(config).unwrap();
        let store = with_memory(&mut manager);
        let events = manager.subscribe();

        store.insert("game.toml", b"v1".to_vec());
        manager.locate("Config", "game.toml").unwrap();
        store.insert("game.toml", b"v2".to_vec());

        manager.update();
        assert!(events.try_recv().is_err());

        manager.poll_watched();
        let updates: Vec<_> = events.try_iter().collect();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].kind(), ResourceEventKind::Update);

        store.insert("game.toml", b"v3".to_vec());
        manager.update();
        assert!(events.try_recv().is_err());
    }
}
