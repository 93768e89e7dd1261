//! Weak frame cache
//!
//! Disappear animations replay the same handful of frames over and over. The
//! cache remembers every decoded frame weakly: as long as some running
//! animation still holds a frame it is served without decoding again, and
//! once nobody holds it the memory is released. A dead entry is simply
//! decoded again on the next request.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use tether_core::ImageId;

use crate::error::Result;
use crate::loader::{FrameLoader, ImageData};

/// A decoded frame with a stable renderer handle
#[derive(Debug)]
pub struct FrameImage {
    id: ImageId,
    name: String,
    data: ImageData,
}

impl FrameImage {
    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ImageData {
        &self.data
    }
}

/// Cache of decoded frames keyed by frame name
pub struct FrameCache {
    loader: Box<dyn FrameLoader>,
    entries: RefCell<FxHashMap<String, Weak<FrameImage>>>,
    next_id: Cell<u64>,
    decodes: Cell<u64>,
}

impl FrameCache {
    pub fn new(loader: impl FrameLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            entries: RefCell::new(FxHashMap::default()),
            next_id: Cell::new(1),
            decodes: Cell::new(0),
        }
    }

    /// Get a frame, decoding it if no live copy exists
    ///
    /// Decode failures are returned to the caller and leave no entry behind.
    pub fn get(&self, frame: &str) -> Result<Rc<FrameImage>> {
        if let Some(image) = self.entries.borrow().get(frame).and_then(Weak::upgrade) {
            return Ok(image);
        }

        let data = self.loader.load(frame)?;
        let id = ImageId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.decodes.set(self.decodes.get() + 1);

        let image = Rc::new(FrameImage {
            id,
            name: frame.to_string(),
            data,
        });
        self.entries
            .borrow_mut()
            .insert(frame.to_string(), Rc::downgrade(&image));
        tracing::trace!(frame, ?id, "FrameCache: decoded");
        Ok(image)
    }

    /// Look up a live frame without loading it
    pub fn peek(&self, frame: &str) -> Option<Rc<FrameImage>> {
        self.entries.borrow().get(frame).and_then(Weak::upgrade)
    }

    /// Forget every entry; frames still held elsewhere stay alive
    pub fn clear(&self) {
        let mut entries = self.entries.borrow_mut();
        if !entries.is_empty() {
            tracing::debug!(entries = entries.len(), "FrameCache: cleared");
        }
        entries.clear();
    }

    /// Number of entries, including dead ones not yet pruned
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Total number of decodes performed
    pub fn decode_count(&self) -> u64 {
        self.decodes.get()
    }
}

impl std::fmt::Debug for FrameCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCache")
            .field("entries", &self.len())
            .field("decodes", &self.decode_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryFrameLoader;

    fn cache() -> FrameCache {
        FrameCache::new(
            MemoryFrameLoader::new()
                .with_frame("pop_0", ImageData::solid(2, 2, [255; 4]))
                .with_frame("pop_1", ImageData::solid(2, 2, [0; 4])),
        )
    }

    #[test]
    fn test_live_frame_is_reused() {
        let cache = cache();
        let a = cache.get("pop_0").unwrap();
        let b = cache.get("pop_0").unwrap();

        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.decode_count(), 1);
    }

    #[test]
    fn test_dropped_frame_is_decoded_again() {
        let cache = cache();
        let first_id = cache.get("pop_1").unwrap().id();
        assert!(cache.peek("pop_1").is_none());

        let second = cache.get("pop_1").unwrap();
        assert_ne!(second.id(), first_id);
        assert_eq!(cache.decode_count(), 2);
    }

    #[test]
    fn test_clear_keeps_held_frames_alive() {
        let cache = cache();
        let held = cache.get("pop_0").unwrap();
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(held.data().dimensions(), (2, 2));
    }

    #[test]
    fn test_decode_failure_is_propagated() {
        let cache = cache();
        assert!(cache.get("missing").is_err());
        assert!(cache.is_empty());
    }
}
