//! Save and delete listeners.
//!
//! Listeners are registered on the [`Gallery`](crate::Gallery) and called
//! synchronously, in registration order, around the store call. There is no
//! global event bus: an object only notifies the listeners of the gallery
//! it is saved or deleted through.

use super::GalleryObject;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Saving,
    Saved,
    Deleting,
    Deleted,
}

pub type Listener = Arc<dyn Fn(LifecycleEvent, &GalleryObject) + Send + Sync>;

#[derive(Default, Clone)]
pub struct LifecycleHooks {
    listeners: Vec<(LifecycleEvent, Listener)>,
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl LifecycleHooks {
    pub fn register<F>(&mut self, event: LifecycleEvent, listener: F)
    where
        F: Fn(LifecycleEvent, &GalleryObject) + Send + Sync + 'static,
    {
        self.listeners.push((event, Arc::new(listener)));
    }

    pub fn on_saving<F>(&mut self, listener: F)
    where
        F: Fn(&GalleryObject) + Send + Sync + 'static,
    {
        self.register(LifecycleEvent::Saving, move |_, object| listener(object));
    }

    pub fn on_saved<F>(&mut self, listener: F)
    where
        F: Fn(&GalleryObject) + Send + Sync + 'static,
    {
        self.register(LifecycleEvent::Saved, move |_, object| listener(object));
    }

    pub fn on_deleted<F>(&mut self, listener: F)
    where
        F: Fn(&GalleryObject) + Send + Sync + 'static,
    {
        self.register(LifecycleEvent::Deleted, move |_, object| listener(object));
    }

    pub(crate) fn fire(&self, event: LifecycleEvent, object: &GalleryObject) {
        self.listeners
            .iter()
            .filter(|(e, _)| *e == event)
            .for_each(|(_, listener)| listener(event, object));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
