use std::{
    fmt,
    sync::{Arc, RwLock, Weak},
};

use log::warn;

use crate::{
    types::{ClassId, ConnectionKey, ObjectId},
    world::object::{dirty_mask::DirtyMask, dirty_receiver::DirtyReceiver, replicate::Replicate},
};

/// Link from an object to the ghost record one connection keeps for it
struct GhostRef {
    connection: ConnectionKey,
    receiver: Arc<DirtyReceiver>,
}

struct NetObjectInner {
    id: ObjectId,
    object: Box<dyn Replicate>,
    ghost_refs: RwLock<Vec<GhostRef>>,
}

impl Drop for NetObjectInner {
    fn drop(&mut self) {
        let refs = match self.ghost_refs.get_mut() {
            Ok(refs) => refs,
            Err(poisoned) => poisoned.into_inner(),
        };
        for ghost_ref in refs.drain(..) {
            ghost_ref.receiver.invalidate();
        }
    }
}

/// Shared handle to a replicable object owned by the simulation. Dropping the
/// last handle invalidates every connection's record for the object.
#[derive(Clone)]
pub struct NetObjectHandle {
    inner: Arc<NetObjectInner>,
}

impl NetObjectHandle {
    pub(crate) fn new(id: ObjectId, object: Box<dyn Replicate>) -> Self {
        Self {
            inner: Arc::new(NetObjectInner {
                id,
                object,
                ghost_refs: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    pub fn class_id(&self) -> ClassId {
        self.inner.object.class_id()
    }

    pub fn object(&self) -> &dyn Replicate {
        self.inner.object.as_ref()
    }

    pub fn downcast_ref<T: Replicate>(&self) -> Option<&T> {
        self.inner.object.as_any().downcast_ref::<T>()
    }

    pub fn downgrade(&self) -> WeakNetObject {
        WeakNetObject {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// ORs `mask` into the dirty state of every connection ghosting this
    /// object. Safe to call from any thread.
    pub fn mark_dirty(&self, mask: DirtyMask) {
        if mask.is_clear() {
            return;
        }
        let Ok(refs) = self.inner.ghost_refs.read() else {
            warn!("ghost reference list poisoned, dropping dirty mark");
            return;
        };
        for ghost_ref in refs.iter() {
            ghost_ref.receiver.mark(mask);
        }
    }

    /// Connections currently holding a ghost record for this object
    pub fn ghost_connections(&self) -> Vec<ConnectionKey> {
        let Ok(refs) = self.inner.ghost_refs.read() else {
            return Vec::new();
        };
        refs.iter().map(|ghost_ref| ghost_ref.connection).collect()
    }

    pub(crate) fn link_ghost(&self, connection: ConnectionKey, receiver: Arc<DirtyReceiver>) {
        let Ok(mut refs) = self.inner.ghost_refs.write() else {
            warn!("ghost reference list poisoned, object {:?} not linked", self.id());
            return;
        };
        refs.retain(|ghost_ref| ghost_ref.connection != connection);
        refs.push(GhostRef {
            connection,
            receiver,
        });
    }

    pub(crate) fn unlink_ghost(&self, connection: ConnectionKey) {
        let Ok(mut refs) = self.inner.ghost_refs.write() else {
            return;
        };
        refs.retain(|ghost_ref| ghost_ref.connection != connection);
    }

    pub fn ptr_eq(&self, other: &NetObjectHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for NetObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetObjectHandle")
            .field("id", &self.inner.id)
            .field("class_id", &self.class_id())
            .finish()
    }
}

/// Non-owning reference kept by ghost records
#[derive(Clone, Default)]
pub struct WeakNetObject {
    inner: Weak<NetObjectInner>,
}

impl WeakNetObject {
    pub fn upgrade(&self) -> Option<NetObjectHandle> {
        self.inner.upgrade().map(|inner| NetObjectHandle { inner })
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for WeakNetObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakNetObject(alive: {})", self.is_alive())
    }
}

/// Hands out engine-wide object ids. One registry per simulation.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    next_id: u64,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<R: Replicate>(&mut self, object: R) -> NetObjectHandle {
        self.spawn_boxed(Box::new(object))
    }

    pub fn spawn_boxed(&mut self, object: Box<dyn Replicate>) -> NetObjectHandle {
        let id = ObjectId::from_u64(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        NetObjectHandle::new(id, object)
    }
}
