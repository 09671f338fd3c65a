use crate::{
    connection::ghost_config::GhostConfig,
    types::ClassId,
    world::object::{class_kinds::ClassKinds, ghost::Ghost},
};

pub mod error;
pub use error::ProtocolError;

/// Highest number of classes the connect handshake can announce
pub const MAX_CLASS_COUNT: u32 = u16::MAX as u32;

// Protocol Plugin
pub trait ProtocolPlugin {
    fn build(&self, protocol: &mut Protocol);
}

// Protocol
pub struct Protocol {
    pub class_kinds: ClassKinds,
    /// Used to configure every ghost connection built from this protocol
    pub ghost: GhostConfig,
    locked: bool,
}

impl Default for Protocol {
    fn default() -> Self {
        Self {
            class_kinds: ClassKinds::new(),
            ghost: GhostConfig::default(),
            locked: false,
        }
    }
}

impl Protocol {
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn add_plugin<P: ProtocolPlugin>(&mut self, plugin: P) -> &mut Self {
        self.check_lock();
        plugin.build(self);
        self
    }

    pub fn ghost_config(&mut self, config: GhostConfig) -> &mut Self {
        self.check_lock();
        self.ghost = config;
        self
    }

    pub fn debug_object_sizes(&mut self, enabled: bool) -> &mut Self {
        self.check_lock();
        self.ghost.debug_object_sizes = enabled;
        self
    }

    /// Appends a class. Ids follow registration order, so every peer must
    /// register classes in the same order and only ever append new ones.
    pub fn add_class<G: Ghost + Default>(&mut self, name: &str) -> &mut Self {
        if let Err(err) = self.try_add_class::<G>(name) {
            panic!("{err}");
        }
        self
    }

    pub fn add_class_with<F>(&mut self, name: &str, builder: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Ghost> + Send + Sync + 'static,
    {
        if let Err(err) = self.try_add_class_with(name, builder) {
            panic!("{err}");
        }
        self
    }

    // Non-panicking builder methods

    pub fn try_add_plugin<P: ProtocolPlugin>(&mut self, plugin: P) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        plugin.build(self);
        Ok(self)
    }

    pub fn try_ghost_config(&mut self, config: GhostConfig) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        self.ghost = config;
        Ok(self)
    }

    pub fn try_add_class<G: Ghost + Default>(&mut self, name: &str) -> Result<&mut Self, ProtocolError> {
        self.try_check_class_slot(name)?;
        self.class_kinds.add_class::<G>(name);
        Ok(self)
    }

    pub fn try_add_class_with<F>(&mut self, name: &str, builder: F) -> Result<&mut Self, ProtocolError>
    where
        F: Fn() -> Box<dyn Ghost> + Send + Sync + 'static,
    {
        self.try_check_class_slot(name)?;
        self.class_kinds.add_class_with(name, builder);
        Ok(self)
    }

    pub fn try_lock(&mut self) -> Result<(), ProtocolError> {
        self.try_check_lock()?;
        self.locked = true;
        Ok(())
    }

    pub fn lock(&mut self) {
        self.check_lock();
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn class_count(&self) -> u32 {
        self.class_kinds.count()
    }

    pub fn class_id_of<G: Ghost>(&self) -> Option<ClassId> {
        self.class_kinds.class_id_of::<G>()
    }

    /// Checks if protocol is locked without panicking
    /// Returns Err if protocol is locked
    pub fn try_check_lock(&self) -> Result<(), ProtocolError> {
        if self.locked {
            Err(ProtocolError::AlreadyLocked)
        } else {
            Ok(())
        }
    }

    /// Checks if protocol is locked, panics if it is
    pub fn check_lock(&self) {
        if self.locked {
            panic!("Protocol already locked!");
        }
    }

    pub fn build(&mut self) -> Self {
        std::mem::take(self)
    }

    fn try_check_class_slot(&self, name: &str) -> Result<(), ProtocolError> {
        self.try_check_lock()?;
        if self.class_kinds.count() >= MAX_CLASS_COUNT {
            return Err(ProtocolError::TooManyClasses {
                name: name.to_string(),
                max: MAX_CLASS_COUNT,
            });
        }
        Ok(())
    }
}
