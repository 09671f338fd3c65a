use std::{any::TypeId, collections::HashMap};

use crate::{types::ClassId, world::object::ghost::Ghost};

pub type GhostBuilder = Box<dyn Fn() -> Box<dyn Ghost> + Send + Sync>;

struct ClassKind {
    name: String,
    builder: GhostBuilder,
}

/// Append-only registry mapping class ids to ghost constructors. Peers that
/// registered classes in the same order share a stable prefix of ids.
#[derive(Default)]
pub struct ClassKinds {
    kinds: Vec<ClassKind>,
    type_to_id: HashMap<TypeId, ClassId>,
}

impl ClassKinds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class<G: Ghost + Default>(&mut self, name: &str) -> ClassId {
        let class_id = self.push(name, Box::new(|| -> Box<dyn Ghost> { Box::new(G::default()) }));
        self.type_to_id.insert(TypeId::of::<G>(), class_id);
        class_id
    }

    /// Registers a class whose ghosts are built by `builder`
    pub fn add_class_with<F>(&mut self, name: &str, builder: F) -> ClassId
    where
        F: Fn() -> Box<dyn Ghost> + Send + Sync + 'static,
    {
        self.push(name, Box::new(builder))
    }

    fn push(&mut self, name: &str, builder: GhostBuilder) -> ClassId {
        let class_id = self.kinds.len() as ClassId;
        self.kinds.push(ClassKind {
            name: name.to_string(),
            builder,
        });
        class_id
    }

    pub fn count(&self) -> u32 {
        self.kinds.len() as u32
    }

    pub fn class_id_of<G: Ghost>(&self) -> Option<ClassId> {
        self.type_to_id.get(&TypeId::of::<G>()).copied()
    }

    pub fn name(&self, class_id: ClassId) -> Option<&str> {
        self.kinds
            .get(class_id as usize)
            .map(|kind| kind.name.as_str())
    }

    pub fn build(&self, class_id: ClassId) -> Option<Box<dyn Ghost>> {
        self.kinds
            .get(class_id as usize)
            .map(|kind| (kind.builder)())
    }
}

/// Bits needed to encode a class id when `count` classes are known
pub fn class_bit_size(count: u32) -> u8 {
    if count <= 1 {
        return 0;
    }
    (u32::BITS - (count - 1).leading_zeros()) as u8
}
