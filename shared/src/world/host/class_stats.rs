use std::collections::HashMap;

use crate::types::ClassId;

/// Update counts and payload sizes written for one class
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassUpdateStats {
    pub initial_count: u32,
    pub initial_bits: u64,
    pub partial_count: u32,
    pub partial_bits: u64,
}

impl ClassUpdateStats {
    pub fn total_bits(&self) -> u64 {
        self.initial_bits + self.partial_bits
    }
}

#[derive(Debug, Default)]
pub struct ClassStats {
    by_class: HashMap<ClassId, ClassUpdateStats>,
}

impl ClassStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, class_id: ClassId, is_initial: bool, bits: u32) {
        let stats = self.by_class.entry(class_id).or_default();
        if is_initial {
            stats.initial_count += 1;
            stats.initial_bits += bits as u64;
        } else {
            stats.partial_count += 1;
            stats.partial_bits += bits as u64;
        }
    }

    pub fn get(&self, class_id: ClassId) -> Option<&ClassUpdateStats> {
        self.by_class.get(&class_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClassId, &ClassUpdateStats)> {
        self.by_class.iter()
    }
}
