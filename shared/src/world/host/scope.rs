use crate::{
    types::{ConnectionKey, GhostIndex},
    world::{host::ghost_table::GhostTable, object::net_object::NetObjectHandle},
};

/// Decides, once per outgoing packet, which objects are relevant to a
/// connection
pub trait ScopeProvider {
    fn perform_scope_query(&mut self, query: &mut ScopeQuery);
}

impl<F: FnMut(&mut ScopeQuery)> ScopeProvider for F {
    fn perform_scope_query(&mut self, query: &mut ScopeQuery) {
        self(query)
    }
}

/// Handle given to a `ScopeProvider` for the duration of one query
pub struct ScopeQuery<'t> {
    table: &'t mut GhostTable,
}

impl<'t> ScopeQuery<'t> {
    pub(crate) fn new(table: &'t mut GhostTable) -> Self {
        Self { table }
    }

    pub fn connection_key(&self) -> ConnectionKey {
        self.table.connection()
    }

    /// Keeps `object` in scope for this round. Returns its publish index, or
    /// `None` if it cannot be ghosted.
    pub fn object_in_scope(&mut self, object: &NetObjectHandle) -> Option<GhostIndex> {
        self.table.bring_into_scope(object)
    }

    /// Keeps `object` in scope until `object_local_clear_always` is called
    pub fn object_local_scope_always(&mut self, object: &NetObjectHandle) -> Option<GhostIndex> {
        let index = self.table.bring_into_scope(object)?;
        self.table.set_always_in_scope(index, true);
        Some(index)
    }

    pub fn object_local_clear_always(&mut self, object: &NetObjectHandle) {
        if let Some(index) = self.table.index_of(object.id()) {
            self.table.set_always_in_scope(index, false);
        }
    }
}
