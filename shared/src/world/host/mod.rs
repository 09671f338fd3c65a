pub mod class_stats;
pub mod error;
pub mod ghost_record;
pub mod ghost_table;
pub mod host_ghost_manager;
pub mod host_ghost_writer;
pub mod scope;
pub mod update_ledger;
