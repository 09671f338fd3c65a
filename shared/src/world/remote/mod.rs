pub mod error;
pub mod local_ghosts;
pub mod remote_ghost_reader;
