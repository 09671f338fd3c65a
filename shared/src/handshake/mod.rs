//! Class count negotiation carried by the connect request and accept.
//!
//! Each side announces how many replicable classes it has registered. The
//! accepting side settles on the smaller count and echoes it back, so both
//! peers only ever use the shared prefix of their class registries.

use log::info;

use ghostwire_serde::{BitReader, BitWrite, Serde};

use crate::connection::ghost_connection::GhostConnection;

mod error;
pub use error::HandshakeError;

pub struct ClassCountHandshake;

impl ClassCountHandshake {
    /// Client side: appends the local class count to the connect request
    pub fn write_connect_request(connection: &GhostConnection, writer: &mut dyn BitWrite) {
        announced_count(connection.local_class_count()).ser(writer);
    }

    /// Server side: reads the client's class count and settles on the
    /// smaller of the two
    pub fn read_connect_request(
        connection: &mut GhostConnection,
        reader: &mut BitReader,
    ) -> Result<(), HandshakeError> {
        let remote = u16::de(reader)? as u32;
        let local = connection.local_class_count();
        let effective = remote.min(local);
        connection.set_ghost_class_count(effective);
        info!(
            "connect request from {:?}: {remote} remote classes, {local} local, using {effective}",
            connection.key()
        );
        Ok(())
    }

    /// Server side: echoes the settled class count in the connect accept
    pub fn write_connect_accept(connection: &GhostConnection, writer: &mut dyn BitWrite) {
        announced_count(connection.ghost_class_count()).ser(writer);
    }

    /// Client side: adopts the class count chosen by the server
    pub fn read_connect_accept(
        connection: &mut GhostConnection,
        reader: &mut BitReader,
    ) -> Result<(), HandshakeError> {
        let accepted = u16::de(reader)? as u32;
        let local = connection.local_class_count();
        if accepted > local {
            return Err(HandshakeError::ClassCountMismatch { accepted, local });
        }
        connection.set_ghost_class_count(accepted);
        info!(
            "connect accepted on {:?} with {accepted} classes",
            connection.key()
        );
        Ok(())
    }
}

fn announced_count(count: u32) -> u16 {
    count.min(u16::MAX as u32) as u16
}
