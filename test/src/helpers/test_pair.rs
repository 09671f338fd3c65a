use std::sync::Arc;

use log::debug;

use ghostwire_shared::{
    BitReader, BitWriter, ClassCountHandshake, ConnectionKey, GhostConnection, GhostReadError,
    PacketIndex, PacketNotifiable, Protocol, ScopeProvider, MTU_SIZE_BITS,
};

pub const HOST_KEY: ConnectionKey = ConnectionKey::from_u64(1);
pub const CLIENT_KEY: ConnectionKey = ConnectionKey::from_u64(2);

/// A packet written by the host and not yet resolved
#[derive(Clone, Debug)]
pub struct SentPacket {
    pub index: PacketIndex,
    pub bytes: Vec<u8>,
    pub has_written: bool,
}

/// A host connection ghosting to a client connection over an in-memory link.
/// The test decides what happens to each packet.
pub struct TestPair {
    pub host: GhostConnection,
    pub client: GhostConnection,
    next_packet_index: PacketIndex,
    max_packet_bits: u32,
}

impl TestPair {
    /// Both sides share `protocol`; the class count handshake has run
    pub fn new(protocol: Protocol) -> Self {
        let protocol = Arc::new(protocol);
        Self::with_protocols(protocol.clone(), protocol)
    }

    pub fn with_protocols(host_protocol: Arc<Protocol>, client_protocol: Arc<Protocol>) -> Self {
        let mut host = GhostConnection::new(HOST_KEY, host_protocol);
        let mut client = GhostConnection::new(CLIENT_KEY, client_protocol);
        host.set_ghost_from(true);
        client.set_ghost_to(true);

        // client -> host connect request
        let mut writer = BitWriter::new();
        ClassCountHandshake::write_connect_request(&client, &mut writer);
        let bytes = writer.to_bytes();
        ClassCountHandshake::read_connect_request(&mut host, &mut BitReader::new(&bytes))
            .unwrap();

        // host -> client connect accept
        let mut writer = BitWriter::new();
        ClassCountHandshake::write_connect_accept(&host, &mut writer);
        let bytes = writer.to_bytes();
        ClassCountHandshake::read_connect_accept(&mut client, &mut BitReader::new(&bytes))
            .unwrap();

        Self {
            host,
            client,
            next_packet_index: 0,
            max_packet_bits: MTU_SIZE_BITS,
        }
    }

    /// A pair with ghosting already started
    pub fn started(protocol: Protocol) -> Self {
        let mut pair = Self::new(protocol);
        pair.start_ghosting();
        pair
    }

    pub fn set_max_packet_bits(&mut self, bits: u32) {
        self.max_packet_bits = bits;
    }

    /// Runs the start/ready exchange
    pub fn start_ghosting(&mut self) {
        let start = self.host.activate_ghosting().unwrap();
        let ready = self
            .client
            .receive_ghosting_message(start)
            .unwrap()
            .expect("client should answer start ghosting");
        self.host.receive_ghosting_message(ready).unwrap();
        assert!(self.host.is_ghosting());
    }

    /// Runs the scope query and writes the next packet
    pub fn send(&mut self, scope: &mut dyn ScopeProvider) -> SentPacket {
        self.host.prepare_write_packet(scope);
        let index = self.next_packet_index;
        self.next_packet_index = self.next_packet_index.wrapping_add(1);

        let mut writer = BitWriter::with_max_bits(self.max_packet_bits);
        let mut has_written = false;
        self.host.write_packet(&mut writer, index, &mut has_written);
        SentPacket {
            index,
            bytes: writer.to_bytes(),
            has_written,
        }
    }

    /// The client reads the packet and the host learns it arrived
    pub fn deliver(&mut self, packet: &SentPacket) -> Result<(), GhostReadError> {
        let result = self.client.read_packet(&mut BitReader::new(&packet.bytes));
        self.host.notify_packet_delivered(packet.index);
        result
    }

    /// The client reads the packet, but the host is told it was lost
    pub fn deliver_unacked(&mut self, packet: &SentPacket) -> Result<(), GhostReadError> {
        let result = self.client.read_packet(&mut BitReader::new(&packet.bytes));
        self.host.notify_packet_dropped(packet.index);
        result
    }

    /// The client reads the packet; the host is not told anything yet
    pub fn client_read(&mut self, packet: &SentPacket) -> Result<(), GhostReadError> {
        self.client.read_packet(&mut BitReader::new(&packet.bytes))
    }

    pub fn host_notify_delivered(&mut self, packet: &SentPacket) {
        self.host.notify_packet_delivered(packet.index);
    }

    pub fn host_notify_dropped(&mut self, packet: &SentPacket) {
        self.host.notify_packet_dropped(packet.index);
    }

    /// The packet never arrives
    pub fn drop_packet(&mut self, packet: &SentPacket) {
        debug!("link lost packet {}", packet.index);
        self.host.notify_packet_dropped(packet.index);
    }

    /// Sends one packet and delivers it
    pub fn tick(&mut self, scope: &mut dyn ScopeProvider) -> Result<SentPacket, GhostReadError> {
        let packet = self.send(scope);
        self.deliver(&packet)?;
        Ok(packet)
    }
}
