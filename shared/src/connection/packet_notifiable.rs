use crate::types::PacketIndex;

/// Receives the transport's verdict on packets it sent
pub trait PacketNotifiable {
    /// Called when the peer acknowledged `packet_index`
    fn notify_packet_delivered(&mut self, packet_index: PacketIndex);

    /// Called when `packet_index` is known to be lost
    fn notify_packet_dropped(&mut self, packet_index: PacketIndex);
}
