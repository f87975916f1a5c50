use crate::engine::FiveTuple;
use crate::topology::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PacketKind {
    /// Reliable-stream segment; retransmitted when dropped.
    Segment,
    /// Unreliable datagram from a generator.
    Datagram,
    EchoRequest,
    EchoReply,
}

#[derive(Debug, Clone)]
pub(crate) struct Packet {
    pub uid: u64,
    /// Node that originated the packet (retransmissions restart here).
    pub origin: NodeId,
    pub tuple: FiveTuple,
    /// Bytes on the wire, headers included.
    pub size: u32,
    pub kind: PacketKind,
}
