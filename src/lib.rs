//! A pedagogical reliable file-transfer protocol emulating TCP's sliding
//! windows, retransmission, flow control, and congestion control over an
//! opaque byte-stream transport.

pub mod channel;
pub mod chunker;
pub mod config;
pub mod congestion;
pub mod delayed_ack;
pub mod error;
pub mod flow;
pub mod frame;
pub mod handshake;
pub mod loss;
pub mod receiver;
pub mod reorder;
pub mod retransmit;
pub mod rtt;
pub mod sender;

pub use channel::{FrameChannel, LocalChannel, TcpFrameChannel};
pub use chunker::{ChunkSource, DeliverySink, SliceChunker, VecSink};
pub use config::{Algorithm, EngineConfig};
pub use error::{Result, TcpliteError};
pub use receiver::ReceiverEngine;
pub use sender::SenderEngine;
