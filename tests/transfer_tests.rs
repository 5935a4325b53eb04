//! End-to-end sender/receiver scenarios.
//!
//! Driven over `LocalChannel` with `tokio::time::pause` so timing scenarios
//! (persist) run deterministically without wall-clock sleeps. Scenarios not
//! exercised here (fast retransmit, duplicate suppression, Karn's rule,
//! timeout collapse) are covered at the unit level in `sender.rs`/`receiver.rs`.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

use tcplite::channel::LocalChannel;
use tcplite::chunker::{ChunkSource, DeliverySink, SliceChunker};
use tcplite::config::EngineConfig;
use tcplite::error::Result;
use tcplite::frame::{Ack, Segment};
use tcplite::loss::LossSimulator;
use tcplite::receiver::ReceiverEngine;
use tcplite::sender::SenderEngine;

/// Delivery sink that forwards each delivered chunk (and a `None` sentinel
/// on finish) to an mpsc channel, so a test can observe delivery order from
/// outside the engine that owns the sink.
struct ChannelSink(mpsc::UnboundedSender<Option<Bytes>>);

impl DeliverySink for ChannelSink {
    fn deliver(&mut self, payload: Bytes) -> Result<()> {
        let _ = self.0.send(Some(payload));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let _ = self.0.send(None);
        Ok(())
    }
}

#[tokio::test]
async fn lossless_small_file_delivers_bit_exact() {
    tokio::time::pause();

    let mut config = EngineConfig::default().lossless();
    config.chunk_size = 10;

    let (sender_chan, receiver_chan) = LocalChannel::pair();
    let input = Bytes::from_static(b"ABCDEFGHIJKLMNOPQRST");
    let source = Box::new(SliceChunker::new(input.clone(), config.chunk_size));
    let mut sender = SenderEngine::new(config.clone(), source, sender_chan).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut receiver = ReceiverEngine::with_loss(
        config,
        Box::new(ChannelSink(tx)),
        receiver_chan,
        LossSimulator::from_seed(1, 0.0, 0.0),
    );

    let receiver_task = tokio::spawn(async move {
        receiver.run().await.unwrap();
        receiver
    });

    sender.run().await.unwrap();
    let receiver = receiver_task.await.unwrap();

    let mut delivered = Vec::new();
    while let Some(Some(chunk)) = rx.recv().await {
        delivered.extend_from_slice(&chunk);
    }
    assert_eq!(Bytes::from(delivered), input);

    assert_eq!(sender.stats().segments_sent, 2);
    assert_eq!(sender.stats().retransmissions, 0);
    assert_eq!(sender.last_byte_acked(), 2);
    assert_eq!(receiver.last_ack_sent(), 2);
}

#[tokio::test]
async fn out_of_order_segments_are_delivered_in_order() {
    tokio::time::pause();

    let config = EngineConfig::default().lossless();
    let (mut feeder, receiver_chan) = LocalChannel::pair();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut receiver = ReceiverEngine::with_loss(
        config,
        Box::new(ChannelSink(tx)),
        receiver_chan,
        LossSimulator::from_seed(3, 0.0, 0.0),
    );

    let receiver_task = tokio::spawn(async move {
        receiver.run().await.unwrap();
        receiver
    });

    // Deliver [1,3,2,4] out of order. Segment 1's ACK is deferred by the
    // delayed-ACK scheduler; segment 3 (out-of-order) coalesces it into an
    // immediate ACK(1); segment 2 drains 2 and 3 from the reorder buffer and
    // defers again; segment 4 coalesces that into ACK(4).
    for (seq, byte) in [(1i32, b'A'), (3, b'C'), (2, b'B'), (4, b'D')] {
        feeder
            .send_frame(Segment::data(seq, Bytes::copy_from_slice(&[byte])).encode())
            .await
            .unwrap();
    }
    let ack1 = Ack::decode(&feeder.recv_frame().await.unwrap()).unwrap();
    assert_eq!(ack1.ack, 1);
    let ack2 = Ack::decode(&feeder.recv_frame().await.unwrap()).unwrap();
    assert_eq!(ack2.ack, 4);

    feeder.send_frame(Segment::end(5).encode()).await.unwrap();
    let final_ack = Ack::decode(&feeder.recv_frame().await.unwrap()).unwrap();
    assert_eq!(final_ack.ack, 5);

    let receiver = receiver_task.await.unwrap();

    let mut delivered = Vec::new();
    while let Some(Some(chunk)) = rx.recv().await {
        delivered.extend_from_slice(&chunk);
    }
    assert_eq!(delivered, b"ABCD");
    assert_eq!(receiver.stats().out_of_order, 1);
}

#[tokio::test]
async fn zero_window_persist_then_resumes() {
    tokio::time::pause();

    let mut config = EngineConfig::default().lossless();
    config.chunk_size = 4;
    config.persist_interval = Duration::from_millis(100);

    let (sender_chan, mut peer) = LocalChannel::pair();
    let mut source: Box<dyn ChunkSource> =
        Box::new(SliceChunker::new(Bytes::from_static(b"ABCDEFGH"), config.chunk_size));
    let total_chunks = {
        let mut n = 0;
        while source.next_chunk().unwrap().is_some() {
            n += 1;
        }
        n
    };
    let source: Box<dyn ChunkSource> =
        Box::new(SliceChunker::new(Bytes::from_static(b"ABCDEFGH"), config.chunk_size));
    let mut sender = SenderEngine::new(config, source, sender_chan).unwrap();

    let sender_task = tokio::spawn(async move {
        sender.run().await.unwrap();
        sender
    });

    // First segment arrives; close the window to force persist mode.
    let first = peer.recv_frame().await.unwrap();
    let seg = Segment::decode(&first).unwrap();
    peer.send_frame(Ack::new(seg.seq, 0).encode()).await.unwrap();

    tokio::time::advance(Duration::from_millis(150)).await;
    let probe_bytes = tokio::time::timeout(Duration::from_millis(100), peer.recv_frame())
        .await
        .expect("a persist probe should have been sent")
        .unwrap();
    let probe = Segment::decode(&probe_bytes).unwrap();
    assert!(probe.is_probe());

    // Reopen the window and acknowledge everything through to completion.
    peer.send_frame(Ack::new(seg.seq, 10_000).encode())
        .await
        .unwrap();

    // seq 1 was already covered by the initial ack(1, 0); only the
    // remaining chunks are still outstanding.
    for _ in 0..(total_chunks - 1) {
        let bytes = tokio::time::timeout(Duration::from_millis(200), peer.recv_frame())
            .await
            .unwrap()
            .unwrap();
        let seg = Segment::decode(&bytes).unwrap();
        peer.send_frame(Ack::new(seg.seq, 10_000).encode())
            .await
            .unwrap();
    }
    let end_bytes = tokio::time::timeout(Duration::from_millis(200), peer.recv_frame())
        .await
        .unwrap()
        .unwrap();
    let end = Segment::decode(&end_bytes).unwrap();
    assert!(end.is_end());
    peer.send_frame(Ack::new(end.seq, 10_000).encode())
        .await
        .unwrap();

    sender_task.await.unwrap();
}
