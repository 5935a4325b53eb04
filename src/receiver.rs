//! Receiver engine: frame processing, in-order delivery, and flow control
//! for one transfer. Unified into a single `tokio::select!` loop over one
//! task, removing the need for shared mutable state across cooperating
//! activities.

use std::time::Instant;

use bytes::Bytes;
use tokio::time::Instant as TokioInstant;
use tracing::{debug, trace};

use crate::channel::FrameChannel;
use crate::chunker::DeliverySink;
use crate::config::EngineConfig;
use crate::delayed_ack::{AckAction, DelayedAckScheduler};
use crate::error::Result;
use crate::flow::FlowState;
use crate::frame::{Ack, Segment};
use crate::loss::LossSimulator;
use crate::reorder::ReorderBuffer;

#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub segments_dropped: u64,
    pub acks_dropped: u64,
    pub duplicates: u64,
    pub out_of_order: u64,
}

/// Drives inbound frame processing, delivery, and ACK generation for one
/// transfer, over a `FrameChannel`.
pub struct ReceiverEngine<Ch: FrameChannel> {
    config: EngineConfig,
    expected_seq: i32,
    last_ack_sent: i32,
    reorder: ReorderBuffer,
    delayed_ack: DelayedAckScheduler,
    flow: FlowState,
    loss: LossSimulator,
    channel: Ch,
    sink: Box<dyn DeliverySink>,
    stats: Stats,
}

impl<Ch: FrameChannel> ReceiverEngine<Ch> {
    pub fn new(config: EngineConfig, sink: Box<dyn DeliverySink>, channel: Ch) -> Self {
        Self::with_loss(config, sink, channel, LossSimulator::new(0.0, 0.0))
    }

    /// Construct with an explicit loss simulator (e.g. seeded, for
    /// reproducible tests) rather than the default entropy-seeded one.
    pub fn with_loss(
        config: EngineConfig,
        sink: Box<dyn DeliverySink>,
        channel: Ch,
        loss: LossSimulator,
    ) -> Self {
        let flow = FlowState::new(config.rcv_buffer, config.app_drain_interval, config.app_drain_size);
        let delayed_ack = DelayedAckScheduler::new(config.delayed_ack);
        Self {
            config,
            expected_seq: 1,
            last_ack_sent: 0,
            reorder: ReorderBuffer::new(),
            delayed_ack,
            flow,
            loss,
            channel,
            sink,
            stats: Stats::default(),
        }
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn expected_seq(&self) -> i32 {
        self.expected_seq
    }

    pub fn last_ack_sent(&self) -> i32 {
        self.last_ack_sent
    }

    fn advertised_rwnd(&self) -> i32 {
        self.flow.advertised_rwnd(self.reorder.byte_len())
    }

    /// Emits `ack` with the current advertised rwnd, subject to the ACK-path
    /// loss simulation.
    async fn emit_ack(&mut self, ack: i32) -> Result<()> {
        let frame = Ack::new(ack, self.advertised_rwnd());
        if self.loss.drop_ack() {
            self.stats.acks_dropped += 1;
            trace!(ack, "simulated ack drop");
            return Ok(());
        }
        self.channel.send_frame(frame.encode()).await
    }

    /// Processes one inbound frame: decode, classify by role, apply loss
    /// simulation and duplicate/flow-control checks, then deliver and ACK.
    /// Returns `true` once END has been processed (the caller should stop).
    async fn process_frame(&mut self, raw: Bytes, now: Instant) -> Result<bool> {
        let seg = Segment::decode(&raw)?;

        if seg.is_end() {
            self.last_ack_sent = self.last_ack_sent.max(seg.seq);
            self.emit_ack(self.last_ack_sent).await?;
            self.sink.finish()?;
            debug!(seq = seg.seq, "received end of stream");
            return Ok(true);
        }

        if seg.is_probe() {
            self.emit_ack(self.last_ack_sent).await?;
            return Ok(false);
        }

        if self.loss.drop_data() {
            self.stats.segments_dropped += 1;
            trace!(seq = seg.seq, "simulated data drop");
            return Ok(false);
        }

        if seg.seq < self.expected_seq {
            self.stats.duplicates += 1;
            self.emit_ack(self.last_ack_sent).await?;
            return Ok(false);
        }

        let rwnd = self.advertised_rwnd();
        if rwnd == 0 {
            self.emit_ack(self.last_ack_sent).await?;
            return Ok(false);
        }

        if seg.seq == self.expected_seq {
            self.sink.deliver(seg.payload.clone())?;
            self.flow.on_delivered(seg.payload.len());
            self.expected_seq += 1;

            let (drained, next) = self.reorder.drain_contiguous(self.expected_seq);
            for payload in drained {
                self.flow.on_delivered(payload.len());
                self.sink.deliver(payload)?;
            }
            self.expected_seq = next;
            self.last_ack_sent = self.expected_seq - 1;

            if let AckAction::EmitNow = self.delayed_ack.on_in_order_delivery(now) {
                self.emit_ack(self.last_ack_sent).await?;
            }
        } else {
            self.stats.out_of_order += 1;
            let capacity = self.reorder.byte_len() + rwnd.max(0) as usize;
            if !self.reorder.try_insert(seg.seq, seg.payload.clone(), capacity) {
                self.stats.segments_dropped += 1;
            }
            self.delayed_ack.on_immediate_ack();
            self.emit_ack(self.last_ack_sent).await?;
        }

        Ok(false)
    }

    async fn sleep_until_opt(deadline: Option<Instant>) {
        match deadline {
            Some(d) => tokio::time::sleep_until(TokioInstant::from_std(d)).await,
            None => std::future::pending::<()>().await,
        }
    }

    /// Runs the receive loop to completion (until END is processed or the
    /// channel closes).
    pub async fn run(&mut self) -> Result<()> {
        let mut drain_ticker = tokio::time::interval(self.config.app_drain_interval);
        loop {
            let ack_deadline = self.delayed_ack.next_deadline();
            tokio::select! {
                frame = self.channel.recv_frame() => {
                    let bytes = frame?;
                    if self.process_frame(bytes, Instant::now()).await? {
                        return Ok(());
                    }
                }
                _ = Self::sleep_until_opt(ack_deadline) => {
                    let now = Instant::now();
                    if let AckAction::EmitNow = self.delayed_ack.poll(now) {
                        self.emit_ack(self.last_ack_sent).await?;
                    }
                }
                _ = drain_ticker.tick() => {
                    self.flow.drain(Instant::now());
                }
            }
        }
    }
}
