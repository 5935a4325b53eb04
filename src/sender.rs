//! Sender engine: window-paced transmission, persist probing, timeout-driven
//! retransmission, and ACK ingestion. Composes the congestion controller,
//! RTT estimator, and retransmit table as a single struct, with accessors
//! for each kept public so a caller or test can inspect engine state without
//! reaching into private fields.

use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::channel::FrameChannel;
use crate::chunker::ChunkSource;
use crate::config::EngineConfig;
use crate::congestion::tahoe_reno::TahoeReno;
use crate::congestion::CongestionController;
use crate::error::{Result, TcpliteError};
use crate::frame::{Ack, Segment};
use crate::retransmit::RetransmitTable;
use crate::rtt::RttEstimator;

/// Running counters surfaced to an external collaborator for observability;
/// the engine itself never prints them.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub segments_sent: u64,
    pub retransmissions: u64,
    pub duplicate_acks: u64,
    pub fast_retransmits: u64,
    pub timeouts: u64,
}

struct SenderState {
    next_seq: i32,
    last_byte_sent: i32,
    last_byte_acked: i32,
    rwnd: i32,
    persist_mode: bool,
    last_probe_time: Option<Instant>,
    last_timeout_scan: Option<Instant>,
}

impl SenderState {
    fn new(initial_rwnd: i32) -> Self {
        Self {
            next_seq: 1,
            last_byte_sent: 0,
            last_byte_acked: 0,
            rwnd: initial_rwnd,
            persist_mode: false,
            last_probe_time: None,
            last_timeout_scan: None,
        }
    }
}

/// Drives a file transfer out over a `FrameChannel`, running a four-activity
/// main loop (transmit, persist, timeout, ACK drain) under a short pacing
/// delay.
pub struct SenderEngine<Ch: FrameChannel> {
    config: EngineConfig,
    state: SenderState,
    retransmit: RetransmitTable,
    rtt: RttEstimator,
    congestion: Box<dyn CongestionController>,
    chunks: Vec<Bytes>,
    channel: Ch,
    stats: Stats,
}

impl<Ch: FrameChannel> SenderEngine<Ch> {
    /// Drains `source` fully up front so the total chunk count is known
    /// before the main loop starts.
    pub fn new(config: EngineConfig, mut source: Box<dyn ChunkSource>, channel: Ch) -> Result<Self> {
        let mut chunks = Vec::new();
        while let Some(chunk) = source.next_chunk()? {
            chunks.push(chunk);
        }
        let congestion = Box::new(TahoeReno::new(config.algorithm, config.max_window));
        let initial_rwnd = config.rcv_buffer as i32;
        let rtt = RttEstimator::new(config.rto_min);
        Ok(Self {
            state: SenderState::new(initial_rwnd),
            retransmit: RetransmitTable::new(),
            rtt,
            congestion,
            chunks,
            channel,
            stats: Stats::default(),
            config,
        })
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn last_byte_acked(&self) -> i32 {
        self.state.last_byte_acked
    }

    pub fn cwnd(&self) -> u32 {
        self.congestion.cwnd()
    }

    pub fn ssthresh(&self) -> u32 {
        self.congestion.ssthresh()
    }

    pub fn in_fast_recovery(&self) -> bool {
        self.congestion.in_fast_recovery()
    }

    pub fn is_persist_mode(&self) -> bool {
        self.state.persist_mode
    }

    /// `min(rwnd_in_segments, cwnd)`.
    fn effective_wnd(&self) -> i32 {
        let rwnd_segments = self.config.segments(self.state.rwnd);
        rwnd_segments.min(self.congestion.cwnd() as i32).max(0)
    }

    fn transfer_complete(&self) -> bool {
        self.state.next_seq as usize > self.chunks.len()
            && self.state.last_byte_acked as usize == self.chunks.len()
    }

    /// Activity 1: send while there's room under the effective window.
    async fn transmit_ready(&mut self, now: Instant) -> Result<()> {
        while (self.state.next_seq as usize) <= self.chunks.len()
            && (self.state.last_byte_sent - self.state.last_byte_acked) < self.effective_wnd()
            && !self.state.persist_mode
        {
            let seq = self.state.next_seq;
            let payload = self.chunks[(seq - 1) as usize].clone();
            let segment = Segment::data(seq, payload.clone());
            self.channel.send_frame(segment.encode()).await?;
            self.retransmit.insert(seq, payload, now);
            self.state.last_byte_sent = seq;
            self.state.next_seq += 1;
            self.stats.segments_sent += 1;
            trace!(seq, "transmitted segment");
        }
        Ok(())
    }

    /// Activity 2: zero-window persist probing.
    async fn maybe_persist(&mut self, now: Instant) -> Result<()> {
        if !self.state.persist_mode {
            return Ok(());
        }
        let due = match self.state.last_probe_time {
            None => true,
            Some(last) => now.duration_since(last) >= self.config.persist_interval,
        };
        if due {
            let seq = self.state.next_seq;
            let probe = Segment::probe(seq, 0);
            self.channel.send_frame(probe.encode()).await?;
            self.state.last_probe_time = Some(now);
            warn!(seq, "sent zero-window persist probe");
        }
        Ok(())
    }

    /// Activity 3: RTO-driven retransmission of the oldest unacked segment,
    /// scanned no more often than `config.timeout_check`.
    async fn check_timeout(&mut self, now: Instant) -> Result<()> {
        let due = match self.state.last_timeout_scan {
            None => true,
            Some(last) => now.duration_since(last) >= self.config.timeout_check,
        };
        if !due {
            return Ok(());
        }
        self.state.last_timeout_scan = Some(now);

        let rto = self.rtt.rto();
        if let Some((seq, payload)) = self.retransmit.oldest_expired(now, rto) {
            self.stats.timeouts += 1;
            let retries = self.retransmit.mark_retransmitted(seq, now);
            if let Some(max) = self.config.max_retries {
                if retries > max {
                    return Err(TcpliteError::TransferAborted(seq));
                }
            }
            let segment = Segment::data(seq, payload);
            self.channel.send_frame(segment.encode()).await?;
            self.congestion.on_timeout();
            debug!(seq, rto_ms = rto.as_millis() as u64, "timeout retransmission");
        }
        Ok(())
    }

    /// Activity 4: non-blocking drain of all currently available ACK
    /// frames, updating sender state for each.
    async fn drain_acks(&mut self, now: Instant) -> Result<()> {
        loop {
            match tokio::time::timeout(Duration::ZERO, self.channel.recv_frame()).await {
                Ok(Ok(bytes)) => {
                    let ack = Ack::decode(&bytes)?;
                    if let Some((seq, payload)) = self.handle_ack(ack, now) {
                        let segment = Segment::data(seq, payload);
                        self.channel.send_frame(segment.encode()).await?;
                    }
                }
                Ok(Err(err)) => return Err(err),
                Err(_elapsed) => break,
            }
        }
        Ok(())
    }

    /// Pure state transition for an incoming ACK. Returns the
    /// fast-retransmit segment to resend, if one was triggered, so the
    /// caller can perform the (async) send.
    fn handle_ack(&mut self, ack: Ack, now: Instant) -> Option<(i32, Bytes)> {
        self.state.rwnd = ack.rwnd;
        if ack.rwnd == 0 {
            self.state.persist_mode = true;
        } else if self.state.persist_mode {
            self.state.persist_mode = false;
        }

        if ack.ack > self.state.last_byte_acked {
            let newly_acked = (ack.ack - self.state.last_byte_acked) as u32;
            let acked_entries = self.retransmit.ack_through(ack.ack);
            if let Some((_, sent_at, retransmitted)) =
                acked_entries.iter().find(|(seq, _, _)| *seq == ack.ack)
            {
                if !retransmitted {
                    self.rtt.update(now.duration_since(*sent_at));
                }
            }
            self.state.last_byte_acked = ack.ack;
            self.congestion.on_new_ack(ack.ack, newly_acked);
            None
        } else if ack.ack == self.state.last_byte_acked && ack.ack > 0 {
            self.stats.duplicate_acks += 1;
            let outcome = self.congestion.on_duplicate_ack(ack.ack);
            outcome.fast_retransmit_seq.and_then(|seq| {
                self.retransmit.get(seq).map(|entry| {
                    let payload = entry.payload.clone();
                    self.stats.fast_retransmits += 1;
                    self.retransmit.mark_retransmitted(seq, now);
                    (seq, payload)
                })
            })
        } else {
            None
        }
    }

    /// Sends END and waits up to 5s for its cumulative ACK.
    async fn send_end_and_await_ack(&mut self) -> Result<()> {
        let seq = self.state.next_seq;
        let end = Segment::end(seq);
        self.channel.send_frame(end.encode()).await?;
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if Instant::now() >= deadline {
                return Err(TcpliteError::TransferAborted(seq));
            }
            match tokio::time::timeout(Duration::from_millis(10), self.channel.recv_frame()).await
            {
                Ok(Ok(bytes)) => {
                    let ack = Ack::decode(&bytes)?;
                    if ack.ack >= seq {
                        return Ok(());
                    }
                }
                Ok(Err(err)) => return Err(err),
                Err(_elapsed) => continue,
            }
        }
    }

    /// Runs the full transfer to completion.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let now = Instant::now();
            self.transmit_ready(now).await?;
            self.maybe_persist(now).await?;
            self.check_timeout(now).await?;
            self.drain_acks(now).await?;

            if self.transfer_complete() {
                break;
            }
            tokio::time::sleep(self.config.pacing_delay).await;
        }
        self.send_end_and_await_ack().await
    }
}
