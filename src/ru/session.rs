//! Decode session state and the frame walk.

use crate::btm::{self, BtmFragment, Reassembler};
use crate::error::{DecodeError, Result};
use crate::header::{Header, FRAME_PREFIX_LEN};
use crate::mmi::{MmiDynamic, MmiDriverMessage, MmiFailureReport, MmiStatus};
use crate::types::{PacketFamily, Payload, Record};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Default limit on resynchronisation events per session.
pub const DEFAULT_RESYNC_LIMIT: usize = 100;

/// Counters accumulated over a decode session.
///
/// The CLI prints these as the post-decode summary; library consumers can
/// read them through [`RuSession::stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Frames whose header parsed successfully.
    pub frames: u64,
    /// Records emitted (including passthrough and unknown records).
    pub records: u64,
    /// Telegrams reassembled.
    pub telegrams: u64,
    /// Resynchronisation events performed.
    pub resync_events: u64,
    /// Bytes skipped across all resynchronisation scans.
    pub bytes_skipped: u64,
    /// Fragments that overwrote an already-received index.
    pub duplicate_overwrites: u64,
    pub truncated: u64,
    pub invalid_calendar_fields: u64,
    pub bodies_too_short: u64,
    pub fragment_index_mismatches: u64,
    pub partial_telegrams_evicted: u64,
    pub unknown_packet_types: u64,
    pub resync_budget_exceeded: u64,
}

impl SessionStats {
    /// Total error items emitted.
    pub fn errors(&self) -> u64 {
        self.truncated
            + self.invalid_calendar_fields
            + self.bodies_too_short
            + self.fragment_index_mismatches
            + self.partial_telegrams_evicted
            + self.unknown_packet_types
            + self.resync_budget_exceeded
    }

    fn count_error(&mut self, err: &DecodeError) {
        match err {
            DecodeError::Truncated { .. } => self.truncated += 1,
            DecodeError::InvalidCalendarField { .. } => self.invalid_calendar_fields += 1,
            DecodeError::BodyTooShort { .. } => self.bodies_too_short += 1,
            DecodeError::FragmentIndexMismatch { .. } => self.fragment_index_mismatches += 1,
            DecodeError::PartialTelegramEvicted { .. } => self.partial_telegrams_evicted += 1,
            DecodeError::UnknownPacketType { .. } => self.unknown_packet_types += 1,
            DecodeError::ResyncBudgetExceeded { .. } => self.resync_budget_exceeded += 1,
            _ => {}
        }
    }

    /// Compact one-line summary.
    pub fn summary(&self) -> String {
        format!(
            "frames={} records={} telegrams={} evictions={} errors={} resyncs={} skipped={}B",
            self.frames,
            self.records,
            self.telegrams,
            self.partial_telegrams_evicted,
            self.errors(),
            self.resync_events,
            self.bytes_skipped,
        )
    }
}

/// Outcome of one [`RuSession::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepStatus {
    /// Consumed input and possibly queued output; call again.
    Progress,
    /// The buffered input ends mid-frame; feed more bytes.
    NeedMore,
    /// The stream ended, cleanly or after a fatal error.
    Finished,
}

/// One decode session: a reassembler, resynchronisation accounting, and
/// output counters. Sessions share no state and are cheap to create.
#[derive(Debug)]
pub struct RuSession {
    reassembler: Reassembler,
    resync_limit: usize,
    stats: SessionStats,
    resyncing: bool,
    aborted: bool,
}

impl Default for RuSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RuSession {
    pub fn new() -> Self {
        Self::with_resync_limit(DEFAULT_RESYNC_LIMIT)
    }

    /// Creates a session with a custom resynchronisation budget.
    pub fn with_resync_limit(resync_limit: usize) -> Self {
        RuSession {
            reassembler: Reassembler::new(),
            resync_limit,
            stats: SessionStats::default(),
            resyncing: false,
            aborted: false,
        }
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Sequences with incomplete telegrams, with fragment counts.
    pub fn pending_telegrams(&self) -> Vec<(u8, u8)> {
        self.reassembler.pending_sequences()
    }

    /// Decodes every frame of `input`, yielding records interleaved with
    /// errors. Stream-fatal errors are yielded last, then the iterator
    /// ends.
    ///
    /// A telegram record is yielded at the frame whose fragment completes
    /// it; all other records follow strict frame order.
    pub fn decode_all<'s, 'i>(&'s mut self, input: &'i [u8]) -> FrameWalker<'s, 'i> {
        FrameWalker { session: self, input, offset: 0, out: VecDeque::new(), finished: false }
    }

    /// Advances the walk by at most one frame (or one resync scan).
    ///
    /// `at_eof` tells the walk whether `input` is the whole remaining
    /// stream: mid-frame truncation is fatal at EOF but just a request for
    /// more bytes otherwise. Decoded items are queued onto `out`.
    pub(crate) fn step(
        &mut self,
        input: &[u8],
        offset: &mut usize,
        out: &mut VecDeque<Result<Record>>,
        at_eof: bool,
    ) -> StepStatus {
        if self.aborted {
            return StepStatus::Finished;
        }

        if self.resyncing {
            match self.scan_for_header(input, offset, at_eof) {
                Some(status) => return status,
                None => self.resyncing = false,
            }
        }

        if *offset >= input.len() {
            return if at_eof { StepStatus::Finished } else { StepStatus::NeedMore };
        }

        let frame_offset = *offset;
        match Header::parse_frame(&input[frame_offset..]) {
            Ok((header, body, consumed)) => {
                self.stats.frames += 1;
                self.dispatch(header, body, frame_offset, out);
                *offset += consumed;
                StepStatus::Progress
            }
            Err(err @ DecodeError::Truncated { .. }) => {
                if !at_eof {
                    return StepStatus::NeedMore;
                }
                // Truncated mid-frame; a clean end would have hit the
                // offset == len check above.
                self.emit_err(out, err.offset_by(frame_offset));
                self.aborted = true;
                StepStatus::Finished
            }
            Err(err) => {
                self.emit_err(out, err);
                self.begin_resync(out, offset)
            }
        }
    }

    /// Resync scan: advance byte-wise until a header parses. Returns the
    /// step status while the scan is still in progress, `None` once a
    /// plausible header is found.
    fn scan_for_header(
        &mut self,
        input: &[u8],
        offset: &mut usize,
        at_eof: bool,
    ) -> Option<StepStatus> {
        loop {
            if *offset >= input.len() {
                return Some(if at_eof { StepStatus::Finished } else { StepStatus::NeedMore });
            }
            match Header::parse(&input[*offset..]) {
                Ok(_) => return None,
                Err(DecodeError::Truncated { .. }) => {
                    return Some(if at_eof {
                        StepStatus::Finished
                    } else {
                        StepStatus::NeedMore
                    });
                }
                Err(_) => {
                    *offset += 1;
                    self.stats.bytes_skipped += 1;
                }
            }
        }
    }

    fn begin_resync(
        &mut self,
        out: &mut VecDeque<Result<Record>>,
        offset: &mut usize,
    ) -> StepStatus {
        self.stats.resync_events += 1;
        if self.stats.resync_events > self.resync_limit as u64 {
            let err =
                DecodeError::ResyncBudgetExceeded { skipped: self.stats.bytes_skipped as usize };
            warn!(limit = self.resync_limit, "resynchronisation budget exhausted");
            self.emit_err(out, err);
            self.aborted = true;
            return StepStatus::Finished;
        }
        debug!(event = self.stats.resync_events, "resynchronising");
        self.resyncing = true;
        *offset += 1;
        self.stats.bytes_skipped += 1;
        StepStatus::Progress
    }

    fn dispatch(
        &mut self,
        header: Header,
        body: &[u8],
        frame_offset: usize,
        out: &mut VecDeque<Result<Record>>,
    ) {
        let packet_type = header.packet_type;
        match packet_type {
            // Type 4 is the ATP-reported snapshot; same layout as type 1.
            1 | 4 => match MmiDynamic::decode(body) {
                Ok(data) => self.emit_record(out, Record::new(header, Payload::MmiDynamic(data))),
                Err(err) => self.emit_err(out, err),
            },
            2 => match MmiStatus::decode(body) {
                Ok(data) => self.emit_record(out, Record::new(header, Payload::MmiStatus(data))),
                Err(err) => self.emit_err(out, err),
            },
            8 => match MmiDriverMessage::decode(body) {
                Ok(data) => {
                    self.emit_record(out, Record::new(header, Payload::MmiDriverMessage(data)))
                }
                Err(err) => self.emit_err(out, err),
            },
            9 => match MmiFailureReport::decode(body) {
                Ok(data) => {
                    self.emit_record(out, Record::new(header, Payload::MmiFailureReport(data)))
                }
                Err(err) => self.emit_err(out, err),
            },
            t if btm::is_fragment_type(t) => {
                match BtmFragment::parse(t, body) {
                    Ok(fragment) => {
                        let outcome = self.reassembler.push(&fragment, header.timestamp);
                        if outcome.duplicate_overwrite {
                            self.stats.duplicate_overwrites += 1;
                        }
                        if let Some(evicted) = outcome.evicted {
                            self.emit_err(out, evicted.into());
                        }
                        if let Some(telegram) = outcome.telegram {
                            self.stats.telegrams += 1;
                            self.emit_record(
                                out,
                                Record::new(header, Payload::BtmTelegram(telegram)),
                            );
                        }
                    }
                    Err(err) => {
                        self.emit_err(out, err.offset_by(frame_offset + FRAME_PREFIX_LEN))
                    }
                }
            }
            t => match PacketFamily::from_packet_type(t) {
                Some(family) => self.emit_record(
                    out,
                    Record::new(header, Payload::Passthrough { family, body: body.to_vec() }),
                ),
                None => {
                    self.emit_err(
                        out,
                        DecodeError::UnknownPacketType { packet_type: t, offset: frame_offset },
                    );
                    self.emit_record(
                        out,
                        Record::new(header, Payload::Unknown { body: body.to_vec() }),
                    );
                }
            },
        }
    }

    fn emit_record(&mut self, out: &mut VecDeque<Result<Record>>, record: Record) {
        self.stats.records += 1;
        out.push_back(Ok(record));
    }

    fn emit_err(&mut self, out: &mut VecDeque<Result<Record>>, err: DecodeError) {
        self.stats.count_error(&err);
        out.push_back(Err(err));
    }
}

/// Iterator over the records and errors of one in-memory input.
///
/// Returned by [`RuSession::decode_all`].
pub struct FrameWalker<'s, 'i> {
    session: &'s mut RuSession,
    input: &'i [u8],
    offset: usize,
    out: VecDeque<Result<Record>>,
    finished: bool,
}

impl Iterator for FrameWalker<'_, '_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.out.pop_front() {
                return Some(item);
            }
            if self.finished {
                return None;
            }
            match self.session.step(self.input, &mut self.offset, &mut self.out, true) {
                StepStatus::Progress => {}
                StepStatus::NeedMore | StepStatus::Finished => self.finished = true,
            }
        }
    }
}
