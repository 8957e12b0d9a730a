//! Balise telegram reassembly.
//!
//! A balise telegram reaches the recorder over the vehicle bus split into
//! five fragments (packet types 43-47, fragment indices 1-5). Fragment 1
//! carries 4 payload bytes, fragments 2-5 carry 25 each, for 104 bytes per
//! complete telegram. Fragments may arrive in any order, and up to ten
//! telegram sequences can be in flight at once.
//!
//! The [`Reassembler`] keeps a fixed pool of ten slots. A slot opens when
//! the first fragment of a new sequence arrives and closes when the fifth
//! index lands (emitting the telegram) or when the pool is full and a new
//! sequence forces out the slot with the oldest opening timestamp.
//!
//! ## Fragment body layout
//!
//! ```text
//! offset 0  telegram sequence number  u8
//! offset 1  fragment index            u8   must match the packet type
//! offset 2  payload                   4 or 25 bytes
//! ```

use crate::error::{DecodeError, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, warn};

/// First packet type of the fragment range.
pub const FRAGMENT_TYPE_BASE: u8 = 43;

/// Number of fragments per telegram.
pub const FRAGMENT_COUNT: usize = 5;

/// Length of a complete reassembled telegram.
pub const TELEGRAM_LEN: usize = 104;

/// Number of concurrent in-progress sequences the pool holds.
pub const SLOT_COUNT: usize = 10;

/// Payload length per fragment index (1-based index minus one).
const PAYLOAD_LEN: [usize; FRAGMENT_COUNT] = [4, 25, 25, 25, 25];

/// Byte offset of each fragment's payload within the assembled telegram.
const PAYLOAD_OFFSET: [usize; FRAGMENT_COUNT] = [0, 4, 29, 54, 79];

/// Returns true when `packet_type` is a telegram fragment (43-47).
pub fn is_fragment_type(packet_type: u8) -> bool {
    (FRAGMENT_TYPE_BASE..FRAGMENT_TYPE_BASE + FRAGMENT_COUNT as u8).contains(&packet_type)
}

/// One fragment of a telegram, borrowed from a frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BtmFragment<'a> {
    /// Telegram sequence number grouping the five fragments.
    pub sequence: u8,
    /// Fragment index, 1-5.
    pub index: u8,
    /// Payload bytes: 4 for index 1, 25 for indices 2-5.
    pub payload: &'a [u8],
}

impl<'a> BtmFragment<'a> {
    /// Parses a fragment from a frame body.
    ///
    /// The fragment index is implied by the packet type (43 -> 1 ... 47 ->
    /// 5); the body's self-reported index must agree or the fragment is
    /// rejected with [`DecodeError::FragmentIndexMismatch`].
    pub fn parse(packet_type: u8, body: &'a [u8]) -> Result<Self> {
        debug_assert!(is_fragment_type(packet_type));
        let index = packet_type - FRAGMENT_TYPE_BASE + 1;
        let payload_len = PAYLOAD_LEN[index as usize - 1];

        let need = 2 + payload_len;
        if body.len() < need {
            return Err(DecodeError::Truncated { offset: body.len(), need });
        }

        let reported = body[1];
        if reported != index {
            return Err(DecodeError::FragmentIndexMismatch { expected: index, actual: reported });
        }

        Ok(BtmFragment { sequence: body[0], index, payload: &body[2..2 + payload_len] })
    }
}

/// A complete 104-byte telegram from a single balise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BtmTelegram {
    /// Sequence number the fragments were grouped under.
    pub sequence: u8,
    /// Reassembled payload, fragments concatenated in index order.
    pub data: Vec<u8>,
    /// Capture timestamp of the completing fragment.
    pub timestamp: NaiveDateTime,
}

/// Partial sequence discarded to make room for a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictedPartial {
    pub sequence: u8,
    pub fragments_present: u8,
}

impl From<EvictedPartial> for DecodeError {
    fn from(evicted: EvictedPartial) -> Self {
        DecodeError::PartialTelegramEvicted {
            sequence: evicted.sequence,
            fragments_present: evicted.fragments_present,
        }
    }
}

/// Outcome of feeding one fragment into the pool.
#[derive(Debug, Default)]
pub struct PushOutcome {
    /// Telegram completed by this fragment, if any.
    pub telegram: Option<BtmTelegram>,
    /// Partial sequence evicted to admit this fragment, if any.
    pub evicted: Option<EvictedPartial>,
    /// Set when this fragment overwrote an index already present.
    pub duplicate_overwrite: bool,
}

#[derive(Debug, Clone)]
struct Slot {
    sequence: u8,
    data: [u8; TELEGRAM_LEN],
    received: [bool; FRAGMENT_COUNT],
    /// Timestamp of the fragment that opened the slot; orders eviction.
    earliest_ts: NaiveDateTime,
}

impl Slot {
    fn new(sequence: u8, ts: NaiveDateTime) -> Self {
        Slot { sequence, data: [0; TELEGRAM_LEN], received: [false; FRAGMENT_COUNT], earliest_ts: ts }
    }

    fn fragments_present(&self) -> u8 {
        self.received.iter().filter(|&&r| r).count() as u8
    }

    fn is_complete(&self) -> bool {
        self.received.iter().all(|&r| r)
    }
}

/// Fixed-capacity pool reassembling telegrams from interleaved fragments.
///
/// Single-threaded: fragments are processed in the order the dispatcher
/// feeds them. Completion depends only on the set of received indices, not
/// their arrival order.
#[derive(Debug, Default)]
pub struct Reassembler {
    slots: [Option<Slot>; SLOT_COUNT],
    /// Partial sequences discarded because the pool was full.
    pub evicted_incomplete: u64,
    /// Fragments that overwrote an index already present in their slot.
    pub duplicate_overwrites: u64,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one fragment; returns the completion/eviction outcome.
    ///
    /// Duplicate indices are last-writer-wins. A completed slot is released
    /// immediately; an unknown sequence arriving with every slot partial
    /// evicts the slot with the oldest opening timestamp.
    pub fn push(&mut self, fragment: &BtmFragment<'_>, ts: NaiveDateTime) -> PushOutcome {
        let mut outcome = PushOutcome::default();

        let slot_index = match self.find_slot(fragment.sequence) {
            Some(i) => i,
            None => {
                let (i, evicted) = self.claim_slot(fragment.sequence, ts);
                if let Some(evicted) = evicted {
                    warn!(
                        sequence = evicted.sequence,
                        fragments_present = evicted.fragments_present,
                        "evicted partial telegram"
                    );
                    self.evicted_incomplete += 1;
                    outcome.evicted = Some(evicted);
                }
                i
            }
        };

        let mut completed = false;
        if let Some(slot) = self.slots[slot_index].as_mut() {
            let at = fragment.index as usize - 1;
            if slot.received[at] {
                self.duplicate_overwrites += 1;
                outcome.duplicate_overwrite = true;
            }
            slot.data[PAYLOAD_OFFSET[at]..PAYLOAD_OFFSET[at] + fragment.payload.len()]
                .copy_from_slice(fragment.payload);
            slot.received[at] = true;

            if slot.is_complete() {
                debug!(sequence = slot.sequence, "telegram reassembled");
                outcome.telegram = Some(BtmTelegram {
                    sequence: slot.sequence,
                    data: slot.data.to_vec(),
                    timestamp: ts,
                });
                completed = true;
            }
        }
        if completed {
            self.slots[slot_index] = None;
        }

        outcome
    }

    /// Number of sequences currently in progress.
    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Sequence numbers with incomplete telegrams, with fragment counts.
    pub fn pending_sequences(&self) -> Vec<(u8, u8)> {
        self.slots
            .iter()
            .flatten()
            .map(|slot| (slot.sequence, slot.fragments_present()))
            .collect()
    }

    /// Discards all in-progress sequences.
    pub fn clear(&mut self) {
        self.slots = Default::default();
    }

    fn find_slot(&self, sequence: u8) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|slot| slot.sequence == sequence))
    }

    /// Claims a slot for a new sequence, evicting the oldest partial slot
    /// when the pool is full. Linear scan; the pool holds ten entries.
    fn claim_slot(&mut self, sequence: u8, ts: NaiveDateTime) -> (usize, Option<EvictedPartial>) {
        if let Some(i) = self.slots.iter().position(|s| s.is_none()) {
            self.slots[i] = Some(Slot::new(sequence, ts));
            return (i, None);
        }

        let mut oldest = 0;
        let mut oldest_ts = None;
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(slot) = slot.as_ref() {
                if oldest_ts.map_or(true, |earliest| slot.earliest_ts < earliest) {
                    oldest = i;
                    oldest_ts = Some(slot.earliest_ts);
                }
            }
        }

        let evicted = self.slots[oldest].as_ref().map(|slot| EvictedPartial {
            sequence: slot.sequence,
            fragments_present: slot.fragments_present(),
        });
        self.slots[oldest] = Some(Slot::new(sequence, ts));
        (oldest, evicted)
    }
}
