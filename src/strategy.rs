//! A dense decision table mapping `(our_score, opp_score)` to a roll count.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use crate::config::{GOAL, MAX_ROLLS, MIN_ROLLS};
use crate::error::{StrategyError, WireError};

const ROLLS_SIZE: usize = (GOAL * GOAL) as usize;
const FRAMING_MARKER: u8 = 0x0A;
const UNOWNED: u64 = 0;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a fresh, process-unique session id.
///
/// Called by [`crate::session::Session::new`]; kept here so the ownership
/// handle and its generator live next to each other.
pub(crate) fn next_session_id() -> u64 {
    NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)
}

/// A complete Hog playing strategy: how many dice to roll at every
/// `(our_score, opp_score)` pair.
///
/// A strategy may be owned by at most one [`crate::session::Session`] at a
/// time. Ownership is tracked with an opaque generation id rather than a
/// back-pointer, so a `Strategy` can be freely moved, cloned and compared
/// without borrow-checker fights; [`Strategy::clone`] always produces a
/// detached copy. The id is stored in an `AtomicU64` rather than a `Cell` so
/// that `Strategy` stays `Sync` and a slice of strategies can be shared
/// across the tournament runner's worker threads.
#[derive(Debug)]
pub struct Strategy {
    id: String,
    name: String,
    rolls: Box<[i8]>,
    owner: AtomicU64,
}

impl Clone for Strategy {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            rolls: self.rolls.clone(),
            owner: AtomicU64::new(UNOWNED),
        }
    }
}

impl Strategy {
    /// Create a detached strategy with every cell set to `0`. If `name` is
    /// empty, `id` is used as the name.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        let name = name.into();
        let name = if name.is_empty() { id.clone() } else { name };
        Self {
            id,
            name,
            rolls: vec![0i8; ROLLS_SIZE].into_boxed_slice(),
            owner: AtomicU64::new(UNOWNED),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a session currently claims this strategy.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.owner.load(Ordering::Acquire) != UNOWNED
    }

    /// Claim this strategy for `session_id`. Returns `false` if it is
    /// already claimed by a different session.
    pub(crate) fn attach(&self, session_id: u64) -> bool {
        match self.owner.compare_exchange(UNOWNED, session_id, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => true,
            Err(existing) => existing == session_id,
        }
    }

    pub(crate) fn detach(&self, session_id: u64) {
        let _ = self.owner.compare_exchange(session_id, UNOWNED, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Number of dice to roll with `our_score` facing `opp_score`.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError::ScoreOutOfRange`] if either score is outside
    /// `[0, GOAL)`.
    pub fn get(&self, our_score: u32, opp_score: u32) -> Result<u8, StrategyError> {
        let idx = self.index(our_score, opp_score)?;
        Ok(self.rolls[idx] as u8)
    }

    /// Set the number of dice to roll with `our_score` facing `opp_score`.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError::ScoreOutOfRange`] if either score is outside
    /// `[0, GOAL)`, or [`StrategyError::RollOutOfRange`] if `value` is
    /// outside `[MIN_ROLLS, MAX_ROLLS]`.
    pub fn set(&mut self, our_score: u32, opp_score: u32, value: u32) -> Result<(), StrategyError> {
        let idx = self.index(our_score, opp_score)?;
        check_roll(value)?;
        self.rolls[idx] = value as i8;
        Ok(())
    }

    fn index(&self, our_score: u32, opp_score: u32) -> Result<usize, StrategyError> {
        if our_score >= GOAL {
            return Err(StrategyError::ScoreOutOfRange(our_score as i32, GOAL));
        }
        if opp_score >= GOAL {
            return Err(StrategyError::ScoreOutOfRange(opp_score as i32, GOAL));
        }
        Ok((our_score * GOAL + opp_score) as usize)
    }

    /// Set every cell to the same roll count.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError::RollOutOfRange`] if `value` is outside
    /// `[MIN_ROLLS, MAX_ROLLS]`.
    pub fn set_const(&mut self, value: u32) -> Result<(), StrategyError> {
        check_roll(value)?;
        self.rolls.fill(value as i8);
        Ok(())
    }

    /// Set every cell to an independently-sampled roll count.
    pub fn set_random(&mut self, rng: &mut impl Rng) {
        for cell in self.rolls.iter_mut() {
            *cell = rng.random_range(MIN_ROLLS..=MAX_ROLLS) as i8;
        }
    }

    /// Overwrite every cell from a raw `GOAL * GOAL` byte buffer, in the same
    /// `our_score * GOAL + opp_score` order as [`Strategy::get`].
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Truncated`] if `buf` is shorter than `GOAL * GOAL`.
    pub fn set_from_buffer(&mut self, buf: &[i8]) -> Result<(), WireError> {
        if buf.len() < ROLLS_SIZE {
            return Err(WireError::Truncated {
                expected: ROLLS_SIZE,
                found: buf.len(),
            });
        }
        self.rolls.copy_from_slice(&buf[..ROLLS_SIZE]);
        Ok(())
    }

    /// Count of cells that differ between `self` and `other`.
    #[must_use]
    pub fn num_diff(&self, other: &Strategy) -> usize {
        self.rolls.iter().zip(other.rolls.iter()).filter(|(a, b)| a != b).count()
    }

    /// Whether `self` and `other` have byte-identical roll tables. Unlike
    /// `PartialEq` this ignores `id` and `name`, so it can recognize the
    /// same strategy re-added under a different label.
    #[must_use]
    pub fn equals(&self, other: &Strategy) -> bool {
        self.rolls == other.rolls
    }

    /// Serialize to the wire format: a `0x0A` framing marker, the id and
    /// name each prefixed by an 8-byte little-endian length, then the raw
    /// `GOAL * GOAL` roll bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 16 + self.id.len() + self.name.len() + ROLLS_SIZE);
        out.push(FRAMING_MARKER);
        out.extend_from_slice(&(self.id.len() as u64).to_le_bytes());
        out.extend_from_slice(self.id.as_bytes());
        out.extend_from_slice(&(self.name.len() as u64).to_le_bytes());
        out.extend_from_slice(self.name.as_bytes());
        out.extend(self.rolls.iter().map(|&b| b as u8));
        out
    }

    /// Parse a strategy previously produced by [`Strategy::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`WireError::MissingFramingMarker`], [`WireError::Truncated`]
    /// or [`WireError::InvalidUtf8`] on malformed input.
    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        let mut cursor = 0usize;
        let marker = read_u8(buf, &mut cursor)?;
        if marker != FRAMING_MARKER {
            return Err(WireError::MissingFramingMarker);
        }
        let id = read_string(buf, &mut cursor)?;
        let name = read_string(buf, &mut cursor)?;
        let remaining = buf.len() - cursor;
        if remaining < ROLLS_SIZE {
            return Err(WireError::Truncated {
                expected: ROLLS_SIZE,
                found: remaining,
            });
        }
        let rolls: Box<[i8]> = buf[cursor..cursor + ROLLS_SIZE].iter().map(|&b| b as i8).collect();
        Ok(Self {
            id,
            name,
            rolls,
            owner: AtomicU64::new(UNOWNED),
        })
    }
}

fn check_roll(value: u32) -> Result<(), StrategyError> {
    if value < MIN_ROLLS || value > MAX_ROLLS {
        return Err(StrategyError::RollOutOfRange(value as i32, MIN_ROLLS, MAX_ROLLS));
    }
    Ok(())
}

fn read_u8(buf: &[u8], cursor: &mut usize) -> Result<u8, WireError> {
    let byte = *buf.get(*cursor).ok_or(WireError::Truncated {
        expected: 1,
        found: buf.len() - *cursor,
    })?;
    *cursor += 1;
    Ok(byte)
}

fn read_string(buf: &[u8], cursor: &mut usize) -> Result<String, WireError> {
    if buf.len() - *cursor < 8 {
        return Err(WireError::Truncated {
            expected: 8,
            found: buf.len() - *cursor,
        });
    }
    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&buf[*cursor..*cursor + 8]);
    let len = u64::from_le_bytes(len_bytes) as usize;
    *cursor += 8;
    if buf.len() - *cursor < len {
        return Err(WireError::Truncated {
            expected: len,
            found: buf.len() - *cursor,
        });
    }
    let s = String::from_utf8(buf[*cursor..*cursor + len].to_vec()).map_err(|_| WireError::InvalidUtf8)?;
    *cursor += len;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults_name_to_id_when_empty() {
        let s = Strategy::new("abc", "");
        assert_eq!(s.id(), "abc");
        assert_eq!(s.name(), "abc");
    }

    #[test]
    fn get_set_round_trip() {
        let mut s = Strategy::new("a", "a");
        s.set(10, 20, 5).unwrap();
        assert_eq!(s.get(10, 20).unwrap(), 5);
    }

    #[test]
    fn out_of_range_score_is_rejected() {
        let s = Strategy::new("a", "a");
        assert!(matches!(s.get(GOAL, 0), Err(StrategyError::ScoreOutOfRange(_, _))));
        assert!(matches!(s.get(0, GOAL), Err(StrategyError::ScoreOutOfRange(_, _))));
    }

    #[test]
    fn out_of_range_roll_is_rejected() {
        let mut s = Strategy::new("a", "a");
        assert!(matches!(
            s.set(0, 0, MAX_ROLLS + 1),
            Err(StrategyError::RollOutOfRange(_, _, _))
        ));
    }

    #[test]
    fn equals_ignores_id_and_name() {
        let mut a = Strategy::new("a", "alpha");
        let mut b = Strategy::new("b", "beta");
        a.set_const(3).unwrap();
        b.set_const(3).unwrap();
        assert!(a.equals(&b));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn num_diff_counts_differing_cells() {
        let mut a = Strategy::new("a", "a");
        let mut b = Strategy::new("b", "b");
        a.set_const(0).unwrap();
        b.set_const(0).unwrap();
        b.set(5, 5, 2).unwrap();
        assert_eq!(a.num_diff(&b), 1);
    }

    #[test]
    fn clone_is_detached() {
        let s = Strategy::new("a", "a");
        assert!(s.attach(7));
        let cloned = s.clone();
        assert!(!cloned.is_owned());
        assert!(s.is_owned());
    }

    #[test]
    fn attach_rejects_second_owner() {
        let s = Strategy::new("a", "a");
        assert!(s.attach(1));
        assert!(!s.attach(2));
        s.detach(1);
        assert!(s.attach(2));
    }

    #[test]
    fn encode_decode_round_trip() {
        let mut s = Strategy::new("id-1", "name one");
        s.set_random(&mut rand::rng());
        let bytes = s.encode();
        let decoded = Strategy::decode(&bytes).unwrap();
        assert_eq!(decoded.id(), s.id());
        assert_eq!(decoded.name(), s.name());
        assert!(decoded.equals(&s));
    }

    #[test]
    fn decode_rejects_bad_marker() {
        let bytes = vec![0xFFu8; 32];
        assert!(matches!(Strategy::decode(&bytes), Err(WireError::MissingFramingMarker)));
    }

    #[test]
    fn decode_rejects_truncated_buffer() {
        let s = Strategy::new("id", "name");
        let mut bytes = s.encode();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(Strategy::decode(&bytes), Err(WireError::Truncated { .. })));
    }
}
