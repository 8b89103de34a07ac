use hashbrown::HashMap;
use strata_geom::BlockPos;

use crate::config::EmergeLimits;

pub type PeerId = u16;

/// Requests from the server itself; never counted against a peer quota.
pub const PEER_ID_INEXISTENT: PeerId = 0;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EmergeFlags(u8);

impl EmergeFlags {
    pub const NONE: EmergeFlags = EmergeFlags(0);
    /// Generate the block if storage does not have it.
    pub const ALLOW_GENERATE: EmergeFlags = EmergeFlags(1);
    /// Bypass the queue limits.
    pub const FORCE_QUEUE: EmergeFlags = EmergeFlags(2);

    pub const fn union(self, o: EmergeFlags) -> EmergeFlags {
        EmergeFlags(self.0 | o.0)
    }

    pub const fn contains(self, o: EmergeFlags) -> bool {
        self.0 & o.0 == o.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EmergeOutcome {
    FromMemory,
    FromDisk,
    Generated,
    Cancelled,
    Errored,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EnqueueError {
    #[error("emerge queue is full")]
    QueueFull,
    #[error("peer {0} has too many queued blocks")]
    PeerQuotaExceeded(PeerId),
    #[error("emerge service is not accepting requests")]
    Halted,
}

pub type EmergeCallback = Box<dyn FnOnce(BlockPos, EmergeOutcome) + Send>;

pub struct PendingRequest {
    pub flags: EmergeFlags,
    pub peer: PeerId,
    pub callbacks: Vec<EmergeCallback>,
}

impl PendingRequest {
    pub fn complete(self, pos: BlockPos, outcome: EmergeOutcome) {
        for cb in self.callbacks {
            cb(pos, outcome);
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Admission {
    /// First request for the position; it must be handed to a worker.
    New,
    /// Folded into a request that is already queued.
    Merged,
}

/// Queued positions plus per-peer counters.
pub struct PendingTable {
    entries: HashMap<BlockPos, PendingRequest>,
    peer_counts: HashMap<PeerId, usize>,
    limits: EmergeLimits,
}

impl PendingTable {
    pub fn new(limits: EmergeLimits) -> Self {
        Self {
            entries: HashMap::new(),
            peer_counts: HashMap::new(),
            limits,
        }
    }

    /// Admits a request. Limits are checked before deduplication, so a
    /// duplicate can still be refused; a refusal leaves the table untouched.
    pub fn push(
        &mut self,
        pos: BlockPos,
        peer: PeerId,
        flags: EmergeFlags,
        callback: Option<EmergeCallback>,
    ) -> Result<Admission, EnqueueError> {
        if !flags.contains(EmergeFlags::FORCE_QUEUE) {
            if self.entries.len() >= self.limits.total {
                return Err(EnqueueError::QueueFull);
            }
            if peer != PEER_ID_INEXISTENT {
                let quota = if flags.contains(EmergeFlags::ALLOW_GENERATE) {
                    self.limits.generate
                } else {
                    self.limits.diskonly
                };
                if self.peer_count(peer) >= quota {
                    return Err(EnqueueError::PeerQuotaExceeded(peer));
                }
            }
        }

        if let Some(entry) = self.entries.get_mut(&pos) {
            entry.flags = entry.flags.union(flags);
            entry.callbacks.extend(callback);
            return Ok(Admission::Merged);
        }
        self.entries.insert(
            pos,
            PendingRequest {
                flags,
                peer,
                callbacks: callback.into_iter().collect(),
            },
        );
        *self.peer_counts.entry(peer).or_insert(0) += 1;
        Ok(Admission::New)
    }

    pub fn pop(&mut self, pos: BlockPos) -> Option<PendingRequest> {
        let req = self.entries.remove(&pos)?;
        if let Some(c) = self.peer_counts.get_mut(&req.peer) {
            *c -= 1;
            if *c == 0 {
                self.peer_counts.remove(&req.peer);
            }
        }
        Some(req)
    }

    pub fn drain(&mut self) -> Vec<(BlockPos, PendingRequest)> {
        self.peer_counts.clear();
        self.entries.drain().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        self.entries.contains_key(&pos)
    }

    pub fn flags_of(&self, pos: BlockPos) -> Option<EmergeFlags> {
        self.entries.get(&pos).map(|e| e.flags)
    }

    pub fn peer_count(&self, peer: PeerId) -> usize {
        self.peer_counts.get(&peer).copied().unwrap_or(0)
    }

    pub fn limits(&self) -> EmergeLimits {
        self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn table(total: usize, diskonly: usize, generate: usize) -> PendingTable {
        PendingTable::new(EmergeLimits {
            threads: 1,
            total,
            diskonly,
            generate,
        })
    }

    const GEN: EmergeFlags = EmergeFlags::ALLOW_GENERATE;

    #[test]
    fn duplicates_merge_flags_and_callbacks() {
        let mut t = table(8, 8, 8);
        let p = BlockPos::new(1, 2, 3);
        let hits = Arc::new(AtomicUsize::new(0));
        let cb = |h: &Arc<AtomicUsize>| -> Option<EmergeCallback> {
            let h = h.clone();
            Some(Box::new(move |_, _| {
                h.fetch_add(1, Ordering::SeqCst);
            }))
        };

        assert_eq!(t.push(p, 5, EmergeFlags::NONE, cb(&hits)), Ok(Admission::New));
        assert_eq!(t.push(p, 6, GEN, cb(&hits)), Ok(Admission::Merged));
        assert_eq!(t.len(), 1);
        assert_eq!(t.peer_count(5), 1);
        assert_eq!(t.peer_count(6), 0);

        let req = t.pop(p).unwrap();
        assert!(req.flags.contains(GEN));
        assert_eq!(req.peer, 5);
        req.complete(p, EmergeOutcome::Generated);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(t.peer_count(5), 0);
        assert!(t.pop(p).is_none());
    }

    #[test]
    fn peer_quota_depends_on_generate_flag() {
        let mut t = table(100, 3, 1);
        assert!(t.push(BlockPos::new(0, 0, 0), 7, GEN, None).is_ok());
        assert_eq!(
            t.push(BlockPos::new(1, 0, 0), 7, GEN, None),
            Err(EnqueueError::PeerQuotaExceeded(7))
        );
        // load-only requests have the larger quota
        assert!(t.push(BlockPos::new(1, 0, 0), 7, EmergeFlags::NONE, None).is_ok());
        assert!(t.push(BlockPos::new(2, 0, 0), 7, EmergeFlags::NONE, None).is_ok());
        assert_eq!(
            t.push(BlockPos::new(3, 0, 0), 7, EmergeFlags::NONE, None),
            Err(EnqueueError::PeerQuotaExceeded(7))
        );
        // another peer is unaffected
        assert!(t.push(BlockPos::new(3, 0, 0), 8, GEN, None).is_ok());
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn quota_applies_to_duplicates_too() {
        let mut t = table(100, 1, 1);
        let p = BlockPos::new(0, 0, 0);
        t.push(p, 7, GEN, None).unwrap();
        assert_eq!(t.push(p, 7, GEN, None), Err(EnqueueError::PeerQuotaExceeded(7)));
        assert_eq!(t.push(p, 7, GEN.union(EmergeFlags::FORCE_QUEUE), None), Ok(Admission::Merged));
    }

    #[test]
    fn total_limit_and_force_queue() {
        let mut t = table(2, 10, 10);
        t.push(BlockPos::new(0, 0, 0), PEER_ID_INEXISTENT, GEN, None).unwrap();
        t.push(BlockPos::new(1, 0, 0), PEER_ID_INEXISTENT, GEN, None).unwrap();
        assert_eq!(
            t.push(BlockPos::new(2, 0, 0), PEER_ID_INEXISTENT, GEN, None),
            Err(EnqueueError::QueueFull)
        );
        assert_eq!(t.len(), 2);
        let forced = GEN.union(EmergeFlags::FORCE_QUEUE);
        assert_eq!(t.push(BlockPos::new(2, 0, 0), 3, forced, None), Ok(Admission::New));
        assert_eq!(t.len(), 3);
        assert_eq!(t.peer_count(3), 1);
    }

    #[test]
    fn server_requests_skip_peer_quota() {
        let mut t = table(100, 0, 0);
        assert!(t.push(BlockPos::new(0, 0, 0), PEER_ID_INEXISTENT, GEN, None).is_ok());
        assert!(t.push(BlockPos::new(0, 1, 0), PEER_ID_INEXISTENT, GEN, None).is_ok());
        assert_eq!(t.push(BlockPos::new(0, 2, 0), 1, GEN, None), Err(EnqueueError::PeerQuotaExceeded(1)));
    }

    #[test]
    fn drain_empties_everything() {
        let mut t = table(10, 10, 10);
        t.push(BlockPos::new(0, 0, 0), 1, GEN, None).unwrap();
        t.push(BlockPos::new(0, 0, 1), 2, GEN, None).unwrap();
        let drained = t.drain();
        assert_eq!(drained.len(), 2);
        assert!(t.is_empty());
        assert_eq!(t.peer_count(1), 0);
    }
}
