use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, select};
use strata_geom::BlockPos;
use strata_mapgen::{GenerationJob, Mapgen};
use strata_nodes::NodeRegistry;

use crate::pending::{EmergeFlags, EmergeOutcome, PendingTable};
use crate::storage::{BlockSource, MapBlock, Storage, StorageError};

#[derive(Default)]
pub(crate) struct Counters {
    pub from_memory: AtomicUsize,
    pub from_disk: AtomicUsize,
    pub generated: AtomicUsize,
    pub cancelled: AtomicUsize,
    pub errored: AtomicUsize,
}

impl Counters {
    pub fn record(&self, outcome: EmergeOutcome) {
        let c = match outcome {
            EmergeOutcome::FromMemory => &self.from_memory,
            EmergeOutcome::FromDisk => &self.from_disk,
            EmergeOutcome::Generated => &self.generated,
            EmergeOutcome::Cancelled => &self.cancelled,
            EmergeOutcome::Errored => &self.errored,
        };
        c.fetch_add(1, Ordering::Relaxed);
    }
}

/// State every worker and the manager see.
pub(crate) struct Shared {
    pub pending: Mutex<PendingTable>,
    pub storage: Arc<dyn Storage>,
    pub registry: Arc<NodeRegistry>,
    pub seed: u64,
    pub chunksize: i32,
    pub fatal: OnceLock<StorageError>,
    pub stopping: AtomicBool,
    pub counters: Counters,
}

impl Shared {
    pub fn halted(&self) -> bool {
        self.stopping.load(Ordering::Acquire) || self.fatal.get().is_some()
    }

    /// Removes `pos` from the pending table and fires its callbacks.
    pub fn complete(&self, pos: BlockPos, outcome: EmergeOutcome) {
        let req = self.pending.lock().expect("pending table poisoned").pop(pos);
        if let Some(req) = req {
            self.counters.record(outcome);
            req.complete(pos, outcome);
        }
    }

    /// Cancels a storage miss for `pos` unless a request merged while it was in flight
    /// allows generation. Decides and pops under one lock so no later merge is lost.
    pub fn cancel_load_only(&self, pos: BlockPos) -> bool {
        let mut pending = self.pending.lock().expect("pending table poisoned");
        if pending
            .flags_of(pos)
            .is_some_and(|f| f.contains(EmergeFlags::ALLOW_GENERATE))
        {
            return false;
        }
        let req = pending.pop(pos);
        drop(pending);
        if let Some(req) = req {
            self.counters.record(EmergeOutcome::Cancelled);
            req.complete(pos, EmergeOutcome::Cancelled);
        }
        true
    }

    fn record_fatal(&self, pos: BlockPos, e: StorageError) {
        log::error!(target: "emerge", "storage fault while emerging {:?}: {}", pos, e);
        if self.fatal.set(e).is_ok() {
            log::error!(target: "emerge", "emerge service halted");
        }
    }
}

pub(crate) struct Worker {
    pub id: usize,
    pub mapgen: Mapgen,
    pub rx: Receiver<BlockPos>,
    pub shutdown: Receiver<()>,
    pub shared: Arc<Shared>,
    // Dropped when the worker returns; the manager waits on the matching receiver.
    pub _exit: Sender<()>,
}

impl Worker {
    pub fn run(mut self) {
        log::info!(target: "emerge", "worker {} started", self.id);
        loop {
            if self.shared.stopping.load(Ordering::Acquire) {
                break;
            }
            select! {
                recv(self.rx) -> msg => match msg {
                    Ok(pos) => self.process(pos),
                    Err(_) => break,
                },
                recv(self.shutdown) -> _ => break,
            }
        }
        let mut cancelled = 0usize;
        while let Ok(pos) = self.rx.try_recv() {
            self.shared.complete(pos, EmergeOutcome::Cancelled);
            cancelled += 1;
        }
        log::info!(target: "emerge", "worker {} stopped ({} queued requests cancelled)", self.id, cancelled);
    }

    fn process(&mut self, pos: BlockPos) {
        // The entry stays pending while in flight so late duplicates merge into it.
        let flags = self.shared.pending.lock().expect("pending table poisoned").flags_of(pos);
        // Already drained by a stop.
        let Some(flags) = flags else { return };

        let outcome = if self.shared.fatal.get().is_some() {
            EmergeOutcome::Errored
        } else if pos.over_limit() {
            log::debug!(target: "emerge", "{:?} is beyond the generation limit", pos);
            EmergeOutcome::Cancelled
        } else {
            match self.emerge(pos, flags) {
                Ok(Some(o)) => o,
                // Completed while deciding.
                Ok(None) => return,
                Err(e) => {
                    self.shared.record_fatal(pos, e);
                    EmergeOutcome::Errored
                }
            }
        };
        self.shared.complete(pos, outcome);
    }

    fn emerge(&mut self, pos: BlockPos, flags: EmergeFlags) -> Result<Option<EmergeOutcome>, StorageError> {
        let storage = self.shared.storage.as_ref();
        if let Some(loaded) = storage.try_load(pos)? {
            return Ok(Some(match loaded.source {
                BlockSource::Memory => EmergeOutcome::FromMemory,
                BlockSource::Disk => EmergeOutcome::FromDisk,
            }));
        }
        // A generating request may have merged in during the load.
        if !flags.contains(EmergeFlags::ALLOW_GENERATE) && self.shared.cancel_load_only(pos) {
            return Ok(None);
        }

        let t0 = Instant::now();
        let mut job = GenerationJob::for_block(self.shared.registry.clone(), self.shared.seed, pos, self.shared.chunksize);
        let neighbours: Vec<BlockPos> = job.padding_blocks().collect();
        let mut loaded = 0usize;
        for bp in neighbours {
            if let Some(n) = storage.try_load(bp)? {
                n.block.copy_into(&mut job.vm);
                loaded += 1;
            }
        }
        let report = self.mapgen.make_chunk(&mut job);

        let blocks: Vec<BlockPos> = job.blocks().collect();
        for bp in &blocks {
            storage.save(*bp, MapBlock::from_buffer(&job.vm, *bp))?;
        }
        log::debug!(
            target: "emerge",
            "worker {} generated chunk {:?}..{:?} for {:?}: {} blocks, {} neighbours, surface {} in {}ms",
            self.id,
            job.blockpos_min,
            job.blockpos_max,
            pos,
            blocks.len(),
            loaded,
            report.stone_surface_max_y,
            t0.elapsed().as_millis()
        );
        Ok(Some(EmergeOutcome::Generated))
    }
}
