//! Block emerge service: request queue, worker pool and storage seam.
#![forbid(unsafe_code)]

mod config;
mod pending;
mod storage;
mod worker;

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use rayon::{ThreadPool, ThreadPoolBuilder};
use strata_geom::BlockPos;
use strata_mapgen::{BiomeManager, Mapgen, MapgenParams};
use strata_nodes::NodeRegistry;

pub use config::{EmergeConfig, EmergeLimits};
pub use pending::{
    Admission, EmergeCallback, EmergeFlags, EmergeOutcome, EnqueueError, PEER_ID_INEXISTENT, PeerId,
    PendingRequest, PendingTable,
};
pub use storage::{BlockSource, LoadedBlock, MapBlock, MemoryStorage, Storage, StorageError, StoredBlock};

use crate::worker::{Counters, Shared, Worker};

/// Snapshot of how requests were resolved so far.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EmergeStats {
    pub from_memory: usize,
    pub from_disk: usize,
    pub generated: usize,
    pub cancelled: usize,
    pub errored: usize,
}

/// Owns the worker pool. Dropping it stops the workers.
pub struct EmergeManager {
    shared: Arc<Shared>,
    limits: EmergeLimits,
    senders: Mutex<Vec<Sender<BlockPos>>>,
    shutdown_tx: Mutex<Option<Sender<()>>>,
    exit_rx: Receiver<()>,
    pool: Mutex<Option<ThreadPool>>,
}

impl EmergeManager {
    /// Starts the pool with one stock pipeline per worker.
    pub fn start(
        cfg: &EmergeConfig,
        params: &MapgenParams,
        registry: Arc<NodeRegistry>,
        biomes: Arc<BiomeManager>,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, Box<dyn Error>> {
        let reg = registry.clone();
        Self::start_with(cfg, params, registry, storage, |_| {
            Mapgen::new(params, reg.clone(), biomes.clone())
        })
    }

    /// Starts the pool, building each worker's pipeline with `make_mapgen`.
    /// Every pipeline is built before any thread starts.
    pub fn start_with(
        cfg: &EmergeConfig,
        params: &MapgenParams,
        registry: Arc<NodeRegistry>,
        storage: Arc<dyn Storage>,
        mut make_mapgen: impl FnMut(usize) -> Result<Mapgen, Box<dyn Error>>,
    ) -> Result<Self, Box<dyn Error>> {
        let limits = cfg.limits();
        let mapgens = (0..limits.threads)
            .map(&mut make_mapgen)
            .collect::<Result<Vec<_>, _>>()?;

        let shared = Arc::new(Shared {
            pending: Mutex::new(PendingTable::new(limits)),
            storage,
            registry,
            seed: params.seed,
            chunksize: params.chunksize,
            fatal: OnceLock::new(),
            stopping: AtomicBool::new(false),
            counters: Counters::default(),
        });

        let pool = ThreadPoolBuilder::new()
            .num_threads(limits.threads)
            .thread_name(|i| format!("strata-emerge-{i}"))
            .build()?;
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let (exit_tx, exit_rx) = bounded::<()>(0);

        let mut senders = Vec::with_capacity(limits.threads);
        for (id, mapgen) in mapgens.into_iter().enumerate() {
            let (tx, rx) = bounded(limits.total);
            senders.push(tx);
            let w = Worker {
                id,
                mapgen,
                rx,
                shutdown: shutdown_rx.clone(),
                shared: shared.clone(),
                _exit: exit_tx.clone(),
            };
            pool.spawn(move || w.run());
        }
        log::info!(
            target: "emerge",
            "emerge started: {} workers, limits total {} diskonly {} generate {}",
            limits.threads,
            limits.total,
            limits.diskonly,
            limits.generate
        );

        Ok(Self {
            shared,
            limits,
            senders: Mutex::new(senders),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            exit_rx,
            pool: Mutex::new(Some(pool)),
        })
    }

    /// Queues `pos`. A position already queued absorbs the request and its
    /// callback, which then fires once with the shared outcome.
    pub fn enqueue(
        &self,
        pos: BlockPos,
        peer: PeerId,
        flags: EmergeFlags,
        callback: Option<EmergeCallback>,
    ) -> Result<(), EnqueueError> {
        if self.shared.halted() {
            return Err(EnqueueError::Halted);
        }
        let admission = self
            .shared
            .pending
            .lock()
            .expect("pending table poisoned")
            .push(pos, peer, flags, callback)?;
        if admission == Admission::Merged {
            return Ok(());
        }

        let tx = {
            let senders = self.senders.lock().expect("sender list poisoned");
            senders.iter().min_by_key(|s| s.len()).cloned()
        };
        let sent = match tx {
            Some(tx) => match tx.try_send(pos) {
                Ok(()) => true,
                // Every queue is full, only reachable with FORCE_QUEUE.
                Err(TrySendError::Full(pos)) => tx.send(pos).is_ok(),
                Err(TrySendError::Disconnected(_)) => false,
            },
            None => false,
        };
        if !sent {
            self.shared.complete(pos, EmergeOutcome::Cancelled);
            return Err(EnqueueError::Halted);
        }
        Ok(())
    }

    /// Requests waiting or in flight.
    pub fn pending(&self) -> usize {
        self.shared.pending.lock().expect("pending table poisoned").len()
    }

    pub fn is_pending(&self, pos: BlockPos) -> bool {
        self.shared.pending.lock().expect("pending table poisoned").contains(pos)
    }

    pub fn limits(&self) -> EmergeLimits {
        self.limits
    }

    /// The storage fault that halted the service, if any.
    pub fn fatal_error(&self) -> Option<&StorageError> {
        self.shared.fatal.get()
    }

    pub fn is_running(&self) -> bool {
        !self.shared.stopping.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> EmergeStats {
        let c = &self.shared.counters;
        EmergeStats {
            from_memory: c.from_memory.load(Ordering::Relaxed),
            from_disk: c.from_disk.load(Ordering::Relaxed),
            generated: c.generated.load(Ordering::Relaxed),
            cancelled: c.cancelled.load(Ordering::Relaxed),
            errored: c.errored.load(Ordering::Relaxed),
        }
    }

    /// Stops accepting work, lets in-flight jobs finish and cancels the rest.
    /// Returns once every worker has exited.
    pub fn stop(&self) {
        if self.shared.stopping.swap(true, Ordering::AcqRel) {
            return;
        }
        log::info!(target: "emerge", "stopping emerge workers");
        drop(self.shutdown_tx.lock().expect("shutdown sender poisoned").take());
        self.senders.lock().expect("sender list poisoned").clear();
        // Each worker holds an exit sender; recv fails once all are gone.
        while self.exit_rx.recv().is_ok() {}

        let leftovers = self.shared.pending.lock().expect("pending table poisoned").drain();
        for (pos, req) in leftovers {
            self.shared.counters.record(EmergeOutcome::Cancelled);
            req.complete(pos, EmergeOutcome::Cancelled);
        }
        drop(self.pool.lock().expect("pool poisoned").take());
        log::info!(target: "emerge", "emerge stopped: {:?}", self.stats());
    }
}

impl Drop for EmergeManager {
    fn drop(&mut self) {
        self.stop();
    }
}
