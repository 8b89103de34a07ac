use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use proptest::prelude::*;
use strata_emerge::{
    BlockSource, EmergeCallback, EmergeConfig, EmergeFlags, EmergeLimits, EmergeManager, EmergeOutcome,
    EnqueueError, LoadedBlock, MemoryStorage, PEER_ID_INEXISTENT, PendingTable, Storage, StorageError, StoredBlock,
};
use strata_geom::{BlockPos, V3i};
use strata_mapgen::{BiomeManager, MapgenName, MapgenParams};
use strata_nodes::{LIGHT_SUN, LightBank, NodeRegistry};

const WAIT: Duration = Duration::from_secs(120);
const GEN: EmergeFlags = EmergeFlags::ALLOW_GENERATE;

fn registry() -> Arc<NodeRegistry> {
    Arc::new(NodeRegistry::mapgen_defaults().unwrap())
}

fn small_params() -> MapgenParams {
    MapgenParams {
        name: MapgenName::Singlenode,
        seed: 42,
        chunksize: 1,
        ..MapgenParams::default()
    }
}

fn one_worker() -> EmergeConfig {
    EmergeConfig {
        num_threads: 1,
        ..EmergeConfig::default()
    }
}

fn start(cfg: &EmergeConfig, params: &MapgenParams, storage: Arc<dyn Storage>) -> EmergeManager {
    let reg = registry();
    let biomes = Arc::new(BiomeManager::from_config(&params.biomes, &reg).unwrap());
    EmergeManager::start(cfg, params, reg, biomes, storage).unwrap()
}

fn reporter() -> (Sender<(BlockPos, EmergeOutcome)>, Receiver<(BlockPos, EmergeOutcome)>) {
    unbounded()
}

fn report_to(tx: &Sender<(BlockPos, EmergeOutcome)>) -> Option<EmergeCallback> {
    let tx = tx.clone();
    Some(Box::new(move |pos, outcome| {
        let _ = tx.send((pos, outcome));
    }))
}

/// Memory storage whose first load blocks until the gate opens.
struct GatedStorage {
    inner: MemoryStorage,
    gate: Mutex<Option<Receiver<()>>>,
    entered: Sender<()>,
}

impl GatedStorage {
    fn new() -> (Arc<Self>, Sender<()>, Receiver<()>) {
        let (open_tx, open_rx) = unbounded();
        let (entered_tx, entered_rx) = unbounded();
        let s = Arc::new(Self {
            inner: MemoryStorage::new(),
            gate: Mutex::new(Some(open_rx)),
            entered: entered_tx,
        });
        (s, open_tx, entered_rx)
    }
}

impl Storage for GatedStorage {
    fn try_load(&self, pos: BlockPos) -> Result<Option<LoadedBlock>, StorageError> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = self.entered.send(());
            let _ = gate.recv();
        }
        self.inner.try_load(pos)
    }

    fn save(&self, pos: BlockPos, block: StoredBlock) -> Result<(), StorageError> {
        self.inner.save(pos, block)
    }
}

struct BrokenStorage;

impl Storage for BrokenStorage {
    fn try_load(&self, pos: BlockPos) -> Result<Option<LoadedBlock>, StorageError> {
        Err(StorageError::Corrupt {
            pos,
            reason: "bad checksum".into(),
        })
    }

    fn save(&self, _pos: BlockPos, _block: StoredBlock) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Reports every block as coming from disk.
struct DiskStorage;

impl Storage for DiskStorage {
    fn try_load(&self, pos: BlockPos) -> Result<Option<LoadedBlock>, StorageError> {
        Ok(Some(LoadedBlock {
            block: strata_emerge::MapBlock {
                pos,
                nodes: vec![strata_nodes::Node::AIR; strata_emerge::MapBlock::VOLUME],
            },
            source: BlockSource::Disk,
        }))
    }

    fn save(&self, _pos: BlockPos, _block: StoredBlock) -> Result<(), StorageError> {
        Ok(())
    }
}

#[test]
fn origin_block_is_generated_then_served_from_memory() {
    let params = MapgenParams {
        seed: 42,
        ..MapgenParams::default()
    };
    let storage = Arc::new(MemoryStorage::new());
    let mgr = start(&one_worker(), &params, storage.clone());
    let (tx, rx) = reporter();
    let origin = BlockPos::new(0, 0, 0);

    mgr.enqueue(origin, PEER_ID_INEXISTENT, GEN, report_to(&tx)).unwrap();
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), (origin, EmergeOutcome::Generated));

    // the whole 5x5x5 mapchunk was saved
    let cs = params.chunksize as usize;
    assert_eq!(storage.len(), cs * cs * cs);
    let chunk_min = origin.containing_chunk(params.chunksize);
    assert!(storage.contains(chunk_min));
    assert!(storage.contains(chunk_min.offset(4, 4, 4)));

    // open air on the chunk's top layer sees the sky
    let top = chunk_min.offset(0, 4, 0);
    let block = storage.try_load(top).unwrap().unwrap().block;
    let n = block.get(top.node_max());
    if n.is_air() {
        assert_eq!(n.light(LightBank::Day), LIGHT_SUN);
    }
    assert!(block.nodes.iter().all(|n| !n.is_ignore()));

    mgr.enqueue(chunk_min.offset(1, 1, 1), 3, GEN, report_to(&tx)).unwrap();
    assert_eq!(
        rx.recv_timeout(WAIT).unwrap(),
        (chunk_min.offset(1, 1, 1), EmergeOutcome::FromMemory)
    );
    mgr.stop();
    assert_eq!(mgr.stats().generated, 1);
    assert_eq!(mgr.stats().from_memory, 1);
}

#[test]
fn load_only_miss_is_cancelled() {
    let storage = Arc::new(MemoryStorage::new());
    let mgr = start(&one_worker(), &small_params(), storage.clone());
    let (tx, rx) = reporter();
    let p = BlockPos::new(2, 0, -1);
    mgr.enqueue(p, 4, EmergeFlags::NONE, report_to(&tx)).unwrap();
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), (p, EmergeOutcome::Cancelled));
    assert!(storage.is_empty());
}

#[test]
fn generate_request_merged_into_in_flight_load_is_honoured() {
    let (storage, open, entered) = GatedStorage::new();
    let mgr = start(&one_worker(), &small_params(), storage.clone());
    let (tx, rx) = reporter();
    let p = BlockPos::new(0, 0, 0);

    // load-only request held inside try_load
    mgr.enqueue(p, 1, EmergeFlags::NONE, report_to(&tx)).unwrap();
    entered.recv_timeout(WAIT).unwrap();
    mgr.enqueue(p, 2, GEN, report_to(&tx)).unwrap();
    assert_eq!(mgr.pending(), 1);

    open.send(()).unwrap();
    for _ in 0..2 {
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), (p, EmergeOutcome::Generated));
    }
    assert!(storage.inner.contains(p));
    assert_eq!(mgr.stats().generated, 1);
    assert_eq!(mgr.stats().cancelled, 0);
}

#[test]
fn disk_hits_are_reported_as_such() {
    let mgr = start(&one_worker(), &small_params(), Arc::new(DiskStorage));
    let (tx, rx) = reporter();
    let p = BlockPos::new(0, -1, 0);
    mgr.enqueue(p, 4, GEN, report_to(&tx)).unwrap();
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), (p, EmergeOutcome::FromDisk));
}

#[test]
fn blocks_beyond_the_limit_are_cancelled() {
    let mgr = start(&one_worker(), &small_params(), Arc::new(MemoryStorage::new()));
    let (tx, rx) = reporter();
    let p = BlockPos::new(0, 2000, 0);
    mgr.enqueue(p, PEER_ID_INEXISTENT, GEN, report_to(&tx)).unwrap();
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), (p, EmergeOutcome::Cancelled));
}

#[test]
fn storage_fault_halts_the_service() {
    let mgr = start(&one_worker(), &small_params(), Arc::new(BrokenStorage));
    let (tx, rx) = reporter();
    let p = BlockPos::new(1, 1, 1);
    mgr.enqueue(p, PEER_ID_INEXISTENT, GEN, report_to(&tx)).unwrap();
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), (p, EmergeOutcome::Errored));

    assert!(matches!(mgr.fatal_error(), Some(StorageError::Corrupt { .. })));
    assert_eq!(
        mgr.enqueue(BlockPos::new(0, 0, 0), PEER_ID_INEXISTENT, GEN, None),
        Err(EnqueueError::Halted)
    );
    assert_eq!(mgr.stats().errored, 1);
}

#[test]
fn duplicates_merge_while_queued_and_fire_once_each() {
    let (storage, open, entered) = GatedStorage::new();
    let mgr = start(&one_worker(), &small_params(), storage);
    let (tx, rx) = reporter();

    // hold the only worker on the first request
    let first = BlockPos::new(0, 0, 0);
    mgr.enqueue(first, 1, GEN, report_to(&tx)).unwrap();
    entered.recv_timeout(WAIT).unwrap();

    let dup = BlockPos::new(5, 0, 5);
    mgr.enqueue(dup, 1, EmergeFlags::NONE, report_to(&tx)).unwrap();
    mgr.enqueue(dup, 2, GEN, report_to(&tx)).unwrap();
    // a request for the in-flight position merges as well
    mgr.enqueue(first, 2, GEN, report_to(&tx)).unwrap();
    assert_eq!(mgr.pending(), 2);

    open.send(()).unwrap();
    let mut got: Vec<_> = (0..4).map(|_| rx.recv_timeout(WAIT).unwrap()).collect();
    got.sort_by_key(|(p, _)| *p);
    assert_eq!(
        got,
        vec![
            (first, EmergeOutcome::Generated),
            (first, EmergeOutcome::Generated),
            (dup, EmergeOutcome::Generated),
            (dup, EmergeOutcome::Generated),
        ]
    );
    mgr.stop();
    assert!(rx.try_recv().is_err());
    assert_eq!(mgr.stats().generated, 2);
}

#[test]
fn stop_finishes_in_flight_and_cancels_the_queue() {
    let (storage, open, entered) = GatedStorage::new();
    let mgr = Arc::new(start(&one_worker(), &small_params(), storage.clone()));
    let (tx, rx) = reporter();
    let fired = Arc::new(AtomicUsize::new(0));

    let first = BlockPos::new(0, 0, 0);
    mgr.enqueue(first, PEER_ID_INEXISTENT, GEN, report_to(&tx)).unwrap();
    entered.recv_timeout(WAIT).unwrap();
    let queued: Vec<BlockPos> = (1..6).map(|i| BlockPos::new(i * 3, 0, 0)).collect();
    for &p in &queued {
        let fired = fired.clone();
        let tx = tx.clone();
        let cb: EmergeCallback = Box::new(move |pos, outcome| {
            fired.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send((pos, outcome));
        });
        mgr.enqueue(p, PEER_ID_INEXISTENT, GEN, Some(cb)).unwrap();
    }

    let stopper = {
        let mgr = mgr.clone();
        std::thread::spawn(move || mgr.stop())
    };
    while mgr.is_running() {
        std::thread::yield_now();
    }
    open.send(()).unwrap();
    stopper.join().unwrap();

    let got: Vec<_> = rx.try_iter().collect();
    assert_eq!(got.len(), 6);
    assert!(got.contains(&(first, EmergeOutcome::Generated)));
    for p in &queued {
        assert!(got.contains(&(*p, EmergeOutcome::Cancelled)));
    }
    assert_eq!(fired.load(Ordering::SeqCst), queued.len());
    assert_eq!(mgr.pending(), 0);
    assert!(storage.inner.contains(first));
    assert_eq!(
        mgr.enqueue(first, PEER_ID_INEXISTENT, GEN, None),
        Err(EnqueueError::Halted)
    );
}

#[test]
fn peer_quota_is_enforced_by_the_manager() {
    let (storage, open, entered) = GatedStorage::new();
    let cfg = EmergeConfig {
        num_threads: 1,
        qlimit_generate: 2,
        ..EmergeConfig::default()
    };
    let mgr = start(&cfg, &small_params(), storage);
    mgr.enqueue(BlockPos::new(0, 0, 0), 9, GEN, None).unwrap();
    entered.recv_timeout(WAIT).unwrap();
    mgr.enqueue(BlockPos::new(1, 0, 0), 9, GEN, None).unwrap();
    assert_eq!(
        mgr.enqueue(BlockPos::new(2, 0, 0), 9, GEN, None),
        Err(EnqueueError::PeerQuotaExceeded(9))
    );
    assert!(!mgr.is_pending(BlockPos::new(2, 0, 0)));
    mgr.enqueue(BlockPos::new(2, 0, 0), 9, GEN.union(EmergeFlags::FORCE_QUEUE), None).unwrap();
    assert_eq!(mgr.pending(), 3);
    open.send(()).unwrap();
}

#[test]
fn workers_spread_across_the_pool() {
    let cfg = EmergeConfig {
        num_threads: 3,
        ..EmergeConfig::default()
    };
    let mgr = start(&cfg, &small_params(), Arc::new(MemoryStorage::new()));
    assert_eq!(mgr.limits().threads, 3);
    let (tx, rx) = reporter();
    for x in 0..12 {
        mgr.enqueue(BlockPos::new(x, 0, 0), PEER_ID_INEXISTENT, GEN, report_to(&tx)).unwrap();
    }
    let mut got: Vec<_> = (0..12).map(|_| rx.recv_timeout(WAIT).unwrap()).collect();
    got.sort_by_key(|(p, _)| p.x);
    for (x, (p, o)) in got.into_iter().enumerate() {
        assert_eq!(p, BlockPos::new(x as i32, 0, 0));
        assert_eq!(o, EmergeOutcome::Generated);
    }
    assert_eq!(mgr.pending(), 0);
}

fn pos_strategy() -> impl Strategy<Value = BlockPos> {
    (-3i32..3, -3i32..3, -3i32..3).prop_map(|(x, y, z)| BlockPos::new(x, y, z))
}

proptest! {
    #[test]
    fn pending_table_keeps_one_entry_per_position(
        reqs in prop::collection::vec((pos_strategy(), 1u16..4, any::<bool>()), 0..64)
    ) {
        let mut t = PendingTable::new(EmergeLimits { threads: 1, total: 1000, diskonly: 1000, generate: 1000 });
        let mut distinct = std::collections::HashSet::new();
        for (pos, peer, generate) in &reqs {
            let flags = if *generate { GEN } else { EmergeFlags::NONE };
            t.push(*pos, *peer, flags, None).unwrap();
            distinct.insert(*pos);
        }
        prop_assert_eq!(t.len(), distinct.len());
        let counted: usize = (1u16..4).map(|p| t.peer_count(p)).sum();
        prop_assert_eq!(counted, distinct.len());

        for pos in &distinct {
            let req = t.pop(*pos).unwrap();
            let any_gen = reqs.iter().any(|(p, _, g)| p == pos && *g);
            prop_assert_eq!(req.flags.contains(GEN), any_gen);
        }
        prop_assert!(t.is_empty());
        prop_assert_eq!((1u16..4).map(|p| t.peer_count(p)).sum::<usize>(), 0);
    }

    #[test]
    fn pending_table_never_exceeds_its_limits(
        reqs in prop::collection::vec((pos_strategy(), 1u16..3), 0..64),
        total in 1usize..16,
        quota in 1usize..8,
    ) {
        let mut t = PendingTable::new(EmergeLimits { threads: 1, total, diskonly: quota, generate: quota });
        for (pos, peer) in reqs {
            let _ = t.push(pos, peer, GEN, None);
            prop_assert!(t.len() <= total);
            prop_assert!(t.peer_count(peer) <= quota);
        }
    }
}

#[test]
fn sunlit_air_in_singlenode_storage() {
    let storage = Arc::new(MemoryStorage::new());
    let mgr = start(&one_worker(), &small_params(), storage.clone());
    let (tx, rx) = reporter();
    let p = BlockPos::new(-1, 3, 2);
    mgr.enqueue(p, PEER_ID_INEXISTENT, GEN, report_to(&tx)).unwrap();
    assert_eq!(rx.recv_timeout(WAIT).unwrap().1, EmergeOutcome::Generated);
    let block = storage.try_load(p).unwrap().unwrap().block;
    assert!(block.nodes.iter().all(|n| n.is_air() && n.param1 == LIGHT_SUN));
    assert_eq!(block.get(p.node_min() + V3i::ONE).light(LightBank::Day), LIGHT_SUN);
}
