mod config;
mod logging;
mod report;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use crossbeam_channel::unbounded;
use strata_emerge::{EmergeCallback, EmergeFlags, EmergeManager, EmergeOutcome, MemoryStorage, PEER_ID_INEXISTENT, Storage};
use strata_geom::BlockPos;
use strata_mapgen::{BiomeManager, MapgenName, MapgenParams};

use crate::config::StrataConfig;
use crate::report::BlockSummary;

#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Emerge map blocks and print what was generated")]
struct Args {
    /// TOML file with [[nodes]], [mapgen] and [emerge] tables
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Also write debug-level logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    /// v5, v6, v7, flat or singlenode
    #[arg(long)]
    mapgen: Option<MapgenName>,
    #[arg(long)]
    threads: Option<usize>,
    /// Block to emerge as x,y,z; may be repeated
    #[arg(long = "block", value_parser = parse_block_pos)]
    blocks: Vec<BlockPos>,
    /// Without --block, emerge the (2r+1)^2 block columns around the origin
    #[arg(long, default_value_t = 1)]
    radius: i32,
    /// Lowest and highest block y of each column
    #[arg(long, default_value_t = -2)]
    y_min: i32,
    #[arg(long, default_value_t = 2)]
    y_max: i32,
}

fn parse_block_pos(s: &str) -> Result<BlockPos, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z, got '{s}'"));
    };
    let n = |v: &str| v.parse::<i32>().map_err(|e| format!("'{v}': {e}"));
    Ok(BlockPos::new(n(*x)?, n(*y)?, n(*z)?))
}

fn targets(args: &Args) -> Vec<BlockPos> {
    if !args.blocks.is_empty() {
        return args.blocks.clone();
    }
    let r = args.radius.max(0);
    let mut out = Vec::new();
    for z in -r..=r {
        for x in -r..=r {
            for y in (args.y_min..=args.y_max).rev() {
                out.push(BlockPos::new(x, y, z));
            }
        }
    }
    out
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref())?;

    let mut cfg = match &args.config {
        Some(path) => StrataConfig::load_from_path(path)?,
        None => StrataConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg.mapgen.seed = seed;
    }
    if let Some(name) = args.mapgen {
        cfg.mapgen.mg_name = name;
    }
    if let Some(t) = args.threads {
        cfg.emerge.num_threads = t;
    }

    let reg = Arc::new(cfg.registry()?);
    let params = MapgenParams::from_config(&cfg.mapgen);
    let biomes = Arc::new(BiomeManager::from_config(&params.biomes, &reg)?);
    log::info!(
        "{} nodes, {} biomes, mapgen {} seed {}",
        reg.len(),
        biomes.len(),
        params.name.as_str(),
        params.seed
    );

    let storage = Arc::new(MemoryStorage::new());
    let mgr = EmergeManager::start(&cfg.emerge, &params, reg.clone(), biomes, storage.clone())?;

    let (tx, rx) = unbounded();
    let flags = EmergeFlags::ALLOW_GENERATE.union(EmergeFlags::FORCE_QUEUE);
    let mut expected = 0usize;
    for pos in targets(&args) {
        let tx = tx.clone();
        let cb: EmergeCallback = Box::new(move |p, o| {
            let _ = tx.send((p, o));
        });
        match mgr.enqueue(pos, PEER_ID_INEXISTENT, flags, Some(cb)) {
            Ok(()) => expected += 1,
            Err(e) => log::warn!("{:?} not queued: {}", pos, e),
        }
    }
    drop(tx);

    let mut results: Vec<(BlockPos, EmergeOutcome)> = rx.iter().take(expected).collect();
    mgr.stop();
    if let Some(e) = mgr.fatal_error() {
        return Err(format!("emerge halted: {e}").into());
    }

    results.sort_by_key(|(p, _)| (p.z, p.x, std::cmp::Reverse(p.y)));
    for (pos, outcome) in &results {
        match storage.try_load(*pos)? {
            Some(loaded) => println!("{}  {:?}", BlockSummary::of(&loaded.block, &reg).line(), outcome),
            None => println!("({:>4},{:>4},{:>4})  {:?}", pos.x, pos.y, pos.z, outcome),
        }
    }
    let stats = mgr.stats();
    println!(
        "{} blocks stored; generated {} chunks, {} from memory, {} cancelled, {} errored",
        storage.len(),
        stats.generated,
        stats.from_memory,
        stats.cancelled,
        stats.errored
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_positions_parse() {
        assert_eq!(parse_block_pos("1, -2,3"), Ok(BlockPos::new(1, -2, 3)));
        assert!(parse_block_pos("1,2").is_err());
        assert!(parse_block_pos("a,2,3").is_err());
    }

    #[test]
    fn default_targets_cover_columns_top_down() {
        let args = Args::parse_from(["strata", "--radius", "1", "--y-min", "0", "--y-max", "1"]);
        let t = targets(&args);
        assert_eq!(t.len(), 9 * 2);
        assert_eq!(t[0], BlockPos::new(-1, 1, -1));
        assert_eq!(t[1], BlockPos::new(-1, 0, -1));
    }

    #[test]
    fn mapgen_name_flag() {
        let args = Args::parse_from(["strata", "--mapgen", "flat", "--block", "0,0,0"]);
        assert_eq!(args.mapgen, Some(MapgenName::Flat));
        assert_eq!(targets(&args), vec![BlockPos::new(0, 0, 0)]);

        let args = Args::parse_from(["strata", "--mapgen", "V6"]);
        assert_eq!(args.mapgen, Some(MapgenName::V6));
    }
}
