use hashbrown::HashMap;
use strata_emerge::MapBlock;
use strata_geom::{BlockPos, MAP_BLOCKSIZE, V3i};
use strata_nodes::{LIGHT_SUN, LightBank, NodeRegistry};

/// What a generated block looks like from above.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockSummary {
    pub pos: BlockPos,
    /// Node counts by name, most common first.
    pub counts: Vec<(String, usize)>,
    /// Highest walkable node of the block's centre column.
    pub surface_y: Option<i32>,
    pub sunlit: usize,
}

impl BlockSummary {
    pub fn of(block: &MapBlock, reg: &NodeRegistry) -> Self {
        let mut by_id: HashMap<u16, usize> = HashMap::new();
        let mut sunlit = 0;
        for n in &block.nodes {
            *by_id.entry(n.content).or_insert(0) += 1;
            if n.light(LightBank::Day) == LIGHT_SUN {
                sunlit += 1;
            }
        }
        let mut counts: Vec<(String, usize)> = by_id
            .into_iter()
            .map(|(id, c)| (reg.features_of(id).name.clone(), c))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let nmin = block.pos.node_min();
        let half = MAP_BLOCKSIZE / 2;
        let surface_y = (0..MAP_BLOCKSIZE).rev().map(|dy| nmin.y + dy).find(|&y| {
            let n = block.get(V3i::new(nmin.x + half, y, nmin.z + half));
            reg.features_of(n.content).walkable
        });

        Self {
            pos: block.pos,
            counts,
            surface_y,
            sunlit,
        }
    }

    pub fn line(&self) -> String {
        let top: Vec<String> = self.counts.iter().take(3).map(|(n, c)| format!("{n}={c}")).collect();
        let surface = self.surface_y.map_or_else(|| "-".to_string(), |y| y.to_string());
        format!(
            "({:>4},{:>4},{:>4})  surface {:>5}  sunlit {:>4}  {}",
            self.pos.x,
            self.pos.y,
            self.pos.z,
            surface,
            self.sunlit,
            top.join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_nodes::Node;

    #[test]
    fn summary_counts_and_surface() {
        let reg = NodeRegistry::mapgen_defaults().unwrap();
        let stone = reg.id_of("mapgen_stone").unwrap();
        let pos = BlockPos::new(0, -1, 0);
        let mut nodes = vec![Node::with_params(strata_nodes::CONTENT_AIR, LIGHT_SUN, 0); MapBlock::VOLUME];
        // bottom five layers are stone
        let layer = (MAP_BLOCKSIZE * MAP_BLOCKSIZE) as usize;
        let area = MapBlock::area(pos);
        for p in area.iter().filter(|p| p.y < area.min.y + 5) {
            nodes[area.index(p)] = Node::new(stone);
        }
        let s = BlockSummary::of(&MapBlock { pos, nodes }, &reg);
        assert_eq!(s.surface_y, Some(-16 + 4));
        assert_eq!(s.sunlit, MapBlock::VOLUME - 5 * layer);
        assert_eq!(s.counts[0], ("air".to_string(), MapBlock::VOLUME - 5 * layer));
        assert!(s.line().contains("surface   -12"));
    }
}
