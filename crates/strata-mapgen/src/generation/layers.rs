//! Noise-selected stone layers.
//!
//! Each configured layer takes `thickness` slots in a sequence. For every chunk the
//! sequence is rebuilt from the layers whose y range touches the chunk, and a 3D noise
//! value picks a slot per cell: `round(noise / width * slots)`, where `width` is the
//! span `2 * scale` of the noise.

use strata_geom::V3i;
use strata_nodes::{Node, NodeRegistry};
use strata_noise::NoiseMap;

use crate::config::StoneLayersConfig;

#[derive(Copy, Clone, Debug)]
struct Layer {
    node: Node,
    y_min: i32,
    y_max: i32,
    thickness: i32,
}

pub struct StoneLayers {
    layers: Vec<Layer>,
    stone: Node,
    noise: NoiseMap,
    width: f32,
    /// Slot sequence of the current chunk.
    slots: Vec<Node>,
}

impl StoneLayers {
    /// Layers whose node is not registered are skipped. The noise grid matches the 3D
    /// maps of the terrain variants: one node of skirt below and above the chunk.
    pub fn new(cfg: &StoneLayersConfig, reg: &NodeRegistry, stone: Node, seed: i32, csize: V3i) -> Self {
        let layers: Vec<Layer> = cfg
            .layers
            .iter()
            .filter_map(|l| {
                let Some(id) = reg.id_of(&l.name) else {
                    log::warn!(target: "mapgen", "stone layer '{}' is not a registered node, skipped", l.name);
                    return None;
                };
                Some(Layer {
                    node: Node::with_params(id, l.param1, l.param2),
                    y_min: l.y_min,
                    y_max: l.y_max,
                    thickness: cfg.thickness_of(l),
                })
            })
            .collect();
        if !layers.is_empty() {
            log::debug!(target: "mapgen", "{} stone layers", layers.len());
        }
        let np = cfg.np_layers.clone();
        let width = 2.0 * np.scale;
        let (sx, sy, sz) = (csize.x as usize, csize.y as usize + 2, csize.z as usize);
        Self {
            layers,
            stone,
            noise: NoiseMap::new_3d(np, seed, sx, sy, sz),
            width,
            slots: vec![stone],
        }
    }

    /// No layers configured: every stone cell stays plain stone.
    pub fn is_plain(&self) -> bool {
        self.layers.is_empty()
    }

    /// Computes the layer noise and the slot sequence for the chunk `nmin..=nmax`.
    pub fn prepare(&mut self, nmin: V3i, nmax: V3i) {
        self.slots.clear();
        if self.is_plain() {
            self.slots.push(self.stone);
            return;
        }
        self.noise
            .perlin_map_3d(nmin.x as f32, (nmin.y - 1) as f32, nmin.z as f32, None);
        for l in &self.layers {
            if l.y_max < nmin.y || l.y_min > nmax.y {
                continue;
            }
            for _ in 0..l.thickness.max(0) {
                self.slots.push(l.node);
            }
        }
        if self.slots.is_empty() {
            self.slots.push(self.stone);
        }
    }

    /// Slot sequence built by the last [`StoneLayers::prepare`].
    pub fn slots(&self) -> &[Node] {
        &self.slots
    }

    /// Node for the cell at `index3d` of the skirted 3D grid.
    #[inline]
    pub fn get(&self, index3d: usize) -> Node {
        if self.is_plain() {
            return self.stone;
        }
        self.slots[slot_index(self.noise.result()[index3d], self.width, self.slots.len())]
    }
}

/// Values below zero select the last slot.
#[inline]
pub fn slot_index(value: f32, width: f32, slots: usize) -> usize {
    let i = (value / width * slots as f32 + 0.5).floor();
    if i < 0.0 {
        return slots - 1;
    }
    (i as usize).min(slots - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayerDef;
    use strata_geom::Vec3;
    use strata_noise::NoiseParams;

    fn layer(name: &str, y_min: i32, y_max: i32, thickness: Option<i32>) -> LayerDef {
        LayerDef {
            name: name.to_string(),
            param1: 0,
            param2: 0,
            y_min,
            y_max,
            thickness,
        }
    }

    #[test]
    fn slots_follow_noise_span() {
        assert_eq!(slot_index(0.0, 1000.0, 4), 0);
        assert_eq!(slot_index(260.0, 1000.0, 4), 1);
        assert_eq!(slot_index(999.0, 1000.0, 4), 3);
        // past the span clamps to the last slot
        assert_eq!(slot_index(5000.0, 1000.0, 4), 3);
        assert_eq!(slot_index(-10.0, 1000.0, 4), 3);
    }

    #[test]
    fn sequence_keeps_layers_overlapping_the_chunk() {
        let reg = NodeRegistry::mapgen_defaults().unwrap();
        let stone = Node::new(reg.id_of("mapgen_stone").unwrap());
        let desert = Node::new(reg.id_of("mapgen_desert_stone").unwrap());
        let gravel = Node::new(reg.id_of("mapgen_gravel").unwrap());
        let cfg = StoneLayersConfig {
            layers: vec![
                layer("mapgen_desert_stone", -100, 100, Some(2)),
                layer("mapgen_gravel", 500, 600, None),
                layer("no_such_node", -100, 100, None),
                layer("mapgen_stone", -100, 100, None),
            ],
            ..StoneLayersConfig::default()
        };
        let mut layers = StoneLayers::new(&cfg, &reg, stone, 1, V3i::splat(16));
        assert!(!layers.is_plain());

        layers.prepare(V3i::new(0, 0, 0), V3i::new(15, 15, 15));
        assert_eq!(layers.slots(), &[desert, desert, stone]);

        layers.prepare(V3i::new(0, 496, 0), V3i::new(15, 511, 15));
        assert_eq!(layers.slots(), &[gravel]);

        // nothing overlaps: plain stone
        layers.prepare(V3i::new(0, 2000, 0), V3i::new(15, 2015, 15));
        assert_eq!(layers.slots(), &[stone]);
        assert_eq!(layers.get(0), stone);
    }

    #[test]
    fn every_cell_takes_a_configured_layer() {
        let reg = NodeRegistry::mapgen_defaults().unwrap();
        let stone = Node::new(reg.id_of("mapgen_stone").unwrap());
        let cfg = StoneLayersConfig {
            layers: vec![
                layer("mapgen_desert_stone", -100, 100, None),
                layer("mapgen_sand", -100, 100, None),
                layer("mapgen_gravel", -100, 100, None),
            ],
            np_layers: NoiseParams::new(500.0, 500.0, Vec3::new(8.0, 8.0, 8.0), 3663, 3, 0.6, 2.0),
            ..StoneLayersConfig::default()
        };
        let mut layers = StoneLayers::new(&cfg, &reg, stone, 9, V3i::splat(16));
        layers.prepare(V3i::new(-16, -16, 32), V3i::new(-1, -1, 47));
        let slots = layers.slots().to_vec();
        let mut seen = Vec::new();
        for i in 0..16 * 18 * 16 {
            let n = layers.get(i);
            assert!(slots.contains(&n));
            if !seen.contains(&n) {
                seen.push(n);
            }
        }
        // fine-grained noise spans several slots within one chunk
        assert!(seen.len() > 1);
    }
}
