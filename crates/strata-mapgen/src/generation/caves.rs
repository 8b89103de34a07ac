//! Cave carvers: random-walk tunnels and noise-intersection tunnels.

use strata_geom::{MAP_BLOCKSIZE, V3i, Vec3};
use strata_nodes::{CONTENT_AIR, CONTENT_IGNORE, ContentId, Node, NodeRegistry};
use strata_noise::{NoiseMap, NoiseParams, PseudoRandom, contour, noise_perlin_2d, noise_perlin_3d};
use strata_voxel::FLAG_CHECKED1;

use crate::biome::{BiomeGen, BiomeManager};
use crate::config::CarverConfig;
use crate::job::GenerationJob;
use crate::notify::GenNotifyType;

/// Voxel flag marking cells opened by small random-walk caves.
pub const FLAG_CAVE: u8 = FLAG_CHECKED1;

/// Depth below water level past which unflooded-by-biome caves may hold lava.
const LAVA_DEPTH: i32 = -256;

/// Tunnels where two 3D noise ridges cross.
pub struct CavesNoiseIntersection {
    cave_width: f32,
    csize: V3i,
    noise_cave1: NoiseMap,
    noise_cave2: NoiseMap,
}

impl CavesNoiseIntersection {
    pub fn new(cfg: &CarverConfig, seed: i32, csize: V3i) -> Self {
        let (sx, sy, sz) = (csize.x as usize, csize.y as usize + 1, csize.z as usize);
        Self {
            cave_width: cfg.cave_width,
            csize,
            noise_cave1: NoiseMap::new_3d(cfg.np_cave1.clone(), seed, sx, sy, sz),
            noise_cave2: NoiseMap::new_3d(cfg.np_cave2.clone(), seed, sx, sy, sz),
        }
    }

    /// Carves ground content where `contour(n1) * contour(n2)` exceeds the cave width.
    ///
    /// Each column is scanned from the chunk top down to one node below it. The
    /// overgenerated layer above the chunk is left as a roof. Where a tunnel opens to
    /// the surface its floor receives the column biome's top and filler, and top or
    /// filler left hanging over a tunnel becomes biome stone.
    pub fn generate_caves(&mut self, job: &mut GenerationJob, biomes: &BiomeManager) {
        let nmin = job.node_min();
        let nmax = job.node_max();
        let (x, y, z) = (nmin.x as f32, nmin.y as f32, nmin.z as f32);
        self.noise_cave1.perlin_map_3d(x, y - 1.0, z, None);
        self.noise_cave2.perlin_map_3d(x, y - 1.0, z, None);

        let reg = job.registry.clone();
        let area = *job.vm.area();
        let em_x = area.y_stride();
        let ystride = self.csize.x as usize;
        let zstride = ystride * (self.csize.y as usize + 1);
        let cave1 = self.noise_cave1.result();
        let cave2 = self.noise_cave2.result();

        let mut index2d = 0usize;
        for z in nmin.z..=nmax.z {
            for x in nmin.x..=nmax.x {
                let biome = biomes.get(job.biomemap[index2d]);
                index2d += 1;
                let depth_top = biome.depth_top;
                let base_filler = depth_top + biome.depth_filler;
                let depth_riverbed = biome.depth_riverbed;

                let mut column_is_open = false;
                let mut is_under_river = false;
                let mut is_under_tunnel = false;
                let mut is_top_filler_above = false;
                let mut nplaced = 0;

                let mut vi = area.index(V3i::new(x, nmax.y, z));
                let mut index3d =
                    (z - nmin.z) as usize * zstride + self.csize.y as usize * ystride + (x - nmin.x) as usize;

                for _y in (nmin.y - 1..=nmax.y).rev() {
                    let (i, n3) = (vi, index3d);
                    vi = vi.wrapping_sub(em_x);
                    index3d = index3d.wrapping_sub(ystride);

                    let c = job.vm.node_at(i).content;
                    if c == CONTENT_AIR || c == biome.c_water_top || c == biome.c_water {
                        column_is_open = true;
                        is_top_filler_above = false;
                        continue;
                    }
                    if c == biome.c_river_water {
                        column_is_open = true;
                        is_under_river = true;
                        is_top_filler_above = false;
                        continue;
                    }

                    let d1 = contour(cave1[n3]);
                    let d2 = contour(cave2[n3]);
                    if d1 * d2 > self.cave_width && reg.features_of(c).is_ground_content {
                        job.vm.set_node_at(i, Node::AIR);
                        is_under_tunnel = true;
                        if is_top_filler_above {
                            job.vm.set_node_at(i + em_x, Node::new(biome.c_stone));
                        }
                        is_top_filler_above = false;
                    } else if column_is_open && is_under_tunnel && (c == biome.c_stone || c == biome.c_filler) {
                        // tunnel entrance floor
                        if is_under_river {
                            if nplaced < depth_riverbed {
                                job.vm.set_node_at(i, Node::new(biome.c_riverbed));
                                is_top_filler_above = true;
                                nplaced += 1;
                            } else {
                                column_is_open = false;
                                is_under_river = false;
                                is_under_tunnel = false;
                            }
                        } else if nplaced < depth_top {
                            job.vm.set_node_at(i, Node::new(biome.c_top));
                            is_top_filler_above = true;
                            nplaced += 1;
                        } else if nplaced < base_filler {
                            job.vm.set_node_at(i, Node::new(biome.c_filler));
                            is_top_filler_above = true;
                            nplaced += 1;
                        } else {
                            column_is_open = false;
                            is_under_tunnel = false;
                        }
                    } else {
                        if c == biome.c_top || c == biome.c_filler {
                            is_top_filler_above = true;
                        }
                        column_is_open = false;
                    }
                }
            }
        }
    }
}

/// Shared inputs of one random-walk pass over a chunk.
pub struct RandomWalkParams<'a> {
    pub registry: &'a NodeRegistry,
    pub biomegen: Option<&'a BiomeGen>,
    pub np_cave_liquids: &'a NoiseParams,
    pub seed: i32,
    pub water_level: i32,
    pub c_water_source: ContentId,
    pub c_lava_source: ContentId,
    pub large_cave_flooded: f32,
}

/// Number of small caves for a chunk from the cave amount noise.
pub fn small_cave_count(np_cave_amount: &NoiseParams, seed: i32, nmin: V3i, nmax: V3i) -> u32 {
    let e = nmax - nmin + V3i::ONE;
    let volume = e.x as f32 * e.y as f32 * e.z as f32;
    let amount = noise_perlin_2d(np_cave_amount, nmin.x as f32, nmin.y as f32, seed);
    (amount.max(0.0) * volume / 250_000.0) as u32
}

/// Runs the small then large random-walk caves for the job's chunk.
///
/// Large caves are made only when the chunk top lies at or below `large_cave_ymax`.
pub fn generate_caves_random_walk(
    params: &RandomWalkParams<'_>,
    np_cave_amount: &NoiseParams,
    job: &mut GenerationJob,
    max_stone_y: i32,
    large_cave_ymax: i32,
) {
    let nmin = job.node_min();
    let nmax = job.node_max();
    if nmin.y > max_stone_y {
        log::trace!(target: "mapgen", "random-walk caves skipped at {nmin:?}: above stone");
        return;
    }
    let mut ps = PseudoRandom::new(job.blockseed().wrapping_add(21343) as i32);

    let small = small_cave_count(np_cave_amount, params.seed, nmin, nmax);
    for _ in 0..small {
        CavesRandomWalk::new(params).make_cave(job, &mut ps, false, max_stone_y);
    }

    if nmax.y > large_cave_ymax {
        return;
    }
    let bruises = if ps.range(1, 8) == 1 {
        let hi = ps.range(0, 2);
        ps.range(0, hi)
    } else {
        1
    };
    for _ in 0..bruises {
        CavesRandomWalk::new(params).make_cave(job, &mut ps, true, max_stone_y);
    }
}

/// One turtle-walk cave: a chain of tunnel segments with random radius.
pub struct CavesRandomWalk<'a> {
    params: &'a RandomWalkParams<'a>,
    node_min: V3i,
    node_max: V3i,
    large_cave: bool,
    flooded: bool,
    use_biome_liquid: bool,
    c_biome_liquid: ContentId,
    large_cave_is_flat: bool,
    min_tunnel_diameter: i32,
    max_tunnel_diameter: i32,
    tunnel_routepoints: i32,
    part_max_length_rs: i32,
    /// Walker position relative to `of`.
    orp: Vec3,
    /// Origin of the allowed route box.
    of: V3i,
    /// Extent of the allowed route box.
    ar: V3i,
    rs: i32,
    main_direction: Vec3,
    route_y_min: i32,
    route_y_max: i32,
    /// Walker positions relative to `of`: the start, then each carved segment end.
    route: Vec<Vec3>,
}

impl<'a> CavesRandomWalk<'a> {
    pub fn new(params: &'a RandomWalkParams<'a>) -> Self {
        Self {
            params,
            node_min: V3i::ZERO,
            node_max: V3i::ZERO,
            large_cave: false,
            flooded: false,
            use_biome_liquid: false,
            c_biome_liquid: CONTENT_IGNORE,
            large_cave_is_flat: false,
            min_tunnel_diameter: 0,
            max_tunnel_diameter: 0,
            tunnel_routepoints: 0,
            part_max_length_rs: 0,
            orp: Vec3::ZERO,
            of: V3i::ZERO,
            ar: V3i::ZERO,
            rs: 0,
            main_direction: Vec3::ZERO,
            route_y_min: 0,
            route_y_max: 0,
            route: Vec::new(),
        }
    }

    /// Route points of the last cave, relative to the route box origin.
    pub fn route(&self) -> &[Vec3] {
        &self.route
    }

    /// Origin and extent of the box the last cave's route was confined to.
    pub fn route_box(&self) -> (V3i, V3i) {
        (self.of, self.ar)
    }

    pub fn max_tunnel_diameter(&self) -> i32 {
        self.max_tunnel_diameter
    }

    pub fn make_cave(&mut self, job: &mut GenerationJob, ps: &mut PseudoRandom, is_large: bool, max_stone_height: i32) {
        let p = self.params;
        self.node_min = job.node_min();
        self.node_max = job.node_max();
        self.large_cave = is_large;

        self.flooded = ps.range(1, 1000) as f32 <= p.large_cave_flooded * 1000.0;
        self.use_biome_liquid = false;
        if self.flooded {
            if let Some(biomegen) = p.biomegen {
                let midp = self.node_min + (self.node_max - self.node_min) / 2;
                let biome = biomegen.biome_at_point(midp);
                if !biome.c_cave_liquid.is_empty() {
                    self.use_biome_liquid = true;
                    let pick = ps.range(0, biome.c_cave_liquid.len() as i32 - 1);
                    self.c_biome_liquid = biome.c_cave_liquid[pick as usize];
                    if self.c_biome_liquid == CONTENT_AIR {
                        self.flooded = false;
                    }
                }
            }
        }

        let dswitchint = ps.range(1, 14);
        if self.large_cave {
            self.part_max_length_rs = ps.range(2, 4);
            let hi = ps.range(15, 30);
            self.tunnel_routepoints = ps.range(5, hi);
            self.min_tunnel_diameter = 5;
            let hi = ps.range(8, 24);
            self.max_tunnel_diameter = ps.range(7, hi);
        } else {
            self.part_max_length_rs = ps.range(2, 9);
            let hi = ps.range(15, 30);
            self.tunnel_routepoints = ps.range(10, hi);
            self.min_tunnel_diameter = 2;
            self.max_tunnel_diameter = ps.range(2, 6);
        }
        self.large_cave_is_flat = ps.range(0, 1) == 0;
        self.main_direction = Vec3::ZERO;

        // Routes may leave the chunk by up to a block so tunnels meet their neighbours.
        self.ar = self.node_max - self.node_min + V3i::ONE;
        self.of = self.node_min;
        let more = (MAP_BLOCKSIZE - self.max_tunnel_diameter / 2 - 2).max(1);
        self.ar += V3i::splat(more * 2);
        self.of -= V3i::splat(more);

        self.route_y_min = 0;
        self.route_y_max =
            (-self.of.y + max_stone_height + self.max_tunnel_diameter / 2 + 7).clamp(0, self.ar.y - 1);

        if self.large_cave {
            let mut minpos = 0;
            let wl = p.water_level;
            if self.node_min.y < wl && self.node_max.y > wl {
                minpos = wl - self.max_tunnel_diameter / 3 - self.of.y;
                self.route_y_max = wl + self.max_tunnel_diameter / 3 - self.of.y;
            }
            self.route_y_min = ps.range(minpos, minpos + self.max_tunnel_diameter);
            self.route_y_min = self.route_y_min.clamp(0, self.route_y_max.max(0));
        }

        let start_y_min = self.route_y_min.clamp(0, self.ar.y - 1);
        let start_y_max = self.route_y_max.clamp(start_y_min, (self.ar.y - 1).max(start_y_min));

        self.orp.z = (ps.next() % self.ar.z) as f32 + 0.5;
        self.orp.y = ps.range(start_y_min, start_y_max) as f32 + 0.5;
        self.orp.x = (ps.next() % self.ar.x) as f32 + 0.5;
        self.route.clear();
        self.route.push(self.orp);

        let (begin, end) = if self.large_cave {
            (GenNotifyType::LargeCaveBegin, GenNotifyType::LargeCaveEnd)
        } else {
            (GenNotifyType::CaveBegin, GenNotifyType::CaveEnd)
        };
        job.notify.add_event(begin, self.of + self.orp.to_v3i(), 0);

        for j in 0..self.tunnel_routepoints {
            self.make_tunnel(job, ps, j % dswitchint == 0);
        }

        job.notify.add_event(end, self.of + self.orp.to_v3i(), 0);
    }

    fn make_tunnel(&mut self, job: &mut GenerationJob, ps: &mut PseudoRandom, dirswitch: bool) {
        if dirswitch && !self.large_cave {
            self.main_direction.z = ((ps.next() % 20) as f32 - 10.0) / 10.0;
            self.main_direction.y = ((ps.next() % 20) as f32 - 10.0) / 30.0;
            self.main_direction.x = ((ps.next() % 20) as f32 - 10.0) / 10.0;
            self.main_direction = self.main_direction * (ps.range(0, 10) as f32 / 10.0);
        }

        self.rs = ps.range(self.min_tunnel_diameter, self.max_tunnel_diameter);
        let part_len = self.rs * self.part_max_length_rs;
        let maxlen = if self.large_cave {
            V3i::new(part_len, part_len / 2, part_len)
        } else {
            V3i::new(part_len, ps.range(1, part_len), part_len)
        };

        let mut vec = Vec3::ZERO;
        // small caves jump downward now and then
        if !self.large_cave && ps.range(0, 12) == 0 {
            vec.z = (ps.next() % maxlen.z) as f32 - maxlen.z as f32 / 2.0;
            vec.y = (ps.next() % (maxlen.y * 2)) as f32 - maxlen.y as f32;
            vec.x = (ps.next() % maxlen.x) as f32 - maxlen.x as f32 / 2.0;
        } else {
            vec.z = (ps.next() % maxlen.z) as f32 - maxlen.z as f32 / 2.0;
            vec.y = (ps.next() % maxlen.y) as f32 - maxlen.y as f32 / 2.0;
            vec.x = (ps.next() % maxlen.x) as f32 - maxlen.x as f32 / 2.0;
        }

        // Only the segment ends are checked against the surface.
        let p1 = self.orp.to_v3i() + self.of + V3i::splat(self.rs / 2);
        let p2 = vec.to_v3i() + p1;
        if self.is_pos_above_surface(job, p1) || self.is_pos_above_surface(job, p2) {
            return;
        }

        vec += self.main_direction;

        let mut rp = self.orp + vec;
        if rp.x < 0.0 {
            rp.x = 0.0;
        } else if rp.x >= self.ar.x as f32 {
            rp.x = (self.ar.x - 1) as f32;
        }
        if rp.y < self.route_y_min as f32 {
            rp.y = self.route_y_min as f32;
        } else if rp.y >= self.route_y_max as f32 {
            rp.y = (self.route_y_max - 1) as f32;
        }
        if rp.z < 0.0 {
            rp.z = 0.0;
        } else if rp.z >= self.ar.z as f32 {
            rp.z = (self.ar.z - 1) as f32;
        }
        let vec = rp - self.orp;

        let mut veclen = vec.length();
        if veclen < 0.05 {
            veclen = 1.0;
        }

        // every other section is rough
        let randomize_xz = ps.range(1, 2) == 1;

        let step = 1.0 / veclen;
        let mut f = 0.0f32;
        while f < 1.0 {
            self.carve_route(job, ps, vec, f, randomize_xz);
            f += step;
        }

        self.orp = rp;
        self.route.push(rp);
    }

    fn carve_route(&self, job: &mut GenerationJob, ps: &mut PseudoRandom, vec: Vec3, f: f32, randomize_xz: bool) {
        let p = self.params;
        let startp = self.orp.to_v3i() + self.of;

        let mut fp = self.orp + vec * f;
        fp.x += 0.1 * ps.range(-10, 10) as f32;
        fp.z += 0.1 * ps.range(-10, 10) as f32;
        let cp = fp.to_v3i();

        let liquid = if !self.flooded {
            CONTENT_IGNORE
        } else if self.use_biome_liquid {
            self.c_biome_liquid
        } else {
            let nval = noise_perlin_3d(
                p.np_cave_liquids,
                startp.x as f32,
                startp.y as f32,
                startp.z as f32,
                p.seed,
            );
            if nval < 0.4 && self.node_max.y < p.water_level + LAVA_DEPTH {
                p.c_lava_source
            } else {
                p.c_water_source
            }
        };

        let rs = self.rs;
        let mut d0 = -rs / 2;
        let mut d1 = d0 + rs;
        if randomize_xz {
            d0 += ps.range(-1, 1);
            d1 += ps.range(-1, 1);
        }

        let flat_cave_floor = !self.large_cave && ps.range(0, 2) == 2;
        let full_ymin = self.node_min.y - MAP_BLOCKSIZE;
        let full_ymax = self.node_max.y + MAP_BLOCKSIZE;
        let wl = p.water_level;

        for z0 in d0..=d1 {
            let si = rs / 2 - (z0.abs() - rs / 7 - 1).max(0);
            let mut x0 = -si - ps.range(0, 1);
            while x0 <= si - 1 + ps.range(0, 1) {
                let maxabsxz = x0.abs().max(z0.abs());
                let si2 = rs / 2 - (maxabsxz - rs / 7 - 1).max(0);
                for y0 in -si2..=si2 {
                    // better floors in small caves
                    if flat_cave_floor && y0 <= -rs / 2 && rs <= 7 {
                        continue;
                    }
                    // large caves not so tall
                    if self.large_cave_is_flat && rs > 7 && y0.abs() >= rs / 3 {
                        continue;
                    }

                    let pos = cp + V3i::new(x0, y0, z0) + self.of;
                    let Some(i) = job.vm.try_index(pos) else {
                        continue;
                    };
                    let c = job.vm.node_at(i).content;
                    if !p.registry.features_of(c).is_ground_content {
                        continue;
                    }

                    if self.large_cave {
                        let n = if self.flooded && full_ymin < wl && full_ymax > wl {
                            if pos.y <= wl { Node::new(p.c_water_source) } else { Node::AIR }
                        } else if self.flooded && full_ymax < wl {
                            if pos.y < startp.y - 4 { Node::new(liquid) } else { Node::AIR }
                        } else {
                            Node::AIR
                        };
                        job.vm.set_node_at(i, n);
                    } else {
                        job.vm.set_node_at(i, Node::AIR);
                        job.vm.flags_mut()[i] |= FLAG_CAVE;
                    }
                }
                x0 += 1;
            }
        }
    }

    fn is_pos_above_surface(&self, job: &GenerationJob, p: V3i) -> bool {
        let (nmin, nmax) = (self.node_min, self.node_max);
        if p.z >= nmin.z && p.z <= nmax.z && p.x >= nmin.x && p.x <= nmax.x {
            job.heightmap[job.column_index(p.x, p.z)] < p.y
        } else {
            p.y > self.params.water_level
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use strata_geom::BlockPos;

    #[test]
    fn small_cave_count_scales_with_volume() {
        let np = CarverConfig::default().np_cave_amount;
        let nmin = V3i::new(0, -80, 0);
        let one = small_cave_count(&np, 1, nmin, nmin + V3i::splat(79));
        let n = noise_perlin_2d(&np, 0.0, -80.0, 1).max(0.0);
        assert_eq!(one, (n * 512_000.0 / 250_000.0) as u32);
    }

    #[test]
    fn random_walk_stays_in_buffer_and_is_deterministic() {
        let reg = Arc::new(strata_nodes::NodeRegistry::mapgen_defaults().unwrap());
        let stone = Node::new(reg.id_of("mapgen_stone").unwrap());
        let water = reg.id_of("mapgen_water_source").unwrap();
        let carve = || {
            let mut job = GenerationJob::new(reg.clone(), 7, BlockPos::new(0, -4, 0), BlockPos::new(0, -4, 0), BlockPos::new(0, -4, 0));
            let area = *job.vm.area();
            for p in area.iter() {
                job.vm.set_node(p, stone);
            }
            job.heightmap.fill(1000);
            let np_liquids = CarverConfig::default().np_cave_liquids;
            let params = RandomWalkParams {
                registry: &reg,
                biomegen: None,
                np_cave_liquids: &np_liquids,
                seed: 7,
                water_level: 1,
                c_water_source: water,
                c_lava_source: water,
                large_cave_flooded: 0.0,
            };
            let mut ps = PseudoRandom::new(99);
            for _ in 0..4 {
                CavesRandomWalk::new(&params).make_cave(&mut job, &mut ps, false, 1000);
            }
            job
        };
        let a = carve();
        let b = carve();
        assert_eq!(a.vm.nodes(), b.vm.nodes());
        let opened = a.vm.nodes().iter().filter(|n| n.is_air()).count();
        assert!(opened > 0);
        // every opened cell carries the cave flag
        for (n, f) in a.vm.nodes().iter().zip(a.vm.flags()) {
            if n.is_air() {
                assert_ne!(f & FLAG_CAVE, 0);
            }
        }
        assert_eq!(a.notify.count(GenNotifyType::CaveBegin), 4);
    }

    fn distance_to_segment(q: Vec3, a: Vec3, b: Vec3) -> f32 {
        let ab = b - a;
        let len2 = ab.dot(ab);
        let t = if len2 > 0.0 { ((q - a).dot(ab) / len2).clamp(0.0, 1.0) } else { 0.0 };
        (q - (a + ab * t)).length()
    }

    #[test]
    fn carved_cells_hug_the_route_inside_its_box() {
        let reg = Arc::new(strata_nodes::NodeRegistry::mapgen_defaults().unwrap());
        let stone = Node::new(reg.id_of("mapgen_stone").unwrap());
        let water = reg.id_of("mapgen_water_source").unwrap();
        let np_liquids = CarverConfig::default().np_cave_liquids;
        let params = RandomWalkParams {
            registry: &reg,
            biomegen: None,
            np_cave_liquids: &np_liquids,
            seed: 3,
            water_level: 1,
            c_water_source: water,
            c_lava_source: water,
            large_cave_flooded: 0.0,
        };

        for seed in [1, 17, 99, 4242, 31337] {
            let mut job = GenerationJob::new(reg.clone(), 3, BlockPos::new(0, -4, 0), BlockPos::new(0, -4, 0), BlockPos::new(0, -4, 0));
            let area = *job.vm.area();
            for p in area.iter() {
                job.vm.set_node(p, stone);
            }
            job.heightmap.fill(1000);

            let mut cave = CavesRandomWalk::new(&params);
            cave.make_cave(&mut job, &mut PseudoRandom::new(seed), false, 1000);
            let (of, ar) = cave.route_box();
            let route = cave.route().to_vec();
            assert!(route.len() >= 2, "seed {seed}: no segment carved");
            for rp in &route {
                assert!(rp.x >= 0.0 && rp.y >= 0.0 && rp.z >= 0.0, "seed {seed}: {rp:?}");
                assert!(rp.x < ar.x as f32 && rp.y < ar.y as f32 && rp.z < ar.z as f32, "seed {seed}: {rp:?}");
            }

            // half the widest tunnel, +-1 on each side and x extent, xz jitter, and flooring
            let half = (cave.max_tunnel_diameter() / 2 + 4) as f32;
            let reach = half * 3f32.sqrt();
            let mut carved = 0;
            for p in area.iter() {
                if job.vm.flags()[area.index(p)] & FLAG_CAVE == 0 {
                    continue;
                }
                carved += 1;
                let q = (p - of).to_vec3();
                assert!(
                    q.x >= -half && q.y >= -half && q.z >= -half,
                    "seed {seed}: {p:?} below the route box"
                );
                assert!(
                    q.x < ar.x as f32 + half && q.y < ar.y as f32 + half && q.z < ar.z as f32 + half,
                    "seed {seed}: {p:?} above the route box"
                );
                let d = route
                    .windows(2)
                    .map(|w| distance_to_segment(q, w[0], w[1]))
                    .fold(f32::MAX, f32::min);
                assert!(d <= reach, "seed {seed}: {p:?} is {d} from the route, limit {reach}");
            }
            assert!(carved > 0, "seed {seed}: nothing carved");
        }
    }
}
