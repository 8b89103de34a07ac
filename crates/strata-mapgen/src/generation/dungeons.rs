//! Dungeons: chains of rooms joined by corridors, walled with the biome's dungeon nodes.

use strata_geom::{MAP_BLOCKSIZE, V3i};
use strata_nodes::{CONTENT_AIR, CONTENT_IGNORE, ContentId, DrawType, Node};
use strata_noise::{NoiseParams, PseudoRandom, noise_perlin_3d};
use strata_voxel::{FLAG_CHECKED1, FLAG_CHECKED2, VoxelBuffer};

use crate::biome::BiomeGen;
use crate::config::CarverConfig;
use crate::job::GenerationJob;
use crate::mapgen::ContentIds;
use crate::notify::{GenNotifier, GenNotifyType};

pub const FLAG_DUNGEON_INSIDE: u8 = FLAG_CHECKED1;
pub const FLAG_DUNGEON_PRESERVE: u8 = FLAG_CHECKED2;
pub const FLAG_DUNGEON_UNTOUCHABLE: u8 = FLAG_DUNGEON_INSIDE | FLAG_DUNGEON_PRESERVE;

#[derive(Clone, Debug)]
pub struct DungeonParams {
    pub seed: i32,
    pub c_wall: ContentId,
    /// `CONTENT_IGNORE` disables the alternative wall pass.
    pub c_alt_wall: ContentId,
    pub c_stair: ContentId,
    pub diagonal_dirs: bool,
    /// Keep out of air, liquids, unknown space and non-ground nodes.
    pub only_in_ground: bool,
    pub holesize: V3i,
    pub corridor_len_min: i32,
    pub corridor_len_max: i32,
    pub room_size_min: V3i,
    pub room_size_max: V3i,
    pub room_size_large_min: V3i,
    pub room_size_large_max: V3i,
    /// First room is large when >= 1; later rooms are large with chance 1/n when > 1.
    pub large_room_chance: i32,
    pub num_rooms: i32,
    pub num_dungeons: i32,
    pub notifytype: GenNotifyType,
    pub np_alt_wall: NoiseParams,
}

#[inline]
fn range(ps: &mut PseudoRandom, min: i32, max: i32) -> i32 {
    if max < min { min } else { ps.range(min, max) }
}

/// A random horizontal direction, diagonal now and then when allowed.
pub fn rand_ortho_dir(random: &mut PseudoRandom, diagonal_dirs: bool) -> V3i {
    if diagonal_dirs && random.next() % 4 == 0 {
        let mut dir = V3i::ZERO;
        let mut trycount = 0;
        loop {
            trycount += 1;
            dir.z = random.next() % 3 - 1;
            dir.y = 0;
            dir.x = random.next() % 3 - 1;
            if (dir.x != 0 && dir.z != 0) || trycount >= 10 {
                return dir;
            }
        }
    }
    if random.next() % 2 == 0 {
        if random.next() % 2 != 0 { V3i::new(-1, 0, 0) } else { V3i::new(1, 0, 0) }
    } else if random.next() % 2 != 0 {
        V3i::new(0, 0, -1)
    } else {
        V3i::new(0, 0, 1)
    }
}

/// Quarter turn in the xz plane: `t == 0` turns right, anything else left.
pub fn turn_xz(olddir: V3i, t: i32) -> V3i {
    if t == 0 {
        V3i::new(olddir.z, olddir.y, -olddir.x)
    } else {
        V3i::new(-olddir.z, olddir.y, olddir.x)
    }
}

/// Keeps going straight, or turns right or left, with equal chance.
pub fn random_turn(random: &mut PseudoRandom, dir: V3i) -> V3i {
    match random.range(0, 2) {
        0 => dir,
        1 => turn_xz(dir, 0),
        _ => turn_xz(dir, 1),
    }
}

/// Stair rotation facing along `d`.
pub fn dir_to_facedir(d: V3i) -> u8 {
    if d.x.abs() > d.z.abs() {
        if d.x < 0 { 3 } else { 1 }
    } else if d.z < 0 {
        2
    } else {
        0
    }
}

pub struct DungeonGen {
    dp: DungeonParams,
    random: PseudoRandom,
    blockseed: u32,
    m_pos: V3i,
    m_dir: V3i,
}

impl DungeonGen {
    pub fn new(dp: DungeonParams) -> Self {
        Self {
            dp,
            random: PseudoRandom::new(0),
            blockseed: 0,
            m_pos: V3i::ZERO,
            m_dir: V3i::ZERO,
        }
    }

    pub fn params(&self) -> &DungeonParams {
        &self.dp
    }

    /// Builds `num_dungeons` dungeons inside `nmin..=nmax`, then converts walls where
    /// the alternative-wall noise is positive.
    pub fn generate(&mut self, job: &mut GenerationJob, bseed: u32, nmin: V3i, nmax: V3i) {
        if self.dp.num_dungeons <= 0 {
            return;
        }
        self.blockseed = bseed;
        self.random.seed(bseed.wrapping_add(2) as i32);

        let reg = job.registry.clone();
        let vm = &mut job.vm;
        vm.clear_flag(FLAG_DUNGEON_UNTOUCHABLE);

        if self.dp.only_in_ground {
            let area = *vm.area();
            for z in nmin.z..=nmax.z {
                for y in nmin.y..=nmax.y {
                    let mut i = area.index(V3i::new(nmin.x, y, z));
                    for _x in nmin.x..=nmax.x {
                        let c = vm.node_at(i).content;
                        let f = reg.features_of(c);
                        if f.drawtype == DrawType::Airlike
                            || f.is_liquid()
                            || c == CONTENT_IGNORE
                            || !f.is_ground_content
                        {
                            vm.flags_mut()[i] |= FLAG_DUNGEON_PRESERVE;
                        }
                        i += 1;
                    }
                }
            }
        }

        for _ in 0..self.dp.num_dungeons {
            self.make_dungeon(vm, &mut job.notify, V3i::splat(MAP_BLOCKSIZE));
        }

        if self.dp.c_alt_wall == CONTENT_IGNORE {
            return;
        }
        let area = *vm.area();
        let seed = self.blockseed as i32;
        for z in nmin.z..=nmax.z {
            for y in nmin.y..=nmax.y {
                let mut i = area.index(V3i::new(nmin.x, y, z));
                for x in nmin.x..=nmax.x {
                    if vm.node_at(i).content == self.dp.c_wall
                        && noise_perlin_3d(&self.dp.np_alt_wall, x as f32, y as f32, z as f32, seed) > 0.0
                    {
                        let mut n = vm.node_at(i);
                        n.content = self.dp.c_alt_wall;
                        vm.set_node_at(i, n);
                    }
                    i += 1;
                }
            }
        }
    }

    fn random_room_size(&mut self, large: bool) -> V3i {
        let (min, max) = if large {
            (self.dp.room_size_large_min, self.dp.room_size_large_max)
        } else {
            (self.dp.room_size_min, self.dp.room_size_max)
        };
        let z = range(&mut self.random, min.z, max.z);
        let y = range(&mut self.random, min.y, max.y);
        let x = range(&mut self.random, min.x, max.x);
        V3i::new(x, y, z)
    }

    fn make_dungeon(&mut self, vm: &mut VoxelBuffer, notify: &mut GenNotifier, start_padding: V3i) {
        let area = *vm.area();
        let areasize = area.extent();
        let mut roomsize = V3i::ZERO;
        let mut roomplace = V3i::ZERO;

        // The first room must land on known, touchable cells.
        let mut fits = false;
        for _ in 0..100 {
            if fits {
                break;
            }
            roomsize = self.random_room_size(self.dp.large_room_chance >= 1);
            roomplace = area.min + start_padding;
            roomplace.z += range(&mut self.random, 0, areasize.z - roomsize.z - start_padding.z);
            roomplace.y += range(&mut self.random, 0, areasize.y - roomsize.y - start_padding.y);
            roomplace.x += range(&mut self.random, 0, areasize.x - roomsize.x - start_padding.x);

            fits = Self::room_is_clear(vm, roomplace, roomsize);
        }
        if !fits {
            log::trace!(target: "mapgen", "no place for a dungeon in {:?}..{:?}", area.min, area.max);
            return;
        }

        let mut last_room_center = roomplace + V3i::new(roomsize.x / 2, 1, roomsize.z / 2);

        for i in 0..self.dp.num_rooms {
            self.make_room(vm, roomsize, roomplace);

            let room_center = roomplace + V3i::new(roomsize.x / 2, 1, roomsize.z / 2);
            notify.add_event(self.dp.notifytype, room_center, 0);

            if i + 1 == self.dp.num_rooms {
                break;
            }

            let start_in_last_room = self.random.range(0, 2) != 0;
            let walker_start_place = if start_in_last_room {
                last_room_center
            } else {
                last_room_center = room_center;
                room_center
            };

            self.m_pos = walker_start_place;
            let Some((mut doorplace, doordir)) = self.find_place_for_door(vm) else {
                return;
            };

            if self.random.range(0, 1) == 0 {
                self.make_door(vm, doorplace);
            } else {
                doorplace -= doordir;
            }

            let (corridor_end, corridor_end_dir) = self.make_corridor(vm, doorplace, doordir);

            let large = self.dp.large_room_chance > 1 && self.random.range(1, self.dp.large_room_chance) == 1;
            roomsize = self.random_room_size(large);

            self.m_pos = corridor_end;
            self.m_dir = corridor_end_dir;
            let Some((doorplace, doordir, place)) = self.find_place_for_room_door(vm, roomsize) else {
                return;
            };
            roomplace = place;

            if self.random.range(0, 1) == 0 {
                self.make_door(vm, doorplace);
            } else {
                roomplace -= doordir;
            }
        }
    }

    fn room_is_clear(vm: &VoxelBuffer, roomplace: V3i, roomsize: V3i) -> bool {
        for z in 0..roomsize.z {
            for y in 0..roomsize.y {
                for x in 0..roomsize.x {
                    let Some(vi) = vm.try_index(roomplace + V3i::new(x, y, z)) else {
                        return false;
                    };
                    if vm.flag_at(vi) & FLAG_DUNGEON_UNTOUCHABLE != 0 || vm.node_at(vi).content == CONTENT_IGNORE {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn make_room(&self, vm: &mut VoxelBuffer, roomsize: V3i, roomplace: V3i) {
        let n_wall = Node::new(self.dp.c_wall);
        let wall = |vm: &mut VoxelBuffer, p: V3i| {
            if let Some(vi) = vm.try_index(p) {
                if vm.flag_at(vi) & FLAG_DUNGEON_UNTOUCHABLE == 0 {
                    vm.set_node_at(vi, n_wall);
                }
            }
        };

        // +-x walls
        for z in 0..roomsize.z {
            for y in 0..roomsize.y {
                wall(vm, roomplace + V3i::new(0, y, z));
                wall(vm, roomplace + V3i::new(roomsize.x - 1, y, z));
            }
        }
        // +-z walls
        for x in 0..roomsize.x {
            for y in 0..roomsize.y {
                wall(vm, roomplace + V3i::new(x, y, 0));
                wall(vm, roomplace + V3i::new(x, y, roomsize.z - 1));
            }
        }
        // floor and ceiling
        for z in 0..roomsize.z {
            for x in 0..roomsize.x {
                wall(vm, roomplace + V3i::new(x, 0, z));
                wall(vm, roomplace + V3i::new(x, roomsize.y - 1, z));
            }
        }
        // fill with air
        for z in 1..roomsize.z - 1 {
            for y in 1..roomsize.y - 1 {
                for x in 1..roomsize.x - 1 {
                    if let Some(vi) = vm.try_index(roomplace + V3i::new(x, y, z)) {
                        vm.flags_mut()[vi] |= FLAG_DUNGEON_UNTOUCHABLE;
                        vm.set_node_at(vi, Node::AIR);
                    }
                }
            }
        }
    }

    fn make_fill(vm: &mut VoxelBuffer, place: V3i, size: V3i, avoid_flags: u8, n: Node, or_flags: u8) {
        for z in 0..size.z {
            for y in 0..size.y {
                for x in 0..size.x {
                    let Some(vi) = vm.try_index(place + V3i::new(x, y, z)) else {
                        continue;
                    };
                    if vm.flag_at(vi) & avoid_flags != 0 {
                        continue;
                    }
                    vm.flags_mut()[vi] |= or_flags;
                    vm.set_node_at(vi, n);
                }
            }
        }
    }

    fn make_hole(&self, vm: &mut VoxelBuffer, place: V3i) {
        Self::make_fill(vm, place, self.dp.holesize, 0, Node::AIR, FLAG_DUNGEON_INSIDE);
    }

    fn make_door(&self, vm: &mut VoxelBuffer, doorplace: V3i) {
        self.make_hole(vm, doorplace);
    }

    fn roll_stairs(&mut self, partlength: i32) -> i32 {
        if self.random.next() % 2 == 0 && partlength >= 3 {
            if self.random.next() % 2 != 0 { 1 } else { -1 }
        } else {
            0
        }
    }

    /// Digs a corridor from `doorplace`; returns where it ended and its final direction.
    fn make_corridor(&mut self, vm: &mut VoxelBuffer, doorplace: V3i, doordir: V3i) -> (V3i, V3i) {
        self.make_hole(vm, doorplace);
        let mut p0 = doorplace;
        let mut dir = doordir;
        let length = range(&mut self.random, self.dp.corridor_len_min, self.dp.corridor_len_max);
        let mut partlength = range(&mut self.random, self.dp.corridor_len_min, self.dp.corridor_len_max);
        let mut partcount = 0;
        let mut make_stairs = self.roll_stairs(partlength);
        let holesize = self.dp.holesize;
        let n_wall = Node::new(self.dp.c_wall);
        let area = *vm.area();

        for i in 0..length {
            let mut p = p0 + dir;
            if partcount != 0 {
                p.y += make_stairs;
            }

            if !(area.contains(p) && area.contains(p + V3i::new(0, 1, 0))) {
                // can't go here, turn away
                dir = turn_xz(dir, self.random.range(0, 1));
                make_stairs = -make_stairs;
                partcount = 0;
                partlength = range(&mut self.random, 1, length);
                continue;
            }

            if make_stairs != 0 {
                Self::make_fill(vm, p - V3i::ONE, holesize + V3i::new(2, 3, 2), FLAG_DUNGEON_UNTOUCHABLE, n_wall, 0);
                Self::make_fill(vm, p, holesize, FLAG_DUNGEON_UNTOUCHABLE, Node::AIR, FLAG_DUNGEON_INSIDE);
                Self::make_fill(vm, p - dir, holesize, FLAG_DUNGEON_UNTOUCHABLE, Node::AIR, FLAG_DUNGEON_INSIDE);

                // no stairs on the bottom step or on diagonal steps
                if (dir.x ^ dir.z) & 1 != 0
                    && ((make_stairs == 1 && i != 0) || (make_stairs == -1 && i != length - 1))
                {
                    let facedir = dir_to_facedir(dir * make_stairs);
                    let (stair_width, swv) = if dir.z != 0 {
                        (holesize.x, V3i::new(1, 0, 0))
                    } else {
                        (holesize.z, V3i::new(0, 0, 1))
                    };
                    let mut ps = p;
                    for _ in 0..stair_width {
                        let below = if make_stairs == -1 {
                            ps + V3i::new(-dir.x, -1, -dir.z)
                        } else {
                            ps + V3i::new(0, -1, 0)
                        };
                        if let Some(vi) = vm.try_index(below) {
                            if vm.node_at(vi).content == self.dp.c_wall {
                                vm.flags_mut()[vi] |= FLAG_DUNGEON_UNTOUCHABLE;
                                vm.set_node_at(vi, Node::with_params(self.dp.c_stair, 0, facedir));
                            }
                        }
                        ps += swv;
                    }
                }
            } else {
                Self::make_fill(vm, p - V3i::ONE, holesize + V3i::splat(2), FLAG_DUNGEON_UNTOUCHABLE, n_wall, 0);
                self.make_hole(vm, p);
            }
            p0 = p;

            partcount += 1;
            if partcount >= partlength {
                partcount = 0;
                dir = random_turn(&mut self.random, dir);
                partlength = range(&mut self.random, 1, length);
                make_stairs = self.roll_stairs(partlength);
            }
        }
        (p0, dir)
    }

    fn randomize_dir(&mut self) {
        self.m_dir = rand_ortho_dir(&mut self.random, self.dp.diagonal_dirs);
    }

    /// Walks from `m_pos` through air looking for a two-high wall to break through.
    fn find_place_for_door(&mut self, vm: &VoxelBuffer) -> Option<(V3i, V3i)> {
        let content = |p: V3i| vm.get_node_or_ignore(p).content;
        let c_wall = self.dp.c_wall;
        for i in 0..100 {
            let mut p = self.m_pos + self.m_dir;
            let p1 = p + V3i::new(0, 1, 0);
            if !vm.area().contains(p) || !vm.area().contains(p1) || i % 4 == 0 {
                self.randomize_dir();
                continue;
            }
            if content(p) == c_wall && content(p1) == c_wall {
                let found = (p, self.m_dir);
                self.randomize_dir();
                return Some(found);
            }
            // step up or down when the space is there
            if content(p) == c_wall && content(p + V3i::new(0, 1, 0)) == CONTENT_AIR && content(p + V3i::new(0, 2, 0)) == CONTENT_AIR {
                p.y += 1;
            }
            if content(p + V3i::new(0, 1, 0)) == c_wall && content(p) == CONTENT_AIR && content(p + V3i::new(0, -1, 0)) == CONTENT_AIR {
                p.y -= 1;
            }
            if content(p) != CONTENT_AIR || content(p + V3i::new(0, 1, 0)) != CONTENT_AIR {
                self.randomize_dir();
                continue;
            }
            self.m_pos = p;
        }
        None
    }

    /// Door position, direction and room placement for a room of `roomsize` that does
    /// not overlap dungeon interior.
    fn find_place_for_room_door(&mut self, vm: &VoxelBuffer, roomsize: V3i) -> Option<(V3i, V3i, V3i)> {
        for _ in 0..30 {
            let Some((doorplace, doordir)) = self.find_place_for_door(vm) else {
                continue;
            };
            let roomplace = match (doordir.x, doordir.z) {
                (1, 0) => doorplace + V3i::new(0, -1, range(&mut self.random, -roomsize.z + 2, -2)),
                (-1, 0) => doorplace + V3i::new(-roomsize.x + 1, -1, range(&mut self.random, -roomsize.z + 2, -2)),
                (0, 1) => doorplace + V3i::new(range(&mut self.random, -roomsize.x + 2, -2), -1, 0),
                (0, -1) => doorplace + V3i::new(range(&mut self.random, -roomsize.x + 2, -2), -1, -roomsize.z + 1),
                // diagonal corridors end without a room
                _ => continue,
            };

            let mut fits = true;
            'check: for z in 1..roomsize.z - 1 {
                for y in 1..roomsize.y - 1 {
                    for x in 1..roomsize.x - 1 {
                        match vm.try_index(roomplace + V3i::new(x, y, z)) {
                            Some(vi) if vm.flag_at(vi) & FLAG_DUNGEON_INSIDE == 0 => {}
                            _ => {
                                fits = false;
                                break 'check;
                            }
                        }
                    }
                }
            }
            if fits {
                return Some((doorplace, doordir, roomplace));
            }
        }
        None
    }
}

/// Sets up and runs dungeon generation for the job's chunk, or skips it when the chunk
/// lies above the stone surface, outside the configured y range, or the dungeon noise
/// asks for none.
pub fn generate_dungeons(
    cfg: &CarverConfig,
    seed: i32,
    ids: &ContentIds,
    biomegen: &BiomeGen,
    job: &mut GenerationJob,
    max_stone_y: i32,
) {
    let nmin = job.node_min();
    let nmax = job.node_max();
    if nmin.y > max_stone_y || nmin.y > cfg.dungeon_ymax || nmax.y < cfg.dungeon_ymin {
        log::trace!(target: "mapgen", "dungeons skipped at {nmin:?}");
        return;
    }
    let num_dungeons = noise_perlin_3d(&cfg.np_dungeons, nmin.x as f32, nmin.y as f32, nmin.z as f32, seed)
        .floor()
        .max(0.0) as i32;
    if num_dungeons == 0 {
        return;
    }

    let blockseed = job.blockseed();
    let mut ps = PseudoRandom::new(blockseed.wrapping_add(70033) as i32);
    let num_rooms = ps.range(2, 16);
    let large_room_chance = if ps.range(1, 4) == 1 { 8 } else { 0 };
    let diagonal_dirs = ps.range(1, 8) == 1;
    // diagonal corridors need a wider hole to be passable
    let holewidth = if diagonal_dirs { 2 } else { ps.range(1, 2) };

    let chunk_mid = nmin + (nmax - nmin) / 2;
    let biome = biomegen.biome_at_point(chunk_mid);
    let (c_wall, c_alt_wall, c_stair) = if biome.c_dungeon != CONTENT_IGNORE {
        let stair = if biome.c_dungeon_stair != CONTENT_IGNORE {
            biome.c_dungeon_stair
        } else {
            biome.c_dungeon
        };
        (biome.c_dungeon, biome.c_dungeon_alt, stair)
    } else if ids.cobble != CONTENT_IGNORE {
        (ids.cobble, ids.mossycobble, ids.stair_cobble)
    } else {
        (biome.c_stone, biome.c_stone, biome.c_stone)
    };

    let dp = DungeonParams {
        seed,
        c_wall,
        c_alt_wall,
        c_stair,
        diagonal_dirs,
        only_in_ground: true,
        holesize: V3i::new(holewidth, 3, holewidth),
        corridor_len_min: 1,
        corridor_len_max: 13,
        room_size_min: V3i::new(5, 5, 5),
        room_size_max: V3i::new(12, 6, 12),
        room_size_large_min: V3i::new(12, 6, 12),
        room_size_large_max: V3i::new(16, 16, 16),
        large_room_chance,
        num_rooms,
        num_dungeons,
        notifytype: GenNotifyType::Dungeon,
        np_alt_wall: cfg.np_dungeon_alt_wall.clone(),
    };
    let (full_min, full_max) = (job.full_node_min(), job.full_node_max());
    log::debug!(
        target: "mapgen",
        "{num_dungeons} dungeon(s) with {num_rooms} rooms at {nmin:?}"
    );
    DungeonGen::new(dp).generate(job, blockseed, full_min, full_max);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use strata_geom::BlockPos;
    use strata_nodes::NodeRegistry;

    #[test]
    fn turns_and_facedirs() {
        let east = V3i::new(1, 0, 0);
        assert_eq!(turn_xz(east, 0), V3i::new(0, 0, -1));
        assert_eq!(turn_xz(east, 1), V3i::new(0, 0, 1));
        assert_eq!(turn_xz(turn_xz(east, 0), 1), east);
        assert_eq!(dir_to_facedir(V3i::new(0, 0, 1)), 0);
        assert_eq!(dir_to_facedir(V3i::new(1, 0, 0)), 1);
        assert_eq!(dir_to_facedir(V3i::new(0, 0, -1)), 2);
        assert_eq!(dir_to_facedir(V3i::new(-1, 0, 0)), 3);
    }

    #[test]
    fn ortho_dirs_are_unit_horizontal() {
        let mut ps = PseudoRandom::new(5);
        for _ in 0..200 {
            let d = rand_ortho_dir(&mut ps, false);
            assert_eq!(d.y, 0);
            assert_eq!(d.x.abs() + d.z.abs(), 1);
        }
    }

    fn solid_job(reg: &Arc<NodeRegistry>) -> GenerationJob {
        let stone = Node::new(reg.id_of("mapgen_stone").unwrap());
        let mut job = GenerationJob::new(reg.clone(), 3, BlockPos::new(0, -3, 0), BlockPos::new(1, -2, 1), BlockPos::new(0, -3, 0));
        let area = *job.vm.area();
        for p in area.iter() {
            job.vm.set_node(p, stone);
        }
        job
    }

    fn params(reg: &NodeRegistry) -> DungeonParams {
        let cobble = reg.id_of("mapgen_cobble").unwrap();
        DungeonParams {
            seed: 3,
            c_wall: cobble,
            c_alt_wall: CONTENT_IGNORE,
            c_stair: reg.id_of("mapgen_stair_cobble").unwrap(),
            diagonal_dirs: false,
            only_in_ground: true,
            holesize: V3i::new(1, 3, 1),
            corridor_len_min: 1,
            corridor_len_max: 13,
            room_size_min: V3i::new(5, 5, 5),
            room_size_max: V3i::new(12, 6, 12),
            room_size_large_min: V3i::new(12, 6, 12),
            room_size_large_max: V3i::new(16, 16, 16),
            large_room_chance: 0,
            num_rooms: 6,
            num_dungeons: 1,
            notifytype: GenNotifyType::Dungeon,
            np_alt_wall: CarverConfig::default().np_dungeon_alt_wall,
        }
    }

    #[test]
    fn dungeon_rooms_are_walled_and_reported() {
        let reg = Arc::new(NodeRegistry::mapgen_defaults().unwrap());
        let cobble = reg.id_of("mapgen_cobble").unwrap();
        let mut job = solid_job(&reg);
        let (lo, hi) = (job.full_node_min(), job.full_node_max());
        DungeonGen::new(params(&reg)).generate(&mut job, 1234, lo, hi);

        let rooms = job.notify.count(GenNotifyType::Dungeon);
        assert!(rooms >= 1);
        let walls = job.vm.nodes().iter().filter(|n| n.content == cobble).count();
        let air = job.vm.nodes().iter().filter(|n| n.is_air()).count();
        assert!(walls > 0);
        assert!(air > 0);
        // first room sits at least a block inside the buffer
        let first = job.notify.events()[0].pos;
        assert!(first.x >= lo.x + MAP_BLOCKSIZE && first.z >= lo.z + MAP_BLOCKSIZE);
    }

    #[test]
    fn nothing_is_built_in_open_air() {
        let reg = Arc::new(NodeRegistry::mapgen_defaults().unwrap());
        let mut job = GenerationJob::new(reg.clone(), 3, BlockPos::new(0, 0, 0), BlockPos::new(0, 0, 0), BlockPos::new(0, 0, 0));
        let area = *job.vm.area();
        for p in area.iter() {
            job.vm.set_node(p, Node::AIR);
        }
        let (lo, hi) = (job.full_node_min(), job.full_node_max());
        DungeonGen::new(params(&reg)).generate(&mut job, 99, lo, hi);
        assert!(job.vm.nodes().iter().all(|n| n.is_air()));
        assert_eq!(job.notify.count(GenNotifyType::Dungeon), 0);
    }
}
