use proptest::prelude::*;
use strata_geom::Vec3;
use strata_noise::{NoiseFlags, NoiseMap, NoiseParams, noise_perlin_2d, noise_perlin_3d};

fn terrain_params() -> NoiseParams {
    NoiseParams::new(4.0, 70.0, Vec3::new(300.0, 300.0, 300.0), 82341, 6, 0.7, 2.0)
}

fn cave_params() -> NoiseParams {
    NoiseParams::new(0.0, 12.0, Vec3::new(61.0, 61.0, 61.0), 52534, 3, 0.5, 2.0)
}

fn origin() -> impl Strategy<Value = i32> {
    -2000i32..2000
}

proptest! {
    // Identical params, seed and origin give bit-identical maps
    #[test]
    fn maps_are_deterministic(x in origin(), z in origin(), seed in any::<i32>()) {
        let mut a = NoiseMap::new_2d(terrain_params(), seed, 16, 16);
        let mut b = NoiseMap::new_2d(terrain_params(), seed, 16, 16);
        let ra = a.perlin_map_2d(x as f32, z as f32, None).to_vec();
        let rb = b.perlin_map_2d(x as f32, z as f32, None).to_vec();
        prop_assert_eq!(ra, rb);
    }

    // Reusing a map for a second grid matches a freshly built one
    #[test]
    fn reuse_matches_fresh(x in origin(), y in origin(), z in origin()) {
        let mut reused = NoiseMap::new_3d(cave_params(), 7, 8, 9, 8);
        reused.perlin_map_3d(0.0, 0.0, 0.0, None);
        let again = reused.perlin_map_3d(x as f32, y as f32, z as f32, None).to_vec();
        let mut fresh = NoiseMap::new_3d(cave_params(), 7, 8, 9, 8);
        let once = fresh.perlin_map_3d(x as f32, y as f32, z as f32, None).to_vec();
        prop_assert_eq!(again, once);
    }

    // Grid samples agree with the point sampler up to float drift of the stepping walk
    #[test]
    fn map_agrees_with_point_sampler(x in origin(), z in origin(), eased in any::<bool>()) {
        let np = if eased { terrain_params().with_flags(NoiseFlags::EASED) } else { terrain_params() };
        let mut m = NoiseMap::new_2d(np.clone(), 42, 8, 8);
        let res = m.perlin_map_2d(x as f32, z as f32, None).to_vec();
        for j in 0..8 {
            for i in 0..8 {
                let p = noise_perlin_2d(&np, (x + i) as f32, (z + j) as f32, 42);
                let v = res[j as usize * 8 + i as usize];
                prop_assert!((p - v).abs() < 0.05, "({i},{j}) point {p} map {v}");
            }
        }
    }

    #[test]
    fn map3d_agrees_with_point_sampler(x in origin(), y in -200i32..200, z in origin()) {
        let np = cave_params();
        let mut m = NoiseMap::new_3d(np.clone(), 5, 4, 5, 4);
        let res = m.perlin_map_3d(x as f32, y as f32, z as f32, None).to_vec();
        for k in 0..4 {
            for j in 0..5 {
                for i in 0..4 {
                    let p = noise_perlin_3d(&np, (x + i) as f32, (y + j) as f32, (z + k) as f32, 5);
                    let v = res[((k * 5 + j) * 4 + i) as usize];
                    prop_assert!((p - v).abs() < 0.01, "point {p} map {v}");
                }
            }
        }
    }

    // Fractal sums are bounded by offset +- scale * sum(persist^i)
    #[test]
    fn values_stay_within_amplitude(x in origin(), z in origin(), absvalue in any::<bool>()) {
        let mut np = terrain_params();
        if absvalue {
            np = np.with_flags(NoiseFlags::ABSVALUE);
        }
        let amp: f32 = (0..np.octaves).map(|i| np.persist.powi(i as i32)).sum::<f32>() * np.scale;
        let mut m = NoiseMap::new_2d(np.clone(), 1, 8, 8);
        for v in m.perlin_map_2d(x as f32, z as f32, None) {
            prop_assert!(*v >= np.offset - amp - 1e-3 && *v <= np.offset + amp + 1e-3);
            if absvalue {
                prop_assert!(*v >= np.offset - 1e-3);
            }
        }
    }
}

#[test]
fn different_seeds_differ() {
    let mut a = NoiseMap::new_2d(terrain_params(), 1, 16, 16);
    let mut b = NoiseMap::new_2d(terrain_params(), 2, 16, 16);
    let ra = a.perlin_map_2d(0.0, 0.0, None).to_vec();
    let rb = b.perlin_map_2d(0.0, 0.0, None).to_vec();
    assert_ne!(ra, rb);
}

// Float drift in the stepping walk used to run one lattice point past the buffer here
#[test]
fn lattice_covers_drifting_walk() {
    let mut m = NoiseMap::new_2d(terrain_params(), 1, 16, 16);
    let at = m.perlin_map_2d(-241.0, 0.0, None).to_vec();
    assert_eq!(at.len(), 256);
    assert!(at.iter().all(|v| v.is_finite()));

    for x in -400..400 {
        m.perlin_map_2d(x as f32, 0.0, None);
    }
    let mut m3 = NoiseMap::new_3d(terrain_params(), 1, 16, 16, 16);
    for x in -300..-200 {
        m3.perlin_map_3d(x as f32, x as f32, 0.0, None);
    }
}

#[test]
fn params_deserialize_from_toml() {
    let np: NoiseParams = toml::from_str(
        r#"
offset = -0.5
scale = 1.0
spread = [250.0, 250.0, 250.0]
seed = 4213
octaves = 5
persist = 0.69
flags = ["eased"]
"#,
    )
    .unwrap();
    assert_eq!(np.seed, 4213);
    assert_eq!(np.octaves, 5);
    assert_eq!(np.lacunarity, 2.0);
    assert!(np.eased());
    assert!(!np.absvalue());
    assert_eq!(np.far_scale, 1.0);
}
