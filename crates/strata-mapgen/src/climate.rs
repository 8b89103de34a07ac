//! Optional heat/humidity overrides for biome selection.

use std::f32::consts::PI;

use strata_geom::{MAX_MAP_GENERATION_LIMIT, V3i};
use strata_noise::{NoiseParams, noise_perlin_2d};

use crate::config::{BiomesConfig, ClimateConfig};

/// Per-position climate source consulted before the biome noise.
///
/// `None` leaves the noise value in place.
pub trait ClimateFeed: Send + Sync {
    fn heat(&self, pos: V3i) -> Option<f32>;
    fn humidity(&self, pos: V3i) -> Option<f32>;
}

/// Season and day-cycle model layered over the biome heat and humidity noise.
#[derive(Clone, Debug)]
pub struct SeasonalClimate {
    cfg: ClimateConfig,
    np_heat: NoiseParams,
    np_humidity: NoiseParams,
    seed: i32,
}

impl SeasonalClimate {
    pub fn new(cfg: ClimateConfig, biomes: &BiomesConfig, seed: i32) -> Self {
        Self {
            cfg,
            np_heat: biomes.np_heat.clone(),
            np_humidity: biomes.np_humidity.clone(),
            seed,
        }
    }

    pub fn config(&self) -> &ClimateConfig {
        &self.cfg
    }

    /// Heat rising towards the bottom of the world inside the hot core.
    fn core_heat(&self, y: i32) -> f32 {
        let hot_core = self.cfg.hot_core as f32;
        if hot_core <= 0.0 {
            return 0.0;
        }
        let top = -(MAX_MAP_GENERATION_LIMIT as f32 - hot_core);
        if (y as f32) < top {
            6000.0 * (1.0 - (y as f32 + MAX_MAP_GENERATION_LIMIT as f32) / hot_core)
        } else {
            0.0
        }
    }

    fn season_phase(&self, days: f32, offset: f32) -> f32 {
        let day_len = 86400.0 * days.max(f32::EPSILON);
        ((self.cfg.total_time / day_len + offset) * PI).sin()
    }
}

/// Shifts a 0..1 cycle value by `by`, wrapping at both ends.
pub fn cycle_shift(value: f32, by: f32) -> f32 {
    if value + by < 0.0 {
        1.0 + by + value
    } else if value + by > 1.0 {
        value + by - 1.0
    } else {
        value + by
    }
}

impl ClimateFeed for SeasonalClimate {
    fn heat(&self, pos: V3i) -> Option<f32> {
        let c = &self.cfg;
        let base = noise_perlin_2d(&self.np_heat, pos.x as f32, pos.z as f32, self.seed);
        let season = c.heat_season * self.season_phase(c.year_days as f32, pos.x as f32 / c.heat_width);
        let daily = c.heat_daily * ((cycle_shift(c.time_of_day, -0.25) * PI).sin() - 0.5);
        Some(base + season + daily + pos.y as f32 / c.heat_height + self.core_heat(pos.y))
    }

    fn humidity(&self, pos: V3i) -> Option<f32> {
        let c = &self.cfg;
        let base = noise_perlin_2d(&self.np_humidity, pos.x as f32, pos.z as f32, self.seed);
        let season =
            c.humidity_season * self.season_phase(c.humidity_days, pos.z as f32 / c.humidity_width);
        let daily = c.humidity_daily * ((cycle_shift(c.time_of_day, -0.1) * PI).sin() - 0.5);
        Some((base + season + daily + pos.y as f32 / c.humidity_height).clamp(0.0, 100.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn climate(cfg: ClimateConfig) -> SeasonalClimate {
        SeasonalClimate::new(cfg, &BiomesConfig::default(), 42)
    }

    #[test]
    fn cycle_shift_wraps() {
        assert!((cycle_shift(0.1, -0.25) - 0.85).abs() < 1e-6);
        assert!((cycle_shift(0.9, 0.25) - 0.15).abs() < 1e-6);
        assert!((cycle_shift(0.5, -0.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn humidity_is_clamped() {
        let c = climate(ClimateConfig {
            humidity_daily: -1000.0,
            ..ClimateConfig::default()
        });
        for x in [-500, 0, 700] {
            let h = c.humidity(V3i::new(x, 0, x)).unwrap();
            assert!((0.0..=100.0).contains(&h), "{h}");
        }
    }

    #[test]
    fn hot_core_heats_the_deep() {
        let c = climate(ClimateConfig::default());
        let shallow = c.heat(V3i::new(0, -29_000, 0)).unwrap();
        let deep = c.heat(V3i::new(0, -30_900, 0)).unwrap();
        assert!(deep > shallow + 1000.0, "{deep} vs {shallow}");
    }

    #[test]
    fn heat_falls_with_altitude() {
        let c = climate(ClimateConfig::default());
        let low = c.heat(V3i::new(10, 0, 10)).unwrap();
        let high = c.heat(V3i::new(10, 3330, 10)).unwrap();
        assert!((low - high - 10.0).abs() < 1e-3);
    }
}
