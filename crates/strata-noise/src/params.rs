use serde::Deserialize;
use strata_geom::{MAX_MAP_GENERATION_LIMIT, Vec3};

/// Shaping flags applied to every octave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct NoiseFlags(u8);

impl NoiseFlags {
    pub const NONE: NoiseFlags = NoiseFlags(0);
    /// Quintic fade before linear blending between lattice points.
    pub const EASED: NoiseFlags = NoiseFlags(0x02);
    /// Fold each octave to its absolute value.
    pub const ABSVALUE: NoiseFlags = NoiseFlags(0x04);

    #[inline]
    pub fn contains(self, other: NoiseFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn union(self, other: NoiseFlags) -> NoiseFlags {
        NoiseFlags(self.0 | other.0)
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl TryFrom<Vec<String>> for NoiseFlags {
    type Error = String;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        let mut flags = NoiseFlags::NONE;
        for name in names {
            flags = flags.union(match name.as_str() {
                "eased" => NoiseFlags::EASED,
                "absvalue" => NoiseFlags::ABSVALUE,
                "defaults" | "" => NoiseFlags::NONE,
                other => return Err(format!("unknown noise flag '{other}'")),
            });
        }
        Ok(flags)
    }
}

/// Parameters of a fractal noise field.
///
/// The `far_*` modifiers scale the corresponding parameter with distance from the origin:
/// at the origin the factor is 1, at the generation limit it reaches the configured value.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    pub offset: f32,
    pub scale: f32,
    pub spread: Vec3,
    pub seed: i32,
    pub octaves: u16,
    pub persist: f32,
    pub lacunarity: f32,
    pub flags: NoiseFlags,
    pub far_scale: f32,
    pub far_spread: f32,
    pub far_persist: f32,
    pub far_lacunarity: f32,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            offset: 0.0,
            scale: 1.0,
            spread: Vec3::new(250.0, 250.0, 250.0),
            seed: 12345,
            octaves: 3,
            persist: 0.6,
            lacunarity: 2.0,
            flags: NoiseFlags::NONE,
            far_scale: 1.0,
            far_spread: 1.0,
            far_persist: 1.0,
            far_lacunarity: 1.0,
        }
    }
}

impl NoiseParams {
    pub fn new(
        offset: f32,
        scale: f32,
        spread: Vec3,
        seed: i32,
        octaves: u16,
        persist: f32,
        lacunarity: f32,
    ) -> Self {
        Self {
            offset,
            scale,
            spread,
            seed,
            octaves,
            persist,
            lacunarity,
            ..Self::default()
        }
    }

    pub fn with_flags(mut self, flags: NoiseFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_far(mut self, scale: f32, spread: f32, persist: f32, lacunarity: f32) -> Self {
        self.far_scale = scale;
        self.far_spread = spread;
        self.far_persist = persist;
        self.far_lacunarity = lacunarity;
        self
    }

    #[inline]
    pub fn eased(&self) -> bool {
        self.flags.contains(NoiseFlags::EASED)
    }

    #[inline]
    pub fn absvalue(&self) -> bool {
        self.flags.contains(NoiseFlags::ABSVALUE)
    }

    /// Far-scale factors evaluated at `coords`: (scale, spread, persist, lacunarity).
    pub(crate) fn far_factors(&self, coords: &[f32]) -> FarFactors {
        FarFactors {
            scale: farscale(self.far_scale, coords),
            spread: farscale(self.far_spread, coords),
            persist: farscale(self.far_persist, coords),
            lacunarity: farscale(self.far_lacunarity, coords),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct FarFactors {
    pub scale: f32,
    pub spread: f32,
    pub persist: f32,
    pub lacunarity: f32,
}

/// Blends linearly from 1 at the origin to `scale` at the generation limit, measured by
/// the summed distance over all axes.
pub(crate) fn farscale(scale: f32, coords: &[f32]) -> f32 {
    if scale == 1.0 {
        return 1.0;
    }
    let limit = MAX_MAP_GENERATION_LIMIT as f32 * coords.len() as f32;
    let dist: f32 = coords.iter().map(|c| c.abs()).sum();
    1.0 + (1.0 - (limit - dist) / limit) * (scale - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farscale_is_identity_at_origin_and_reaches_scale_at_limit() {
        assert_eq!(farscale(1.0, &[500.0, 200.0]), 1.0);
        assert!((farscale(3.0, &[0.0, 0.0]) - 1.0).abs() < 1e-6);
        let lim = MAX_MAP_GENERATION_LIMIT as f32;
        assert!((farscale(3.0, &[lim, lim]) - 3.0).abs() < 1e-4);
        assert!((farscale(3.0, &[lim, 0.0]) - 2.0).abs() < 1e-4);
    }

    #[test]
    fn flags_parse_from_names() {
        let f = NoiseFlags::try_from(vec!["eased".to_string(), "absvalue".to_string()]).unwrap();
        assert!(f.contains(NoiseFlags::EASED));
        assert!(f.contains(NoiseFlags::ABSVALUE));
        assert!(NoiseFlags::try_from(vec!["bogus".to_string()]).is_err());
    }
}
