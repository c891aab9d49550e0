use glam::{IVec3, Vec3};
use noise::{NoiseFn, Perlin};

const JITTER: f32 = 0.04;
const FREQUENCY: f64 = 0.07;

/// Low-frequency per-block color variation, stable for a given seed.
#[derive(Clone, Debug)]
pub struct ColorNoise {
    perlin: Perlin,
}

impl ColorNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
        }
    }

    /// Shifts each channel of `base` by at most `JITTER`, then clamps to [0, 1].
    pub fn tint(&self, base: Vec3, world_pos: IVec3) -> Vec3 {
        let p = world_pos.as_dvec3() * FREQUENCY;
        let sample = self.perlin.get([p.x + 0.5, p.y + 0.5, p.z + 0.5]) as f32;
        let jitter = sample.clamp(-1.0, 1.0) * JITTER;
        // Warm/cool shift: red follows the sample, blue opposes it.
        let shift = Vec3::new(jitter, jitter * 0.6, -jitter * 0.5);
        (base + shift).clamp(Vec3::ZERO, Vec3::ONE)
    }
}

#[cfg(test)]
mod tests {
    use glam::{IVec3, Vec3};

    use super::{ColorNoise, JITTER};

    #[test]
    fn tint_stays_close_to_base_and_in_range() {
        let noise = ColorNoise::new(7);
        let base = Vec3::new(0.3, 0.6, 0.2);
        for x in -20..20 {
            for z in -20..20 {
                let tinted = noise.tint(base, IVec3::new(x, 12, z));
                assert!((tinted - base).abs().max_element() <= JITTER + 1e-6);
                assert!(tinted.min_element() >= 0.0 && tinted.max_element() <= 1.0);
            }
        }
    }

    #[test]
    fn tint_is_deterministic_per_seed() {
        let a = ColorNoise::new(42);
        let b = ColorNoise::new(42);
        let pos = IVec3::new(13, -4, 99);
        assert_eq!(a.tint(Vec3::splat(0.5), pos), b.tint(Vec3::splat(0.5), pos));
    }

    #[test]
    fn saturated_channels_are_clamped() {
        let noise = ColorNoise::new(1);
        let tinted = noise.tint(Vec3::ONE, IVec3::new(3, 3, 3));
        assert!(tinted.max_element() <= 1.0);
    }
}
