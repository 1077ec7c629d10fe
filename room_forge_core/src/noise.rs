use rand::{Rng, SeedableRng, rngs::StdRng};

const LATTICE_SIZE: usize = 256;

/// Seeded one-dimensional gradient noise.
///
/// `sample` is smooth, lies in `[0, 1]` and equals 0.5 on integer inputs.
#[derive(Debug, Clone)]
pub struct PerlinNoise1D {
    gradients: Vec<f32>,
}

impl PerlinNoise1D {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        PerlinNoise1D {
            gradients: (0..LATTICE_SIZE)
                .map(|_| rng.random_range(-1.0f32..=1.0))
                .collect(),
        }
    }

    fn gradient(&self, lattice: i64) -> f32 {
        self.gradients[lattice.rem_euclid(LATTICE_SIZE as i64) as usize]
    }

    pub fn sample(&self, x: f32) -> f32 {
        let floor = x.floor();
        let t = x - floor;
        let lattice = floor as i64;

        let d0 = self.gradient(lattice) * t;
        let d1 = self.gradient(lattice + 1) * (t - 1.0);
        // Quintic fade keeps the first and second derivatives continuous.
        let fade = t * t * t * (t * (t * 6.0 - 15.0) + 10.0);
        (d0 + (d1 - d0) * fade + 0.5).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_lattice_points_are_midpoint() {
        let noise = PerlinNoise1D::new(9);
        for x in [-3.0, 0.0, 1.0, 17.0, 300.0] {
            assert_approx_eq!(noise.sample(x), 0.5);
        }
    }

    #[test]
    fn test_samples_stay_in_unit_range() {
        let noise = PerlinNoise1D::new(1);
        for i in 0..2_000 {
            let value = noise.sample(i as f32 * 0.173 - 50.0);
            assert!((0.0..=1.0).contains(&value), "{}", value);
        }
    }

    #[test]
    fn test_same_seed_same_curve() {
        let a = PerlinNoise1D::new(42);
        let b = PerlinNoise1D::new(42);
        let c = PerlinNoise1D::new(43);
        let xs: Vec<f32> = (0..64).map(|i| i as f32 * 0.31 + 0.05).collect();
        assert!(xs.iter().all(|x| a.sample(*x) == b.sample(*x)));
        assert!(xs.iter().any(|x| a.sample(*x) != c.sample(*x)));
    }

    #[test]
    fn test_curve_is_continuous() {
        let noise = PerlinNoise1D::new(5);
        let mut previous = noise.sample(0.0);
        for i in 1..1_000 {
            let value = noise.sample(i as f32 * 0.01);
            assert!((value - previous).abs() < 0.05);
            previous = value;
        }
    }
}
