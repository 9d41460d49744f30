//! A named fractal noise source with the remap applied by terrain generation.

use noise::{Fbm, MultiFractal, NoiseFn, Simplex};
use serde::{Deserialize, Serialize};

/// Tunable parameters of a [`NoiseLayer`].
///
/// A raw sample `n` in `[-1, 1]` becomes `clamp((n + 1) / 2 + offset, min, max) * scale`.
///
/// Fields missing from serialized settings are taken from [`NoiseSettings::terrain`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default = "NoiseSettings::terrain")]
pub struct NoiseSettings {
    /// Amplitude multiplier between octaves.
    pub gain: f64,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    pub frequency: f64,
    pub octaves: usize,
    pub min: f32,
    pub max: f32,
    pub offset: f32,
    pub scale: f32,
    pub seed: u32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        NoiseSettings {
            gain: 0.5,
            lacunarity: 2.0,
            frequency: 0.02,
            octaves: 5,
            min: 0.0,
            max: 255.0,
            offset: 0.0,
            scale: 64.0,
            seed: 12345,
        }
    }
}

impl NoiseSettings {
    /// Settings used for the terrain height layer.
    pub fn terrain() -> Self {
        NoiseSettings {
            gain: 0.651,
            octaves: 10,
            frequency: 0.003,
            offset: 0.012,
            scale: 128.0,
            seed: 6899,
            ..Self::default()
        }
    }
}

/// One seeded noise generator and its settings.
pub struct NoiseLayer {
    index: u32,
    name: String,
    settings: NoiseSettings,
    generator: Fbm<Simplex>,
}

fn build_generator(settings: &NoiseSettings) -> Fbm<Simplex> {
    Fbm::<Simplex>::new(settings.seed)
        .set_octaves(settings.octaves)
        .set_frequency(settings.frequency)
        .set_lacunarity(settings.lacunarity)
        .set_persistence(settings.gain)
}

impl NoiseLayer {
    pub fn new(index: u32, name: impl Into<String>, settings: NoiseSettings) -> Self {
        NoiseLayer {
            index,
            name: name.into(),
            generator: build_generator(&settings),
            settings,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &NoiseSettings {
        &self.settings
    }

    /// Replaces the settings and rebuilds the generator.
    pub fn set_settings(&mut self, settings: NoiseSettings) {
        self.generator = build_generator(&settings);
        self.settings = settings;
    }

    /// Remapped noise at a world-space column.
    pub fn get_noise(&self, x: f64, z: f64) -> f32 {
        let raw = self.generator.get([x, z]) as f32;
        let value = (raw + 1.0) * 0.5 + self.settings.offset;
        value.clamp(self.settings.min, self.settings.max) * self.settings.scale
    }

    /// Column heights for a `size` × `size` grid starting at world column `(origin_x,
    /// origin_z)`, indexed `z * size + x`.
    pub fn height_map(&self, origin_x: i32, origin_z: i32, size: usize) -> Vec<i32> {
        let mut heights = Vec::with_capacity(size * size);
        for z in 0..size {
            for x in 0..size {
                let noise = self.get_noise(
                    (origin_x + x as i32) as f64,
                    (origin_z + z as i32) as f64,
                );
                heights.push(noise as i32);
            }
        }
        heights
    }
}
