use crate::config::ProfileConfig;
use anyhow::Result;
use rand::Rng;
use serde::Serialize;

/// Half-open interval `[low, high)` of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyBand {
    pub low: f64,
    pub high: f64,
}

impl LatencyBand {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Draw a latency in seconds uniformly from the band.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.low..self.high)
    }
}

/// Weighted catalog of latency bands.
///
/// Weighting is by repetition: each band appears `copies` times in the
/// backing table and sampling is uniform over the table.
#[derive(Debug, Clone)]
pub struct LatencyProfileTable {
    bands: Vec<LatencyBand>,
}

impl LatencyProfileTable {
    pub fn from_config(config: &ProfileConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::expand(config))
    }

    fn expand(config: &ProfileConfig) -> Self {
        let bands = config
            .bands
            .iter()
            .flat_map(|spec| {
                std::iter::repeat(LatencyBand::new(spec.low, spec.high)).take(spec.copies as usize)
            })
            .collect();
        Self { bands }
    }

    /// Pick one band uniformly from the table.
    pub fn sample_range<R: Rng + ?Sized>(&self, rng: &mut R) -> LatencyBand {
        // Non-empty: from_config rejects a profile without copies.
        self.bands[rng.gen_range(0..self.bands.len())]
    }

    pub fn bands(&self) -> &[LatencyBand] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

impl Default for LatencyProfileTable {
    fn default() -> Self {
        Self::expand(&ProfileConfig::default())
    }
}
