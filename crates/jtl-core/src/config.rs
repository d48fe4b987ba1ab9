use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Deterministic seed for reproducible output (the CLI `--seed` wins)
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub profile: ProfileConfig,
    /// Response size range, inclusive
    #[serde(default = "default_bytes")]
    pub bytes: ByteRange,
    /// Request size range, inclusive
    #[serde(default = "default_sent_bytes")]
    pub sent_bytes: ByteRange,
}

impl GeneratorConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: GeneratorConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        config
            .validate()
            .with_context(|| format!("Invalid config {:?}", path))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.profile.validate()?;
        self.bytes.validate("bytes")?;
        self.sent_bytes.validate("sent_bytes")?;
        Ok(())
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            profile: ProfileConfig::default(),
            bytes: default_bytes(),
            sent_bytes: default_sent_bytes(),
        }
    }
}

/// A latency band in seconds and how many times it repeats in the profile table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandSpec {
    pub low: f64,
    pub high: f64,
    pub copies: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_bands")]
    pub bands: Vec<BandSpec>,
}

impl ProfileConfig {
    pub fn validate(&self) -> Result<()> {
        for band in &self.bands {
            if !band.low.is_finite() || !band.high.is_finite() {
                anyhow::bail!("latency band bounds must be finite: {:?}", band);
            }
            if band.low < 0.0 || band.low >= band.high {
                anyhow::bail!(
                    "latency band must satisfy 0 <= low < high, got [{}, {})",
                    band.low,
                    band.high
                );
            }
        }

        let total: u64 = self.bands.iter().map(|b| b.copies as u64).sum();
        if total == 0 {
            anyhow::bail!("latency profile has no bands");
        }
        Ok(())
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            bands: default_bands(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub min: u64,
    pub max: u64,
}

impl ByteRange {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.min > self.max {
            anyhow::bail!("{name}: min ({}) exceeds max ({})", self.min, self.max);
        }
        Ok(())
    }
}

// Mostly sub-2s responses with a thin tail past 5s.
fn default_bands() -> Vec<BandSpec> {
    vec![
        BandSpec {
            low: 0.0,
            high: 0.5,
            copies: 5,
        },
        BandSpec {
            low: 0.5,
            high: 2.0,
            copies: 15,
        },
        BandSpec {
            low: 2.0,
            high: 5.0,
            copies: 10,
        },
        BandSpec {
            low: 5.0,
            high: 10.0,
            copies: 2,
        },
        BandSpec {
            low: 10.0,
            high: 20.0,
            copies: 2,
        },
    ]
}

fn default_bytes() -> ByteRange {
    ByteRange::new(5000, 10000)
}

fn default_sent_bytes() -> ByteRange {
    ByteRange::new(500, 1500)
}
