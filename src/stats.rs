//! Statistics tracking for the simulation.

use serde::{Deserialize, Serialize};

use crate::genetics::GenePool;

/// Snapshot of the population at one sampling instant
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PopulationSample {
    /// Simulation time in ticks
    pub time: u64,
    /// Living creatures
    pub creatures: usize,
    /// Fruit on the board
    pub fruit: usize,
    /// Unhatched eggs
    pub eggs: usize,
    /// Highest generation reached so far
    pub generation_max: u32,
    /// Current equilibrium feedback on fruit spawning
    pub fruit_multiplier: f64,
    /// Per-gene statistics; `None` when the population is extinct
    pub gene_pool: Option<GenePool>,
}

impl PopulationSample {
    /// Format the sample as a one-line summary
    pub fn summary(&self) -> String {
        let genes = match &self.gene_pool {
            Some(pool) => format!(
                "Spd:{:.1} Siz:{:.1} Vis:{:.1} Rep:{:.2}",
                pool.speed.average,
                pool.size.average,
                pool.vision.average,
                pool.reproductive_rate.average
            ),
            None => "extinct".to_string(),
        };
        format!(
            "T:{:6} | Creatures:{:4} | Fruit:{:4} | Eggs:{:3} | Gen:{:3} | FruitX:{:.2} | {}",
            self.time,
            self.creatures,
            self.fruit,
            self.eggs,
            self.generation_max,
            self.fruit_multiplier,
            genes
        )
    }
}

/// Time series of population samples accumulated over a run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SampleHistory {
    samples: Vec<PopulationSample>,
}

impl SampleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, sample: PopulationSample) {
        self.samples.push(sample);
    }

    pub fn latest(&self) -> Option<&PopulationSample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[PopulationSample] {
        &self.samples
    }

    /// Extract one numeric series across the history, for plotting
    pub fn series<F>(&self, f: F) -> Vec<(u64, f64)>
    where
        F: Fn(&PopulationSample) -> f64,
    {
        self.samples.iter().map(|s| (s.time, f(s))).collect()
    }

    /// Save the history to a JSON file
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Load a history from a JSON file
    pub fn load_json(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_at(time: u64, creatures: usize) -> PopulationSample {
        PopulationSample {
            time,
            creatures,
            fruit: creatures * 2,
            eggs: 1,
            generation_max: 3,
            fruit_multiplier: 1.0,
            gene_pool: None,
        }
    }

    #[test]
    fn test_record_and_series() {
        let mut history = SampleHistory::new();
        assert!(history.is_empty());

        history.record(sample_at(0, 10));
        history.record(sample_at(20, 12));
        history.record(sample_at(40, 9));

        assert_eq!(history.len(), 3);
        assert_eq!(history.latest().unwrap().creatures, 9);

        let creatures = history.series(|s| s.creatures as f64);
        assert_eq!(creatures, vec![(0, 10.0), (20, 12.0), (40, 9.0)]);
    }

    #[test]
    fn test_summary_mentions_extinction() {
        let sample = sample_at(100, 0);
        assert!(sample.summary().contains("extinct"));
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = std::env::temp_dir().join("microcosm_stats_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("history.json");
        let path = path.to_str().unwrap();

        let mut history = SampleHistory::new();
        history.record(sample_at(0, 5));
        history.record(sample_at(20, 7));
        history.save_json(path).unwrap();

        let loaded = SampleHistory::load_json(path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.latest().unwrap().creatures, 7);

        std::fs::remove_file(path).ok();
    }
}
