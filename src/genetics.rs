//! Gene schema, inheritance and derived stats.
//!
//! Genes are bounded numeric traits sampled uniformly at creation and
//! recombined sexually with unclamped mutation, so the gene pool can drift
//! outside the founding bounds over generations.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::vector::rand_float;

/// How a gene's value factors into the lifespan formula
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifespanEffect {
    /// Higher value, longer life
    Positive,
    /// Higher value, shorter life
    Negative,
    /// Not part of the multiplicative loop
    None,
}

/// Static schema for one gene
#[derive(Clone, Copy, Debug)]
pub struct GeneInfo {
    pub min: f64,
    pub max: f64,
    /// Exponent applied to this gene's lifespan term
    pub weight: f64,
    pub lifespan_effect: LifespanEffect,
}

impl GeneInfo {
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// The closed set of creature genes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gene {
    Speed,
    Size,
    Vision,
    ReproductiveRate,
}

pub const ALL_GENES: [Gene; 4] = [
    Gene::Speed,
    Gene::Size,
    Gene::Vision,
    Gene::ReproductiveRate,
];

/// Speed in px per tick
pub const SPEED_INFO: GeneInfo = GeneInfo {
    min: 3.0,
    max: 10.0,
    weight: 1.0,
    lifespan_effect: LifespanEffect::Negative,
};

/// Body size in px
pub const SIZE_INFO: GeneInfo = GeneInfo {
    min: 10.0,
    max: 30.0,
    weight: 1.0,
    lifespan_effect: LifespanEffect::Positive,
};

/// Sight radius in px
pub const VISION_INFO: GeneInfo = GeneInfo {
    min: 25.0,
    max: 75.0,
    weight: 1.0,
    lifespan_effect: LifespanEffect::Negative,
};

/// How quickly reproductive urge accrues; balanced against lifespan
/// outside the main loop (see [`lifespan_ticks`])
pub const REPRODUCTIVE_RATE_INFO: GeneInfo = GeneInfo {
    min: 0.5,
    max: 2.0,
    weight: 0.7,
    lifespan_effect: LifespanEffect::None,
};

impl Gene {
    pub fn info(&self) -> &'static GeneInfo {
        match self {
            Gene::Speed => &SPEED_INFO,
            Gene::Size => &SIZE_INFO,
            Gene::Vision => &VISION_INFO,
            Gene::ReproductiveRate => &REPRODUCTIVE_RATE_INFO,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Gene::Speed => "speed",
            Gene::Size => "size",
            Gene::Vision => "vision",
            Gene::ReproductiveRate => "reproductiveRate",
        }
    }
}

/// A creature's full gene set, strongly typed
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genes {
    pub speed: f64,
    pub size: f64,
    pub vision: f64,
    pub reproductive_rate: f64,
}

impl Genes {
    /// Sample a fresh random gene set within the schema bounds
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        Self {
            speed: generate_gene(Gene::Speed, rng),
            size: generate_gene(Gene::Size, rng),
            vision: generate_gene(Gene::Vision, rng),
            reproductive_rate: generate_gene(Gene::ReproductiveRate, rng),
        }
    }

    pub fn get(&self, gene: Gene) -> f64 {
        match gene {
            Gene::Speed => self.speed,
            Gene::Size => self.size,
            Gene::Vision => self.vision,
            Gene::ReproductiveRate => self.reproductive_rate,
        }
    }

    fn set(&mut self, gene: Gene, value: f64) {
        match gene {
            Gene::Speed => self.speed = value,
            Gene::Size => self.size = value,
            Gene::Vision => self.vision = value,
            Gene::ReproductiveRate => self.reproductive_rate = value,
        }
    }
}

/// Uniform random sample of a single gene within its bounds
pub fn generate_gene<R: Rng>(gene: Gene, rng: &mut R) -> f64 {
    let info = gene.info();
    rand_float(rng, info.min, info.max)
}

/// Base number of seconds a creature with all-midpoint genes lives
pub const BASE_LIFESPAN_SECS: f64 = 10.0;

/// Lifespan in ticks derived from a gene set. Pure.
///
/// Each gene with a lifespan effect contributes a power term around its
/// midpoint; the reproductive rate then scales the result so that slower
/// reproducers live proportionally longer, keeping population growth in
/// check. A creature with every gene at its midpoint lives exactly
/// `BASE_LIFESPAN_SECS * tps` ticks.
pub fn lifespan_ticks(genes: &Genes, tps: u32) -> u64 {
    let mut lifespan = BASE_LIFESPAN_SECS * f64::from(tps);

    for gene in ALL_GENES {
        let info = gene.info();
        let value = genes.get(gene);
        match info.lifespan_effect {
            LifespanEffect::Positive => {
                lifespan *= (value / info.midpoint()).powf(info.weight);
            }
            LifespanEffect::Negative => {
                lifespan *= (info.midpoint() / value).powf(info.weight);
            }
            LifespanEffect::None => {}
        }
    }

    let rate_info = Gene::ReproductiveRate.info();
    lifespan *= (rate_info.midpoint() / genes.reproductive_rate).powf(rate_info.weight);

    lifespan.round().max(1.0) as u64
}

/// Chance that a crossed-over gene picks up a mutation
pub const MUTATION_CHANCE: f64 = 0.3;

/// Sexual recombination: per gene a 50/50 allele pick from either parent,
/// then an occasional mutation whose magnitude scales with the gene's
/// range and the configured mutation multiplier.
///
/// Mutations are not clamped back into the schema bounds; values drifting
/// outside the founding range over generations is intended.
pub fn crossover<R: Rng>(a: &Genes, b: &Genes, mutation_multiplier: f64, rng: &mut R) -> Genes {
    let mut child = *a;

    for gene in ALL_GENES {
        let allele = if rng.gen_bool(0.5) {
            a.get(gene)
        } else {
            b.get(gene)
        };
        child.set(gene, allele);

        if rng.gen::<f64>() < MUTATION_CHANCE && mutation_multiplier > 0.0 {
            let info = gene.info();
            let magnitude =
                (info.min + info.max) / 300.0 * rand_float(rng, 0.1, 1.0) * mutation_multiplier;
            let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            child.set(gene, child.get(gene) + magnitude * direction);
        }
    }

    child
}

/// Exponent making larger bodies disproportionately slower
const SPEED_REDUCTION_EXPONENT: f64 = 1.1;
const MAX_REDUCTION: f64 = 3.0;

/// Effective movement speed for a gene set.
///
/// Computed once at creation and cached on the creature, not per tick.
pub fn move_speed(genes: &Genes) -> f64 {
    let size = Gene::Size.info();
    let reduction = size.max / size.min / MAX_REDUCTION;
    genes.speed / (genes.size / size.min / reduction).powf(SPEED_REDUCTION_EXPONENT)
}

/// Summary statistics for one gene across the living population
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneStat {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
}

impl GeneStat {
    fn from_values(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let average = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - average).powi(2)).sum::<f64>() / n;

        Self {
            average,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            stddev: variance.sqrt(),
        }
    }
}

/// Per-gene statistics over a population sample
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenePool {
    pub speed: GeneStat,
    pub size: GeneStat,
    pub vision: GeneStat,
    pub reproductive_rate: GeneStat,
}

impl GenePool {
    /// Aggregate the gene sets of the living creatures.
    /// Returns `None` for an empty population.
    pub fn sample<'a, I>(genes: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Genes>,
    {
        let sets: Vec<&Genes> = genes.into_iter().collect();
        if sets.is_empty() {
            return None;
        }

        let collect = |gene: Gene| -> Vec<f64> { sets.iter().map(|g| g.get(gene)).collect() };

        Some(Self {
            speed: GeneStat::from_values(&collect(Gene::Speed)),
            size: GeneStat::from_values(&collect(Gene::Size)),
            vision: GeneStat::from_values(&collect(Gene::Vision)),
            reproductive_rate: GeneStat::from_values(&collect(Gene::ReproductiveRate)),
        })
    }
}
