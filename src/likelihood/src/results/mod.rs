use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;

/// Running probability sum for one (hypothesis, locus) pair.
///
/// Multiple jobs may contribute to the same pair when the
/// unknown-contributor enumeration was split across workers, hence `add`.
#[derive(Debug, Clone)]
pub struct LocusProbability {
    hypothesis: String,
    locus     : String,
    value     : f64,
}

impl LocusProbability {
    pub fn new(hypothesis: &str, locus: &str) -> Self {
        Self { hypothesis: hypothesis.to_owned(), locus: locus.to_owned(), value: 0.0 }
    }

    pub fn hypothesis(&self) -> &str {
        &self.hypothesis
    }

    pub fn locus(&self) -> &str {
        &self.locus
    }

    pub fn add(&mut self, probability: f64) {
        self.value += probability;
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Per-locus probabilities for one hypothesis side.
#[derive(Debug, Clone)]
pub struct LocusProbabilities {
    hypothesis   : String,
    probabilities: IndexMap<String, LocusProbability>,
}

impl LocusProbabilities {
    pub fn new(hypothesis: &str) -> Self {
        Self { hypothesis: hypothesis.to_owned(), probabilities: IndexMap::new() }
    }

    pub fn hypothesis(&self) -> &str {
        &self.hypothesis
    }

    /// Sum `probability` into the locus' accumulator.
    pub fn add(&mut self, locus: &str, probability: f64) {
        let hypothesis = self.hypothesis.clone();
        self.probabilities
            .entry(locus.to_owned())
            .or_insert_with(|| LocusProbability::new(&hypothesis, locus))
            .add(probability);
    }

    pub fn get(&self, locus: &str) -> Option<f64> {
        self.probabilities.get(locus).map(LocusProbability::value)
    }

    pub fn loci(&self) -> impl Iterator<Item = &str> {
        self.probabilities.keys().map(String::as_str)
    }

    /// Global probability of the hypothesis: the product over all loci.
    pub fn global(&self) -> f64 {
        self.probabilities.values().map(LocusProbability::value).product()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

/// Probability ratio at one locus. `ratio` is NaN when either side was not
/// computed (e.g. a skipped hypothesis).
#[derive(Debug, Clone, Copy)]
pub struct Ratio {
    prosecution: Option<f64>,
    defense    : Option<f64>,
}

impl Ratio {
    pub fn new(prosecution: Option<f64>, defense: Option<f64>) -> Self {
        Self { prosecution, defense }
    }

    pub fn prosecution(&self) -> Option<f64> {
        self.prosecution
    }

    pub fn defense(&self) -> Option<f64> {
        self.defense
    }

    pub fn ratio(&self) -> f64 {
        match (self.prosecution, self.defense) {
            (Some(numerator), Some(denominator)) => numerator / denominator,
            _ => f64::NAN,
        }
    }
}

/// The final likelihood ratio: one [`Ratio`] per locus, overall value the
/// product of the per-locus ratios. Immutable once built.
#[derive(Debug, Clone)]
pub struct LikelihoodRatio {
    ratios : IndexMap<String, Ratio>,
    overall: f64,
}

impl LikelihoodRatio {
    /// Combine the two sides, keeping `loci` order. Loci missing from a side
    /// yield NaN ratios, which propagate into the overall product.
    pub fn new(loci: &[String], prosecution: &LocusProbabilities, defense: &LocusProbabilities) -> Self {
        let mut ratios = IndexMap::with_capacity(loci.len());
        for locus in loci {
            let ratio = Ratio::new(prosecution.get(locus), defense.get(locus));
            ratios.insert(locus.clone(), ratio);
        }
        let overall = ratios.values().map(Ratio::ratio).product();
        Self { ratios, overall }
    }

    pub fn get(&self, locus: &str) -> Option<&Ratio> {
        self.ratios.get(locus)
    }

    pub fn ratios(&self) -> impl Iterator<Item = (&str, &Ratio)> {
        self.ratios.iter().map(|(locus, ratio)| (locus.as_str(), ratio))
    }

    pub fn overall(&self) -> f64 {
        self.overall
    }
}

impl Display for LikelihoodRatio {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (locus, ratio) in &self.ratios {
            writeln!(f, "{locus}: {}", ratio.ratio())?;
        }
        write!(f, "overall: {}", self.overall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_probability_is_the_product_of_loci() {
        let mut probabilities = LocusProbabilities::new("prosecution");
        probabilities.add("D3S1358", 0.1);
        probabilities.add("VWA", 0.2);
        probabilities.add("FGA", 0.3);
        assert!((probabilities.global() - 0.006).abs() < 1e-9);
    }

    #[test]
    fn add_sums_into_the_same_locus() {
        let mut probabilities = LocusProbabilities::new("defense");
        probabilities.add("VWA", 0.25);
        probabilities.add("VWA", 0.5);
        assert!((probabilities.get("VWA").unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn ratio_divides_when_both_sides_present() {
        let ratio = Ratio::new(Some(0.3), Some(0.6));
        assert!((ratio.ratio() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn ratio_is_nan_when_a_side_is_missing() {
        assert!(Ratio::new(None, Some(0.5)).ratio().is_nan());
        assert!(Ratio::new(Some(0.5), None).ratio().is_nan());
    }

    #[test]
    fn overall_ratio_is_the_product() {
        let loci = vec!["VWA".to_owned(), "FGA".to_owned()];
        let mut prosecution = LocusProbabilities::new("prosecution");
        prosecution.add("VWA", 0.4);
        prosecution.add("FGA", 0.9);
        let mut defense = LocusProbabilities::new("defense");
        defense.add("VWA", 0.2);
        defense.add("FGA", 0.3);

        let likelihood_ratio = LikelihoodRatio::new(&loci, &prosecution, &defense);
        assert!((likelihood_ratio.overall() - (0.4 / 0.2) * (0.9 / 0.3)).abs() < 1e-9);
        assert!((likelihood_ratio.get("VWA").unwrap().ratio() - 2.0).abs() < 1e-12);
    }
}
