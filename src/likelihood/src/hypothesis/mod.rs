mod error;
mod relatedness;

pub use error::HypothesisError;
pub use relatedness::{Relatedness, Relation};

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use profile::{hash, Sample};

use crate::contributor::Contributor;

/// A proposed explanation of the mixture: who contributed, under which
/// dropout/drop-in/coancestry parameters, and with how many unidentified
/// contributors.
///
/// Immutable once constructed except through the explicit setters below.
#[derive(Debug)]
pub struct Hypothesis {
    id              : String,
    contributors    : Vec<Contributor>,
    non_contributors: Vec<Contributor>,
    unknown_count   : usize,
    dropin          : f64,
    unknown_dropout : f64,
    theta           : f64,
    relatedness     : Relatedness,
}

impl Hypothesis {
    pub fn new(id: &str, dropin: f64, theta: f64) -> Result<Self, HypothesisError> {
        Self::check_probability("drop-in", dropin)?;
        Self::check_probability("theta", theta)?;
        Ok(Self {
            id              : id.to_owned(),
            contributors    : Vec::new(),
            non_contributors: Vec::new(),
            unknown_count   : 0,
            dropin,
            unknown_dropout : 0.0,
            theta,
            relatedness     : Relatedness::default(),
        })
    }

    fn check_probability(what: &'static str, value: f64) -> Result<(), HypothesisError> {
        if !(0.0..=1.0).contains(&value) || value.is_nan() {
            return Err(HypothesisError::InvalidProbability { what, value });
        }
        Ok(())
    }

    pub fn add_contributor(&mut self, sample: Arc<Sample>, dropout: f64) -> Result<(), HypothesisError> {
        self.contributors.push(Contributor::new(sample, dropout)?);
        Ok(())
    }

    pub fn add_non_contributor(&mut self, sample: Arc<Sample>, dropout: f64) -> Result<(), HypothesisError> {
        self.non_contributors.push(Contributor::new(sample, dropout)?);
        Ok(())
    }

    pub fn set_unknown_count(&mut self, count: usize) {
        self.unknown_count = count;
    }

    pub fn set_unknown_dropout(&mut self, dropout: f64) -> Result<(), HypothesisError> {
        Self::check_probability("unknown dropout", dropout)?;
        self.unknown_dropout = dropout;
        Ok(())
    }

    pub fn set_relatedness(&mut self, relatedness: Relatedness) {
        self.relatedness = relatedness;
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn contributors(&self) -> &[Contributor] {
        &self.contributors
    }

    pub fn non_contributors(&self) -> &[Contributor] {
        &self.non_contributors
    }

    pub fn unknown_count(&self) -> usize {
        self.unknown_count
    }

    pub fn dropin(&self) -> f64 {
        self.dropin
    }

    pub fn unknown_dropout(&self) -> f64 {
        self.unknown_dropout
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn relatedness(&self) -> &Relatedness {
        &self.relatedness
    }

    /// Independent copy: shares the underlying `Sample`s but owns new
    /// `Contributor` wrappers, which re-derive their sub-probabilities.
    pub fn copy(&self) -> Self {
        Self {
            id              : self.id.clone(),
            contributors    : self.contributors.clone(),
            non_contributors: self.non_contributors.clone(),
            unknown_count   : self.unknown_count,
            dropin          : self.dropin,
            unknown_dropout : self.unknown_dropout,
            theta           : self.theta,
            relatedness     : self.relatedness.clone(),
        }
    }

    /// Deterministic GUID over the full textual description plus the
    /// population-statistics identity. Two hypotheses with the same GUID are
    /// interchangeable for caching and reuse.
    pub fn guid(&self, statistics_id: &str) -> u64 {
        let description = format!("{self}|statistics={statistics_id}");
        hash::fnv1a(description.as_bytes())
    }
}

impl Display for Hypothesis {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: contributors=[", self.id)?;
        for (i, contributor) in self.contributors.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{contributor}")?;
        }
        write!(f, "] non-contributors=[")?;
        for (i, contributor) in self.non_contributors.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{contributor}")?;
        }
        write!(
            f,
            "] unknowns={} unknown-dropout={} drop-in={} theta={} relatedness={}",
            self.unknown_count, self.unknown_dropout, self.dropin, self.theta, self.relatedness
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hypothesis() -> Hypothesis {
        let mut hypothesis = Hypothesis::new("prosecution", 0.05, 0.01).unwrap();
        hypothesis.add_contributor(Arc::new(Sample::new("suspect-1")), 0.1).unwrap();
        hypothesis.add_non_contributor(Arc::new(Sample::new("victim-1")), 0.0).unwrap();
        hypothesis.set_unknown_count(1);
        hypothesis.set_unknown_dropout(0.3).unwrap();
        hypothesis
    }

    #[test]
    fn guid_is_deterministic_and_sensitive() {
        let a = hypothesis();
        let b = hypothesis();
        assert_eq!(a.guid("pop-1"), b.guid("pop-1"));
        assert_ne!(a.guid("pop-1"), a.guid("pop-2"));

        let mut c = hypothesis();
        c.set_unknown_count(2);
        assert_ne!(a.guid("pop-1"), c.guid("pop-1"));
    }

    #[test]
    fn copies_are_independent() {
        let original = hypothesis();
        let mut copy = original.copy();
        copy.set_unknown_count(4);
        assert_eq!(original.unknown_count(), 1);
        assert_eq!(copy.unknown_count(), 4);
        // Samples are shared, wrappers are not.
        assert!(Arc::ptr_eq(original.contributors()[0].sample(), copy.contributors()[0].sample()));
    }

    #[test]
    fn invalid_probabilities_are_rejected() {
        assert!(Hypothesis::new("h", 1.1, 0.0).is_err());
        assert!(Hypothesis::new("h", 0.0, -0.2).is_err());
        assert!(hypothesis().set_unknown_dropout(2.0).is_err());
    }
}
