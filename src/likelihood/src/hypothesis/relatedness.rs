use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use profile::Sample;

use super::HypothesisError;

/// Biological relationship linking one unknown contributor to a known
/// reference individual.
///
/// Each kind fixes a probability distribution over the number of alleles
/// shared identical-by-descent between reference and subject. Grandparent,
/// half-sibling and uncle/niece share the same distribution and therefore
/// the same genotype equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    None,
    ParentChild,
    Sibling,
    Grandparent,
    HalfSibling,
    UncleNiece,
    Cousin,
}

impl Relation {
    /// Probabilities of sharing 0, 1 or 2 alleles IBD.
    pub fn ibd_distribution(self) -> [f64; 3] {
        match self {
            Self::None        => [1.0, 0.0, 0.0],
            Self::ParentChild => [0.0, 1.0, 0.0],
            Self::Sibling     => [0.25, 0.5, 0.25],
            Self::Grandparent | Self::HalfSibling | Self::UncleNiece => [0.5, 0.5, 0.0],
            Self::Cousin      => [0.75, 0.25, 0.0],
        }
    }
}

impl FromStr for Relation {
    type Err = HypothesisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none"                          => Ok(Self::None),
            "parent-child" | "parentchild"  => Ok(Self::ParentChild),
            "sibling"                       => Ok(Self::Sibling),
            "grandparent"                   => Ok(Self::Grandparent),
            "half-sibling" | "halfsibling"  => Ok(Self::HalfSibling),
            "uncle-niece" | "uncleniece"    => Ok(Self::UncleNiece),
            "cousin"                        => Ok(Self::Cousin),
            other => Err(HypothesisError::UnknownRelation(other.to_owned())),
        }
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None        => "none",
            Self::ParentChild => "parent-child",
            Self::Sibling     => "sibling",
            Self::Grandparent => "grandparent",
            Self::HalfSibling => "half-sibling",
            Self::UncleNiece  => "uncle-niece",
            Self::Cousin      => "cousin",
        };
        name.fmt(f)
    }
}

/// Relatedness constraint of a hypothesis: which relation, and to whom.
#[derive(Debug, Clone, Default)]
pub struct Relatedness {
    relation : Relation,
    reference: Option<Arc<Sample>>,
}

impl Default for Relation {
    fn default() -> Self {
        Self::None
    }
}

impl Relatedness {
    pub fn new(relation: Relation, reference: Option<Arc<Sample>>) -> Result<Self, HypothesisError> {
        if relation != Relation::None && reference.is_none() {
            return Err(HypothesisError::MissingReference(relation));
        }
        Ok(Self { relation, reference })
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn reference(&self) -> Option<&Arc<Sample>> {
        self.reference.as_ref()
    }

    pub fn is_related(&self) -> bool {
        self.relation != Relation::None
    }
}

impl Display for Relatedness {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.reference {
            Some(reference) if self.is_related() => write!(f, "{} of {}", self.relation, reference.id()),
            _ => write!(f, "none"),
        }
    }
}
