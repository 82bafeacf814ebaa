use thiserror::Error;

use crate::contributor::ContributorError;

use super::Relation;

#[derive(Debug, Error)]
pub enum HypothesisError {
    #[error(transparent)]
    Contributor(#[from] ContributorError),

    #[error("{what} probability {value} is outside the [0, 1] interval")]
    InvalidProbability { what: &'static str, value: f64 },

    #[error("Unknown relation identifier '{0}'")]
    UnknownRelation(String),

    #[error("Relation '{0}' requires a reference individual")]
    MissingReference(Relation),
}
