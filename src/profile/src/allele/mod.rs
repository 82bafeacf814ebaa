mod error;
pub use error::AlleleError;

use std::fmt::{self, Display, Formatter};

use crate::registry;

/// A single allele observation.
///
/// The designation is stored in canonical form (see
/// [`registry::normalize_allele`]) and interned into the process-wide
/// registry on construction. Two alleles are equal iff their canonical
/// designations are equal; the peak height is informational only and takes
/// no part in equality.
#[derive(Debug, Clone)]
pub struct Allele {
    label : String,
    height: f64,
    id    : u32,
    locus : Option<String>,
}

impl Allele {
    pub fn new(label: &str) -> Result<Self, AlleleError> {
        Self::with_height(label, 0.0)
    }

    pub fn with_height(label: &str, height: f64) -> Result<Self, AlleleError> {
        let label = registry::normalize_allele(label);
        if label.is_empty() {
            return Err(AlleleError::EmptyLabel);
        }
        let id = registry::intern_allele(&label);
        Ok(Self { label, height, id, locus: None })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Dense interned id, usable as a direct array index.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Name of the locus this allele was inserted into, if any.
    pub fn locus(&self) -> Option<&str> {
        self.locus.as_deref()
    }

    /// Parent the allele to its containing locus. Set once, on insertion.
    pub(crate) fn set_locus(&mut self, name: &str) -> Result<(), AlleleError> {
        match &self.locus {
            Some(current) if current != name => Err(AlleleError::Reparented {
                label: self.label.clone(),
                from : current.clone(),
                to   : name.to_owned(),
            }),
            _ => {
                self.locus = Some(name.to_owned());
                Ok(())
            }
        }
    }
}

impl PartialEq for Allele {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Allele {}

impl std::hash::Hash for Allele {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for Allele {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.label.fmt(f)
    }
}
