use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::locus::Locus;

/// A typed DNA profile: an evidence replicate or a reference individual.
///
/// Loci are kept in insertion order, which is the order they appeared in the
/// source file and the order they are reported in.
#[derive(Debug, Clone)]
pub struct Sample {
    id         : String,
    source     : Option<PathBuf>,
    source_hash: u64,
    enabled    : bool,
    loci       : IndexMap<String, Locus>,
}

impl Sample {
    pub fn new(id: &str) -> Self {
        Self { id: id.trim().to_owned(), source: None, source_hash: 0, enabled: true, loci: IndexMap::new() }
    }

    pub fn with_source(id: &str, source: &Path, source_hash: u64) -> Self {
        let mut sample = Self::new(id);
        sample.source = Some(source.to_owned());
        sample.source_hash = source_hash;
        sample
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn source_hash(&self) -> u64 {
        self.source_hash
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Insert a locus, replacing any previous locus of the same name while
    /// keeping its original position.
    pub fn add_locus(&mut self, locus: Locus) {
        self.loci.insert(locus.name().to_owned(), locus);
    }

    pub fn get_locus(&self, name: &str) -> Option<&Locus> {
        self.loci.get(name)
    }

    pub fn get_locus_mut(&mut self, name: &str) -> Option<&mut Locus> {
        self.loci.get_mut(name)
    }

    pub fn has_locus(&self, name: &str) -> bool {
        self.loci.contains_key(name)
    }

    pub fn loci(&self) -> impl Iterator<Item = &Locus> {
        self.loci.values()
    }

    pub fn loci_mut(&mut self) -> impl Iterator<Item = &mut Locus> {
        self.loci.values_mut()
    }

    pub fn locus_names(&self) -> impl Iterator<Item = &str> {
        self.loci.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.loci.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loci.is_empty()
    }
}

impl Display for Sample {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        for locus in self.loci.values() {
            write!(f, " {locus}")?;
        }
        Ok(())
    }
}
