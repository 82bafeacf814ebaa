mod error;
pub use error::SampleReaderError;

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::debug;

use profile::{hash, Allele, Locus, Sample};

/// Read a genotype CSV file into samples.
///
/// ### File characteristics:
/// - Comma-separated fields, one locus observation per line.
/// - Columns: `<Sample-id>  <Marker>  <Allele-1> .. <Allele-n>` (empty
///   allele cells are ignored).
/// - An optional header line (second column `Marker`, case-insensitive) and
///   `#`-prefixed comment lines are skipped.
///
/// A file may interleave several samples; loci keep their per-sample
/// insertion order, and repeated (sample, marker) rows merge into one
/// locus. Every returned sample carries the source path and a stable hash
/// of the file's content.
pub fn read_samples(path: &Path) -> Result<Vec<Sample>, SampleReaderError> {
    let bytes = fs::read(path).map_err(|source| SampleReaderError::Open { path: path.to_owned(), source })?;
    let source_hash = hash::fnv1a(&bytes);
    let content = String::from_utf8_lossy(&bytes);

    let mut samples: IndexMap<String, Sample> = IndexMap::new();
    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 2 {
            return Err(SampleReaderError::Malformed {
                path  : path.to_owned(),
                line  : line_number,
                reason: String::from("expected at least <sample-id>,<marker>"),
            });
        }
        if fields[1].eq_ignore_ascii_case("marker") {
            continue; // header line
        }

        let (sample_id, marker) = (fields[0], fields[1]);
        if sample_id.is_empty() || marker.is_empty() {
            return Err(SampleReaderError::Malformed {
                path  : path.to_owned(),
                line  : line_number,
                reason: String::from("empty sample-id or marker field"),
            });
        }

        let sample = samples
            .entry(sample_id.to_owned())
            .or_insert_with(|| Sample::with_source(sample_id, path, source_hash));

        let mut row_alleles = Vec::with_capacity(fields.len() - 2);
        for cell in &fields[2..] {
            if cell.is_empty() {
                continue;
            }
            row_alleles.push(Allele::new(cell).map_err(|err| SampleReaderError::Malformed {
                path  : path.to_owned(),
                line  : line_number,
                reason: err.to_string(),
            })?);
        }

        let locus_name = profile::normalize_locus(marker);
        if !sample.has_locus(&locus_name) {
            sample.add_locus(Locus::new(marker));
        }
        if let Some(locus) = sample.get_locus_mut(&locus_name) {
            for allele in row_alleles {
                locus.add_allele(allele).map_err(|err| SampleReaderError::Malformed {
                    path  : path.to_owned(),
                    line  : line_number,
                    reason: err.to_string(),
                })?;
            }
        }
    }

    if samples.is_empty() {
        return Err(SampleReaderError::Empty { path: path.to_owned() });
    }
    debug!("read {} sample(s) from {}", samples.len(), path.display());
    Ok(samples.into_values().collect())
}
