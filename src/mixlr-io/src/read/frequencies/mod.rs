mod error;
pub use error::FrequencyReaderError;

use std::fs;
use std::path::Path;

use log::{debug, warn};

use popstats::PopulationStatistics;
use profile::hash;

/// Read a population-statistics CSV file.
///
/// ### File characteristics:
/// - First line: `Allele,<Marker-1>,<Marker-2>,...`
/// - Following lines: an allele designation, then one frequency per marker.
///   Empty cells mean the allele was not observed at that marker.
/// - Designations that are not plain numbers (e.g. `<10`, `>20`) are
///   recorded as compound: they keep their frequency for pricing but are
///   excluded from candidate-genotype enumeration.
///
/// The table's identity is derived from the file name and a stable content
/// hash, and `rare_frequency` becomes the fallback for alleles the source
/// never recorded.
pub fn read_statistics(path: &Path, rare_frequency: f64) -> Result<PopulationStatistics, FrequencyReaderError> {
    let bytes = fs::read(path).map_err(|source| FrequencyReaderError::Open { path: path.to_owned(), source })?;
    let content = String::from_utf8_lossy(&bytes);

    let stem = path.file_stem().map_or_else(|| String::from("statistics"), |stem| stem.to_string_lossy().into_owned());
    let id = format!("{stem}#{:016x}", hash::fnv1a(&bytes));
    let mut statistics = PopulationStatistics::new(&id);
    statistics.set_rare_frequency(rare_frequency).map_err(|err| FrequencyReaderError::Malformed {
        path  : path.to_owned(),
        line  : 0,
        reason: err.to_string(),
    })?;

    let mut lines = content.lines().enumerate().filter(|(_, line)| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#')
    });

    let Some((_, header)) = lines.next() else {
        return Err(FrequencyReaderError::MissingHeader { path: path.to_owned() });
    };
    let header: Vec<&str> = header.split(',').map(str::trim).collect();
    if header.first().map_or(true, |cell| !cell.eq_ignore_ascii_case("allele")) {
        return Err(FrequencyReaderError::MissingHeader { path: path.to_owned() });
    }
    let markers: Vec<&str> = header[1..].iter().copied().filter(|cell| !cell.is_empty()).collect();
    if markers.is_empty() {
        return Err(FrequencyReaderError::MissingHeader { path: path.to_owned() });
    }

    for (index, line) in lines {
        let line_number = index + 1;
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        let designation = cells[0];
        if designation.is_empty() {
            return Err(FrequencyReaderError::Malformed {
                path  : path.to_owned(),
                line  : line_number,
                reason: String::from("empty allele designation"),
            });
        }
        if designation.parse::<f64>().is_err() {
            statistics.add_compound(designation);
        }

        for (marker_index, marker) in markers.iter().enumerate() {
            let Some(cell) = cells.get(marker_index + 1) else { break };
            if cell.is_empty() {
                continue;
            }
            let frequency: f64 = cell.parse().map_err(|_| FrequencyReaderError::Malformed {
                path  : path.to_owned(),
                line  : line_number,
                reason: format!("'{cell}' is not a frequency"),
            })?;
            statistics.add_statistic(marker, designation, frequency).map_err(|err| {
                FrequencyReaderError::Malformed {
                    path  : path.to_owned(),
                    line  : line_number,
                    reason: err.to_string(),
                }
            })?;
        }
    }

    let locus_count = statistics.loci().count();
    if locus_count == 0 {
        warn!("'{}' defines no marker frequencies at all", path.display());
    }
    debug!("read frequencies for {locus_count} marker(s) from {}", path.display());
    Ok(statistics)
}
