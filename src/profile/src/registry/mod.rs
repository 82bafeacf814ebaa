use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

/// Process-wide append-only interning table.
///
/// Interned ids are handed out in first-seen order and are used as direct
/// array indices by the population statistics table and the calculators.
/// Entries are never removed or renumbered for the lifetime of the process.
#[derive(Debug, Default)]
struct Registry {
    ids   : AHashMap<String, u32>,
    labels: Vec<String>,
}

impl Registry {
    fn intern(&mut self, label: &str) -> u32 {
        if let Some(id) = self.ids.get(label) {
            return *id;
        }
        let id = u32::try_from(self.labels.len()).expect("interning registry overflow");
        self.ids.insert(label.to_owned(), id);
        self.labels.push(label.to_owned());
        id
    }
}

static ALLELES: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::default()));
static LOCI   : Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::default()));

fn intern(registry: &RwLock<Registry>, label: &str) -> u32 {
    // Fast path: concurrent readers during analysis.
    if let Some(id) = registry.read().ids.get(label) {
        return *id;
    }
    registry.write().intern(label)
}

fn label_of(registry: &RwLock<Registry>, id: u32) -> Option<String> {
    registry.read().labels.get(id as usize).cloned()
}

/// Canonical form of an allele designation: surrounding whitespace trimmed,
/// a numeric `.0` suffix stripped (`"11.0"` and `"11"` are the same allele).
pub fn normalize_allele(label: &str) -> String {
    let trimmed = label.trim();
    match trimmed.strip_suffix(".0") {
        Some(stripped) if !stripped.is_empty() => stripped.to_owned(),
        _ => trimmed.to_owned(),
    }
}

/// Canonical form of a locus name: trimmed and upper-cased, so that
/// `"vWA"` in a sample file matches `"VWA"` in a frequency table.
pub fn normalize_locus(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Intern a (normalized) allele designation, returning its stable dense id.
pub fn intern_allele(label: &str) -> u32 {
    intern(&ALLELES, &normalize_allele(label))
}

/// Intern a (normalized) locus name, returning its stable dense id.
pub fn intern_locus(name: &str) -> u32 {
    intern(&LOCI, &normalize_locus(name))
}

pub fn allele_label(id: u32) -> Option<String> {
    label_of(&ALLELES, id)
}

pub fn locus_label(id: u32) -> Option<String> {
    label_of(&LOCI, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_trailing_zero_decimal() {
        assert_eq!(normalize_allele("11.0"), "11");
        assert_eq!(normalize_allele(" 11.0 "), "11");
        assert_eq!(normalize_allele("11.2"), "11.2");
        assert_eq!(normalize_allele(".0"), ".0");
    }

    #[test]
    fn interning_is_idempotent() {
        let first  = intern_allele("14.0");
        let second = intern_allele("14");
        let third  = intern_allele(" 14 ");
        assert_eq!(first, second);
        assert_eq!(first, third);
    }

    #[test]
    fn distinct_labels_get_distinct_ids() {
        let a = intern_allele("intern-test-a");
        let b = intern_allele("intern-test-b");
        assert_ne!(a, b);
    }

    #[test]
    fn labels_are_recoverable() {
        let id = intern_allele("intern-test-label");
        assert_eq!(allele_label(id).as_deref(), Some("intern-test-label"));
    }

    #[test]
    fn locus_names_are_case_insensitive() {
        assert_eq!(intern_locus("vWA"), intern_locus("VWA"));
    }
}
