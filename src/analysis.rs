//! Glue between the command line and the likelihood engine: loads the
//! tabular inputs, assembles both hypotheses, runs the scheduler with a
//! progress bar attached, and reports the resulting ratios.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use indicatif::ProgressBar;

use likelihood::{
    AnalysisConfig, AnalysisOutcome, Hypothesis, LikelihoodRatio, ProgressListener, Relatedness, Relation,
    Scheduler, Side,
};
use parser::{ParserError, Run};
use profile::Sample;

pub fn run(args: &Run) -> Result<LikelihoodRatio> {
    // ----------------------------- Load population statistics.
    info!("Reading population statistics from '{}'", args.frequencies);
    let statistics = Arc::new(
        mixlr_io::read_statistics(Path::new(&args.frequencies), args.rare_frequency)
            .with_context(|| format!("While reading '{}'", args.frequencies))?,
    );

    // ----------------------------- Load evidence replicates.
    let mut replicates: Vec<Arc<Sample>> = Vec::new();
    for file in &args.replicates {
        let mut samples = mixlr_io::read_samples(Path::new(file))
            .with_context(|| format!("While reading replicate file '{}'", file))?;
        for sample in &mut samples {
            // Collapse accidental duplicate rows.
            sample.loci_mut().for_each(profile::Locus::remove_duplicate_alleles);
        }
        replicates.extend(samples.into_iter().map(Arc::new));
    }
    info!("{} evidence replicate(s) loaded", replicates.len());

    // ----------------------------- Load reference profiles.
    let mut references: HashMap<String, Arc<Sample>> = HashMap::new();
    for file in &args.references {
        let samples = mixlr_io::read_samples(Path::new(file))
            .with_context(|| format!("While reading reference file '{}'", file))?;
        for mut sample in samples {
            for locus in sample.loci_mut() {
                if locus.len() == 1 {
                    locus.treat_as_homozygote()?;
                }
            }
            references.insert(sample.id().to_owned(), Arc::new(sample));
        }
    }
    info!("{} reference profile(s) loaded", references.len());

    // ----------------------------- Assemble both hypotheses.
    let prosecution = build_hypothesis(
        "prosecution", &args.prosecution, args.prosecution_unknowns, &references, args, Relatedness::default(),
    )?;
    let relatedness = build_relatedness(args, &references)?;
    let defense = build_hypothesis(
        "defense", &args.defense, args.defense_unknowns, &references, args, relatedness,
    )?;
    debug!("Hp GUID: {:016x}", prosecution.guid(statistics.id()));
    debug!("Hd GUID: {:016x}", defense.guid(statistics.id()));

    let mut config = AnalysisConfig::new(Arc::clone(&statistics));
    config.set_prosecution(prosecution);
    config.set_defense(defense);
    for replicate in replicates {
        config.add_replicate(replicate);
    }
    if !args.loci.is_empty() {
        config.set_enabled_loci(&args.loci);
    }
    config.set_thread_count(args.threads);
    config.set_validation(args.validation);

    // ----------------------------- Run, with a progress bar attached.
    let mut scheduler = Scheduler::new();
    scheduler.add_progress_listener(Box::new(ProgressBarListener::new()));
    let ratio = scheduler.do_analysis(config)?;

    report(&ratio);
    Ok(ratio)
}

fn build_hypothesis(
    id         : &str,
    listed     : &[String],
    unknowns   : usize,
    references : &HashMap<String, Arc<Sample>>,
    args       : &Run,
    relatedness: Relatedness,
) -> Result<Hypothesis> {
    let mut hypothesis = Hypothesis::new(id, args.dropin, args.theta)?;
    for sample_id in listed {
        let sample = references
            .get(sample_id)
            .ok_or_else(|| ParserError::UnknownSampleId(sample_id.clone()))?;
        hypothesis.add_contributor(Arc::clone(sample), args.dropout)?;
    }

    // Every reference not contributing under this hypothesis is carried as
    // a non-contributor, in a stable order.
    let mut others: Vec<&String> = references.keys().filter(|id| !listed.contains(id)).collect();
    others.sort();
    for sample_id in others {
        hypothesis.add_non_contributor(Arc::clone(&references[sample_id]), args.dropout)?;
    }

    hypothesis.set_unknown_count(unknowns);
    hypothesis.set_unknown_dropout(args.unknown_dropout)?;
    hypothesis.set_relatedness(relatedness);
    Ok(hypothesis)
}

/// The CLI's relatedness constraint binds the defense hypothesis' first
/// unknown contributor to a reference individual.
fn build_relatedness(args: &Run, references: &HashMap<String, Arc<Sample>>) -> Result<Relatedness> {
    let relation: Relation = args.relation.parse()?;
    if relation == Relation::None {
        return Ok(Relatedness::default());
    }
    let relative = args
        .relative
        .as_ref()
        .ok_or_else(|| anyhow!("--relation '{relation}' requires --relative"))?;
    let reference = references
        .get(relative)
        .ok_or_else(|| ParserError::UnknownSampleId(relative.clone()))?;
    Ok(Relatedness::new(relation, Some(Arc::clone(reference)))?)
}

fn report(ratio: &LikelihoodRatio) {
    info!("{:-^64}", " RESULTS ");
    info!("{: <12} {: >14} {: >14} {: >14}", "Locus", "Pr(E|Hp)", "Pr(E|Hd)", "LR");
    for (locus, locus_ratio) in ratio.ratios() {
        info!(
            "{locus: <12} {: >14} {: >14} {: >14}",
            locus_ratio.prosecution().map_or_else(|| String::from("-"), |p| format!("{p:.6e}")),
            locus_ratio.defense().map_or_else(|| String::from("-"), |p| format!("{p:.6e}")),
            format!("{:.4}", locus_ratio.ratio()),
        );
    }
    let overall = ratio.overall();
    info!("Overall LR: {overall:.6e} (log10: {:.4})", overall.log10());
}

/// Progress listener driving an `indicatif` bar through the shared logger
/// [`MultiProgress`]: one tick per finished (hypothesis, locus) pair.
struct ProgressBarListener {
    bar: ProgressBar,
}

impl ProgressBarListener {
    fn new() -> Self {
        let bar = logger::Logger::multi().add(ProgressBar::new(0));
        Self { bar }
    }
}

impl ProgressListener for ProgressBarListener {
    fn analysis_started(&self) {
        info!("Analysis started");
    }

    fn locus_started(&self, _side: Side, _locus: &str, _estimated_size: usize) {
        self.bar.inc_length(1);
    }

    fn locus_finished(&self, side: Side, locus: &str, probability: f64) {
        trace!("{side}/{locus}: {probability:e}");
        self.bar.inc(1);
    }

    fn analysis_finished(&self, outcome: &AnalysisOutcome) {
        self.bar.finish_and_clear();
        match outcome {
            AnalysisOutcome::Completed(_) => info!("Analysis finished"),
            AnalysisOutcome::Failed(reason) => error!("Analysis failed: {reason}"),
            AnalysisOutcome::Cancelled => warn!("Analysis was cancelled before completion"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profile::{Allele, Locus};

    fn reference(id: &str) -> (String, Arc<Sample>) {
        let mut sample = Sample::new(id);
        let mut locus = Locus::new("VWA");
        locus.add_allele(Allele::new("14").unwrap()).unwrap();
        locus.add_allele(Allele::new("15").unwrap()).unwrap();
        sample.add_locus(locus);
        (id.to_owned(), Arc::new(sample))
    }

    fn args() -> Run {
        Run {
            replicates         : vec![String::from("unused.csv")],
            references         : vec![],
            frequencies        : String::from("unused.csv"),
            prosecution        : vec![String::from("suspect")],
            defense            : vec![],
            prosecution_unknowns: 0,
            defense_unknowns   : 1,
            dropout            : 0.1,
            unknown_dropout    : 0.2,
            dropin             : 0.05,
            theta              : 0.0,
            rare_frequency     : 0.001,
            relation           : String::from("none"),
            relative           : None,
            loci               : vec![],
            threads            : 1,
            validation         : false,
            output_dir         : String::from("mixlr-output"),
        }
    }

    #[test]
    fn listed_references_contribute_and_others_do_not() {
        let references: HashMap<_, _> = [reference("suspect"), reference("victim")].into_iter().collect();
        let hypothesis = build_hypothesis(
            "prosecution", &[String::from("suspect")], 0, &references, &args(), Relatedness::default(),
        )
        .unwrap();
        assert_eq!(hypothesis.contributors().len(), 1);
        assert_eq!(hypothesis.contributors()[0].sample().id(), "suspect");
        assert_eq!(hypothesis.non_contributors().len(), 1);
        assert_eq!(hypothesis.non_contributors()[0].sample().id(), "victim");
    }

    #[test]
    fn unknown_sample_ids_are_rejected() {
        let references: HashMap<_, _> = [reference("suspect")].into_iter().collect();
        let result = build_hypothesis(
            "prosecution", &[String::from("nobody")], 0, &references, &args(), Relatedness::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn relatedness_requires_the_relative_argument() {
        let references: HashMap<_, _> = [reference("suspect")].into_iter().collect();
        let mut args = args();
        args.relation = String::from("sibling");
        assert!(build_relatedness(&args, &references).is_err());

        args.relative = Some(String::from("suspect"));
        let relatedness = build_relatedness(&args, &references).unwrap();
        assert_eq!(relatedness.relation(), Relation::Sibling);
    }
}
