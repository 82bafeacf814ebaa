use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::debug;
use serde::{Deserialize, Serialize};

mod error;
pub use error::ParserError;

#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(name="mixlr-rs", author, version, about, long_about = None)]
#[clap(propagate_version = true)]
/// MixLR-rs: likelihood ratios for forensic DNA mixture interpretation
pub struct Cli {
    /// Set the verbosity level (-v -vv -vvv)
    ///
    /// -v: Info  |  -vv: Debug  | -vvv: Trace {n}
    ///
    /// Warnings are printed by default even when this flag is off; use
    /// --quiet/-q to disable them.
    #[clap(short='v', long, parse(from_occurrences), global=true)]
    pub verbose: u8,

    /// Disable warnings. Only errors will be displayed.
    #[clap(short='q', long, global=true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub commands: Commands,
}

#[derive(Subcommand, Debug, Serialize, Deserialize)]
pub enum Commands {
    /// Compute the likelihood ratio of a mixture under two hypotheses.
    Run {
        #[clap(flatten)]
        run: Run,
    },
    /// Replay a previous run from its serialized arguments.
    FromYaml {
        /// Path to a '<time>-run.yaml' file produced by a previous run.
        yaml: String,
    },
    /// Display the relevant citations.
    Cite,
}

#[derive(Args, Debug, Serialize, Deserialize)]
pub struct Run {
    /// Evidence replicate genotype file(s) (CSV).
    ///
    /// Each file may carry several replicate profiles. Format, one locus
    /// observation per line: 'SampleName,Marker,Allele1,...,AlleleN'
    #[clap(short='r', long, multiple_values(true), required(true))]
    pub replicates: Vec<String>,

    /// Reference profile genotype file(s) (CSV), same format as
    /// --replicates. Reference loci typed with a single allele are treated
    /// as homozygotes.
    #[clap(short='R', long, multiple_values(true))]
    pub references: Vec<String>,

    /// Population allele-frequency file (CSV).
    ///
    /// Format: a 'Allele,<Marker-1>,...,<Marker-n>' header, then one line
    /// per allele designation with one frequency column per marker.
    #[clap(short='F', long, required(true))]
    pub frequencies: String,

    /// Reference sample ids contributing under the prosecution hypothesis.
    #[clap(short='P', long, multiple_values(true))]
    pub prosecution: Vec<String>,

    /// Reference sample ids contributing under the defense hypothesis.
    #[clap(short='D', long, multiple_values(true))]
    pub defense: Vec<String>,

    /// Number of unknown contributors under the prosecution hypothesis.
    #[clap(long, default_value("0"))]
    pub prosecution_unknowns: usize,

    /// Number of unknown contributors under the defense hypothesis.
    #[clap(long, default_value("1"))]
    pub defense_unknowns: usize,

    /// Dropout probability of every known contributor.
    #[clap(short='d', long, default_value("0.1"))]
    pub dropout: f64,

    /// Dropout probability shared by all unknown contributors.
    #[clap(long, default_value("0.1"))]
    pub unknown_dropout: f64,

    /// Drop-in probability.
    #[clap(short='c', long, default_value("0.05"))]
    pub dropin: f64,

    /// Coancestry (theta) correction.
    #[clap(short='t', long, default_value("0.0"))]
    pub theta: f64,

    /// Frequency assigned to alleles absent from the frequency file.
    #[clap(long, default_value("0.001"))]
    pub rare_frequency: f64,

    /// Declare the defense hypothesis' first unknown contributor related
    /// to a reference individual.
    ///
    /// Accepted kinds: none, parent-child, sibling, grandparent,
    /// half-sibling, uncle-niece, cousin. Requires --relative.
    #[clap(long, default_value("none"))]
    pub relation: String,

    /// Reference sample id the related unknown is linked to.
    #[clap(long)]
    pub relative: Option<String>,

    /// Restrict the analysis to the given loci. Defaults to every locus
    /// typed in the replicates.
    #[clap(short='L', long, multiple_values(true))]
    pub loci: Vec<String>,

    /// Worker-pool size.
    #[clap(long, default_value("1"))]
    pub threads: usize,

    /// Validation mode: log every genotype-probability formula and disable
    /// result caches, for audit trails.
    #[clap(long)]
    pub validation: bool,

    /// Output directory, where the serialized arguments are written.
    #[clap(short='o', long, default_value("mixlr-output"))]
    pub output_dir: String,
}

impl Cli {
    /// Serialize the command line arguments within a `.yaml` file, so a run
    /// can be replayed with `mixlr-rs from-yaml`.
    ///
    /// File naming follows the convention '{current time}-run.yaml', at the
    /// root of the `--output-dir` folder.
    pub fn serialize(&self) -> Result<()> {
        let Commands::Run { run } = &self.commands else { return Ok(()) };

        let serialized = serde_yaml::to_string(&self)
            .map_err(|err| ParserError::SerializeArgs(err.to_string()))?;
        debug!("\n---- Command line args ----\n{serialized}\n---");

        fs::create_dir_all(&run.output_dir)
            .with_context(|| format!("While creating output directory '{}'", run.output_dir))?;

        let current_time = chrono::offset::Local::now().format("%Y-%m-%dT%H%M%S");
        let output_file = PathBuf::from(&run.output_dir).join(format!("{current_time}-run.yaml"));
        fs::write(&output_file, serialized)
            .with_context(|| format!("While writing '{}'", output_file.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_arguments_round_trip_through_yaml() {
        let cli = Cli::parse_from([
            "mixlr-rs", "run",
            "--replicates", "evidence.csv",
            "--references", "refs.csv",
            "--frequencies", "freqs.csv",
            "--prosecution", "suspect",
            "--defense-unknowns", "2",
            "--theta", "0.01",
        ]);
        let yaml = serde_yaml::to_string(&cli).unwrap();
        let replayed: Cli = serde_yaml::from_str(&yaml).unwrap();
        let Commands::Run { run } = replayed.commands else { panic!("expected a run command") };
        assert_eq!(run.prosecution, ["suspect"]);
        assert_eq!(run.defense_unknowns, 2);
        assert!((run.theta - 0.01).abs() < 1e-12);
    }
}
