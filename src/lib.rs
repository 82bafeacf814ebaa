extern crate parser;
extern crate logger;

use parser::{Cli, Commands::*};

#[macro_use]
extern crate log;

use anyhow::{Context, Result};

pub mod analysis;

pub fn cite() {
    // If this ever becomes bloated, consider using the 'indoc' crate.
    const CITATIONS: &str = r###"
    A. If you plan to use MixLR-rs in your work, please cite the
       publications describing the underlying probabilistic model:

        1. Haned H, Slooten K, Gill P. Exploratory data analysis for the
           interpretation of low template DNA mixtures. Forensic Sci Int
           Genet. 2012; 6(6):762-774.
           https://doi.org/10.1016/j.fsigen.2012.08.002

        2. Gill P, Haned H. A new methodological framework to interpret
           complex DNA profiles using likelihood ratios. Forensic Sci Int
           Genet. 2013; 7(2):251-263.
           https://doi.org/10.1016/j.fsigen.2012.11.002


    B. The coancestry (theta) correction follows:

        1. Balding DJ, Nichols RA. DNA profile match probability
           calculation: how to allow for population stratification,
           relatedness, database selection and single bands. Forensic Sci
           Int. 1994; 64(2-3):125-140.
           https://doi.org/10.1016/0379-0738(94)90222-4

        2. Curran JM, Triggs CM, Buckleton J, Weir BS. Interpreting DNA
           mixtures in structured populations. J Forensic Sci. 1999;
           44(5):987-995.

    "###;
    println!("{CITATIONS}");
}

/// Unpack the parsed Cli and run the appropriate module.
pub fn run(cli: Cli) -> Result<()> {
    match cli.commands {
        Run { run } => {
            analysis::run(&run)?;
        }

        FromYaml { yaml } => {
            let replayed: Cli = serde_yaml::from_reader(
                std::fs::File::open(&yaml).with_context(|| format!("Unable to open {yaml}"))?,
            )
            .with_context(|| format!("Unable to deserialize arguments from the {yaml} file"))?;
            self::run(replayed)?;
        }

        Cite => {
            cite();
        }
    };
    Ok(())
}
