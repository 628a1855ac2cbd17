use clap::Parser;

/// Simulates an election from ranked ballots under instant-runoff, Borda count
/// and Condorcet pairwise comparison.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON description of the election. See the manual of the
    /// ballot_tally crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) The ballots, one per line, in the form `10: Alice > Bob > Chen`.
    /// Setting this option overrides the ballot sources of the --config file.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (list of comma-separated names, optional) The declared candidates, in order. If not
    /// provided, the candidates are taken from the ballots.
    #[clap(long, value_parser)]
    pub candidates: Option<String>,

    /// (irv, borda or condorcet, repeatable) The methods to run. All of them by default.
    #[clap(short, long, value_parser)]
    pub method: Vec<String>,

    /// (file path, 'stdout' or empty) Where to write the JSON summary of the election.
    /// Setting this option overrides the output directory of the --config file.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, optional) A reference summary in JSON format. If provided, ballotsim
    /// checks that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
