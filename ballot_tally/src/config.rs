// ********* Input data structures ***********

use snafu::Snafu;
use std::fmt::Display;

/// A ranked ballot, possibly cast by several voters.
///
/// The ranking is never empty and never names the same candidate twice.
/// Both properties are checked by the parser and by the builder.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Ballot {
    /// The candidates, most preferred first.
    pub ranking: Vec<String>,
    /// The number of voters who cast this exact ranking. Always positive.
    pub weight: u64,
}

impl Ballot {
    /// The position of a candidate in this ballot, if ranked.
    pub fn rank_of(&self, name: &str) -> Option<usize> {
        self.ranking.iter().position(|c| c == name)
    }
}

/// The canonical line form, `10: Alice > Bob > Chen`.
impl Display for Ballot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.weight, self.ranking.join(" > "))
    }
}

// ******** Output data structures *********

/// The final decision of a method that may not produce a single winner.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Outcome {
    Winner(String),
    /// No strict winner. Holds the candidates sharing the top position.
    Tie(Vec<String>),
}

impl Outcome {
    pub fn winner(&self) -> Option<&str> {
        match self {
            Outcome::Winner(name) => Some(name.as_str()),
            Outcome::Tie(_) => None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct EliminationStats {
    pub name: String,
    /// Where the ballots of this candidate went, in candidate order.
    pub transfers: Vec<(String, u64)>,
    pub exhausted: u64,
}

/// Statistics for one round of instant-runoff
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundStats {
    pub round: u32,
    /// Totals for the candidates still running at the start of the round.
    pub tally: Vec<(String, u64)>,
    /// Weight of the ballots that reached a running candidate.
    pub counted: u64,
    /// Weight of the ballots with no running candidate left.
    pub exhausted: u64,
    /// Smallest total that is strictly more than half of `counted`.
    pub threshold: u64,
    pub elected: Option<String>,
    pub eliminated: Vec<EliminationStats>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct IrvResult {
    pub rounds: Vec<RoundStats>,
    pub outcome: Outcome,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BordaResult {
    /// Scores in candidate order.
    pub scores: Vec<(String, u64)>,
    pub outcome: Outcome,
}

impl BordaResult {
    /// The scores from highest to lowest. Equal scores keep candidate order.
    pub fn ranking(&self) -> Vec<(String, u64)> {
        let mut res = self.scores.clone();
        res.sort_by(|a, b| b.1.cmp(&a.1));
        res
    }

    pub fn score(&self, name: &str) -> Option<u64> {
        self.scores
            .iter()
            .find(|(cname, _)| cname == name)
            .map(|(_, s)| *s)
    }
}

/// The result of a head-to-head comparison, from the point of view of the
/// first candidate.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum PairOutcome {
    Win,
    Loss,
    Tie,
}

impl PairOutcome {
    pub fn reversed(self) -> PairOutcome {
        match self {
            PairOutcome::Win => PairOutcome::Loss,
            PairOutcome::Loss => PairOutcome::Win,
            PairOutcome::Tie => PairOutcome::Tie,
        }
    }
}

/// One unordered pair of candidates, `first` coming before `second` in
/// candidate order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PairwiseContest {
    pub first: String,
    pub second: String,
    pub first_over_second: u64,
    pub second_over_first: u64,
    pub abstained: u64,
    pub outcome: PairOutcome,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CondorcetResult {
    pub candidates: Vec<String>,
    /// `preferences[i][j]`: weight of the ballots ranking candidate `i` above
    /// candidate `j`. The diagonal is zero.
    pub preferences: Vec<Vec<u64>>,
    pub contests: Vec<PairwiseContest>,
    /// Number of pairwise victories, in candidate order.
    pub victories: Vec<(String, u32)>,
    pub total_weight: u64,
    pub winner: Option<String>,
}

impl CondorcetResult {
    fn index_of(&self, name: &str) -> Option<usize> {
        self.candidates.iter().position(|c| c == name)
    }

    /// Weight of the ballots preferring `a` over `b`. Zero for unknown names.
    pub fn preference(&self, a: &str, b: &str) -> u64 {
        match (self.index_of(a), self.index_of(b)) {
            (Some(i), Some(j)) => self.preferences[i][j],
            _ => 0,
        }
    }

    /// Weight of the ballots that do not rank both candidates.
    pub fn abstentions(&self, a: &str, b: &str) -> u64 {
        self.total_weight - self.preference(a, b) - self.preference(b, a)
    }

    pub fn outcome(&self, a: &str, b: &str) -> PairOutcome {
        let ab = self.preference(a, b);
        let ba = self.preference(b, a);
        match ab.cmp(&ba) {
            std::cmp::Ordering::Greater => PairOutcome::Win,
            std::cmp::Ordering::Less => PairOutcome::Loss,
            std::cmp::Ordering::Equal => PairOutcome::Tie,
        }
    }
}

// ********* Requests **********

/// The voting methods supported by the tally engine.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum TallyMethod {
    Irv,
    Borda,
    Condorcet,
}

impl TallyMethod {
    pub const ALL: [TallyMethod; 3] =
        [TallyMethod::Irv, TallyMethod::Borda, TallyMethod::Condorcet];

    pub fn name(&self) -> &'static str {
        match self {
            TallyMethod::Irv => "irv",
            TallyMethod::Borda => "borda",
            TallyMethod::Condorcet => "condorcet",
        }
    }
}

/// The methods to run on an election, in the order the reports should come
/// back.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallyRequest {
    pub methods: Vec<TallyMethod>,
}

impl TallyRequest {
    pub fn all() -> TallyRequest {
        TallyRequest {
            methods: TallyMethod::ALL.to_vec(),
        }
    }

    pub fn single(method: TallyMethod) -> TallyRequest {
        TallyRequest {
            methods: vec![method],
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TallyReport {
    Irv(IrvResult),
    Borda(BordaResult),
    Condorcet(CondorcetResult),
}

impl TallyReport {
    pub fn method(&self) -> TallyMethod {
        match self {
            TallyReport::Irv(_) => TallyMethod::Irv,
            TallyReport::Borda(_) => TallyMethod::Borda,
            TallyReport::Condorcet(_) => TallyMethod::Condorcet,
        }
    }
}

// ********* Errors **********

/// A malformed ballot line. Line numbers start at 1.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ParseError {
    #[snafu(display("line {lineno}: the line is blank"))]
    BlankLine { lineno: usize },
    #[snafu(display("line {lineno}: expected '<count>: <ranking>', no ':' found"))]
    MissingSeparator { lineno: usize },
    #[snafu(display("line {lineno}: missing count before ':'"))]
    MissingCount { lineno: usize },
    #[snafu(display("line {lineno}: invalid count {text:?}"))]
    InvalidCount { lineno: usize, text: String },
    #[snafu(display("line {lineno}: count must be positive, found {count}"))]
    NonPositiveCount { lineno: usize, count: i64 },
    #[snafu(display("line {lineno}: the ranking is empty"))]
    EmptyRanking { lineno: usize },
    #[snafu(display("line {lineno}: candidate {name:?} is ranked more than once"))]
    DuplicateCandidate { lineno: usize, name: String },
    #[snafu(display(
        "line {lineno}: candidate {name:?} is spelled differently from {previous:?}"
    ))]
    InconsistentCandidateName {
        lineno: usize,
        name: String,
        previous: String,
    },
    #[snafu(display("line {lineno}: unknown candidate {name:?}"))]
    UnknownCandidate { lineno: usize, name: String },
}

impl ParseError {
    pub fn lineno(&self) -> usize {
        match self {
            ParseError::BlankLine { lineno }
            | ParseError::MissingSeparator { lineno }
            | ParseError::MissingCount { lineno }
            | ParseError::InvalidCount { lineno, .. }
            | ParseError::NonPositiveCount { lineno, .. }
            | ParseError::EmptyRanking { lineno }
            | ParseError::DuplicateCandidate { lineno, .. }
            | ParseError::InconsistentCandidateName { lineno, .. }
            | ParseError::UnknownCandidate { lineno, .. } => *lineno,
        }
    }
}

fn join_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<String>>()
        .join("; ")
}

/// Errors that prevent an election from being tallied.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TallyError {
    #[snafu(display("{} malformed ballot line(s): {}", errors.len(), join_errors(errors)))]
    MalformedBallots { errors: Vec<ParseError> },
    #[snafu(display("the election has no ballots or no candidates"))]
    EmptyElection {},
    #[snafu(display("no voting method was selected"))]
    NoMethodSelected {},
    #[snafu(display("the candidate list is empty"))]
    NoDeclaredCandidates {},
    #[snafu(display("candidate {name:?} is declared more than once"))]
    DuplicateDeclaredCandidate { name: String },
    #[snafu(display("candidate {name:?} is spelled differently from {previous:?}"))]
    InconsistentCandidates { name: String, previous: String },
    #[snafu(display("ballot ranks {name:?}, which is not a declared candidate"))]
    UndeclaredCandidate { name: String },
    #[snafu(display("the total ballot weight is too large to be tallied"))]
    WeightOverflow {},
    #[snafu(display("invalid ballot: {reason}"))]
    InvalidBallot { reason: String },
}
