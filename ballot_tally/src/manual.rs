/*!

This is the long-form manual for `ballot_tally` and `ballotsim`.

## Ballot format

Ballots are plain text, one line per group of identical ballots:

```text
10: Alice > Bob > Chen
8: Bob > Chen > Alice
7: Chen > Bob > Alice
```

The number before the colon is the count of voters who cast this ranking. It
must be a positive integer, at most 18446744073709551615. The total weight of
an election must also stay within that bound, once multiplied by the number
of candidates minus one. The candidates follow, most preferred first,
separated by `>`. A comma is accepted in place of `>`.

- Names are trimmed. They may contain spaces but not `>`, `,` or a line break.
- A ballot may rank only some of the candidates.
- A ballot may not rank the same candidate twice.
- Blank lines are ignored.
- When the candidates are not declared, a name must always be spelled the same
  way. `Alice` and `alice` on two different lines is reported as an error
  rather than being merged or counted as two candidates.

All the malformed lines of an input are reported at once, each with its line
number.

## Candidates

The candidates are taken from the ballots in order of first appearance. This
order is the one used in every report.

The candidates may also be declared up front (`--candidates "Alice, Bob,
Chen, Diego"`). In that case the declared order is used, ballots may only rank
declared candidates, and a declared candidate without any vote still takes
part: it changes the number of Borda points and is the first eliminated in an
instant-runoff count.

## Methods

### `irv`

Instant-runoff voting. Every round, each ballot counts for its highest ranked
candidate still running. A candidate with strictly more than half of the
counted ballots is elected. Otherwise, all the candidates sharing the lowest
count are eliminated together, and their ballots move to the next candidate
still running. A ballot with no running candidate left is exhausted and is not
counted any more.

If all the remaining candidates have the same count, the election ends in a
tie between them.

### `borda`

Borda count. With N candidates, a first choice is worth N-1 points, a second
choice N-2 and so on. Candidates left out of a ballot get no points from it.
The highest total wins; several candidates sharing the highest total are
reported as a tie.

### `condorcet`

Pairwise comparison. For every pair of candidates, the ballots ranking both of
them are split by which one comes first. Ballots missing one of the two
candidates abstain. A candidate beating every other candidate is the
Condorcet winner. With cyclic preferences there is none.

## Configuration

The program accepts a configuration file in JSON. Paths are relative to the
configuration file.

```json
{
  "outputSettings": {
    "contestName": "Club president",
    "contestDate": "2026-10-01",
    "outputDirectory": "out"
  },
  "ballotSources": [{ "filePath": "ballots.txt" }],
  "candidates": ["Alice", "Bob", "Chen", "Diego"],
  "methods": ["irv", "borda", "condorcet"]
}
```

- `outputSettings.contestName` (string): the name of the contest.
- `outputSettings.contestDate`, `contestJurisdiction`, `contestOffice`
  (string, optional): copied to the summary.
- `outputSettings.outputDirectory` (string, optional): if set, the summary is
  written to `<outputDirectory>/summary.json`.
- `ballotSources` (array): the ballot files. Their ballots are put together.
- `candidates` (array of strings, optional): the declared candidates.
- `methods` (array of strings, optional): the methods to run. All three by
  default.

The command line flags `--input`, `--candidates`, `--method` and `--out`
take precedence over the configuration file.

## Output

The summary is a JSON document with a `config` section (contest, candidates,
total number of ballots and the SHA-256 digest of the ballots) and a
`results` section with one entry per method:

- `irv`: the `outcome` (`{"winner": ...}` or `{"tie": [...]}`) and the
  `rounds`. Each round lists the `tally` of the running candidates, the
  `counted` and `exhausted` ballots, the `threshold` to reach, and the
  `tallyResults`: who was eliminated and where their ballots went, or who was
  elected.
- `borda`: the `outcome` and the `ranking` of all candidates with their score.
- `condorcet`: the `winner` (or `null`), the number of `victories` of each
  candidate and one entry in `contests` for every pair of candidates.

All the counts, scores and ballot weights of the summary are written as JSON
strings.

With `--reference`, the summary is compared with a previously saved one. The
differences are printed and the program fails if there are any.

 */
