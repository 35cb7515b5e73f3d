use crate::apta::{graphemes, Apta, Response};
use crate::cnf::{dimacs, Clause, Formula, VarPool, VarRole};
use crate::constraints::ConstraintsGraph;
use crate::encoding::{encode, EncodingOptions};
use crate::identify::{identify, IdentifyOptions};
use crate::solver::{solve, Oracle, Solution, SolverError, Verdict};
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A tiny in-process DPLL solver, standing in for the external oracle so the whole
/// pipeline can be exercised without any solver installed.
struct DpllOracle;

impl Oracle for DpllOracle {
    fn solve(&self, cnf: &Path) -> Result<Verdict, SolverError> {
        let text = fs::read_to_string(cnf)?;
        let (num_vars, clauses) = parse_dimacs(&text);
        let mut assignment = vec![None; num_vars + 1];
        if dpll(&clauses, &mut assignment) {
            let model = (1..=num_vars)
                .map(|v| {
                    if assignment[v] == Some(true) {
                        v as i64
                    } else {
                        -(v as i64)
                    }
                })
                .collect();
            Ok(Verdict::Sat(model))
        } else {
            Ok(Verdict::Unsat)
        }
    }
}

fn parse_dimacs(text: &str) -> (usize, Vec<Vec<i64>>) {
    let mut num_vars = 0;
    let mut clauses = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("p cnf") {
            num_vars = rest
                .split_whitespace()
                .next()
                .expect("variable count in preamble")
                .parse()
                .expect("numeric variable count");
            continue;
        }
        let literals: Vec<i64> = line
            .split_whitespace()
            .map(|t| t.parse().expect("numeric literal"))
            .take_while(|&l| l != 0)
            .collect();
        clauses.push(literals);
    }
    (num_vars, clauses)
}

fn dpll(clauses: &[Vec<i64>], assignment: &mut Vec<Option<bool>>) -> bool {
    // unit propagation to fixpoint
    loop {
        let mut changed = false;
        for clause in clauses {
            let mut satisfied = false;
            let mut unassigned = Vec::new();
            for &lit in clause {
                let var = lit.unsigned_abs() as usize;
                match assignment[var] {
                    Some(value) => {
                        if value == (lit > 0) {
                            satisfied = true;
                            break;
                        }
                    }
                    None => unassigned.push(lit),
                }
            }
            if satisfied {
                continue;
            }
            match unassigned.len() {
                0 => return false,
                1 => {
                    let lit = unassigned[0];
                    assignment[lit.unsigned_abs() as usize] = Some(lit > 0);
                    changed = true;
                }
                _ => {}
            }
        }
        if !changed {
            break;
        }
    }
    // branch on the first unassigned literal of an unsatisfied clause
    let branch = clauses.iter().find_map(|clause| {
        let satisfied = clause
            .iter()
            .any(|&lit| assignment[lit.unsigned_abs() as usize] == Some(lit > 0));
        if satisfied {
            None
        } else {
            clause
                .iter()
                .find(|&&lit| assignment[lit.unsigned_abs() as usize].is_none())
                .copied()
        }
    });
    let Some(lit) = branch else {
        return true;
    };
    let var = lit.unsigned_abs() as usize;
    for value in [lit > 0, lit <= 0] {
        let mut trial = assignment.clone();
        trial[var] = Some(value);
        if dpll(clauses, &mut trial) {
            *assignment = trial;
            return true;
        }
    }
    false
}

/// Counts how often an inner oracle is consulted.
struct CountingOracle<'a> {
    inner: &'a dyn Oracle,
    calls: Cell<usize>,
}

impl<'a> CountingOracle<'a> {
    fn new(inner: &'a dyn Oracle) -> Self {
        CountingOracle {
            inner,
            calls: Cell::new(0),
        }
    }
}

impl Oracle for CountingOracle<'_> {
    fn solve(&self, cnf: &Path) -> Result<Verdict, SolverError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.solve(cnf)
    }
}

fn scratch(name: &str) -> PathBuf {
    env::temp_dir().join(format!(
        "dfasat-tests-{name}-{}.cnf",
        rand::random::<u64>()
    ))
}

fn options(name: &str) -> IdentifyOptions {
    IdentifyOptions {
        scratch: scratch(name),
        ..IdentifyOptions::default()
    }
}

fn apta_of(accepted: &[&str], rejected: &[&str]) -> Apta<Rc<str>> {
    let mut apta = Apta::new();
    for word in accepted {
        apta.accept_graphemes(word);
    }
    for word in rejected {
        apta.reject_graphemes(word);
    }
    apta
}

#[test]
fn empty_prefix_labels_only_the_root() {
    let apta = apta_of(&[""], &[]);
    assert_eq!(apta.len(), 1);
    assert_eq!(apta.response(apta.root()), Response::Accept);
    assert_eq!(apta.parse_graphemes(""), Response::Accept);
    assert_eq!(apta.parse_graphemes("a"), Response::Unknown);
}

#[test]
fn toy_grammar_is_identified() {
    let accepted = ["ciao", "ci", "ca", ""];
    let rejected = ["ciar"];
    let apta = apta_of(&accepted, &rejected);

    let identification = identify(&apta, &DpllOracle, &options("toy")).unwrap();
    let dfa = &identification.dfa;
    assert!(dfa.len() <= 5, "expected at most 5 states, got {}", dfa.len());

    for word in accepted {
        assert_eq!(dfa.parse_graphemes(word, true), Ok(true), "accepting {word:?}");
    }
    for word in rejected {
        assert_eq!(dfa.parse_graphemes(word, true), Ok(false), "rejecting {word:?}");
    }

    // "ciax" falls off the automaton: error under strict, plain rejection otherwise
    assert!(dfa.parse_graphemes("ciax", true).is_err());
    assert_eq!(dfa.parse_graphemes("ciax", false), Ok(false));

    // strict parsing of an entirely foreign word behaves the same way
    assert!(dfa.parse_graphemes("qqq", true).is_err());
    assert_eq!(dfa.parse_graphemes("qqq", false), Ok(false));
}

#[test]
fn opposite_labels_rule_out_one_state() {
    let apta = apta_of(&["a"], &["b"]);
    let graph = ConstraintsGraph::from_apta(&apta);
    let a = apta.follow(apta.root(), &Rc::from("a")).unwrap();
    let b = apta.follow(apta.root(), &Rc::from("b")).unwrap();
    assert!(graph.adjacent(a, b));

    let identification = identify(&apta, &DpllOracle, &options("conflict")).unwrap();
    assert!(identification.lower_bound >= 2);
    assert_eq!(identification.attempts[0].colors, identification.lower_bound);
    assert_eq!(identification.colors, 2);
}

#[test]
fn relabeling_a_trace_overwrites_its_response() {
    // accept("a") then reject("a") end on the same prefix-tree node; the last call wins
    let mut apta = Apta::new();
    apta.accept_graphemes("a");
    apta.reject_graphemes("a");
    assert_eq!(apta.parse_graphemes("a"), Response::Reject);
    let identification = identify(&apta, &DpllOracle, &options("relabel")).unwrap();
    assert_eq!(identification.dfa.parse_graphemes("a", true), Ok(false));
}

#[test]
fn search_starts_at_the_clique_bound() {
    // length mod 3: the chain APTA has a rejecting 2-clique and an accepting singleton,
    // and a 3-state cycle is consistent
    let apta = apta_of(&["", "aaa"], &["a", "aa"]);
    let graph = ConstraintsGraph::from_apta(&apta);
    assert_eq!(graph.clique().len(), 3);

    let dpll = DpllOracle;
    let counting = CountingOracle::new(&dpll);
    let identification = identify(&apta, &counting, &options("bound")).unwrap();
    assert_eq!(identification.lower_bound, 3);
    assert_eq!(identification.colors, 3);
    assert_eq!(counting.calls.get(), 1, "no SAT call below the clique bound");
    assert_eq!(identification.attempts.len(), 1);
    assert_eq!(identification.attempts[0].colors, 3);
}

#[test]
fn a_satisfiable_color_count_stays_satisfiable_with_one_more() {
    let apta = apta_of(&["ciao", "ci", "ca", ""], &["ciar"]);
    let graph = ConstraintsGraph::from_apta(&apta);
    let clique = graph.clique();
    let identification = identify(&apta, &DpllOracle, &options("monotone")).unwrap();

    let next = encode(
        &apta,
        &graph,
        &clique,
        identification.colors + 1,
        &EncodingOptions::default(),
    )
    .unwrap();
    let solution = solve(next.formula(), &scratch("monotone-next"), &DpllOracle).unwrap();
    assert!(matches!(solution, Solution::Sat(_)));
}

#[test]
fn minimal_encoding_identifies_the_same_language() {
    let accepted = ["ciao", "ci", "ca", ""];
    let rejected = ["ciar"];
    let apta = apta_of(&accepted, &rejected);
    let mut opts = options("minimal");
    opts.encoding = EncodingOptions { minimal: true };
    let identification = identify(&apta, &DpllOracle, &opts).unwrap();
    for word in accepted {
        assert_eq!(identification.dfa.parse_graphemes(word, true), Ok(true));
    }
    for word in rejected {
        assert_eq!(identification.dfa.parse_graphemes(word, true), Ok(false));
    }
}

#[test]
fn dimacs_preamble_and_terminators_are_stable() {
    // 8 variables spread over 4 clauses
    let mut pool: VarPool<Rc<str>> = VarPool::new();
    let vars: Vec<_> = (0..8)
        .map(|color| pool.intern(VarRole::AcceptingColor { color }))
        .collect();
    let mut formula = Formula::new();
    for pair in vars.chunks(2) {
        formula.push(
            Clause::new()
                .positive(pair[0].clone())
                .negative(pair[1].clone()),
        );
    }

    let path = scratch("stability");
    let map = dimacs::save(&formula, &path).unwrap();
    let text = fs::read_to_string(&path).unwrap();

    assert!(text.lines().any(|l| l == "p cnf 8 4"));
    let clause_lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.starts_with('c') && !l.starts_with('p'))
        .collect();
    assert_eq!(clause_lines.len(), 4);
    for line in &clause_lines {
        assert!(line.ends_with(" 0"), "clause line {line:?} not 0-terminated");
    }

    // reading the ids back restores the original variable set
    let mut restored = HashSet::new();
    for line in clause_lines {
        for token in line.split_whitespace() {
            let literal: i64 = token.parse().unwrap();
            if literal != 0 {
                let var = map.variable(literal.unsigned_abs() as usize).unwrap();
                restored.insert(var.name().to_string());
            }
        }
    }
    let original: HashSet<String> = vars.iter().map(|v| v.name().to_string()).collect();
    assert_eq!(restored, original);
}

#[test]
fn identification_rejects_an_empty_sample() {
    let apta: Apta<Rc<str>> = Apta::new();
    let err = identify(&apta, &DpllOracle, &options("empty")).unwrap_err();
    assert!(matches!(
        err,
        crate::identify::IdentifyError::EmptySample
    ));
}

fn word_strategy(max_len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!['a', 'b', 'c']), 0..=max_len)
        .prop_map(|chars| chars.into_iter().collect())
}

prop_compose! {
    /// A consistent training sample: each distinct word carries one label (the last
    /// generated one, mirroring the APTA's last-write-wins response).
    fn sample(max_words: usize, max_len: usize)
        (words in prop::collection::vec((word_strategy(max_len), any::<bool>()), 1..=max_words))
    -> Vec<(String, bool)> {
        let mut labeled: HashMap<String, bool> = HashMap::new();
        for (word, accept) in words {
            labeled.insert(word, accept);
        }
        labeled.into_iter().collect()
    }
}

fn build_apta(sample: &[(String, bool)]) -> Apta<Rc<str>> {
    let mut apta = Apta::new();
    for (word, accept) in sample {
        if *accept {
            apta.accept_graphemes(word);
        } else {
            apta.reject_graphemes(word);
        }
    }
    apta
}

proptest! {
    /// Inserting the same trace twice leaves the tree exactly as inserting it once.
    #[test]
    fn apta_insertion_is_idempotent(sample in sample(6, 5)) {
        let mut once = Apta::new();
        let mut twice = Apta::new();
        for (word, accept) in &sample {
            let labels = graphemes(word);
            let response = if *accept { Response::Accept } else { Response::Reject };
            once.insert(&labels, response);
            twice.insert(&labels, response);
            twice.insert(&labels, response);
        }
        prop_assert_eq!(once, twice);
    }

    /// Whatever was inserted last for a trace is what parsing reports.
    #[test]
    fn apta_parse_is_consistent_with_insertion(sample in sample(6, 5)) {
        let apta = build_apta(&sample);
        for (word, accept) in &sample {
            let expected = if *accept { Response::Accept } else { Response::Reject };
            prop_assert_eq!(apta.parse_graphemes(word), expected);
        }
    }

    /// Every accepting/rejecting pair of APTA nodes is an edge of the constraints graph.
    #[test]
    fn constraints_cover_all_direct_conflicts(sample in sample(6, 4)) {
        let apta = build_apta(&sample);
        let graph = ConstraintsGraph::from_apta(&apta);
        let accepting = graph.of_response(Response::Accept);
        let rejecting = graph.of_response(Response::Reject);
        for &u in &accepting {
            for &v in &rejecting {
                prop_assert!(graph.adjacent(u, v), "missing direct conflict ({u},{v})");
            }
        }
    }

    /// Pairs that pass the mergeability test never carry an edge.
    #[test]
    fn constraints_spare_mergeable_pairs(sample in sample(6, 4)) {
        let apta = build_apta(&sample);
        let graph = ConstraintsGraph::from_apta(&apta);
        for u in 0..graph.len() {
            for v in u + 1..graph.len() {
                if graph.mergeable(&apta, u, v) {
                    prop_assert!(!graph.adjacent(u, v), "mergeable pair ({u},{v}) has an edge");
                }
            }
        }
    }

    /// The returned clique is pairwise adjacent.
    #[test]
    fn clique_members_are_pairwise_adjacent(sample in sample(6, 4)) {
        let apta = build_apta(&sample);
        let graph = ConstraintsGraph::from_apta(&apta);
        let clique = graph.clique();
        for (i, &u) in clique.iter().enumerate() {
            for &v in &clique[i + 1..] {
                prop_assert!(graph.adjacent(u, v));
            }
        }
    }

    /// Saving any formula and reading the id maps back restores the variable set.
    #[test]
    fn dimacs_round_trips_the_variable_set(
        colors in prop::collection::hash_set(0usize..32, 1..10)
    ) {
        let mut pool: VarPool<Rc<str>> = VarPool::new();
        let vars: Vec<_> = colors
            .into_iter()
            .map(|color| pool.intern(VarRole::AcceptingColor { color }))
            .collect();
        let mut formula = Formula::new();
        for (i, var) in vars.iter().enumerate() {
            let mut clause = Clause::new();
            if i % 2 == 0 {
                clause.push_positive(var.clone());
            } else {
                clause.push_negative(var.clone());
            }
            formula.push(clause);
        }

        let path = scratch("roundtrip");
        let map = dimacs::save(&formula, &path).unwrap();
        prop_assert_eq!(map.len(), vars.len());
        for var in &vars {
            let id = map.id_of(var).expect("emitted variable has an id");
            let back = map.variable(id).expect("id maps back");
            prop_assert_eq!(back.name(), var.name());
        }
        fs::remove_file(&path).ok();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// The learned DFA reproduces every training label under strict parsing.
    #[test]
    fn identification_is_sound_on_the_training_sample(sample in sample(4, 3)) {
        let apta = build_apta(&sample);
        let identification = identify(&apta, &DpllOracle, &options("sound")).unwrap();
        for (word, accept) in &sample {
            let parsed = identification.dfa.parse_graphemes(word, true);
            prop_assert_eq!(parsed, Ok(*accept), "word {:?}", word);
        }
    }
}
