//! Text representations: the explicit mata sections for persisting automata
//! and transducers, and DOT export for visualisation.
//!
//! Only the explicit section shape is handled here; richer file grammars stay
//! with external front-ends. Parsing consumes strings and performs no I/O.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::alphabet::{Alphabet, Symbol, EPSILON};
use crate::errors::{AutomataError, Result};
use crate::nfa::{Nfa, State};
use crate::nft::Nft;

const NFA_SECTION: &str = "@NFA-explicit";
const NFT_SECTION: &str = "@NFT-explicit";

impl Nfa {
    /// Serialises the automaton as an `@NFA-explicit` section. States print
    /// as `qN`, symbols as their decimal names, so an [`crate::alphabet::IntAlphabet`]
    /// round-trips symbol values exactly.
    pub fn print_to_mata(&self) -> String {
        let mut out = String::new();
        out.push_str(NFA_SECTION);
        out.push('\n');
        out.push_str("%Alphabet-auto\n");
        print_indicator(&mut out, "%Initial", self.initial.iter());
        print_indicator(&mut out, "%Final", self.accepts.iter());
        for transition in self.delta.transitions() {
            let _ = writeln!(
                out,
                "q{} {} q{}",
                transition.source, transition.symbol, transition.target
            );
        }
        out
    }

    /// Renders the automaton as a DOT digraph. Symbol labels come from
    /// `alphabet` when it knows a name, with decimal fallback and `ε` for the
    /// epsilon symbol; the output is valid DOT for any symbol values.
    pub fn print_to_dot(&self, alphabet: Option<&dyn Alphabet>) -> String {
        print_dot(
            &self.delta.transitions().collect::<Vec<_>>(),
            self.initial.iter().collect(),
            self.accepts.iter().collect(),
            |state| format!("q{state}"),
            alphabet,
        )
    }
}

impl Nft {
    /// Serialises the transducer as an `@NFT-explicit` section with
    /// `%LevelsNum` and `%Levels` annotations.
    pub fn print_to_mata(&self) -> String {
        let mut out = String::new();
        out.push_str(NFT_SECTION);
        out.push('\n');
        out.push_str("%Alphabet-auto\n");
        let _ = writeln!(out, "%LevelsNum {}", self.num_of_levels);
        let mut levels_line = String::from("%Levels");
        for state in 0..self.num_of_states() {
            let _ = write!(levels_line, " q{state}:{}", self.level_of(state));
        }
        out.push_str(&levels_line);
        out.push('\n');
        print_indicator(&mut out, "%Initial", self.initial.iter());
        print_indicator(&mut out, "%Final", self.accepts.iter());
        for transition in self.delta.transitions() {
            let _ = writeln!(
                out,
                "q{} {} q{}",
                transition.source, transition.symbol, transition.target
            );
        }
        out
    }

    /// DOT digraph with `state/level` node labels.
    pub fn print_to_dot(&self, alphabet: Option<&dyn Alphabet>) -> String {
        print_dot(
            &self.delta.transitions().collect::<Vec<_>>(),
            self.initial.iter().collect(),
            self.accepts.iter().collect(),
            |state| format!("q{state}/{}", self.level_of(state)),
            alphabet,
        )
    }
}

fn print_indicator(out: &mut String, key: &str, states: impl Iterator<Item = State>) {
    out.push_str(key);
    for state in states {
        let _ = write!(out, " q{state}");
    }
    out.push('\n');
}

fn print_dot(
    transitions: &[crate::nfa::Transition],
    initial: Vec<State>,
    accepts: Vec<State>,
    node_label: impl Fn(State) -> String,
    alphabet: Option<&dyn Alphabet>,
) -> String {
    let symbol_label = |symbol: Symbol| -> String {
        if symbol == EPSILON {
            return "ε".to_owned();
        }
        alphabet
            .and_then(|alphabet| alphabet.name_of(symbol))
            .unwrap_or_else(|| symbol.to_string())
            .replace('"', "\\\"")
    };

    let mut out = String::from("digraph finiteAutomaton {\n");
    out.push_str("rankdir=LR;\n");
    out.push_str("node [shape=circle];\n");
    for &state in &accepts {
        let _ = writeln!(out, "\"{}\" [shape=doublecircle];", node_label(state));
    }
    for (index, &state) in initial.iter().enumerate() {
        let _ = writeln!(out, "\"i{index}\" [shape=point];");
        let _ = writeln!(out, "\"i{index}\" -> \"{}\";", node_label(state));
    }
    for transition in transitions {
        let _ = writeln!(
            out,
            "\"{}\" -> \"{}\" [label=\"{}\"];",
            node_label(transition.source),
            node_label(transition.target),
            symbol_label(transition.symbol)
        );
    }
    out.push_str("}\n");
    out
}

/// Line-level shape shared by both explicit sections.
struct Section<'a> {
    initial: Vec<&'a str>,
    accepting: Vec<&'a str>,
    levels_num: Vec<&'a str>,
    levels: Vec<&'a str>,
    body: Vec<Vec<&'a str>>,
}

fn parse_section<'a>(input: &'a str, expected_type: &str) -> Result<Section<'a>> {
    let mut lines = input.lines().map(str::trim).filter(|line| !line.is_empty());
    match lines.next() {
        Some(header) if header == expected_type => {}
        Some(header) => {
            return Err(AutomataError::InvalidArgument(format!(
                "expected section '{expected_type}', got '{header}'"
            )));
        }
        None => {
            return Err(AutomataError::InvalidArgument(format!(
                "empty input, expected a '{expected_type}' section"
            )));
        }
    }

    let mut section = Section {
        initial: Vec::new(),
        accepting: Vec::new(),
        levels_num: Vec::new(),
        levels: Vec::new(),
        body: Vec::new(),
    };
    for line in lines {
        let mut tokens = line.split_whitespace();
        let first = tokens.next().expect("non-empty line");
        match first {
            "%Alphabet-auto" => {}
            "%Initial" => section.initial.extend(tokens),
            "%Final" => section.accepting.extend(tokens),
            "%LevelsNum" => section.levels_num.extend(tokens),
            "%Levels" => section.levels.extend(tokens),
            key if key.starts_with('%') || key.starts_with('@') => {
                return Err(AutomataError::InvalidArgument(format!(
                    "unexpected section key '{key}'"
                )));
            }
            _ => {
                let tokens: Vec<&str> = line.split_whitespace().collect();
                if tokens.len() == 2 {
                    return Err(AutomataError::Unsupported(format!(
                        "epsilon transitions are not supported in the text format: '{line}'"
                    )));
                }
                if tokens.len() != 3 {
                    return Err(AutomataError::InvalidArgument(format!(
                        "invalid transition line: '{line}'"
                    )));
                }
                section.body.push(tokens);
            }
        }
    }
    Ok(section)
}

fn state_for<'a>(
    names: &mut HashMap<&'a str, State>,
    next: &mut State,
    name: &'a str,
) -> State {
    if let Some(&state) = names.get(name) {
        return state;
    }
    let state = *next;
    names.insert(name, state);
    *next += 1;
    state
}

/// Parses an `@NFA-explicit` section. Symbol names are resolved through
/// `alphabet` (registering unknown names where the alphabet allows it).
pub fn parse_from_mata(input: &str, alphabet: &mut dyn Alphabet) -> Result<Nfa> {
    let section = parse_section(input, NFA_SECTION)?;
    let mut names: HashMap<&str, State> = HashMap::new();
    let mut next: State = 0;
    let mut nfa = Nfa::new();

    for name in &section.initial {
        let state = state_for(&mut names, &mut next, name);
        nfa.initial.insert(state);
    }
    for name in &section.accepting {
        let state = state_for(&mut names, &mut next, name);
        nfa.accepts.insert(state);
    }
    for tokens in &section.body {
        let source = state_for(&mut names, &mut next, tokens[0]);
        let symbol = alphabet.register(tokens[1])?;
        let target = state_for(&mut names, &mut next, tokens[2]);
        nfa.delta.add(source, symbol, target);
    }
    Ok(nfa)
}

/// Parses an `@NFT-explicit` section, including the `%LevelsNum` and
/// `%Levels` annotations.
pub fn parse_nft_from_mata(input: &str, alphabet: &mut dyn Alphabet) -> Result<Nft> {
    let section = parse_section(input, NFT_SECTION)?;

    let num_of_levels = match section.levels_num.as_slice() {
        [] => return Err(AutomataError::InvalidArgument("%LevelsNum has to be specified".to_owned())),
        [value] => value.parse::<usize>().map_err(|_| {
            AutomataError::InvalidArgument(format!("bad level count '{value}'"))
        })?,
        _ => {
            return Err(AutomataError::InvalidArgument(
                "only one %LevelsNum value can be specified".to_owned(),
            ));
        }
    };

    let mut names: HashMap<&str, State> = HashMap::new();
    let mut next: State = 0;
    let mut nft = Nft::with_num_of_levels(num_of_levels)?;

    for name in &section.initial {
        let state = state_for(&mut names, &mut next, name);
        nft.initial.insert(state);
    }
    for name in &section.accepting {
        let state = state_for(&mut names, &mut next, name);
        nft.accepts.insert(state);
    }
    for entry in &section.levels {
        let mut parts = entry.split(':');
        let (name, level) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(level), None) => (name, level),
            _ => {
                return Err(AutomataError::InvalidArgument(format!(
                    "bad format of levels: '{entry}'"
                )));
            }
        };
        let level = level.parse::<usize>().map_err(|_| {
            AutomataError::InvalidArgument(format!("bad format of levels: level '{level}'"))
        })?;
        let state = state_for(&mut names, &mut next, name);
        nft.set_level(state, level)?;
    }
    for tokens in &section.body {
        let source = state_for(&mut names, &mut next, tokens[0]);
        let symbol = alphabet.register(tokens[1])?;
        let target = state_for(&mut names, &mut next, tokens[2]);
        nft.ensure_state(source.max(target));
        nft.delta.add(source, symbol, target);
    }
    Ok(nft)
}
