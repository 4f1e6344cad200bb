//! Nondeterministic finite transducers: level-tagged automata where each
//! transition is one step on the tape selected by its source state's level.

pub mod builder;
pub mod compose;
pub mod strings;

use crate::alphabet::{Symbol, DONT_CARE, EPSILON};
use crate::errors::{AutomataError, Result};
use crate::nfa::{self, Delta, Nfa, State, Word};
use crate::sparse_set::SparseSet;

pub use compose::compose;

/// Tape index a state is about to read, in `[0, num_of_levels)`.
pub type Level = usize;

/// Transducers default to one input and one output tape.
pub const DEFAULT_NUM_OF_LEVELS: usize = 2;

/// A transducer over `num_of_levels` tapes.
///
/// Level coherence is the structural invariant: a proper transition
/// `(s, a, t)` has `levels[t] = (levels[s] + 1) % num_of_levels`. An epsilon
/// transition either keeps the level (a silent jump) or advances it by one
/// (an empty tape slot), and a [`DONT_CARE`] transition follows the same
/// rule (a same-level wildcard loop spans one full cycle). Builders preserve
/// the invariant; [`Nft::validate_levels`] checks a finished build rather
/// than every intermediate insert.
#[derive(Debug, Clone)]
pub struct Nft {
    pub delta: Delta,
    pub initial: SparseSet,
    pub accepts: SparseSet,
    pub levels: Vec<Level>,
    pub num_of_levels: usize,
}

impl Default for Nft {
    fn default() -> Self {
        Self {
            delta: Delta::new(),
            initial: SparseSet::new(),
            accepts: SparseSet::new(),
            levels: Vec::new(),
            num_of_levels: DEFAULT_NUM_OF_LEVELS,
        }
    }
}

impl Nft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_num_of_levels(num_of_levels: usize) -> Result<Self> {
        if num_of_levels == 0 {
            return Err(AutomataError::InvalidArgument(
                "a transducer needs at least one level".to_owned(),
            ));
        }
        Ok(Self { num_of_levels, ..Self::default() })
    }

    pub fn num_of_states(&self) -> usize {
        let initial_bound = self.initial.max().map_or(0, |state| state + 1);
        let accepts_bound = self.accepts.max().map_or(0, |state| state + 1);
        self.delta
            .num_of_states()
            .max(self.levels.len())
            .max(initial_bound)
            .max(accepts_bound)
    }

    pub fn num_of_transitions(&self) -> usize {
        self.delta.num_of_transitions()
    }

    /// Grows the state universe (levels default to 0) so `state` exists.
    pub(crate) fn ensure_state(&mut self, state: State) {
        if self.levels.len() <= state {
            self.levels.resize(state + 1, 0);
        }
        self.delta.mutable_state_post(state);
    }

    /// Appends a fresh level-0 state.
    pub fn add_state(&mut self) -> State {
        let state = self.num_of_states();
        self.ensure_state(state);
        state
    }

    /// Appends a fresh state with the given level.
    pub fn add_state_with_level(&mut self, level: Level) -> Result<State> {
        self.check_level(level)?;
        let state = self.add_state();
        self.levels[state] = level;
        Ok(state)
    }

    pub fn level_of(&self, state: State) -> Level {
        self.levels.get(state).copied().unwrap_or(0)
    }

    pub fn set_level(&mut self, state: State, level: Level) -> Result<()> {
        self.check_level(level)?;
        self.ensure_state(state);
        self.levels[state] = level;
        Ok(())
    }

    fn check_level(&self, level: Level) -> Result<()> {
        if level >= self.num_of_levels {
            return Err(AutomataError::InvalidArgument(format!(
                "level {level} is outside [0, {})",
                self.num_of_levels
            )));
        }
        Ok(())
    }

    /// Same determinism notion as for automata; epsilon counts as a symbol.
    pub fn is_deterministic(&self) -> bool {
        self.initial.len() == 1 && self.delta.has_deterministic_posts()
    }

    /// One synchronized step across all tapes: `symbols[i]` is consumed on
    /// tape `i`. Returns the state completing the cycle.
    pub fn add_transition(&mut self, from: State, symbols: &[Symbol]) -> Result<State> {
        if symbols.len() != self.num_of_levels {
            return Err(AutomataError::InvalidArgument(format!(
                "expected one symbol per level, got {} for {} levels",
                symbols.len(),
                self.num_of_levels
            )));
        }
        self.insert_word(from, symbols)
    }

    /// Inserts a chain consuming `word` symbol by symbol, cycling levels from
    /// `from`'s level; returns the trailing state.
    pub fn insert_word(&mut self, from: State, word: &[Symbol]) -> Result<State> {
        self.insert_word_internal(from, word, None)
    }

    /// Like [`Nft::insert_word`] but the chain ends in `to`, whose level must
    /// match the cycle.
    pub fn insert_word_to(&mut self, from: State, word: &[Symbol], to: State) -> Result<()> {
        self.insert_word_internal(from, word, Some(to)).map(|_| ())
    }

    fn insert_word_internal(
        &mut self,
        from: State,
        word: &[Symbol],
        to: Option<State>,
    ) -> Result<State> {
        if word.is_empty() {
            return match to {
                None => Ok(from),
                Some(_) => Err(AutomataError::InvalidArgument(
                    "cannot connect states with an empty word".to_owned(),
                )),
            };
        }
        self.ensure_state(from);
        let mut level = self.level_of(from);
        let mut current = from;
        for (position, &symbol) in word.iter().enumerate() {
            let next_level = (level + 1) % self.num_of_levels;
            let next = if position + 1 == word.len() {
                match to {
                    Some(target) => {
                        if self.level_of(target) != next_level {
                            return Err(AutomataError::LevelMismatch(format!(
                                "word of length {} ends on level {next_level}, target state {target} has level {}",
                                word.len(),
                                self.level_of(target)
                            )));
                        }
                        target
                    }
                    None => self.add_state_with_level(next_level)?,
                }
            } else {
                self.add_state_with_level(next_level)?
            };
            self.delta.add(current, symbol, next);
            current = next;
            level = next_level;
        }
        Ok(current)
    }

    /// Inserts one sub-word per tape, interleaved position by position;
    /// missing positions are filled with [`EPSILON`]. Returns the trailing
    /// state.
    pub fn insert_word_by_parts(&mut self, from: State, parts: &[Word]) -> Result<State> {
        let word = self.interleave_parts(from, parts)?;
        self.insert_word_internal(from, &word, None)
    }

    /// Like [`Nft::insert_word_by_parts`] with an explicit chain target.
    pub fn insert_word_by_parts_to(
        &mut self,
        from: State,
        parts: &[Word],
        to: State,
    ) -> Result<()> {
        let word = self.interleave_parts(from, parts)?;
        self.insert_word_internal(from, &word, Some(to)).map(|_| ())
    }

    fn interleave_parts(&self, from: State, parts: &[Word]) -> Result<Word> {
        if parts.len() != self.num_of_levels {
            return Err(AutomataError::InvalidArgument(format!(
                "expected {} word parts, got {}",
                self.num_of_levels,
                parts.len()
            )));
        }
        let rounds = parts.iter().map(Vec::len).max().unwrap_or(0);
        let from_level = self.level_of(from);
        let mut word = Vec::with_capacity(rounds * self.num_of_levels);
        for position in from_level..rounds * self.num_of_levels {
            let tape = position % self.num_of_levels;
            let round = position / self.num_of_levels;
            word.push(parts[tape].get(round).copied().unwrap_or(EPSILON));
        }
        Ok(word)
    }

    /// Adds, for every symbol, a self-loop chain at `state` consuming that
    /// symbol on every tape.
    pub fn insert_identity(&mut self, state: State, symbols: &[Symbol]) -> Result<()> {
        self.ensure_state(state);
        for &symbol in symbols {
            let cycle = vec![symbol; self.num_of_levels];
            self.insert_word_to(state, &cycle, state)?;
        }
        Ok(())
    }

    /// Checks level coherence over the whole transducer: initial states on
    /// level 0, proper transitions advancing by exactly one, epsilon and
    /// wildcard transitions keeping or advancing the level.
    pub fn validate_levels(&self) -> Result<()> {
        for state in self.initial.iter() {
            if self.level_of(state) != 0 {
                return Err(AutomataError::LevelMismatch(format!(
                    "initial state {state} has level {}",
                    self.level_of(state)
                )));
            }
        }
        for transition in self.delta.transitions() {
            let source_level = self.level_of(transition.source);
            let target_level = self.level_of(transition.target);
            let advanced = target_level == (source_level + 1) % self.num_of_levels;
            let coherent = if transition.symbol == EPSILON || transition.symbol == DONT_CARE {
                advanced || target_level == source_level
            } else {
                advanced
            };
            if !coherent {
                return Err(AutomataError::LevelMismatch(format!(
                    "transition ({}, {}, {}) connects level {source_level} to level {target_level}",
                    transition.source, transition.symbol, transition.target
                )));
            }
        }
        Ok(())
    }

    /// Collapses the transducer into an automaton recognising the language of
    /// tape `level`: transitions of the other tapes become epsilons, which are
    /// then removed, and the result is trimmed.
    pub fn project_to(&self, level: Level) -> Result<Nfa> {
        self.check_level(level)?;
        let mut tape_view = Nfa::with_num_of_states(self.num_of_states());
        tape_view.initial = self.initial.clone();
        tape_view.accepts = self.accepts.clone();
        for transition in self.delta.transitions() {
            let symbol = if self.level_of(transition.source) == level {
                transition.symbol
            } else {
                EPSILON
            };
            tape_view.delta.add(transition.source, symbol, transition.target);
        }
        let mut projected = nfa::remove_epsilon(&tape_view);
        projected.trim();
        Ok(projected)
    }

    /// Restricts the output tape to `L(lang)`: the composition
    /// `self ∘ Id(lang)`, usable for pre-image computation through
    /// [`Nft::project_to`].
    pub fn apply_backward(&self, lang: &Nfa) -> Result<Nft> {
        let identity = builder::create_from_nfa(lang, self.num_of_levels, None, &[EPSILON])?;
        compose::compose(self, &identity)
    }

    /// Forward image of a single input word: the language of the output tape
    /// once the input tape is fixed to `word`.
    pub fn apply(&self, word: &[Symbol]) -> Result<Nfa> {
        let word_nfa = nfa::builder::create_single_word_nfa(word);
        let identity = builder::create_from_nfa(&word_nfa, self.num_of_levels, None, &[])?;
        let composed = compose::compose(&identity, self)?;
        composed.project_to(1)
    }

    /// Keeps only states on accepting runs, renumbering and carrying levels
    /// along.
    pub fn trim(&mut self) {
        let mut view = Nfa::from_parts(
            self.delta.clone(),
            self.initial.clone(),
            self.accepts.clone(),
        );
        let renaming = view.trim_with_state_map();
        let mut levels = vec![0; renaming.len()];
        for (&old, &new) in &renaming {
            levels[new] = self.level_of(old);
        }
        self.delta = view.delta;
        self.initial = view.initial;
        self.accepts = view.accepts;
        self.levels = levels;
    }

    /// Drops the level structure, keeping the plain transition graph.
    pub fn into_nfa(self) -> Nfa {
        Nfa::from_parts(self.delta, self.initial, self.accepts)
    }
}
