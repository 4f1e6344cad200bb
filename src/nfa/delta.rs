use crate::alphabet::{Alphabet, Symbol};
use crate::errors::{AutomataError, Result};
use crate::ord_vector::OrdVector;

use super::State;

/// A pair of a symbol and a target, one element of a flattened move listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub symbol: Symbol,
    pub target: State,
}

/// A fully qualified transition `(source, symbol, target)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Transition {
    pub source: State,
    pub symbol: Symbol,
    pub target: State,
}

impl Transition {
    pub fn new(source: State, symbol: Symbol, target: State) -> Self {
        Self { source, symbol, target }
    }
}

/// The targets reachable from some source under one symbol.
///
/// Invariant: `targets` is strictly ordered and never empty while the post is
/// stored in a [`StatePost`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolPost {
    pub symbol: Symbol,
    pub targets: OrdVector<State>,
}

impl SymbolPost {
    pub fn new(symbol: Symbol, targets: OrdVector<State>) -> Self {
        Self { symbol, targets }
    }
}

/// The symbol-sorted outgoing posts of a single state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatePost {
    posts: Vec<SymbolPost>,
}

/// Shared read-only view for sources beyond the allocated storage.
static EMPTY_STATE_POST: StatePost = StatePost { posts: Vec::new() };

impl StatePost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Number of symbol posts (distinct outgoing symbols).
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    /// Number of moves, i.e. the sum of all target-set sizes.
    pub fn num_of_moves(&self) -> usize {
        self.posts.iter().map(|post| post.targets.len()).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SymbolPost> {
        self.posts.iter()
    }

    pub fn find(&self, symbol: Symbol) -> Option<&SymbolPost> {
        self.posts
            .binary_search_by_key(&symbol, |post| post.symbol)
            .ok()
            .map(|index| &self.posts[index])
    }

    pub fn find_mut(&mut self, symbol: Symbol) -> Option<&mut SymbolPost> {
        self.posts
            .binary_search_by_key(&symbol, |post| post.symbol)
            .ok()
            .map(|index| &mut self.posts[index])
    }

    pub fn clear(&mut self) {
        self.posts.clear();
    }

    /// All moves, in ascending `(symbol, target)` order.
    pub fn moves(&self) -> Moves<'_> {
        Moves::over(&self.posts)
    }

    /// Moves on symbols `>= first_epsilon`: the epsilon moves, plus any
    /// high symbols a caller chooses to treat as epsilons.
    pub fn moves_epsilons(&self, first_epsilon: Symbol) -> Moves<'_> {
        let start = self.posts.partition_point(|post| post.symbol < first_epsilon);
        Moves::over(&self.posts[start..])
    }

    /// Moves on proper symbols `< first_epsilon`.
    pub fn moves_symbols(&self, first_epsilon: Symbol) -> Moves<'_> {
        let end = self.posts.partition_point(|post| post.symbol < first_epsilon);
        Moves::over(&self.posts[..end])
    }

    fn add(&mut self, symbol: Symbol, target: State) -> bool {
        match self.posts.binary_search_by_key(&symbol, |post| post.symbol) {
            Ok(index) => self.posts[index].targets.insert(target),
            Err(index) => {
                let mut targets = OrdVector::new();
                targets.insert(target);
                self.posts.insert(index, SymbolPost::new(symbol, targets));
                true
            }
        }
    }

    fn add_targets(&mut self, symbol: Symbol, targets: &OrdVector<State>) {
        if targets.is_empty() {
            return;
        }
        match self.posts.binary_search_by_key(&symbol, |post| post.symbol) {
            Ok(index) => {
                let merged = self.posts[index].targets.union(targets);
                self.posts[index].targets = merged;
            }
            Err(index) => {
                self.posts.insert(index, SymbolPost::new(symbol, targets.clone()));
            }
        }
    }

    fn remove_post(&mut self, symbol: Symbol) {
        if let Ok(index) = self.posts.binary_search_by_key(&symbol, |post| post.symbol) {
            self.posts.remove(index);
        }
    }
}

impl<'a> IntoIterator for &'a StatePost {
    type Item = &'a SymbolPost;
    type IntoIter = std::slice::Iter<'a, SymbolPost>;

    fn into_iter(self) -> Self::IntoIter {
        self.posts.iter()
    }
}

/// Iterator flattening a slice of symbol posts into moves.
#[derive(Debug, Clone)]
pub struct Moves<'a> {
    posts: &'a [SymbolPost],
    post_index: usize,
    target_index: usize,
}

impl<'a> Moves<'a> {
    fn over(posts: &'a [SymbolPost]) -> Self {
        Self { posts, post_index: 0, target_index: 0 }
    }
}

impl Iterator for Moves<'_> {
    type Item = Move;

    fn next(&mut self) -> Option<Move> {
        while let Some(post) = self.posts.get(self.post_index) {
            if let Some(&target) = post.targets.as_slice().get(self.target_index) {
                self.target_index += 1;
                return Some(Move { symbol: post.symbol, target });
            }
            self.post_index += 1;
            self.target_index = 0;
        }
        None
    }
}

/// The transition relation: a vector of state posts indexed by source state.
///
/// A target may exceed the allocated vector; the storage only grows through
/// [`Delta::mutable_state_post`], while [`Delta::state_post`] hands out a
/// shared empty view for out-of-range sources. [`Delta::num_of_states`]
/// accounts for both the storage and the largest target ever inserted.
#[derive(Debug, Clone, Default)]
pub struct Delta {
    state_posts: Vec<StatePost>,
    max_target: Option<State>,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `target` has been inserted as a transition target,
    /// extending [`Delta::num_of_states`]'s accounting if needed.
    fn note_target(&mut self, target: State) {
        self.max_target = Some(self.max_target.map_or(target, |current| current.max(target)));
    }

    /// Read-only view of the outgoing posts of `state`; never extends the
    /// backing storage.
    pub fn state_post(&self, state: State) -> &StatePost {
        self.state_posts.get(state).unwrap_or(&EMPTY_STATE_POST)
    }

    /// Mutable view of the outgoing posts of `state`, lazily materialising
    /// empty posts up to `state`.
    pub fn mutable_state_post(&mut self, state: State) -> &mut StatePost {
        if self.state_posts.len() <= state {
            self.state_posts.resize_with(state + 1, StatePost::new);
        }
        &mut self.state_posts[state]
    }

    /// Inserts the transition `(source, symbol, target)`. Idempotent.
    pub fn add(&mut self, source: State, symbol: Symbol, target: State) {
        self.mutable_state_post(source).add(symbol, target);
        self.note_target(target);
    }

    /// Merges `targets` into the target set of `(source, symbol)`.
    pub fn add_targets(&mut self, source: State, symbol: Symbol, targets: &OrdVector<State>) {
        self.mutable_state_post(source).add_targets(symbol, targets);
        if let Some(&largest) = targets.last() {
            self.note_target(largest);
        }
    }

    /// Removes `(source, symbol, target)`. Removing from a source beyond the
    /// allocated storage is a no-op; a materialised source without a post for
    /// `symbol` is reported as [`AutomataError::NotFound`]. An emptied symbol
    /// post is dropped entirely.
    pub fn remove(&mut self, source: State, symbol: Symbol, target: State) -> Result<()> {
        let Some(state_post) = self.state_posts.get_mut(source) else {
            return Ok(());
        };
        let Some(symbol_post) = state_post.find_mut(symbol) else {
            return Err(AutomataError::NotFound(format!(
                "transition ({source}, {symbol}, {target}): state {source} has no post for the symbol"
            )));
        };
        symbol_post.targets.remove(&target);
        if symbol_post.targets.is_empty() {
            state_post.remove_post(symbol);
        }
        Ok(())
    }

    pub fn contains(&self, source: State, symbol: Symbol, target: State) -> bool {
        self.state_post(source)
            .find(symbol)
            .is_some_and(|post| post.targets.contains(&target))
    }

    pub fn contains_transition(&self, transition: &Transition) -> bool {
        self.contains(transition.source, transition.symbol, transition.target)
    }

    pub fn is_empty(&self) -> bool {
        self.num_of_transitions() == 0
    }

    pub fn num_of_transitions(&self) -> usize {
        self.state_posts.iter().map(StatePost::num_of_moves).sum()
    }

    /// One past the largest state the relation has seen, counting both
    /// materialised sources and inserted targets.
    pub fn num_of_states(&self) -> usize {
        let beyond_targets = self.max_target.map_or(0, |target| target + 1);
        self.state_posts.len().max(beyond_targets)
    }

    pub fn uses_state(&self, state: State) -> bool {
        state < self.num_of_states()
    }

    /// Lazy enumeration of all transitions in ascending `(source, symbol,
    /// target)` order; restartable by calling again.
    pub fn transitions(&self) -> Transitions<'_> {
        Transitions { delta: self, source: 0, post_index: 0, target_index: 0 }
    }

    /// Sorted unique symbols occurring on any transition.
    pub fn get_used_symbols(&self) -> OrdVector<Symbol> {
        let mut used = OrdVector::new();
        for state_post in &self.state_posts {
            for symbol_post in state_post.iter() {
                used.insert(symbol_post.symbol);
            }
        }
        used
    }

    /// Registers every used symbol in `alphabet` under its decimal name.
    pub fn add_symbols_to(&self, alphabet: &mut dyn Alphabet) -> Result<()> {
        for symbol in self.get_used_symbols().iter() {
            alphabet.register(&symbol.to_string())?;
        }
        Ok(())
    }

    /// Whether every symbol post leads to at most one target. Used by the
    /// determinism check of the automaton shells.
    pub(crate) fn has_deterministic_posts(&self) -> bool {
        self.state_posts
            .iter()
            .all(|state_post| state_post.iter().all(|post| post.targets.len() <= 1))
    }

    /// Whether any transition is labelled with a symbol `>= first_epsilon`.
    pub(crate) fn contains_epsilon(&self, first_epsilon: Symbol) -> bool {
        self.get_used_symbols().last().is_some_and(|&last| last >= first_epsilon)
    }
}

impl PartialEq for Delta {
    /// Two relations are equal iff their canonical transition sequences are.
    fn eq(&self, other: &Self) -> bool {
        self.transitions().eq(other.transitions())
    }
}

impl Eq for Delta {}

/// Iterator behind [`Delta::transitions`].
#[derive(Debug, Clone)]
pub struct Transitions<'a> {
    delta: &'a Delta,
    source: State,
    post_index: usize,
    target_index: usize,
}

impl Iterator for Transitions<'_> {
    type Item = Transition;

    fn next(&mut self) -> Option<Transition> {
        while self.source < self.delta.state_posts.len() {
            let state_post = &self.delta.state_posts[self.source];
            if let Some(post) = state_post.posts.get(self.post_index) {
                if let Some(&target) = post.targets.as_slice().get(self.target_index) {
                    self.target_index += 1;
                    return Some(Transition::new(self.source, post.symbol, target));
                }
                self.post_index += 1;
                self.target_index = 0;
                continue;
            }
            self.source += 1;
            self.post_index = 0;
            self.target_index = 0;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::{OnTheFlyAlphabet, EPSILON};

    #[test]
    fn add_is_idempotent_and_sorted() {
        let mut delta = Delta::new();
        delta.add(0, 5, 1);
        delta.add(0, 1, 1);
        delta.add(0, 1, 1);
        delta.add(0, 2, 1);
        let symbols: Vec<Symbol> =
            delta.state_post(0).iter().map(|post| post.symbol).collect();
        assert_eq!(symbols, vec![1, 2, 5]);
        assert_eq!(delta.num_of_transitions(), 3);
    }

    #[test]
    fn state_post_is_lazy_but_mutable_post_grows() {
        let mut delta = Delta::new();
        assert_eq!(delta.num_of_states(), 0);
        assert!(!delta.uses_state(0));
        assert!(delta.state_post(7).is_empty());
        assert_eq!(delta.num_of_states(), 0);

        assert!(delta.mutable_state_post(0).is_empty());
        assert_eq!(delta.num_of_states(), 1);
        assert!(delta.uses_state(0));

        assert!(delta.mutable_state_post(9).is_empty());
        assert_eq!(delta.num_of_states(), 10);
        assert!(delta.uses_state(9));
        assert!(!delta.uses_state(10));
    }

    #[test]
    fn num_of_states_tracks_targets() {
        let mut delta = Delta::new();
        delta.add(0, 0, 41);
        assert_eq!(delta.num_of_states(), 42);
        assert!(delta.state_post(41).is_empty());
    }

    #[test]
    fn remove_drops_emptied_posts() {
        let mut delta = Delta::new();
        delta.add(0, 1, 0);
        assert!(delta.remove(3, 5, 6).is_ok());
        assert!(delta.remove(0, 1, 0).is_ok());
        assert!(delta.is_empty());
        delta.add(10, 1, 0);
        assert!(matches!(
            delta.remove(3, 5, 6),
            Err(AutomataError::NotFound(_))
        ));
    }

    #[test]
    fn batch_add_merges_targets() {
        let mut delta = Delta::new();
        delta.add_targets(0, 1, &OrdVector::from(vec![3, 4, 5, 6]));
        delta.add_targets(26, 1, &OrdVector::new());
        delta.add_targets(42, 1, &OrdVector::from(vec![43]));
        assert_eq!(delta.num_of_transitions(), 5);
        delta.add_targets(0, 1, &OrdVector::from(vec![2, 4]));
        assert_eq!(delta.num_of_transitions(), 6);
    }

    #[test]
    fn contains_finds_transitions() {
        let mut delta = Delta::new();
        assert!(!delta.contains(0, 1, 0));
        delta.add(0, 1, 0);
        assert!(delta.contains(0, 1, 0));
        assert!(delta.contains_transition(&Transition::new(0, 1, 0)));
        assert!(!delta.contains(0, 1, 1));
    }

    #[test]
    fn transitions_enumerate_in_lexicographic_order() {
        let mut delta = Delta::new();
        delta.add(0, 1, 1);
        delta.add(0, 2, 1);
        delta.add(0, 5, 1);
        delta.add(1, 3, 2);
        delta.add(2, 0, 1);
        delta.add(2, 0, 3);
        let expected = vec![
            Transition::new(0, 1, 1),
            Transition::new(0, 2, 1),
            Transition::new(0, 5, 1),
            Transition::new(1, 3, 2),
            Transition::new(2, 0, 1),
            Transition::new(2, 0, 3),
        ];
        assert_eq!(delta.transitions().collect::<Vec<_>>(), expected);
        // Restartable: a second pass yields the same sequence.
        assert_eq!(delta.transitions().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn move_views_respect_the_bound() {
        let mut delta = Delta::new();
        delta.add(0, 1, 1);
        delta.add(0, 2, 1);
        delta.add(0, 5, 1);
        delta.add(0, EPSILON, 2);

        let state_post = delta.state_post(0);
        let all: Vec<Move> = state_post.moves().collect();
        assert_eq!(
            all,
            vec![
                Move { symbol: 1, target: 1 },
                Move { symbol: 2, target: 1 },
                Move { symbol: 5, target: 1 },
                Move { symbol: EPSILON, target: 2 },
            ]
        );

        let epsilons: Vec<Move> = state_post.moves_epsilons(EPSILON).collect();
        assert_eq!(epsilons, vec![Move { symbol: EPSILON, target: 2 }]);

        let high: Vec<Move> = state_post.moves_epsilons(3).collect();
        assert_eq!(
            high,
            vec![Move { symbol: 5, target: 1 }, Move { symbol: EPSILON, target: 2 }]
        );

        let low: Vec<Move> = state_post.moves_symbols(3).collect();
        assert_eq!(
            low,
            vec![Move { symbol: 1, target: 1 }, Move { symbol: 2, target: 1 }]
        );
        assert!(state_post.moves_symbols(0).next().is_none());
    }

    #[test]
    fn delta_equality_is_transition_equality() {
        let mut delta = Delta::new();
        let mut delta2 = Delta::new();
        assert_eq!(delta, delta2);
        delta.add(0, 0, 0);
        assert_ne!(delta, delta2);
        delta2.add(0, 0, 0);
        assert_eq!(delta, delta2);
        delta.add(0, 0, 1);
        delta2.add(0, 0, 2);
        assert_ne!(delta, delta2);
        delta2.add(0, 0, 1);
        assert_ne!(delta, delta2);
        delta.add(0, 0, 2);
        assert_eq!(delta, delta2);
    }

    #[test]
    fn used_symbols_are_registered_by_decimal_name() {
        let mut alphabet = OnTheFlyAlphabet::new();
        let mut delta = Delta::new();
        delta.add_symbols_to(&mut alphabet).unwrap();
        assert!(alphabet.get_symbol_map().is_empty());
        delta.add(0, 0, 0);
        delta.add(0, 1, 0);
        delta.add(0, 3, 0);
        delta.add_symbols_to(&mut alphabet).unwrap();
        assert_eq!(alphabet.get_symbol_map().len(), 3);
        assert_eq!(alphabet.translate_symbol("3").unwrap(), 2);
    }
}
