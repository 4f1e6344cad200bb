//! Subset construction. The worklist/`IndexMap` shape also underlies the
//! antichain searches in [`super::lang`].

use std::collections::{BTreeMap, VecDeque};

use indexmap::IndexMap;

use crate::alphabet::{Symbol, EPSILON};
use crate::errors::{AutomataError, Result};
use crate::ord_vector::OrdVector;

use super::{Nfa, State};

/// Determinizes an epsilon-free automaton.
///
/// The result's states are labelled by sets of input states; a result state
/// accepts iff its label intersects the input's accepting set. Inputs with
/// epsilon transitions are rejected as [`AutomataError::Unsupported`] —
/// callers run [`super::remove_epsilon`] first.
pub fn determinize(aut: &Nfa) -> Result<Nfa> {
    determinize_with_subset_map(aut).map(|(dfa, _)| dfa)
}

/// Like [`determinize`], additionally returning the macro-state labelling in
/// construction order.
pub fn determinize_with_subset_map(
    aut: &Nfa,
) -> Result<(Nfa, IndexMap<OrdVector<State>, State>)> {
    if aut.delta.contains_epsilon(EPSILON) {
        return Err(AutomataError::Unsupported(
            "cannot determinize an automaton with epsilon transitions".to_owned(),
        ));
    }

    let mut macro_states: IndexMap<OrdVector<State>, State> = IndexMap::new();
    let mut worklist: VecDeque<OrdVector<State>> = VecDeque::new();
    let mut dfa = Nfa::new();

    let initial_label = aut.initial.to_ord_vector();
    macro_states.insert(initial_label.clone(), 0);
    dfa.initial.insert(0);
    worklist.push_back(initial_label);

    while let Some(label) = worklist.pop_front() {
        let source = macro_states[&label];
        if label.iter().any(|&state| aut.accepts.contains(state)) {
            dfa.accepts.insert(source);
        }

        // Union the posts of all members, symbol by symbol, in symbol order.
        let mut combined: BTreeMap<Symbol, OrdVector<State>> = BTreeMap::new();
        for &member in label.iter() {
            for symbol_post in aut.delta.state_post(member).iter() {
                combined
                    .entry(symbol_post.symbol)
                    .and_modify(|targets| *targets = targets.union(&symbol_post.targets))
                    .or_insert_with(|| symbol_post.targets.clone());
            }
        }

        for (symbol, target_label) in combined {
            let target = match macro_states.get(&target_label) {
                Some(&existing) => existing,
                None => {
                    let fresh = macro_states.len();
                    macro_states.insert(target_label.clone(), fresh);
                    worklist.push_back(target_label);
                    fresh
                }
            };
            dfa.delta.add(source, symbol, target);
        }
    }

    // A macro-state with no transitions still occupies the universe.
    dfa.delta.mutable_state_post(macro_states.len() - 1);
    Ok((dfa, macro_states))
}
