//! Language predicates decided without explicit determinization: antichain
//! searches over macro-states.

use std::collections::{HashMap, VecDeque};

use crate::alphabet::{Alphabet, Symbol, EPSILON};
use crate::errors::Result;
use crate::ord_vector::OrdVector;

use super::{ops::remove_epsilon, Nfa, State, Word};

/// Whether the automaton accepts every word over the alphabet's symbols.
///
/// Searches for a reachable rejecting macro-state, keeping only an antichain
/// of minimal macro-states: a superset rejects no earlier than any of its
/// subsets, so subsumed macro-states need no exploration. Fails only when
/// `alphabet` cannot enumerate its universe.
pub fn is_universal(aut: &Nfa, alphabet: &dyn Alphabet) -> Result<bool> {
    let symbols = alphabet.symbols()?;
    let cleaned;
    let aut = if aut.delta.contains_epsilon(EPSILON) {
        cleaned = remove_epsilon(aut);
        &cleaned
    } else {
        aut
    };

    let rejects =
        |label: &OrdVector<State>| !label.iter().any(|&state| aut.accepts.contains(state));

    let initial_label = aut.initial.to_ord_vector();
    if rejects(&initial_label) {
        return Ok(false);
    }
    let mut antichain: Vec<OrdVector<State>> = vec![initial_label.clone()];
    let mut worklist: VecDeque<OrdVector<State>> = VecDeque::from([initial_label]);

    while let Some(label) = worklist.pop_front() {
        for &symbol in symbols.iter() {
            let successor = aut.post_of(&label, symbol);
            if rejects(&successor) {
                return Ok(false);
            }
            if antichain.iter().any(|member| member.is_subset_of(&successor)) {
                continue;
            }
            antichain.retain(|member| !successor.is_subset_of(member));
            antichain.push(successor.clone());
            worklist.push_back(successor);
        }
    }
    Ok(true)
}

/// Whether `L(smaller) ⊆ L(bigger)`.
pub fn is_included(smaller: &Nfa, bigger: &Nfa) -> bool {
    inclusion_search(smaller, bigger).0
}

/// Inclusion with a counterexample word accepted by `smaller` and rejected
/// by `bigger` when the inclusion does not hold.
pub fn is_included_with_cex(smaller: &Nfa, bigger: &Nfa) -> (bool, Option<Word>) {
    inclusion_search(smaller, bigger)
}

/// Language equivalence as inclusion in both directions.
pub fn are_equivalent(lhs: &Nfa, rhs: &Nfa) -> bool {
    is_included(lhs, rhs) && is_included(rhs, lhs)
}

/// Antichain product search for a run accepted by `smaller` but not by
/// `bigger`.
///
/// A search node pairs one `smaller` state with the macro-state of all
/// `bigger` states reachable over the same word. A node `(p, Q)` is subsumed
/// by a processed `(p, Q')` with `Q' ⊆ Q`: fewer `bigger` states can only
/// reject more, so the subset explores a superset of the failures. The symbol
/// universe is `smaller`'s used symbols — no other symbol can occur in a word
/// of `L(smaller)`.
fn inclusion_search(smaller: &Nfa, bigger: &Nfa) -> (bool, Option<Word>) {
    let cleaned_smaller;
    let smaller = if smaller.delta.contains_epsilon(EPSILON) {
        cleaned_smaller = remove_epsilon(smaller);
        &cleaned_smaller
    } else {
        smaller
    };
    let cleaned_bigger;
    let bigger = if bigger.delta.contains_epsilon(EPSILON) {
        cleaned_bigger = remove_epsilon(bigger);
        &cleaned_bigger
    } else {
        bigger
    };

    let node_fails = |state: State, label: &OrdVector<State>| {
        smaller.accepts.contains(state)
            && !label.iter().any(|&big| bigger.accepts.contains(big))
    };

    // Nodes carry backpointers so a failing node reconstructs its word.
    struct Node {
        state: State,
        label: OrdVector<State>,
        parent: Option<(usize, Symbol)>,
    }
    let rebuild = |nodes: &[Node], mut index: usize| {
        let mut word = Vec::new();
        while let Some((parent, symbol)) = nodes[index].parent {
            word.push(symbol);
            index = parent;
        }
        word.reverse();
        word
    };

    let mut nodes: Vec<Node> = Vec::new();
    let mut processed: HashMap<State, Vec<OrdVector<State>>> = HashMap::new();
    let mut worklist: VecDeque<usize> = VecDeque::new();

    let bigger_initial = bigger.initial.to_ord_vector();
    for state in smaller.initial.iter() {
        if node_fails(state, &bigger_initial) {
            return (false, Some(Vec::new()));
        }
        processed.entry(state).or_default().push(bigger_initial.clone());
        nodes.push(Node { state, label: bigger_initial.clone(), parent: None });
        worklist.push_back(nodes.len() - 1);
    }

    while let Some(index) = worklist.pop_front() {
        let (state, label) = (nodes[index].state, nodes[index].label.clone());
        for symbol_post in smaller.delta.state_post(state).iter() {
            let symbol = symbol_post.symbol;
            let successor_label = bigger.post_of(&label, symbol);
            for &successor in symbol_post.targets.iter() {
                if node_fails(successor, &successor_label) {
                    nodes.push(Node {
                        state: successor,
                        label: successor_label.clone(),
                        parent: Some((index, symbol)),
                    });
                    let word = rebuild(&nodes, nodes.len() - 1);
                    return (false, Some(word));
                }
                let antichain = processed.entry(successor).or_default();
                if antichain.iter().any(|member| member.is_subset_of(&successor_label)) {
                    continue;
                }
                antichain.retain(|member| !successor_label.is_subset_of(member));
                antichain.push(successor_label.clone());
                nodes.push(Node {
                    state: successor,
                    label: successor_label.clone(),
                    parent: Some((index, symbol)),
                });
                worklist.push_back(nodes.len() - 1);
            }
        }
    }
    (true, None)
}
