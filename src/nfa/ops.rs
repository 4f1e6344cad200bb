//! Structural transformations: trimming, reversal, epsilon removal, union,
//! concatenation, and deterministic complement.

use std::collections::{HashMap, VecDeque};

use crate::alphabet::{Symbol, EPSILON};
use crate::errors::{AutomataError, Result};
use crate::ord_vector::OrdVector;
use crate::sparse_set::SparseSet;

use super::{Nfa, State};

impl Nfa {
    /// Removes every state that does not lie on some accepting run and
    /// renumbers the rest contiguously from 0, preserving relative order.
    pub fn trim(&mut self) {
        self.trim_with_state_map();
    }

    /// Like [`Nfa::trim`], additionally returning the old-to-new state
    /// bijection for the kept states.
    pub fn trim_with_state_map(&mut self) -> HashMap<State, State> {
        let bound = self.num_of_states();

        let mut forward = vec![false; bound];
        let mut queue: VecDeque<State> = VecDeque::new();
        for state in self.initial.iter() {
            if state < bound && !forward[state] {
                forward[state] = true;
                queue.push_back(state);
            }
        }
        while let Some(state) = queue.pop_front() {
            for mv in self.delta.state_post(state).moves() {
                if mv.target < bound && !forward[mv.target] {
                    forward[mv.target] = true;
                    queue.push_back(mv.target);
                }
            }
        }

        let mut predecessors: Vec<Vec<State>> = vec![Vec::new(); bound];
        for transition in self.delta.transitions() {
            predecessors[transition.target].push(transition.source);
        }
        let mut backward = vec![false; bound];
        for state in self.accepts.iter() {
            if state < bound && !backward[state] {
                backward[state] = true;
                queue.push_back(state);
            }
        }
        while let Some(state) = queue.pop_front() {
            for &source in &predecessors[state] {
                if !backward[source] {
                    backward[source] = true;
                    queue.push_back(source);
                }
            }
        }

        let mut renaming = HashMap::new();
        for state in 0..bound {
            if forward[state] && backward[state] {
                let fresh = renaming.len();
                renaming.insert(state, fresh);
            }
        }

        let mut trimmed = Nfa::with_num_of_states(renaming.len());
        for transition in self.delta.transitions() {
            if let (Some(&source), Some(&target)) =
                (renaming.get(&transition.source), renaming.get(&transition.target))
            {
                trimmed.delta.add(source, transition.symbol, target);
            }
        }
        for state in self.initial.iter() {
            if let Some(&fresh) = renaming.get(&state) {
                trimmed.initial.insert(fresh);
            }
        }
        for state in self.accepts.iter() {
            if let Some(&fresh) = renaming.get(&state) {
                trimmed.accepts.insert(fresh);
            }
        }
        *self = trimmed;
        renaming
    }
}

/// Reverses every transition and swaps the initial and accepting sets; the
/// language becomes the reverse.
pub fn revert(aut: &Nfa) -> Nfa {
    let mut reverted = Nfa::with_num_of_states(aut.num_of_states());
    for transition in aut.delta.transitions() {
        reverted.delta.add(transition.target, transition.symbol, transition.source);
    }
    reverted.initial = aut.accepts.clone();
    reverted.accepts = aut.initial.clone();
    reverted
}

/// Produces a language-equivalent automaton without epsilon transitions.
///
/// For every state `s` and every non-epsilon edge `(u, a, v)` with `u` in the
/// epsilon closure of `s`, the result has `(s, a, v)`; `s` accepts whenever
/// its closure touches an accepting state.
pub fn remove_epsilon(aut: &Nfa) -> Nfa {
    let bound = aut.num_of_states();
    let mut result = Nfa::with_num_of_states(bound);
    result.initial = aut.initial.clone();
    for state in 0..bound {
        let mut seed = OrdVector::new();
        seed.insert(state);
        let closure = aut.epsilon_closure(&seed);
        for &member in closure.iter() {
            if aut.accepts.contains(member) {
                result.accepts.insert(state);
            }
            for symbol_post in aut.delta.state_post(member).iter() {
                if symbol_post.symbol != EPSILON {
                    result.delta.add_targets(state, symbol_post.symbol, &symbol_post.targets);
                }
            }
        }
    }
    result
}

/// Nondeterministic union by disjoint renaming.
pub fn union_nondet(lhs: &Nfa, rhs: &Nfa) -> Nfa {
    let mut union = lhs.clone();
    union.unite_nondet_with(rhs);
    union
}

/// Concatenation: `rhs` is renamed after `lhs` and entered directly from the
/// accepting states of `lhs`, without introducing epsilon transitions.
pub fn concatenate(lhs: &Nfa, rhs: &Nfa) -> Nfa {
    let offset = lhs.num_of_states();
    let mut result = Nfa::new();
    result.delta = lhs.delta.clone();
    for transition in rhs.delta.transitions() {
        result.delta.add(transition.source + offset, transition.symbol, transition.target + offset);
    }

    // Entry edges: every word of lhs may continue with any first step of rhs.
    for accept in lhs.accepts.iter() {
        for rhs_initial in rhs.initial.iter() {
            for symbol_post in rhs.delta.state_post(rhs_initial).iter() {
                for &target in symbol_post.targets.iter() {
                    result.delta.add(accept, symbol_post.symbol, target + offset);
                }
            }
        }
    }

    result.initial = lhs.initial.clone();
    let lhs_accepts_epsilon = lhs.initial.iter().any(|state| lhs.accepts.contains(state));
    if lhs_accepts_epsilon {
        for state in rhs.initial.iter() {
            result.initial.insert(state + offset);
        }
    }

    for state in rhs.accepts.iter() {
        result.accepts.insert(state + offset);
    }
    let rhs_accepts_epsilon = rhs.initial.iter().any(|state| rhs.accepts.contains(state));
    if rhs_accepts_epsilon {
        for state in lhs.accepts.iter() {
            result.accepts.insert(state);
        }
    }

    let rhs_bound = rhs.num_of_states();
    if rhs_bound > 0 {
        result.delta.mutable_state_post(offset + rhs_bound - 1);
    }
    result
}

/// Complements a deterministic automaton with respect to the symbol universe
/// `symbols`: the result accepts exactly `symbols* \ L(aut)`.
///
/// The automaton is completed with a sink before the accepting set is
/// inverted. Callers should [`Nfa::trim`] first so no phantom states leak
/// into the inversion. An automaton with no initial state denotes the empty
/// language and complements to `symbols*`.
pub fn complement_deterministic(aut: &Nfa, symbols: &OrdVector<Symbol>) -> Result<Nfa> {
    if aut.delta.contains_epsilon(EPSILON) {
        return Err(AutomataError::Unsupported(
            "cannot complement an automaton with epsilon transitions".to_owned(),
        ));
    }
    if aut.initial.is_empty() {
        return Ok(super::builder::create_sigma_star_nfa(symbols));
    }
    if !aut.is_deterministic() {
        return Err(AutomataError::Unsupported(
            "complement is only defined for deterministic automata".to_owned(),
        ));
    }
    let mut complement = aut.clone();
    let sink = complement.num_of_states();
    complement.make_complete(symbols, sink);
    let bound = complement.num_of_states();
    let mut inverted = SparseSet::new();
    for state in 0..bound {
        if !complement.accepts.contains(state) {
            inverted.insert(state);
        }
    }
    complement.accepts = inverted;
    Ok(complement)
}
