//! State-space reduction: Hopcroft partition refinement for deterministic
//! automata and a simulation-based quotient for nondeterministic ones.

use std::collections::{HashSet, VecDeque};

use crate::alphabet::{Symbol, EPSILON};
use crate::errors::{AutomataError, Result};

use super::{Nfa, State};

/// Minimizes a deterministic, epsilon-free automaton by Hopcroft partition
/// refinement.
///
/// The input is trimmed and completed with a sink before refinement; the sink
/// block is trimmed away again afterwards, so the result is the minimum-state
/// partial automaton for the language.
pub fn minimize_hopcroft(aut: &Nfa) -> Result<Nfa> {
    if aut.delta.contains_epsilon(EPSILON) {
        return Err(AutomataError::Unsupported(
            "cannot minimize an automaton with epsilon transitions".to_owned(),
        ));
    }
    let mut trimmed = aut.clone();
    trimmed.trim();
    if trimmed.initial.is_empty() || trimmed.accepts.is_empty() {
        // The empty language; trimming already produced its minimal form.
        return Ok(trimmed);
    }
    if !trimmed.is_deterministic() {
        return Err(AutomataError::Unsupported(
            "minimization requires a deterministic automaton".to_owned(),
        ));
    }

    let used_symbols = trimmed.delta.get_used_symbols();
    let sink = trimmed.num_of_states();
    let sink_added = trimmed.make_complete(&used_symbols, sink);

    let mut minimized = PartitionRefinement::new(&trimmed, used_symbols.as_slice()).run();
    if sink_added {
        minimized.trim();
    }
    Ok(minimized)
}

struct PartitionRefinement<'a> {
    aut: &'a Nfa,
    symbols: &'a [Symbol],
    /// Current blocks of the partition; every block is non-empty.
    partitions: Vec<Vec<State>>,
    /// Block index of each state.
    state_class: Vec<usize>,
    /// Pending (block, symbol index) splitters.
    worklist: VecDeque<(usize, usize)>,
}

impl<'a> PartitionRefinement<'a> {
    fn new(aut: &'a Nfa, symbols: &'a [Symbol]) -> Self {
        let bound = aut.num_of_states();
        let mut accepting_block = Vec::new();
        let mut rejecting_block = Vec::new();
        for state in 0..bound {
            if aut.accepts.contains(state) {
                accepting_block.push(state);
            } else {
                rejecting_block.push(state);
            }
        }
        let mut partitions = Vec::new();
        if !accepting_block.is_empty() {
            partitions.push(accepting_block);
        }
        if !rejecting_block.is_empty() {
            partitions.push(rejecting_block);
        }

        let mut state_class = vec![0; bound];
        for (class, block) in partitions.iter().enumerate() {
            for &state in block {
                state_class[state] = class;
            }
        }

        let mut worklist = VecDeque::new();
        for class in 0..partitions.len() {
            for symbol_index in 0..symbols.len() {
                worklist.push_back((class, symbol_index));
            }
        }

        Self { aut, symbols, partitions, state_class, worklist }
    }

    fn run(mut self) -> Nfa {
        while let Some((class, symbol_index)) = self.worklist.pop_front() {
            let involved = self.collect_involved(class, symbol_index);
            if involved.is_empty() {
                continue;
            }
            let splits = self.split_partitions(&involved);
            self.enqueue_splits(splits);
        }
        self.build_minimized()
    }

    /// States whose successor under the splitter symbol lies in block
    /// `class`. The automaton is complete and deterministic here, so every
    /// state has exactly one successor.
    fn collect_involved(&self, class: usize, symbol_index: usize) -> HashSet<State> {
        let symbol = self.symbols[symbol_index];
        let mut involved = HashSet::new();
        for state in 0..self.state_class.len() {
            let successor = self
                .aut
                .delta
                .state_post(state)
                .find(symbol)
                .and_then(|post| post.targets.first().copied());
            if let Some(successor) = successor {
                if self.state_class[successor] == class {
                    involved.insert(state);
                }
            }
        }
        involved
    }

    fn split_partitions(&mut self, involved: &HashSet<State>) -> Vec<usize> {
        let mut split_blocks = Vec::new();
        let mut index = 0;
        while index < self.partitions.len() {
            let block = &self.partitions[index];
            let (inside, outside): (Vec<State>, Vec<State>) =
                block.iter().copied().partition(|state| involved.contains(state));
            if inside.is_empty() || outside.is_empty() {
                index += 1;
                continue;
            }
            self.partitions[index] = inside;
            let fresh = self.partitions.len();
            self.partitions.push(outside);
            self.relabel_block(index);
            self.relabel_block(fresh);
            split_blocks.push(index);
            split_blocks.push(fresh);
            index += 1;
        }
        split_blocks
    }

    fn relabel_block(&mut self, block: usize) {
        for &state in &self.partitions[block] {
            self.state_class[state] = block;
        }
    }

    fn enqueue_splits(&mut self, splits: Vec<usize>) {
        for block in splits {
            for symbol_index in 0..self.symbols.len() {
                self.worklist.push_back((block, symbol_index));
            }
        }
    }

    /// One result state per block; transitions lifted through an arbitrary
    /// representative, which refinement has made interchangeable.
    fn build_minimized(self) -> Nfa {
        let mut minimized = Nfa::with_num_of_states(self.partitions.len());
        for (class, block) in self.partitions.iter().enumerate() {
            let representative = block[0];
            for symbol_post in self.aut.delta.state_post(representative).iter() {
                let target = symbol_post.targets.first().copied().expect("non-empty post");
                minimized.delta.add(class, symbol_post.symbol, self.state_class[target]);
            }
            if self.aut.accepts.contains(representative) {
                minimized.accepts.insert(class);
            }
        }
        for state in self.aut.initial.iter() {
            minimized.initial.insert(self.state_class[state]);
        }
        minimized
    }
}

/// Simulation-based quotient: merges states that simulate each other.
///
/// The greatest simulation preorder is computed by a plain fixpoint over a
/// boolean relation, quadratic in the number of states.
pub fn reduce(aut: &Nfa) -> Nfa {
    let bound = aut.num_of_states();
    if bound == 0 {
        return aut.clone();
    }

    // sim[p][q]: q simulates p.
    let mut sim = vec![vec![true; bound]; bound];
    for p in 0..bound {
        for q in 0..bound {
            if aut.accepts.contains(p) && !aut.accepts.contains(q) {
                sim[p][q] = false;
            }
        }
    }
    let mut changed = true;
    while changed {
        changed = false;
        for p in 0..bound {
            for q in 0..bound {
                if !sim[p][q] {
                    continue;
                }
                'posts: for symbol_post in aut.delta.state_post(p).iter() {
                    let matching = aut.delta.state_post(q).find(symbol_post.symbol);
                    for &p_next in symbol_post.targets.iter() {
                        let simulated = matching.is_some_and(|post| {
                            post.targets.iter().any(|&q_next| sim[p_next][q_next])
                        });
                        if !simulated {
                            sim[p][q] = false;
                            changed = true;
                            break 'posts;
                        }
                    }
                }
            }
        }
    }

    // Pick the least mutually-similar state as class representative.
    let mut representative: Vec<State> = (0..bound).collect();
    for p in 0..bound {
        for q in 0..p {
            if sim[p][q] && sim[q][p] {
                representative[p] = representative[q];
                break;
            }
        }
    }
    let mut compact = vec![usize::MAX; bound];
    let mut next = 0;
    for state in 0..bound {
        if representative[state] == state {
            compact[state] = next;
            next += 1;
        }
    }
    let class_of = |state: State| compact[representative[state]];

    let mut reduced = Nfa::with_num_of_states(next);
    for transition in aut.delta.transitions() {
        reduced.delta.add(class_of(transition.source), transition.symbol, class_of(transition.target));
    }
    for state in aut.initial.iter() {
        reduced.initial.insert(class_of(state));
    }
    for state in aut.accepts.iter() {
        reduced.accepts.insert(class_of(state));
    }
    reduced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa::{determinize, union_nondet};

    fn word_nfa(word: &[Symbol]) -> Nfa {
        crate::nfa::builder::create_single_word_nfa(word)
    }

    #[test]
    fn minimize_merges_duplicate_branches() {
        // Two copies of the same single-word language minimize to a chain.
        let duplicated = union_nondet(&word_nfa(&[1, 2]), &word_nfa(&[1, 2]));
        let minimized = minimize_hopcroft(&determinize(&duplicated).unwrap()).unwrap();
        assert_eq!(minimized.num_of_states(), 3);
        assert!(minimized.is_in_lang(&[1, 2]));
        assert!(!minimized.is_in_lang(&[1]));
    }

    #[test]
    fn minimize_rejects_nondeterministic_input() {
        let mut aut = Nfa::new();
        aut.initial.insert(0);
        aut.accepts.insert(1);
        aut.delta.add(0, 1, 1);
        aut.delta.add(0, 1, 2);
        aut.delta.add(2, 1, 1);
        assert!(matches!(
            minimize_hopcroft(&aut),
            Err(AutomataError::Unsupported(_))
        ));
    }

    #[test]
    fn minimize_of_empty_language_is_empty() {
        let mut aut = Nfa::new();
        aut.initial.insert(0);
        aut.delta.add(0, 1, 1);
        let minimized = minimize_hopcroft(&aut).unwrap();
        assert_eq!(minimized.num_of_states(), 0);
        assert!(minimized.is_lang_empty());
    }

    #[test]
    fn reduce_merges_mutually_similar_states() {
        // Two interchangeable middle states collapse into one.
        let mut aut = Nfa::new();
        aut.initial.insert(0);
        aut.accepts.insert(3);
        aut.delta.add(0, 1, 1);
        aut.delta.add(0, 1, 2);
        aut.delta.add(1, 2, 3);
        aut.delta.add(2, 2, 3);
        let reduced = reduce(&aut);
        assert_eq!(reduced.num_of_states(), 3);
        assert!(reduced.is_in_lang(&[1, 2]));
        assert!(!reduced.is_in_lang(&[1]));
    }
}
