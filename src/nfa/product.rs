//! Synchronous product construction.
//!
//! The acceptance predicate is injected so that intersection and
//! difference-style products share one frontier search; epsilon transitions
//! never synchronise and instead advance one side at a time.

use std::collections::{HashMap, VecDeque};

use crate::alphabet::EPSILON;

use super::{Nfa, State};

/// Intersection: the product accepting where both components accept.
pub fn intersection(lhs: &Nfa, rhs: &Nfa) -> Nfa {
    let mut product_map = HashMap::new();
    product(lhs, rhs, |l, r| l && r, &mut product_map)
}

/// Like [`intersection`], exposing the pair-to-product-state map.
pub fn intersection_with_map(
    lhs: &Nfa,
    rhs: &Nfa,
    product_map: &mut HashMap<(State, State), State>,
) -> Nfa {
    product(lhs, rhs, |l, r| l && r, product_map)
}

/// Frontier BFS over reachable state pairs.
///
/// For every symbol below [`EPSILON`] present on both sides the Cartesian
/// product of the target sets is linked; an epsilon edge on either side moves
/// that side alone. `accept` decides finality of a pair from the finality of
/// its components, which is what lets one construction compute intersections
/// as well as complement-flavoured products.
pub fn product(
    lhs: &Nfa,
    rhs: &Nfa,
    accept: impl Fn(bool, bool) -> bool,
    product_map: &mut HashMap<(State, State), State>,
) -> Nfa {
    let mut result = Nfa::new();
    let mut worklist: VecDeque<(State, State)> = VecDeque::new();

    let pair_state = |result: &mut Nfa,
                          worklist: &mut VecDeque<(State, State)>,
                          product_map: &mut HashMap<(State, State), State>,
                          pair: (State, State)| {
        if let Some(&existing) = product_map.get(&pair) {
            return existing;
        }
        let fresh = product_map.len();
        product_map.insert(pair, fresh);
        result.delta.mutable_state_post(fresh);
        if accept(lhs.accepts.contains(pair.0), rhs.accepts.contains(pair.1)) {
            result.accepts.insert(fresh);
        }
        worklist.push_back(pair);
        fresh
    };

    for left_initial in lhs.initial.iter() {
        for right_initial in rhs.initial.iter() {
            let state = pair_state(
                &mut result,
                &mut worklist,
                product_map,
                (left_initial, right_initial),
            );
            result.initial.insert(state);
        }
    }

    while let Some((left, right)) = worklist.pop_front() {
        let source = product_map[&(left, right)];

        // Merge-join the two symbol-sorted posts over proper symbols.
        let left_post = lhs.delta.state_post(left);
        let right_post = rhs.delta.state_post(right);
        let mut left_iter = left_post.iter().peekable();
        let mut right_iter = right_post.iter().peekable();
        while let (Some(l), Some(r)) = (left_iter.peek(), right_iter.peek()) {
            if l.symbol >= EPSILON || r.symbol >= EPSILON {
                break;
            }
            match l.symbol.cmp(&r.symbol) {
                std::cmp::Ordering::Less => {
                    left_iter.next();
                }
                std::cmp::Ordering::Greater => {
                    right_iter.next();
                }
                std::cmp::Ordering::Equal => {
                    for &left_target in l.targets.iter() {
                        for &right_target in r.targets.iter() {
                            let target = pair_state(
                                &mut result,
                                &mut worklist,
                                product_map,
                                (left_target, right_target),
                            );
                            result.delta.add(source, l.symbol, target);
                        }
                    }
                    left_iter.next();
                    right_iter.next();
                }
            }
        }

        // Epsilons advance one component and leave the other in place.
        for epsilon_move in left_post.moves_epsilons(EPSILON) {
            let target = pair_state(
                &mut result,
                &mut worklist,
                product_map,
                (epsilon_move.target, right),
            );
            result.delta.add(source, epsilon_move.symbol, target);
        }
        for epsilon_move in right_post.moves_epsilons(EPSILON) {
            let target = pair_state(
                &mut result,
                &mut worklist,
                product_map,
                (left, epsilon_move.target),
            );
            result.delta.add(source, epsilon_move.symbol, target);
        }
    }

    result
}
