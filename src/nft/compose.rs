//! Composition of two-tape transducers.
//!
//! The first transducer's output tape synchronises with the second's input
//! tape; the synchronised tape is projected away, leaving the first's input
//! and the second's output. The construction works on the *step relation* of
//! each operand: for every level-0 state, the `(input, output, successor)`
//! triples obtained by crossing one full level cycle, with silent same-level
//! jumps folded in. Matching then mirrors the product construction — a step
//! with an epsilon on the synchronised tape advances its side alone, and a
//! [`DONT_CARE`] slot on either side of the synchronised tape matches any
//! proper symbol of the other.

use std::collections::{HashMap, VecDeque};

use crate::alphabet::{Symbol, DONT_CARE, EPSILON};
use crate::errors::{AutomataError, Result};
use crate::nfa::State;

use super::{Nft, DEFAULT_NUM_OF_LEVELS};

/// One traversal of a full level cycle: consume `input` on tape 0, emit
/// `output` on tape 1, arrive in the level-0 state `successor`.
#[derive(Debug, Clone, Copy)]
struct Step {
    input: Symbol,
    output: Symbol,
    successor: State,
}

/// Composes `lhs` with `rhs`, synchronising `lhs`'s output tape with `rhs`'s
/// input tape.
///
/// Both operands must be two-tape transducers with level-0 initial and
/// accepting states; differing tape counts are a [`AutomataError::LevelMismatch`].
pub fn compose(lhs: &Nft, rhs: &Nft) -> Result<Nft> {
    if lhs.num_of_levels != rhs.num_of_levels {
        return Err(AutomataError::LevelMismatch(format!(
            "cannot compose transducers with {} and {} levels",
            lhs.num_of_levels, rhs.num_of_levels
        )));
    }
    if lhs.num_of_levels != DEFAULT_NUM_OF_LEVELS {
        return Err(AutomataError::Unsupported(
            "composition is defined for two-tape transducers".to_owned(),
        ));
    }
    lhs.validate_levels()?;
    rhs.validate_levels()?;
    for side in [lhs, rhs] {
        if side.accepts.iter().any(|state| side.level_of(state) != 0) {
            return Err(AutomataError::LevelMismatch(
                "composition requires level-0 accepting states".to_owned(),
            ));
        }
    }

    let lhs_steps = step_relation(lhs);
    let rhs_steps = step_relation(rhs);
    let empty = Vec::new();

    let mut composed = Nft::new();
    let mut pair_states: HashMap<(State, State), State> = HashMap::new();
    let mut worklist: VecDeque<(State, State)> = VecDeque::new();

    let pair_state = |composed: &mut Nft,
                      pair_states: &mut HashMap<(State, State), State>,
                      worklist: &mut VecDeque<(State, State)>,
                      pair: (State, State)|
     -> Result<State> {
        if let Some(&existing) = pair_states.get(&pair) {
            return Ok(existing);
        }
        let fresh = composed.add_state_with_level(0)?;
        pair_states.insert(pair, fresh);
        if lhs.accepts.contains(pair.0) && rhs.accepts.contains(pair.1) {
            composed.accepts.insert(fresh);
        }
        worklist.push_back(pair);
        Ok(fresh)
    };

    for lhs_initial in lhs.initial.iter() {
        for rhs_initial in rhs.initial.iter() {
            let state = pair_state(
                &mut composed,
                &mut pair_states,
                &mut worklist,
                (lhs_initial, rhs_initial),
            )?;
            composed.initial.insert(state);
        }
    }

    while let Some((left, right)) = worklist.pop_front() {
        let source = pair_states[&(left, right)];
        let left_steps = lhs_steps.get(&left).unwrap_or(&empty);
        let right_steps = rhs_steps.get(&right).unwrap_or(&empty);

        let mut emissions: Vec<(Symbol, Symbol, (State, State))> = Vec::new();
        for step in left_steps {
            if step.output == EPSILON {
                // Nothing to synchronise: the left side advances alone.
                emissions.push((step.input, EPSILON, (step.successor, right)));
            } else {
                for candidate in right_steps {
                    // A wildcard on either side of the synchronised tape
                    // matches any consuming slot, never an epsilon one.
                    let synchronised = candidate.input != EPSILON
                        && (candidate.input == step.output
                            || step.output == DONT_CARE
                            || candidate.input == DONT_CARE);
                    if synchronised {
                        emissions.push((
                            step.input,
                            candidate.output,
                            (step.successor, candidate.successor),
                        ));
                    }
                }
            }
        }
        for candidate in right_steps {
            if candidate.input == EPSILON {
                emissions.push((EPSILON, candidate.output, (left, candidate.successor)));
            }
        }

        for (input, output, pair) in emissions {
            let target = pair_state(&mut composed, &mut pair_states, &mut worklist, pair)?;
            if input == EPSILON && output == EPSILON {
                composed.delta.add(source, EPSILON, target);
            } else {
                let middle = composed.add_state_with_level(1)?;
                composed.delta.add(source, input, middle);
                composed.delta.add(middle, output, target);
            }
        }
    }

    Ok(composed)
}

/// Step relation of a validated two-tape transducer: every cycle from each
/// level-0 state through level 1 and back, following silent same-level
/// epsilon jumps on level 1 with a visited set.
fn step_relation(nft: &Nft) -> HashMap<State, Vec<Step>> {
    let bound = nft.num_of_states();
    let mut relation: HashMap<State, Vec<Step>> = HashMap::new();
    for state in 0..bound {
        if nft.level_of(state) != 0 {
            continue;
        }
        let mut steps = Vec::new();
        for first in nft.delta.state_post(state).moves() {
            if nft.level_of(first.target) == 0 {
                // A validated same-level edge carries EPSILON (a silent jump
                // consuming nothing) or DONT_CARE (a wildcard full cycle).
                steps.push(Step {
                    input: first.symbol,
                    output: first.symbol,
                    successor: first.target,
                });
                continue;
            }
            let mut stack = vec![first.target];
            let mut visited = vec![first.target];
            while let Some(middle) = stack.pop() {
                for second in nft.delta.state_post(middle).moves() {
                    if nft.level_of(second.target) == 1 {
                        // Only silent jumps continue the cycle at level 1.
                        if second.symbol == EPSILON && !visited.contains(&second.target) {
                            visited.push(second.target);
                            stack.push(second.target);
                        }
                    } else {
                        steps.push(Step {
                            input: first.symbol,
                            output: second.symbol,
                            successor: second.target,
                        });
                    }
                }
            }
        }
        if !steps.is_empty() {
            relation.insert(state, steps);
        }
    }
    relation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::EnumAlphabet;
    use crate::nft::strings::create_identity;

    #[test]
    fn identity_composed_with_itself_stays_identity() {
        let alphabet = EnumAlphabet::from_symbols([1, 2]);
        let identity = create_identity(&alphabet, 2).unwrap();
        let composed = compose(&identity, &identity).unwrap();
        let image = composed.apply(&[1, 2, 1]).unwrap();
        assert!(image.is_in_lang(&[1, 2, 1]));
        assert!(!image.is_in_lang(&[1, 2]));
        assert!(!image.is_in_lang(&[2, 2, 1]));
    }

    #[test]
    fn compose_rejects_mismatched_tape_counts() {
        let two = Nft::new();
        let three = Nft::with_num_of_levels(3).unwrap();
        assert!(matches!(
            compose(&two, &three),
            Err(AutomataError::LevelMismatch(_))
        ));
    }

    #[test]
    fn compose_chains_rewrites() {
        // First transducer maps 1 -> 2, second maps 2 -> 3.
        let mut first = Nft::new();
        let start = first.add_state();
        first.initial.insert(start);
        first.accepts.insert(start);
        first.insert_word_to(start, &[1, 2], start).unwrap();

        let mut second = Nft::new();
        let start = second.add_state();
        second.initial.insert(start);
        second.accepts.insert(start);
        second.insert_word_to(start, &[2, 3], start).unwrap();

        let composed = compose(&first, &second).unwrap();
        let image = composed.apply(&[1, 1]).unwrap();
        assert!(image.is_in_lang(&[3, 3]));
        assert!(!image.is_in_lang(&[2, 2]));
    }
}
