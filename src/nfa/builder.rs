//! Structural automaton builders: canonical one-liners used across the
//! algorithms and a seeded Tabakov–Vardi random generator.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::alphabet::Symbol;
use crate::errors::{AutomataError, Result};
use crate::ord_vector::OrdVector;

use super::Nfa;

/// Automaton accepting exactly `word`.
pub fn create_single_word_nfa(word: &[Symbol]) -> Nfa {
    let mut nfa = Nfa::with_num_of_states(word.len() + 1);
    nfa.initial.insert(0);
    nfa.accepts.insert(word.len());
    for (position, &symbol) in word.iter().enumerate() {
        nfa.delta.add(position, symbol, position + 1);
    }
    nfa
}

/// Automaton accepting exactly the empty word.
pub fn create_empty_string_nfa() -> Nfa {
    let mut nfa = Nfa::with_num_of_states(1);
    nfa.initial.insert(0);
    nfa.accepts.insert(0);
    nfa
}

/// Automaton accepting every word over `symbols`.
pub fn create_sigma_star_nfa(symbols: &OrdVector<Symbol>) -> Nfa {
    let mut nfa = Nfa::with_num_of_states(1);
    nfa.initial.insert(0);
    nfa.accepts.insert(0);
    for &symbol in symbols.iter() {
        nfa.delta.add(0, symbol, 0);
    }
    nfa
}

/// Random automaton in the Tabakov–Vardi model.
///
/// Per symbol, `num_of_states * states_trans_ratio_per_symbol` distinct
/// transitions are drawn; `final_state_density` fixes the fraction of
/// accepting states (at least one while states exist). State 0 is the only
/// initial state. The generator is deterministic in `seed`, which callers
/// pass explicitly for reproducibility.
pub fn create_random_nfa_tabakov_vardi(
    num_of_states: usize,
    alphabet_size: usize,
    states_trans_ratio_per_symbol: f64,
    final_state_density: f64,
    seed: u64,
) -> Result<Nfa> {
    if !(0.0..=(num_of_states as f64)).contains(&states_trans_ratio_per_symbol) {
        return Err(AutomataError::InvalidArgument(format!(
            "states/transitions ratio {states_trans_ratio_per_symbol} is outside [0, {num_of_states}]"
        )));
    }
    if !(0.0..=1.0).contains(&final_state_density) {
        return Err(AutomataError::InvalidArgument(format!(
            "final-state density {final_state_density} is outside [0, 1]"
        )));
    }

    let mut nfa = Nfa::with_num_of_states(num_of_states);
    if num_of_states == 0 {
        return Ok(nfa);
    }
    let mut rng = StdRng::seed_from_u64(seed);

    nfa.initial.insert(0);

    let num_of_accepting = ((num_of_states as f64 * final_state_density).round() as usize)
        .clamp(1, num_of_states);
    for index in rand::seq::index::sample(&mut rng, num_of_states, num_of_accepting) {
        nfa.accepts.insert(index);
    }

    let transitions_per_symbol =
        (num_of_states as f64 * states_trans_ratio_per_symbol).round() as usize;
    for symbol in 0..alphabet_size {
        for index in
            rand::seq::index::sample(&mut rng, num_of_states * num_of_states, transitions_per_symbol)
        {
            let source = index / num_of_states;
            let target = index % num_of_states;
            nfa.delta.add(source, symbol as Symbol, target);
        }
    }
    Ok(nfa)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_word_nfa_accepts_only_its_word() {
        let nfa = create_single_word_nfa(&[3, 1, 4]);
        assert!(nfa.is_in_lang(&[3, 1, 4]));
        assert!(!nfa.is_in_lang(&[3, 1]));
        assert!(!nfa.is_in_lang(&[3, 1, 4, 1]));
        assert_eq!(nfa.num_of_states(), 4);
    }

    #[test]
    fn tabakov_vardi_respects_the_requested_sizes() {
        let nfa = create_random_nfa_tabakov_vardi(10, 5, 0.5, 0.5, 7).unwrap();
        assert_eq!(nfa.num_of_states(), 10);
        assert_eq!(nfa.initial.len(), 1);
        assert_eq!(nfa.accepts.len(), 5);
        assert_eq!(nfa.delta.get_used_symbols().len(), 5);
        assert_eq!(nfa.num_of_transitions(), 25);
    }

    #[test]
    fn tabakov_vardi_extremes() {
        let empty = create_random_nfa_tabakov_vardi(0, 0, 0.0, 0.0, 0).unwrap();
        assert_eq!(empty.num_of_states(), 0);
        assert!(empty.delta.is_empty());

        let min_final = create_random_nfa_tabakov_vardi(10, 5, 0.5, 0.0001, 1).unwrap();
        assert_eq!(min_final.accepts.len(), 1);

        let max_trans = create_random_nfa_tabakov_vardi(10, 5, 10.0, 0.5, 2).unwrap();
        assert_eq!(max_trans.num_of_transitions(), 500);
    }

    #[test]
    fn tabakov_vardi_validates_parameters() {
        for (ratio, density) in [(-0.1, 0.5), (11.0, 0.5), (0.5, -0.1), (0.5, 1.1)] {
            assert!(matches!(
                create_random_nfa_tabakov_vardi(10, 5, ratio, density, 0),
                Err(AutomataError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn tabakov_vardi_is_reproducible() {
        let first = create_random_nfa_tabakov_vardi(8, 3, 1.0, 0.25, 42).unwrap();
        let second = create_random_nfa_tabakov_vardi(8, 3, 1.0, 0.25, 42).unwrap();
        assert_eq!(first.delta, second.delta);
        assert_eq!(first.accepts, second.accepts);
    }
}
