//! Builders lifting automata into transducers.

use std::collections::HashMap;

use crate::alphabet::{Symbol, DONT_CARE};
use crate::errors::{AutomataError, Result};
use crate::nfa::{Nfa, State};

use super::Nft;

fn map_state(nft: &mut Nft, mapping: &mut HashMap<State, State>, state: State) -> State {
    if let Some(&mapped) = mapping.get(&state) {
        return mapped;
    }
    let fresh = nft.add_state();
    mapping.insert(state, fresh);
    fresh
}

/// Lifts an automaton into a `num_of_levels`-tape transducer by expanding
/// every transition into a chain through `num_of_levels - 1` fresh auxiliary
/// states.
///
/// The first chain transition carries the original symbol; the remaining
/// tapes carry `next_level_symbol` when given, the original symbol otherwise
/// (so `None` yields the identity relation restricted to the automaton's
/// language). Symbols listed in `epsilons` are not expanded at all: their
/// transitions stay as single same-level edges.
pub fn create_from_nfa(
    nfa: &Nfa,
    num_of_levels: usize,
    next_level_symbol: Option<Symbol>,
    epsilons: &[Symbol],
) -> Result<Nft> {
    let mut nft = Nft::with_num_of_levels(num_of_levels)?;
    let mut mapping: HashMap<State, State> = HashMap::new();
    let bound = nfa.num_of_states();

    for source in 0..bound {
        let mapped_source = map_state(&mut nft, &mut mapping, source);
        for symbol_post in nfa.delta.state_post(source).iter() {
            let symbol = symbol_post.symbol;
            let mut current = mapped_source;
            if !epsilons.contains(&symbol) {
                for aux_level in 1..num_of_levels {
                    let label = if aux_level == 1 {
                        symbol
                    } else {
                        next_level_symbol.unwrap_or(symbol)
                    };
                    let auxiliary = nft.add_state_with_level(aux_level)?;
                    nft.delta.add(current, label, auxiliary);
                    current = auxiliary;
                }
            }
            let closing_label = if epsilons.contains(&symbol) {
                symbol
            } else {
                next_level_symbol.unwrap_or(symbol)
            };
            for &target in symbol_post.targets.iter() {
                let mapped_target = map_state(&mut nft, &mut mapping, target);
                nft.delta.add(current, closing_label, mapped_target);
            }
        }
    }

    for state in nfa.initial.iter() {
        let mapped = map_state(&mut nft, &mut mapping, state);
        nft.initial.insert(mapped);
    }
    for state in nfa.accepts.iter() {
        let mapped = map_state(&mut nft, &mut mapping, state);
        nft.accepts.insert(mapped);
    }
    Ok(nft)
}

/// Transducer accepting exactly the empty word on every tape.
pub fn create_empty_string_nft(num_of_levels: usize) -> Result<Nft> {
    let mut nft = Nft::with_num_of_levels(num_of_levels)?;
    let state = nft.add_state();
    nft.initial.insert(state);
    nft.accepts.insert(state);
    Ok(nft)
}

/// Transducer relating every tuple of equal-length words: a single state
/// looping on [`DONT_CARE`], which composition matches against any symbol.
/// The wildcard loop spans one full level cycle, one slot per tape.
pub fn create_sigma_star_nft(num_of_levels: usize) -> Result<Nft> {
    let mut nft = create_empty_string_nft(num_of_levels)?;
    nft.delta.add(0, DONT_CARE, 0);
    Ok(nft)
}

/// Transducer looping on every symbol of `symbols` across all tapes: the
/// identity relation over the full language `symbols*`.
pub fn create_sigma_star_nft_over(symbols: &[Symbol], num_of_levels: usize) -> Result<Nft> {
    let mut nft = create_empty_string_nft(num_of_levels)?;
    nft.insert_identity(0, symbols)?;
    Ok(nft)
}

/// Transducer accepting exactly `word`, read as one interleaved sequence of
/// tape slots; its length must be a multiple of the tape count.
pub fn create_single_word_nft(word: &[Symbol], num_of_levels: usize) -> Result<Nft> {
    if num_of_levels == 0 || word.len() % num_of_levels != 0 {
        return Err(AutomataError::InvalidArgument(format!(
            "word length {} is not a multiple of {num_of_levels} levels",
            word.len()
        )));
    }
    let mut nft = Nft::with_num_of_levels(num_of_levels)?;
    let initial = nft.add_state();
    nft.initial.insert(initial);
    let trailing = nft.insert_word(initial, word)?;
    nft.accepts.insert(trailing);
    Ok(nft)
}
