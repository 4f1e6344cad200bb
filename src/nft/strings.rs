//! Replacement transducers for string solving: reluctant-leftmost regex
//! replacement via begin markers, literal replacement via an end marker and
//! failure-function unwinding, and single-symbol replacement.

use std::collections::HashMap;

use crate::alphabet::{Alphabet, Symbol, EPSILON};
use crate::errors::{AutomataError, Result};
use crate::nfa::{
    determinize, intersection, reduce, remove_epsilon, revert, Move, Nfa, State,
};
use crate::ord_vector::OrdVector;
use crate::sparse_set::SparseSet;

use super::{builder, compose::compose, Nft};

/// Whether a replacement rewrites every occurrence or only the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceMode {
    All,
    Single,
}

/// Identity transducer over the alphabet's symbols.
pub fn create_identity(alphabet: &dyn Alphabet, num_of_levels: usize) -> Result<Nft> {
    let symbols = alphabet.symbols()?.to_vec();
    let mut nft = Nft::with_num_of_levels(num_of_levels)?;
    let state = nft.add_state();
    nft.initial.insert(state);
    nft.accepts.insert(state);
    nft.insert_identity(state, &symbols)?;
    Ok(nft)
}

/// Identity transducer that rewrites every occurrence (or, in `Single` mode,
/// the first occurrence) of `from_symbol` into `replacement`.
pub fn create_identity_with_single_symbol_replace(
    alphabet: &dyn Alphabet,
    from_symbol: Symbol,
    replacement: &[Symbol],
    replace_mode: ReplaceMode,
) -> Result<Nft> {
    let symbols = alphabet.symbols()?;
    if !symbols.contains(&from_symbol) {
        return Err(AutomataError::InvalidArgument(format!(
            "the alphabet does not contain the replaced symbol {from_symbol}"
        )));
    }
    let mut nft = create_identity(alphabet, 2)?;

    // Redirect the emitting half of the from_symbol loop into the
    // replacement chain.
    let emitting = nft
        .delta
        .state_post(0)
        .find(from_symbol)
        .and_then(|post| post.targets.first().copied())
        .expect("identity loop for every alphabet symbol");
    nft.delta.mutable_state_post(emitting).clear();

    let mut current = emitting;
    for &symbol in replacement.iter().take(replacement.len().saturating_sub(1)) {
        let consuming = nft.add_state_with_level(0)?;
        nft.delta.add(current, symbol, consuming);
        current = nft.add_state_with_level(1)?;
        nft.delta.add(consuming, EPSILON, current);
    }
    let closing = replacement.last().copied().unwrap_or(EPSILON);
    match replace_mode {
        ReplaceMode::All => {
            nft.delta.add(current, closing, 0);
        }
        ReplaceMode::Single => {
            let after_replace = nft.add_state_with_level(0)?;
            nft.delta.add(current, closing, after_replace);
            nft.insert_identity(after_replace, &symbols.to_vec())?;
            nft.accepts.insert(after_replace);
        }
    }
    Ok(nft)
}

/// Replacement of a single symbol, the degenerate reluctant replace.
pub fn replace_reluctant_single_symbol(
    from_symbol: Symbol,
    replacement: &[Symbol],
    alphabet: &dyn Alphabet,
    replace_mode: ReplaceMode,
) -> Result<Nft> {
    create_identity_with_single_symbol_replace(alphabet, from_symbol, replacement, replace_mode)
}

/// Shortest-match variant of an automaton: no accepted word has an accepted
/// proper prefix.
pub fn reluctant_nfa(aut: &Nfa) -> Nfa {
    let mut shortest = remove_epsilon(aut);
    for state in shortest.accepts.iter() {
        shortest.delta.mutable_state_post(state).clear();
    }
    shortest.trim();
    shortest
}

/// Moves each accepting state of the (determinized) pattern behind an epsilon
/// indirection, marking "a match can end here".
pub fn end_marker_dfa(pattern: &Nfa) -> Result<Nfa> {
    let mut dfa = if pattern.is_deterministic() && !pattern.delta.contains_epsilon(EPSILON) {
        pattern.clone()
    } else {
        determinize(&remove_epsilon(pattern))?
    };
    let accepting: Vec<State> = dfa.accepts.iter().collect();
    for orig in accepting {
        let fresh = dfa.add_state();
        dfa.accepts.insert(fresh);
        dfa.accepts.remove(orig);
        let moves: Vec<Move> = dfa.delta.state_post(orig).moves().collect();
        for mv in moves {
            dfa.delta.remove(orig, mv.symbol, mv.target)?;
            dfa.delta.add(fresh, mv.symbol, mv.target);
        }
        dfa.delta.add(orig, EPSILON, fresh);
    }
    Ok(dfa)
}

/// Subset-construction annotator: a complete automaton over the alphabet
/// whose states track all pattern states reachable from any suffix start,
/// with an epsilon indirection inserted wherever a match can end.
pub fn generic_marker_dfa(pattern: &Nfa, alphabet: &dyn Alphabet) -> Result<Nfa> {
    let determinized;
    let pattern = if pattern.is_deterministic() && !pattern.delta.contains_epsilon(EPSILON) {
        pattern
    } else {
        determinized = determinize(&remove_epsilon(pattern))?;
        &determinized
    };
    let symbols = alphabet.symbols()?;
    let pattern_initial = pattern.initial.iter().next().ok_or_else(|| {
        AutomataError::InvalidArgument("pattern automaton has no initial state".to_owned())
    })?;

    let mut marker_dfa = Nfa::new();
    marker_dfa.initial.insert(0);
    let mut labeling: HashMap<State, OrdVector<State>> = HashMap::new();
    let mut labeling_inv: HashMap<OrdVector<State>, State> = HashMap::new();
    let initial_label = pattern.initial.to_ord_vector();
    labeling.insert(0, initial_label.clone());
    labeling_inv.insert(initial_label, 0);

    let mut worklist: Vec<State> = vec![0];
    while let Some(source) = worklist.pop() {
        let source_label = labeling[&source].clone();
        let match_can_end = source_label.iter().any(|&state| pattern.accepts.contains(state));
        if match_can_end {
            let indirection = marker_dfa.add_state();
            marker_dfa.delta.add(source, EPSILON, indirection);
            process_source(
                pattern,
                pattern_initial,
                &symbols,
                &mut marker_dfa,
                &mut labeling,
                &mut labeling_inv,
                indirection,
                &source_label,
                &mut worklist,
            );
        } else {
            process_source(
                pattern,
                pattern_initial,
                &symbols,
                &mut marker_dfa,
                &mut labeling,
                &mut labeling_inv,
                source,
                &source_label,
                &mut worklist,
            );
        }
    }
    Ok(marker_dfa)
}

/// Adds the full-alphabet transitions of one worklist entry and marks it
/// accepting; target labels always restart the pattern's initial state so
/// matches may begin at every position.
#[allow(clippy::too_many_arguments)]
fn process_source(
    pattern: &Nfa,
    pattern_initial: State,
    symbols: &OrdVector<Symbol>,
    marker_dfa: &mut Nfa,
    labeling: &mut HashMap<State, OrdVector<State>>,
    labeling_inv: &mut HashMap<OrdVector<State>, State>,
    source: State,
    source_label: &OrdVector<State>,
    worklist: &mut Vec<State>,
) {
    for &symbol in symbols.iter() {
        let mut target_label = OrdVector::new();
        target_label.insert(pattern_initial);
        for &pattern_state in source_label.iter() {
            if let Some(post) = pattern.delta.state_post(pattern_state).find(symbol) {
                target_label.extend(post.targets.iter().copied());
            }
        }
        let target = match labeling_inv.get(&target_label) {
            Some(&existing) => existing,
            None => {
                let fresh = marker_dfa.add_state();
                labeling.insert(fresh, target_label.clone());
                labeling_inv.insert(target_label, fresh);
                worklist.push(fresh);
                fresh
            }
        };
        marker_dfa.delta.add(source, symbol, target);
    }
    marker_dfa.accepts.insert(source);
}

/// Recognises the prefixes that start a match: the generic marker automaton
/// of the reversed pattern, reversed back.
pub fn begin_marker_nfa(pattern: &Nfa, alphabet: &dyn Alphabet) -> Result<Nfa> {
    let reversed = revert(pattern);
    let mut marker = generic_marker_dfa(&reversed, alphabet)?;
    marker = revert(&marker);
    std::mem::swap(&mut marker.initial, &mut marker.accepts);
    Ok(marker)
}

/// Lifts a marker automaton into an identity transducer that emits `marker`
/// on the output tape wherever the automaton had an epsilon indirection.
pub fn marker_nft(marker_aut: &Nfa, marker: Symbol) -> Result<Nft> {
    let mut dft = builder::create_from_nfa(marker_aut, 2, None, &[EPSILON])?;
    let bound = dft.num_of_states();
    for source in 0..bound {
        let epsilon_moves: Vec<Move> =
            dft.delta.state_post(source).moves_epsilons(EPSILON).collect();
        for mv in epsilon_moves {
            let marker_state = dft.add_state_with_level(1)?;
            dft.delta.remove(source, mv.symbol, mv.target)?;
            dft.delta.add(source, mv.symbol, marker_state);
            dft.delta.add(marker_state, marker, mv.target);
        }
    }
    Ok(dft)
}

/// The begin-marker transducer: runs the (reversed-deterministic) marker
/// automaton forward, writing `begin_marker` exactly where a match may begin.
pub fn begin_marker_nft(marker_aut: &Nfa, begin_marker: Symbol) -> Result<Nft> {
    let mut nft = marker_nft(marker_aut, begin_marker)?;
    let new_initial = nft.add_state_with_level(0)?;
    for orig in nft.accepts.iter() {
        nft.delta.add(new_initial, EPSILON, orig);
    }
    nft.accepts = nft.initial.clone();
    let mut fresh_initial = SparseSet::new();
    fresh_initial.insert(new_initial);
    nft.initial = fresh_initial;
    Ok(nft)
}

/// End-marker transducer for the literal pipeline.
pub fn end_marker_dft(end_marker_aut: &Nfa, end_marker: Symbol) -> Result<Nft> {
    marker_nft(end_marker_aut, end_marker)
}

/// Shortest-match pattern automaton tolerating `marker` symbols inside a
/// match, intersected with a two-state automaton that keeps the next begin
/// marker intact for the following replacement.
///
/// Marker lassos around accepting states can survive this construction; they
/// are unreachable from accepting runs and disappear in the trim performed by
/// every projection of the composed result.
pub fn reluctant_nfa_with_marker(
    pattern: &Nfa,
    marker: Symbol,
    alphabet: &dyn Alphabet,
) -> Result<Nfa> {
    let mut shortest = reluctant_nfa(pattern);
    let bound = shortest.num_of_states();
    for state in 0..bound {
        shortest.delta.add(state, marker, state);
    }

    let symbols = alphabet.symbols()?;
    let mut keep_next_marker = Nfa::new();
    keep_next_marker.initial.insert(0);
    keep_next_marker.accepts.insert(0);
    for &symbol in symbols.iter() {
        keep_next_marker.delta.add(0, symbol, 0);
        keep_next_marker.delta.add(1, symbol, 0);
    }
    keep_next_marker.delta.add(0, marker, 1);
    keep_next_marker.delta.add(1, marker, 1);

    Ok(reluctant_nfa(&reduce(&intersection(&shortest, &keep_next_marker))))
}

/// The replacing transducer: identity until a begin marker arrives, then a
/// shortest match is consumed and erased, the replacement is emitted, and the
/// mode decides whether to loop back for further replacements or to continue
/// as the identity while erasing leftover markers.
pub fn reluctant_leftmost_nft(
    pattern: &Nfa,
    alphabet: &dyn Alphabet,
    begin_marker: Symbol,
    replacement: &[Symbol],
    replace_mode: ReplaceMode,
) -> Result<Nft> {
    let marked = reluctant_nfa_with_marker(pattern, begin_marker, alphabet)?;
    let mut nft = builder::create_from_nfa(&marked, 2, Some(EPSILON), &[EPSILON])?;
    let symbols = alphabet.symbols()?.to_vec();

    let initial = nft.add_state_with_level(0)?;
    nft.insert_identity(initial, &symbols)?;

    // A begin marker switches from copy mode into the match automaton.
    let enter_replace = nft.add_state_with_level(1)?;
    nft.delta.add(initial, begin_marker, enter_replace);
    for state in nft.initial.iter() {
        nft.delta.add(enter_replace, EPSILON, state);
    }

    // Every completed match emits the replacement on the output tape.
    let emit_entry = nft.add_state_with_level(1)?;
    for state in nft.accepts.iter() {
        nft.delta.add(state, EPSILON, emit_entry);
    }
    let tail = nft.insert_word_by_parts(emit_entry, &[Vec::new(), replacement.to_vec()])?;
    let after_replace = nft.add_state_with_level(0)?;
    nft.delta.add(tail, EPSILON, after_replace);

    nft.accepts.clear();
    match replace_mode {
        ReplaceMode::All => {
            nft.insert_word_by_parts_to(
                after_replace,
                &[vec![EPSILON], vec![EPSILON]],
                initial,
            )?;
        }
        ReplaceMode::Single => {
            nft.accepts.insert(after_replace);
            nft.insert_identity(after_replace, &symbols)?;
            nft.insert_word_by_parts_to(
                after_replace,
                &[vec![begin_marker], vec![EPSILON]],
                after_replace,
            )?;
        }
    }

    let mut fresh_initial = SparseSet::new();
    fresh_initial.insert(initial);
    nft.initial = fresh_initial;
    nft.accepts.insert(initial);
    Ok(nft)
}

/// Reluctant-leftmost regex replacement: the begin-marker transducer composed
/// with the replacing transducer, synchronised on the internal marker symbol.
///
/// `begin_marker` must be fresh, i.e. outside the alphabet.
pub fn replace_reluctant_regex(
    pattern: &Nfa,
    replacement: &[Symbol],
    alphabet: &dyn Alphabet,
    replace_mode: ReplaceMode,
    begin_marker: Symbol,
) -> Result<Nft> {
    let marker_aut = begin_marker_nfa(pattern, alphabet)?;
    let begin_dft = begin_marker_nft(&marker_aut, begin_marker)?;
    let replacer =
        reluctant_leftmost_nft(pattern, alphabet, begin_marker, replacement, replace_mode)?;
    compose(&begin_dft, &replacer)
}

/// Literal replacement: an identity transducer appending `end_marker`
/// composed with a buffering replacer whose non-matching transitions unwind
/// to the longest proper suffix that is still a literal prefix.
pub fn replace_reluctant_literal(
    literal: &[Symbol],
    replacement: &[Symbol],
    alphabet: &dyn Alphabet,
    replace_mode: ReplaceMode,
    end_marker: Symbol,
) -> Result<Nft> {
    if literal.is_empty() {
        return Err(AutomataError::InvalidArgument(
            "cannot replace the empty literal".to_owned(),
        ));
    }
    let mut end_nft = create_identity(alphabet, 2)?;
    let middle = end_nft.add_state_with_level(1)?;
    let marker_state = end_nft.add_state_with_level(0)?;
    end_nft.delta.add(0, EPSILON, middle);
    end_nft.delta.add(middle, end_marker, marker_state);
    end_nft.accepts.clear();
    end_nft.accepts.insert(marker_state);

    let replacer = replace_literal_nft(literal, replacement, alphabet, end_marker, replace_mode)?;
    compose(&end_nft, &replacer)
}

/// The literal replacer itself, driven by the end marker for flushing its
/// buffer at the end of the input.
fn replace_literal_nft(
    literal: &[Symbol],
    replacement: &[Symbol],
    alphabet: &dyn Alphabet,
    end_marker: Symbol,
    replace_mode: ReplaceMode,
) -> Result<Nft> {
    let mut nft = Nft::new();
    let init = nft.add_state_with_level(0)?;
    nft.initial.insert(init);

    // State i buffers the matched literal prefix of length i.
    let mut state_word_pairs: Vec<(State, Vec<Symbol>)> = vec![(init, Vec::new())];
    for end in 1..=literal.len() {
        state_word_pairs.push((nft.add_state_with_level(0)?, literal[..end].to_vec()));
    }

    let symbols = alphabet.symbols()?;
    add_generic_literal_transitions(literal, &state_word_pairs, &mut nft, &symbols)?;

    let accept = nft.add_state_with_level(0)?;
    nft.accepts.insert(accept);
    add_replacement_transitions(
        replacement,
        end_marker,
        replace_mode,
        &state_word_pairs,
        &mut nft,
        &symbols,
    )?;
    add_end_marker_transitions(end_marker, &state_word_pairs, &mut nft)?;
    Ok(nft)
}

/// Matching symbols advance the buffer silently; non-matching symbols emit
/// the part of the buffer that falls off when unwinding to the longest
/// proper suffix that is still a prefix of the literal.
fn add_generic_literal_transitions(
    literal: &[Symbol],
    state_word_pairs: &[(State, Vec<Symbol>)],
    nft: &mut Nft,
    symbols: &OrdVector<Symbol>,
) -> Result<()> {
    for (position, &literal_symbol) in literal.iter().enumerate() {
        let (word_state, subword) = &state_word_pairs[position];
        for &symbol in symbols.iter() {
            if symbol == literal_symbol {
                let middle = nft.add_state_with_level(1)?;
                nft.delta.add(*word_state, literal_symbol, middle);
                nft.delta.add(middle, EPSILON, state_word_pairs[position + 1].0);
                continue;
            }

            let mut extended = subword.clone();
            extended.push(symbol);
            // The buffer plus a non-matching symbol never prefixes the
            // literal itself, so at least one symbol always falls off.
            let mut keep_from = extended.len();
            for start in 0..extended.len() {
                if literal.starts_with(&extended[start..]) {
                    keep_from = start;
                    break;
                }
            }
            let unwind_target = state_word_pairs[extended.len() - keep_from].0;

            let mut current = *word_state;
            let mut input = symbol;
            for (index, &dropped) in extended[..keep_from].iter().enumerate() {
                let middle = nft.add_state_with_level(1)?;
                nft.delta.add(current, input, middle);
                input = EPSILON;
                if index + 1 == keep_from {
                    nft.delta.add(middle, dropped, unwind_target);
                } else {
                    let next = nft.add_state_with_level(0)?;
                    nft.delta.add(middle, dropped, next);
                    current = next;
                }
            }
        }
    }
    Ok(())
}

fn add_replacement_transitions(
    replacement: &[Symbol],
    end_marker: Symbol,
    replace_mode: ReplaceMode,
    state_word_pairs: &[(State, Vec<Symbol>)],
    nft: &mut Nft,
    symbols: &OrdVector<Symbol>,
) -> Result<()> {
    let match_state = state_word_pairs.last().expect("literal states").0;
    if replacement.is_empty() {
        let middle = nft.add_state_with_level(1)?;
        nft.delta.add(match_state, EPSILON, middle);
        handle_last_symbol_replacement(end_marker, replace_mode, nft, symbols, middle, EPSILON)?;
        return Ok(());
    }
    let mut current = match_state;
    for (index, &symbol) in replacement.iter().enumerate() {
        let middle = nft.add_state_with_level(1)?;
        nft.delta.add(current, EPSILON, middle);
        if index + 1 == replacement.len() {
            handle_last_symbol_replacement(end_marker, replace_mode, nft, symbols, middle, symbol)?;
        } else {
            let next = nft.add_state_with_level(0)?;
            nft.delta.add(middle, symbol, next);
            current = next;
        }
    }
    Ok(())
}

fn handle_last_symbol_replacement(
    end_marker: Symbol,
    replace_mode: ReplaceMode,
    nft: &mut Nft,
    symbols: &OrdVector<Symbol>,
    emitting: State,
    replacement_symbol: Symbol,
) -> Result<()> {
    match replace_mode {
        ReplaceMode::All => {
            let init = nft.initial.iter().next().expect("initial state");
            nft.delta.add(emitting, replacement_symbol, init);
        }
        ReplaceMode::Single => {
            let after_replace = nft.add_state_with_level(0)?;
            nft.delta.add(emitting, replacement_symbol, after_replace);
            nft.insert_identity(after_replace, &symbols.to_vec())?;
            let flush = nft.add_state_with_level(1)?;
            nft.delta.add(after_replace, end_marker, flush);
            let accept = nft.accepts.iter().next().expect("accepting state");
            nft.delta.add(flush, EPSILON, accept);
        }
    }
    Ok(())
}

/// The end marker flushes whatever literal prefix is still buffered. The
/// full-literal state is skipped: it must replace before accepting the end.
fn add_end_marker_transitions(
    end_marker: Symbol,
    state_word_pairs: &[(State, Vec<Symbol>)],
    nft: &mut Nft,
) -> Result<()> {
    let accept = nft.accepts.iter().next().expect("accepting state");
    for (state, word) in &state_word_pairs[..state_word_pairs.len() - 1] {
        let mut middle = nft.add_state_with_level(1)?;
        nft.delta.add(*state, end_marker, middle);
        if word.is_empty() {
            nft.delta.add(middle, EPSILON, accept);
            continue;
        }
        for &buffered in &word[..word.len() - 1] {
            let next = nft.add_state_with_level(0)?;
            nft.delta.add(middle, buffered, next);
            middle = nft.add_state_with_level(1)?;
            nft.delta.add(next, EPSILON, middle);
        }
        nft.delta.add(middle, *word.last().expect("non-empty buffer"), accept);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::EnumAlphabet;
    use crate::nfa::builder::create_single_word_nfa;

    #[test]
    fn reluctant_nfa_cuts_continuations() {
        // a | aa reduced to its shortest words: just a.
        let mut aut = Nfa::new();
        aut.initial.insert(0);
        aut.accepts.extend([1, 2]);
        aut.delta.add(0, 1, 1);
        aut.delta.add(1, 1, 2);
        let shortest = reluctant_nfa(&aut);
        assert!(shortest.is_in_lang(&[1]));
        assert!(!shortest.is_in_lang(&[1, 1]));
    }

    #[test]
    fn end_marker_dfa_moves_continuations_behind_epsilon() {
        let pattern = create_single_word_nfa(&[1]);
        let marked = end_marker_dfa(&pattern).unwrap();
        assert!(marked.is_in_lang(&[1]));
        let epsilon_count = marked
            .delta
            .transitions()
            .filter(|t| t.symbol == EPSILON)
            .count();
        assert_eq!(epsilon_count, 1);
    }

    #[test]
    fn generic_marker_dfa_accepts_everything() {
        let alphabet = EnumAlphabet::from_symbols([1, 2]);
        let pattern = create_single_word_nfa(&[1]);
        let marker = generic_marker_dfa(&pattern, &alphabet).unwrap();
        for word in [vec![], vec![1], vec![2, 2], vec![1, 2, 1]] {
            assert!(marker.is_in_lang(&word), "marker DFA must accept {word:?}");
        }
    }

    #[test]
    fn identity_transducer_copies_words() {
        let alphabet = EnumAlphabet::from_symbols([1, 2]);
        let identity = create_identity(&alphabet, 2).unwrap();
        assert!(identity.validate_levels().is_ok());
        let image = identity.apply(&[1, 2, 2]).unwrap();
        assert!(image.is_in_lang(&[1, 2, 2]));
        assert!(!image.is_in_lang(&[1, 2]));
    }

    #[test]
    fn single_symbol_replace_all() {
        let alphabet = EnumAlphabet::from_symbols([1, 2]);
        let replacer =
            create_identity_with_single_symbol_replace(&alphabet, 1, &[9], ReplaceMode::All)
                .unwrap();
        let image = replacer.apply(&[1, 2, 1]).unwrap();
        assert!(image.is_in_lang(&[9, 2, 9]));
        assert!(!image.is_in_lang(&[1, 2, 1]));
    }

    #[test]
    fn single_symbol_replace_single_stops_after_first() {
        let alphabet = EnumAlphabet::from_symbols([1, 2]);
        let replacer =
            create_identity_with_single_symbol_replace(&alphabet, 1, &[9], ReplaceMode::Single)
                .unwrap();
        let image = replacer.apply(&[1, 2, 1]).unwrap();
        assert!(image.is_in_lang(&[9, 2, 1]));
        assert!(!image.is_in_lang(&[9, 2, 9]));
    }

    #[test]
    fn single_symbol_replace_with_longer_word() {
        let alphabet = EnumAlphabet::from_symbols([1, 2]);
        let replacer =
            create_identity_with_single_symbol_replace(&alphabet, 2, &[7, 8], ReplaceMode::All)
                .unwrap();
        let image = replacer.apply(&[2, 1]).unwrap();
        assert!(image.is_in_lang(&[7, 8, 1]));
    }
}
