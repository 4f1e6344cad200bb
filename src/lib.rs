//! Automata and transducer toolkit for regular-language reasoning.
//!
//! The crate provides the sparse transition relation [`nfa::Delta`], the
//! classical algorithms over it (product, determinization, reversal,
//! trimming, minimization, emptiness, inclusion, equivalence, membership),
//! and the level-tagged transducer extension [`nft::Nft`] with composition,
//! projection, and the reluctant-replace constructions used for string
//! solving. Regex compilation is out of scope: the algorithms consume
//! automata built through the structural APIs.

pub mod alphabet;
pub mod errors;
pub mod format;
pub mod nfa;
pub mod nft;
pub mod ord_vector;
pub mod sparse_set;

pub use alphabet::{
    Alphabet, EnumAlphabet, IntAlphabet, OnTheFlyAlphabet, Symbol, DONT_CARE, EPSILON,
};
pub use errors::{AutomataError, Result};
pub use nfa::{Nfa, State, Word};
pub use nft::{Level, Nft};
pub use ord_vector::OrdVector;
pub use sparse_set::SparseSet;
