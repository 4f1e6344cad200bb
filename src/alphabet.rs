use std::collections::HashMap;

use crate::errors::{AutomataError, Result};
use crate::ord_vector::OrdVector;

/// A symbol is an opaque unsigned identifier. The core orders and compares
/// symbols but never interprets them.
pub type Symbol = u32;

/// The silent transition symbol. Being the maximum value, it always sorts
/// after every proper symbol in a [`crate::nfa::delta::StatePost`].
pub const EPSILON: Symbol = Symbol::MAX;

/// Wildcard tape-slot symbol, interpreted by the transducer layer: the
/// alphabet-less sigma-star builder loops on it and composition matches it
/// against any proper symbol. The automaton algorithms order and compare it
/// like any other symbol.
pub const DONT_CARE: Symbol = Symbol::MAX - 1;

/// Capability interface for translating between symbol names and symbol
/// values.
///
/// Concrete alphabets differ in how names map to values and in whether the
/// symbol universe can be enumerated; no inheritance tree is needed beyond
/// this trait.
pub trait Alphabet {
    /// Translates a symbol name to its value. Fails with
    /// [`AutomataError::NotFound`] for unknown names and
    /// [`AutomataError::InvalidArgument`] for names the alphabet cannot
    /// interpret at all.
    fn translate_symbol(&self, name: &str) -> Result<Symbol>;

    /// All symbols this alphabet knows, in ascending order. Fails with
    /// [`AutomataError::Unsupported`] when the universe is not enumerable.
    fn symbols(&self) -> Result<OrdVector<Symbol>>;

    /// Registers `name` (translating it if already known) and returns its
    /// symbol.
    fn register(&mut self, name: &str) -> Result<Symbol>;

    /// Display name of `symbol`, when the alphabet knows one. Printers fall
    /// back to the decimal rendering.
    fn name_of(&self, symbol: Symbol) -> Option<String> {
        let _ = symbol;
        None
    }
}

/// Alphabet whose symbol names are decimal renderings of the values
/// themselves. Cannot enumerate its (unbounded) universe.
#[derive(Debug, Clone, Default)]
pub struct IntAlphabet;

impl Alphabet for IntAlphabet {
    fn translate_symbol(&self, name: &str) -> Result<Symbol> {
        name.parse::<Symbol>().map_err(|_| {
            AutomataError::InvalidArgument(format!("'{name}' is not an integer symbol name"))
        })
    }

    fn symbols(&self) -> Result<OrdVector<Symbol>> {
        Err(AutomataError::Unsupported(
            "an integer alphabet cannot enumerate its symbols".to_owned(),
        ))
    }

    fn register(&mut self, name: &str) -> Result<Symbol> {
        self.translate_symbol(name)
    }

    fn name_of(&self, symbol: Symbol) -> Option<String> {
        Some(symbol.to_string())
    }
}

/// A fixed, finite set of symbols. Names are decimal renderings; translating
/// a name outside the set fails.
#[derive(Debug, Clone, Default)]
pub struct EnumAlphabet {
    symbols: OrdVector<Symbol>,
}

impl EnumAlphabet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_symbols(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self { symbols: symbols.into_iter().collect() }
    }

    pub fn add_symbol(&mut self, symbol: Symbol) {
        self.symbols.insert(symbol);
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.symbols.contains(&symbol)
    }

    /// Known symbols not occurring in `used`.
    pub fn complement(&self, used: &OrdVector<Symbol>) -> OrdVector<Symbol> {
        self.symbols.difference(used)
    }
}

impl Alphabet for EnumAlphabet {
    fn translate_symbol(&self, name: &str) -> Result<Symbol> {
        let symbol = name.parse::<Symbol>().map_err(|_| {
            AutomataError::InvalidArgument(format!("'{name}' is not an integer symbol name"))
        })?;
        if self.symbols.contains(&symbol) {
            Ok(symbol)
        } else {
            Err(AutomataError::NotFound(format!(
                "symbol '{name}' is not part of the alphabet"
            )))
        }
    }

    fn symbols(&self) -> Result<OrdVector<Symbol>> {
        Ok(self.symbols.clone())
    }

    fn register(&mut self, name: &str) -> Result<Symbol> {
        let symbol = name.parse::<Symbol>().map_err(|_| {
            AutomataError::InvalidArgument(format!("'{name}' is not an integer symbol name"))
        })?;
        self.symbols.insert(symbol);
        Ok(symbol)
    }

    fn name_of(&self, symbol: Symbol) -> Option<String> {
        self.symbols.contains(&symbol).then(|| symbol.to_string())
    }
}

/// Name-indexed alphabet that assigns fresh symbol values to unknown names on
/// registration.
#[derive(Debug, Clone, Default)]
pub struct OnTheFlyAlphabet {
    symbol_map: HashMap<String, Symbol>,
    next_value: Symbol,
}

impl OnTheFlyAlphabet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an alphabet from explicit name/value pairs.
    ///
    /// # Panics
    ///
    /// Panics when a name occurs twice.
    pub fn from_symbol_map(pairs: impl IntoIterator<Item = (String, Symbol)>) -> Self {
        let mut alphabet = Self::new();
        for (name, symbol) in pairs {
            alphabet.add_new_symbol(&name, symbol).expect("duplicate symbol name");
        }
        alphabet
    }

    /// Adds `name` with an explicit value; duplicate names are rejected.
    pub fn add_new_symbol(&mut self, name: &str, symbol: Symbol) -> Result<()> {
        if self.symbol_map.contains_key(name) {
            return Err(AutomataError::InvalidArgument(format!(
                "symbol name '{name}' is already registered"
            )));
        }
        self.symbol_map.insert(name.to_owned(), symbol);
        if symbol >= self.next_value {
            self.next_value = symbol + 1;
        }
        Ok(())
    }

    pub fn get_symbol_map(&self) -> &HashMap<String, Symbol> {
        &self.symbol_map
    }

    pub fn get_next_value(&self) -> Symbol {
        self.next_value
    }

    /// Name registered for `symbol`, if any.
    pub fn reverse_translate(&self, symbol: Symbol) -> Option<&str> {
        self.symbol_map
            .iter()
            .find(|&(_, &value)| value == symbol)
            .map(|(name, _)| name.as_str())
    }
}

impl Alphabet for OnTheFlyAlphabet {
    fn translate_symbol(&self, name: &str) -> Result<Symbol> {
        self.symbol_map
            .get(name)
            .copied()
            .ok_or_else(|| AutomataError::NotFound(format!("unknown symbol name '{name}'")))
    }

    fn symbols(&self) -> Result<OrdVector<Symbol>> {
        Ok(self.symbol_map.values().copied().collect())
    }

    fn register(&mut self, name: &str) -> Result<Symbol> {
        if let Some(&symbol) = self.symbol_map.get(name) {
            return Ok(symbol);
        }
        let symbol = self.next_value;
        self.symbol_map.insert(name.to_owned(), symbol);
        self.next_value += 1;
        Ok(symbol)
    }

    fn name_of(&self, symbol: Symbol) -> Option<String> {
        self.reverse_translate(symbol).map(str::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_alphabet_translates_decimal_names() {
        let alphabet = IntAlphabet;
        assert_eq!(alphabet.translate_symbol("42").unwrap(), 42);
        assert!(alphabet.translate_symbol("not a number").is_err());
        assert!(alphabet.symbols().is_err());
    }

    #[test]
    fn enum_alphabet_rejects_unknown_symbols() {
        let alphabet = EnumAlphabet::from_symbols([1, 2, 3]);
        assert_eq!(alphabet.translate_symbol("2").unwrap(), 2);
        assert!(matches!(
            alphabet.translate_symbol("7"),
            Err(AutomataError::NotFound(_))
        ));
        assert!(matches!(
            alphabet.translate_symbol("7x"),
            Err(AutomataError::InvalidArgument(_))
        ));
        assert_eq!(alphabet.symbols().unwrap().as_slice(), &[1, 2, 3]);
        assert_eq!(
            alphabet.complement(&OrdVector::from(vec![2])).as_slice(),
            &[1, 3]
        );
    }

    #[test]
    fn on_the_fly_alphabet_assigns_fresh_values() {
        let mut alphabet = OnTheFlyAlphabet::new();
        let a = alphabet.register("a").unwrap();
        let b = alphabet.register("b").unwrap();
        assert_eq!((a, b), (0, 1));
        assert_eq!(alphabet.register("a").unwrap(), 0);
        assert_eq!(alphabet.get_next_value(), 2);
        assert_eq!(alphabet.translate_symbol("b").unwrap(), 1);
        assert!(alphabet.translate_symbol("c").is_err());
    }

    #[test]
    fn on_the_fly_alphabet_rejects_duplicate_names() {
        let mut alphabet =
            OnTheFlyAlphabet::from_symbol_map([("a".to_owned(), 4), ("b".to_owned(), 2)]);
        assert!(alphabet.add_new_symbol("a", 0).is_err());
        assert_eq!(alphabet.symbols().unwrap().as_slice(), &[2, 4]);
        assert_eq!(alphabet.get_next_value(), 5);
        assert_eq!(alphabet.reverse_translate(2), Some("b"));
    }
}
