//! Symbol environment: one map from identifier to a kind-tagged value.
//!
//! The single tagged variant makes "at most one kind per identifier" a
//! structural invariant: binding a name under a new kind evicts whatever it
//! held before, which is exactly the language's dynamic reclassification
//! rule. The constant set is tracked separately because constness is a
//! property of the name, not of the value it currently holds.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ir::StrId;

/// A numeric value, always stored as f64. `is_float` remembers whether a
/// float-looking literal (or an operand already marked floating) took part in
/// producing it; print formatting consults this.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumValue {
  pub value: f64,
  pub is_float: bool,
}

impl NumValue {
  pub fn new(value: f64, is_float: bool) -> Self {
    Self { value, is_float }
  }

  /// True when the value should print with decimals.
  pub fn is_floating(&self) -> bool {
    self.is_float || self.value.fract() != 0.0
  }
}

/// A boolean, represented as a reference to an immutable "true"/"false" text
/// constant. The newtype keeps the representation swappable: callers only ask
/// for the constant reference, never assume the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolValue(pub StrId);

impl BoolValue {
  pub fn constant(&self) -> StrId {
    self.0
  }
}

/// What an identifier is currently bound to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Symbol {
  Numeric(NumValue),
  Str(StrId),
  Boolean(BoolValue),
}

/// The compilation unit's whole environment. There is no scoping: symbols
/// live until compilation ends.
#[derive(Debug, Default)]
pub struct SymbolTable {
  symbols: FxHashMap<String, Symbol>,
  constants: FxHashSet<String>,
}

impl SymbolTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn lookup(&self, name: &str) -> Option<&Symbol> {
    self.symbols.get(name)
  }

  /// Bind `name` to `symbol`, evicting any previous kind.
  pub fn bind(&mut self, name: &str, symbol: Symbol) {
    self.symbols.insert(name.to_string(), symbol);
  }

  /// Remove `name` from whatever kind-slot it occupies.
  pub fn unbind(&mut self, name: &str) {
    self.symbols.remove(name);
  }

  pub fn is_bound(&self, name: &str) -> bool {
    self.symbols.contains_key(name)
  }

  pub fn is_numeric(&self, name: &str) -> bool {
    matches!(self.symbols.get(name), Some(Symbol::Numeric(_)))
  }

  pub fn is_string(&self, name: &str) -> bool {
    matches!(self.symbols.get(name), Some(Symbol::Str(_)))
  }

  pub fn is_boolean(&self, name: &str) -> bool {
    matches!(self.symbols.get(name), Some(Symbol::Boolean(_)))
  }

  /// Membership is permanent for the remainder of compilation.
  pub fn mark_constant(&mut self, name: &str) {
    self.constants.insert(name.to_string());
  }

  pub fn is_constant(&self, name: &str) -> bool {
    self.constants.contains(name)
  }
}
