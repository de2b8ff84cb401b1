// Parallel string-rewriting grammar (L-system) for plant structure.
//
// A plant's branching structure is encoded as a string of `Symbol`s and grown
// by repeatedly applying production rules to every symbol simultaneously.
// Rewriting is context-free: each symbol's replacement depends only on the
// symbol itself. Symbols without a rule are copied through unchanged, so
// structural symbols (`+ - [ ]`) survive every iteration.
//
// The number of iterations applied on a growth step is derived from the
// plant's environment: `effective_iterations()` scales the stage's nominal
// count by the water and light factors and floors the result, so a plant in
// poor conditions stays structurally simpler than a well-kept one at the
// same stage.
//
// Expansion is exponential in the iteration count. `expanded_len()` predicts
// the result length in closed form (per-symbol length recurrence) without
// materializing the string, which lets tests check growth rates and lets the
// caller clamp the iteration count before doing the work.
//
// See also: `turtle.rs` which interprets the expanded string into geometry,
// `config.rs` for `GrammarParams` / `ProductionRule`, `plant.rs` which drives
// expand-then-interpret on each successful growth step.
//
// **Critical constraint: determinism.** Rewriting is a pure function of the
// axiom, the rules and the iteration count. No randomness enters here.

use crate::config::{GrammarParams, ProductionRule};
use rustc_hash::FxHashMap;
use std::fmt;

/// Errors detected when compiling grammar parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("axiom must not be empty")]
    EmptyAxiom,
    #[error("`{text}` has unbalanced brackets")]
    UnbalancedBrackets { text: String },
    #[error("bracket symbol `{0}` cannot be rewritten")]
    BracketPredecessor(char),
    #[error("duplicate rule for `{0}`")]
    DuplicateRule(char),
}

// ---------------------------------------------------------------------------
// Symbols
// ---------------------------------------------------------------------------

/// One grammar symbol. Only the first five carry turtle meaning; every other
/// character is a `Variable` that rewrites but draws nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    /// `F`: draw forward, emitting a branch segment.
    Draw,
    /// `+`: rotate by the positive branching angle.
    RotatePositive,
    /// `-`: rotate by the negative branching angle.
    RotateNegative,
    /// `[`: push the turtle state.
    PushState,
    /// `]`: pop the turtle state.
    PopState,
    Variable(char),
}

impl Symbol {
    pub fn from_char(c: char) -> Self {
        match c {
            'F' => Symbol::Draw,
            '+' => Symbol::RotatePositive,
            '-' => Symbol::RotateNegative,
            '[' => Symbol::PushState,
            ']' => Symbol::PopState,
            other => Symbol::Variable(other),
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Symbol::Draw => 'F',
            Symbol::RotatePositive => '+',
            Symbol::RotateNegative => '-',
            Symbol::PushState => '[',
            Symbol::PopState => ']',
            Symbol::Variable(c) => c,
        }
    }
}

/// An ordered sequence of symbols.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SymbolString(Vec<Symbol>);

impl SymbolString {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Symbol> {
        self.0.iter()
    }

    pub fn push(&mut self, symbol: Symbol) {
        self.0.push(symbol);
    }

    pub fn extend_from(&mut self, other: &SymbolString) {
        self.0.extend_from_slice(&other.0);
    }

    /// Number of `Draw` symbols, i.e. segments the turtle will emit.
    pub fn draw_count(&self) -> usize {
        self.0.iter().filter(|s| **s == Symbol::Draw).count()
    }

    /// Succeeds if every `]` closes an earlier `[` and nothing stays open.
    pub fn check_balanced(&self) -> Result<(), GrammarError> {
        let mut depth: usize = 0;
        for symbol in &self.0 {
            match symbol {
                Symbol::PushState => depth += 1,
                Symbol::PopState => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| self.unbalanced())?;
                }
                _ => {}
            }
        }
        if depth == 0 {
            Ok(())
        } else {
            Err(self.unbalanced())
        }
    }

    fn unbalanced(&self) -> GrammarError {
        GrammarError::UnbalancedBrackets {
            text: self.to_string(),
        }
    }
}

impl From<&str> for SymbolString {
    fn from(text: &str) -> Self {
        Self(text.chars().map(Symbol::from_char).collect())
    }
}

impl FromIterator<Symbol> for SymbolString {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a SymbolString {
    type Item = &'a Symbol;
    type IntoIter = std::slice::Iter<'a, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for SymbolString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.0 {
            fmt::Write::write_char(f, symbol.as_char())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Production rules keyed by predecessor symbol.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: FxHashMap<Symbol, SymbolString>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, replacing any existing rule for `predecessor`.
    pub fn with_rule(mut self, predecessor: char, successor: &str) -> Self {
        self.rules
            .insert(Symbol::from_char(predecessor), SymbolString::from(successor));
        self
    }

    /// Compile config rules, rejecting rules that would break bracket nesting.
    pub fn from_rules(rules: &[ProductionRule]) -> Result<Self, GrammarError> {
        let mut set = Self::new();
        for rule in rules {
            let predecessor = Symbol::from_char(rule.predecessor);
            if matches!(predecessor, Symbol::PushState | Symbol::PopState) {
                return Err(GrammarError::BracketPredecessor(rule.predecessor));
            }
            let successor = SymbolString::from(rule.successor.as_str());
            successor.check_balanced()?;
            if set.rules.insert(predecessor, successor).is_some() {
                return Err(GrammarError::DuplicateRule(rule.predecessor));
            }
        }
        Ok(set)
    }

    pub fn successor(&self, symbol: Symbol) -> Option<&SymbolString> {
        self.rules.get(&symbol)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Apply `rules` to every symbol of `axiom` in parallel, `iterations` times.
///
/// Zero iterations returns the axiom unchanged.
pub fn expand(axiom: &SymbolString, rules: &RuleSet, iterations: u32) -> SymbolString {
    let mut current = axiom.clone();
    for _ in 0..iterations {
        let mut next = SymbolString::with_capacity(current.len() * 2);
        for &symbol in &current {
            match rules.successor(symbol) {
                Some(successor) => next.extend_from(successor),
                None => next.push(symbol),
            }
        }
        current = next;
    }
    current
}

/// Length `expand(axiom, rules, iterations)` would produce, without
/// building the string. Saturates at `u64::MAX`.
pub fn expanded_len(axiom: &SymbolString, rules: &RuleSet, iterations: u32) -> u64 {
    // lengths[s] = length of symbol s after the current number of iterations.
    let mut lengths: FxHashMap<Symbol, u64> = FxHashMap::default();
    let symbols: Vec<Symbol> = {
        let mut all: Vec<Symbol> = axiom.iter().copied().collect();
        for successor in rules.rules.values() {
            all.extend(successor.iter().copied());
        }
        all.extend(rules.rules.keys().copied());
        all.sort();
        all.dedup();
        all
    };
    for &s in &symbols {
        lengths.insert(s, 1);
    }
    for _ in 0..iterations {
        let mut next = FxHashMap::default();
        for &s in &symbols {
            let len = match rules.successor(s) {
                Some(successor) => successor
                    .iter()
                    .fold(0u64, |acc, c| acc.saturating_add(lengths[c])),
                None => 1,
            };
            next.insert(s, len);
        }
        lengths = next;
    }
    axiom
        .iter()
        .fold(0u64, |acc, s| acc.saturating_add(lengths[s]))
}

/// Environment-scaled iteration count: `floor(base * light * water)`.
///
/// Both factors are clamped to [0, 1], so the result never exceeds `base`.
pub fn effective_iterations(base: u32, light_factor: f32, water_factor: f32) -> u32 {
    let l = light_factor.clamp(0.0, 1.0);
    let w = water_factor.clamp(0.0, 1.0);
    (base as f32 * l * w).floor() as u32
}

// ---------------------------------------------------------------------------
// Compiled grammar
// ---------------------------------------------------------------------------

/// An axiom plus its compiled rule set, ready to expand.
#[derive(Clone, Debug)]
pub struct Grammar {
    pub axiom: SymbolString,
    pub rules: RuleSet,
    pub max_iterations: u32,
}

impl Grammar {
    pub fn from_params(params: &GrammarParams) -> Result<Self, GrammarError> {
        if params.axiom.is_empty() {
            return Err(GrammarError::EmptyAxiom);
        }
        let axiom = SymbolString::from(params.axiom.as_str());
        axiom.check_balanced()?;
        Ok(Self {
            axiom,
            rules: RuleSet::from_rules(&params.rules)?,
            max_iterations: params.max_iterations,
        })
    }

    /// Expand the axiom, clamping to the configured iteration ceiling.
    pub fn expand(&self, iterations: u32) -> SymbolString {
        expand(&self.axiom, &self.rules, iterations.min(self.max_iterations))
    }
}
