use std::collections::HashSet;
use std::fmt;

use log::debug;

pub const BUILTIN_OUTPUT: &str = "output";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Variable => "var",
            SymbolKind::Parameter => "param",
            SymbolKind::Function => "func",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub lexeme: String,
    pub address: usize,
    pub kind: SymbolKind,
    pub line: usize,
    pub scope: usize,
    /// First quadruple of a function body.
    pub entry: Option<usize>,
    /// Arity of a function, element count of an array.
    pub count: usize,
    pub live: bool,
    pub has_return_value: bool,
}

impl Symbol {
    pub fn is_function(&self) -> bool {
        self.kind == SymbolKind::Function
    }
}

/// Outcome of matching a call site against the overload set of a lexeme.
#[derive(Debug, PartialEq, Eq)]
pub enum CallResolution<'a> {
    Exact(&'a Symbol),
    /// No overload takes that many arguments; the first declared one stands in.
    Fallback(&'a Symbol),
    Unknown,
}

/// Every declaration event of the compilation, oldest first.
///
/// Symbols are never removed: leaving a scope only clears their `live` flag,
/// so addresses baked into already emitted code can still be traced back to a
/// lexeme.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<usize>,
    globals: Vec<HashSet<String>>,
    next_address: usize,
    step: usize,
}

impl SymbolTable {
    pub fn new(start_address: usize, step: usize) -> Self {
        let mut table = Self {
            symbols: vec![],
            scopes: vec![],
            globals: vec![],
            next_address: start_address,
            step,
        };
        table.add_symbol(BUILTIN_OUTPUT, SymbolKind::Function, 0, true);
        table
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(self.symbols.len());
        self.globals.push(HashSet::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
        self.globals.pop();
    }

    /// Marks `lexeme` as referring to the outer binding for the rest of the current function.
    pub fn declare_global(&mut self, lexeme: &str) {
        if let Some(globals) = self.globals.last_mut() {
            globals.insert(lexeme.to_string());
        }
    }

    fn is_declared_global(&self, lexeme: &str) -> bool {
        self.globals
            .last()
            .is_some_and(|globals| globals.contains(lexeme))
    }

    fn live(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().rev().filter(|s| s.live)
    }

    /// Nearest live symbol with this lexeme.
    pub fn lookup(&self, lexeme: &str) -> Option<&Symbol> {
        self.live().find(|s| s.lexeme == lexeme)
    }

    pub fn lookup_address(&self, address: usize) -> Option<&Symbol> {
        self.live().find(|s| s.address == address)
    }

    pub fn lookup_kind(&self, kind: SymbolKind) -> Option<&Symbol> {
        self.live().find(|s| s.kind == kind)
    }

    pub fn lookup_function(&self, lexeme: &str) -> Option<&Symbol> {
        self.live().find(|s| s.is_function() && s.lexeme == lexeme)
    }

    /// Resolves an address to its lexeme, including symbols whose scope has closed.
    pub fn lexeme_of(&self, address: usize) -> Option<&str> {
        self.symbols
            .iter()
            .find(|s| s.address == address)
            .map(|s| s.lexeme.as_str())
    }

    fn get_mut(&mut self, address: usize) -> Option<&mut Symbol> {
        self.symbols.iter_mut().find(|s| s.address == address)
    }

    fn next_address(&mut self) -> usize {
        let address = self.next_address;
        self.next_address += self.step;
        address
    }

    /// Appends a symbol at the current depth and returns its address. Unless
    /// `force` is set, a live symbol of the same lexeme in the current scope is
    /// reused instead.
    pub fn add_symbol(
        &mut self,
        lexeme: &str,
        kind: SymbolKind,
        line: usize,
        force: bool,
    ) -> usize {
        let depth = self.depth();
        if !force {
            if let Some(symbol) = self.lookup(lexeme).filter(|s| s.scope == depth) {
                return symbol.address;
            }
        }

        let address = self.next_address();
        debug!("declare {} {} at {} (scope {})", kind.as_str(), lexeme, address, depth);
        self.symbols.push(Symbol {
            lexeme: lexeme.to_string(),
            address,
            kind,
            line,
            scope: depth,
            entry: None,
            count: 0,
            live: true,
            has_return_value: false,
        });
        address
    }

    /// Address written by an assignment to `lexeme`.
    ///
    /// A binding from an enclosing scope is shadowed by a fresh local one
    /// unless the current function declared the lexeme `global`.
    pub fn declare_or_lookup(&mut self, lexeme: &str, line: usize) -> usize {
        let depth = self.depth();
        let nearest = self
            .live()
            .find(|s| !s.is_function() && s.lexeme == lexeme)
            .map(|s| (s.address, s.scope));

        match nearest {
            Some((address, scope)) if scope == depth => address,
            Some((address, _)) if self.is_declared_global(lexeme) => address,
            _ => self.add_symbol(lexeme, SymbolKind::Variable, line, true),
        }
    }

    /// Demotes every symbol declared after `from_address`.
    pub fn kill_block(&mut self, from_address: usize) {
        for symbol in self.symbols.iter_mut().rev() {
            if symbol.address == from_address {
                break;
            }
            symbol.live = false;
        }
    }

    pub fn kill(&mut self, address: usize) {
        if let Some(symbol) = self.get_mut(address) {
            symbol.live = false;
        }
    }

    pub fn set_entry(&mut self, address: usize, entry: usize) {
        if let Some(symbol) = self.get_mut(address) {
            symbol.entry = Some(entry);
        }
    }

    pub fn set_count(&mut self, address: usize, count: usize) {
        if let Some(symbol) = self.get_mut(address) {
            symbol.count = count;
        }
    }

    pub fn increment_count(&mut self, address: usize) {
        if let Some(symbol) = self.get_mut(address) {
            symbol.count += 1;
        }
    }

    pub fn mark_has_return_value(&mut self, address: usize) {
        if let Some(symbol) = self.get_mut(address) {
            symbol.has_return_value = true;
        }
    }

    /// Live parameters declared right after the function at `address`, in declaration order.
    pub fn parameters_of(&self, address: usize) -> Vec<usize> {
        self.symbols
            .iter()
            .skip_while(|s| s.address != address)
            .skip(1)
            .take_while(|s| s.kind == SymbolKind::Parameter)
            .filter(|s| s.live)
            .map(|s| s.address)
            .collect()
    }

    /// Whether the most recent function leaves the `(lexeme, arity)` overload key unique.
    pub fn is_last_function_valid(&self) -> bool {
        let Some(last) = self.lookup_kind(SymbolKind::Function) else {
            return true;
        };
        !self.live().any(|s| {
            s.is_function()
                && s.address != last.address
                && s.lexeme == last.lexeme
                && s.count == last.count
        })
    }

    pub fn resolve_call_target(&self, lexeme: &str, args: usize) -> CallResolution<'_> {
        let mut candidates = self
            .symbols
            .iter()
            .filter(|s| s.live && s.is_function() && s.lexeme == lexeme);

        let Some(first) = candidates.next() else {
            return CallResolution::Unknown;
        };
        if first.count == args {
            return CallResolution::Exact(first);
        }
        match candidates.find(|s| s.count == args) {
            Some(symbol) => CallResolution::Exact(symbol),
            None => CallResolution::Fallback(first),
        }
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<4}{:<10} {:<8} {:<6} {:<6} {:<6} {:<6} {:<6} {:<6} {:<6}",
            "", "lexeme", "address", "entry", "kind", "count", "line", "live", "scope", "return"
        )?;
        for (i, s) in self.symbols.iter().enumerate() {
            let entry = s.entry.map(|e| e.to_string()).unwrap_or_default();
            writeln!(
                f,
                "{:<4}{:<10} {:<8} {:<6} {:<6} {:<6} {:<6} {:<6} {:<6} {:<6}",
                i,
                s.lexeme,
                s.address,
                entry,
                s.kind.as_str(),
                s.count,
                s.line,
                s.live,
                s.scope,
                s.has_return_value
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SymbolTable {
        SymbolTable::new(100, 4)
    }

    #[test]
    fn output_is_predefined_first() {
        let table = table();
        let output = table.lookup(BUILTIN_OUTPUT).unwrap();
        assert_eq!(output.address, 100);
        assert!(output.is_function());
    }

    #[test]
    fn assignment_reuses_same_scope_binding() {
        let mut table = table();
        let x = table.declare_or_lookup("x", 1);
        assert_eq!(x, 104);
        assert_eq!(table.declare_or_lookup("x", 2), x);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn function_scope_shadows_unless_global() {
        let mut table = table();
        let outer = table.declare_or_lookup("x", 1);
        let f = table.add_symbol("f", SymbolKind::Function, 2, true);
        table.push_scope();

        let shadow = table.declare_or_lookup("x", 3);
        assert_ne!(shadow, outer);
        assert_eq!(table.lookup("x").unwrap().address, shadow);

        table.kill_block(f);
        table.pop_scope();
        assert_eq!(table.lookup("x").unwrap().address, outer);
        assert_eq!(table.lexeme_of(shadow), Some("x"));
        assert!(table.lookup_address(shadow).is_none());

        let g = table.add_symbol("g", SymbolKind::Function, 4, true);
        table.push_scope();
        table.declare_global("x");
        assert_eq!(table.declare_or_lookup("x", 5), outer);
        table.kill_block(g);
        table.pop_scope();

        table.push_scope();
        assert_ne!(table.declare_or_lookup("x", 6), outer);
    }

    #[test]
    fn overloads_resolve_by_arity() {
        let mut table = table();
        let f1 = table.add_symbol("f", SymbolKind::Function, 1, true);
        table.increment_count(f1);
        assert!(table.is_last_function_valid());

        let f2 = table.add_symbol("f", SymbolKind::Function, 2, true);
        table.increment_count(f2);
        table.increment_count(f2);
        assert!(table.is_last_function_valid());

        assert_eq!(
            table.resolve_call_target("f", 1),
            CallResolution::Exact(table.lookup_address(f1).unwrap())
        );
        assert_eq!(
            table.resolve_call_target("f", 2),
            CallResolution::Exact(table.lookup_address(f2).unwrap())
        );
        assert_eq!(
            table.resolve_call_target("f", 3),
            CallResolution::Fallback(table.lookup_address(f1).unwrap())
        );
        assert_eq!(table.resolve_call_target("g", 0), CallResolution::Unknown);

        let dup = table.add_symbol("f", SymbolKind::Function, 3, true);
        table.increment_count(dup);
        assert!(!table.is_last_function_valid());
        table.kill(dup);
        assert!(table.is_last_function_valid());
    }

    #[test]
    fn parameters_follow_their_function() {
        let mut table = table();
        let f = table.add_symbol("f", SymbolKind::Function, 1, true);
        table.push_scope();
        let a = table.add_symbol("a", SymbolKind::Parameter, 1, true);
        let b = table.add_symbol("b", SymbolKind::Parameter, 1, true);
        table.declare_or_lookup("local", 2);
        assert_eq!(table.parameters_of(f), vec![a, b]);
    }
}
