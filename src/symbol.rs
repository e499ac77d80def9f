use std::fmt;

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

use crate::instr::MAX_CONSTANT;

// Symbol -> address, iterated in binding order
type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// First RAM address handed out to variables.
pub const VARIABLE_BASE: u16 = 16;

/// Bound before any program symbol. Order matters for reverse lookup.
const PREDEFINED: [(&str, u16); 23] = [
    ("R0", 0),
    ("R1", 1),
    ("R2", 2),
    ("R3", 3),
    ("R4", 4),
    ("R5", 5),
    ("R6", 6),
    ("R7", 7),
    ("R8", 8),
    ("R9", 9),
    ("R10", 10),
    ("R11", 11),
    ("R12", 12),
    ("R13", 13),
    ("R14", 14),
    ("R15", 15),
    ("SP", 0),
    ("LCL", 1),
    ("ARG", 2),
    ("THIS", 3),
    ("THAT", 4),
    ("SCREEN", 0x4000),
    ("KBD", 0x6000),
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SymbolKind {
    /// Register aliases and I/O base addresses.
    Predefined,
    /// `(NAME)`, bound to the ROM address of the next instruction.
    Label,
    /// Bound implicitly on first use to the next free RAM address.
    Variable,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Symbol {
    pub address: u16,
    pub kind: SymbolKind,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SymbolError {
    /// Names are bound once for the lifetime of a table.
    AlreadyBound { name: String, address: u16 },
    InvalidName { name: String },
    /// A label past the end of the addressable ROM.
    AddressOutOfRange { name: String, address: usize },
    /// No free address left for a new variable.
    AddressSpaceExhausted { name: String },
}

impl std::error::Error for SymbolError {}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyBound { name, address } => {
                write!(f, "symbol '{name}' is already bound to address {address}")
            }
            Self::InvalidName { name } => write!(f, "'{name}' is not a valid symbol name"),
            Self::AddressOutOfRange { name, address } => {
                write!(f, "label '{name}' would point at {address}, past the end of ROM")
            }
            Self::AddressSpaceExhausted { name } => {
                write!(f, "no free address left for variable '{name}'")
            }
        }
    }
}

/// Test whether `name` can be used as a label or variable.
///
/// Letters, digits, `_`, `.`, `$` and `:`, not starting with a digit.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let is_sym = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$' | ':');
    !first.is_ascii_digit() && is_sym(first) && chars.all(is_sym)
}

/// Mapping of label and variable names to addresses.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    table: FxMap<String, Symbol>,
    /// Index into `table` of the first symbol bound to each address.
    by_addr: FxMap<u16, usize>,
    next_var: u16,
}

impl SymbolTable {
    /// Table holding only the predefined symbols.
    pub fn new() -> Self {
        let mut table = Self::empty();
        for (name, address) in PREDEFINED {
            table.insert(name.to_string(), address, SymbolKind::Predefined);
        }
        table
    }

    /// Table with no symbols at all, not even the predefined ones.
    pub fn empty() -> Self {
        SymbolTable {
            table: FxMap::default(),
            by_addr: FxMap::default(),
            next_var: VARIABLE_BASE,
        }
    }

    fn insert(&mut self, name: String, address: u16, kind: SymbolKind) {
        let (idx, _) = self.table.insert_full(name, Symbol { address, kind });
        self.by_addr.entry(address).or_insert(idx);
    }

    pub fn get(&self, name: &str) -> Option<u16> {
        self.table.get(name).map(|sym| sym.address)
    }

    pub fn symbol(&self, name: &str) -> Option<Symbol> {
        self.table.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// First name bound to `address`, if any.
    pub fn name_of(&self, address: u16) -> Option<&str> {
        let idx = *self.by_addr.get(&address)?;
        self.table.get_index(idx).map(|(name, _)| name.as_str())
    }

    /// Bind a label to a ROM address.
    pub fn bind_label(&mut self, name: &str, address: usize) -> Result<u16, SymbolError> {
        if !is_valid_name(name) {
            return Err(SymbolError::InvalidName { name: name.into() });
        }
        if let Some(sym) = self.table.get(name) {
            return Err(SymbolError::AlreadyBound {
                name: name.into(),
                address: sym.address,
            });
        }
        let address = u16::try_from(address)
            .ok()
            .filter(|addr| *addr <= MAX_CONSTANT)
            .ok_or_else(|| SymbolError::AddressOutOfRange {
                name: name.into(),
                address,
            })?;
        self.insert(name.into(), address, SymbolKind::Label);
        Ok(address)
    }

    /// Look up `name`, binding it as a new variable if it is not yet known.
    ///
    /// Variables take the lowest free address at or after the last one handed out, starting
    /// at [`VARIABLE_BASE`], skipping addresses that already carry a symbol.
    pub fn resolve(&mut self, name: &str) -> Result<u16, SymbolError> {
        if let Some(address) = self.get(name) {
            return Ok(address);
        }
        if !is_valid_name(name) {
            return Err(SymbolError::InvalidName { name: name.into() });
        }
        let mut address = self.next_var;
        while self.by_addr.contains_key(&address) {
            address += 1;
        }
        if address > MAX_CONSTANT {
            return Err(SymbolError::AddressSpaceExhausted { name: name.into() });
        }
        self.next_var = address + 1;
        self.insert(name.into(), address, SymbolKind::Variable);
        Ok(address)
    }

    /// Symbols in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Symbol)> {
        self.table.iter().map(|(name, sym)| (name.as_str(), *sym))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
