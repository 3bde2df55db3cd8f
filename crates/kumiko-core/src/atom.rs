//! The dynamically typed value carried by every message and property.
//!
//! [`Atom`] is a closed sum type. Scalars are copied by value; vectors and
//! dicos are reference counted and copied on write, so cloning an atom that
//! holds a large list is cheap.
//!
//! Accessors never fail. Asking a symbol for its integer value yields `0`,
//! asking a number for its symbol yields the empty symbol, and so on. Message
//! handlers can therefore read partially specified messages without checking
//! every variant first.
//!
//! # Parsing
//!
//! [`Atom::parse`] turns a line of text into a list of atoms:
//!
//! ```rust
//! use kumiko_core::Atom;
//!
//! let atoms = Atom::parse("foo \"bar 42\" 1 2 3.14");
//! assert_eq!(atoms.len(), 5);
//! assert_eq!(atoms[1], Atom::from("bar 42"));
//! assert_eq!(atoms[4], Atom::Double(3.14));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::dico::Dico;
use crate::symbol::Symbol;

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Atom {
    /// No value.
    #[default]
    Undefined,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Long(i64),
    /// Floating-point number.
    Double(f64),
    /// Interned symbol.
    Symbol(Symbol),
    /// Ordered list of atoms.
    Vector(Arc<Vec<Atom>>),
    /// Nested associative container.
    Dico(Arc<Dico>),
}

impl Atom {
    /// Builds a vector atom.
    pub fn vector(atoms: impl Into<Vec<Atom>>) -> Self {
        Atom::Vector(Arc::new(atoms.into()))
    }

    /// Builds a dico atom.
    pub fn dico(dico: Dico) -> Self {
        Atom::Dico(Arc::new(dico))
    }

    /// Returns true for [`Atom::Undefined`].
    pub fn is_undefined(&self) -> bool {
        matches!(self, Atom::Undefined)
    }

    /// Returns true for [`Atom::Bool`].
    pub fn is_bool(&self) -> bool {
        matches!(self, Atom::Bool(_))
    }

    /// Returns true for [`Atom::Long`].
    pub fn is_long(&self) -> bool {
        matches!(self, Atom::Long(_))
    }

    /// Returns true for [`Atom::Double`].
    pub fn is_double(&self) -> bool {
        matches!(self, Atom::Double(_))
    }

    /// Returns true for the numeric variants (bool, long, double).
    pub fn is_number(&self) -> bool {
        matches!(self, Atom::Bool(_) | Atom::Long(_) | Atom::Double(_))
    }

    /// Returns true for [`Atom::Symbol`].
    pub fn is_symbol(&self) -> bool {
        matches!(self, Atom::Symbol(_))
    }

    /// Returns true for [`Atom::Vector`].
    pub fn is_vector(&self) -> bool {
        matches!(self, Atom::Vector(_))
    }

    /// Returns true for [`Atom::Dico`].
    pub fn is_dico(&self) -> bool {
        matches!(self, Atom::Dico(_))
    }

    /// Boolean value; non-zero numbers are true, everything else is false.
    pub fn as_bool(&self) -> bool {
        match self {
            Atom::Bool(b) => *b,
            Atom::Long(l) => *l != 0,
            Atom::Double(d) => *d != 0.0,
            _ => false,
        }
    }

    /// Integer value; doubles truncate toward zero, non-numbers yield 0.
    pub fn as_long(&self) -> i64 {
        match self {
            Atom::Bool(b) => i64::from(*b),
            Atom::Long(l) => *l,
            Atom::Double(d) => *d as i64,
            _ => 0,
        }
    }

    /// Floating-point value; non-numbers yield 0.0.
    pub fn as_double(&self) -> f64 {
        match self {
            Atom::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Atom::Long(l) => *l as f64,
            Atom::Double(d) => *d,
            _ => 0.0,
        }
    }

    /// Symbol value; non-symbols yield the empty symbol.
    pub fn as_symbol(&self) -> Symbol {
        match self {
            Atom::Symbol(s) => *s,
            _ => Symbol::empty(),
        }
    }

    /// List contents; non-vectors yield an empty slice.
    pub fn as_vector(&self) -> &[Atom] {
        match self {
            Atom::Vector(v) => v.as_slice(),
            _ => &[],
        }
    }

    /// Nested dico, if this atom holds one.
    pub fn as_dico(&self) -> Option<&Dico> {
        match self {
            Atom::Dico(d) => Some(d),
            _ => None,
        }
    }

    /// Mutable access to the list contents, cloning a shared list first.
    ///
    /// Returns `None` for non-vector atoms.
    pub fn vector_mut(&mut self) -> Option<&mut Vec<Atom>> {
        match self {
            Atom::Vector(v) => Some(Arc::make_mut(v)),
            _ => None,
        }
    }

    /// Short lowercase name of the active variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Atom::Undefined => "undefined",
            Atom::Bool(_) => "bool",
            Atom::Long(_) => "long",
            Atom::Double(_) => "double",
            Atom::Symbol(_) => "symbol",
            Atom::Vector(_) => "vector",
            Atom::Dico(_) => "dico",
        }
    }

    /// Tokenizes `text` into atoms.
    ///
    /// Tokens are separated by whitespace. In priority order:
    ///
    /// 1. A double quote that has a matching closing quote later in the text
    ///    opens a quoted run, read as one symbol (spaces included, quotes
    ///    stripped). Inside the run `\"` stands for a quote and `\\` for a
    ///    backslash.
    /// 2. An optional leading `-`, then digits with at most one `.`, is a
    ///    number: [`Atom::Long`] without a dot, [`Atom::Double`] with one.
    ///    Any other character demotes the whole token to a symbol, and a
    ///    token without a single digit is a symbol too (`-`, `.`).
    /// 3. Everything else is interned as a symbol.
    pub fn parse(text: &str) -> Vec<Atom> {
        let chars: Vec<char> = text.chars().collect();
        let mut atoms = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                i += 1;
                continue;
            }

            if c == '"'
                && let Some((quoted, next)) = quoted_run(&chars, i + 1)
            {
                atoms.push(Atom::Symbol(Symbol::intern(&quoted)));
                i = next;
                continue;
            }

            let start = i;
            let mut numeric = true;
            let mut digits = 0usize;
            let mut dots = 0usize;
            while i < chars.len() && !chars[i].is_whitespace() {
                let ch = chars[i];
                if numeric {
                    if ch.is_ascii_digit() {
                        digits += 1;
                    } else if ch == '.' && dots == 0 {
                        dots += 1;
                    } else if !(ch == '-' && i == start) {
                        numeric = false;
                    }
                }
                i += 1;
            }

            let token: String = chars[start..i].iter().collect();
            atoms.push(Self::classify(&token, numeric && digits > 0, dots > 0));
        }

        atoms
    }

    fn classify(token: &str, numeric: bool, has_dot: bool) -> Atom {
        if numeric {
            if has_dot {
                if let Ok(value) = token.parse::<f64>() {
                    return Atom::Double(value);
                }
            } else if let Ok(value) = token.parse::<i64>() {
                return Atom::Long(value);
            } else if let Ok(value) = token.parse::<f64>() {
                // Integer overflow.
                return Atom::Double(value);
            }
        }
        Atom::Symbol(Symbol::intern(token))
    }

    /// Renders the atom as console text that [`Atom::parse`] reads back.
    ///
    /// A symbol is quoted whenever its bare text would read back as
    /// something else: empty, containing whitespace, opening with a quote,
    /// or looking like a number. Doubles always carry a `.` so they do not
    /// come back as longs.
    pub fn to_text(&self) -> String {
        match self {
            Atom::Undefined => String::new(),
            Atom::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Atom::Long(l) => l.to_string(),
            Atom::Double(d) => format_double(*d),
            Atom::Symbol(s) => {
                let text = s.as_str();
                let bare = !text.starts_with('"')
                    && matches!(Self::parse(text).as_slice(), [Atom::Symbol(read)] if read == s);
                if bare { text.to_string() } else { quote(text) }
            }
            Atom::Vector(v) => format!("[{}]", atoms_to_text(v)),
            Atom::Dico(d) => d.to_text().replace('\n', " "),
        }
    }
}

/// Reads a quoted run starting just after its opening quote. Returns the
/// unescaped text and the index past the closing quote.
fn quoted_run(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut out = String::new();
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '"' => return Some((out, i + 1)),
            '\\' if matches!(chars.get(i + 1), Some('"' | '\\')) => {
                out.push(chars[i + 1]);
                i += 2;
            }
            ch => {
                out.push(ch);
                i += 1;
            }
        }
    }
    None
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        if matches!(ch, '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Joins atoms into a single line of console text.
pub fn atoms_to_text(atoms: &[Atom]) -> String {
    atoms
        .iter()
        .map(Atom::to_text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats a double so that it always reads back as a double.
pub(crate) fn format_double(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

impl PartialEq for Atom {
    /// Same-variant values compare by value; the numeric variants compare
    /// with each other as numbers.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Atom::Undefined, Atom::Undefined) => true,
            (Atom::Symbol(a), Atom::Symbol(b)) => a == b,
            (Atom::Vector(a), Atom::Vector(b)) => Arc::ptr_eq(a, b) || a == b,
            (Atom::Dico(a), Atom::Dico(b)) => Arc::ptr_eq(a, b) || a == b,
            (Atom::Bool(a), Atom::Bool(b)) => a == b,
            (Atom::Long(a), Atom::Long(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => a.as_double() == b.as_double(),
            _ => false,
        }
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Undefined => write!(f, "Undefined"),
            Atom::Bool(b) => write!(f, "Bool({b})"),
            Atom::Long(l) => write!(f, "Long({l})"),
            Atom::Double(d) => write!(f, "Double({d})"),
            Atom::Symbol(s) => write!(f, "Symbol({:?})", s.as_str()),
            Atom::Vector(v) => f.debug_list().entries(v.iter()).finish(),
            Atom::Dico(d) => write!(f, "{d:?}"),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<bool> for Atom {
    fn from(value: bool) -> Self {
        Atom::Bool(value)
    }
}

impl From<i32> for Atom {
    fn from(value: i32) -> Self {
        Atom::Long(i64::from(value))
    }
}

impl From<i64> for Atom {
    fn from(value: i64) -> Self {
        Atom::Long(value)
    }
}

impl From<u32> for Atom {
    fn from(value: u32) -> Self {
        Atom::Long(i64::from(value))
    }
}

impl From<usize> for Atom {
    fn from(value: usize) -> Self {
        Atom::Long(value as i64)
    }
}

impl From<f32> for Atom {
    fn from(value: f32) -> Self {
        Atom::Double(f64::from(value))
    }
}

impl From<f64> for Atom {
    fn from(value: f64) -> Self {
        Atom::Double(value)
    }
}

impl From<Symbol> for Atom {
    fn from(value: Symbol) -> Self {
        Atom::Symbol(value)
    }
}

impl From<&str> for Atom {
    fn from(value: &str) -> Self {
        Atom::Symbol(Symbol::intern(value))
    }
}

impl From<String> for Atom {
    fn from(value: String) -> Self {
        Atom::Symbol(Symbol::intern(&value))
    }
}

impl From<Vec<Atom>> for Atom {
    fn from(value: Vec<Atom>) -> Self {
        Atom::vector(value)
    }
}

impl From<Dico> for Atom {
    fn from(value: Dico) -> Self {
        Atom::dico(value)
    }
}
