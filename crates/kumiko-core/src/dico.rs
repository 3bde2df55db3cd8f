//! Hierarchical associative container and its text notation.
//!
//! A [`Dico`] maps symbols to lists of atoms. An entry holding a single
//! [`Atom::Dico`] is a nested object, which is how patch files, box
//! descriptions and attribute snapshots are structured.
//!
//! # Text notation
//!
//! ```text
//! {
//!     "name" : "osc~",
//!     "arguments" : [ 440 ],
//!     "position" : [ 10.0, 20.0 ],
//!     "meta" : {
//!         "author" : "me"
//!     }
//! }
//! ```
//!
//! Values are quoted strings, bare numbers (a number without `.` or an
//! exponent is an integer), `true`/`false`, `null`, bracketed lists, or
//! objects. A multi-value entry is written as a list; a list nested inside a
//! list is a vector atom. A nested object that is an entry's only value is
//! spread over several lines, objects inside lists are written inline.
//!
//! Reading is line-oriented (one entry or brace per physical line) and
//! tolerant: a line that does not parse is skipped.

use std::fmt;

use indexmap::IndexMap;

use crate::atom::{Atom, format_double};
use crate::symbol::Symbol;

const INDENT: &str = "    ";

/// Ordered map from symbols to lists of atoms.
#[derive(Clone, Default, PartialEq)]
pub struct Dico {
    entries: IndexMap<Symbol, Vec<Atom>>,
}

impl Dico {
    /// Creates an empty dico.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the atoms stored under `key`, or an empty slice.
    pub fn get(&self, key: impl Into<Symbol>) -> &[Atom] {
        self.entries
            .get(&key.into())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the first atom stored under `key`, or [`Atom::Undefined`].
    pub fn get_atom(&self, key: impl Into<Symbol>) -> Atom {
        self.get(key).first().cloned().unwrap_or_default()
    }

    /// Returns the nested dico stored as the first atom under `key`.
    pub fn get_dico(&self, key: impl Into<Symbol>) -> Option<&Dico> {
        self.get(key).first().and_then(Atom::as_dico)
    }

    /// Replaces the atoms stored under `key`.
    pub fn set(&mut self, key: impl Into<Symbol>, atoms: impl Into<Vec<Atom>>) {
        self.entries.insert(key.into(), atoms.into());
    }

    /// Replaces the atoms stored under `key` with a single atom.
    pub fn set_atom(&mut self, key: impl Into<Symbol>, atom: impl Into<Atom>) {
        self.entries.insert(key.into(), vec![atom.into()]);
    }

    /// Appends one atom to the list stored under `key`, creating it if needed.
    pub fn append(&mut self, key: impl Into<Symbol>, atom: impl Into<Atom>) {
        self.entries.entry(key.into()).or_default().push(atom.into());
    }

    /// Returns true if `key` has an entry (possibly empty).
    pub fn has(&self, key: impl Into<Symbol>) -> bool {
        self.entries.contains_key(&key.into())
    }

    /// Removes the entry for `key`, returning its atoms.
    pub fn remove(&mut self, key: impl Into<Symbol>) -> Option<Vec<Atom>> {
        self.entries.shift_remove(&key.into())
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the keys in insertion order.
    pub fn keys(&self) -> Vec<Symbol> {
        self.entries.keys().copied().collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, atoms)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &[Atom])> {
        self.entries.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Copies every entry of `other` into `self`, replacing existing keys.
    pub fn merge(&mut self, other: Dico) {
        self.entries.extend(other.entries);
    }

    // --- Text notation ---

    /// Writes the dico in the brace-delimited text notation.
    pub fn to_text(&self) -> String {
        let mut out = String::from("{\n");
        self.write_entries(&mut out, 1);
        out.push_str("}\n");
        out
    }

    /// Parses the text notation. Malformed lines are skipped.
    pub fn from_text(text: &str) -> Dico {
        let mut dico = Dico::new();
        dico.read_text(text);
        dico
    }

    /// Parses the text notation and merges the entries into `self`.
    pub fn read_text(&mut self, text: &str) {
        // Objects being filled, with the key they will be stored under.
        let mut stack: Vec<(Dico, Option<Symbol>)> = Vec::new();

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if stack.is_empty() {
                if trimmed == "{" {
                    stack.push((Dico::new(), None));
                } else if let Some(atom) = parse_value_line(trimmed)
                    && let Atom::Dico(inline) = atom
                {
                    self.merge(Dico::clone(&inline));
                } else {
                    tracing::trace!(line = trimmed, "dico: skipped line outside object");
                }
                continue;
            }

            if trimmed == "}" || trimmed == "}," {
                close_object(&mut stack, self);
                continue;
            }

            let entry = trimmed.strip_suffix(',').unwrap_or(trimmed);
            match parse_entry_line(entry) {
                Some((key, EntryValue::Open)) => stack.push((Dico::new(), Some(key))),
                Some((key, EntryValue::Atoms(atoms))) => {
                    if let Some((current, _)) = stack.last_mut() {
                        current.set(key, atoms);
                    }
                }
                None => tracing::trace!(line = trimmed, "dico: skipped malformed line"),
            }
        }

        // Unterminated objects are kept.
        while !stack.is_empty() {
            close_object(&mut stack, self);
        }
    }

    fn write_entries(&self, out: &mut String, depth: usize) {
        let pad = INDENT.repeat(depth);
        let count = self.entries.len();
        for (i, (key, atoms)) in self.entries.iter().enumerate() {
            out.push_str(&pad);
            out.push_str(&quote(key.as_str()));
            out.push_str(" : ");
            match atoms.as_slice() {
                [Atom::Dico(nested)] if !nested.is_empty() => {
                    out.push_str("{\n");
                    nested.write_entries(out, depth + 1);
                    out.push_str(&pad);
                    out.push('}');
                }
                [single] if !single.is_vector() => out.push_str(&inline_value(single)),
                many => out.push_str(&inline_list(many)),
            }
            if i + 1 < count {
                out.push(',');
            }
            out.push('\n');
        }
    }
}

fn close_object(stack: &mut Vec<(Dico, Option<Symbol>)>, root: &mut Dico) {
    let Some((finished, key)) = stack.pop() else {
        return;
    };
    match (stack.last_mut(), key) {
        (Some((parent, _)), Some(key)) => parent.set(key, vec![Atom::dico(finished)]),
        (Some(_), None) => {}
        (None, _) => root.merge(finished),
    }
}

impl fmt::Debug for Dico {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k.as_str(), v)))
            .finish()
    }
}

// --- Writing helpers ---

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

fn inline_value(atom: &Atom) -> String {
    match atom {
        Atom::Undefined => "null".to_string(),
        Atom::Bool(b) => b.to_string(),
        Atom::Long(l) => l.to_string(),
        Atom::Double(d) => format_double(*d),
        Atom::Symbol(s) => quote(s.as_str()),
        Atom::Vector(v) => inline_list(v),
        Atom::Dico(d) => inline_object(d),
    }
}

fn inline_list(atoms: &[Atom]) -> String {
    if atoms.is_empty() {
        return "[]".to_string();
    }
    let items: Vec<String> = atoms.iter().map(inline_value).collect();
    format!("[ {} ]", items.join(", "))
}

fn inline_object(dico: &Dico) -> String {
    if dico.is_empty() {
        return "{}".to_string();
    }
    let items: Vec<String> = dico
        .entries
        .iter()
        .map(|(key, atoms)| {
            let value = match atoms.as_slice() {
                [single] if !single.is_vector() => inline_value(single),
                many => inline_list(many),
            };
            format!("{} : {}", quote(key.as_str()), value)
        })
        .collect();
    format!("{{ {} }}", items.join(", "))
}

// --- Reading helpers ---

enum EntryValue {
    /// The entry opens a multi-line object.
    Open,
    Atoms(Vec<Atom>),
}

fn parse_entry_line(line: &str) -> Option<(Symbol, EntryValue)> {
    let mut cursor = Cursor::new(line);
    let key = cursor.string()?;
    cursor.skip_ws();
    cursor.expect(':')?;
    cursor.skip_ws();
    if cursor.rest().trim() == "{" {
        return Some((Symbol::intern(&key), EntryValue::Open));
    }
    let atoms = cursor.entry_atoms()?;
    cursor.skip_ws();
    cursor.at_end().then_some((Symbol::intern(&key), EntryValue::Atoms(atoms)))
}

fn parse_value_line(line: &str) -> Option<Atom> {
    let line = line.strip_suffix(',').unwrap_or(line);
    let mut cursor = Cursor::new(line);
    let value = cursor.value()?;
    cursor.skip_ws();
    cursor.at_end().then_some(value)
}

/// Character cursor for the inline part of the notation.
struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn rest(&self) -> String {
        self.chars[self.pos.min(self.chars.len())..].iter().collect()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, ch: char) -> Option<()> {
        if self.peek() == Some(ch) {
            self.pos += 1;
            Some(())
        } else {
            None
        }
    }

    fn string(&mut self) -> Option<String> {
        self.skip_ws();
        self.expect('"')?;
        let mut out = String::new();
        loop {
            let ch = self.peek()?;
            self.pos += 1;
            match ch {
                '"' => return Some(out),
                '\\' => {
                    let escaped = self.peek()?;
                    self.pos += 1;
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                }
                other => out.push(other),
            }
        }
    }

    /// The atoms of one entry: a top-level list spreads into several atoms.
    fn entry_atoms(&mut self) -> Option<Vec<Atom>> {
        self.skip_ws();
        if self.peek() == Some('[') {
            self.list()
        } else {
            Some(vec![self.value()?])
        }
    }

    fn value(&mut self) -> Option<Atom> {
        self.skip_ws();
        match self.peek()? {
            '"' => Some(Atom::Symbol(Symbol::intern(&self.string()?))),
            '[' => Some(Atom::vector(self.list()?)),
            '{' => Some(Atom::dico(self.object()?)),
            _ => self.bare(),
        }
    }

    fn list(&mut self) -> Option<Vec<Atom>> {
        self.expect('[')?;
        let mut items = Vec::new();
        self.skip_ws();
        if self.expect(']').is_some() {
            return Some(items);
        }
        loop {
            items.push(self.value()?);
            self.skip_ws();
            match self.peek()? {
                ',' => self.pos += 1,
                ']' => {
                    self.pos += 1;
                    return Some(items);
                }
                _ => return None,
            }
        }
    }

    fn object(&mut self) -> Option<Dico> {
        self.expect('{')?;
        let mut dico = Dico::new();
        self.skip_ws();
        if self.expect('}').is_some() {
            return Some(dico);
        }
        loop {
            let key = self.string()?;
            self.skip_ws();
            self.expect(':')?;
            let atoms = self.entry_atoms()?;
            dico.set(Symbol::intern(&key), atoms);
            self.skip_ws();
            match self.peek()? {
                ',' => self.pos += 1,
                '}' => {
                    self.pos += 1;
                    return Some(dico);
                }
                _ => return None,
            }
        }
    }

    fn bare(&mut self) -> Option<Atom> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|ch| !ch.is_whitespace() && !matches!(ch, ',' | ']' | '}'))
        {
            self.pos += 1;
        }
        let token: String = self.chars[start..self.pos].iter().collect();
        match token.as_str() {
            "" => None,
            "true" => Some(Atom::Bool(true)),
            "false" => Some(Atom::Bool(false)),
            "null" => Some(Atom::Undefined),
            _ => parse_number(&token),
        }
    }
}

fn parse_number(token: &str) -> Option<Atom> {
    let floating = token.contains(['.', 'e', 'E']) || token.ends_with("inf") || token == "NaN";
    if !floating && let Ok(value) = token.parse::<i64>() {
        return Some(Atom::Long(value));
    }
    token.parse::<f64>().ok().map(Atom::Double)
}
