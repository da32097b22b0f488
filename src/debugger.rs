//! The debugger host: expression evaluation against a variable table,
//! single-instruction encoding, and the console sink.
//!
//! The assembler front end leans on this module for everything that needs
//! knowledge of values rather than of source shape: `parse_expression`
//! resolves an infix expression (octal-by-default, MACRO-10 flavored),
//! `parse_instruction` encodes one mnemonic with operand text into a 36-bit
//! word, and the variable table lets the assembler export symbols so later
//! expressions can reference them.

use crate::constants::*;
use crate::enums::{compound_mnemonic, IoFunct, Opcode};
use crate::instructions::*;
use crate::Word;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use util::oct;

/// Sink for diagnostic lines.
pub trait Console {
    fn println(&mut self, s: &str);
}

pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn println(&mut self, s: &str) {
        println!("{}", s);
    }
}

/// Captures output for inspection; handles are cheap clones of one buffer.
#[derive(Clone, Default)]
pub struct BufferConsole {
    lines: Rc<RefCell<Vec<String>>>,
}

impl BufferConsole {
    pub fn new() -> BufferConsole {
        BufferConsole::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn take(&self) -> Vec<String> {
        self.lines.borrow_mut().drain(..).collect()
    }
}

impl Console for BufferConsole {
    fn println(&mut self, s: &str) {
        self.lines.borrow_mut().push(s.to_owned());
    }
}

/// Symbol names are significant to six characters, upper case.
pub fn symbol_key(name: &str) -> String {
    let mut key = name.to_uppercase();
    key.truncate(6);
    key
}

fn is_symbol_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'$' || c == b'%' || c == b'.' || c == b'?'
}

fn is_symbol_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'$' || c == b'%' || c == b'.'
}

/// Six-bit character code: lower case folds to upper, then the printing
/// range collapses onto 0-77 by adding 040 and masking.
pub fn sixbit_char(c: char) -> Word {
    let folded = c.to_ascii_uppercase() as u64;
    (folded + 0o40) & 0o77
}

/// Packs up to six characters into one word, left-justified.
pub fn pack_sixbit_word(s: &str) -> Word {
    let mut word = 0;
    for (i, c) in s.chars().take(6).enumerate() {
        word |= sixbit_char(c) << (30 - 6 * i as u32);
    }
    word
}

/// Packs up to five 7-bit characters into one word, left-justified, with
/// the single padding bit at bit 35.
pub fn pack_ascii_word(s: &str) -> Word {
    let mut word = 0;
    for (i, c) in s.chars().take(5).enumerate() {
        word |= ((c as u64) & 0o177) << (29 - 7 * i as u32);
    }
    word
}

pub struct Debugger {
    variables: HashMap<String, i64>,
    undefined: String,
    console: Box<dyn Console>,
}

impl Default for Debugger {
    fn default() -> Debugger {
        Debugger::new()
    }
}

impl Debugger {
    pub fn new() -> Debugger {
        Debugger::with_console(Box::new(StdoutConsole))
    }

    pub fn with_console(console: Box<dyn Console>) -> Debugger {
        Debugger {
            variables: HashMap::new(),
            undefined: String::new(),
            console,
        }
    }

    pub fn println(&mut self, s: &str) {
        self.console.println(s);
    }

    pub fn set_variable(&mut self, name: &str, value: i64) {
        self.variables.insert(symbol_key(name), value);
    }

    pub fn get_variable(&self, name: &str) -> Option<i64> {
        self.variables.get(&symbol_key(name)).copied()
    }

    /// Empties the variable table, returning the previous contents so the
    /// caller can put them back with [`restore_variables`].
    ///
    /// [`restore_variables`]: Debugger::restore_variables
    pub fn reset_variables(&mut self) -> HashMap<String, i64> {
        std::mem::replace(&mut self.variables, HashMap::new())
    }

    pub fn restore_variables(&mut self, variables: HashMap<String, i64>) {
        self.variables = variables;
    }

    /// The additive remainder of the last pass-one expression parse: the
    /// names of symbols that were not yet defined, joined with `+`. Empty
    /// when everything resolved.
    pub fn undefined(&self) -> &str {
        &self.undefined
    }

    /// Truncates a signed value to `bits` bits, reading the result as
    /// unsigned or sign-extended.
    pub fn truncate(&self, value: i64, bits: u32, unsigned: bool) -> i64 {
        let mask = (1u64 << bits) - 1;
        let t = (value as u64) & mask;
        if unsigned || t < (1u64 << (bits - 1)) {
            t as i64
        } else {
            (t as i64) - ((mask as i64) + 1)
        }
    }

    /// Renders a value in the debugger's default base (octal), the inverse
    /// of what the expression parser accepts for undecorated numbers.
    pub fn to_str_base(&self, n: i64) -> String {
        if n < 0 {
            format!("-{}", oct(n.unsigned_abs()))
        } else {
            oct(n as u64)
        }
    }

    /// Evaluates an infix expression. Undefined symbols are an error in the
    /// final pass; in pass one they evaluate as zero and accumulate into
    /// [`undefined`](Debugger::undefined).
    pub fn parse_expression(&mut self, text: &str, pass1: bool) -> Option<i64> {
        let mut eval = Eval {
            scan: Scanner::new(text),
            variables: &self.variables,
            pass1,
            undefined: Vec::new(),
        };
        let value = eval.xwd();
        let complete = value.is_some() && eval.scan.at_end();
        self.undefined = eval.undefined.join("+");
        if complete {
            value
        } else {
            None
        }
    }

    /// Encodes one instruction at `location`. Returns `None` when the
    /// mnemonic is unknown or an operand does not evaluate. Undefined
    /// symbols in the address operand follow `parse_expression`'s pass-one
    /// rule; the accumulator, index, and device operands must already be
    /// defined.
    pub fn parse_instruction(
        &mut self,
        op: &str,
        operands: &str,
        _location: Word,
        pass1: bool,
    ) -> Option<Word> {
        let mnemonic = op.to_uppercase();
        self.undefined.clear();

        if let Ok(funct) = mnemonic.parse::<IoFunct>() {
            let (device, effective) = match split_top_level_comma(operands) {
                Some((dev, rest)) => (self.field_value(dev, 0o777)?, rest),
                None => (0, operands),
            };
            let (ind, xr_swap, addr) = self.effective_address(effective, pass1)?;
            let word = make_io_instruction(funct, device, ind, 0, addr);
            return Some(add_swapped(word, xr_swap));
        }

        let (opcode, preset_ac) = match compound_mnemonic(&mnemonic) {
            Some((opcode, ac)) => (opcode, Some(ac)),
            None => match mnemonic.parse::<Opcode>() {
                Ok(opcode) => (opcode, None),
                Err(_) => return None,
            },
        };

        let (ac, effective) = match preset_ac {
            Some(ac) => (ac, operands),
            None => match split_top_level_comma(operands) {
                Some((ac_text, rest)) => (self.field_value(ac_text, 0o17)?, rest),
                None => (0, operands),
            },
        };

        let (ind, xr_swap, addr) = self.effective_address(effective, pass1)?;
        let word = make_instruction(opcode, ac, ind, 0, addr);
        Some(add_swapped(word, xr_swap))
    }

    /// Encodes instruction operand text with no opcode: the `A,` prefix and
    /// `[@]Y[(X)]` fields of a word whose opcode is zero. OPDEF invocation
    /// folds a word built this way into the defined base word.
    pub fn parse_operands(&mut self, operands: &str, pass1: bool) -> Option<Word> {
        self.undefined.clear();
        let (ac, effective) = match split_top_level_comma(operands) {
            Some((ac_text, rest)) => (self.field_value(ac_text, 0o17)?, rest),
            None => (0, operands),
        };
        let (ind, xr_swap, addr) = self.effective_address(effective, pass1)?;
        let word = ((ac << AC_OFFSET) & AC_MASK) | if ind { IND_MASK } else { 0 } | (addr & ADDR_MASK);
        Some(add_swapped(word, xr_swap))
    }

    /// Evaluates a small field operand (accumulator, device, index); empty
    /// text is zero, undefined symbols are an error even in pass one.
    fn field_value(&mut self, text: &str, mask: Word) -> Option<Word> {
        let text = text.trim();
        if text.is_empty() {
            return Some(0);
        }
        let saved = std::mem::take(&mut self.undefined);
        let value = self.parse_expression(text, false);
        self.undefined = saved;
        Some((value? as u64) & mask)
    }

    /// Parses `[@]Y[(X)]`. The parenthesized group follows the MACRO-10
    /// rule: its value is half-swapped and added to the word, which places
    /// small values in the index field.
    fn effective_address(&mut self, text: &str, pass1: bool) -> Option<(bool, i64, Word)> {
        let mut text = text.trim();
        let mut ind = false;
        if let Some(rest) = text.strip_prefix('@') {
            ind = true;
            text = rest.trim_start();
        }
        let (body, index) = split_index(text);
        let swap = match index {
            Some(index_text) => {
                let saved = std::mem::take(&mut self.undefined);
                let value = self.parse_expression(index_text, false);
                self.undefined = saved;
                value?
            }
            None => 0,
        };
        let body = body.trim();
        let addr = if body.is_empty() {
            0
        } else {
            let value = self.parse_expression(body, pass1)?;
            (self.truncate(value, ADDR_WIDTH, true) as u64) & ADDR_MASK
        };
        Some((ind, swap, addr))
    }
}

/// Adds the half-swapped index-group value into a finished word.
fn add_swapped(word: Word, value: i64) -> Word {
    if value == 0 {
        return word;
    }
    let v = (value as u64) & WORD_MASK;
    let swapped = ((v & HALF_MASK) << HALF_WIDTH) | ((v >> HALF_WIDTH) & HALF_MASK);
    word.wrapping_add(swapped) & WORD_MASK
}

/// Splits `text` at the first comma not nested in brackets or quotes and
/// not part of a `,,` halfword operator.
fn split_top_level_comma(text: &str) -> Option<(&str, &str)> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut quote = 0u8;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if quote != 0 {
            if c == quote {
                quote = 0;
            }
        } else {
            match c {
                b'\'' | b'"' => quote = c,
                b'(' | b'[' | b'<' => depth += 1,
                b')' | b']' | b'>' => depth -= 1,
                b',' if depth == 0 => {
                    if i + 1 < bytes.len() && bytes[i + 1] == b',' {
                        i += 1;
                    } else {
                        return Some((&text[..i], &text[i + 1..]));
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// Splits a trailing parenthesized index group off an operand, if present.
fn split_index(text: &str) -> (&str, Option<&str>) {
    let trimmed = text.trim_end();
    if !trimmed.ends_with(')') {
        return (text, None);
    }
    let bytes = trimmed.as_bytes();
    let mut depth = 0i32;
    for i in (0..bytes.len()).rev() {
        match bytes[i] {
            b')' => depth += 1,
            b'(' => {
                depth -= 1;
                if depth == 0 {
                    return (&trimmed[..i], Some(&trimmed[i + 1..trimmed.len() - 1]));
                }
            }
            _ => {}
        }
    }
    (text, None)
}

struct Scanner<'t> {
    bytes: &'t [u8],
    pos: usize,
}

impl<'t> Scanner<'t> {
    fn new(text: &'t str) -> Scanner<'t> {
        Scanner {
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos] == b' ' || self.bytes[self.pos] == b'\t')
        {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.bytes.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.bytes.get(self.pos).copied();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_end(&mut self) -> bool {
        self.peek().is_none()
    }
}

struct Eval<'t, 'v> {
    scan: Scanner<'t>,
    variables: &'v HashMap<String, i64>,
    pass1: bool,
    undefined: Vec<String>,
}

impl<'t, 'v> Eval<'t, 'v> {
    /// Lowest precedence: the `,,` halfword constructor.
    fn xwd(&mut self) -> Option<i64> {
        let mut value = self.sum()?;
        loop {
            self.scan.skip_ws();
            if self.scan.peek() == Some(b',') && self.scan.peek2() == Some(b',') {
                self.scan.bump();
                self.scan.bump();
                let right = self.sum()?;
                let left = (value as u64) & HALF_MASK;
                value = ((left << HALF_WIDTH) | ((right as u64) & HALF_MASK)) as i64;
            } else {
                break;
            }
        }
        Some(value)
    }

    fn sum(&mut self) -> Option<i64> {
        let mut value = self.term()?;
        loop {
            match self.scan.peek() {
                Some(b'+') => {
                    self.scan.bump();
                    value = value.wrapping_add(self.term()?);
                }
                Some(b'-') => {
                    self.scan.bump();
                    value = value.wrapping_sub(self.term()?);
                }
                _ => break,
            }
        }
        Some(value)
    }

    fn term(&mut self) -> Option<i64> {
        let mut value = self.unary()?;
        loop {
            match self.scan.peek() {
                Some(b'*') => {
                    self.scan.bump();
                    value = value.wrapping_mul(self.unary()?);
                }
                Some(b'/') => {
                    self.scan.bump();
                    let divisor = self.unary()?;
                    if divisor == 0 {
                        return None;
                    }
                    value = value.wrapping_div(divisor);
                }
                _ => break,
            }
        }
        Some(value)
    }

    fn unary(&mut self) -> Option<i64> {
        match self.scan.peek() {
            Some(b'-') => {
                self.scan.bump();
                Some(self.unary()?.wrapping_neg())
            }
            Some(b'+') => {
                self.scan.bump();
                self.unary()
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Option<i64> {
        match self.scan.peek()? {
            b'(' => {
                self.scan.bump();
                let value = self.xwd()?;
                if self.scan.eat(b')') {
                    Some(value)
                } else {
                    None
                }
            }
            b'<' => {
                self.scan.bump();
                let value = self.xwd()?;
                if self.scan.eat(b'>') {
                    Some(value)
                } else {
                    None
                }
            }
            b'\'' => self.quoted(b'\'').map(|s| pack_sixbit_word(&s) as i64),
            b'"' => self.quoted(b'"').map(|s| pack_ascii_word(&s) as i64),
            b'^' => self.radix_number(),
            c if c.is_ascii_digit() => self.number(),
            c if is_symbol_start(c) => self.symbol(),
            _ => None,
        }
    }

    fn quoted(&mut self, delim: u8) -> Option<String> {
        self.scan.bump();
        let mut chars = String::new();
        loop {
            match self.scan.bump()? {
                c if c == delim => break,
                c => chars.push(c as char),
            }
        }
        let limit = if delim == b'\'' { 6 } else { 5 };
        if chars.len() > limit {
            None
        } else {
            Some(chars)
        }
    }

    fn radix_number(&mut self) -> Option<i64> {
        self.scan.bump();
        let radix = match self.scan.bump()?.to_ascii_uppercase() {
            b'D' => 10,
            b'O' => 8,
            b'B' => 2,
            _ => return None,
        };
        let digits = self.digit_run();
        if digits.is_empty() {
            None
        } else {
            i64::from_str_radix(&digits, radix).ok()
        }
    }

    fn number(&mut self) -> Option<i64> {
        let digits = self.digit_run();
        // A trailing period (not starting another number) marks decimal.
        let decimal = if self.scan.bytes.get(self.scan.pos) == Some(&b'.')
            && !self
                .scan
                .peek2()
                .map(|c| c.is_ascii_digit())
                .unwrap_or(false)
        {
            self.scan.bump();
            true
        } else {
            false
        };
        let radix = if decimal { 10 } else { 8 };
        i64::from_str_radix(&digits, radix).ok()
    }

    fn digit_run(&mut self) -> String {
        let mut digits = String::new();
        while let Some(c) = self.scan.bytes.get(self.scan.pos) {
            if c.is_ascii_digit() {
                digits.push(*c as char);
                self.scan.pos += 1;
            } else {
                break;
            }
        }
        digits
    }

    fn symbol(&mut self) -> Option<i64> {
        let start = self.scan.pos;
        self.scan.pos += 1;
        while let Some(&c) = self.scan.bytes.get(self.scan.pos) {
            if is_symbol_char(c) {
                self.scan.pos += 1;
            } else {
                break;
            }
        }
        let name = std::str::from_utf8(&self.scan.bytes[start..self.scan.pos]).ok()?;
        let key = symbol_key(name);
        match self.variables.get(&key) {
            Some(value) => Some(*value),
            None if self.pass1 => {
                self.undefined.push(key);
                Some(0)
            }
            None => None,
        }
    }
}
