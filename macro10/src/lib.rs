//! Assembler for a working subset of DEC MACRO-10, producing 36-bit word
//! images for the [pdp10](../pdp10/index.html) machine crate.
//!
//! The entry points are [`assemble`] and [`assemble_addressed`], which take
//! source text and yield a [`tenfile::Image`]: a dense run of words starting
//! at the load address, plus the start address from the program's `END`
//! statement. The [`Macro10`] driver underneath exposes the same pipeline a
//! piece at a time (resource loading, options, image access) for callers
//! that need it.
//!
//! Expressions and single instructions are delegated to
//! [`pdp10::Debugger`](../pdp10/debugger/struct.Debugger.html); this crate
//! owns everything textual: line recognition, symbols, macros, literals,
//! and the two-phase fixup resolution.
//!
//! # Accepted directives
//!
//!  Directive | Effect
//! -----------|----------------------------------------------------------
//! `ASCII`, `ASCIZ`, `SIXBIT` | Delimited string, packed 7-bit (five per word) or 6-bit (six per word); `ASCIZ` appends a zero character. May span lines.
//! `DEFINE name(params)<body>` | Named macro; parameters may carry `<default>` values.
//! `OPDEF name [body]` | Defines an operator: the body's word plus the use site's operand fields.
//! `REPEAT n,<body>` | Assembles the body `n` times.
//! `IFE/IFG/IFL/IFN expr,<body>` | Assembles the body when the expression is zero / positive / negative / nonzero.
//! `IRP param,<body>` / `IRPC` | Iterates the body over the caller's comma-separated argument, or its characters.
//! `EXP e1,e2,...` | One word per expression.
//! `XWD a,b` | One word from two halfwords, as `EXP a,,b`.
//! `LOC expr` | Moves the location counter.
//! `END [expr]` | Ends the program, optionally naming the start address.
//! `LALL LIST NOSYM PAGE SUBTTL TITLE XLIST` | Accepted and ignored.
//!
//! Anything else is a machine instruction for the host encoder, a macro
//! invocation, or a bare expression assembled as a full word. Operands may
//! use `[literals]`, `SYM#` reserved variables, `A,,B` halfwords, inline
//! `SIXBIT /../` values, and `.` for the current location.

mod ascii;
mod error;
mod expr;
mod loader;
mod macros;
mod ops;
mod output;
mod parser;
mod symbols;

#[cfg(test)]
mod test;

use crate::ascii::{StringCapture, StringOp};
use crate::expr::LiteralScan;
use crate::macros::{Binding, Capture, IfSense, Macro, MacroKind};
use crate::ops::PseudoOp;
use crate::output::{Fixup, Literal, Output, Scope};
use crate::symbols::SymbolTable;
use pdp10::debugger::{symbol_key, Debugger};
use pdp10::{
    Word, AC_MASK, ADDR_MASK, HALF_WIDTH, IND_MASK, INT_LIMIT, WORD_LIMIT, WORD_MASK, WORD_WIDTH,
    XR_MASK,
};
use std::collections::HashMap;

pub use crate::error::{Error, ErrorKind, Result};
pub use crate::loader::{extract_source, FileLoader, Loader};

/// Bound on recursive macro expansion; exceeding it is a definition error
/// rather than stack exhaustion.
pub const MAX_EXPANSION_DEPTH: u32 = 100;

/// Bound on substitute-and-retokenize rounds for one line.
const MAX_SUBSTITUTION_PASSES: u32 = 10;

#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    /// Echo the joined source text instead of assembling (`p`).
    pub preprocess: bool,
}

impl Options {
    pub fn from_letters(letters: &str) -> Options {
        Options {
            preprocess: letters.contains('p'),
        }
    }
}

/// Assembles one source text with load address zero.
pub fn assemble(input: &str, dbg: &mut Debugger) -> Result<tenfile::Image> {
    assemble_addressed(input, 0, dbg)
}

/// Assembles one source text at the given load address.
pub fn assemble_addressed(
    input: &str,
    load_address: Word,
    dbg: &mut Debugger,
) -> Result<tenfile::Image> {
    let mut asm = Macro10::new(dbg, load_address, Options::default());
    asm.assemble(input)?;
    Ok(asm.into_image())
}

/// The assembler driver. One `Macro10` assembles one program; the word
/// image and start address are available once [`assemble`](Macro10::assemble)
/// returns.
pub struct Macro10<'d> {
    dbg: &'d mut Debugger,
    load_address: Word,
    options: Options,

    out: Output,
    scopes: Vec<Scope>,
    symbols: SymbolTable,
    macros: HashMap<String, Macro>,
    literals: Vec<Literal>,
    reserved: Vec<String>,
    bindings: Vec<Binding>,
    capture: Option<Capture>,
    strcap: Option<StringCapture>,

    literal_seq: u32,
    line_no: u32,
    depth: u32,
    start: Option<Word>,
    ended: bool,
}

impl<'d> Macro10<'d> {
    pub fn new(dbg: &'d mut Debugger, load_address: Word, options: Options) -> Macro10<'d> {
        Macro10 {
            dbg,
            load_address,
            options,
            out: Output::new(load_address as usize),
            scopes: Vec::new(),
            symbols: SymbolTable::new(),
            macros: HashMap::new(),
            literals: Vec::new(),
            reserved: Vec::new(),
            bindings: Vec::new(),
            capture: None,
            strcap: None,
            literal_seq: 0,
            line_no: 0,
            depth: 0,
            start: None,
            ended: false,
        }
    }

    /// Fetches each semicolon-separated resource, unwraps HTML packaging,
    /// and assembles the joined text.
    pub fn assemble_resources(&mut self, names: &str, loader: &mut dyn Loader) -> Result<()> {
        let mut sources = Vec::new();
        for name in names.split(';') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let raw = match loader.fetch(name) {
                Ok(raw) => raw,
                Err(error) => {
                    let error = Error::resource(format!("loading \"{}\" failed: {}", name, error));
                    self.dbg.println(&error.to_string());
                    return Err(error);
                }
            };
            let (text, warnings) = loader::extract_source(&raw);
            for warning in warnings {
                self.dbg.println(&format!("warning: {}", warning));
            }
            sources.push(text);
        }
        self.assemble(&sources.join("\r\n"))
    }

    /// Runs the whole pipeline over already-loaded source text. The host
    /// variable table is snapshotted first and restored afterwards, errors
    /// included, so assembly never disturbs the host's own symbols.
    pub fn assemble(&mut self, text: &str) -> Result<()> {
        let saved = self.dbg.reset_variables();
        let result = self.run(text);
        if let Err(error) = &result {
            self.dbg.println(&error.to_string());
        }
        self.dbg.restore_variables(saved);
        result
    }

    /// The assembled image: every word from the load address up.
    pub fn image(&self) -> &[Word] {
        let base = self.load_address as usize;
        if base >= self.out.words.len() {
            &[]
        } else {
            &self.out.words[base..]
        }
    }

    /// The start address from `END expr`, if the program declared one.
    pub fn start(&self) -> Option<Word> {
        self.start
    }

    pub fn into_image(self) -> tenfile::Image {
        let words = self.image().to_vec();
        tenfile::Image::from(self.load_address, self.start, words)
    }

    fn run(&mut self, text: &str) -> Result<()> {
        if self.options.preprocess {
            self.dbg.println(text);
            return Ok(());
        }
        self.parse_top(text)?;
        self.finish()
    }

    fn parse_top(&mut self, text: &str) -> Result<()> {
        for line in text.split('\n') {
            if self.ended {
                break;
            }
            self.line_no += 1;
            self.parse_line(line.trim_end_matches('\r'))?;
        }
        Ok(())
    }

    /// Parses expanded text (a macro body) line by line. The binding, if
    /// any, is what parameter substitution sees for these lines.
    fn parse_text(&mut self, text: &str, binding: Option<Binding>) -> Result<()> {
        if self.depth >= MAX_EXPANSION_DEPTH {
            return Err(Error::definition(self.line_no, "macro expansion too deep"));
        }
        self.depth += 1;
        let pushed = binding.is_some();
        if let Some(binding) = binding {
            self.bindings.push(binding);
        }
        let mut result = Ok(());
        for line in text.split('\n') {
            if self.ended {
                break;
            }
            result = self.parse_line(line.trim_end_matches('\r'));
            if result.is_err() {
                break;
            }
        }
        if pushed {
            self.bindings.pop();
        }
        self.depth -= 1;
        result
    }

    fn parse_line(&mut self, text: &str) -> Result<()> {
        // A string or macro body in progress consumes raw lines first.
        if let Some(capture) = self.strcap.as_mut() {
            if let Some(done) = capture.append(text) {
                let op = capture.op;
                self.strcap = None;
                self.emit_string(op, &done)?;
            }
            return Ok(());
        }
        if self.capture.is_some() {
            return self.append_capture(text);
        }

        let owned = match self.substituted(text)? {
            Some(owned) => owned,
            None => return Ok(()),
        };
        let line = match parser::tokenize(&owned) {
            Some(line) => line,
            None => return Ok(()),
        };

        if let Some(label_text) = line.label {
            let name = label_text.trim_end_matches(':');
            let mut flags = symbols::LABEL;
            if label_text.ends_with("::") {
                flags |= symbols::INTERNAL;
            }
            let location = self.out.location as Word;
            let line_no = self.line_no;
            self.symbols
                .define(self.dbg, name, location, flags, line_no)
                .map_err(|message| Error::definition(line_no, message))?;
        }

        let op = line.op.to_ascii_uppercase();
        if op.is_empty() && line.operands.trim().is_empty() {
            return Ok(());
        }

        let assignment = line.operands.trim_start();
        if !op.is_empty() && assignment.starts_with('=') {
            return self.assign(&op, assignment);
        }

        // Directives that must see the raw tail before any operand rewrite.
        if let Ok(pseudo) = op.parse::<PseudoOp>() {
            if pseudo.is_ignored() {
                return Ok(());
            }
            match pseudo {
                PseudoOp::Ascii => return self.gen_string(StringOp::Ascii, &line.tail()),
                PseudoOp::Asciz => return self.gen_string(StringOp::Asciz, &line.tail()),
                PseudoOp::Sixbit => return self.gen_string(StringOp::Sixbit, &line.tail()),
                _ if pseudo.is_definer() => {
                    return self.def_macro(pseudo, line.operands, line.comment)
                }
                _ => {}
            }
        }

        let operands = self.scan_literals(line.operands, line.comment)?;
        let operands = self.scan_reserved(&operands);
        let operands = operands.trim().to_owned();

        if let Ok(pseudo) = op.parse::<PseudoOp>() {
            return match pseudo {
                PseudoOp::End => self.do_end(&operands),
                PseudoOp::Exp => self.do_exp(&operands),
                PseudoOp::Loc => self.do_loc(&operands),
                PseudoOp::Xwd => self.do_xwd(&operands),
                _ => unreachable!(),
            };
        }

        if !op.is_empty() {
            if let Some(mac) = self.macros.get(&symbol_key(&op)).cloned() {
                match mac.kind {
                    MacroKind::Define => return self.invoke_define(&mac, &operands),
                    MacroKind::Opdef => return self.invoke_opdef(&mac, &operands),
                    _ => {}
                }
            }
        }

        self.def_word(&op, line.separator, &operands)
    }

    /// Applies parameter substitution to the operand region and
    /// re-tokenizes until the line settles. Returns `None` for a line the
    /// tokenizer rejects but whose tail is only a comment.
    fn substituted(&mut self, text: &str) -> Result<Option<String>> {
        let mut owned = text.to_owned();
        for _ in 0..MAX_SUBSTITUTION_PASSES {
            let replacement = {
                let line = match parser::tokenize(&owned) {
                    Some(line) => line,
                    None => {
                        if owned.trim_start().starts_with(';') {
                            return Ok(None);
                        }
                        return Err(Error::syntax(
                            self.line_no,
                            format!("failed to parse line \"{}\"", owned.trim()),
                        ));
                    }
                };
                // IRP/IRPC headers name a parameter, not its value.
                let op = line.op.to_ascii_uppercase();
                if op == "IRP" || op == "IRPC" {
                    None
                } else if let Some(binding) = self.bindings.last() {
                    let (operands, changed) = macros::substitute(line.operands, binding);
                    if changed {
                        Some(format!(
                            "{}{}{}",
                            &owned[..line.operands_start],
                            operands,
                            line.comment
                        ))
                    } else {
                        None
                    }
                } else {
                    None
                }
            };
            match replacement {
                Some(next) => owned = next,
                None => break,
            }
        }
        Ok(Some(owned))
    }

    fn assign(&mut self, name: &str, operands: &str) -> Result<()> {
        let mut rest = &operands[1..];
        let mut flags = 0u8;
        if let Some(tail) = rest.strip_prefix('=') {
            flags |= symbols::PRIVATE;
            rest = tail;
        }
        if let Some(tail) = rest.strip_prefix(':') {
            flags |= symbols::INTERNAL;
            rest = tail;
        }
        let value = self.require(rest)?;
        let word = self.dbg.truncate(value, WORD_WIDTH, true) as Word;
        let line_no = self.line_no;
        self.symbols
            .define(self.dbg, name, word, flags, line_no)
            .map_err(|message| Error::definition(line_no, message))?;
        Ok(())
    }

    fn do_end(&mut self, operands: &str) -> Result<()> {
        if !operands.is_empty() {
            let value = self.require(operands)?;
            self.start = Some(self.dbg.truncate(value, WORD_WIDTH, true) as Word);
        }
        self.ended = true;
        Ok(())
    }

    fn do_exp(&mut self, operands: &str) -> Result<()> {
        for piece in expr::split_operands(operands) {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            self.gen_word(0, Some(piece.to_owned()))?;
        }
        Ok(())
    }

    fn do_loc(&mut self, operands: &str) -> Result<()> {
        let value = self.require(operands)?;
        if value < 0 {
            return Err(Error::expression(self.line_no, "negative location"));
        }
        self.out.location = value as usize;
        Ok(())
    }

    fn do_xwd(&mut self, operands: &str) -> Result<()> {
        let (left, right) = expr::split_top_comma(operands)
            .ok_or_else(|| Error::expression(self.line_no, "XWD needs two halfwords"))?;
        self.gen_word(0, Some(format!("{},,{}", left.trim(), right.trim())))
    }

    /// Emits words for an instruction, macro-free operator, or bare
    /// expression. Instructions encode now, deferring only their undefined
    /// address terms; an operator-less line is a word expression list, as
    /// `EXP`; anything else defers the whole text.
    fn def_word(&mut self, op: &str, separator: &str, operands: &str) -> Result<()> {
        if op.is_empty() {
            return self.do_exp(operands);
        }
        let prepared = self.prepare(operands);
        let location = self.out.location as Word;
        if let Some(word) = self.dbg.parse_instruction(op, &prepared, location, true) {
            let undefined = self.dbg.undefined().to_owned();
            let fixup = if undefined.is_empty() {
                None
            } else {
                Some(undefined)
            };
            return self.gen_word(word as i64, fixup);
        }
        let text = format!("{}{}{}", op, separator, operands).trim().to_owned();
        self.gen_word(0, Some(text))
    }

    fn gen_word(&mut self, value: i64, fixup: Option<String>) -> Result<()> {
        let line_no = self.line_no;
        let word = self.truncate_word(value, line_no);
        let fixup = fixup
            .filter(|expr| !expr.trim().is_empty())
            .map(|expr| Fixup { expr, line: line_no });
        self.out.emit(word, fixup);
        Ok(())
    }

    fn truncate_word(&mut self, value: i64, line: u32) -> Word {
        if value < -(INT_LIMIT as i64) || value >= WORD_LIMIT as i64 {
            let message = format!(
                "warning at line {}: value {} truncated",
                line,
                self.dbg.to_str_base(value)
            );
            self.dbg.println(&message);
        }
        self.dbg.truncate(value, WORD_WIDTH, true) as Word
    }

    // ----- strings -----

    fn gen_string(&mut self, op: StringOp, tail: &str) -> Result<()> {
        let trimmed = tail.trim_start();
        let mut chars = trimmed.chars();
        let delim = match chars.next() {
            Some(delim) => delim,
            None => return Err(Error::definition(self.line_no, "missing string delimiter")),
        };
        let rest = chars.as_str();
        match rest.find(delim) {
            Some(end) => self.emit_string(op, &rest[..end]),
            None => {
                let mut text = rest.to_owned();
                text.push_str("\r\n");
                self.strcap = Some(StringCapture {
                    op,
                    delim,
                    text,
                    line: self.line_no,
                });
                Ok(())
            }
        }
    }

    fn emit_string(&mut self, op: StringOp, text: &str) -> Result<()> {
        for word in ascii::pack(op, text) {
            self.gen_word(word as i64, None)?;
        }
        Ok(())
    }

    // ----- literals and reserved symbols -----

    fn next_literal_name(&mut self) -> String {
        self.literal_seq += 1;
        format!("?{:05}", self.literal_seq)
    }

    /// Pulls each `[...]` region out of the operand text, assembles it into
    /// the literal pool, and substitutes its generated name. A bracket that
    /// runs through a semicolon is rescanned against the raw tail.
    fn scan_literals(&mut self, operands: &str, comment: &str) -> Result<String> {
        let mut text = operands.to_owned();
        let mut with_comment = false;
        loop {
            let (start, end) = match expr::find_literal(&text) {
                LiteralScan::None => break,
                LiteralScan::Found { start, end } => (start, end),
                LiteralScan::Unbalanced { .. } => {
                    if !with_comment && comment.contains(']') {
                        text.push_str(comment);
                        with_comment = true;
                        continue;
                    }
                    return Err(Error::scope(self.line_no, "unmatched [ in operands"));
                }
            };
            let name = self.next_literal_name();
            let mut mac = Macro::new(name.clone(), MacroKind::Literal, self.line_no);
            mac.body = text[start + 1..end - 1].to_owned();
            self.macros.insert(name.clone(), mac.clone());
            self.invoke_literal(&mac)?;
            text = format!("{}{}{}", &text[..start], name, &text[end..]);
        }
        if with_comment {
            if let Some(semi) = text.find(';') {
                text.truncate(semi);
            }
        }
        Ok(text)
    }

    /// Replaces each `SYM#` with `SYM`, queueing a one-word reserved
    /// variable for the pool on first sight.
    fn scan_reserved(&mut self, operands: &str) -> String {
        let mut text = operands.to_owned();
        while let Some((start, end, symbol)) = expr::find_reserved(&text) {
            let name = symbol_key(symbol);
            let key = format!("?{}", name);
            if !self.macros.contains_key(&key) {
                let mut mac = Macro::new(key.clone(), MacroKind::Reserved, self.line_no);
                mac.body = format!("{}: 0", name);
                self.macros.insert(key.clone(), mac);
                self.reserved.push(key);
            }
            text = format!("{}{}{}", &text[..start], &text[start..end - 1], &text[end..]);
        }
        text
    }

    fn invoke_literal(&mut self, mac: &Macro) -> Result<()> {
        self.push_scope(Some(mac.name.clone()));
        let result = self.parse_text(&mac.body, None);
        let (name, output) = self.pop_scope();
        result?;
        self.literals
            .push(Literal::from_output(name.expect("literal scope name"), output));
        Ok(())
    }

    // ----- macro definition and invocation -----

    fn def_macro(&mut self, pseudo: PseudoOp, operands: &str, comment: &str) -> Result<()> {
        let line_no = self.line_no;
        let tail = format!("{}{}", operands, comment);
        let (target, open, close, feed_from) = match pseudo {
            PseudoOp::Define | PseudoOp::Opdef => {
                let which = if pseudo == PseudoOp::Define {
                    "DEFINE"
                } else {
                    "OPDEF"
                };
                let header = expr::get_params(operands).ok_or_else(|| {
                    Error::definition(line_no, format!("unrecognized {} header", which))
                })?;
                let (kind, open, close) = if pseudo == PseudoOp::Define {
                    (MacroKind::Define, '<', '>')
                } else {
                    (MacroKind::Opdef, '[', ']')
                };
                let mut mac = Macro::new(symbol_key(&header.name), kind, line_no);
                mac.params = header.params;
                mac.defaults = header.defaults;
                (mac, open, close, header.rest)
            }
            PseudoOp::Repeat => {
                let (count_text, rest) = split_at_open(operands);
                let count = self.require(count_text.trim().trim_end_matches(','))?;
                let mac = Macro::new("?REPEAT".to_owned(), MacroKind::Repeat(count), line_no);
                (mac, '<', '>', rest)
            }
            PseudoOp::Ife | PseudoOp::Ifg | PseudoOp::Ifl | PseudoOp::Ifn => {
                let (cond_text, rest) = split_at_open(operands);
                let value = self.require(cond_text.trim().trim_end_matches(','))?;
                let (name, sense) = match pseudo {
                    PseudoOp::Ife => ("?IFE", IfSense::Equal),
                    PseudoOp::Ifg => ("?IFG", IfSense::Greater),
                    PseudoOp::Ifl => ("?IFL", IfSense::Less),
                    _ => ("?IFN", IfSense::NotEqual),
                };
                let mac = Macro::new(name.to_owned(), MacroKind::If(value, sense), line_no);
                (mac, '<', '>', rest)
            }
            PseudoOp::Irp | PseudoOp::Irpc => {
                let (param_text, rest) = split_at_open(operands);
                let param = param_text
                    .trim()
                    .trim_end_matches(',')
                    .trim()
                    .to_ascii_uppercase();
                let binding = self
                    .bindings
                    .last()
                    .ok_or_else(|| Error::definition(line_no, "IRP outside a macro"))?;
                let value = binding
                    .value_of(&param)
                    .ok_or_else(|| {
                        Error::definition(line_no, format!("IRP parameter {} is not bound", param))
                    })?
                    .to_owned();
                let (name, kind, values) = if pseudo == PseudoOp::Irp {
                    let values = if value.is_empty() {
                        Vec::new()
                    } else {
                        value.split(',').map(|v| v.trim().to_owned()).collect()
                    };
                    ("?IRP", MacroKind::Irp, values)
                } else {
                    let values = value.chars().map(|c| c.to_string()).collect();
                    ("?IRPC", MacroKind::Irpc, values)
                };
                let mut mac = Macro::new(name.to_owned(), kind, line_no);
                mac.params = vec![param];
                mac.values = values;
                (mac, '<', '>', rest)
            }
            _ => unreachable!(),
        };
        self.capture = Some(Capture::new(target, open, close));
        // The body may start on this line; a comment alone cannot open it.
        let feed = if feed_from >= operands.len() {
            ""
        } else {
            &tail[feed_from..]
        };
        if !feed.is_empty() {
            self.append_capture(feed)?;
        }
        Ok(())
    }

    /// Feeds one raw line to the open body capture; on completion the
    /// finished macro registers, and anonymous forms run at once.
    fn append_capture(&mut self, text: &str) -> Result<()> {
        let completed = {
            let capture = self.capture.as_mut().expect("capture state");
            capture.append(text)
        };
        if !completed {
            return Ok(());
        }
        let capture = self.capture.take().expect("capture state");
        let mac = capture.target;
        self.macros.insert(mac.name.clone(), mac.clone());
        match mac.kind {
            MacroKind::Define | MacroKind::Opdef => Ok(()),
            MacroKind::Repeat(count) => {
                for _ in 0..count.max(0) {
                    if self.ended {
                        break;
                    }
                    self.parse_text(&mac.body, None)?;
                }
                Ok(())
            }
            MacroKind::If(value, sense) => {
                if sense.satisfied(value) {
                    self.parse_text(&mac.body, None)
                } else {
                    Ok(())
                }
            }
            MacroKind::Irp | MacroKind::Irpc => {
                for item in &mac.values {
                    if self.ended {
                        break;
                    }
                    let binding = Binding {
                        params: mac.params.clone(),
                        values: vec![item.clone()],
                    };
                    self.parse_text(&mac.body, Some(binding))?;
                }
                Ok(())
            }
            MacroKind::Literal | MacroKind::Reserved => Ok(()),
        }
    }

    fn invoke_define(&mut self, mac: &Macro, operands: &str) -> Result<()> {
        let values = expr::get_values(operands);
        let binding = Binding::bind(&mac.params, &mac.defaults, values);
        self.parse_text(&mac.body, Some(binding))
    }

    /// An OPDEF use: the defined word plus the use site's operand fields.
    /// The accumulator, index, and address add in; the indirect bit ORs.
    fn invoke_opdef(&mut self, mac: &Macro, operands: &str) -> Result<()> {
        self.push_scope(None);
        let result = self.parse_text(&mac.body, None);
        let (_, base_out) = self.pop_scope();
        result?;
        if base_out.words.is_empty() {
            return Err(Error::definition(
                self.line_no,
                format!("OPDEF {} has an empty body", mac.name),
            ));
        }
        let base = base_out.words[0];
        let mut fixups: Vec<String> = base_out
            .fixups
            .get(&0)
            .map(|fixup| fixup.expr.clone())
            .into_iter()
            .collect();

        self.push_scope(None);
        let result = self.gen_operand_word(operands);
        let (_, operand_out) = self.pop_scope();
        result?;
        let fields = operand_out.words.first().copied().unwrap_or(0);
        if let Some(fixup) = operand_out.fixups.get(&0) {
            fixups.push(fixup.expr.clone());
        }

        let word = base.wrapping_add(fields & (AC_MASK | XR_MASK | ADDR_MASK)) | (fields & IND_MASK);
        let fixup = if fixups.is_empty() {
            None
        } else {
            Some(fixups.join("+"))
        };
        self.gen_word((word & WORD_MASK) as i64, fixup)
    }

    /// Encodes OPDEF operand text into the current (side) scope as a word
    /// of bare instruction fields.
    fn gen_operand_word(&mut self, operands: &str) -> Result<()> {
        let operands = operands.trim();
        if operands.is_empty() {
            return self.gen_word(0, None);
        }
        let prepared = self.prepare(operands);
        if let Some(word) = self.dbg.parse_operands(&prepared, true) {
            let undefined = self.dbg.undefined().to_owned();
            let fixup = if undefined.is_empty() {
                None
            } else {
                Some(undefined)
            };
            self.gen_word(word as i64, fixup)
        } else {
            self.gen_word(0, Some(operands.to_owned()))
        }
    }

    // ----- scopes -----

    fn push_scope(&mut self, name: Option<String>) {
        let mut fresh = Output::new(0);
        fresh.scope_location = Some(self.out.dot());
        let outer = std::mem::replace(&mut self.out, fresh);
        self.scopes.push(Scope {
            name,
            output: outer,
            line: self.line_no,
        });
    }

    fn pop_scope(&mut self) -> (Option<String>, Output) {
        let frame = self.scopes.pop().expect("scope stack");
        let side = std::mem::replace(&mut self.out, frame.output);
        (frame.name, side)
    }

    // ----- expressions -----

    /// Applies the textual rewrites (inline strings, location periods) for
    /// the current position.
    fn prepare(&mut self, text: &str) -> String {
        let text = expr::rewrite_strings(text);
        expr::replace_dot(&text, &self.dbg.to_str_base(self.out.dot() as i64))
    }

    fn eval_at(&mut self, text: &str, dot: usize, pass1: bool) -> Option<i64> {
        let text = expr::rewrite_strings(text);
        let text = expr::replace_dot(&text, &self.dbg.to_str_base(dot as i64));
        self.eval_split(&text, pass1)
    }

    fn eval_split(&mut self, text: &str, pass1: bool) -> Option<i64> {
        if let Some((left, right)) = expr::split_xwd(text) {
            let left = self.eval_split(left, pass1)?;
            let right = self.eval_split(right, pass1)?;
            let left = self.dbg.truncate(left, HALF_WIDTH, true);
            let right = self.dbg.truncate(right, HALF_WIDTH, true);
            Some((left << HALF_WIDTH) | right)
        } else {
            self.dbg.parse_expression(text, pass1)
        }
    }

    /// Evaluates an expression that must resolve now.
    fn require(&mut self, text: &str) -> Result<i64> {
        let dot = self.out.dot();
        self.eval_at(text, dot, false).ok_or_else(|| {
            Error::expression(
                self.line_no,
                format!("unable to parse expression \"{}\"", text.trim()),
            )
        })
    }

    // ----- the second phase -----

    fn finish(&mut self) -> Result<()> {
        if let Some(capture) = &self.capture {
            return Err(Error::scope(
                capture.target.line,
                format!("macro body for {} never closed", capture.target.name),
            ));
        }
        if let Some(capture) = &self.strcap {
            return Err(Error::scope(capture.line, "unterminated string"));
        }
        if let Some(scope) = self.scopes.last() {
            return Err(Error::scope(scope.line, "scope never closed"));
        }
        self.ended = false;
        self.gen_literals()?;
        self.gen_variables()?;
        self.resolve_fixups()
    }

    /// Materializes the literal pool. A literal whose exact word and fixup
    /// sequence already appears in the pool collapses onto that address.
    fn gen_literals(&mut self) -> Result<()> {
        let pool_start = self.out.location;
        let literals = std::mem::take(&mut self.literals);
        for literal in &literals {
            let mut address = None;
            if !literal.words.is_empty() {
                if let Some(limit) = self.out.location.checked_sub(literal.words.len()) {
                    'bases: for base in pool_start..=limit {
                        for (i, word) in literal.words.iter().enumerate() {
                            if self.out.words.get(base + i) != Some(word) {
                                continue 'bases;
                            }
                            let existing =
                                self.out.fixups.get(&(base + i)).map(|f| f.expr.as_str());
                            let wanted = literal.fixups[i].as_ref().map(|f| f.expr.as_str());
                            if existing != wanted {
                                continue 'bases;
                            }
                        }
                        address = Some(base);
                        break;
                    }
                }
            }
            let line_no = self.line_no;
            let location = match address {
                Some(base) => base as Word,
                None => self.out.location as Word,
            };
            self.symbols
                .define(self.dbg, &literal.name, location, symbols::LABEL, line_no)
                .map_err(|message| Error::definition(line_no, message))?;
            if address.is_none() {
                for (word, fixup) in literal.words.iter().zip(literal.fixups.iter()) {
                    self.out.emit(*word, fixup.clone());
                }
            }
        }
        Ok(())
    }

    /// Emits the reserved variables after the literals, one word each.
    fn gen_variables(&mut self) -> Result<()> {
        let queue: Vec<String> = self.reserved.drain(..).collect();
        for key in queue {
            let mac = self.macros.get(&key).cloned().ok_or_else(|| {
                Error::definition(self.line_no, format!("reserved symbol {} lost", key))
            })?;
            let saved = self.line_no;
            self.line_no = mac.line;
            let result = self.parse_text(&mac.body, None);
            self.line_no = saved;
            result?;
        }
        Ok(())
    }

    /// Re-evaluates every deferred expression with `.` at its own word and
    /// folds the result into the stored word.
    fn resolve_fixups(&mut self) -> Result<()> {
        let fixups = std::mem::take(&mut self.out.fixups);
        for (location, fixup) in fixups {
            let value = self.eval_at(&fixup.expr, location, false).ok_or_else(|| {
                Error::expression(
                    fixup.line,
                    format!("unable to parse expression \"{}\"", fixup.expr.trim()),
                )
            })?;
            let sum = (self.out.words[location] as i64).wrapping_add(value);
            self.out.words[location] = self.truncate_word(sum, fixup.line);
        }
        Ok(())
    }
}

/// Splits a definer's operand text into the part before the body and the
/// offset the body capture should start from. The body follows the first
/// top-level comma when there is one (the expression itself may use angle
/// brackets), else the first `<`.
fn split_at_open(operands: &str) -> (&str, usize) {
    let bytes = operands.as_bytes();
    let mut depth = 0i32;
    for (i, &c) in bytes.iter().enumerate() {
        match c {
            b'(' | b'[' | b'<' => depth += 1,
            b')' | b']' | b'>' => depth -= 1,
            b',' if depth == 0 => return (&operands[..i], i + 1),
            _ => {}
        }
    }
    match operands.find('<') {
        Some(open) => (&operands[..open], open),
        None => (operands, operands.len()),
    }
}
