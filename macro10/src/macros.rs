use crate::expr::is_sym_char;
use matches::debug_assert_matches;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IfSense {
    Equal,
    Greater,
    Less,
    NotEqual,
}

impl IfSense {
    pub fn satisfied(self, value: i64) -> bool {
        match self {
            IfSense::Equal => value == 0,
            IfSense::Greater => value > 0,
            IfSense::Less => value < 0,
            IfSense::NotEqual => value != 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MacroKind {
    Define,
    Opdef,
    Literal,
    Reserved,
    Repeat(i64),
    If(i64, IfSense),
    Irp,
    Irpc,
}

/// One macro table entry. Named DEFINE/OPDEF macros are invoked from use
/// sites; anonymous REPEAT/IFx/IRP/IRPC bodies and auto-named literals and
/// reserved variables live in the same table under synthetic `?` names.
#[derive(Clone, Debug)]
pub struct Macro {
    pub name: String,
    pub kind: MacroKind,
    pub params: Vec<String>,
    pub defaults: Vec<String>,
    /// IRP/IRPC iteration items, resolved when the macro is defined.
    pub values: Vec<String>,
    pub body: String,
    pub line: u32,
}

impl Macro {
    pub fn new(name: String, kind: MacroKind, line: u32) -> Macro {
        Macro {
            name,
            kind,
            params: Vec::new(),
            defaults: Vec::new(),
            values: Vec::new(),
            body: String::new(),
            line,
        }
    }
}

/// A parameter binding for one expansion: call values already filled out
/// with defaults.
#[derive(Clone, Debug, Default)]
pub struct Binding {
    pub params: Vec<String>,
    pub values: Vec<String>,
}

impl Binding {
    /// Binds call values to parameters, filling missing trailing values
    /// from the defaults.
    pub fn bind(params: &[String], defaults: &[String], call_values: Vec<String>) -> Binding {
        let mut values = call_values;
        while values.len() < params.len() {
            let i = values.len();
            values.push(defaults.get(i).cloned().unwrap_or_default());
        }
        // A null argument also falls back to its default.
        for (i, value) in values.iter_mut().enumerate() {
            if value.is_empty() {
                if let Some(default) = defaults.get(i) {
                    value.clone_from(default);
                }
            }
        }
        Binding {
            params: params.to_vec(),
            values,
        }
    }

    pub fn value_of(&self, param: &str) -> Option<&str> {
        let param = param.to_uppercase();
        self.params
            .iter()
            .position(|p| *p == param)
            .map(|i| self.values[i].as_str())
    }
}

/// Substitutes every bound parameter in `text`. A parameter only matches
/// when flanked by non-symbol characters; an apostrophe immediately before
/// or after the match is the concatenation operator and is consumed.
pub fn substitute(text: &str, binding: &Binding) -> (String, bool) {
    let mut out = text.to_owned();
    let mut changed = false;
    for (param, value) in binding.params.iter().zip(binding.values.iter()) {
        let (next, one_changed) = substitute_one(&out, param, value);
        out = next;
        changed |= one_changed;
    }
    (out, changed)
}

fn substitute_one(text: &str, param: &str, value: &str) -> (String, bool) {
    if param.is_empty() {
        return (text.to_owned(), false);
    }
    let hay = text.to_ascii_uppercase();
    let needle = param.to_ascii_uppercase();
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    let mut changed = false;
    while let Some(rel) = hay[i..].find(&needle) {
        let start = i + rel;
        let end = start + needle.len();
        let free_before = start == 0 || !is_sym_char(bytes[start - 1]);
        let free_after = end >= bytes.len() || !is_sym_char(bytes[end]);
        if free_before && free_after {
            let mut copy_end = start;
            if start > i && bytes[start - 1] == b'\'' {
                copy_end = start - 1;
            }
            out.push_str(&text[i..copy_end]);
            out.push_str(value);
            let mut next = end;
            if next < bytes.len() && bytes[next] == b'\'' {
                next += 1;
            }
            i = next;
            changed = true;
        } else {
            out.push_str(&text[i..end]);
            i = end;
        }
    }
    out.push_str(&text[i..]);
    (out, changed)
}

/// Collects a delimited macro body across lines. Phase 1 is waiting for
/// the opening delimiter, phase 2 is inside the body tracking nesting.
#[derive(Debug)]
pub struct Capture {
    pub target: Macro,
    pub open: char,
    pub close: char,
    pub phase: u8,
    pub nesting: i32,
}

impl Capture {
    pub fn new(target: Macro, open: char, close: char) -> Capture {
        Capture {
            target,
            open,
            close,
            phase: 1,
            nesting: 0,
        }
    }

    /// Feeds one raw line (or line remainder). Returns true once the body
    /// is complete; text after the closing delimiter is dropped.
    pub fn append(&mut self, text: &str) -> bool {
        debug_assert_matches!(self.phase, 1 | 2);
        let mut chars = text.chars();
        if self.phase == 1 {
            loop {
                match chars.next() {
                    Some(c) if c == self.open => {
                        self.phase = 2;
                        self.nesting = 1;
                        break;
                    }
                    Some(_) => {}
                    None => return false,
                }
            }
        }
        for c in chars {
            if c == self.open {
                self.nesting += 1;
            } else if c == self.close {
                self.nesting -= 1;
                if self.nesting == 0 {
                    return true;
                }
            }
            self.target.body.push(c);
        }
        self.target.body.push('\n');
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn binding(params: &[&str], values: &[&str]) -> Binding {
        Binding {
            params: params.iter().map(|s| s.to_string()).collect(),
            values: values.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn substitution_needs_boundaries() {
        let b = binding(&["A"], &["5"]);
        assert_eq!(substitute("EXP A", &b), ("EXP 5".to_owned(), true));
        assert_eq!(substitute("EXP AB", &b), ("EXP AB".to_owned(), false));
        assert_eq!(substitute("A+A", &b), ("5+5".to_owned(), true));
    }

    #[test]
    fn concatenation_apostrophes() {
        let b = binding(&["X"], &["1"]);
        assert_eq!(substitute("TAG'X", &b), ("TAG1".to_owned(), true));
        assert_eq!(substitute("X'TAG", &b), ("1TAG".to_owned(), true));
    }

    #[test]
    fn binding_fills_defaults() {
        let params = vec!["A".to_owned(), "B".to_owned()];
        let defaults = vec![String::new(), "7".to_owned()];
        let b = Binding::bind(&params, &defaults, vec!["1".to_owned()]);
        assert_eq!(b.value_of("A"), Some("1"));
        assert_eq!(b.value_of("B"), Some("7"));
        assert_eq!(b.value_of("C"), None);
    }

    #[test]
    fn capture_single_line() {
        let mut capture = Capture::new(
            Macro::new("?REPEAT".to_owned(), MacroKind::Repeat(3), 1),
            '<',
            '>',
        );
        assert!(capture.append("<EXP 5>"));
        assert_eq!(capture.target.body, "EXP 5");
    }

    #[test]
    fn capture_nested_lines() {
        let mut capture = Capture::new(
            Macro::new("M".to_owned(), MacroKind::Define, 1),
            '<',
            '>',
        );
        assert!(!capture.append("<MOVE 1,2"));
        assert!(!capture.append("REPEAT 2,<EXP 1>"));
        assert!(capture.append(">"));
        assert_eq!(capture.target.body, "MOVE 1,2\nREPEAT 2,<EXP 1>\n");
    }

    #[test]
    fn if_senses() {
        assert!(IfSense::Equal.satisfied(0));
        assert!(!IfSense::Equal.satisfied(1));
        assert!(IfSense::NotEqual.satisfied(-1));
        assert!(IfSense::Greater.satisfied(2));
        assert!(IfSense::Less.satisfied(-2));
    }
}
