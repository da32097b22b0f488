use pdp10::Word;
use std::collections::BTreeMap;

/// A deferred expression attached to an emitted word. The expression is
/// re-evaluated once every symbol is defined and the result is added into
/// the stored word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fixup {
    pub expr: String,
    pub line: u32,
}

/// The live output state: the word store indexed by location, the sparse
/// fixup store beside it, and the location counters. Entering a literal or
/// OPDEF operand swaps the whole value out for a fresh one, so there is
/// never more than one write head.
#[derive(Clone, Debug, Default)]
pub struct Output {
    pub words: Vec<Word>,
    pub fixups: BTreeMap<usize, Fixup>,
    pub location: usize,
    /// Location of the enclosing scope; `.` refers to this while a side
    /// scope is active.
    pub scope_location: Option<usize>,
}

impl Output {
    pub fn new(location: usize) -> Output {
        Output {
            words: Vec::new(),
            fixups: BTreeMap::new(),
            location,
            scope_location: None,
        }
    }

    /// Stores a word at the current location and advances. A `LOC` that
    /// moved the counter forward zero-fills the gap; moving it backwards
    /// overwrites.
    pub fn emit(&mut self, word: Word, fixup: Option<Fixup>) {
        if self.words.len() <= self.location {
            self.words.resize(self.location + 1, 0);
        }
        self.words[self.location] = word;
        match fixup {
            Some(f) => {
                self.fixups.insert(self.location, f);
            }
            None => {
                self.fixups.remove(&self.location);
            }
        }
        self.location += 1;
    }

    /// The effective `.` value: the enclosing location while assembling a
    /// side scope, the live counter otherwise.
    pub fn dot(&self) -> usize {
        self.scope_location.unwrap_or(self.location)
    }
}

/// A saved output frame. Pushed when a literal or OPDEF operand starts
/// assembling into a side buffer, popped when it completes; `line` is where
/// the scope opened, cited if it never closes.
#[derive(Debug)]
pub struct Scope {
    pub name: Option<String>,
    pub output: Output,
    pub line: u32,
}

/// A captured literal, waiting to be placed in the pool after the main
/// pass. `fixups` parallels `words`.
#[derive(Clone, Debug)]
pub struct Literal {
    pub name: String,
    pub words: Vec<Word>,
    pub fixups: Vec<Option<Fixup>>,
}

impl Literal {
    /// Collapses a finished scope into its word/fixup sequence.
    pub fn from_output(name: String, output: Output) -> Literal {
        let fixups = (0..output.words.len())
            .map(|i| output.fixups.get(&i).cloned())
            .collect();
        let words = output.words;
        Literal {
            name,
            words,
            fixups,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn emit_advances_and_overwrites() {
        let mut out = Output::new(0o1000);
        out.emit(5, None);
        assert_eq!(out.location, 0o1001);
        assert_eq!(out.words.len(), 0o1001);
        assert_eq!(out.words[0o1000], 5);
        // move back and overwrite
        out.location = 0o1000;
        out.emit(6, None);
        assert_eq!(out.words[0o1000], 6);
    }

    #[test]
    fn emit_clears_stale_fixups() {
        let mut out = Output::new(0);
        out.emit(
            0,
            Some(Fixup {
                expr: "A".to_owned(),
                line: 1,
            }),
        );
        out.location = 0;
        out.emit(1, None);
        assert!(out.fixups.is_empty());
    }

    #[test]
    fn dot_prefers_scope_location() {
        let mut out = Output::new(0);
        out.emit(0, None);
        assert_eq!(out.dot(), 1);
        out.scope_location = Some(0o2000);
        assert_eq!(out.dot(), 0o2000);
    }
}
