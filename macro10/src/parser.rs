use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "line.pest"]
pub struct LineParser;

/// One tokenized source line. All fields borrow from the original text;
/// `operands` runs from `operands_start` up to the comment, verbatim, so
/// that literal brackets and string delimiters can be rescanned exactly as
/// written.
#[derive(Debug, PartialEq)]
pub struct Line<'l> {
    pub label: Option<&'l str>,
    pub op: &'l str,
    pub separator: &'l str,
    pub operands: &'l str,
    pub operands_start: usize,
    pub comment: &'l str,
}

impl<'l> Line<'l> {
    /// The raw operand-plus-comment tail.
    pub fn tail(&self) -> String {
        format!("{}{}", self.operands, self.comment)
    }
}

/// Splits a line into label, operator, separator, operand text, and
/// comment. Returns `None` when the line does not have the MACRO-10 line
/// shape (stray characters in the label or operator position).
pub fn tokenize(text: &str) -> Option<Line> {
    let pair = LineParser::parse(Rule::line, text).ok()?.next()?;

    let mut line = Line {
        label: None,
        op: "",
        separator: "",
        operands: "",
        operands_start: 0,
        comment: "",
    };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::label => {
                line.label = Some(inner.as_str());
            }
            Rule::opfield => {
                for part in inner.into_inner() {
                    match part.as_rule() {
                        Rule::opsym => line.op = part.as_str(),
                        Rule::separator => line.separator = part.as_str(),
                        _ => unreachable!(),
                    }
                }
            }
            Rule::operands => {
                line.operands = inner.as_str();
                line.operands_start = inner.as_span().start();
            }
            Rule::comment => {
                line.comment = inner.as_str();
            }
            Rule::EOI => {}
            _ => unreachable!(),
        }
    }

    Some(line)
}
