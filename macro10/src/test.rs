use crate::*;
use pdp10::debugger::BufferConsole;
use pdp10::{Debugger, Word};

fn assemble_at(input: &str, address: Word) -> (Vec<Word>, Option<Word>) {
    let console = BufferConsole::new();
    let mut dbg = Debugger::with_console(Box::new(console));
    let image = crate::assemble_addressed(input, address, &mut dbg).unwrap();
    (image.words().to_vec(), image.start())
}

fn words(input: &str) -> Vec<Word> {
    assemble_at(input, 0).0
}

fn assemble_err(input: &str) -> Error {
    let console = BufferConsole::new();
    let mut dbg = Debugger::with_console(Box::new(console));
    crate::assemble(input, &mut dbg).unwrap_err()
}

#[test]
fn label_redefined_is_fatal() {
    let err = assemble_err("A:\t0\nA:\t0");
    assert_eq!(err.line, 2);
    assert_eq!(err.to_string(), "error at line 2: label A redefined");
}

#[test]
fn label_reference() {
    let output = words("A:\tEXP 5\n\tEXP A");
    assert_eq!(output, vec![5, 0]);
}

#[test]
fn bare_operands_are_word_expressions() {
    assert_eq!(words("\t1,2,3"), vec![1, 2, 3]);
    assert_eq!(words("A:\t5,,6,7"), vec![0o000005000006, 7]);
}

#[test]
fn literal_collapsing() {
    let output = words("\tHRRZI 1,[135531,,246642]\n\tCAIE 1,[135531,,246642]");
    // one pool word, both address fields pointing at it
    assert_eq!(
        output,
        vec![0o550040000002, 0o302040000002, 0o135531246642]
    );
}

#[test]
fn distinct_literals_do_not_collapse() {
    let output = words("\tEXP [0]\n\tEXP [ASCIZ/TEST1/]");
    // [0] resolves through a fixup; the ASCIZ trailing zero word does not
    assert_eq!(output.len(), 2 + 1 + 2);
    assert_eq!(output[0], 2);
    assert_eq!(output[1], 3);
    assert_eq!(output[2], 0);
    assert_eq!(output[4], 0);
}

#[test]
fn double_comma_halfwords() {
    let output = words("\tXWD 1,2\n\tEXP 1,,2");
    assert_eq!(output, vec![0o000001000002, 0o000001000002]);
}

#[test]
fn negative_left_halfword() {
    let output = words("\tEXP -1,,0");
    assert_eq!(output, vec![0o777777000000]);
}

#[test]
fn asciz_terminates() {
    let output = words("\tASCIZ /AB/");
    assert_eq!(output, vec![(0o101 << 29) | (0o102 << 22)]);
}

#[test]
fn sixbit_case_fold() {
    let output = words("\tSIXBIT /ab/");
    assert_eq!(output, vec![(0o41 << 30) | (0o42 << 24)]);
}

#[test]
fn string_spans_lines() {
    let output = words("\tASCIZ /AB\nCD/");
    // A B CR LF C packed into the first word, D and the zero into the next
    assert_eq!(output.len(), 2);
    assert_eq!(
        output[0],
        (0o101 << 29) | (0o102 << 22) | (0o15 << 15) | (0o12 << 8) | (0o103 << 1)
    );
    assert_eq!(output[1], 0o104 << 29);
}

#[test]
fn string_delimiter_may_be_semicolon() {
    let output = words("\tEXP [ASCIZ ;A;]");
    assert_eq!(output, vec![1, 0o101 << 29]);
}

#[test]
fn repeat_emits_n_copies() {
    let output = words("\tREPEAT 3,<EXP 5>");
    assert_eq!(output, vec![5, 5, 5]);
    // the comma before the body is optional
    assert_eq!(words("\tREPEAT 2 <EXP 5>"), vec![5, 5]);
    assert_eq!(words("\tREPEAT 0,<EXP 5>"), Vec::<Word>::new());
}

#[test]
fn conditionals() {
    assert_eq!(words("\tIFE 0,<EXP 1>"), vec![1]);
    assert_eq!(words("\tIFE 0 <EXP 1>"), vec![1]);
    assert_eq!(words("\tIFE 1,<EXP 1>"), Vec::<Word>::new());
    assert_eq!(words("\tIFN 0,<EXP 1>"), Vec::<Word>::new());
    assert_eq!(words("\tIFN 1,<EXP 1>"), vec![1]);
    assert_eq!(words("\tIFG 1,<EXP 1>"), vec![1]);
    assert_eq!(words("\tIFL -1,<EXP 1>"), vec![1]);
}

#[test]
fn conditional_expression_may_use_brackets() {
    assert_eq!(words("\tIFE <5-5>,<EXP 1>"), vec![1]);
}

#[test]
fn location_counter() {
    let output = words("\tLOC 1000\n\tNOP");
    assert_eq!(output.len(), 0o1001);
    assert_eq!(output[0], 0);
    assert_eq!(output[0o1000], 0o255000000000);
}

#[test]
fn end_to_end_start_address() {
    let (output, start) = assemble_at("\tLOC 1000\nSTART:\tEXP 1,,2\n\tEND START", 0);
    assert_eq!(output.len(), 0o1001);
    assert_eq!(output[0o1000], 0o000001000002);
    assert_eq!(start, Some(0o1000));
}

#[test]
fn end_without_operand_leaves_no_start() {
    let (output, start) = assemble_at("\tEXP 5\n\tEND\n\tEXP 6", 0);
    // assembly stops at END
    assert_eq!(output, vec![5]);
    assert_eq!(start, None);
}

#[test]
fn host_variables_survive_assembly() {
    let console = BufferConsole::new();
    let mut dbg = Debugger::with_console(Box::new(console));
    dbg.set_variable("KEEP", 7);
    crate::assemble("START:\tEXP 5\n\tEND START", &mut dbg).unwrap();
    assert_eq!(dbg.get_variable("KEEP"), Some(7));
    assert_eq!(dbg.get_variable("START"), None);
}

#[test]
fn define_with_defaults() {
    let input = "\
DEFINE BUMP(A,B<2>)<
EXP A+B>
\tBUMP 3
\tBUMP (3,4)";
    assert_eq!(words(input), vec![5, 7]);
}

#[test]
fn define_concatenation() {
    let input = "\
DEFINE TAG(N)<
T'N:\tEXP N>
\tTAG 1
\tEXP T1";
    assert_eq!(words(input), vec![1, 0]);
}

#[test]
fn repeat_inside_define_sees_parameters() {
    let input = "\
DEFINE FILL(V)<
REPEAT 2,<
EXP V>>
\tFILL 6";
    assert_eq!(words(input), vec![6, 6]);
}

#[test]
fn irp_iterates_values() {
    let input = "\
DEFINE SUMS(L)<
IRP L,<
EXP L>>
\tSUMS <1,2,3>";
    assert_eq!(words(input), vec![1, 2, 3]);
}

#[test]
fn irpc_iterates_characters() {
    let input = "\
DEFINE DIGITS(D)<
IRPC D,<
EXP D>>
\tDIGITS 123";
    assert_eq!(words(input), vec![1, 2, 3]);
}

#[test]
fn opdef_combines_fields() {
    let input = "\
\tOPDEF CALL [PUSHJ 17,]
\tCALL FOO
FOO:\tEXP 0";
    assert_eq!(words(input), vec![0o260740000001, 0]);
}

#[test]
fn opdef_indirect_bit_ors_in() {
    let input = "\
\tOPDEF FETCH [MOVE 1,]
\tFETCH @2(3)";
    assert_eq!(
        words(input),
        vec![0o200040000000 | pdp10::IND_MASK | (3 << 18) | 2]
    );
}

#[test]
fn reserved_symbols_share_one_cell() {
    let input = "\
\tMOVEM 1,COUNT#
\tMOVE 2,COUNT#";
    assert_eq!(
        words(input),
        vec![0o202040000002, 0o200100000002, 0]
    );
}

#[test]
fn nested_literals() {
    let output = words("\tEXP [JRST [0]]");
    assert_eq!(output, vec![2, 0, 0o254000000001]);
}

#[test]
fn literal_scan_ignores_comments() {
    assert_eq!(words("\tEXP 5 ;[not a literal]"), vec![5]);
}

#[test]
fn current_location_period() {
    let output = words("\tJRST .+1\n\tJRST .-1");
    assert_eq!(output, vec![0o254000000001, 0o254000000000]);
}

#[test]
fn assignment_flavors() {
    let output = words("P==17\nGLOB=:123\n\tMOVE P,0\n\tEXP GLOB");
    assert_eq!(output, vec![0o200740000000, 0o123]);
}

#[test]
fn forward_reference_in_instruction() {
    let output = words("\tJRST DONE\nDONE:\tEXP 0");
    assert_eq!(output, vec![0o254000000001, 0]);
}

#[test]
fn unterminated_macro_cites_opening_line() {
    let err = assemble_err("\tEXP 1\n\tREPEAT 3,<EXP 2");
    assert_eq!(err.line, 2);
    assert!(matches!(err.kind, ErrorKind::Scope(_)));
}

#[test]
fn unknown_symbol_is_an_expression_error() {
    let err = assemble_err("\tEXP NOSUCH");
    assert_eq!(err.line, 1);
    assert!(matches!(err.kind, ErrorKind::Expression(_)));
}

#[test]
fn truncation_warns_and_wraps() {
    let console = BufferConsole::new();
    let mut dbg = Debugger::with_console(Box::new(console.clone()));
    let image = crate::assemble("\tEXP 400000000000+400000000000", &mut dbg).unwrap();
    assert_eq!(image.words(), &[0]);
    let lines = console.lines();
    assert!(lines.iter().any(|l| l.starts_with("warning at line 1:")));
}

#[test]
fn preprocess_echoes_source() {
    let console = BufferConsole::new();
    let mut dbg = Debugger::with_console(Box::new(console.clone()));
    let mut asm = Macro10::new(&mut dbg, 0, Options::from_letters("p"));
    asm.assemble("\tEXP 5").unwrap();
    assert!(console.lines().iter().any(|l| l.contains("EXP 5")));
    assert!(asm.image().is_empty());
}

#[test]
fn load_address_offsets_image() {
    let (output, _) = assemble_at("\tEXP 5\n\tEXP 6", 0o100);
    assert_eq!(output, vec![5, 6]);
}

#[test]
fn errors_report_through_console() {
    let console = BufferConsole::new();
    let mut dbg = Debugger::with_console(Box::new(console.clone()));
    crate::assemble("A:\t0\nA:\t0", &mut dbg).unwrap_err();
    assert!(console
        .lines()
        .iter()
        .any(|l| l == "error at line 2: label A redefined"));
}
