use crate::debugger::*;
use crate::enums::{IoFunct, Opcode};
use crate::instructions::*;
use num::traits::{FromPrimitive, ToPrimitive};

#[test]
fn opcode_values() {
    assert_eq!(Opcode::MOVE as u64, 0o200);
    assert_eq!(Opcode::JRST as u64, 0o254);
    assert_eq!(Opcode::CAIE as u64, 0o302);
    assert_eq!(Opcode::TSON as u64, 0o677);
    assert_eq!(Opcode::HRRZI.to_u64(), Some(0o551));
    assert_eq!(Opcode::from_u64(0o254), Some(Opcode::JRST));
    assert_eq!("hrrzi".to_uppercase().parse::<Opcode>(), Ok(Opcode::HRRZI));
    assert_eq!("OR".parse::<Opcode>(), Ok(Opcode::IOR));
    assert!("BOGUS".parse::<Opcode>().is_err());
}

#[test]
fn make_basic_instruction() {
    let w = make_instruction(Opcode::MOVE, 1, false, 2, 0o1000);
    assert_eq!(w, 0o200042001000);
    assert_eq!(opcode_field(w), 0o200);
    assert_eq!(ac_field(w), 1);
    assert_eq!(xr_field(w), 2);
    assert_eq!(addr_field(w), 0o1000);
    assert!(!ind_field(w));
}

#[test]
fn make_indirect_instruction() {
    let w = make_instruction(Opcode::JRST, 0, true, 0, 0o400);
    assert_eq!(w, 0o254_02_0_000400);
    assert!(ind_field(w));
}

#[test]
fn io_instruction() {
    // CONO PI,2200 from the hardware manual: device 004, function 4.
    let w = make_io_instruction(IoFunct::CONO, 0o004, false, 0, 0o2200);
    assert_eq!(w, 0o700600002200);
}

#[test]
fn halfword_helpers() {
    let w = xwd(0o135531, 0o246642);
    assert_eq!(lh(w), 0o135531);
    assert_eq!(rh(w), 0o246642);
    assert_eq!(w, 0o135531246642);
}

#[test]
fn expression_octal_default() {
    let mut dbg = Debugger::new();
    assert_eq!(dbg.parse_expression("10", false), Some(0o10));
    assert_eq!(dbg.parse_expression("10.", false), Some(10));
    assert_eq!(dbg.parse_expression("^D16", false), Some(16));
    assert_eq!(dbg.parse_expression("^O20", false), Some(0o20));
    assert_eq!(dbg.parse_expression("^B101", false), Some(5));
    // 8 and 9 are not octal digits
    assert_eq!(dbg.parse_expression("18", false), None);
}

#[test]
fn expression_precedence() {
    let mut dbg = Debugger::new();
    assert_eq!(dbg.parse_expression("1+2*3", false), Some(7));
    assert_eq!(dbg.parse_expression("<1+2>*3", false), Some(9));
    assert_eq!(dbg.parse_expression("(1+2)*3", false), Some(9));
    assert_eq!(dbg.parse_expression("-2+3", false), Some(1));
    assert_eq!(dbg.parse_expression("10/2", false), Some(4));
    assert_eq!(dbg.parse_expression("1/0", false), None);
}

#[test]
fn expression_halfwords() {
    let mut dbg = Debugger::new();
    assert_eq!(dbg.parse_expression("1,,2", false), Some(0o000001000002));
    assert_eq!(
        dbg.parse_expression("-1,,0", false),
        Some(0o777777000000u64 as i64)
    );
}

#[test]
fn expression_symbols() {
    let mut dbg = Debugger::new();
    dbg.set_variable("START", 0o1000);
    assert_eq!(dbg.parse_expression("START+1", false), Some(0o1001));
    // names are significant to six characters
    dbg.set_variable("DIAGNOSTIC", 7);
    assert_eq!(dbg.parse_expression("DIAGNO", false), Some(7));
    assert_eq!(dbg.parse_expression("DIAGNOSE", false), Some(7));
    assert_eq!(dbg.parse_expression("GONE", false), None);
}

#[test]
fn expression_undefined_pass1() {
    let mut dbg = Debugger::new();
    assert_eq!(dbg.parse_expression("GONE+2", true), Some(2));
    assert_eq!(dbg.undefined(), "GONE");
    assert_eq!(dbg.parse_expression("A+B", true), Some(0));
    assert_eq!(dbg.undefined(), "A+B");
    assert_eq!(dbg.parse_expression("1+1", true), Some(2));
    assert_eq!(dbg.undefined(), "");
}

#[test]
fn expression_quoted() {
    let mut dbg = Debugger::new();
    // SIXBIT packs left-justified, six chars per word
    assert_eq!(
        dbg.parse_expression("'A'", false),
        Some((0o41u64 << 30) as i64)
    );
    // seven-bit ASCII, five chars per word, pad bit at 35
    assert_eq!(
        dbg.parse_expression("\"A\"", false),
        Some((0o101u64 << 29) as i64)
    );
}

#[test]
fn instruction_basic() {
    let mut dbg = Debugger::new();
    dbg.set_variable("TAG", 0o1000);
    assert_eq!(
        dbg.parse_instruction("MOVE", "1,TAG", 0, true),
        Some(make_instruction(Opcode::MOVE, 1, false, 0, 0o1000))
    );
    assert_eq!(dbg.undefined(), "");
}

#[test]
fn instruction_indexed_indirect() {
    let mut dbg = Debugger::new();
    dbg.set_variable("TAG", 0o1000);
    assert_eq!(
        dbg.parse_instruction("MOVE", "2,@TAG(4)", 0, true),
        Some(make_instruction(Opcode::MOVE, 2, true, 4, 0o1000))
    );
}

#[test]
fn instruction_forward_reference() {
    let mut dbg = Debugger::new();
    let w = dbg.parse_instruction("JRST", "LATER", 0, true);
    assert_eq!(w, Some(make_instruction(Opcode::JRST, 0, false, 0, 0)));
    assert_eq!(dbg.undefined(), "LATER");
}

#[test]
fn instruction_compound() {
    let mut dbg = Debugger::new();
    assert_eq!(
        dbg.parse_instruction("HALT", ".", 0, true),
        // HALT is JRST 4,; "." is not special to the host
        Some(make_instruction(Opcode::JRST, 4, false, 0, 0))
    );
    assert_eq!(dbg.undefined(), ".");
    assert_eq!(
        dbg.parse_instruction("NOP", "", 0o1000, true),
        Some(make_instruction(Opcode::JFCL, 0, false, 0, 0))
    );
}

#[test]
fn instruction_empty_address() {
    let mut dbg = Debugger::new();
    dbg.set_variable("P", 0o17);
    // POPJ P, has an empty address operand
    assert_eq!(
        dbg.parse_instruction("POPJ", "P,", 0, true),
        Some(make_instruction(Opcode::POPJ, 0o17, false, 0, 0))
    );
    assert_eq!(dbg.undefined(), "");
}

#[test]
fn instruction_swapped_group() {
    let mut dbg = Debugger::new();
    // MOVSI 1,(1) folds the swapped group value into the left half
    let w = dbg.parse_instruction("MOVSI", "1,(1)", 0, true).unwrap();
    assert_eq!(w, make_instruction(Opcode::MOVSI, 1, false, 1, 0));
}

#[test]
fn instruction_io() {
    let mut dbg = Debugger::new();
    dbg.set_variable("PI", 0o004);
    assert_eq!(
        dbg.parse_instruction("CONO", "PI,2200", 0, true),
        Some(0o700600002200)
    );
    assert_eq!(
        dbg.parse_instruction("DATAI", "APR,0", 0, true),
        None // APR is not defined in this table
    );
}

#[test]
fn instruction_unknown() {
    let mut dbg = Debugger::new();
    assert_eq!(dbg.parse_instruction("FROB", "1,2", 0, true), None);
}

#[test]
fn truncate_fields() {
    let dbg = Debugger::new();
    assert_eq!(dbg.truncate(-1, 18, true), 0o777777);
    assert_eq!(dbg.truncate(0o1000, 18, true), 0o1000);
    assert_eq!(dbg.truncate(-1, 36, true), 0o777777777777);
    assert_eq!(dbg.truncate(0o777777, 18, false), -1);
}

#[test]
fn octal_rendering() {
    let dbg = Debugger::new();
    assert_eq!(dbg.to_str_base(0o1000), "1000");
    assert_eq!(dbg.to_str_base(-8), "-10");
    assert_eq!(dbg.to_str_base(0), "0");
}

#[test]
fn variable_snapshot_round_trip() {
    let mut dbg = Debugger::new();
    dbg.set_variable("KEEP", 42);
    let saved = dbg.reset_variables();
    dbg.set_variable("TEMP", 1);
    dbg.restore_variables(saved);
    assert_eq!(dbg.get_variable("KEEP"), Some(42));
    assert_eq!(dbg.get_variable("TEMP"), None);
}

#[test]
fn sixbit_packing() {
    assert_eq!(sixbit_char('A'), 0o41);
    assert_eq!(sixbit_char('a'), 0o41);
    assert_eq!(sixbit_char(' '), 0o00);
    assert_eq!(sixbit_char('?'), 0o77);
    let w = pack_sixbit_word("AB");
    assert_eq!(w >> 30, 0o41);
    assert_eq!((w >> 24) & 0o77, 0o42);
}

#[test]
fn buffer_console() {
    let buffer = BufferConsole::new();
    let mut dbg = Debugger::with_console(Box::new(buffer.clone()));
    dbg.println("hello");
    assert_eq!(buffer.lines(), vec!["hello".to_owned()]);
}
