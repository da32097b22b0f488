use util::{EnumFromStr, ParseEnumError};

/// Assembler directives, dispatched on the uppercased operator. Anything
/// that fails this lookup is a macro invocation, a machine instruction, or
/// a bare word expression.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PseudoOp {
    Ascii,
    Asciz,
    Define,
    End,
    Exp,
    Ife,
    Ifg,
    Ifl,
    Ifn,
    Irp,
    Irpc,
    Lall,
    List,
    Loc,
    Nosym,
    Opdef,
    Page,
    Repeat,
    Sixbit,
    Subttl,
    Title,
    Xlist,
    Xwd,
}

impl PseudoOp {
    /// Listing-control directives are accepted and ignored.
    pub fn is_ignored(self) -> bool {
        matches!(
            self,
            PseudoOp::Lall
                | PseudoOp::List
                | PseudoOp::Nosym
                | PseudoOp::Page
                | PseudoOp::Subttl
                | PseudoOp::Title
                | PseudoOp::Xlist
        )
    }

    /// Directives that open a delimited macro body.
    pub fn is_definer(self) -> bool {
        matches!(
            self,
            PseudoOp::Define
                | PseudoOp::Opdef
                | PseudoOp::Repeat
                | PseudoOp::Ife
                | PseudoOp::Ifg
                | PseudoOp::Ifl
                | PseudoOp::Ifn
                | PseudoOp::Irp
                | PseudoOp::Irpc
        )
    }
}

impl EnumFromStr for PseudoOp {
    fn from_str(s: &str) -> Result<PseudoOp, ParseEnumError> {
        let op = match s {
            "ASCII" => PseudoOp::Ascii,
            "ASCIZ" => PseudoOp::Asciz,
            "DEFINE" => PseudoOp::Define,
            "END" => PseudoOp::End,
            "EXP" => PseudoOp::Exp,
            "IFE" => PseudoOp::Ife,
            "IFG" => PseudoOp::Ifg,
            "IFL" => PseudoOp::Ifl,
            "IFN" => PseudoOp::Ifn,
            "IRP" => PseudoOp::Irp,
            "IRPC" => PseudoOp::Irpc,
            "LALL" => PseudoOp::Lall,
            "LIST" => PseudoOp::List,
            "LOC" => PseudoOp::Loc,
            "NOSYM" => PseudoOp::Nosym,
            "OPDEF" => PseudoOp::Opdef,
            "PAGE" => PseudoOp::Page,
            "REPEAT" => PseudoOp::Repeat,
            "SIXBIT" => PseudoOp::Sixbit,
            "SUBTTL" => PseudoOp::Subttl,
            "TITLE" => PseudoOp::Title,
            "XLIST" => PseudoOp::Xlist,
            "XWD" => PseudoOp::Xwd,
            _ => {
                return Err(ParseEnumError {
                    value: s.to_string(),
                    enum_name: "PseudoOp",
                })
            }
        };
        Ok(op)
    }
}

impl std::str::FromStr for PseudoOp {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<PseudoOp, ParseEnumError> {
        EnumFromStr::from_str(s)
    }
}
