use num_derive::{FromPrimitive, ToPrimitive};
use util::{EnumFromStr, ParseEnumError};

// Generates a mnemonic enum with explicit octal discriminants plus the
// string lookup the assembler front end uses. Aliases map alternate
// mnemonics onto the same opcode value.
macro_rules! mnemonics {
    (
        $(#[$enum_meta:meta])*
        $name:ident {
            $( $(#[$meta:meta])* $mn:ident = $val:expr ),* $(,)?
        }
        aliases {
            $( $alias:expr => $target:ident ),* $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Debug, ToPrimitive, FromPrimitive)]
        pub enum $name {
            $( $(#[$meta])* $mn = $val, )*
        }

        impl EnumFromStr for $name {
            fn from_str(s: &str) -> Result<$name, ParseEnumError> {
                match s {
                    $( stringify!($mn) => Ok($name::$mn), )*
                    $( $alias => Ok($name::$target), )*
                    _ => Err(ParseEnumError {
                        value: s.to_string(),
                        enum_name: stringify!($name),
                    }),
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<$name, ParseEnumError> {
                EnumFromStr::from_str(s)
            }
        }
    };
}

mnemonics! {
    /// Basic (non-I/O) PDP-10 instruction set: the 9-bit opcode for each
    /// mnemonic. Groups of four follow the machine's mode pattern
    /// (basic / Immediate / Memory / Self or Both).
    Opcode {
        // Monitor calls
        CALL = 0o040, INIT = 0o041, CALLI = 0o047,
        OPEN = 0o050, TTCALL = 0o051, RENAME = 0o055, IN = 0o056, OUT = 0o057,
        SETSTS = 0o060, STATO = 0o061, GETSTS = 0o062, STATZ = 0o063,
        INBUF = 0o064, OUTBUF = 0o065, INPUT = 0o066, OUTPUT = 0o067,
        CLOSE = 0o070, RELEAS = 0o071, MTAPE = 0o072, UGETF = 0o073,
        USETI = 0o074, USETO = 0o075, LOOKUP = 0o076, ENTER = 0o077,

        // Double-precision and double-word moves
        DFAD = 0o110, DFSB = 0o111, DFMP = 0o112, DFDV = 0o113,
        DADD = 0o114, DSUB = 0o115, DMUL = 0o116, DDIV = 0o117,
        DMOVE = 0o120, DMOVN = 0o121, FIX = 0o122, EXTEND = 0o123,
        DMOVEM = 0o124, DMOVNM = 0o125, FIXR = 0o126, FLTR = 0o127,

        // Byte pointers and float scale
        UFA = 0o130, DFN = 0o131, FSC = 0o132, IBP = 0o133,
        ILDB = 0o134, LDB = 0o135, IDPB = 0o136, DPB = 0o137,

        // Floating point arithmetic
        FAD = 0o140, FADL = 0o141, FADM = 0o142, FADB = 0o143,
        FADR = 0o144, FADRI = 0o145, FADRM = 0o146, FADRB = 0o147,
        FSB = 0o150, FSBL = 0o151, FSBM = 0o152, FSBB = 0o153,
        FSBR = 0o154, FSBRI = 0o155, FSBRM = 0o156, FSBRB = 0o157,
        FMP = 0o160, FMPL = 0o161, FMPM = 0o162, FMPB = 0o163,
        FMPR = 0o164, FMPRI = 0o165, FMPRM = 0o166, FMPRB = 0o167,
        FDV = 0o170, FDVL = 0o171, FDVM = 0o172, FDVB = 0o173,
        FDVR = 0o174, FDVRI = 0o175, FDVRM = 0o176, FDVRB = 0o177,

        // Full-word moves
        MOVE = 0o200, MOVEI = 0o201, MOVEM = 0o202, MOVES = 0o203,
        MOVS = 0o204, MOVSI = 0o205, MOVSM = 0o206, MOVSS = 0o207,
        MOVN = 0o210, MOVNI = 0o211, MOVNM = 0o212, MOVNS = 0o213,
        MOVM = 0o214, MOVMI = 0o215, MOVMM = 0o216, MOVMS = 0o217,

        // Fixed-point multiply and divide
        IMUL = 0o220, IMULI = 0o221, IMULM = 0o222, IMULB = 0o223,
        MUL = 0o224, MULI = 0o225, MULM = 0o226, MULB = 0o227,
        IDIV = 0o230, IDIVI = 0o231, IDIVM = 0o232, IDIVB = 0o233,
        DIV = 0o234, DIVI = 0o235, DIVM = 0o236, DIVB = 0o237,

        // Shifts and rotates
        ASH = 0o240, ROT = 0o241, LSH = 0o242, JFFO = 0o243,
        ASHC = 0o244, ROTC = 0o245, LSHC = 0o246,

        // Exchange, block transfer, jumps
        EXCH = 0o250, BLT = 0o251, AOBJP = 0o252, AOBJN = 0o253,
        JRST = 0o254, JFCL = 0o255, XCT = 0o256, MAP = 0o257,

        // Stack and subroutine linkage
        PUSHJ = 0o260, PUSH = 0o261, POP = 0o262, POPJ = 0o263,
        JSR = 0o264, JSP = 0o265, JSA = 0o266, JRA = 0o267,

        // Fixed-point add and subtract
        ADD = 0o270, ADDI = 0o271, ADDM = 0o272, ADDB = 0o273,
        SUB = 0o274, SUBI = 0o275, SUBM = 0o276, SUBB = 0o277,

        // Arithmetic compares (immediate and memory)
        CAI = 0o300, CAIL = 0o301, CAIE = 0o302, CAILE = 0o303,
        CAIA = 0o304, CAIGE = 0o305, CAIN = 0o306, CAIG = 0o307,
        CAM = 0o310, CAML = 0o311, CAME = 0o312, CAMLE = 0o313,
        CAMA = 0o314, CAMGE = 0o315, CAMN = 0o316, CAMG = 0o317,

        // Conditional jumps and skips
        JUMP = 0o320, JUMPL = 0o321, JUMPE = 0o322, JUMPLE = 0o323,
        JUMPA = 0o324, JUMPGE = 0o325, JUMPN = 0o326, JUMPG = 0o327,
        SKIP = 0o330, SKIPL = 0o331, SKIPE = 0o332, SKIPLE = 0o333,
        SKIPA = 0o334, SKIPGE = 0o335, SKIPN = 0o336, SKIPG = 0o337,

        // Add or subtract one and jump or skip
        AOJ = 0o340, AOJL = 0o341, AOJE = 0o342, AOJLE = 0o343,
        AOJA = 0o344, AOJGE = 0o345, AOJN = 0o346, AOJG = 0o347,
        AOS = 0o350, AOSL = 0o351, AOSE = 0o352, AOSLE = 0o353,
        AOSA = 0o354, AOSGE = 0o355, AOSN = 0o356, AOSG = 0o357,
        SOJ = 0o360, SOJL = 0o361, SOJE = 0o362, SOJLE = 0o363,
        SOJA = 0o364, SOJGE = 0o365, SOJN = 0o366, SOJG = 0o367,
        SOS = 0o370, SOSL = 0o371, SOSE = 0o372, SOSLE = 0o373,
        SOSA = 0o374, SOSGE = 0o375, SOSN = 0o376, SOSG = 0o377,

        // Boolean functions
        SETZ = 0o400, SETZI = 0o401, SETZM = 0o402, SETZB = 0o403,
        AND = 0o404, ANDI = 0o405, ANDM = 0o406, ANDB = 0o407,
        ANDCA = 0o410, ANDCAI = 0o411, ANDCAM = 0o412, ANDCAB = 0o413,
        SETM = 0o414, SETMI = 0o415, SETMM = 0o416, SETMB = 0o417,
        ANDCM = 0o420, ANDCMI = 0o421, ANDCMM = 0o422, ANDCMB = 0o423,
        SETA = 0o424, SETAI = 0o425, SETAM = 0o426, SETAB = 0o427,
        XOR = 0o430, XORI = 0o431, XORM = 0o432, XORB = 0o433,
        IOR = 0o434, IORI = 0o435, IORM = 0o436, IORB = 0o437,
        ANDCB = 0o440, ANDCBI = 0o441, ANDCBM = 0o442, ANDCBB = 0o443,
        EQV = 0o444, EQVI = 0o445, EQVM = 0o446, EQVB = 0o447,
        SETCA = 0o450, SETCAI = 0o451, SETCAM = 0o452, SETCAB = 0o453,
        ORCA = 0o454, ORCAI = 0o455, ORCAM = 0o456, ORCAB = 0o457,
        SETCM = 0o460, SETCMI = 0o461, SETCMM = 0o462, SETCMB = 0o463,
        ORCM = 0o464, ORCMI = 0o465, ORCMM = 0o466, ORCMB = 0o467,
        ORCB = 0o470, ORCBI = 0o471, ORCBM = 0o472, ORCBB = 0o473,
        SETO = 0o474, SETOI = 0o475, SETOM = 0o476, SETOB = 0o477,

        // Halfword moves: {left,right} to {left,right}, with
        // {nothing, zeros, ones, extend} in the other half
        HLL = 0o500, HLLI = 0o501, HLLM = 0o502, HLLS = 0o503,
        HRL = 0o504, HRLI = 0o505, HRLM = 0o506, HRLS = 0o507,
        HLLZ = 0o510, HLLZI = 0o511, HLLZM = 0o512, HLLZS = 0o513,
        HRLZ = 0o514, HRLZI = 0o515, HRLZM = 0o516, HRLZS = 0o517,
        HLLO = 0o520, HLLOI = 0o521, HLLOM = 0o522, HLLOS = 0o523,
        HRLO = 0o524, HRLOI = 0o525, HRLOM = 0o526, HRLOS = 0o527,
        HLLE = 0o530, HLLEI = 0o531, HLLEM = 0o532, HLLES = 0o533,
        HRLE = 0o534, HRLEI = 0o535, HRLEM = 0o536, HRLES = 0o537,
        HRR = 0o540, HRRI = 0o541, HRRM = 0o542, HRRS = 0o543,
        HLR = 0o544, HLRI = 0o545, HLRM = 0o546, HLRS = 0o547,
        HRRZ = 0o550, HRRZI = 0o551, HRRZM = 0o552, HRRZS = 0o553,
        HLRZ = 0o554, HLRZI = 0o555, HLRZM = 0o556, HLRZS = 0o557,
        HRRO = 0o560, HRROI = 0o561, HRROM = 0o562, HRROS = 0o563,
        HLRO = 0o564, HLROI = 0o565, HLROM = 0o566, HLROS = 0o567,
        HRRE = 0o570, HRREI = 0o571, HRREM = 0o572, HRRES = 0o573,
        HLRE = 0o574, HLREI = 0o575, HLREM = 0o576, HLRES = 0o577,

        // Logical tests: {right,left,direct,swapped} masks,
        // {no-op,zeros,complement,ones} modification, skip conditions
        TRN = 0o600, TLN = 0o601, TRNE = 0o602, TLNE = 0o603,
        TRNA = 0o604, TLNA = 0o605, TRNN = 0o606, TLNN = 0o607,
        TDN = 0o610, TSN = 0o611, TDNE = 0o612, TSNE = 0o613,
        TDNA = 0o614, TSNA = 0o615, TDNN = 0o616, TSNN = 0o617,
        TRZ = 0o620, TLZ = 0o621, TRZE = 0o622, TLZE = 0o623,
        TRZA = 0o624, TLZA = 0o625, TRZN = 0o626, TLZN = 0o627,
        TDZ = 0o630, TSZ = 0o631, TDZE = 0o632, TSZE = 0o633,
        TDZA = 0o634, TSZA = 0o635, TDZN = 0o636, TSZN = 0o637,
        TRC = 0o640, TLC = 0o641, TRCE = 0o642, TLCE = 0o643,
        TRCA = 0o644, TLCA = 0o645, TRCN = 0o646, TLCN = 0o647,
        TDC = 0o650, TSC = 0o651, TDCE = 0o652, TSCE = 0o653,
        TDCA = 0o654, TSCA = 0o655, TDCN = 0o656, TSCN = 0o657,
        TRO = 0o660, TLO = 0o661, TROE = 0o662, TLOE = 0o663,
        TROA = 0o664, TLOA = 0o665, TRON = 0o666, TLON = 0o667,
        TDO = 0o670, TSO = 0o671, TDOE = 0o672, TSOE = 0o673,
        TDOA = 0o674, TSOA = 0o675, TDON = 0o676, TSON = 0o677,
    }
    aliases {
        "OR" => IOR, "ORI" => IORI, "ORM" => IORM, "ORB" => IORB,
    }
}

mnemonics! {
    /// In-out instruction function codes (bits 10-12 of an I/O word).
    IoFunct {
        BLKI = 0, DATAI = 1, BLKO = 2, DATAO = 3,
        CONO = 4, CONI = 5, CONSZ = 6, CONSO = 7,
    }
    aliases {}
}

/// Mnemonics MACRO-10 predefines as an opcode with a preset A field,
/// returned as `(opcode, ac)`.
pub fn compound_mnemonic(mnemonic: &str) -> Option<(Opcode, u64)> {
    let compound = match mnemonic {
        "NOP" => (Opcode::JFCL, 0),
        "HALT" => (Opcode::JRST, 0o4),
        "JRSTF" => (Opcode::JRST, 0o2),
        "PORTAL" => (Opcode::JRST, 0o1),
        "JEN" => (Opcode::JRST, 0o12),
        "JOV" => (Opcode::JFCL, 0o10),
        "JCRY0" => (Opcode::JFCL, 0o4),
        "JCRY1" => (Opcode::JFCL, 0o2),
        "JCRY" => (Opcode::JFCL, 0o6),
        "JFOV" => (Opcode::JFCL, 0o1),
        _ => return None,
    };
    Some(compound)
}
