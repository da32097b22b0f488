use crate::constants::*;
use crate::enums::{IoFunct, Opcode};
use crate::Word;

/// Base word for a basic instruction: the opcode in bits 0-8, all other
/// fields clear.
pub fn opcode_word(opcode: Opcode) -> Word {
    (opcode as Word) << OPCODE_OFFSET
}

/// Base word for an in-out instruction: bits 0-2 set, the function code in
/// bits 10-12, device and address fields clear.
pub fn io_funct_word(funct: IoFunct) -> Word {
    IO_BITS | ((funct as Word) << IO_FUNCT_OFFSET)
}

pub fn make_instruction(opcode: Opcode, ac: Word, ind: bool, xr: Word, addr: Word) -> Word {
    opcode_word(opcode)
        | ((ac << AC_OFFSET) & AC_MASK)
        | if ind { IND_MASK } else { 0 }
        | ((xr << XR_OFFSET) & XR_MASK)
        | (addr & ADDR_MASK)
}

/// Device codes are conventionally written as multiples of four (APR = 000,
/// PI = 004, ...); bits 3-9 hold the code with the two low zero bits dropped.
pub fn make_io_instruction(funct: IoFunct, device: Word, ind: bool, xr: Word, addr: Word) -> Word {
    io_funct_word(funct)
        | (((device >> 2) << IO_DEV_OFFSET) & IO_DEV_MASK)
        | if ind { IND_MASK } else { 0 }
        | ((xr << XR_OFFSET) & XR_MASK)
        | (addr & ADDR_MASK)
}

pub fn opcode_field(word: Word) -> Word {
    (word & OPCODE_MASK) >> OPCODE_OFFSET
}

pub fn ac_field(word: Word) -> Word {
    (word & AC_MASK) >> AC_OFFSET
}

pub fn ind_field(word: Word) -> bool {
    word & IND_MASK != 0
}

pub fn xr_field(word: Word) -> Word {
    (word & XR_MASK) >> XR_OFFSET
}

pub fn addr_field(word: Word) -> Word {
    word & ADDR_MASK
}

/// Left halfword (bits 0-17).
pub fn lh(word: Word) -> Word {
    (word >> HALF_WIDTH) & HALF_MASK
}

/// Right halfword (bits 18-35).
pub fn rh(word: Word) -> Word {
    word & HALF_MASK
}

/// Builds a word from two halfwords, the MACRO-10 `XWD a,,b` layout.
pub fn xwd(left: Word, right: Word) -> Word {
    ((left & HALF_MASK) << HALF_WIDTH) | (right & HALF_MASK)
}
