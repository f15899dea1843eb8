use std::fmt::Display;

use crate::error::Chip8Error;
use crate::registers::Register;

/// The raw fields of an instruction word
#[derive(Clone, Copy, Debug)]
pub struct Opcode {
    pub raw: u16,
    pub c: u8,
    pub x: Register,
    pub y: Register,
    pub n: u8,
    pub nn: u8,
    pub nnn: u16,
}

impl From<u16> for Opcode {
    fn from(raw: u16) -> Self {
        Self {
            raw,
            c: ((raw & 0xF000) >> 12) as u8,
            x: Register::from_nibble(raw >> 8),
            y: Register::from_nibble(raw >> 4),
            n: (raw & 0x000F) as u8,
            nn: (raw & 0x00FF) as u8,
            nnn: raw & 0x0FFF,
        }
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x}", self.raw)
    }
}

/// One of the 35 classic instructions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 1NNN
    Jump(u16),
    /// 2NNN
    Call(u16),
    /// 3XNN
    SkipEq(Register, u8),
    /// 4XNN
    SkipNe(Register, u8),
    /// 5XY0
    SkipRegEq(Register, Register),
    /// 6XNN
    Set(Register, u8),
    /// 7XNN
    Add(Register, u8),
    /// 8XY0
    RegSet(Register, Register),
    /// 8XY1
    RegOr(Register, Register),
    /// 8XY2
    RegAnd(Register, Register),
    /// 8XY3
    RegXor(Register, Register),
    /// 8XY4
    RegAdd(Register, Register),
    /// 8XY5
    RegSubRight(Register, Register),
    /// 8XY6
    RegShiftRight(Register, Register),
    /// 8XY7
    RegSubLeft(Register, Register),
    /// 8XYE
    RegShiftLeft(Register, Register),
    /// 9XY0
    SkipRegNe(Register, Register),
    /// ANNN
    SetIndex(u16),
    /// BNNN
    JumpWithOffset(u16),
    /// CXNN
    Random(Register, u8),
    /// DXYN
    Draw(Register, Register, u8),
    /// EX9E
    SkipIfKeyDown(Register),
    /// EXA1
    SkipIfKeyUp(Register),
    /// FX07
    DelayGet(Register),
    /// FX0A
    WaitKey(Register),
    /// FX15
    DelaySet(Register),
    /// FX18
    SoundSet(Register),
    /// FX1E
    AddToIndex(Register),
    /// FX29
    FontCharacter(Register),
    /// FX33
    Bcd(Register),
    /// FX55
    MemoryStore(Register),
    /// FX65
    MemoryLoad(Register),
}

impl Instruction {
    /// Decode an instruction word. `addr` is only used to report where an invalid word was found.
    pub fn decode(raw: u16, addr: u16) -> Result<Self, Chip8Error> {
        use Instruction::*;

        let op = Opcode::from(raw);
        let instruction = match op.c {
            0x0 => match op.nnn {
                0x0E0 => Cls,
                0x0EE => Ret,
                _ => return Err(invalid(op, addr)),
            },
            0x1 => Jump(op.nnn),
            0x2 => Call(op.nnn),
            0x3 => SkipEq(op.x, op.nn),
            0x4 => SkipNe(op.x, op.nn),
            0x5 if op.n == 0 => SkipRegEq(op.x, op.y),
            0x6 => Set(op.x, op.nn),
            0x7 => Add(op.x, op.nn),
            0x8 => match op.n {
                0x0 => RegSet(op.x, op.y),
                0x1 => RegOr(op.x, op.y),
                0x2 => RegAnd(op.x, op.y),
                0x3 => RegXor(op.x, op.y),
                0x4 => RegAdd(op.x, op.y),
                0x5 => RegSubRight(op.x, op.y),
                0x6 => RegShiftRight(op.x, op.y),
                0x7 => RegSubLeft(op.x, op.y),
                0xE => RegShiftLeft(op.x, op.y),
                _ => return Err(invalid(op, addr)),
            },
            0x9 if op.n == 0 => SkipRegNe(op.x, op.y),
            0xA => SetIndex(op.nnn),
            0xB => JumpWithOffset(op.nnn),
            0xC => Random(op.x, op.nn),
            0xD => Draw(op.x, op.y, op.n),
            0xE => match op.nn {
                0x9E => SkipIfKeyDown(op.x),
                0xA1 => SkipIfKeyUp(op.x),
                _ => return Err(invalid(op, addr)),
            },
            0xF => match op.nn {
                0x07 => DelayGet(op.x),
                0x0A => WaitKey(op.x),
                0x15 => DelaySet(op.x),
                0x18 => SoundSet(op.x),
                0x1E => AddToIndex(op.x),
                0x29 => FontCharacter(op.x),
                0x33 => Bcd(op.x),
                0x55 => MemoryStore(op.x),
                0x65 => MemoryLoad(op.x),
                _ => return Err(invalid(op, addr)),
            },
            _ => return Err(invalid(op, addr)),
        };
        Ok(instruction)
    }
}

fn invalid(op: Opcode, addr: u16) -> Chip8Error {
    Chip8Error::InvalidInstruction {
        opcode: op.raw,
        addr,
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Instruction::*;

        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jump(nnn) => write!(f, "JP {:#05x}", nnn),
            Call(nnn) => write!(f, "CALL {:#05x}", nnn),
            SkipEq(x, nn) => write!(f, "SE {}, {:#04x}", x, nn),
            SkipNe(x, nn) => write!(f, "SNE {}, {:#04x}", x, nn),
            SkipRegEq(x, y) => write!(f, "SE {}, {}", x, y),
            Set(x, nn) => write!(f, "LD {}, {:#04x}", x, nn),
            Add(x, nn) => write!(f, "ADD {}, {:#04x}", x, nn),
            RegSet(x, y) => write!(f, "LD {}, {}", x, y),
            RegOr(x, y) => write!(f, "OR {}, {}", x, y),
            RegAnd(x, y) => write!(f, "AND {}, {}", x, y),
            RegXor(x, y) => write!(f, "XOR {}, {}", x, y),
            RegAdd(x, y) => write!(f, "ADD {}, {}", x, y),
            RegSubRight(x, y) => write!(f, "SUB {}, {}", x, y),
            RegShiftRight(x, y) => write!(f, "SHR {}, {}", x, y),
            RegSubLeft(x, y) => write!(f, "SUBN {}, {}", x, y),
            RegShiftLeft(x, y) => write!(f, "SHL {}, {}", x, y),
            SkipRegNe(x, y) => write!(f, "SNE {}, {}", x, y),
            SetIndex(nnn) => write!(f, "LD I, {:#05x}", nnn),
            JumpWithOffset(nnn) => write!(f, "JP V0, {:#05x}", nnn),
            Random(x, nn) => write!(f, "RND {}, {:#04x}", x, nn),
            Draw(x, y, n) => write!(f, "DRW {}, {}, {}", x, y, n),
            SkipIfKeyDown(x) => write!(f, "SKP {}", x),
            SkipIfKeyUp(x) => write!(f, "SKNP {}", x),
            DelayGet(x) => write!(f, "LD {}, DT", x),
            WaitKey(x) => write!(f, "LD {}, K", x),
            DelaySet(x) => write!(f, "LD DT, {}", x),
            SoundSet(x) => write!(f, "LD ST, {}", x),
            AddToIndex(x) => write!(f, "ADD I, {}", x),
            FontCharacter(x) => write!(f, "LD F, {}", x),
            Bcd(x) => write!(f, "LD B, {}", x),
            MemoryStore(x) => write!(f, "LD [I], {}", x),
            MemoryLoad(x) => write!(f, "LD {}, [I]", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Instruction, Opcode};
    use crate::error::Chip8Error;
    use crate::registers::Register;

    fn v(n: u16) -> Register {
        Register::from_nibble(n)
    }

    #[test]
    fn test_opcode_fields() {
        let op = Opcode::from(0xD12A);
        assert_eq!(op.c, 0xD);
        assert_eq!(op.x, v(1));
        assert_eq!(op.y, v(2));
        assert_eq!(op.n, 0xA);
        assert_eq!(op.nn, 0x2A);
        assert_eq!(op.nnn, 0x12A);
        assert_eq!(op.to_string(), "0xd12a");
    }

    #[test]
    fn test_decode() {
        assert_eq!(Instruction::decode(0x00E0, 0), Ok(Instruction::Cls));
        assert_eq!(Instruction::decode(0x00EE, 0), Ok(Instruction::Ret));
        assert_eq!(Instruction::decode(0x1ABC, 0), Ok(Instruction::Jump(0xABC)));
        assert_eq!(
            Instruction::decode(0x8AB4, 0),
            Ok(Instruction::RegAdd(v(0xA), v(0xB)))
        );
        assert_eq!(
            Instruction::decode(0xD015, 0),
            Ok(Instruction::Draw(v(0), v(1), 5))
        );
        assert_eq!(
            Instruction::decode(0xF265, 0),
            Ok(Instruction::MemoryLoad(v(2)))
        );
    }

    #[test]
    fn test_decode_invalid() {
        for raw in [0x0000, 0x0123, 0x5121, 0x8128, 0x912F, 0xE19F, 0xF1FF] {
            assert_eq!(
                Instruction::decode(raw, 0x2F0),
                Err(Chip8Error::InvalidInstruction {
                    opcode: raw,
                    addr: 0x2F0
                })
            );
        }
    }

    #[test]
    fn test_disassembly() {
        let text = |raw| Instruction::decode(raw, 0).unwrap().to_string();
        assert_eq!(text(0x00E0), "CLS");
        assert_eq!(text(0x2300), "CALL 0x300");
        assert_eq!(text(0x6A2A), "LD VA, 0x2a");
        assert_eq!(text(0x8126), "SHR V1, V2");
        assert_eq!(text(0xD015), "DRW V0, V1, 5");
        assert_eq!(text(0xF30A), "LD V3, K");
    }
}
