/// Fatal machine conditions. None of these are recoverable by the interpreter itself;
/// the embedding application decides whether to halt or reset.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Chip8Error {
    #[error("invalid instruction {opcode:#06x} at {addr:#05x}")]
    InvalidInstruction { opcode: u16, addr: u16 },

    #[error("call stack overflow at {addr:#05x}")]
    StackOverflow { addr: u16 },

    #[error("return with empty call stack at {addr:#05x}")]
    StackUnderflow { addr: u16 },

    #[error("rom is too large ({len} bytes), max size is {max} bytes")]
    RomTooLarge { len: usize, max: usize },
}
