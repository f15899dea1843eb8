use std::fmt::Display;
use std::ops::{Index, IndexMut};

use crate::REGISTER_COUNT;

/// Index of a general-purpose register. It can only be built from a 4-bit value,
/// so indexing `Registers` with it never goes out of bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Register(u8);

impl Register {
    /// VF doubles as the carry/borrow/collision flag
    pub const VF: Register = Register(0xF);
    pub const V0: Register = Register(0x0);

    /// Build a register index from the low nibble of `value`
    pub fn from_nibble(value: u16) -> Self {
        Self((value & 0xF) as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "V{:X}", self.0)
    }
}

pub struct Registers([u8; REGISTER_COUNT]);

impl Index<Register> for Registers {
    type Output = u8;

    fn index(&self, register: Register) -> &Self::Output {
        &self.0[register.index()]
    }
}

impl IndexMut<Register> for Registers {
    fn index_mut(&mut self, register: Register) -> &mut Self::Output {
        &mut self.0[register.index()]
    }
}

impl Registers {
    pub fn new() -> Self {
        Self([0; REGISTER_COUNT])
    }

    pub fn clear(&mut self) {
        self.0.fill(0);
    }

    /// V0 through `last`, inclusive
    pub fn through(&self, last: Register) -> &[u8] {
        &self.0[..=last.index()]
    }

    pub fn through_mut(&mut self, last: Register) -> &mut [u8] {
        &mut self.0[..=last.index()]
    }

    pub fn as_array(&self) -> &[u8; REGISTER_COUNT] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Register, Registers};

    #[test]
    fn test_from_nibble_masks() {
        assert_eq!(Register::from_nibble(0x1A), Register::from_nibble(0xA));
        assert_eq!(Register::from_nibble(0xFFFF), Register::VF);
        assert_eq!(Register::from_nibble(0x3).to_string(), "V3");
    }

    #[test]
    fn test_through() {
        let mut registers = Registers::new();
        registers.through_mut(Register::from_nibble(2)).copy_from_slice(&[1, 2, 3]);
        assert_eq!(registers[Register::from_nibble(1)], 2);
        assert_eq!(registers.through(Register::from_nibble(3)), [1, 2, 3, 0]);
        assert_eq!(registers[Register::VF], 0);
    }
}
