use std::fmt::Display;

use crate::error::Chip8Error;
use crate::MEM_SIZE;

/// Mask applied to every computed address, so accesses past 0xFFF wrap back to 0x000
pub const ADDR_MASK: u16 = (MEM_SIZE - 1) as u16;

pub struct Memory {
    data: [u8; MEM_SIZE],
}

impl Memory {
    /// Create an empty instance of the Memory struct
    pub fn new() -> Self {
        Self {
            data: [0; MEM_SIZE],
        }
    }

    /// Zero out every byte
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.data[(addr & ADDR_MASK) as usize]
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        self.data[(addr & ADDR_MASK) as usize] = value;
    }

    /// Read a big-endian word; the second byte wraps around to 0x000 when `addr` is 0xFFF
    pub fn read_word(&self, addr: u16) -> u16 {
        (self.read(addr) as u16) << 8 | self.read(addr.wrapping_add(1)) as u16
    }

    /// Copy `data` into memory starting at `addr`. Unlike single-byte writes this does not wrap,
    /// the whole block has to fit below the end of memory.
    pub fn load(&mut self, addr: usize, data: &[u8]) -> Result<(), Chip8Error> {
        let max = MEM_SIZE.saturating_sub(addr);
        if data.len() > max {
            return Err(Chip8Error::RomTooLarge {
                len: data.len(),
                max,
            });
        }

        self.data[addr..addr + data.len()].copy_from_slice(data);
        Ok(())
    }

    #[cfg(test)]
    pub fn slice(&self, addr: usize, len: usize) -> &[u8] {
        &self.data[addr..addr + len]
    }
}

impl Display for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const BYTES_PER_LINE: usize = 16;
        for (line, chunk) in self.data.chunks(BYTES_PER_LINE).enumerate() {
            write!(f, "{:04X}: ", line * BYTES_PER_LINE)?;
            for byte in chunk {
                write!(f, "{:02X} ", byte)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Memory;
    use crate::error::Chip8Error;

    #[test]
    fn test_read_write_wraps() {
        let mut memory = Memory::new();
        memory.write(0x1005, 0xAB);
        assert_eq!(memory.read(0x005), 0xAB);
        assert_eq!(memory.read(0xF005), 0xAB);
    }

    #[test]
    fn test_read_word() {
        let mut memory = Memory::new();
        memory.write(0x200, 0x12);
        memory.write(0x201, 0x34);
        assert_eq!(memory.read_word(0x200), 0x1234);

        memory.write(0xFFF, 0xAA);
        memory.write(0x000, 0xBB);
        assert_eq!(memory.read_word(0xFFF), 0xAABB);
    }

    #[test]
    fn test_load_bounds() {
        let mut memory = Memory::new();
        assert!(memory.load(0xFFE, &[1, 2]).is_ok());
        assert_eq!(memory.slice(0xFFE, 2), [1, 2]);
        assert_eq!(
            memory.load(0xFFE, &[1, 2, 3]),
            Err(Chip8Error::RomTooLarge { len: 3, max: 2 })
        );
    }
}
