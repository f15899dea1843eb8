mod display;
mod error;
mod keypad;
mod memory;
mod opcode;
mod registers;

use std::fmt::Display as FmtDisplay;
use std::path::Path;

use anyhow::Context;
use log::{debug, error, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub use crate::display::{Display, FrameBuffer, Screen};
pub use crate::error::Chip8Error;
pub use crate::keypad::Key;
pub use crate::opcode::{Instruction, Opcode};
pub use crate::registers::Register;

use crate::keypad::Keypad;
use crate::memory::{Memory, ADDR_MASK};
use crate::registers::Registers;

pub const FONT_CHAR_LENGTH: usize = 5;

pub const FONT_DATA: [u8; FONT_CHAR_LENGTH * 0x10] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Glyph `n` lives at `FONT_ADDR + n * FONT_CHAR_LENGTH`
pub const FONT_ADDR: usize = 0x000;

pub const MEM_SIZE: usize = 0x1000;
pub const ROM_ADDR: usize = 0x200;
pub const MAX_ROM_SIZE: usize = MEM_SIZE - ROM_ADDR;
pub const STACK_SIZE: usize = 0x10;
pub const REGISTER_COUNT: usize = 0x10;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

/// Instructions executed per tick. At 60 ticks a second this is 600 instructions a second.
pub const DEFAULT_OPS_PER_CYCLE: usize = 10;

struct Chip8Config {
    legacy_shift: bool,
    ops_per_cycle: usize,
}

impl Chip8Config {
    pub fn new() -> Self {
        Self {
            legacy_shift: false,
            ops_per_cycle: DEFAULT_OPS_PER_CYCLE,
        }
    }
}

pub struct Chip8<S = Display> {
    config: Chip8Config,
    /// RAM that stores font data and ROMs, and is fully writeable
    memory: Memory,
    /// The output grid, either owned or borrowed from the embedding application
    screen: S,
    /// A hexadecimal keypad containing 16 key states labelled 0 through F
    keypad: Keypad,
    /// A stack for 16-bit return addresses, which is used to call subroutines and return from them
    stack: [u16; STACK_SIZE],
    /// Number of occupied stack slots
    sp: u8,
    /// 16 8-bit general-purpose variable registers numbered 0 through F hexadecimal
    v: Registers,
    /// The program counter points to the current instruction in memory
    pc: u16,
    /// The index register is used to point at locations in memory
    i: u16,
    /// The delay timer is decremented once per tick until it reaches 0
    dt: u8,
    /// The sound timer is decremented once per tick until it reaches 0, and plays a tone as long as it's not 0
    st: u8,
    /// Set while an FX0A instruction is waiting for a key press; holds the destination register
    awaiting_key: Option<Register>,
    rng: StdRng,
}

impl Chip8<Display> {
    pub fn new() -> Self {
        Self::with_screen(Display::new())
    }

    pub fn is_fb_dirty(&self) -> bool {
        self.screen.is_dirty()
    }

    pub fn fb(&mut self) -> FrameBuffer {
        self.screen.fb()
    }
}

impl Default for Chip8<Display> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Screen> Chip8<S> {
    /// Build a machine that draws into `screen`. Pass `&mut grid` to keep ownership of the
    /// grid outside the interpreter.
    pub fn with_screen(screen: S) -> Self {
        let mut chip8 = Chip8 {
            config: Chip8Config::new(),
            memory: Memory::new(),
            screen,
            keypad: Keypad::new(),
            stack: [0; STACK_SIZE],
            sp: 0,
            v: Registers::new(),
            pc: ROM_ADDR as u16,
            i: 0,
            dt: 0,
            st: 0,
            awaiting_key: None,
            rng: StdRng::from_os_rng(),
        };
        chip8.reset();
        chip8
    }

    /* Config builder functions */
    pub fn legacy_shift(mut self, value: bool) -> Self {
        self.config.legacy_shift = value;
        self
    }

    pub fn ops_per_cycle(mut self, value: usize) -> Self {
        self.config.ops_per_cycle = value;
        self
    }

    /// Make CXNN reproducible
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Put the machine back into its power-on state: zeroed memory with the font loaded,
    /// cleared registers, stack, timers, keys and screen
    pub fn reset(&mut self) {
        debug!("reset");
        self.memory.clear();
        for (offset, byte) in FONT_DATA.iter().enumerate() {
            self.memory.write((FONT_ADDR + offset) as u16, *byte);
        }
        self.screen.clear();
        self.keypad.reset();
        self.stack = [0; STACK_SIZE];
        self.sp = 0;
        self.v.clear();
        self.pc = ROM_ADDR as u16;
        self.i = 0;
        self.dt = 0;
        self.st = 0;
        self.awaiting_key = None;
    }

    /// Reset the machine and copy `rom` to the program area
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                len: rom.len(),
                max: MAX_ROM_SIZE,
            });
        }
        self.reset();
        self.memory.load(ROM_ADDR, rom)?;
        debug!("loaded {} byte rom at {:#05x}", rom.len(), ROM_ADDR);
        Ok(())
    }

    pub fn load_rom_from_file(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let buf = std::fs::read(path).with_context(|| format!("read rom file {:?}", path))?;
        self.load_rom(&buf).context("load rom from file")?;
        Ok(())
    }

    pub fn keydown(&mut self, key: Key) {
        self.keypad.keydown(key);
    }

    pub fn keyup(&mut self, key: Key) {
        self.keypad.keyup(key);
    }

    /// Mark key `index` as held. Indices outside 0..=15 are ignored.
    pub fn set_key_down(&mut self, index: i32) {
        self.keydown(Key::from_index(index));
    }

    pub fn set_key_up(&mut self, index: i32) {
        self.keyup(Key::from_index(index));
    }

    pub fn is_sound_playing(&self) -> bool {
        self.st > 0
    }

    pub fn is_awaiting_key(&self) -> bool {
        self.awaiting_key.is_some()
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn sp(&self) -> u8 {
        self.sp
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        self.v.as_array()
    }

    pub fn delay_timer(&self) -> u8 {
        self.dt
    }

    pub fn sound_timer(&self) -> u8 {
        self.st
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut S {
        &mut self.screen
    }

    /// Run one 60 Hz tick: up to `ops_per_cycle` instructions, then both timers count down once.
    /// A pending key wait ends the instruction run early; the timers still advance.
    pub fn tick(&mut self) -> Result<(), Chip8Error> {
        for _ in 0..self.config.ops_per_cycle {
            self.step()?;
            if self.awaiting_key.is_some() {
                break;
            }
        }
        self.dt = self.dt.saturating_sub(1);
        self.st = self.st.saturating_sub(1);
        Ok(())
    }

    /// Execute a single instruction. While a key wait is pending and no key is held this does nothing.
    pub fn step(&mut self) -> Result<(), Chip8Error> {
        if self.awaiting_key.is_some() && self.keypad.first_down().is_none() {
            return Ok(());
        }

        let addr = self.pc;
        let result = Instruction::decode(self.fetch(), addr).and_then(|instruction| {
            trace!("{:#05x}: {}", addr, instruction);
            self.pc = self.pc.wrapping_add(2) & ADDR_MASK;
            self.execute(instruction, addr)
        });

        if let Err(e) = result {
            error!("{}", e);
            self.pc = addr;
            return Err(e);
        }
        Ok(())
    }

    fn fetch(&self) -> u16 {
        self.memory.read_word(self.pc)
    }

    fn skip(&mut self) {
        self.pc = self.pc.wrapping_add(2) & ADDR_MASK;
    }

    fn execute(&mut self, instruction: Instruction, addr: u16) -> Result<(), Chip8Error> {
        use Instruction::*;

        match instruction {
            Cls => self.op_cls(),
            Ret => self.op_sub_return(addr)?,
            Jump(nnn) => self.op_jump(nnn),
            Call(nnn) => self.op_sub_call(nnn, addr)?,
            SkipEq(x, nn) => self.op_skip_eq(x, nn),
            SkipNe(x, nn) => self.op_skip_ne(x, nn),
            SkipRegEq(x, y) => self.op_skip_reg_eq(x, y),
            Set(x, nn) => self.op_set(x, nn),
            Add(x, nn) => self.op_add(x, nn),
            RegSet(x, y) => self.op_reg_set(x, y),
            RegOr(x, y) => self.op_reg_or(x, y),
            RegAnd(x, y) => self.op_reg_and(x, y),
            RegXor(x, y) => self.op_reg_xor(x, y),
            RegAdd(x, y) => self.op_reg_add(x, y),
            RegSubRight(x, y) => self.op_reg_sub_right(x, y),
            RegShiftRight(x, y) => self.op_reg_shift_right(x, y),
            RegSubLeft(x, y) => self.op_reg_sub_left(x, y),
            RegShiftLeft(x, y) => self.op_reg_shift_left(x, y),
            SkipRegNe(x, y) => self.op_skip_reg_ne(x, y),
            SetIndex(nnn) => self.op_set_index(nnn),
            JumpWithOffset(nnn) => self.op_jump_with_offset(nnn),
            Random(x, nn) => self.op_random(x, nn),
            Draw(x, y, n) => self.op_display(x, y, n),
            SkipIfKeyDown(x) => self.op_skip_if_key_down(x),
            SkipIfKeyUp(x) => self.op_skip_if_key_up(x),
            DelayGet(x) => self.op_dt_get(x),
            WaitKey(x) => self.op_get_key(x, addr),
            DelaySet(x) => self.op_dt_set(x),
            SoundSet(x) => self.op_st_set(x),
            AddToIndex(x) => self.op_add_to_index(x),
            FontCharacter(x) => self.op_font_character(x),
            Bcd(x) => self.op_convert_to_decimal(x),
            MemoryStore(x) => self.op_memory_store(x),
            MemoryLoad(x) => self.op_memory_load(x),
        }
        Ok(())
    }

    /* Operations */

    /// 0x00E0
    fn op_cls(&mut self) {
        self.screen.clear();
    }

    /// 0x00EE
    fn op_sub_return(&mut self, addr: u16) -> Result<(), Chip8Error> {
        if self.sp == 0 {
            return Err(Chip8Error::StackUnderflow { addr });
        }
        self.sp -= 1;
        self.pc = self.stack[self.sp as usize];
        Ok(())
    }

    /// 0x1NNN
    fn op_jump(&mut self, nnn: u16) {
        self.pc = nnn;
    }

    /// 0x2NNN
    fn op_sub_call(&mut self, nnn: u16, addr: u16) -> Result<(), Chip8Error> {
        if self.sp as usize >= STACK_SIZE {
            return Err(Chip8Error::StackOverflow { addr });
        }
        self.stack[self.sp as usize] = self.pc;
        self.sp += 1;
        self.pc = nnn;
        Ok(())
    }

    /// 0x3XNN
    fn op_skip_eq(&mut self, x: Register, nn: u8) {
        if self.v[x] == nn {
            self.skip();
        }
    }

    /// 0x4XNN
    fn op_skip_ne(&mut self, x: Register, nn: u8) {
        if self.v[x] != nn {
            self.skip();
        }
    }

    /// 0x5XY0
    fn op_skip_reg_eq(&mut self, x: Register, y: Register) {
        if self.v[x] == self.v[y] {
            self.skip();
        }
    }

    /// 0x6XNN
    fn op_set(&mut self, x: Register, nn: u8) {
        self.v[x] = nn;
    }

    /// 0x7XNN
    fn op_add(&mut self, x: Register, nn: u8) {
        self.v[x] = self.v[x].wrapping_add(nn);
    }

    /// 0x8XY0
    fn op_reg_set(&mut self, x: Register, y: Register) {
        self.v[x] = self.v[y];
    }

    /// 0x8XY1
    fn op_reg_or(&mut self, x: Register, y: Register) {
        self.v[x] |= self.v[y];
    }

    /// 0x8XY2
    fn op_reg_and(&mut self, x: Register, y: Register) {
        self.v[x] &= self.v[y];
    }

    /// 0x8XY3
    fn op_reg_xor(&mut self, x: Register, y: Register) {
        self.v[x] ^= self.v[y];
    }

    /// 0x8XY4
    fn op_reg_add(&mut self, x: Register, y: Register) {
        let (sum, overflow) = self.v[x].overflowing_add(self.v[y]);
        self.v[x] = sum;
        self.v[Register::VF] = overflow as u8;
    }

    /// 0x8XY5
    fn op_reg_sub_right(&mut self, x: Register, y: Register) {
        let not_borrow = self.v[x] > self.v[y];
        self.v[x] = self.v[x].wrapping_sub(self.v[y]);
        self.v[Register::VF] = not_borrow as u8;
    }

    /// 0x8XY6
    fn op_reg_shift_right(&mut self, x: Register, y: Register) {
        if self.config.legacy_shift {
            self.v[x] = self.v[y];
        }
        let flag = self.v[x] & 0x1;
        self.v[x] >>= 1;
        self.v[Register::VF] = flag;
    }

    /// 0x8XY7
    fn op_reg_sub_left(&mut self, x: Register, y: Register) {
        let not_borrow = self.v[y] > self.v[x];
        self.v[x] = self.v[y].wrapping_sub(self.v[x]);
        self.v[Register::VF] = not_borrow as u8;
    }

    /// 0x8XYE
    fn op_reg_shift_left(&mut self, x: Register, y: Register) {
        if self.config.legacy_shift {
            self.v[x] = self.v[y];
        }
        let flag = self.v[x] >> 7 & 0x1;
        self.v[x] <<= 1;
        self.v[Register::VF] = flag;
    }

    /// 0x9XY0
    fn op_skip_reg_ne(&mut self, x: Register, y: Register) {
        if self.v[x] != self.v[y] {
            self.skip();
        }
    }

    /// 0xANNN
    fn op_set_index(&mut self, nnn: u16) {
        self.i = nnn;
    }

    /// 0xBNNN
    fn op_jump_with_offset(&mut self, nnn: u16) {
        self.pc = (nnn + self.v[Register::V0] as u16) & ADDR_MASK;
    }

    /// 0xCXNN
    fn op_random(&mut self, x: Register, nn: u8) {
        self.v[x] = nn & self.rng.random::<u8>();
    }

    /// 0xDXYN
    fn op_display(&mut self, x: Register, y: Register, n: u8) {
        let vx = self.v[x] as usize;
        let vy = self.v[y] as usize;
        self.v[Register::VF] = 0;

        for row in 0..n as usize {
            let byte = self.memory.read(self.i.wrapping_add(row as u16));
            let py = (vy + row) % SCREEN_HEIGHT;
            for col in 0..8 {
                if (byte >> (7 - col)) & 0x1 == 0 {
                    continue;
                }
                let px = (vx + col) % SCREEN_WIDTH;
                if self.screen.toggle(px, py) {
                    self.v[Register::VF] = 1;
                }
            }
        }
    }

    /// 0xEX9E
    fn op_skip_if_key_down(&mut self, x: Register) {
        if self.keypad.is_key_down(self.v[x]) {
            self.skip();
        }
    }

    /// 0xEXA1
    fn op_skip_if_key_up(&mut self, x: Register) {
        if !self.keypad.is_key_down(self.v[x]) {
            self.skip();
        }
    }

    /// 0xFX07
    fn op_dt_get(&mut self, x: Register) {
        self.v[x] = self.dt;
    }

    /// 0xFX0A
    fn op_get_key(&mut self, x: Register, addr: u16) {
        match self.keypad.first_down() {
            Some(key) => {
                self.v[x] = key;
                self.awaiting_key = None;
            }
            None => {
                // stay on this instruction until a key shows up
                self.awaiting_key = Some(x);
                self.pc = addr;
            }
        }
    }

    /// 0xFX15
    fn op_dt_set(&mut self, x: Register) {
        self.dt = self.v[x];
    }

    /// 0xFX18
    fn op_st_set(&mut self, x: Register) {
        self.st = self.v[x];
    }

    /// 0xFX1E
    fn op_add_to_index(&mut self, x: Register) {
        self.i = self.i.wrapping_add(self.v[x] as u16);
    }

    /// 0xFX29
    fn op_font_character(&mut self, x: Register) {
        self.i = (FONT_ADDR + FONT_CHAR_LENGTH * (self.v[x] & 0xF) as usize) as u16;
    }

    /// 0xFX33
    fn op_convert_to_decimal(&mut self, x: Register) {
        let n = self.v[x];
        self.memory.write(self.i, n / 100);
        self.memory.write(self.i.wrapping_add(1), n / 10 % 10);
        self.memory.write(self.i.wrapping_add(2), n % 10);
    }

    /// 0xFX55
    fn op_memory_store(&mut self, x: Register) {
        for (offset, value) in self.v.through(x).iter().enumerate() {
            self.memory.write(self.i.wrapping_add(offset as u16), *value);
        }
    }

    /// 0xFX65
    fn op_memory_load(&mut self, x: Register) {
        let i = self.i;
        for (offset, value) in self.v.through_mut(x).iter_mut().enumerate() {
            *value = self.memory.read(i.wrapping_add(offset as u16));
        }
    }
}

impl<S> FmtDisplay for Chip8<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Registers ===")?;
        writeln!(
            f,
            "PC: {:#05x}  I: {:#05x}  SP: {}  DT: {}  ST: {}",
            self.pc, self.i, self.sp, self.dt, self.st
        )?;
        for (n, value) in self.v.as_array().iter().enumerate() {
            write!(f, "V{:X}: {:02X} ", n, value)?;
        }
        writeln!(f)?;
        write!(f, "=== Memory ===\n{}", self.memory)
    }
}
