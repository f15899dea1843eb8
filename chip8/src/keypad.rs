/// A key on the hexadecimal keypad, or `None` for host keys that don't map to one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Key(Option<u8>);

impl Key {
    /// Map a matrix index coming from the input collaborator. Negative or out of range
    /// indices produce a key that is ignored.
    pub fn from_index(value: i32) -> Self {
        match value {
            0..=0xF => Self(Some(value as u8)),
            _ => Self(None),
        }
    }

    /// Map a physical scancode using the conventional layout where the left
    /// 4x4 block of a QWERTY keyboard stands in for the keypad
    pub fn from_scancode(value: u32) -> Self {
        match value {
            2 => Self(Some(0x1)),  // 1 -> 1
            3 => Self(Some(0x2)),  // 2 -> 2
            4 => Self(Some(0x3)),  // 3 -> 3
            5 => Self(Some(0xC)),  // 4 -> C
            16 => Self(Some(0x4)), // Q -> 4
            17 => Self(Some(0x5)), // W -> 5
            18 => Self(Some(0x6)), // E -> 6
            19 => Self(Some(0xD)), // R -> D
            30 => Self(Some(0x7)), // A -> 7
            31 => Self(Some(0x8)), // S -> 8
            32 => Self(Some(0x9)), // D -> 9
            33 => Self(Some(0xE)), // F -> E
            44 => Self(Some(0xA)), // Z -> A
            45 => Self(Some(0x0)), // X -> 0
            46 => Self(Some(0xB)), // C -> B
            47 => Self(Some(0xF)), // V -> F
            _ => Self(None),
        }
    }

    #[cfg(test)]
    pub fn index(&self) -> Option<u8> {
        self.0
    }
}

pub struct Keypad {
    pub(crate) keys: [bool; 0x10],
}

impl Keypad {
    pub fn new() -> Self {
        Self { keys: [false; 0x10] }
    }

    pub fn reset(&mut self) {
        self.keys.fill(false);
    }

    pub fn keydown(&mut self, key: Key) {
        if let Some(key) = key.0 {
            self.keys[key as usize] = true;
        }
    }

    pub fn keyup(&mut self, key: Key) {
        if let Some(key) = key.0 {
            self.keys[key as usize] = false;
        }
    }

    /// Only the low nibble of `key` selects a key, matching how a register value is used
    pub fn is_key_down(&self, key: u8) -> bool {
        self.keys[(key & 0xF) as usize]
    }

    /// Lowest-indexed key that is currently held
    pub fn first_down(&self) -> Option<u8> {
        self.keys.iter().position(|&down| down).map(|key| key as u8)
    }
}
