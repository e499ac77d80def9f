//! Data memory and its memory-mapped I/O.
//!
//! The 15-bit address space is split into disjoint regions:
//!
//! | Addresses       | Region   |
//! |-----------------|----------|
//! | `0..=16383`     | RAM      |
//! | `16384..=24575` | Screen   |
//! | `24576`         | Keyboard |
//! | `24577..=32767` | void     |
//!
//! Each access touches exactly one backing store. The void reads as zero and swallows writes.

use std::fmt;

pub const RAM_SIZE: usize = 0x4000;
pub const SCREEN_BASE: u16 = 0x4000;
pub const SCREEN_SIZE: usize = 0x2000;
pub const KBD_ADDR: u16 = 0x6000;
/// Addresses are masked to this many bits.
pub const ADDRESS_MASK: u16 = 0x7FFF;

pub const SCREEN_WIDTH: usize = 512;
pub const SCREEN_HEIGHT: usize = 256;
const WORDS_PER_ROW: usize = SCREEN_WIDTH / 16;

/// Which backing store an address routes to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Region {
    /// Offset into RAM.
    Ram(u16),
    /// Offset into the screen buffer.
    Screen(u16),
    Keyboard,
    Void,
}

impl Region {
    /// Route a 15-bit address. Bit 15 of `address` is ignored.
    pub fn of(address: u16) -> Self {
        let address = address & ADDRESS_MASK;
        if address < SCREEN_BASE {
            Region::Ram(address)
        } else if address < KBD_ADDR {
            Region::Screen(address - SCREEN_BASE)
        } else if address == KBD_ADDR {
            Region::Keyboard
        } else {
            Region::Void
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Ram(offs) => write!(f, "RAM[{offs}]"),
            Region::Screen(offs) => write!(f, "SCREEN[{offs}]"),
            Region::Keyboard => write!(f, "KBD"),
            Region::Void => write!(f, "unmapped"),
        }
    }
}

/// General-purpose RAM, 16K words.
#[derive(Clone)]
pub struct Ram {
    mem: Box<[u16; RAM_SIZE]>,
}

impl Ram {
    pub fn new() -> Self {
        Ram {
            mem: Box::new([0; RAM_SIZE]),
        }
    }

    /// Return the word at `offset`, then store `input` there if `load` is set.
    pub fn tick(&mut self, input: u16, offset: u16, load: bool) -> u16 {
        let cell = &mut self.mem[offset as usize % RAM_SIZE];
        let prev = *cell;
        if load {
            *cell = input;
        }
        prev
    }

    pub fn peek(&self, offset: u16) -> u16 {
        self.mem[offset as usize % RAM_SIZE]
    }

    pub fn words(&self) -> &[u16] {
        &self.mem[..]
    }
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}

/// Bit-packed 512x256 monochrome pixel buffer, row-major, 32 words per row.
///
/// Bit 0 of a word is the leftmost of its 16 pixels.
#[derive(Clone)]
pub struct Screen {
    mem: Box<[u16; SCREEN_SIZE]>,
}

impl Screen {
    pub fn new() -> Self {
        Screen {
            mem: Box::new([0; SCREEN_SIZE]),
        }
    }

    pub fn tick(&mut self, input: u16, offset: u16, load: bool) -> u16 {
        let cell = &mut self.mem[offset as usize % SCREEN_SIZE];
        let prev = *cell;
        if load {
            *cell = input;
        }
        prev
    }

    pub fn peek(&self, offset: u16) -> u16 {
        self.mem[offset as usize % SCREEN_SIZE]
    }

    fn locate(row: usize, col: usize) -> Option<(usize, u16)> {
        if row >= SCREEN_HEIGHT || col >= SCREEN_WIDTH {
            return None;
        }
        Some((row * WORDS_PER_ROW + col / 16, 1 << (col % 16)))
    }

    /// `false` outside the screen.
    pub fn pixel(&self, row: usize, col: usize) -> bool {
        Self::locate(row, col).is_some_and(|(idx, mask)| self.mem[idx] & mask != 0)
    }

    /// Ignored outside the screen.
    pub fn set_pixel(&mut self, row: usize, col: usize, on: bool) {
        if let Some((idx, mask)) = Self::locate(row, col) {
            if on {
                self.mem[idx] |= mask;
            } else {
                self.mem[idx] &= !mask;
            }
        }
    }

    pub fn words(&self) -> &[u16] {
        &self.mem[..]
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

/// The keyboard register: the code of the currently pressed key, 0 for none.
///
/// Read-only from the CPU's side; only [`Keyboard::set_key`] changes it.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Keyboard {
    key: u16,
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard { key: 0 }
    }

    /// Writes are accepted and discarded.
    pub fn tick(&mut self, _input: u16, _load: bool) -> u16 {
        self.key
    }

    pub fn peek(&self) -> u16 {
        self.key
    }

    pub fn set_key(&mut self, key: u16) {
        self.key = key;
    }
}

/// The complete data memory seen by the CPU.
#[derive(Clone, Default)]
pub struct Memory {
    ram: Ram,
    screen: Screen,
    keyboard: Keyboard,
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            ram: Ram::new(),
            screen: Screen::new(),
            keyboard: Keyboard::new(),
        }
    }

    /// Return the word at `address`, then write `input` there if `load` is set and the
    /// region is writable.
    pub fn tick(&mut self, input: u16, address: u16, load: bool) -> u16 {
        match Region::of(address) {
            Region::Ram(offs) => self.ram.tick(input, offs, load),
            Region::Screen(offs) => self.screen.tick(input, offs, load),
            Region::Keyboard => self.keyboard.tick(input, load),
            Region::Void => 0,
        }
    }

    pub fn peek(&self, address: u16) -> u16 {
        match Region::of(address) {
            Region::Ram(offs) => self.ram.peek(offs),
            Region::Screen(offs) => self.screen.peek(offs),
            Region::Keyboard => self.keyboard.peek(),
            Region::Void => 0,
        }
    }

    /// Write outside of the clock, e.g. to preset inputs before a run.
    ///
    /// Follows the same routing as [`Memory::tick`], so the keyboard and void stay untouched.
    pub fn poke(&mut self, address: u16, value: u16) {
        self.tick(value, address, true);
    }

    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    pub fn keyboard_mut(&mut self) -> &mut Keyboard {
        &mut self.keyboard
    }
}
