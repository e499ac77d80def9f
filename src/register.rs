//! Clocked storage cells.
//!
//! Every `tick` returns the value the cell held during the cycle that is ending, and only
//! then latches the next value. Reading the new value requires [`Register::peek`] after the
//! tick, so a caller can never observe a value written in the same cycle.

/// A single 16-bit register, zero on creation.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Register {
    value: u16,
}

impl Register {
    pub fn new() -> Self {
        Register { value: 0 }
    }

    /// Return the current value, then replace it with `input` if `load` is set.
    pub fn tick(&mut self, input: u16, load: bool) -> u16 {
        let prev = self.value;
        if load {
            self.value = input;
        }
        prev
    }

    pub fn peek(&self) -> u16 {
        self.value
    }
}

/// The program counter. Priority of the next value is reset, then load, then inc, then hold.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct ProgramCounter {
    value: u16,
}

impl ProgramCounter {
    pub fn new() -> Self {
        ProgramCounter { value: 0 }
    }

    /// Return the current value, then latch the next one.
    pub fn tick(&mut self, input: u16, load: bool, inc: bool, reset: bool) -> u16 {
        let prev = self.value;
        self.value = if reset {
            0
        } else if load {
            input
        } else if inc {
            prev.wrapping_add(1)
        } else {
            prev
        };
        prev
    }

    pub fn peek(&self) -> u16 {
        self.value
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn register_returns_previous_value() {
        let mut reg = Register::new();
        assert_eq!(reg.tick(42, true), 0);
        assert_eq!(reg.peek(), 42);
        assert_eq!(reg.tick(7, false), 42);
        assert_eq!(reg.peek(), 42);
        assert_eq!(reg.tick(7, true), 42);
        assert_eq!(reg.peek(), 7);
    }

    #[test]
    fn reset_dominates() {
        for (load, inc) in [(false, false), (false, true), (true, false), (true, true)] {
            let mut pc = ProgramCounter::new();
            pc.tick(100, true, false, false);
            assert_eq!(pc.tick(555, load, inc, true), 100);
            assert_eq!(pc.peek(), 0, "load={load} inc={inc}");
        }
    }

    #[test]
    fn load_beats_inc() {
        for inc in [false, true] {
            let mut pc = ProgramCounter::new();
            pc.tick(9, true, false, false);
            pc.tick(1234, true, inc, false);
            assert_eq!(pc.peek(), 1234, "inc={inc}");
        }
    }

    #[test]
    fn inc_and_hold() {
        let mut pc = ProgramCounter::new();
        assert_eq!(pc.tick(77, false, true, false), 0);
        assert_eq!(pc.tick(77, false, true, false), 1);
        assert_eq!(pc.tick(77, false, false, false), 2);
        assert_eq!(pc.peek(), 2);
    }

    #[test]
    fn inc_wraps() {
        let mut pc = ProgramCounter::new();
        pc.tick(0xFFFF, true, false, false);
        pc.tick(0, false, true, false);
        assert_eq!(pc.peek(), 0);
    }
}
