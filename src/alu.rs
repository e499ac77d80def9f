//! The Hack arithmetic/logic unit.
//!
//! Every computation the ISA names is a special case of the same six control bits:
//! optionally zero and then negate each operand, AND or ADD them, optionally negate the
//! result. There is no separate path per operation.

/// The six ALU control inputs, in instruction order `zx nx zy ny f no`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct AluControl {
    /// Zero the x input.
    pub zx: bool,
    /// Negate (bitwise) the x input, after `zx`.
    pub nx: bool,
    /// Zero the y input.
    pub zy: bool,
    /// Negate (bitwise) the y input, after `zy`.
    pub ny: bool,
    /// `true` selects `x + y`, `false` selects `x & y`.
    pub f: bool,
    /// Negate (bitwise) the output.
    pub no: bool,
}

/// Output of a single ALU evaluation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AluOutput {
    pub out: u16,
    /// Output is zero.
    pub zr: bool,
    /// Output is negative (bit 15 set).
    pub ng: bool,
}

impl AluControl {
    /// Takes the low six bits, `zx` being bit 5 and `no` bit 0.
    pub fn from_bits(bits: u8) -> Self {
        AluControl {
            zx: bits & 0b100000 != 0,
            nx: bits & 0b010000 != 0,
            zy: bits & 0b001000 != 0,
            ny: bits & 0b000100 != 0,
            f: bits & 0b000010 != 0,
            no: bits & 0b000001 != 0,
        }
    }

    pub fn bits(self) -> u8 {
        (self.zx as u8) << 5
            | (self.nx as u8) << 4
            | (self.zy as u8) << 3
            | (self.ny as u8) << 2
            | (self.f as u8) << 1
            | self.no as u8
    }
}

fn condition(value: u16, zero: bool, negate: bool) -> u16 {
    let value = if zero { 0 } else { value };
    if negate {
        !value
    } else {
        value
    }
}

/// Pure combinational evaluation. Never panics: addition wraps.
pub fn alu(x: u16, y: u16, control: AluControl) -> AluOutput {
    let x = condition(x, control.zx, control.nx);
    let y = condition(y, control.zy, control.ny);
    let combined = if control.f { x.wrapping_add(y) } else { x & y };
    let out = if control.no { !combined } else { combined };
    AluOutput {
        out,
        zr: out == 0,
        ng: out & 0x8000 != 0,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLES: [u16; 9] = [0, 1, 2, 17, 0xFFFF, 0xFFFE, 0x7FFF, 0x8000, 0x1234];

    fn reference(name: &str, x: u16, y: u16) -> u16 {
        match name {
            "0" => 0,
            "1" => 1,
            "-1" => 0xFFFF,
            "x" => x,
            "y" => y,
            "!x" => !x,
            "!y" => !y,
            "-x" => x.wrapping_neg(),
            "-y" => y.wrapping_neg(),
            "x+1" => x.wrapping_add(1),
            "y+1" => y.wrapping_add(1),
            "x-1" => x.wrapping_sub(1),
            "y-1" => y.wrapping_sub(1),
            "x+y" => x.wrapping_add(y),
            "x-y" => x.wrapping_sub(y),
            "y-x" => y.wrapping_sub(x),
            "x&y" => x & y,
            "x|y" => x | y,
            _ => unreachable!(),
        }
    }

    #[test]
    fn truth_table() {
        #[rustfmt::skip]
        let table: [(&str, u8); 18] = [
            ("0",   0b101010),
            ("1",   0b111111),
            ("-1",  0b111010),
            ("x",   0b001100),
            ("y",   0b110000),
            ("!x",  0b001101),
            ("!y",  0b110001),
            ("-x",  0b001111),
            ("-y",  0b110011),
            ("x+1", 0b011111),
            ("y+1", 0b110111),
            ("x-1", 0b001110),
            ("y-1", 0b110010),
            ("x+y", 0b000010),
            ("x-y", 0b010011),
            ("y-x", 0b000111),
            ("x&y", 0b000000),
            ("x|y", 0b010101),
        ];

        for (name, bits) in table {
            let control = AluControl::from_bits(bits);
            for x in SAMPLES {
                for y in SAMPLES {
                    let expected = reference(name, x, y);
                    let actual = alu(x, y, control);
                    assert_eq!(actual.out, expected, "{name} with x={x:#06x} y={y:#06x}");
                    assert_eq!(actual.zr, expected == 0, "zr of {name}");
                    assert_eq!(actual.ng, (expected as i16) < 0, "ng of {name}");
                }
            }
        }
    }

    #[test]
    fn flags_follow_output_only() {
        let add = AluControl::from_bits(0b000010);
        // 0x7FFF + 1 overflows into the sign bit without trapping
        let res = alu(0x7FFF, 1, add);
        assert_eq!(res, AluOutput { out: 0x8000, zr: false, ng: true });
        let res = alu(0xFFFF, 1, add);
        assert_eq!(res, AluOutput { out: 0, zr: true, ng: false });
    }

    #[test]
    fn every_control_combination_is_defined() {
        for bits in 0..64u8 {
            let control = AluControl::from_bits(bits);
            assert_eq!(control.bits(), bits);
            for x in SAMPLES {
                let res = alu(x, 0x8000, control);
                assert_eq!(res.zr, res.out == 0);
            }
        }
    }
}
