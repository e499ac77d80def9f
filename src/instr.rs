use std::fmt;

use crate::alu::AluControl;

/// Largest value an A-instruction can carry.
pub const MAX_CONSTANT: u16 = 0x7FFF;

/// Bits 15-13 of every C-instruction.
const C_PREFIX: u16 = 0b111 << 13;

/// A single decoded Hack instruction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Instruction {
    /// `0vvvvvvvvvvvvvvv`
    A(AInstruction),
    /// `111acccccc ddd jjj`
    C(CInstruction),
}

/// Loads a 15-bit constant or address into the A register.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct AInstruction(u16);

/// Computes with the ALU, optionally storing the result and/or jumping.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CInstruction {
    pub comp: Comp,
    pub dest: Dest,
    pub jump: Jump,
}

/// 7-bit computation selector: the `a` bit followed by `zx nx zy ny f no`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Comp(u8);

/// Destination bits `d1 d2 d3`, for A, D and M respectively.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct Dest(u8);

/// Jump bits `j1 j2 j3`: jump on negative, zero, positive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
#[repr(u8)]
pub enum Jump {
    #[default]
    Never = 0b000,
    Jgt = 0b001,
    Jeq = 0b010,
    Jge = 0b011,
    Jlt = 0b100,
    Jne = 0b101,
    Jle = 0b110,
    Jmp = 0b111,
}

/// Failure to interpret a 16-bit word as an instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DecodeError {
    /// Bit 15 is clear. Only produced by [`CInstruction::decode`], [`Instruction::decode`]
    /// falls back to an A-instruction instead.
    NotCInstruction { word: u16 },
    /// Bit 15 is set, but bits 14-13 are not both set.
    MalformedC { word: u16 },
}

impl std::error::Error for DecodeError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCInstruction { word } => {
                write!(f, "word {word:#06x} is not a C-instruction (bit 15 is clear)")
            }
            Self::MalformedC { word } => write!(
                f,
                "word {word:#06x} has bit 15 set but bits 14-13 are {:02b}, expected 11",
                (word >> 13) & 0b11
            ),
        }
    }
}

impl Instruction {
    /// Decode a binary word. Total for bit 15 clear; for bit 15 set, bits 14-13 must be `11`.
    pub fn decode(word: u16) -> Result<Self, DecodeError> {
        match CInstruction::decode(word) {
            Ok(c) => Ok(Instruction::C(c)),
            Err(DecodeError::NotCInstruction { .. }) => Ok(Instruction::A(AInstruction(word))),
            Err(e) => Err(e),
        }
    }

    pub fn encode(self) -> u16 {
        match self {
            Instruction::A(a) => a.encode(),
            Instruction::C(c) => c.encode(),
        }
    }

    pub fn is_a(&self) -> bool {
        matches!(self, Instruction::A(_))
    }
}

impl TryFrom<u16> for Instruction {
    type Error = DecodeError;

    fn try_from(word: u16) -> Result<Self, Self::Error> {
        Instruction::decode(word)
    }
}

impl From<Instruction> for u16 {
    fn from(instr: Instruction) -> u16 {
        instr.encode()
    }
}

impl AInstruction {
    /// `None` if `value` does not fit in 15 bits.
    pub fn new(value: u16) -> Option<Self> {
        (value <= MAX_CONSTANT).then_some(AInstruction(value))
    }

    pub fn value(self) -> u16 {
        self.0
    }

    pub fn encode(self) -> u16 {
        self.0
    }
}

impl CInstruction {
    pub fn new(comp: Comp, dest: Dest, jump: Jump) -> Self {
        CInstruction { comp, dest, jump }
    }

    pub fn decode(word: u16) -> Result<Self, DecodeError> {
        if word & 0x8000 == 0 {
            return Err(DecodeError::NotCInstruction { word });
        }
        if word & C_PREFIX != C_PREFIX {
            return Err(DecodeError::MalformedC { word });
        }
        Ok(CInstruction {
            comp: Comp::from_bits((word >> 6) as u8),
            dest: Dest::from_bits((word >> 3) as u8),
            jump: Jump::from_bits(word as u8),
        })
    }

    pub fn encode(self) -> u16 {
        C_PREFIX
            | (self.comp.bits() as u16) << 6
            | (self.dest.bits() as u16) << 3
            | self.jump as u16
    }
}

/// Canonical computation mnemonics and their selectors.
#[rustfmt::skip]
const COMP_TABLE: [(&str, u8); 28] = [
    ("0",   0b0_101010),
    ("1",   0b0_111111),
    ("-1",  0b0_111010),
    ("D",   0b0_001100),
    ("A",   0b0_110000),
    ("!D",  0b0_001101),
    ("!A",  0b0_110001),
    ("-D",  0b0_001111),
    ("-A",  0b0_110011),
    ("D+1", 0b0_011111),
    ("A+1", 0b0_110111),
    ("D-1", 0b0_001110),
    ("A-1", 0b0_110010),
    ("D+A", 0b0_000010),
    ("D-A", 0b0_010011),
    ("A-D", 0b0_000111),
    ("D&A", 0b0_000000),
    ("D|A", 0b0_010101),
    ("M",   0b1_110000),
    ("!M",  0b1_110001),
    ("-M",  0b1_110011),
    ("M+1", 0b1_110111),
    ("M-1", 0b1_110010),
    ("D+M", 0b1_000010),
    ("D-M", 0b1_010011),
    ("M-D", 0b1_000111),
    ("D&M", 0b1_000000),
    ("D|M", 0b1_010101),
];

/// Operand-swapped spellings of the commutative computations.
const COMP_ALIASES: [(&str, &str); 6] = [
    ("A+D", "D+A"),
    ("M+D", "D+M"),
    ("A&D", "D&A"),
    ("M&D", "D&M"),
    ("A|D", "D|A"),
    ("M|D", "D|M"),
];

impl Comp {
    pub const ZERO: Comp = Comp(0b0_101010);
    pub const D: Comp = Comp(0b0_001100);

    /// Keeps the low 7 bits.
    pub fn from_bits(bits: u8) -> Self {
        Comp(bits & 0x7F)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether the second ALU operand is M rather than A.
    pub fn uses_m(self) -> bool {
        self.0 & 0x40 != 0
    }

    pub fn control(self) -> AluControl {
        AluControl::from_bits(self.0)
    }

    /// Canonical mnemonic, if this selector has one.
    pub fn mnemonic(self) -> Option<&'static str> {
        COMP_TABLE
            .iter()
            .find(|(_, bits)| *bits == self.0)
            .map(|(name, _)| *name)
    }

    /// Accepts canonical mnemonics, swapped commutative forms and the raw `%ccccccc` form.
    pub fn from_mnemonic(s: &str) -> Option<Self> {
        let name = COMP_ALIASES
            .iter()
            .find(|(alias, _)| *alias == s)
            .map_or(s, |(_, canonical)| *canonical);
        if let Some((_, bits)) = COMP_TABLE.iter().find(|(n, _)| *n == name) {
            return Some(Comp(*bits));
        }
        let raw = s.strip_prefix('%')?;
        if raw.len() != 7 || !raw.bytes().all(|b| b == b'0' || b == b'1') {
            return None;
        }
        u8::from_str_radix(raw, 2).ok().map(Comp)
    }
}

impl fmt::Display for Comp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mnemonic() {
            Some(name) => f.write_str(name),
            None => write!(f, "%{:07b}", self.0),
        }
    }
}

const DEST_NAMES: [&str; 8] = ["", "M", "D", "MD", "A", "AM", "AD", "AMD"];

impl Dest {
    pub const NONE: Dest = Dest(0);
    pub const A: Dest = Dest(0b100);
    pub const D: Dest = Dest(0b010);
    pub const M: Dest = Dest(0b001);

    /// Keeps the low 3 bits.
    pub fn from_bits(bits: u8) -> Self {
        Dest(bits & 0b111)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn a(self) -> bool {
        self.0 & Self::A.0 != 0
    }

    pub fn d(self) -> bool {
        self.0 & Self::D.0 != 0
    }

    pub fn m(self) -> bool {
        self.0 & Self::M.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Empty string when no destination is selected.
    pub fn mnemonic(self) -> &'static str {
        DEST_NAMES[self.0 as usize]
    }

    /// Letters `A`, `D`, `M` in any order, each at most once. Empty input is rejected.
    pub fn from_mnemonic(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }
        let mut bits = 0;
        for ch in s.chars() {
            let bit = match ch {
                'A' => Self::A.0,
                'D' => Self::D.0,
                'M' => Self::M.0,
                _ => return None,
            };
            if bits & bit != 0 {
                return None;
            }
            bits |= bit;
        }
        Some(Dest(bits))
    }
}

impl std::ops::BitOr for Dest {
    type Output = Dest;

    fn bitor(self, rhs: Dest) -> Dest {
        Dest(self.0 | rhs.0)
    }
}

impl Jump {
    const ALL: [Jump; 8] = [
        Jump::Never,
        Jump::Jgt,
        Jump::Jeq,
        Jump::Jge,
        Jump::Jlt,
        Jump::Jne,
        Jump::Jle,
        Jump::Jmp,
    ];

    /// Keeps the low 3 bits.
    pub fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & 0b111) as usize]
    }

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// `None` for [`Jump::Never`].
    pub fn mnemonic(self) -> Option<&'static str> {
        match self {
            Jump::Never => None,
            Jump::Jgt => Some("JGT"),
            Jump::Jeq => Some("JEQ"),
            Jump::Jge => Some("JGE"),
            Jump::Jlt => Some("JLT"),
            Jump::Jne => Some("JNE"),
            Jump::Jle => Some("JLE"),
            Jump::Jmp => Some("JMP"),
        }
    }

    pub fn from_mnemonic(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|jump| jump.mnemonic() == Some(s))
    }

    /// Evaluate the jump condition against the ALU flags.
    pub fn taken(self, zr: bool, ng: bool) -> bool {
        let bits = self as u8;
        let (j1, j2, j3) = (bits & 0b100 != 0, bits & 0b010 != 0, bits & 0b001 != 0);
        (j1 && ng) || (j2 && zr) || (j3 && !ng && !zr)
    }
}

impl fmt::Display for AInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl fmt::Display for CInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.dest.is_empty() {
            write!(f, "{}=", self.dest.mnemonic())?;
        }
        write!(f, "{}", self.comp)?;
        if let Some(jump) = self.jump.mnemonic() {
            write!(f, ";{jump}")?;
        }
        Ok(())
    }
}

/// Numeric form; see [`crate::asm::to_assembly`] for symbolic output.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::A(a) => a.fmt(f),
            Instruction::C(c) => c.fmt(f),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decode_a_instruction() {
        assert_eq!(
            Instruction::decode(0x0015),
            Ok(Instruction::A(AInstruction(21)))
        );
        assert_eq!(
            Instruction::decode(0x7FFF),
            Ok(Instruction::A(AInstruction(MAX_CONSTANT)))
        );
    }

    #[test]
    fn decode_c_instruction() {
        // MD=M+1;JGT
        let word = 0b111_1_110111_011_001;
        let instr = Instruction::decode(word).unwrap();
        assert_eq!(
            instr,
            Instruction::C(CInstruction::new(
                Comp::from_mnemonic("M+1").unwrap(),
                Dest::M | Dest::D,
                Jump::Jgt,
            ))
        );
        assert_eq!(instr.to_string(), "MD=M+1;JGT");
    }

    #[test]
    fn decode_malformed_c() {
        for word in [0x8000, 0xA000, 0xC000, 0x9FFF] {
            assert_eq!(
                Instruction::decode(word),
                Err(DecodeError::MalformedC { word })
            );
        }
    }

    #[test]
    fn c_decode_rejects_a_words() {
        assert_eq!(
            CInstruction::decode(0x1234),
            Err(DecodeError::NotCInstruction { word: 0x1234 })
        );
    }

    #[test]
    fn comp_table_is_unambiguous() {
        for (i, (name, bits)) in COMP_TABLE.iter().enumerate() {
            for (other, other_bits) in &COMP_TABLE[i + 1..] {
                assert_ne!(bits, other_bits, "{name} and {other} share a selector");
            }
            assert_eq!(Comp::from_mnemonic(name), Some(Comp(*bits)));
            assert_eq!(Comp(*bits).mnemonic(), Some(*name));
        }
    }

    #[test]
    fn comp_aliases_normalise() {
        assert_eq!(Comp::from_mnemonic("A+D"), Comp::from_mnemonic("D+A"));
        assert_eq!(Comp::from_mnemonic("M|D").unwrap().to_string(), "D|M");
        assert_eq!(Comp::from_mnemonic("1+D"), None);
    }

    #[test]
    fn raw_comp_form() {
        let comp = Comp::from_bits(0b0_000001);
        assert_eq!(comp.mnemonic(), None);
        assert_eq!(comp.to_string(), "%0000001");
        assert_eq!(Comp::from_mnemonic("%0000001"), Some(comp));
        assert_eq!(Comp::from_mnemonic("%000001"), None);
        assert_eq!(Comp::from_mnemonic("%00000012"), None);
    }

    #[test]
    fn dest_any_order() {
        assert_eq!(Dest::from_mnemonic("MD"), Some(Dest(0b011)));
        assert_eq!(Dest::from_mnemonic("DM"), Some(Dest(0b011)));
        assert_eq!(Dest::from_mnemonic("MAD").unwrap().mnemonic(), "AMD");
        assert_eq!(Dest::from_mnemonic("MM"), None);
        assert_eq!(Dest::from_mnemonic("X"), None);
        assert_eq!(Dest::from_mnemonic(""), None);
    }

    #[test]
    fn jump_conditions() {
        #[rustfmt::skip]
        let cases = [
            // (jump, taken when negative, zero, positive)
            (Jump::Never, [false, false, false]),
            (Jump::Jgt,   [false, false, true ]),
            (Jump::Jeq,   [false, true,  false]),
            (Jump::Jge,   [false, true,  true ]),
            (Jump::Jlt,   [true,  false, false]),
            (Jump::Jne,   [true,  false, true ]),
            (Jump::Jle,   [true,  true,  false]),
            (Jump::Jmp,   [true,  true,  true ]),
        ];
        for (jump, [neg, zero, pos]) in cases {
            assert_eq!(jump.taken(false, true), neg, "{jump:?} negative");
            assert_eq!(jump.taken(true, false), zero, "{jump:?} zero");
            assert_eq!(jump.taken(false, false), pos, "{jump:?} positive");
            assert_eq!(Jump::from_bits(jump.bits()), jump);
        }
    }

    proptest! {
        #[test]
        fn decode_then_encode_is_identity(word in any::<u16>()) {
            match Instruction::decode(word) {
                Ok(instr) => prop_assert_eq!(instr.encode(), word),
                Err(DecodeError::MalformedC { .. }) => {
                    prop_assert!(word & 0x8000 != 0 && word & 0x6000 != 0x6000)
                }
                Err(e) => prop_assert!(false, "unexpected {e}"),
            }
        }

        #[test]
        fn bit_15_selects_variant(word in any::<u16>()) {
            if let Ok(instr) = Instruction::decode(word) {
                prop_assert_eq!(instr.is_a(), word & 0x8000 == 0);
            }
        }
    }
}
