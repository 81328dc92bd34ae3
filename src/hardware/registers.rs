use crate::hardware::memory::PC_START;
use std::fmt::{Debug, Formatter};

/// One 16-bit machine word as held by a register.
///
/// The same bits can be viewed as unsigned binary or as a two's-complement
/// decimal, whichever the caller is reasoning in.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Register(u16);

/// Wraps raw bits unchanged.
pub const fn from_binary(bits: u16) -> Register {
    Register(bits)
}
/// Wraps a signed value as its two's-complement bit pattern.
pub const fn from_decimal(value: i16) -> Register {
    Register(value.cast_unsigned())
}

impl Register {
    pub const fn as_binary(self) -> u16 {
        self.0
    }
    pub const fn as_decimal(self) -> i16 {
        self.0.cast_signed()
    }
}
impl Debug for Register {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:#06X} {:#018b} {})",
            self.0,
            self.0,
            self.as_decimal()
        )
    }
}
impl PartialEq<u16> for Register {
    fn eq(&self, other: &u16) -> bool {
        self.0.eq(other)
    }
}
impl From<u16> for Register {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

/// The register file: R0..R7, the program counter and the condition code.
pub struct Registers {
    general_purpose: [Register; 8],
    pc: Register,
    cond: ConditionFlag,
}
impl Registers {
    /// The architectural start state: zeroed general registers, PC at the
    /// fixed entry address, condition code Zero.
    pub const fn new() -> Self {
        Self {
            general_purpose: [Register(0); 8],
            pc: Register(PC_START),
            cond: ConditionFlag::Zero,
        }
    }
    pub const fn pc(&self) -> Register {
        self.pc
    }
    /// Post-increment after a fetch. Address arithmetic wraps in 16 bits.
    pub fn inc_pc(&mut self) {
        self.set_pc(self.pc.0.wrapping_add(1));
    }
    pub fn set_pc(&mut self, val: u16) {
        self.pc = val.into();
    }
    pub fn get(&self, r: u8) -> Register {
        debug_assert!(r <= 7, "Invalid general purpose register get");
        self.general_purpose[usize::from(r)]
    }
    pub fn set(&mut self, r: u8, value: Register) {
        debug_assert!(r <= 7, "Invalid general purpose register set");
        self.general_purpose[usize::from(r)] = value;
    }
    pub const fn get_conditional_register(&self) -> ConditionFlag {
        self.cond
    }
    /// Re-derives the condition code from the register that was just written.
    pub fn update_conditional_register(&mut self, r: u8) {
        let val = self.get(r);
        self.cond = ConditionFlag::from(val);
    }
    /// Returns the file to its start state so a loaded machine can run again.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
impl Debug for Registers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, val) in self.general_purpose.iter().enumerate() {
            writeln!(f, "R{index}:   {val:?}")?;
        }
        writeln!(f)?;
        writeln!(f, "PC:   {:?}", self.pc)?;
        writeln!(f, "Cond: {:?}", self.cond)?;
        Ok(())
    }
}

/// Sign of the last value written to a general register.
///
/// Exactly one flag is held at a time. The discriminants are disjoint
/// bitmasks so a `BR` instruction can test them with a bitwise AND against
/// its 3-bit nzp field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionFlag {
    Pos = 1 << 0, // Positive
    Zero = 1 << 1,
    Neg = 1 << 2, // Negative
}
impl From<Register> for ConditionFlag {
    fn from(value: Register) -> Self {
        if value.0 == 0 {
            Self::Zero
        } else if value.0 >> 15 == 1 {
            // leftmost bit is 1 for negative numbers in two's complement
            Self::Neg
        } else {
            Self::Pos
        }
    }
}
