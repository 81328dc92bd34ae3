//! Implemented operations for the LC-3.
//!
//! Every handler runs after the fetch already post-incremented the program
//! counter, so PC-relative arithmetic starts from the address of the next
//! instruction. All address arithmetic wraps in 16 bits.
use crate::emulator::instruction::Instruction;
use crate::hardware::memory::Memory;
use crate::hardware::registers::{Register, Registers, from_binary};

fn address_by_offset(r: Register, offset: i16) -> u16 {
    r.as_binary().wrapping_add(offset.cast_unsigned())
}

/// ADD: Mathematical addition in 2 variants
/// - DR is set with result of SR 1 + SR 2
/// ```text
///  15__12__11_9__8_6___5___4_3__2_0_
/// | 0001 |  DR | SR1 | 0 | 00 | SR2 |
///  ---------------------------------
/// ```
/// - DR is set with result of SR 1 + sign extended immediate
/// ```text
///  15__12__11_9__8_6___5___4___0_
/// | 0001 |  DR | SR1 | 1 |  IMM5 |
///  ------------------------------
/// ```
pub fn add(i: Instruction, r: &mut Registers) {
    let operand = if i.is_immediate() {
        i.get_immediate()
    } else {
        r.get(i.sr2_number()).as_binary()
    };
    let sum = r.get(i.sr1_number()).as_binary().wrapping_add(operand);
    r.set(i.dr_number(), from_binary(sum));
    r.update_conditional_register(i.dr_number());
}

/// AND: bit-wise AND in 2 variants
/// - DR is set with result of SR 1 AND SR 2
/// ```text
///  15__12__11_9__8_6___5___4_3__2_0_
/// | 0101 |  DR | SR1 | 0 | 00 | SR2 |
///  ---------------------------------
/// ```
/// - DR is set with result of SR 1 AND sign extended immediate
/// ```text
///  15__12__11_9__8_6___5___4___0_
/// | 0101 |  DR | SR1 | 1 |  IMM5 |
///  ------------------------------
/// ```
pub fn and(i: Instruction, r: &mut Registers) {
    let operand = if i.is_immediate() {
        i.get_immediate()
    } else {
        r.get(i.sr2_number()).as_binary()
    };
    r.set(
        i.dr_number(),
        from_binary(r.get(i.sr1_number()).as_binary() & operand),
    );
    r.update_conditional_register(i.dr_number());
}

/// NOT: bit-wise complement of the value in SR 1
/// ```text
///  15__12__11_9__8_6___5___0_
/// | 1001 |  DR | SR1 | 11111 |
///  --------------------------
/// ```
pub fn not(i: Instruction, r: &mut Registers) {
    r.set(
        i.dr_number(),
        from_binary(!r.get(i.sr1_number()).as_binary()),
    );
    r.update_conditional_register(i.dr_number());
}

/// BR: Conditional Branch
/// Adds the sign extended offset to PC if the current [`ConditionFlag`]
/// matches a set bit of `n`, `z` or `p`. With all three bits clear the
/// branch is never taken; with all three set it is unconditional.
/// ```text
///  15__12__11_9___8_______0_
/// | 0000 |  nzp | PCoffset9 |
///  -------------------------
/// ```
/// [`ConditionFlag`]: crate::hardware::registers::ConditionFlag
pub fn br(i: Instruction, r: &mut Registers) {
    let nzp = i.get_bit_range(9, 11);
    if nzp & r.get_conditional_register() as u16 != 0 {
        r.set_pc(address_by_offset(r.pc(), i.pc_offset(9)));
    }
}

/// JMP/RET: unconditional jump to the address in the base register.
/// RET is the assembler's name for `JMP R7`.
/// ```text
///  15__12__11_9__8___6___5____0_
/// | 1100 | 000 | BaseR | 000000 |
///  -----------------------------
/// ```
pub fn jmp_or_ret(i: Instruction, r: &mut Registers) {
    r.set_pc(r.get(i.sr1_number()).as_binary());
}

/// JSR/JSRR: saves the incremented PC in R7, then jumps
/// - to PC + sign extended offset (JSR)
/// ```text
///  15__12__11___10________0_
/// | 0100 |  1 | PCoffset11 |
///  ------------------------
/// ```
/// - or to the address in the base register (JSRR)
/// ```text
///  15__12__11_9___8___6___5____0_
/// | 0100 | 000 | BaseR | 000000 |
///  -----------------------------
/// ```
/// The base register is read before R7 is overwritten, so `JSRR R7` jumps
/// to the old return address.
pub fn jsr_or_jsrr(i: Instruction, r: &mut Registers) {
    let return_address = r.pc();
    let target = if i.get_bit(11) {
        address_by_offset(return_address, i.pc_offset(11))
    } else {
        r.get(i.sr1_number()).as_binary()
    };
    r.set(7, return_address);
    r.set_pc(target);
}

/// LD: Loads content of memory address of PC + sign extended offset into DR.
/// ```text
///  15__12__11_9___8_______0_
/// | 0010 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn ld(i: Instruction, r: &mut Registers, memory: &mut Memory) {
    let value = memory.read(address_by_offset(r.pc(), i.pc_offset(9)));
    r.set(i.dr_number(), from_binary(value));
    r.update_conditional_register(i.dr_number());
}

/// LDI: Load indirect.
/// Calculates memory address of PC + sign extended offset and reads another
/// address from there, the content of the memory at that indirectly loaded
/// address is put into DR.
/// ```text
///  15__12__11_9___8_______0_
/// | 1010 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn ldi(i: Instruction, r: &mut Registers, memory: &mut Memory) {
    let address_address = address_by_offset(r.pc(), i.pc_offset(9));
    let value_address = memory.read(address_address);
    let value = memory.read(value_address);
    r.set(i.dr_number(), from_binary(value));
    r.update_conditional_register(i.dr_number());
}

/// LDR: Load address from base register and adds sign extended offset to load
/// the memory content from there into DR.
/// ```text
///  15__12__11_9__8___6____5____0_
/// | 0110 |  DR | BaseR | offset6 |
///  ------------------------------
/// ```
pub fn ldr(i: Instruction, r: &mut Registers, memory: &mut Memory) {
    let base_register = i.get_bit_range_u8(6, 8, "Error in ldr");
    let value_address = address_by_offset(r.get(base_register), i.pc_offset(6));
    let value = memory.read(value_address);
    r.set(i.dr_number(), from_binary(value));
    r.update_conditional_register(i.dr_number());
}

/// LEA: Load Effective Address loads PC + sign extended offset into DR.
/// ```text
///  15__12__11_9___8_______0_
/// | 1110 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn lea(i: Instruction, r: &mut Registers) {
    r.set(
        i.dr_number(),
        from_binary(address_by_offset(r.pc(), i.pc_offset(9))),
    );
    r.update_conditional_register(i.dr_number());
}

/// ST: Store. The contents of the SR are written to memory address PC + sign
/// extended offset.
/// ```text
///  15__12__11_9___8_______0_
/// | 0011 |  SR  | PCoffset9 |
///  -------------------------
/// ```
pub fn st(i: Instruction, r: &Registers, memory: &mut Memory) {
    memory.write(
        address_by_offset(r.pc(), i.pc_offset(9)),
        r.get(i.dr_number()).as_binary(),
    );
}

/// STI: Store Indirect. The contents of the SR are written to the address
/// which is loaded from memory address PC + sign extended offset.
/// ```text
///  15__12__11_9___8_______0_
/// | 1011 |  SR  | PCoffset9 |
///  -------------------------
/// ```
pub fn sti(i: Instruction, r: &Registers, memory: &mut Memory) {
    let target = memory.read(address_by_offset(r.pc(), i.pc_offset(9)));
    memory.write(target, r.get(i.dr_number()).as_binary());
}

/// STR: Store contents of SR to memory address of base register plus sign
/// extended offset.
/// ```text
///  15__12__11_9__8___6____5____0_
/// | 0111 |  SR | BaseR | offset6 |
///  ------------------------------
/// ```
pub fn str(i: Instruction, r: &Registers, memory: &mut Memory) {
    let base_register = i.get_bit_range_u8(6, 8, "Error in str");
    memory.write(
        address_by_offset(r.get(base_register), i.pc_offset(6)),
        r.get(i.dr_number()).as_binary(),
    );
}

#[expect(clippy::unusual_byte_groupings)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::registers::{ConditionFlag, from_decimal};
    use googletest::prelude::*;

    #[gtest]
    pub fn test_opcode_add() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(22));
        regs.set(1, from_binary(128));
        // Add: DR: 2, SR1: 0: 22, Immediate: false, SR2: 1: 128 => R2: 150
        add(0b0001_010_000_0_00_001.into(), &mut regs);
        // Add: DR: 3, SR1: 2: 150, Immediate: true, imm5: 14 => R3: 164
        add(0b0001_011_010_1_01110.into(), &mut regs);
        expect_that!(regs.get(0), eq(from_binary(22)));
        expect_that!(regs.get(1), eq(from_binary(128)));
        expect_that!(regs.get(2), eq(from_binary(150)));
        expect_that!(regs.get(3), eq(from_binary(164)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    pub fn test_opcode_add_negative() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(22));
        regs.set(1, from_decimal(-128));
        // Add: DR: 2, SR1: 0: 22, Immediate: false, SR2: 1: -128 => R2: -106
        add(0b0001_010_000_0_00_001.into(), &mut regs);
        // Add: DR: 3, SR1: 2: -106, Immediate: true, imm5: -2 => R3: -108
        add(0b0001_011_010_1_11110.into(), &mut regs);
        expect_that!(regs.get(1), eq(from_decimal(-128)));
        expect_that!(regs.get(2).as_decimal(), eq(-106));
        expect_that!(regs.get(3).as_decimal(), eq(-108));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    pub fn test_opcode_add_wraps_into_negative() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(0x7FFF)); // largest positive number in 2's complement
        regs.set(1, from_binary(1));
        // Add: DR: 2, SR1: 0, Immediate: false, SR2: 1 => R2: 0x8000
        add(0b0001_010_000_0_00_001.into(), &mut regs);
        expect_that!(regs.get(2), eq(from_binary(0x8000)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    pub fn test_opcode_add_result_0() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(0x7FFF));
        regs.set(1, from_binary(!0x7FFF + 1));
        regs.set(2, from_binary(1)); // to be sure opcode was executed
        // Add: DR: 2, SR1: 0, Immediate: false, SR2: 1 => R2: 0
        add(0b0001_010_000_0_00_001.into(), &mut regs);
        expect_that!(regs.get(2), eq(from_binary(0)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Zero));
    }
    #[gtest]
    pub fn test_opcode_and() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(0b1101_1001_0111_0101));
        regs.set(1, from_binary(0b0100_1010_0010_1001));
        // And: DR: 2, SR1: 0, Immediate: false, SR2: 1
        and(0b0101_010_000_0_00_001.into(), &mut regs);
        expect_that!(regs.get(2), eq(from_binary(0b0100_1000_0010_0001)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    pub fn test_opcode_and_immediate() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(0b1101_1001_0111_0101));
        // And: DR: 2, SR1: 0, Immediate: true: 0b10101
        // Immediate sign extended: 0b1111_1111_1111_0101
        and(0b0101_010_000_1_10101.into(), &mut regs);
        expect_that!(regs.get(2), eq(from_binary(0b1101_1001_0111_0101)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    pub fn test_opcode_not() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(0x7FFF));
        // Not: DR: 1, SR1: 0 => R1: 0x8000
        super::not(0b1001_001_000_111111.into(), &mut regs);
        expect_that!(regs.get(1), eq(from_binary(0x8000)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    pub fn test_opcode_br_taken_on_matching_flag() {
        let mut regs = Registers::new();
        regs.set_pc(0x3001);
        // fresh register file holds the Zero flag
        // Br: nzp: 010, PCoffset9: +16
        br(0b0000_010_000010000.into(), &mut regs);
        expect_that!(regs.pc(), eq(0x3011));
    }
    #[gtest]
    pub fn test_opcode_br_not_taken_on_other_flag() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(1));
        regs.update_conditional_register(0); // Pos
        regs.set_pc(0x3001);
        // Br: nzp: 110, PCoffset9: +16
        br(0b0000_110_000010000.into(), &mut regs);
        expect_that!(regs.pc(), eq(0x3001));
    }
    #[gtest]
    pub fn test_opcode_br_all_bits_clear_never_branches() {
        let mut regs = Registers::new();
        regs.set_pc(0x3001);
        // Br: nzp: 000, PCoffset9: +16
        br(0b0000_000_000010000.into(), &mut regs);
        expect_that!(regs.pc(), eq(0x3001));
    }
    #[gtest]
    pub fn test_opcode_br_backwards() {
        let mut regs = Registers::new();
        regs.set_pc(0x3010);
        // Br: nzp: 111, PCoffset9: -16
        br(0b0000_111_111110000.into(), &mut regs);
        expect_that!(regs.pc(), eq(0x3000));
    }
    #[gtest]
    pub fn test_opcode_jmp_and_ret() {
        let mut regs = Registers::new();
        regs.set(2, from_binary(0x4242));
        // Jmp: BaseR: 2
        jmp_or_ret(0b1100_000_010_000000.into(), &mut regs);
        expect_that!(regs.pc(), eq(0x4242));

        regs.set(7, from_binary(0x3001));
        // Ret is Jmp BaseR: 7
        jmp_or_ret(0b1100_000_111_000000.into(), &mut regs);
        expect_that!(regs.pc(), eq(0x3001));
    }
    #[gtest]
    pub fn test_opcode_jsr_saves_return_address() {
        let mut regs = Registers::new();
        regs.set_pc(0x3001);
        // Jsr: PCoffset11: +4
        jsr_or_jsrr(0b0100_1_00000000100.into(), &mut regs);
        expect_that!(regs.get(7), eq(from_binary(0x3001)));
        expect_that!(regs.pc(), eq(0x3005));
    }
    #[gtest]
    pub fn test_opcode_jsrr_reads_base_before_r7() {
        let mut regs = Registers::new();
        regs.set_pc(0x3001);
        regs.set(7, from_binary(0x5000));
        // Jsrr: BaseR: 7
        jsr_or_jsrr(0b0100_0_00_111_000000.into(), &mut regs);
        expect_that!(regs.pc(), eq(0x5000));
        expect_that!(regs.get(7), eq(from_binary(0x3001)));
    }
    #[gtest]
    pub fn test_opcode_lea() {
        let mut regs = Registers::new();
        regs.set_pc(0x3045);
        // Lea: DR: 3, PCoffset9: +0x55
        lea(0b1110_011_0_0101_0101.into(), &mut regs);
        expect_that!(regs.get(3), eq(from_binary(0x3045 + 0b0_0101_0101)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    pub fn test_opcode_ld() {
        let mut regs = Registers::new();
        regs.set_pc(0x3001);
        let (mut memory, _kbd) = Memory::with_program(&[4711, 815]);
        // Ld: DR: 4, PCoffset9: -1 => mem[0x3000]
        ld(0b0010_100_1_1111_1111.into(), &mut regs, &mut memory);
        expect_that!(regs.get(4), eq(from_decimal(4711)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Pos));

        // Ld: DR: 4, PCoffset9: 0 => mem[0x3001]
        ld(0b0010_100_0_0000_0000.into(), &mut regs, &mut memory);
        expect_that!(regs.get(4), eq(from_decimal(815)));
    }
    #[gtest]
    pub fn test_opcode_ldr() {
        let mut regs = Registers::new();
        let mut raw = vec![0; 6];
        let mem_val = 0b1111_1111_1111_0110; // -10
        raw[5] = mem_val;
        let (mut memory, _kbd) = Memory::with_program(&raw);
        regs.set(6, from_binary(0x3025));
        // Ldr: DR: 2, BaseR: 6, offset6: -32 => mem[0x3005]
        ldr(0b0110_010_110_100000.into(), &mut regs, &mut memory);
        expect_that!(regs.get(2), eq(from_binary(mem_val)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    pub fn test_opcode_ldi() {
        let mut regs = Registers::new();
        let mut raw = vec![0; 10];
        let val_to_load_in_register = 0b1111_1111_1111_0110; // -10
        raw[3] = val_to_load_in_register;
        raw[5] = 0x3003; // absolute address of the value above
        let (mut memory, _kbd) = Memory::with_program(&raw);
        regs.set_pc(0x3065);
        // Ldi: DR: 1, PCoffset9: -96 => pointer at mem[0x3005]
        ldi(0b1010_001_110100000.into(), &mut regs, &mut memory);
        expect_that!(regs.get(1), eq(from_binary(val_to_load_in_register)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    pub fn test_opcode_st() {
        let mut regs = Registers::new();
        let (mut memory, _kbd) = Memory::with_program(&[]);
        regs.set_pc(0x3001);
        regs.set(3, from_binary(0xCAFE));
        // St: SR: 3, PCoffset9: +2 => mem[0x3003]
        st(0b0011_011_000000010.into(), &regs, &mut memory);
        expect_that!(memory.read(0x3003), eq(0xCAFE));
    }
    #[gtest]
    pub fn test_opcode_sti() {
        let mut regs = Registers::new();
        let mut raw = vec![0; 4];
        raw[3] = 0x4000; // pointer
        let (mut memory, _kbd) = Memory::with_program(&raw);
        regs.set_pc(0x3001);
        regs.set(3, from_binary(0xCAFE));
        // Sti: SR: 3, PCoffset9: +2 => through pointer at mem[0x3003]
        sti(0b1011_011_000000010.into(), &regs, &mut memory);
        expect_that!(memory.read(0x4000), eq(0xCAFE));
    }
    #[gtest]
    pub fn test_opcode_str() {
        let mut regs = Registers::new();
        let (mut memory, _kbd) = Memory::with_program(&[]);
        regs.set(6, from_binary(0x3025));
        regs.set(2, from_binary(0xCAFE));
        // Str: SR: 2, BaseR: 6, offset6: -32 => mem[0x3005]
        str(0b0111_010_110_100000.into(), &regs, &mut memory);
        expect_that!(memory.read(0x3005), eq(0xCAFE));
    }
    #[gtest]
    pub fn test_address_arithmetic_wraps() {
        let mut regs = Registers::new();
        regs.set_pc(0xFFFF);
        // Lea: DR: 0, PCoffset9: +2 wraps past the top of memory
        lea(0b1110_000_000000010.into(), &mut regs);
        expect_that!(regs.get(0), eq(from_binary(0x0001)));
    }
}
