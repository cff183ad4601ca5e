use log::{debug, trace, warn};
use once_cell::sync::Lazy;
use crate::bus::Bus;
use crate::cpu::{CpuError, CpuRegisters};

const STACK_BASE_ADDRESS: u16 = 0x0100;
const NMI_VECTOR: u16 = 0xFFFA;
const RESET_VECTOR: u16 = 0xFFFC;
const IRQ_VECTOR: u16 = 0xFFFE;
const NUM_OP_CODES: usize = 256;
const POWER_ON_STACK_POINTER: u8 = 0xFD;
const POWER_ON_STATUS: u8 = 0x24;
const POWER_ON_CYCLES: u64 = 7;
const INTERRUPT_CYCLES: u32 = 7;

static INSTRUCTION_TABLE: Lazy<Vec<Instruction>> = Lazy::new(Cpu6502::build_instruction_table);

macro_rules! add_instruction {
    ($table:ident, $opcode:expr, $op:ident, $mode:ident, $cycles:expr, Illegal) => {
        $table[$opcode] = Instruction {
            opcode: OpCode::$op,
            addressing_mode: AddressingMode::$mode,
            cycles: $cycles,
            category: InstructionCategory::Illegal,
        }
    };
    ($table:ident, $opcode:expr, $op:ident, $mode:ident, $cycles:expr) => {
        $table[$opcode] = Instruction {
            opcode: OpCode::$op,
            addressing_mode: AddressingMode::$mode,
            cycles: $cycles,
            category: InstructionCategory::Standard,
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpCode {
    ADC, AND, ASL, BCC, BCS, BEQ, BIT, BMI, BNE, BPL, BRK, BVC, BVS, CLC,
    CLD, CLI, CLV, CMP, CPX, CPY, DEC, DEX, DEY, EOR, INC, INX, INY, JMP,
    JSR, LDA, LDX, LDY, LSR, NOP, ORA, PHA, PHP, PLA, PLP, ROL, ROR, RTI,
    RTS, SBC, SEC, SED, SEI, STA, STX, STY, TAX, TAY, TSX, TXA, TXS, TYA,
    // unofficial
    ALR, ANC, ARR, DCP, ISB, JAM, LAX, RLA, RRA, SAX, SBX, SLO, SRE,
    // unstable opcodes, executed as NOPs of the right length
    XXX,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddressingMode {
    Implicit,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
}

impl AddressingMode {
    fn operand_size(self) -> u16 {
        match self {
            AddressingMode::Implicit | AddressingMode::Accumulator => 0,
            AddressingMode::Absolute | AddressingMode::AbsoluteX | AddressingMode::AbsoluteY | AddressingMode::Indirect => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstructionCategory {
    Standard,
    Illegal,
}

#[derive(Debug, Clone, Copy)]
struct Instruction {
    opcode: OpCode,
    addressing_mode: AddressingMode,
    cycles: u32,
    category: InstructionCategory,
}

impl Instruction {
    fn has_page_cross_penalty(&self) -> bool {
        matches!(self.opcode,
            OpCode::ADC | OpCode::AND | OpCode::CMP | OpCode::EOR | OpCode::LDA | OpCode::LDX |
            OpCode::LDY | OpCode::ORA | OpCode::SBC | OpCode::LAX | OpCode::NOP)
    }
}

#[derive(Debug, Clone, Copy)]
enum Operand {
    None,
    Accumulator,
    Byte(u8),
    /// Effective address and whether computing it crossed a page.
    Address(u16, bool),
}

#[derive(Debug, Clone, Copy)]
enum StatusFlag {
    Carry = 0x01,
    Zero = 0x02,
    InterruptDisable = 0x04,
    DecimalMode = 0x08,
    BreakCommand = 0x10,
    Unused = 0x20,
    Overflow = 0x40,
    Negative = 0x80,
}

impl StatusFlag {
    fn bits(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Default)]
struct Registers {
    a: u8,
    x: u8,
    y: u8,
    p: u8,
    sp: u8,
    pc: u16,
}

impl Registers {
    fn set_status(&mut self, flag: StatusFlag, value: bool) {
        if value {
            self.p |= flag.bits();
        } else {
            self.p &= !flag.bits();
        }
    }

    fn get_status(&self, flag: StatusFlag) -> bool {
        (self.p & flag.bits()) != 0
    }
}

fn is_page_crossed(a: u16, b: u16) -> bool {
    (a & 0xFF00) != (b & 0xFF00)
}

#[derive(Debug, Default)]
pub struct Cpu6502 {
    registers: Registers,
    nmi_pending: bool,
    irq_line: bool,
    cycles: u64,
}

impl Cpu6502 {
    pub fn new() -> Self {
        Cpu6502::default()
    }

    /// Power-on/reset: A=X=Y=0, SP=$FD, P=$24 and PC loaded from the reset vector.
    pub fn power_on<B: Bus>(&mut self, bus: &mut B) {
        self.registers = Registers {
            a: 0,
            x: 0,
            y: 0,
            p: POWER_ON_STATUS,
            sp: POWER_ON_STACK_POINTER,
            pc: bus.read_word(RESET_VECTOR),
        };
        self.nmi_pending = false;
        self.irq_line = false;
        self.cycles = POWER_ON_CYCLES;

        debug!("CPU: power on, entry point 0x{:04X}", self.registers.pc);
    }

    pub fn registers(&self) -> CpuRegisters {
        CpuRegisters {
            pc: self.registers.pc,
            a: self.registers.a,
            x: self.registers.x,
            y: self.registers.y,
            sp: self.registers.sp,
            p: self.registers.p,
        }
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    #[cfg(test)]
    pub fn set_pc_immediate(&mut self, address: u16) {
        self.registers.pc = address;
    }

    /// Latch an NMI edge; it is serviced before the next instruction.
    pub fn signal_nmi(&mut self) {
        self.nmi_pending = true;
    }

    pub fn set_irq_line(&mut self, asserted: bool) {
        self.irq_line = asserted;
    }

    /// Service a pending interrupt or execute one instruction, returning the cycles consumed.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        if self.nmi_pending {
            self.nmi_pending = false;
            trace!("CPU: servicing NMI");
            self.interrupt(bus, NMI_VECTOR);
            return Ok(self.account(INTERRUPT_CYCLES));
        }

        if self.irq_line && !self.registers.get_status(StatusFlag::InterruptDisable) {
            trace!("CPU: servicing IRQ");
            self.interrupt(bus, IRQ_VECTOR);
            return Ok(self.account(INTERRUPT_CYCLES));
        }

        let pc = self.registers.pc;
        let byte = bus.read_byte(pc);
        let instruction = INSTRUCTION_TABLE[byte as usize];

        if instruction.opcode == OpCode::JAM {
            warn!("CPU: JAM opcode 0x{:02X} at 0x{:04X}", byte, pc);
            Err(CpuError::Halted(pc))?
        }

        let operand = self.fetch_operand(bus, pc, instruction.addressing_mode);
        self.registers.pc = pc.wrapping_add(1 + instruction.addressing_mode.operand_size());

        let mut cycles = instruction.cycles + self.execute(bus, &instruction, &operand, byte)?;
        if instruction.has_page_cross_penalty() {
            if let Operand::Address(_, true) = operand {
                cycles += 1;
            }
        }

        Ok(self.account(cycles))
    }

    fn account(&mut self, cycles: u32) -> u32 {
        self.cycles += cycles as u64;
        cycles
    }

    fn fetch_operand<B: Bus>(&self, bus: &mut B, pc: u16, mode: AddressingMode) -> Operand {
        let operand_addr = pc.wrapping_add(1);

        match mode {
            AddressingMode::Implicit => Operand::None,
            AddressingMode::Accumulator => Operand::Accumulator,
            AddressingMode::Immediate => Operand::Byte(bus.read_byte(operand_addr)),
            AddressingMode::ZeroPage => Operand::Address(bus.read_byte(operand_addr) as u16, false),
            AddressingMode::ZeroPageX => Operand::Address(bus.read_byte(operand_addr).wrapping_add(self.registers.x) as u16, false),
            AddressingMode::ZeroPageY => Operand::Address(bus.read_byte(operand_addr).wrapping_add(self.registers.y) as u16, false),
            AddressingMode::Relative => {
                let offset = bus.read_byte(operand_addr) as i8;
                let next = pc.wrapping_add(2);
                let target = next.wrapping_add(offset as i16 as u16);
                Operand::Address(target, is_page_crossed(next, target))
            },
            AddressingMode::Absolute => Operand::Address(bus.read_word(operand_addr), false),
            AddressingMode::AbsoluteX => {
                let base = bus.read_word(operand_addr);
                let addr = base.wrapping_add(self.registers.x as u16);
                Operand::Address(addr, is_page_crossed(base, addr))
            },
            AddressingMode::AbsoluteY => {
                let base = bus.read_word(operand_addr);
                let addr = base.wrapping_add(self.registers.y as u16);
                Operand::Address(addr, is_page_crossed(base, addr))
            },
            AddressingMode::Indirect => {
                // the pointer high byte never carries into the next page
                let ptr = bus.read_word(operand_addr);
                let lo = bus.read_byte(ptr) as u16;
                let hi = bus.read_byte((ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF)) as u16;
                Operand::Address((hi << 8) | lo, false)
            },
            AddressingMode::IndirectX => {
                let zp = bus.read_byte(operand_addr).wrapping_add(self.registers.x);
                Operand::Address(self.read_zero_page_word(bus, zp), false)
            },
            AddressingMode::IndirectY => {
                let zp = bus.read_byte(operand_addr);
                let base = self.read_zero_page_word(bus, zp);
                let addr = base.wrapping_add(self.registers.y as u16);
                Operand::Address(addr, is_page_crossed(base, addr))
            },
        }
    }

    fn read_zero_page_word<B: Bus>(&self, bus: &mut B, zp: u8) -> u16 {
        let lo = bus.read_byte(zp as u16) as u16;
        let hi = bus.read_byte(zp.wrapping_add(1) as u16) as u16;
        (hi << 8) | lo
    }

    fn read_operand<B: Bus>(&self, bus: &mut B, operand: &Operand) -> Result<u8, CpuError> {
        match *operand {
            Operand::Accumulator => Ok(self.registers.a),
            Operand::Byte(value) => Ok(value),
            Operand::Address(addr, _) => Ok(bus.read_byte(addr)),
            Operand::None => Err(CpuError::InvalidOperand("no operand to read".to_string())),
        }
    }

    fn write_operand<B: Bus>(&mut self, bus: &mut B, operand: &Operand, value: u8) -> Result<(), CpuError> {
        match *operand {
            Operand::Accumulator => self.registers.a = value,
            Operand::Address(addr, _) => bus.write_byte(addr, value),
            _ => Err(CpuError::InvalidOperand(format!("cannot write to {:?}", operand)))?,
        }

        Ok(())
    }

    fn operand_address(operand: &Operand) -> Result<u16, CpuError> {
        match *operand {
            Operand::Address(addr, _) => Ok(addr),
            _ => Err(CpuError::InvalidOperand(format!("expected an address, got {:?}", operand))),
        }
    }

    fn push<B: Bus>(&mut self, bus: &mut B, value: u8) {
        bus.write_byte(STACK_BASE_ADDRESS | self.registers.sp as u16, value);
        self.registers.sp = self.registers.sp.wrapping_sub(1);
    }

    fn pop<B: Bus>(&mut self, bus: &mut B) -> u8 {
        self.registers.sp = self.registers.sp.wrapping_add(1);
        bus.read_byte(STACK_BASE_ADDRESS | self.registers.sp as u16)
    }

    fn push_word<B: Bus>(&mut self, bus: &mut B, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, value as u8);
    }

    fn pop_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.pop(bus) as u16;
        let hi = self.pop(bus) as u16;
        (hi << 8) | lo
    }

    fn interrupt<B: Bus>(&mut self, bus: &mut B, vector: u16) {
        self.push_word(bus, self.registers.pc);
        let status = (self.registers.p & !StatusFlag::BreakCommand.bits()) | StatusFlag::Unused.bits();
        self.push(bus, status);
        self.registers.set_status(StatusFlag::InterruptDisable, true);
        self.registers.pc = bus.read_word(vector);
    }

    fn update_flags_zero_negative(&mut self, value: u8) {
        self.registers.set_status(StatusFlag::Zero, value == 0);
        self.registers.set_status(StatusFlag::Negative, value & 0x80 != 0);
    }

    fn add_with_carry(&mut self, value: u8) {
        let a = self.registers.a;
        let carry = self.registers.get_status(StatusFlag::Carry) as u16;
        let sum = a as u16 + value as u16 + carry;
        let result = sum as u8;

        self.registers.set_status(StatusFlag::Carry, sum > 0xFF);
        self.registers.set_status(StatusFlag::Overflow, (a ^ result) & (value ^ result) & 0x80 != 0);
        self.registers.a = result;
        self.update_flags_zero_negative(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.registers.set_status(StatusFlag::Carry, register >= value);
        self.update_flags_zero_negative(register.wrapping_sub(value));
    }

    fn shift_left(&mut self, value: u8) -> u8 {
        self.registers.set_status(StatusFlag::Carry, value & 0x80 != 0);
        let result = value << 1;
        self.update_flags_zero_negative(result);
        result
    }

    fn shift_right(&mut self, value: u8) -> u8 {
        self.registers.set_status(StatusFlag::Carry, value & 0x01 != 0);
        let result = value >> 1;
        self.update_flags_zero_negative(result);
        result
    }

    fn rotate_left(&mut self, value: u8) -> u8 {
        let carry_in = self.registers.get_status(StatusFlag::Carry) as u8;
        self.registers.set_status(StatusFlag::Carry, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.update_flags_zero_negative(result);
        result
    }

    fn rotate_right(&mut self, value: u8) -> u8 {
        let carry_in = (self.registers.get_status(StatusFlag::Carry) as u8) << 7;
        self.registers.set_status(StatusFlag::Carry, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.update_flags_zero_negative(result);
        result
    }

    fn branch(&mut self, condition: bool, operand: &Operand) -> Result<u32, CpuError> {
        if !condition {
            return Ok(0);
        }

        let (target, page_crossed) = match *operand {
            Operand::Address(addr, crossed) => (addr, crossed),
            _ => Err(CpuError::InvalidOperand("branch without target".to_string()))?,
        };
        self.registers.pc = target;

        Ok(if page_crossed { 2 } else { 1 })
    }

    /// Read-modify-write helper shared by the shift/inc/dec families; returns the value written.
    fn modify<B: Bus>(&mut self, bus: &mut B, operand: &Operand, f: fn(&mut Self, u8) -> u8) -> Result<u8, CpuError> {
        let value = self.read_operand(bus, operand)?;
        let result = f(self, value);
        self.write_operand(bus, operand, result)?;
        Ok(result)
    }

    fn execute<B: Bus>(&mut self, bus: &mut B, instruction: &Instruction, operand: &Operand, byte: u8) -> Result<u32, CpuError> {
        if instruction.category == InstructionCategory::Illegal {
            trace!("CPU: unofficial opcode 0x{:02X} ({:?})", byte, instruction.opcode);
        }

        match instruction.opcode {
            OpCode::ADC => {
                let value = self.read_operand(bus, operand)?;
                self.add_with_carry(value);
            },
            OpCode::SBC => {
                let value = self.read_operand(bus, operand)?;
                self.add_with_carry(!value);
            },
            OpCode::AND => {
                let value = self.read_operand(bus, operand)?;
                self.registers.a &= value;
                self.update_flags_zero_negative(self.registers.a);
            },
            OpCode::ORA => {
                let value = self.read_operand(bus, operand)?;
                self.registers.a |= value;
                self.update_flags_zero_negative(self.registers.a);
            },
            OpCode::EOR => {
                let value = self.read_operand(bus, operand)?;
                self.registers.a ^= value;
                self.update_flags_zero_negative(self.registers.a);
            },
            OpCode::ASL => { self.modify(bus, operand, Self::shift_left)?; },
            OpCode::LSR => { self.modify(bus, operand, Self::shift_right)?; },
            OpCode::ROL => { self.modify(bus, operand, Self::rotate_left)?; },
            OpCode::ROR => { self.modify(bus, operand, Self::rotate_right)?; },
            OpCode::INC => { self.modify(bus, operand, Self::increment)?; },
            OpCode::DEC => { self.modify(bus, operand, Self::decrement)?; },
            OpCode::BCC => return self.branch(!self.registers.get_status(StatusFlag::Carry), operand),
            OpCode::BCS => return self.branch(self.registers.get_status(StatusFlag::Carry), operand),
            OpCode::BEQ => return self.branch(self.registers.get_status(StatusFlag::Zero), operand),
            OpCode::BNE => return self.branch(!self.registers.get_status(StatusFlag::Zero), operand),
            OpCode::BMI => return self.branch(self.registers.get_status(StatusFlag::Negative), operand),
            OpCode::BPL => return self.branch(!self.registers.get_status(StatusFlag::Negative), operand),
            OpCode::BVS => return self.branch(self.registers.get_status(StatusFlag::Overflow), operand),
            OpCode::BVC => return self.branch(!self.registers.get_status(StatusFlag::Overflow), operand),
            OpCode::BIT => {
                let value = self.read_operand(bus, operand)?;
                self.registers.set_status(StatusFlag::Zero, self.registers.a & value == 0);
                self.registers.set_status(StatusFlag::Overflow, value & 0x40 != 0);
                self.registers.set_status(StatusFlag::Negative, value & 0x80 != 0);
            },
            OpCode::BRK => {
                // BRK carries a padding byte, so the pushed return address skips it
                self.push_word(bus, self.registers.pc.wrapping_add(1));
                let status = self.registers.p | StatusFlag::BreakCommand.bits() | StatusFlag::Unused.bits();
                self.push(bus, status);
                self.registers.set_status(StatusFlag::InterruptDisable, true);
                self.registers.pc = bus.read_word(IRQ_VECTOR);
            },
            OpCode::CLC => self.registers.set_status(StatusFlag::Carry, false),
            OpCode::CLD => self.registers.set_status(StatusFlag::DecimalMode, false),
            OpCode::CLI => self.registers.set_status(StatusFlag::InterruptDisable, false),
            OpCode::CLV => self.registers.set_status(StatusFlag::Overflow, false),
            OpCode::SEC => self.registers.set_status(StatusFlag::Carry, true),
            OpCode::SED => self.registers.set_status(StatusFlag::DecimalMode, true),
            OpCode::SEI => self.registers.set_status(StatusFlag::InterruptDisable, true),
            OpCode::CMP => {
                let value = self.read_operand(bus, operand)?;
                self.compare(self.registers.a, value);
            },
            OpCode::CPX => {
                let value = self.read_operand(bus, operand)?;
                self.compare(self.registers.x, value);
            },
            OpCode::CPY => {
                let value = self.read_operand(bus, operand)?;
                self.compare(self.registers.y, value);
            },
            OpCode::DEX => {
                self.registers.x = self.registers.x.wrapping_sub(1);
                self.update_flags_zero_negative(self.registers.x);
            },
            OpCode::DEY => {
                self.registers.y = self.registers.y.wrapping_sub(1);
                self.update_flags_zero_negative(self.registers.y);
            },
            OpCode::INX => {
                self.registers.x = self.registers.x.wrapping_add(1);
                self.update_flags_zero_negative(self.registers.x);
            },
            OpCode::INY => {
                self.registers.y = self.registers.y.wrapping_add(1);
                self.update_flags_zero_negative(self.registers.y);
            },
            OpCode::JMP => self.registers.pc = Self::operand_address(operand)?,
            OpCode::JSR => {
                let target = Self::operand_address(operand)?;
                self.push_word(bus, self.registers.pc.wrapping_sub(1));
                self.registers.pc = target;
            },
            OpCode::RTS => self.registers.pc = self.pop_word(bus).wrapping_add(1),
            OpCode::RTI => {
                let status = self.pop(bus);
                self.registers.p = (status & !StatusFlag::BreakCommand.bits()) | StatusFlag::Unused.bits();
                self.registers.pc = self.pop_word(bus);
            },
            OpCode::LDA => {
                self.registers.a = self.read_operand(bus, operand)?;
                self.update_flags_zero_negative(self.registers.a);
            },
            OpCode::LDX => {
                self.registers.x = self.read_operand(bus, operand)?;
                self.update_flags_zero_negative(self.registers.x);
            },
            OpCode::LDY => {
                self.registers.y = self.read_operand(bus, operand)?;
                self.update_flags_zero_negative(self.registers.y);
            },
            OpCode::STA => self.write_operand(bus, operand, self.registers.a)?,
            OpCode::STX => self.write_operand(bus, operand, self.registers.x)?,
            OpCode::STY => self.write_operand(bus, operand, self.registers.y)?,
            OpCode::NOP | OpCode::XXX => {
                // unofficial NOPs still perform their dummy read
                if let Operand::Address(addr, _) = *operand {
                    bus.read_byte(addr);
                }
            },
            OpCode::PHA => self.push(bus, self.registers.a),
            OpCode::PHP => {
                let status = self.registers.p | StatusFlag::BreakCommand.bits() | StatusFlag::Unused.bits();
                self.push(bus, status);
            },
            OpCode::PLA => {
                self.registers.a = self.pop(bus);
                self.update_flags_zero_negative(self.registers.a);
            },
            OpCode::PLP => {
                let status = self.pop(bus);
                self.registers.p = (status & !StatusFlag::BreakCommand.bits()) | StatusFlag::Unused.bits();
            },
            OpCode::TAX => {
                self.registers.x = self.registers.a;
                self.update_flags_zero_negative(self.registers.x);
            },
            OpCode::TAY => {
                self.registers.y = self.registers.a;
                self.update_flags_zero_negative(self.registers.y);
            },
            OpCode::TSX => {
                self.registers.x = self.registers.sp;
                self.update_flags_zero_negative(self.registers.x);
            },
            OpCode::TXA => {
                self.registers.a = self.registers.x;
                self.update_flags_zero_negative(self.registers.a);
            },
            OpCode::TYA => {
                self.registers.a = self.registers.y;
                self.update_flags_zero_negative(self.registers.a);
            },
            OpCode::TXS => self.registers.sp = self.registers.x,
            OpCode::LAX => {
                let value = self.read_operand(bus, operand)?;
                self.registers.a = value;
                self.registers.x = value;
                self.update_flags_zero_negative(value);
            },
            OpCode::SAX => self.write_operand(bus, operand, self.registers.a & self.registers.x)?,
            OpCode::DCP => {
                let value = self.modify(bus, operand, |_, v| v.wrapping_sub(1))?;
                self.compare(self.registers.a, value);
            },
            OpCode::ISB => {
                let value = self.modify(bus, operand, |_, v| v.wrapping_add(1))?;
                self.add_with_carry(!value);
            },
            OpCode::SLO => {
                let value = self.modify(bus, operand, Self::shift_left)?;
                self.registers.a |= value;
                self.update_flags_zero_negative(self.registers.a);
            },
            OpCode::RLA => {
                let value = self.modify(bus, operand, Self::rotate_left)?;
                self.registers.a &= value;
                self.update_flags_zero_negative(self.registers.a);
            },
            OpCode::SRE => {
                let value = self.modify(bus, operand, Self::shift_right)?;
                self.registers.a ^= value;
                self.update_flags_zero_negative(self.registers.a);
            },
            OpCode::RRA => {
                let value = self.modify(bus, operand, Self::rotate_right)?;
                self.add_with_carry(value);
            },
            OpCode::ANC => {
                let value = self.read_operand(bus, operand)?;
                self.registers.a &= value;
                self.update_flags_zero_negative(self.registers.a);
                self.registers.set_status(StatusFlag::Carry, self.registers.a & 0x80 != 0);
            },
            OpCode::ALR => {
                let value = self.read_operand(bus, operand)?;
                let masked = self.registers.a & value;
                self.registers.a = self.shift_right(masked);
            },
            OpCode::ARR => {
                let value = self.read_operand(bus, operand)?;
                let carry_in = (self.registers.get_status(StatusFlag::Carry) as u8) << 7;
                let result = ((self.registers.a & value) >> 1) | carry_in;
                self.registers.a = result;
                self.update_flags_zero_negative(result);
                self.registers.set_status(StatusFlag::Carry, result & 0x40 != 0);
                self.registers.set_status(StatusFlag::Overflow, ((result >> 6) ^ (result >> 5)) & 0x01 != 0);
            },
            OpCode::SBX => {
                let value = self.read_operand(bus, operand)?;
                let masked = self.registers.a & self.registers.x;
                self.registers.set_status(StatusFlag::Carry, masked >= value);
                self.registers.x = masked.wrapping_sub(value);
                self.update_flags_zero_negative(self.registers.x);
            },
            OpCode::JAM => Err(CpuError::Halted(self.registers.pc))?,
        }

        Ok(0)
    }

    fn increment(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.update_flags_zero_negative(result);
        result
    }

    fn decrement(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.update_flags_zero_negative(result);
        result
    }

    fn build_instruction_table() -> Vec<Instruction> {
        let filler = Instruction {
            opcode: OpCode::XXX,
            addressing_mode: AddressingMode::Implicit,
            cycles: 2,
            category: InstructionCategory::Illegal,
        };
        let mut table = vec![filler; NUM_OP_CODES];

        add_instruction!(table, 0x69, ADC, Immediate, 2);
        add_instruction!(table, 0x65, ADC, ZeroPage, 3);
        add_instruction!(table, 0x75, ADC, ZeroPageX, 4);
        add_instruction!(table, 0x6D, ADC, Absolute, 4);
        add_instruction!(table, 0x7D, ADC, AbsoluteX, 4);
        add_instruction!(table, 0x79, ADC, AbsoluteY, 4);
        add_instruction!(table, 0x61, ADC, IndirectX, 6);
        add_instruction!(table, 0x71, ADC, IndirectY, 5);

        add_instruction!(table, 0x29, AND, Immediate, 2);
        add_instruction!(table, 0x25, AND, ZeroPage, 3);
        add_instruction!(table, 0x35, AND, ZeroPageX, 4);
        add_instruction!(table, 0x2D, AND, Absolute, 4);
        add_instruction!(table, 0x3D, AND, AbsoluteX, 4);
        add_instruction!(table, 0x39, AND, AbsoluteY, 4);
        add_instruction!(table, 0x21, AND, IndirectX, 6);
        add_instruction!(table, 0x31, AND, IndirectY, 5);

        add_instruction!(table, 0x0A, ASL, Accumulator, 2);
        add_instruction!(table, 0x06, ASL, ZeroPage, 5);
        add_instruction!(table, 0x16, ASL, ZeroPageX, 6);
        add_instruction!(table, 0x0E, ASL, Absolute, 6);
        add_instruction!(table, 0x1E, ASL, AbsoluteX, 7);

        add_instruction!(table, 0x90, BCC, Relative, 2);
        add_instruction!(table, 0xB0, BCS, Relative, 2);
        add_instruction!(table, 0xF0, BEQ, Relative, 2);
        add_instruction!(table, 0x30, BMI, Relative, 2);
        add_instruction!(table, 0xD0, BNE, Relative, 2);
        add_instruction!(table, 0x10, BPL, Relative, 2);
        add_instruction!(table, 0x50, BVC, Relative, 2);
        add_instruction!(table, 0x70, BVS, Relative, 2);

        add_instruction!(table, 0x24, BIT, ZeroPage, 3);
        add_instruction!(table, 0x2C, BIT, Absolute, 4);

        add_instruction!(table, 0x00, BRK, Implicit, 7);

        add_instruction!(table, 0x18, CLC, Implicit, 2);
        add_instruction!(table, 0xD8, CLD, Implicit, 2);
        add_instruction!(table, 0x58, CLI, Implicit, 2);
        add_instruction!(table, 0xB8, CLV, Implicit, 2);

        add_instruction!(table, 0xC9, CMP, Immediate, 2);
        add_instruction!(table, 0xC5, CMP, ZeroPage, 3);
        add_instruction!(table, 0xD5, CMP, ZeroPageX, 4);
        add_instruction!(table, 0xCD, CMP, Absolute, 4);
        add_instruction!(table, 0xDD, CMP, AbsoluteX, 4);
        add_instruction!(table, 0xD9, CMP, AbsoluteY, 4);
        add_instruction!(table, 0xC1, CMP, IndirectX, 6);
        add_instruction!(table, 0xD1, CMP, IndirectY, 5);

        add_instruction!(table, 0xE0, CPX, Immediate, 2);
        add_instruction!(table, 0xE4, CPX, ZeroPage, 3);
        add_instruction!(table, 0xEC, CPX, Absolute, 4);
        add_instruction!(table, 0xC0, CPY, Immediate, 2);
        add_instruction!(table, 0xC4, CPY, ZeroPage, 3);
        add_instruction!(table, 0xCC, CPY, Absolute, 4);

        add_instruction!(table, 0xC6, DEC, ZeroPage, 5);
        add_instruction!(table, 0xD6, DEC, ZeroPageX, 6);
        add_instruction!(table, 0xCE, DEC, Absolute, 6);
        add_instruction!(table, 0xDE, DEC, AbsoluteX, 7);
        add_instruction!(table, 0xCA, DEX, Implicit, 2);
        add_instruction!(table, 0x88, DEY, Implicit, 2);

        add_instruction!(table, 0x49, EOR, Immediate, 2);
        add_instruction!(table, 0x45, EOR, ZeroPage, 3);
        add_instruction!(table, 0x55, EOR, ZeroPageX, 4);
        add_instruction!(table, 0x4D, EOR, Absolute, 4);
        add_instruction!(table, 0x5D, EOR, AbsoluteX, 4);
        add_instruction!(table, 0x59, EOR, AbsoluteY, 4);
        add_instruction!(table, 0x41, EOR, IndirectX, 6);
        add_instruction!(table, 0x51, EOR, IndirectY, 5);

        add_instruction!(table, 0xE6, INC, ZeroPage, 5);
        add_instruction!(table, 0xF6, INC, ZeroPageX, 6);
        add_instruction!(table, 0xEE, INC, Absolute, 6);
        add_instruction!(table, 0xFE, INC, AbsoluteX, 7);
        add_instruction!(table, 0xE8, INX, Implicit, 2);
        add_instruction!(table, 0xC8, INY, Implicit, 2);

        add_instruction!(table, 0x4C, JMP, Absolute, 3);
        add_instruction!(table, 0x6C, JMP, Indirect, 5);
        add_instruction!(table, 0x20, JSR, Absolute, 6);

        add_instruction!(table, 0xA9, LDA, Immediate, 2);
        add_instruction!(table, 0xA5, LDA, ZeroPage, 3);
        add_instruction!(table, 0xB5, LDA, ZeroPageX, 4);
        add_instruction!(table, 0xAD, LDA, Absolute, 4);
        add_instruction!(table, 0xBD, LDA, AbsoluteX, 4);
        add_instruction!(table, 0xB9, LDA, AbsoluteY, 4);
        add_instruction!(table, 0xA1, LDA, IndirectX, 6);
        add_instruction!(table, 0xB1, LDA, IndirectY, 5);

        add_instruction!(table, 0xA2, LDX, Immediate, 2);
        add_instruction!(table, 0xA6, LDX, ZeroPage, 3);
        add_instruction!(table, 0xB6, LDX, ZeroPageY, 4);
        add_instruction!(table, 0xAE, LDX, Absolute, 4);
        add_instruction!(table, 0xBE, LDX, AbsoluteY, 4);

        add_instruction!(table, 0xA0, LDY, Immediate, 2);
        add_instruction!(table, 0xA4, LDY, ZeroPage, 3);
        add_instruction!(table, 0xB4, LDY, ZeroPageX, 4);
        add_instruction!(table, 0xAC, LDY, Absolute, 4);
        add_instruction!(table, 0xBC, LDY, AbsoluteX, 4);

        add_instruction!(table, 0x4A, LSR, Accumulator, 2);
        add_instruction!(table, 0x46, LSR, ZeroPage, 5);
        add_instruction!(table, 0x56, LSR, ZeroPageX, 6);
        add_instruction!(table, 0x4E, LSR, Absolute, 6);
        add_instruction!(table, 0x5E, LSR, AbsoluteX, 7);

        add_instruction!(table, 0xEA, NOP, Implicit, 2);

        add_instruction!(table, 0x09, ORA, Immediate, 2);
        add_instruction!(table, 0x05, ORA, ZeroPage, 3);
        add_instruction!(table, 0x15, ORA, ZeroPageX, 4);
        add_instruction!(table, 0x0D, ORA, Absolute, 4);
        add_instruction!(table, 0x1D, ORA, AbsoluteX, 4);
        add_instruction!(table, 0x19, ORA, AbsoluteY, 4);
        add_instruction!(table, 0x01, ORA, IndirectX, 6);
        add_instruction!(table, 0x11, ORA, IndirectY, 5);

        add_instruction!(table, 0x48, PHA, Implicit, 3);
        add_instruction!(table, 0x08, PHP, Implicit, 3);
        add_instruction!(table, 0x68, PLA, Implicit, 4);
        add_instruction!(table, 0x28, PLP, Implicit, 4);

        add_instruction!(table, 0x2A, ROL, Accumulator, 2);
        add_instruction!(table, 0x26, ROL, ZeroPage, 5);
        add_instruction!(table, 0x36, ROL, ZeroPageX, 6);
        add_instruction!(table, 0x2E, ROL, Absolute, 6);
        add_instruction!(table, 0x3E, ROL, AbsoluteX, 7);

        add_instruction!(table, 0x6A, ROR, Accumulator, 2);
        add_instruction!(table, 0x66, ROR, ZeroPage, 5);
        add_instruction!(table, 0x76, ROR, ZeroPageX, 6);
        add_instruction!(table, 0x6E, ROR, Absolute, 6);
        add_instruction!(table, 0x7E, ROR, AbsoluteX, 7);

        add_instruction!(table, 0x40, RTI, Implicit, 6);
        add_instruction!(table, 0x60, RTS, Implicit, 6);

        add_instruction!(table, 0xE9, SBC, Immediate, 2);
        add_instruction!(table, 0xE5, SBC, ZeroPage, 3);
        add_instruction!(table, 0xF5, SBC, ZeroPageX, 4);
        add_instruction!(table, 0xED, SBC, Absolute, 4);
        add_instruction!(table, 0xFD, SBC, AbsoluteX, 4);
        add_instruction!(table, 0xF9, SBC, AbsoluteY, 4);
        add_instruction!(table, 0xE1, SBC, IndirectX, 6);
        add_instruction!(table, 0xF1, SBC, IndirectY, 5);

        add_instruction!(table, 0x38, SEC, Implicit, 2);
        add_instruction!(table, 0xF8, SED, Implicit, 2);
        add_instruction!(table, 0x78, SEI, Implicit, 2);

        add_instruction!(table, 0x85, STA, ZeroPage, 3);
        add_instruction!(table, 0x95, STA, ZeroPageX, 4);
        add_instruction!(table, 0x8D, STA, Absolute, 4);
        add_instruction!(table, 0x9D, STA, AbsoluteX, 5);
        add_instruction!(table, 0x99, STA, AbsoluteY, 5);
        add_instruction!(table, 0x81, STA, IndirectX, 6);
        add_instruction!(table, 0x91, STA, IndirectY, 6);

        add_instruction!(table, 0x86, STX, ZeroPage, 3);
        add_instruction!(table, 0x96, STX, ZeroPageY, 4);
        add_instruction!(table, 0x8E, STX, Absolute, 4);
        add_instruction!(table, 0x84, STY, ZeroPage, 3);
        add_instruction!(table, 0x94, STY, ZeroPageX, 4);
        add_instruction!(table, 0x8C, STY, Absolute, 4);

        add_instruction!(table, 0xAA, TAX, Implicit, 2);
        add_instruction!(table, 0xA8, TAY, Implicit, 2);
        add_instruction!(table, 0xBA, TSX, Implicit, 2);
        add_instruction!(table, 0x8A, TXA, Implicit, 2);
        add_instruction!(table, 0x9A, TXS, Implicit, 2);
        add_instruction!(table, 0x98, TYA, Implicit, 2);

        for opcode in [0x1A, 0x3A, 0x5A, 0x7A, 0xDA, 0xFA] {
            add_instruction!(table, opcode, NOP, Implicit, 2, Illegal);
        }
        for opcode in [0x80, 0x82, 0x89, 0xC2, 0xE2] {
            add_instruction!(table, opcode, NOP, Immediate, 2, Illegal);
        }
        for opcode in [0x04, 0x44, 0x64] {
            add_instruction!(table, opcode, NOP, ZeroPage, 3, Illegal);
        }
        for opcode in [0x14, 0x34, 0x54, 0x74, 0xD4, 0xF4] {
            add_instruction!(table, opcode, NOP, ZeroPageX, 4, Illegal);
        }
        add_instruction!(table, 0x0C, NOP, Absolute, 4, Illegal);
        for opcode in [0x1C, 0x3C, 0x5C, 0x7C, 0xDC, 0xFC] {
            add_instruction!(table, opcode, NOP, AbsoluteX, 4, Illegal);
        }

        add_instruction!(table, 0xA7, LAX, ZeroPage, 3, Illegal);
        add_instruction!(table, 0xB7, LAX, ZeroPageY, 4, Illegal);
        add_instruction!(table, 0xAF, LAX, Absolute, 4, Illegal);
        add_instruction!(table, 0xBF, LAX, AbsoluteY, 4, Illegal);
        add_instruction!(table, 0xA3, LAX, IndirectX, 6, Illegal);
        add_instruction!(table, 0xB3, LAX, IndirectY, 5, Illegal);

        add_instruction!(table, 0x87, SAX, ZeroPage, 3, Illegal);
        add_instruction!(table, 0x97, SAX, ZeroPageY, 4, Illegal);
        add_instruction!(table, 0x8F, SAX, Absolute, 4, Illegal);
        add_instruction!(table, 0x83, SAX, IndirectX, 6, Illegal);

        add_instruction!(table, 0xEB, SBC, Immediate, 2, Illegal);

        // the read-modify-write families share one layout: zp, zp+x, abs, abs+x, abs+y, (zp,x), (zp),y
        for (op, base) in [(OpCode::SLO, 0x00), (OpCode::RLA, 0x20), (OpCode::SRE, 0x40),
                           (OpCode::RRA, 0x60), (OpCode::DCP, 0xC0), (OpCode::ISB, 0xE0)] {
            let layout = [
                (0x07, AddressingMode::ZeroPage, 5),
                (0x17, AddressingMode::ZeroPageX, 6),
                (0x0F, AddressingMode::Absolute, 6),
                (0x1F, AddressingMode::AbsoluteX, 7),
                (0x1B, AddressingMode::AbsoluteY, 7),
                (0x03, AddressingMode::IndirectX, 8),
                (0x13, AddressingMode::IndirectY, 8),
            ];
            for (offset, addressing_mode, cycles) in layout {
                table[base + offset] = Instruction { opcode: op, addressing_mode, cycles, category: InstructionCategory::Illegal };
            }
        }

        add_instruction!(table, 0x0B, ANC, Immediate, 2, Illegal);
        add_instruction!(table, 0x2B, ANC, Immediate, 2, Illegal);
        add_instruction!(table, 0x4B, ALR, Immediate, 2, Illegal);
        add_instruction!(table, 0x6B, ARR, Immediate, 2, Illegal);
        add_instruction!(table, 0xCB, SBX, Immediate, 2, Illegal);

        for opcode in [0x02, 0x12, 0x22, 0x32, 0x42, 0x52, 0x62, 0x72, 0x92, 0xB2, 0xD2, 0xF2] {
            add_instruction!(table, opcode, JAM, Implicit, 2, Illegal);
        }

        add_instruction!(table, 0x8B, XXX, Immediate, 2, Illegal);
        add_instruction!(table, 0xAB, XXX, Immediate, 2, Illegal);
        add_instruction!(table, 0x93, XXX, IndirectY, 6, Illegal);
        add_instruction!(table, 0x9F, XXX, AbsoluteY, 5, Illegal);
        add_instruction!(table, 0x9E, XXX, AbsoluteY, 5, Illegal);
        add_instruction!(table, 0x9C, XXX, AbsoluteX, 5, Illegal);
        add_instruction!(table, 0x9B, XXX, AbsoluteY, 5, Illegal);
        add_instruction!(table, 0xBB, XXX, AbsoluteY, 4, Illegal);

        table
    }
}
