/// Register file of a single machine.
///
/// `pc` always points at the start of an instruction while the machine is
/// runnable. `relative_base` is only changed by the relative-base adjust
/// opcode.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Registers {
    /// Program counter.
    pub pc: usize,
    /// Offset added to relative-mode parameters.
    pub relative_base: i64,
}

impl Registers {
    /// Creates a register file with `pc = 0` and `relative_base = 0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Address of the parameter cell at `index` (0-based) of the current instruction.
    #[inline(always)]
    pub fn param_address(&self, index: usize) -> usize {
        self.pc + 1 + index
    }

    /// Moves `pc` past an instruction of `width` cells.
    #[inline(always)]
    pub fn advance(&mut self, width: usize) {
        self.pc += width;
    }
}
