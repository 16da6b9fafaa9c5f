//! Per-call execution state: the frame map, the stack arena `alloca`
//! carves its regions from, and the block-at-a-time dispatch loop.

use std::collections::HashMap;

use calir_ir::block::BasicBlock;
use calir_ir::function::Function;
use calir_ir::instr::{IcmpPredicate, Instruction, Opcode};
use calir_ir::types::{Ty, TypeKind};
use calir_ir::value::ValueRef;
use calir_arena::{Arena, ArenaError};

use crate::error::{Result, RuntimeError};
use crate::interp::Interpreter;
use crate::memory;
use crate::value::RuntimeValue;

fn value_addr(value: ValueRef<'_>) -> usize {
    value.base() as *const _ as usize
}

/// What running one block decided to do next.
enum Control<'ctx> {
    Branch(&'ctx BasicBlock<'ctx>),
    Return(Option<RuntimeValue>),
}

/// One call's private state: its `alloca` region, and the map from
/// instruction/argument identity to the runtime value it's bound to.
/// Dropped (and its stack arena with it) when the call returns.
pub(crate) struct ExecutionContext<'i> {
    interp: &'i Interpreter,
    function_name: String,
    stack: Arena,
    frame: HashMap<usize, RuntimeValue>,
}

impl<'i> ExecutionContext<'i> {
    fn new(interp: &'i Interpreter, function: &Function<'_>) -> Self {
        ExecutionContext {
            interp,
            function_name: function.base.name().unwrap_or("").to_string(),
            stack: Arena::with_limit(Some(interp.stack_limit())),
            frame: HashMap::new(),
        }
    }

    fn bind(&mut self, value: ValueRef<'_>, result: RuntimeValue) {
        self.frame.insert(value_addr(value), result);
    }

    /// Resolve an operand to its runtime value: an already-bound
    /// instruction or argument result, a constant's own value, or a
    /// global's assigned storage address as a pointer. Functions and
    /// blocks are never plain operands in verified IR — callers that hit
    /// one of those want `call`'s or a terminator's own handling instead.
    fn eval(&self, value: ValueRef<'_>) -> Result<RuntimeValue> {
        match value {
            ValueRef::Constant(c) => memory::constant_to_runtime(c, c.base.ty()),
            ValueRef::Global(g) => Ok(RuntimeValue::Pointer(
                self.interp.global_address(g).expect("global has storage once load_globals has run"),
            )),
            ValueRef::Argument(_) | ValueRef::Instruction(_) => Ok(*self
                .frame
                .get(&value_addr(value))
                .expect("operand is bound before any instruction that could use it, by verified SSA dominance")),
            ValueRef::Function(_) | ValueRef::Block(_) => {
                unreachable!("{:?} is never a plain operand in verified IR", value.kind())
            }
        }
    }

    /// Bump the stack arena by `size_of(allocated_type)`, aligned to
    /// `align_of(allocated_type)`, zero it, and return the address.
    fn stack_alloc(&self, allocated_type: Ty<'_>) -> Result<usize> {
        let layout = self.interp.layout();
        let size = layout.size_of(allocated_type) as usize;
        let align = layout.align_of(allocated_type).max(1) as usize;
        let raw_layout = std::alloc::Layout::from_size_align(size, align)
            .expect("calir-ir's DataLayout only ever reports power-of-two alignments");
        let ptr = self.stack.alloc_raw(raw_layout).map_err(|e| match e {
            ArenaError::LimitExceeded { limit, .. } => RuntimeError::StackOverflow { limit },
            ArenaError::OutOfMemory { .. } => RuntimeError::StackOverflow { limit: self.interp.stack_limit() },
        })?;
        // SAFETY: `ptr` was just bumped for exactly `size` bytes.
        unsafe { std::ptr::write_bytes(ptr, 0, size) };
        Ok(ptr as usize)
    }

    fn missing_predecessor(&self, block: &BasicBlock<'_>) -> RuntimeError {
        RuntimeError::MissingPredecessor {
            name: self.function_name.clone(),
            block: block.base.name().unwrap_or("").to_string(),
        }
    }

    /// Snapshot every PHI at `block`'s head against the predecessor just
    /// left, then bind them all — so no PHI's fresh result is visible to
    /// a sibling PHI evaluated in the same pass.
    fn resolve_phis<'ctx>(&mut self, block: &'ctx BasicBlock<'ctx>, previous: Option<&'ctx BasicBlock<'ctx>>) -> Result<()> {
        let phis: Vec<&'ctx Instruction<'ctx>> =
            block.instructions().into_iter().take_while(|i| i.opcode == Opcode::Phi).collect();
        if phis.is_empty() {
            return Ok(());
        }
        let previous = previous.ok_or_else(|| self.missing_predecessor(block))?;

        let mut snapshot = Vec::with_capacity(phis.len());
        for phi in &phis {
            let incoming = phi.phi_incoming();
            let value = incoming
                .iter()
                .find(|(_, b)| std::ptr::eq(*b, previous))
                .map(|(v, _)| *v)
                .ok_or_else(|| RuntimeError::PhiMissingIncoming {
                    name: self.function_name.clone(),
                    block: block.base.name().unwrap_or("").to_string(),
                    predecessor: previous.base.name().unwrap_or("").to_string(),
                })?;
            snapshot.push((ValueRef::Instruction(*phi), self.eval(value)?));
        }
        for (phi_ref, value) in snapshot {
            self.bind(phi_ref, value);
        }
        Ok(())
    }

    fn execute_block<'ctx>(&mut self, block: &'ctx BasicBlock<'ctx>) -> Result<Control<'ctx>> {
        for instr in block.instructions() {
            if instr.opcode == Opcode::Phi {
                continue;
            }
            if let Some(control) = self.execute_instruction(instr)? {
                return Ok(control);
            }
        }
        unreachable!("verified blocks always end in a terminator")
    }

    /// Run one non-PHI instruction. Returns `Some` only for a terminator,
    /// telling the caller where to go (or that the call is done).
    fn execute_instruction<'ctx>(&mut self, instr: &'ctx Instruction<'ctx>) -> Result<Option<Control<'ctx>>> {
        let operands: Vec<ValueRef<'ctx>> = instr.operands().iter().map(|u| u.value()).collect();

        match instr.opcode {
            Opcode::Ret => {
                let value = match operands.first() {
                    Some(v) => Some(self.eval(*v)?),
                    None => None,
                };
                return Ok(Some(Control::Return(value)));
            }
            Opcode::Br => {
                let target = operands[0].as_block().expect("verified br operand is a block");
                return Ok(Some(Control::Branch(target)));
            }
            Opcode::CondBr => {
                let cond = self.eval(operands[0])?;
                let taken = match cond {
                    RuntimeValue::I1(b) => b,
                    other => unreachable!("verified cond_br condition is i1, got {other:?}"),
                };
                let target = if taken { operands[1] } else { operands[2] };
                let target = target.as_block().expect("verified cond_br targets are blocks");
                return Ok(Some(Control::Branch(target)));
            }
            Opcode::Add => {
                let (lhs, rhs) = (self.eval(operands[0])?, self.eval(operands[1])?);
                self.bind(ValueRef::Instruction(instr), lhs.wrapping_add(rhs));
            }
            Opcode::Sub => {
                let (lhs, rhs) = (self.eval(operands[0])?, self.eval(operands[1])?);
                self.bind(ValueRef::Instruction(instr), lhs.wrapping_sub(rhs));
            }
            Opcode::Icmp => {
                let (lhs, rhs) = (self.eval(operands[0])?, self.eval(operands[1])?);
                let predicate = instr.icmp_predicate().expect("icmp always carries a predicate");
                self.bind(ValueRef::Instruction(instr), RuntimeValue::I1(eval_icmp(predicate, lhs, rhs)));
            }
            Opcode::Alloca => {
                let allocated_type = instr.base.ty().pointee().expect("verified alloca result is a pointer");
                let addr = self.stack_alloc(allocated_type)?;
                self.bind(ValueRef::Instruction(instr), RuntimeValue::Pointer(addr));
            }
            Opcode::Load => {
                let ptr = self.eval(operands[0])?.as_pointer()?;
                // SAFETY: verified IR guarantees `ptr` is an alloca/global
                // address sized and aligned for `instr.base.ty()`.
                let value = unsafe { memory::read_value(instr.base.ty(), ptr)? };
                self.bind(ValueRef::Instruction(instr), value);
            }
            Opcode::Store => {
                let value = self.eval(operands[0])?;
                let ptr = self.eval(operands[1])?.as_pointer()?;
                let pointee = operands[1].ty().pointee().expect("verified store pointer operand is a pointer");
                // SAFETY: same as `Load`, for the pointer's pointee type.
                unsafe { memory::write_value(pointee, ptr, value)? };
            }
            Opcode::Phi => unreachable!("phis are resolved before execute_block runs"),
            Opcode::Gep => {
                let addr = self.eval_gep(instr, &operands)?;
                self.bind(ValueRef::Instruction(instr), RuntimeValue::Pointer(addr));
            }
            Opcode::Call => {
                if let Some(value) = self.eval_call(instr, &operands)? {
                    self.bind(ValueRef::Instruction(instr), value);
                }
            }
        }
        Ok(None)
    }

    /// Replay the verifier's GEP type walk with runtime index values to
    /// compute a byte offset from `base`. Index 0 addresses the pointer
    /// itself (`offset = idx0 * size_of(source_type)`) without descending;
    /// every later index descends one level of `source_type`.
    fn eval_gep(&self, instr: &Instruction<'_>, operands: &[ValueRef<'_>]) -> Result<usize> {
        let base = self.eval(operands[0])?.as_pointer()?;
        let source_type = instr.gep_source_type().expect("gep always carries a source type");
        let layout = self.interp.layout();
        let indices = &operands[1..];

        let mut offset: i64 = 0;
        let mut current = source_type;
        for (i, index_operand) in indices.iter().enumerate() {
            let index = self.eval(*index_operand)?;
            if i == 0 {
                offset = offset.wrapping_add(index.as_i64().wrapping_mul(layout.size_of(current) as i64));
                continue;
            }
            match &current.kind {
                TypeKind::Array(elem, _) => {
                    offset = offset.wrapping_add(index.as_i64().wrapping_mul(layout.size_of(*elem) as i64));
                    current = *elem;
                }
                TypeKind::Struct(body) => {
                    let field = index.as_u64() as usize;
                    offset = offset.wrapping_add(layout.struct_member_offset(body.members, field) as i64);
                    current = *body.members.get(field).expect("verified gep struct index is in bounds");
                }
                other => unreachable!("verified gep never descends into non-aggregate {other:?}"),
            }
        }
        Ok((base as i64).wrapping_add(offset) as usize)
    }

    fn eval_call(&mut self, instr: &Instruction<'_>, operands: &[ValueRef<'_>]) -> Result<Option<RuntimeValue>> {
        let function = match operands[0] {
            ValueRef::Function(f) => f,
            other => unreachable!("verified call callee is a function value, got {:?}", other.kind()),
        };
        let args: Vec<RuntimeValue> = operands[1..].iter().map(|v| self.eval(*v)).collect::<Result<_>>()?;
        let is_void = matches!(instr.base.ty().kind, TypeKind::Void);

        if function.is_definition() {
            let result = self.interp.run(function, &args)?;
            Ok(if is_void { None } else { result })
        } else {
            let name = function.base.name().unwrap_or("").to_string();
            let result = self.interp.invoke_ffi(&name, &args)?;
            Ok(if is_void { None } else { Some(result) })
        }
    }
}

fn eval_icmp(predicate: IcmpPredicate, lhs: RuntimeValue, rhs: RuntimeValue) -> bool {
    match predicate {
        IcmpPredicate::Eq => lhs.as_u64() == rhs.as_u64(),
        IcmpPredicate::Ne => lhs.as_u64() != rhs.as_u64(),
        IcmpPredicate::Slt => lhs.as_i64() < rhs.as_i64(),
        IcmpPredicate::Sle => lhs.as_i64() <= rhs.as_i64(),
        IcmpPredicate::Sgt => lhs.as_i64() > rhs.as_i64(),
        IcmpPredicate::Sge => lhs.as_i64() >= rhs.as_i64(),
        IcmpPredicate::Ult => lhs.as_u64() < rhs.as_u64(),
        IcmpPredicate::Ule => lhs.as_u64() <= rhs.as_u64(),
        IcmpPredicate::Ugt => lhs.as_u64() > rhs.as_u64(),
        IcmpPredicate::Uge => lhs.as_u64() >= rhs.as_u64(),
    }
}

/// Run `function` against `args`, from its entry block to the `ret` that
/// ends the call. Lives here rather than on `Interpreter` itself so
/// recursive calls (`eval_call`) and the public entry point share one
/// path without `Interpreter` needing a mutable borrow of its own state.
pub(crate) fn run(interp: &Interpreter, function: &Function<'_>, args: &[RuntimeValue]) -> Result<Option<RuntimeValue>> {
    let mut ctx = ExecutionContext::new(interp, function);
    for (arg, value) in function.arguments().iter().zip(args) {
        ctx.bind(ValueRef::Argument(arg), *value);
    }

    let mut current = function.entry_block().expect("verified function definitions have an entry block");
    let mut previous = None;
    loop {
        ctx.resolve_phis(current, previous)?;
        match ctx.execute_block(current)? {
            Control::Branch(target) => {
                previous = Some(current);
                current = target;
            }
            Control::Return(value) => return Ok(value),
        }
    }
}
