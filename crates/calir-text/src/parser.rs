//! Recursive-descent parser. Textual forward references only need to be
//! resolved *within* a function body (a `br`/`cond_br`/`phi` naming a
//! block defined later in the same function); module-level items
//! (structs, globals, functions) are expected in the order the printer
//! emits them and are resolved as they're parsed.

use crate::error::{ParseError, Result};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use calir_ir::builder::Builder;
use calir_ir::context::Context;
use calir_ir::instr::IcmpPredicate;
use calir_ir::module::Module;
use calir_ir::types::Ty;
use calir_ir::value::ValueRef;
use calir_util::Span;
use std::collections::HashMap;

pub fn parse_module<'ctx>(ctx: &'ctx Context, src: &str) -> Result<&'ctx Module<'ctx>> {
    Parser::new(ctx, src)?.parse()
}

struct Parser<'ctx, 'src> {
    lexer: Lexer<'src>,
    slice: Option<(Vec<Token>, usize)>,
    current: Token,
    peek: Token,
    ctx: &'ctx Context,
    globals: HashMap<String, ValueRef<'ctx>>,
}

impl<'ctx, 'src> Parser<'ctx, 'src> {
    fn new(ctx: &'ctx Context, src: &'src str) -> Result<Self> {
        let mut lexer = Lexer::new(src);
        let current = lexer.next_token()?;
        let peek = lexer.next_token()?;
        Ok(Parser { lexer, slice: None, current, peek, ctx, globals: HashMap::new() })
    }

    fn raw_next(&mut self) -> Result<Token> {
        if let Some((tokens, pos)) = &mut self.slice {
            return Ok(if *pos < tokens.len() {
                let t = tokens[*pos].clone();
                *pos += 1;
                t
            } else {
                Token { kind: TokenKind::Eof, span: tokens.last().map(|t| t.span).unwrap_or(Span::DUMMY) }
            });
        }
        self.lexer.next_token()
    }

    fn bump(&mut self) -> Result<Token> {
        let next = self.raw_next()?;
        Ok(std::mem::replace(&mut self.current, std::mem::replace(&mut self.peek, next)))
    }

    fn span(&self) -> Span {
        self.current.span
    }

    fn expect_punct(&mut self, c: char) -> Result<()> {
        match self.current.kind {
            TokenKind::Punct(p) if p == c => {
                self.bump()?;
                Ok(())
            }
            _ => Err(ParseError::Unexpected { expected: format!("'{c}'"), found: format!("{:?}", self.current.kind), span: self.span() }),
        }
    }

    fn eat_punct(&mut self, c: char) -> Result<bool> {
        if matches!(self.current.kind, TokenKind::Punct(p) if p == c) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn check_punct(&self, c: char) -> bool {
        matches!(self.current.kind, TokenKind::Punct(p) if p == c)
    }

    fn expect_ident(&mut self, word: &str) -> Result<()> {
        match &self.current.kind {
            TokenKind::Ident(s) if s == word => {
                self.bump()?;
                Ok(())
            }
            _ => Err(ParseError::Unexpected { expected: format!("'{word}'"), found: format!("{:?}", self.current.kind), span: self.span() }),
        }
    }

    fn expect_str(&mut self) -> Result<String> {
        match self.current.kind.clone() {
            TokenKind::Str(s) => {
                self.bump()?;
                Ok(s)
            }
            other => Err(ParseError::Unexpected { expected: "string literal".into(), found: format!("{other:?}"), span: self.span() }),
        }
    }

    fn expect_global(&mut self) -> Result<String> {
        match self.current.kind.clone() {
            TokenKind::Global(s) => {
                self.bump()?;
                Ok(s)
            }
            other => Err(ParseError::Unexpected { expected: "'@name'".into(), found: format!("{other:?}"), span: self.span() }),
        }
    }

    fn expect_local(&mut self) -> Result<String> {
        match self.current.kind.clone() {
            TokenKind::Local(s) => {
                self.bump()?;
                Ok(s)
            }
            other => Err(ParseError::Unexpected { expected: "'%name'".into(), found: format!("{other:?}"), span: self.span() }),
        }
    }

    fn expect_label(&mut self) -> Result<String> {
        match self.current.kind.clone() {
            TokenKind::Label(s) => {
                self.bump()?;
                Ok(s)
            }
            other => Err(ParseError::Unexpected { expected: "'$name'".into(), found: format!("{other:?}"), span: self.span() }),
        }
    }

    fn expect_int(&mut self) -> Result<u64> {
        match self.current.kind.clone() {
            TokenKind::Int(v) => {
                self.bump()?;
                Ok(v)
            }
            other => Err(ParseError::Unexpected { expected: "integer".into(), found: format!("{other:?}"), span: self.span() }),
        }
    }

    // ---- types ---------------------------------------------------------

    fn parse_type(&mut self) -> Result<Ty<'ctx>> {
        let span = self.span();
        match self.current.kind.clone() {
            TokenKind::Ident(name) => {
                self.bump()?;
                self.resolve_type_keyword(&name, span)
            }
            TokenKind::Local(name) => {
                self.bump()?;
                self.ctx.lookup_named_struct(&name).ok_or(ParseError::UnknownType { name, span })
            }
            TokenKind::Punct('<') => {
                self.bump()?;
                let pointee = self.parse_type_or_function_sig()?;
                self.expect_punct('>')?;
                Ok(self.ctx.get_ptr(pointee))
            }
            TokenKind::Punct('[') => {
                self.bump()?;
                let count = self.expect_int()?;
                self.expect_ident("x")?;
                let elem = self.parse_type()?;
                self.expect_punct(']')?;
                Ok(self.ctx.get_array(elem, count))
            }
            TokenKind::Punct('{') => {
                self.bump()?;
                let members = self.parse_type_list('}')?;
                self.expect_punct('}')?;
                Ok(self.ctx.get_anon_struct(&members))
            }
            other => Err(ParseError::Unexpected { expected: "a type".into(), found: format!("{other:?}"), span }),
        }
    }

    fn resolve_type_keyword(&self, name: &str, span: Span) -> Result<Ty<'ctx>> {
        match name {
            "void" => Ok(self.ctx.get_void()),
            "f32" => Ok(self.ctx.get_f32()),
            "f64" => Ok(self.ctx.get_f64()),
            "label" => Ok(self.ctx.get_label()),
            s if s.starts_with('i') && s.len() > 1 && s[1..].bytes().all(|b| b.is_ascii_digit()) => {
                let width: u32 = s[1..].parse().expect("checked digits above");
                self.ctx.get_int(width).ok_or(ParseError::UnknownType { name: name.to_string(), span })
            }
            _ => Err(ParseError::UnknownType { name: name.to_string(), span }),
        }
    }

    fn parse_type_list(&mut self, close: char) -> Result<Vec<Ty<'ctx>>> {
        let mut out = Vec::new();
        if self.check_punct(close) {
            return Ok(out);
        }
        loop {
            out.push(self.parse_type()?);
            if !self.eat_punct(',')? {
                break;
            }
        }
        Ok(out)
    }

    /// A base type optionally followed by `(ParamTs...)`, which turns it
    /// into a function type — the callee-type form used inside `<...>`.
    fn parse_type_or_function_sig(&mut self) -> Result<Ty<'ctx>> {
        let ret = self.parse_type()?;
        if !self.check_punct('(') {
            return Ok(ret);
        }
        self.bump()?;
        let mut params = Vec::new();
        let mut variadic = false;
        if !self.check_punct(')') {
            loop {
                if self.current.kind == TokenKind::Ellipsis {
                    self.bump()?;
                    variadic = true;
                    break;
                }
                params.push(self.parse_type()?);
                if !self.eat_punct(',')? {
                    break;
                }
            }
        }
        self.expect_punct(')')?;
        Ok(self.ctx.get_function_type(ret, &params, variadic))
    }

    // ---- top level -------------------------------------------------------

    fn parse(&mut self) -> Result<&'ctx Module<'ctx>> {
        self.expect_ident("module")?;
        self.expect_punct('=')?;
        let name = self.expect_str()?;
        let module = self.ctx.create_module(&name).map_err(|e| ParseError::Ir(e, self.span()))?;

        loop {
            match self.current.kind.clone() {
                TokenKind::Eof => break,
                TokenKind::Local(_) => self.parse_struct_def()?,
                TokenKind::Global(_) => self.parse_global_def(module)?,
                TokenKind::Ident(word) if word == "declare" || word == "define" => {
                    self.parse_function(module, word == "define")?;
                }
                other => {
                    return Err(ParseError::Unexpected {
                        expected: "a struct, global, or function definition".into(),
                        found: format!("{other:?}"),
                        span: self.span(),
                    })
                }
            }
        }
        Ok(module)
    }

    fn parse_struct_def(&mut self) -> Result<()> {
        let span = self.span();
        let name = self.expect_local()?;
        self.expect_punct('=')?;
        self.expect_ident("type")?;
        self.expect_punct('{')?;
        let members = self.parse_type_list('}')?;
        self.expect_punct('}')?;
        if self.ctx.lookup_named_struct(&name).is_some() {
            return Err(ParseError::DuplicateValue { name, span });
        }
        self.ctx.get_named_struct(&name, &members);
        Ok(())
    }

    fn parse_global_def(&mut self, module: &'ctx Module<'ctx>) -> Result<()> {
        let span = self.span();
        let name = self.expect_global()?;
        self.expect_punct('=')?;
        self.expect_ident("global")?;
        let ty = self.parse_type()?;
        let initializer = if self.eat_keyword("zeroinitializer")? {
            None
        } else {
            Some(self.parse_constant_value(ty)?)
        };
        let base = calir_ir::value::ValueBase::new(self.ctx.get_ptr(ty), Some(self.ctx.intern_str(&name)));
        let global = self
            .ctx
            .ir_arena()
            .alloc(calir_ir::module::GlobalVariable { base, allocated_type: ty, initializer })
            .map_err(|e| ParseError::Ir(calir_ir::IrError::Alloc(e), span))?;
        module.push_global(global);
        self.globals.insert(name, ValueRef::Global(global));
        Ok(())
    }

    fn eat_keyword(&mut self, word: &str) -> Result<bool> {
        if matches!(&self.current.kind, TokenKind::Ident(s) if s == word) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_constant_value(&mut self, ty: Ty<'ctx>) -> Result<ValueRef<'ctx>> {
        let span = self.span();
        match self.current.kind.clone() {
            TokenKind::Int(v) => {
                self.bump()?;
                Ok(ValueRef::Constant(self.ctx.const_int(ty, v)))
            }
            TokenKind::Float(v) => {
                self.bump()?;
                Ok(ValueRef::Constant(self.ctx.const_float(ty, v).expect("literal float constants are never NaN")))
            }
            TokenKind::Ident(word) if word == "undef" => {
                self.bump()?;
                Ok(ValueRef::Constant(self.ctx.const_undef(ty)))
            }
            TokenKind::Global(name) => {
                self.bump()?;
                self.resolve_global(&name, span)
            }
            other => Err(ParseError::Unexpected { expected: "a constant".into(), found: format!("{other:?}"), span }),
        }
    }

    fn resolve_global(&self, name: &str, span: Span) -> Result<ValueRef<'ctx>> {
        self.globals.get(name).copied().ok_or(ParseError::UndefinedGlobal { name: name.to_string(), span })
    }

    // ---- functions ---------------------------------------------------------

    fn parse_function(&mut self, module: &'ctx Module<'ctx>, is_define: bool) -> Result<()> {
        self.bump()?; // "declare" / "define"
        let ret_ty = self.parse_type()?;
        let name_span = self.span();
        let name = self.expect_global()?;
        self.expect_punct('(')?;

        let mut param_types = Vec::new();
        let mut param_names: Vec<Option<String>> = Vec::new();
        let mut variadic = false;
        if !self.check_punct(')') {
            loop {
                if self.current.kind == TokenKind::Ellipsis {
                    self.bump()?;
                    variadic = true;
                    break;
                }
                let param_name = if matches!(self.current.kind, TokenKind::Local(_)) {
                    let n = self.expect_local()?;
                    self.expect_punct(':')?;
                    Some(n)
                } else {
                    None
                };
                param_types.push(self.parse_type()?);
                param_names.push(param_name);
                if !self.eat_punct(',')? {
                    break;
                }
            }
        }
        self.expect_punct(')')?;

        let function = self.ctx.create_function(&name).map_err(|e| ParseError::Ir(e, name_span))?;
        let fn_type = self.ctx.get_function_type(ret_ty, &param_types, variadic);
        let sig = fn_type.as_function().expect("get_function_type always returns a Function type");
        let fn_ptr_ty = self.ctx.get_ptr(fn_type);
        function.finalize_signature(sig, fn_ptr_ty);

        let mut locals: HashMap<String, ValueRef<'ctx>> = HashMap::new();
        for (index, ty) in param_types.iter().enumerate() {
            let given_name = if is_define { param_names[index].as_deref() } else { None };
            let arg = self.ctx.create_argument(*ty, given_name, index).map_err(|e| ParseError::Ir(e, name_span))?;
            function.push_argument(arg);
            if let Some(n) = &param_names[index] {
                if is_define {
                    locals.insert(n.clone(), ValueRef::Argument(arg));
                }
            }
        }

        module.push_function(function);
        self.globals.insert(name, ValueRef::Function(function));

        if !is_define {
            return Ok(());
        }

        self.expect_punct('{')?;
        let body_tokens = self.collect_balanced_body()?;
        self.parse_function_body(function, body_tokens, locals)?;
        Ok(())
    }

    /// Consume tokens up to (and including) the function body's matching
    /// `}`, tracking brace depth so a nested anonymous-struct-type literal
    /// (`{ i32, i32 }`) doesn't look like the function's own close brace.
    fn collect_balanced_body(&mut self) -> Result<Vec<Token>> {
        let mut depth = 1i32;
        let mut tokens = Vec::new();
        loop {
            match &self.current.kind {
                TokenKind::Eof => {
                    return Err(ParseError::Unexpected {
                        expected: "'}'".into(),
                        found: "end of input".into(),
                        span: self.span(),
                    })
                }
                TokenKind::Punct('{') => {
                    depth += 1;
                    tokens.push(self.current.clone());
                    self.bump()?;
                }
                TokenKind::Punct('}') => {
                    depth -= 1;
                    if depth == 0 {
                        self.bump()?;
                        break;
                    }
                    tokens.push(self.current.clone());
                    self.bump()?;
                }
                _ => {
                    tokens.push(self.current.clone());
                    self.bump()?;
                }
            }
        }
        Ok(tokens)
    }

    fn parse_function_body(
        &mut self,
        function: &'ctx calir_ir::function::Function<'ctx>,
        tokens: Vec<Token>,
        mut locals: HashMap<String, ValueRef<'ctx>>,
    ) -> Result<()> {
        // Pass 1: pre-create every block named by a `$label:` header, so
        // forward references inside terminators and phis resolve.
        let mut blocks: HashMap<String, &'ctx calir_ir::block::BasicBlock<'ctx>> = HashMap::new();
        for window in tokens.windows(2) {
            if let (TokenKind::Label(name), TokenKind::Punct(':')) = (&window[0].kind, &window[1].kind) {
                if blocks.contains_key(name) {
                    return Err(ParseError::DuplicateLabel { name: name.clone(), span: window[0].span });
                }
                let block = self
                    .ctx
                    .create_block(Some(name.as_str()))
                    .map_err(|e| ParseError::Ir(e, window[0].span))?;
                function.push_block(block);
                block.parent.set(Some(function));
                blocks.insert(name.clone(), block);
            }
        }

        // Pass 2: switch to the buffered token stream and fill in each
        // block's instructions.
        self.slice = Some((tokens, 0));
        let saved_current = self.current.clone();
        let saved_peek = self.peek.clone();
        self.current = self.raw_next()?;
        self.peek = self.raw_next()?;

        let builder = Builder::new(self.ctx);
        while self.current.kind != TokenKind::Eof {
            let label_span = self.span();
            let label = self.expect_label()?;
            self.expect_punct(':')?;
            let block = *blocks.get(&label).ok_or(ParseError::UndefinedBlock { name: label, span: label_span })?;
            builder.set_insertion_point(block);
            self.parse_block_body(&builder, &blocks, &mut locals)?;
        }

        self.slice = None;
        self.current = saved_current;
        self.peek = saved_peek;
        Ok(())
    }

    fn parse_block_body(
        &mut self,
        builder: &Builder<'ctx>,
        blocks: &HashMap<String, &'ctx calir_ir::block::BasicBlock<'ctx>>,
        locals: &mut HashMap<String, ValueRef<'ctx>>,
    ) -> Result<()> {
        loop {
            if matches!(self.current.kind, TokenKind::Eof)
                || (matches!(&self.current.kind, TokenKind::Label(_)) && matches!(&self.peek.kind, TokenKind::Punct(':')))
            {
                return Ok(());
            }
            self.parse_instruction(builder, blocks, locals)?;
        }
    }

    fn resolve_local(&self, name: &str, locals: &HashMap<String, ValueRef<'ctx>>, span: Span) -> Result<ValueRef<'ctx>> {
        if let Some(v) = locals.get(name) {
            return Ok(*v);
        }
        Err(ParseError::UndefinedValue { name: name.to_string(), span })
    }

    /// `name: type`, the form every operand takes at a use site.
    fn parse_operand(
        &mut self,
        blocks: &HashMap<String, &'ctx calir_ir::block::BasicBlock<'ctx>>,
        locals: &HashMap<String, ValueRef<'ctx>>,
    ) -> Result<ValueRef<'ctx>> {
        let span = self.span();
        match self.current.kind.clone() {
            TokenKind::Local(name) => {
                self.bump()?;
                self.expect_punct(':')?;
                let ty = self.parse_type()?;
                let _ = ty;
                self.resolve_local(&name, locals, span)
            }
            TokenKind::Global(name) => {
                self.bump()?;
                self.expect_punct(':')?;
                let ty = self.parse_type()?;
                let _ = ty;
                self.resolve_global(&name, span)
            }
            TokenKind::Label(name) => {
                self.bump()?;
                let block = blocks.get(&name).copied().ok_or(ParseError::UndefinedBlock { name, span })?;
                Ok(ValueRef::Block(block))
            }
            TokenKind::Int(v) => {
                self.bump()?;
                self.expect_punct(':')?;
                let ty = self.parse_type()?;
                Ok(ValueRef::Constant(self.ctx.const_int(ty, v)))
            }
            TokenKind::Float(v) => {
                self.bump()?;
                self.expect_punct(':')?;
                let ty = self.parse_type()?;
                Ok(ValueRef::Constant(self.ctx.const_float(ty, v).expect("literal float constants are never NaN")))
            }
            TokenKind::Ident(word) if word == "undef" => {
                self.bump()?;
                self.expect_punct(':')?;
                let ty = self.parse_type()?;
                Ok(ValueRef::Constant(self.ctx.const_undef(ty)))
            }
            TokenKind::Ident(word) if word == "zeroinitializer" => {
                self.bump()?;
                self.expect_punct(':')?;
                let ty = self.parse_type()?;
                Ok(ValueRef::Constant(self.ctx.const_zeroinitializer(ty)))
            }
            other => Err(ParseError::Unexpected { expected: "an operand".into(), found: format!("{other:?}"), span }),
        }
    }

    fn parse_instruction(
        &mut self,
        builder: &Builder<'ctx>,
        blocks: &HashMap<String, &'ctx calir_ir::block::BasicBlock<'ctx>>,
        locals: &mut HashMap<String, ValueRef<'ctx>>,
    ) -> Result<()> {
        let span = self.span();

        // `%name: T = <opcode> ...` or a bare terminator with no result.
        if matches!(self.current.kind, TokenKind::Local(_)) {
            let result_name = self.expect_local()?;
            self.expect_punct(':')?;
            let declared_ty = self.parse_type()?;
            self.expect_punct('=')?;
            let word = self.expect_opcode_word()?;
            let instr = match word.as_str() {
                "add" | "sub" => {
                    let lhs = self.parse_operand(blocks, locals)?;
                    self.expect_punct(',')?;
                    let rhs = self.parse_operand(blocks, locals)?;
                    if word == "add" {
                        builder.create_add(lhs, rhs, Some(result_name.as_str()))
                    } else {
                        builder.create_sub(lhs, rhs, Some(result_name.as_str()))
                    }
                }
                "icmp" => {
                    let pred_span = self.span();
                    let pred_word = self.expect_any_ident()?;
                    let predicate = IcmpPredicate::from_mnemonic(&pred_word)
                        .ok_or(ParseError::Unexpected { expected: "an icmp predicate".into(), found: pred_word, span: pred_span })?;
                    let lhs = self.parse_operand(blocks, locals)?;
                    self.expect_punct(',')?;
                    let rhs = self.parse_operand(blocks, locals)?;
                    builder.create_icmp(predicate, lhs, rhs, Some(result_name.as_str()))
                }
                "alloca" => {
                    let ty = self.parse_type()?;
                    builder.create_alloca(ty, Some(result_name.as_str()))
                }
                "load" => {
                    let ptr = self.parse_operand(blocks, locals)?;
                    builder.create_load(ptr, Some(result_name.as_str()))
                }
                "gep" => {
                    let source_ty = self.parse_type()?;
                    let inbounds = self.eat_keyword("inbounds")?;
                    self.expect_punct(',')?;
                    let base = self.parse_operand(blocks, locals)?;
                    let mut indices = Vec::new();
                    while self.eat_punct(',')? {
                        indices.push(self.parse_operand(blocks, locals)?);
                    }
                    builder.create_gep(source_ty, base, &indices, inbounds, Some(result_name.as_str()))
                }
                "phi" => {
                    // Declared type was already consumed above; re-derive
                    // it isn't available here, so phis carry their type
                    // from the first incoming pair instead.
                    let phi = builder.create_phi(declared_ty, Some(result_name.as_str())).map_err(|e| ParseError::Ir(e, span))?;
                    loop {
                        self.expect_punct('[')?;
                        let value = self.parse_operand(blocks, locals)?;
                        self.expect_punct(',')?;
                        let block_name = self.expect_label()?;
                        self.expect_punct(']')?;
                        let incoming_block =
                            blocks.get(&block_name).copied().ok_or(ParseError::UndefinedBlock { name: block_name, span })?;
                        builder.phi_add_incoming(phi, value, incoming_block).map_err(|e| ParseError::Ir(e, span))?;
                        if !self.eat_punct(',')? {
                            break;
                        }
                    }
                    locals.insert(result_name, ValueRef::Instruction(phi));
                    return Ok(());
                }
                "call" => {
                    self.expect_punct('<')?;
                    let callee_ty = self.parse_type_or_function_sig()?;
                    self.expect_punct('>')?;
                    let _ = callee_ty;
                    let callee_span = self.span();
                    let callee_name = self.expect_global()?;
                    let callee = self.resolve_global(&callee_name, callee_span)?;
                    self.expect_punct('(')?;
                    let mut args = Vec::new();
                    if !self.check_punct(')') {
                        loop {
                            args.push(self.parse_operand(blocks, locals)?);
                            if !self.eat_punct(',')? {
                                break;
                            }
                        }
                    }
                    self.expect_punct(')')?;
                    builder.create_call(callee, &args, Some(result_name.as_str()))
                }
                other => {
                    return Err(ParseError::Unexpected { expected: "an opcode".into(), found: other.to_string(), span })
                }
            }
            .map_err(|e| ParseError::Ir(e, span))?;

            locals.insert(result_name, ValueRef::Instruction(instr));
            return Ok(());
        }

        // No-result forms: ret / br / cond_br / store.
        let word = self.expect_opcode_word()?;
        match word.as_str() {
            "ret" => {
                let value = if self.matches_operand_start() { Some(self.parse_operand(blocks, locals)?) } else { None };
                builder.create_ret(value).map_err(|e| ParseError::Ir(e, span))?;
            }
            "br" => {
                let target_span = self.span();
                let target_name = self.expect_label()?;
                let target =
                    blocks.get(&target_name).copied().ok_or(ParseError::UndefinedBlock { name: target_name, span: target_span })?;
                builder.create_br(target).map_err(|e| ParseError::Ir(e, span))?;
            }
            "cond_br" => {
                let cond = self.parse_operand(blocks, locals)?;
                self.expect_punct(',')?;
                let then_span = self.span();
                let then_name = self.expect_label()?;
                self.expect_punct(',')?;
                let else_span = self.span();
                let else_name = self.expect_label()?;
                let then_block =
                    blocks.get(&then_name).copied().ok_or(ParseError::UndefinedBlock { name: then_name, span: then_span })?;
                let else_block =
                    blocks.get(&else_name).copied().ok_or(ParseError::UndefinedBlock { name: else_name, span: else_span })?;
                builder.create_cond_br(cond, then_block, else_block).map_err(|e| ParseError::Ir(e, span))?;
            }
            "store" => {
                let value = self.parse_operand(blocks, locals)?;
                self.expect_punct(',')?;
                let ptr = self.parse_operand(blocks, locals)?;
                builder.create_store(value, ptr).map_err(|e| ParseError::Ir(e, span))?;
            }
            other => return Err(ParseError::Unexpected { expected: "an instruction".into(), found: other.to_string(), span }),
        }
        Ok(())
    }

    fn matches_operand_start(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Local(_) | TokenKind::Global(_) | TokenKind::Int(_) | TokenKind::Float(_)
        ) || matches!(&self.current.kind, TokenKind::Ident(w) if w == "undef" || w == "zeroinitializer")
    }

    fn expect_opcode_word(&mut self) -> Result<String> {
        self.expect_any_ident()
    }

    fn expect_any_ident(&mut self) -> Result<String> {
        match self.current.kind.clone() {
            TokenKind::Ident(s) => {
                self.bump()?;
                Ok(s)
            }
            other => Err(ParseError::Unexpected { expected: "an identifier".into(), found: format!("{other:?}"), span: self.span() }),
        }
    }
}
