//! The canonical IR text format: a lexer, a recursive-descent parser that
//! builds IR directly against a [`calir_ir::Context`], and the error type
//! both report through.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use error::{ParseError, Result};
pub use parser::parse_module;

#[cfg(test)]
mod tests {
    use super::*;
    use calir_ir::Context;

    #[test]
    fn parses_minimal_module() {
        let ctx = Context::new();
        let module = parse_module(&ctx, r#"module = "m""#).unwrap();
        assert_eq!(module.name, "m");
        assert!(module.functions().is_empty());
        assert!(module.globals().is_empty());
    }

    #[test]
    fn parses_declaration_and_definition() {
        let ctx = Context::new();
        let src = r#"
            module = "m"

            declare i32 @puts(%s: i32)

            define i32 @add(%a: i32, %b: i32) {
            $entry:
                %sum: i32 = add %a: i32, %b: i32
                ret %sum: i32
            }
        "#;
        let module = parse_module(&ctx, src).unwrap();
        let puts = module.find_function("puts").unwrap();
        assert!(puts.is_declaration());
        assert_eq!(puts.arguments().len(), 1);
        assert!(puts.arguments()[0].base.name().is_none());

        let add = module.find_function("add").unwrap();
        assert!(add.is_definition());
        assert_eq!(add.blocks().len(), 1);
        let entry = add.blocks()[0];
        assert_eq!(entry.instructions().len(), 2);
    }

    #[test]
    fn parses_branching_function_with_forward_reference() {
        let ctx = Context::new();
        let src = r#"
            module = "m"

            define i32 @choose(%c: i1, %a: i32, %b: i32) {
            $entry:
                cond_br %c: i1, $then, $else
            $then:
                br $join
            $else:
                br $join
            $join:
                %r: i32 = phi [ %a: i32, $then ], [ %b: i32, $else ]
                ret %r: i32
            }
        "#;
        let module = parse_module(&ctx, src).unwrap();
        let f = module.find_function("choose").unwrap();
        assert_eq!(f.blocks().len(), 4);
    }

    #[test]
    fn parses_named_struct_and_global() {
        let ctx = Context::new();
        let src = r#"
            module = "m"
            %Pair = type { i32, i32 }
            @zero = global %Pair zeroinitializer
        "#;
        let module = parse_module(&ctx, src).unwrap();
        assert!(ctx.lookup_named_struct("Pair").is_some());
        let g = module.find_global("zero").unwrap();
        assert!(g.initializer.is_none());
    }

    #[test]
    fn reports_undefined_block_reference() {
        let ctx = Context::new();
        let src = r#"
            module = "m"
            define void @f() {
            $entry:
                br $nowhere
            }
        "#;
        assert!(matches!(parse_module(&ctx, src), Err(ParseError::UndefinedBlock { .. })));
    }

    #[test]
    fn parses_alloca_store_load() {
        let ctx = Context::new();
        let src = r#"
            module = "m"
            define i32 @f() {
            $entry:
                %p: <i32> = alloca i32
                store 7: i32, %p: <i32>
                %v: i32 = load %p: <i32>
                ret %v: i32
            }
        "#;
        let module = parse_module(&ctx, src).unwrap();
        let f = module.find_function("f").unwrap();
        assert_eq!(f.blocks()[0].instructions().len(), 4);
    }
}
