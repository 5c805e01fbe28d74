//! Installs definitions into an [`Interpreter`]'s namespace.
//!
//! Every step runs over the whole unit before anything is registered, so a unit either lands
//! completely or not at all. Globals resolve when called, which is what lets mutually tail
//! recursive functions be transformed in any order.

use std::rc::Rc;
use crate::{
    ast::FunctionDef,
    error::TransformError,
    interp::Interpreter,
    parser::Parser,
    rewrite::rewrite_function,
    value::Value,
};


impl Interpreter {
    /// Parses `source`, rewrites tail calls in every definition and registers the results.
    pub fn transform(&mut self, source: &str)->Result<Vec<String>, TransformError> {
        self.install(source, true)
    }

    /// Like [`Interpreter::transform`] but registers the definitions as written.
    pub fn define(&mut self, source: &str)->Result<Vec<String>, TransformError> {
        self.install(source, false)
    }

    /// Rewrites and registers a definition that was built without the parser.
    pub fn transform_definition(&mut self, def: FunctionDef)->Result<String, TransformError> {
        let def = rewrite_function(def)?;
        let name = def.name.clone();
        self.register_all(vec![def])?;

        return Ok(name);
    }

    fn install(&mut self, source: &str, rewrite: bool)->Result<Vec<String>, TransformError> {
        let defs = Parser::new_from_source(source)
            .parse_definitions()
            .map_err(TransformError::Parse)?;

        let defs = if rewrite {
            defs.into_iter()
                .map(rewrite_function)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            defs
        };

        return self.register_all(defs);
    }

    fn register_all(&mut self, defs: Vec<FunctionDef>)->Result<Vec<String>, TransformError> {
        let mut functions = Vec::with_capacity(defs.len());
        for def in defs {
            let function = def.name.clone();
            let func = self.materialize(def, None)
                .map_err(|error|TransformError::Materialize {function, error})?;
            functions.push(func);
        }

        let mut names = Vec::with_capacity(functions.len());
        for func in functions {
            log::debug!("registering `{}`", func.name);
            names.push(func.name.clone());
            self.register(func.name.clone(), Value::Function(Rc::new(func)));
        }

        return Ok(names);
    }
}


#[cfg(test)]
mod tests {
    use crate::{
        ast::*,
        error::RewriteError,
    };
    use super::*;

    #[test]
    fn parse_error_registers_nothing() {
        let mut root = Interpreter::new();

        let err = root.transform("(def ok [n] (return n)) (def broken [n] (return n)").unwrap_err();

        assert!(matches!(err, TransformError::Parse(_)));
        assert!(root.get("ok").is_none());
        assert!(root.get("broken").is_none());
    }

    #[test]
    fn rewrite_error_registers_nothing() {
        let mut root = Interpreter::new();

        let err = root.transform("
            (def ok [n] (return (ok n)))
            (def forward [xs] (return (ok ..xs)))
        ").unwrap_err();

        assert!(matches!(err, TransformError::Rewrite(RewriteError::VariadicForwarding{..})));
        assert!(root.get("ok").is_none());
        assert!(root.get("forward").is_none());
    }

    #[test]
    fn define_keeps_spread_tail_calls() {
        let mut root = Interpreter::new();

        root.define("(def forward [xs] (return (append ..xs)))").unwrap();

        assert!(root.get("forward").is_some());
    }

    #[test]
    fn bad_default_registers_nothing() {
        let mut root = Interpreter::new();

        let err = root.transform("
            (def ok [n] (return n))
            (def bad [(n missing)] (return n))
        ").unwrap_err();

        assert!(matches!(err, TransformError::Materialize{ref function, ..} if function == "bad"));
        assert!(root.get("ok").is_none());
    }

    #[test]
    fn returns_names_in_order() {
        let mut root = Interpreter::new();

        let names = root.transform("(def b [] (return 1)) (def a [] (return 2))").unwrap();

        assert_eq!(names, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn prebuilt_definitions_are_rewritten() {
        let mut root = Interpreter::new();
        let def = FunctionDef {
            name: "count".into(),
            params: vec![
                Param {name: "n".into(), default: None},
            ],
            body: vec![
                Stmt::If {
                    cond: Expr::Binary {
                        op: BinOp::Eq,
                        lhs: Box::new(Expr::name("n")),
                        rhs: Box::new(Expr::number(0)),
                    },
                    then: Box::new(Stmt::Return(Some(Expr::Literal(Literal::String("done".into()))))),
                    otherwise: None,
                },
                Stmt::Return(Some(Expr::call(Expr::name("count"), vec![Expr::Binary {
                    op: BinOp::Sub,
                    lhs: Box::new(Expr::name("n")),
                    rhs: Box::new(Expr::number(1)),
                }]))),
            ],
        };

        assert_eq!(root.transform_definition(def).unwrap(), "count");
        assert_eq!(root.call("count", vec![Value::Number(100_000)]).unwrap(), Value::from("done"));
    }

    #[test]
    fn prebuilt_default_order_is_checked() {
        let mut root = Interpreter::new();
        let def = FunctionDef {
            name: "f".into(),
            params: vec![
                Param {name: "a".into(), default: Some(Expr::number(1))},
                Param {name: "b".into(), default: None},
            ],
            body: vec![Stmt::Return(None)],
        };

        assert!(root.transform_definition(def).is_err());
        assert!(root.get("f").is_none());
    }
}
