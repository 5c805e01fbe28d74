use anyhow::{
    Result,
    bail,
};
use logos::Logos;
use parser_helper::{
    SimpleError,
    LookaheadLexer,
    LogosTokenStream,
    Token as TokenTrait,
    new_parser,
};
use crate::ast::*;

pub use StartOrEnd::*;


#[derive(Debug, Logos, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]|;[^\n]*")]
pub enum Token<'a> {
    #[regex("[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident(&'a str),

    #[regex("[0-9][0-9_]*")]
    Number(&'a str),

    #[regex("#[a-zA-Z]+", |l|{&l.slice()[1..]})]
    HashLit(&'a str),

    #[regex("\"[^\"]*\"")]
    String(&'a str),

    #[regex("[-+*/%<>]|==|!=|<=|>=")]
    Op(&'a str),

    #[token("..")]
    Spread,

    #[token("(", |_|Start)]
    #[token(")", |_|End)]
    Paren(StartOrEnd),

    #[token("[", |_|Start)]
    #[token("]", |_|End)]
    Square(StartOrEnd),

    EOF,
}
impl<'a> TokenTrait for Token<'a> {
    fn eof()->Self {Self::EOF}
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum StartOrEnd {
    Start,
    End,
}


new_parser!(pub struct Parser<'a, 2, Token<'a>, LogosTokenStream<'a, Token<'a>>>);
// public methods
impl<'a> Parser<'a> {
    pub fn new_from_source(source: &'a str)->Parser<'a> {
        Parser::new(
            Token::lexer(source),
            (),
        )
    }

    /// Parses a unit of top-level function definitions.
    pub fn parse_definitions(&mut self)->Result<Vec<FunctionDef>> {
        let mut out = Vec::new();
        while self.peek() != &Token::EOF {
            if self.peek1() != &Token::Ident("def") {
                bail!(self.error("Expected a top-level `def`"));
            }
            out.push(self.parse_def()?);
        }

        return Ok(out);
    }

    /// Parses exactly one expression, e.g. `(factorial 5)`.
    pub fn parse_entry(&mut self)->Result<Expr> {
        let expr = self.parse_expr()?;
        if self.peek() != &Token::EOF {
            bail!(self.error("Expected end of input after the entry expression"));
        }

        return Ok(expr);
    }

    pub fn parse_stmt(&mut self)->Result<Stmt> {
        if self.peek() != &Token::Paren(Start) {
            return self.parse_expr().map(Stmt::Expr);
        }

        match self.peek1().clone() {
            Token::Ident("def")=>self.parse_def().map(Stmt::Def),
            Token::Ident("return")=>self.parse_return(),
            Token::Ident("if")=>self.parse_if_stmt(),
            Token::Ident("begin")=>self.parse_begin(),
            Token::Ident("set")=>self.parse_set(),
            _=>self.parse_expr().map(Stmt::Expr),
        }
    }

    pub fn parse_expr(&mut self)->Result<Expr> {
        match self.peek() {
            Token::Paren(Start)=>match self.peek1().clone() {
                Token::Ident("if")=>self.parse_cond(),
                Token::Ident("not")=>self.parse_not(),
                Token::Ident("and")=>self.parse_logical("and", LogicOp::And),
                Token::Ident("or")=>self.parse_logical("or", LogicOp::Or),
                Token::Ident(kw@("def"|"return"|"begin"|"set"))=>{
                    bail!(self.error(format!("`{kw}` is a statement and cannot be used as an expression")));
                },
                Token::Op(sym)=>self.parse_op(sym),
                _=>self.parse_call(),
            },
            Token::Square(Start)=>self.parse_list(),
            _=>self.parse_lit(),
        }
    }
}
// statements
impl<'a> Parser<'a> {
    fn parse_def(&mut self)->Result<FunctionDef> {
        self.paren_start()?;
        self.match_ident("def")?;

        let name = self.ident()?.to_string();

        self.match_token(Token::Square(Start), "Expected `[`")?;
        let mut params: Vec<Param> = Vec::new();
        loop {
            let param = match self.next() {
                Token::Ident(n)=>Param {
                    name: n.to_string(),
                    default: None,
                },
                Token::Paren(Start)=>{
                    let name = self.ident()?.to_string();
                    let default = self.parse_expr()?;
                    self.paren_end()?;

                    Param {name, default: Some(default)}
                },
                Token::Square(End)=>break,
                t=>bail!(self.error(format!("Unexpected token in parameter list: `{t:?}`"))),
            };

            if params.iter().any(|p|p.name == param.name) {
                bail!(self.error(format!("Duplicate parameter `{}` in `{name}`", param.name)));
            }
            if param.default.is_none() && params.iter().any(|p|p.default.is_some()) {
                bail!(self.error(format!("Parameter `{}` without a default follows one with a default", param.name)));
            }
            params.push(param);
        }

        let body = self.parse_stmt_list()?;

        return Ok(FunctionDef {name, params, body});
    }

    fn parse_return(&mut self)->Result<Stmt> {
        self.paren_start()?;
        self.match_ident("return")?;

        if self.try_paren_end() {
            return Ok(Stmt::Return(None));
        }

        let value = self.parse_expr()?;
        self.paren_end()?;

        return Ok(Stmt::Return(Some(value)));
    }

    fn parse_if_stmt(&mut self)->Result<Stmt> {
        self.paren_start()?;
        self.match_ident("if")?;

        let cond = self.parse_expr()?;
        let then = self.parse_stmt().map(Box::new)?;

        let mut otherwise = None;
        match self.peek() {
            Token::Paren(End)=>self.paren_end()?,
            _=>{
                otherwise = Some(self.parse_stmt().map(Box::new)?);
                self.paren_end()?;
            },
        }

        return Ok(Stmt::If {cond, then, otherwise});
    }

    fn parse_begin(&mut self)->Result<Stmt> {
        self.paren_start()?;
        self.match_ident("begin")?;

        return self.parse_stmt_list().map(Stmt::Block);
    }

    fn parse_set(&mut self)->Result<Stmt> {
        self.paren_start()?;
        self.match_ident("set")?;

        let lhs = self.ident()?.to_string();

        let data = self.parse_expr()?;
        self.paren_end()?;

        return Ok(Stmt::Set(lhs, data));
    }

    fn parse_stmt_list(&mut self)->Result<Vec<Stmt>> {
        let mut out = Vec::new();

        while !self.try_paren_end() {
            out.push(self.parse_stmt()?);
        }

        return Ok(out);
    }
}
// expressions
impl<'a> Parser<'a> {
    fn parse_cond(&mut self)->Result<Expr> {
        self.paren_start()?;
        self.match_ident("if")?;

        let test = self.parse_expr().map(Box::new)?;
        let then = self.parse_expr().map(Box::new)?;
        let otherwise = self.parse_expr().map(Box::new)?;
        self.paren_end()?;

        return Ok(Expr::Cond {test, then, otherwise});
    }

    fn parse_not(&mut self)->Result<Expr> {
        self.paren_start()?;
        self.match_ident("not")?;

        let operand = self.parse_expr().map(Box::new)?;
        self.paren_end()?;

        return Ok(Expr::Unary {op: UnaryOp::Not, operand});
    }

    fn parse_logical(&mut self, word: &str, op: LogicOp)->Result<Expr> {
        self.paren_start()?;
        self.match_ident(word)?;

        let lhs = self.parse_expr().map(Box::new)?;
        let rhs = self.parse_expr().map(Box::new)?;
        self.paren_end()?;

        return Ok(Expr::Logical {op, lhs, rhs});
    }

    fn parse_op(&mut self, sym: &str)->Result<Expr> {
        self.paren_start()?;
        self.next();

        let Some(op) = BinOp::from_symbol(sym) else {
            bail!(self.error(format!("Unknown operator `{sym}`")));
        };

        // `(- 5)` is the literal -5, which also covers `i64::MIN`
        if op == BinOp::Sub && self.peek1() == &Token::Paren(End) {
            if let Token::Number(n) = self.peek().clone() {
                self.next();
                self.next();
                return self.number(&format!("-{n}")).map(Expr::number);
            }
        }

        let lhs = self.parse_expr().map(Box::new)?;
        if op == BinOp::Sub && self.try_paren_end() {
            return Ok(Expr::Unary {op: UnaryOp::Neg, operand: lhs});
        }
        let rhs = self.parse_expr().map(Box::new)?;
        self.paren_end()?;

        return Ok(Expr::Binary {op, lhs, rhs});
    }

    fn parse_call(&mut self)->Result<Expr> {
        self.paren_start()?;
        let callee = self.parse_expr().map(Box::new)?;

        let args = self.parse_args(|p|p.try_paren_end())?;

        return Ok(Expr::Call {callee, args});
    }

    fn parse_list(&mut self)->Result<Expr> {
        self.match_token(Token::Square(Start), "Expected `[`")?;

        return self.parse_args(|p|p.try_square_end()).map(Expr::List);
    }

    /// Parses arguments, including `..` spreads, until `at_end` consumes the closing token.
    fn parse_args(&mut self, at_end: fn(&mut Self)->bool)->Result<Vec<Expr>> {
        let mut out = Vec::new();

        while !at_end(self) {
            if self.peek() == &Token::Spread {
                self.next();
                out.push(Expr::Spread(self.parse_expr().map(Box::new)?));
            } else {
                out.push(self.parse_expr()?);
            }
        }

        return Ok(out);
    }

    fn parse_lit(&mut self)->Result<Expr> {
        match self.next() {
            Token::HashLit(lit)=>match lit {
                "t"=>Ok(Expr::Literal(Literal::Bool(true))),
                "f"=>Ok(Expr::Literal(Literal::Bool(false))),
                "n"=>Ok(Expr::Literal(Literal::None)),
                _=>bail!(self.error(format!("Unknown literal: `#{lit}`"))),
            },
            Token::String(s)=>{
                let len = s.len();
                Ok(Expr::Literal(Literal::String(s[1..len - 1].to_string())))
            },
            Token::Number(n)=>self.number(n).map(Expr::number),
            Token::Ident(name)=>Ok(Expr::name(name)),
            t=>bail!(self.error(format!("Unexpected token: {t:?}"))),
        }
    }
}
// private helpers
impl<'a> Parser<'a> {
    fn number(&mut self, digits: &str)->Result<i64> {
        match digits.replace('_', "").parse::<i64>() {
            Ok(n)=>Ok(n),
            Err(_)=>bail!(self.error(format!("Integer overflow in literal `{digits}`"))),
        }
    }

    #[inline]
    fn match_token<M: Into<String>>(&mut self, tok: Token<'a>, msg: M)->Result<()> {
        self.0.match_token(tok, msg)?;
        return Ok(())
    }

    #[inline]
    fn peek(&mut self)->&Token<'a> {
        self.lookahead(0)
    }

    fn peek1(&mut self)->&Token<'a> {
        self.lookahead(1)
    }

    #[inline]
    fn next(&mut self)->Token<'a> {
        self.take_token()
    }

    #[inline]
    fn error(&mut self, msg: impl Into<String>)->SimpleError<String> {
        self.0.error(msg)
    }

    fn ident(&mut self)->Result<&'a str> {
        match self.take_token() {
            Token::Ident(s)=>Ok(s),
            _=>bail!(self.error("Expected identifier")),
        }
    }

    fn match_ident(&mut self, to_match: &str)->Result<()> {
        match self.take_token() {
            Token::Ident(s)=>if s != to_match {
                bail!(self.error(format!("Expected identifier `{}`, but got `{}`", to_match, s)));
            } else {
                Ok(())
            },
            _=>bail!(self.error("Expected identifier")),
        }
    }

    fn paren_start(&mut self)->Result<()> {
        match self.take_token() {
            Token::Paren(Start)=>Ok(()),
            _=>bail!(self.error("Expected `(`")),
        }
    }

    fn paren_end(&mut self)->Result<()> {
        match self.take_token() {
            Token::Paren(End)=>Ok(()),
            Token::EOF=>bail!(self.error("Unexpected end of input, expected `)`")),
            _=>bail!(self.error("Expected `)`")),
        }
    }

    fn try_paren_end(&mut self)->bool {
        match self.peek() {
            Token::Paren(End)=>{
                self.take_token();
                true
            },
            _=>false,
        }
    }

    fn try_square_end(&mut self)->bool {
        match self.peek() {
            Token::Square(End)=>{
                self.take_token();
                true
            },
            _=>false,
        }
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    fn parse_one(source: &str)->FunctionDef {
        let mut defs = Parser::new_from_source(source).parse_definitions().unwrap();
        assert_eq!(defs.len(), 1);
        defs.pop().unwrap()
    }

    #[test]
    fn parses_factorial() {
        let def = parse_one("
            ; accumulator style
            (def factorial [n (acc 1)]
              (if (== n 1) (return acc))
              (return (factorial (- n 1) (* n acc))))
        ");

        assert_eq!(def.name, "factorial");
        assert_eq!(def.params, vec![
            Param {name: "n".into(), default: None},
            Param {name: "acc".into(), default: Some(Expr::number(1))},
        ]);
        assert_eq!(def.body.len(), 2);
        assert_eq!(def.body[1], Stmt::Return(Some(Expr::call(
            Expr::name("factorial"),
            vec![
                Expr::Binary {
                    op: BinOp::Sub,
                    lhs: Box::new(Expr::name("n")),
                    rhs: Box::new(Expr::number(1)),
                },
                Expr::Binary {
                    op: BinOp::Mul,
                    lhs: Box::new(Expr::name("n")),
                    rhs: Box::new(Expr::name("acc")),
                },
            ],
        ))));
    }

    #[test]
    fn printing_round_trips() {
        let source = "
            (def walk [xs (total 0) (label \"sum\")]
              (def helper [x] (return (- x)))
              (set n (len xs))
              (if (not (or (== n 0) #f))
                (begin (println label) (return (walk (rest xs) (+ total (first xs)))))
                (return (if (and #t #n) total [total ..xs])))
              (return))
        ";
        let def = parse_one(source);
        let printed = def.to_string();

        assert_eq!(parse_one(&printed), def);
    }

    #[test]
    fn neg_and_sub_are_distinguished() {
        let expr = Parser::new_from_source("(- (- x) 2)").parse_entry().unwrap();

        assert_eq!(expr, Expr::Binary {
            op: BinOp::Sub,
            lhs: Box::new(Expr::Unary {op: UnaryOp::Neg, operand: Box::new(Expr::name("x"))}),
            rhs: Box::new(Expr::number(2)),
        });
    }

    #[test]
    fn negative_literals_round_trip() {
        for n in [-1, -1_000_000_007, i64::MIN] {
            let def = FunctionDef {
                name: "f".into(),
                params: vec![
                    Param {name: "a".into(), default: Some(Expr::number(n))},
                ],
                body: vec![Stmt::Return(Some(Expr::number(n)))],
            };
            let printed = def.to_string();

            assert_eq!(parse_one(&printed), def, "printed as {printed}");
        }

        assert_eq!(Parser::new_from_source("(- 5)").parse_entry().unwrap(), Expr::number(-5));
        assert!(Parser::new_from_source("(- 9223372036854775809)").parse_entry().is_err());
    }

    #[test]
    fn bad_param_and_literal_errors_carry_a_span() {
        let errs = [
            Parser::new_from_source("(def f [1] (return 1))").parse_definitions().unwrap_err(),
            Parser::new_from_source("(def f [] (return #x))").parse_definitions().unwrap_err(),
        ];

        for err in errs {
            assert!(err.downcast_ref::<SimpleError<String>>().is_some(), "got {err}");
        }
    }

    #[test]
    fn rejects_top_level_expressions() {
        assert!(Parser::new_from_source("(factorial 5)").parse_definitions().is_err());
    }

    #[test]
    fn rejects_bad_params() {
        assert!(Parser::new_from_source("(def f [a a] (return a))").parse_definitions().is_err());
        assert!(Parser::new_from_source("(def f [(a 1) b] (return a))").parse_definitions().is_err());
    }

    #[test]
    fn rejects_unclosed_def() {
        assert!(Parser::new_from_source("(def f [n] (return n)").parse_definitions().is_err());
    }

    #[test]
    fn rejects_statement_in_expression_position() {
        assert!(Parser::new_from_source("(f (return 1))").parse_entry().is_err());
    }

    #[test]
    fn rejects_trailing_input_after_entry() {
        assert!(Parser::new_from_source("(f 1) (g 2)").parse_entry().is_err());
    }
}
