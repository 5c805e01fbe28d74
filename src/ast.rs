use std::fmt::{
    self,
    Display,
    Formatter,
};


#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(i64),
    String(String),
    Bool(bool),
    None,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}
impl BinOp {
    pub fn from_symbol(sym: &str)->Option<Self> {
        let op = match sym {
            "+"=>Self::Add,
            "-"=>Self::Sub,
            "*"=>Self::Mul,
            "/"=>Self::Div,
            "%"=>Self::Rem,
            "=="=>Self::Eq,
            "!="=>Self::NotEq,
            "<"=>Self::Less,
            "<="=>Self::LessEq,
            ">"=>Self::Greater,
            ">="=>Self::GreaterEq,
            _=>return None,
        };

        return Some(op);
    }

    pub fn symbol(&self)->&'static str {
        match self {
            Self::Add=>"+",
            Self::Sub=>"-",
            Self::Mul=>"*",
            Self::Div=>"/",
            Self::Rem=>"%",
            Self::Eq=>"==",
            Self::NotEq=>"!=",
            Self::Less=>"<",
            Self::LessEq=>"<=",
            Self::Greater=>">",
            Self::GreaterEq=>">=",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Name(String),
    List(Vec<Self>),
    Call {
        callee: Box<Self>,
        args: Vec<Self>,
    },

    Binary {
        op: BinOp,
        lhs: Box<Self>,
        rhs: Box<Self>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Self>,
    },
    /// Short-circuiting `and`/`or`.
    Logical {
        op: LogicOp,
        lhs: Box<Self>,
        rhs: Box<Self>,
    },
    Cond {
        test: Box<Self>,
        then: Box<Self>,
        otherwise: Box<Self>,
    },

    /// `..xs` inside an argument or list literal. Splices the list's items in place.
    Spread(Box<Self>),

    /// Builds a continuation record instead of calling `callee`. Only the tail call rewriter
    /// produces this, and only as the whole value of a `return`.
    Continue {
        callee: Box<Self>,
        args: Vec<Self>,
    },
}
impl Expr {
    pub fn call(callee: Self, args: Vec<Self>)->Self {
        Self::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn name(name: impl Into<String>)->Self {
        Self::Name(name.into())
    }

    pub fn number(n: i64)->Self {
        Self::Literal(Literal::Number(n))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Return(Option<Expr>),
    If {
        cond: Expr,
        then: Box<Self>,
        otherwise: Option<Box<Self>>,
    },
    Block(Vec<Self>),
    /// Setting a var also defines it if it isn't already defined.
    Set(String, Expr),
    Def(FunctionDef),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}


impl Display for Literal {
    fn fmt(&self, f: &mut Formatter)->fmt::Result {
        match self {
            Self::Number(n) if *n < 0=>write!(f, "(- {})", n.unsigned_abs()),
            Self::Number(n)=>write!(f, "{n}"),
            Self::String(s)=>write!(f, "\"{s}\""),
            Self::Bool(true)=>write!(f, "#t"),
            Self::Bool(false)=>write!(f, "#f"),
            Self::None=>write!(f, "#n"),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter)->fmt::Result {
        match self {
            Self::Literal(lit)=>write!(f, "{lit}"),
            Self::Name(name)=>write!(f, "{name}"),
            Self::List(items)=>{
                write!(f, "[")?;
                write_spaced(f, items)?;
                write!(f, "]")
            },
            Self::Call{callee,args}=>{
                write!(f, "({callee}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            },
            Self::Binary{op,lhs,rhs}=>write!(f, "({} {lhs} {rhs})", op.symbol()),
            Self::Unary{op:UnaryOp::Neg,operand}=>write!(f, "(- {operand})"),
            Self::Unary{op:UnaryOp::Not,operand}=>write!(f, "(not {operand})"),
            Self::Logical{op:LogicOp::And,lhs,rhs}=>write!(f, "(and {lhs} {rhs})"),
            Self::Logical{op:LogicOp::Or,lhs,rhs}=>write!(f, "(or {lhs} {rhs})"),
            Self::Cond{test,then,otherwise}=>write!(f, "(if {test} {then} {otherwise})"),
            Self::Spread(list)=>write!(f, "..{list}"),
            // not parseable; only shows up when printing rewritten trees
            Self::Continue{callee,args}=>{
                write!(f, "(bounce {callee}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            },
        }
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter)->fmt::Result {
        match self {
            Self::Return(None)=>write!(f, "(return)"),
            Self::Return(Some(expr))=>write!(f, "(return {expr})"),
            Self::If{cond,then,otherwise:None}=>write!(f, "(if {cond} {then})"),
            Self::If{cond,then,otherwise:Some(otherwise)}=>write!(f, "(if {cond} {then} {otherwise})"),
            Self::Block(stmts)=>{
                write!(f, "(begin")?;
                for stmt in stmts {
                    write!(f, " {stmt}")?;
                }
                write!(f, ")")
            },
            Self::Set(name,expr)=>write!(f, "(set {name} {expr})"),
            Self::Def(def)=>write!(f, "{def}"),
            Self::Expr(expr)=>write!(f, "{expr}"),
        }
    }
}

impl Display for FunctionDef {
    fn fmt(&self, f: &mut Formatter)->fmt::Result {
        write!(f, "(def {} [", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match &param.default {
                Some(default)=>write!(f, "({} {default})", param.name)?,
                None=>write!(f, "{}", param.name)?,
            }
        }
        write!(f, "]")?;
        for stmt in &self.body {
            write!(f, " {stmt}")?;
        }
        write!(f, ")")
    }
}

fn write_spaced(f: &mut Formatter, items: &[Expr])->fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{item}")?;
    }

    return Ok(());
}
