use anyhow::Result;
use std::{
    cell::RefCell,
    collections::HashMap,
    fmt::{
        self,
        Debug,
        Display,
        Formatter,
    },
    rc::Rc,
};
use crate::{
    ast::{
        Literal,
        Stmt,
    },
    interp::Interpreter,
};


pub type NativeFn = fn(&Interpreter, Vec<Value>)->Result<Value>;


#[derive(Debug, Clone)]
pub enum Value {
    Number(i64),
    Bool(bool),
    String(Rc<str>),
    List(Rc<[Value]>),
    Function(Rc<Function>),
    Native(Native),
    None,
}
impl Value {
    pub fn truthy(&self)->bool {
        match self {
            Self::Bool(b)=>*b,
            Self::None=>false,
            Self::Number(n)=>*n != 0,
            Self::String(s)=>!s.is_empty(),
            Self::List(items)=>!items.is_empty(),
            Self::Function(_)|Self::Native(_)=>true,
        }
    }

    pub fn type_name(&self)->&'static str {
        match self {
            Self::Number(_)=>"number",
            Self::Bool(_)=>"bool",
            Self::String(_)=>"string",
            Self::List(_)=>"list",
            Self::Function(_)=>"function",
            Self::Native(_)=>"native function",
            Self::None=>"none",
        }
    }
}
impl PartialEq for Value {
    fn eq(&self, other: &Self)->bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b))=>a == b,
            (Self::Bool(a), Self::Bool(b))=>a == b,
            (Self::String(a), Self::String(b))=>a == b,
            (Self::List(a), Self::List(b))=>a == b,
            (Self::Function(a), Self::Function(b))=>Rc::ptr_eq(a, b),
            (Self::Native(a), Self::Native(b))=>a.name == b.name,
            (Self::None, Self::None)=>true,
            _=>false,
        }
    }
}
impl From<i64> for Value {
    fn from(n: i64)->Self {Self::Number(n)}
}
impl From<bool> for Value {
    fn from(b: bool)->Self {Self::Bool(b)}
}
impl From<&str> for Value {
    fn from(s: &str)->Self {Self::String(s.into())}
}
impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>)->Self {Self::List(items.into())}
}
impl From<&Literal> for Value {
    fn from(lit: &Literal)->Self {
        match lit {
            Literal::Number(n)=>Self::Number(*n),
            Literal::String(s)=>Self::String(s.as_str().into()),
            Literal::Bool(b)=>Self::Bool(*b),
            Literal::None=>Self::None,
        }
    }
}
impl Display for Value {
    fn fmt(&self, f: &mut Formatter)->fmt::Result {
        match self {
            Self::Number(n)=>write!(f, "{n}"),
            Self::Bool(true)=>write!(f, "#t"),
            Self::Bool(false)=>write!(f, "#f"),
            Self::String(s)=>write!(f, "{s}"),
            Self::List(items)=>{
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            },
            Self::Function(func)=>write!(f, "<fn {}>", func.name),
            Self::Native(native)=>write!(f, "<native {}>", native.name),
            Self::None=>write!(f, "#n"),
        }
    }
}


/// A materialized function definition. Defaults are already evaluated.
pub struct Function {
    pub name: String,
    pub params: Vec<(String, Option<Value>)>,
    pub body: Vec<Stmt>,
    /// Scope of the enclosing call when this was defined by a nested `def`.
    pub captured: Option<Rc<Scope>>,
}
impl Debug for Function {
    fn fmt(&self, f: &mut Formatter)->fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params.iter().map(|(n,_)|n).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}


#[derive(Clone, Copy)]
pub struct Native {
    pub name: &'static str,
    pub func: NativeFn,
}
impl Debug for Native {
    fn fmt(&self, f: &mut Formatter)->fmt::Result {
        write!(f, "Native({})", self.name)
    }
}


/// Locals of one call, chained to the scope its function was defined in. Nested functions hold
/// the scope itself, so names bound after the `def` are visible to them.
#[derive(Default)]
pub struct Scope {
    vars: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Scope>>,
}
impl Scope {
    pub fn new(vars: HashMap<String, Value>, parent: Option<Rc<Scope>>)->Self {
        Scope {
            vars: RefCell::new(vars),
            parent,
        }
    }

    pub fn get(&self, name: &str)->Option<Value> {
        let mut scope = Some(self);
        while let Some(s) = scope {
            if let Some(data) = s.vars.borrow().get(name) {
                return Some(data.clone());
            }
            scope = s.parent.as_deref();
        }

        return None;
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.vars.borrow_mut().insert(name.into(), value);
    }
}
