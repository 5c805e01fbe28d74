use anyhow::{
    Result,
    bail,
};
use std::{
    cell::Cell,
    collections::HashMap,
    rc::Rc,
};
use crate::{
    ast::*,
    builtins,
    config::Config,
    error::RuntimeError,
    parser::Parser,
    trampoline::{
        Bounce,
        Invoke,
        trampoline,
    },
    value::{
        Function,
        Native,
        NativeFn,
        Scope,
        Value,
    },
};


pub type Outcome = Bounce<Value, Value>;


enum Flow {
    Next,
    Return(Outcome),
}

struct DepthGuard<'i>(&'i Interpreter);
impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.depth.set(self.0.depth.get() - 1);
    }
}


/// Owns the global namespace and evaluates code registered into it.
pub struct Interpreter {
    globals: HashMap<String, Value>,
    config: Config,
    depth: Cell<usize>,
    peak_depth: Cell<usize>,
}
impl Default for Interpreter {
    fn default()->Self {
        Self::new()
    }
}
// public methods
impl Interpreter {
    pub fn new()->Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config)->Self {
        let mut interp = Interpreter {
            globals: HashMap::new(),
            config,
            depth: Cell::new(0),
            peak_depth: Cell::new(0),
        };
        builtins::install(&mut interp);

        return interp;
    }

    pub fn config(&self)->&Config {
        &self.config
    }

    pub fn get(&self, name: &str)->Option<&Value> {
        self.globals.get(name)
    }

    pub fn add_native(&mut self, name: &'static str, func: NativeFn) {
        self.register(name, Value::Native(Native {name, func}));
    }

    /// Deepest invocation nesting seen so far.
    pub fn peak_depth(&self)->usize {
        self.peak_depth.get()
    }

    pub fn reset_peak_depth(&self) {
        self.peak_depth.set(self.depth.get());
    }

    /// The start thunk for `expr`. A top-level call is invoked but not settled, so whatever it
    /// bounces to is left for the trampoline.
    pub fn entry(&self, expr: &Expr)->Result<Outcome> {
        let frame = Scope::default();
        match expr {
            Expr::Call{callee,args}=>{
                let callee = self.eval(&frame, callee)?;
                let args = self.eval_args(&frame, args)?;

                self.invoke(callee, args)
            },
            _=>self.eval(&frame, expr).map(Bounce::Done),
        }
    }

    pub fn run(&self, expr: &Expr)->Result<Value> {
        trampoline(self, ||self.entry(expr))
    }

    pub fn run_source(&self, source: &str)->Result<Value> {
        let expr = Parser::new_from_source(source).parse_entry()?;

        return self.run(&expr);
    }

    /// Calls the global `name` through the trampoline.
    pub fn call(&self, name: &str, args: Vec<Value>)->Result<Value> {
        let Some(callee) = self.get(name).cloned() else {
            bail!("No function named `{name}`");
        };

        return trampoline(self, move||self.invoke(callee, args));
    }
}
// crate-internal
impl Interpreter {
    pub(crate) fn register(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    /// Turns a definition into a callable. Parameter defaults are evaluated in `enclosing`, or in
    /// an empty scope for a top-level definition.
    pub(crate) fn materialize(&self, def: FunctionDef, enclosing: Option<&Rc<Scope>>)->Result<Function> {
        let empty = Scope::default();
        let frame = enclosing.map_or(&empty, |s|&**s);

        let FunctionDef{name,params,body} = def;

        let mut seen_default = false;
        let mut out_params = Vec::with_capacity(params.len());
        for Param{name:param,default} in params {
            let default = match default {
                Some(expr)=>{
                    seen_default = true;
                    Some(self.eval(frame, &expr)?)
                },
                None if seen_default=>bail!("Parameter `{param}` of `{name}` needs a default"),
                None=>None,
            };
            out_params.push((param, default));
        }

        return Ok(Function {
            name,
            params: out_params,
            body,
            captured: enclosing.cloned(),
        });
    }
}
// execution
impl Interpreter {
    fn enter(&self)->Result<DepthGuard<'_>> {
        let depth = self.depth.get();
        if depth >= self.config.max_depth {
            return Err(RuntimeError::DepthExceeded {limit: self.config.max_depth}.into());
        }
        self.depth.set(depth + 1);
        self.peak_depth.set(self.peak_depth.get().max(depth + 1));

        return Ok(DepthGuard(self));
    }

    fn invoke_function(&self, func: &Rc<Function>, args: Vec<Value>)->Result<Outcome> {
        let _guard = self.enter()?;

        let frame = Rc::new(Scope::new(self.bind(func, args)?, func.captured.clone()));
        match self.exec_block(&frame, &func.body)? {
            Flow::Return(out)=>Ok(out),
            Flow::Next=>Ok(Bounce::Done(Value::None)),
        }
    }

    fn bind(&self, func: &Rc<Function>, args: Vec<Value>)->Result<HashMap<String, Value>> {
        if args.len() > func.params.len() {
            bail!("`{}` takes at most {} argument(s) but got {}", func.name, func.params.len(), args.len());
        }

        let mut vars = HashMap::with_capacity(func.params.len() + 1);
        vars.insert(func.name.clone(), Value::Function(func.clone()));

        let mut args = args.into_iter();
        for (name, default) in &func.params {
            let value = match (args.next(), default) {
                (Some(value), _)=>value,
                (None, Some(default))=>default.clone(),
                (None, None)=>bail!("`{}` is missing argument `{name}`", func.name),
            };
            vars.insert(name.clone(), value);
        }

        return Ok(vars);
    }

    fn exec_block(&self, frame: &Rc<Scope>, stmts: &[Stmt])->Result<Flow> {
        for stmt in stmts {
            if let Flow::Return(out) = self.exec(frame, stmt)? {
                return Ok(Flow::Return(out));
            }
        }

        return Ok(Flow::Next);
    }

    fn exec(&self, frame: &Rc<Scope>, stmt: &Stmt)->Result<Flow> {
        match stmt {
            Stmt::Return(None)=>Ok(Flow::Return(Bounce::Done(Value::None))),
            Stmt::Return(Some(Expr::Continue{callee,args}))=>{
                let callee = self.eval(frame, callee)?;
                let args = self.eval_args(frame, args)?;

                Ok(Flow::Return(Bounce::call(callee, args)))
            },
            Stmt::Return(Some(expr))=>self.eval(frame, expr)
                .map(|v|Flow::Return(Bounce::Done(v))),
            Stmt::If{cond,then,otherwise}=>{
                if self.eval(frame, cond)?.truthy() {
                    self.exec(frame, then)
                } else if let Some(otherwise) = otherwise {
                    self.exec(frame, otherwise)
                } else {
                    Ok(Flow::Next)
                }
            },
            Stmt::Block(stmts)=>self.exec_block(frame, stmts),
            Stmt::Set(name,expr)=>{
                let value = self.eval(frame, expr)?;
                frame.set(name.clone(), value);

                Ok(Flow::Next)
            },
            Stmt::Def(def)=>{
                let func = self.materialize(def.clone(), Some(frame))?;
                frame.set(def.name.clone(), Value::Function(Rc::new(func)));

                Ok(Flow::Next)
            },
            Stmt::Expr(expr)=>{
                self.eval(frame, expr)?;

                Ok(Flow::Next)
            },
        }
    }

    fn eval(&self, frame: &Scope, expr: &Expr)->Result<Value> {
        match expr {
            Expr::Literal(lit)=>Ok(lit.into()),
            Expr::Name(name)=>self.lookup(frame, name),
            Expr::List(items)=>self.eval_args(frame, items).map(Value::from),
            Expr::Call{callee,args}=>{
                let callee = self.eval(frame, callee)?;
                let args = self.eval_args(frame, args)?;
                let out = self.invoke(callee, args)?;

                self.settle(out)
            },
            Expr::Binary{op,lhs,rhs}=>{
                let lhs = self.eval(frame, lhs)?;
                let rhs = self.eval(frame, rhs)?;

                binary(*op, lhs, rhs)
            },
            Expr::Unary{op,operand}=>match (op, self.eval(frame, operand)?) {
                (UnaryOp::Not, v)=>Ok(Value::Bool(!v.truthy())),
                (UnaryOp::Neg, Value::Number(n))=>n.checked_neg()
                    .map(Value::Number)
                    .ok_or_else(||RuntimeError::Overflow {op: "-"}.into()),
                (UnaryOp::Neg, v)=>bail!("Cannot negate a {}", v.type_name()),
            },
            Expr::Logical{op,lhs,rhs}=>{
                let lhs = self.eval(frame, lhs)?;
                match (op, lhs.truthy()) {
                    (LogicOp::And, false)|(LogicOp::Or, true)=>Ok(lhs),
                    _=>self.eval(frame, rhs),
                }
            },
            Expr::Cond{test,then,otherwise}=>{
                if self.eval(frame, test)?.truthy() {
                    self.eval(frame, then)
                } else {
                    self.eval(frame, otherwise)
                }
            },
            Expr::Spread(_)=>bail!("`..` can only appear in an argument list or list literal"),
            Expr::Continue{..}=>bail!("A continuation record can only be built as the value of a `return`"),
        }
    }

    fn eval_args(&self, frame: &Scope, args: &[Expr])->Result<Vec<Value>> {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Expr::Spread(list)=>match self.eval(frame, list)? {
                    Value::List(items)=>out.extend(items.iter().cloned()),
                    other=>bail!("Cannot spread a {}", other.type_name()),
                },
                _=>out.push(self.eval(frame, arg)?),
            }
        }

        return Ok(out);
    }

    fn lookup(&self, frame: &Scope, name: &str)->Result<Value> {
        if let Some(data) = frame.get(name) {
            return Ok(data);
        }
        if let Some(data) = self.globals.get(name) {
            return Ok(data.clone());
        }

        bail!("No variable with the name `{name}`");
    }

    /// Drives an eager call to a plain value. A call in non-tail position still nests here.
    fn settle(&self, out: Outcome)->Result<Value> {
        match out {
            Bounce::Done(value)=>Ok(value),
            bounce=>trampoline(self, move||Ok(bounce)),
        }
    }
}

impl Invoke for Interpreter {
    type Callee = Value;
    type Value = Value;

    fn invoke(&self, callee: Value, args: Vec<Value>)->Result<Outcome> {
        match callee {
            Value::Native(native)=>(native.func)(self, args).map(Bounce::Done),
            Value::Function(func)=>self.invoke_function(&func, args),
            other=>bail!("A {} is not callable: `{other}`", other.type_name()),
        }
    }

    fn bounce_budget(&self)->Option<u64> {
        self.config.max_bounces
    }
}


fn binary(op: BinOp, lhs: Value, rhs: Value)->Result<Value> {
    match (op, lhs, rhs) {
        (BinOp::Eq, l, r)=>Ok(Value::Bool(l == r)),
        (BinOp::NotEq, l, r)=>Ok(Value::Bool(l != r)),
        (BinOp::Add, Value::String(a), Value::String(b))=>Ok(Value::String(format!("{a}{b}").into())),
        (BinOp::Add, Value::List(a), Value::List(b))=>Ok(Value::List(a.iter().chain(b.iter()).cloned().collect())),
        (op, Value::Number(a), Value::Number(b))=>arith(op, a, b),
        (op, l, r)=>bail!("Cannot apply `{}` to a {} and a {}", op.symbol(), l.type_name(), r.type_name()),
    }
}

fn arith(op: BinOp, a: i64, b: i64)->Result<Value> {
    let checked = |res: Option<i64>|->Result<Value> {
        match res {
            Some(n)=>Ok(Value::Number(n)),
            None=>Err(RuntimeError::Overflow {op: op.symbol()}.into()),
        }
    };

    match op {
        BinOp::Add=>checked(a.checked_add(b)),
        BinOp::Sub=>checked(a.checked_sub(b)),
        BinOp::Mul=>checked(a.checked_mul(b)),
        BinOp::Div|BinOp::Rem if b == 0=>Err(RuntimeError::DivisionByZero.into()),
        BinOp::Div=>checked(a.checked_div(b)),
        BinOp::Rem=>checked(a.checked_rem(b)),
        BinOp::Eq=>Ok(Value::Bool(a == b)),
        BinOp::NotEq=>Ok(Value::Bool(a != b)),
        BinOp::Less=>Ok(Value::Bool(a < b)),
        BinOp::LessEq=>Ok(Value::Bool(a <= b)),
        BinOp::Greater=>Ok(Value::Bool(a > b)),
        BinOp::GreaterEq=>Ok(Value::Bool(a >= b)),
    }
}
