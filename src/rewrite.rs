//! Tail call rewriting.
//!
//! A call is in tail position only when it is the *entire* value of a `return`. Such a
//! return is rewritten to build a continuation record (`Expr::Continue`) instead of calling.
//! Anything else, including calls buried in operators or conditionals, stays eager.
//!
//! Traversal enters `if` branches and `begin` blocks. A nested `def` is rewritten as a
//! function of its own, so each `return` is attributed to its innermost definition.

use crate::{
    ast::*,
    error::RewriteError,
};


pub fn rewrite_function(def: FunctionDef)->Result<FunctionDef, RewriteError> {
    let FunctionDef{name,params,body} = def;

    let mut rewritten = 0;
    let body = body.into_iter()
        .map(|stmt|rewrite_stmt(stmt, &name, &mut rewritten))
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("rewrote {rewritten} tail call(s) in `{name}`");

    return Ok(FunctionDef {name, params, body});
}

fn rewrite_stmt(stmt: Stmt, function: &str, rewritten: &mut usize)->Result<Stmt, RewriteError> {
    match stmt {
        Stmt::Return(Some(Expr::Call{callee,args}))=>{
            if args.iter().any(|arg|matches!(arg, Expr::Spread(_))) {
                return Err(RewriteError::VariadicForwarding {
                    function: function.to_string(),
                });
            }
            *rewritten += 1;

            Ok(Stmt::Return(Some(Expr::Continue {callee, args})))
        },
        Stmt::If{cond,then,otherwise}=>Ok(Stmt::If {
            cond,
            then: Box::new(rewrite_stmt(*then, function, rewritten)?),
            otherwise: match otherwise {
                Some(stmt)=>Some(Box::new(rewrite_stmt(*stmt, function, rewritten)?)),
                None=>None,
            },
        }),
        Stmt::Block(stmts)=>stmts.into_iter()
            .map(|stmt|rewrite_stmt(stmt, function, rewritten))
            .collect::<Result<Vec<_>, _>>()
            .map(Stmt::Block),
        Stmt::Def(inner)=>rewrite_function(inner).map(Stmt::Def),
        other=>Ok(other),
    }
}
