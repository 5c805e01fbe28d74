//! The trampoline driver.
//!
//! A rewritten function never performs its tail call itself. It hands back a
//! [`Bounce::Continue`] naming the callee and its evaluated arguments, and the loop in
//! [`trampoline`] performs the call from its own frame. Nothing here knows about syntax
//! trees; anything implementing [`Invoke`] can be driven.

use anyhow::Result;
use crate::error::RuntimeError;


/// "Call `callee` with `args` next" in place of a return value.
#[derive(Debug, Clone, PartialEq)]
pub struct Continuation<C, V> {
    pub callee: C,
    pub args: Vec<V>,
}

/// The result of one invocation. The variant is the marker: no `V` can be mistaken for a
/// continuation.
#[derive(Debug, Clone, PartialEq)]
pub enum Bounce<C, V> {
    Done(V),
    Continue(Continuation<C, V>),
}
impl<C, V> Bounce<C, V> {
    pub fn call(callee: C, args: Vec<V>)->Self {
        Self::Continue(Continuation {callee, args})
    }
}


pub trait Invoke {
    type Callee;
    type Value;

    fn invoke(&self, callee: Self::Callee, args: Vec<Self::Value>)->Result<Bounce<Self::Callee, Self::Value>>;

    /// Maximum number of continuations a single run may follow. `None` is unbounded.
    fn bounce_budget(&self)->Option<u64> {
        None
    }
}


/// Runs `start`, then keeps invoking returned continuations until a plain value comes back.
///
/// Errors from `start` or any invocation are returned as-is.
pub fn trampoline<I, F>(invoker: &I, start: F)->Result<I::Value>
where
    I: Invoke + ?Sized,
    F: FnOnce()->Result<Bounce<I::Callee, I::Value>>,
{
    let budget = invoker.bounce_budget();
    let mut bounces = 0u64;
    let mut value = start()?;

    loop {
        match value {
            Bounce::Done(v)=>return Ok(v),
            Bounce::Continue(Continuation{callee,args})=>{
                if let Some(limit) = budget {
                    if bounces >= limit {
                        return Err(RuntimeError::BounceBudgetExhausted {limit}.into());
                    }
                }
                bounces += 1;
                log::trace!("bounce #{bounces} with {} args", args.len());

                value = invoker.invoke(callee, args)?;
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use anyhow::bail;
    use std::cell::Cell;
    use super::*;

    /// Callees are step names; values are plain numbers.
    #[derive(Default)]
    struct Countdown {
        calls: Cell<u64>,
        budget: Option<u64>,
    }
    impl Invoke for Countdown {
        type Callee = &'static str;
        type Value = i64;

        fn invoke(&self, callee: &'static str, args: Vec<i64>)->Result<Bounce<&'static str, i64>> {
            self.calls.set(self.calls.get() + 1);
            match (callee, args.as_slice()) {
                ("down", [0, acc])=>Ok(Bounce::Done(*acc)),
                ("down", [n, acc])=>Ok(Bounce::call("down", vec![n - 1, acc + n])),
                ("fail", _)=>bail!("failed on purpose"),
                _=>bail!("bad call"),
            }
        }

        fn bounce_budget(&self)->Option<u64> {
            self.budget
        }
    }

    #[test]
    fn plain_value_needs_one_invocation() {
        let invoker = Countdown::default();
        let starts = Cell::new(0);

        let out = trampoline(&invoker, ||{
            starts.set(starts.get() + 1);
            Ok(Bounce::Done(7))
        }).unwrap();

        assert_eq!(out, 7);
        assert_eq!(starts.get(), 1);
        assert_eq!(invoker.calls.get(), 0);
    }

    #[test]
    fn follows_a_long_chain() {
        let invoker = Countdown::default();

        let out = trampoline(&invoker, ||Ok(Bounce::call("down", vec![1_000_000, 0]))).unwrap();

        assert_eq!(out, 500_000_500_000);
        assert_eq!(invoker.calls.get(), 1_000_001);
    }

    #[test]
    fn errors_propagate_unchanged() {
        let invoker = Countdown::default();

        let err = trampoline(&invoker, ||Ok(Bounce::call("fail", vec![]))).unwrap_err();

        assert_eq!(err.to_string(), "failed on purpose");
        assert!(err.downcast_ref::<RuntimeError>().is_none());
    }

    #[test]
    fn start_errors_propagate() {
        let invoker = Countdown::default();

        let res = trampoline(&invoker, ||->Result<Bounce<&'static str, i64>> {bail!("no start")});

        assert!(res.is_err());
        assert_eq!(invoker.calls.get(), 0);
    }

    #[test]
    fn budget_stops_the_loop() {
        let invoker = Countdown {budget: Some(10), ..Default::default()};

        let err = trampoline(&invoker, ||Ok(Bounce::call("down", vec![100, 0]))).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<RuntimeError>(),
            Some(RuntimeError::BounceBudgetExhausted {limit: 10}),
        ));
        assert_eq!(invoker.calls.get(), 10);
    }

    #[test]
    fn budget_allows_exactly_enough_bounces() {
        let invoker = Countdown {budget: Some(4), ..Default::default()};

        let out = trampoline(&invoker, ||Ok(Bounce::call("down", vec![3, 0]))).unwrap();

        assert_eq!(out, 6);
    }
}
