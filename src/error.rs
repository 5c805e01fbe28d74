use thiserror::Error;


#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("`{function}` forwards a spread argument list in a tail call, which cannot be rewritten")]
    VariadicForwarding {
        function: String,
    },
}

/// Nothing is registered when any of these is returned.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("parse error: {0}")]
    Parse(anyhow::Error),
    #[error("{0}")]
    Rewrite(#[from] RewriteError),
    #[error("could not materialize `{function}`: {error}")]
    Materialize {
        function: String,
        error: anyhow::Error,
    },
}

/// Runtime failures with a fixed shape. Everything else is an ad-hoc `anyhow` error.
#[derive(Error, Debug, PartialEq)]
pub enum RuntimeError {
    #[error("call depth exceeded the limit of {limit}")]
    DepthExceeded {
        limit: usize,
    },
    #[error("gave up after {limit} bounces")]
    BounceBudgetExhausted {
        limit: u64,
    },
    #[error("integer overflow in `{op}`")]
    Overflow {
        op: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,
}
