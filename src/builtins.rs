use anyhow::{
    Result,
    bail,
};
use crate::{
    interp::Interpreter,
    value::Value,
};


pub fn install(root: &mut Interpreter) {
    root.add_native("println", println_native);
    root.add_native("len", len);
    root.add_native("first", first);
    root.add_native("rest", rest);
    root.add_native("append", append);
}

fn println_native(_: &Interpreter, args: Vec<Value>)->Result<Value> {
    let line = args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    println!("{line}");

    return Ok(Value::None);
}

fn len(_: &Interpreter, args: Vec<Value>)->Result<Value> {
    let n = match one_arg("len", args)? {
        Value::List(items)=>items.len(),
        Value::String(s)=>s.chars().count(),
        v=>bail!("`len` expects a list or string, but got a {}", v.type_name()),
    };

    return Ok(Value::Number(n as i64));
}

fn first(_: &Interpreter, args: Vec<Value>)->Result<Value> {
    match one_arg("first", args)? {
        Value::List(items)=>match items.first() {
            Some(item)=>Ok(item.clone()),
            None=>bail!("`first` of an empty list"),
        },
        v=>bail!("`first` expects a list, but got a {}", v.type_name()),
    }
}

fn rest(_: &Interpreter, args: Vec<Value>)->Result<Value> {
    match one_arg("rest", args)? {
        Value::List(items)=>match items.split_first() {
            Some((_, tail))=>Ok(Value::List(tail.into())),
            None=>bail!("`rest` of an empty list"),
        },
        v=>bail!("`rest` expects a list, but got a {}", v.type_name()),
    }
}

fn append(_: &Interpreter, args: Vec<Value>)->Result<Value> {
    let mut args_iter = args.into_iter();
    let Some(Value::List(items)) = args_iter.next() else {
        bail!("Expected a list for the first argument of `append`");
    };

    let mut out = items.to_vec();
    out.extend(args_iter);

    return Ok(out.into());
}

fn one_arg(name: &str, args: Vec<Value>)->Result<Value> {
    let mut args_iter = args.into_iter();
    match (args_iter.next(), args_iter.next()) {
        (Some(arg), None)=>Ok(arg),
        _=>bail!("Expected 1 arg for `{name}`"),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[i64])->Value {
        items.iter().map(|n|Value::Number(*n)).collect::<Vec<_>>().into()
    }

    #[test]
    fn list_helpers() {
        let root = Interpreter::new();

        assert_eq!(len(&root, vec![list(&[1, 2, 3])]).unwrap(), Value::Number(3));
        assert_eq!(first(&root, vec![list(&[1, 2, 3])]).unwrap(), Value::Number(1));
        assert_eq!(rest(&root, vec![list(&[1, 2, 3])]).unwrap(), list(&[2, 3]));
        assert_eq!(append(&root, vec![list(&[1]), Value::Number(2), Value::Number(3)]).unwrap(), list(&[1, 2, 3]));
    }

    #[test]
    fn helpers_check_their_args() {
        let root = Interpreter::new();

        assert!(first(&root, vec![list(&[])]).is_err());
        assert!(rest(&root, vec![Value::None]).is_err());
        assert!(len(&root, vec![]).is_err());
        assert!(len(&root, vec![list(&[]), list(&[])]).is_err());
        assert!(append(&root, vec![Value::Number(1)]).is_err());
    }
}
