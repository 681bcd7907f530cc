use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{Flow, Interpreter};
use crate::stmt::FunctionDecl;
use crate::value::{Callable, Value};

/// A user-defined function or method: its declaration plus the
/// environment active at the point it was declared (its closure). This
/// environment must stay alive as long as the function value does —
/// `Rc` gives us that for free.
#[derive(Clone)]
pub struct Function {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Rc<RefCell<Environment>>, is_initializer: bool) -> Self {
        Function { declaration, closure, is_initializer }
    }

    /// Produces a new function identical to this one except its closure
    /// additionally defines `this` as `instance`. The original function
    /// value (the unbound method stored on the class) is never mutated —
    /// every instance gets its own one-slot extension of the same
    /// underlying closure.
    pub fn bind(&self, instance: Value) -> Function {
        let environment = Environment::child(&self.closure);
        environment.borrow_mut().define("this", instance);
        Function::new(Rc::clone(&self.declaration), environment, self.is_initializer)
    }
}

impl Callable for Function {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        let environment = Environment::child(&self.closure);
        for (param, argument) in self.declaration.params.iter().zip(arguments.into_iter()) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        let flow = interpreter.execute_block(&self.declaration.body, environment)?;

        if self.is_initializer {
            return Ok(Environment::get_at(&self.closure, 0, "this"));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Nil),
        }
    }

    fn arity(&self) -> usize {
        self.declaration.params.len()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.declaration.name.lexeme)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.declaration.name.lexeme)
    }
}

/// The interpreter's one bundled builtin: `clock`, arity 0, returning
/// wall-clock seconds since the Unix epoch as a number.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&mut Interpreter, Vec<Value>) -> Result<Value, RuntimeError>,
}

impl Callable for NativeFunction {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        (self.func)(interpreter, arguments)
    }

    fn arity(&self) -> usize {
        self.arity
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn>")
    }
}

pub fn clock(_interpreter: &mut Interpreter, _arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();

    Ok(Value::Number(now))
}
