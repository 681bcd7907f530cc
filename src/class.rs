use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::function::Function;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::{Callable, Value};

/// A class: a name, an optional superclass link, and its own methods
/// (not including inherited ones — lookup walks the superclass chain).
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    pub methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(name: String, superclass: Option<Rc<Class>>, methods: HashMap<String, Rc<Function>>) -> Self {
        Class { name, superclass, methods }
    }

    /// Finds a method by name, walking the superclass chain. Returns the
    /// *unbound* method — callers bind it to an instance themselves.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass.as_ref().and_then(|superclass| superclass.find_method(name))
    }
}

impl Callable for Rc<Class> {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(self))));

        if let Some(initializer) = self.find_method("init") {
            initializer.bind(Value::Instance(Rc::clone(&instance))).call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }

    fn arity(&self) -> usize {
        self.find_method("init").map(|init| init.arity()).unwrap_or(0)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

/// An instance of a class: the class it belongs to plus its own field
/// map. Fields need no prior declaration — `set` always succeeds.
pub struct Instance {
    pub class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance { class, fields: HashMap::new() }
    }

    pub fn get(&self, name: &Token, instance: &Value) -> Result<Value, RuntimeError> {
        if let Some(field) = self.fields.get(&name.lexeme) {
            return Ok(field.clone());
        }

        if let Some(method) = self.class.find_method(&name.lexeme) {
            return Ok(Value::Function(Rc::new(method.bind(instance.clone()))));
        }

        Err(RuntimeError::new(name.clone(), format!("Undefined property '{}'.", name.lexeme)))
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<instance {}>", self.class.name)
    }
}
