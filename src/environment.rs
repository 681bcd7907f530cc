use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;

/// A single lexical scope: an insertion-indexed name→value map plus a
/// link to its enclosing scope. The global environment has `enclosing =
/// None`; every block, function call, and class body pushes a fresh one.
#[derive(Debug)]
pub struct Environment {
    pub enclosing: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, Value>,
}

impl Environment {
    pub fn new(enclosing: Option<Rc<RefCell<Environment>>>) -> Self {
        Environment { enclosing, values: HashMap::new() }
    }

    pub fn global() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::new(None)))
    }

    pub fn child(enclosing: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::new(Some(Rc::clone(enclosing)))))
    }

    /// Unconditional insert into this scope. Re-declaring a name in the
    /// same scope (shadowing) is allowed at runtime — the resolver is the
    /// one that rejects it statically within a single block.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow().get(name);
        }

        Err(RuntimeError::new(name.clone(), format!("Undefined variable '{}'.", name.lexeme)))
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            return Ok(());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }

        Err(RuntimeError::new(name.clone(), format!("Undefined variable '{}'.", name.lexeme)))
    }

    /// Follows `enclosing` exactly `distance` times. The resolver
    /// guarantees `distance` is always valid for a resolved reference, so
    /// this panics rather than returning a `Result` on an inconsistency —
    /// that would indicate a resolver bug, not a user error.
    fn ancestor(start: &Rc<RefCell<Environment>>, distance: usize) -> Rc<RefCell<Environment>> {
        let mut environment = Rc::clone(start);
        for _ in 0..distance {
            let parent = environment
                .borrow()
                .enclosing
                .clone()
                .expect("resolver-computed distance exceeds the environment chain");
            environment = parent;
        }
        environment
    }

    pub fn get_at(this: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Value {
        let target = Environment::ancestor(this, distance);
        let value = target
            .borrow()
            .values
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("resolver-bound name '{name}' missing at resolved depth"));
        value
    }

    pub fn assign_at(this: &Rc<RefCell<Environment>>, distance: usize, name: &str, value: Value) {
        let target = Environment::ancestor(this, distance);
        target.borrow_mut().values.insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn ident(name: &str) -> Token {
        Token::new(TokenKind::Identifier, name, None, 1)
    }

    #[test]
    fn define_and_get_in_same_scope() {
        let env = Environment::global();
        env.borrow_mut().define("a", Value::Number(1.0));
        assert_eq!(env.borrow().get(&ident("a")).unwrap().is_equal(&Value::Number(1.0)), true);
    }

    #[test]
    fn get_walks_enclosing_chain() {
        let global = Environment::global();
        global.borrow_mut().define("a", Value::Number(1.0));
        let child = Environment::child(&global);
        assert!(child.borrow().get(&ident("a")).is_ok());
    }

    #[test]
    fn get_undefined_is_runtime_error() {
        let env = Environment::global();
        assert!(env.borrow().get(&ident("missing")).is_err());
    }

    #[test]
    fn assign_at_writes_through_ancestor_without_walking() {
        let global = Environment::global();
        global.borrow_mut().define("a", Value::Number(1.0));
        let child = Environment::child(&global);
        Environment::assign_at(&child, 1, "a", Value::Number(2.0));
        let value = Environment::get_at(&child, 1, "a");
        assert!(value.is_equal(&Value::Number(2.0)));
    }
}
