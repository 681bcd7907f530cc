use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::class::{Class, Instance};
use crate::environment::Environment;
use crate::error::{Diagnostics, RuntimeError};
use crate::expr::{Expr, ExprVisitor, NodeId};
use crate::function::{clock, Function, NativeFunction};
use crate::stmt::{Stmt, StmtVisitor};
use crate::token::{Token, TokenKind};
use crate::value::{Callable, Value};

/// How a statement (or a block of them) finished: fell off the end
/// normally, hit a `return`, or hit a `break`. Modeled as data rather than
/// unwound with a panic or Rust's own control flow, so `Block`/`If`/`While`
/// can each decide explicitly what to do when a nested statement produces
/// anything other than `Normal` — `While` stops at `Break` but must still
/// let `Return` keep propagating outward.
#[derive(Debug, Clone)]
pub enum Flow {
    Normal,
    Return(Value),
    Break,
}

/// Walks the AST and evaluates it directly, statement by statement,
/// expression by expression — no bytecode, no separate compile step.
pub struct Interpreter {
    pub globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<NodeId, usize>,
    output: Box<dyn Write>,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter::with_output(Box::new(std::io::stdout()))
    }

    /// Builds an interpreter that writes `print` output to `output`
    /// instead of stdout, so tests can assert on program output without
    /// touching the real process streams.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        let globals = Environment::global();
        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(Rc::new(NativeFunction { name: "clock", arity: 0, func: clock })),
        );

        Interpreter { environment: Rc::clone(&globals), globals, locals: HashMap::new(), output }
    }

    /// Called by the resolver once per variable reference it manages to
    /// bind, recording how many environments out that reference's
    /// declaration lives.
    pub fn resolve(&mut self, id: NodeId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Runs a whole program top to bottom. A runtime error aborts the
    /// remaining statements and is reported through `diagnostics` rather
    /// than propagated further — by this point there is no caller left to
    /// hand a `Result` to.
    pub fn interpret(&mut self, statements: &[Stmt], diagnostics: &mut Diagnostics) {
        for statement in statements {
            if let Err(error) = self.execute(statement) {
                diagnostics.runtime_error(&error);
                return;
            }
        }
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        stmt.accept(self)
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        expr.accept(self)
    }

    /// Runs `statements` with `environment` as the active scope, restoring
    /// the previous scope on every exit path (normal, `break`, `return`, or
    /// error) rather than just the happy path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Rc<RefCell<Environment>>) -> Result<Flow, RuntimeError> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let mut result = Ok(Flow::Normal);
        for statement in statements {
            match self.execute(statement) {
                Ok(Flow::Normal) => continue,
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    fn look_up_variable(&self, id: NodeId, name: &Token) -> Result<Value, RuntimeError> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(Environment::get_at(&self.environment, distance, &name.lexeme)),
            None => self.globals.borrow().get(name),
        }
    }

    fn check_number_operand(operator: &Token, operand: &Value) -> Result<f64, RuntimeError> {
        operand.as_number().ok_or_else(|| RuntimeError::new(operator.clone(), "Operand must be a number."))
    }

    fn check_number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64), RuntimeError> {
        match (left.as_number(), right.as_number()) {
            (Some(l), Some(r)) => Ok((l, r)),
            _ => Err(RuntimeError::new(operator.clone(), "Operands must be numbers.")),
        }
    }
}

fn invoke<C: Callable>(callable: &C, interpreter: &mut Interpreter, paren: &Token, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    if arguments.len() != callable.arity() {
        return Err(RuntimeError::new(
            paren.clone(),
            format!("Expected {} arguments but got {}.", callable.arity(), arguments.len()),
        ));
    }
    callable.call(interpreter, arguments)
}

impl StmtVisitor<Result<Flow, RuntimeError>> for Interpreter {
    fn visit_block_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        let Stmt::Block(data) = stmt else { unreachable!() };
        let environment = Environment::child(&self.environment);
        self.execute_block(&data.statements, environment)
    }

    fn visit_break_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        let Stmt::Break(_) = stmt else { unreachable!() };
        Ok(Flow::Break)
    }

    fn visit_class_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        let Stmt::Class(data) = stmt else { unreachable!() };

        let superclass = match &data.superclass {
            Some(expr) => {
                let value = self.evaluate(expr)?;
                match value {
                    Value::Class(class) => Some(class),
                    _ => {
                        let Expr::Variable(v) = expr else { unreachable!() };
                        return Err(RuntimeError::new(v.name.clone(), "Superclass must be a class."));
                    }
                }
            }
            None => None,
        };

        self.environment.borrow_mut().define(&data.name.lexeme, Value::Nil);

        let method_environment = match &superclass {
            Some(superclass) => {
                let environment = Environment::child(&self.environment);
                environment.borrow_mut().define("super", Value::Class(Rc::clone(superclass)));
                environment
            }
            None => Rc::clone(&self.environment),
        };

        let methods = data
            .methods
            .iter()
            .map(|method| {
                let is_initializer = method.name.lexeme == "init";
                let function = Function::new(Rc::clone(method), Rc::clone(&method_environment), is_initializer);
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect::<HashMap<String, Rc<Function>>>();

        let class = Rc::new(Class::new(data.name.lexeme.clone(), superclass, methods));
        self.environment.borrow_mut().assign(&data.name, Value::Class(class))?;

        Ok(Flow::Normal)
    }

    fn visit_expression_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        let Stmt::Expression(data) = stmt else { unreachable!() };
        self.evaluate(&data.expr)?;
        Ok(Flow::Normal)
    }

    fn visit_function_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        let Stmt::Function(decl) = stmt else { unreachable!() };
        let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);
        self.environment.borrow_mut().define(&decl.name.lexeme, Value::Function(Rc::new(function)));
        Ok(Flow::Normal)
    }

    fn visit_if_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        let Stmt::If(data) = stmt else { unreachable!() };
        if self.evaluate(&data.condition)?.is_truthy() {
            self.execute(&data.then_branch)
        } else if let Some(else_branch) = &data.else_branch {
            self.execute(else_branch)
        } else {
            Ok(Flow::Normal)
        }
    }

    fn visit_print_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        let Stmt::Print(data) = stmt else { unreachable!() };
        let value = self.evaluate(&data.expr)?;
        writeln!(self.output, "{}", value.stringify()).expect("write to print output");
        Ok(Flow::Normal)
    }

    fn visit_return_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        let Stmt::Return(data) = stmt else { unreachable!() };
        let value = match &data.value {
            Some(expr) => self.evaluate(expr)?,
            None => Value::Nil,
        };
        Ok(Flow::Return(value))
    }

    fn visit_var_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        let Stmt::Var(data) = stmt else { unreachable!() };
        let value = match &data.initializer {
            Some(expr) => self.evaluate(expr)?,
            None => Value::Nil,
        };
        self.environment.borrow_mut().define(&data.name.lexeme, value);
        Ok(Flow::Normal)
    }

    fn visit_while_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        let Stmt::While(data) = stmt else { unreachable!() };
        while self.evaluate(&data.condition)?.is_truthy() {
            match self.execute(&data.body)? {
                Flow::Normal => {}
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
            }
        }
        Ok(Flow::Normal)
    }
}

impl ExprVisitor<Result<Value, RuntimeError>> for Interpreter {
    fn visit_assign_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let Expr::Assign(data) = expr else { unreachable!() };
        let value = self.evaluate(&data.value)?;

        match self.locals.get(&data.id) {
            Some(&distance) => Environment::assign_at(&self.environment, distance, &data.name.lexeme, value.clone()),
            None => self.globals.borrow_mut().assign(&data.name, value.clone())?,
        }

        Ok(value)
    }

    fn visit_binary_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let Expr::Binary(data) = expr else { unreachable!() };
        let left = self.evaluate(&data.left)?;
        let right = self.evaluate(&data.right)?;

        let value = match data.operator.kind {
            TokenKind::Minus => {
                let (l, r) = Interpreter::check_number_operands(&data.operator, &left, &right)?;
                Value::Number(l - r)
            }
            TokenKind::Slash => {
                let (l, r) = Interpreter::check_number_operands(&data.operator, &left, &right)?;
                Value::Number(l / r)
            }
            TokenKind::Star => {
                let (l, r) = Interpreter::check_number_operands(&data.operator, &left, &right)?;
                Value::Number(l * r)
            }
            TokenKind::Plus => match (&left, &right) {
                (Value::Number(l), Value::Number(r)) => Value::Number(l + r),
                (Value::Str(l), Value::Str(r)) => Value::from(format!("{l}{r}")),
                _ => {
                    return Err(RuntimeError::new(
                        data.operator.clone(),
                        "Operands must be two numbers or two strings.",
                    ))
                }
            },
            TokenKind::Greater => {
                let (l, r) = Interpreter::check_number_operands(&data.operator, &left, &right)?;
                Value::Bool(l > r)
            }
            TokenKind::GreaterEqual => {
                let (l, r) = Interpreter::check_number_operands(&data.operator, &left, &right)?;
                Value::Bool(l >= r)
            }
            TokenKind::Less => {
                let (l, r) = Interpreter::check_number_operands(&data.operator, &left, &right)?;
                Value::Bool(l < r)
            }
            TokenKind::LessEqual => {
                let (l, r) = Interpreter::check_number_operands(&data.operator, &left, &right)?;
                Value::Bool(l <= r)
            }
            TokenKind::BangEqual => Value::Bool(!left.is_equal(&right)),
            TokenKind::EqualEqual => Value::Bool(left.is_equal(&right)),
            _ => unreachable!("not a binary operator"),
        };

        Ok(value)
    }

    fn visit_call_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let Expr::Call(data) = expr else { unreachable!() };

        let callee = self.evaluate(&data.callee)?;

        let mut arguments = Vec::with_capacity(data.arguments.len());
        for argument in &data.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        match callee {
            Value::Function(f) => invoke(f.as_ref(), self, &data.paren, arguments),
            Value::NativeFunction(f) => invoke(f.as_ref(), self, &data.paren, arguments),
            Value::Class(c) => invoke(&c, self, &data.paren, arguments),
            _ => Err(RuntimeError::new(data.paren.clone(), "Can only call functions and classes.")),
        }
    }

    fn visit_get_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let Expr::Get(data) = expr else { unreachable!() };
        let object = self.evaluate(&data.object)?;

        match &object {
            Value::Instance(instance) => instance.borrow().get(&data.name, &object),
            _ => Err(RuntimeError::new(data.name.clone(), "Only instances have properties.")),
        }
    }

    fn visit_grouping_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let Expr::Grouping(data) = expr else { unreachable!() };
        self.evaluate(&data.expr)
    }

    fn visit_literal_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let Expr::Literal(value) = expr else { unreachable!() };
        Ok(value.clone())
    }

    fn visit_logical_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let Expr::Logical(data) = expr else { unreachable!() };
        let left = self.evaluate(&data.left)?;

        if data.operator.kind == TokenKind::Or {
            if left.is_truthy() {
                return Ok(left);
            }
        } else if !left.is_truthy() {
            return Ok(left);
        }

        self.evaluate(&data.right)
    }

    fn visit_set_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let Expr::Set(data) = expr else { unreachable!() };
        let object = self.evaluate(&data.object)?;

        let Value::Instance(instance) = object else {
            return Err(RuntimeError::new(data.name.clone(), "Only instances have fields."));
        };

        let value = self.evaluate(&data.value)?;
        instance.borrow_mut().set(&data.name, value.clone());
        Ok(value)
    }

    fn visit_super_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let Expr::Super(data) = expr else { unreachable!() };

        let distance = *self.locals.get(&data.id).expect("resolver always binds 'super'");
        let Value::Class(superclass) = Environment::get_at(&self.environment, distance, "super") else {
            unreachable!("'super' slot holds a non-class value")
        };
        let instance = Environment::get_at(&self.environment, distance - 1, "this");

        let method = superclass.find_method(&data.method.lexeme).ok_or_else(|| {
            RuntimeError::new(data.method.clone(), format!("Undefined property '{}'.", data.method.lexeme))
        })?;

        Ok(Value::Function(Rc::new(method.bind(instance))))
    }

    fn visit_this_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let Expr::This(data) = expr else { unreachable!() };
        self.look_up_variable(data.id, &data.keyword)
    }

    fn visit_unary_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let Expr::Unary(data) = expr else { unreachable!() };
        let right = self.evaluate(&data.expr)?;

        let value = match data.operator.kind {
            TokenKind::Minus => Value::Number(-Interpreter::check_number_operand(&data.operator, &right)?),
            TokenKind::Bang => Value::Bool(!right.is_truthy()),
            _ => unreachable!("not a unary operator"),
        };

        Ok(value)
    }

    fn visit_variable_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let Expr::Variable(data) = expr else { unreachable!() };
        self.look_up_variable(data.id, &data.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;

    fn run(source: &str) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
        let statements = Parser::new(tokens).parse(&mut diagnostics);

        let mut interpreter = Interpreter::with_output(Box::new(Vec::new()));
        Resolver::new(&mut interpreter, &mut diagnostics).resolve(&statements);

        if !diagnostics.had_error() {
            interpreter.interpret(&statements, &mut diagnostics);
        }

        diagnostics
    }

    #[test]
    fn arithmetic_respects_precedence() {
        let diagnostics = run("var x = 1 + 2 * 3; if (x != 7) { print \"wrong\"; }");
        assert!(!diagnostics.had_error() && !diagnostics.had_runtime_error());
    }

    #[test]
    fn adding_number_and_string_is_a_runtime_error() {
        let diagnostics = run("print 1 + \"a\";");
        assert!(diagnostics.had_runtime_error());
    }

    #[test]
    fn closures_capture_their_declaration_environment() {
        let diagnostics = run(
            "fun makeCounter() { var i = 0; fun inc() { i = i + 1; return i; } return inc; }\n\
             var counter = makeCounter();\n\
             if (counter() != 1) { print \"fail\"; }\n\
             if (counter() != 2) { print \"fail\"; }",
        );
        assert!(!diagnostics.had_runtime_error());
    }

    #[test]
    fn initializer_implicitly_returns_this() {
        let diagnostics = run(
            "class Box { init(x) { this.x = x; } }\n\
             var b = Box(5);\n\
             if (b.x != 5) { print \"fail\"; }",
        );
        assert!(!diagnostics.had_runtime_error());
    }

    #[test]
    fn inheritance_resolves_super_methods() {
        let diagnostics = run(
            "class A { greet() { return \"A\"; } }\n\
             class B < A { greet() { return super.greet() + \"B\"; } }\n\
             if (B().greet() != \"AB\") { print \"fail\"; }",
        );
        assert!(!diagnostics.had_runtime_error());
    }

    #[test]
    fn break_exits_enclosing_loop_only() {
        let diagnostics = run(
            "var count = 0;\n\
             while (true) {\n\
               count = count + 1;\n\
               if (count == 3) break;\n\
             }\n\
             if (count != 3) { print \"fail\"; }",
        );
        assert!(!diagnostics.had_runtime_error());
    }

    #[test]
    fn undefined_variable_is_a_runtime_error() {
        let diagnostics = run("print undeclared;");
        assert!(diagnostics.had_runtime_error());
    }
}
