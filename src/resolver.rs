use std::collections::HashMap;
use std::mem;

use crate::error::Diagnostics;
use crate::expr::{Expr, ExprVisitor};
use crate::interpreter::Interpreter;
use crate::stmt::{Stmt, StmtVisitor};
use crate::token::Token;

#[derive(PartialEq, Clone, Copy)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(PartialEq, Clone, Copy)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Static pass between parsing and evaluation: for every variable
/// reference, counts how many scopes out the declaration sits and stashes
/// that count in the interpreter's side-table, keyed by the expression's
/// [`crate::expr::NodeId`]. This lets the interpreter jump straight to the
/// right environment instead of re-searching the chain by name at every
/// access, and keeps a name resolving the same way regardless of what gets
/// defined in an enclosing scope after the reference runs, which matters
/// once closures are involved.
///
/// Also the only place that rejects `return`/`this`/`super`/`break` used
/// outside the context they require, and a class inheriting from itself —
/// none of that depends on a runtime value, so there's no reason to wait
/// until evaluation to catch it.
pub struct Resolver<'a, 'b> {
    interpreter: &'a mut Interpreter,
    diagnostics: &'b mut Diagnostics,
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
    loop_depth: usize,
}

impl<'a, 'b> Resolver<'a, 'b> {
    pub fn new(interpreter: &'a mut Interpreter, diagnostics: &'b mut Diagnostics) -> Self {
        Resolver {
            interpreter,
            diagnostics,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            loop_depth: 0,
        }
    }

    pub fn resolve(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        stmt.accept(self);
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        expr.accept(self);
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else { return };
        if scope.contains_key(&name.lexeme) {
            self.diagnostics.token_error(name, "Already a variable with this name in this scope.");
        }
        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn resolve_local(&mut self, id: u32, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.interpreter.resolve(id, depth);
                return;
            }
        }
        // Not found in any enclosing scope: treated as global, looked up by name at runtime.
    }

    fn resolve_function(&mut self, params: &[Token], body: &[Stmt], kind: FunctionType) {
        let enclosing_function = mem::replace(&mut self.current_function, kind);
        let enclosing_loop = mem::replace(&mut self.loop_depth, 0);

        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(param);
        }
        self.resolve(body);
        self.end_scope();

        self.current_function = enclosing_function;
        self.loop_depth = enclosing_loop;
    }
}

impl<'a, 'b> StmtVisitor<()> for Resolver<'a, 'b> {
    fn visit_block_stmt(&mut self, stmt: &Stmt) {
        let Stmt::Block(data) = stmt else { unreachable!() };
        self.begin_scope();
        self.resolve(&data.statements);
        self.end_scope();
    }

    fn visit_break_stmt(&mut self, stmt: &Stmt) {
        let Stmt::Break(data) = stmt else { unreachable!() };
        if self.loop_depth == 0 {
            self.diagnostics.token_error(&data.keyword, "Can't use 'break' outside of a loop.");
        }
    }

    fn visit_class_stmt(&mut self, stmt: &Stmt) {
        let Stmt::Class(data) = stmt else { unreachable!() };

        let enclosing_class = mem::replace(&mut self.current_class, ClassType::Class);

        self.declare(&data.name);
        self.define(&data.name);

        if let Some(superclass @ Expr::Variable(sc)) = &data.superclass {
            if sc.name.lexeme == data.name.lexeme {
                self.diagnostics.token_error(&sc.name, "A class can't inherit from itself.");
            }
            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.scopes.last_mut().unwrap().insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes.last_mut().unwrap().insert("this".to_string(), true);

        for method in &data.methods {
            let kind = if method.name.lexeme == "init" { FunctionType::Initializer } else { FunctionType::Method };
            self.resolve_function(&method.params, &method.body, kind);
        }

        self.end_scope();

        if data.superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn visit_expression_stmt(&mut self, stmt: &Stmt) {
        let Stmt::Expression(data) = stmt else { unreachable!() };
        self.resolve_expr(&data.expr);
    }

    fn visit_function_stmt(&mut self, stmt: &Stmt) {
        let Stmt::Function(decl) = stmt else { unreachable!() };
        self.declare(&decl.name);
        self.define(&decl.name);
        self.resolve_function(&decl.params, &decl.body, FunctionType::Function);
    }

    fn visit_if_stmt(&mut self, stmt: &Stmt) {
        let Stmt::If(data) = stmt else { unreachable!() };
        self.resolve_expr(&data.condition);
        self.resolve_stmt(&data.then_branch);
        if let Some(else_branch) = &data.else_branch {
            self.resolve_stmt(else_branch);
        }
    }

    fn visit_print_stmt(&mut self, stmt: &Stmt) {
        let Stmt::Print(data) = stmt else { unreachable!() };
        self.resolve_expr(&data.expr);
    }

    fn visit_return_stmt(&mut self, stmt: &Stmt) {
        let Stmt::Return(data) = stmt else { unreachable!() };
        if self.current_function == FunctionType::None {
            self.diagnostics.token_error(&data.keyword, "Can't return from top-level code.");
        }
        if let Some(value) = &data.value {
            if self.current_function == FunctionType::Initializer {
                self.diagnostics.token_error(&data.keyword, "Can't return a value from an initializer.");
            }
            self.resolve_expr(value);
        }
    }

    fn visit_var_stmt(&mut self, stmt: &Stmt) {
        let Stmt::Var(data) = stmt else { unreachable!() };
        self.declare(&data.name);
        if let Some(initializer) = &data.initializer {
            self.resolve_expr(initializer);
        }
        self.define(&data.name);
    }

    fn visit_while_stmt(&mut self, stmt: &Stmt) {
        let Stmt::While(data) = stmt else { unreachable!() };
        self.resolve_expr(&data.condition);
        self.loop_depth += 1;
        self.resolve_stmt(&data.body);
        self.loop_depth -= 1;
    }
}

impl<'a, 'b> ExprVisitor<()> for Resolver<'a, 'b> {
    fn visit_assign_expr(&mut self, expr: &Expr) {
        let Expr::Assign(data) = expr else { unreachable!() };
        self.resolve_expr(&data.value);
        self.resolve_local(data.id, &data.name);
    }

    fn visit_binary_expr(&mut self, expr: &Expr) {
        let Expr::Binary(data) = expr else { unreachable!() };
        self.resolve_expr(&data.left);
        self.resolve_expr(&data.right);
    }

    fn visit_call_expr(&mut self, expr: &Expr) {
        let Expr::Call(data) = expr else { unreachable!() };
        self.resolve_expr(&data.callee);
        for argument in &data.arguments {
            self.resolve_expr(argument);
        }
    }

    fn visit_get_expr(&mut self, expr: &Expr) {
        let Expr::Get(data) = expr else { unreachable!() };
        self.resolve_expr(&data.object);
    }

    fn visit_grouping_expr(&mut self, expr: &Expr) {
        let Expr::Grouping(data) = expr else { unreachable!() };
        self.resolve_expr(&data.expr);
    }

    fn visit_literal_expr(&mut self, _expr: &Expr) {}

    fn visit_logical_expr(&mut self, expr: &Expr) {
        let Expr::Logical(data) = expr else { unreachable!() };
        self.resolve_expr(&data.left);
        self.resolve_expr(&data.right);
    }

    fn visit_set_expr(&mut self, expr: &Expr) {
        let Expr::Set(data) = expr else { unreachable!() };
        self.resolve_expr(&data.value);
        self.resolve_expr(&data.object);
    }

    fn visit_super_expr(&mut self, expr: &Expr) {
        let Expr::Super(data) = expr else { unreachable!() };
        if self.current_class == ClassType::None {
            self.diagnostics.token_error(&data.keyword, "Can't use 'super' outside of a class.");
        } else if self.current_class != ClassType::Subclass {
            self.diagnostics.token_error(&data.keyword, "Can't use 'super' in a class with no superclass.");
        }
        self.resolve_local(data.id, &data.keyword);
    }

    fn visit_this_expr(&mut self, expr: &Expr) {
        let Expr::This(data) = expr else { unreachable!() };
        if self.current_class == ClassType::None {
            self.diagnostics.token_error(&data.keyword, "Can't use 'this' outside of a class.");
        } else {
            self.resolve_local(data.id, &data.keyword);
        }
    }

    fn visit_unary_expr(&mut self, expr: &Expr) {
        let Expr::Unary(data) = expr else { unreachable!() };
        self.resolve_expr(&data.expr);
    }

    fn visit_variable_expr(&mut self, expr: &Expr) {
        let Expr::Variable(data) = expr else { unreachable!() };
        if let Some(scope) = self.scopes.last() {
            if scope.get(&data.name.lexeme) == Some(&false) {
                self.diagnostics.token_error(&data.name, "Can't read local variable in its own initializer.");
            }
        }
        self.resolve_local(data.id, &data.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve(source: &str) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
        let statements = Parser::new(tokens).parse(&mut diagnostics);
        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter, &mut diagnostics).resolve(&statements);
        diagnostics
    }

    #[test]
    fn flags_self_referential_initializer() {
        assert!(resolve("var a = a;").had_error());
    }

    #[test]
    fn flags_return_outside_function() {
        assert!(resolve("return 1;").had_error());
    }

    #[test]
    fn flags_return_value_inside_initializer() {
        assert!(resolve("class A { init() { return 1; } }").had_error());
    }

    #[test]
    fn flags_this_outside_class() {
        assert!(resolve("print this;").had_error());
    }

    #[test]
    fn flags_self_inheriting_class() {
        assert!(resolve("class A < A {}").had_error());
    }

    #[test]
    fn flags_super_without_superclass() {
        assert!(resolve("class A { foo() { super.foo(); } }").had_error());
    }

    #[test]
    fn flags_break_outside_loop() {
        assert!(resolve("break;").had_error());
    }

    #[test]
    fn allows_break_inside_while() {
        assert!(!resolve("while (true) { break; }").had_error());
    }

    #[test]
    fn flags_break_inside_a_function_nested_in_a_loop() {
        assert!(resolve("while (true) { fun f() { break; } }").had_error());
    }

    #[test]
    fn resolves_closure_capture_at_declaration_scope() {
        assert!(!resolve(
            "fun makeCounter() { var i = 0; fun inc() { i = i + 1; return i; } return inc; } var c = makeCounter();",
        )
        .had_error());
    }
}
