use std::rc::Rc;

use crate::error::Diagnostics;
use crate::expr::{
    AssignData, BinaryData, CallData, Expr, GetData, GroupingData, LogicalData, NodeId, SetData, SuperData,
    ThisData, UnaryData, VariableData,
};
use crate::stmt::{
    BlockData, BreakData, ClassData, ExpressionData, FunctionDecl, IfData, PrintData, ReturnData, Stmt, VarData,
    WhileData,
};
use crate::token::{Token, TokenKind};
use crate::value::Value;

/// Marks that a parse error was already reported to diagnostics and the
/// caller should unwind to the nearest recovery point (`synchronize`).
struct ParseError;

/// Recursive-descent parser, one token of lookahead (`peek`/`previous`).
/// Consumes the full token stream up front rather than borrowing from the
/// scanner, since the source text's lifetime otherwise has to thread
/// through every AST node it would need to lend out.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    next_id: NodeId,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, current: 0, next_id: 0 }
    }

    pub fn parse(mut self, diagnostics: &mut Diagnostics) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            match self.declaration(diagnostics) {
                Ok(stmt) => statements.push(stmt),
                Err(ParseError) => self.synchronize(),
            }
        }
        statements
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // --- declarations ---------------------------------------------------

    fn declaration(&mut self, diagnostics: &mut Diagnostics) -> Result<Stmt, ParseError> {
        if self.matches(&[TokenKind::Class]) {
            return self.class_declaration(diagnostics);
        }
        if self.matches(&[TokenKind::Fun]) {
            return Ok(Stmt::Function(Rc::new(self.function("function", diagnostics)?)));
        }
        if self.matches(&[TokenKind::Var]) {
            return self.var_declaration(diagnostics);
        }
        self.statement(diagnostics)
    }

    fn class_declaration(&mut self, diagnostics: &mut Diagnostics) -> Result<Stmt, ParseError> {
        let name = self.consume(TokenKind::Identifier, "Expect class name.", diagnostics)?;

        let superclass = if self.matches(&[TokenKind::Less]) {
            let super_name = self.consume(TokenKind::Identifier, "Expect superclass name.", diagnostics)?;
            Some(Expr::Variable(VariableData { id: self.fresh_id(), name: super_name }))
        } else {
            None
        };

        self.consume(TokenKind::LeftBrace, "Expect '{' before class body.", diagnostics)?;

        let mut methods = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            methods.push(Rc::new(self.function("method", diagnostics)?));
        }

        self.consume(TokenKind::RightBrace, "Expect '}' after class body.", diagnostics)?;

        Ok(Stmt::Class(ClassData { name, superclass, methods }))
    }

    fn function(&mut self, kind: &str, diagnostics: &mut Diagnostics) -> Result<FunctionDecl, ParseError> {
        let name = self.consume(TokenKind::Identifier, &format!("Expect {kind} name."), diagnostics)?;

        self.consume(TokenKind::LeftParen, &format!("Expect '(' after {kind} name."), diagnostics)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= 255 {
                    diagnostics.token_error(self.peek(), "Can't have more than 255 parameters.");
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name.", diagnostics)?);
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.", diagnostics)?;

        self.consume(TokenKind::LeftBrace, &format!("Expect '{{' before {kind} body."), diagnostics)?;
        let body = self.block(diagnostics)?;

        Ok(FunctionDecl { name, params, body })
    }

    fn var_declaration(&mut self, diagnostics: &mut Diagnostics) -> Result<Stmt, ParseError> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name.", diagnostics)?;

        let initializer = if self.matches(&[TokenKind::Equal]) { Some(self.expression(diagnostics)?) } else { None };

        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.", diagnostics)?;
        Ok(Stmt::Var(VarData { name, initializer }))
    }

    // --- statements ------------------------------------------------------

    fn statement(&mut self, diagnostics: &mut Diagnostics) -> Result<Stmt, ParseError> {
        if self.matches(&[TokenKind::For]) {
            return self.for_statement(diagnostics);
        }
        if self.matches(&[TokenKind::If]) {
            return self.if_statement(diagnostics);
        }
        if self.matches(&[TokenKind::Print]) {
            return self.print_statement(diagnostics);
        }
        if self.matches(&[TokenKind::Return]) {
            return self.return_statement(diagnostics);
        }
        if self.matches(&[TokenKind::While]) {
            return self.while_statement(diagnostics);
        }
        if self.matches(&[TokenKind::Break]) {
            return self.break_statement(diagnostics);
        }
        if self.matches(&[TokenKind::LeftBrace]) {
            return Ok(Stmt::Block(BlockData { statements: self.block(diagnostics)? }));
        }
        self.expression_statement(diagnostics)
    }

    /// Desugars into `{ init?; while (cond) { body; inc?; } }` rather than
    /// introducing a dedicated AST node — the resolver and interpreter
    /// never need to know `for` exists.
    fn for_statement(&mut self, diagnostics: &mut Diagnostics) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.", diagnostics)?;

        let initializer = if self.matches(&[TokenKind::Semicolon]) {
            None
        } else if self.matches(&[TokenKind::Var]) {
            Some(self.var_declaration(diagnostics)?)
        } else {
            Some(self.expression_statement(diagnostics)?)
        };

        let condition =
            if !self.check(TokenKind::Semicolon) { Some(self.expression(diagnostics)?) } else { None };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.", diagnostics)?;

        let increment =
            if !self.check(TokenKind::RightParen) { Some(self.expression(diagnostics)?) } else { None };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.", diagnostics)?;

        let mut body = self.statement(diagnostics)?;

        if let Some(increment) = increment {
            body = Stmt::Block(BlockData {
                statements: vec![body, Stmt::Expression(ExpressionData { expr: increment })],
            });
        }

        let condition = condition.unwrap_or(Expr::Literal(Value::Bool(true)));
        body = Stmt::While(WhileData { condition, body: Box::new(body) });

        if let Some(initializer) = initializer {
            body = Stmt::Block(BlockData { statements: vec![initializer, body] });
        }

        Ok(body)
    }

    fn if_statement(&mut self, diagnostics: &mut Diagnostics) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.", diagnostics)?;
        let condition = self.expression(diagnostics)?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.", diagnostics)?;

        let then_branch = Box::new(self.statement(diagnostics)?);
        let else_branch =
            if self.matches(&[TokenKind::Else]) { Some(Box::new(self.statement(diagnostics)?)) } else { None };

        Ok(Stmt::If(IfData { condition, then_branch, else_branch }))
    }

    fn print_statement(&mut self, diagnostics: &mut Diagnostics) -> Result<Stmt, ParseError> {
        let expr = self.expression(diagnostics)?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value.", diagnostics)?;
        Ok(Stmt::Print(PrintData { expr }))
    }

    fn return_statement(&mut self, diagnostics: &mut Diagnostics) -> Result<Stmt, ParseError> {
        let keyword = self.previous().clone();
        let value = if !self.check(TokenKind::Semicolon) { Some(self.expression(diagnostics)?) } else { None };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.", diagnostics)?;
        Ok(Stmt::Return(ReturnData { keyword, value }))
    }

    fn while_statement(&mut self, diagnostics: &mut Diagnostics) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.", diagnostics)?;
        let condition = self.expression(diagnostics)?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.", diagnostics)?;
        let body = Box::new(self.statement(diagnostics)?);
        Ok(Stmt::While(WhileData { condition, body }))
    }

    fn break_statement(&mut self, diagnostics: &mut Diagnostics) -> Result<Stmt, ParseError> {
        let keyword = self.previous().clone();
        self.consume(TokenKind::Semicolon, "Expect ';' after 'break'.", diagnostics)?;
        Ok(Stmt::Break(BreakData { keyword }))
    }

    fn block(&mut self, diagnostics: &mut Diagnostics) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            match self.declaration(diagnostics) {
                Ok(stmt) => statements.push(stmt),
                Err(ParseError) => self.synchronize(),
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.", diagnostics)?;
        Ok(statements)
    }

    fn expression_statement(&mut self, diagnostics: &mut Diagnostics) -> Result<Stmt, ParseError> {
        let expr = self.expression(diagnostics)?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.", diagnostics)?;
        Ok(Stmt::Expression(ExpressionData { expr }))
    }

    // --- expressions -------------------------------------------------------

    fn expression(&mut self, diagnostics: &mut Diagnostics) -> Result<Expr, ParseError> {
        self.assignment(diagnostics)
    }

    fn assignment(&mut self, diagnostics: &mut Diagnostics) -> Result<Expr, ParseError> {
        let expr = self.or(diagnostics)?;

        if self.matches(&[TokenKind::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment(diagnostics)?;

            return match expr {
                Expr::Variable(v) => Ok(Expr::Assign(AssignData { id: self.fresh_id(), name: v.name, value: Box::new(value) })),
                Expr::Get(g) => Ok(Expr::Set(SetData { object: g.object, name: g.name, value: Box::new(value) })),
                _ => {
                    diagnostics.token_error(&equals, "Invalid assignment target.");
                    Ok(expr)
                }
            };
        }

        Ok(expr)
    }

    fn or(&mut self, diagnostics: &mut Diagnostics) -> Result<Expr, ParseError> {
        let mut expr = self.and(diagnostics)?;
        while self.matches(&[TokenKind::Or]) {
            let operator = self.previous().clone();
            let right = self.and(diagnostics)?;
            expr = Expr::Logical(LogicalData { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn and(&mut self, diagnostics: &mut Diagnostics) -> Result<Expr, ParseError> {
        let mut expr = self.equality(diagnostics)?;
        while self.matches(&[TokenKind::And]) {
            let operator = self.previous().clone();
            let right = self.equality(diagnostics)?;
            expr = Expr::Logical(LogicalData { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn equality(&mut self, diagnostics: &mut Diagnostics) -> Result<Expr, ParseError> {
        let mut expr = self.comparison(diagnostics)?;
        while self.matches(&[TokenKind::BangEqual, TokenKind::EqualEqual]) {
            let operator = self.previous().clone();
            let right = self.comparison(diagnostics)?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn comparison(&mut self, diagnostics: &mut Diagnostics) -> Result<Expr, ParseError> {
        let mut expr = self.term(diagnostics)?;
        while self.matches(&[TokenKind::Greater, TokenKind::GreaterEqual, TokenKind::Less, TokenKind::LessEqual]) {
            let operator = self.previous().clone();
            let right = self.term(diagnostics)?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn term(&mut self, diagnostics: &mut Diagnostics) -> Result<Expr, ParseError> {
        let mut expr = self.factor(diagnostics)?;
        while self.matches(&[TokenKind::Minus, TokenKind::Plus]) {
            let operator = self.previous().clone();
            let right = self.factor(diagnostics)?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn factor(&mut self, diagnostics: &mut Diagnostics) -> Result<Expr, ParseError> {
        let mut expr = self.unary(diagnostics)?;
        while self.matches(&[TokenKind::Slash, TokenKind::Star]) {
            let operator = self.previous().clone();
            let right = self.unary(diagnostics)?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn unary(&mut self, diagnostics: &mut Diagnostics) -> Result<Expr, ParseError> {
        if self.matches(&[TokenKind::Bang, TokenKind::Minus]) {
            let operator = self.previous().clone();
            let expr = self.unary(diagnostics)?;
            return Ok(Expr::Unary(UnaryData { operator, expr: Box::new(expr) }));
        }
        self.call(diagnostics)
    }

    fn call(&mut self, diagnostics: &mut Diagnostics) -> Result<Expr, ParseError> {
        let mut expr = self.primary(diagnostics)?;

        loop {
            if self.matches(&[TokenKind::LeftParen]) {
                expr = self.finish_call(expr, diagnostics)?;
            } else if self.matches(&[TokenKind::Dot]) {
                let name = self.consume(TokenKind::Identifier, "Expect property name after '.'.", diagnostics)?;
                expr = Expr::Get(GetData { object: Box::new(expr), name });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr, diagnostics: &mut Diagnostics) -> Result<Expr, ParseError> {
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if arguments.len() >= 255 {
                    diagnostics.token_error(self.peek(), "Can't have more than 255 arguments.");
                }
                arguments.push(self.expression(diagnostics)?);
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.", diagnostics)?;
        Ok(Expr::Call(CallData { callee: Box::new(callee), paren, arguments }))
    }

    fn primary(&mut self, diagnostics: &mut Diagnostics) -> Result<Expr, ParseError> {
        if self.matches(&[TokenKind::False]) {
            return Ok(Expr::Literal(Value::Bool(false)));
        }
        if self.matches(&[TokenKind::True]) {
            return Ok(Expr::Literal(Value::Bool(true)));
        }
        if self.matches(&[TokenKind::Nil]) {
            return Ok(Expr::Literal(Value::Nil));
        }
        if self.matches(&[TokenKind::Number, TokenKind::String]) {
            return Ok(Expr::Literal(literal_value(self.previous())));
        }
        if self.matches(&[TokenKind::Super]) {
            let keyword = self.previous().clone();
            self.consume(TokenKind::Dot, "Expect '.' after 'super'.", diagnostics)?;
            let method = self.consume(TokenKind::Identifier, "Expect superclass method name.", diagnostics)?;
            return Ok(Expr::Super(SuperData { id: self.fresh_id(), keyword, method }));
        }
        if self.matches(&[TokenKind::This]) {
            let keyword = self.previous().clone();
            return Ok(Expr::This(ThisData { id: self.fresh_id(), keyword }));
        }
        if self.matches(&[TokenKind::Identifier]) {
            let name = self.previous().clone();
            return Ok(Expr::Variable(VariableData { id: self.fresh_id(), name }));
        }
        if self.matches(&[TokenKind::LeftParen]) {
            let expr = self.expression(diagnostics)?;
            self.consume(TokenKind::RightParen, "Expect ')' after expression.", diagnostics)?;
            return Ok(Expr::Grouping(GroupingData { expr: Box::new(expr) }));
        }

        diagnostics.token_error(self.peek(), "Expect expression.");
        Err(ParseError)
    }

    // --- token-stream plumbing -------------------------------------------

    fn matches(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(*kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, message: &str, diagnostics: &mut Diagnostics) -> Result<Token, ParseError> {
        if self.check(kind) {
            return Ok(self.advance().clone());
        }
        diagnostics.token_error(self.peek(), message);
        Err(ParseError)
    }

    fn check(&self, kind: TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }
        self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    /// Discards tokens until the start of what looks like the next
    /// statement, so one parse error reports without cascading into a
    /// flood of spurious follow-on errors.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }

            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

fn literal_value(token: &Token) -> Value {
    match token.literal.as_ref().expect("Number/String token without a scanned literal") {
        crate::literal::Literal::Number(n) => Value::Number(*n),
        crate::literal::Literal::Str(s) => Value::from(s.clone()),
    }
}
