use crate::token::Token;
use crate::value::Value;

/// Stable per-node identity, stamped by the parser at parse time.
///
/// The resolver's side-table keys on this rather than on structural
/// equality of the expression itself — two syntactically identical
/// `Variable` nodes at different source positions must resolve
/// independently.
pub type NodeId = u32;

#[derive(Debug, Clone)]
pub struct AssignData {
    pub id: NodeId,
    pub name: Token,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct BinaryData {
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct CallData {
    pub callee: Box<Expr>,
    pub paren: Token,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct GetData {
    pub object: Box<Expr>,
    pub name: Token,
}

#[derive(Debug, Clone)]
pub struct GroupingData {
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct LogicalData {
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct SetData {
    pub object: Box<Expr>,
    pub name: Token,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct SuperData {
    pub id: NodeId,
    pub keyword: Token,
    pub method: Token,
}

#[derive(Debug, Clone)]
pub struct ThisData {
    pub id: NodeId,
    pub keyword: Token,
}

#[derive(Debug, Clone)]
pub struct UnaryData {
    pub operator: Token,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct VariableData {
    pub id: NodeId,
    pub name: Token,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Assign(AssignData),
    Binary(BinaryData),
    Call(CallData),
    Get(GetData),
    Grouping(GroupingData),
    Literal(Value),
    Logical(LogicalData),
    Set(SetData),
    Super(SuperData),
    This(ThisData),
    Unary(UnaryData),
    Variable(VariableData),
}

impl Expr {
    pub fn accept<T>(&self, visitor: &mut dyn ExprVisitor<T>) -> T {
        match self {
            Expr::Assign(_) => visitor.visit_assign_expr(self),
            Expr::Binary(_) => visitor.visit_binary_expr(self),
            Expr::Call(_) => visitor.visit_call_expr(self),
            Expr::Get(_) => visitor.visit_get_expr(self),
            Expr::Grouping(_) => visitor.visit_grouping_expr(self),
            Expr::Literal(_) => visitor.visit_literal_expr(self),
            Expr::Logical(_) => visitor.visit_logical_expr(self),
            Expr::Set(_) => visitor.visit_set_expr(self),
            Expr::Super(_) => visitor.visit_super_expr(self),
            Expr::This(_) => visitor.visit_this_expr(self),
            Expr::Unary(_) => visitor.visit_unary_expr(self),
            Expr::Variable(_) => visitor.visit_variable_expr(self),
        }
    }
}

pub trait ExprVisitor<T> {
    fn visit_assign_expr(&mut self, expr: &Expr) -> T;
    fn visit_binary_expr(&mut self, expr: &Expr) -> T;
    fn visit_call_expr(&mut self, expr: &Expr) -> T;
    fn visit_get_expr(&mut self, expr: &Expr) -> T;
    fn visit_grouping_expr(&mut self, expr: &Expr) -> T;
    fn visit_literal_expr(&mut self, expr: &Expr) -> T;
    fn visit_logical_expr(&mut self, expr: &Expr) -> T;
    fn visit_set_expr(&mut self, expr: &Expr) -> T;
    fn visit_super_expr(&mut self, expr: &Expr) -> T;
    fn visit_this_expr(&mut self, expr: &Expr) -> T;
    fn visit_unary_expr(&mut self, expr: &Expr) -> T;
    fn visit_variable_expr(&mut self, expr: &Expr) -> T;
}
