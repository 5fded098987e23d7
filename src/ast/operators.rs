use serde::{Deserialize, Serialize};

/// Connective between sibling conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogicalOp {
    #[default]
    And,
    Or,
}

impl LogicalOp {
    pub fn keyword(self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

/// Comparison operators of a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    In,
    NotIn,
    Like,
    BeginLike,
    EndLike,
    NotLike,
    NotBeginLike,
    NotEndLike,
    IsNull,
    NotNull,
}

/// How a criterion value is rewritten before binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTransform {
    None,
    /// `%value%`
    Contains,
    /// `value%`
    StartsWith,
    /// `%value`
    EndsWith,
}

impl ValueTransform {
    pub fn apply(self, text: &str) -> String {
        match self {
            ValueTransform::None => text.to_string(),
            ValueTransform::Contains => format!("%{}%", text),
            ValueTransform::StartsWith => format!("{}%", text),
            ValueTransform::EndsWith => format!("%{}", text),
        }
    }
}

/// SQL rendering of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorSpec {
    pub sql: &'static str,
    pub needs_parameter: bool,
    pub transform: ValueTransform,
}

impl Operator {
    pub fn spec(self) -> OperatorSpec {
        use ValueTransform::*;
        let (sql, needs_parameter, transform) = match self {
            Operator::Equal => ("=", true, None),
            Operator::NotEqual => ("<>", true, None),
            Operator::GreaterThan => (">", true, None),
            Operator::GreaterThanOrEqual => (">=", true, None),
            Operator::LessThan => ("<", true, None),
            Operator::LessThanOrEqual => ("<=", true, None),
            Operator::In => ("IN", true, None),
            Operator::NotIn => ("NOT IN", true, None),
            Operator::Like => ("LIKE", true, Contains),
            Operator::BeginLike => ("LIKE", true, StartsWith),
            Operator::EndLike => ("LIKE", true, EndsWith),
            Operator::NotLike => ("NOT LIKE", true, Contains),
            Operator::NotBeginLike => ("NOT LIKE", true, StartsWith),
            Operator::NotEndLike => ("NOT LIKE", true, EndsWith),
            Operator::IsNull => ("IS NULL", false, None),
            Operator::NotNull => ("IS NOT NULL", false, None),
        };
        OperatorSpec {
            sql,
            needs_parameter,
            transform,
        }
    }

    /// IN / NOT IN take collections and honor a subquery size cap.
    pub fn is_membership(self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.spec().sql)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

/// Comparison used between joined fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JoinOperator {
    #[default]
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl JoinOperator {
    pub fn sql(self) -> &'static str {
        match self {
            JoinOperator::Equal => "=",
            JoinOperator::NotEqual => "<>",
            JoinOperator::GreaterThan => ">",
            JoinOperator::GreaterThanOrEqual => ">=",
            JoinOperator::LessThan => "<",
            JoinOperator::LessThanOrEqual => "<=",
        }
    }
}

/// Set operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombineKind {
    UnionAll,
    Union,
    Except,
    Intersect,
}

impl CombineKind {
    pub fn keyword(self) -> &'static str {
        match self {
            CombineKind::UnionAll => "UNION ALL",
            CombineKind::Union => "UNION",
            // Oracle spells set difference MINUS
            CombineKind::Except => "MINUS",
            CombineKind::Intersect => "INTERSECT",
        }
    }
}

/// Direction of a hierarchical traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecursionDirection {
    /// Towards ancestors
    Up,
    /// Towards descendants
    Down,
}

/// Aggregate functions for the aggregate output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFunc {
    Count,
    Sum,
    Max,
    Min,
    Avg,
}

impl AggregateFunc {
    pub fn keyword(self) -> &'static str {
        match self {
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Max => "MAX",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Avg => "AVG",
        }
    }
}

impl std::fmt::Display for AggregateFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// Arithmetic of a calculated update (`COL = COL + :p`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculateOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl CalculateOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CalculateOp::Add => "+",
            CalculateOp::Subtract => "-",
            CalculateOp::Multiply => "*",
            CalculateOp::Divide => "/",
        }
    }
}
