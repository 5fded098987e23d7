use serde::{Deserialize, Serialize};

use crate::ast::{
    AggregateFunc, CombineKind, JoinKind, JoinOperator, LogicalOp, Operator, RecursionDirection,
    SortOrder, Value,
};
use crate::params::Parameters;

/// Dialect-independent query node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    /// Entity name resolved through the schema.
    pub entity: String,
    /// Top-level condition list, folded left to right.
    pub conditions: Vec<ConditionEntry>,
    pub sorts: Vec<Sort>,
    pub joins: Vec<Join>,
    pub combines: Vec<Combine>,
    pub recursion: Option<Recursion>,
    /// Projected properties; empty selects every field of the entity.
    pub fields: Vec<String>,
    pub distinct: bool,
    pub group_by: Vec<String>,
    pub having: Vec<ConditionEntry>,
    /// Row cap, 0 for none.
    pub size: usize,
    pub paging: Option<Paging>,
    pub output: Output,
    /// Raw query text, bypassing translation.
    pub text: Option<TextScript>,
}

/// One condition and the connective joining it to its previous sibling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionEntry {
    pub connector: LogicalOp,
    pub condition: Condition,
}

/// Condition tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Criterion(Criterion),
    Group(Vec<ConditionEntry>),
    /// Literal always-true / always-false predicate.
    Constant(bool),
}

/// One comparison predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
    #[serde(default)]
    pub conversion: Option<FieldConversion>,
}

/// Function applied to a field before comparing or sorting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldConversion {
    StringLength,
    Trim,
    Upper,
    Lower,
    Count,
    Sum,
    Max,
    Min,
    Avg,
    /// JSON path, written as an escaped literal.
    JsonValue(String),
    JsonQuery(String),
    // operands are bound as parameters
    Add(Value),
    Subtract(Value),
    Multiply(Value),
    Divide(Value),
    Modulo(Value),
    BitAnd(Value),
    BitOr(Value),
    BitXor(Value),
    LeftShift(Value),
    RightShift(Value),
    Concat(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
    #[serde(default)]
    pub conversion: Option<FieldConversion>,
}

/// A join onto another query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    /// Explicit (source property, target property) pairs; empty infers them.
    #[serde(default)]
    pub fields: Vec<(String, String)>,
    #[serde(default)]
    pub operator: JoinOperator,
    pub query: Query,
}

/// A set operation with another query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combine {
    pub kind: CombineKind,
    pub query: Query,
}

/// Hierarchical traversal descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recursion {
    /// Key property of each node.
    pub data_field: String,
    /// Property pointing at the parent node.
    pub relation_field: String,
    pub direction: RecursionDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub offset: usize,
    pub size: usize,
}

impl Paging {
    /// 1-based page index.
    pub fn page(page: usize, size: usize) -> Self {
        Self {
            offset: page.saturating_sub(1) * size,
            size,
        }
    }
}

/// Result shape of a query statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Output {
    #[default]
    Rows,
    Count,
    Exists,
    Aggregate(AggregateFunc),
}

/// Raw script with its own parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextScript {
    pub script: String,
    #[serde(default)]
    pub parameters: Parameters,
}

impl Query {
    /// Query over an entity.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Default::default()
        }
    }

    /// Raw SQL query (escape hatch).
    pub fn raw(script: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            text: Some(TextScript {
                script: script.into(),
                parameters,
            }),
            ..Default::default()
        }
    }

    pub fn columns<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// AND a criterion onto the condition list.
    pub fn filter(self, field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.push(LogicalOp::And, Condition::Criterion(Criterion::new(field, operator, value)))
    }

    /// OR a criterion onto the condition list.
    pub fn or_filter(self, field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.push(LogicalOp::Or, Condition::Criterion(Criterion::new(field, operator, value)))
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Operator::Equal, value)
    }

    pub fn and(self, condition: Condition) -> Self {
        self.push(LogicalOp::And, condition)
    }

    pub fn or(self, condition: Condition) -> Self {
        self.push(LogicalOp::Or, condition)
    }

    fn push(mut self, connector: LogicalOp, condition: Condition) -> Self {
        self.conditions.push(ConditionEntry { connector, condition });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sorts.push(Sort {
            field: field.into(),
            order,
            conversion: None,
        });
        self
    }

    pub fn join(mut self, kind: JoinKind, query: Query) -> Self {
        self.joins.push(Join {
            kind,
            fields: Vec::new(),
            operator: JoinOperator::Equal,
            query,
        });
        self
    }

    /// Join on explicit (source, target) property pairs.
    pub fn join_on<I, A, B>(mut self, kind: JoinKind, fields: I, query: Query) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        self.joins.push(Join {
            kind,
            fields: fields.into_iter().map(|(a, b)| (a.into(), b.into())).collect(),
            operator: JoinOperator::Equal,
            query,
        });
        self
    }

    pub fn combine(mut self, kind: CombineKind, query: Query) -> Self {
        self.combines.push(Combine { kind, query });
        self
    }

    pub fn recurse(
        mut self,
        data_field: impl Into<String>,
        relation_field: impl Into<String>,
        direction: RecursionDirection,
    ) -> Self {
        self.recursion = Some(Recursion {
            data_field: data_field.into(),
            relation_field: relation_field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn paging(mut self, paging: Paging) -> Self {
        self.paging = Some(paging);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn group_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn having(mut self, criterion: Criterion) -> Self {
        self.having.push(ConditionEntry {
            connector: LogicalOp::And,
            condition: Condition::Criterion(criterion),
        });
        self
    }

    pub fn output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }
}

impl Criterion {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            conversion: None,
        }
    }

    pub fn convert(mut self, conversion: FieldConversion) -> Self {
        self.conversion = Some(conversion);
        self
    }
}

impl Condition {
    /// Group of conditions joined by AND.
    pub fn all<I: IntoIterator<Item = Condition>>(conditions: I) -> Self {
        Self::group(LogicalOp::And, conditions)
    }

    /// Group of conditions joined by OR.
    pub fn any<I: IntoIterator<Item = Condition>>(conditions: I) -> Self {
        Self::group(LogicalOp::Or, conditions)
    }

    fn group<I: IntoIterator<Item = Condition>>(connector: LogicalOp, conditions: I) -> Self {
        Condition::Group(
            conditions
                .into_iter()
                .map(|condition| ConditionEntry { connector, condition })
                .collect(),
        )
    }
}

impl From<Criterion> for Condition {
    fn from(c: Criterion) -> Self {
        Condition::Criterion(c)
    }
}
