use crate::errors::{DocError, DocResult, ErrorKind};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt::Display;
use std::str::FromStr;

use super::RawFragment;

/// Comparison operators supported on a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
}

impl Operator {
    /// The canonical operator token, without the `$` prefix.
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::In => "in",
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Neq => "!=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::In => "in",
        }
    }
}

impl FromStr for Operator {
    type Err = DocError;

    /// Parses an operator token, with or without a leading `$`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.strip_prefix('$').unwrap_or(s);
        match token {
            "eq" => Ok(Operator::Eq),
            "neq" => Ok(Operator::Neq),
            "lt" => Ok(Operator::Lt),
            "lte" => Ok(Operator::Lte),
            "gt" => Ok(Operator::Gt),
            "gte" => Ok(Operator::Gte),
            "in" => Ok(Operator::In),
            _ => {
                log::error!("Unsupported operator {}", s);
                Err(DocError::new(
                    &format!("Unsupported operator {}", s),
                    ErrorKind::UnsupportedOperator,
                ))
            }
        }
    }
}

/// One operator/value pair applied to a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Eq(Value),
    Neq(Value),
    Lt(Value),
    Lte(Value),
    Gt(Value),
    Gte(Value),
    In(Vec<Value>),
}

impl Comparison {
    /// Builds a comparison from an operator and its JSON argument.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCriteria` when `in` is given anything but an array.
    pub fn new(operator: Operator, value: Value) -> DocResult<Self> {
        Ok(match operator {
            Operator::Eq => Comparison::Eq(value),
            Operator::Neq => Comparison::Neq(value),
            Operator::Lt => Comparison::Lt(value),
            Operator::Lte => Comparison::Lte(value),
            Operator::Gt => Comparison::Gt(value),
            Operator::Gte => Comparison::Gte(value),
            Operator::In => match value {
                Value::Array(values) => Comparison::In(values),
                other => {
                    log::error!("Operator in expects an array, got {}", other);
                    return Err(DocError::new(
                        "Operator in expects an array of values",
                        ErrorKind::InvalidCriteria,
                    ));
                }
            },
        })
    }

    pub fn operator(&self) -> Operator {
        match self {
            Comparison::Eq(_) => Operator::Eq,
            Comparison::Neq(_) => Operator::Neq,
            Comparison::Lt(_) => Operator::Lt,
            Comparison::Lte(_) => Operator::Lte,
            Comparison::Gt(_) => Operator::Gt,
            Comparison::Gte(_) => Operator::Gte,
            Comparison::In(_) => Operator::In,
        }
    }

    fn fmt_on(&self, field: &str, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Comparison::Eq(v)
            | Comparison::Neq(v)
            | Comparison::Lt(v)
            | Comparison::Lte(v)
            | Comparison::Gt(v)
            | Comparison::Gte(v) => write!(f, "{} {} {}", field, self.operator().symbol(), v),
            Comparison::In(values) => {
                write!(f, "{} in {}", field, Value::Array(values.clone()))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompositeOp {
    And,
    Or,
}

/// A filter expression over document fields.
///
/// Criteria form a closed algebra:
///
/// * `Fields` - a field condition map, field name to the comparisons applied
///   to it. All comparisons of all fields are conjoined. An empty map matches
///   every document.
/// * `And` / `Or` - boolean composition of sub-criteria. Sub-criteria that
///   compile to nothing are skipped; a composite with no surviving children
///   contributes no predicate.
/// * `Raw` - a hand-written SQL fragment.
///
/// Criteria are usually built with the fluent API (`field("age").gte(50)`),
/// or parsed from a MongoDB-like JSON shape with [`Criteria::from_value`].
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    Fields(IndexMap<String, Vec<Comparison>>),
    And(Vec<Criteria>),
    Or(Vec<Criteria>),
    Raw(RawFragment),
}

impl Default for Criteria {
    fn default() -> Self {
        Criteria::all()
    }
}

impl Criteria {
    /// Criteria matching every document.
    pub fn all() -> Self {
        Criteria::Fields(IndexMap::new())
    }

    /// Combines with another criteria using logical AND.
    pub fn and<C: Into<Criteria>>(self, other: C) -> Self {
        match self {
            Criteria::And(mut children) => {
                children.push(other.into());
                Criteria::And(children)
            }
            this => Criteria::And(vec![this, other.into()]),
        }
    }

    /// Combines with another criteria using logical OR.
    pub fn or<C: Into<Criteria>>(self, other: C) -> Self {
        match self {
            Criteria::Or(mut children) => {
                children.push(other.into());
                Criteria::Or(children)
            }
            this => Criteria::Or(vec![this, other.into()]),
        }
    }

    /// Parses criteria from its JSON shape.
    ///
    /// ```text
    /// { "age": { "$gte": 50, "$lt": 60 }, "name": { "$in": ["John", "Sita"] } }
    /// { "$or": [ { "name": { "$eq": "John" } }, { "age": { "$gte": 40 } } ] }
    /// ```
    ///
    /// Operator and composite tokens are accepted with or without the `$`
    /// prefix, which means a document field literally named `and` or `or`
    /// cannot be addressed through this form; use the fluent API instead.
    ///
    /// # Errors
    ///
    /// * `InvalidCriteria` - composite key mixed with other keys, non-object
    ///   criteria, non-array composite arguments, non-object field conditions,
    ///   or `in` without an array
    /// * `UnsupportedOperator` - an operator token outside the supported table
    pub fn from_value(value: &Value) -> DocResult<Self> {
        let map = expect_object(value)?;
        if let Some(op) = composite_op(map)? {
            let children = composite_args(map, op)?
                .iter()
                .map(Criteria::from_value)
                .collect::<DocResult<Vec<_>>>()?;
            return Ok(match op {
                CompositeOp::And => Criteria::And(children),
                CompositeOp::Or => Criteria::Or(children),
            });
        }

        let mut fields = IndexMap::with_capacity(map.len());
        for (field, condition) in map {
            if condition.is_null() {
                continue;
            }
            let condition = match condition {
                Value::Object(condition) => condition,
                other => {
                    log::error!("Condition for field {} is not an object: {}", field, other);
                    return Err(DocError::new(
                        &format!(
                            "Condition for field {} must map operators to values",
                            field
                        ),
                        ErrorKind::InvalidCriteria,
                    ));
                }
            };

            let mut comparisons = Vec::with_capacity(condition.len());
            for (token, argument) in condition {
                let operator = token.parse::<Operator>()?;
                comparisons.push(Comparison::new(operator, argument.clone())?);
            }
            fields.insert(field.clone(), comparisons);
        }
        Ok(Criteria::Fields(fields))
    }

    /// Expands equality shorthand into criteria.
    ///
    /// Every `field: value` pair becomes `field: { eq: value }`; nested
    /// `and`/`or` arrays of shorthand maps are expanded recursively.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCriteria` for the same shape violations as
    /// [`Criteria::from_value`].
    pub fn from_eq_shorthand(value: &Value) -> DocResult<Self> {
        let map = expect_object(value)?;
        if let Some(op) = composite_op(map)? {
            let children = composite_args(map, op)?
                .iter()
                .map(Criteria::from_eq_shorthand)
                .collect::<DocResult<Vec<_>>>()?;
            return Ok(match op {
                CompositeOp::And => Criteria::And(children),
                CompositeOp::Or => Criteria::Or(children),
            });
        }

        let fields = map
            .iter()
            .map(|(field, value)| (field.clone(), vec![Comparison::Eq(value.clone())]))
            .collect();
        Ok(Criteria::Fields(fields))
    }
}

fn expect_object(value: &Value) -> DocResult<&Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => {
            log::error!("Criteria must be a JSON object, got {}", other);
            Err(DocError::new(
                "Criteria must be a JSON object",
                ErrorKind::InvalidCriteria,
            ))
        }
    }
}

fn composite_op(map: &Map<String, Value>) -> DocResult<Option<CompositeOp>> {
    let op = map.keys().find_map(|key| match key.as_str() {
        "$and" | "and" => Some(CompositeOp::And),
        "$or" | "or" => Some(CompositeOp::Or),
        _ => None,
    });

    if op.is_some() && map.len() > 1 {
        log::error!(
            "Composite criteria mixed with sibling keys: {:?}",
            map.keys().collect::<Vec<_>>()
        );
        return Err(DocError::new(
            "$and or $or can not be combined with other operators",
            ErrorKind::InvalidCriteria,
        ));
    }
    Ok(op)
}

fn composite_args(map: &Map<String, Value>, op: CompositeOp) -> DocResult<&[Value]> {
    // exactly one key at this point
    let argument = map.values().next().unwrap_or(&Value::Null);
    match argument {
        Value::Array(children) => Ok(children.as_slice()),
        Value::Null => Ok(&[]),
        other => {
            log::error!("Arguments of {:?} must be an array, got {}", op, other);
            Err(DocError::new(
                "$and / $or expects an array of criteria",
                ErrorKind::InvalidCriteria,
            ))
        }
    }
}

impl Display for Criteria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Criteria::Fields(fields) => {
                if fields.is_empty() {
                    return write!(f, "all");
                }
                let mut first = true;
                for (field, comparisons) in fields {
                    for comparison in comparisons {
                        if !first {
                            write!(f, " && ")?;
                        }
                        first = false;
                        comparison.fmt_on(field, f)?;
                    }
                }
                Ok(())
            }
            Criteria::And(children) | Criteria::Or(children) => {
                let joiner = if matches!(self, Criteria::And(_)) { " && " } else { " || " };
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", joiner)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            Criteria::Raw(fragment) => write!(f, "raw({})", fragment),
        }
    }
}

impl From<RawFragment> for Criteria {
    fn from(fragment: RawFragment) -> Self {
        Criteria::Raw(fragment)
    }
}
