use crate::common::{SortSpec, ALWAYS_FALSE, JSON_ROOT, VALUE_COLUMN};
use crate::errors::{DocError, DocResult, ErrorKind};
use itertools::Itertools;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use super::{Comparison, Criteria, RawFragment};

static IDENTIFIER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$"));

static INDEX: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(r"^[0-9]+$"));

/// A compiled `WHERE` predicate and its positional parameters.
///
/// The predicate text carries one `?` placeholder per parameter, in order.
/// An empty predicate means "no filter".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledClause {
    pub predicate: String,
    pub params: Vec<Value>,
}

impl CompiledClause {
    pub fn new(predicate: String, params: Vec<Value>) -> Self {
        CompiledClause { predicate, params }
    }

    pub fn is_empty(&self) -> bool {
        self.predicate.trim().is_empty()
    }

    /// The predicate prefixed with ` WHERE `, or an empty string when there is
    /// nothing to filter on.
    pub fn where_clause(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.predicate)
        }
    }
}

/// Compiles criteria into a parameterized predicate over the `value` column.
///
/// `None` compiles to an empty clause, matching every document.
///
/// Composite nodes compile their children, skip the ones that produce no
/// predicate, and join the rest with `AND`/`OR` inside parentheses. Field
/// conditions compile to comparisons against `json_extract(value, '<path>')`;
/// all comparisons of one node are conjoined. Values never appear in the
/// predicate text, except for the literal slots of raw fragments.
///
/// # Errors
///
/// Returns `InvalidCriteria` for a field name that cannot be expressed as a
/// JSON path.
pub fn compile(criteria: Option<&Criteria>) -> DocResult<CompiledClause> {
    match criteria {
        None => Ok(CompiledClause::default()),
        Some(criteria) => compile_node(criteria, false),
    }
}

/// Parses criteria from its JSON shape and compiles it.
///
/// # Errors
///
/// Returns `InvalidCriteria` or `UnsupportedOperator` from parsing, or
/// `InvalidCriteria` from compilation.
pub fn compile_value(criteria: &Value) -> DocResult<CompiledClause> {
    if criteria.is_null() {
        return Ok(CompiledClause::default());
    }
    let criteria = Criteria::from_value(criteria)?;
    compile(Some(&criteria))
}

/// Renders a raw fragment into a clause.
pub fn compile_raw(fragment: &RawFragment) -> CompiledClause {
    let (predicate, params) = fragment.render();
    CompiledClause::new(predicate.trim().to_string(), params)
}

fn compile_node(criteria: &Criteria, nested: bool) -> DocResult<CompiledClause> {
    match criteria {
        Criteria::And(children) => compile_composite(children, "AND"),
        Criteria::Or(children) => compile_composite(children, "OR"),
        Criteria::Fields(fields) => {
            let mut fragments = Vec::new();
            let mut params = Vec::new();
            for (field, comparisons) in fields {
                let extract = json_extract(field)?;
                for comparison in comparisons {
                    fragments.push(compile_comparison(&extract, comparison, &mut params));
                }
            }
            Ok(CompiledClause::new(fragments.join(" AND "), params))
        }
        Criteria::Raw(fragment) => {
            let clause = compile_raw(fragment);
            if nested && !clause.is_empty() {
                Ok(CompiledClause::new(
                    format!("({})", clause.predicate),
                    clause.params,
                ))
            } else {
                Ok(clause)
            }
        }
    }
}

fn compile_composite(children: &[Criteria], joiner: &str) -> DocResult<CompiledClause> {
    let mut params = Vec::new();
    let mut predicates = Vec::with_capacity(children.len());
    for child in children {
        let clause = compile_node(child, true)?;
        if clause.is_empty() {
            continue;
        }
        predicates.push(clause.predicate);
        params.extend(clause.params);
    }

    if predicates.is_empty() {
        return Ok(CompiledClause::default());
    }
    let predicate = format!("({})", predicates.iter().join(&format!(" {} ", joiner)));
    Ok(CompiledClause::new(predicate, params))
}

fn compile_comparison(extract: &str, comparison: &Comparison, params: &mut Vec<Value>) -> String {
    let (symbol, value) = match comparison {
        Comparison::Eq(v) => ("==", v),
        Comparison::Neq(v) => ("<>", v),
        Comparison::Lt(v) => ("<", v),
        Comparison::Lte(v) => ("<=", v),
        Comparison::Gt(v) => (">", v),
        Comparison::Gte(v) => (">=", v),
        Comparison::In(values) => {
            if values.is_empty() {
                return ALWAYS_FALSE.to_string();
            }
            let placeholders = values.iter().map(|_| "?").join(", ");
            params.extend(values.iter().cloned());
            return format!("{} IN ({})", extract, placeholders);
        }
    };
    params.push(value.clone());
    format!("{} {} ?", extract, symbol)
}

/// Builds the `ORDER BY` body for a sort spec, without the keywords.
///
/// Keys appear in declaration order. An empty spec yields an empty string.
///
/// # Errors
///
/// Returns `InvalidCriteria` for a field name that cannot be expressed as a
/// JSON path.
pub fn order_by_clause(sort: &SortSpec) -> DocResult<String> {
    let mut keys = Vec::with_capacity(sort.len());
    for (field, order) in sort.sorting_order() {
        keys.push(format!("{} {}", json_extract(&field)?, order.as_sql()));
    }
    Ok(keys.join(", "))
}

fn json_extract(field: &str) -> DocResult<String> {
    Ok(format!("json_extract({}, '{}')", VALUE_COLUMN, json_path(field)?))
}

/// Translates a dotted field name into a SQLite JSON path.
///
/// * `address.city` becomes `$.address.city`
/// * `tags.0` becomes `$.tags[0]`
/// * `first name` becomes `$."first name"`
///
/// # Errors
///
/// Returns `InvalidCriteria` for an empty field name, an empty segment, or a
/// segment containing a quote character.
pub fn json_path(field: &str) -> DocResult<String> {
    if field.is_empty() {
        log::error!("Field name cannot be empty");
        return Err(DocError::new(
            "Field name cannot be empty",
            ErrorKind::InvalidCriteria,
        ));
    }

    let identifier = pattern(&IDENTIFIER)?;
    let index = pattern(&INDEX)?;

    let mut path = String::from(JSON_ROOT);
    for segment in field.split('.') {
        if segment.is_empty() || segment.contains(['"', '\'']) {
            log::error!("Invalid field name {}", field);
            return Err(DocError::new(
                &format!("Invalid field name {}", field),
                ErrorKind::InvalidCriteria,
            ));
        }

        if index.is_match(segment) {
            path.push_str(&format!("[{}]", segment));
        } else if identifier.is_match(segment) {
            path.push('.');
            path.push_str(segment);
        } else {
            path.push_str(&format!(".\"{}\"", segment));
        }
    }
    Ok(path)
}

fn pattern(regex: &'static LazyLock<Result<Regex, regex::Error>>) -> DocResult<&'static Regex> {
    match LazyLock::force(regex) {
        Ok(regex) => Ok(regex),
        Err(e) => {
            log::error!("Failed to compile field name pattern: {}", e);
            Err(DocError::new(
                &format!("Failed to compile field name pattern: {}", e),
                ErrorKind::InternalError,
            ))
        }
    }
}
