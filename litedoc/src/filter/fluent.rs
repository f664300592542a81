use crate::common::DOC_ID;
use indexmap::IndexMap;
use serde_json::Value;

use super::{Comparison, Criteria};

/// Creates a fluent filter builder for the specified field name.
///
/// Comparisons chained on the returned builder are conjoined, so
/// `field("age").gte(50).lt(60)` matches ages in `[50, 60)`. Nested fields are
/// addressed with dots (`"address.city"`) and array elements with numeric
/// segments (`"tags.0"`).
///
/// # Arguments
///
/// * `field_name` - The name of the field to filter on
///
/// # Returns
///
/// A `FieldFilter` which converts into [`Criteria`] wherever one is expected
pub fn field(field_name: &str) -> FieldFilter {
    FieldFilter {
        field_name: field_name.to_string(),
        comparisons: Vec::new(),
    }
}

/// Criteria matching every document.
pub fn all() -> Criteria {
    Criteria::all()
}

/// Conjunction of the given criteria.
///
/// # Examples
///
/// ```rust,ignore
/// let criteria = and(vec![field("age").gte(18).into(), field("city").eq("Pune").into()]);
/// ```
pub fn and(criteria: Vec<Criteria>) -> Criteria {
    Criteria::And(criteria)
}

/// Disjunction of the given criteria.
pub fn or(criteria: Vec<Criteria>) -> Criteria {
    Criteria::Or(criteria)
}

/// Criteria matching the document stored under `id`.
pub fn by_id(id: &str) -> Criteria {
    field(DOC_ID).eq(id).into()
}

/// A fluent builder for conditions on a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    field_name: String,
    comparisons: Vec<Comparison>,
}

impl FieldFilter {
    /// Field equals `value`.
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Self {
        self.with(Comparison::Eq(value.into()))
    }

    /// Field differs from `value`.
    #[inline]
    pub fn neq<T: Into<Value>>(self, value: T) -> Self {
        self.with(Comparison::Neq(value.into()))
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Self {
        self.with(Comparison::Lt(value.into()))
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Self {
        self.with(Comparison::Lte(value.into()))
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Self {
        self.with(Comparison::Gt(value.into()))
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Self {
        self.with(Comparison::Gte(value.into()))
    }

    /// Field equals one of `values`.
    ///
    /// An empty list matches nothing.
    ///
    /// # Arguments
    ///
    /// * `values` - The candidate values
    pub fn in_array<T: Into<Value>>(self, values: Vec<T>) -> Self {
        self.with(Comparison::In(values.into_iter().map(Into::into).collect()))
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn comparisons(&self) -> &[Comparison] {
        &self.comparisons
    }

    /// Combines with another criteria using logical AND.
    pub fn and<C: Into<Criteria>>(self, other: C) -> Criteria {
        Criteria::from(self).and(other)
    }

    /// Combines with another criteria using logical OR.
    pub fn or<C: Into<Criteria>>(self, other: C) -> Criteria {
        Criteria::from(self).or(other)
    }

    fn with(mut self, comparison: Comparison) -> Self {
        self.comparisons.push(comparison);
        self
    }
}

impl From<FieldFilter> for Criteria {
    fn from(filter: FieldFilter) -> Self {
        let mut fields = IndexMap::with_capacity(1);
        fields.insert(filter.field_name, filter.comparisons);
        Criteria::Fields(fields)
    }
}
