use indexmap::IndexMap;
use std::fmt::Display;

/// Specifies the direction for sorting documents.
///
/// # Variants
/// - `Ascending`: Sort from smallest to largest value (A to Z, 0 to 9)
/// - `Descending`: Sort from largest to smallest value (Z to A, 9 to 0)
///
/// # Usage
/// ```text
/// let query = users.query().sort_by("age", SortOrder::Descending);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in ascending order (smallest to largest, A-Z)
    Ascending,
    /// Sort in descending order (largest to smallest, Z-A)
    Descending,
}

impl SortOrder {
    /// The SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// Ordered mapping of field name to sort direction.
///
/// Iteration order is declaration order: the first field added is the
/// primary sort key. Re-adding a field keeps its original position and
/// replaces its direction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortSpec {
    fields: IndexMap<String, SortOrder>,
}

impl SortSpec {
    pub fn new() -> Self {
        SortSpec {
            fields: IndexMap::new(),
        }
    }

    /// Returns a new spec with `field_name` appended as the next sort key.
    pub fn then_by(mut self, field_name: &str, sort_order: SortOrder) -> Self {
        self.fields.insert(field_name.to_string(), sort_order);
        self
    }

    pub fn asc(self, field_name: &str) -> Self {
        self.then_by(field_name, SortOrder::Ascending)
    }

    pub fn desc(self, field_name: &str) -> Self {
        self.then_by(field_name, SortOrder::Descending)
    }

    /// Sort keys in application order.
    pub fn sorting_order(&self) -> Vec<(String, SortOrder)> {
        self.fields
            .iter()
            .map(|(name, order)| (name.clone(), *order))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Creates a sort spec with a single key.
pub fn order_by(field_name: &str, sort_order: SortOrder) -> SortSpec {
    SortSpec::new().then_by(field_name, sort_order)
}
