use crate::errors::{DocError, DocResult, ErrorKind};
use serde_json::Value;
use std::fmt::Display;

/// One parameter slot of a raw fragment.
///
/// `Bind` values are sent to the storage engine as positional parameters.
/// `Literal` values are spliced into the SQL text as-is, bypassing binding:
/// never route untrusted input through this variant.
#[derive(Debug, Clone, PartialEq)]
pub enum RawParam {
    Bind(Value),
    Literal(String),
}

impl RawParam {
    pub fn bind<T: Into<Value>>(value: T) -> Self {
        RawParam::Bind(value.into())
    }

    pub fn literal<T: Display>(value: T) -> Self {
        RawParam::Literal(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum RawPart {
    Text(String),
    Param(RawParam),
}

/// A hand-written SQL fragment with interleaved parameters.
///
/// Raw fragments are used where the criteria algebra is not expressive enough:
/// as a filter (`WHERE` predicate) or as the new value expression of an update.
/// Inside a fragment the stored document is available as the `value` column.
///
/// # Examples
///
/// ```rust,ignore
/// use litedoc::filter::{RawFragment, RawParam};
///
/// // built fluently
/// let adults = RawFragment::new("json_extract(value, '$.age') >= ")
///     .bind(18);
///
/// // built from a template: one more segment than parameters
/// let increment = RawFragment::from_template(
///     &["json_set(value, '$.visits', json_extract(value, '$.visits') + ", ")"],
///     vec![RawParam::bind(1)],
/// )?;
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawFragment {
    parts: Vec<RawPart>,
}

impl RawFragment {
    /// Starts a fragment with a literal text segment.
    pub fn new(text: &str) -> Self {
        RawFragment {
            parts: vec![RawPart::Text(text.to_string())],
        }
    }

    /// Builds a fragment from template segments and the parameters between them.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCriteria` unless `segments.len() == params.len() + 1`.
    pub fn from_template(segments: &[&str], params: Vec<RawParam>) -> DocResult<Self> {
        if segments.len() != params.len() + 1 {
            log::error!(
                "Raw template has {} segments for {} parameters",
                segments.len(),
                params.len()
            );
            return Err(DocError::new(
                &format!(
                    "Raw template needs exactly one more segment than parameters, got {} segments and {} parameters",
                    segments.len(),
                    params.len()
                ),
                ErrorKind::InvalidCriteria,
            ));
        }

        let mut parts = Vec::with_capacity(segments.len() + params.len());
        let mut params = params.into_iter();
        for (i, segment) in segments.iter().enumerate() {
            parts.push(RawPart::Text(segment.to_string()));
            if i < segments.len() - 1 {
                if let Some(param) = params.next() {
                    parts.push(RawPart::Param(param));
                }
            }
        }
        Ok(RawFragment { parts })
    }

    /// Appends literal SQL text.
    pub fn push(mut self, text: &str) -> Self {
        self.parts.push(RawPart::Text(text.to_string()));
        self
    }

    /// Appends a bound parameter, rendered as a `?` placeholder.
    pub fn bind<T: Into<Value>>(mut self, value: T) -> Self {
        self.parts.push(RawPart::Param(RawParam::Bind(value.into())));
        self
    }

    /// Appends a value spliced directly into the SQL text, without binding.
    pub fn literal<T: Display>(mut self, value: T) -> Self {
        self.parts
            .push(RawPart::Param(RawParam::Literal(value.to_string())));
        self
    }

    /// Number of bound parameters.
    pub fn bound_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, RawPart::Param(RawParam::Bind(_))))
            .count()
    }

    /// True when the fragment renders to blank text.
    pub fn is_empty(&self) -> bool {
        self.render().0.trim().is_empty()
    }

    /// Renders the fragment into SQL text and its ordered parameters.
    pub(crate) fn render(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::with_capacity(self.bound_count());
        for part in &self.parts {
            match part {
                RawPart::Text(text) => sql.push_str(text),
                RawPart::Param(RawParam::Bind(value)) => {
                    sql.push('?');
                    params.push(value.clone());
                }
                RawPart::Param(RawParam::Literal(text)) => sql.push_str(text),
            }
        }
        (sql, params)
    }
}

impl Display for RawFragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render().0)
    }
}
