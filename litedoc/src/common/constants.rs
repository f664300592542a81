// doc constants
pub const DOC_ID: &str = "id";

// column constants
pub const VALUE_COLUMN: &str = "value";
pub const ID_COLUMN: &str = "id";
pub const ROW_LOCATOR_COLUMN: &str = "rowid";
pub const COUNT_COLUMN: &str = "count";

// sql constants
pub const JSON_ROOT: &str = "$";
pub const ALWAYS_FALSE: &str = "1 = 0";
pub const UNBOUNDED_LIMIT: i64 = -1;

// name constants
pub const FORBIDDEN_NAME_CHARS: [char; 2] = ['"', '\''];
