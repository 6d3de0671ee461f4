//! Named query parameters.
//!
//! Queries are written with `%(name)s` placeholders. Before execution they
//! are rewritten to positional `$n` placeholders, one per distinct name, and
//! the values travel separately as bound parameters. `%%` is a literal `%`.

use crate::error::AppError;

/// Ordered name -> value mapping for one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, f64)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `name`.
    pub fn set(&mut self, name: &str, value: f64) -> &mut Self {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A query rewritten to positional placeholders, plus its values in order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    pub sql: String,
    pub names: Vec<String>,
    pub values: Vec<f64>,
}

/// Rewrite `%(name)s` placeholders in `query` to `$1..$n`.
pub fn bind_named(query: &str, params: &QueryParams) -> Result<BoundQuery, AppError> {
    let mut sql = String::with_capacity(query.len());
    let mut names: Vec<String> = Vec::new();
    let mut values = Vec::new();
    let mut rest = query;

    while let Some(pos) = rest.find('%') {
        sql.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("%%") {
            sql.push('%');
            rest = after;
            continue;
        }

        let Some(inner) = tail.strip_prefix("%(") else {
            return Err(AppError::query(format!(
                "Stray '%' in query at byte {}; use '%%' for a literal percent sign.",
                query.len() - tail.len()
            )));
        };
        let Some(close) = inner.find(")s") else {
            return Err(AppError::query("Unterminated named placeholder in query."));
        };

        let name = &inner[..close];
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AppError::query(format!("Invalid placeholder name '{name}' in query.")));
        }

        let index = match names.iter().position(|n| n == name) {
            Some(i) => i,
            None => {
                let value = params
                    .get(name)
                    .ok_or_else(|| AppError::query(format!("No value supplied for query parameter '{name}'.")))?;
                names.push(name.to_string());
                values.push(value);
                names.len() - 1
            }
        };
        sql.push_str(&format!("${}", index + 1));
        rest = &inner[close + 2..];
    }
    sql.push_str(rest);

    Ok(BoundQuery { sql, names, values })
}
