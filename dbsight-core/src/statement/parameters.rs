//! Parameter substitution for explain plans.
//!
//! Explain plans have to run against literal SQL, so the parameter values a
//! command was executed with are rendered back into its text.

use crate::error::DbSightError;
use crate::models::{CommandType, DatastoreVendor};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Driver-level parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbType {
    AnsiString,
    AnsiStringFixedLength,
    Binary,
    Boolean,
    Byte,
    Currency,
    Date,
    DateTime,
    DateTime2,
    DateTimeOffset,
    Decimal,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    Object,
    SByte,
    Single,
    String,
    StringFixedLength,
    Time,
    UInt16,
    UInt32,
    UInt64,
    VarNumeric,
    Xml,
}

impl DbType {
    /// Types whose values are rendered as quoted SQL strings.
    pub const fn is_quotable(self) -> bool {
        matches!(
            self,
            Self::String
                | Self::StringFixedLength
                | Self::AnsiString
                | Self::AnsiStringFixedLength
                | Self::Xml
                | Self::Guid
                | Self::Date
                | Self::DateTime
                | Self::DateTime2
                | Self::DateTimeOffset
                | Self::Time
        )
    }

    /// Types whose values cannot be rendered back into valid SQL.
    pub const fn is_unsupported(self) -> bool {
        matches!(self, Self::Binary | Self::Object)
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A parameter value as captured from the driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParameterValue {
    fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            Self::Text(t) if t.eq_ignore_ascii_case("true") || t == "1" => Some(true),
            Self::Text(t) if t.eq_ignore_ascii_case("false") || t == "0" => Some(false),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(t) => f.write_str(t),
        }
    }
}

/// One bound command parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandParameter {
    /// Parameter name, with or without the leading `@`
    pub name: String,
    pub db_type: DbType,
    pub value: ParameterValue,
}

impl CommandParameter {
    /// Creates a parameter.
    pub fn new(name: impl Into<String>, db_type: DbType, value: ParameterValue) -> Self {
        Self {
            name: name.into(),
            db_type,
            value,
        }
    }

    /// The SQL literal for this parameter's value.
    fn render(&self) -> String {
        match &self.value {
            ParameterValue::Null => ParameterValue::Null.to_string(),
            value if self.db_type.is_quotable() => quote_string(&value.to_string()),
            value if self.db_type == DbType::Boolean => match value.as_bool() {
                Some(true) => "1".to_string(),
                Some(false) => "0".to_string(),
                None => value.to_string(),
            },
            value => value.to_string(),
        }
    }
}

/// A database command as seen by the instrumentation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandInput {
    pub text: String,
    pub command_type: CommandType,
    pub vendor: DatastoreVendor,
    pub parameters: Vec<CommandParameter>,
}

impl CommandInput {
    /// Creates a text command with no parameters.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Builder method to set the command type.
    pub fn with_command_type(mut self, command_type: CommandType) -> Self {
        self.command_type = command_type;
        self
    }

    /// Builder method to set the vendor.
    pub fn with_vendor(mut self, vendor: DatastoreVendor) -> Self {
        self.vendor = vendor;
        self
    }

    /// Builder method to add a parameter.
    pub fn with_parameter(mut self, parameter: CommandParameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// Renders the command's parameter values into its text.
///
/// Stored-procedure commands and commands without parameters are returned
/// unchanged. All names are replaced in one pass over the original text, so
/// a rendered value is never substituted into again. Longer names are tried
/// first so `@id` cannot clobber `@id2`, and a name only matches at a word
/// boundary. When a name repeats, its first parameter wins.
///
/// # Errors
/// Returns [`DbSightError::UnsupportedParameter`] if any parameter is
/// `Binary` or `Object`; callers skip the explain plan in that case.
///
/// # Example
/// ```rust
/// use dbsight_core::statement::{CommandInput, CommandParameter, DbType, ParameterValue, fix_parameterized_sql};
///
/// let command = CommandInput::new("select * from users where name = @name")
///     .with_parameter(CommandParameter::new("name", DbType::String, ParameterValue::Text("O'Neil".into())));
///
/// let sql = fix_parameterized_sql(&command).unwrap();
/// assert_eq!(sql, "select * from users where name = 'O''Neil'");
/// ```
pub fn fix_parameterized_sql(command: &CommandInput) -> crate::Result<Cow<'_, str>> {
    if command.command_type == CommandType::StoredProcedure || command.parameters.is_empty() {
        return Ok(Cow::Borrowed(&command.text));
    }

    if let Some(parameter) = command
        .parameters
        .iter()
        .find(|p| p.db_type.is_unsupported())
    {
        tracing::debug!(
            db_type = %parameter.db_type,
            "Not executing explain plan for unsupported parameter type"
        );
        return Err(DbSightError::unsupported_parameter(
            &parameter.name,
            parameter.db_type.to_string(),
        ));
    }

    let mut rendered: HashMap<&str, String> = HashMap::with_capacity(command.parameters.len());
    for parameter in &command.parameters {
        let name = bare_name(&parameter.name);
        if !name.is_empty() {
            rendered.entry(name).or_insert_with(|| parameter.render());
        }
    }
    if rendered.is_empty() {
        return Ok(Cow::Borrowed(&command.text));
    }

    let mut names: Vec<&str> = rendered.keys().copied().collect();
    names.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");

    // `@` is not a word character, so the boundary goes after it.
    let pattern = Regex::new(&format!(r"@\b(?:{})\b", alternation)).map_err(|err| {
        DbSightError::configuration(format!("Parameter names do not form a valid pattern: {}", err))
    })?;

    Ok(pattern.replace_all(&command.text, |caps: &Captures<'_>| {
        rendered
            .get(caps[0].trim_start_matches('@'))
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    }))
}

fn bare_name(name: &str) -> &str {
    name.trim_start_matches('@')
}

/// Wraps in single quotes, doubling embedded ones.
fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
