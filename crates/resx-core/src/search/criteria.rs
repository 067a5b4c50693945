//! Match-URL parsing
//!
//! Grammar: `[Type?]name[:modifier]=value[,value...][&...]`
//!
//! - Repeated parameters are ANDed, comma lists are ORed
//! - `\,` is a literal comma inside a value
//! - Names and values are form-urlencoded (`+` is a space)

#![allow(clippy::result_large_err)]

use crate::errors::{ResxError, Result};
use crate::registry::{SchemaRegistry, SearchParamDef, SearchParamType};
use percent_encoding::percent_decode_str;

/// A parameter modifier (`name:modifier=value`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    /// `:exact` on a string parameter
    Exact,
    /// `:contains` on a string parameter
    Contains,
    /// `:missing=true|false` on any parameter
    Missing,
    /// `:Type` on a reference parameter
    TargetType(String),
}

/// Comparison prefix of a date value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl Comparator {
    /// Split a leading two-letter prefix off a date value
    pub fn split(value: &str) -> (Comparator, &str) {
        let prefixes = [
            ("eq", Comparator::Eq),
            ("ne", Comparator::Ne),
            ("gt", Comparator::Gt),
            ("lt", Comparator::Lt),
            ("ge", Comparator::Ge),
            ("le", Comparator::Le),
        ];
        for (prefix, cmp) in prefixes {
            if let Some(rest) = value.strip_prefix(prefix) {
                return (cmp, rest);
            }
        }
        (Comparator::Eq, value)
    }
}

/// One parsed `name[:modifier]=v1,v2` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParameter {
    pub name: String,
    pub param_type: SearchParamType,
    pub modifier: Option<Modifier>,
    /// Alternatives (OR)
    pub values: Vec<String>,
}

/// All clauses of a match URL (AND)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParameterMap {
    params: Vec<SearchParameter>,
}

impl SearchParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, param: SearchParameter) {
        self.params.push(param);
    }

    pub fn params(&self) -> &[SearchParameter] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parse a match URL against the schema of `resource_type`
    ///
    /// # Errors
    ///
    /// - `MalformedCriteria` on syntax errors, an unsupported modifier, or a
    ///   `Type?` prefix naming a different type
    /// - `UnknownParameter` when a name has no definition for the type
    pub fn parse(
        match_url: &str,
        resource_type: &str,
        registry: &SchemaRegistry,
    ) -> Result<Self> {
        let malformed = |reason: String| ResxError::MalformedCriteria {
            match_url: match_url.to_string(),
            reason,
        };

        let query = match match_url.split_once('?') {
            Some((prefix, query)) => {
                let prefix = prefix.rsplit('/').next().unwrap_or_default();
                if !prefix.is_empty() && prefix != resource_type {
                    return Err(malformed(format!(
                        "URL targets {} but the entry is a {}",
                        prefix, resource_type
                    )));
                }
                query
            }
            None => match_url,
        };

        let mut map = SearchParameterMap::new();
        for segment in query.split('&').filter(|s| !s.is_empty()) {
            check_raw_segment(segment).map_err(&malformed)?;

            let Some((raw_name, raw_value)) = segment.split_once('=') else {
                return Err(malformed(format!("'{}' has no '=' separator", segment)));
            };
            if raw_name.is_empty() {
                return Err(malformed("empty parameter name".to_string()));
            }

            let name = decode_component(raw_name).map_err(&malformed)?;
            let value = decode_component(raw_value).map_err(&malformed)?;

            let (base, modifier) = match name.split_once(':') {
                Some((base, modifier)) => (base.to_string(), Some(modifier.to_string())),
                None => (name, None),
            };
            if base.is_empty() {
                return Err(malformed("empty parameter name".to_string()));
            }

            let def = registry.lookup(resource_type, &base).ok_or_else(|| {
                ResxError::UnknownParameter {
                    resource_type: resource_type.to_string(),
                    parameter: base.clone(),
                }
            })?;

            let modifier = modifier
                .map(|m| parse_modifier(def, &m))
                .transpose()
                .map_err(&malformed)?;
            let values = split_values(&value);
            check_values(def, modifier.as_ref(), &values).map_err(&malformed)?;

            map.add(SearchParameter {
                name: base,
                param_type: def.param_type,
                modifier,
                values,
            });
        }

        if map.is_empty() {
            return Err(malformed("no search parameters".to_string()));
        }
        Ok(map)
    }
}

/// Reject raw text that form-urlencoded decoding would silently accept
// Form encoding: '+' is a space, then %XX escapes must yield valid UTF-8
fn decode_component(raw: &str) -> std::result::Result<String, String> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| format!("'{}' decodes to invalid UTF-8", raw))
}

fn check_raw_segment(segment: &str) -> std::result::Result<(), String> {
    if segment.chars().any(char::is_whitespace) {
        return Err(format!("unencoded whitespace in '{}'", segment));
    }
    let bytes = segment.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .map(|h| h.iter().all(u8::is_ascii_hexdigit))
                .unwrap_or(false);
            if !valid {
                return Err(format!("invalid percent escape in '{}'", segment));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

fn parse_modifier(def: &SearchParamDef, raw: &str) -> std::result::Result<Modifier, String> {
    let modifier = match (def.param_type, raw) {
        (_, "missing") => Modifier::Missing,
        (SearchParamType::String, "exact") => Modifier::Exact,
        (SearchParamType::String, "contains") => Modifier::Contains,
        (SearchParamType::Reference, t)
            if t.starts_with(|c: char| c.is_ascii_uppercase())
                && (def.targets.is_empty() || def.targets.iter().any(|x| x == t)) =>
        {
            Modifier::TargetType(t.to_string())
        }
        _ => {
            return Err(format!(
                "modifier ':{}' is not supported by parameter '{}'",
                raw, def.name
            ))
        }
    };
    Ok(modifier)
}

fn check_values(
    def: &SearchParamDef,
    modifier: Option<&Modifier>,
    values: &[String],
) -> std::result::Result<(), String> {
    if values.is_empty() || values.iter().any(String::is_empty) {
        return Err(format!("parameter '{}' has an empty value", def.name));
    }
    if modifier == Some(&Modifier::Missing) {
        if values.len() != 1 || !matches!(values[0].as_str(), "true" | "false") {
            return Err(format!("'{}:missing' takes true or false", def.name));
        }
        return Ok(());
    }
    if def.param_type == SearchParamType::Date {
        for value in values {
            let (_, date) = Comparator::split(value);
            let year_ok = date.len() >= 4 && date.as_bytes()[..4].iter().all(u8::is_ascii_digit);
            if !year_ok {
                return Err(format!("'{}' is not a date", value));
            }
        }
    }
    Ok(())
}

/// Split on unescaped commas, turning `\,` into a literal comma
fn split_values(raw: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&',') => {
                current.push(',');
                chars.next();
            }
            ',' => values.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    values.push(current);
    values
}
