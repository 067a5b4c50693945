//! Transaction policies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a DELETE that finds nothing to delete is classified
///
/// Applies to conditional deletes whose match URL has zero candidates and to
/// deletes by id of a resource that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Fail the whole transaction (`UnresolvableTarget` / `ResourceNotFound`)
    #[default]
    Strict,
    /// Classify the entry as NOOP
    Idempotent,
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(DeletePolicy::Strict),
            "idempotent" => Ok(DeletePolicy::Idempotent),
            other => Err(format!(
                "unknown delete policy '{}' (expected strict or idempotent)",
                other
            )),
        }
    }
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeletePolicy::Strict => "strict",
            DeletePolicy::Idempotent => "idempotent",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_strict() {
        assert_eq!(DeletePolicy::default(), DeletePolicy::Strict);
    }

    #[test]
    fn test_parse_round_trip() {
        for policy in [DeletePolicy::Strict, DeletePolicy::Idempotent] {
            assert_eq!(policy.to_string().parse::<DeletePolicy>(), Ok(policy));
        }
        assert!("lenient".parse::<DeletePolicy>().is_err());
    }
}
