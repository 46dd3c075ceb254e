use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Nested names and values attached below a definition path.
///
/// Keys are kept in order, so children derived from a template are always
/// emitted in the same sequence.
pub type Template = BTreeMap<String, TemplateValue>;

/// A single configured scalar as written in an inventory file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Flag(bool),
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(text) => f.write_str(text),
            Scalar::Integer(number) => write!(f, "{number}"),
            Scalar::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

/// One template entry. Sequences become multi-valued definitions, scalars
/// single-valued ones, maps nested containers and `null` a valueless leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
    Node(Template),
    Presence,
}

impl TemplateValue {
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        TemplateValue::Scalar(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        TemplateValue::List(values.into_iter().map(Into::into).collect())
    }

    pub fn node<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, TemplateValue)>,
        K: Into<String>,
    {
        TemplateValue::Node(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
