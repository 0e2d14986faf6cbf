//! Binding values and solution rows

use std::fmt;
use std::sync::Arc;

use fts_vocab::xsd;

use crate::error::{FtsError, Result};
use crate::var_registry::{VarId, VarRegistry};

/// A bound value in a solution
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    Unbound,
    /// IRI reference
    Iri(Arc<str>),
    /// Simple literal (implicitly `xsd:string`)
    Plain(Arc<str>),
    /// `xsd:double` literal
    Double(f64),
}

impl Binding {
    pub fn iri(iri: impl Into<Arc<str>>) -> Self {
        Binding::Iri(iri.into())
    }

    pub fn plain(text: impl Into<Arc<str>>) -> Self {
        Binding::Plain(text.into())
    }

    pub fn is_bound(&self) -> bool {
        !matches!(self, Binding::Unbound)
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Binding::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Binding::Plain(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Binding::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Datatype IRI for literal bindings
    pub fn datatype(&self) -> Option<&'static str> {
        match self {
            Binding::Plain(_) => Some(xsd::STRING),
            Binding::Double(_) => Some(xsd::DOUBLE),
            Binding::Unbound | Binding::Iri(_) => None,
        }
    }

    /// Lexical form: the IRI, the string, or the number
    pub fn lexical(&self) -> String {
        match self {
            Binding::Unbound => String::new(),
            Binding::Iri(s) | Binding::Plain(s) => s.to_string(),
            Binding::Double(d) => double_lexical(*d),
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Unbound => f.write_str("UNBOUND"),
            Binding::Iri(iri) => write!(f, "<{iri}>"),
            Binding::Plain(s) => write!(f, "{s:?}"),
            Binding::Double(d) => write!(f, "{}", double_lexical(*d)),
        }
    }
}

/// `1.0` rather than Rust's `1` so whole scores still read as doubles
fn double_lexical(d: f64) -> String {
    if d.is_finite() && d.fract() == 0.0 && d.abs() < 1e15 {
        format!("{d:.1}")
    } else {
        d.to_string()
    }
}

/// One solution: a value per schema variable
///
/// # Invariants
///
/// - `values.len() == schema.len()`
/// - the schema contains no duplicate VarIds
#[derive(Clone, Debug, PartialEq)]
pub struct BindingRow {
    schema: Arc<[VarId]>,
    values: Vec<Binding>,
}

impl BindingRow {
    pub fn new(schema: Arc<[VarId]>, values: Vec<Binding>) -> Result<Self> {
        if schema.len() != values.len() {
            return Err(FtsError::Internal(format!(
                "row has {} values for {} variables",
                values.len(),
                schema.len()
            )));
        }
        for (i, &var) in schema.iter().enumerate() {
            if schema.iter().take(i).any(|&v| v == var) {
                return Err(FtsError::Internal(format!(
                    "duplicate variable {var:?} in row schema"
                )));
            }
        }
        Ok(Self { schema, values })
    }

    pub fn schema(&self) -> &[VarId] {
        &self.schema
    }

    pub fn get(&self, var: VarId) -> Option<&Binding> {
        self.schema
            .iter()
            .position(|&v| v == var)
            .map(|i| &self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &Binding)> {
        self.schema.iter().copied().zip(self.values.iter())
    }

    /// Pairs of (bare variable name, value), in schema order
    pub fn named<'a>(
        &'a self,
        vars: &'a VarRegistry,
    ) -> impl Iterator<Item = (&'a str, &'a Binding)> + 'a {
        self.iter().map(move |(v, b)| (vars.bare_name(v), b))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
