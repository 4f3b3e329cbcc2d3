use bytes::Bytes;
use http::{HeaderName, HeaderValue};

use crate::error::HeaderError;

/// Hop-by-hop headers a handler may not set.
const FORBIDDEN: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "upgrade",
    "host",
    "http2-settings",
];

/// A single header as a name-value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: Bytes,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An ordered collection of HTTP headers or trailers.
///
/// Preserves insertion order and supports repeated names (e.g. multiple
/// `Set-Cookie` values). Lookups are case-insensitive.
///
/// Fields attached to a request, a response or a finished body are
/// immutable: every mutation then fails with [`HeaderError::Immutable`].
/// [`Clone`] always yields a mutable copy.
#[derive(Debug, Default)]
pub struct Fields {
    entries: Vec<Field>,
    immutable: bool,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mutable collection from name-value pairs.
    ///
    /// Every pair is validated; the first invalid or forbidden pair
    /// fails the whole construction.
    pub fn from_list<N, V>(list: impl IntoIterator<Item = (N, V)>) -> Result<Self, HeaderError>
    where
        N: Into<String>,
        V: Into<Bytes>,
    {
        let mut fields = Self::new();
        for (name, value) in list {
            fields.append(name, value)?;
        }
        Ok(fields)
    }

    /// Build an immutable collection on the caller's side.
    ///
    /// Only syntax is checked: a request legitimately carries headers
    /// such as `host` that handlers are not allowed to set.
    pub fn from_host_list<N, V>(
        list: impl IntoIterator<Item = (N, V)>,
    ) -> Result<Self, HeaderError>
    where
        N: Into<String>,
        V: Into<Bytes>,
    {
        let mut entries = Vec::new();
        for (name, value) in list {
            let field = Field::new(name, value);
            validate_syntax(&field.name, &field.value)?;
            entries.push(field);
        }
        Ok(Self {
            entries,
            immutable: true,
        })
    }

    /// All values for `name`, in insertion order.
    pub fn get(&self, name: &str) -> Vec<&[u8]> {
        self.entries
            .iter()
            .filter(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_ref())
            .collect()
    }

    /// The first value for `name`.
    pub fn first(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Replace every value for `name` with `values`.
    pub fn set<V: Into<Bytes>>(
        &mut self,
        name: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<(), HeaderError> {
        self.ensure_mutable()?;
        validate_name(name)?;
        check_allowed(name)?;
        let fresh = values
            .into_iter()
            .map(|value| {
                let field = Field::new(name, value);
                validate_value(&field.name, &field.value)?;
                Ok(field)
            })
            .collect::<Result<Vec<_>, HeaderError>>()?;
        self.entries.retain(|f| !f.name.eq_ignore_ascii_case(name));
        self.entries.extend(fresh);
        Ok(())
    }

    pub fn append(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Bytes>,
    ) -> Result<(), HeaderError> {
        self.ensure_mutable()?;
        let field = Field::new(name, value);
        validate(&field.name, &field.value)?;
        self.entries.push(field);
        Ok(())
    }

    /// Remove every value for `name`.
    pub fn delete(&mut self, name: &str) -> Result<(), HeaderError> {
        self.ensure_mutable()?;
        self.entries.retain(|f| !f.name.eq_ignore_ascii_case(name));
        Ok(())
    }

    pub fn entries(&self) -> &[Field] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    pub fn into_vec(self) -> Vec<Field> {
        self.entries
    }

    pub(crate) fn into_immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    fn ensure_mutable(&self) -> Result<(), HeaderError> {
        if self.immutable {
            return Err(HeaderError::Immutable);
        }
        Ok(())
    }
}

impl Clone for Fields {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            immutable: false,
        }
    }
}

impl PartialEq for Fields {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Fields {}

fn validate(name: &str, value: &[u8]) -> Result<(), HeaderError> {
    validate_syntax(name, value)?;
    check_allowed(name)
}

fn validate_syntax(name: &str, value: &[u8]) -> Result<(), HeaderError> {
    validate_name(name)?;
    validate_value(name, value)
}

// Accepted fields must always convert to `http` header types.
fn validate_name(name: &str) -> Result<(), HeaderError> {
    HeaderName::from_bytes(name.as_bytes())
        .map(drop)
        .map_err(|_| HeaderError::InvalidSyntax(format!("name {name:?}")))
}

fn validate_value(name: &str, value: &[u8]) -> Result<(), HeaderError> {
    HeaderValue::from_bytes(value)
        .map(drop)
        .map_err(|_| HeaderError::InvalidSyntax(format!("value for {name:?}")))
}

fn check_allowed(name: &str) -> Result<(), HeaderError> {
    if FORBIDDEN.iter().any(|f| f.eq_ignore_ascii_case(name)) {
        return Err(HeaderError::Forbidden(name.to_string()));
    }
    Ok(())
}
