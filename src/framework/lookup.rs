use crate::error::{Error, Missing};

/// The outcome of scanning an API listing for one entry.
///
/// Resolvers return this instead of an [`Option`] so that a miss has to be turned into an
/// [`Error`] before anything is built from the identifier.
///
/// See: [`Lookup::found_or`]
#[must_use]
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The listing contained a matching entry.
    Found(T),
    /// The listing was exhausted without a match.
    NotFound,
}

impl<T> Lookup<T> {
    /// Maps the value if [`self`] is [`Lookup::Found`].
    pub fn map<F, R>(self, f: F) -> Lookup<R>
    where
        F: FnOnce(T) -> R,
    {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::NotFound => Lookup::NotFound,
        }
    }

    /// Returns `true` if [`self`] is [`Lookup::Found`].
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Unwraps the value, or turns a miss into [`Error::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] carrying `missing` if [`self`] is [`Lookup::NotFound`].
    pub fn found_or(self, missing: Missing) -> Result<T, Error> {
        match self {
            Self::Found(value) => Ok(value),
            Self::NotFound => Err(Error::NotFound(missing)),
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Found(value),
            None => Self::NotFound,
        }
    }
}
