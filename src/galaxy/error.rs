use thiserror::Error;

pub type GalaxyResult<T> = Result<T, GalaxyError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GalaxyError {
    /// A parameter failed validation; nothing was generated.
    #[error("invalid galaxy parameter `{field}`: {reason}")]
    InvalidParameter {
        field: &'static str,
        reason: &'static str,
    },

    #[error("invalid hex color {0:?}, expected #rrggbb")]
    InvalidHexColor(String),
}

impl GalaxyError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::InvalidParameter { field, reason }
    }

    /// Name of the offending parameter, if this is a validation failure.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidParameter { field, .. } => Some(field),
            Self::InvalidHexColor(_) => None,
        }
    }
}
