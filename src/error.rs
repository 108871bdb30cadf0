#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("SVG parse error: {0}")]
    SvgParse(String),
    #[error("Malformed path data at offset {position}: {reason}")]
    MalformedPathData { position: usize, reason: String },
    #[error("Malformed transform {fragment:?}: {reason}")]
    MalformedTransform { fragment: String, reason: String },
    #[error("Unresolvable length {value:?}: {reason}")]
    UnresolvableLength { value: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn path_data(position: usize, reason: impl Into<String>) -> Self {
        Error::MalformedPathData {
            position,
            reason: reason.into(),
        }
    }

    pub(crate) fn transform(fragment: &str, reason: impl Into<String>) -> Self {
        Error::MalformedTransform {
            fragment: fragment.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn length(value: &str, reason: impl Into<String>) -> Self {
        Error::UnresolvableLength {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Byte offset in `text` of the position reported by a `svgtypes` error.
///
/// `svgtypes` counts characters starting at 1. Errors without a position
/// (end of stream) map to the end of `text`.
pub(crate) fn svgtypes_offset(text: &str, e: &svgtypes::Error) -> usize {
    let char_pos = match *e {
        svgtypes::Error::UnexpectedData(pos)
        | svgtypes::Error::InvalidNumber(pos)
        | svgtypes::Error::InvalidChar(_, pos)
        | svgtypes::Error::InvalidString(_, pos) => pos,
        svgtypes::Error::UnexpectedEndOfStream | svgtypes::Error::InvalidValue => {
            return text.len()
        }
    };
    text.char_indices()
        .nth(char_pos.saturating_sub(1))
        .map_or(text.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svgtypes_offset() {
        let text = "é 1 x";
        assert_eq!(svgtypes_offset(text, &svgtypes::Error::UnexpectedData(1)), 0);
        assert_eq!(svgtypes_offset(text, &svgtypes::Error::InvalidNumber(5)), 5);
        assert_eq!(
            svgtypes_offset(text, &svgtypes::Error::UnexpectedEndOfStream),
            text.len()
        );
    }
}
