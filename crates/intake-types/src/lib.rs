//! Validated text types shared across the intake crates.
//!
//! Form input arrives as raw strings from the browser. Most of it is stored verbatim, but a
//! few values (symptom names, uploaded filenames, declared media types) must carry content to
//! be useful. The wrappers here make that guarantee once, at construction.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The media type did not have a `type/subtype` shape
    #[error("Invalid media type: '{0}'")]
    InvalidMediaType(String),
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction, so two
/// entries typed as `"Fever"` and `" Fever "` compare equal once wrapped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A declared media type such as `image/png`, kept exactly as the client sent it.
///
/// This is the type the *client* claims for an upload. Nothing here inspects file content;
/// acceptance decisions are made purely on this declared value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType(String);

impl MediaType {
    /// Parses a declared media type.
    ///
    /// Parameters after `;` are kept. Only a non-empty top-level type followed by `/` is
    /// required; the subtype may be empty, as in a bare `image/`.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` for blank input and `TextError::InvalidMediaType` when there
    /// is no `/` after a non-empty type.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }

        let essence = trimmed.split(';').next().unwrap_or_default().trim();
        match essence.split_once('/') {
            Some((top, _)) if !top.is_empty() => Ok(Self(trimmed.to_owned())),
            _ => Err(TextError::InvalidMediaType(trimmed.to_owned())),
        }
    }

    /// Returns true when the declared type begins with `image/`, compared case-sensitively.
    pub fn is_image(&self) -> bool {
        self.0.starts_with("image/")
    }

    /// Returns the full media type string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for MediaType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for MediaType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MediaType::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Sore throat \n").unwrap();
        assert_eq!(text.as_str(), "Sore throat");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
        assert_eq!(NonEmptyText::new(""), Err(TextError::Empty));
    }

    #[test]
    fn non_empty_text_deserialize_rejects_blank() {
        let result: Result<NonEmptyText, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }

    #[test]
    fn media_type_detects_image_prefix() {
        assert!(MediaType::parse("image/png").unwrap().is_image());
        assert!(MediaType::parse("image/").unwrap().is_image());
        assert!(!MediaType::parse("IMAGE/JPEG").unwrap().is_image());
        assert_eq!(MediaType::parse("image/PNG").unwrap().as_str(), "image/PNG");
        assert!(!MediaType::parse("application/pdf").unwrap().is_image());
        assert!(!MediaType::parse("text/plain; charset=utf-8").unwrap().is_image());
    }

    #[test]
    fn media_type_rejects_malformed_values() {
        assert!(matches!(
            MediaType::parse("image"),
            Err(TextError::InvalidMediaType(_))
        ));
        assert!(matches!(
            MediaType::parse("/png"),
            Err(TextError::InvalidMediaType(_))
        ));
        assert_eq!(MediaType::parse(" "), Err(TextError::Empty));
    }
}
