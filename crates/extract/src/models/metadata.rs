use std::num::NonZeroU32;

/// The canonical, normalized metadata of one audio file.
///
/// Text fields are trimmed and never empty; an absent value is `None`.
/// Stream properties default to zero when they could not be determined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Metadata {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    /// Kept as text: tags store anything from `1999` to `1999-03-02`.
    pub year: Option<String>,
    pub genre: Option<String>,
    pub track_number: Option<NonZeroU32>,
    pub disc_number: Option<NonZeroU32>,
    pub variable_bit_rate: bool,
    /// Average bit rate in kbit/s
    pub bit_rate: u32,
    /// Duration in whole seconds
    pub duration: u32,
    /// Lowercase file extension
    pub format: Option<String>,
    /// File size in bytes
    pub file_size: Option<u64>,
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_record() {
        let metadata: Metadata = serde_json::from_str(r#"{"title":"Intro","track_number":3}"#).unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Intro"));
        assert_eq!(metadata.track_number, NonZeroU32::new(3));
        assert_eq!(metadata.bit_rate, 0);
    }

    #[test]
    fn test_zero_track_is_rejected() {
        assert!(serde_json::from_str::<Metadata>(r#"{"track_number":0}"#).is_err());
    }
}
