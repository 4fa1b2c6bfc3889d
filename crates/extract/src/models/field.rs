use std::fmt::{Display, Formatter, Result as FmtResult};

/// The tag fields the parser reads and writes, independent of tag format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FieldKey {
    Artist,
    Album,
    Title,
    Year,
    Genre,
    Track,
    Disc,
}
impl FieldKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Artist => "artist",
            FieldKey::Album => "album",
            FieldKey::Title => "title",
            FieldKey::Year => "year",
            FieldKey::Genre => "genre",
            FieldKey::Track => "track",
            FieldKey::Disc => "disc",
        }
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
