mod artwork;
mod field;
mod metadata;

pub use self::artwork::Artwork;
pub use self::field::FieldKey;
pub use self::metadata::Metadata;
