/// An embedded picture, as stored in the tag.
#[derive(Clone, PartialEq, Eq)]
pub struct Artwork {
    pub data: Vec<u8>,
    /// MIME type declared by the tag, e.g. `image/jpeg`.
    pub mime_type: String,
}
impl Artwork {
    /// A sensible file extension for the declared MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.to_ascii_lowercase().as_str() {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/bmp" => "bmp",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }
}

// The picture bytes are not interesting in logs or assertion failures.
impl std::fmt::Debug for Artwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artwork")
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}
