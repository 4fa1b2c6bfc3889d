use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// File extensions (lowercase, without the dot) the parser accepts.
pub const SUPPORTED_EXTENSIONS: [&str; 10] = ["mp3", "m4a", "aac", "ogg", "flac", "wav", "mpc", "mp+", "ape", "wma"];

// `\d` would also match non-ASCII digits, which `u32::from_str` rejects.
regex!(GENRE_REGEX, r"^\(([0-9]+)\).*$");
regex!(TRACK_REGEX, r"^([0-9]+)/[0-9]+$");
