use clap::{Args, Parser, Subcommand};
use std::num::NonZeroU32;
use std::path::PathBuf;
use tagcache_extract::models::Metadata;
use tagcache_extract::normalize;

#[derive(Debug, Parser)]
#[command(name = "tagcache", version, about = "Cached, normalized audio tag metadata")]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, short, global = true, value_name = "FILE", env = "TAGCACHE_CONFIG")]
    pub config: Option<PathBuf>,
    /// Cache database, overriding the configured location
    #[arg(long, global = true, value_name = "FILE")]
    pub database: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the metadata of audio files as JSON
    Show {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Change the tags of an audio file
    Edit(EditArgs),
    /// Save the embedded cover art of an audio file
    Art {
        path: PathBuf,
        /// Defaults to `cover.<ext>` in the current directory
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Drop cached metadata so it is read from the file again
    Forget {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List the known genre names
    Genres,
}

/// Fields to change. Anything not given keeps its current value; an empty
/// string clears a text field.
#[derive(Debug, Args)]
pub struct EditArgs {
    pub path: PathBuf,
    #[arg(long)]
    pub artist: Option<String>,
    #[arg(long)]
    pub album: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub year: Option<String>,
    #[arg(long)]
    pub genre: Option<String>,
    #[arg(long, conflicts_with = "clear_track")]
    pub track: Option<NonZeroU32>,
    #[arg(long, conflicts_with = "clear_disc")]
    pub disc: Option<NonZeroU32>,
    #[arg(long)]
    pub clear_track: bool,
    #[arg(long)]
    pub clear_disc: bool,
}
impl EditArgs {
    pub fn apply(&self, metadata: &mut Metadata) {
        let text = [
            (&self.artist, &mut metadata.artist),
            (&self.album, &mut metadata.album),
            (&self.title, &mut metadata.title),
            (&self.year, &mut metadata.year),
            (&self.genre, &mut metadata.genre),
        ];
        for (given, field) in text {
            if let Some(value) = given {
                *field = normalize::text(value).map(str::to_string);
            }
        }
        if self.clear_track {
            metadata.track_number = None;
        } else if self.track.is_some() {
            metadata.track_number = self.track;
        }
        if self.clear_disc {
            metadata.disc_number = None;
        } else if self.disc.is_some() {
            metadata.disc_number = self.disc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn edit(args: &[&str]) -> EditArgs {
        let cli = Cli::try_parse_from([&["tagcache", "edit", "a.mp3"][..], args].concat()).unwrap();
        match cli.command {
            Command::Edit(args) => args,
            other => panic!("expected edit, got {other:?}"),
        }
    }

    fn existing() -> Metadata {
        Metadata {
            artist: Some("Artist".to_string()),
            title: Some("Title".to_string()),
            track_number: NonZeroU32::new(3),
            disc_number: NonZeroU32::new(1),
            ..Metadata::default()
        }
    }

    #[test]
    fn test_edit_keeps_unspecified_fields() {
        let mut metadata = existing();
        edit(&["--title", "  New Title "]).apply(&mut metadata);
        assert_eq!(metadata.title.as_deref(), Some("New Title"));
        assert_eq!(metadata.artist.as_deref(), Some("Artist"));
        assert_eq!(metadata.track_number, NonZeroU32::new(3));
    }

    #[test]
    fn test_edit_clears() {
        let mut metadata = existing();
        edit(&["--artist", "", "--clear-track", "--disc", "2"]).apply(&mut metadata);
        assert_eq!(metadata.artist, None);
        assert_eq!(metadata.track_number, None);
        assert_eq!(metadata.disc_number, NonZeroU32::new(2));
    }

    #[rstest]
    #[case(&["--track", "0"])]
    #[case(&["--track", "2", "--clear-track"])]
    #[case(&["--disc", "two"])]
    fn test_edit_rejects(#[case] args: &[&str]) {
        let argv = [&["tagcache", "edit", "a.mp3"][..], args].concat();
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::try_parse_from(["tagcache", "show", "a.mp3", "--database", "/tmp/cache.db"]).unwrap();
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/cache.db")));
        assert!(Cli::try_parse_from(["tagcache", "show"]).is_err(), "show needs at least one path");
    }
}
