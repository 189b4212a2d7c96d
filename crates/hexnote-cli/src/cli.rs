use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hexnote",
    about = "hexnote — typed, hierarchical annotations for binary files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the available interpreters and their options
    Interpreters,
    /// Create an empty notebook for a binary
    Init(InitArgs),
    /// Print a notebook's annotation tree with decoded values
    Show(ShowArgs),
    /// Annotate a byte range
    Add(AddArgs),
    /// Remove the annotation covering exactly a byte range
    Remove(RangeArgs),
    /// Set or clear the note of an annotation
    Note(NoteArgs),
    /// Print the annotations covering an offset
    Path(PathArgs),
    /// Lay out a structure template at a position as a group of fields
    Drop(DropArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub notebook: PathBuf,
    /// The binary to annotate
    #[arg(long)]
    pub binary: PathBuf,
    /// Overwrite an existing notebook
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    pub notebook: PathBuf,
}

#[derive(Args)]
pub struct RangeArgs {
    pub notebook: PathBuf,
    #[arg(short, long)]
    pub position: u64,
    #[arg(short, long)]
    pub length: u64,
}

#[derive(Args)]
pub struct AddArgs {
    #[command(flatten)]
    pub range: RangeArgs,
    /// Interpreter type, e.g. uint32le or string
    #[arg(short, long, required_unless_present = "group", conflicts_with = "group")]
    pub interpreter: Option<String>,
    /// Interpreter option as KEY=VALUE (repeatable)
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    pub options: Vec<String>,
    /// Add a group instead of a leaf
    #[arg(short, long)]
    pub group: bool,
    #[arg(short, long)]
    pub note: Option<String>,
}

#[derive(Args)]
pub struct NoteArgs {
    #[command(flatten)]
    pub range: RangeArgs,
    /// New note; omit to clear
    pub text: Option<String>,
}

#[derive(Args)]
pub struct PathArgs {
    pub notebook: PathBuf,
    pub offset: u64,
}

#[derive(Args)]
pub struct DropArgs {
    pub notebook: PathBuf,
    /// Name of the structure to lay out
    pub structure: String,
    #[arg(short, long)]
    pub position: u64,
    /// TOML file with structure definitions; overrides the config file
    #[arg(long, value_name = "FILE")]
    pub structures: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["hexnote", "init", "a.hex", "--binary", "a.bin"]).unwrap();
        if let Command::Init(args) = cli.command {
            assert_eq!(args.notebook, PathBuf::from("a.hex"));
            assert_eq!(args.binary, PathBuf::from("a.bin"));
            assert!(!args.force);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_add_leaf_with_options() {
        let cli = Cli::try_parse_from([
            "hexnote", "add", "a.hex", "-p", "4", "-l", "8", "-i", "string", "-o", "charset=UTF-16LE",
            "--note", "name",
        ])
        .unwrap();
        if let Command::Add(args) = cli.command {
            assert_eq!(args.range.position, 4);
            assert_eq!(args.range.length, 8);
            assert_eq!(args.interpreter.as_deref(), Some("string"));
            assert_eq!(args.options, vec!["charset=UTF-16LE"]);
            assert_eq!(args.note.as_deref(), Some("name"));
            assert!(!args.group);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_add_group() {
        let cli = Cli::try_parse_from(["hexnote", "add", "a.hex", "-p", "0", "-l", "16", "--group"]).unwrap();
        if let Command::Add(args) = cli.command {
            assert!(args.group);
            assert!(args.interpreter.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn add_needs_interpreter_or_group() {
        assert!(Cli::try_parse_from(["hexnote", "add", "a.hex", "-p", "0", "-l", "4"]).is_err());
        assert!(Cli::try_parse_from([
            "hexnote", "add", "a.hex", "-p", "0", "-l", "4", "--group", "-i", "uint8"
        ])
        .is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "hexnote", "path", "a.hex", "12", "--format", "json", "--config", "hexnote.toml", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("hexnote.toml")));
        assert!(matches!(cli.command, Command::Path(PathArgs { offset: 12, .. })));
    }

    #[test]
    fn parse_note_clear() {
        let cli = Cli::try_parse_from(["hexnote", "note", "a.hex", "-p", "0", "-l", "4"]).unwrap();
        if let Command::Note(args) = cli.command {
            assert!(args.text.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_drop() {
        let cli = Cli::try_parse_from([
            "hexnote", "drop", "a.hex", "header", "-p", "16", "--structures", "formats.toml",
        ])
        .unwrap();
        if let Command::Drop(args) = cli.command {
            assert_eq!(args.structure, "header");
            assert_eq!(args.position, 16);
            assert_eq!(args.structures, Some(PathBuf::from("formats.toml")));
        } else {
            panic!("wrong command");
        }
        assert!(Cli::try_parse_from(["hexnote", "drop", "a.hex", "header"]).is_err());
    }
}
