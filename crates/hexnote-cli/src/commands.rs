use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context as _};
use colored::Colorize;
use hexnote_anno::{
    Annotation, AnnotationCollection, AnnotationColumn, AnnotationId, AnnotationTable, CellValue,
    MemoryAnnotationCollection, StructureLibrary,
};
use hexnote_interp::{InterpreterRegistry, OptionValue, OptionValues};
use hexnote_notebook::{Notebook, NotebookStorage};
use hexnote_types::{ByteBinary, Range};
use serde_json::json;
use tracing::{debug, warn};

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let registry = Arc::new(InterpreterRegistry::with_defaults());
    let ctx = Session {
        storage: NotebookStorage::with_config(registry, config.storage),
        format: cli.format,
        structures: config.structures,
    };
    match cli.command {
        Command::Interpreters => cmd_interpreters(&ctx),
        Command::Init(args) => cmd_init(&ctx, args),
        Command::Show(args) => cmd_show(&ctx, args),
        Command::Add(args) => cmd_add(&ctx, args),
        Command::Remove(args) => cmd_remove(&ctx, args),
        Command::Note(args) => cmd_note(&ctx, args),
        Command::Path(args) => cmd_path(&ctx, args),
        Command::Drop(args) => cmd_drop(&ctx, args),
    }
}

struct Session {
    storage: NotebookStorage,
    format: OutputFormat,
    structures: Option<PathBuf>,
}

impl Session {
    fn load(&self, path: &Path) -> anyhow::Result<Notebook> {
        self.storage
            .read_file(path)
            .with_context(|| format!("cannot load notebook {}", path.display()))
    }

    fn save(&self, notebook: &Notebook, path: &Path) -> anyhow::Result<()> {
        self.storage
            .write_file(notebook, path)
            .with_context(|| format!("cannot save notebook {}", path.display()))
    }

    /// Open the binary a notebook refers to. Relative locations resolve
    /// against the notebook's directory.
    fn open_binary(&self, notebook: &Notebook, notebook_path: &Path) -> anyhow::Result<ByteBinary> {
        let location = notebook.binary_path().ok_or_else(|| {
            anyhow!("binary {} is not a local file", notebook.binary_location())
        })?;
        let path = match notebook_path.parent() {
            Some(dir) if location.is_relative() => dir.join(&location),
            _ => location,
        };
        ByteBinary::open(&path).with_context(|| format!("cannot open binary {}", path.display()))
    }
}

fn find_range(annotations: &MemoryAnnotationCollection, args: &RangeArgs) -> anyhow::Result<AnnotationId> {
    annotations
        .find_exact(args.position, args.length)
        .ok_or_else(|| {
            anyhow!(
                "no annotation covers exactly {}+{}",
                args.position,
                args.length
            )
        })
}

fn cmd_interpreters(ctx: &Session) -> anyhow::Result<()> {
    let registry = ctx.storage.registry();
    if ctx.format == OutputFormat::Json {
        let listing: Vec<_> = registry
            .list_available()
            .map(|info| {
                let options: Vec<_> = info
                    .options()
                    .iter()
                    .map(|spec| {
                        json!({
                            "key": spec.key,
                            "name": spec.display_name,
                            "type": spec.value_type.to_string(),
                            "default": spec.default_value,
                        })
                    })
                    .collect();
                json!({"type": info.type_name(), "name": info.human_name(), "options": options})
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    for info in registry.list_available() {
        println!("{:<10} {}", info.type_name().bold(), info.human_name());
        for spec in info.options() {
            println!(
                "{:<10}   {}={} ({}, {})",
                "",
                spec.key.cyan(),
                spec.default_value,
                spec.display_name,
                spec.value_type
            );
        }
    }
    Ok(())
}

fn cmd_init(ctx: &Session, args: InitArgs) -> anyhow::Result<()> {
    if args.notebook.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            args.notebook.display()
        );
    }
    if !ctx.storage.is_notebook_path(&args.notebook) {
        warn!(
            path = %args.notebook.display(),
            extension = %ctx.storage.config().file_extension,
            "notebook path does not use the configured extension"
        );
    }
    let binary = ByteBinary::open(&args.binary)
        .with_context(|| format!("cannot open binary {}", args.binary.display()))?;
    let location = args
        .binary
        .canonicalize()
        .unwrap_or_else(|_| args.binary.clone());
    let notebook = Notebook::for_binary(location.display().to_string(), &binary)?;
    ctx.save(&notebook, &args.notebook)?;

    println!(
        "{} Initialized notebook {}",
        "✓".green().bold(),
        args.notebook.display().to_string().bold()
    );
    println!("  Binary: {} ({} bytes)", location.display().to_string().cyan(), binary.as_bytes().len());
    Ok(())
}

fn cmd_show(ctx: &Session, args: ShowArgs) -> anyhow::Result<()> {
    let notebook = ctx.load(&args.notebook)?;
    if ctx.format == OutputFormat::Json {
        let rendered = ctx.storage.render(&notebook)?;
        print!("{}", String::from_utf8_lossy(&rendered));
        return Ok(());
    }

    let binary = ctx.open_binary(&notebook, &args.notebook)?;
    let (location, annotations) = notebook.into_parts();
    let table = AnnotationTable::new(annotations, binary);
    let root = table.annotations().root_group();
    println!("{} {}", location.bold(), root.range().to_string().dimmed());
    if let Some(note) = root.note() {
        println!("  {}", note.italic());
    }

    let rows = table.annotations().walk();
    if rows.is_empty() {
        println!("No annotations.");
        return Ok(());
    }
    for (depth, id) in rows {
        let Some(annotation) = table.annotations().get(id) else {
            continue;
        };
        let indent = "  ".repeat(depth + 1);
        let kind = table.value_at(id, AnnotationColumn::Type)?;
        let value = match table.value_at(id, AnnotationColumn::Value) {
            Ok(CellValue::Value(None)) => String::new(),
            Ok(cell) => format!(" = {}", cell.to_string().green()),
            Err(err) => format!(" = {}", err.to_string().red()),
        };
        let note = match annotation.note() {
            Some(note) => format!("  # {note}").dimmed().to_string(),
            None => String::new(),
        };
        println!(
            "{indent}{} {}{}{}",
            annotation.range().to_string().yellow(),
            kind.to_string().bold(),
            value,
            note
        );
    }
    Ok(())
}

fn parse_options(registry: &InterpreterRegistry, type_name: &str, raw: &[String]) -> anyhow::Result<OptionValues> {
    let info = registry
        .find(type_name)
        .ok_or_else(|| anyhow!("unknown interpreter {type_name:?}; see `hexnote interpreters`"))?;
    let mut options = OptionValues::new();
    for entry in raw {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("option {entry:?} is not KEY=VALUE"))?;
        let parsed = match info.options().iter().find(|spec| spec.key == key) {
            Some(spec) => OptionValue::parse_as(value, spec.value_type).ok_or_else(|| {
                anyhow!("option {key} expects a {} value, got {value:?}", spec.value_type)
            })?,
            None => OptionValue::from(value),
        };
        options.insert(key, parsed);
    }
    Ok(options)
}

fn cmd_add(ctx: &Session, args: AddArgs) -> anyhow::Result<()> {
    let mut notebook = ctx.load(&args.range.notebook)?;
    let range = Range::new(args.range.position, args.range.length)?;

    let annotation = match &args.interpreter {
        Some(type_name) => {
            let options = parse_options(ctx.storage.registry(), type_name, &args.options)?;
            let interpreter = ctx.storage.registry().create(type_name, &options)?;
            if let Some(width) = interpreter.fixed_length() {
                if width != range.length() {
                    bail!(
                        "{} reads exactly {width} bytes, but the range is {} bytes long",
                        interpreter.type_name(),
                        range.length()
                    );
                }
            }
            Annotation::leaf(range, interpreter)
        }
        None => Annotation::group(range),
    };
    let annotation = match args.note {
        Some(note) => annotation.with_note(note),
        None => annotation,
    };

    let id = notebook.annotations_mut().add(annotation)?;
    debug!(%id, %range, "annotation added from command line");
    ctx.save(&notebook, &args.range.notebook)?;
    println!("{} Added {}", "✓".green().bold(), range.to_string().yellow());
    Ok(())
}

fn cmd_remove(ctx: &Session, args: RangeArgs) -> anyhow::Result<()> {
    let mut notebook = ctx.load(&args.notebook)?;
    let id = find_range(notebook.annotations(), &args)?;
    let removed = notebook.annotations().walk().len();
    notebook.annotations_mut().remove(id)?;
    let removed = removed - notebook.annotations().walk().len();
    ctx.save(&notebook, &args.notebook)?;
    println!(
        "{} Removed {} ({} annotation{})",
        "✓".green().bold(),
        format!("[{}, {})", args.position, args.position + args.length).yellow(),
        removed,
        if removed == 1 { "" } else { "s" }
    );
    Ok(())
}

fn cmd_note(ctx: &Session, args: NoteArgs) -> anyhow::Result<()> {
    let mut notebook = ctx.load(&args.range.notebook)?;
    let id = find_range(notebook.annotations(), &args.range)?;
    let cleared = args.text.as_deref().map_or(true, str::is_empty);
    notebook.annotations_mut().set_note(id, args.text)?;
    ctx.save(&notebook, &args.range.notebook)?;
    let verb = if cleared { "Cleared" } else { "Set" };
    println!("{} {verb} note on {id}", "✓".green().bold());
    Ok(())
}

fn cmd_path(ctx: &Session, args: PathArgs) -> anyhow::Result<()> {
    let notebook = ctx.load(&args.notebook)?;
    let annotations = notebook.annotations();
    let path = annotations.path_at(args.offset).ok_or_else(|| {
        anyhow!(
            "offset {} is outside the binary {}",
            args.offset,
            annotations.root_group().range()
        )
    })?;

    if ctx.format == OutputFormat::Json {
        let entries: Vec<_> = path
            .iter()
            .filter_map(|id| annotations.get(*id))
            .map(|annotation| {
                json!({
                    "position": annotation.range().position(),
                    "length": annotation.range().length(),
                    "type": annotation.interpreter().map(|i| i.type_name().to_string()),
                    "note": annotation.note(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if path.is_empty() {
        println!("Offset {} is not annotated.", args.offset.to_string().bold());
        return Ok(());
    }
    for (depth, id) in path.iter().enumerate() {
        let Some(annotation) = annotations.get(*id) else {
            continue;
        };
        let kind = match annotation.interpreter() {
            Some(interpreter) => interpreter.type_name().to_string(),
            None => "group".to_string(),
        };
        println!(
            "{}{} {}{}",
            "  ".repeat(depth),
            annotation.range().to_string().yellow(),
            kind.bold(),
            annotation
                .note()
                .map(|note| format!("  # {note}").dimmed().to_string())
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn cmd_drop(ctx: &Session, args: DropArgs) -> anyhow::Result<()> {
    let source = args
        .structures
        .as_deref()
        .or(ctx.structures.as_deref())
        .ok_or_else(|| anyhow!("no structure definitions: pass --structures or set `structures` in the config file"))?;
    let library = StructureLibrary::load(source)
        .with_context(|| format!("cannot load structures from {}", source.display()))?;

    let mut notebook = ctx.load(&args.notebook)?;
    let before = notebook.annotations().len();
    let id = library.drop_at(
        ctx.storage.registry(),
        notebook.annotations_mut(),
        &args.structure,
        args.position,
    )?;
    let added = notebook.annotations().len() - before;
    let range = notebook
        .annotations()
        .get(id)
        .map(|annotation| annotation.range().to_string())
        .unwrap_or_default();
    ctx.save(&notebook, &args.notebook)?;
    println!(
        "{} Dropped {} at {} ({added} annotations)",
        "✓".green().bold(),
        args.structure.bold(),
        range.yellow()
    );
    Ok(())
}
