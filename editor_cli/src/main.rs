//! modal-edit - drive the modal editing engine from the command line.
//!
//! Usage: modal-edit [OPTIONS] FILE
//!
//! Options:
//!   --keys SCRIPT      keys to replay, e.g. "dw3jA;<Esc>"
//!   --keys-file PATH   read the key script from a file
//!   --config PATH      JSON engine configuration
//!   --tab-size N       override the configured tab size
//!   --clipboard        mirror deletes and yanks to the system clipboard
//!   --output PATH      write the result here instead of saving FILE
//!   --report           print a JSON summary of the session to stdout

mod clipboard;

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use modal_edit_core::{Editor, EngineConfig, Key};
use serde::Serialize;

use clipboard::ClipboardRegister;

#[derive(Debug, Default)]
struct Args {
    file: Option<PathBuf>,
    keys: String,
    config: Option<PathBuf>,
    tab_size: Option<usize>,
    clipboard: bool,
    output: Option<PathBuf>,
    report: bool,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = Args::default();
        let mut iter = env::args().skip(1);
        while let Some(arg) = iter.next() {
            let mut value = |name: &str| {
                iter.next()
                    .with_context(|| format!("{} expects a value", name))
            };
            match arg.as_str() {
                "--keys" => args.keys.push_str(&value("--keys")?),
                "--keys-file" => {
                    let path = value("--keys-file")?;
                    let script = fs::read_to_string(&path)
                        .with_context(|| format!("reading key script {}", path))?;
                    args.keys.push_str(script.trim_end_matches('\n'));
                }
                "--config" => args.config = Some(PathBuf::from(value("--config")?)),
                "--tab-size" => {
                    let n = value("--tab-size")?;
                    args.tab_size = Some(n.parse().with_context(|| format!("bad tab size {}", n))?);
                }
                "--output" => args.output = Some(PathBuf::from(value("--output")?)),
                "--clipboard" => args.clipboard = true,
                "--report" => args.report = true,
                flag if flag.starts_with("--") => bail!("unknown option {}", flag),
                _ if args.file.is_none() => args.file = Some(PathBuf::from(&arg)),
                _ => bail!("unexpected argument {}", arg),
            }
        }
        Ok(args)
    }

    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => EngineConfig::default(),
        };
        if let Some(tab_size) = self.tab_size {
            config.tab_size = tab_size;
        }
        Ok(config)
    }
}

/// Summary printed by `--report`.
#[derive(Debug, Serialize)]
struct Report {
    mode: String,
    line: usize,
    column: usize,
    lines: usize,
    modified: bool,
    can_undo: bool,
    language: &'static str,
    reparse: Option<String>,
    tokens: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse()?;
    let Some(file) = args.file.clone() else {
        bail!("usage: modal-edit [--keys SCRIPT] [--output PATH] FILE");
    };

    let mut editor = Editor::with_config(args.engine_config()?);
    if args.clipboard {
        editor.set_register(Box::new(ClipboardRegister::new()));
    }
    editor
        .open_file(&file)
        .with_context(|| format!("opening {}", file.display()))?;

    let keys = Key::parse_script(&args.keys);
    log::info!("replaying {} keys", keys.len());
    for key in keys {
        editor.handle_key(key, Instant::now());
    }
    let reparse = editor.flush();

    match &args.output {
        Some(path) => editor
            .save_as(path)
            .with_context(|| format!("writing {}", path.display()))?,
        None if editor.is_modified() => editor
            .save()
            .with_context(|| format!("saving {}", file.display()))?,
        None => log::info!("no changes"),
    }

    if args.report {
        let cursor = editor.cursor();
        let report = Report {
            mode: editor.mode().to_string(),
            line: cursor.line + 1,
            column: cursor.column + 1,
            lines: editor.buffer().len_lines(),
            modified: editor.is_modified(),
            can_undo: editor.can_undo(),
            language: editor.language().name(),
            reparse: reparse.map(|kind| format!("{:?}", kind)),
            tokens: editor.tokens().iter().map(|line| line.spans.len()).sum(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
