use clap::Parser;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing::info;
use tracing_subscriber::EnvFilter;
use type_extensions::TypeExtensions;

#[derive(Parser)]
#[command(author, version, about = "Rewrites extension member accesses in JS/TS sources")]
struct Cli {
  /// Plugin configuration file.
  #[arg(short, long, default_value = "type-extensions.json")]
  config: PathBuf,

  /// Write rewritten files here, mirroring their layout under the project root; omit for stdout.
  #[arg(short, long)]
  out_dir: Option<PathBuf>,

  /// Print the loaded extension descriptors as JSON.
  #[arg(long)]
  describe: bool,

  /// Log registry and transform activity to stderr (RUST_LOG overrides).
  #[arg(long)]
  trace: bool,

  /// Files to transform; omit to transform every file the project allows.
  files: Vec<PathBuf>,
}

fn init_tracing(verbose: bool) {
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_ansi(false)
    .try_init();
}

fn main() -> ExitCode {
  let args = Cli::parse();
  init_tracing(args.trace);

  let plugin = match TypeExtensions::from_config_file(&args.config) {
    Ok(plugin) => plugin,
    Err(err) => {
      eprintln!("error: {err}");
      return ExitCode::from(2);
    }
  };

  if args.describe {
    let registry = plugin.registry();
    match serde_json::to_string_pretty(&registry.describe()) {
      Ok(json) => println!("{json}"),
      Err(err) => {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
      }
    }
  }

  let files: Vec<PathBuf> = if args.files.is_empty() && !args.describe {
    plugin
      .registry()
      .allowed_files()
      .into_iter()
      .map(Path::to_path_buf)
      .collect()
  } else {
    args.files.clone()
  };

  let mut failed = false;
  for file in &files {
    if let Err(message) = run_file(&plugin, file, args.out_dir.as_deref()) {
      eprintln!("error: {message}");
      failed = true;
    }
  }
  if failed {
    ExitCode::FAILURE
  } else {
    ExitCode::SUCCESS
  }
}

fn run_file(plugin: &TypeExtensions, file: &Path, out_dir: Option<&Path>) -> Result<(), String> {
  let source =
    fs::read_to_string(file).map_err(|err| format!("failed to read {}: {err}", file.display()))?;
  let Some(output) = plugin
    .transform(&source, file)
    .map_err(|err| err.to_string())?
  else {
    debug!(file = %file.display(), "not in the project; left unchanged");
    return Ok(());
  };

  let Some(out_dir) = out_dir else {
    print!("{}", output.code);
    return Ok(());
  };
  let registry = plugin.registry();
  let canonical = file
    .canonicalize()
    .map_err(|err| format!("failed to resolve {}: {err}", file.display()))?;
  let relative = canonical
    .strip_prefix(registry.root_dir())
    .unwrap_or_else(|_| Path::new(canonical.file_name().unwrap_or_default()));
  let dest = out_dir.join(relative);
  if let Some(parent) = dest.parent() {
    fs::create_dir_all(parent)
      .map_err(|err| format!("failed to create {}: {err}", parent.display()))?;
  }
  fs::write(&dest, &output.code)
    .map_err(|err| format!("failed to write {}: {err}", dest.display()))?;
  info!(from = %file.display(), to = %dest.display(), "wrote");
  Ok(())
}
