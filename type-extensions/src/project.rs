//! Resolution of the project manifest (a `tsconfig.json`/`jsconfig.json`) into the list of
//! source files a build compiles. Only those files are ever rewritten.

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ProjectManifest {
  pub manifest_path: PathBuf,
  pub root_dir: PathBuf,
  pub allow_js: bool,
  /// Canonical, sorted and deduplicated.
  pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
  #[serde(default)]
  extends: Option<String>,
  #[serde(default)]
  compiler_options: RawCompilerOptions,
  #[serde(default)]
  files: Option<Vec<String>>,
  #[serde(default)]
  include: Option<Vec<String>>,
  #[serde(default)]
  exclude: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
  #[serde(default)]
  allow_js: Option<bool>,
}

pub fn load_project_manifest(project: &Path) -> Result<ProjectManifest, String> {
  let manifest_path = resolve_manifest_path(project)?;
  let root_dir = manifest_path
    .parent()
    .ok_or_else(|| format!("invalid project manifest path {}", manifest_path.display()))?
    .to_path_buf();
  let mut visited = HashSet::new();
  let raw = load_raw_manifest(&manifest_path, &mut visited)?;

  // A jsconfig.json is a tsconfig.json with allowJs implied.
  let is_jsconfig = manifest_path.file_name().and_then(|n| n.to_str()) == Some("jsconfig.json");
  let allow_js = raw.compiler_options.allow_js.unwrap_or(is_jsconfig);
  let files = discover_files(&root_dir, &raw, allow_js)?;

  Ok(ProjectManifest {
    manifest_path,
    root_dir,
    allow_js,
    files,
  })
}

fn resolve_manifest_path(project: &Path) -> Result<PathBuf, String> {
  let candidate = if project.is_dir() {
    let tsconfig = project.join("tsconfig.json");
    let jsconfig = project.join("jsconfig.json");
    if !tsconfig.exists() && jsconfig.exists() {
      jsconfig
    } else {
      tsconfig
    }
  } else {
    project.to_path_buf()
  };
  let absolute = if candidate.is_absolute() {
    candidate
  } else {
    std::env::current_dir()
      .map_err(|err| format!("failed to resolve current directory: {err}"))?
      .join(candidate)
  };
  absolute
    .canonicalize()
    .map_err(|err| format!("failed to read project manifest {}: {err}", absolute.display()))
}

fn load_raw_manifest(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<RawManifest, String> {
  let canonical = path
    .canonicalize()
    .map_err(|err| format!("failed to read project manifest {}: {err}", path.display()))?;
  if !visited.insert(canonical.clone()) {
    return Err(format!(
      "cycle detected while resolving project manifest extends: {}",
      canonical.display()
    ));
  }

  let text = fs::read_to_string(&canonical)
    .map_err(|err| format!("failed to read {}: {err}", canonical.display()))?;
  let mut current: RawManifest = json5::from_str(&text)
    .map_err(|err| format!("failed to parse {}: {err}", canonical.display()))?;

  let Some(extends) = current.extends.take() else {
    return Ok(current);
  };

  let manifest_dir = canonical
    .parent()
    .ok_or_else(|| format!("invalid project manifest path {}", canonical.display()))?;
  let extends_path = resolve_extends_path(manifest_dir, &extends)?;
  let base = load_raw_manifest(&extends_path, visited)?;
  Ok(RawManifest {
    extends: None,
    compiler_options: RawCompilerOptions {
      allow_js: current
        .compiler_options
        .allow_js
        .or(base.compiler_options.allow_js),
    },
    files: current.files.or(base.files),
    include: current.include.or(base.include),
    exclude: current.exclude.or(base.exclude),
  })
}

fn resolve_extends_path(manifest_dir: &Path, extends: &str) -> Result<PathBuf, String> {
  if extends.starts_with('.') || Path::new(extends).is_absolute() {
    return resolve_extends_file(&resolve_path_relative_to(manifest_dir, Path::new(extends)));
  }

  for ancestor in manifest_dir.ancestors() {
    let base = ancestor.join("node_modules").join(extends);
    if let Ok(resolved) = resolve_extends_file(&base) {
      return Ok(resolved);
    }
  }

  Err(format!(
    "failed to resolve extends '{extends}' from {}",
    manifest_dir.display()
  ))
}

fn resolve_extends_file(candidate: &Path) -> Result<PathBuf, String> {
  let mut attempts = vec![candidate.to_path_buf()];
  if candidate.extension().is_none() {
    attempts.push(candidate.with_extension("json"));
  }
  if candidate.is_dir() {
    attempts.push(candidate.join("tsconfig.json"));
  }

  for attempt in attempts {
    if attempt.is_file() {
      return attempt
        .canonicalize()
        .map_err(|err| format!("failed to read {}: {err}", attempt.display()));
    }
  }

  Err(format!("extended manifest {} does not exist", candidate.display()))
}

fn discover_files(root_dir: &Path, raw: &RawManifest, allow_js: bool) -> Result<Vec<PathBuf>, String> {
  if let Some(files) = raw.files.as_ref() {
    let mut resolved = Vec::new();
    for file in files {
      let path = resolve_path_relative_to(root_dir, Path::new(file));
      if !is_transformable_source(&path, allow_js) {
        continue;
      }
      resolved.push(
        path
          .canonicalize()
          .map_err(|err| format!("failed to read project file {}: {err}", path.display()))?,
      );
    }
    resolved.sort();
    resolved.dedup();
    return Ok(resolved);
  }

  let include = raw
    .include
    .clone()
    .unwrap_or_else(|| vec!["**/*".to_string()]);
  let exclude = raw.exclude.clone().unwrap_or_else(|| {
    vec![
      "node_modules".to_string(),
      "bower_components".to_string(),
      "jspm_packages".to_string(),
    ]
  });

  let include_set = build_globset(&include)?;
  let exclude_set = build_globset(&exclude)?;

  let mut files = Vec::new();
  for entry in WalkDir::new(root_dir)
    .follow_links(false)
    .into_iter()
    .filter_entry(|entry| entry.file_name() != "node_modules")
    .filter_map(|entry| entry.ok())
  {
    if !entry.file_type().is_file() || !is_transformable_source(entry.path(), allow_js) {
      continue;
    }
    let Ok(rel) = entry.path().strip_prefix(root_dir) else {
      continue;
    };
    if !include_set.is_match(rel) || exclude_set.is_match(rel) {
      continue;
    }
    files.push(
      entry
        .path()
        .canonicalize()
        .unwrap_or_else(|_| entry.path().to_path_buf()),
    );
  }

  files.sort();
  files.dedup();
  Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, String> {
  let mut builder = GlobSetBuilder::new();
  for pat in patterns {
    let normalized = expand_directory_pattern(pat.trim());
    if normalized.is_empty() {
      continue;
    }
    let glob = Glob::new(&normalized).map_err(|err| format!("invalid glob pattern '{pat}': {err}"))?;
    builder.add(glob);
  }
  builder
    .build()
    .map_err(|err| format!("failed to build glob matcher: {err}"))
}

/// `src` means everything below `src`; patterns with wildcards or an extension are kept as is.
fn expand_directory_pattern(pattern: &str) -> String {
  let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
  if pattern.is_empty() || pattern.chars().any(|ch| matches!(ch, '*' | '?' | '[' | ']')) {
    return pattern.to_string();
  }
  let trimmed = pattern.trim_end_matches('/');
  if trimmed.is_empty() {
    return "**/*".to_string();
  }
  match Path::new(trimmed).extension() {
    Some(_) => trimmed.to_string(),
    None => format!("{trimmed}/**/*"),
  }
}

/// Declaration files carry no runtime code, so they are never rewritten.
pub fn is_transformable_source(path: &Path, allow_js: bool) -> bool {
  let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
  if name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts") {
    return false;
  }
  match path.extension().and_then(|e| e.to_str()) {
    Some("ts" | "tsx" | "mts" | "cts") => true,
    Some("js" | "jsx" | "mjs" | "cjs") => allow_js,
    _ => false,
  }
}

fn resolve_path_relative_to(base: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    base.join(path)
  }
}
