use crate::err::ParseError;
use std::path::Path;
use swc_common::comments::SingleThreadedComments;
use swc_common::sync::Lrc;
use swc_common::FileName;
use swc_common::SourceFile;
use swc_common::SourceMap;
use swc_common::Spanned;
use swc_ecma_ast::EsVersion;
use swc_ecma_ast::Module;
use swc_ecma_parser::error::Error;
use swc_ecma_parser::parse_file_as_module;
use swc_ecma_parser::EsSyntax;
use swc_ecma_parser::Syntax;
use swc_ecma_parser::TsSyntax;

/// A parsed file together with everything needed to print it again.
pub(crate) struct ParsedModule {
  pub cm: Lrc<SourceMap>,
  pub fm: Lrc<SourceFile>,
  pub comments: SingleThreadedComments,
  pub module: Module,
}

/// Picks the dialect from the file extension; anything unknown is treated as JavaScript with
/// JSX enabled.
pub(crate) fn syntax_for_path(path: &Path) -> Syntax {
  match path.extension().and_then(|e| e.to_str()) {
    Some("ts" | "mts" | "cts") => Syntax::Typescript(TsSyntax {
      decorators: true,
      ..Default::default()
    }),
    Some("tsx") => Syntax::Typescript(TsSyntax {
      tsx: true,
      decorators: true,
      ..Default::default()
    }),
    _ => Syntax::Es(EsSyntax {
      jsx: true,
      decorators: true,
      ..Default::default()
    }),
  }
}

pub(crate) fn parse_module(source: &str, path: &Path) -> Result<ParsedModule, ParseError> {
  let cm: Lrc<SourceMap> = Default::default();
  parse_module_in(cm, source, path)
}

/// Parses `source` into an existing source map, so spans of several parsed fragments never
/// overlap.
pub(crate) fn parse_module_in(
  cm: Lrc<SourceMap>,
  source: &str,
  path: &Path,
) -> Result<ParsedModule, ParseError> {
  let fm = cm.new_source_file(
    FileName::Real(path.to_path_buf()).into(),
    source.to_string(),
  );
  let comments = SingleThreadedComments::default();
  let mut recovered = Vec::new();
  let result = parse_file_as_module(
    &fm,
    syntax_for_path(path),
    EsVersion::latest(),
    Some(&comments),
    &mut recovered,
  );
  let module = match result {
    Ok(module) => module,
    Err(err) => return Err(to_parse_error(&cm, path, &err)),
  };
  // Recovered errors are still syntax errors; no partial output is produced for them.
  if let Some(err) = recovered.first() {
    return Err(to_parse_error(&cm, path, err));
  }
  Ok(ParsedModule {
    cm,
    fm,
    comments,
    module,
  })
}

fn to_parse_error(cm: &SourceMap, path: &Path, err: &Error) -> ParseError {
  let loc = cm.lookup_char_pos(err.span().lo);
  ParseError {
    path: path.to_path_buf(),
    line: loc.line,
    column: loc.col.0 + 1,
    message: err.kind().msg().into_owned(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dialect_follows_extension() {
    assert!(matches!(syntax_for_path(Path::new("a.ts")), Syntax::Typescript(s) if !s.tsx));
    assert!(matches!(syntax_for_path(Path::new("a.tsx")), Syntax::Typescript(s) if s.tsx));
    assert!(matches!(syntax_for_path(Path::new("a.mjs")), Syntax::Es(s) if s.jsx));
  }

  #[test]
  fn parses_typescript_modules() {
    let parsed = parse_module(
      "export class A { private x: number = 1; get y(): number { return this.x; } }",
      Path::new("/p/a.ts"),
    )
    .unwrap();
    assert_eq!(parsed.module.body.len(), 1);
  }

  #[test]
  fn reports_position_of_syntax_errors() {
    let err = match parse_module("let a = 1;\nlet = ;\n", Path::new("/p/broken.js")) {
      Ok(_) => panic!("expected a parse error"),
      Err(err) => err,
    };
    assert_eq!(err.line, 2);
    assert_eq!(err.path, Path::new("/p/broken.js"));
    assert!(!err.message.is_empty());
  }
}
