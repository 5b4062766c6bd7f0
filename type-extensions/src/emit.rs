use std::io;
use swc_common::comments::Comments;
use swc_common::sync::Lrc;
use swc_common::SourceMap;
use swc_ecma_ast::Module;
use swc_ecma_codegen::text_writer::JsWriter;
use swc_ecma_codegen::Config;
use swc_ecma_codegen::Emitter;

/// Prints `module` with `\n` newlines and the default (non-minified) layout. The output only
/// depends on the tree, so printing is stable across runs.
pub(crate) fn print_module(
  cm: Lrc<SourceMap>,
  comments: Option<&dyn Comments>,
  module: &Module,
) -> io::Result<String> {
  let mut buf = Vec::new();
  {
    let mut emitter = Emitter {
      cfg: Config::default(),
      cm: cm.clone(),
      comments,
      wr: JsWriter::new(cm, "\n", &mut buf, None),
    };
    emitter.emit_module(module)?;
  }
  String::from_utf8(buf).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}
