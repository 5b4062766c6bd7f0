mod common;

use common::compact;
use common::local_binding;
use common::transform_file;
use common::transform_source;
use common::Project;
use common::EXTENSIONS;
use std::path::Path;
use type_extensions::alias::generate_alias;
use type_extensions::alias::AliasAnchor;
use type_extensions::registry::RuntimeName;
use type_extensions::TransformError;
use type_extensions::TypeExtensions;

fn helper(plugin: &TypeExtensions, name: RuntimeName) -> String {
  plugin
    .registry()
    .runtime_aliases()
    .get(name)
    .to_string()
}

#[test]
fn literal_receiver_is_wrapped() {
  let project = Project::new(&[("src/main.js", "export const big = '1234'.bigInt;\n")]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  let wrap = local_binding(&code, &helper(&plugin, RuntimeName::Wrap));
  let compact = compact(&code);
  assert!(compact.contains(r#"from"./extensions";"#), "{code}");
  assert!(
    compact.contains(&format!(r#"{wrap}('1234',"String","bigInt").bigInt"#)),
    "{code}"
  );
  assert!(!compact.contains("proxy"), "{code}");
}

#[test]
fn unknown_receiver_is_proxied_against_candidates_in_declaration_order() {
  let project = Project::new(&[(
    "src/main.js",
    "export function big(value) {\n  return value.bigInt;\n}\n",
  )]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  let proxy = local_binding(&code, &helper(&plugin, RuntimeName::Proxy));
  assert!(
    compact(&code).contains(&format!(
      r#"{proxy}(value,["Number","String"],"bigInt").bigInt"#
    )),
    "{code}"
  );
}

#[test]
fn chained_accesses_are_rewritten_inside_out() {
  let project = Project::new(&[("src/main.js", "export const n = '12'.number.bigInt;\n")]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  let wrap = local_binding(&code, &helper(&plugin, RuntimeName::Wrap));
  let proxy = local_binding(&code, &helper(&plugin, RuntimeName::Proxy));
  assert!(
    compact(&code).contains(&format!(
      r#"{proxy}({wrap}('12',"String","number").number,["Number","String"],"bigInt").bigInt"#
    )),
    "{code}"
  );
}

#[test]
fn static_members_read_from_the_extension_class() {
  let project = Project::new(&[("src/main.js", "export const three = Number.sum(1, 2);\n")]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  let class = local_binding(&code, "NumberExtensions");
  assert!(
    compact(&code).contains(&format!("{class}.sum(1,2)")),
    "{code}"
  );
}

#[test]
fn unrelated_code_is_left_alone() {
  let source = "export const fixed = (1.5).toFixed(2);\nexport const len = 'abc'.length;\n";
  let project = Project::new(&[("src/main.js", source)]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  assert!(!code.contains("import"), "{code}");
  assert_eq!(compact(&code), compact(source));
}

#[test]
fn assignment_targets_are_not_rewritten() {
  let project = Project::new(&[(
    "src/main.js",
    "export function set(value) {\n  value.bigInt = 1;\n  delete value.number;\n}\n",
  )]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  assert!(compact(&code).contains("value.bigInt=1;"), "{code}");
  assert!(compact(&code).contains("deletevalue.number;"), "{code}");
}

#[test]
fn files_outside_the_project_are_skipped() {
  let project = Project::new(&[("src/main.js", "export const a = 1;\n")]);
  let plugin = project.plugin();
  project.write("scripts/build.js", "export const big = '1'.bigInt;\n");

  let out = plugin
    .transform("export const big = '1'.bigInt;\n", &project.path("scripts/build.js"))
    .unwrap();
  assert!(out.is_none());
  let out = plugin
    .transform("export const big = '1'.bigInt;\n", Path::new("/nonexistent/file.js"))
    .unwrap();
  assert!(out.is_none());
}

#[test]
fn existing_runtime_imports_are_merged() {
  let project = Project::new(&[]);
  let plugin = project.plugin();
  let wrap = helper(&plugin, RuntimeName::Wrap);
  let source = format!(
    "import {{ {wrap} as myWrap, NumberExtensions }} from './extensions.js';\n\
     export const big = '1'.bigInt;\n\
     export const three = Number.sum(1, 2) + NumberExtensions.sum(0, 0);\n"
  );
  project.write("src/main.js", &source);
  plugin.rebuild_allowed_files().unwrap();
  let code = transform_file(&plugin, &project, "src/main.js");

  assert_eq!(code.matches("import").count(), 1, "{code}");
  let compact = compact(&code);
  assert!(
    compact.contains(r#"from'./extensions.js';"#) || compact.contains(r#"from"./extensions.js";"#),
    "{code}"
  );
  assert!(compact.contains(r#"myWrap('1',"String","bigInt")"#), "{code}");
  assert!(compact.contains("NumberExtensions.sum(1,2)"), "{code}");
}

#[test]
fn default_exported_extension_classes_are_imported_as_default() {
  let project = Project::new(&[]);
  project.write(
    "src/extensions.js",
    &EXTENSIONS.replace("export class NumberExtensions", "export default class NumberExtensions"),
  );
  project.write("src/main.js", "export const three = Number.sum(1, 2);\n");
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  let class = local_binding(&code, "default");
  assert!(class.starts_with("NumberExtensions_"), "{code}");
  assert!(
    compact(&code).contains(&format!("{class}.sum(1,2)")),
    "{code}"
  );
  assert!(!code.contains("NumberExtensions as"), "{code}");

  let again = transform_source(&plugin, &code, &project.path("src/main.js"));
  assert_eq!(again.matches("import").count(), 1, "{again}");
  assert!(compact(&again).contains(&format!("{class}.sum(1,2)")), "{again}");

  let extensions = compact(&transform_file(&plugin, &project, "src/extensions.js"));
  assert!(extensions.contains(r#"["Number",NumberExtensions]"#), "{extensions}");
}

#[test]
fn extracted_methods_keep_their_calls() {
  let project = Project::new(&[(
    "src/main.js",
    "export const a = 'x'.shout.call('y');\nexport const b = 'x'.shout.bind('w');\n",
  )]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  let wrap = local_binding(&code, &helper(&plugin, RuntimeName::Wrap));
  let compact = compact(&code);
  assert!(
    compact.contains(&format!(r#"{wrap}('x',"String","shout").shout.call('y')"#)),
    "{code}"
  );
  assert!(
    compact.contains(&format!(r#"{wrap}('x',"String","shout").shout.bind('w')"#)),
    "{code}"
  );
}

#[test]
fn optional_accesses_stay_optional() {
  let project = Project::new(&[(
    "src/main.js",
    "export function f(value) {\n  return [value?.bigInt, value?.shout()];\n}\n",
  )]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  let proxy = local_binding(&code, &helper(&plugin, RuntimeName::Proxy));
  let compact = compact(&code);
  assert!(
    compact.contains(&format!(r#"{proxy}(value,["Number","String"],"bigInt")?.bigInt"#)),
    "{code}"
  );
  assert!(
    compact.contains(&format!(r#"{proxy}(value,["String"],"shout")?.shout()"#)),
    "{code}"
  );
}

#[test]
fn object_destructuring_merges_literal_initializers() {
  let project = Project::new(&[(
    "src/main.js",
    "const { bigInt, length } = '42';\nexport { bigInt, length };\n",
  )]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  let merge = local_binding(&code, &helper(&plugin, RuntimeName::Merge));
  assert!(
    compact(&code).contains(&format!(r#"const{{bigInt,length}}={merge}('42',"String");"#)),
    "{code}"
  );
}

#[test]
fn object_destructuring_proxies_other_initializers() {
  let project = Project::new(&[(
    "src/main.js",
    "export function read(value) {\n  const { shout } = value;\n  return shout();\n}\n",
  )]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  let proxy = local_binding(&code, &helper(&plugin, RuntimeName::Proxy));
  assert!(
    compact(&code).contains(&format!(r#"const{{shout}}={proxy}(value,["String"],true);"#)),
    "{code}"
  );
}

#[test]
fn destructured_parameters_are_hoisted_into_the_body() {
  let project = Project::new(&[(
    "src/main.js",
    "export function f({ bigInt }, n = bigInt) {\n  'use client';\n  return n;\n}\n",
  )]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  let proxy = local_binding(&code, &helper(&plugin, RuntimeName::Proxy));
  let compact = compact(&code);
  assert!(!compact.contains("f({bigInt}"), "{code}");
  let directive = compact.find("'useclient';").unwrap();
  let hoisted = compact
    .find(&format!(r#"{{bigInt}}={proxy}("#))
    .unwrap_or_else(|| panic!("{code}"));
  assert!(directive < hoisted, "{code}");
  assert!(compact.contains("===void0?bigInt:"), "{code}");
}

#[test]
fn parameters_redeclared_with_var_are_hoisted_with_var() {
  let project = Project::new(&[(
    "src/main.js",
    "export function f({ bigInt }) {\n  var bigInt = bigInt + 1n;\n  return bigInt;\n}\n",
  )]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  let proxy = local_binding(&code, &helper(&plugin, RuntimeName::Proxy));
  let compact = compact(&code);
  assert!(
    compact.contains(&format!(r#"var{{bigInt}}={proxy}("#)),
    "{code}"
  );
  assert!(!compact.contains("let{bigInt}"), "{code}");
  assert!(compact.contains("varbigInt=bigInt+1n;"), "{code}");
}

#[test]
fn parameters_shadowed_by_function_declarations_are_rejected() {
  let source = "export function f({ bigInt }) {\n  function bigInt() {}\n  return bigInt;\n}\n";
  let project = Project::new(&[("src/main.js", source)]);
  let plugin = project.plugin();
  let err = plugin
    .transform(source, &project.path("src/main.js"))
    .unwrap_err();
  assert!(
    matches!(&err, TransformError::UnresolvableDefault { binding, .. } if binding == "bigInt"),
    "{err}"
  );
}

#[test]
fn var_in_nested_functions_does_not_change_hoisting() {
  let project = Project::new(&[(
    "src/main.js",
    "export function f({ bigInt }) {\n  return () => { var bigInt = 1; return bigInt; };\n}\n",
  )]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  assert!(compact(&code).contains("let{bigInt}"), "{code}");
}

#[test]
fn dependent_defaults_keep_their_order() {
  let project = Project::new(&[(
    "src/main.js",
    "export function f(value) {\n  const { one: { bigInt: one }, two = one } = value;\n  return [one, two];\n}\n",
  )]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  let compact = compact(&code);
  let proxy = local_binding(&code, &helper(&plugin, RuntimeName::Proxy));
  let nested = compact
    .find(&format!(r#"{{bigInt:one}}={proxy}("#))
    .unwrap_or_else(|| panic!("{code}"));
  let default = compact.find("===void0?one:").unwrap_or_else(|| panic!("{code}"));
  assert!(nested < default, "{code}");
}

#[test]
fn for_of_heads_destructure_in_the_body() {
  let project = Project::new(&[(
    "src/main.js",
    "export function f(values) {\n  for (const { bigInt } of values) console.log(bigInt);\n}\n",
  )]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  let proxy = local_binding(&code, &helper(&plugin, RuntimeName::Proxy));
  let compact = compact(&code);
  assert!(compact.contains("for(constitemRaw_"), "{code}");
  assert!(
    compact.contains(&format!(r#"const{{bigInt}}={proxy}(itemRaw_"#)),
    "{code}"
  );
}

#[test]
fn exported_declarations_keep_only_their_own_exports() {
  let project = Project::new(&[(
    "src/main.js",
    "export const { bigInt: { number: n } = 1 } = '1';\n",
  )]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/main.js");

  let compact = compact(&code);
  assert!(compact.contains("export{n};"), "{code}");
  assert!(!compact.contains("exportconst"), "{code}");
}

#[test]
fn computed_keys_on_deferred_bindings_are_rejected() {
  let source = "export function f(value) {\n  const { a: { bigInt: b }, [b]: c } = value;\n  return c;\n}\n";
  let project = Project::new(&[("src/main.js", source)]);
  let plugin = project.plugin();
  let err = plugin
    .transform(source, &project.path("src/main.js"))
    .unwrap_err();
  assert!(
    matches!(&err, TransformError::UnresolvableDefault { .. }),
    "{err}"
  );
}

#[test]
fn syntax_errors_are_reported_with_position() {
  let source = "export const a = 1;\nexport const = ;\n";
  let project = Project::new(&[("src/main.js", source)]);
  let plugin = project.plugin();
  let err = plugin
    .transform(source, &project.path("src/main.js"))
    .unwrap_err();
  match err {
    TransformError::Parse(err) => {
      assert_eq!(err.line, 2);
      assert!(err.path.ends_with("src/main.js"));
    }
    other => panic!("expected a parse error, got {other}"),
  }
}

#[test]
fn extensions_file_gets_the_runtime_and_rebound_this() {
  let project = Project::new(&[]);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/extensions.js");

  let compact = compact(&code);
  for name in [RuntimeName::Wrap, RuntimeName::Merge, RuntimeName::Proxy] {
    let alias = helper(&plugin, name);
    assert!(compact.contains(&format!("exportfunction{alias}(")), "{code}");
  }
  let get_this_value = helper(&plugin, RuntimeName::GetThisValue);
  assert!(
    compact.contains(&format!("{get_this_value}(this,StringExtensions);")),
    "{code}"
  );
  assert!(!compact.contains("this.toUpperCase"), "{code}");
  // Statics keep `this`.
  assert!(compact.contains("staticsum(a,b){returna+b;}"), "{code}");

  let type_map = helper(&plugin, RuntimeName::TypeMap);
  let type_map_at = compact
    .find(&format!("const{type_map}=newMap("))
    .unwrap_or_else(|| panic!("{code}"));
  assert!(compact[type_map_at..].contains(r#"["Number",NumberExtensions]"#));
  assert!(type_map_at > compact.find("classStringExtensions").unwrap());
  assert!(!code.contains("import"), "{code}");
}

#[test]
fn nested_functions_and_classes_keep_their_own_this() {
  let project = Project::new(&[]);
  project.write(
    "src/extensions.js",
    &EXTENSIONS.replace(
      "  shout() {",
      "  twice() {\n    const arrow = () => this.shout();\n    function plain() {\n      return this;\n    }\n    class Inner {\n      me() {\n        return this;\n      }\n    }\n    return [arrow(), plain, Inner];\n  }\n  shout() {",
    ),
  );
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/extensions.js");

  let this = generate_alias("self", AliasAnchor::Text("StringExtensions.twice"));
  let compact = compact(&code);
  assert!(compact.contains(&format!("constarrow=()=>{this}.shout();")), "{code}");
  assert!(compact.contains("functionplain(){returnthis;}"), "{code}");
  assert!(compact.contains("me(){returnthis;}"), "{code}");
}

#[test]
fn transforming_output_again_changes_nothing() {
  let main = "import './extensions.js';\n\
    export const big = '1234'.bigInt;\n\
    export function f({ bigInt }, value) {\n  const { shout } = value;\n  return [bigInt, shout(), value.number, Number.sum(1, 2)];\n}\n";
  let project = Project::new(&[("src/main.js", main)]);
  let plugin = project.plugin();

  for rel in ["src/main.js", "src/extensions.js"] {
    let path = project.path(rel);
    let once = transform_file(&plugin, &project, rel);
    let twice = transform_source(&plugin, &once, &path);
    let thrice = transform_source(&plugin, &twice, &path);
    common::assert_same_code(&twice, &thrice);
  }
}

#[test]
fn typescript_wrappers_do_not_hide_literals() {
  let project = Project::new(&[]);
  project.write("src/typed.ts", "export const big = ('1' as string).bigInt;\n");
  project.write("jsconfig.json", r#"{ "include": ["src"], "compilerOptions": { "allowJs": true } }"#);
  let plugin = project.plugin();
  let code = transform_file(&plugin, &project, "src/typed.ts");

  let wrap = local_binding(&code, &helper(&plugin, RuntimeName::Wrap));
  assert!(compact(&code).contains(&format!("{wrap}(")), "{code}");
}
