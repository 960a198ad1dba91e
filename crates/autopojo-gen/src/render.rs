//! Java source rendering for generated class trees.

use autopojo_core::types::TypeReference;
use std::path::PathBuf;

use crate::emit::CompilationUnit;
use crate::synth::{GeneratedClass, GeneratedField};

/// Settings that apply to every unit rendered in a round.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Value of `@Generated`.
    pub generator_id: String,
    /// Optional ISO-8601 timestamp for `@Generated(date = ...)`.
    pub date: Option<String>,
    pub indent: String,
}

impl RenderOptions {
    pub fn new(generator_id: impl Into<String>) -> Self {
        Self {
            generator_id: generator_id.into(),
            date: None,
            indent: "    ".to_string(),
        }
    }
}

/// Incrementally builds Java source with indentation handling.
#[derive(Debug, Default, Clone)]
struct JavaSourceBuilder {
    content: String,
    indent_level: usize,
    indent: String,
}

impl JavaSourceBuilder {
    fn new(indent: String) -> Self {
        Self {
            content: String::new(),
            indent_level: 0,
            indent,
        }
    }

    fn push_line(&mut self, line: &str) {
        if !line.is_empty() {
            for _ in 0..self.indent_level {
                self.content.push_str(&self.indent);
            }
            self.content.push_str(line);
        }
        self.content.push('\n');
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn build(self) -> String {
        self.content
    }
}

/// Render a top-level class tree as one compilation unit.
pub fn render(class: &GeneratedClass, options: &RenderOptions) -> CompilationUnit {
    let mut builder = JavaSourceBuilder::new(options.indent.clone());

    let package = class.name.package();
    if !package.is_empty() {
        builder.push_line(&format!("package {package};"));
        builder.push_line("");
    }

    builder.push_line(&generated_annotation(options));
    render_class(&mut builder, class, false);

    CompilationUnit {
        name: class.name.clone(),
        path: source_path(package, class.name.simple_names()[0].as_str()),
        source: builder.build(),
    }
}

/// Path of a unit relative to the output root, e.g. `pkg/sub/User.java`.
pub fn source_path(package: &str, top_level_name: &str) -> PathBuf {
    let mut path: PathBuf = package.split('.').filter(|s| !s.is_empty()).collect();
    path.push(format!("{top_level_name}.java"));
    path
}

fn generated_annotation(options: &RenderOptions) -> String {
    let id = java_string(&options.generator_id);
    match &options.date {
        Some(date) => format!(
            "@javax.annotation.Generated(value = {id}, date = {})",
            java_string(date)
        ),
        None => format!("@javax.annotation.Generated({id})"),
    }
}

fn java_string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

fn render_class(builder: &mut JavaSourceBuilder, class: &GeneratedClass, nested: bool) {
    let simple = class.name.simple_name();
    let modifiers = if nested {
        "public static final"
    } else {
        "public final"
    };
    let type_params = if class.type_params.is_empty() {
        String::new()
    } else {
        let params: Vec<String> = class
            .type_params
            .iter()
            .map(TypeReference::declaration_form)
            .collect();
        format!("<{}>", params.join(", "))
    };

    builder.push_line(&format!("{modifiers} class {simple}{type_params} {{"));
    builder.indent();

    for field in &class.fields {
        builder.push_line(&format!("private final {} {};", field.ty, field.name));
    }
    if !class.fields.is_empty() {
        builder.push_line("");
    }

    render_constructor(builder, class);
    for field in &class.fields {
        builder.push_line("");
        builder.push_line(&format!("public {} {}() {{", field.ty, field.accessor));
        builder.indent();
        builder.push_line(&format!("return {};", field.name));
        builder.dedent();
        builder.push_line("}");
    }

    builder.push_line("");
    render_equals(builder, class);
    builder.push_line("");
    render_hash_code(builder, class);
    builder.push_line("");
    render_to_string(builder, class);

    for inner in &class.nested {
        builder.push_line("");
        render_class(builder, inner, true);
    }

    builder.dedent();
    builder.push_line("}");
}

fn render_constructor(builder: &mut JavaSourceBuilder, class: &GeneratedClass) {
    let params: Vec<String> = class
        .fields
        .iter()
        .map(|f| format!("{} {}", f.ty, f.name))
        .collect();
    builder.push_line(&format!(
        "public {}({}) {{",
        class.name.simple_name(),
        params.join(", ")
    ));
    builder.indent();
    for field in &class.fields {
        builder.push_line(&format!("this.{0} = {0};", field.name));
    }
    builder.dedent();
    builder.push_line("}");
}

fn render_equals(builder: &mut JavaSourceBuilder, class: &GeneratedClass) {
    let simple = class.name.simple_name();
    let wildcard_type = if class.type_params.is_empty() {
        simple.to_string()
    } else {
        let wildcards = vec!["?"; class.type_params.len()];
        format!("{}<{}>", simple, wildcards.join(", "))
    };

    builder.push_line("@Override");
    builder.push_line("public boolean equals(Object o) {");
    builder.indent();
    builder.push_line("if (this == o) {");
    builder.indent();
    builder.push_line("return true;");
    builder.dedent();
    builder.push_line("}");
    builder.push_line(&format!("if (!(o instanceof {simple})) {{"));
    builder.indent();
    builder.push_line("return false;");
    builder.dedent();
    builder.push_line("}");

    if class.fields.is_empty() {
        builder.push_line("return true;");
    } else {
        builder.push_line(&format!("{wildcard_type} other = ({wildcard_type}) o;"));
        let last = class.fields.len() - 1;
        for (i, field) in class.fields.iter().enumerate() {
            let end = if i == last { ";" } else { "" };
            let comparison = field_equality(field);
            if i == 0 {
                builder.push_line(&format!("return {comparison}{end}"));
                // continuation lines
                builder.indent();
                builder.indent();
            } else {
                builder.push_line(&format!("&& {comparison}{end}"));
            }
        }
        builder.dedent();
        builder.dedent();
    }

    builder.dedent();
    builder.push_line("}");
}

fn field_equality(field: &GeneratedField) -> String {
    let name = &field.name;
    match &field.ty {
        TypeReference::Named { name: ty } if ty == "float" => {
            format!("Float.compare({name}, other.{name}) == 0")
        }
        TypeReference::Named { name: ty } if ty == "double" => {
            format!("Double.compare({name}, other.{name}) == 0")
        }
        ty if ty.is_primitive() => format!("{name} == other.{name}"),
        TypeReference::Array { element } if matches!(**element, TypeReference::Array { .. }) => {
            format!("java.util.Arrays.deepEquals({name}, other.{name})")
        }
        TypeReference::Array { .. } => format!("java.util.Arrays.equals({name}, other.{name})"),
        _ => format!("java.util.Objects.equals({name}, other.{name})"),
    }
}

fn render_hash_code(builder: &mut JavaSourceBuilder, class: &GeneratedClass) {
    let names: Vec<&str> = class.fields.iter().map(|f| f.name.as_str()).collect();
    builder.push_line("@Override");
    builder.push_line("public int hashCode() {");
    builder.indent();
    builder.push_line(&format!(
        "return java.util.Arrays.deepHashCode(new Object[] {{{}}});",
        names.join(", ")
    ));
    builder.dedent();
    builder.push_line("}");
}

fn render_to_string(builder: &mut JavaSourceBuilder, class: &GeneratedClass) {
    let parts: Vec<String> = class
        .fields
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let sep = if i == 0 { "" } else { ", " };
            let value = match &f.ty {
                TypeReference::Array { element }
                    if matches!(**element, TypeReference::Array { .. }) =>
                {
                    format!("java.util.Arrays.deepToString({})", f.name)
                }
                TypeReference::Array { .. } => format!("java.util.Arrays.toString({})", f.name),
                _ => f.name.clone(),
            };
            format!(" + \"{sep}{}=\" + {value}", f.name)
        })
        .collect();

    builder.push_line("@Override");
    builder.push_line("public String toString() {");
    builder.indent();
    builder.push_line(&format!(
        "return \"{}{{\"{} + \"}}\";",
        class.name.simple_name(),
        parts.concat()
    ));
    builder.dedent();
    builder.push_line("}");
}
