use std::collections::BTreeSet;

/// Accumulates a Blender Python script out of imports and code fragments.
///
/// Plain `import` lines are deduplicated and emitted sorted ahead of every
/// fragment. Everything else (including `from ... import ...` lines) is kept
/// verbatim in append order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptBuilder {
    imports: BTreeSet<String>,
    fragments: Vec<String>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_import(&mut self, module: &str) -> &mut Self {
        self.imports.insert(module.to_string());
        self
    }

    pub fn add_from_import(&mut self, module: &str, items: &str) -> &mut Self {
        self.fragments.push(format!("from {module} import {items}"));
        self
    }

    pub fn add_code(&mut self, code: impl Into<String>) -> &mut Self {
        self.fragments.push(code.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.fragments.is_empty()
    }

    pub fn build(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.imports.len() + self.fragments.len() + 1);

        if !self.imports.is_empty() {
            parts.extend(self.imports.iter().map(|module| format!("import {module}")));
            parts.push(String::new());
        }

        parts.extend(self.fragments.iter().cloned());
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::ScriptBuilder;
    use insta::assert_snapshot;

    #[test]
    fn duplicate_import_is_emitted_once() {
        let mut builder = ScriptBuilder::new();
        builder.add_import("bpy").add_import("bpy");
        builder.add_code("print(1)");

        let script = builder.build();
        assert_eq!(script.matches("import bpy").count(), 1);
    }

    #[test]
    fn imports_are_sorted_and_separated_from_code() {
        let mut builder = ScriptBuilder::new();
        builder
            .add_import("math")
            .add_import("bpy")
            .add_code("x = 1")
            .add_code("print(x)");

        assert_snapshot!(builder.build(), @r"
        import bpy
        import math

        x = 1
        print(x)
        ");
    }

    #[test]
    fn no_separator_without_imports() {
        let mut builder = ScriptBuilder::new();
        builder.add_code("a = 1").add_code("b = 2");
        assert_eq!(builder.build(), "a = 1\nb = 2");
    }

    #[test]
    fn from_imports_keep_their_position_and_duplicates() {
        let mut builder = ScriptBuilder::new();
        builder
            .add_code("first()")
            .add_from_import("mathutils", "Vector")
            .add_from_import("mathutils", "Vector");

        assert_eq!(
            builder.build(),
            "first()\nfrom mathutils import Vector\nfrom mathutils import Vector"
        );
    }

    #[test]
    fn empty_builder_builds_empty_script() {
        let builder = ScriptBuilder::new();
        assert!(builder.is_empty());
        assert_eq!(builder.build(), "");
    }
}
