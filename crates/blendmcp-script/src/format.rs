/// Strips traceback noise from a raw Blender error so only the useful lines
/// remain. Returns the input untouched when filtering would leave nothing.
pub fn format_blender_error(error_message: &str) -> String {
    let cleaned: Vec<&str> = error_message
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with("Traceback"))
        .filter(|line| !line.starts_with("File \"<string>\""))
        .collect();

    if cleaned.is_empty() {
        return error_message.to_string();
    }
    cleaned.join("\n")
}

/// Wraps user code in a guarded block that reports failures on stdout with
/// an `ERROR:` prefix instead of raising inside Blender.
pub fn create_safe_blender_script(code: &str) -> String {
    let mut body = String::new();
    for line in code.lines() {
        if line.trim().is_empty() {
            body.push('\n');
            continue;
        }
        body.push_str("    ");
        body.push_str(line);
        body.push('\n');
    }
    if body.trim().is_empty() {
        body = "    pass\n".to_string();
    }

    format!(
        "try:\n{body}except Exception as e:\n    import traceback\n    error_msg = f\"Error: {{str(e)}}\\nTraceback: {{traceback.format_exc()}}\"\n    print(\"ERROR:\", error_msg)\n"
    )
}

/// Removes the whitespace prefix shared by every non-blank line.
///
/// Whitespace-only lines are emptied and do not take part in the prefix
/// computation.
pub fn dedent(text: &str) -> String {
    let mut margin: Option<&str> = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let indent_len = line.len() - line.trim_start().len();
        let indent = &line[..indent_len];
        margin = Some(match margin {
            None => indent,
            Some(current) => common_prefix(current, indent),
        });
    }
    let margin = margin.unwrap_or("");

    let mut out: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        if line.trim().is_empty() {
            out.push("");
        } else {
            out.push(line.strip_prefix(margin).unwrap_or(line));
        }
    }
    out.join("\n")
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let end = a
        .char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map(|((idx, _), _)| idx)
        .unwrap_or_else(|| a.len().min(b.len()));
    &a[..end]
}

#[cfg(test)]
mod tests {
    use super::{create_safe_blender_script, dedent, format_blender_error};

    #[test]
    fn strips_traceback_noise() {
        let raw = "Traceback (most recent call last):\n  File \"<string>\", line 1\nValueError: bad";
        assert_eq!(format_blender_error(raw), "ValueError: bad");
    }

    #[test]
    fn keeps_other_file_lines_and_trims() {
        let raw = "  File \"/tmp/x.py\", line 3\n\n   NameError: name 'y' is not defined  ";
        assert_eq!(
            format_blender_error(raw),
            "File \"/tmp/x.py\", line 3\nNameError: name 'y' is not defined"
        );
    }

    #[test]
    fn returns_original_when_everything_is_noise() {
        let raw = "Traceback (most recent call last):\n\n";
        assert_eq!(format_blender_error(raw), raw);
    }

    #[test]
    fn safe_script_indents_every_line() {
        let script = create_safe_blender_script("import bpy\nfor o in bpy.data.objects:\n    print(o.name)");
        assert!(script.starts_with("try:\n    import bpy\n    for o in bpy.data.objects:\n        print(o.name)\nexcept Exception as e:\n"));
        assert!(script.contains("traceback.format_exc()"));
        assert!(script.contains("print(\"ERROR:\", error_msg)"));
    }

    #[test]
    fn safe_script_with_empty_body_uses_pass() {
        let script = create_safe_blender_script("  \n");
        assert!(script.starts_with("try:\n    pass\nexcept Exception as e:"));
    }

    #[test]
    fn dedent_removes_common_margin() {
        let code = "    import bpy\n\n    if True:\n        print(1)\n";
        assert_eq!(dedent(code), "import bpy\n\nif True:\n    print(1)\n");
    }

    #[test]
    fn dedent_leaves_unindented_text_alone() {
        assert_eq!(dedent("a\n  b"), "a\n  b");
    }
}
