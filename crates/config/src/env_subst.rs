//! `${ENV_VAR}` placeholder expansion in raw config text, applied before
//! the file is parsed.

/// Expand `${NAME}` placeholders against the process environment.
///
/// A placeholder whose variable is unset, whose name is empty, or whose
/// closing brace is missing passes through unchanged.
pub fn substitute_env(input: &str) -> String {
    expand(input, |name| std::env::var(name).ok())
}

/// Slice-based scan: copy everything up to the next `${`, then resolve the
/// placeholder and continue after its closing brace. Split from
/// [`substitute_env`] so tests can inject a lookup instead of mutating the
/// process environment.
fn expand(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];

        let Some(end) = tail.find('}') else {
            // Unterminated placeholder: keep the remainder literally.
            out.push_str(&rest[start..]);
            return out;
        };

        let name = &tail[..end];
        match lookup(name) {
            Some(value) if !name.is_empty() => out.push_str(&value),
            _ => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            },
        }
        rest = &tail[end + 1..];
    }

    out.push_str(rest);
    out
}
