//! Field name conversion.

/// Converts a snake_case name to camelCase.
///
/// An underscore followed by a lowercase ASCII letter is dropped and the
/// letter uppercased. A leading underscore is kept, and so is an underscore
/// before anything else (digits, capitals, another underscore).
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    let mut first = true;

    while let Some(c) = chars.next() {
        if c == '_' && !first {
            if let Some(next) = chars.peek().copied().filter(char::is_ascii_lowercase) {
                out.push(next.to_ascii_uppercase());
                chars.next();
                continue;
            }
        }
        out.push(c);
        first = false;
    }
    out
}
