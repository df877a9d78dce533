use crate::Result;
use std::sync::OnceLock;

/// Writes each value through `f`, placing `separator` between the values that produced output.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Returns the content of `cell`, computing it with `init` when still empty.
///
/// Failures are not memoized, a later call will run `init` again.
pub(crate) fn memoized<'a>(
    cell: &'a OnceLock<String>,
    init: impl FnOnce() -> Result<String>,
) -> Result<&'a str> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = init()?;
    Ok(cell.get_or_init(|| value))
}
