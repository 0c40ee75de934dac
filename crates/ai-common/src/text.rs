const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Removes every `<think>...</think>` span from a model answer.
///
/// An opening tag without a closing tag after it is kept along with the
/// rest of the text. Removal repeats until no span is left, so spans that
/// only appear once inner ones are gone are removed too.
pub fn strip_thinking_tokens(text: &str) -> String {
    let mut current = text.to_owned();
    while let Some(stripped) = strip_once(&current) {
        current = stripped;
    }
    current
}

/// Removes all complete spans in one left-to-right scan. Returns `None` if
/// nothing was removed.
fn strip_once(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut removed = false;
    while let Some(start) = rest.find(THINK_OPEN) {
        let inner = &rest[start + THINK_OPEN.len()..];
        let Some(end) = inner.find(THINK_CLOSE) else {
            break;
        };
        out.push_str(&rest[..start]);
        rest = &inner[end + THINK_CLOSE.len()..];
        removed = true;
    }
    if !removed {
        return None;
    }
    out.push_str(rest);
    Some(out)
}
