use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;

/// Yields source text for each named resource. Resources are fetched
/// sequentially; the assembler runs only after every fetch completes.
pub trait Loader {
    fn fetch(&mut self, name: &str) -> std::io::Result<String>;
}

/// Reads resources from the local file system.
pub struct FileLoader;

impl Loader for FileLoader {
    fn fetch(&mut self, name: &str) -> std::io::Result<String> {
        let mut reader = BufReader::new(File::open(Path::new(name))?);
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(text)
    }
}

/// Unwraps an HTML-packaged source: the text between the first
/// `<pre>`/`</pre>` pair, with the basic entities decoded. Plain text is
/// passed through untouched. Unknown entities are left in place and
/// reported as warnings.
pub fn extract_source(text: &str) -> (String, Vec<String>) {
    let lower = text.to_ascii_lowercase();
    let open = match lower.find("<pre") {
        Some(open) => open,
        None => return (text.to_owned(), Vec::new()),
    };
    let body_start = match text[open..].find('>') {
        Some(close_tag) => open + close_tag + 1,
        None => return (text.to_owned(), Vec::new()),
    };
    let body_end = lower[body_start..]
        .find("</pre")
        .map(|i| body_start + i)
        .unwrap_or(text.len());
    decode_entities(&text[body_start..body_end])
}

fn decode_entities(text: &str) -> (String, Vec<String>) {
    let mut out = String::with_capacity(text.len());
    let mut warnings = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'&' {
            if let Some(rel) = text[i..].find(';').filter(|&rel| rel <= 8) {
                let entity = &text[i..i + rel + 1];
                match entity {
                    "&lt;" => out.push('<'),
                    "&gt;" => out.push('>'),
                    "&amp;" => out.push('&'),
                    _ => {
                        warnings.push(format!("unrecognized HTML entity {}", entity));
                        out.push_str(entity);
                    }
                }
                i += rel + 1;
                continue;
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    (out, warnings)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        let (text, warnings) = extract_source("MOVE 1,2\n");
        assert_eq!(text, "MOVE 1,2\n");
        assert!(warnings.is_empty());
    }

    #[test]
    fn pre_wrapper_is_stripped() {
        let html = "<html><pre>REPEAT 3,&lt;EXP 5&gt;\n</pre></html>";
        let (text, warnings) = extract_source(html);
        assert_eq!(text, "REPEAT 3,<EXP 5>\n");
        assert!(warnings.is_empty());
    }

    #[test]
    fn amp_decodes() {
        let (text, _) = extract_source("<pre>A&amp;B</pre>");
        assert_eq!(text, "A&B");
    }

    #[test]
    fn unknown_entity_warns() {
        let (text, warnings) = extract_source("<pre>A&copy;B</pre>");
        assert_eq!(text, "A&copy;B");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("&copy;"));
    }
}
