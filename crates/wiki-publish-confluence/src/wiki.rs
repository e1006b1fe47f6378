//! Markdown to Confluence wiki markup.
//!
//! Local images become attachments of the page and are referenced by file name;
//! remote images are embedded by URL.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, TextMergeStream};
use tracing::debug;
use wiki_publish_core::{ConvertError, ConvertedDocument, DocumentConverter};

/// Converts Markdown files into wiki-representation page bodies.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownConverter;

#[async_trait]
impl DocumentConverter for MarkdownConverter {
    async fn convert(&self, path: &Path) -> Result<ConvertedDocument, ConvertError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ConvertError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let markdown = String::from_utf8(bytes).map_err(|e| ConvertError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let (body, attachment_paths) = render_wiki(&markdown);
        debug!(
            "Converted {} ({} bytes of markup, {} attachments)",
            path.display(),
            body.len(),
            attachment_paths.len()
        );

        Ok(ConvertedDocument {
            body,
            attachment_prefix: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            attachment_paths,
        })
    }
}

/// Render Markdown as wiki markup, returning the markup and the local image paths
/// in order of appearance.
pub fn render_wiki(markdown: &str) -> (String, Vec<PathBuf>) {
    let parser = Parser::new_ext(
        markdown,
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH,
    );
    let mut writer = WikiWriter::default();
    for event in TextMergeStream::new(parser) {
        writer.event(event);
    }
    writer.finish()
}

#[derive(Default)]
struct WikiWriter {
    out: String,
    /// Open lists, innermost last: `*` bullet, `#` ordered.
    lists: Vec<char>,
    /// Closing macro of the open code block.
    code_block: Option<&'static str>,
    table_head: bool,
    links: Vec<String>,
    /// Nesting depth inside an image; alt text is dropped.
    image_depth: usize,
    images: Vec<String>,
    attachments: Vec<PathBuf>,
}

impl WikiWriter {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.image_depth > 0 {
                    return;
                }
                if self.code_block.is_some() {
                    self.out.push_str(&text);
                } else {
                    self.push_escaped(&text);
                }
            }
            Event::Code(code) => {
                if self.image_depth == 0 {
                    self.out.push_str("{{");
                    self.push_escaped(&code);
                    self.out.push_str("}}");
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => self.push_escaped(&html),
            Event::SoftBreak => self.out.push(' '),
            Event::HardBreak => self.out.push_str("\\\\"),
            Event::Rule => {
                self.newline();
                self.out.push_str("----");
                self.blank_line();
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.newline();
                self.out.push_str(&format!("h{}. ", level as usize));
            }
            Tag::BlockQuote { .. } => {
                self.newline();
                self.out.push_str("{quote}\n");
            }
            Tag::CodeBlock(kind) => {
                self.newline();
                let lang = match &kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().unwrap_or(""),
                    CodeBlockKind::Indented => "",
                };
                if lang.is_empty() {
                    self.out.push_str("{noformat}\n");
                    self.code_block = Some("{noformat}");
                } else {
                    self.out.push_str(&format!("{{code:language={}}}\n", lang));
                    self.code_block = Some("{code}");
                }
            }
            Tag::List(start) => {
                if !self.lists.is_empty() {
                    self.newline();
                }
                self.lists.push(if start.is_some() { '#' } else { '*' });
            }
            Tag::Item => {
                self.newline();
                let marker: String = self.lists.iter().collect();
                self.out.push_str(&marker);
                self.out.push(' ');
            }
            Tag::Table(_) => self.newline(),
            Tag::TableHead => self.table_head = true,
            Tag::TableCell => self.out.push_str(if self.table_head { "||" } else { "|" }),
            Tag::Emphasis => self.out.push('_'),
            Tag::Strong => self.out.push('*'),
            Tag::Strikethrough => self.out.push('-'),
            Tag::Link { dest_url, .. } => {
                self.out.push('[');
                self.links.push(dest_url.to_string());
            }
            Tag::Image { dest_url, .. } => {
                self.image_depth += 1;
                self.images.push(dest_url.to_string());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.lists.is_empty() {
                    self.blank_line();
                } else {
                    self.newline();
                }
            }
            TagEnd::Heading { .. } => self.blank_line(),
            TagEnd::BlockQuote { .. } => {
                self.newline();
                self.out.push_str("{quote}");
                self.blank_line();
            }
            TagEnd::CodeBlock => {
                self.newline();
                if let Some(close) = self.code_block.take() {
                    self.out.push_str(close);
                }
                self.blank_line();
            }
            TagEnd::List { .. } => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => self.newline(),
            TagEnd::TableHead => {
                self.out.push_str("||\n");
                self.table_head = false;
            }
            TagEnd::TableRow => self.out.push_str("|\n"),
            TagEnd::Table => self.blank_line(),
            TagEnd::Emphasis => self.out.push('_'),
            TagEnd::Strong => self.out.push('*'),
            TagEnd::Strikethrough => self.out.push('-'),
            TagEnd::Link => {
                if let Some(dest) = self.links.pop() {
                    self.out.push('|');
                    self.out.push_str(&dest);
                    self.out.push(']');
                }
            }
            TagEnd::Image => {
                self.image_depth = self.image_depth.saturating_sub(1);
                if let Some(dest) = self.images.pop() {
                    self.image(dest);
                }
            }
            _ => {}
        }
    }

    fn image(&mut self, dest: String) {
        if dest.is_empty() {
            return;
        }
        if has_url_scheme(&dest) {
            self.out.push_str(&format!("!{}!", dest));
            return;
        }
        let Some(path) = local_image_path(&dest) else {
            return;
        };
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return;
        };
        self.out.push_str(&format!("!{}!", name));
        self.attachments.push(path);
    }

    /// Escapes wiki markup in plain text. `!` and the brace, bracket and pipe
    /// characters always; emphasis characters only at a word boundary, so
    /// `snake_case` and `well-known` pass through.
    fn push_escaped(&mut self, text: &str) {
        let mut prev = self.out.chars().last();
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            let escape = match c {
                '{' | '}' | '[' | ']' | '|' | '!' => true,
                '*' | '_' | '-' | '+' | '^' | '~' => {
                    let inside_word = prev.is_some_and(char::is_alphanumeric)
                        && chars.peek().is_some_and(|n| n.is_alphanumeric());
                    !inside_word
                }
                _ => false,
            };
            if escape {
                self.out.push('\\');
            }
            self.out.push(c);
            prev = Some(c);
        }
    }

    fn newline(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn blank_line(&mut self) {
        if self.out.is_empty() {
            return;
        }
        self.newline();
        if !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn finish(self) -> (String, Vec<PathBuf>) {
        let mut body = self.out.trim_end().to_string();
        if !body.is_empty() {
            body.push('\n');
        }
        (body, self.attachments)
    }
}

/// Whether `dest` starts with a URL scheme (`https:`, `data:`, `mailto:`, ...).
///
/// A single letter before the colon is a Windows drive, not a scheme.
fn has_url_scheme(dest: &str) -> bool {
    let Some((scheme, _)) = dest.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    scheme.len() > 1
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Local file path of an image destination: query and fragment dropped,
/// percent-escapes decoded.
fn local_image_path(dest: &str) -> Option<PathBuf> {
    let end = dest.find(['?', '#']).unwrap_or(dest.len());
    let raw = &dest[..end];
    if raw.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(raw)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    Some(PathBuf::from(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_heading_and_inline_styles() {
        let (body, attachments) = render_wiki("# Title\n\nSome *em* and **strong** text.\n");
        assert_eq!(body, "h1. Title\n\nSome _em_ and *strong* text.\n");
        assert!(attachments.is_empty());
    }

    #[test]
    fn test_nested_lists() {
        let (body, _) = render_wiki("- one\n- two\n  1. inner\n");
        assert_eq!(body, "* one\n* two\n*# inner\n");
    }

    #[test]
    fn test_code() {
        let (body, _) = render_wiki("Run `cargo {x}`:\n\n```rust\nfn main() {}\n```\n");
        assert_eq!(
            body,
            "Run {{cargo \\{x\\}}}:\n\n{code:language=rust}\nfn main() {}\n{code}\n"
        );

        let (body, _) = render_wiki("```\nplain\n```\n");
        assert_eq!(body, "{noformat}\nplain\n{noformat}\n");
    }

    #[test]
    fn test_links_and_images() {
        let (body, attachments) = render_wiki(
            "See [docs](https://example.com) and ![flow](images/flow.png) \
             and ![logo](https://example.com/logo.png).\n\n![again](old/flow.png)\n",
        );
        assert_eq!(
            body,
            "See [docs|https://example.com] and !flow.png! \
             and !https://example.com/logo.png!.\n\n!flow.png!\n"
        );
        assert_eq!(
            attachments,
            vec![PathBuf::from("images/flow.png"), PathBuf::from("old/flow.png")]
        );
    }

    #[test]
    fn test_table() {
        let (body, _) = render_wiki("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert_eq!(body, "||a||b||\n|1|2|\n");
    }

    #[test]
    fn test_quote_and_rule() {
        let (body, _) = render_wiki("> quoted\n\n---\n\nafter\n");
        assert_eq!(body, "{quote}\nquoted\n\n{quote}\n\n----\n\nafter\n");
    }

    #[test]
    fn test_text_escaping() {
        let (body, _) = render_wiki("Use {braces} and a | pipe.\n");
        assert_eq!(body, "Use \\{braces\\} and a \\| pipe.\n");
    }

    #[test]
    fn test_text_escaping_markup_characters() {
        let (body, _) =
            render_wiki("now! Wow! Use snake_case, well-known and \\*stars\\* - see +1.\n");
        assert_eq!(
            body,
            "now\\! Wow\\! Use snake_case, well-known and \\*stars\\* \\- see \\+1.\n"
        );
    }

    #[test]
    fn test_scheme_images_are_not_attachments() {
        let (body, attachments) = render_wiki(
            "![d](data:image/png;base64,iVBORw0KGgo=) ![m](mailto:docs@example.com)\n",
        );
        assert_eq!(
            body,
            "!data:image/png;base64,iVBORw0KGgo=! !mailto:docs@example.com!\n"
        );
        assert!(attachments.is_empty());
    }

    #[test]
    fn test_image_query_and_fragment_are_dropped() {
        let (body, attachments) = render_wiki("![b](img/logo.png?raw=true) ![c](chart.svg#top)\n");
        assert_eq!(body, "!logo.png! !chart.svg!\n");
        assert_eq!(
            attachments,
            vec![PathBuf::from("img/logo.png"), PathBuf::from("chart.svg")]
        );
    }

    #[test]
    fn test_image_path_is_percent_decoded() {
        let (body, attachments) = render_wiki("![s](shots/my%20shot.png)\n");
        assert_eq!(body, "!my shot.png!\n");
        assert_eq!(attachments, vec![PathBuf::from("shots/my shot.png")]);
    }

    #[test]
    fn test_url_scheme_detection() {
        assert!(has_url_scheme("https://example.com/a.png"));
        assert!(has_url_scheme("data:image/png;base64,AAAA"));
        assert!(has_url_scheme("svn+ssh:host/a.png"));
        assert!(!has_url_scheme("C:/images/a.png"));
        assert!(!has_url_scheme("images/a.png"));
        assert!(!has_url_scheme("images/a:b.png"));
    }

    #[tokio::test]
    async fn test_convert_file() {
        let temp_dir = TempDir::new().unwrap();
        let doc_dir = temp_dir.path().join("doc");
        std::fs::create_dir_all(&doc_dir).unwrap();
        let file = doc_dir.join("guide.md");
        std::fs::write(&file, "# Guide\n\n![shot](img/shot.png)\n").unwrap();

        let converted = MarkdownConverter.convert(&file).await.unwrap();
        assert_eq!(converted.body, "h1. Guide\n\n!shot.png!\n");
        assert_eq!(converted.attachment_prefix, doc_dir);
        assert_eq!(converted.attachment_paths, vec![PathBuf::from("img/shot.png")]);
        assert_eq!(
            converted.resolve(&converted.attachment_paths[0]),
            doc_dir.join("img/shot.png")
        );
    }

    #[tokio::test]
    async fn test_convert_rejects_non_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("bad.md");
        std::fs::write(&file, [0xff, 0xfe, 0x00]).unwrap();

        let err = MarkdownConverter.convert(&file).await.unwrap_err();
        assert!(matches!(err, ConvertError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_convert_missing_file() {
        let err = MarkdownConverter
            .convert(Path::new("/nonexistent/README.md"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Read { .. }));
    }
}
