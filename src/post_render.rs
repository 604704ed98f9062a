use markdown::{CompileOptions, Options, ParseOptions};
use std::io;
use std::io::ErrorKind;

/// Markdown to HTML with the GFM extensions. Inline HTML is let through
/// on purpose: the media resolver injects figure markup into the source
/// before it reaches this point.
pub fn render_markdown(md_text: &str) -> io::Result<String> {
    let options = Options {
        parse: ParseOptions::gfm(),
        compile: CompileOptions {
            allow_dangerous_html: true,
            ..CompileOptions::gfm()
        },
    };

    match markdown::to_html_with_options(md_text, &options) {
        Ok(x) => Ok(x),
        Err(e) => Err(io::Error::new(ErrorKind::InvalidInput, e.to_string())),
    }
}
