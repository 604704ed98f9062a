use std::fmt::Write;
use std::io;
use std::io::ErrorKind;

use ramhorns::Template;

/// One line of a listing page, already resolved to its final link target.
pub struct ListEntry {
    pub href: String,
    pub title: String,
    pub date: String,
}

/// The `<li>` block for each listed post. Listing templates receive the
/// whole list as a single pre-built insertion point.
pub fn entries_markup(entries: &[ListEntry]) -> String {
    let mut markup = String::new();
    for entry in entries {
        let _ = writeln!(
            &mut markup,
            r#"<li><a href="{}">{}</a> ({})</li>"#,
            entry.href, entry.title, entry.date
        );
    }
    markup
}

#[derive(ramhorns::Content)]
struct HomePage<'a> {
    latest_posts: &'a str,
}

#[derive(ramhorns::Content)]
struct SectionPage<'a> {
    posts: &'a str,
    section: &'a str,
}

pub struct ListRenderer<'a> {
    pub template: Template<'a>,
}

impl ListRenderer<'_> {
    pub fn new(list_tpl_src: &str) -> io::Result<ListRenderer<'_>> {
        let template = match Template::new(list_tpl_src) {
            Ok(x) => x,
            Err(e) => {
                return Err(io::Error::new(ErrorKind::InvalidInput, format!("Error parsing list template: {}", e)));
            }
        };

        Ok(ListRenderer {
            template,
        })
    }

    /// Home page body: the template's `{{{latest_posts}}}` slot gets the
    /// prepared markup.
    pub fn render_home(&self, entries: &[ListEntry]) -> String {
        let markup = entries_markup(entries);
        self.template.render(&HomePage {
            latest_posts: &markup,
        })
    }

    /// Section page body, with the section heading alongside the list.
    pub fn render_section(&self, section: &str, entries: &[ListEntry]) -> String {
        let markup = entries_markup(entries);
        self.template.render(&SectionPage {
            posts: &markup,
            section,
        })
    }
}
