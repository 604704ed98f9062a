use std::io;
use std::io::ErrorKind;

use chrono::NaiveDate;
use ramhorns::Template;

use crate::post::Category;

#[derive(ramhorns::Content)]
struct PostPage<'a> {
    title: &'a str,
    date: String,
    section: &'a str,
    content: &'a str,
}

pub struct PostRenderer<'a> {
    pub template: Template<'a>,
}

impl PostRenderer<'_> {
    pub fn new(post_tpl_src: &str) -> io::Result<PostRenderer<'_>> {
        let template = match Template::new(post_tpl_src) {
            Ok(x) => x,
            Err(e) => {
                return Err(io::Error::new(ErrorKind::InvalidInput, format!("Error parsing post template: {}", e)));
            }
        };

        Ok(PostRenderer {
            template,
        })
    }

    /// Render the full post page. `content` is already HTML and goes into
    /// the template unescaped; the title is escaped by the template engine.
    pub fn render(&self, title: &str, date: NaiveDate, category: Category, content: &str) -> String {
        let rendered_page = self.template.render(&PostPage {
            title,
            date: date.format("%Y-%m-%d").to_string(),
            section: category.section_title(),
            content,
        });

        rendered_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_post_page() {
        let template_src = "TITLE=[{{title}}]\nDATE=[{{date}}]\nSECTION=[{{section}}]\nCONTENT=[{{{content}}}]";
        let post_renderer = PostRenderer::new(template_src).unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let res = post_renderer.render(
            "My <First> Post",
            date,
            Category::Blog,
            "<p>Rendered body</p>",
        );
        assert_eq!(
            res,
            "TITLE=[My &lt;First&gt; Post]\nDATE=[2024-03-05]\nSECTION=[Blog]\nCONTENT=[<p>Rendered body</p>]"
        );
    }

    #[test]
    fn test_date_placeholder_fits_artifact_shape() {
        let template_src = r#"<article><h1>{{title}}</h1><time datetime="{{date}}">{{date}}</time>{{{content}}}</article>"#;
        let post_renderer = PostRenderer::new(template_src).unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let res = post_renderer.render("T", date, Category::Works, "<p>x</p>");
        assert!(res.contains(r#"<time datetime="2024-12-01">"#));
    }
}
