#[cfg(test)]
pub const ARTIFACT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>My First Post</title>
</head>
<body>
<header><h1>Site header, not the post title</h1></header>
<article>
    <h1>My First Post</h1>
    <time datetime="2024-03-05">March 5, 2024</time>
    <p>Opening paragraph of the post.</p>
    <p>Another paragraph.</p>
</article>
</body>
</html>
"#;

#[cfg(test)]
pub const ARTIFACT_HTML_NO_TITLE: &str = r#"<!DOCTYPE html>
<html lang="en">
<body>
<article>
    <time datetime="2024-03-05">March 5, 2024</time>
    <p>A post that lost its heading.</p>
</article>
</body>
</html>
"#;

#[cfg(test)]
pub const ARTIFACT_HTML_BAD_DATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<body>
<article>
    <h1>Post With a Broken Date</h1>
    <time datetime="sometime in march">March, probably</time>
    <p>Body text.</p>
</article>
</body>
</html>
"#;

#[cfg(test)]
pub const SOURCE_MD: &str = r#"# My First Post

Opening paragraph of the post, which also works as its snippet.

![[Screenshot One.png]]

Some **bold** text and a [link](https://example.com).
"#;

#[cfg(test)]
pub const INDEX_TPL: &str = r#"<html>
<body>
<h2>Latest</h2>
<ul>
{{{latest_posts}}}</ul>
</body>
</html>
"#;

#[cfg(test)]
pub const SECTION_TPL: &str = r#"<html>
<body>
<h2>{{section}}</h2>
<ul>
{{{posts}}}</ul>
</body>
</html>
"#;

#[cfg(test)]
pub const POST_TPL: &str = r#"<!DOCTYPE html>
<html lang="en">
<body>
<article>
    <h1>{{title}}</h1>
    <time datetime="{{date}}">{{date}}</time>
    <p class="section">{{section}}</p>
    {{{content}}}
</article>
</body>
</html>
"#;
