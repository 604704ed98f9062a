use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use unidecode::unidecode;

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^\w\s-]").unwrap();
    static ref SEPARATOR_RUNS: Regex = Regex::new(r"[-\s]+").unwrap();
}

/// Turns a post title into the slug used for directory names. Accented
/// characters are transliterated to ASCII, anything that is not a word
/// character survives only as a separator, and separator runs collapse
/// into a single underscore.
pub fn slugify(title: &str) -> String {
    let lowered = unidecode(&title.to_lowercase());
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    SEPARATOR_RUNS.replace_all(&stripped, "_").to_string()
}

/// Canonical post id: `{YYYYMMDD}_{slug}`. The id doubles as the name of
/// the directory the artifact lives in, so the same title and date always
/// map to the same place on disk.
pub fn post_id(title: &str, date: NaiveDate) -> String {
    format!("{}_{}", date.format("%Y%m%d"), slugify(title))
}
