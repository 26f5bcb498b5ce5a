//! Destination path planning
//!
//! A destination is `<year>/<original sub path>/<file name>`, optionally with a
//! `-YYYY-MM-DD` token in the file name and spaces replaced by `-`. Planning is
//! pure: nothing here touches the filesystem.

use crate::config::Config;
use crate::scan::MediaFile;
use crate::time::CreationDate;
use regex::Regex;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

/// A bracketed token that already looks like a date, e.g. `(2010-05-01)` or `(May 2010)`
static BRACKETED_DATE: OnceLock<Regex> = OnceLock::new();

/// A `-YYYY-MM-DD` token at the end of a file stem
static TRAILING_DATE: OnceLock<Regex> = OnceLock::new();

fn bracketed_date() -> &'static Regex {
    BRACKETED_DATE.get_or_init(|| {
        Regex::new(concat!(
            r"\(([0-9\-\s]+|[^()]*\b(?:",
            r"Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|",
            r"Aug(?:ust)?|Sept?(?:ember)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?",
            r")\b[^()]*)\)",
        ))
        .unwrap()
    })
}

fn trailing_date() -> &'static Regex {
    TRAILING_DATE.get_or_init(|| Regex::new(r"-\d{4}-\d{2}-\d{2}$").unwrap())
}

/// Compute the destination of `file`, relative to the sort root
///
/// A file whose first folder already is its year is not prefixed again, so a
/// sorted tree plans every file onto itself. Names that are not valid UTF-8
/// are carried over byte for byte and never rewritten.
pub fn plan_destination(file: &MediaFile, date: &CreationDate, config: &Config) -> PathBuf {
    let (mut directories, mut filename) = split_relative(&file.relative_path);

    let year = format!("{:04}", date.year());
    if !directories.first().is_some_and(|d| d.as_os_str() == year.as_str()) {
        directories.insert(0, OsString::from(year));
    }

    if config.rename_files {
        filename = map_utf8(filename, |name| {
            rename_with_date(name, date, config.replace_file_spaces)
        });
    }

    if config.replace_file_spaces {
        filename = map_utf8(filename, replace_spaces);
    }

    if config.replace_directory_spaces {
        directories = directories
            .into_iter()
            .map(|d| map_utf8(d, replace_spaces))
            .collect();
    }

    let mut destination: PathBuf = directories.into_iter().collect();
    destination.push(filename);
    destination
}

/// Split a relative path into its directory names and its file name
fn split_relative(path: &Path) -> (Vec<OsString>, OsString) {
    let mut parts: Vec<OsString> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_os_string()),
            _ => None,
        })
        .collect();
    let filename = parts.pop().unwrap_or_default();
    (parts, filename)
}

/// Apply `f` to a UTF-8 name; anything else is returned unchanged
fn map_utf8(name: OsString, f: impl FnOnce(&str) -> String) -> OsString {
    match name.to_str() {
        Some(text) => OsString::from(f(text)),
        None => name,
    }
}

/// Insert `-YYYY-MM-DD` before the extension unless the name already has a date marker
///
/// A bracketed marker is kept; with `strip_brackets` its brackets are removed
/// and it is lower-cased.
pub fn rename_with_date(filename: &str, date: &CreationDate, strip_brackets: bool) -> String {
    if let Some(marker) = bracketed_date().find(filename) {
        if !strip_brackets {
            return filename.to_string();
        }
        let inner = &filename[marker.start() + 1..marker.end() - 1];
        return format!(
            "{}{}{}",
            &filename[..marker.start()],
            inner.to_lowercase(),
            &filename[marker.end()..]
        );
    }

    let (stem, extension) = split_extension(filename);
    if trailing_date().is_match(stem) {
        return filename.to_string();
    }

    format!("{}-{}{}", stem, date.token(), extension)
}

/// `("img 1", ".jpg")`; names without an extension get an empty one
fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(0) | None => (filename, ""),
        Some(i) => filename.split_at(i),
    }
}

/// `", "` and then any remaining space become `-`
pub fn replace_spaces(name: &str) -> String {
    name.replace(", ", "-").replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediaKind;
    use crate::time::DateSource;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> CreationDate {
        CreationDate {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            source: DateSource::Metadata,
        }
    }

    fn media(relative: &str) -> MediaFile {
        let root = Path::new("/photos");
        MediaFile::new(root, root.join(relative), MediaKind::Image)
    }

    #[test]
    fn test_year_prefix_only() {
        let dest = plan_destination(
            &media("vacation/beach.jpg"),
            &date(2019, 7, 4),
            &Config::default(),
        );
        assert_eq!(dest, PathBuf::from("2019/vacation/beach.jpg"));
    }

    #[test]
    fn test_file_at_root() {
        let dest = plan_destination(&media("x.jpg"), &date(2020, 1, 1), &Config::default());
        assert_eq!(dest, PathBuf::from("2020/x.jpg"));
    }

    #[test]
    fn test_replace_spaces_in_file_and_directories() {
        let config = Config {
            replace_file_spaces: true,
            replace_directory_spaces: true,
            ..Config::default()
        };
        let dest = plan_destination(&media("My Photos/img 1.jpg"), &date(2021, 3, 2), &config);
        assert_eq!(dest, PathBuf::from("2021/My-Photos/img-1.jpg"));
    }

    #[test]
    fn test_space_options_are_independent() {
        let files_only = Config {
            replace_file_spaces: true,
            ..Config::default()
        };
        let dest = plan_destination(&media("My Photos/img 1.jpg"), &date(2021, 3, 2), &files_only);
        assert_eq!(dest, PathBuf::from("2021/My Photos/img-1.jpg"));

        let dirs_only = Config {
            replace_directory_spaces: true,
            ..Config::default()
        };
        let file = media("Trip, Spain/day 1/a b.jpg");
        let dest = plan_destination(&file, &date(2021, 3, 2), &dirs_only);
        assert_eq!(dest, PathBuf::from("2021/Trip-Spain/day-1/a b.jpg"));
    }

    #[test]
    fn test_rename_inserts_token_before_extension() {
        let config = Config {
            rename_files: true,
            ..Config::default()
        };
        let dest = plan_destination(&media("party/cake.JPG"), &date(2009, 2, 3), &config);
        assert_eq!(dest, PathBuf::from("2009/party/cake-2009-02-03.JPG"));
    }

    #[test]
    fn test_rename_then_replace_spaces() {
        let config = Config {
            rename_files: true,
            replace_file_spaces: true,
            replace_directory_spaces: true,
            ..Config::default()
        };
        let dest = plan_destination(&media("My Photos/img 1.jpg"), &date(2021, 5, 1), &config);
        assert_eq!(dest, PathBuf::from("2021/My-Photos/img-1-2021-05-01.jpg"));
    }

    #[test]
    fn test_second_run_plans_onto_itself() {
        let config = Config {
            rename_files: true,
            replace_file_spaces: true,
            replace_directory_spaces: true,
            ..Config::default()
        };
        let first = plan_destination(&media("My Photos/img 1.jpg"), &date(2021, 5, 1), &config);
        let second = plan_destination(
            &media(first.to_str().unwrap()),
            &date(2021, 5, 1),
            &config,
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_bracketed_markers_are_kept() {
        let d = date(2010, 5, 1);
        assert_eq!(rename_with_date("Party (2010-05-01).jpg", &d, false), "Party (2010-05-01).jpg");
        assert_eq!(rename_with_date("Party (May 2010).jpg", &d, false), "Party (May 2010).jpg");
        assert_eq!(rename_with_date("Party (1 2 3).jpg", &d, false), "Party (1 2 3).jpg");
    }

    #[test]
    fn test_bracketed_marker_stripped_with_space_replacement() {
        let d = date(2010, 5, 1);
        assert_eq!(rename_with_date("Party (May 2010).jpg", &d, true), "Party may 2010.jpg");

        let config = Config {
            rename_files: true,
            replace_file_spaces: true,
            ..Config::default()
        };
        let dest = plan_destination(&media("Party (May 2010).jpg"), &d, &config);
        assert_eq!(dest, PathBuf::from("2010/Party-may-2010.jpg"));
    }

    #[test]
    fn test_unrelated_brackets_do_not_block_rename() {
        let d = date(2010, 5, 1);
        assert_eq!(rename_with_date("Bob (copy).jpg", &d, false), "Bob (copy)-2010-05-01.jpg");

        for stem in [
            "Beach (smart phone)",
            "Kids (octopus)",
            "Trip (janet)",
            "Notes (summary)",
            "Sea (Octopus)",
        ] {
            assert_eq!(
                rename_with_date(&format!("{stem}.jpg"), &d, false),
                format!("{stem}-2010-05-01.jpg")
            );
        }
    }

    #[test]
    fn test_month_names_are_whole_words() {
        let d = date(2010, 5, 1);
        assert_eq!(rename_with_date("Ski (Jan 2011).jpg", &d, false), "Ski (Jan 2011).jpg");
        assert_eq!(rename_with_date("Ski (January).jpg", &d, false), "Ski (January).jpg");
        assert_eq!(rename_with_date("Fair (Sept 2009).jpg", &d, false), "Fair (Sept 2009).jpg");
        assert_eq!(
            rename_with_date("Fair (may 2009).jpg", &d, false),
            "Fair (may 2009)-2010-05-01.jpg"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_directory_is_kept_verbatim() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let folder = OsStr::from_bytes(b"caf\xE9 trip");
        let root = Path::new("/photos");
        let file = MediaFile::new(root, root.join(folder).join("a b.jpg"), MediaKind::Image);
        let config = Config {
            rename_files: true,
            replace_file_spaces: true,
            replace_directory_spaces: true,
            ..Config::default()
        };

        let dest = plan_destination(&file, &date(2010, 5, 1), &config);
        assert_eq!(dest, Path::new("2010").join(folder).join("a-b-2010-05-01.jpg"));
    }

    #[test]
    fn test_rename_is_idempotent() {
        let d = date(2012, 11, 30);
        let once = rename_with_date("clip.mov", &d, false);
        assert_eq!(once, "clip-2012-11-30.mov");
        assert_eq!(rename_with_date(&once, &d, false), once);
        // A different date does not stack a second token either
        assert_eq!(rename_with_date(&once, &date(2013, 1, 1), false), once);
    }

    #[test]
    fn test_replace_spaces() {
        assert_eq!(replace_spaces("Rome, Italy 2"), "Rome-Italy-2");
        assert_eq!(replace_spaces("no_spaces"), "no_spaces");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a.b.jpg"), ("a.b", ".jpg"));
        assert_eq!(split_extension("noext"), ("noext", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
    }
}
