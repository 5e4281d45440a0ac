use std::panic::Location;

/// Directory of the source file this function is called from, with the
/// trailing separator kept. Returns an empty string if the path has no
/// directory part.
///
/// Meant for building a [`Formatter::trim_filename_prefix`](crate::formatter::Formatter):
///
/// ```ignore
/// let formatter = Formatter::new()
///     .with_trim_filename_prefix(current_source_directory());
/// ```
///
/// The path is not normalized, so it still compares equal to the file
/// names the front-end reports for sibling files.
#[track_caller]
pub fn current_source_directory() -> String {
    let file = Location::caller().file();
    match file.rfind(['/', '\\']) {
        Some(idx) => file[..=idx].to_string(),
        None => String::new(),
    }
}
