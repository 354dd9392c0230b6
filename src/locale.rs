//! Locale-suffixed column naming.
//!
//! Locale-sensitive properties are stored as one column per locale
//! (`title`, `title_pt`, `title_es`, ...). The default locale maps to the
//! bare column; any other locale code appends `_<code>`. Locale negotiation
//! itself lives outside this crate — callers pass the already-chosen code.

/// Column suffix for the given locale code. `None` and the empty string
/// mean the default locale (no suffix).
pub fn column_suffix(locale: Option<&str>) -> String {
    match locale.map(str::trim) {
        None | Some("") => String::new(),
        Some(code) => format!("_{}", code.to_lowercase()),
    }
}
