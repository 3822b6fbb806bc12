use once_cell::sync::Lazy;
use regex::Regex;

static ADDRESS_LABELS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(City:|State|Province:|Postal|Zip\s*Code:|Street\s*Address:|Address\s*Line\s*2:|<br>|/)",
    )
    .expect("address label pattern")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Strip structural labels and markup from a formatted address, then
/// collapse whitespace. Missing stays missing.
pub fn clean_address(raw: Option<&str>) -> Option<String> {
    let mut text = raw?.to_string();
    // replacing `/` can join a label back together ("Zip/Code:"), so run to a fixpoint
    while ADDRESS_LABELS.is_match(&text) {
        text = ADDRESS_LABELS.replace_all(&text, " ").into_owned();
    }
    Some(WHITESPACE.replace_all(text.trim(), " ").into_owned())
}
