use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static POSTAL_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{5}(?:-\d{4})?$").expect("postal code pattern"));

/// Regional constraint: submissions come from Southern California, so a
/// zipcode buried inside an address is recognised only when it starts with 9.
static REGIONAL_ZIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b9\d{4}(?:-\d{4})?\b").expect("regional zip pattern"));

/// Resolve a zipcode from the structured answer, falling back to the
/// cleaned family address.
///
/// 1. structured zipcode, as-is
/// 2. the address's trailing five characters, if they form a postal code
/// 3. the first regional zip anywhere in the address
///
/// Anything else leaves the zipcode missing.
pub fn resolve_zipcode(structured: Option<String>, address: Option<&str>) -> Option<String> {
    if structured.is_some() {
        return structured;
    }
    let address = address?;

    let tail = trailing_chars(address, 5);
    if POSTAL_CODE.is_match(tail) {
        debug!(zipcode = tail, "zipcode from address tail");
        return Some(tail.to_string());
    }

    match REGIONAL_ZIP.find(address) {
        Some(m) => {
            debug!(zipcode = m.as_str(), "zipcode from regional match");
            Some(m.as_str().to_string())
        }
        None => {
            debug!("no zipcode found in address");
            None
        }
    }
}

fn trailing_chars(s: &str, n: usize) -> &str {
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}
