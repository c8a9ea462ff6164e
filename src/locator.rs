// src/locator.rs
// Derives the stable per-highlight identifier from a Kindle locator URI.

use anyhow::{bail, Result};

/// Builds the highlight identifier from the "Read more" locator.
///
/// A locator looks like
/// `kindle://book?action=open&asin=B004TP29C4&location=4063` and yields
/// `B004TP29C44063`: the ASIN immediately followed by the location, no
/// separator. Lookup is by parameter name, so reordered or extra query
/// parameters are fine.
pub fn highlight_id(locator: &str) -> Result<String> {
    let Some((_, query)) = locator.split_once('?') else {
        bail!("highlight locator has no query string: {locator}");
    };

    let mut asin = None;
    let mut location = None;
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("asin", v)) if !v.is_empty() => asin = Some(v),
            Some(("location", v)) if !v.is_empty() => location = Some(v),
            _ => {}
        }
    }

    match (asin, location) {
        (Some(asin), Some(location)) => Ok(format!("{asin}{location}")),
        _ => bail!("highlight locator missing asin or location: {locator}"),
    }
}
