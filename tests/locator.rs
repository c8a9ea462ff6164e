// tests/locator.rs
use whispernote::locator::highlight_id;

#[test]
fn asin_then_location_no_separator() {
    let id = highlight_id("kindle://book?action=open&asin=B004TP29C4&location=4063").unwrap();
    assert_eq!(id, "B004TP29C44063");
}

#[test]
fn deterministic() {
    let uri = "kindle://book?action=open&asin=B004TP29C4&location=4063";
    assert_eq!(highlight_id(uri).unwrap(), highlight_id(uri).unwrap());
}

#[test]
fn tolerates_reordered_and_extra_parameters() {
    let id = highlight_id("kindle://book?location=12&foo=bar&asin=B000XYZ123&action=open").unwrap();
    assert_eq!(id, "B000XYZ12312");
}

#[test]
fn missing_location_is_an_error() {
    assert!(highlight_id("kindle://book?action=open&asin=B004TP29C4").is_err());
}

#[test]
fn empty_values_are_an_error() {
    assert!(highlight_id("kindle://book?action=open&asin=&location=4063").is_err());
}

#[test]
fn no_query_string_is_an_error() {
    assert!(highlight_id("kindle://book").is_err());
}
