// tests/config_token.rs
use std::fs;

use whispernote::config::load_auth_token;

#[test]
fn token_is_trimmed() {
    let path = std::env::temp_dir().join("whispernote_token_trim_test.txt");
    fs::write(&path, "  S=s1:U=deadbeef:E=ffffffff\n").unwrap();
    let token = load_auth_token(&path).unwrap();
    assert_eq!(token, "S=s1:U=deadbeef:E=ffffffff");
    let _ = fs::remove_file(&path);
}

#[test]
fn empty_token_file_is_an_error() {
    let path = std::env::temp_dir().join("whispernote_token_empty_test.txt");
    fs::write(&path, "\n  \n").unwrap();
    assert!(load_auth_token(&path).is_err());
    let _ = fs::remove_file(&path);
}

#[test]
fn missing_token_file_is_an_error() {
    let path = std::env::temp_dir().join("whispernote_token_missing_test.txt");
    let _ = fs::remove_file(&path);
    assert!(load_auth_token(&path).is_err());
}
