use std::fs;
use std::path::Path;

/// Load a test fixture by file name
pub fn load_fixture(name: &str) -> String {
    let path = Path::new("src/tests/fixtures").join(name);
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to load test fixture: {}", name))
}
