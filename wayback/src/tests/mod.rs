pub mod fixtures;
pub mod search_tests;

use crate::timemap::Memento;

/// Flag records whose rel kind is missing its required attributes. The
/// line parser itself tolerates these; completeness is checked downstream.
pub fn validate_memento(memento: &Memento) -> Result<(), String> {
    if memento.rel.is_empty() {
        return Err("rel attribute is empty".to_string());
    }

    match memento.rel.as_str() {
        "original" | "timegate" => Ok(()),

        "self" => {
            if memento.mime_type.is_none() {
                return Err("type attribute is missing".to_string());
            }
            if memento.from.is_none() {
                return Err("from attribute is missing".to_string());
            }
            Ok(())
        }

        "memento" | "first memento" => {
            if memento.time.is_none() {
                return Err("datetime attribute is missing".to_string());
            }
            Ok(())
        }

        rel => Err(format!("no validator implemented for rel={rel}")),
    }
}
