use crate::engine::{KeyValue, MapFn, ReduceFn};

/// map de wordcount: tokeniza por espacios, limpia cada token a
/// alfanumérico y '_' en minúscula, y emite (palabra, "1").
fn wordcount_map(_filename: &str, contents: &str) -> Vec<KeyValue> {
    let mut pairs = Vec::new();
    for raw in contents.split_whitespace() {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect::<String>()
            .to_lowercase();

        if !cleaned.is_empty() {
            pairs.push(KeyValue {
                key: cleaned,
                value: "1".to_string(),
            });
        }
    }
    pairs
}

/// reduce de wordcount: la cantidad de ocurrencias de la palabra.
fn wordcount_reduce(_key: &str, values: &[String]) -> String {
    values.len().to_string()
}

/// Busca una aplicación map/reduce registrada por nombre.
pub fn lookup(name: &str) -> Option<(MapFn, ReduceFn)> {
    match name {
        "wordcount" => Some((wordcount_map, wordcount_reduce)),
        _ => None,
    }
}
