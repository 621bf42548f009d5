// Identifier helpers

use uuid::Uuid;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Trims ids, drops blanks and duplicates while keeping the caller's order.
pub fn normalize_ids(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let trimmed = id.trim();
        if trimmed.is_empty() || out.iter().any(|seen| seen == trimmed) {
            continue;
        }
        out.push(trimmed.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_ids_dedupes_and_keeps_order() {
        let ids = vec![
            " b ".to_string(),
            "a".to_string(),
            "".to_string(),
            "b".to_string(),
        ];
        assert_eq!(normalize_ids(ids), vec!["b".to_string(), "a".to_string()]);
    }
}
