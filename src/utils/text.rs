//! Text helpers for matching labels typed by people

/// Lowercase and strip the Spanish diacritics that show up in names and labels
pub fn fold_accents(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_accents() {
        assert_eq!(fold_accents("Termómetro PATRÓN"), "termometro patron");
        assert_eq!(fold_accents("Diferencia (Pesa-Balanza)"), "diferencia (pesa-balanza)");
    }
}
