//! Lifestyle suggestions shown next to a prediction

/// Suggestion for a predicted label; unknown labels get an empty string
pub fn suggestion_for(label: &str) -> &'static str {
    match label {
        "normal" => "Maintain a healthy lifestyle with regular exercise and a balanced diet.",
        "murmur" => "Consult a cardiologist. Avoid strenuous activity until cleared by a doctor.",
        "noisy" => "Try recording in a quiet environment. If symptoms persist, seek medical advice.",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert!(suggestion_for("murmur").starts_with("Consult a cardiologist"));
        assert!(suggestion_for("normal").contains("balanced diet"));
        assert!(suggestion_for("noisy").contains("quiet environment"));
    }

    #[test]
    fn test_unknown_label_is_empty() {
        assert_eq!(suggestion_for("extrastole"), "");
        assert_eq!(suggestion_for("Normal"), "");
    }
}
