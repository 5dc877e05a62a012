pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// strip_code_fences removes markdown code fences and a leading "json" tag
/// from model output so the remainder parses as plain JSON.
pub fn strip_code_fences(raw: &str) -> String {
    let mut clean = raw.trim().to_string();
    if clean.to_lowercase().starts_with("json") {
        clean = clean[4..].trim().to_string();
    }
    if clean.starts_with("```") {
        clean = clean.replace("```json", "").replace("```", "").trim().to_string();
    }
    clean
}
