use crate::color::ColorSpec;

/// One entry of the fixed background palette offered at export time
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundOption {
    pub id: String,
    /// Shown in the corner caption of the exported image
    pub label: String,
    pub spec: ColorSpec,
}

const PALETTE: &[(&str, &str, &str)] = &[
    ("blue", "Blue Sky", "linear-gradient(160deg, #4facfe, #00f2fe)"),
    ("pink", "Sakura", "linear-gradient(160deg, #ff9a9e, #fad0c4)"),
    ("sunset", "Sunset", "linear-gradient(135deg, #f6d365, #fda085)"),
    ("night", "Night", "linear-gradient(180deg, #0f2027, #203a43, #2c5364)"),
    ("mint", "Mint", "#c3f0ca"),
    ("plain", "Plain", "#f5f5f5"),
];

pub fn palette() -> Vec<BackgroundOption> {
    PALETTE
        .iter()
        .filter_map(|(id, label, spec)| {
            Some(BackgroundOption {
                id: id.to_string(),
                label: label.to_string(),
                spec: spec.parse().ok()?,
            })
        })
        .collect()
}

pub fn find(id: &str) -> Option<BackgroundOption> {
    palette().into_iter().find(|b| b.id == id)
}
