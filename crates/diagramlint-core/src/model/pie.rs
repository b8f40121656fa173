#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Slice {
    pub label: String,
    pub value: f64,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pie {
    pub title: Option<String>,
    pub show_data: bool,
    pub slices: Vec<Slice>,
}

impl Pie {
    /// Slices with a positive value, in declaration order; zero/negative
    /// slices are dropped at render time per the data model.
    pub fn positive_slices(&self) -> impl Iterator<Item = &Slice> {
        self.slices.iter().filter(|s| s.value > 0.0)
    }

    pub fn total(&self) -> f64 {
        self.positive_slices().map(|s| s.value).sum()
    }
}
