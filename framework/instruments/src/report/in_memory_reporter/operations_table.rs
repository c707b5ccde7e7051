use tabled::Tabled;

#[derive(Tabled)]
pub struct OperationRow {
    pub operation_id: String,
    #[tabled(display = "float2_or_dash")]
    pub avg_time_ms: Option<f64>,
    #[tabled(display = "float2_or_dash")]
    pub min_time_ms: Option<f64>,
    #[tabled(display = "float2_or_dash")]
    pub max_time_ms: Option<f64>,
    pub total_operations: usize,
    pub errors: usize,
    #[tabled(display = "float2")]
    pub total_duration_ms: f64,
}

fn float2(n: &f64) -> String {
    format!("{n:.2}")
}

fn float2_or_dash(n: &Option<f64>) -> String {
    n.as_ref().map_or_else(|| "-".to_string(), float2)
}
