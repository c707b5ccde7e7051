use tabled::Tabled;

use crate::checks::CheckCounts;

#[derive(Tabled)]
pub struct CheckRow {
    pub check: String,
    pub passes: u64,
    pub fails: u64,
    #[tabled(display = "percent")]
    pub pass_rate: f64,
}

impl CheckRow {
    pub fn new(name: &str, counts: &CheckCounts) -> Self {
        Self {
            check: name.to_string(),
            passes: counts.passes,
            fails: counts.fails,
            pass_rate: if counts.total() == 0 {
                0.0
            } else {
                1.0 - counts.failure_rate()
            },
        }
    }
}

fn percent(n: &f64) -> String {
    format!("{:.2}%", n * 100.0)
}
