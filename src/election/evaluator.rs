use crate::domain::health::ProcessorHealth;
use crate::domain::payment::ProcessorName;

pub fn elect(default: &ProcessorHealth, fallback: &ProcessorHealth) -> ProcessorName {
    match (default.failing, fallback.failing) {
        (false, true) => ProcessorName::Default,
        (true, false) => ProcessorName::Fallback,
        _ => {
            if default.response_time_ms <= fallback.response_time_ms {
                ProcessorName::Default
            } else {
                ProcessorName::Fallback
            }
        }
    }
}
