use std::collections::HashMap;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy)]
pub struct PriceEntry {
    /// USD per million input tokens.
    pub input: f64,
    /// USD per million output tokens.
    pub output: f64,
}

pub static PRICING: LazyLock<HashMap<&'static str, PriceEntry>> = LazyLock::new(|| {
    HashMap::from([
        (
            "gpt-4.1",
            PriceEntry {
                input: 2.0,
                output: 8.0,
            },
        ),
        (
            "gpt-4.1-mini",
            PriceEntry {
                input: 0.4,
                output: 1.6,
            },
        ),
        (
            "gpt-4o",
            PriceEntry {
                input: 2.5,
                output: 10.0,
            },
        ),
        (
            "claude-haiku-4-5-20251001",
            PriceEntry {
                input: 1.0,
                output: 5.0,
            },
        ),
        (
            "claude-sonnet-4-20250514",
            PriceEntry {
                input: 3.0,
                output: 15.0,
            },
        ),
        (
            "gemini-2.5-flash",
            PriceEntry {
                input: 0.3,
                output: 2.5,
            },
        ),
    ])
});

pub fn calculate_cost(model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
    match PRICING.get(model) {
        Some(entry) => {
            (f64::from(input_tokens) * entry.input / 1_000_000.0)
                + (f64::from(output_tokens) * entry.output / 1_000_000.0)
        }
        None => 0.0,
    }
}

pub static PROVIDER_SERVERS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    HashMap::from([
        ("openai", "api.openai.com"),
        ("anthropic", "api.anthropic.com"),
        ("google", "generativelanguage.googleapis.com"),
        ("ollama", "localhost"),
    ])
});

pub static PROVIDER_PORTS: LazyLock<HashMap<&str, i64>> = LazyLock::new(|| {
    HashMap::from([
        ("openai", 443_i64),
        ("anthropic", 443),
        ("google", 443),
        ("ollama", 11434),
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_cost_known_model() {
        let cost = calculate_cost("gpt-4.1", 1_000_000, 1_000_000);
        assert!((cost - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_calculate_cost_unknown_model() {
        assert_eq!(calculate_cost("nonexistent-model-xyz", 1000, 1000), 0.0);
    }

    #[test]
    fn test_calculate_cost_zero_tokens() {
        assert_eq!(calculate_cost("gpt-4.1", 0, 0), 0.0);
    }

    #[test]
    fn test_provider_servers() {
        assert_eq!(PROVIDER_SERVERS.get("openai"), Some(&"api.openai.com"));
        assert_eq!(
            PROVIDER_SERVERS.get("anthropic"),
            Some(&"api.anthropic.com")
        );
        assert_eq!(PROVIDER_SERVERS.get("ollama"), Some(&"localhost"));
    }

    #[test]
    fn test_provider_ports() {
        assert_eq!(PROVIDER_PORTS.get("openai"), Some(&443));
        assert_eq!(PROVIDER_PORTS.get("ollama"), Some(&11434));
    }
}
