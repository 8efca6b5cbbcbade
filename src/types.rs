// =============================================================================
// Shared types used across the market intelligence service
// =============================================================================

use serde::{Deserialize, Serialize};

/// Which exchange module a market lives in on the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    Spot,
    Derivative,
}

impl Default for MarketKind {
    fn default() -> Self {
        Self::Spot
    }
}

impl std::fmt::Display for MarketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spot => write!(f, "spot"),
            Self::Derivative => write!(f, "derivative"),
        }
    }
}

impl std::str::FromStr for MarketKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spot" => Ok(Self::Spot),
            "derivative" => Ok(Self::Derivative),
            other => Err(format!(
                "Invalid market type: '{other}'. Use 'spot' or 'derivative'."
            )),
        }
    }
}

/// Direction of traded volume across the fetched trade window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeTrend {
    Increasing,
    Decreasing,
    Stable,
}

impl std::fmt::Display for VolumeTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Increasing => write!(f, "increasing"),
            Self::Decreasing => write!(f, "decreasing"),
            Self::Stable => write!(f, "stable"),
        }
    }
}

/// Discrete momentum classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StrongBuy => write!(f, "strong_buy"),
            Self::Buy => write!(f, "buy"),
            Self::Neutral => write!(f, "neutral"),
            Self::Sell => write!(f, "sell"),
            Self::StrongSell => write!(f, "strong_sell"),
        }
    }
}

/// Volatility bucket used by volatility alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Extreme,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Extreme => write!(f, "extreme"),
        }
    }
}

/// Volume concentration bucket. Has no `extreme` tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcentrationLevel {
    Low,
    Medium,
    High,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_kind_parses_case_insensitively() {
        assert_eq!("SPOT".parse::<MarketKind>().unwrap(), MarketKind::Spot);
        assert_eq!(
            " derivative ".parse::<MarketKind>().unwrap(),
            MarketKind::Derivative
        );
        assert!("perp".parse::<MarketKind>().is_err());
    }

    #[test]
    fn signal_serialises_snake_case() {
        let json = serde_json::to_string(&Signal::StrongBuy).unwrap();
        assert_eq!(json, "\"strong_buy\"");
        assert_eq!(Signal::StrongSell.to_string(), "strong_sell");
    }

    #[test]
    fn market_kind_defaults_to_spot() {
        assert_eq!(MarketKind::default(), MarketKind::Spot);
        assert_eq!(MarketKind::Derivative.to_string(), "derivative");
    }
}
