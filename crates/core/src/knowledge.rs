/// One section of the fixed knowledge base injected into every chat prompt.
#[derive(Debug, Clone, Copy)]
pub struct DomainKnowledgeEntry {
    pub key: &'static str,
    pub text: &'static str,
}

// Iteration order is part of the prompt contract, so this is a slice rather
// than a map.
pub const ENTRIES: [DomainKnowledgeEntry; 5] = [
    DomainKnowledgeEntry {
        key: "arima",
        text: "ARIMA: AutoRegressive Integrated Moving Average, suitable for univariate time-series with trend/seasonality after differencing. Steps: stationarity test (ADF), difference, select p,d,q by AIC/ACF/PACF, fit, validate with rolling-window backtest.",
    },
    DomainKnowledgeEntry {
        key: "ecommerce",
        text: "E-commerce: SKU-level demand forecasting requires handling promotions, price elasticity, and hierarchy. Use promo flags, calendar features, and hierarchical reconciliation.",
    },
    DomainKnowledgeEntry {
        key: "stock",
        text: "Stock prediction: price series are noisy; prefer signal-generation, risk-adjusted metrics, technical indicators, volumes, sentiment, strict walk-forward validation.",
    },
    DomainKnowledgeEntry {
        key: "realestate",
        text: "Real estate: hedonic valuation uses location, area, bedrooms, age, amenities. Spatial effects matter; include geospatial encodings and regional cross-validation.",
    },
    DomainKnowledgeEntry {
        key: "supplychain",
        text: "Supply chain: multi-echelon forecasting requires modeling lead-times, variability, safety stock. Use probabilistic forecasts, scenario analysis, multi-period planning.",
    },
];
