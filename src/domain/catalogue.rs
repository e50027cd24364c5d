//! Built-in catalogue of tickers grouped by asset category.

use std::collections::BTreeSet;

pub struct Category {
    pub name: &'static str,
    pub tickers: &'static [&'static str],
}

pub const CATEGORIES: &[Category] = &[
    Category {
        name: "Technology",
        tickers: &[
            "AAPL", "MSFT", "GOOGL", "META", "NVDA", "TSLA", "ADBE", "INTC", "CSCO", "ORCL",
            "IBM", "QCOM", "TXN", "AVGO", "AMD", "CRM", "INTU", "NOW", "AMAT", "MU", "PYPL",
            "SHOP", "CRWD", "PANW", "NET",
        ],
    },
    Category {
        name: "Utilities",
        tickers: &[
            "NEE", "DUK", "SO", "D", "EXC", "AEP", "PEG", "ED", "EIX", "ES", "XEL", "WEC",
            "AWK", "SRE", "DTE",
        ],
    },
    Category {
        name: "Healthcare",
        tickers: &[
            "JNJ", "PFE", "UNH", "MRK", "ABT", "TMO", "BMY", "AMGN", "GILD", "CVS", "LLY",
            "ABBV", "MDT", "VRTX", "REGN", "ISRG", "MRNA",
        ],
    },
    Category {
        name: "Consumer",
        tickers: &[
            "PG", "KO", "PEP", "WMT", "COST", "MO", "PM", "MDLZ", "CL", "KHC", "HSY", "GIS",
            "TGT", "HD", "LOW", "TJX",
        ],
    },
    Category {
        name: "Financials",
        tickers: &[
            "JPM", "BAC", "V", "MA", "WFC", "C", "GS", "AXP", "MS", "BLK", "SCHW", "PYPL",
            "COF", "USB", "PNC", "CME", "ICE", "SPGI",
        ],
    },
    Category {
        name: "Industrials",
        tickers: &[
            "GE", "HON", "MMM", "BA", "CAT", "UNP", "DE", "RTX", "LMT", "GD", "NOC", "FDX",
            "UPS", "CSX", "DAL", "ETN", "WM",
        ],
    },
    Category {
        name: "Energy",
        tickers: &[
            "XOM", "CVX", "SHEL", "TTE", "COP", "EOG", "MPC", "PSX", "VLO", "OXY", "SLB",
            "HAL", "KMI", "ENB",
        ],
    },
    Category {
        name: "Communication",
        tickers: &[
            "DIS", "NFLX", "CMCSA", "T", "VZ", "TMUS", "CHTR", "EA", "TTWO", "ROKU", "BIDU",
            "BABA",
        ],
    },
    Category {
        name: "ETF Large Cap",
        tickers: &[
            "SPY", "IVV", "VOO", "VTI", "IWB", "VTV", "VUG", "QUAL", "MTUM", "USMV", "RSP",
            "VIG", "DIA", "IWM",
        ],
    },
    Category {
        name: "ETF Technology",
        tickers: &[
            "QQQ", "XLK", "VGT", "SMH", "ARKK", "SOXX", "IGV", "FDN", "SKYY", "BOTZ",
        ],
    },
    Category {
        name: "ETF Dividend",
        tickers: &[
            "SCHD", "VYM", "DGRO", "SDY", "NOBL", "VIG", "DVY", "HDV", "SPYD", "JEPI",
        ],
    },
    Category {
        name: "Corporate Bonds",
        tickers: &[
            "LQD", "VCIT", "HYG", "JNK", "PFF", "VCLT", "VCSH", "IGIB", "IGSB", "USHY",
        ],
    },
    Category {
        name: "Government Bonds",
        tickers: &[
            "GOVT", "TLT", "IEF", "SHY", "VGIT", "VGLT", "VGSH", "IEI", "SHV", "BIL", "EDV",
        ],
    },
    Category {
        name: "Commodities",
        tickers: &[
            "GLD", "SLV", "USO", "UNG", "DBA", "PDBC", "GSG", "IAU", "CPER", "PPLT", "DBC",
        ],
    },
    Category {
        name: "Crypto",
        tickers: &[
            "BTC-USD", "ETH-USD", "BNB-USD", "ADA-USD", "XRP-USD", "SOL-USD", "DOT-USD",
            "DOGE-USD", "AVAX-USD", "LTC-USD", "LINK-USD",
        ],
    },
    Category {
        name: "REITs",
        tickers: &[
            "O", "AMT", "PLD", "CCI", "EQIX", "DLR", "PSA", "SPG", "AVB", "EQR", "WELL",
            "VICI",
        ],
    },
];

pub fn category_names() -> Vec<&'static str> {
    CATEGORIES.iter().map(|c| c.name).collect()
}

/// Case-insensitive lookup; `None` for an unknown category.
pub fn tickers_by_category(name: &str) -> Option<&'static [&'static str]> {
    CATEGORIES
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
        .map(|c| c.tickers)
}

/// Every ticker in the catalogue, sorted and without duplicates.
pub fn all_tickers() -> Vec<&'static str> {
    CATEGORIES
        .iter()
        .flat_map(|c| c.tickers.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// First category listing `ticker`.
pub fn category_of(ticker: &str) -> Option<&'static str> {
    let ticker = ticker.trim().to_uppercase();
    CATEGORIES
        .iter()
        .find(|c| c.tickers.contains(&ticker.as_str()))
        .map(|c| c.name)
}
