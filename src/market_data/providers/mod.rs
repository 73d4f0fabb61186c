pub mod alpha_vantage;
pub mod coingecko;
pub mod metal_price;

pub use alpha_vantage::AlphaVantagePriceSource;
pub use coingecko::CoinGeckoPriceSource;
pub use metal_price::MetalPriceApiSource;
