// Candle series, intervals and volatility estimates
pub mod candle;
pub mod timeframe;
pub mod volatility;

pub use candle::{Candle, CandleBatch, DataHealth, SeriesKey};
pub use timeframe::Timeframe;
