pub mod cancel;
pub mod parser;
pub mod proximity;
pub mod ranking;

pub use cancel::CancellationToken;
pub use parser::{parse_query, ProximityQuery, QueryMode};
pub use proximity::{score_document, ProximityEngine, SearchStats, WindowScore};
pub use ranking::{RankedDoc, RankingCollector};
