//! Result aggregation and method selection
//!
//! ```text
//! ResultTensor<CellScore> ──aggregate──> EvaluationRow   (one per condition × algorithm)
//!                                             │
//!                                  select_best│ per metric
//!                                             ▼
//!                                          BestRow       (one per condition × metric)
//!                                             │
//!                                    summarize│ vote count
//!                                             ▼
//!                                        SummaryRow      (one per condition)
//! ```

mod aggregate;
mod best;
mod summary;

pub use aggregate::{Aggregator, EvaluationRow};
pub use best::{select_best, BestRow, Winner};
pub use summary::{summarize, SummaryRow};
