pub mod aggregation;

pub use aggregation::{fold_tail, ranked_languages, OTHER_LABEL};
