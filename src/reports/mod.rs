mod tables;

pub use self::tables::{results as print_results, verification as print_verification};
