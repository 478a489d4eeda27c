pub mod params;
pub mod history;
pub mod etf;
pub mod report;
pub mod response;

pub use params::*;
pub use history::*;
pub use etf::*;
pub use report::*;
pub use response::*;
