pub mod currency;
pub mod snapshot;

pub use currency::{Currency, ParseCurrencyError};
pub use snapshot::{start_of_day, truncate_to_hour, HostSnapshot};
