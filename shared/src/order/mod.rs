//! Order lifecycle types shared by the server and its clients

pub mod status;
pub mod types;

pub use status::{OrderStatus, PaymentStatus, UnknownStatus};
pub use types::{OrderOrigin, PayoutDetails, PostageMethod};
