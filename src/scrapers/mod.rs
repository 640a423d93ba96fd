pub mod booking;
pub mod browser;
pub mod extract;
pub mod http;
pub mod rating;
pub mod session;
pub mod traits;
pub mod types;

pub use booking::BookingBrowserProvider;
pub use browser::ChromeSessionFactory;
pub use http::BookingHttpProvider;
pub use traits::HotelProvider;
