//! Page objects for the storefront.
//!
//! Each page owns its elements; regions shared between pages, such as the
//! header, are owned fields of the pages that display them.

mod header;
mod login;
mod products;

pub use header::HeaderRegion;
pub use login::LoginPage;
pub use products::ProductsPage;
